//! # CLI Error Types
//!
//! Everything that can go wrong outside the engine: reading files, parsing
//! config and documents. Engine failures are wrapped unchanged.

use quotewise_core::PricingError;
use thiserror::Error;

/// Result type alias for CLI operations.
pub type CliResult<T> = Result<T, CliError>;

#[derive(Debug, Error)]
pub enum CliError {
    // =========================================================================
    // Configuration Errors
    // =========================================================================
    /// Invalid pricing configuration.
    #[error("Invalid pricing configuration: {0}")]
    InvalidConfig(String),

    /// Config file could not be parsed.
    #[error("Failed to parse config: {0}")]
    ConfigParse(#[from] toml::de::Error),

    /// Config could not be rendered.
    #[error("Failed to render config: {0}")]
    ConfigRender(#[from] toml::ser::Error),

    // =========================================================================
    // Input/Output Errors
    // =========================================================================
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Cart document is not valid JSON or has the wrong shape.
    #[error("Invalid cart document: {0}")]
    Document(#[from] serde_json::Error),

    // =========================================================================
    // Engine Errors
    // =========================================================================
    #[error("Pricing failed: {0}")]
    Pricing(#[from] PricingError),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_pricing_error_wraps() {
        let err: CliError = PricingError::MissingIdentity { index: 2 }.into();
        assert_eq!(
            err.to_string(),
            "Pricing failed: Line item at index 2 has no product identifier"
        );
    }

    #[test]
    fn test_invalid_config_message() {
        let err = CliError::InvalidConfig("precision must not be negative".into());
        assert_eq!(
            err.to_string(),
            "Invalid pricing configuration: precision must not be negative"
        );
    }
}

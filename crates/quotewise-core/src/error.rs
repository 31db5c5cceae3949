//! # Error Types
//!
//! Domain-specific error types for quotewise-core.
//!
//! ## Error Hierarchy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                         Error Types                                     │
//! │                                                                         │
//! │  quotewise-core errors (this file)                                     │
//! │  ├── PricingError     - Fatal input-contract violations                │
//! │  └── ValidationError  - Field-level input failures                     │
//! │                                                                         │
//! │  quotewise-cli errors (separate crate)                                 │
//! │  └── CliError         - Config, file and JSON failures                 │
//! │                                                                         │
//! │  Flow: ValidationError → PricingError → CliError → exit code           │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## What Is NOT An Error
//! Missing optional data never produces an error. An absent `hsnDetails`,
//! an empty tier list or an undefined `pfRate` all degrade to zero and the
//! calculation continues. Only contract violations surface here.

use thiserror::Error;

// =============================================================================
// Pricing Error
// =============================================================================

/// Fatal pricing errors.
///
/// None of these are retried or recovered inside the engine. They propagate
/// to the caller, which decides what the user sees.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum PricingError {
    /// Rounding precision is negative or beyond what a decimal can hold.
    ///
    /// ## When This Occurs
    /// ```text
    /// PricingContext { precision: -1, .. }
    ///      │
    ///      ▼
    /// round(value, -1)
    ///      │
    ///      ▼
    /// InvalidPrecision { precision: -1 }  ← every caller sees this via `?`
    /// ```
    #[error("Invalid rounding precision {precision}: must be between 0 and {max}")]
    InvalidPrecision { precision: i32, max: u32 },

    /// A line item has no product identifier.
    ///
    /// Totals are never produced for a cart containing such a line.
    #[error("Line item at index {index} has no product identifier")]
    MissingIdentity { index: usize },

    /// An intermediate figure does not fit the numeric type.
    ///
    /// Raised instead of wrapping or saturating; no total is produced.
    #[error("Arithmetic overflow while computing {operation}")]
    Overflow { operation: &'static str },

    /// Validation error (wraps ValidationError).
    #[error("Validation error: {0}")]
    Validation(#[from] ValidationError),
}

// =============================================================================
// Validation Error
// =============================================================================

/// Input validation errors.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ValidationError {
    /// A required field is missing or empty.
    #[error("{field} is required")]
    Required { field: String },

    /// Value must not be negative.
    #[error("{field} must not be negative, got {value}")]
    MustBeNonNegative { field: String, value: String },

    /// Numeric value is out of range.
    #[error("{field} must be between {min} and {max}, got {value}")]
    OutOfRange {
        field: String,
        min: String,
        max: String,
        value: String,
    },

    /// A tier's lower bound is above its upper bound.
    #[error("Discount tier {index} has minQuantity {min} above maxQuantity {max}")]
    InvertedTier { index: usize, min: i64, max: i64 },

    /// Supplied volume-discount totals were not computed from this cart.
    #[error("Volume discount totals do not match the cart they are applied to")]
    StaleVolumeDiscount,
}

// =============================================================================
// Result Type Alias
// =============================================================================

/// Convenience type alias for Results with PricingError.
pub type PricingResult<T> = Result<T, PricingError>;

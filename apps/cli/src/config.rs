//! # Pricing Configuration
//!
//! Configuration management for the `quotewise` CLI.
//!
//! ## Configuration Sources
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                    Configuration Priority                               │
//! │                                                                         │
//! │  1. Command-line flags (highest priority)                              │
//! │     --inter / --intra / --precision / --exempt                         │
//! │                                                                         │
//! │  2. Environment Variables                                              │
//! │     QUOTEWISE_PRECISION=3                                              │
//! │     QUOTEWISE_ROUNDING_MODE=half_even                                  │
//! │                                                                         │
//! │  3. TOML Config File                                                   │
//! │     ~/.config/pricing/pricing.toml (Linux)                             │
//! │     ~/Library/Application Support/com.quotewise.pricing/pricing.toml   │
//! │                                                                         │
//! │  4. Default Values (lowest priority)                                   │
//! │     intra-state, 2 decimal places, half away from zero                 │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Configuration File Format
//! ```toml
//! # pricing.toml
//! [pricing]
//! precision = 2
//! is_inter = false
//! tax_exemption = false
//! rounding = "half_away_from_zero"  # half_away_from_zero | half_even | truncate
//! round_off_grand_total = false
//! ```

use quotewise_core::{rounding::MAX_PRECISION, PricingContext, RoundingMode, DEFAULT_PRECISION};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use tracing::{debug, info, warn};

use crate::error::{CliError, CliResult};

// =============================================================================
// Pricing Settings
// =============================================================================

/// The `[pricing]` table.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PricingSettings {
    /// Decimal places for every rounded figure.
    #[serde(default = "default_precision")]
    pub precision: i32,

    /// Selects the inter-state rule set.
    #[serde(default)]
    pub is_inter: bool,

    /// Zeroes all tax when set.
    #[serde(default)]
    pub tax_exemption: bool,

    #[serde(default)]
    pub rounding: RoundingMode,

    /// Round the grand total to whole units.
    #[serde(default)]
    pub round_off_grand_total: bool,
}

fn default_precision() -> i32 {
    DEFAULT_PRECISION
}

impl Default for PricingSettings {
    fn default() -> Self {
        PricingSettings {
            precision: default_precision(),
            is_inter: false,
            tax_exemption: false,
            rounding: RoundingMode::default(),
            round_off_grand_total: false,
        }
    }
}

// =============================================================================
// Command-line Overrides
// =============================================================================

/// Flag values that win over file and environment.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CliOverrides {
    pub is_inter: Option<bool>,
    pub precision: Option<i32>,
    pub tax_exemption: Option<bool>,
    pub rounding: Option<RoundingMode>,
    pub round_off_grand_total: Option<bool>,
}

// =============================================================================
// Main Pricing Configuration
// =============================================================================

/// Complete CLI configuration.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PricingConfig {
    #[serde(default)]
    pub pricing: PricingSettings,
}

impl PricingConfig {
    /// Loads configuration from file, environment, and flags.
    ///
    /// ## Load Order (later overrides earlier)
    /// 1. Default values
    /// 2. Config file (pricing.toml)
    /// 3. Environment variables
    /// 4. Command-line flags
    ///
    /// Validation runs once, on the merged result, so a flag can correct a
    /// bad environment value. An explicit `config_path` that does not exist
    /// is an error; a missing default file is not.
    pub fn load(config_path: Option<PathBuf>, overrides: &CliOverrides) -> CliResult<Self> {
        Self::read_file(config_path)?.resolve(|key| std::env::var(key).ok(), overrides)
    }

    fn read_file(config_path: Option<PathBuf>) -> CliResult<Self> {
        let path = match config_path {
            Some(path) => path,
            None => match Self::default_config_path() {
                Some(path) if path.exists() => path,
                Some(path) => {
                    debug!(?path, "Config file not found, using defaults");
                    return Ok(Self::default());
                }
                None => {
                    debug!("No config directory available, using defaults");
                    return Ok(Self::default());
                }
            },
        };

        info!(?path, "Loading pricing config from file");
        Self::from_toml(&std::fs::read_to_string(&path)?)
    }

    /// Applies environment then flag overrides and validates the result.
    pub(crate) fn resolve<F>(mut self, lookup: F, overrides: &CliOverrides) -> CliResult<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        self.apply_overrides_from(lookup);
        self.apply_cli_overrides(overrides);
        self.validate()?;
        Ok(self)
    }

    /// Parses a `pricing.toml` document.
    pub fn from_toml(contents: &str) -> CliResult<Self> {
        Ok(toml::from_str(contents)?)
    }

    /// Renders the effective configuration as TOML.
    pub fn to_toml(&self) -> CliResult<String> {
        Ok(toml::to_string_pretty(self)?)
    }

    /// Validates the configuration.
    pub fn validate(&self) -> CliResult<()> {
        let precision = self.pricing.precision;
        if precision < 0 || precision > MAX_PRECISION as i32 {
            return Err(CliError::InvalidConfig(format!(
                "precision must be between 0 and {}, got {}",
                MAX_PRECISION, precision
            )));
        }
        Ok(())
    }

    /// Applies flag values on top of everything else.
    pub fn apply_cli_overrides(&mut self, overrides: &CliOverrides) {
        let p = &mut self.pricing;
        if let Some(v) = overrides.is_inter {
            p.is_inter = v;
        }
        if let Some(v) = overrides.precision {
            p.precision = v;
        }
        if let Some(v) = overrides.tax_exemption {
            p.tax_exemption = v;
        }
        if let Some(v) = overrides.rounding {
            p.rounding = v;
        }
        if let Some(v) = overrides.round_off_grand_total {
            p.round_off_grand_total = v;
        }
    }

    /// Builds the engine context for one pricing run.
    pub fn to_context(&self) -> PricingContext {
        PricingContext::new(self.pricing.is_inter, self.pricing.precision)
            .with_tax_exemption(self.pricing.tax_exemption)
            .with_rounding(self.pricing.rounding)
            .with_round_off(self.pricing.round_off_grand_total)
    }

    /// Applies `QUOTEWISE_*` overrides read through `lookup`.
    ///
    /// Unparseable values are logged and ignored.
    pub(crate) fn apply_overrides_from<F>(&mut self, lookup: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(raw) = lookup("QUOTEWISE_PRECISION") {
            match raw.trim().parse::<i32>() {
                Ok(p) => {
                    debug!(precision = p, "Overriding precision from environment");
                    self.pricing.precision = p;
                }
                Err(_) => warn!(value = %raw, "Ignoring non-numeric QUOTEWISE_PRECISION"),
            }
        }

        if let Some(raw) = lookup("QUOTEWISE_IS_INTER") {
            match parse_flag(&raw) {
                Some(v) => self.pricing.is_inter = v,
                None => warn!(value = %raw, "Ignoring invalid QUOTEWISE_IS_INTER"),
            }
        }

        if let Some(raw) = lookup("QUOTEWISE_TAX_EXEMPTION") {
            match parse_flag(&raw) {
                Some(v) => self.pricing.tax_exemption = v,
                None => warn!(value = %raw, "Ignoring invalid QUOTEWISE_TAX_EXEMPTION"),
            }
        }

        if let Some(raw) = lookup("QUOTEWISE_ROUNDING_MODE") {
            match raw.parse::<RoundingMode>() {
                Ok(mode) => {
                    debug!(%mode, "Overriding rounding mode from environment");
                    self.pricing.rounding = mode;
                }
                Err(e) => warn!(error = %e, "Ignoring QUOTEWISE_ROUNDING_MODE"),
            }
        }

        if let Some(raw) = lookup("QUOTEWISE_ROUND_OFF_TOTAL") {
            match parse_flag(&raw) {
                Some(v) => self.pricing.round_off_grand_total = v,
                None => warn!(value = %raw, "Ignoring invalid QUOTEWISE_ROUND_OFF_TOTAL"),
            }
        }
    }

    /// Returns the default config file path.
    pub fn default_config_path() -> Option<PathBuf> {
        directories::ProjectDirs::from("com", "quotewise", "pricing")
            .map(|dirs| dirs.config_dir().join("pricing.toml"))
    }
}

fn parse_flag(raw: &str) -> Option<bool> {
    match raw.trim().to_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Some(true),
        "0" | "false" | "no" | "off" => Some(false),
        _ => None,
    }
}

//! # Rounding Module
//!
//! The single rounding function every other component goes through.
//!
//! ## Why One Function?
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  THE DRIFT PROBLEM                                                      │
//! │                                                                         │
//! │  Line A rounds CGST half-up     → 47.25                                 │
//! │  Cart rounds the same sum even  → 47.24                                 │
//! │                                                                         │
//! │  The cart total no longer equals the sum of its lines. On an invoice   │
//! │  that is a legally wrong document.                                      │
//! │                                                                         │
//! │  OUR SOLUTION: every value is rounded once, at the line, through the   │
//! │  strategy carried by the PricingContext. Aggregates are exact sums of  │
//! │  already-rounded values.                                                │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Usage
//! ```rust
//! use quotewise_core::rounding::{round, RoundingMode};
//! use rust_decimal::Decimal;
//!
//! let value = Decimal::new(2125, 3); // 2.125
//! assert_eq!(round(value, 2).unwrap(), Decimal::new(213, 2));
//! assert_eq!(RoundingMode::HalfEven.round(value, 2).unwrap(), Decimal::new(212, 2));
//!
//! // Negative precision is a contract violation, never coerced
//! assert!(round(value, -1).is_err());
//! ```

use rust_decimal::{Decimal, RoundingStrategy};
use serde::{Deserialize, Serialize};
use ts_rs::TS;

use crate::error::{PricingError, PricingResult};

/// Largest number of decimal places a `Decimal` can carry.
pub const MAX_PRECISION: u32 = 28;

const HUNDRED: Decimal = Decimal::ONE_HUNDRED;

// =============================================================================
// Rounding Mode
// =============================================================================

/// The rounding strategy injected through [`crate::PricingContext`].
///
/// ## Mode Comparison
/// ```text
/// ┌──────────────────────┬─────────┬─────────┬─────────┐
/// │ value @ 2 places     │  2.125  │  2.135  │ -2.125  │
/// ├──────────────────────┼─────────┼─────────┼─────────┤
/// │ HalfAwayFromZero     │  2.13   │  2.14   │ -2.13   │
/// │ HalfEven             │  2.12   │  2.14   │ -2.12   │
/// │ Truncate             │  2.12   │  2.13   │ -2.12   │
/// └──────────────────────┴─────────┴─────────┴─────────┘
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, TS)]
#[serde(rename_all = "snake_case")]
#[ts(export)]
pub enum RoundingMode {
    /// Standard commercial rounding: 0.5 moves away from zero.
    #[default]
    HalfAwayFromZero,

    /// Bankers rounding: 0.5 moves to the nearest even digit.
    HalfEven,

    /// Drop extra digits.
    Truncate,
}

impl RoundingMode {
    /// Rounds `value` to `precision` decimal places using this mode.
    ///
    /// ## Errors
    /// [`PricingError::InvalidPrecision`] when `precision < 0` or
    /// `precision > 28`.
    pub fn round(&self, value: Decimal, precision: i32) -> PricingResult<Decimal> {
        let dp = validate_precision(precision)?;
        Ok(value.round_dp_with_strategy(dp, self.strategy()))
    }

    fn strategy(&self) -> RoundingStrategy {
        match self {
            RoundingMode::HalfAwayFromZero => RoundingStrategy::MidpointAwayFromZero,
            RoundingMode::HalfEven => RoundingStrategy::MidpointNearestEven,
            RoundingMode::Truncate => RoundingStrategy::ToZero,
        }
    }
}

impl std::fmt::Display for RoundingMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            RoundingMode::HalfAwayFromZero => write!(f, "half_away_from_zero"),
            RoundingMode::HalfEven => write!(f, "half_even"),
            RoundingMode::Truncate => write!(f, "truncate"),
        }
    }
}

impl std::str::FromStr for RoundingMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().replace('-', "_").as_str() {
            "half_away_from_zero" | "half_up" | "standard" => Ok(RoundingMode::HalfAwayFromZero),
            "half_even" | "bankers" => Ok(RoundingMode::HalfEven),
            "truncate" | "down" => Ok(RoundingMode::Truncate),
            other => Err(format!(
                "Unknown rounding mode: '{}'. Valid options: half_away_from_zero, half_even, truncate",
                other
            )),
        }
    }
}

// =============================================================================
// Free Functions
// =============================================================================

/// Rounds half away from zero at `precision` decimal places.
///
/// This is the engine's default strategy. A negative precision is a fatal
/// input-contract violation and returns [`PricingError::InvalidPrecision`].
#[inline]
pub fn round(value: Decimal, precision: i32) -> PricingResult<Decimal> {
    RoundingMode::HalfAwayFromZero.round(value, precision)
}

/// Checks a precision and returns it as the `u32` decimal scale.
pub fn validate_precision(precision: i32) -> PricingResult<u32> {
    u32::try_from(precision)
        .ok()
        .filter(|dp| *dp <= MAX_PRECISION)
        .ok_or(PricingError::InvalidPrecision {
            precision,
            max: MAX_PRECISION,
        })
}

/// `amount × rate / 100`, unrounded.
#[inline]
pub fn percent_of(amount: Decimal, rate: Decimal) -> PricingResult<Decimal> {
    mul(amount, rate, "percentage")?
        .checked_div(HUNDRED)
        .ok_or(PricingError::Overflow { operation: "percentage" })
}

/// `amount × (100 − percentage) / 100`, unrounded.
#[inline]
pub fn less_percent(amount: Decimal, percentage: Decimal) -> PricingResult<Decimal> {
    let keep = HUNDRED
        .checked_sub(percentage)
        .ok_or(PricingError::Overflow { operation: "discount" })?;
    percent_of(amount, keep)
}

// =============================================================================
// Checked Arithmetic
// =============================================================================
//
// Input figures come straight from caller documents, so every sum and
// product that feeds a total goes through these.

/// `a + b`, or [`PricingError::Overflow`] naming `operation`.
#[inline]
pub fn add(a: Decimal, b: Decimal, operation: &'static str) -> PricingResult<Decimal> {
    a.checked_add(b).ok_or(PricingError::Overflow { operation })
}

#[inline]
pub fn sub(a: Decimal, b: Decimal, operation: &'static str) -> PricingResult<Decimal> {
    a.checked_sub(b).ok_or(PricingError::Overflow { operation })
}

#[inline]
pub fn mul(a: Decimal, b: Decimal, operation: &'static str) -> PricingResult<Decimal> {
    a.checked_mul(b).ok_or(PricingError::Overflow { operation })
}

/// `unitPrice × quantity`.
#[inline]
pub fn extend(unit: Decimal, quantity: i64, operation: &'static str) -> PricingResult<Decimal> {
    mul(unit, Decimal::from(quantity), operation)
}

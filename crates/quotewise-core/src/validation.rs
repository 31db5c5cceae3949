//! # Validation Module
//!
//! Input-contract checks for the pricing engine.
//!
//! ## What Gets Checked
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                      Validation vs Degradation                          │
//! │                                                                         │
//! │  REJECTED (caller misuse)            DEFAULTED (missing data)           │
//! │  ────────────────────────            ────────────────────────           │
//! │  • empty productId                   • no hsnDetails      → tax 0       │
//! │  • negative quantity                 • no tiers           → discount 0  │
//! │  • precision < 0                     • no pfRate          → 0           │
//! │  • percentage outside 0-100          • packaging < 1      → 1           │
//! │  • tier with min > max                                                  │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//! A rejected cart produces no totals at all; a defaulted one computes
//! normally.
//!
//! ## Usage
//! ```rust
//! use quotewise_core::validation::{validate_line_item, validate_percentage};
//! use quotewise_core::LineItem;
//! use rust_decimal::Decimal;
//!
//! assert!(validate_line_item(&LineItem::new("SKU-1", 3, Decimal::TEN).unwrap(), 0).is_ok());
//! assert!(validate_line_item(&LineItem::new("", 3, Decimal::TEN).unwrap(), 0).is_err());
//! assert!(validate_percentage("discount", Decimal::from(101)).is_err());
//! ```

use rust_decimal::Decimal;

use crate::error::{PricingError, PricingResult, ValidationError};
use crate::types::{DiscountTier, LineItem};

pub use crate::rounding::validate_precision;

/// Result type for validation operations.
pub type ValidationResult<T> = Result<T, ValidationError>;

/// Checks the fields the engine cannot default.
///
/// `index` is the line's position in the cart and ends up in the error.
pub fn validate_line_item(item: &LineItem, index: usize) -> PricingResult<()> {
    if item.product_id.trim().is_empty() {
        return Err(PricingError::MissingIdentity { index });
    }

    if item.quantity < 0 {
        return Err(ValidationError::MustBeNonNegative {
            field: "quantity".to_string(),
            value: item.quantity.to_string(),
        }
        .into());
    }

    Ok(())
}

/// Checks a percentage is within 0-100.
pub fn validate_percentage(field: &str, value: Decimal) -> ValidationResult<()> {
    if value < Decimal::ZERO || value > Decimal::ONE_HUNDRED {
        return Err(ValidationError::OutOfRange {
            field: field.to_string(),
            min: "0".to_string(),
            max: "100".to_string(),
            value: value.to_string(),
        });
    }
    Ok(())
}

/// Checks a tier list.
///
/// Overlapping ranges are legal: the resolver takes the first match.
pub fn validate_tiers(tiers: &[DiscountTier]) -> ValidationResult<()> {
    for (index, tier) in tiers.iter().enumerate() {
        if tier.min_quantity > tier.max_quantity {
            return Err(ValidationError::InvertedTier {
                index,
                min: tier.min_quantity,
                max: tier.max_quantity,
            });
        }
        validate_percentage("discountTier.value", tier.value)?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn test_line_item_identity() {
        assert!(validate_line_item(&LineItem::new("SKU-1", 1, dec!(1)).unwrap(), 0).is_ok());
        assert_eq!(
            validate_line_item(&LineItem::new("", 1, dec!(1)).unwrap(), 4),
            Err(PricingError::MissingIdentity { index: 4 })
        );
        assert_eq!(
            validate_line_item(&LineItem::new("   ", 1, dec!(1)).unwrap(), 0),
            Err(PricingError::MissingIdentity { index: 0 })
        );
    }

    #[test]
    fn test_line_item_negative_quantity() {
        let err = validate_line_item(&LineItem::new("SKU-1", -2, dec!(1)).unwrap(), 0).unwrap_err();
        assert!(matches!(
            err,
            PricingError::Validation(ValidationError::MustBeNonNegative { .. })
        ));
    }

    #[test]
    fn test_zero_quantity_is_allowed() {
        assert!(validate_line_item(&LineItem::new("SKU-1", 0, dec!(1)).unwrap(), 0).is_ok());
    }

    #[test]
    fn test_percentage_bounds() {
        assert!(validate_percentage("discount", dec!(0)).is_ok());
        assert!(validate_percentage("discount", dec!(100)).is_ok());
        assert!(validate_percentage("discount", dec!(12.5)).is_ok());
        assert!(validate_percentage("discount", dec!(-0.01)).is_err());
        assert!(validate_percentage("discount", dec!(100.01)).is_err());
    }

    #[test]
    fn test_tiers() {
        let ok = vec![
            DiscountTier::new(dec!(5), 1, 9),
            DiscountTier::new(dec!(10), 5, 99), // overlap is fine
        ];
        assert!(validate_tiers(&ok).is_ok());

        let inverted = vec![DiscountTier::new(dec!(5), 10, 1)];
        assert_eq!(
            validate_tiers(&inverted),
            Err(ValidationError::InvertedTier {
                index: 0,
                min: 10,
                max: 1
            })
        );

        let too_big = vec![DiscountTier::new(dec!(150), 1, 10)];
        assert!(validate_tiers(&too_big).is_err());
    }

    #[test]
    fn test_precision() {
        assert_eq!(validate_precision(2), Ok(2));
        assert!(validate_precision(-1).is_err());
    }
}

//! # Discount Tier Resolver
//!
//! Picks the one quantity tier that applies to a line and prices the line
//! with it.
//!
//! ## Resolution Flow
//! ```text
//! quantity (units) ──► ÷ packagingQuantity ──► completed packs (floored)
//!                                                   │
//!                                                   ▼
//!                      tiers, in list order: first with min ≤ q ≤ max
//!                                                   │
//!                                   ┌───────────────┴───────────────┐
//!                                   ▼                               ▼
//!                            Some(tier)                           None
//!                      discountPercentage = value      "no discount applies"
//! ```
//!
//! ## Overlapping Tiers
//! When ranges overlap, the first matching tier in list order wins. This is
//! the storefront's observed behaviour and is kept as-is; it is neither the
//! best nor the last match.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use tracing::{debug, trace};

use crate::error::{PricingError, PricingResult};
use crate::rounding::{extend, less_percent};
use crate::types::{DiscountTier, LineItem, PricingContext};

/// Result of a tier lookup.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SuitableDiscount {
    /// `None` means no discount applies. It is not an error.
    pub suitable_discount: Option<DiscountTier>,
}

impl SuitableDiscount {
    /// Percentage of the selected tier, zero when none matched.
    pub fn percentage(&self) -> Decimal {
        self.suitable_discount
            .as_ref()
            .map(|tier| tier.value)
            .unwrap_or(Decimal::ZERO)
    }
}

// =============================================================================
// Quantity Handling
// =============================================================================

/// Expresses a unit quantity in completed packs, the unit tiers are
/// authored in.
///
/// A trailing partial pack is dropped, so every unit count lands in exactly
/// the tier its whole packs reach and contiguous integer tiers leave no gaps.
/// A packaging quantity below 1 is treated as 1.
pub fn effective_tier_quantity(quantity: i64, packaging_quantity: i64) -> i64 {
    quantity.div_euclid(packaging_quantity.max(1))
}

/// Raises a requested quantity to something the product can be ordered in.
///
/// ## Rules
/// 1. At least the minimum order quantity (a MOQ ≤ 0 means no minimum)
/// 2. Rounded up to a whole multiple of the packaging quantity
///
/// ## Example
/// ```rust
/// use quotewise_core::discount::normalize_quantity;
///
/// // MOQ 10, packs of 6: asking for 4 gives 12
/// assert_eq!(normalize_quantity(4, 6, Some(10)).unwrap(), 12);
/// // Already valid quantities are untouched
/// assert_eq!(normalize_quantity(18, 6, Some(10)).unwrap(), 18);
/// ```
pub fn normalize_quantity(
    requested: i64,
    packaging_quantity: i64,
    min_order_quantity: Option<i64>,
) -> PricingResult<i64> {
    let packaging = packaging_quantity.max(1);
    let floor = min_order_quantity.unwrap_or(0).max(0);
    let quantity = requested.max(floor);

    if quantity <= 0 {
        return Ok(0);
    }

    let remainder = quantity % packaging;
    if remainder == 0 {
        return Ok(quantity);
    }
    quantity
        .checked_add(packaging - remainder)
        .ok_or(PricingError::Overflow { operation: "quantity" })
}

// =============================================================================
// Tier Selection
// =============================================================================

/// First tier, in list order, whose inclusive range contains the quantity.
pub fn select_tier(effective_quantity: i64, tiers: &[DiscountTier]) -> Option<&DiscountTier> {
    tiers.iter().find(|tier| tier.contains(effective_quantity))
}

/// Resolves the tier for a quantity in units.
///
/// ## Example
/// ```rust
/// use quotewise_core::discount::resolve_suitable_discount;
/// use quotewise_core::DiscountTier;
/// use rust_decimal::Decimal;
///
/// let tiers = vec![
///     DiscountTier::new(Decimal::from(5), 1, 9),
///     DiscountTier::new(Decimal::from(10), 10, 99),
/// ];
/// let resolved = resolve_suitable_discount(10, &tiers, 1);
/// assert_eq!(resolved.percentage(), Decimal::from(10));
/// ```
pub fn resolve_suitable_discount(
    quantity: i64,
    tiers: &[DiscountTier],
    packaging_quantity: i64,
) -> SuitableDiscount {
    let effective = effective_tier_quantity(quantity, packaging_quantity);
    let suitable_discount = select_tier(effective, tiers).cloned();

    trace!(
        quantity,
        packaging_quantity,
        effective,
        tiers = tiers.len(),
        matched = suitable_discount.is_some(),
        "Resolved discount tier"
    );

    SuitableDiscount { suitable_discount }
}

// =============================================================================
// Discount Application
// =============================================================================

/// Prices a line with its quantity tier.
///
/// Returns a new line; the input is not touched. `discountDetails` is
/// replaced wholesale with a fresh copy of the selected tier (or cleared),
/// then:
///
/// ```text
/// unitPrice  = round(unitListPrice × (100 − d) / 100)
/// totalPrice = round(unitPrice × quantity)
/// ```
pub fn apply_discount(
    item: &LineItem,
    tiers: &[DiscountTier],
    context: &PricingContext,
) -> PricingResult<LineItem> {
    let resolved = resolve_suitable_discount(item.quantity, tiers, item.effective_packaging());
    let percentage = resolved.percentage();

    let mut priced = item.clone();
    priced.unit_price = context.round(less_percent(item.unit_list_price, percentage)?)?;
    priced.total_price = context.round(extend(priced.unit_price, item.quantity, "totalPrice")?)?;
    priced.discount_percentage = percentage;
    priced.discount_details = resolved.suitable_discount;

    debug!(
        product_id = %item.product_id,
        quantity = item.quantity,
        discount = %percentage,
        unit_price = %priced.unit_price,
        total_price = %priced.total_price,
        "Applied discount tier"
    );

    Ok(priced)
}

//! # Cart Aggregator
//!
//! Folds every processed line into cart-level totals.
//!
//! ## Aggregation Flow
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                    Cart Aggregation                                     │
//! │                                                                         │
//! │  items ──► validate (identity) ──► calculate_item_taxes (each line)    │
//! │                                            │                            │
//! │                                            ▼                            │
//! │                               CartContribution per line                 │
//! │                                            │                            │
//! │                                            ▼                            │
//! │                     fold_contributions (full fold, no deltas)           │
//! │                                            │                            │
//! │                         ┌──────────────────┴───────────────┐            │
//! │                         ▼                                  ▼            │
//! │               Aggregate::Plain              Aggregate::VolumeOverridden │
//! │                                          (volume discount applied)      │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Why A Tagged Aggregate?
//! When a cart-level volume discount applies, its totals replace the plain
//! totals wholesale: subtotal, tax, taxable amount, rounding adjustment and
//! grand total all come from the same side. [`Aggregate`] holds exactly one
//! side, so a consumer cannot read plain tax next to an overridden subtotal.
//!
//! ## No Drift
//! Line figures are rounded once, at the line. Cart totals are exact sums of
//! those rounded figures, so `CGSTTotal` always equals Σ `CGSTValue`.

use std::collections::BTreeMap;

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};
use ts_rs::TS;

use crate::calculator::{calculate_item_taxes, contribution_of};
use crate::error::{PricingError, PricingResult, ValidationError};
use crate::rounding::{add, less_percent, round, sub, validate_precision};
use crate::types::{CartAggregate, CartContribution, LineItem, PricingContext};
use crate::validation::{validate_line_item, validate_percentage};

// =============================================================================
// Aggregate
// =============================================================================

/// The cart totals every downstream consumer reads.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[serde(tag = "kind", content = "totals", rename_all = "snake_case")]
#[ts(export)]
pub enum Aggregate {
    /// Per-line sums.
    Plain(CartAggregate),

    /// Totals recomputed under a cart-level volume discount.
    VolumeOverridden(CartAggregate),
}

impl Aggregate {
    /// The totals in force, whichever side that is.
    pub fn effective(&self) -> &CartAggregate {
        match self {
            Aggregate::Plain(totals) | Aggregate::VolumeOverridden(totals) => totals,
        }
    }

    pub fn into_effective(self) -> CartAggregate {
        match self {
            Aggregate::Plain(totals) | Aggregate::VolumeOverridden(totals) => totals,
        }
    }

    pub fn is_volume_overridden(&self) -> bool {
        matches!(self, Aggregate::VolumeOverridden(_))
    }

    pub fn subtotal(&self) -> Decimal {
        self.effective().total_value
    }

    pub fn total_tax(&self) -> Decimal {
        self.effective().total_tax
    }

    pub fn taxable_amount(&self) -> Decimal {
        self.effective().taxable_amount
    }

    pub fn rounding_adjustment(&self) -> Decimal {
        self.effective().rounding_adjustment
    }

    pub fn grand_total(&self) -> Decimal {
        self.effective().grand_total
    }

    /// `"<Name>Total"` from the side in force.
    pub fn tax_total(&self, tax_name: &str) -> Decimal {
        self.effective().tax_total(tax_name)
    }
}

// =============================================================================
// Volume Discount
// =============================================================================

/// A cart-level volume discount recomputation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct VolumeDiscountDetails {
    /// Only applied details override the plain totals.
    pub applied: bool,

    #[ts(type = "string")]
    pub percentage: Decimal,

    /// Plain subtotal minus discounted subtotal.
    #[ts(type = "string")]
    pub discount_amount: Decimal,

    /// Totals used when applied.
    pub totals: CartAggregate,
}

/// Output of [`aggregate_cart`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct CartOutcome {
    pub cart_value: Aggregate,
    pub processed_items: Vec<LineItem>,
}

impl CartOutcome {
    /// Swaps in the volume-discount totals when the details are applied.
    ///
    /// Processed lines keep their line-level figures either way.
    pub fn with_volume_discount(self, details: &VolumeDiscountDetails) -> Self {
        if !details.applied {
            return self;
        }

        debug!(
            percentage = %details.percentage,
            discount_amount = %details.discount_amount,
            grand_total = %details.totals.grand_total,
            "Volume discount overrides cart totals"
        );

        CartOutcome {
            cart_value: Aggregate::VolumeOverridden(details.totals.clone()),
            processed_items: self.processed_items,
        }
    }
}

// =============================================================================
// Fold
// =============================================================================

/// Folds line contributions into cart totals.
///
/// Every tax name seen on any line gets a total; lines without that
/// component contribute nothing to it.
///
/// ```text
/// grandTotal = totalValue + totalTax + totalShipping + pfRate + roundingAdjustment
/// ```
/// With `roundOffGrandTotal`, the grand total is rounded to whole units and
/// the difference is kept in `roundingAdjustment`.
pub fn fold_contributions<'a, I>(contributions: I, context: &PricingContext) -> PricingResult<CartAggregate>
where
    I: IntoIterator<Item = &'a CartContribution>,
{
    validate_precision(context.precision)?;

    let mut cart = CartAggregate::default();
    let mut tax_totals: BTreeMap<String, Decimal> = BTreeMap::new();

    for contribution in contributions {
        for (name, value) in &contribution.tax_totals {
            let slot = tax_totals.entry(name.clone()).or_insert(Decimal::ZERO);
            *slot = add(*slot, *value, "taxTotal")?;
        }
        cart.total_value = add(cart.total_value, contribution.total_value, "totalValue")?;
        cart.total_tax = add(cart.total_tax, contribution.total_tax, "totalTax")?;
        cart.total_shipping = add(cart.total_shipping, contribution.total_shipping, "totalShipping")?;
        cart.pf_rate = add(cart.pf_rate, contribution.pf_rate, "pfRate")?;
        cart.taxable_amount = add(cart.taxable_amount, contribution.taxable_amount, "taxableAmount")?;
        cart.total_lp = add(cart.total_lp, contribution.total_lp, "totalLP")?;
        cart.total_quantity = cart
            .total_quantity
            .checked_add(contribution.quantity)
            .ok_or(PricingError::Overflow { operation: "totalQuantity" })?;
        cart.total_items += 1;
    }
    cart.tax_totals = tax_totals;

    let raw_total = [cart.total_tax, cart.total_shipping, cart.pf_rate]
        .into_iter()
        .try_fold(cart.total_value, |acc, part| add(acc, part, "grandTotal"))?;
    cart.rounding_adjustment = if context.round_off_grand_total {
        sub(round(raw_total, 0)?, raw_total, "roundingAdjustment")?
    } else {
        Decimal::ZERO
    };
    cart.grand_total = add(raw_total, cart.rounding_adjustment, "grandTotal")?;

    Ok(cart)
}

// =============================================================================
// Aggregation
// =============================================================================

/// Runs the tax calculator over every line and folds the results.
///
/// Discounts must already be reflected in `unitPrice`/`totalPrice`.
///
/// ## Errors
/// - [`crate::PricingError::MissingIdentity`] for a line without a product id
/// - [`crate::PricingError::InvalidPrecision`] from rounding
///
/// Missing optional data is never an error.
pub fn aggregate_cart(items: &[LineItem], context: &PricingContext) -> PricingResult<CartOutcome> {
    for (index, item) in items.iter().enumerate() {
        validate_line_item(item, index)?;
    }

    let mut processed_items = Vec::with_capacity(items.len());
    let mut contributions = Vec::with_capacity(items.len());

    for item in items {
        let outcome = calculate_item_taxes(item, context)?;
        processed_items.push(outcome.updated_item);
        contributions.push(outcome.updated_cart_value);
    }

    let cart = fold_contributions(&contributions, context)?;

    debug!(
        items = cart.total_items,
        total_value = %cart.total_value,
        total_tax = %cart.total_tax,
        grand_total = %cart.grand_total,
        is_inter = context.is_inter,
        "Cart aggregated"
    );

    Ok(CartOutcome {
        cart_value: Aggregate::Plain(cart),
        processed_items,
    })
}

/// [`aggregate_cart`], then the volume-discount override when applied.
///
/// Applied `details` must describe this cart: they are recomputed from the
/// processed `items` at `details.percentage` and any difference in the
/// totals is rejected rather than shown.
///
/// ## Errors
/// [`ValidationError::StaleVolumeDiscount`] when the totals do not match.
pub fn aggregate_cart_with_volume_discount(
    items: &[LineItem],
    context: &PricingContext,
    details: &VolumeDiscountDetails,
) -> PricingResult<CartOutcome> {
    let outcome = aggregate_cart(items, context)?;
    if !details.applied {
        return Ok(outcome);
    }

    let expected = recompute_volume_discount(&outcome.processed_items, context, details.percentage)?;
    if expected.totals != details.totals {
        warn!(
            percentage = %details.percentage,
            expected_grand_total = %expected.totals.grand_total,
            supplied_grand_total = %details.totals.grand_total,
            "Volume discount totals do not match the cart"
        );
        return Err(ValidationError::StaleVolumeDiscount.into());
    }

    Ok(outcome.with_volume_discount(details))
}

/// Recomputes cart totals under a cart-level volume discount.
///
/// Every line's `unitPrice` and `totalPrice` are reduced by `percentage`
/// (rounded), taxes are recalculated on the reduced lines, and the results
/// are folded. The processed lines themselves are not changed.
///
/// ## Errors
/// A percentage outside 0-100 is a validation error.
pub fn recompute_volume_discount(
    processed_items: &[LineItem],
    context: &PricingContext,
    percentage: Decimal,
) -> PricingResult<VolumeDiscountDetails> {
    validate_percentage("volumeDiscount", percentage)?;
    for (index, item) in processed_items.iter().enumerate() {
        validate_line_item(item, index)?;
    }

    let plain_value = processed_items
        .iter()
        .try_fold(Decimal::ZERO, |acc, item| add(acc, item.total_price, "totalValue"))?;

    let mut contributions = Vec::with_capacity(processed_items.len());
    for item in processed_items {
        let mut discounted = item.clone();
        discounted.unit_price = context.round(less_percent(item.unit_price, percentage)?)?;
        discounted.total_price = context.round(less_percent(item.total_price, percentage)?)?;
        let outcome = calculate_item_taxes(&discounted, context)?;
        contributions.push(outcome.updated_cart_value);
    }

    let totals = fold_contributions(&contributions, context)?;
    let discount_amount = sub(plain_value, totals.total_value, "discountAmount")?;

    debug!(
        %percentage,
        %discount_amount,
        grand_total = %totals.grand_total,
        "Volume discount recomputed"
    );

    Ok(VolumeDiscountDetails {
        applied: percentage > Decimal::ZERO,
        percentage,
        discount_amount,
        totals,
    })
}

/// Cart totals for lines that are already computed, without recalculating.
pub fn summarize(processed_items: &[LineItem], context: &PricingContext) -> PricingResult<CartAggregate> {
    let contributions = processed_items
        .iter()
        .map(contribution_of)
        .collect::<PricingResult<Vec<CartContribution>>>()?;
    fold_contributions(&contributions, context)
}

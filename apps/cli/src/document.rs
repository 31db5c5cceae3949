//! # Cart Documents
//!
//! The JSON shape the `price` command reads and writes.
//!
//! ```text
//! ┌──────────────────────────────┐        ┌─────────────────────────────────┐
//! │ CartDocument (input)         │        │ PricedDocument (output)         │
//! │                              │        │                                 │
//! │ items: [LineItem]            │──────► │ cartValue: { kind, totals }     │
//! │ tiers: { productId: [Tier] } │ engine │ processedItems: [LineItem]      │
//! │                              │        │ volumeDiscount?: details        │
//! └──────────────────────────────┘        └─────────────────────────────────┘
//! ```
//!
//! Every line is priced from its `unitListPrice` and `quantity`, both of
//! which are required. Lines whose product has tiers get the matching tier's
//! discount; all others are priced at list. Any `unitPrice`/`totalPrice` in
//! the input is recomputed, never trusted.

use quotewise_core::validation::{validate_line_item, validate_tiers};
use quotewise_core::{
    aggregate_cart, apply_discount, recompute_volume_discount, Aggregate, DiscountTier, LineItem,
    PricingContext, PricingError, VolumeDiscountDetails,
};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::io::Read;
use tracing::{debug, info};

use crate::error::CliResult;

// =============================================================================
// Input
// =============================================================================

/// A cart as submitted for pricing.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CartDocument {
    pub items: Vec<LineItem>,

    /// Quantity tiers keyed by product id.
    #[serde(default)]
    pub tiers: BTreeMap<String, Vec<DiscountTier>>,
}

impl CartDocument {
    pub fn from_json(json: &str) -> CliResult<Self> {
        Ok(serde_json::from_str(json)?)
    }

    pub fn from_reader<R: Read>(reader: R) -> CliResult<Self> {
        Ok(serde_json::from_reader(reader)?)
    }

    /// Tiers for a product, empty when none were supplied.
    pub fn tiers_for(&self, product_id: &str) -> &[DiscountTier] {
        self.tiers.get(product_id).map(Vec::as_slice).unwrap_or(&[])
    }
}

// =============================================================================
// Output
// =============================================================================

/// The priced cart.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PricedDocument {
    pub cart_value: Aggregate,
    pub processed_items: Vec<LineItem>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub volume_discount: Option<VolumeDiscountDetails>,
}

// =============================================================================
// Pricing
// =============================================================================

/// Prices a whole document.
///
/// 1. every line and every tier list is validated
/// 2. every line is priced from list, with its tier discount if any
/// 3. the cart is aggregated
/// 4. a non-zero `volume_discount` recomputes the totals and overrides them
pub fn price_document(
    document: &CartDocument,
    context: &PricingContext,
    volume_discount: Option<Decimal>,
) -> CliResult<PricedDocument> {
    for (index, item) in document.items.iter().enumerate() {
        validate_line_item(item, index)?;
    }
    for tiers in document.tiers.values() {
        validate_tiers(tiers).map_err(PricingError::from)?;
    }

    let lines = document
        .items
        .iter()
        .map(|item| apply_discount(item, document.tiers_for(&item.product_id), context))
        .collect::<Result<Vec<_>, _>>()?;

    let outcome = aggregate_cart(&lines, context)?;

    let details = match volume_discount {
        Some(percentage) => Some(recompute_volume_discount(
            &outcome.processed_items,
            context,
            percentage,
        )?),
        None => None,
    };

    let outcome = match &details {
        Some(details) => outcome.with_volume_discount(details),
        None => outcome,
    };

    info!(
        lines = outcome.processed_items.len(),
        grand_total = %outcome.cart_value.grand_total(),
        volume_overridden = outcome.cart_value.is_volume_overridden(),
        "Cart priced"
    );
    debug!(is_inter = context.is_inter, precision = context.precision, "Pricing context");

    Ok(PricedDocument {
        cart_value: outcome.cart_value,
        processed_items: outcome.processed_items,
        volume_discount: details,
    })
}

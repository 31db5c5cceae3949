//! # Domain Types
//!
//! The data model the pricing engine reads and writes.
//!
//! ## Type Hierarchy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                         Domain Types                                    │
//! │                                                                         │
//! │  ┌─────────────────────┐        ┌─────────────────────┐                │
//! │  │      LineItem       │        │   PricingContext    │                │
//! │  │  ─────────────────  │        │  ─────────────────  │                │
//! │  │  productId          │        │  isInter            │                │
//! │  │  quantity / packs   │        │  precision          │                │
//! │  │  unitListPrice      │        │  taxExemption       │                │
//! │  │  hsnDetails ────────┼──┐     │  rounding           │                │
//! │  │  (computed fields)  │  │     └─────────────────────┘                │
//! │  └─────────────────────┘  │                                            │
//! │                           ▼                                            │
//! │  ┌─────────────────────┐  ┌─────────────────────┐                      │
//! │  │     HsnDetails      │  │    TaxRuleSet       │                      │
//! │  │  interTax ──────────┼─►│  totalTax           │                      │
//! │  │  intraTax ──────────┼─►│  taxReqLs: [        │                      │
//! │  └─────────────────────┘  │    TaxComponent ]   │                      │
//! │                           └─────────────────────┘                      │
//! │                                                                         │
//! │  ┌─────────────────────┐  ┌─────────────────────┐                      │
//! │  │   CartContribution  │─►│   CartAggregate     │  (full fold only)    │
//! │  └─────────────────────┘  └─────────────────────┘                      │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Open-Ended Tax Names
//! The set of tax components (GST, CGST, SGST, IGST, CESS, ...) comes from
//! the catalog, not from code. Per-component figures therefore live in maps
//! keyed by the tax name instead of named struct fields.

use std::collections::BTreeMap;

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use ts_rs::TS;

use crate::error::PricingResult;
use crate::rounding::{add, extend, sub, RoundingMode};

// =============================================================================
// Tax Classification
// =============================================================================

/// One tax component of a jurisdiction's rule set.
///
/// Position inside the containing list is significant: it is the order in
/// which components are applied, and compounding depends on it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct TaxComponent {
    /// Component name, e.g. "CGST".
    pub tax_name: String,

    /// Percentage rate (10 = 10%).
    #[serde(alias = "taxPercentage")]
    #[ts(type = "string")]
    pub rate: Decimal,

    /// Compound components tax the running total of earlier components.
    #[serde(default)]
    pub compound: bool,
}

impl TaxComponent {
    /// Builds a component from its parts.
    pub fn new(tax_name: impl Into<String>, rate: Decimal, compound: bool) -> Self {
        TaxComponent {
            tax_name: tax_name.into(),
            rate,
            compound,
        }
    }
}

/// A jurisdiction's rule set as supplied by catalog data.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize, TS)]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct TaxRuleSet {
    /// Headline percentage for display and the `prodTax` cross-check.
    #[serde(default)]
    #[ts(type = "string")]
    pub total_tax: Decimal,

    /// Ordered components.
    #[serde(default)]
    pub tax_req_ls: Vec<TaxComponent>,
}

/// Catalog tax classification carrying both parallel regimes.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize, TS)]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct HsnDetails {
    /// Rule set for cross-region supply.
    #[serde(default)]
    pub inter_tax: Option<TaxRuleSet>,

    /// Rule set for same-region supply.
    #[serde(default)]
    pub intra_tax: Option<TaxRuleSet>,
}

/// A component as it was actually applied to a line.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct TaxBreakupEntry {
    pub tax_name: String,
    #[ts(type = "string")]
    pub tax_percentage: Decimal,
    pub compound: bool,
}

impl From<&TaxComponent> for TaxBreakupEntry {
    fn from(component: &TaxComponent) -> Self {
        TaxBreakupEntry {
            tax_name: component.tax_name.clone(),
            tax_percentage: component.rate,
            compound: component.compound,
        }
    }
}

// =============================================================================
// Discount Tier
// =============================================================================

/// A quantity-tiered discount.
///
/// Bounds are inclusive and expressed in packs. Call sites name the fields
/// differently, hence the aliases.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct DiscountTier {
    /// Discount percentage (0-100).
    #[serde(alias = "discount", alias = "discountPercentage")]
    #[ts(type = "string")]
    pub value: Decimal,

    #[serde(alias = "minQty", alias = "min")]
    pub min_quantity: i64,

    #[serde(alias = "maxQty", alias = "max")]
    pub max_quantity: i64,
}

impl DiscountTier {
    pub fn new(value: Decimal, min_quantity: i64, max_quantity: i64) -> Self {
        DiscountTier {
            value,
            min_quantity,
            max_quantity,
        }
    }

    /// Inclusive range check on a whole-pack count.
    pub fn contains(&self, packs: i64) -> bool {
        (self.min_quantity..=self.max_quantity).contains(&packs)
    }
}

// =============================================================================
// Pricing Context
// =============================================================================

/// Per-calculation configuration. Never persisted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS)]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct PricingContext {
    /// Selects `interTax` (true) or `intraTax` (false).
    pub is_inter: bool,

    /// Decimal places for every rounded figure.
    pub precision: i32,

    /// Zeroes every tax output when set.
    #[serde(default)]
    pub tax_exemption: bool,

    /// Rounding strategy used by every component.
    #[serde(default)]
    pub rounding: RoundingMode,

    /// Round the grand total to whole units and record the adjustment.
    #[serde(default)]
    pub round_off_grand_total: bool,
}

impl PricingContext {
    /// Context with two decimal places and standard rounding.
    pub fn new(is_inter: bool, precision: i32) -> Self {
        PricingContext {
            is_inter,
            precision,
            ..Default::default()
        }
    }

    pub fn with_tax_exemption(mut self, exempt: bool) -> Self {
        self.tax_exemption = exempt;
        self
    }

    pub fn with_rounding(mut self, rounding: RoundingMode) -> Self {
        self.rounding = rounding;
        self
    }

    pub fn with_round_off(mut self, round_off: bool) -> Self {
        self.round_off_grand_total = round_off;
        self
    }

    /// Rounds with this context's strategy and precision.
    #[inline]
    pub fn round(&self, value: Decimal) -> crate::PricingResult<Decimal> {
        self.rounding.round(value, self.precision)
    }
}

impl Default for PricingContext {
    fn default() -> Self {
        PricingContext {
            is_inter: false,
            precision: crate::DEFAULT_PRECISION,
            tax_exemption: false,
            rounding: RoundingMode::default(),
            round_off_grand_total: false,
        }
    }
}

// =============================================================================
// Line Item
// =============================================================================

fn default_packaging() -> i64 {
    1
}

/// One product line in a cart, quote or order.
///
/// ## Input vs Computed
/// ```text
/// ┌───────────────────────────────┬─────────────────────────────────────────┐
/// │ INPUT                         │ COMPUTED (written by the engine)        │
/// ├───────────────────────────────┼─────────────────────────────────────────┤
/// │ productId, itemNo             │ discountPercentage, discountDetails     │
/// │ quantity, askedQuantity       │ unitPrice, totalPrice                   │
/// │ packagingQuantity, MOQ        │ tax, totalTax, prodTax                  │
/// │ unitListPrice, pfRate         │ taxValues { name → amount }             │
/// │ shippingCharges, hsnDetails   │ interTaxBreakup / intraTaxBreakup       │
/// └───────────────────────────────┴─────────────────────────────────────────┘
/// ```
/// `unitPrice`/`totalPrice` are also accepted as input when the caller has
/// already priced the line.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct LineItem {
    /// Product identifier. Required.
    #[serde(default)]
    pub product_id: String,

    /// Sequence number; `None` for lines that were never saved.
    #[serde(default)]
    pub item_no: Option<i64>,

    /// Required: a missing quantity is a parse error, never zero.
    pub quantity: i64,

    /// Originally requested quantity, used on reorder/clone.
    #[serde(default)]
    pub asked_quantity: Option<i64>,

    /// Units per pack.
    #[serde(default = "default_packaging")]
    pub packaging_quantity: i64,

    #[serde(default)]
    pub min_order_quantity: Option<i64>,

    /// Catalog price per unit. Required, like `quantity`.
    #[ts(type = "string")]
    pub unit_list_price: Decimal,

    /// Price per unit after discount.
    #[serde(default)]
    #[ts(type = "string")]
    pub unit_price: Decimal,

    /// `unitPrice × quantity`; the taxable base before packing charge.
    #[serde(default)]
    #[ts(type = "string")]
    pub total_price: Decimal,

    /// Packing/forwarding charge. An absolute amount, not a percentage.
    #[serde(default)]
    #[ts(type = "string | null")]
    pub pf_rate: Option<Decimal>,

    #[serde(default)]
    #[ts(type = "string | null")]
    pub shipping_charges: Option<Decimal>,

    /// Resolved discount percentage (0-100).
    #[serde(default, alias = "discount")]
    #[ts(type = "string")]
    pub discount_percentage: Decimal,

    /// The tier that produced `discountPercentage`. Replaced, never edited.
    #[serde(default)]
    pub discount_details: Option<DiscountTier>,

    #[serde(default)]
    pub hsn_details: Option<HsnDetails>,

    // -------------------------------------------------------------------------
    // Computed
    // -------------------------------------------------------------------------
    /// Selected jurisdiction's headline percentage.
    #[serde(default)]
    #[ts(type = "string")]
    pub tax: Decimal,

    /// Sum of `taxValues`.
    #[serde(default)]
    #[ts(type = "string")]
    pub total_tax: Decimal,

    /// `(totalPrice + pfRate) × tax / 100`, ignoring compounding.
    #[serde(default)]
    #[ts(type = "string")]
    pub prod_tax: Decimal,

    /// Per-component amount keyed by tax name ("GST" → `GSTValue`).
    #[serde(default)]
    #[ts(type = "Record<string, string>")]
    pub tax_values: BTreeMap<String, Decimal>,

    #[serde(default)]
    pub inter_tax_breakup: Vec<TaxBreakupEntry>,

    #[serde(default)]
    pub intra_tax_breakup: Vec<TaxBreakupEntry>,
}

impl LineItem {
    /// A new, unsaved line with packaging 1 and no tax classification.
    ///
    /// `unitPrice` starts at the list price and `totalPrice` at
    /// `unitListPrice × quantity` until a discount is applied.
    ///
    /// ## Errors
    /// [`crate::PricingError::Overflow`] when `unitListPrice × quantity` does not fit.
    pub fn new(product_id: impl Into<String>, quantity: i64, unit_list_price: Decimal) -> PricingResult<Self> {
        let total_price = extend(unit_list_price, quantity, "totalPrice")?;
        Ok(LineItem {
            product_id: product_id.into(),
            item_no: None,
            quantity,
            asked_quantity: Some(quantity),
            packaging_quantity: 1,
            min_order_quantity: None,
            unit_list_price,
            unit_price: unit_list_price,
            total_price,
            pf_rate: None,
            shipping_charges: None,
            discount_percentage: Decimal::ZERO,
            discount_details: None,
            hsn_details: None,
            tax: Decimal::ZERO,
            total_tax: Decimal::ZERO,
            prod_tax: Decimal::ZERO,
            tax_values: BTreeMap::new(),
            inter_tax_breakup: Vec::new(),
            intra_tax_breakup: Vec::new(),
        })
    }

    pub fn with_hsn_details(mut self, hsn: HsnDetails) -> Self {
        self.hsn_details = Some(hsn);
        self
    }

    pub fn with_pf_rate(mut self, pf_rate: Decimal) -> Self {
        self.pf_rate = Some(pf_rate);
        self
    }

    pub fn with_packaging(mut self, packaging_quantity: i64, min_order_quantity: Option<i64>) -> Self {
        self.packaging_quantity = packaging_quantity;
        self.min_order_quantity = min_order_quantity;
        self
    }

    /// A fresh copy for reorder/clone.
    ///
    /// The sequence number is dropped, the originally asked quantity is
    /// restored and every computed field is reset so nothing stale survives
    /// into the next calculation.
    pub fn for_reorder(&self) -> PricingResult<Self> {
        let quantity = self.asked_quantity.unwrap_or(self.quantity);
        let mut line = LineItem::new(self.product_id.clone(), quantity, self.unit_list_price)?;
        line.packaging_quantity = self.packaging_quantity;
        line.min_order_quantity = self.min_order_quantity;
        line.pf_rate = self.pf_rate;
        line.shipping_charges = self.shipping_charges;
        line.hsn_details = self.hsn_details.clone();
        Ok(line)
    }

    /// Packing/forwarding charge, zero when absent.
    #[inline]
    pub fn pf_rate_or_zero(&self) -> Decimal {
        self.pf_rate.unwrap_or(Decimal::ZERO)
    }

    #[inline]
    pub fn shipping_or_zero(&self) -> Decimal {
        self.shipping_charges.unwrap_or(Decimal::ZERO)
    }

    /// `totalPrice + pfRate`. Never clamped.
    #[inline]
    pub fn taxable_base(&self) -> PricingResult<Decimal> {
        add(self.total_price, self.pf_rate_or_zero(), "taxableAmount")
    }

    /// Packaging quantity, treating anything below 1 as 1.
    #[inline]
    pub fn effective_packaging(&self) -> i64 {
        self.packaging_quantity.max(1)
    }

    /// `unitListPrice × quantity`.
    #[inline]
    pub fn list_total(&self) -> PricingResult<Decimal> {
        extend(self.unit_list_price, self.quantity, "totalLP")
    }

    /// Amount computed for one component (the `"<Name>Value"` field).
    pub fn tax_value(&self, tax_name: &str) -> Decimal {
        self.tax_values.get(tax_name).copied().unwrap_or(Decimal::ZERO)
    }

    /// The breakup for one jurisdiction.
    pub fn breakup(&self, is_inter: bool) -> &[TaxBreakupEntry] {
        if is_inter {
            &self.inter_tax_breakup
        } else {
            &self.intra_tax_breakup
        }
    }
}

// =============================================================================
// Cart Figures
// =============================================================================

/// One line's share of the cart totals, produced by the tax calculator.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize, TS)]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct CartContribution {
    /// Per-component amounts keyed by tax name (`"<Name>Total"` share).
    #[ts(type = "Record<string, string>")]
    pub tax_totals: BTreeMap<String, Decimal>,
    #[ts(type = "string")]
    pub total_value: Decimal,
    #[ts(type = "string")]
    pub total_tax: Decimal,
    #[ts(type = "string")]
    pub total_shipping: Decimal,
    #[ts(type = "string")]
    pub pf_rate: Decimal,
    #[ts(type = "string")]
    pub taxable_amount: Decimal,
    #[ts(type = "string")]
    pub total_lp: Decimal,
    pub quantity: i64,
}

/// Cart-level totals. Always derived by a full fold over every line.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize, TS)]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct CartAggregate {
    /// Running total per tax name (the `"<Name>Total"` fields).
    #[ts(type = "Record<string, string>")]
    pub tax_totals: BTreeMap<String, Decimal>,
    /// Σ totalPrice
    #[ts(type = "string")]
    pub total_value: Decimal,
    /// Σ totalTax
    #[ts(type = "string")]
    pub total_tax: Decimal,
    #[ts(type = "string")]
    pub total_shipping: Decimal,
    /// Σ pfRate
    #[ts(type = "string")]
    pub pf_rate: Decimal,
    /// Σ (totalPrice + pfRate)
    #[ts(type = "string")]
    pub taxable_amount: Decimal,
    #[ts(type = "string")]
    pub rounding_adjustment: Decimal,
    #[ts(type = "string")]
    pub grand_total: Decimal,
    /// Number of lines.
    pub total_items: usize,
    /// Σ quantity
    pub total_quantity: i64,
    /// Σ unitListPrice × quantity
    #[serde(rename = "totalLP")]
    #[ts(type = "string")]
    pub total_lp: Decimal,
}

impl CartAggregate {
    /// Cart total for one component (the `"<Name>Total"` field).
    pub fn tax_total(&self, tax_name: &str) -> Decimal {
        self.tax_totals.get(tax_name).copied().unwrap_or(Decimal::ZERO)
    }

    /// List value minus selling value.
    pub fn savings(&self) -> PricingResult<Decimal> {
        sub(self.total_lp, self.total_value, "savings")
    }
}

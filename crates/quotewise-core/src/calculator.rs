//! # Line Item Tax Calculator
//!
//! Applies the selected tax components to one line's taxable base.
//!
//! ## Compounding
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  base = totalPrice + pfRate = 1000 + 50 = 1050                          │
//! │                                                                         │
//! │  GST   10%  non-compound  → round(1050 × 10 / 100) = 105.00             │
//! │                             running = 105.00                            │
//! │  CESS   2%  compound      → round(running × 2 / 100) = 2.10             │
//! │                             running = 107.10                            │
//! │                                                                         │
//! │  totalTax = 107.10    (Σ component values)                              │
//! │  tax      = 12        (headline percentage from the catalog)            │
//! │  prodTax  = round(1050 × 12 / 100) = 126.00   (ignores compounding)     │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//! A compound component taxes the running sum of the component values
//! computed before it in the same pass, never the original base. Moving it
//! earlier in the list changes the result.
//!
//! `prodTax` and `totalTax` are separate outputs read by different
//! consumers. They are expected to differ whenever a component compounds.

use std::collections::BTreeMap;

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use tracing::trace;

use crate::discount::apply_discount;
use crate::error::PricingResult;
use crate::rounding::{add, percent_of, validate_precision};
use crate::tax::select_tax_components;
use crate::types::{CartContribution, DiscountTier, LineItem, PricingContext, TaxBreakupEntry};

/// Output of [`calculate_item_taxes`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ItemTaxOutcome {
    pub updated_item: LineItem,
    /// This line's share of the cart totals.
    pub updated_cart_value: CartContribution,
}

/// Computes every tax figure for one line.
///
/// Pure: the input is cloned, never mutated, and identical inputs give
/// identical outputs.
///
/// ## Errors
/// [`crate::PricingError::InvalidPrecision`] for a negative precision, even
/// when the line is tax exempt.
pub fn calculate_item_taxes(item: &LineItem, context: &PricingContext) -> PricingResult<ItemTaxOutcome> {
    validate_precision(context.precision)?;

    let mut updated = item.clone();

    if context.tax_exemption {
        updated.tax = Decimal::ZERO;
        updated.total_tax = Decimal::ZERO;
        updated.prod_tax = Decimal::ZERO;
        updated.tax_values = BTreeMap::new();
        updated.inter_tax_breakup = Vec::new();
        updated.intra_tax_breakup = Vec::new();

        trace!(product_id = %item.product_id, "Tax exempt, tax outputs zeroed");

        let contribution = contribution_of(&updated)?;
        return Ok(ItemTaxOutcome {
            updated_item: updated,
            updated_cart_value: contribution,
        });
    }

    let base = item.taxable_base()?;
    let selected = select_tax_components(item, context.is_inter);

    let mut tax_values: BTreeMap<String, Decimal> = BTreeMap::new();
    let mut running = Decimal::ZERO;

    for component in &selected.components {
        let taxed_on = if component.compound { running } else { base };
        let value = context.round(percent_of(taxed_on, component.rate)?)?;

        trace!(
            tax = %component.tax_name,
            rate = %component.rate,
            compound = component.compound,
            %taxed_on,
            %value,
            "Applied tax component"
        );

        // A name repeated in the list accumulates so the sum invariant holds
        let slot = tax_values.entry(component.tax_name.clone()).or_insert(Decimal::ZERO);
        *slot = add(*slot, value, "taxValue")?;
        running = add(running, value, "totalTax")?;
    }

    updated.tax = selected.total_tax_percentage;
    updated.total_tax = running;
    updated.prod_tax = context.round(percent_of(base, selected.total_tax_percentage)?)?;
    updated.tax_values = tax_values;

    let breakup: Vec<TaxBreakupEntry> = selected.components.iter().map(TaxBreakupEntry::from).collect();
    if context.is_inter {
        updated.inter_tax_breakup = breakup;
    } else {
        updated.intra_tax_breakup = breakup;
    }

    let contribution = contribution_of(&updated)?;
    Ok(ItemTaxOutcome {
        updated_item: updated,
        updated_cart_value: contribution,
    })
}

/// Applies the quantity discount, then computes taxes on the discounted line.
pub fn price_line(
    item: &LineItem,
    tiers: &[DiscountTier],
    context: &PricingContext,
) -> PricingResult<ItemTaxOutcome> {
    let discounted = apply_discount(item, tiers, context)?;
    calculate_item_taxes(&discounted, context)
}

/// A computed line's share of the cart totals.
pub(crate) fn contribution_of(item: &LineItem) -> PricingResult<CartContribution> {
    Ok(CartContribution {
        tax_totals: item.tax_values.clone(),
        total_value: item.total_price,
        total_tax: item.total_tax,
        total_shipping: item.shipping_or_zero(),
        pf_rate: item.pf_rate_or_zero(),
        taxable_amount: item.taxable_base()?,
        total_lp: item.list_total()?,
        quantity: item.quantity,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{HsnDetails, TaxComponent, TaxRuleSet};
    use crate::PricingError;
    use rust_decimal_macros::dec;

    fn intra_only(total_tax: Decimal, components: Vec<TaxComponent>) -> HsnDetails {
        HsnDetails {
            inter_tax: None,
            intra_tax: Some(TaxRuleSet {
                total_tax,
                tax_req_ls: components,
            }),
        }
    }

    fn priced_line(total_price: Decimal, pf_rate: Option<Decimal>) -> LineItem {
        let mut item = LineItem::new("SKU-1", 1, total_price).unwrap();
        item.pf_rate = pf_rate;
        item
    }

    fn gst_cess_line() -> LineItem {
        priced_line(dec!(1000), Some(dec!(50))).with_hsn_details(intra_only(
            dec!(12),
            vec![
                TaxComponent::new("GST", dec!(10), false),
                TaxComponent::new("CESS", dec!(2), true),
            ],
        ))
    }

    fn dual_regime_line() -> LineItem {
        priced_line(dec!(1000), None).with_hsn_details(HsnDetails {
            inter_tax: Some(TaxRuleSet {
                total_tax: dec!(10),
                tax_req_ls: vec![TaxComponent::new("IGST", dec!(10), false)],
            }),
            intra_tax: Some(TaxRuleSet {
                total_tax: dec!(8),
                tax_req_ls: vec![
                    TaxComponent::new("CGST", dec!(4), false),
                    TaxComponent::new("SGST", dec!(4), false),
                ],
            }),
        })
    }

    #[test]
    fn test_compound_taxes_running_total() {
        let ctx = PricingContext::new(false, 2);
        let out = calculate_item_taxes(&gst_cess_line(), &ctx).unwrap().updated_item;

        assert_eq!(out.tax_value("GST"), dec!(105));
        assert_eq!(out.tax_value("CESS"), dec!(2.1));
        assert_eq!(out.total_tax, dec!(107.1));
        assert_eq!(out.tax, dec!(12));
    }

    #[test]
    fn test_prod_tax_ignores_compounding() {
        let ctx = PricingContext::new(false, 2);
        let out = calculate_item_taxes(&gst_cess_line(), &ctx).unwrap().updated_item;

        assert_eq!(out.prod_tax, dec!(126));
        assert_ne!(out.prod_tax, out.total_tax);
    }

    #[test]
    fn test_compound_first_taxes_nothing() {
        // Compound before anything else runs on an empty running total
        let item = priced_line(dec!(1000), None).with_hsn_details(intra_only(
            dec!(12),
            vec![
                TaxComponent::new("CESS", dec!(2), true),
                TaxComponent::new("GST", dec!(10), false),
            ],
        ));
        let ctx = PricingContext::new(false, 2);
        let out = calculate_item_taxes(&item, &ctx).unwrap().updated_item;

        assert_eq!(out.tax_value("CESS"), Decimal::ZERO);
        assert_eq!(out.tax_value("GST"), dec!(100));
        assert_eq!(out.total_tax, dec!(100));
    }

    #[test]
    fn test_jurisdiction_inter() {
        let ctx = PricingContext::new(true, 2);
        let out = calculate_item_taxes(&dual_regime_line(), &ctx).unwrap().updated_item;

        assert_eq!(out.tax, dec!(10));
        assert_eq!(out.tax_value("IGST"), dec!(100));
        assert!(!out.tax_values.contains_key("CGST"));
        assert!(!out.tax_values.contains_key("SGST"));
        assert_eq!(out.inter_tax_breakup.len(), 1);
        assert!(out.intra_tax_breakup.is_empty());
    }

    #[test]
    fn test_jurisdiction_intra() {
        let ctx = PricingContext::new(false, 2);
        let out = calculate_item_taxes(&dual_regime_line(), &ctx).unwrap().updated_item;

        assert_eq!(out.tax, dec!(8));
        assert_eq!(out.tax_value("CGST"), dec!(40));
        assert_eq!(out.tax_value("SGST"), dec!(40));
        assert!(!out.tax_values.contains_key("IGST"));
        assert_eq!(out.total_tax, dec!(80));
        let names: Vec<_> = out.intra_tax_breakup.iter().map(|b| b.tax_name.as_str()).collect();
        assert_eq!(names, vec!["CGST", "SGST"]);
    }

    #[test]
    fn test_zero_base_taxes_pf_rate() {
        let item = priced_line(Decimal::ZERO, Some(dec!(50)))
            .with_hsn_details(intra_only(dec!(10), vec![TaxComponent::new("GST", dec!(10), false)]));
        let ctx = PricingContext::new(false, 2);
        let out = calculate_item_taxes(&item, &ctx).unwrap().updated_item;

        assert_eq!(out.tax_value("GST"), dec!(5));
        assert_eq!(out.prod_tax, dec!(5));
        assert_eq!(out.total_tax, dec!(5));
    }

    #[test]
    fn test_missing_hsn_is_zero() {
        let item = priced_line(dec!(1000), Some(dec!(50)));
        let ctx = PricingContext::new(true, 2);
        let outcome = calculate_item_taxes(&item, &ctx).unwrap();
        let out = &outcome.updated_item;

        assert_eq!(out.tax, Decimal::ZERO);
        assert_eq!(out.total_tax, Decimal::ZERO);
        assert_eq!(out.prod_tax, Decimal::ZERO);
        assert!(out.tax_values.is_empty());
        // Still contributes its value to the cart
        assert_eq!(outcome.updated_cart_value.total_value, dec!(1000));
        assert_eq!(outcome.updated_cart_value.taxable_amount, dec!(1050));
    }

    #[test]
    fn test_undefined_pf_rate_is_zero() {
        let item = priced_line(dec!(1000), None)
            .with_hsn_details(intra_only(dec!(10), vec![TaxComponent::new("GST", dec!(10), false)]));
        let ctx = PricingContext::new(false, 2);
        let outcome = calculate_item_taxes(&item, &ctx).unwrap();

        assert_eq!(outcome.updated_item.tax_value("GST"), dec!(100));
        assert_eq!(outcome.updated_cart_value.pf_rate, Decimal::ZERO);
    }

    #[test]
    fn test_breakup_replaced_not_appended() {
        let ctx = PricingContext::new(false, 2);
        let first = calculate_item_taxes(&dual_regime_line(), &ctx).unwrap().updated_item;
        let second = calculate_item_taxes(&first, &ctx).unwrap().updated_item;

        assert_eq!(second.intra_tax_breakup.len(), 2);
        assert_eq!(second.intra_tax_breakup, first.intra_tax_breakup);
    }

    #[test]
    fn test_other_breakup_left_untouched() {
        let intra_ctx = PricingContext::new(false, 2);
        let inter_ctx = PricingContext::new(true, 2);

        let intra = calculate_item_taxes(&dual_regime_line(), &intra_ctx).unwrap().updated_item;
        let both = calculate_item_taxes(&intra, &inter_ctx).unwrap().updated_item;

        assert_eq!(both.intra_tax_breakup, intra.intra_tax_breakup);
        assert_eq!(both.inter_tax_breakup.len(), 1);
        // Values are recomputed for the current jurisdiction only
        assert!(!both.tax_values.contains_key("CGST"));
        assert_eq!(both.total_tax, dec!(100));
    }

    #[test]
    fn test_stale_values_dropped_on_recalculation() {
        let mut item = dual_regime_line();
        item.tax_values.insert("VAT".to_string(), dec!(999));
        item.total_tax = dec!(999);

        let ctx = PricingContext::new(true, 2);
        let out = calculate_item_taxes(&item, &ctx).unwrap().updated_item;

        assert!(!out.tax_values.contains_key("VAT"));
        assert_eq!(out.total_tax, out.tax_values.values().copied().sum::<Decimal>());
    }

    #[test]
    fn test_tax_exemption_zeroes_everything() {
        let first = calculate_item_taxes(&gst_cess_line(), &PricingContext::new(false, 2))
            .unwrap()
            .updated_item;
        let ctx = PricingContext::new(false, 2).with_tax_exemption(true);
        let outcome = calculate_item_taxes(&first, &ctx).unwrap();
        let out = &outcome.updated_item;

        assert_eq!(out.tax, Decimal::ZERO);
        assert_eq!(out.total_tax, Decimal::ZERO);
        assert_eq!(out.prod_tax, Decimal::ZERO);
        assert!(out.tax_values.is_empty());
        assert!(out.intra_tax_breakup.is_empty());
        assert!(out.inter_tax_breakup.is_empty());
        assert!(outcome.updated_cart_value.tax_totals.is_empty());
        assert_eq!(outcome.updated_cart_value.total_value, dec!(1000));
    }

    #[test]
    fn test_negative_precision_fails() {
        let ctx = PricingContext::new(false, -1);
        let err = calculate_item_taxes(&gst_cess_line(), &ctx).unwrap_err();
        assert!(matches!(err, PricingError::InvalidPrecision { precision: -1, .. }));
    }

    #[test]
    fn test_negative_precision_fails_even_when_exempt() {
        let ctx = PricingContext::new(false, -1).with_tax_exemption(true);
        assert!(calculate_item_taxes(&gst_cess_line(), &ctx).is_err());
    }

    #[test]
    fn test_negative_precision_fails_without_hsn() {
        let ctx = PricingContext::new(false, -2);
        assert!(calculate_item_taxes(&priced_line(dec!(10), None), &ctx).is_err());
    }

    #[test]
    fn test_idempotent() {
        let ctx = PricingContext::new(false, 2);
        let a = calculate_item_taxes(&gst_cess_line(), &ctx).unwrap();
        let b = calculate_item_taxes(&gst_cess_line(), &ctx).unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn test_input_not_mutated() {
        let item = gst_cess_line();
        let snapshot = item.clone();
        let ctx = PricingContext::new(false, 2);

        let outcome = calculate_item_taxes(&item, &ctx).unwrap();

        assert_eq!(item, snapshot);
        assert_ne!(outcome.updated_item, snapshot);
    }

    #[test]
    fn test_contribution_matches_line() {
        let ctx = PricingContext::new(false, 2);
        let outcome = calculate_item_taxes(&gst_cess_line(), &ctx).unwrap();
        let c = &outcome.updated_cart_value;

        assert_eq!(c.tax_totals, outcome.updated_item.tax_values);
        assert_eq!(c.total_tax, dec!(107.1));
        assert_eq!(c.pf_rate, dec!(50));
        assert_eq!(c.taxable_amount, dec!(1050));
        assert_eq!(c.quantity, 1);
    }

    #[test]
    fn test_rounding_follows_context() {
        // 333.33 × 5% = 16.6665
        let item = priced_line(dec!(333.33), None)
            .with_hsn_details(intra_only(dec!(5), vec![TaxComponent::new("GST", dec!(5), false)]));

        let half_up = PricingContext::new(false, 3);
        let truncate = PricingContext::new(false, 3).with_rounding(crate::RoundingMode::Truncate);

        assert_eq!(
            calculate_item_taxes(&item, &half_up).unwrap().updated_item.tax_value("GST"),
            dec!(16.667)
        );
        assert_eq!(
            calculate_item_taxes(&item, &truncate).unwrap().updated_item.tax_value("GST"),
            dec!(16.666)
        );
    }

    #[test]
    fn test_oversized_base_is_an_overflow_error() {
        let mut item = gst_cess_line();
        item.total_price = Decimal::MAX;
        let ctx = PricingContext::new(false, 2);
        assert_eq!(
            calculate_item_taxes(&item, &ctx).unwrap_err(),
            PricingError::Overflow { operation: "taxableAmount" }
        );

        // fits the base, but not the component product
        item.pf_rate = None;
        assert!(matches!(
            calculate_item_taxes(&item, &ctx),
            Err(PricingError::Overflow { .. })
        ));
    }

    #[test]
    fn test_price_line_discounts_then_taxes() {
        let mut item = LineItem::new("SKU-1", 10, dec!(100)).unwrap()
            .with_hsn_details(intra_only(dec!(10), vec![TaxComponent::new("GST", dec!(10), false)]));
        item.pf_rate = Some(dec!(20));
        let tiers = vec![DiscountTier::new(dec!(10), 10, 99)];
        let ctx = PricingContext::new(false, 2);

        let out = price_line(&item, &tiers, &ctx).unwrap().updated_item;

        assert_eq!(out.total_price, dec!(900));
        // (900 + 20) × 10%
        assert_eq!(out.tax_value("GST"), dec!(92));
    }
}

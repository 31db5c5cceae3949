//! # Tax Component Resolver
//!
//! Chooses which of a line's two parallel rule sets applies.
//!
//! ```text
//! hsnDetails ─┬─ interTax { totalTax, taxReqLs } ◄── isInter = true
//!             └─ intraTax { totalTax, taxReqLs } ◄── isInter = false
//! ```
//!
//! A missing side, or a side with no components, resolves to a zero
//! percentage and no components. Taxation degrades to zero; it never fails.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::types::{LineItem, TaxComponent, TaxRuleSet};

/// The rule set selected for one calculation.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SelectedTaxes {
    pub total_tax_percentage: Decimal,
    /// Components in source order.
    pub components: Vec<TaxComponent>,
}

impl SelectedTaxes {
    pub fn is_empty(&self) -> bool {
        self.components.is_empty()
    }

    /// Sum of the component rates, ignoring compounding.
    pub fn nominal_rate(&self) -> Decimal {
        self.components.iter().map(|c| c.rate).sum()
    }

    /// True when any component compounds.
    pub fn has_compound(&self) -> bool {
        self.components.iter().any(|c| c.compound)
    }
}

/// Borrows the rule set for a jurisdiction, if the catalog supplied one.
pub fn rule_set(item: &LineItem, is_inter: bool) -> Option<&TaxRuleSet> {
    let hsn = item.hsn_details.as_ref()?;
    if is_inter {
        hsn.inter_tax.as_ref()
    } else {
        hsn.intra_tax.as_ref()
    }
}

/// Selects the ordered tax components for a line.
pub fn select_tax_components(item: &LineItem, is_inter: bool) -> SelectedTaxes {
    match rule_set(item, is_inter) {
        Some(rules) if !rules.tax_req_ls.is_empty() => SelectedTaxes {
            total_tax_percentage: rules.total_tax,
            components: rules.tax_req_ls.clone(),
        },
        _ => SelectedTaxes::default(),
    }
}

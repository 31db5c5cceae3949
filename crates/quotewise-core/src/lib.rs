//! # quotewise-core: Order Pricing & Tax Engine
//!
//! This crate turns a set of cart lines into legally significant figures:
//! price after discount, per-component tax amounts, total tax and grand
//! total. Every function is pure and deterministic.
//!
//! ## Architecture Position
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                       Quotewise Pricing Flow                            │
//! │                                                                         │
//! │   catalog data (hsnDetails, tiers)          PricingContext              │
//! │              │                                     │                    │
//! │  ┌───────────▼─────────────────────────────────────▼───────────────┐   │
//! │  │               ★ quotewise-core (THIS CRATE) ★                   │   │
//! │  │                                                                 │   │
//! │  │   rounding ──┬──► discount ──┐                                  │   │
//! │  │              └──► tax ───────┼──► calculator ──► cart           │   │
//! │  │                              │                                  │   │
//! │  │   NO I/O • NO DATABASE • NO NETWORK • PURE FUNCTIONS           │   │
//! │  └──────────────────────────────────────┬──────────────────────────┘   │
//! │                                         │ CartOutcome                   │
//! │                                         ▼                               │
//! │        order/quote DTO builders, cart summary UI (read only)            │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Modules
//!
//! - [`rounding`] - The one rounding function and the injectable strategy
//! - [`discount`] - Quantity tier resolution and discount application
//! - [`tax`] - Inter/intra rule-set selection
//! - [`calculator`] - Per-line tax computation with compounding
//! - [`cart`] - Full-fold cart aggregation and the volume-discount override
//! - [`types`] - Line items, tax components, tiers, context, aggregates
//! - [`validation`] - Input-contract checks
//! - [`error`] - Domain error types
//!
//! ## Design Principles
//!
//! 1. **Pure Functions**: same input = same output, inputs are never mutated
//! 2. **Decimal Money**: no floating point anywhere in a total
//! 3. **Round Once**: line figures are rounded, cart figures are exact sums
//! 4. **Degrade, Don't Fail**: missing catalog data means zero tax, not an error
//!
//! ## Example Usage
//!
//! ```rust
//! use quotewise_core::{aggregate_cart, HsnDetails, LineItem, PricingContext, TaxComponent, TaxRuleSet};
//! use rust_decimal::Decimal;
//!
//! let line = LineItem::new("SKU-42", 1, Decimal::from(1000)).unwrap()
//!     .with_pf_rate(Decimal::from(50))
//!     .with_hsn_details(HsnDetails {
//!         inter_tax: None,
//!         intra_tax: Some(TaxRuleSet {
//!             total_tax: Decimal::from(12),
//!             tax_req_ls: vec![
//!                 TaxComponent::new("GST", Decimal::from(10), false),
//!                 TaxComponent::new("CESS", Decimal::from(2), true),
//!             ],
//!         }),
//!     });
//!
//! let outcome = aggregate_cart(&[line], &PricingContext::new(false, 2)).unwrap();
//!
//! assert_eq!(outcome.processed_items[0].tax_value("GST"), Decimal::from(105));
//! assert_eq!(outcome.cart_value.total_tax(), Decimal::new(1071, 1)); // 107.1
//! ```

// =============================================================================
// Module Declarations
// =============================================================================

pub mod calculator;
pub mod cart;
pub mod discount;
pub mod error;
pub mod rounding;
pub mod tax;
pub mod types;
pub mod validation;

// =============================================================================
// Re-exports for Convenience
// =============================================================================

pub use calculator::{calculate_item_taxes, price_line, ItemTaxOutcome};
pub use cart::{
    aggregate_cart, aggregate_cart_with_volume_discount, fold_contributions, recompute_volume_discount,
    summarize, Aggregate, CartOutcome, VolumeDiscountDetails,
};
pub use discount::{apply_discount, normalize_quantity, resolve_suitable_discount, SuitableDiscount};
pub use error::{PricingError, PricingResult, ValidationError};
pub use rounding::{round, RoundingMode};
pub use tax::{select_tax_components, SelectedTaxes};
pub use types::*;

// =============================================================================
// Crate-Level Constants
// =============================================================================

/// Decimal places used when a caller does not choose one.
pub const DEFAULT_PRECISION: i32 = 2;

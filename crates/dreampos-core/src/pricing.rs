//! # Pricing Composer
//!
//! Product × variation selection → unit price.
//!
//! ```text
//! unit_price = base_price + Σ selected.price_modifier
//!
//! latte (450) + Large (+80)            = 530
//! latte (450) + Large (+80) + Oat (+60) = 590
//! ```
//!
//! No clamping: a selection whose modifiers push the price below zero yields a
//! negative unit price, and the caller decides what to do with it.

use crate::catalog::{Product, VariationSelection};
use crate::money::Money;

/// Computes the unit price for a product with the given selection.
///
/// ```rust
/// use dreampos_core::catalog::Product;
/// use dreampos_core::money::Money;
/// use dreampos_core::pricing::unit_price;
///
/// let latte = Product::new("latte", Money::from_cents(450))
///     .with_variation("Large", Money::from_cents(80));
/// let large = latte.select(&["Large"]).unwrap();
///
/// assert_eq!(unit_price(&latte, &large).cents(), 530);
/// ```
#[inline]
pub fn unit_price(product: &Product, selection: &VariationSelection) -> Money {
    product.base_price + selection.price_delta()
}

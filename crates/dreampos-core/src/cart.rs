//! # Cart Aggregate
//!
//! Keyed cart lines, quantities, and the derived subtotal / discount / tip / total.
//!
//! ## Cart Operations Flow
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                    Cart Operations                                      │
//! │                                                                         │
//! │  Cashier Action           Cart Method              State Change         │
//! │  ──────────────           ───────────              ────────────         │
//! │                                                                         │
//! │  Tap product ───────────► add_item() ───────────► line.qty += n        │
//! │                                                    (or new line)        │
//! │  − / + buttons ─────────► update_quantity() ────► qty += delta         │
//! │                                                    (≤ 0 removes line)   │
//! │  Trash icon ────────────► remove_item() ────────► line removed         │
//! │                                                                         │
//! │  Clear all ─────────────► clear() ──────────────► empty, tip 0,        │
//! │                                                    split off            │
//! │  Add tip ───────────────► set_tip() ────────────► tip (locked once a   │
//! │                                                    split payer paid)    │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Line Identity
//! A line is keyed by `CartItemKey` = product id + sorted variation names, so
//! "latte + Large + Oat" and "latte + Oat + Large" land on one line while
//! "latte + Large" is a separate line. Lines keep insertion order, which is the
//! order the split allocator expands unit instances in.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use tracing::{debug, warn};
use ts_rs::TS;

use crate::catalog::{Product, VariationSelection};
use crate::discount::{CartDiscount, Promotion, Promotions};
use crate::error::{CoreError, CoreResult};
use crate::money::Money;
use crate::pricing::unit_price;
use crate::split::SplitAllocator;
use crate::MAX_ITEM_QUANTITY;

// =============================================================================
// Cart Item Key
// =============================================================================

const KEY_SEPARATOR: &str = "___";
const VARIATION_SEPARATOR: &str = "|||";
const NO_VARIATIONS: &str = "default";

/// Canonical, order-independent identity of a cart line.
///
/// ## Format
/// ```text
/// latte___Large|||Oat milk     (variations sorted by name)
/// croissant___default          (no variations)
/// ```
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, TS)]
#[serde(transparent)]
#[ts(export)]
pub struct CartItemKey(String);

impl CartItemKey {
    /// Derives the key for a product and selection.
    ///
    /// ```rust
    /// use dreampos_core::cart::CartItemKey;
    /// use dreampos_core::catalog::Product;
    /// use dreampos_core::money::Money;
    ///
    /// let latte = Product::new("latte", Money::from_cents(450))
    ///     .with_variation("Large", Money::from_cents(80))
    ///     .with_variation("Oat milk", Money::from_cents(60));
    ///
    /// let a = CartItemKey::new(&latte, &latte.select(&["Oat milk", "Large"]).unwrap());
    /// let b = CartItemKey::new(&latte, &latte.select(&["Large", "Oat milk"]).unwrap());
    /// assert_eq!(a, b);
    /// assert_eq!(a.as_str(), "latte___Large|||Oat milk");
    /// ```
    pub fn new(product: &Product, selection: &VariationSelection) -> Self {
        let names = selection.sorted_names();
        let variations = if names.is_empty() {
            NO_VARIATIONS.to_string()
        } else {
            names.join(VARIATION_SEPARATOR)
        };

        CartItemKey(format!("{}{}{}", product.id, KEY_SEPARATOR, variations))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for CartItemKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

// =============================================================================
// Cart Line
// =============================================================================

/// One line of the cart: a product, the chosen variations and a quantity.
///
/// The product is a snapshot taken when the line was created; catalog edits
/// after that do not reprice the line.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct CartLine {
    pub key: CartItemKey,
    pub product: Product,
    pub selected_variations: VariationSelection,
    /// Always in `1..=MAX_ITEM_QUANTITY`.
    pub quantity: u32,
}

impl CartLine {
    fn new(product: &Product, selection: &VariationSelection, quantity: u32) -> Self {
        CartLine {
            key: CartItemKey::new(product, selection),
            product: product.clone(),
            selected_variations: selection.clone(),
            quantity,
        }
    }

    /// Unit price before promotions.
    #[inline]
    pub fn unit_price(&self) -> Money {
        unit_price(&self.product, &self.selected_variations)
    }

    /// Unit price × quantity.
    #[inline]
    pub fn line_total(&self) -> Money {
        self.unit_price().times(self.quantity)
    }

    /// Unit price after this product's promotion, if any.
    pub fn promoted_unit_price(&self, promotions: &Promotions) -> Money {
        let price = self.unit_price();
        match promotions.get(&self.product.id) {
            Some(promo) => promo.apply(price),
            None => price,
        }
    }
}

// =============================================================================
// Cart Totals
// =============================================================================

/// Derived totals, as handed to the display layer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS)]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct CartTotals {
    pub item_count: usize,
    pub total_quantity: u64,
    pub subtotal: Money,
    pub discount: Money,
    /// Shared tip counted in `total` (zero in split mode).
    pub tip: Money,
    pub total: Money,
}

// =============================================================================
// Cart
// =============================================================================

/// The cart for one checkout.
///
/// ## Invariants
/// - Lines are unique by `CartItemKey` (adding the same key accumulates quantity)
/// - Every line has quantity ≥ 1 (a line that would reach 0 is removed)
/// - `tip_amount` ≥ 0
/// - In split mode the shared tip is excluded from `total()`; tips then live
///   per payer in the `SplitAllocator`
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Cart {
    lines: Vec<CartLine>,
    tip_amount: Money,
    is_split_mode: bool,
    #[serde(default)]
    promotions: Promotions,
    #[serde(default)]
    cart_discount: Option<CartDiscount>,
    created_at: DateTime<Utc>,
}

impl Default for Cart {
    fn default() -> Self {
        Self::new()
    }
}

impl Cart {
    /// Creates an empty cart.
    pub fn new() -> Self {
        Cart {
            lines: Vec::new(),
            tip_amount: Money::ZERO,
            is_split_mode: false,
            promotions: Promotions::new(),
            cart_discount: None,
            created_at: Utc::now(),
        }
    }

    // =========================================================================
    // Line Mutations
    // =========================================================================

    /// Adds `qty` units of a product with a selection.
    ///
    /// ## Behavior
    /// - Key already in cart: quantity increases (capped at `MAX_ITEM_QUANTITY`)
    /// - Key not in cart: new line appended
    /// - `qty < 1`: rejected with `InvalidQuantity`, cart unchanged
    ///
    /// Returns the line's key.
    pub fn add_item(
        &mut self,
        product: &Product,
        selection: &VariationSelection,
        qty: i64,
    ) -> CoreResult<CartItemKey> {
        if qty < 1 {
            return Err(CoreError::InvalidQuantity { quantity: qty });
        }
        let qty = clamp_quantity(qty);
        let key = CartItemKey::new(product, selection);

        match self.lines.iter_mut().find(|l| l.key == key) {
            Some(line) => {
                line.quantity = clamp_quantity(line.quantity as i64 + qty as i64);
                debug!(key = %key, quantity = line.quantity, "Cart line quantity increased");
            }
            None => {
                self.lines.push(CartLine::new(product, selection, qty));
                debug!(key = %key, quantity = qty, "Cart line added");
            }
        }

        Ok(key)
    }

    /// Adds `delta` to a line's quantity; a result ≤ 0 removes the line.
    ///
    /// Unknown keys are ignored.
    pub fn update_quantity(&mut self, key: &CartItemKey, delta: i64) {
        let Some(index) = self.lines.iter().position(|l| &l.key == key) else {
            return;
        };

        let new_qty = self.lines[index].quantity as i64 + delta;
        if new_qty <= 0 {
            self.lines.remove(index);
            debug!(key = %key, "Cart line removed by quantity change");
        } else {
            self.lines[index].quantity = clamp_quantity(new_qty);
            debug!(key = %key, quantity = self.lines[index].quantity, "Cart line quantity changed");
        }
    }

    /// Removes a line. Unknown keys are ignored.
    pub fn remove_item(&mut self, key: &CartItemKey) {
        let before = self.lines.len();
        self.lines.retain(|l| &l.key != key);
        if self.lines.len() != before {
            debug!(key = %key, "Cart line removed");
        }
    }

    /// Empties the cart, zeroes the tip and leaves split mode.
    ///
    /// Promotions and the cart discount are configuration, not cart contents,
    /// and survive a clear.
    pub fn clear(&mut self) {
        self.lines.clear();
        self.tip_amount = Money::ZERO;
        self.is_split_mode = false;
        self.created_at = Utc::now();
        debug!("Cart cleared");
    }

    // =========================================================================
    // Tip & Split Mode
    // =========================================================================

    /// Sets the shared (single-payer) tip, clamped to ≥ 0.
    ///
    /// Rejected with `TipLocked` once any split payer has paid.
    pub fn set_tip(&mut self, amount: Money, split: &SplitAllocator) -> CoreResult<()> {
        if split.any_paid() {
            warn!("Rejected tip change: payment already started");
            return Err(CoreError::TipLocked);
        }

        self.tip_amount = amount.clamp_non_negative();
        debug!(tip_cents = self.tip_amount.cents(), "Shared tip set");
        Ok(())
    }

    /// Switches split mode on or off.
    ///
    /// Turning it off is rejected with `SplitLocked` once any payer has paid.
    pub fn set_split_mode(&mut self, enabled: bool, split: &SplitAllocator) -> CoreResult<()> {
        if !enabled && self.is_split_mode && split.any_paid() {
            warn!("Rejected leaving split mode: payment already started");
            return Err(CoreError::SplitLocked);
        }

        self.is_split_mode = enabled;
        Ok(())
    }

    // =========================================================================
    // Promotions
    // =========================================================================

    /// Replaces the promotion table. Every entry is validated first.
    pub fn set_promotions(&mut self, promotions: Promotions) -> CoreResult<()> {
        for promo in promotions.values() {
            promo.validate()?;
        }
        self.promotions = promotions;
        Ok(())
    }

    pub fn set_promotion(&mut self, product_id: impl Into<String>, promo: Promotion) -> CoreResult<()> {
        promo.validate()?;
        self.promotions.insert(product_id.into(), promo);
        Ok(())
    }

    pub fn set_cart_discount(&mut self, discount: Option<CartDiscount>) -> CoreResult<()> {
        if let Some(d) = &discount {
            d.validate()?;
        }
        self.cart_discount = discount;
        Ok(())
    }

    pub fn promotions(&self) -> &Promotions {
        &self.promotions
    }

    pub fn cart_discount(&self) -> Option<CartDiscount> {
        self.cart_discount
    }

    /// Per-unit promotional discount for a product that is in the cart.
    pub fn discount_for(&self, product_id: &str) -> Option<Money> {
        let promo = self.promotions.get(product_id)?;
        let line = self.lines.iter().find(|l| l.product.id == product_id)?;
        let discount = promo.discount_on(line.unit_price());
        discount.is_positive().then_some(discount)
    }

    // =========================================================================
    // Reads
    // =========================================================================

    /// Lines in insertion order.
    pub fn lines(&self) -> &[CartLine] {
        &self.lines
    }

    pub fn line(&self, key: &CartItemKey) -> Option<&CartLine> {
        self.lines.iter().find(|l| &l.key == key)
    }

    pub fn tip_amount(&self) -> Money {
        self.tip_amount
    }

    pub fn is_split_mode(&self) -> bool {
        self.is_split_mode
    }

    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    /// Number of distinct lines.
    pub fn item_count(&self) -> usize {
        self.lines.len()
    }

    /// Sum of all quantities.
    pub fn total_quantity(&self) -> u64 {
        self.lines.iter().map(|l| l.quantity as u64).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }

    // =========================================================================
    // Totals
    // =========================================================================

    /// Σ unit_price × quantity, before any discount.
    pub fn subtotal(&self) -> Money {
        self.lines.iter().map(CartLine::line_total).sum()
    }

    fn after_promotions(&self) -> Money {
        self.lines
            .iter()
            .map(|l| l.promoted_unit_price(&self.promotions).times(l.quantity))
            .sum()
    }

    /// Promotion discounts plus the cart discount.
    pub fn discount(&self) -> Money {
        let after_promotions = self.after_promotions();
        let item_discounts = self.subtotal() - after_promotions;
        let cart_discount = self
            .cart_discount
            .map(|d| d.amount_on(after_promotions))
            .unwrap_or(Money::ZERO);

        item_discounts + cart_discount
    }

    /// `subtotal - discount`: the amount the split allocator divides.
    pub fn total_without_tip(&self) -> Money {
        self.subtotal() - self.discount()
    }

    /// `subtotal - discount + tip`, where the shared tip only counts outside
    /// split mode.
    pub fn total(&self) -> Money {
        let tip = if self.is_split_mode {
            Money::ZERO
        } else {
            self.tip_amount
        };
        self.total_without_tip() + tip
    }

    pub fn totals(&self) -> CartTotals {
        CartTotals {
            item_count: self.item_count(),
            total_quantity: self.total_quantity(),
            subtotal: self.subtotal(),
            discount: self.discount(),
            tip: if self.is_split_mode {
                Money::ZERO
            } else {
                self.tip_amount
            },
            total: self.total(),
        }
    }
}

fn clamp_quantity(qty: i64) -> u32 {
    qty.clamp(1, MAX_ITEM_QUANTITY) as u32
}

// =============================================================================
// Unit Tests
// =============================================================================

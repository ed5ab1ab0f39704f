//! # Discounts
//!
//! Per-product promotions and the cart-wide discount. Both tables are supplied
//! by the caller (manager tooling, backend); the cart only evaluates them.
//!
//! ## Evaluation Order
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  unit_price ──► Promotion ──► promoted price (≥ 0)  × quantity         │
//! │                                      │                                  │
//! │                                      ▼                                  │
//! │                      Σ lines = after-promotion amount                  │
//! │                                      │                                  │
//! │                                      ▼                                  │
//! │                 CartDiscount (percent, or fixed capped at amount)      │
//! │                                                                         │
//! │  discount = Σ (unit_price - promoted) × qty + cart discount amount     │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use ts_rs::TS;

use crate::money::Money;
use crate::validation::{validate_percent_bps, ValidationResult};

// =============================================================================
// Promotion
// =============================================================================

/// A per-product promotion applied to each unit.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS)]
#[serde(tag = "type", content = "value", rename_all = "snake_case")]
#[ts(export)]
pub enum Promotion {
    /// Percentage off, in basis points (5000 = 50%).
    Percent(u32),
    /// Fixed amount off the unit price.
    Fixed(Money),
    /// Unit price replaced outright.
    Price(Money),
}

impl Promotion {
    /// The unit price after this promotion, never below zero.
    ///
    /// ```rust
    /// use dreampos_core::discount::Promotion;
    /// use dreampos_core::money::Money;
    ///
    /// let half_off = Promotion::Percent(5000);
    /// assert_eq!(half_off.apply(Money::from_cents(530)).cents(), 265);
    ///
    /// let two_off = Promotion::Fixed(Money::from_cents(200));
    /// assert_eq!(two_off.apply(Money::from_cents(150)).cents(), 0);
    /// ```
    pub fn apply(&self, unit_price: Money) -> Money {
        match *self {
            Promotion::Percent(bps) => {
                (unit_price - unit_price.percentage(bps)).clamp_non_negative()
            }
            Promotion::Fixed(off) => (unit_price - off).clamp_non_negative(),
            Promotion::Price(price) => price.clamp_non_negative(),
        }
    }

    /// Per-unit discount this promotion gives on `unit_price`.
    pub fn discount_on(&self, unit_price: Money) -> Money {
        unit_price - self.apply(unit_price)
    }

    pub fn validate(&self) -> ValidationResult<()> {
        match *self {
            Promotion::Percent(bps) => validate_percent_bps(bps),
            Promotion::Fixed(_) | Promotion::Price(_) => Ok(()),
        }
    }
}

/// Promotions keyed by product id.
pub type Promotions = HashMap<String, Promotion>;

// =============================================================================
// Cart Discount
// =============================================================================

/// A discount on the whole cart, evaluated after promotions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS)]
#[serde(tag = "type", content = "value", rename_all = "snake_case")]
#[ts(export)]
pub enum CartDiscount {
    /// Percentage of the post-promotion amount, in basis points.
    Percent(u32),
    /// Fixed amount, capped at the post-promotion amount.
    Fixed(Money),
}

impl CartDiscount {
    /// Discount amount on `after_promotions`.
    ///
    /// Nothing is taken off an empty or non-positive amount.
    pub fn amount_on(&self, after_promotions: Money) -> Money {
        if !after_promotions.is_positive() {
            return Money::ZERO;
        }

        match *self {
            CartDiscount::Percent(bps) => after_promotions.percentage(bps).clamp_non_negative(),
            CartDiscount::Fixed(off) => off.clamp_non_negative().min(after_promotions),
        }
    }

    pub fn validate(&self) -> ValidationResult<()> {
        match *self {
            CartDiscount::Percent(bps) => validate_percent_bps(bps),
            CartDiscount::Fixed(_) => Ok(()),
        }
    }
}

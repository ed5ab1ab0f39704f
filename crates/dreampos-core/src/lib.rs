//! # dreampos-core: Pricing & Split-Payment Engine for DreamPOS
//!
//! Everything the register needs to price an order and divide the bill, as
//! pure in-memory state with zero I/O.
//!
//! ## Architecture Position
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                        DreamPOS Architecture                            │
//! │                                                                         │
//! │  ┌─────────────────────────────────────────────────────────────────┐   │
//! │  │                    Receptionist UI                              │   │
//! │  │    Product grid ──► Cart panel ──► Split panel ──► Pay button   │   │
//! │  └─────────────────────────────┬───────────────────────────────────┘   │
//! │                                │                                        │
//! │  ┌─────────────────────────────▼───────────────────────────────────┐   │
//! │  │                 dreampos-register (terminal)                    │   │
//! │  │    config, catalog file, session registry, currency display    │   │
//! │  └─────────────────────────────┬───────────────────────────────────┘   │
//! │                                │                                        │
//! │  ┌─────────────────────────────▼───────────────────────────────────┐   │
//! │  │               ★ dreampos-core (THIS CRATE) ★                    │   │
//! │  │                                                                 │   │
//! │  │   ┌─────────┐  ┌─────────┐  ┌─────────┐  ┌─────────┐           │   │
//! │  │   │ catalog │  │ pricing │  │  cart   │  │  split  │           │   │
//! │  │   │ Product │  │  unit   │  │  lines  │  │ payers  │           │   │
//! │  │   │Variation│  │  price  │  │ totals  │  │  lock   │           │   │
//! │  │   └─────────┘  └─────────┘  └─────────┘  └─────────┘           │   │
//! │  │                                                                 │   │
//! │  │   NO I/O • NO NETWORK • NO DISPLAY FORMATTING                   │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Modules
//!
//! - [`money`] - Integer-cent `Money` and `split_evenly`
//! - [`catalog`] - Products, variations, selections
//! - [`pricing`] - Unit price composition
//! - [`discount`] - Per-product promotions and the cart discount
//! - [`cart`] - Cart lines and totals
//! - [`split`] - Split allocator, per-payer tips and the payment lock
//! - [`session`] - Cart and allocator bundled into one checkout
//! - [`error`] - Domain error types
//! - [`validation`] - Catalog and discount input rules
//!
//! ## Example Usage
//!
//! ```rust
//! use dreampos_core::{CheckoutSession, Money, PaymentMethod, Product, VariationSelection};
//!
//! let latte = Product::new("latte", Money::from_cents(450))
//!     .with_variation("Large", Money::from_cents(80));
//! let croissant = Product::new("croissant", Money::from_cents(300));
//!
//! let mut session = CheckoutSession::new();
//! session.add_item(&latte, &latte.select(&["Large"]).unwrap(), 2).unwrap();
//! session.add_item(&croissant, &VariationSelection::none(), 1).unwrap();
//! assert_eq!(session.totals().total.cents(), 1360);
//!
//! session.enable_split().unwrap();
//! session.change_payer_count(3).unwrap();
//! assert_eq!(session.mark_paid(1).unwrap(), None);
//! assert_eq!(session.mark_paid(2).unwrap(), None);
//!
//! let receipt = session.mark_paid(3).unwrap().unwrap();
//! let amounts: Vec<i64> = receipt.payments.iter().map(|p| p.amount.cents()).collect();
//! assert_eq!(amounts, vec![454, 453, 453]);
//! assert_eq!(receipt.payments[0].method, PaymentMethod::Cash);
//! ```

// =============================================================================
// Module Declarations
// =============================================================================

pub mod cart;
pub mod catalog;
pub mod discount;
pub mod error;
pub mod money;
pub mod pricing;
pub mod session;
pub mod split;
pub mod validation;

// =============================================================================
// Re-exports for Convenience
// =============================================================================

pub use cart::{Cart, CartItemKey, CartLine, CartTotals};
pub use catalog::{Catalog, Product, Variation, VariationSelection};
pub use discount::{CartDiscount, Promotion, Promotions};
pub use error::{CoreError, CoreResult, ValidationError};
pub use money::{split_evenly, Money};
pub use session::{CheckoutReceipt, CheckoutSession};
pub use split::{
    FinalizedPayment, Payer, PaymentMethod, SplitAllocator, SplitMode, SplitState,
    UnitInstance, UnitInstanceId,
};

// =============================================================================
// Crate-Level Constants
// =============================================================================

/// Maximum quantity of a single cart line
///
/// Adds and increments beyond this clamp silently.
pub const MAX_ITEM_QUANTITY: i64 = 9999;

/// Fewest payers a split can have
pub const MIN_PAYERS: usize = 2;

/// Most payers a split can have
pub const MAX_PAYERS: usize = 50;

/// Payer count a new split starts with
pub const DEFAULT_PAYER_COUNT: usize = 2;

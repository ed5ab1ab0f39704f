//! # Checkout Session
//!
//! One cart plus its split allocator, owned together so every mutation can see
//! the payment lock.
//!
//! ## Checkout Paths
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                                                                         │
//! │  Single payer:   add items ──► set_tip ──► pay_in_full(method)         │
//! │                                                 │                       │
//! │                                                 ▼                       │
//! │                                          CheckoutReceipt                │
//! │                                                 ▲                       │
//! │  Split:   add items ──► enable_split ──► configure ──► mark_paid × N   │
//! │                          (count, mode,                 (last active     │
//! │                           assignment,                   payer emits     │
//! │                           tips, methods)                the receipt)    │
//! │                                                                         │
//! │  Either way the session resets to an empty cart afterwards.            │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! While a split is collecting (any payer paid) the cart contents, promotions
//! and discount are frozen too: changing them would change amounts that have
//! already been handed over.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::{info, warn};
use ts_rs::TS;
use uuid::Uuid;

use crate::cart::{Cart, CartItemKey, CartLine, CartTotals};
use crate::catalog::{Product, VariationSelection};
use crate::discount::{CartDiscount, Promotion, Promotions};
use crate::error::{CoreError, CoreResult};
use crate::money::Money;
use crate::split::{
    FinalizedPayment, Payer, PaymentMethod, SplitAllocator, SplitMode, SplitState,
    UnitInstance, UnitInstanceId,
};

// =============================================================================
// Receipt
// =============================================================================

/// What a finished checkout hands to the payment backend.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct CheckoutReceipt {
    pub session_id: Uuid,
    pub lines: Vec<CartLine>,
    pub subtotal: Money,
    pub discount: Money,
    /// Shared tip, or the sum of per-payer tips for a split.
    pub tip_total: Money,
    /// Σ payment amount + tip.
    pub total_collected: Money,
    /// One entry per paying party, ascending payer index.
    pub payments: Vec<FinalizedPayment>,
    pub split: bool,
    pub completed_at: DateTime<Utc>,
}

impl CheckoutReceipt {
    fn build(session_id: Uuid, cart: &Cart, payments: Vec<FinalizedPayment>, split: bool) -> Self {
        let tip_total: Money = payments.iter().map(|p| p.tip).sum();
        let total_collected: Money = payments.iter().map(|p| p.amount + p.tip).sum();
        CheckoutReceipt {
            session_id,
            lines: cart.lines().to_vec(),
            subtotal: cart.subtotal(),
            discount: cart.discount(),
            tip_total,
            total_collected,
            payments,
            split,
            completed_at: Utc::now(),
        }
    }
}

// =============================================================================
// Checkout Session
// =============================================================================

/// A register's checkout in progress.
#[derive(Debug, Clone)]
pub struct CheckoutSession {
    id: Uuid,
    cart: Cart,
    split: SplitAllocator,
    /// What `split` goes back to after a checkout, with the session's payer count.
    idle_split: SplitAllocator,
    opened_at: DateTime<Utc>,
}

impl Default for CheckoutSession {
    fn default() -> Self {
        Self::new()
    }
}

impl CheckoutSession {
    pub fn new() -> Self {
        CheckoutSession {
            id: Uuid::new_v4(),
            cart: Cart::new(),
            split: SplitAllocator::new(),
            idle_split: SplitAllocator::new(),
            opened_at: Utc::now(),
        }
    }

    /// A session whose splits start with `payers` payers.
    pub fn with_payer_count(payers: usize) -> CoreResult<Self> {
        let mut session = Self::new();
        session.idle_split.change_payer_count(payers)?;
        session.split = session.idle_split.clone();
        Ok(session)
    }

    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn opened_at(&self) -> DateTime<Utc> {
        self.opened_at
    }

    pub fn cart(&self) -> &Cart {
        &self.cart
    }

    pub fn split(&self) -> &SplitAllocator {
        &self.split
    }

    pub fn totals(&self) -> CartTotals {
        self.cart.totals()
    }

    /// Rejects edits that would move money already collected.
    fn ensure_unlocked(&self) -> CoreResult<()> {
        if self.split.any_paid() {
            warn!(session = %self.id, "Rejected cart edit: split payment in progress");
            return Err(CoreError::SplitLocked);
        }
        Ok(())
    }

    // =========================================================================
    // Cart
    // =========================================================================

    pub fn add_item(
        &mut self,
        product: &Product,
        selection: &VariationSelection,
        qty: i64,
    ) -> CoreResult<CartItemKey> {
        self.ensure_unlocked()?;
        self.cart.add_item(product, selection, qty)
    }

    pub fn update_quantity(&mut self, key: &CartItemKey, delta: i64) -> CoreResult<()> {
        self.ensure_unlocked()?;
        self.cart.update_quantity(key, delta);
        self.split.prune_assignments(&self.cart);
        Ok(())
    }

    pub fn remove_item(&mut self, key: &CartItemKey) -> CoreResult<()> {
        self.ensure_unlocked()?;
        self.cart.remove_item(key);
        self.split.prune_assignments(&self.cart);
        Ok(())
    }

    /// Empties the cart and drops any unpaid split configuration.
    pub fn clear(&mut self) -> CoreResult<()> {
        self.ensure_unlocked()?;
        self.reset();
        Ok(())
    }

    pub fn set_tip(&mut self, amount: Money) -> CoreResult<()> {
        self.cart.set_tip(amount, &self.split)
    }

    pub fn set_promotions(&mut self, promotions: Promotions) -> CoreResult<()> {
        self.ensure_unlocked()?;
        self.cart.set_promotions(promotions)
    }

    pub fn set_promotion(&mut self, product_id: impl Into<String>, promo: Promotion) -> CoreResult<()> {
        self.ensure_unlocked()?;
        self.cart.set_promotion(product_id, promo)
    }

    pub fn set_cart_discount(&mut self, discount: Option<CartDiscount>) -> CoreResult<()> {
        self.ensure_unlocked()?;
        self.cart.set_cart_discount(discount)
    }

    // =========================================================================
    // Split
    // =========================================================================

    /// Turns split mode on for the cart and enables the allocator.
    pub fn enable_split(&mut self) -> CoreResult<()> {
        if self.cart.is_empty() {
            return Err(CoreError::EmptyCart);
        }
        let was_split = self.cart.is_split_mode();
        self.cart.set_split_mode(true, &self.split)?;
        if let Err(e) = self.split.enable(&self.cart) {
            // Leave the cart as it was
            self.cart.set_split_mode(was_split, &self.split)?;
            return Err(e);
        }
        Ok(())
    }

    /// Cancels the split before anyone has paid.
    pub fn disable_split(&mut self) -> CoreResult<()> {
        self.split.disable()?;
        self.cart.set_split_mode(false, &self.split)
    }

    pub fn set_split_mode(&mut self, mode: SplitMode) -> CoreResult<()> {
        self.split.set_mode(mode)
    }

    pub fn change_payer_count(&mut self, n: usize) -> CoreResult<()> {
        self.split.change_payer_count(n)
    }

    pub fn assign(&mut self, instance: &UnitInstanceId, payer: usize) -> CoreResult<()> {
        self.split.assign(&self.cart, instance, payer)
    }

    pub fn set_individual_tip(&mut self, index: usize, amount: Money) -> CoreResult<()> {
        self.split.set_individual_tip(index, amount)
    }

    pub fn set_payment_method(&mut self, index: usize, method: PaymentMethod) -> CoreResult<()> {
        self.split.set_payment_method(index, method)
    }

    pub fn unit_instances(&self) -> Vec<UnitInstance> {
        self.split.unit_instances(&self.cart)
    }

    pub fn payers(&self) -> Vec<Payer> {
        self.split.payers(&self.cart)
    }

    pub fn active_payers(&self) -> Vec<Payer> {
        self.split.active_payers(&self.cart)
    }

    /// Marks a split payer paid. When that completes the split, the receipt is
    /// returned and the session starts over with an empty cart.
    pub fn mark_paid(&mut self, index: usize) -> CoreResult<Option<CheckoutReceipt>> {
        if self.cart.is_empty() && self.split.state() == SplitState::Configuring {
            return Err(CoreError::EmptyCart);
        }

        let Some(payments) = self.split.mark_paid(&self.cart, index)? else {
            return Ok(None);
        };

        let receipt = CheckoutReceipt::build(self.id, &self.cart, payments, true);
        info!(
            session = %self.id,
            payers = receipt.payments.len(),
            collected_cents = receipt.total_collected.cents(),
            "Split checkout complete"
        );
        self.reset();
        Ok(Some(receipt))
    }

    // =========================================================================
    // Single Payer
    // =========================================================================

    /// Settles the whole cart with one payment.
    pub fn pay_in_full(&mut self, method: PaymentMethod) -> CoreResult<CheckoutReceipt> {
        if self.split.is_active() {
            return Err(CoreError::SplitNotActive {
                state: self.split.state().to_string(),
            });
        }
        if self.cart.is_empty() {
            return Err(CoreError::EmptyCart);
        }

        let payment = FinalizedPayment {
            payer_index: 1,
            amount: self.cart.total_without_tip(),
            tip: self.cart.tip_amount(),
            method,
        };
        let receipt = CheckoutReceipt::build(self.id, &self.cart, vec![payment], false);
        info!(
            session = %self.id,
            method = %method,
            collected_cents = receipt.total_collected.cents(),
            "Checkout complete"
        );
        self.reset();
        Ok(receipt)
    }

    fn reset(&mut self) {
        self.cart.clear();
        self.split = self.idle_split.clone();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn pasta() -> Product {
        Product::new("pasta", Money::from_cents(500))
    }

    fn salad() -> Product {
        Product::new("salad", Money::from_cents(300))
    }

    fn dinner_session() -> CheckoutSession {
        let mut session = CheckoutSession::new();
        session
            .add_item(&pasta(), &VariationSelection::none(), 2)
            .unwrap();
        session
            .add_item(&salad(), &VariationSelection::none(), 1)
            .unwrap();
        session
    }

    #[test]
    fn test_pay_in_full() {
        let mut session = dinner_session();
        session.set_tip(Money::from_cents(200)).unwrap();

        let receipt = session.pay_in_full(PaymentMethod::Card).unwrap();
        assert!(!receipt.split);
        assert_eq!(receipt.subtotal.cents(), 1300);
        assert_eq!(receipt.tip_total.cents(), 200);
        assert_eq!(receipt.total_collected.cents(), 1500);
        assert_eq!(receipt.payments.len(), 1);
        assert_eq!(receipt.session_id, session.id());

        assert!(session.cart().is_empty());
        assert_eq!(session.split().state(), SplitState::Disabled);
    }

    #[test]
    fn test_pay_in_full_rejects_empty_and_split() {
        let mut session = CheckoutSession::new();
        assert_eq!(
            session.pay_in_full(PaymentMethod::Cash),
            Err(CoreError::EmptyCart)
        );

        let mut session = dinner_session();
        session.enable_split().unwrap();
        assert!(matches!(
            session.pay_in_full(PaymentMethod::Cash),
            Err(CoreError::SplitNotActive { .. })
        ));
    }

    #[test]
    fn test_split_by_item_checkout() {
        let mut session = dinner_session();
        session.enable_split().unwrap();
        session.set_split_mode(SplitMode::ByItem).unwrap();

        let salad = session.unit_instances()[2].id.clone();
        session.assign(&salad, 2).unwrap();
        session.set_individual_tip(2, Money::from_cents(50)).unwrap();
        session.set_payment_method(2, PaymentMethod::GiftCard).unwrap();

        assert_eq!(session.mark_paid(2).unwrap(), None);
        assert_eq!(session.split().state(), SplitState::InProgress);

        let receipt = session.mark_paid(1).unwrap().unwrap();
        assert!(receipt.split);
        assert_eq!(receipt.payments[0].amount.cents(), 1000);
        assert_eq!(receipt.payments[1].amount.cents(), 300);
        assert_eq!(receipt.payments[1].method, PaymentMethod::GiftCard);
        assert_eq!(receipt.tip_total.cents(), 50);
        assert_eq!(receipt.total_collected.cents(), 1350);

        assert!(session.cart().is_empty());
        assert!(!session.cart().is_split_mode());
    }

    #[test]
    fn test_cart_frozen_once_a_payer_paid() {
        let mut session = dinner_session();
        session.enable_split().unwrap();
        session.mark_paid(1).unwrap();

        let key = session.cart().lines()[0].key.clone();
        assert_eq!(
            session.add_item(&salad(), &VariationSelection::none(), 1),
            Err(CoreError::SplitLocked)
        );
        assert_eq!(session.update_quantity(&key, -1), Err(CoreError::SplitLocked));
        assert_eq!(session.remove_item(&key), Err(CoreError::SplitLocked));
        assert_eq!(session.clear(), Err(CoreError::SplitLocked));
        assert_eq!(
            session.set_tip(Money::from_cents(100)),
            Err(CoreError::TipLocked)
        );
        assert_eq!(session.disable_split(), Err(CoreError::SplitLocked));
        assert_eq!(session.totals().total.cents(), 1300);
    }

    #[test]
    fn test_enable_split_on_empty_cart() {
        let mut session = CheckoutSession::new();
        assert_eq!(session.enable_split(), Err(CoreError::EmptyCart));
        assert!(!session.cart().is_split_mode());
    }

    #[test]
    fn test_cancel_split_before_payment() {
        let mut session = dinner_session();
        session.set_tip(Money::from_cents(100)).unwrap();
        session.enable_split().unwrap();
        assert_eq!(session.totals().total.cents(), 1300);

        session.disable_split().unwrap();
        assert!(!session.cart().is_split_mode());
        assert_eq!(session.totals().total.cents(), 1400);
    }

    fn payers_of_units(session: &CheckoutSession) -> Vec<usize> {
        session.unit_instances().iter().map(|u| u.payer).collect()
    }

    fn base_cents(session: &CheckoutSession) -> Vec<i64> {
        session.payers().iter().map(|p| p.base_amount.cents()).collect()
    }

    #[test]
    fn test_readded_line_starts_on_payer_one() {
        let mut session = CheckoutSession::new();
        let pasta_key = session
            .add_item(&pasta(), &VariationSelection::none(), 2)
            .unwrap();
        session.enable_split().unwrap();
        session.set_split_mode(SplitMode::ByItem).unwrap();
        session
            .assign(&UnitInstanceId::new(pasta_key.clone(), 1), 2)
            .unwrap();
        assert_eq!(base_cents(&session), vec![500, 500]);

        session.remove_item(&pasta_key).unwrap();
        session
            .add_item(&pasta(), &VariationSelection::none(), 2)
            .unwrap();

        assert_eq!(payers_of_units(&session), vec![1, 1]);
        assert_eq!(base_cents(&session), vec![1000, 0]);
    }

    #[test]
    fn test_decrement_then_increment_starts_on_payer_one() {
        let mut session = dinner_session();
        session.enable_split().unwrap();
        session.set_split_mode(SplitMode::ByItem).unwrap();

        let pasta_key = session.cart().lines()[0].key.clone();
        session
            .assign(&UnitInstanceId::new(pasta_key.clone(), 1), 2)
            .unwrap();
        assert_eq!(payers_of_units(&session), vec![1, 2, 1]);

        session.update_quantity(&pasta_key, -1).unwrap();
        assert_eq!(payers_of_units(&session), vec![1, 1]);
        assert_eq!(base_cents(&session), vec![800, 0]);

        session.update_quantity(&pasta_key, 1).unwrap();
        assert_eq!(payers_of_units(&session), vec![1, 1, 1]);
        assert_eq!(base_cents(&session), vec![1300, 0]);
    }

    #[test]
    fn test_by_item_assignment_survives_edits_to_other_lines() {
        let mut session = dinner_session();
        session.enable_split().unwrap();
        session.set_split_mode(SplitMode::ByItem).unwrap();

        let salad_key = session.cart().lines()[1].key.clone();
        session
            .assign(&UnitInstanceId::new(salad_key, 0), 2)
            .unwrap();

        let pasta_key = session.cart().lines()[0].key.clone();
        session.update_quantity(&pasta_key, 1).unwrap();
        assert_eq!(payers_of_units(&session), vec![1, 1, 1, 2]);
        assert_eq!(base_cents(&session), vec![1500, 300]);

        session.remove_item(&pasta_key).unwrap();
        assert_eq!(payers_of_units(&session), vec![2]);
        assert_eq!(base_cents(&session), vec![0, 300]);
    }

    #[test]
    fn test_default_payer_count_survives_reset() {
        let mut session = CheckoutSession::with_payer_count(4).unwrap();
        session
            .add_item(&pasta(), &VariationSelection::none(), 1)
            .unwrap();
        session.pay_in_full(PaymentMethod::Cash).unwrap();
        assert_eq!(session.split().payer_count(), 4);

        // A split checkout that shrank the count also comes back to 4
        session
            .add_item(&pasta(), &VariationSelection::none(), 1)
            .unwrap();
        session.enable_split().unwrap();
        session.change_payer_count(2).unwrap();
        session.mark_paid(1).unwrap();
        assert!(session.mark_paid(2).unwrap().is_some());
        assert_eq!(session.split().payer_count(), 4);
        assert_eq!(session.split().state(), SplitState::Disabled);

        assert!(CheckoutSession::with_payer_count(0).is_err());
    }
}

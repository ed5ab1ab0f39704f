//! # Split Allocator
//!
//! Divides one bill across several payers, tracks each payer's tip, payment
//! method and paid flag, and detects when everybody who owes something has paid.
//!
//! ## State Machine
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                                                                         │
//! │   ┌──────────┐  enable()   ┌─────────────┐  first mark_paid()          │
//! │   │ Disabled │────────────►│ Configuring │──────────────┐              │
//! │   └──────────┘◄────────────└─────────────┘              │              │
//! │        ▲        disable()         │                     ▼              │
//! │        │        (always ok)       │ mark_paid() pays   ┌────────────┐  │
//! │        │                          │ every active payer │ InProgress │  │
//! │        │                          ▼                    └─────┬──────┘  │
//! │        │                   ┌──────────┐  last active payer   │         │
//! │        └── reset() ────────│ Complete │◄─────────────────────┘         │
//! │                            └──────────┘                                │
//! │                                                                         │
//! │   InProgress ──► Disabled is forbidden (SplitLocked)                   │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Derived vs Owned
//! ```text
//! ┌────────────────────────────┬────────────────────────────────────────────┐
//! │  DERIVED on every read     │  OWNED, pinned to a payer index            │
//! ├────────────────────────────┼────────────────────────────────────────────┤
//! │  base_amount               │  tip_amount                                │
//! │  (cart + mode + count +    │  payment_method                            │
//! │   assignment)              │  paid                                      │
//! └────────────────────────────┴────────────────────────────────────────────┘
//! ```
//! Nothing derived is cached, so a cart edit is reflected in the next read.
//!
//! ## Payment Lock
//! Once any payer is paid, payer count, mode, assignment and tips are frozen.
//! The guard is `any_paid()`, recomputed from the payer records on every call.
//!
//! ## Active Payers
//! A payer is active when `base + tip > 0`. Payers owing nothing (for example,
//! no items assigned in by-item mode) never block completion and are left out
//! of the finalized payment list.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;
use tracing::{debug, info, warn};
use ts_rs::TS;

use crate::cart::{Cart, CartItemKey};
use crate::error::{CoreError, CoreResult, ValidationError};
use crate::money::{split_evenly, Money};
use crate::{MAX_PAYERS, MIN_PAYERS};

// =============================================================================
// Enums
// =============================================================================

/// How a payer settles their share.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize, TS)]
#[serde(rename_all = "snake_case")]
#[ts(export)]
pub enum PaymentMethod {
    #[default]
    Cash,
    Card,
    GiftCard,
}

impl fmt::Display for PaymentMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PaymentMethod::Cash => write!(f, "cash"),
            PaymentMethod::Card => write!(f, "card"),
            PaymentMethod::GiftCard => write!(f, "gift_card"),
        }
    }
}

impl FromStr for PaymentMethod {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "cash" => Ok(PaymentMethod::Cash),
            "card" => Ok(PaymentMethod::Card),
            "gift_card" | "gift card" | "giftcard" => Ok(PaymentMethod::GiftCard),
            other => Err(ValidationError::InvalidFormat {
                field: "payment method".to_string(),
                reason: format!("unknown method '{}', expected cash, card or gift_card", other),
            }),
        }
    }
}

/// How base amounts are assigned.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, TS)]
#[serde(rename_all = "snake_case")]
#[ts(export)]
pub enum SplitMode {
    /// The bill divided evenly, extra cents to the first payers.
    #[default]
    Equal,
    /// Each unit instance is assigned to one payer.
    ByItem,
}

/// Where the split is in its lifecycle.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, TS)]
#[serde(rename_all = "snake_case")]
#[ts(export)]
pub enum SplitState {
    #[default]
    Disabled,
    Configuring,
    InProgress,
    Complete,
}

impl fmt::Display for SplitState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SplitState::Disabled => write!(f, "disabled"),
            SplitState::Configuring => write!(f, "configuring"),
            SplitState::InProgress => write!(f, "in progress"),
            SplitState::Complete => write!(f, "complete"),
        }
    }
}

// =============================================================================
// Unit Instances
// =============================================================================

/// One quantity unit of one cart line.
///
/// Identified by line key and ordinal rather than position, so editing one line
/// never shifts the assignment of another.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, TS)]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct UnitInstanceId {
    pub key: CartItemKey,
    /// `0..quantity`
    pub ordinal: u32,
}

impl UnitInstanceId {
    pub fn new(key: CartItemKey, ordinal: u32) -> Self {
        UnitInstanceId { key, ordinal }
    }
}

impl fmt::Display for UnitInstanceId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}#{}", self.key, self.ordinal)
    }
}

/// An expanded unit with its price and current payer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct UnitInstance {
    pub id: UnitInstanceId,
    pub product_id: String,
    pub unit_price: Money,
    /// 1-based payer index.
    pub payer: usize,
}

// =============================================================================
// Payers
// =============================================================================

/// The state stored per payer index across recomputation.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
struct PayerRecord {
    tip: Money,
    method: PaymentMethod,
    paid: bool,
}

/// A payer's current view: derived base amount plus stored tip/method/paid.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS)]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct Payer {
    /// 1-based.
    pub index: usize,
    pub base_amount: Money,
    pub tip_amount: Money,
    pub payment_method: PaymentMethod,
    pub paid: bool,
}

impl Payer {
    /// Base plus tip.
    #[inline]
    pub fn total_amount(&self) -> Money {
        self.base_amount + self.tip_amount
    }

    /// Owes something, so must pay before the split completes.
    #[inline]
    pub fn is_active(&self) -> bool {
        self.total_amount().is_positive()
    }
}

/// One entry of the list emitted when the split completes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS)]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct FinalizedPayment {
    pub payer_index: usize,
    /// Base amount, tip excluded.
    pub amount: Money,
    pub tip: Money,
    pub method: PaymentMethod,
}

impl From<&Payer> for FinalizedPayment {
    fn from(payer: &Payer) -> Self {
        FinalizedPayment {
            payer_index: payer.index,
            amount: payer.base_amount,
            tip: payer.tip_amount,
            method: payer.payment_method,
        }
    }
}

// =============================================================================
// Split Allocator
// =============================================================================

/// Split configuration and payment tracking for one checkout.
///
/// ## Example
/// ```rust
/// use dreampos_core::cart::Cart;
/// use dreampos_core::catalog::{Product, VariationSelection};
/// use dreampos_core::money::Money;
/// use dreampos_core::split::{SplitAllocator, SplitState};
///
/// let mut cart = Cart::new();
/// let mut split = SplitAllocator::new();
/// let dinner = Product::new("dinner", Money::from_cents(1000));
/// cart.add_item(&dinner, &VariationSelection::none(), 1).unwrap();
///
/// cart.set_split_mode(true, &split).unwrap();
/// split.enable(&cart).unwrap();
/// split.change_payer_count(3).unwrap();
///
/// let amounts: Vec<i64> = split.payers(&cart).iter().map(|p| p.base_amount.cents()).collect();
/// assert_eq!(amounts, vec![334, 333, 333]);
///
/// split.mark_paid(&cart, 1).unwrap();
/// assert_eq!(split.state(), SplitState::InProgress);
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SplitAllocator {
    state: SplitState,
    mode: SplitMode,
    payer_count: usize,
    /// Unit instances not listed here belong to payer 1.
    assignment: BTreeMap<UnitInstanceId, usize>,
    /// `records[i]` belongs to payer `i + 1`; always `payer_count` long.
    records: Vec<PayerRecord>,
}

impl Default for SplitAllocator {
    fn default() -> Self {
        Self::new()
    }
}

impl SplitAllocator {
    /// A disabled allocator for two payers in equal mode.
    pub fn new() -> Self {
        SplitAllocator {
            state: SplitState::Disabled,
            mode: SplitMode::Equal,
            payer_count: MIN_PAYERS,
            assignment: BTreeMap::new(),
            records: vec![PayerRecord::default(); MIN_PAYERS],
        }
    }

    // =========================================================================
    // Guards & Reads
    // =========================================================================

    pub fn state(&self) -> SplitState {
        self.state
    }

    pub fn mode(&self) -> SplitMode {
        self.mode
    }

    pub fn payer_count(&self) -> usize {
        self.payer_count
    }

    /// True once any payer has been marked paid. This is the payment lock.
    pub fn any_paid(&self) -> bool {
        self.records.iter().any(|r| r.paid)
    }

    /// Split is on (configuring, collecting, or collected).
    pub fn is_active(&self) -> bool {
        self.state != SplitState::Disabled
    }

    pub fn is_complete(&self) -> bool {
        self.state == SplitState::Complete
    }

    fn check_index(&self, index: usize) -> CoreResult<()> {
        if index == 0 || index > self.payer_count {
            return Err(CoreError::PayerIndexOutOfRange {
                index,
                payer_count: self.payer_count,
            });
        }
        Ok(())
    }

    fn require_active(&self) -> CoreResult<()> {
        if self.state == SplitState::Disabled {
            return Err(CoreError::SplitNotActive {
                state: self.state.to_string(),
            });
        }
        Ok(())
    }

    // =========================================================================
    // Lifecycle
    // =========================================================================

    /// `Disabled → Configuring`.
    ///
    /// Requires the cart to be in split mode. Clears every payer's tip, method
    /// and paid flag; payer count, mode and assignments are kept so a cancelled
    /// and reopened split shows the same configuration.
    pub fn enable(&mut self, cart: &Cart) -> CoreResult<()> {
        if self.any_paid() {
            warn!("Rejected split restart: payment already started");
            return Err(CoreError::SplitLocked);
        }
        if !cart.is_split_mode() {
            return Err(CoreError::SplitNotActive {
                state: SplitState::Disabled.to_string(),
            });
        }

        self.prune_assignments(cart);
        self.records = vec![PayerRecord::default(); self.payer_count];
        self.state = SplitState::Configuring;
        info!(payers = self.payer_count, mode = ?self.mode, "Split bill enabled");
        Ok(())
    }

    /// `Configuring → Disabled`. Forbidden once anyone has paid.
    pub fn disable(&mut self) -> CoreResult<()> {
        match self.state {
            SplitState::Disabled => Ok(()),
            SplitState::Configuring if !self.any_paid() => {
                self.state = SplitState::Disabled;
                info!("Split bill cancelled");
                Ok(())
            }
            _ => {
                warn!(state = %self.state, "Rejected split cancel: payment already started");
                Err(CoreError::SplitLocked)
            }
        }
    }

    /// Back to a fresh disabled allocator, whatever the state.
    ///
    /// Only for after the checkout is settled or abandoned as a whole.
    pub fn reset(&mut self) {
        *self = SplitAllocator::new();
        debug!("Split allocator reset");
    }

    // =========================================================================
    // Configuration
    // =========================================================================

    /// Switches between equal and by-item assignment.
    pub fn set_mode(&mut self, mode: SplitMode) -> CoreResult<()> {
        if self.any_paid() {
            warn!("Rejected split mode change: payment already started");
            return Err(CoreError::SplitLocked);
        }
        self.mode = mode;
        debug!(mode = ?mode, "Split mode set");
        Ok(())
    }

    /// Changes the number of payers to `n` (`MIN_PAYERS..=MAX_PAYERS`).
    ///
    /// By-item assignments to a payer above `n` move to payer `n`. Records of
    /// dropped payers are discarded; new payers start with no tip.
    pub fn change_payer_count(&mut self, n: usize) -> CoreResult<()> {
        if self.any_paid() {
            warn!("Rejected payer count change: payment already started");
            return Err(CoreError::PayerCountChangeLocked);
        }
        if !(MIN_PAYERS..=MAX_PAYERS).contains(&n) {
            return Err(CoreError::PayerCountOutOfRange {
                requested: n,
                min: MIN_PAYERS,
                max: MAX_PAYERS,
            });
        }

        for payer in self.assignment.values_mut() {
            if *payer > n {
                *payer = n;
            }
        }
        self.records.resize(n, PayerRecord::default());
        self.payer_count = n;
        debug!(payers = n, "Payer count changed");
        Ok(())
    }

    /// Assigns one unit instance to `payer`.
    ///
    /// Rejected with `AssignmentLocked` once anyone has paid, with
    /// `PayerIndexOutOfRange` for a bad payer, and with `UnknownCartLine` when
    /// the instance is not in the cart.
    pub fn assign(&mut self, cart: &Cart, instance: &UnitInstanceId, payer: usize) -> CoreResult<()> {
        if self.any_paid() {
            warn!(instance = %instance, "Rejected reassignment: payment already started");
            return Err(CoreError::AssignmentLocked);
        }
        self.check_index(payer)?;

        let in_cart = cart
            .line(&instance.key)
            .is_some_and(|line| instance.ordinal < line.quantity);
        if !in_cart {
            return Err(CoreError::UnknownCartLine(instance.to_string()));
        }

        if payer == 1 {
            // Payer 1 is the default, no need to store it
            self.assignment.remove(instance);
        } else {
            self.assignment.insert(instance.clone(), payer);
        }
        debug!(instance = %instance, payer, "Unit instance assigned");
        Ok(())
    }

    /// Current payer of an instance (1 when never reassigned).
    pub fn payer_of(&self, instance: &UnitInstanceId) -> usize {
        self.assignment.get(instance).copied().unwrap_or(1)
    }

    /// Drops assignments for units no longer in the cart.
    ///
    /// Must run after any cart edit that shrinks or removes a line, otherwise a
    /// unit added later under the same key and ordinal would inherit the old
    /// payer instead of starting on payer 1.
    pub fn prune_assignments(&mut self, cart: &Cart) {
        let before = self.assignment.len();
        self.assignment.retain(|id, _| {
            cart.line(&id.key)
                .is_some_and(|line| id.ordinal < line.quantity)
        });
        let dropped = before - self.assignment.len();
        if dropped > 0 {
            debug!(dropped, "Stale unit assignments dropped");
        }
    }

    // =========================================================================
    // Derived Amounts
    // =========================================================================

    /// Every unit of every line, in line order then ordinal order.
    pub fn unit_instances(&self, cart: &Cart) -> Vec<UnitInstance> {
        cart.lines()
            .iter()
            .flat_map(|line| {
                let unit_price = line.unit_price();
                (0..line.quantity).map(move |ordinal| (line, unit_price, ordinal))
            })
            .map(|(line, unit_price, ordinal)| {
                let id = UnitInstanceId::new(line.key.clone(), ordinal);
                UnitInstance {
                    payer: self.payer_of(&id),
                    id,
                    product_id: line.product.id.clone(),
                    unit_price,
                }
            })
            .collect()
    }

    /// Base amount per payer, index `i` for payer `i + 1`.
    ///
    /// - Equal: `split_evenly(cart.total_without_tip(), payer_count)`
    /// - ByItem: sum of the unit prices assigned to each payer
    pub fn base_amounts(&self, cart: &Cart) -> Vec<Money> {
        match self.mode {
            SplitMode::Equal => split_evenly(cart.total_without_tip(), self.payer_count),
            SplitMode::ByItem => {
                let mut amounts = vec![Money::ZERO; self.payer_count];
                for instance in self.unit_instances(cart) {
                    // Assignments are clamped on count changes, so this always fits
                    if let Some(slot) = amounts.get_mut(instance.payer - 1) {
                        *slot += instance.unit_price;
                    }
                }
                amounts
            }
        }
    }

    /// All payers, active or not, in index order.
    pub fn payers(&self, cart: &Cart) -> Vec<Payer> {
        self.base_amounts(cart)
            .into_iter()
            .zip(self.records.iter())
            .enumerate()
            .map(|(i, (base_amount, record))| Payer {
                index: i + 1,
                base_amount,
                tip_amount: record.tip,
                payment_method: record.method,
                paid: record.paid,
            })
            .collect()
    }

    pub fn payer(&self, cart: &Cart, index: usize) -> CoreResult<Payer> {
        self.check_index(index)?;
        Ok(self.payers(cart)[index - 1])
    }

    /// Payers with `base + tip > 0`.
    pub fn active_payers(&self, cart: &Cart) -> Vec<Payer> {
        self.payers(cart).into_iter().filter(Payer::is_active).collect()
    }

    /// Read-only view handed to the payment collaborator: one entry per active
    /// payer with base, tip and method.
    pub fn snapshot(&self, cart: &Cart) -> Vec<Payer> {
        self.active_payers(cart)
    }

    /// Sum of per-payer tips.
    pub fn tips_total(&self) -> Money {
        self.records.iter().map(|r| r.tip).sum()
    }

    /// Base plus tip for one payer.
    pub fn payer_total(&self, cart: &Cart, index: usize) -> CoreResult<Money> {
        Ok(self.payer(cart, index)?.total_amount())
    }

    /// Sum of every payer's base plus tip.
    pub fn total_with_tips(&self, cart: &Cart) -> Money {
        self.payers(cart).iter().map(Payer::total_amount).sum()
    }

    // =========================================================================
    // Per-Payer Payment
    // =========================================================================

    /// Sets (overwrites) one payer's tip, clamped to ≥ 0.
    ///
    /// Locked for every payer once anyone has paid.
    pub fn set_individual_tip(&mut self, index: usize, amount: Money) -> CoreResult<()> {
        if self.any_paid() {
            warn!(payer = index, "Rejected tip change: payment already started");
            return Err(CoreError::TipLocked);
        }
        self.require_active()?;
        self.check_index(index)?;

        let tip = amount.clamp_non_negative();
        self.records[index - 1].tip = tip;
        debug!(payer = index, tip_cents = tip.cents(), "Individual tip set");
        Ok(())
    }

    /// Chooses how an unpaid payer will pay.
    ///
    /// Unlike the structural edits, this stays open for payers who have not paid
    /// yet while others already have.
    pub fn set_payment_method(&mut self, index: usize, method: PaymentMethod) -> CoreResult<()> {
        self.require_active()?;
        self.check_index(index)?;

        let record = &mut self.records[index - 1];
        if record.paid {
            return Err(CoreError::PayerAlreadyPaid { index });
        }
        record.method = method;
        debug!(payer = index, method = %method, "Payment method set");
        Ok(())
    }

    /// Records that a payer has paid. Idempotent.
    ///
    /// ## Transitions
    /// - First payment: `Configuring → InProgress`
    /// - Every active payer paid: `→ Complete`, returning the finalized list
    ///   (active payers, ascending index)
    ///
    /// Returns `Ok(None)` when the split is not (newly) complete.
    pub fn mark_paid(
        &mut self,
        cart: &Cart,
        index: usize,
    ) -> CoreResult<Option<Vec<FinalizedPayment>>> {
        self.require_active()?;
        self.check_index(index)?;

        if self.records[index - 1].paid {
            debug!(payer = index, "Payer already paid");
            return Ok(None);
        }

        self.records[index - 1].paid = true;
        info!(payer = index, "Payer marked paid");

        if self.state == SplitState::Configuring {
            self.state = SplitState::InProgress;
        }
        if self.state == SplitState::Complete {
            return Ok(None);
        }

        let active = self.active_payers(cart);
        if active.iter().all(|p| p.paid) {
            self.state = SplitState::Complete;
            let payments: Vec<FinalizedPayment> = active.iter().map(FinalizedPayment::from).collect();
            info!(payments = payments.len(), "Split bill complete");
            return Ok(Some(payments));
        }

        Ok(None)
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::{Product, VariationSelection};

    fn product(id: &str, cents: i64) -> Product {
        Product::new(id, Money::from_cents(cents))
    }

    /// Cart in split mode plus an enabled allocator.
    fn split_cart(items: &[(&str, i64, i64)]) -> (Cart, SplitAllocator) {
        let mut cart = Cart::new();
        for (id, price, qty) in items {
            cart.add_item(&product(id, *price), &VariationSelection::none(), *qty)
                .unwrap();
        }
        let mut split = SplitAllocator::new();
        cart.set_split_mode(true, &split).unwrap();
        split.enable(&cart).unwrap();
        (cart, split)
    }

    fn bases(split: &SplitAllocator, cart: &Cart) -> Vec<i64> {
        split.base_amounts(cart).iter().map(Money::cents).collect()
    }

    fn instance(cart: &Cart, line: usize, ordinal: u32) -> UnitInstanceId {
        UnitInstanceId::new(cart.lines()[line].key.clone(), ordinal)
    }

    #[test]
    fn test_starts_disabled() {
        let split = SplitAllocator::new();
        assert_eq!(split.state(), SplitState::Disabled);
        assert_eq!(split.payer_count(), 2);
        assert!(!split.any_paid());
    }

    #[test]
    fn test_enable_requires_cart_split_mode() {
        let cart = Cart::new();
        let mut split = SplitAllocator::new();
        assert!(matches!(
            split.enable(&cart),
            Err(CoreError::SplitNotActive { .. })
        ));
        assert_eq!(split.state(), SplitState::Disabled);
    }

    #[test]
    fn test_equal_split_of_thousand_three_ways() {
        let (cart, mut split) = split_cart(&[("dinner", 1000, 1)]);
        split.change_payer_count(3).unwrap();
        assert_eq!(bases(&split, &cart), vec![334, 333, 333]);
    }

    #[test]
    fn test_equal_split_uses_discounted_total_and_ignores_shared_tip() {
        let (mut cart, mut split) = split_cart(&[("dinner", 1000, 1)]);
        cart.set_cart_discount(Some(crate::discount::CartDiscount::Fixed(Money::from_cents(99))))
            .unwrap();
        cart.set_tip(Money::from_cents(500), &split).unwrap();
        split.change_payer_count(2).unwrap();
        assert_eq!(bases(&split, &cart), vec![451, 450]);
    }

    #[test]
    fn test_by_item_scenario() {
        let (cart, mut split) = split_cart(&[("pasta", 500, 2), ("salad", 300, 1)]);
        split.set_mode(SplitMode::ByItem).unwrap();

        let salad = instance(&cart, 1, 0);
        split.assign(&cart, &salad, 2).unwrap();
        assert_eq!(bases(&split, &cart), vec![1000, 300]);

        assert_eq!(split.mark_paid(&cart, 2).unwrap(), None);
        assert_eq!(split.state(), SplitState::InProgress);

        let payments = split.mark_paid(&cart, 1).unwrap().unwrap();
        assert_eq!(split.state(), SplitState::Complete);
        assert_eq!(
            payments,
            vec![
                FinalizedPayment {
                    payer_index: 1,
                    amount: Money::from_cents(1000),
                    tip: Money::ZERO,
                    method: PaymentMethod::Cash,
                },
                FinalizedPayment {
                    payer_index: 2,
                    amount: Money::from_cents(300),
                    tip: Money::ZERO,
                    method: PaymentMethod::Cash,
                },
            ]
        );
    }

    #[test]
    fn test_unit_instances_expand_in_line_order() {
        let (cart, split) = split_cart(&[("pasta", 500, 2), ("salad", 300, 1)]);
        let instances = split.unit_instances(&cart);
        let ids: Vec<String> = instances.iter().map(|i| i.id.to_string()).collect();
        assert_eq!(
            ids,
            vec!["pasta___default#0", "pasta___default#1", "salad___default#0"]
        );
        assert!(instances.iter().all(|i| i.payer == 1));
    }

    #[test]
    fn test_zero_payer_does_not_block_completion() {
        let (cart, mut split) = split_cart(&[("pasta", 500, 1)]);
        split.set_mode(SplitMode::ByItem).unwrap();
        split.change_payer_count(3).unwrap();

        assert_eq!(split.active_payers(&cart).len(), 1);
        let payments = split.mark_paid(&cart, 1).unwrap().unwrap();
        assert_eq!(payments.len(), 1);
        assert!(split.is_complete());
    }

    #[test]
    fn test_tip_makes_zero_base_payer_active() {
        let (cart, mut split) = split_cart(&[("pasta", 500, 1)]);
        split.set_mode(SplitMode::ByItem).unwrap();
        split.set_individual_tip(2, Money::from_cents(100)).unwrap();

        assert_eq!(split.active_payers(&cart).len(), 2);
        assert_eq!(split.mark_paid(&cart, 1).unwrap(), None);
        let payments = split.mark_paid(&cart, 2).unwrap().unwrap();
        assert_eq!(payments[1].amount, Money::ZERO);
        assert_eq!(payments[1].tip.cents(), 100);
    }

    #[test]
    fn test_lock_applies_to_every_payer() {
        let (cart, mut split) = split_cart(&[("pasta", 500, 2), ("salad", 300, 1)]);
        split.change_payer_count(3).unwrap();
        split.mark_paid(&cart, 1).unwrap();

        for index in 1..=3 {
            assert_eq!(
                split.set_individual_tip(index, Money::from_cents(10)),
                Err(CoreError::TipLocked)
            );
            assert_eq!(
                split.assign(&cart, &instance(&cart, 0, 0), index),
                Err(CoreError::AssignmentLocked)
            );
        }
        assert_eq!(split.change_payer_count(4), Err(CoreError::PayerCountChangeLocked));
        assert_eq!(split.set_mode(SplitMode::ByItem), Err(CoreError::SplitLocked));
        assert_eq!(split.disable(), Err(CoreError::SplitLocked));
        assert_eq!(split.payer_count(), 3);
    }

    #[test]
    fn test_payment_method_only_while_unpaid() {
        let (cart, mut split) = split_cart(&[("dinner", 1000, 1)]);
        split.set_payment_method(1, PaymentMethod::Card).unwrap();
        split.mark_paid(&cart, 1).unwrap();

        assert_eq!(
            split.set_payment_method(1, PaymentMethod::GiftCard),
            Err(CoreError::PayerAlreadyPaid { index: 1 })
        );
        split.set_payment_method(2, PaymentMethod::GiftCard).unwrap();

        let payments = split.mark_paid(&cart, 2).unwrap().unwrap();
        assert_eq!(payments[0].method, PaymentMethod::Card);
        assert_eq!(payments[1].method, PaymentMethod::GiftCard);
    }

    #[test]
    fn test_mark_paid_is_idempotent() {
        let (cart, mut split) = split_cart(&[("dinner", 1000, 1)]);
        split.mark_paid(&cart, 1).unwrap();
        assert_eq!(split.mark_paid(&cart, 1).unwrap(), None);
        assert_eq!(split.state(), SplitState::InProgress);

        assert!(split.mark_paid(&cart, 2).unwrap().is_some());
        assert_eq!(split.mark_paid(&cart, 2).unwrap(), None);
        assert!(split.is_complete());
    }

    #[test]
    fn test_individual_tip_overwrites_and_clamps() {
        let (cart, mut split) = split_cart(&[("dinner", 1000, 1)]);
        split.set_individual_tip(1, Money::from_cents(200)).unwrap();
        split.set_individual_tip(1, Money::from_cents(50)).unwrap();
        split.set_individual_tip(2, Money::from_cents(-75)).unwrap();

        let payers = split.payers(&cart);
        assert_eq!(payers[0].tip_amount.cents(), 50);
        assert_eq!(payers[0].total_amount().cents(), 550);
        assert_eq!(payers[1].tip_amount, Money::ZERO);
        assert_eq!(split.tips_total().cents(), 50);
        assert_eq!(split.total_with_tips(&cart).cents(), 1050);
        assert_eq!(split.payer_total(&cart, 1).unwrap().cents(), 550);
    }

    #[test]
    fn test_out_of_range_payer() {
        let (cart, mut split) = split_cart(&[("dinner", 1000, 1)]);
        let expected = CoreError::PayerIndexOutOfRange {
            index: 3,
            payer_count: 2,
        };
        assert_eq!(split.mark_paid(&cart, 3), Err(expected.clone()));
        assert_eq!(split.set_individual_tip(3, Money::ZERO), Err(expected.clone()));
        assert_eq!(split.assign(&cart, &instance(&cart, 0, 0), 3), Err(expected));
        assert!(split.mark_paid(&cart, 0).is_err());
    }

    #[test]
    fn test_assign_unknown_instance() {
        let (cart, mut split) = split_cart(&[("dinner", 1000, 1)]);
        let ghost = instance(&cart, 0, 5);
        assert!(matches!(
            split.assign(&cart, &ghost, 2),
            Err(CoreError::UnknownCartLine(_))
        ));
    }

    #[test]
    fn test_payer_count_bounds() {
        let mut split = SplitAllocator::new();
        assert!(matches!(
            split.change_payer_count(1),
            Err(CoreError::PayerCountOutOfRange { .. })
        ));
        assert!(split.change_payer_count(MAX_PAYERS + 1).is_err());
        assert!(split.change_payer_count(MAX_PAYERS).is_ok());
    }

    #[test]
    fn test_shrinking_payer_count_clamps_assignments() {
        let (cart, mut split) = split_cart(&[("pasta", 500, 1), ("salad", 300, 1), ("soup", 200, 1)]);
        split.set_mode(SplitMode::ByItem).unwrap();
        split.change_payer_count(4).unwrap();
        split.assign(&cart, &instance(&cart, 1, 0), 4).unwrap();
        split.assign(&cart, &instance(&cart, 2, 0), 3).unwrap();
        assert_eq!(bases(&split, &cart), vec![500, 0, 200, 300]);

        split.change_payer_count(2).unwrap();
        assert_eq!(bases(&split, &cart), vec![500, 500]);
        assert_eq!(split.payer_of(&instance(&cart, 1, 0)), 2);
    }

    #[test]
    fn test_disable_from_configuring_and_reenable_clears_tips() {
        let (cart, mut split) = split_cart(&[("dinner", 1000, 1)]);
        split.set_individual_tip(1, Money::from_cents(100)).unwrap();
        split.disable().unwrap();
        assert_eq!(split.state(), SplitState::Disabled);

        split.enable(&cart).unwrap();
        assert_eq!(split.tips_total(), Money::ZERO);
        assert_eq!(split.state(), SplitState::Configuring);
    }

    #[test]
    fn test_per_payer_ops_need_split_enabled() {
        let cart = Cart::new();
        let mut split = SplitAllocator::new();
        assert!(matches!(
            split.mark_paid(&cart, 1),
            Err(CoreError::SplitNotActive { .. })
        ));
        assert!(split.set_individual_tip(1, Money::ZERO).is_err());
        assert!(split.set_payment_method(1, PaymentMethod::Card).is_err());
    }

    #[test]
    fn test_base_amounts_follow_cart_edits() {
        let (mut cart, split) = split_cart(&[("dinner", 1000, 1)]);
        assert_eq!(bases(&split, &cart), vec![500, 500]);

        let key = cart.lines()[0].key.clone();
        cart.update_quantity(&key, 1);
        assert_eq!(bases(&split, &cart), vec![1000, 1000]);
    }

    #[test]
    fn test_by_item_new_units_after_shrink_start_on_payer_one() {
        let (mut cart, mut split) = split_cart(&[("pasta", 500, 2), ("salad", 300, 1)]);
        split.set_mode(SplitMode::ByItem).unwrap();
        let pasta = cart.lines()[0].key.clone();
        split.assign(&cart, &instance(&cart, 0, 1), 2).unwrap();
        assert_eq!(bases(&split, &cart), vec![800, 500]);

        cart.update_quantity(&pasta, -1);
        split.prune_assignments(&cart);
        assert_eq!(bases(&split, &cart), vec![800, 0]);

        cart.update_quantity(&pasta, 1);
        split.prune_assignments(&cart);
        assert_eq!(split.payer_of(&instance(&cart, 0, 1)), 1);
        assert_eq!(bases(&split, &cart), vec![1300, 0]);
    }

    #[test]
    fn test_prune_keeps_units_still_in_cart() {
        let (mut cart, mut split) = split_cart(&[("pasta", 500, 3), ("salad", 300, 1)]);
        split.set_mode(SplitMode::ByItem).unwrap();
        split.assign(&cart, &instance(&cart, 0, 0), 2).unwrap();
        split.assign(&cart, &instance(&cart, 0, 2), 2).unwrap();
        split.assign(&cart, &instance(&cart, 1, 0), 2).unwrap();

        let pasta = cart.lines()[0].key.clone();
        let salad = cart.lines()[1].key.clone();
        cart.update_quantity(&pasta, -1);
        cart.remove_item(&salad);
        split.prune_assignments(&cart);

        assert_eq!(split.payer_of(&instance(&cart, 0, 0)), 2);
        assert_eq!(split.payer_of(&UnitInstanceId::new(pasta, 2)), 1);
        assert_eq!(split.payer_of(&UnitInstanceId::new(salad, 0)), 1);
        assert_eq!(bases(&split, &cart), vec![500, 500]);
    }

    #[test]
    fn test_reset_after_completion() {
        let (cart, mut split) = split_cart(&[("dinner", 1000, 1)]);
        split.set_mode(SplitMode::ByItem).unwrap();
        split.change_payer_count(3).unwrap();
        split.mark_paid(&cart, 1).unwrap();
        assert!(split.is_complete());

        split.reset();
        assert_eq!(split, SplitAllocator::new());
    }

    #[test]
    fn test_reenable_drops_assignments_for_removed_lines() {
        let (mut cart, mut split) = split_cart(&[("pasta", 500, 1), ("salad", 300, 1)]);
        split.set_mode(SplitMode::ByItem).unwrap();
        split.assign(&cart, &instance(&cart, 1, 0), 2).unwrap();
        split.disable().unwrap();

        let salad = cart.lines()[1].key.clone();
        cart.remove_item(&salad);
        cart.add_item(&product("salad", 300), &VariationSelection::none(), 1)
            .unwrap();
        split.enable(&cart).unwrap();

        assert_eq!(bases(&split, &cart), vec![800, 0]);
    }

    #[test]
    fn test_equal_split_reconciles_with_cart() {
        for price in [1, 99, 1000, 1001, 12345] {
            for payers in MIN_PAYERS..=7 {
                let (cart, mut split) = split_cart(&[("item", price, 1)]);
                split.change_payer_count(payers).unwrap();
                let sum: Money = split.base_amounts(&cart).iter().sum();
                assert_eq!(sum, cart.total_without_tip());
            }
        }
    }

    #[test]
    fn test_payment_method_parsing() {
        assert_eq!("cash".parse::<PaymentMethod>().unwrap(), PaymentMethod::Cash);
        assert_eq!("Card".parse::<PaymentMethod>().unwrap(), PaymentMethod::Card);
        assert_eq!(
            "Gift card".parse::<PaymentMethod>().unwrap(),
            PaymentMethod::GiftCard
        );
        assert!("cheque".parse::<PaymentMethod>().is_err());
    }
}

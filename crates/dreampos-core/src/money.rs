//! # Money Module
//!
//! Integer minor-unit money and the even-split helper used by the bill splitter.
//!
//! ## One Representation, Converted at the Boundary
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  Catalog JSON ──► Money (cents) ──► pricing / cart / split ──► Money   │
//! │                                                                         │
//! │  Every sum, split and tip is done on i64 cents.                        │
//! │  Only the currency formatter (register crate) turns Money into text.   │
//! │                                                                         │
//! │  1000 cents split 3 ways = [334, 333, 333]   (sum stays 1000)          │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Usage
//! ```rust
//! use dreampos_core::money::{split_evenly, Money};
//!
//! let latte = Money::from_cents(450);
//! let large = latte + Money::from_cents(80);
//! assert_eq!((large * 2).cents(), 1060);
//!
//! let shares = split_evenly(Money::from_cents(1000), 3);
//! assert_eq!(shares, vec![
//!     Money::from_cents(334),
//!     Money::from_cents(333),
//!     Money::from_cents(333),
//! ]);
//! ```

use serde::{Deserialize, Serialize};
use std::fmt;
use std::iter::Sum;
use std::ops::{Add, AddAssign, Mul, Neg, Sub, SubAssign};
use ts_rs::TS;

// =============================================================================
// Money Type
// =============================================================================

/// A monetary amount in the currency's minor unit (cents).
///
/// Signed so that variation modifiers and discounts can be negative.
/// Serializes as a bare integer, which is what the catalog JSON carries.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, TS,
)]
#[serde(transparent)]
#[ts(export)]
pub struct Money(i64);

impl Money {
    /// Zero cents.
    pub const ZERO: Money = Money(0);

    /// Creates a Money value from cents.
    #[inline]
    pub const fn from_cents(cents: i64) -> Self {
        Money(cents)
    }

    /// Returns the raw cent count.
    #[inline]
    pub const fn cents(&self) -> i64 {
        self.0
    }

    #[inline]
    pub const fn zero() -> Self {
        Money::ZERO
    }

    #[inline]
    pub const fn is_zero(&self) -> bool {
        self.0 == 0
    }

    #[inline]
    pub const fn is_positive(&self) -> bool {
        self.0 > 0
    }

    #[inline]
    pub const fn is_negative(&self) -> bool {
        self.0 < 0
    }

    /// Clamps negative amounts to zero.
    ///
    /// Tips and promoted prices are never allowed below zero.
    #[inline]
    pub const fn clamp_non_negative(self) -> Self {
        if self.0 < 0 {
            Money(0)
        } else {
            self
        }
    }

    /// Multiplies by a line quantity.
    #[inline]
    pub const fn times(&self, qty: u32) -> Self {
        Money(self.0 * qty as i64)
    }

    /// Returns `bps` basis points of this amount, rounded half up.
    ///
    /// ```rust
    /// use dreampos_core::money::Money;
    ///
    /// // 50% of $4.51 = $2.255 → $2.26
    /// assert_eq!(Money::from_cents(451).percentage(5000).cents(), 226);
    /// ```
    pub fn percentage(&self, bps: u32) -> Money {
        // i128 keeps large carts from overflowing the intermediate product
        let scaled = (self.0 as i128 * bps as i128 + 5000).div_euclid(10_000);
        Money(scaled as i64)
    }
}

// =============================================================================
// Even Split
// =============================================================================

/// Divides `amount` into `parts` shares that differ by at most one cent.
///
/// The first `amount mod parts` shares absorb the extra cent, so the result is
/// deterministic and always sums back to `amount`.
///
/// ## Example
/// ```text
/// split_evenly(1000, 3)
///   base = 333, remainder = 1
///   → [334, 333, 333]
/// ```
///
/// Returns an empty vector for `parts == 0`.
pub fn split_evenly(amount: Money, parts: usize) -> Vec<Money> {
    if parts == 0 {
        return Vec::new();
    }

    let divisor = parts as i64;
    // Euclidean division keeps the remainder in 0..parts even for negative totals
    let base = amount.0.div_euclid(divisor);
    let remainder = amount.0.rem_euclid(divisor) as usize;

    (0..parts)
        .map(|i| {
            if i < remainder {
                Money(base + 1)
            } else {
                Money(base)
            }
        })
        .collect()
}

// =============================================================================
// Trait Implementations
// =============================================================================

/// Debug-friendly rendering only. Real display goes through the register's
/// `CurrencyFormatter`.
impl fmt::Display for Money {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let sign = if self.0 < 0 { "-" } else { "" };
        let abs = self.0.unsigned_abs();
        write!(f, "{}{}.{:02}", sign, abs / 100, abs % 100)
    }
}

impl Add for Money {
    type Output = Self;

    #[inline]
    fn add(self, other: Self) -> Self {
        Money(self.0 + other.0)
    }
}

impl AddAssign for Money {
    #[inline]
    fn add_assign(&mut self, other: Self) {
        self.0 += other.0;
    }
}

impl Sub for Money {
    type Output = Self;

    #[inline]
    fn sub(self, other: Self) -> Self {
        Money(self.0 - other.0)
    }
}

impl SubAssign for Money {
    #[inline]
    fn sub_assign(&mut self, other: Self) {
        self.0 -= other.0;
    }
}

impl Neg for Money {
    type Output = Self;

    #[inline]
    fn neg(self) -> Self {
        Money(-self.0)
    }
}

impl Mul<u32> for Money {
    type Output = Self;

    #[inline]
    fn mul(self, qty: u32) -> Self {
        self.times(qty)
    }
}

impl Sum for Money {
    fn sum<I: Iterator<Item = Money>>(iter: I) -> Self {
        iter.fold(Money::ZERO, Add::add)
    }
}

impl<'a> Sum<&'a Money> for Money {
    fn sum<I: Iterator<Item = &'a Money>>(iter: I) -> Self {
        iter.copied().sum()
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

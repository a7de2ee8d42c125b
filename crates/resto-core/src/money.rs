//! # Money Module
//!
//! Provides the `Money` type for handling monetary values safely.
//!
//! ## Why Integer Money?
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  THE FLOATING POINT PROBLEM                                             │
//! │                                                                         │
//! │  Subtotal 22,000.00 × 10% PPN in floating point can drift by a         │
//! │  fraction of a cent, and the gateway rejects any order whose line      │
//! │  items do not add up to the gross amount exactly.                      │
//! │                                                                         │
//! │  OUR SOLUTION: Integer Cents                                            │
//! │    2_200_000 cents × 1000 bps / 10000 = 220_000 cents                  │
//! │    Every rounding step is explicit and happens exactly once.           │
//! │                                                                         │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Usage
//! ```rust
//! use resto_core::money::Money;
//!
//! let price = Money::from_major(10_000);     // 10,000.00
//! let line = price * 2;                      // 20,000.00
//! let total = line + Money::from_major(5_000);
//! assert_eq!(total.cents(), 2_500_000);
//! ```

use serde::{Deserialize, Serialize};
use std::fmt;
use std::ops::{Add, AddAssign, Mul, Sub, SubAssign};
use ts_rs::TS;

use crate::types::TaxRate;

// =============================================================================
// Money Type
// =============================================================================

/// A monetary value in the smallest currency unit (cents / sen).
///
/// ## Where Money is Used
/// ```text
/// ┌─────────────────────────────────────────────────────────────────────────┐
/// │  Menu.price_cents ──► TransactionItem.subtotal ──► raw subtotal        │
/// │                                                        │                │
/// │                                             promo discount ▼            │
/// │                                                                         │
/// │  subtotal ──► PPN 10% ──► total ──► gateway gross amount (major units) │
/// │                                 └──► settlement expected cash          │
/// └─────────────────────────────────────────────────────────────────────────┘
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct Money(i64);

impl Money {
    /// Creates a Money value from cents (the smallest currency unit).
    ///
    /// ## Example
    /// ```rust
    /// use resto_core::money::Money;
    ///
    /// let price = Money::from_cents(1_000_050);
    /// assert_eq!(price.cents(), 1_000_050);
    /// ```
    #[inline]
    pub const fn from_cents(cents: i64) -> Self {
        Money(cents)
    }

    /// Creates a Money value from whole currency units.
    #[inline]
    pub const fn from_major(major: i64) -> Self {
        Money(major * 100)
    }

    /// Returns the value in cents.
    #[inline]
    pub const fn cents(&self) -> i64 {
        self.0
    }

    /// Returns the whole-unit portion, truncated toward zero.
    #[inline]
    pub const fn major(&self) -> i64 {
        self.0 / 100
    }

    /// Returns the cents portion (always 0-99).
    #[inline]
    pub const fn minor_part(&self) -> i64 {
        (self.0 % 100).abs()
    }

    /// Rounds to whole currency units, half away from zero.
    ///
    /// Payment gateways for IDR only accept integer amounts, so this is the
    /// single place where cents are dropped on the way out.
    ///
    /// ## Example
    /// ```rust
    /// use resto_core::money::Money;
    ///
    /// assert_eq!(Money::from_cents(1_234_550).round_to_major(), 12_346);
    /// assert_eq!(Money::from_cents(1_234_549).round_to_major(), 12_345);
    /// assert_eq!(Money::from_cents(-150).round_to_major(), -2);
    /// ```
    pub const fn round_to_major(&self) -> i64 {
        if self.0 >= 0 {
            (self.0 + 50) / 100
        } else {
            (self.0 - 50) / 100
        }
    }

    /// Returns zero money value.
    #[inline]
    pub const fn zero() -> Self {
        Money(0)
    }

    /// Checks if the value is zero.
    #[inline]
    pub const fn is_zero(&self) -> bool {
        self.0 == 0
    }

    /// Checks if the value is positive (greater than zero).
    #[inline]
    pub const fn is_positive(&self) -> bool {
        self.0 > 0
    }

    /// Checks if the value is negative (less than zero).
    #[inline]
    pub const fn is_negative(&self) -> bool {
        self.0 < 0
    }

    /// Calculates tax with half-up rounding to the cent.
    ///
    /// ## Implementation
    /// Integer math: `(amount * bps + 5000) / 10000`. The +5000 is the
    /// half-cent that makes the division round instead of truncate.
    ///
    /// ## Example
    /// ```rust
    /// use resto_core::money::Money;
    /// use resto_core::types::TaxRate;
    ///
    /// let subtotal = Money::from_cents(2_200_000);
    /// let tax = subtotal.calculate_tax(TaxRate::from_bps(1000));
    /// assert_eq!(tax.cents(), 220_000);
    ///
    /// // 0.05 × 10% = 0.005 → rounds up to 0.01
    /// assert_eq!(Money::from_cents(5).calculate_tax(TaxRate::from_bps(1000)).cents(), 1);
    /// ```
    pub fn calculate_tax(&self, rate: TaxRate) -> Money {
        // i128 keeps large order totals from overflowing the intermediate
        let tax_cents = (self.0 as i128 * rate.bps() as i128 + 5000) / 10000;
        Money::from_cents(tax_cents as i64)
    }

    /// Returns `percent`% of this amount, rounded half-up to the cent.
    ///
    /// ## Example
    /// ```rust
    /// use resto_core::money::Money;
    ///
    /// let subtotal = Money::from_cents(2_500_000);
    /// assert_eq!(subtotal.percent_of(20).cents(), 500_000);
    /// assert_eq!(Money::from_cents(5).percent_of(10).cents(), 1);
    /// ```
    pub fn percent_of(&self, percent: i64) -> Money {
        let cents = (self.0 as i128 * percent as i128 + 50) / 100;
        Money::from_cents(cents as i64)
    }

    /// Multiplies by a quantity, `None` on overflow.
    #[inline]
    pub const fn checked_mul(&self, qty: i64) -> Option<Money> {
        match self.0.checked_mul(qty) {
            Some(cents) => Some(Money(cents)),
            None => None,
        }
    }

    /// Adds two amounts, `None` on overflow.
    #[inline]
    pub const fn checked_add(&self, other: Money) -> Option<Money> {
        match self.0.checked_add(other.0) {
            Some(cents) => Some(Money(cents)),
            None => None,
        }
    }

    /// Multiplies money by a quantity.
    #[inline]
    pub const fn multiply_quantity(&self, qty: i64) -> Self {
        Money(self.0 * qty)
    }

    /// Returns the smaller of two amounts.
    #[inline]
    pub fn min(self, other: Money) -> Money {
        if self.0 <= other.0 {
            self
        } else {
            other
        }
    }
}

// =============================================================================
// Trait Implementations
// =============================================================================

/// Debug-friendly rendering, `Rp25000.00`. Clients format for display.
impl fmt::Display for Money {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let sign = if self.0 < 0 { "-" } else { "" };
        write!(f, "{}Rp{}.{:02}", sign, self.major().abs(), self.minor_part())
    }
}

impl Default for Money {
    fn default() -> Self {
        Money::zero()
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

impl Mul<i64> for Money {
    type Output = Self;

    #[inline]
    fn mul(self, qty: i64) -> Self {
        Money(self.0 * qty)
    }
}

impl std::iter::Sum for Money {
    fn sum<I: Iterator<Item = Money>>(iter: I) -> Money {
        iter.fold(Money::zero(), |acc, m| acc + m)
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_major_and_parts() {
        let money = Money::from_cents(1_000_099);
        assert_eq!(money.major(), 10_000);
        assert_eq!(money.minor_part(), 99);
        assert_eq!(Money::from_major(5_000).cents(), 500_000);
    }

    #[test]
    fn test_display() {
        assert_eq!(Money::from_cents(2_750_000).to_string(), "Rp27500.00");
        assert_eq!(Money::from_cents(-550).to_string(), "-Rp5.50");
        assert_eq!(Money::zero().to_string(), "Rp0.00");
    }

    #[test]
    fn test_arithmetic_and_sum() {
        let a = Money::from_cents(1000);
        let b = Money::from_cents(500);
        assert_eq!((a + b).cents(), 1500);
        assert_eq!((a - b).cents(), 500);
        assert_eq!((a * 3).cents(), 3000);

        let total: Money = vec![a, b, b].into_iter().sum();
        assert_eq!(total.cents(), 2000);
    }

    #[test]
    fn test_ppn_on_examples() {
        let rate = TaxRate::from_bps(1000);
        assert_eq!(Money::from_cents(2_500_000).calculate_tax(rate).cents(), 250_000);
        assert_eq!(Money::from_cents(2_200_000).calculate_tax(rate).cents(), 220_000);
    }

    #[test]
    fn test_tax_rounds_half_up() {
        let rate = TaxRate::from_bps(1000);
        // 0.15 × 10% = 0.015 → 0.02
        assert_eq!(Money::from_cents(15).calculate_tax(rate).cents(), 2);
        // 0.14 × 10% = 0.014 → 0.01
        assert_eq!(Money::from_cents(14).calculate_tax(rate).cents(), 1);
    }

    #[test]
    fn test_round_to_major() {
        assert_eq!(Money::from_cents(2_750_000).round_to_major(), 27_500);
        assert_eq!(Money::from_cents(49).round_to_major(), 0);
        assert_eq!(Money::from_cents(50).round_to_major(), 1);
        assert_eq!(Money::from_cents(-300_000).round_to_major(), -3_000);
    }

    #[test]
    fn test_min() {
        let a = Money::from_cents(300_000);
        let b = Money::from_cents(500_000);
        assert_eq!(a.min(b), a);
        assert_eq!(b.min(a), a);
    }
}

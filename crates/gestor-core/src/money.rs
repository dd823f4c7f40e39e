//! # Money Module
//!
//! Integer money for pesos. Every amount in Gestor (prices, invoice totals,
//! payments, commissions) is stored and computed as `i64` centavos.
//!
//! ## Display
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  Argentine formatting: "." groups thousands, "," separates centavos    │
//! │                                                                         │
//! │     123456789 cents  ──►  $1.234.567,89                                 │
//! │        -55000 cents  ──►  -$550,00                                      │
//! │                                                                         │
//! │  The PDF renderer and the print ticket both use this format.           │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Usage
//! ```rust
//! use gestor_core::money::Money;
//! use gestor_core::types::TaxRate;
//!
//! let net = Money::from_cents(100_000);          // $1.000,00
//! let iva = net.calculate_tax(TaxRate::from_bps(2100));
//! assert_eq!(iva.cents(), 21_000);
//! assert_eq!((net + iva).to_string(), "$1.210,00");
//! ```

use serde::{Deserialize, Serialize};
use std::fmt;
use std::iter::Sum;
use std::ops::{Add, AddAssign, Sub, SubAssign};
use ts_rs::TS;

use crate::types::TaxRate;

// =============================================================================
// Money Type
// =============================================================================

/// A monetary value in centavos.
///
/// Signed so that differences (cash closure shortfalls) can be negative.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct Money(i64);

impl Money {
    /// Creates a Money value from centavos.
    #[inline]
    pub const fn from_cents(cents: i64) -> Self {
        Money(cents)
    }

    /// Returns the value in centavos.
    #[inline]
    pub const fn cents(&self) -> i64 {
        self.0
    }

    /// Returns the whole-peso portion (truncated toward zero).
    #[inline]
    pub const fn pesos(&self) -> i64 {
        self.0 / 100
    }

    /// Returns the centavo portion (always 0-99).
    #[inline]
    pub const fn cents_part(&self) -> i64 {
        (self.0 % 100).abs()
    }

    #[inline]
    pub const fn zero() -> Self {
        Money(0)
    }

    #[inline]
    pub const fn is_positive(&self) -> bool {
        self.0 > 0
    }

    /// Calculates IVA on this amount, rounding half up.
    ///
    /// ## Implementation
    /// Integer math: `(amount * bps + 5000) / 10000`, widened to i128 so
    /// large invoice totals cannot overflow.
    ///
    /// ```rust
    /// use gestor_core::money::Money;
    /// use gestor_core::types::TaxRate;
    ///
    /// // $10,00 at 10,5% = $1,05
    /// let iva = Money::from_cents(1000).calculate_tax(TaxRate::from_bps(1050));
    /// assert_eq!(iva.cents(), 105);
    /// ```
    pub fn calculate_tax(&self, rate: TaxRate) -> Money {
        Money::from_cents(apply_bps(self.0, rate.bps()))
    }

    /// Applies a rate in basis points (commission, discount) rounding half up.
    ///
    /// ```rust
    /// use gestor_core::money::Money;
    ///
    /// // 5% commission on $1.234,50 = $61,725 → $61,73
    /// assert_eq!(Money::from_cents(123_450).percentage(500).cents(), 6_173);
    /// ```
    pub fn percentage(&self, bps: u32) -> Money {
        Money::from_cents(apply_bps(self.0, bps))
    }

    /// Multiplies a unit price by a quantity.
    #[inline]
    pub const fn multiply_quantity(&self, qty: i64) -> Self {
        Money(self.0 * qty)
    }
}

/// Rounds half away from zero, so refunds mirror charges.
fn apply_bps(cents: i64, bps: u32) -> i64 {
    let product = cents as i128 * bps as i128;
    let rounded = if product >= 0 {
        (product + 5_000) / 10_000
    } else {
        (product - 5_000) / 10_000
    };
    rounded as i64
}

// =============================================================================
// Trait Implementations
// =============================================================================

/// Argentine display: `$1.234,56`.
impl fmt::Display for Money {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let sign = if self.0 < 0 { "-" } else { "" };
        let digits = self.pesos().abs().to_string();

        let mut grouped = String::with_capacity(digits.len() + digits.len() / 3);
        for (i, ch) in digits.chars().enumerate() {
            if i > 0 && (digits.len() - i) % 3 == 0 {
                grouped.push('.');
            }
            grouped.push(ch);
        }

        write!(f, "{}${},{:02}", sign, grouped, self.cents_part())
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

impl Sum for Money {
    fn sum<I: Iterator<Item = Money>>(iter: I) -> Self {
        iter.fold(Money::zero(), |acc, m| acc + m)
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

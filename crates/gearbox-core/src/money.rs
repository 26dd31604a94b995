//! # Money Module
//!
//! Provides the `Money` type for handling monetary values safely.
//!
//! ## Why Integer Money?
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  THE FLOATING POINT PROBLEM                                             │
//! │                                                                         │
//! │  In floating point:                                                     │
//! │    0.1 + 0.2 = 0.30000000000000004  ❌ WRONG!                           │
//! │                                                                         │
//! │  In many retail systems:                                                │
//! │    $10.00 / 3 = $3.33 (×3 = $9.99)  → Lost $0.01!                      │
//! │                                                                         │
//! │  OUR SOLUTION: Integer Cents                                            │
//! │    Every price, discount, tax and total in this workspace is an i64     │
//! │    count of the smallest currency unit. Rounding happens in exactly     │
//! │    one place (`round_fraction`) with exactly one rule (half-up).        │
//! │                                                                         │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use serde::{Deserialize, Serialize};
use std::fmt;
use std::ops::{Add, AddAssign, Mul, Sub, SubAssign};

use crate::types::TaxRate;

// =============================================================================
// Money Type
// =============================================================================

/// A monetary value in the smallest currency unit (cents).
///
/// ## Design Decisions
/// - **i64 (signed)**: intermediate arithmetic may dip below zero before
///   clamping (e.g. subtotal minus an over-large discount candidate)
/// - **Single field tuple struct**: zero-cost abstraction over i64
/// - **Derives**: full serde support for JSON serialization
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct Money(i64);

impl Money {
    /// Creates a Money value from cents (the smallest currency unit).
    ///
    /// ```rust
    /// use gearbox_core::money::Money;
    ///
    /// let price = Money::from_cents(1099); // $10.99
    /// assert_eq!(price.cents(), 1099);
    /// ```
    #[inline]
    pub const fn from_cents(cents: i64) -> Self {
        Money(cents)
    }

    /// Returns the value in cents (smallest currency unit).
    #[inline]
    pub const fn cents(&self) -> i64 {
        self.0
    }

    /// Zero money value.
    #[inline]
    pub const fn zero() -> Self {
        Money(0)
    }

    /// Checks if the value is zero.
    #[inline]
    pub const fn is_zero(&self) -> bool {
        self.0 == 0
    }

    /// Checks if the value is negative (less than zero).
    #[inline]
    pub const fn is_negative(&self) -> bool {
        self.0 < 0
    }

    /// Multiplies money by a quantity.
    ///
    /// ```rust
    /// use gearbox_core::money::Money;
    ///
    /// let unit_price = Money::from_cents(299); // $2.99
    /// assert_eq!(unit_price.multiply_quantity(3).cents(), 897);
    /// ```
    #[inline]
    pub const fn multiply_quantity(&self, qty: i64) -> Self {
        Money(self.0 * qty)
    }

    /// Clamps the value to the inclusive range `[lo, hi]`.
    ///
    /// Used for the documented discount clamp policy: a line discount is
    /// silently capped to `[0, line subtotal]` rather than rejected.
    #[inline]
    pub fn clamp_to(&self, lo: Money, hi: Money) -> Money {
        Money(self.0.clamp(lo.0, hi.0))
    }

    /// Calculates tax on this amount, rounding half-up to the nearest cent.
    ///
    /// ## Half-Up Rounding
    /// ```text
    /// ┌─────────────────────────────────────────────────────────────────────┐
    /// │  HALF-UP ROUNDING (to the smallest currency unit)                   │
    /// │                                                                     │
    /// │  $290.00 × 15%   = $43.50  → exact, no rounding needed              │
    /// │  $10.00  × 8.25% = $0.825  → rounds UP to $0.83                     │
    /// │  $1.01   × 15%   = $0.1515 → rounds DOWN to $0.15                   │
    /// │                                                                     │
    /// │  Fixed rule everywhere: identical snapshots produce identical      │
    /// │  totals, whether computed by a terminal, a test, or a report.      │
    /// └─────────────────────────────────────────────────────────────────────┘
    /// ```
    ///
    /// ## Implementation
    /// Integer math: `(amount × bps + 5000) / 10000`. The `+5000` term is
    /// half of the divisor, which makes truncating division round half-up.
    ///
    /// ```rust
    /// use gearbox_core::money::Money;
    /// use gearbox_core::types::TaxRate;
    ///
    /// let base = Money::from_cents(29_000);     // $290.00
    /// let rate = TaxRate::from_bps(1500);       // 15%
    /// assert_eq!(base.calculate_tax(rate).cents(), 4350); // $43.50
    /// ```
    pub fn calculate_tax(&self, rate: TaxRate) -> Money {
        Money::from_cents(round_fraction(self.0, rate.bps() as i64, 10_000))
    }

    /// Applies a percentage expressed in basis points, half-up rounded.
    ///
    /// Returns the computed portion (e.g. a discount amount), not the
    /// remainder.
    ///
    /// ```rust
    /// use gearbox_core::money::Money;
    ///
    /// let subtotal = Money::from_cents(10_000); // $100.00
    /// assert_eq!(subtotal.percentage_of(1000).cents(), 1000); // 10% = $10.00
    /// ```
    pub fn percentage_of(&self, bps: u32) -> Money {
        Money::from_cents(round_fraction(self.0, bps as i64, 10_000))
    }
}

/// Computes `amount × numerator / divisor`, rounded half-up.
///
/// Uses i128 intermediates to prevent overflow on large amounts.
fn round_fraction(amount: i64, numerator: i64, divisor: i64) -> i64 {
    ((amount as i128 * numerator as i128 + (divisor as i128 / 2)) / divisor as i128) as i64
}

// =============================================================================
// Trait Implementations
// =============================================================================

/// Display implementation shows money in a human-readable format.
///
/// This is for debugging and log output. Currency formatting for end users
/// is the embedding application's concern.
impl fmt::Display for Money {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let sign = if self.0 < 0 { "-" } else { "" };
        write!(f, "{}${}.{:02}", sign, (self.0 / 100).abs(), (self.0 % 100).abs())
    }
}

/// Default money is zero.
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

/// Multiplication by integer (for quantity calculations).
impl Mul<i64> for Money {
    type Output = Self;

    #[inline]
    fn mul(self, qty: i64) -> Self {
        Money(self.0 * qty)
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

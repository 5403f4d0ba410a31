//! # Money Module
//!
//! Provides the `Money` type for handling monetary values safely.
//!
//! ## Why Integer Money?
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  THE FLOATING POINT PROBLEM                                             │
//! │                                                                         │
//! │  In JavaScript/floating point:                                          │
//! │    0.1 + 0.2 = 0.30000000000000004  ❌ WRONG!                           │
//! │                                                                         │
//! │  In a till that is reconciled nightly:                                  │
//! │    R$ 10,00 / 3 = R$ 3,33 (×3 = R$ 9,99)  → Lost R$ 0,01!              │
//! │                                                                         │
//! │  OUR SOLUTION: Integer Centavos                                         │
//! │    1000 centavos / 3 = 333 centavos (×3 = 999 centavos)                │
//! │    We KNOW we lost 1 centavo, and handle it explicitly                 │
//! │                                                                         │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Usage
//! ```rust
//! use comanda_core::money::Money;
//!
//! // Create from cents (preferred)
//! let price = Money::from_cents(2500); // R$ 25,00
//!
//! // Arithmetic operations
//! let doubled = price * 2;                     // R$ 50,00
//! let total = price + Money::from_cents(800);  // R$ 33,00
//!
//! // NEVER do this:
//! // let bad = Money::from_float(25.00); // NO SUCH METHOD EXISTS!
//! ```

use serde::{Deserialize, Serialize};
use std::fmt;
use std::ops::{Add, AddAssign, Mul, Sub, SubAssign};
use ts_rs::TS;

// =============================================================================
// Money Type
// =============================================================================

/// Represents a monetary value in the smallest currency unit (centavos).
///
/// ## Design Decisions
/// - **i64 (signed)**: Allows negative values for shortages and refunds
/// - **Single field tuple struct**: Zero-cost abstraction over i64
/// - **Derives**: Full serde support for JSON serialization
///
/// ## User Workflow Context
/// ```text
/// ┌─────────────────────────────────────────────────────────────────────────┐
/// │                    Where Money is Used                                  │
/// │                                                                         │
/// │  Product.price_cents ──┬──► CartItem.unit_price ──► CartItem.line_total │
/// │                        │                                                │
/// │                        └──► Displayed as "R$ 25,00" in UI               │
/// │                                                                         │
/// │  Cart.subtotal ──► Checkout adjustments ──► Order.total ──► Payments   │
/// │                                                                         │
/// │  EVERY monetary value in the system flows through this type            │
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
    /// use comanda_core::money::Money;
    ///
    /// let price = Money::from_cents(2500); // Represents R$ 25,00
    /// assert_eq!(price.cents(), 2500);
    /// ```
    ///
    /// ## Why Cents?
    /// Using the smallest unit eliminates all floating-point concerns.
    /// The database, calculations, and API all use cents.
    /// Only the UI converts to reais for display.
    #[inline]
    pub const fn from_cents(cents: i64) -> Self {
        Money(cents)
    }

    /// Returns the value in cents (smallest currency unit).
    #[inline]
    pub const fn cents(&self) -> i64 {
        self.0
    }

    /// Returns the major unit (reais) portion.
    ///
    /// ## Example
    /// ```rust
    /// use comanda_core::money::Money;
    ///
    /// let price = Money::from_cents(2599);
    /// assert_eq!(price.reais(), 25);
    ///
    /// let negative = Money::from_cents(-550);
    /// assert_eq!(negative.reais(), -5);
    /// ```
    #[inline]
    pub const fn reais(&self) -> i64 {
        self.0 / 100
    }

    /// Returns the minor unit (centavos) portion (always 0-99).
    #[inline]
    pub const fn centavos_part(&self) -> i64 {
        (self.0 % 100).abs()
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

    /// Returns the absolute value.
    #[inline]
    pub const fn abs(&self) -> Self {
        Money(self.0.abs())
    }

    /// Applies a percentage rate and returns the resulting portion.
    ///
    /// Used for the service charge (10% of the subtotal) and for
    /// percentage discounts.
    ///
    /// ## Implementation
    /// Integer math with half-up rounding: `(amount * bps + 5000) / 10000`.
    /// The intermediate product is computed in i128 so large tickets cannot
    /// overflow.
    ///
    /// ## Example
    /// ```rust
    /// use comanda_core::money::{Money, Rate};
    ///
    /// let subtotal = Money::from_cents(5800);    // R$ 58,00
    /// let service = Rate::from_bps(1000);        // 10%
    ///
    /// assert_eq!(subtotal.apply_rate(service).cents(), 580); // R$ 5,80
    /// ```
    pub fn apply_rate(&self, rate: Rate) -> Money {
        let portion = (self.0 as i128 * rate.bps() as i128 + 5000) / 10000;
        Money::from_cents(portion as i64)
    }

    /// Multiplies money by a quantity.
    ///
    /// ## Example
    /// ```rust
    /// use comanda_core::money::Money;
    ///
    /// let unit_price = Money::from_cents(2500); // R$ 25,00
    /// let line_total = unit_price.multiply_quantity(2);
    /// assert_eq!(line_total.cents(), 5000); // R$ 50,00
    /// ```
    #[inline]
    pub const fn multiply_quantity(&self, qty: i64) -> Self {
        Money(self.0 * qty)
    }

    /// Clamps the value to zero if negative.
    ///
    /// Used when an aggressive discount would push a bill below zero:
    /// the final total floors at R$ 0,00 rather than going negative.
    #[inline]
    pub const fn clamp_non_negative(&self) -> Self {
        if self.0 < 0 {
            Money(0)
        } else {
            *self
        }
    }
}

// =============================================================================
// Rate Type
// =============================================================================

/// A percentage rate represented in basis points (bps).
///
/// ## Why Basis Points?
/// 1 basis point = 0.01% = 1/10000
/// 1000 bps = 10% (the usual Brazilian service charge)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct Rate(u32);

impl Rate {
    /// Creates a rate from basis points.
    #[inline]
    pub const fn from_bps(bps: u32) -> Self {
        Rate(bps)
    }

    /// Creates a rate from a percentage (for convenience).
    pub fn from_percentage(pct: f64) -> Self {
        Rate((pct * 100.0).round() as u32)
    }

    /// Returns the rate in basis points.
    #[inline]
    pub const fn bps(&self) -> u32 {
        self.0
    }

    /// Returns the rate as a percentage (for display only).
    #[inline]
    pub fn percentage(&self) -> f64 {
        self.0 as f64 / 100.0
    }

    /// Zero rate.
    #[inline]
    pub const fn zero() -> Self {
        Rate(0)
    }

    /// Checks if the rate is zero.
    #[inline]
    pub const fn is_zero(&self) -> bool {
        self.0 == 0
    }
}

impl Default for Rate {
    fn default() -> Self {
        Rate::zero()
    }
}

// =============================================================================
// Trait Implementations
// =============================================================================

/// Display implementation shows money in a human-readable format.
///
/// ## Note
/// This is for receipts and debugging. The frontend formats for
/// localization; this uses the Brazilian convention (comma decimal).
impl fmt::Display for Money {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let sign = if self.0 < 0 { "-" } else { "" };
        write!(
            f,
            "{}R$ {},{:02}",
            sign,
            self.reais().abs(),
            self.centavos_part()
        )
    }
}

/// Default money is zero.
impl Default for Money {
    fn default() -> Self {
        Money::zero()
    }
}

/// Addition of two Money values.
impl Add for Money {
    type Output = Self;

    #[inline]
    fn add(self, other: Self) -> Self {
        Money(self.0 + other.0)
    }
}

/// Addition assignment (+=).
impl AddAssign for Money {
    #[inline]
    fn add_assign(&mut self, other: Self) {
        self.0 += other.0;
    }
}

/// Subtraction of two Money values.
impl Sub for Money {
    type Output = Self;

    #[inline]
    fn sub(self, other: Self) -> Self {
        Money(self.0 - other.0)
    }
}

/// Subtraction assignment (-=).
impl SubAssign for Money {
    #[inline]
    fn sub_assign(&mut self, other: Self) {
        self.0 -= other.0;
    }
}

/// Multiplication by integer (for quantity calculations).
impl Mul<i32> for Money {
    type Output = Self;

    #[inline]
    fn mul(self, qty: i32) -> Self {
        Money(self.0 * qty as i64)
    }
}

/// Multiplication by i64.
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

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_cents() {
        let money = Money::from_cents(2599);
        assert_eq!(money.cents(), 2599);
        assert_eq!(money.reais(), 25);
        assert_eq!(money.centavos_part(), 99);
    }

    #[test]
    fn test_display() {
        assert_eq!(format!("{}", Money::from_cents(2599)), "R$ 25,99");
        assert_eq!(format!("{}", Money::from_cents(500)), "R$ 5,00");
        assert_eq!(format!("{}", Money::from_cents(-550)), "-R$ 5,50");
        assert_eq!(format!("{}", Money::from_cents(0)), "R$ 0,00");
    }

    #[test]
    fn test_arithmetic() {
        let a = Money::from_cents(1000);
        let b = Money::from_cents(500);

        assert_eq!((a + b).cents(), 1500);
        assert_eq!((a - b).cents(), 500);
        let result: Money = a * 3;
        assert_eq!(result.cents(), 3000);
    }

    #[test]
    fn test_apply_rate_basic() {
        // R$ 58,00 at 10% = R$ 5,80
        let amount = Money::from_cents(5800);
        let rate = Rate::from_bps(1000); // 10%
        assert_eq!(amount.apply_rate(rate).cents(), 580);
    }

    #[test]
    fn test_apply_rate_with_rounding() {
        // R$ 10,00 at 8.25% = R$ 0,825 → R$ 0,83 (half-up)
        let amount = Money::from_cents(1000);
        let rate = Rate::from_bps(825);
        assert_eq!(amount.apply_rate(rate).cents(), 83);
    }

    #[test]
    fn test_rate_from_percentage() {
        let rate = Rate::from_percentage(10.0);
        assert_eq!(rate.bps(), 1000);
        assert!((rate.percentage() - 10.0).abs() < 0.001);
    }

    #[test]
    fn test_zero_and_checks() {
        let zero = Money::zero();
        assert!(zero.is_zero());
        assert!(!zero.is_positive());
        assert!(!zero.is_negative());

        let positive = Money::from_cents(100);
        assert!(positive.is_positive());

        let negative = Money::from_cents(-100);
        assert!(negative.is_negative());
    }

    #[test]
    fn test_multiply_quantity() {
        let unit_price = Money::from_cents(2500);
        let line_total = unit_price.multiply_quantity(2);
        assert_eq!(line_total.cents(), 5000);
    }

    #[test]
    fn test_clamp_non_negative() {
        assert_eq!(Money::from_cents(-350).clamp_non_negative().cents(), 0);
        assert_eq!(Money::from_cents(350).clamp_non_negative().cents(), 350);
    }

    /// Critical test: Verify that R$ 10,00 / 3 × 3 behaves as expected.
    /// This documents the intentional precision loss.
    #[test]
    fn test_division_precision_loss_documented() {
        let ten = Money::from_cents(1000);
        let one_third = Money::from_cents(1000 / 3); // 333 centavos
        let reconstructed: Money = one_third * 3; // 999 centavos

        // We intentionally lose 1 centavo - this is documented behavior
        assert_eq!(reconstructed.cents(), 999);
        assert_eq!((ten - reconstructed).cents(), 1);
    }
}

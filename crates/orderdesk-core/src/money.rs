//! # Money Module
//!
//! The Monetary Calculator: the `Money` type plus tax and line-total math.
//!
//! ## Why Integer Money?
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  THE FLOATING POINT PROBLEM                                             │
//! │                                                                         │
//! │  The legacy schema stores prices as REAL columns:                       │
//! │    10.005 as f64 = 10.004999999999999005...  ❌ rounds DOWN            │
//! │                                                                         │
//! │  OUR SOLUTION: Decimal conversion + Integer Cents                      │
//! │    f64 ──► shortest decimal text ("10.005")                            │
//! │        ──► rust_decimal::Decimal                                       │
//! │        ──► round half-up to 2 places (10.01)                           │
//! │        ──► Money(1001 cents)                                           │
//! │                                                                         │
//! │  Every rounding happens at the point of computation. Order totals are  │
//! │  sums of already-rounded line values.                                  │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Usage
//! ```rust
//! use orderdesk_core::money::{apply_tax, Money};
//! use orderdesk_core::types::TaxRate;
//!
//! let net = Money::from_cents(1000); // 10.00
//! let taxed = apply_tax(net, TaxRate::from_bps(1900));
//! assert_eq!(taxed.tax.cents(), 190);
//! assert_eq!(taxed.gross.cents(), 1190);
//! ```

use rust_decimal::prelude::ToPrimitive;
use rust_decimal::{Decimal, RoundingStrategy};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::iter::Sum;
use std::ops::{Add, AddAssign, Mul, Sub};
use std::str::FromStr;

use crate::error::{CoreError, CoreResult};
use crate::types::TaxRate;

/// Fractional digits of the currency.
pub const CURRENCY_SCALE: u32 = 2;

// =============================================================================
// Decimal Helpers
// =============================================================================

/// Converts a legacy float column value into a `Decimal`.
///
/// Uses the shortest decimal representation that round-trips the float
/// (`10.005_f64` becomes `10.005`), so half-up rounding afterwards behaves
/// the way a human reading the stored value expects.
///
/// ## Errors
/// `CoreError::InvalidAmount` for NaN, infinities and values outside the
/// `Decimal` range.
pub fn decimal_from_store(value: f64) -> CoreResult<Decimal> {
    if !value.is_finite() {
        return Err(CoreError::invalid_amount("amount", value));
    }
    Decimal::from_str(&value.to_string()).map_err(|_| CoreError::invalid_amount("amount", value))
}

/// Rounds a decimal amount to 2 places, half-up (midpoint away from zero).
///
/// Idempotent: `round_currency(round_currency(x)) == round_currency(x)`.
#[inline]
pub fn round_currency(amount: Decimal) -> Decimal {
    amount.round_dp_with_strategy(CURRENCY_SCALE, RoundingStrategy::MidpointAwayFromZero)
}

/// Rounds a raw amount to the currency and returns it as `Money`.
///
/// ## Example
/// ```rust
/// use orderdesk_core::money::to_currency;
/// use rust_decimal::Decimal;
/// use std::str::FromStr;
///
/// let money = to_currency(Decimal::from_str("2.345").unwrap()).unwrap();
/// assert_eq!(money.cents(), 235);
/// ```
pub fn to_currency(amount: Decimal) -> CoreResult<Money> {
    let cents = round_currency(amount) * Decimal::ONE_HUNDRED;
    cents
        .to_i64()
        .map(Money::from_cents)
        .ok_or_else(|| CoreError::invalid_amount("amount", amount))
}

// =============================================================================
// Money Type
// =============================================================================

/// A monetary value in cents.
///
/// ## Where Money is Used
/// ```text
/// ┌─────────────────────────────────────────────────────────────────────────┐
/// │  PriceMatrix.Vk_preis_eur ──► unit net ──► line net ──► order net      │
/// │                                  │            │                         │
/// │                                  ▼            ▼                         │
/// │                             unit gross    line tax ──► order tax       │
/// │                                               │                         │
/// │                                               ▼                         │
/// │                                          line gross ──► order gross    │
/// └─────────────────────────────────────────────────────────────────────────┘
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct Money(i64);

impl Money {
    /// Creates a Money value from cents.
    #[inline]
    pub const fn from_cents(cents: i64) -> Self {
        Money(cents)
    }

    /// Converts a legacy REAL column value (euros) into Money, half-up.
    ///
    /// ## Example
    /// ```rust
    /// use orderdesk_core::money::Money;
    ///
    /// assert_eq!(Money::from_store(10.005).unwrap().cents(), 1001);
    /// assert_eq!(Money::from_store(35.7).unwrap().cents(), 3570);
    /// ```
    pub fn from_store(value: f64) -> CoreResult<Self> {
        to_currency(decimal_from_store(value)?)
    }

    /// Returns the value in cents.
    #[inline]
    pub const fn cents(&self) -> i64 {
        self.0
    }

    /// Returns the value as an exact 2-place decimal.
    #[inline]
    pub fn to_decimal(&self) -> Decimal {
        Decimal::new(self.0, CURRENCY_SCALE)
    }

    /// Returns the value in euros for a legacy REAL column.
    ///
    /// `cents / 100` is correctly rounded, so `from_store(to_store())`
    /// gives back the same cents.
    #[inline]
    pub fn to_store(&self) -> f64 {
        self.0 as f64 / 100.0
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

    /// Checks if the value is negative (less than zero).
    #[inline]
    pub const fn is_negative(&self) -> bool {
        self.0 < 0
    }

    /// Calculates tax, rounding half-up to the cent.
    ///
    /// ## Implementation
    /// Integer math on basis points: `(cents × bps ± 5000) / 10000`.
    /// Division truncates toward zero, so adding the half before dividing
    /// rounds the midpoint away from zero for both signs.
    ///
    /// ## Example
    /// ```rust
    /// use orderdesk_core::money::Money;
    /// use orderdesk_core::types::TaxRate;
    ///
    /// // 0.05 × 19% = 0.0095 → 0.01
    /// let tax = Money::from_cents(5).calculate_tax(TaxRate::from_bps(1900));
    /// assert_eq!(tax.cents(), 1);
    /// ```
    pub fn calculate_tax(&self, rate: TaxRate) -> Money {
        let product = self.0 as i128 * rate.bps() as i128;
        let rounded = if product >= 0 {
            (product + 5000) / 10000
        } else {
            (product - 5000) / 10000
        };
        Money::from_cents(rounded as i64)
    }

    /// Multiplies money by a quantity.
    #[inline]
    pub const fn multiply_quantity(&self, qty: i64) -> Self {
        Money(self.0 * qty)
    }
}

// =============================================================================
// Calculator Results
// =============================================================================

/// Result of [`apply_tax`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TaxBreakdown {
    pub tax: Money,
    pub gross: Money,
}

/// Result of [`line_total`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct LineTotals {
    pub net: Money,
    pub tax: Money,
    pub gross: Money,
}

/// `tax = round(net × rate)`, `gross = net + tax`.
pub fn apply_tax(net: Money, rate: TaxRate) -> TaxBreakdown {
    let tax = net.calculate_tax(rate);
    TaxBreakdown {
        tax,
        gross: net + tax,
    }
}

/// Totals of one line: `net = unit × quantity`, then [`apply_tax`] on the net.
///
/// ## Example
/// ```text
/// unit 10.00 × 3 = net 30.00
///      │
///      ▼
/// apply_tax(19%) → tax 5.70, gross 35.70
/// ```
pub fn line_total(unit_net_price: Money, quantity: i64, rate: TaxRate) -> LineTotals {
    let net = unit_net_price.multiply_quantity(quantity);
    let TaxBreakdown { tax, gross } = apply_tax(net, rate);
    LineTotals { net, tax, gross }
}

// =============================================================================
// Trait Implementations
// =============================================================================

/// Displays as a plain 2-place amount, e.g. `35.70` or `-5.50`.
impl fmt::Display for Money {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let sign = if self.0 < 0 { "-" } else { "" };
        let abs = self.0.unsigned_abs();
        write!(f, "{}{}.{:02}", sign, abs / 100, abs % 100)
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

impl Mul<i64> for Money {
    type Output = Self;

    #[inline]
    fn mul(self, qty: i64) -> Self {
        Money(self.0 * qty)
    }
}

impl Sum for Money {
    fn sum<I: Iterator<Item = Money>>(iter: I) -> Self {
        iter.fold(Money::zero(), |acc, m| acc + m)
    }
}

impl<'a> Sum<&'a Money> for Money {
    fn sum<I: Iterator<Item = &'a Money>>(iter: I) -> Self {
        iter.copied().sum()
    }
}

/// Decoding hook for legacy REAL columns.
impl TryFrom<f64> for Money {
    type Error = CoreError;

    fn try_from(value: f64) -> Result<Self, Self::Error> {
        Money::from_store(value)
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;
    use rust_decimal_macros::dec;

    #[test]
    fn test_display() {
        assert_eq!(Money::from_cents(3570).to_string(), "35.70");
        assert_eq!(Money::from_cents(500).to_string(), "5.00");
        assert_eq!(Money::from_cents(-550).to_string(), "-5.50");
        assert_eq!(Money::from_cents(-5).to_string(), "-0.05");
        assert_eq!(Money::zero().to_string(), "0.00");
    }

    #[test]
    fn test_to_currency_rounds_half_up() {
        assert_eq!(to_currency(dec!(2.345)).unwrap().cents(), 235);
        assert_eq!(to_currency(dec!(2.344)).unwrap().cents(), 234);
        assert_eq!(to_currency(dec!(-2.345)).unwrap().cents(), -235);
        assert_eq!(to_currency(dec!(0.005)).unwrap().cents(), 1);
    }

    #[test]
    fn test_from_store_uses_shortest_representation() {
        // 10.005 is stored as 10.00499999... in binary
        assert_eq!(Money::from_store(10.005).unwrap().cents(), 1001);
        assert_eq!(Money::from_store(0.1 + 0.2).unwrap().cents(), 30);
        assert_eq!(Money::from_store(19.99).unwrap().cents(), 1999);
    }

    #[test]
    fn test_from_store_rejects_non_finite() {
        assert!(Money::from_store(f64::NAN).is_err());
        assert!(Money::from_store(f64::INFINITY).is_err());
    }

    #[test]
    fn test_store_round_trip() {
        for cents in [0, 1, 99, 3570, 123_456_789, -42] {
            let money = Money::from_cents(cents);
            assert_eq!(Money::from_store(money.to_store()).unwrap(), money);
        }
    }

    #[test]
    fn test_apply_tax() {
        let result = apply_tax(Money::from_cents(3000), TaxRate::from_bps(1900));
        assert_eq!(result.tax.cents(), 570);
        assert_eq!(result.gross.cents(), 3570);
    }

    #[test]
    fn test_tax_rounds_half_up_at_midpoint() {
        // 0.50 × 19% = 0.095 → 0.10
        let tax = Money::from_cents(50).calculate_tax(TaxRate::from_bps(1900));
        assert_eq!(tax.cents(), 10);

        // -0.50 × 19% = -0.095 → -0.10
        let tax = Money::from_cents(-50).calculate_tax(TaxRate::from_bps(1900));
        assert_eq!(tax.cents(), -10);
    }

    #[test]
    fn test_line_total_reference_values() {
        let totals = line_total(Money::from_cents(1000), 3, TaxRate::from_bps(1900));
        assert_eq!(totals.net, Money::from_cents(3000));
        assert_eq!(totals.tax, Money::from_cents(570));
        assert_eq!(totals.gross, Money::from_cents(3570));
    }

    #[test]
    fn test_sum() {
        let amounts = [Money::from_cents(100), Money::from_cents(250)];
        let total: Money = amounts.iter().sum();
        assert_eq!(total.cents(), 350);
    }

    /// Sums of rounded line taxes may drift from the rounded tax of the
    /// unrounded sum. The drift stays within one cent for two lines.
    #[test]
    fn test_rounded_sum_drift_documented() {
        let rate = TaxRate::from_bps(1900);
        let lines = [Money::from_cents(50), Money::from_cents(50)];

        let summed: Money = lines.iter().map(|net| net.calculate_tax(rate)).sum();
        let unrounded: Decimal = lines.iter().map(|net| net.to_decimal() * rate.fraction()).sum();
        let rounded_once = to_currency(unrounded).unwrap();

        // 0.095 + 0.095 → 0.10 + 0.10 = 0.20, but round(0.19) = 0.19
        assert_eq!(summed.cents(), 20);
        assert_eq!(rounded_once.cents(), 19);
        assert!((summed - rounded_once).cents().abs() <= 1);
    }

    proptest! {
        #[test]
        fn prop_round_currency_is_idempotent(mantissa in -1_000_000_000i64..1_000_000_000, scale in 0u32..6) {
            let x = Decimal::new(mantissa, scale);
            prop_assert_eq!(round_currency(round_currency(x)), round_currency(x));
            let money = to_currency(x).unwrap();
            prop_assert_eq!(to_currency(money.to_decimal()).unwrap(), money);
        }

        #[test]
        fn prop_gross_is_net_plus_rounded_tax(cents in -10_000_000i64..10_000_000) {
            let net = Money::from_cents(cents);
            let result = apply_tax(net, TaxRate::from_bps(1900));
            let expected_tax = to_currency(net.to_decimal() * dec!(0.19)).unwrap();
            prop_assert_eq!(result.tax, expected_tax);
            prop_assert_eq!(result.gross, net + expected_tax);
        }
    }
}

//! # Weight
//!
//! Product and line weights in kilograms with 3 decimal places (grams).
//! Kept apart from [`Money`](crate::money::Money) so a weight can never be
//! rounded with currency precision by accident.

use rust_decimal::prelude::ToPrimitive;
use rust_decimal::{Decimal, RoundingStrategy};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::iter::Sum;
use std::ops::Add;

use crate::error::{CoreError, CoreResult};
use crate::money::decimal_from_store;

/// Fractional digits of a weight in kilograms.
pub const WEIGHT_SCALE: u32 = 3;

/// A weight in grams.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize)]
pub struct Weight(i64);

impl Weight {
    #[inline]
    pub const fn from_grams(grams: i64) -> Self {
        Weight(grams)
    }

    #[inline]
    pub const fn grams(&self) -> i64 {
        self.0
    }

    #[inline]
    pub const fn zero() -> Self {
        Weight(0)
    }

    /// Rounds a kilogram amount to 3 places, half-up.
    pub fn from_kg(kg: Decimal) -> CoreResult<Self> {
        let grams = kg.round_dp_with_strategy(WEIGHT_SCALE, RoundingStrategy::MidpointAwayFromZero)
            * Decimal::from(1000);
        grams
            .to_i64()
            .map(Weight)
            .ok_or_else(|| CoreError::invalid_amount("weight", kg))
    }

    /// Converts a legacy REAL kilogram column into a Weight.
    pub fn from_store(kg: f64) -> CoreResult<Self> {
        Self::from_kg(decimal_from_store(kg)?)
    }

    /// `round(unit_kg × quantity, 3 places)`.
    ///
    /// The product is computed on the unrounded unit weight; only the
    /// result is rounded.
    ///
    /// ## Example
    /// ```rust
    /// use orderdesk_core::weight::Weight;
    ///
    /// // 0.333 kg × 7 = 2.331 kg
    /// let line = Weight::scaled(0.333, 7).unwrap();
    /// assert_eq!(line.grams(), 2331);
    /// ```
    pub fn scaled(unit_kg: f64, quantity: i64) -> CoreResult<Self> {
        Self::from_kg(decimal_from_store(unit_kg)? * Decimal::from(quantity))
    }

    /// Exact kilogram value (3 places).
    #[inline]
    pub fn to_kg(&self) -> Decimal {
        Decimal::new(self.0, WEIGHT_SCALE)
    }

    /// Kilograms for a legacy REAL column.
    #[inline]
    pub fn to_store(&self) -> f64 {
        self.0 as f64 / 1000.0
    }
}

impl fmt::Display for Weight {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} kg", self.to_kg())
    }
}

impl Add for Weight {
    type Output = Self;

    fn add(self, other: Self) -> Self {
        Weight(self.0 + other.0)
    }
}

impl Sum for Weight {
    fn sum<I: Iterator<Item = Weight>>(iter: I) -> Self {
        iter.fold(Weight::zero(), |acc, w| acc + w)
    }
}

impl TryFrom<f64> for Weight {
    type Error = CoreError;

    fn try_from(kg: f64) -> Result<Self, Self::Error> {
        Weight::from_store(kg)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn test_scaled_uses_three_places() {
        assert_eq!(Weight::scaled(0.333, 7).unwrap().grams(), 2331);
        assert_eq!(Weight::scaled(0.333, 7).unwrap().to_kg(), dec!(2.331));
        // currency precision would have produced 2.33
        assert_ne!(Weight::scaled(0.333, 7).unwrap().to_kg(), dec!(2.33));
    }

    #[test]
    fn test_scaled_rounds_product_not_unit() {
        // 0.3335 × 7 = 2.3345 → 2.335 (rounding the unit first would give 2.338)
        assert_eq!(Weight::scaled(0.3335, 7).unwrap().grams(), 2335);
    }

    #[test]
    fn test_from_kg_half_up() {
        assert_eq!(Weight::from_kg(dec!(1.0005)).unwrap().grams(), 1001);
        assert_eq!(Weight::from_kg(dec!(1.0004)).unwrap().grams(), 1000);
    }

    #[test]
    fn test_store_round_trip_and_display() {
        let weight = Weight::from_grams(2331);
        assert_eq!(Weight::from_store(weight.to_store()).unwrap(), weight);
        assert_eq!(weight.to_string(), "2.331 kg");
    }
}

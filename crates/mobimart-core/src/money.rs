//! # Money Module
//!
//! Provides the `Money` type for handling monetary values safely, and
//! the `Discount` percentage applied to product prices.
//!
//! ## Why Integer Money?
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────┐
//! │  THE FLOATING POINT PROBLEM                                          │
//! │                                                                      │
//! │  In JavaScript/floating point:                                       │
//! │    0.1 + 0.2 = 0.30000000000000004  ❌ WRONG!                        │
//! │                                                                      │
//! │  OUR SOLUTION: integer minor units (whole rupees here)               │
//! │    79999 × (100 − 10) = 7199910, +50, /100 = 71999                   │
//! │    Rounding to the nearest unit is explicit, not accidental          │
//! └──────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Usage
//! ```rust
//! use mobimart_core::money::{Discount, Money};
//!
//! let price = Money::from_minor(79_999);
//! let discount = Discount::try_new(10).unwrap();
//!
//! // Effective price = price × (1 − discount/100), rounded to nearest unit
//! assert_eq!(price.with_discount(discount).minor(), 71_999);
//! ```

use serde::{Deserialize, Serialize};
use std::fmt;
use std::ops::{Add, AddAssign, Mul, Sub, SubAssign};
use ts_rs::TS;

use crate::error::ValidationError;

// =============================================================================
// Money Type
// =============================================================================

/// A monetary value in the smallest currency unit.
///
/// ## Design Decisions
/// - **i64 (signed)**: allows negative values for refunds/adjustments
/// - **Single field tuple struct**: zero-cost abstraction over i64
/// - **No float constructor**: every value enters as an integer
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct Money(i64);

impl Money {
    /// Creates a Money value from minor units.
    #[inline]
    pub const fn from_minor(minor: i64) -> Self {
        Money(minor)
    }

    /// Returns the value in minor units.
    #[inline]
    pub const fn minor(&self) -> i64 {
        self.0
    }

    /// Zero money.
    #[inline]
    pub const fn zero() -> Self {
        Money(0)
    }

    /// Checks if the value is zero.
    #[inline]
    pub const fn is_zero(&self) -> bool {
        self.0 == 0
    }

    /// Checks if the value is negative.
    #[inline]
    pub const fn is_negative(&self) -> bool {
        self.0 < 0
    }

    /// Applies a percentage discount, rounding to the nearest unit.
    ///
    /// Half-units round up (away from zero), matching how the
    /// storefront displays discounted prices.
    pub fn with_discount(self, discount: Discount) -> Money {
        if discount.is_zero() {
            return self;
        }
        let keep = 100 - discount.percent() as i64;
        Money((self.0 * keep + 50).div_euclid(100))
    }

    /// Multiplies by a quantity, for line totals.
    #[inline]
    pub const fn times(self, quantity: i64) -> Money {
        Money(self.0 * quantity)
    }
}

impl fmt::Display for Money {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl Add for Money {
    type Output = Money;
    fn add(self, rhs: Money) -> Money {
        Money(self.0 + rhs.0)
    }
}

impl AddAssign for Money {
    fn add_assign(&mut self, rhs: Money) {
        self.0 += rhs.0;
    }
}

impl Sub for Money {
    type Output = Money;
    fn sub(self, rhs: Money) -> Money {
        Money(self.0 - rhs.0)
    }
}

impl SubAssign for Money {
    fn sub_assign(&mut self, rhs: Money) {
        self.0 -= rhs.0;
    }
}

impl Mul<i64> for Money {
    type Output = Money;
    fn mul(self, rhs: i64) -> Money {
        Money(self.0 * rhs)
    }
}

impl std::iter::Sum for Money {
    fn sum<I: Iterator<Item = Money>>(iter: I) -> Money {
        iter.fold(Money::zero(), Add::add)
    }
}

// =============================================================================
// Discount
// =============================================================================

/// A percentage discount between 0 and 100 (whole percent).
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Default, Serialize, Deserialize, TS,
)]
#[ts(export)]
pub struct Discount(u8);

impl Discount {
    /// Maximum discount percentage.
    pub const MAX_PERCENT: u8 = 100;

    /// Creates a discount, rejecting values over 100.
    pub fn try_new(percent: u8) -> Result<Self, ValidationError> {
        if percent > Self::MAX_PERCENT {
            return Err(ValidationError::OutOfRange {
                field: "discount".to_string(),
                min: 0,
                max: Self::MAX_PERCENT as i64,
            });
        }
        Ok(Discount(percent))
    }

    /// Creates a discount from a raw i64, as read from storage.
    pub fn try_from_i64(percent: i64) -> Result<Self, ValidationError> {
        if !(0..=Self::MAX_PERCENT as i64).contains(&percent) {
            return Err(ValidationError::OutOfRange {
                field: "discount".to_string(),
                min: 0,
                max: Self::MAX_PERCENT as i64,
            });
        }
        Ok(Discount(percent as u8))
    }

    /// No discount.
    #[inline]
    pub const fn none() -> Self {
        Discount(0)
    }

    /// Returns the discount percentage.
    #[inline]
    pub const fn percent(&self) -> u8 {
        self.0
    }

    /// Checks if the discount is zero.
    #[inline]
    pub const fn is_zero(&self) -> bool {
        self.0 == 0
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_money_arithmetic() {
        let a = Money::from_minor(1000);
        let b = Money::from_minor(250);

        assert_eq!((a + b).minor(), 1250);
        assert_eq!((a - b).minor(), 750);
        assert_eq!((a * 3).minor(), 3000);
        assert_eq!(a.times(3).minor(), 3000);
    }

    #[test]
    fn test_money_sum() {
        let total: Money = [100, 200, 300]
            .iter()
            .map(|m| Money::from_minor(*m))
            .sum();
        assert_eq!(total.minor(), 600);
    }

    #[test]
    fn test_zero_discount_is_identity() {
        let price = Money::from_minor(79_999);
        assert_eq!(price.with_discount(Discount::none()), price);
    }

    #[test]
    fn test_discount_rounds_to_nearest_unit() {
        // 999 × 0.95 = 949.05 → 949
        let price = Money::from_minor(999);
        let d = Discount::try_new(5).unwrap();
        assert_eq!(price.with_discount(d).minor(), 949);

        // 990 × 0.85 = 841.5 → rounds up to 842
        let price = Money::from_minor(990);
        let d = Discount::try_new(15).unwrap();
        assert_eq!(price.with_discount(d).minor(), 842);
    }

    #[test]
    fn test_full_discount_is_free() {
        let price = Money::from_minor(31_999);
        let d = Discount::try_new(100).unwrap();
        assert_eq!(price.with_discount(d), Money::zero());
    }

    #[test]
    fn test_discount_rejects_over_100() {
        assert!(Discount::try_new(101).is_err());
        assert!(Discount::try_from_i64(-1).is_err());
        assert!(Discount::try_from_i64(100).is_ok());
    }
}

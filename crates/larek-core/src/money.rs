//! # Money Module
//!
//! Provides the `Money` type for prices and basket totals.
//!
//! ## Why Integer Money?
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  THE FLOATING POINT PROBLEM                                             │
//! │                                                                         │
//! │  The basket total is maintained incrementally (add on add, subtract    │
//! │  on remove). With floats the running total drifts from the sum of the  │
//! │  lines after enough add/remove cycles.                                 │
//! │                                                                         │
//! │  OUR SOLUTION: whole synapses in an i64                                 │
//! │    total == Σ items[].price holds exactly after every step             │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Usage
//! ```rust
//! use larek_core::money::Money;
//!
//! let price = Money::from_units(750);
//! let total = price + Money::from_units(12_000);
//!
//! assert_eq!(total.units(), 12_750);
//! assert_eq!(total.to_string(), "12 750 synapses");
//! ```

use serde::{Deserialize, Serialize};
use std::fmt;
use std::iter::Sum;
use std::ops::{Add, AddAssign, Sub, SubAssign};
use ts_rs::TS;

/// Amounts from this value up are printed with grouped thousands.
const GROUPING_THRESHOLD: i64 = 10_000;

// =============================================================================
// Money Type
// =============================================================================

/// A monetary value in whole synapses (the storefront currency).
///
/// ## Design Decisions
/// - **i64 (signed)**: subtraction during basket updates can never wrap
/// - **Single field tuple struct**: serializes as a plain JSON number, which
///   is exactly what the catalog API sends for `price`
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, TS,
)]
#[ts(export)]
pub struct Money(i64);

impl Money {
    /// Creates a Money value from whole synapses.
    ///
    /// ## Example
    /// ```rust
    /// use larek_core::money::Money;
    ///
    /// let price = Money::from_units(2_500);
    /// assert_eq!(price.units(), 2_500);
    /// ```
    #[inline]
    pub const fn from_units(units: i64) -> Self {
        Money(units)
    }

    /// Returns the value in whole synapses.
    #[inline]
    pub const fn units(&self) -> i64 {
        self.0
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

    /// Formats the bare amount the way price tags show it.
    ///
    /// Below 10 000 the digits are printed as-is; from 10 000 up thousands
    /// are separated by a space.
    ///
    /// ## Example
    /// ```rust
    /// use larek_core::money::Money;
    ///
    /// assert_eq!(Money::from_units(9_999).format_amount(), "9999");
    /// assert_eq!(Money::from_units(1_250_000).format_amount(), "1 250 000");
    /// ```
    pub fn format_amount(&self) -> String {
        let digits = self.0.unsigned_abs().to_string();
        let sign = if self.0 < 0 { "-" } else { "" };

        if self.0.abs() < GROUPING_THRESHOLD {
            return format!("{sign}{digits}");
        }

        let mut grouped = String::with_capacity(digits.len() + digits.len() / 3);
        for (i, ch) in digits.chars().enumerate() {
            if i > 0 && (digits.len() - i) % 3 == 0 {
                grouped.push(' ');
            }
            grouped.push(ch);
        }
        format!("{sign}{grouped}")
    }
}

// =============================================================================
// Trait Implementations
// =============================================================================

/// Display shows the amount with its currency, as on price tags.
impl fmt::Display for Money {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} synapses", self.format_amount())
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
        iter.fold(Money::zero(), Add::add)
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

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_units() {
        let money = Money::from_units(1099);
        assert_eq!(money.units(), 1099);
        assert!(!money.is_zero());
    }

    #[test]
    fn test_display() {
        assert_eq!(Money::from_units(0).to_string(), "0 synapses");
        assert_eq!(Money::from_units(750).to_string(), "750 synapses");
        assert_eq!(Money::from_units(9_999).to_string(), "9999 synapses");
        assert_eq!(Money::from_units(10_000).to_string(), "10 000 synapses");
        assert_eq!(Money::from_units(12_500).to_string(), "12 500 synapses");
        assert_eq!(Money::from_units(-15_000).to_string(), "-15 000 synapses");
    }

    #[test]
    fn test_arithmetic() {
        let a = Money::from_units(1000);
        let b = Money::from_units(500);

        assert_eq!((a + b).units(), 1500);
        assert_eq!((a - b).units(), 500);
        assert!((b - a).is_negative());

        let mut c = a;
        c += b;
        c -= Money::from_units(100);
        assert_eq!(c.units(), 1400);
    }

    #[test]
    fn test_sum() {
        let prices = [Money::from_units(500), Money::from_units(250), Money::zero()];
        let by_ref: Money = prices.iter().sum();
        let by_val: Money = prices.into_iter().sum();
        assert_eq!(by_ref, Money::from_units(750));
        assert_eq!(by_val, by_ref);
    }

    #[test]
    fn test_serializes_as_plain_number() {
        let json = serde_json::to_string(&Money::from_units(2500)).unwrap();
        assert_eq!(json, "2500");
        let back: Money = serde_json::from_str("2500").unwrap();
        assert_eq!(back, Money::from_units(2500));
    }
}

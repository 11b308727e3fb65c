//! # Money Module
//!
//! Provides the `Money` type for handling monetary values safely.
//!
//! ## Why Integer Money?
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  THE FLOATING POINT PROBLEM                                             │
//! │                                                                         │
//! │    0.1 + 0.2 = 0.30000000000000004  ❌ WRONG!                           │
//! │                                                                         │
//! │  OUR SOLUTION: Integer paise (1/100 of a rupee)                         │
//! │    Slab thresholds, payouts, tax splits and report totals are all       │
//! │    exact integer arithmetic. Only display converts to "1234.50".        │
//! │                                                                         │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Usage
//! ```rust
//! use stitch_core::money::Money;
//!
//! let mrp: Money = "1299.50".parse().unwrap();
//! assert_eq!(mrp.cents(), 129_950);
//! assert_eq!(mrp.to_string(), "1299.50");
//! ```

use serde::{Deserialize, Serialize};
use std::fmt;
use std::iter::Sum;
use std::ops::{Add, AddAssign, Mul, Neg, Sub, SubAssign};
use std::str::FromStr;

use crate::error::ValidationError;
use crate::types::TaxRate;

// =============================================================================
// Money Type
// =============================================================================

/// Represents a monetary value in the smallest currency unit (paise).
///
/// The field is named "cents" throughout the code base; for INR that is paise.
///
/// ## Design Decisions
/// - **i64 (signed)**: Allows negative values for reversals and variances
/// - **Single field tuple struct**: Zero-cost abstraction over i64
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct Money(i64);

impl Money {
    /// Creates a Money value from cents (the smallest currency unit).
    ///
    /// ## Example
    /// ```rust
    /// use stitch_core::money::Money;
    ///
    /// let price = Money::from_cents(1099);
    /// assert_eq!(price.cents(), 1099);
    /// ```
    #[inline]
    pub const fn from_cents(cents: i64) -> Self {
        Money(cents)
    }

    /// Creates a Money value from whole currency units.
    ///
    /// ## Example
    /// ```rust
    /// use stitch_core::money::Money;
    ///
    /// assert_eq!(Money::from_major(2500).cents(), 250_000);
    /// ```
    #[inline]
    pub const fn from_major(major: i64) -> Self {
        Money(major * 100)
    }

    /// Returns the value in cents (smallest currency unit).
    #[inline]
    pub const fn cents(&self) -> i64 {
        self.0
    }

    /// Returns the major unit portion (truncated toward zero).
    #[inline]
    pub const fn major(&self) -> i64 {
        self.0 / 100
    }

    /// Returns the minor unit portion (always 0-99).
    #[inline]
    pub const fn cents_part(&self) -> i64 {
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

    /// Calculates tax on top of this amount (exclusive pricing).
    ///
    /// ## Rounding
    /// Half-up to the nearest paisa (half away from zero for negatives), the
    /// rule every register report in the system uses.
    ///
    /// ## Example
    /// ```rust
    /// use stitch_core::money::Money;
    /// use stitch_core::types::TaxRate;
    ///
    /// let price = Money::from_cents(1050); // 10.50
    /// let tax = price.calculate_tax(TaxRate::from_bps(500)); // 5%
    /// // 10.50 × 5% = 0.525 → 0.53
    /// assert_eq!(tax.cents(), 53);
    /// ```
    pub fn calculate_tax(&self, rate: TaxRate) -> Money {
        Money(div_round_half_up(
            self.0 as i128 * rate.bps() as i128,
            10_000,
        ))
    }

    /// Splits a tax-inclusive amount into `(taxable_value, tax)`.
    ///
    /// ```text
    /// taxable = round(amount × 10000 / (10000 + bps))
    /// tax     = amount − taxable
    /// ```
    /// The two parts always sum back to `self` exactly.
    ///
    /// ## Example
    /// ```rust
    /// use stitch_core::money::Money;
    /// use stitch_core::types::TaxRate;
    ///
    /// let mrp = Money::from_cents(105_000); // 1050.00 incl. 5%
    /// let (taxable, tax) = mrp.extract_inclusive_tax(TaxRate::from_bps(500));
    /// assert_eq!(taxable.cents(), 100_000);
    /// assert_eq!(tax.cents(), 5_000);
    /// ```
    pub fn extract_inclusive_tax(&self, rate: TaxRate) -> (Money, Money) {
        let taxable = div_round_half_up(
            self.0 as i128 * 10_000,
            10_000 + rate.bps() as i128,
        );
        (Money(taxable), Money(self.0 - taxable))
    }

    /// Splits the amount into two halves that sum back exactly.
    ///
    /// The first half takes the rounded-up share of an odd paisa, so
    /// `0.83` becomes `(0.42, 0.41)`.
    pub fn split_even(&self) -> (Money, Money) {
        let first = div_round_half_up(self.0 as i128, 2);
        (Money(first), Money(self.0 - first))
    }

    /// How many whole `unit` amounts fit into this amount (floor division).
    ///
    /// Returns 0 for a non-positive unit so callers can treat it as
    /// "nothing due" without a division-by-zero branch.
    ///
    /// ## Example
    /// ```rust
    /// use stitch_core::money::Money;
    ///
    /// let sale = Money::from_major(5200);
    /// assert_eq!(sale.whole_units_of(Money::from_major(5000)), 1);
    /// assert_eq!(sale.whole_units_of(Money::from_major(1000)), 5);
    /// assert_eq!(sale.whole_units_of(Money::zero()), 0);
    /// ```
    pub fn whole_units_of(&self, unit: Money) -> i64 {
        if unit.0 <= 0 || self.0 <= 0 {
            return 0;
        }
        self.0 / unit.0
    }

    /// Multiplies money by a quantity.
    #[inline]
    pub const fn multiply_quantity(&self, qty: i64) -> Self {
        Money(self.0 * qty)
    }

    /// Fixed two-decimal representation without a currency symbol.
    ///
    /// This is the wire format for every report column.
    pub fn to_fixed(&self) -> String {
        self.to_string()
    }
}

/// Integer division rounding half away from zero.
///
/// `denominator` must be positive.
pub(crate) fn div_round_half_up(numerator: i128, denominator: i128) -> i64 {
    let half = denominator / 2;
    let rounded = if numerator >= 0 {
        (numerator + half) / denominator
    } else {
        (numerator - half) / denominator
    };
    rounded as i64
}

// =============================================================================
// Trait Implementations
// =============================================================================

/// Displays as a plain fixed two-decimal amount, e.g. `-5.50`.
impl fmt::Display for Money {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let sign = if self.0 < 0 { "-" } else { "" };
        write!(f, "{}{}.{:02}", sign, self.major().abs(), self.cents_part())
    }
}

/// Parses `"1299"`, `"1299.5"`, `"1299.50"` or `"-3.25"`.
///
/// More than two decimal places is rejected rather than silently rounded.
impl FromStr for Money {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let invalid = |reason: &str| ValidationError::InvalidFormat {
            field: "amount".to_string(),
            reason: reason.to_string(),
        };

        let s = s.trim();
        if s.is_empty() {
            return Err(ValidationError::Required {
                field: "amount".to_string(),
            });
        }

        let (negative, digits) = match s.strip_prefix('-') {
            Some(rest) => (true, rest),
            None => (false, s),
        };

        let (major_str, minor_str) = match digits.split_once('.') {
            Some((major, minor)) => (major, minor),
            None => (digits, ""),
        };

        if major_str.is_empty() || !major_str.chars().all(|c| c.is_ascii_digit()) {
            return Err(invalid("expected digits before the decimal point"));
        }
        if minor_str.len() > 2 || !minor_str.chars().all(|c| c.is_ascii_digit()) {
            return Err(invalid("at most two decimal places are allowed"));
        }

        let major: i64 = major_str
            .parse()
            .map_err(|_| invalid("amount is too large"))?;
        let minor: i64 = match minor_str.len() {
            0 => 0,
            1 => minor_str.parse::<i64>().map_err(|_| invalid("bad fraction"))? * 10,
            _ => minor_str.parse().map_err(|_| invalid("bad fraction"))?,
        };

        let cents = major
            .checked_mul(100)
            .and_then(|c| c.checked_add(minor))
            .ok_or_else(|| invalid("amount is too large"))?;

        Ok(Money(if negative { -cents } else { cents }))
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

impl Neg for Money {
    type Output = Self;

    #[inline]
    fn neg(self) -> Self {
        Money(-self.0)
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

// =============================================================================
// Unit Tests
// =============================================================================

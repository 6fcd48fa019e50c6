use rust_decimal::{Decimal, RoundingStrategy};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::ops::{Sub, SubAssign};
use std::str::FromStr;

/// Money amount kept at full decimal precision.
///
/// Arithmetic never rounds; rounding to the currency's minor unit happens once,
/// through [`Money::round_to_unit`], when a payoff is composed. Growing
/// operations are checked and yield `None` past the decimal range.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, Default)]
#[serde(transparent)]
pub struct Money(Decimal);

impl Money {
    pub const ZERO: Money = Money(Decimal::ZERO);

    /// create from decimal
    pub fn from_decimal(d: Decimal) -> Self {
        Money(d)
    }

    /// create from string with exact parsing
    pub fn from_str_exact(s: &str) -> Result<Self, rust_decimal::Error> {
        Ok(Money(Decimal::from_str(s.trim())?))
    }

    /// create from integer amount (rupees, dollars, etc)
    pub fn from_major(amount: i64) -> Self {
        Money(Decimal::from(amount))
    }

    /// get underlying decimal
    pub fn as_decimal(&self) -> Decimal {
        self.0
    }

    /// round half away from zero to `dp` decimal places of the currency unit
    pub fn round_to_unit(&self, dp: u32) -> Self {
        Money(self.0.round_dp_with_strategy(dp, RoundingStrategy::MidpointAwayFromZero))
    }

    /// round up to `dp` decimal places
    pub fn ceil_to_unit(&self, dp: u32) -> Self {
        Money(self.0.round_dp_with_strategy(dp, RoundingStrategy::AwayFromZero))
    }

    /// check if strictly positive
    pub fn is_positive(&self) -> bool {
        self.0 > Decimal::ZERO
    }

    /// check if strictly negative
    pub fn is_negative(&self) -> bool {
        self.0 < Decimal::ZERO
    }

    /// maximum of two values
    pub fn max(self, other: Self) -> Self {
        Money(self.0.max(other.0))
    }

    pub fn checked_add(self, other: Self) -> Option<Self> {
        self.0.checked_add(other.0).map(Money)
    }

    pub fn checked_mul(self, factor: Decimal) -> Option<Self> {
        self.0.checked_mul(factor).map(Money)
    }

    /// one period's interest at `rate` (e.g., 2% of 10,000 is 200)
    pub fn percentage(&self, rate: Rate) -> Option<Self> {
        self.checked_mul(rate.as_fraction())
    }
}

impl fmt::Display for Money {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for Money {
    type Err = rust_decimal::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Money::from_str_exact(s)
    }
}

impl Sub for Money {
    type Output = Money;

    fn sub(self, other: Money) -> Money {
        Money(self.0 - other.0)
    }
}

impl SubAssign for Money {
    fn sub_assign(&mut self, other: Money) {
        self.0 -= other.0;
    }
}

/// Interest rate expressed as a percentage, the way schemes store it
/// (`2` means 2% per rate period).
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, Default)]
#[serde(transparent)]
pub struct Rate(Decimal);

impl Rate {
    /// create from a percentage (e.g., 2 for 2%)
    pub fn from_percentage(p: Decimal) -> Self {
        Rate(p)
    }

    /// create from a whole percentage
    pub fn from_whole_percentage(p: u32) -> Self {
        Rate(Decimal::from(p))
    }

    /// get as percentage
    pub fn as_percentage(&self) -> Decimal {
        self.0
    }

    /// get as fraction (2% -> 0.02)
    pub fn as_fraction(&self) -> Decimal {
        self.0 / Decimal::ONE_HUNDRED
    }

    pub fn is_negative(&self) -> bool {
        self.0 < Decimal::ZERO
    }
}

impl fmt::Display for Rate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}%", self.0)
    }
}

pub mod accumulator;
pub mod duration;
pub mod rates;

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::decimal::Rate;

pub use accumulator::InterestAccumulator;
pub use duration::{DurationResolver, ElapsedDuration};
pub use rates::RateSelector;

/// which rate a sub-period was charged at
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RateTier {
    /// base (or overridden) rate within validity
    Base,
    /// fractional month charged for a short day-basis duration
    DayFraction,
    /// surcharge rate past validity
    Surcharge,
}

/// simple-interest segment: `rate` charged for `months` periods of a month
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SubPeriod {
    pub rate: Rate,
    pub months: Decimal,
    pub tier: RateTier,
}

impl SubPeriod {
    pub fn new(rate: Rate, months: Decimal, tier: RateTier) -> Self {
        Self { rate, months, tier }
    }
}

/// ordered sub-periods summing to the chargeable duration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
#[serde(transparent)]
pub struct SubPeriods(Vec<SubPeriod>);

impl SubPeriods {
    pub fn new(periods: Vec<SubPeriod>) -> Self {
        Self(periods)
    }

    pub fn iter(&self) -> std::slice::Iter<'_, SubPeriod> {
        self.0.iter()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// total months charged across all sub-periods
    pub fn chargeable_months(&self) -> Decimal {
        self.0.iter().map(|p| p.months).sum()
    }

    /// rate of the first sub-period, the rate the loan was booked at
    pub fn first_rate(&self) -> Option<Rate> {
        self.0.first().map(|p| p.rate)
    }

    /// rate of the last sub-period, surcharge once validity is exceeded
    pub fn final_rate(&self) -> Option<Rate> {
        self.0.last().map(|p| p.rate)
    }

    pub fn has_surcharge(&self) -> bool {
        self.0.iter().any(|p| p.tier == RateTier::Surcharge)
    }
}

impl<'a> IntoIterator for &'a SubPeriods {
    type Item = &'a SubPeriod;
    type IntoIter = std::slice::Iter<'a, SubPeriod>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.iter()
    }
}

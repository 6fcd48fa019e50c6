use chrono::{Datelike, Months, NaiveDate};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::errors::{CalculationError, Result};

/// elapsed time between loan start and closing
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ElapsedDuration {
    /// completed calendar months
    pub months: u32,
    /// days left over after the completed months
    pub remainder_days: u32,
    /// calendar days between start and end
    pub total_days: u32,
}

impl ElapsedDuration {
    /// whole months plus the remainder prorated over `days_per_month`
    pub fn prorated_months(&self, days_per_month: u32) -> Decimal {
        Decimal::from(self.months)
            + Decimal::from(self.remainder_days) / Decimal::from(days_per_month.max(1))
    }

    pub fn is_zero(&self) -> bool {
        self.total_days == 0
    }
}

/// resolves a date pair into completed months and days
#[derive(Debug, Clone, Copy, Default)]
pub struct DurationResolver;

impl DurationResolver {
    pub fn new() -> Self {
        Self
    }

    /// count completed months and remaining days between `start` and `end`
    ///
    /// A month completes on the start's day-of-month, clamped to the last day of
    /// shorter months (a loan taken on Jan 31 completes its first month on Feb 29
    /// in a leap year).
    pub fn resolve(&self, start: NaiveDate, end: NaiveDate) -> Result<ElapsedDuration> {
        if end < start {
            return Err(CalculationError::InvalidRange { start, end });
        }

        let total_days = (end - start).num_days() as u32;

        let calendar_months = (end.year() - start.year()) * 12 + end.month() as i32
            - start.month() as i32;
        let mut months = calendar_months.max(0) as u32;

        let anniversary = loop {
            let candidate = start
                .checked_add_months(Months::new(months))
                .ok_or(CalculationError::InvalidRange { start, end })?;
            if candidate <= end || months == 0 {
                break candidate;
            }
            months -= 1;
        };

        Ok(ElapsedDuration {
            months,
            remainder_days: (end - anniversary).num_days() as u32,
            total_days,
        })
    }
}

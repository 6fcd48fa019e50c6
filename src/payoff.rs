use serde::{Deserialize, Serialize};

use crate::decimal::{Money, Rate};
use crate::errors::{CalculationError, Result};
use crate::interest::{ElapsedDuration, SubPeriods};

/// payoff breakdown for one calculation
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CalculationResult {
    /// whole months used for tier selection
    pub elapsed_months: u32,
    /// days past the whole months
    pub elapsed_days: u32,
    /// rate actually applied last, base or surcharge
    pub effective_rate: Rate,
    pub total_interest: Money,
    pub interest_reduction: Money,
    pub manual_reduction_applied: Money,
    /// never below principal
    pub total_payable: Money,
    pub sub_periods: SubPeriods,
}

impl CalculationResult {
    /// payable amount above principal, what the ledger books as interest income
    pub fn interest_income(&self, principal: Money) -> Money {
        (self.total_payable - principal).max(Money::ZERO)
    }
}

/// inputs gathered by the engine for composition
#[derive(Debug, Clone, Copy)]
pub struct PayoffInput<'a> {
    pub principal: Money,
    pub total_interest: Money,
    pub sub_periods: &'a SubPeriods,
    /// rate the loan was booked at, used when nothing was chargeable
    pub booked_rate: Rate,
    pub elapsed: ElapsedDuration,
    pub interest_already_taken: bool,
    pub manual_reduction: Money,
}

/// applies reductions, the principal floor and the final rounding
#[derive(Debug, Clone, Copy)]
pub struct PayoffComposer {
    pub currency_precision: u32,
}

impl Default for PayoffComposer {
    fn default() -> Self {
        Self::new(0)
    }
}

impl PayoffComposer {
    pub fn new(currency_precision: u32) -> Self {
        Self { currency_precision }
    }

    pub fn compose(&self, input: PayoffInput<'_>) -> Result<CalculationResult> {
        if !input.principal.is_positive() {
            return Err(CalculationError::InvalidAmount {
                amount: input.principal.to_string(),
            });
        }
        if input.manual_reduction.is_negative() {
            return Err(CalculationError::InvalidReduction {
                amount: input.manual_reduction,
            });
        }

        let first_rate = input.sub_periods.first_rate().unwrap_or(input.booked_rate);
        let effective_rate = input.sub_periods.final_rate().unwrap_or(input.booked_rate);

        let mut total_amount = input
            .principal
            .checked_add(input.total_interest)
            .ok_or_else(|| CalculationError::out_of_range(input.principal))?;

        let interest_reduction = if input.interest_already_taken {
            input
                .principal
                .percentage(first_rate)
                .ok_or_else(|| CalculationError::out_of_range(input.principal))?
        } else {
            Money::ZERO
        };
        total_amount -= interest_reduction;
        total_amount -= input.manual_reduction;

        if total_amount < input.principal {
            total_amount = input.principal;
        }

        let dp = self.currency_precision;
        let mut total_payable = total_amount.round_to_unit(dp);
        if total_payable < input.principal {
            total_payable = input.principal.ceil_to_unit(dp);
        }

        Ok(CalculationResult {
            elapsed_months: input.elapsed.months,
            elapsed_days: input.elapsed.remainder_days,
            effective_rate,
            total_interest: input.total_interest.round_to_unit(dp),
            interest_reduction: interest_reduction.round_to_unit(dp),
            manual_reduction_applied: input.manual_reduction.round_to_unit(dp),
            total_payable,
            sub_periods: input.sub_periods.clone(),
        })
    }
}

use rust_decimal::Decimal;

use crate::decimal::Money;
use crate::errors::{CalculationError, Result};
use crate::interest::{SubPeriod, SubPeriods};
use crate::types::RatePeriod;

const MONTHS_IN_YEAR: u32 = 12;

/// sums simple interest over rated sub-periods
///
/// Sub-periods never compound into each other; "compound" schemes only stack an
/// annual surcharge segment. Nothing is rounded here, the payoff rounds once.
#[derive(Debug, Clone, Copy)]
pub struct InterestAccumulator {
    pub rate_period: RatePeriod,
}

impl InterestAccumulator {
    pub fn new(rate_period: RatePeriod) -> Self {
        Self { rate_period }
    }

    /// interest for a single sub-period at full precision
    pub fn period_interest(&self, principal: Money, period: &SubPeriod) -> Result<Money> {
        let periods_charged = match self.rate_period {
            RatePeriod::Monthly => period.months,
            RatePeriod::Yearly => period.months / Decimal::from(MONTHS_IN_YEAR),
        };
        period
            .rate
            .as_fraction()
            .checked_mul(periods_charged)
            .and_then(|factor| principal.checked_mul(factor))
            .ok_or_else(|| CalculationError::out_of_range(principal))
    }

    /// total interest across all sub-periods
    pub fn accumulate(&self, principal: Money, periods: &SubPeriods) -> Result<Money> {
        periods.iter().try_fold(Money::ZERO, |total, period| {
            let interest = self.period_interest(principal, period)?;
            total
                .checked_add(interest)
                .ok_or_else(|| CalculationError::out_of_range(principal))
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::decimal::Rate;
    use crate::interest::RateTier;
    use rust_decimal_macros::dec;

    #[test]
    fn test_monthly_interest() {
        let acc = InterestAccumulator::new(RatePeriod::Monthly);
        let periods = SubPeriods::new(vec![
            SubPeriod::new(Rate::from_whole_percentage(2), dec!(6), RateTier::Base),
            SubPeriod::new(Rate::from_whole_percentage(3), dec!(1), RateTier::Surcharge),
        ]);

        // 10,000 x 2% x 6 + 10,000 x 3% x 1
        let interest = acc.accumulate(Money::from_major(10_000), &periods).unwrap();
        assert_eq!(interest, Money::from_major(1_500));
    }

    #[test]
    fn test_day_fraction_interest() {
        let acc = InterestAccumulator::new(RatePeriod::Monthly);
        let periods = SubPeriods::new(vec![SubPeriod::new(
            Rate::from_whole_percentage(2),
            dec!(0.5),
            RateTier::DayFraction,
        )]);
        assert_eq!(acc.accumulate(Money::from_major(10_000), &periods).unwrap(), Money::from_major(100));
    }

    #[test]
    fn test_yearly_interest() {
        let acc = InterestAccumulator::new(RatePeriod::Yearly);
        let periods = SubPeriods::new(vec![
            SubPeriod::new(Rate::from_whole_percentage(18), dec!(12), RateTier::Base),
            SubPeriod::new(Rate::from_whole_percentage(24), dec!(6), RateTier::Surcharge),
        ]);

        // 100,000 x 18% + 100,000 x 24% x 0.5
        let interest = acc.accumulate(Money::from_major(100_000), &periods).unwrap();
        assert_eq!(interest, Money::from_major(30_000));
    }

    #[test]
    fn test_no_intermediate_rounding() {
        let acc = InterestAccumulator::new(RatePeriod::Yearly);
        let periods = SubPeriods::new(vec![SubPeriod::new(
            Rate::from_whole_percentage(10),
            dec!(1),
            RateTier::Base,
        )]);

        // 1,000 x 10% / 12 = 8.333...
        let interest = acc.accumulate(Money::from_major(1_000), &periods).unwrap();
        assert!(interest.as_decimal() > dec!(8.3333));
        assert!(interest.as_decimal() < dec!(8.3334));
        assert_eq!(interest.round_to_unit(0), Money::from_major(8));
    }

    #[test]
    fn test_empty_periods_accrue_nothing() {
        let acc = InterestAccumulator::new(RatePeriod::Monthly);
        assert_eq!(
            acc.accumulate(Money::from_major(5_000), &SubPeriods::default()).unwrap(),
            Money::ZERO
        );
    }

    #[test]
    fn test_interest_past_decimal_range_is_rejected() {
        let acc = InterestAccumulator::new(RatePeriod::Monthly);
        let periods = SubPeriods::new(vec![SubPeriod::new(
            Rate::from_whole_percentage(100),
            dec!(24),
            RateTier::Base,
        )]);

        let err = acc.accumulate(Money::from_decimal(Decimal::MAX), &periods).unwrap_err();
        assert!(matches!(err, CalculationError::InvalidAmount { .. }));
        assert!(err.to_string().contains("out of range"));
    }
}

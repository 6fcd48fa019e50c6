use chrono::NaiveDate;
use hourglass_rs::SafeTimeProvider;
use serde::{Deserialize, Serialize};

use crate::config::{EngineSettings, SchemeConfig};
use crate::decimal::{Money, Rate};
use crate::errors::{CalculationError, Result};
use crate::interest::{DurationResolver, InterestAccumulator, RateSelector};
use crate::payoff::{CalculationResult, PayoffComposer, PayoffInput};

/// per-call inputs of a payoff calculation
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CalculationRequest {
    pub principal: Money,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    /// replaces the scheme's base rate for this call only
    pub override_rate: Option<Rate>,
    pub override_validity_months: Option<u32>,
    pub interest_already_taken: bool,
    pub manual_reduction: Money,
}

impl CalculationRequest {
    pub fn new(principal: Money, start_date: NaiveDate, end_date: NaiveDate) -> Self {
        Self {
            principal,
            start_date,
            end_date,
            override_rate: None,
            override_validity_months: None,
            interest_already_taken: false,
            manual_reduction: Money::ZERO,
        }
    }

    pub fn builder() -> CalculationRequestBuilder {
        CalculationRequestBuilder::new()
    }

    pub fn validate(&self) -> Result<()> {
        if !self.principal.is_positive() {
            return Err(CalculationError::InvalidAmount {
                amount: self.principal.to_string(),
            });
        }
        if self.end_date < self.start_date {
            return Err(CalculationError::InvalidRange {
                start: self.start_date,
                end: self.end_date,
            });
        }
        if let Some(rate) = self.override_rate {
            if rate.is_negative() {
                return Err(CalculationError::InvalidRate { rate });
            }
        }
        if self.manual_reduction.is_negative() {
            return Err(CalculationError::InvalidReduction {
                amount: self.manual_reduction,
            });
        }
        Ok(())
    }
}

/// builder for calculation requests
#[derive(Debug, Clone, Default)]
pub struct CalculationRequestBuilder {
    principal: Option<Money>,
    start_date: Option<NaiveDate>,
    end_date: Option<NaiveDate>,
    override_rate: Option<Rate>,
    override_validity_months: Option<u32>,
    interest_already_taken: bool,
    manual_reduction: Option<Money>,
}

impl CalculationRequestBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn principal(mut self, principal: Money) -> Self {
        self.principal = Some(principal);
        self
    }

    pub fn start_date(mut self, date: NaiveDate) -> Self {
        self.start_date = Some(date);
        self
    }

    pub fn end_date(mut self, date: NaiveDate) -> Self {
        self.end_date = Some(date);
        self
    }

    pub fn override_rate(mut self, rate: Rate) -> Self {
        self.override_rate = Some(rate);
        self
    }

    pub fn override_validity_months(mut self, months: u32) -> Self {
        self.override_validity_months = Some(months);
        self
    }

    pub fn interest_already_taken(mut self, taken: bool) -> Self {
        self.interest_already_taken = taken;
        self
    }

    pub fn manual_reduction(mut self, amount: Money) -> Self {
        self.manual_reduction = Some(amount);
        self
    }

    /// build with an explicit end date
    pub fn build(self) -> Result<CalculationRequest> {
        let end_date = self.end_date.ok_or(CalculationError::InvalidConfiguration {
            message: "End date required".to_string(),
        })?;
        self.finish(end_date)
    }

    /// build, closing today per `time_provider` when no end date was set
    pub fn build_with_time(self, time_provider: &SafeTimeProvider) -> Result<CalculationRequest> {
        let end_date = self
            .end_date
            .unwrap_or_else(|| time_provider.now().date_naive());
        self.finish(end_date)
    }

    fn finish(self, end_date: NaiveDate) -> Result<CalculationRequest> {
        let principal = self.principal.ok_or(CalculationError::InvalidConfiguration {
            message: "Principal required".to_string(),
        })?;

        let start_date = self.start_date.ok_or(CalculationError::InvalidConfiguration {
            message: "Start date required".to_string(),
        })?;

        let request = CalculationRequest {
            principal,
            start_date,
            end_date,
            override_rate: self.override_rate,
            override_validity_months: self.override_validity_months,
            interest_already_taken: self.interest_already_taken,
            manual_reduction: self.manual_reduction.unwrap_or(Money::ZERO),
        };
        request.validate()?;
        Ok(request)
    }
}

/// the payoff pipeline: duration, rates, interest, composition
///
/// Stateless apart from its settings; share one engine across threads freely.
#[derive(Debug, Clone)]
pub struct InterestEngine {
    settings: EngineSettings,
    resolver: DurationResolver,
    selector: RateSelector,
    composer: PayoffComposer,
}

impl Default for InterestEngine {
    fn default() -> Self {
        Self::build(EngineSettings::default())
    }
}

impl InterestEngine {
    pub fn new(settings: EngineSettings) -> Result<Self> {
        settings.validate()?;
        Ok(Self::build(settings))
    }

    fn build(settings: EngineSettings) -> Self {
        Self {
            resolver: DurationResolver::new(),
            selector: RateSelector::new(&settings),
            composer: PayoffComposer::new(settings.currency_precision),
            settings,
        }
    }

    pub fn settings(&self) -> &EngineSettings {
        &self.settings
    }

    /// compute the payoff breakdown of `request` under `scheme`
    pub fn calculate(
        &self,
        scheme: &SchemeConfig,
        request: &CalculationRequest,
    ) -> Result<CalculationResult> {
        request.validate()?;

        let elapsed = self.resolver.resolve(request.start_date, request.end_date)?;
        let sub_periods = self.selector.select(
            scheme,
            &elapsed,
            request.override_validity_months,
            request.override_rate,
        )?;

        let accumulator = InterestAccumulator::new(scheme.rate_period);
        let total_interest = accumulator.accumulate(request.principal, &sub_periods)?;

        let result = self.composer.compose(PayoffInput {
            principal: request.principal,
            total_interest,
            sub_periods: &sub_periods,
            booked_rate: request.override_rate.unwrap_or(scheme.base_rate),
            elapsed,
            interest_already_taken: request.interest_already_taken,
            manual_reduction: request.manual_reduction,
        })?;

        tracing::debug!(
            scheme = %scheme.slug,
            kind = scheme.calculation.name(),
            months = elapsed.months,
            days = elapsed.remainder_days,
            sub_periods = sub_periods.len(),
            payable = %result.total_payable,
            "payoff calculated"
        );

        Ok(result)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::DayThreshold;
    use crate::types::RatePeriod;
    use chrono::{TimeZone, Utc};
    use hourglass_rs::TimeSource;
    use rust_decimal_macros::dec;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn pct(p: u32) -> Rate {
        Rate::from_whole_percentage(p)
    }

    #[test]
    fn test_tiered_boundary() {
        let engine = InterestEngine::default();
        let scheme = SchemeConfig::tiered("gold-6m", "Gold 6 months", pct(2), 6, pct(3));

        let six = CalculationRequest::new(Money::from_major(10_000), date(2024, 1, 10), date(2024, 7, 10));
        let result = engine.calculate(&scheme, &six).unwrap();
        assert_eq!(result.elapsed_months, 6);
        assert_eq!(result.total_interest, Money::from_major(1_200));
        assert_eq!(result.effective_rate, pct(2));

        let seven = CalculationRequest::new(Money::from_major(10_000), date(2024, 1, 10), date(2024, 8, 10));
        let result = engine.calculate(&scheme, &seven).unwrap();
        assert_eq!(result.elapsed_months, 7);
        assert_eq!(result.total_interest, Money::from_major(1_500));
        assert_eq!(result.effective_rate, pct(3));
        assert_eq!(result.total_payable, Money::from_major(11_500));
    }

    #[test]
    fn test_day_threshold_scheme() {
        let engine = InterestEngine::default();
        let scheme = SchemeConfig::day_basis_tiered(
            "scheme-2",
            "Scheme 2",
            pct(2),
            vec![DayThreshold { days: 7, fraction: dec!(0.5) }],
            pct(3),
            Some(6),
        );

        let request = CalculationRequest::new(Money::from_major(10_000), date(2024, 3, 1), date(2024, 3, 6));
        let result = engine.calculate(&scheme, &request).unwrap();
        assert_eq!(result.elapsed_days, 5);
        assert_eq!(result.total_interest, Money::from_major(100));
        assert_eq!(result.total_payable, Money::from_major(10_100));
    }

    #[test]
    fn test_builder_and_reductions() {
        let engine = InterestEngine::default();
        let scheme = SchemeConfig::flat("flat", "Flat", pct(2), RatePeriod::Monthly);

        let request = CalculationRequest::builder()
            .principal(Money::from_major(10_000))
            .start_date(date(2024, 1, 1))
            .end_date(date(2024, 3, 15))
            .interest_already_taken(true)
            .manual_reduction(Money::from_major(50))
            .build()
            .unwrap();

        // 2 months at 2% = 400, less 200 taken, less 50
        let result = engine.calculate(&scheme, &request).unwrap();
        assert_eq!(result.total_interest, Money::from_major(400));
        assert_eq!(result.interest_reduction, Money::from_major(200));
        assert_eq!(result.total_payable, Money::from_major(10_150));
    }

    #[test]
    fn test_builder_requires_fields() {
        let err = CalculationRequest::builder()
            .start_date(date(2024, 1, 1))
            .end_date(date(2024, 2, 1))
            .build()
            .unwrap_err();
        assert!(matches!(err, CalculationError::InvalidConfiguration { .. }));

        let err = CalculationRequest::builder()
            .principal(Money::from_major(1_000))
            .start_date(date(2024, 1, 1))
            .build()
            .unwrap_err();
        assert!(matches!(err, CalculationError::InvalidConfiguration { .. }));
    }

    #[test]
    fn test_build_with_time_defaults_end_date() {
        let time = SafeTimeProvider::new(TimeSource::Test(
            Utc.with_ymd_and_hms(2024, 4, 1, 9, 30, 0).unwrap(),
        ));
        let request = CalculationRequest::builder()
            .principal(Money::from_major(1_000))
            .start_date(date(2024, 1, 1))
            .build_with_time(&time)
            .unwrap();
        assert_eq!(request.end_date, date(2024, 4, 1));
    }

    #[test]
    fn test_invalid_inputs_rejected() {
        let engine = InterestEngine::default();
        let scheme = SchemeConfig::flat("flat", "Flat", pct(2), RatePeriod::Monthly);

        let inverted = CalculationRequest::new(Money::from_major(1_000), date(2024, 5, 1), date(2024, 4, 1));
        assert!(matches!(
            engine.calculate(&scheme, &inverted),
            Err(CalculationError::InvalidRange { .. })
        ));

        let zero = CalculationRequest::new(Money::ZERO, date(2024, 1, 1), date(2024, 4, 1));
        assert!(matches!(
            engine.calculate(&scheme, &zero),
            Err(CalculationError::InvalidAmount { .. })
        ));

        let mut negative = CalculationRequest::new(Money::from_major(1_000), date(2024, 1, 1), date(2024, 4, 1));
        negative.manual_reduction = Money::from_major(-10);
        assert!(matches!(
            engine.calculate(&scheme, &negative),
            Err(CalculationError::InvalidReduction { .. })
        ));
    }

    #[test]
    fn test_negative_override_rate_rejected() {
        let err = CalculationRequest::builder()
            .principal(Money::from_major(1_000))
            .start_date(date(2024, 1, 1))
            .end_date(date(2024, 2, 1))
            .override_rate(Rate::from_percentage(dec!(-1)))
            .build()
            .unwrap_err();
        assert_eq!(err, CalculationError::InvalidRate { rate: Rate::from_percentage(dec!(-1)) });
        assert_eq!(err.to_string(), "invalid rate: -1%");
    }

    #[test]
    fn test_principal_past_decimal_range_rejected() {
        let engine = InterestEngine::default();
        let scheme = SchemeConfig::tiered("gold-6m", "Gold 6 months", pct(2), 6, pct(3));
        let request = CalculationRequest::new(
            Money::from_decimal(rust_decimal::Decimal::MAX),
            date(2024, 1, 10),
            date(2024, 8, 10),
        );
        assert!(matches!(
            engine.calculate(&scheme, &request),
            Err(CalculationError::InvalidAmount { .. })
        ));
    }

    #[test]
    fn test_engine_settings_validated() {
        let settings = EngineSettings {
            days_per_month: 0,
            ..EngineSettings::default()
        };
        assert!(InterestEngine::new(settings).is_err());

        let engine = InterestEngine::new(EngineSettings {
            currency_precision: 2,
            ..EngineSettings::default()
        })
        .unwrap();
        assert_eq!(engine.settings().currency_precision, 2);
    }
}

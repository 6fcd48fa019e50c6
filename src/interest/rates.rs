use rust_decimal::Decimal;

use crate::config::{validate_thresholds, CalculationKind, DayBasisConfig, EngineSettings, SchemeConfig};
use crate::decimal::Rate;
use crate::errors::Result;
use crate::interest::{ElapsedDuration, RateTier, SubPeriod, SubPeriods};

/// resolves the rate for each chargeable sub-period of a scheme
#[derive(Debug, Clone)]
pub struct RateSelector {
    pub days_per_month: u32,
    pub compound_validity_months: u32,
}

impl Default for RateSelector {
    fn default() -> Self {
        Self::new(&EngineSettings::default())
    }
}

impl RateSelector {
    pub fn new(settings: &EngineSettings) -> Self {
        Self {
            days_per_month: settings.days_per_month.max(1),
            compound_validity_months: settings.compound_validity_months,
        }
    }

    /// validity in months: call override, then the scheme's own, else unlimited
    pub fn resolve_validity(scheme: &SchemeConfig, override_validity: Option<u32>) -> Option<u32> {
        override_validity.or_else(|| scheme.configured_validity())
    }

    /// split the elapsed duration into rated sub-periods under `scheme`
    pub fn select(
        &self,
        scheme: &SchemeConfig,
        elapsed: &ElapsedDuration,
        override_validity: Option<u32>,
        override_rate: Option<Rate>,
    ) -> Result<SubPeriods> {
        scheme.validate()?;

        let base = override_rate.unwrap_or(scheme.base_rate);
        let validity = Self::resolve_validity(scheme, override_validity);

        let periods = match &scheme.calculation {
            CalculationKind::Flat => {
                let mut months = elapsed.months;
                // any part of a month is charged as a whole one
                if months == 0 && !elapsed.is_zero() {
                    months = 1;
                }
                vec![SubPeriod::new(base, Decimal::from(months), RateTier::Base)]
            }
            CalculationKind::Tiered(config) => split_at_validity(
                base,
                config.surcharge_rate,
                Decimal::from(elapsed.months),
                validity,
            ),
            CalculationKind::DayBasisTiered(config) => self.select_day_basis(config, base, elapsed, validity)?,
            CalculationKind::DayBasisCompound(config) => {
                let floor_months = ceil_div(config.min_days, self.days_per_month);
                let chargeable = elapsed
                    .prorated_months(self.days_per_month)
                    .max(Decimal::from(floor_months));
                let year_boundary = validity.unwrap_or(self.compound_validity_months);
                split_at_validity(base, config.surcharge_rate, chargeable, Some(year_boundary))
            }
        };

        Ok(SubPeriods::new(periods))
    }

    fn select_day_basis(
        &self,
        config: &DayBasisConfig,
        base: Rate,
        elapsed: &ElapsedDuration,
        validity: Option<u32>,
    ) -> Result<Vec<SubPeriod>> {
        validate_thresholds(&config.thresholds)?;

        if elapsed.months == 0 {
            // thresholds are ascending, so the first match is the smallest bound met
            let matched = config
                .thresholds
                .iter()
                .find(|t| elapsed.remainder_days <= t.days);
            if let Some(threshold) = matched {
                return Ok(vec![SubPeriod::new(base, threshold.fraction, RateTier::DayFraction)]);
            }
        }

        let mut months = elapsed.months;
        if elapsed.remainder_days > 0 {
            months += 1;
        }
        Ok(split_at_validity(
            base,
            config.surcharge_rate,
            Decimal::from(months),
            validity,
        ))
    }
}

/// base rate through `validity` months, surcharge for the rest
fn split_at_validity(
    base: Rate,
    surcharge: Rate,
    chargeable: Decimal,
    validity: Option<u32>,
) -> Vec<SubPeriod> {
    match validity.map(Decimal::from) {
        Some(limit) if chargeable > limit => vec![
            SubPeriod::new(base, limit, RateTier::Base),
            SubPeriod::new(surcharge, chargeable - limit, RateTier::Surcharge),
        ],
        _ => vec![SubPeriod::new(base, chargeable, RateTier::Base)],
    }
}

fn ceil_div(value: u32, divisor: u32) -> u32 {
    let divisor = divisor.max(1);
    (value + divisor - 1) / divisor
}

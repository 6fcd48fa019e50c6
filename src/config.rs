use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use uuid::Uuid;

use crate::decimal::Rate;
use crate::errors::{CalculationError, Result};
use crate::types::{RatePeriod, SchemeId, SchemeStatus};

/// named interest calculation strategy assignable to a loan
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SchemeConfig {
    pub id: SchemeId,
    /// unique, stable external key
    pub slug: String,
    pub name: String,
    pub status: SchemeStatus,
    pub base_rate: Rate,
    pub rate_period: RatePeriod,
    pub calculation: CalculationKind,
    /// validity used when neither the call nor the kind payload names one
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub default_validity_months: Option<u32>,
}

/// calculation kind with its kind-specific payload
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "calculation_kind", content = "config", rename_all = "snake_case")]
pub enum CalculationKind {
    /// one rate for the whole elapsed duration
    Flat,
    /// base rate through validity, surcharge rate afterwards
    Tiered(TieredConfig),
    /// fractional month for short durations, tiered otherwise
    DayBasisTiered(DayBasisConfig),
    /// annual rate with a minimum charged period and yearly surcharge
    DayBasisCompound(CompoundConfig),
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TieredConfig {
    pub validity_months: u32,
    pub surcharge_rate: Rate,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DayBasisConfig {
    /// ascending by `days`
    pub thresholds: Vec<DayThreshold>,
    pub surcharge_rate: Rate,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub validity_months: Option<u32>,
}

/// elapsed days up to `days` are charged `fraction` of one month
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct DayThreshold {
    pub days: u32,
    pub fraction: Decimal,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CompoundConfig {
    pub min_days: u32,
    pub surcharge_rate: Rate,
}

impl CalculationKind {
    /// wire name of the kind, as stored in `loan_schemes.calculation_kind`
    pub fn name(&self) -> &'static str {
        match self {
            CalculationKind::Flat => "flat",
            CalculationKind::Tiered(_) => "tiered",
            CalculationKind::DayBasisTiered(_) => "day_basis_tiered",
            CalculationKind::DayBasisCompound(_) => "day_basis_compound",
        }
    }

    /// surcharge rate applied past validity, if the kind has one
    pub fn surcharge_rate(&self) -> Option<Rate> {
        match self {
            CalculationKind::Flat => None,
            CalculationKind::Tiered(c) => Some(c.surcharge_rate),
            CalculationKind::DayBasisTiered(c) => Some(c.surcharge_rate),
            CalculationKind::DayBasisCompound(c) => Some(c.surcharge_rate),
        }
    }

    /// parse the loosely typed config blob stored for `kind`
    pub fn from_parts(kind: &str, config: Value) -> Result<Self> {
        match kind {
            "flat" => Ok(CalculationKind::Flat),
            "tiered" => Ok(CalculationKind::Tiered(parse_payload(kind, config)?)),
            "day_basis_tiered" => {
                check_raw_thresholds(&config)?;
                Ok(CalculationKind::DayBasisTiered(parse_payload(kind, config)?))
            }
            "day_basis_compound" => {
                Ok(CalculationKind::DayBasisCompound(parse_payload(kind, config)?))
            }
            other => Err(CalculationError::UnknownCalculationKind {
                kind: other.to_string(),
            }),
        }
    }
}

fn parse_payload<T: serde::de::DeserializeOwned>(kind: &str, config: Value) -> Result<T> {
    serde_json::from_value(config).map_err(|e| CalculationError::InvalidConfiguration {
        message: format!("{} config: {}", kind, e),
    })
}

/// reject negative threshold values before they reach unsigned fields
fn check_raw_thresholds(config: &Value) -> Result<()> {
    let thresholds = match config.get("thresholds").and_then(Value::as_array) {
        Some(t) => t,
        None => return Ok(()),
    };

    for threshold in thresholds {
        let days_negative = threshold
            .get("days")
            .and_then(Value::as_i64)
            .map_or(false, |d| d < 0);
        if days_negative {
            return Err(CalculationError::InvalidThresholds {
                message: format!("negative days in threshold {}", threshold),
            });
        }
    }
    Ok(())
}

impl SchemeConfig {
    /// create a flat scheme
    pub fn flat(slug: &str, name: &str, base_rate: Rate, rate_period: RatePeriod) -> Self {
        Self::with_kind(slug, name, base_rate, rate_period, CalculationKind::Flat)
    }

    /// create a monthly tiered scheme
    pub fn tiered(
        slug: &str,
        name: &str,
        base_rate: Rate,
        validity_months: u32,
        surcharge_rate: Rate,
    ) -> Self {
        Self::with_kind(
            slug,
            name,
            base_rate,
            RatePeriod::Monthly,
            CalculationKind::Tiered(TieredConfig {
                validity_months,
                surcharge_rate,
            }),
        )
    }

    /// create a monthly day-proration tiered scheme
    pub fn day_basis_tiered(
        slug: &str,
        name: &str,
        base_rate: Rate,
        thresholds: Vec<DayThreshold>,
        surcharge_rate: Rate,
        validity_months: Option<u32>,
    ) -> Self {
        Self::with_kind(
            slug,
            name,
            base_rate,
            RatePeriod::Monthly,
            CalculationKind::DayBasisTiered(DayBasisConfig {
                thresholds,
                surcharge_rate,
                validity_months,
            }),
        )
    }

    /// create an annual-rate compound scheme
    pub fn day_basis_compound(
        slug: &str,
        name: &str,
        annual_rate: Rate,
        min_days: u32,
        surcharge_rate: Rate,
    ) -> Self {
        Self::with_kind(
            slug,
            name,
            annual_rate,
            RatePeriod::Yearly,
            CalculationKind::DayBasisCompound(CompoundConfig {
                min_days,
                surcharge_rate,
            }),
        )
    }

    fn with_kind(
        slug: &str,
        name: &str,
        base_rate: Rate,
        rate_period: RatePeriod,
        calculation: CalculationKind,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            slug: slug.to_string(),
            name: name.to_string(),
            status: SchemeStatus::Active,
            base_rate,
            rate_period,
            calculation,
            default_validity_months: None,
        }
    }

    pub fn with_status(mut self, status: SchemeStatus) -> Self {
        self.status = status;
        self
    }

    pub fn with_default_validity(mut self, months: u32) -> Self {
        self.default_validity_months = Some(months);
        self
    }

    pub fn is_active(&self) -> bool {
        self.status == SchemeStatus::Active
    }

    /// validity declared by the scheme: kind payload first, then the scheme default
    pub fn configured_validity(&self) -> Option<u32> {
        let from_kind = match &self.calculation {
            CalculationKind::Tiered(c) => Some(c.validity_months),
            CalculationKind::DayBasisTiered(c) => c.validity_months,
            CalculationKind::Flat | CalculationKind::DayBasisCompound(_) => None,
        };
        from_kind.or(self.default_validity_months)
    }

    /// check the config is structurally valid for its calculation kind
    pub fn validate(&self) -> Result<()> {
        if self.slug.trim().is_empty() {
            return Err(CalculationError::InvalidConfiguration {
                message: "scheme slug must not be empty".to_string(),
            });
        }

        if self.base_rate.is_negative() {
            return Err(CalculationError::InvalidConfiguration {
                message: format!("negative base rate {} on scheme {}", self.base_rate, self.slug),
            });
        }

        if let Some(surcharge) = self.calculation.surcharge_rate() {
            if surcharge.is_negative() {
                return Err(CalculationError::InvalidConfiguration {
                    message: format!("negative surcharge rate {} on scheme {}", surcharge, self.slug),
                });
            }
        }

        match &self.calculation {
            CalculationKind::DayBasisTiered(c) => validate_thresholds(&c.thresholds),
            CalculationKind::DayBasisCompound(_) if self.rate_period != RatePeriod::Yearly => {
                Err(CalculationError::InvalidConfiguration {
                    message: format!("compound scheme {} must quote a yearly rate", self.slug),
                })
            }
            _ => Ok(()),
        }
    }

    /// parse a stored scheme row from json
    pub fn from_record_json(json: &str) -> Result<Self> {
        let record: SchemeRecord = serde_json::from_str(json)?;
        Self::try_from(record)
    }

    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string(self)?)
    }
}

/// thresholds must be ascending and non-overlapping, with fractions in `0..=1` never decreasing
pub fn validate_thresholds(thresholds: &[DayThreshold]) -> Result<()> {
    for threshold in thresholds {
        if threshold.fraction < Decimal::ZERO {
            return Err(CalculationError::InvalidThresholds {
                message: format!("negative fraction {} at {} days", threshold.fraction, threshold.days),
            });
        }
        // past the last threshold a whole month is charged
        if threshold.fraction > Decimal::ONE {
            return Err(CalculationError::InvalidThresholds {
                message: format!(
                    "fraction {} at {} days is more than a month",
                    threshold.fraction, threshold.days
                ),
            });
        }
    }

    for pair in thresholds.windows(2) {
        if pair[1].days <= pair[0].days {
            return Err(CalculationError::InvalidThresholds {
                message: format!(
                    "thresholds not ascending: {} days follows {} days",
                    pair[1].days, pair[0].days
                ),
            });
        }
        if pair[1].fraction < pair[0].fraction {
            return Err(CalculationError::InvalidThresholds {
                message: format!(
                    "fraction {} at {} days is below {} at {} days",
                    pair[1].fraction, pair[1].days, pair[0].fraction, pair[0].days
                ),
            });
        }
    }
    Ok(())
}

/// scheme row as persisted in `loan_schemes`, config still loosely typed
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SchemeRecord {
    #[serde(default)]
    pub id: Option<SchemeId>,
    pub slug: String,
    pub name: String,
    #[serde(default = "default_status")]
    pub status: SchemeStatus,
    pub base_rate: Rate,
    pub rate_period: RatePeriod,
    pub calculation_kind: String,
    #[serde(default)]
    pub config: Value,
    #[serde(default)]
    pub default_validity_months: Option<u32>,
}

fn default_status() -> SchemeStatus {
    SchemeStatus::Active
}

impl TryFrom<SchemeRecord> for SchemeConfig {
    type Error = CalculationError;

    fn try_from(record: SchemeRecord) -> Result<Self> {
        let calculation = CalculationKind::from_parts(&record.calculation_kind, record.config)?;
        let scheme = SchemeConfig {
            id: record.id.unwrap_or_else(Uuid::new_v4),
            slug: record.slug,
            name: record.name,
            status: record.status,
            base_rate: record.base_rate,
            rate_period: record.rate_period,
            calculation,
            default_validity_months: record.default_validity_months,
        };
        scheme.validate()?;
        Ok(scheme)
    }
}

/// engine-wide settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineSettings {
    /// decimal places of the currency's minor unit; 0 rounds to whole units
    pub currency_precision: u32,
    /// days counted as one month for day proration and minimum-day floors
    pub days_per_month: u32,
    /// months after which compound schemes switch to the surcharge rate
    pub compound_validity_months: u32,
}

impl Default for EngineSettings {
    fn default() -> Self {
        Self {
            currency_precision: 0,
            days_per_month: 30,
            compound_validity_months: 12,
        }
    }
}

impl EngineSettings {
    pub fn from_json(json: &str) -> Result<Self> {
        let settings: EngineSettings = serde_json::from_str(json)?;
        settings.validate()?;
        Ok(settings)
    }

    pub fn validate(&self) -> Result<()> {
        if self.days_per_month == 0 || self.compound_validity_months == 0 {
            return Err(CalculationError::InvalidConfiguration {
                message: "days_per_month and compound_validity_months must be positive".to_string(),
            });
        }
        if self.currency_precision > 8 {
            return Err(CalculationError::InvalidConfiguration {
                message: format!("currency precision {} is above 8", self.currency_precision),
            });
        }
        Ok(())
    }
}

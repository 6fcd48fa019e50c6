use std::str::FromStr;
use std::sync::Arc;

use chrono::NaiveDate;
use hourglass_rs::SafeTimeProvider;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::decimal::{Money, Rate};
use crate::engine::{CalculationRequest, InterestEngine};
use crate::errors::{CalculationError, Result};
use crate::payoff::CalculationResult;
use crate::registry::SchemeRegistry;
use crate::types::{InterestStatus, SchemeId, SchemeRef};

/// body of an online estimate request
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EstimateRequest {
    /// number or numeric string
    pub amount: Value,
    pub start_date: NaiveDate,
    /// today when omitted
    #[serde(default)]
    pub end_date: Option<NaiveDate>,
    #[serde(default)]
    pub scheme_slug: Option<String>,
    #[serde(default)]
    pub scheme_id: Option<SchemeId>,
    #[serde(default)]
    pub override_rate: Option<Rate>,
    #[serde(default)]
    pub validity_months: Option<u32>,
    #[serde(default)]
    pub reduction_amount: Option<Money>,
    #[serde(default)]
    pub interest_status: Option<InterestStatus>,
}

impl EstimateRequest {
    /// principal from the loosely typed `amount` field
    pub fn principal(&self) -> Result<Money> {
        let invalid = || CalculationError::InvalidAmount {
            amount: self.amount.to_string(),
        };
        let parsed = match &self.amount {
            Value::String(s) => Money::from_str(s).map_err(|_| invalid())?,
            Value::Number(n) => parse_number(&n.to_string())?,
            _ => return Err(invalid()),
        };
        if !parsed.is_positive() {
            return Err(invalid());
        }
        Ok(parsed)
    }

    /// scheme reference, slug preferred over id
    pub fn scheme_ref(&self) -> Result<SchemeRef> {
        scheme_ref(self.scheme_slug.as_deref(), self.scheme_id)
    }

    pub fn to_calculation(&self, time_provider: &SafeTimeProvider) -> Result<CalculationRequest> {
        let mut builder = CalculationRequest::builder()
            .principal(self.principal()?)
            .start_date(self.start_date)
            .interest_already_taken(self.interest_status.unwrap_or_default().is_taken())
            .manual_reduction(self.reduction_amount.unwrap_or(Money::ZERO));

        if let Some(end) = self.end_date {
            builder = builder.end_date(end);
        }
        if let Some(rate) = self.override_rate {
            builder = builder.override_rate(rate);
        }
        if let Some(months) = self.validity_months {
            builder = builder.override_validity_months(months);
        }
        builder.build_with_time(time_provider)
    }
}

/// json numbers past u64 print in exponent form
fn parse_number(text: &str) -> Result<Money> {
    Decimal::from_str(text)
        .or_else(|_| Decimal::from_scientific(text))
        .map(Money::from_decimal)
        .map_err(|_| CalculationError::InvalidAmount {
            amount: format!("{} is out of range", text),
        })
}

/// resolve the scheme reference of a request body
pub fn scheme_ref(slug: Option<&str>, id: Option<SchemeId>) -> Result<SchemeRef> {
    match (slug.map(str::trim).filter(|s| !s.is_empty()), id) {
        (Some(slug), _) => Ok(SchemeRef::Slug(slug.to_string())),
        (None, Some(id)) => Ok(SchemeRef::Id(id)),
        (None, None) => Err(CalculationError::UnknownScheme {
            reference: "no scheme given".to_string(),
        }),
    }
}

/// estimate response, field names as the ui expects them
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EstimateResponse {
    pub total_months: u32,
    pub final_interest_rate: Rate,
    pub total_interest: Money,
    pub interest_reduction: Money,
    pub additional_reduction: Money,
    pub total_amount: Money,
}

impl From<&CalculationResult> for EstimateResponse {
    fn from(result: &CalculationResult) -> Self {
        Self {
            total_months: result.elapsed_months,
            final_interest_rate: result.effective_rate,
            total_interest: result.total_interest,
            interest_reduction: result.interest_reduction,
            additional_reduction: result.manual_reduction_applied,
            total_amount: result.total_payable,
        }
    }
}

/// human-readable error answered with a 400-class status
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ErrorBody {
    pub status: u16,
    pub message: String,
}

impl From<&CalculationError> for ErrorBody {
    fn from(e: &CalculationError) -> Self {
        Self {
            status: e.http_status(),
            message: e.to_string(),
        }
    }
}

/// online estimate call site
#[derive(Debug, Clone)]
pub struct EstimateService {
    engine: Arc<InterestEngine>,
    registry: Arc<SchemeRegistry>,
}

impl EstimateService {
    pub fn new(engine: Arc<InterestEngine>, registry: Arc<SchemeRegistry>) -> Self {
        Self { engine, registry }
    }

    pub fn estimate(
        &self,
        request: &EstimateRequest,
        time_provider: &SafeTimeProvider,
    ) -> Result<EstimateResponse> {
        let scheme = self.registry.resolve(&request.scheme_ref()?)?;
        let calculation = request.to_calculation(time_provider)?;
        let result = self.engine.calculate(&scheme, &calculation)?;
        Ok(EstimateResponse::from(&result))
    }

    /// handle a raw json body, returning the status code and json reply
    pub fn handle_json(&self, body: &str, time_provider: &SafeTimeProvider) -> (u16, String) {
        let outcome = serde_json::from_str::<EstimateRequest>(body)
            .map_err(CalculationError::from)
            .and_then(|request| self.estimate(&request, time_provider));

        let reply = match &outcome {
            Ok(response) => serde_json::to_string(response).map(|json| (200, json)),
            Err(e) => {
                tracing::debug!(error = %e, "estimate rejected");
                serde_json::to_string(&ErrorBody::from(e)).map(|json| (e.http_status(), json))
            }
        };

        reply.unwrap_or_else(|e| {
            let body = ErrorBody {
                status: 500,
                message: e.to_string(),
            };
            (500, serde_json::to_string(&body).unwrap_or_default())
        })
    }
}

use std::sync::Arc;

use chrono::{DateTime, NaiveDate, Utc};
use hourglass_rs::SafeTimeProvider;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::decimal::{Money, Rate};
use crate::engine::{CalculationRequest, InterestEngine};
use crate::errors::Result;
use crate::payoff::CalculationResult;
use crate::registry::SchemeRegistry;
use crate::types::{ClosureKind, InterestStatus, SchemeId, SchemeRef};

/// request to close a loan or a repledge
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ClosureRequest {
    /// loan or repledge id
    pub reference: Uuid,
    pub kind: ClosureKind,
    pub scheme: SchemeRef,
    pub principal: Money,
    pub start_date: NaiveDate,
    /// today when omitted
    #[serde(default)]
    pub closing_date: Option<NaiveDate>,
    #[serde(default)]
    pub override_rate: Option<Rate>,
    #[serde(default)]
    pub override_validity_months: Option<u32>,
    #[serde(default)]
    pub interest_status: InterestStatus,
    #[serde(default)]
    pub manual_reduction: Money,
}

impl ClosureRequest {
    pub fn new(
        reference: Uuid,
        kind: ClosureKind,
        scheme: SchemeRef,
        principal: Money,
        start_date: NaiveDate,
    ) -> Self {
        Self {
            reference,
            kind,
            scheme,
            principal,
            start_date,
            closing_date: None,
            override_rate: None,
            override_validity_months: None,
            interest_status: InterestStatus::NotTaken,
            manual_reduction: Money::ZERO,
        }
    }

    pub fn closing_on(mut self, date: NaiveDate) -> Self {
        self.closing_date = Some(date);
        self
    }

    pub fn with_interest_status(mut self, status: InterestStatus) -> Self {
        self.interest_status = status;
        self
    }

    pub fn with_reduction(mut self, amount: Money) -> Self {
        self.manual_reduction = amount;
        self
    }

    fn to_calculation(&self, time_provider: &SafeTimeProvider) -> Result<CalculationRequest> {
        let mut builder = CalculationRequest::builder()
            .principal(self.principal)
            .start_date(self.start_date)
            .interest_already_taken(self.interest_status.is_taken())
            .manual_reduction(self.manual_reduction);

        if let Some(date) = self.closing_date {
            builder = builder.end_date(date);
        }
        if let Some(rate) = self.override_rate {
            builder = builder.override_rate(rate);
        }
        if let Some(months) = self.override_validity_months {
            builder = builder.override_validity_months(months);
        }
        builder.build_with_time(time_provider)
    }
}

/// settled payoff handed to the ledger for posting and stored for audit
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PayoffStatement {
    pub reference: Uuid,
    pub kind: ClosureKind,
    pub scheme_id: SchemeId,
    pub scheme_slug: String,
    pub principal: Money,
    pub start_date: NaiveDate,
    pub closing_date: NaiveDate,
    pub quoted_at: DateTime<Utc>,
    pub result: CalculationResult,
}

impl PayoffStatement {
    /// amount the customer (or the bank, for repledges) settles
    pub fn amount_due(&self) -> Money {
        self.result.total_payable
    }

    /// part of the settlement booked as interest income
    pub fn interest_income(&self) -> Money {
        self.result.interest_income(self.principal)
    }

    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }
}

/// loan and repledge closing call site
#[derive(Debug, Clone)]
pub struct ClosureService {
    engine: Arc<InterestEngine>,
    registry: Arc<SchemeRegistry>,
}

impl ClosureService {
    pub fn new(engine: Arc<InterestEngine>, registry: Arc<SchemeRegistry>) -> Self {
        Self { engine, registry }
    }

    pub fn close(
        &self,
        request: &ClosureRequest,
        time_provider: &SafeTimeProvider,
    ) -> Result<PayoffStatement> {
        let scheme = self.registry.resolve(&request.scheme)?;
        let calculation = request.to_calculation(time_provider)?;
        let result = self.engine.calculate(&scheme, &calculation)?;

        tracing::info!(
            reference = %request.reference,
            kind = ?request.kind,
            scheme = %scheme.slug,
            payable = %result.total_payable,
            "payoff settled"
        );

        Ok(PayoffStatement {
            reference: request.reference,
            kind: request.kind,
            scheme_id: scheme.id,
            scheme_slug: scheme.slug.clone(),
            principal: calculation.principal,
            start_date: calculation.start_date,
            closing_date: calculation.end_date,
            quoted_at: time_provider.now(),
            result,
        })
    }
}

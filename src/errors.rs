use chrono::NaiveDate;
use thiserror::Error;

use crate::decimal::{Money, Rate};

#[derive(Error, Debug, Clone, PartialEq)]
pub enum CalculationError {
    #[error("invalid date range: end {end} is before start {start}")]
    InvalidRange {
        start: NaiveDate,
        end: NaiveDate,
    },

    #[error("invalid amount: {amount}")]
    InvalidAmount {
        amount: String,
    },

    #[error("invalid rate: {rate}")]
    InvalidRate {
        rate: Rate,
    },

    #[error("invalid reduction amount: {amount}")]
    InvalidReduction {
        amount: Money,
    },

    #[error("unknown scheme: {reference}")]
    UnknownScheme {
        reference: String,
    },

    #[error("unknown calculation kind: {kind}")]
    UnknownCalculationKind {
        kind: String,
    },

    #[error("invalid thresholds: {message}")]
    InvalidThresholds {
        message: String,
    },

    #[error("invalid configuration: {message}")]
    InvalidConfiguration {
        message: String,
    },

    #[error("serialization error: {message}")]
    Serialization {
        message: String,
    },
}

impl CalculationError {
    /// principal whose interest or payable leaves the decimal range
    pub fn out_of_range(principal: Money) -> Self {
        CalculationError::InvalidAmount {
            amount: format!("{} is out of range", principal),
        }
    }

    /// http status the estimate and closure endpoints answer with
    pub fn http_status(&self) -> u16 {
        // every variant is a caller-visible validation failure
        400
    }

    /// true for the variants raised by malformed scheme configuration
    pub fn is_configuration_error(&self) -> bool {
        matches!(
            self,
            CalculationError::UnknownCalculationKind { .. }
                | CalculationError::InvalidThresholds { .. }
                | CalculationError::InvalidConfiguration { .. }
        )
    }
}

impl From<serde_json::Error> for CalculationError {
    fn from(e: serde_json::Error) -> Self {
        CalculationError::Serialization {
            message: e.to_string(),
        }
    }
}

pub type Result<T> = std::result::Result<T, CalculationError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_messages() {
        let err = CalculationError::InvalidRange {
            start: NaiveDate::from_ymd_opt(2024, 3, 1).unwrap(),
            end: NaiveDate::from_ymd_opt(2024, 2, 1).unwrap(),
        };
        assert_eq!(
            err.to_string(),
            "invalid date range: end 2024-02-01 is before start 2024-03-01"
        );
        assert_eq!(err.http_status(), 400);
        assert!(!err.is_configuration_error());

        let err = CalculationError::UnknownCalculationKind {
            kind: "balloon".to_string(),
        };
        assert!(err.is_configuration_error());
    }

    #[test]
    fn test_rate_and_range_messages() {
        let err = CalculationError::InvalidRate {
            rate: Rate::from_percentage(rust_decimal::Decimal::NEGATIVE_ONE),
        };
        assert_eq!(err.to_string(), "invalid rate: -1%");

        let err = CalculationError::out_of_range(Money::from_major(5));
        assert_eq!(err.to_string(), "invalid amount: 5 is out of range");
    }

    #[test]
    fn test_from_json_error() {
        let parse: std::result::Result<u32, _> = serde_json::from_str("nope");
        let err: CalculationError = parse.unwrap_err().into();
        assert!(matches!(err, CalculationError::Serialization { .. }));
    }
}

use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

/// unique identifier for a scheme
pub type SchemeId = Uuid;

/// scheme status, as managed by administrators
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SchemeStatus {
    Active,
    Inactive,
}

/// period the scheme's rates are quoted for
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RatePeriod {
    /// rate per month
    Monthly,
    /// rate per year
    Yearly,
}

/// whether the first period's interest was collected when the loan was booked
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
pub enum InterestStatus {
    #[serde(rename = "taken")]
    Taken,
    #[serde(rename = "notTaken")]
    #[default]
    NotTaken,
}

impl InterestStatus {
    pub fn is_taken(&self) -> bool {
        matches!(self, InterestStatus::Taken)
    }
}

/// what is being closed
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ClosureKind {
    /// customer pledge loan
    Loan,
    /// pledge re-pledged to an external bank
    Repledge,
}

/// reference to a stored scheme, by external key or id
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SchemeRef {
    Slug(String),
    Id(SchemeId),
}

impl fmt::Display for SchemeRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SchemeRef::Slug(slug) => write!(f, "{}", slug),
            SchemeRef::Id(id) => write!(f, "{}", id),
        }
    }
}

impl From<&str> for SchemeRef {
    fn from(slug: &str) -> Self {
        SchemeRef::Slug(slug.to_string())
    }
}

impl From<SchemeId> for SchemeRef {
    fn from(id: SchemeId) -> Self {
        SchemeRef::Id(id)
    }
}

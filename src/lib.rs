pub mod closure;
pub mod config;
pub mod decimal;
pub mod engine;
pub mod errors;
pub mod estimate;
pub mod interest;
pub mod payoff;
pub mod registry;
pub mod types;

// re-export key types
pub use closure::{ClosureRequest, ClosureService, PayoffStatement};
pub use config::{
    CalculationKind, CompoundConfig, DayBasisConfig, DayThreshold, EngineSettings, SchemeConfig,
    SchemeRecord, TieredConfig,
};
pub use decimal::{Money, Rate};
pub use engine::{CalculationRequest, CalculationRequestBuilder, InterestEngine};
pub use errors::{CalculationError, Result};
pub use estimate::{ErrorBody, EstimateRequest, EstimateResponse, EstimateService};
pub use interest::{
    DurationResolver, ElapsedDuration, InterestAccumulator, RateSelector, RateTier, SubPeriod,
    SubPeriods,
};
pub use payoff::{CalculationResult, PayoffComposer};
pub use registry::SchemeRegistry;
pub use types::{ClosureKind, InterestStatus, RatePeriod, SchemeId, SchemeRef, SchemeStatus};

// re-export external dependencies that users will need
pub use chrono;
pub use hourglass_rs::{SafeTimeProvider, TimeSource};
pub use rust_decimal::Decimal;
pub use uuid::Uuid;

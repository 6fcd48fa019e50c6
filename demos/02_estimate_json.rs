/// estimate json - the estimate endpoint end to end with a pinned clock
use std::sync::Arc;

use pledge_interest_rs::chrono::{TimeZone, Utc};
use pledge_interest_rs::{EstimateService, InterestEngine, SafeTimeProvider, SchemeRegistry, TimeSource};

const SCHEMES: &str = r#"[
    {"slug": "gold-6m", "name": "Gold 6 months", "base_rate": "2", "rate_period": "monthly",
     "calculation_kind": "tiered", "config": {"validity_months": 6, "surcharge_rate": "3"}},
    {"slug": "scheme-2", "name": "Scheme 2", "base_rate": "2", "rate_period": "monthly",
     "calculation_kind": "day_basis_tiered",
     "config": {"thresholds": [{"days": 7, "fraction": "0.5"}], "surcharge_rate": "3"}}
]"#;

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let time = SafeTimeProvider::new(TimeSource::Test(
        Utc.with_ymd_and_hms(2024, 8, 10, 0, 0, 0).single().ok_or("bad time")?,
    ));

    let registry = SchemeRegistry::new();
    registry.load_json(SCHEMES)?;
    let service = EstimateService::new(Arc::new(InterestEngine::default()), Arc::new(registry));

    let bodies = [
        r#"{"amount": "10000", "start_date": "2024-01-10", "scheme_slug": "gold-6m", "interest_status": "taken"}"#,
        r#"{"amount": "10000", "start_date": "2024-08-05", "scheme_slug": "scheme-2"}"#,
        r#"{"amount": "ten", "start_date": "2024-01-10", "scheme_slug": "gold-6m"}"#,
        r#"{"amount": "10000", "start_date": "2024-09-01", "scheme_slug": "gold-6m"}"#,
    ];

    for body in bodies {
        let (status, reply) = service.handle_json(body, &time);
        println!("{} {}", status, reply);
    }

    Ok(())
}

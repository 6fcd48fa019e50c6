/// scheme kinds - the same loan under each calculation kind
use pledge_interest_rs::chrono::{Duration, NaiveDate};
use pledge_interest_rs::{
    CalculationRequest, DayThreshold, InterestEngine, Money, Rate, RatePeriod, SchemeConfig,
};
use rust_decimal_macros::dec;

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let engine = InterestEngine::default();
    let principal = Money::from_major(50_000);
    let start = NaiveDate::from_ymd_opt(2024, 1, 1).ok_or("bad date")?;

    let schemes = vec![
        SchemeConfig::flat("flat", "Flat 1.5%", Rate::from_percentage(dec!(1.5)), RatePeriod::Monthly),
        SchemeConfig::tiered("tiered", "Tiered", Rate::from_whole_percentage(2), 6, Rate::from_whole_percentage(3)),
        SchemeConfig::day_basis_tiered(
            "day-basis",
            "Day basis",
            Rate::from_whole_percentage(2),
            vec![
                DayThreshold { days: 7, fraction: dec!(0.5) },
                DayThreshold { days: 15, fraction: dec!(0.75) },
            ],
            Rate::from_whole_percentage(3),
            Some(6),
        ),
        SchemeConfig::day_basis_compound(
            "annual",
            "Annual",
            Rate::from_whole_percentage(18),
            30,
            Rate::from_whole_percentage(24),
        ),
    ];

    println!("{:<12} {:>8} {:>12} {:>12}", "scheme", "days", "interest", "payable");
    for scheme in &schemes {
        for days in [5, 12, 45, 200, 500] {
            let request = CalculationRequest::new(principal, start, start + Duration::days(days));
            let result = engine.calculate(scheme, &request)?;
            println!(
                "{:<12} {:>8} {:>12} {:>12}",
                scheme.slug, days, result.total_interest, result.total_payable
            );
        }
    }

    Ok(())
}

/// quick start - price a gold loan payoff
use pledge_interest_rs::chrono::NaiveDate;
use pledge_interest_rs::{CalculationRequest, InterestEngine, Money, Rate, SchemeConfig};

fn main() -> Result<(), Box<dyn std::error::Error>> {
    // 2% a month for 6 months, 3% after that
    let scheme = SchemeConfig::tiered(
        "gold-6m",
        "Gold 6 months",
        Rate::from_whole_percentage(2),
        6,
        Rate::from_whole_percentage(3),
    );

    let request = CalculationRequest::builder()
        .principal(Money::from_major(10_000))
        .start_date(NaiveDate::from_ymd_opt(2024, 1, 10).ok_or("bad date")?)
        .end_date(NaiveDate::from_ymd_opt(2024, 8, 10).ok_or("bad date")?)
        .interest_already_taken(true)
        .build()?;

    let result = InterestEngine::default().calculate(&scheme, &request)?;

    println!("{}", serde_json::to_string_pretty(&result)?);

    Ok(())
}

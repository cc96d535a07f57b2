/// quick start - minimal example to get started
use mortgage_estimator_rs::{BorrowerProfile, EstimatorConfig, Money, MortgageEstimator, PropertyInput};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // heuristic location costs, no network needed
    let estimator = MortgageEstimator::new(&EstimatorConfig::heuristic())?;

    let property = PropertyInput::parse("12 Elm St, Springfield, IL 62704", "300000", None)?;
    let profile = BorrowerProfile {
        credit_score: Some(760),
        down_payment: Some(Money::from_major(30_000)),
        ..Default::default()
    };

    let estimate = estimator.estimate(&property, &profile).await?;

    for (name, amount) in estimate.breakdown.components() {
        println!("{:>20}: ${}", name, amount);
    }
    println!("{:>20}: ${}", "total", estimate.breakdown.total_monthly_payment());

    println!("\n{}", serde_json::to_string_pretty(&estimate.breakdown.to_record())?);

    Ok(())
}

/// remote estimation - configuration from the environment with structured logging
///
/// ESTIMATION_STRATEGY=remote ESTIMATION_API_KEY=sk-... cargo run --example 02_remote_estimation
/// LOG_FORMAT=json switches the log output to json.
use mortgage_estimator_rs::{BorrowerProfile, EstimatorConfig, Money, MortgageEstimator, PropertyInput};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let env_filter = std::env::var("RUST_LOG")
        .unwrap_or_else(|_| "mortgage_estimator_rs=debug".to_string());
    let json_logs = std::env::var("LOG_FORMAT")
        .map(|v| v == "json")
        .unwrap_or(false);

    if json_logs {
        tracing_subscriber::fmt()
            .with_env_filter(env_filter)
            .with_target(false)
            .json()
            .init();
    } else {
        tracing_subscriber::fmt().with_env_filter(env_filter).init();
    }

    let config = EstimatorConfig::from_env()?;
    let estimator = MortgageEstimator::new(&config)?;
    tracing::info!(estimator = estimator.cost_estimator_name(), "estimator ready");

    let property = PropertyInput::new(
        "221 Coastal Dr, Charleston, SC 29401",
        Money::from_major(525_000),
        None,
    )?;
    let profile = BorrowerProfile {
        credit_score: Some(690),
        down_payment: Some(Money::from_major(52_500)),
        homestead_exemption: true,
        ..Default::default()
    };

    match estimator.estimate(&property, &profile).await {
        Ok(estimate) => {
            println!("{}", serde_json::to_string_pretty(&estimate.breakdown)?);
            println!("{}", serde_json::to_string_pretty(&estimate.summary())?);
        }
        Err(e) if e.is_retryable() => println!("estimate unavailable, please try again: {}", e),
        Err(e) => return Err(e.into()),
    }

    Ok(())
}

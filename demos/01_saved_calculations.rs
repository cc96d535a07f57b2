/// saved calculations - save, edit, list and delete with controlled time
use chrono::{Duration, TimeZone, Utc};
use mortgage_estimator_rs::{
    BorrowerProfile, CalculationStore, EditedCosts, EstimatorConfig, InMemoryCalculationStore,
    MortgageEstimator, MortgageType, ProfileForm, PropertyInput, SafeTimeProvider,
    SavedCalculation, TimeSource,
};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    println!("=== saved calculations example ===\n");

    let time = SafeTimeProvider::new(TimeSource::Test(
        Utc.with_ymd_and_hms(2024, 6, 1, 10, 0, 0).unwrap()
    ));
    let controller = time.test_control().unwrap();

    let estimator = MortgageEstimator::new(&EstimatorConfig::default())?;
    let store = InMemoryCalculationStore::new();

    // profile arrives as raw form strings
    let profile = BorrowerProfile::from_form(&ProfileForm {
        credit_score: Some("705".to_string()),
        down_payment: Some("45000".to_string()),
        mortgage_type: Some(MortgageType::FifteenYearFixed.label().to_string()),
        homestead_exemption: Some(true),
        ..Default::default()
    })?;

    let condo = PropertyInput::parse("88 Harbor Ave Unit 4B, Miami, FL 33131", "450000", None)?;
    let house = PropertyInput::parse("5 Oak Ln, Austin, TX 78701", "380000", None)?;

    let estimate = estimator.estimate(&condo, &profile).await?;
    let first = store.create(SavedCalculation::from_estimate("user-42", &estimate, &time))?;
    println!("saved {} total ${}", first.property.address, first.total_monthly_payment());

    controller.advance(Duration::hours(1));
    let estimate = estimator.estimate(&house, &profile).await?;
    let second = store.create(SavedCalculation::from_estimate("user-42", &estimate, &time))?;
    println!("saved {} total ${}", second.property.address, second.total_monthly_payment());

    // edit the condo: the client total is never trusted
    controller.advance(Duration::days(2));
    let mut edited = EditedCosts::from_breakdown(&first.breakdown);
    edited.hoa = "425".to_string();
    edited.flood_insurance = "95.50".to_string();
    let updated = store.update(first.id, "user-42", &edited, &time)?;
    println!(
        "\nedited {} total ${} -> ${} (effective rate {}%)",
        updated.property.address,
        first.total_monthly_payment(),
        updated.total_monthly_payment(),
        updated.effective_annual_rate()
    );

    println!("\nnewest first:");
    for calc in store.list_for_owner("user-42")? {
        println!("  {} {} ${}", calc.created_at.format("%Y-%m-%d %H:%M"), calc.property.address, calc.total_monthly_payment());
    }

    // another user cannot touch it
    if let Err(e) = store.get(first.id, "user-7") {
        println!("\nuser-7: {}", e);
    }

    store.delete(second.id, "user-42", &time)?;
    let purged = store.delete_all_for_owner("user-42", &time)?;
    println!("purged {} remaining calculation(s)", purged);

    println!("\nevents:");
    for event in store.take_events() {
        println!("  {:?}", event);
    }

    Ok(())
}

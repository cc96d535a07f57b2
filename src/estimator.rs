use serde::Serialize;
use std::sync::Arc;
use tracing::Instrument;

use crate::breakdown::{assemble_breakdown, BreakdownSummary, PaymentBreakdown};
use crate::config::{EstimationStrategy, EstimatorConfig};
use crate::errors::{EstimatorError, Result};
use crate::estimation::{CostEstimator, HeuristicCostEstimator, RemoteCostEstimator};
use crate::payments::LoanTerms;
use crate::types::{BorrowerProfile, PropertyInput};

/// result of a single calculation, before it is saved
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Estimate {
    pub property: PropertyInput,
    pub profile_snapshot: BorrowerProfile,
    pub terms: LoanTerms,
    pub breakdown: PaymentBreakdown,
    pub estimator: &'static str,
}

impl Estimate {
    pub fn summary(&self) -> BreakdownSummary {
        BreakdownSummary::new(&self.terms, &self.breakdown)
    }
}

/// runs the amortization, location-cost and assembly phases
#[derive(Clone)]
pub struct MortgageEstimator {
    cost_estimator: Arc<dyn CostEstimator>,
}

impl MortgageEstimator {
    /// build from configuration, choosing the location-cost strategy
    pub fn new(config: &EstimatorConfig) -> Result<Self> {
        config.validate()?;

        let cost_estimator: Arc<dyn CostEstimator> = match config.strategy {
            EstimationStrategy::Heuristic => {
                Arc::new(HeuristicCostEstimator::new(config.heuristics.clone()))
            }
            EstimationStrategy::Remote => {
                let remote = config.remote.as_ref().ok_or_else(|| {
                    EstimatorError::InvalidConfiguration {
                        message: "remote strategy selected without remote settings".to_string(),
                    }
                })?;
                Arc::new(RemoteCostEstimator::from_config(config, remote)?)
            }
        };

        Ok(Self { cost_estimator })
    }

    pub fn with_cost_estimator(cost_estimator: Arc<dyn CostEstimator>) -> Self {
        Self { cost_estimator }
    }

    pub fn cost_estimator_name(&self) -> &'static str {
        self.cost_estimator.name()
    }

    /// Produce a breakdown for a property and a profile snapshot.
    ///
    /// Input is validated and the deterministic phase runs before any
    /// external call, so invalid input never reaches the cost estimator.
    pub async fn estimate(
        &self,
        property: &PropertyInput,
        profile: &BorrowerProfile,
    ) -> Result<Estimate> {
        let span = tracing::info_span!(
            "estimate",
            address = %property.address,
            asking_price = %property.asking_price,
            estimator = self.cost_estimator.name(),
        );

        async move {
            let terms = LoanTerms::from_profile(property.asking_price, profile)?;
            let pi = terms.first_month()?;
            tracing::debug!(
                loan_amount = %terms.loan_amount,
                annual_rate = %terms.annual_rate,
                term_months = terms.term_months,
                principal = %pi.principal,
                interest = %pi.interest,
                pmi = %pi.pmi,
                "amortization phase complete"
            );

            let costs = self
                .cost_estimator
                .estimate(property, profile.homestead_exemption)
                .await?
                .sanitized();

            let breakdown = assemble_breakdown(&pi, &costs);
            tracing::info!(total = %breakdown.total_monthly_payment(), "breakdown assembled");

            Ok(Estimate {
                property: property.clone(),
                profile_snapshot: profile.clone(),
                terms,
                breakdown,
                estimator: self.cost_estimator.name(),
            })
        }
        .instrument(span)
        .await
    }

    /// parse the calculation form and estimate
    pub async fn estimate_form(
        &self,
        address: &str,
        asking_price: &str,
        photo_reference: Option<&str>,
        profile: &BorrowerProfile,
    ) -> Result<Estimate> {
        let property = PropertyInput::parse(address, asking_price, photo_reference)?;
        self.estimate(&property, profile).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::decimal::Money;
    use crate::estimation::LocationCosts;
    use crate::types::MortgageType;
    use async_trait::async_trait;
    use std::sync::atomic::{AtomicUsize, Ordering};

    struct FixedCosts {
        calls: AtomicUsize,
        fail: bool,
    }

    impl FixedCosts {
        fn new(fail: bool) -> Arc<Self> {
            Arc::new(Self {
                calls: AtomicUsize::new(0),
                fail,
            })
        }
    }

    #[async_trait]
    impl CostEstimator for FixedCosts {
        async fn estimate(&self, _: &PropertyInput, _: bool) -> Result<LocationCosts> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            if self.fail {
                return Err(EstimatorError::EstimationUnavailable {
                    message: "down".to_string(),
                });
            }
            Ok(LocationCosts {
                property_taxes: Money::from_major(300),
                hoa: Money::ZERO,
                homeowners_insurance: Money::from_major(150),
                flood_insurance: Money::ZERO,
                other: Money::from_major(50),
            })
        }

        fn name(&self) -> &'static str {
            "fixed"
        }
    }

    fn profile() -> BorrowerProfile {
        BorrowerProfile {
            credit_score: Some(760),
            down_payment: Some(Money::from_major(30_000)),
            mortgage_type: Some(MortgageType::ThirtyYearFixed),
            ..Default::default()
        }
    }

    fn property(price: i64) -> PropertyInput {
        PropertyInput::new("12 Elm St, Springfield, IL 62704", Money::from_major(price), None)
            .unwrap()
    }

    #[tokio::test]
    async fn test_reference_estimate() {
        let costs = FixedCosts::new(false);
        let estimator = MortgageEstimator::with_cost_estimator(costs.clone());

        let estimate = estimator.estimate(&property(300_000), &profile()).await.unwrap();
        let breakdown = estimate.breakdown;

        assert_eq!(breakdown.principal, Money::from_cents(25_619));
        assert_eq!(breakdown.interest, Money::from_cents(140_625));
        assert_eq!(breakdown.pmi, Money::from_major(180));
        assert_eq!(breakdown.total_monthly_payment(), Money::from_cents(234_244));
        assert_eq!(estimate.estimator, "fixed");
        assert_eq!(estimate.summary().loan_amount, Money::from_major(270_000));
        assert_eq!(costs.calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_invalid_input_never_reaches_cost_estimator() {
        let costs = FixedCosts::new(false);
        let estimator = MortgageEstimator::with_cost_estimator(costs.clone());

        let mut all_cash = profile();
        all_cash.down_payment = Some(Money::from_major(300_000));

        let err = estimator.estimate(&property(300_000), &all_cash).await.unwrap_err();
        assert!(matches!(err, EstimatorError::InvalidInput { .. }));
        assert_eq!(costs.calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_cost_estimator_failure_propagates() {
        let estimator = MortgageEstimator::with_cost_estimator(FixedCosts::new(true));
        let err = estimator.estimate(&property(300_000), &profile()).await.unwrap_err();
        assert!(matches!(err, EstimatorError::EstimationUnavailable { .. }));
    }

    #[tokio::test]
    async fn test_estimate_form_rejects_bad_price() {
        let estimator = MortgageEstimator::with_cost_estimator(FixedCosts::new(false));
        let err = estimator
            .estimate_form("12 Elm St", "three hundred grand", None, &profile())
            .await
            .unwrap_err();
        assert!(matches!(err, EstimatorError::InvalidInput { ref field, .. } if field == "askingPrice"));
    }

    #[tokio::test]
    async fn test_heuristic_strategy_from_config() {
        let estimator = MortgageEstimator::new(&EstimatorConfig::heuristic()).unwrap();
        assert_eq!(estimator.cost_estimator_name(), "heuristic");

        let estimate = estimator.estimate(&property(300_000), &profile()).await.unwrap();
        assert_eq!(estimate.breakdown.property_taxes, Money::from_major(300));
        assert_eq!(estimate.breakdown.homeowners_insurance, Money::from_major(150));
        assert_eq!(estimate.breakdown.other, Money::from_major(50));
    }
}

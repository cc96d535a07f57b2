pub mod client;
pub mod heuristic;
pub mod remote;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::decimal::Money;
use crate::errors::Result;
use crate::types::PropertyInput;

pub use client::{ChatCompletion, OpenAiChatClient};
pub use heuristic::HeuristicCostEstimator;
pub use remote::{extract_zip_code, RemoteCostEstimator};

/// location-dependent monthly costs
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LocationCosts {
    pub property_taxes: Money,
    pub hoa: Money,
    pub homeowners_insurance: Money,
    pub flood_insurance: Money,
    pub other: Money,
}

impl LocationCosts {
    /// clamp every field into the accepted range; amounts are already cent-rounded
    pub fn sanitized(self) -> Self {
        Self {
            property_taxes: self.property_taxes.bounded(),
            hoa: self.hoa.bounded(),
            homeowners_insurance: self.homeowners_insurance.bounded(),
            flood_insurance: self.flood_insurance.bounded(),
            other: self.other.bounded(),
        }
    }
}

/// source of location-dependent cost estimates
#[async_trait]
pub trait CostEstimator: Send + Sync {
    async fn estimate(
        &self,
        property: &PropertyInput,
        homestead_exemption: bool,
    ) -> Result<LocationCosts>;

    /// short name for logs
    fn name(&self) -> &'static str;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sanitized_clamps_negatives() {
        let costs = LocationCosts {
            property_taxes: Money::from_major(-5),
            hoa: Money::from_major(10),
            homeowners_insurance: Money::ZERO,
            flood_insurance: Money::from_cents(-1),
            other: Money::from_major(50),
        }
        .sanitized();

        assert_eq!(costs.property_taxes, Money::ZERO);
        assert_eq!(costs.hoa, Money::from_major(10));
        assert_eq!(costs.flood_insurance, Money::ZERO);
    }
}

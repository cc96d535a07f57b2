use async_trait::async_trait;

use crate::config::HeuristicAssumptions;
use crate::decimal::{Money, Rate};
use crate::errors::Result;
use crate::estimation::{CostEstimator, LocationCosts};
use crate::types::PropertyInput;

/// deterministic estimator built from flat assumptions
#[derive(Debug, Clone, Default)]
pub struct HeuristicCostEstimator {
    assumptions: HeuristicAssumptions,
}

impl HeuristicCostEstimator {
    pub fn new(assumptions: HeuristicAssumptions) -> Self {
        Self { assumptions }
    }

    pub fn assumptions(&self) -> &HeuristicAssumptions {
        &self.assumptions
    }

    pub fn property_tax_rate(&self, homestead_exemption: bool) -> Rate {
        if homestead_exemption {
            self.assumptions.homestead_property_tax_rate
        } else {
            self.assumptions.property_tax_rate
        }
    }

    pub fn property_taxes(&self, asking_price: Money, homestead_exemption: bool) -> Money {
        asking_price.monthly_share_of_annual(self.property_tax_rate(homestead_exemption))
    }

    /// whether the address reads like a condo or townhouse
    pub fn suggests_shared_ownership(&self, address: &str) -> bool {
        let address = address.to_lowercase();
        self.assumptions
            .shared_ownership_keywords
            .iter()
            .any(|keyword| contains_keyword(&address, keyword))
    }

    pub fn hoa(&self, address: &str) -> Money {
        if self.suggests_shared_ownership(address) {
            self.assumptions.condo_hoa
        } else {
            Money::ZERO
        }
    }

    /// synchronous core, shared with the remote estimator's fallback
    pub fn costs_for(&self, property: &PropertyInput, homestead_exemption: bool) -> LocationCosts {
        LocationCosts {
            property_taxes: self.property_taxes(property.asking_price, homestead_exemption),
            hoa: self.hoa(&property.address),
            homeowners_insurance: self.assumptions.homeowners_insurance,
            flood_insurance: self.assumptions.flood_insurance,
            other: self.assumptions.other,
        }
        .sanitized()
    }
}

/// alphanumeric keywords must match a whole word; symbols match anywhere
fn contains_keyword(haystack: &str, keyword: &str) -> bool {
    if !keyword.chars().all(char::is_alphanumeric) {
        return haystack.contains(keyword);
    }
    haystack
        .split(|c: char| !c.is_alphanumeric())
        .any(|word| word == keyword)
}

#[async_trait]
impl CostEstimator for HeuristicCostEstimator {
    async fn estimate(
        &self,
        property: &PropertyInput,
        homestead_exemption: bool,
    ) -> Result<LocationCosts> {
        Ok(self.costs_for(property, homestead_exemption))
    }

    fn name(&self) -> &'static str {
        "heuristic"
    }
}

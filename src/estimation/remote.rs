use async_trait::async_trait;
use lazy_static::lazy_static;
use regex::Regex;
use serde_json::Value;
use std::sync::Arc;
use std::time::Duration;

use crate::config::{EstimatorConfig, FallbackPolicy, RemoteEstimatorConfig};
use crate::decimal::Money;
use crate::errors::{EstimatorError, Result};
use crate::estimation::client::{ChatCompletion, OpenAiChatClient};
use crate::estimation::heuristic::HeuristicCostEstimator;
use crate::estimation::{CostEstimator, LocationCosts};
use crate::types::PropertyInput;

const SYSTEM_PROMPT: &str = "You are a precise housing cost estimator. \
Respond only with a valid JSON object containing realistic monthly amounts in USD.";

lazy_static! {
    static ref ZIP_RE: Regex = Regex::new(r"\b\d{5}(?:-\d{4})?\b").unwrap();
}

/// last 5-digit or ZIP+4 code in the address; a leading 5-digit house
/// number loses to the zip that normally closes a US address
pub fn extract_zip_code(address: &str) -> Option<String> {
    ZIP_RE
        .find_iter(address)
        .last()
        .map(|m| m.as_str().to_string())
}

/// estimator that asks an external service, filling gaps from heuristics
pub struct RemoteCostEstimator {
    client: Arc<dyn ChatCompletion>,
    fallback: HeuristicCostEstimator,
    policy: FallbackPolicy,
    timeout: Duration,
}

impl RemoteCostEstimator {
    pub fn new(
        client: Arc<dyn ChatCompletion>,
        fallback: HeuristicCostEstimator,
        policy: FallbackPolicy,
        timeout: Duration,
    ) -> Self {
        Self {
            client,
            fallback,
            policy,
            timeout,
        }
    }

    /// wire up the OpenAI-compatible client from explicit settings
    pub fn from_config(config: &EstimatorConfig, remote: &RemoteEstimatorConfig) -> Result<Self> {
        let client = OpenAiChatClient::new(remote)?;
        Ok(Self::new(
            Arc::new(client),
            HeuristicCostEstimator::new(config.heuristics.clone()),
            config.fallback_policy,
            remote.timeout(),
        ))
    }

    /// one bounded call; the request future is dropped when the timeout fires
    async fn ask(&self, property: &PropertyInput, homestead_exemption: bool) -> Result<RemoteFigures> {
        let prompt = build_prompt(property, homestead_exemption);

        let content = match tokio::time::timeout(
            self.timeout,
            self.client.complete(SYSTEM_PROMPT, &prompt),
        )
        .await
        {
            Ok(reply) => reply?,
            Err(_) => {
                return Err(EstimatorError::EstimationUnavailable {
                    message: format!("no answer within {:?}", self.timeout),
                })
            }
        };

        parse_figures(&content)
    }
}

#[async_trait]
impl CostEstimator for RemoteCostEstimator {
    async fn estimate(
        &self,
        property: &PropertyInput,
        homestead_exemption: bool,
    ) -> Result<LocationCosts> {
        let defaults = self.fallback.costs_for(property, homestead_exemption);

        let figures = match self.ask(property, homestead_exemption).await {
            Ok(figures) => figures,
            Err(e) if e.is_retryable() && self.policy == FallbackPolicy::Heuristic => {
                tracing::warn!(error = %e, "estimation service unavailable; using heuristic costs");
                return Ok(defaults);
            }
            Err(e) => return Err(e),
        };

        let missing = figures.missing_fields();
        if !missing.is_empty() {
            tracing::warn!(?missing, "estimation response incomplete; heuristic values substituted");
        }

        Ok(figures.merge_onto(defaults))
    }

    fn name(&self) -> &'static str {
        "remote"
    }
}

/// the four delegated figures; `None` means absent or unusable
#[derive(Debug, Clone, Default, PartialEq)]
struct RemoteFigures {
    property_taxes: Option<Money>,
    hoa: Option<Money>,
    homeowners_insurance: Option<Money>,
    flood_insurance: Option<Money>,
}

impl RemoteFigures {
    fn missing_fields(&self) -> Vec<&'static str> {
        [
            ("propertyTaxes", self.property_taxes.is_none()),
            ("hoa", self.hoa.is_none()),
            ("homeownersInsurance", self.homeowners_insurance.is_none()),
            ("floodInsurance", self.flood_insurance.is_none()),
        ]
        .into_iter()
        .filter(|(_, missing)| *missing)
        .map(|(name, _)| name)
        .collect()
    }

    /// `other` is never delegated
    fn merge_onto(self, defaults: LocationCosts) -> LocationCosts {
        LocationCosts {
            property_taxes: self.property_taxes.unwrap_or(defaults.property_taxes),
            hoa: self.hoa.unwrap_or(defaults.hoa),
            homeowners_insurance: self
                .homeowners_insurance
                .unwrap_or(defaults.homeowners_insurance),
            flood_insurance: self.flood_insurance.unwrap_or(defaults.flood_insurance),
            other: defaults.other,
        }
        .sanitized()
    }
}

/// a body that is not a JSON object is a failed call, not a partial answer
fn parse_figures(content: &str) -> Result<RemoteFigures> {
    let value: Value = serde_json::from_str(strip_code_fence(content)).map_err(|e| {
        EstimatorError::EstimationUnavailable {
            message: format!("estimation response is not JSON: {}", e),
        }
    })?;

    let object = value
        .as_object()
        .ok_or_else(|| EstimatorError::EstimationUnavailable {
            message: "estimation response is not a JSON object".to_string(),
        })?;

    let field = |key: &str| object.get(key).and_then(parse_amount);

    Ok(RemoteFigures {
        property_taxes: field("propertyTaxes"),
        hoa: field("hoa"),
        homeowners_insurance: field("homeownersInsurance"),
        flood_insurance: field("floodInsurance"),
    })
}

/// accepts numbers and numeric strings such as "1,250.50" or "$150"
fn parse_amount(value: &Value) -> Option<Money> {
    let amount = match value {
        Value::Number(n) => Money::from_str_rounded(&n.to_string()).ok(),
        Value::String(s) => {
            let cleaned: String = s
                .trim()
                .trim_start_matches('$')
                .chars()
                .filter(|c| *c != ',')
                .collect();
            Money::from_str_rounded(&cleaned).ok()
        }
        _ => None,
    };
    amount.filter(|m| !m.is_negative() && !m.exceeds_input_limit())
}

/// some models wrap JSON in a markdown fence despite being told not to
fn strip_code_fence(content: &str) -> &str {
    let trimmed = content.trim();
    match trimmed.strip_prefix("```") {
        Some(rest) => rest
            .trim_start_matches("json")
            .trim_end()
            .trim_end_matches("```")
            .trim(),
        None => trimmed,
    }
}

fn build_prompt(property: &PropertyInput, homestead_exemption: bool) -> String {
    let zip = extract_zip_code(&property.address).unwrap_or_else(|| "Not provided".to_string());
    let homestead = if homestead_exemption { "Yes" } else { "No" };

    format!(
        "Estimate the monthly housing costs that depend on this property's location.\n\
\n\
Property:\n\
- Address: {address}\n\
- Zip code: {zip}\n\
- Asking price: ${price}\n\
- Homestead exemption: {homestead}\n\
\n\
Provide monthly amounts in USD for:\n\
1. propertyTaxes: property tax for this jurisdiction; apply the local homestead reduction if the exemption is Yes\n\
2. hoa: HOA dues for this property type and location, or 0 if unlikely\n\
3. homeownersInsurance: homeowners insurance for this property type and location\n\
4. floodInsurance: flood insurance based on the location's flood risk, or 0 outside flood zones\n\
\n\
Return ONLY a JSON object with exactly these numeric keys: propertyTaxes, hoa, homeownersInsurance, floodInsurance.",
        address = property.address,
        zip = zip,
        price = property.asking_price,
        homestead = homestead,
    )
}

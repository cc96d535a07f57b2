use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};
use std::time::Duration;

use crate::decimal::{Money, Rate};
use crate::errors::{EstimatorError, Result};

pub const DEFAULT_TIMEOUT_SECS: u64 = 20;
pub const MIN_TIMEOUT_SECS: u64 = 15;
pub const MAX_TIMEOUT_SECS: u64 = 30;
pub const DEFAULT_BASE_URL: &str = "https://api.openai.com/v1";
pub const DEFAULT_MODEL: &str = "gpt-4o-mini";

/// estimator configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EstimatorConfig {
    pub strategy: EstimationStrategy,
    pub fallback_policy: FallbackPolicy,
    pub heuristics: HeuristicAssumptions,
    pub remote: Option<RemoteEstimatorConfig>,
}

/// how location-dependent costs are estimated
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum EstimationStrategy {
    /// flat rates and keyword rules, no network
    Heuristic,
    /// ask the estimation service, field-level heuristic fallback
    Remote,
}

/// what happens when the estimation service cannot answer at all
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum FallbackPolicy {
    /// substitute heuristic values and carry on
    Heuristic,
    /// surface a retryable error to the caller
    Strict,
}

/// constants behind the heuristic estimator
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HeuristicAssumptions {
    pub property_tax_rate: Rate,
    pub homestead_property_tax_rate: Rate,
    pub condo_hoa: Money,
    pub homeowners_insurance: Money,
    pub flood_insurance: Money,
    pub other: Money,
    /// lowercase address fragments that suggest a condo or townhouse
    pub shared_ownership_keywords: Vec<String>,
}

impl Default for HeuristicAssumptions {
    fn default() -> Self {
        Self {
            property_tax_rate: Rate::from_percent(dec!(1.2)),
            homestead_property_tax_rate: Rate::from_percent(dec!(0.8)),
            condo_hoa: Money::from_major(150),
            homeowners_insurance: Money::from_major(150),
            flood_insurance: Money::ZERO,
            other: Money::from_major(50),
            shared_ownership_keywords: [
                "condo",
                "condominium",
                "townhouse",
                "townhome",
                "unit",
                "apt",
                "#",
            ]
                .iter()
                .map(|k| k.to_string())
                .collect(),
        }
    }
}

/// connection settings for the estimation service
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RemoteEstimatorConfig {
    pub base_url: String,
    pub api_key: String,
    pub model: String,
    pub timeout_secs: u64,
}

impl RemoteEstimatorConfig {
    pub fn new(api_key: impl Into<String>) -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            api_key: api_key.into(),
            model: DEFAULT_MODEL.to_string(),
            timeout_secs: DEFAULT_TIMEOUT_SECS,
        }
    }

    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.model = model.into();
        self
    }

    pub fn with_timeout_secs(mut self, secs: u64) -> Self {
        self.timeout_secs = secs;
        self
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }

    pub fn validate(&self) -> Result<()> {
        if self.api_key.trim().is_empty() {
            return Err(EstimatorError::InvalidConfiguration {
                message: "estimation api key is empty".to_string(),
            });
        }
        if !(self.base_url.starts_with("http://") || self.base_url.starts_with("https://")) {
            return Err(EstimatorError::InvalidConfiguration {
                message: format!("unsupported estimation base url '{}'", self.base_url),
            });
        }
        if !(MIN_TIMEOUT_SECS..=MAX_TIMEOUT_SECS).contains(&self.timeout_secs) {
            return Err(EstimatorError::InvalidConfiguration {
                message: format!(
                    "estimation timeout must be {}-{}s, got {}s",
                    MIN_TIMEOUT_SECS, MAX_TIMEOUT_SECS, self.timeout_secs
                ),
            });
        }
        Ok(())
    }
}

impl EstimatorConfig {
    /// heuristic-only configuration, no external dependency
    pub fn heuristic() -> Self {
        Self {
            strategy: EstimationStrategy::Heuristic,
            fallback_policy: FallbackPolicy::Heuristic,
            heuristics: HeuristicAssumptions::default(),
            remote: None,
        }
    }

    /// remote estimation with heuristic fallback
    pub fn remote(remote: RemoteEstimatorConfig) -> Self {
        Self {
            strategy: EstimationStrategy::Remote,
            fallback_policy: FallbackPolicy::Heuristic,
            heuristics: HeuristicAssumptions::default(),
            remote: Some(remote),
        }
    }

    pub fn with_fallback_policy(mut self, policy: FallbackPolicy) -> Self {
        self.fallback_policy = policy;
        self
    }

    pub fn with_heuristics(mut self, heuristics: HeuristicAssumptions) -> Self {
        self.heuristics = heuristics;
        self
    }

    pub fn validate(&self) -> Result<()> {
        match (self.strategy, &self.remote) {
            (EstimationStrategy::Heuristic, _) => Ok(()),
            (EstimationStrategy::Remote, Some(remote)) => remote.validate(),
            (EstimationStrategy::Remote, None) => Err(EstimatorError::InvalidConfiguration {
                message: "remote strategy selected without remote settings".to_string(),
            }),
        }
    }

    /// Load from the process environment. Meant for binaries at the edge;
    /// the library itself only ever receives a config value.
    ///
    /// - `ESTIMATION_STRATEGY`: `heuristic` (default) or `remote`
    /// - `ESTIMATION_FALLBACK`: `heuristic` (default) or `strict`
    /// - `ESTIMATION_API_KEY`, `ESTIMATION_BASE_URL`, `ESTIMATION_MODEL`,
    ///   `ESTIMATION_TIMEOUT_SECS`
    pub fn from_env() -> Result<Self> {
        let strategy = std::env::var("ESTIMATION_STRATEGY")
            .unwrap_or_else(|_| "heuristic".into());
        let fallback_policy = match std::env::var("ESTIMATION_FALLBACK").as_deref() {
            Ok("strict") => FallbackPolicy::Strict,
            _ => FallbackPolicy::Heuristic,
        };

        let config = match strategy.as_str() {
            "heuristic" => Self::heuristic(),
            "remote" => {
                let api_key = std::env::var("ESTIMATION_API_KEY").map_err(|_| {
                    EstimatorError::InvalidConfiguration {
                        message: "ESTIMATION_API_KEY is required for the remote strategy".to_string(),
                    }
                })?;
                let remote = RemoteEstimatorConfig {
                    base_url: std::env::var("ESTIMATION_BASE_URL")
                        .unwrap_or_else(|_| DEFAULT_BASE_URL.into()),
                    api_key,
                    model: std::env::var("ESTIMATION_MODEL")
                        .unwrap_or_else(|_| DEFAULT_MODEL.into()),
                    timeout_secs: std::env::var("ESTIMATION_TIMEOUT_SECS")
                        .ok()
                        .and_then(|v| v.parse::<u64>().ok())
                        .unwrap_or(DEFAULT_TIMEOUT_SECS),
                };
                Self::remote(remote)
            }
            other => {
                return Err(EstimatorError::InvalidConfiguration {
                    message: format!("unknown ESTIMATION_STRATEGY '{}'", other),
                })
            }
        };

        let config = config.with_fallback_policy(fallback_policy);
        config.validate()?;
        Ok(config)
    }
}

impl Default for EstimatorConfig {
    fn default() -> Self {
        Self::heuristic()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_heuristic_defaults() {
        let config = EstimatorConfig::default();
        assert_eq!(config.strategy, EstimationStrategy::Heuristic);
        assert_eq!(config.fallback_policy, FallbackPolicy::Heuristic);
        assert_eq!(config.heuristics.property_tax_rate.as_decimal(), dec!(0.012));
        assert_eq!(config.heuristics.homestead_property_tax_rate.as_decimal(), dec!(0.008));
        assert_eq!(config.heuristics.other, Money::from_major(50));
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_remote_requires_settings() {
        let mut config = EstimatorConfig::remote(RemoteEstimatorConfig::new("sk-test"));
        assert!(config.validate().is_ok());

        config.remote = None;
        assert!(matches!(
            config.validate(),
            Err(EstimatorError::InvalidConfiguration { .. })
        ));
    }

    #[test]
    fn test_remote_timeout_bounds() {
        let remote = RemoteEstimatorConfig::new("sk-test").with_timeout_secs(60);
        assert!(remote.validate().is_err());

        let remote = RemoteEstimatorConfig::new("sk-test").with_timeout_secs(15);
        assert!(remote.validate().is_ok());
        assert_eq!(remote.timeout(), Duration::from_secs(15));
    }

    #[test]
    fn test_remote_rejects_bad_url_and_empty_key() {
        let remote = RemoteEstimatorConfig::new("sk-test").with_base_url("ftp://example.com");
        assert!(remote.validate().is_err());

        let remote = RemoteEstimatorConfig::new("  ");
        assert!(remote.validate().is_err());
    }

    #[test]
    fn test_config_round_trips_through_json() {
        let config = EstimatorConfig::remote(RemoteEstimatorConfig::new("sk-test"))
            .with_fallback_policy(FallbackPolicy::Strict);
        let json = serde_json::to_string(&config).unwrap();
        let back: EstimatorConfig = serde_json::from_str(&json).unwrap();
        assert_eq!(back.fallback_policy, FallbackPolicy::Strict);
        assert_eq!(back.remote.unwrap().timeout_secs, DEFAULT_TIMEOUT_SECS);
        assert_eq!(back.heuristics, HeuristicAssumptions::default());
    }
}

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

use crate::decimal::Money;
use crate::errors::{EstimatorError, Result};

/// unique identifier for a saved calculation
pub type CalculationId = Uuid;

/// identifier of the owning user account, issued by the auth layer
pub type OwnerId = String;

pub const MIN_CREDIT_SCORE: u32 = 300;
pub const MAX_CREDIT_SCORE: u32 = 850;
pub const MIN_BORROWER_AGE: u32 = 18;
pub const MAX_BORROWER_AGE: u32 = 100;

/// mortgage product chosen on the profile
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum MortgageType {
    #[default]
    ThirtyYearFixed,
    FifteenYearFixed,
    Arm,
    Fha,
    Va,
    /// any label the profile store holds that is not one of the above
    Other(String),
}

impl MortgageType {
    pub fn label(&self) -> &str {
        match self {
            MortgageType::ThirtyYearFixed => "30-year-fixed",
            MortgageType::FifteenYearFixed => "15-year-fixed",
            MortgageType::Arm => "arm",
            MortgageType::Fha => "fha",
            MortgageType::Va => "va",
            MortgageType::Other(label) => label,
        }
    }
}

impl fmt::Display for MortgageType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

impl FromStr for MortgageType {
    type Err = std::convert::Infallible;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        let kind = match s.trim().to_ascii_lowercase().as_str() {
            "30-year-fixed" => MortgageType::ThirtyYearFixed,
            "15-year-fixed" => MortgageType::FifteenYearFixed,
            "arm" => MortgageType::Arm,
            "fha" => MortgageType::Fha,
            "va" => MortgageType::Va,
            _ => MortgageType::Other(s.trim().to_string()),
        };
        Ok(kind)
    }
}

impl From<String> for MortgageType {
    fn from(s: String) -> Self {
        match s.parse() {
            Ok(kind) => kind,
            Err(never) => match never {},
        }
    }
}

impl From<MortgageType> for String {
    fn from(kind: MortgageType) -> Self {
        kind.label().to_string()
    }
}

/// borrower financial profile, captured by value at calculation time
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BorrowerProfile {
    pub age: Option<u32>,
    pub annual_income: Option<Money>,
    pub credit_score: Option<u32>,
    pub down_payment: Option<Money>,
    pub mortgage_type: Option<MortgageType>,
    pub monthly_debt: Option<Money>,
    #[serde(default)]
    pub homestead_exemption: bool,
}

/// raw profile form as submitted by the profile page
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProfileForm {
    pub age: Option<String>,
    pub annual_income: Option<String>,
    pub credit_score: Option<String>,
    pub down_payment: Option<String>,
    pub mortgage_type: Option<String>,
    pub monthly_debt: Option<String>,
    pub homestead_exemption: Option<bool>,
}

impl BorrowerProfile {
    /// parse a profile form; blank or unparseable optional fields become `None`
    pub fn from_form(form: &ProfileForm) -> Result<Self> {
        let age = parse_bounded(
            form.age.as_deref(),
            "age",
            MIN_BORROWER_AGE,
            MAX_BORROWER_AGE,
        )?;
        let credit_score = parse_bounded(
            form.credit_score.as_deref(),
            "creditScore",
            MIN_CREDIT_SCORE,
            MAX_CREDIT_SCORE,
        )?;

        let mortgage_type = form
            .mortgage_type
            .as_deref()
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(|s| MortgageType::from(s.to_string()));

        Ok(Self {
            age,
            annual_income: parse_optional_money(form.annual_income.as_deref()),
            credit_score,
            down_payment: parse_optional_money(form.down_payment.as_deref()),
            mortgage_type,
            monthly_debt: parse_optional_money(form.monthly_debt.as_deref()),
            homestead_exemption: form.homestead_exemption.unwrap_or(false),
        })
    }

    pub fn down_payment_or_zero(&self) -> Money {
        self.down_payment.unwrap_or(Money::ZERO)
    }
}

fn parse_optional_money(raw: Option<&str>) -> Option<Money> {
    raw.and_then(|s| Money::from_str_rounded(s).ok())
        .filter(|m| !m.is_negative() && !m.exceeds_input_limit())
}

fn parse_bounded(raw: Option<&str>, field: &str, min: u32, max: u32) -> Result<Option<u32>> {
    let value = match raw.map(str::trim).and_then(|s| s.parse::<u32>().ok()) {
        Some(v) => v,
        None => return Ok(None),
    };

    if value < min || value > max {
        return Err(EstimatorError::invalid_input(
            field,
            format!("must be between {} and {}, got {}", min, max, value),
        ));
    }

    Ok(Some(value))
}

/// property submitted for a calculation
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PropertyInput {
    pub address: String,
    pub asking_price: Money,
    pub photo_reference: Option<String>,
}

impl PropertyInput {
    /// create a validated property input
    pub fn new(
        address: impl Into<String>,
        asking_price: Money,
        photo_reference: Option<String>,
    ) -> Result<Self> {
        let address = address.into().trim().to_string();
        if address.is_empty() {
            return Err(EstimatorError::invalid_input("address", "address is required"));
        }
        if !asking_price.is_positive() {
            return Err(EstimatorError::invalid_input(
                "askingPrice",
                format!("must be greater than zero, got {}", asking_price),
            ));
        }
        if asking_price.exceeds_input_limit() {
            return Err(EstimatorError::invalid_input(
                "askingPrice",
                format!("cannot exceed {}", Money::MAX_INPUT),
            ));
        }

        let photo_reference = photo_reference
            .map(|p| p.trim().to_string())
            .filter(|p| !p.is_empty());

        Ok(Self {
            address,
            asking_price,
            photo_reference,
        })
    }

    /// parse the calculation form, where the asking price arrives as text
    pub fn parse(address: &str, asking_price: &str, photo_reference: Option<&str>) -> Result<Self> {
        let price = Money::from_str_rounded(asking_price).map_err(|_| {
            EstimatorError::invalid_input(
                "askingPrice",
                format!("'{}' is not a valid amount", asking_price.trim()),
            )
        })?;

        Self::new(address, price, photo_reference.map(str::to_string))
    }
}

use rust_decimal::{Decimal, RoundingStrategy};
use serde::{Deserialize, Serialize};

use crate::breakdown::{assemble_breakdown, PaymentBreakdown};
use crate::decimal::Money;
use crate::errors::{EstimatorError, Result};
use crate::estimation::LocationCosts;
use crate::payments::PrincipalInterestPmi;

/// principal and interest of a saved calculation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FixedComponents {
    pub principal: Money,
    pub interest: Money,
}

/// the six user-editable fields, exactly as typed
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct EditedCosts {
    pub property_taxes: String,
    pub hoa: String,
    pub pmi: String,
    pub homeowners_insurance: String,
    pub flood_insurance: String,
    pub other: String,
}

/// edited fields after lenient parsing
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EditedAmounts {
    pub property_taxes: Money,
    pub hoa: Money,
    pub pmi: Money,
    pub homeowners_insurance: Money,
    pub flood_insurance: Money,
    pub other: Money,
}

impl EditedAmounts {
    pub fn location_costs(&self) -> LocationCosts {
        LocationCosts {
            property_taxes: self.property_taxes,
            hoa: self.hoa,
            homeowners_insurance: self.homeowners_insurance,
            flood_insurance: self.flood_insurance,
            other: self.other,
        }
    }
}

impl EditedCosts {
    /// pre-fill the edit form from a breakdown
    pub fn from_breakdown(breakdown: &PaymentBreakdown) -> Self {
        Self {
            property_taxes: breakdown.property_taxes.to_string(),
            hoa: breakdown.hoa.to_string(),
            pmi: breakdown.pmi.to_string(),
            homeowners_insurance: breakdown.homeowners_insurance.to_string(),
            flood_insurance: breakdown.flood_insurance.to_string(),
            other: breakdown.other.to_string(),
        }
    }

    /// Empty or unparseable fields count as zero, as do negative ones.
    /// A number above [`Money::MAX_INPUT`] is rejected.
    pub fn amounts(&self) -> Result<EditedAmounts> {
        Ok(EditedAmounts {
            property_taxes: edited_amount("propertyTaxes", &self.property_taxes)?,
            hoa: edited_amount("hoa", &self.hoa)?,
            pmi: edited_amount("pmi", &self.pmi)?,
            homeowners_insurance: edited_amount("homeownersInsurance", &self.homeowners_insurance)?,
            flood_insurance: edited_amount("floodInsurance", &self.flood_insurance)?,
            other: edited_amount("other", &self.other)?,
        })
    }
}

fn edited_amount(field: &str, raw: &str) -> Result<Money> {
    let amount = Money::parse_or_zero(raw).non_negative();
    if amount.exceeds_input_limit() {
        return Err(EstimatorError::invalid_input(
            field,
            format!("amount exceeds {}", Money::MAX_INPUT),
        ));
    }
    Ok(amount)
}

/// live total while a saved calculation is being edited
pub fn recompute_total(fixed: FixedComponents, edited: &EditedCosts) -> Result<Money> {
    let amounts = edited.amounts()?;
    let pi = PrincipalInterestPmi {
        principal: fixed.principal,
        interest: fixed.interest,
        pmi: amounts.pmi,
    };
    Ok(assemble_breakdown(&pi, &amounts.location_costs()).total_monthly_payment())
}

/// annual rate implied by the first month's interest, for display only
pub fn effective_annual_rate(
    monthly_interest: Money,
    asking_price: Money,
    down_payment_snapshot: Option<Money>,
) -> Decimal {
    let loan_amount = asking_price - down_payment_snapshot.unwrap_or(Money::ZERO);
    if !loan_amount.is_positive() {
        return Decimal::new(0, 2);
    }

    let rate = monthly_interest.as_decimal() * Decimal::from(12) * Decimal::ONE_HUNDRED
        / loan_amount.as_decimal();
    let mut rounded = rate.round_dp_with_strategy(2, RoundingStrategy::MidpointAwayFromZero);
    rounded.rescale(2);
    rounded
}

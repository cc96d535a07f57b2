use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::decimal::Money;
use crate::editing::{effective_annual_rate, EditedCosts, FixedComponents};
use crate::errors::{EstimatorError, Result};
use crate::estimation::LocationCosts;
use crate::payments::{pmi_applies, LoanTerms, PrincipalInterestPmi};

/// monthly payment breakdown
///
/// The total is private: the only way to obtain a breakdown is through
/// [`assemble_breakdown`], so the total always equals the sum of the eight
/// components to the cent.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PaymentBreakdown {
    pub principal: Money,
    pub interest: Money,
    pub property_taxes: Money,
    pub hoa: Money,
    pub pmi: Money,
    pub homeowners_insurance: Money,
    pub flood_insurance: Money,
    pub other: Money,
    total_monthly_payment: Money,
}

/// combine the amortization and location phases into a breakdown
pub fn assemble_breakdown(pi: &PrincipalInterestPmi, costs: &LocationCosts) -> PaymentBreakdown {
    let mut breakdown = PaymentBreakdown {
        principal: pi.principal.bounded(),
        interest: pi.interest.bounded(),
        property_taxes: costs.property_taxes.bounded(),
        hoa: costs.hoa.bounded(),
        pmi: pi.pmi.bounded(),
        homeowners_insurance: costs.homeowners_insurance.bounded(),
        flood_insurance: costs.flood_insurance.bounded(),
        other: costs.other.bounded(),
        total_monthly_payment: Money::ZERO,
    };
    // eight bounded components cannot overflow
    breakdown.total_monthly_payment = breakdown.components().iter().map(|(_, m)| *m).sum();
    breakdown
}

impl PaymentBreakdown {
    pub fn total_monthly_payment(&self) -> Money {
        self.total_monthly_payment
    }

    /// the eight summed components, in display order
    pub fn components(&self) -> [(&'static str, Money); 8] {
        [
            ("principal", self.principal),
            ("interest", self.interest),
            ("propertyTaxes", self.property_taxes),
            ("hoa", self.hoa),
            ("pmi", self.pmi),
            ("homeownersInsurance", self.homeowners_insurance),
            ("floodInsurance", self.flood_insurance),
            ("other", self.other),
        ]
    }

    /// principal and interest are never user-editable
    pub fn fixed_components(&self) -> FixedComponents {
        FixedComponents {
            principal: self.principal,
            interest: self.interest,
        }
    }

    pub fn location_costs(&self) -> LocationCosts {
        LocationCosts {
            property_taxes: self.property_taxes,
            hoa: self.hoa,
            homeowners_insurance: self.homeowners_insurance,
            flood_insurance: self.flood_insurance,
            other: self.other,
        }
    }

    /// re-run the assembler over user edits; principal and interest are kept
    pub fn with_edits(&self, edited: &EditedCosts) -> Result<PaymentBreakdown> {
        let amounts = edited.amounts()?;
        let pi = PrincipalInterestPmi {
            principal: self.principal,
            interest: self.interest,
            pmi: amounts.pmi,
        };
        Ok(assemble_breakdown(&pi, &amounts.location_costs()))
    }

    /// storage view with every amount as a 2-place decimal string
    pub fn to_record(&self) -> BreakdownRecord {
        BreakdownRecord {
            principal: self.principal.to_string(),
            interest: self.interest.to_string(),
            property_taxes: self.property_taxes.to_string(),
            hoa: self.hoa.to_string(),
            pmi: self.pmi.to_string(),
            homeowners_insurance: self.homeowners_insurance.to_string(),
            flood_insurance: self.flood_insurance.to_string(),
            other: self.other.to_string(),
            total_monthly_payment: self.total_monthly_payment.to_string(),
        }
    }

    /// Rebuild from a stored record. The stored total is ignored and
    /// recomputed; malformed amounts are rejected.
    pub fn from_record(record: &BreakdownRecord) -> Result<Self> {
        let amount = |field: &str, raw: &str| -> Result<Money> {
            let money = Money::from_str_rounded(raw).map_err(|_| {
                EstimatorError::invalid_input(field, format!("'{}' is not a valid amount", raw))
            })?;
            if money.is_negative() {
                return Err(EstimatorError::invalid_input(field, "amount cannot be negative"));
            }
            if money.exceeds_input_limit() {
                return Err(EstimatorError::invalid_input(
                    field,
                    format!("amount exceeds {}", Money::MAX_INPUT),
                ));
            }
            Ok(money)
        };

        let pi = PrincipalInterestPmi {
            principal: amount("principal", &record.principal)?,
            interest: amount("interest", &record.interest)?,
            pmi: amount("pmi", &record.pmi)?,
        };
        let costs = LocationCosts {
            property_taxes: amount("propertyTaxes", &record.property_taxes)?,
            hoa: amount("hoa", &record.hoa)?,
            homeowners_insurance: amount("homeownersInsurance", &record.homeowners_insurance)?,
            flood_insurance: amount("floodInsurance", &record.flood_insurance)?,
            other: amount("other", &record.other)?,
        };

        Ok(assemble_breakdown(&pi, &costs))
    }
}

/// breakdown as handed to the persistence and display layers
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BreakdownRecord {
    pub principal: String,
    pub interest: String,
    pub property_taxes: String,
    pub hoa: String,
    pub pmi: String,
    pub homeowners_insurance: String,
    pub flood_insurance: String,
    pub other: String,
    pub total_monthly_payment: String,
}

/// display-only facts shown next to a breakdown; never persisted
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BreakdownSummary {
    pub asking_price: Money,
    pub down_payment: Money,
    pub loan_amount: Money,
    pub down_payment_percent: Decimal,
    pub effective_annual_rate: Decimal,
    pub term_months: u32,
    pub pmi_applies: bool,
    pub total_monthly_payment: Money,
}

impl BreakdownSummary {
    pub fn new(terms: &LoanTerms, breakdown: &PaymentBreakdown) -> Self {
        Self {
            asking_price: terms.asking_price,
            down_payment: terms.down_payment,
            loan_amount: terms.loan_amount,
            down_payment_percent: terms.down_payment_percent.round_dp(2),
            effective_annual_rate: effective_annual_rate(
                breakdown.interest,
                terms.asking_price,
                Some(terms.down_payment),
            ),
            term_months: terms.term_months,
            pmi_applies: pmi_applies(terms.down_payment_percent),
            total_monthly_payment: breakdown.total_monthly_payment(),
        }
    }
}

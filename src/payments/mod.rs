pub mod amortization;
pub mod pmi;

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::decimal::{Money, Rate};
use crate::errors::{EstimatorError, Result};
use crate::types::{BorrowerProfile, MortgageType};

pub use amortization::{
    monthly_payment, rate_for_credit_score, term_months, AmortizationSchedule, ScheduledPayment,
    DEFAULT_CREDIT_SCORE,
};
pub use pmi::{monthly_pmi, pmi_applies};

/// first-month principal, interest and PMI
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PrincipalInterestPmi {
    pub principal: Money,
    pub interest: Money,
    pub pmi: Money,
}

/// loan terms derived from price and profile
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LoanTerms {
    pub asking_price: Money,
    pub down_payment: Money,
    pub loan_amount: Money,
    pub down_payment_percent: Decimal,
    pub credit_score: u32,
    pub annual_rate: Rate,
    pub term_months: u32,
}

impl LoanTerms {
    /// derive terms, applying the default credit score and 30-year term
    pub fn derive(
        asking_price: Money,
        down_payment: Option<Money>,
        credit_score: Option<u32>,
        mortgage_type: Option<&MortgageType>,
    ) -> Result<Self> {
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

        let down_payment = down_payment.unwrap_or(Money::ZERO);
        if down_payment.is_negative() {
            return Err(EstimatorError::invalid_input(
                "downPayment",
                format!("cannot be negative, got {}", down_payment),
            ));
        }

        let loan_amount = asking_price - down_payment;
        if !loan_amount.is_positive() {
            return Err(EstimatorError::invalid_input(
                "downPayment",
                format!(
                    "down payment {} leaves nothing to finance on {}",
                    down_payment, asking_price
                ),
            ));
        }

        let credit_score = credit_score.unwrap_or(DEFAULT_CREDIT_SCORE);

        Ok(Self {
            asking_price,
            down_payment,
            loan_amount,
            down_payment_percent: down_payment.percent_of(asking_price),
            credit_score,
            annual_rate: rate_for_credit_score(credit_score),
            term_months: term_months(mortgage_type),
        })
    }

    /// derive terms from a property price and a profile snapshot
    pub fn from_profile(asking_price: Money, profile: &BorrowerProfile) -> Result<Self> {
        Self::derive(
            asking_price,
            profile.down_payment,
            profile.credit_score,
            profile.mortgage_type.as_ref(),
        )
    }

    /// first month's principal/interest split plus PMI
    pub fn first_month(&self) -> Result<PrincipalInterestPmi> {
        let payment = monthly_payment(self.loan_amount, self.annual_rate, self.term_months)?;
        let (interest, principal) =
            amortization::split_payment(self.loan_amount, self.annual_rate.monthly_rate(), payment);
        let pmi = monthly_pmi(self.loan_amount, self.down_payment_percent)?;

        Ok(PrincipalInterestPmi {
            principal,
            interest,
            pmi,
        })
    }

    /// full schedule for display
    pub fn schedule(&self) -> Result<AmortizationSchedule> {
        AmortizationSchedule::generate(self.loan_amount, self.annual_rate, self.term_months)
    }
}

/// deterministic phase of an estimate; pure, same inputs give same outputs
pub fn compute_principal_interest_pmi(
    asking_price: Money,
    down_payment: Option<Money>,
    credit_score: Option<u32>,
    mortgage_type: Option<&MortgageType>,
) -> Result<PrincipalInterestPmi> {
    LoanTerms::derive(asking_price, down_payment, credit_score, mortgage_type)?.first_month()
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn test_reference_thirty_year_example() {
        let terms = LoanTerms::derive(
            Money::from_major(300_000),
            Some(Money::from_major(30_000)),
            Some(760),
            Some(&MortgageType::ThirtyYearFixed),
        )
        .unwrap();

        assert_eq!(terms.loan_amount, Money::from_major(270_000));
        assert_eq!(terms.down_payment_percent, dec!(10));
        assert_eq!(terms.annual_rate, Rate::from_percent(dec!(6.25)));
        assert_eq!(terms.term_months, 360);

        let result = terms.first_month().unwrap();
        assert_eq!(result.interest, Money::from_cents(140_625));
        assert_eq!(result.principal, Money::from_cents(25_619));
        assert_eq!(result.pmi, Money::from_cents(18_000));
    }

    #[test]
    fn test_twenty_percent_down_has_no_pmi() {
        let result = compute_principal_interest_pmi(
            Money::from_major(300_000),
            Some(Money::from_major(60_000)),
            Some(760),
            Some(&MortgageType::ThirtyYearFixed),
        )
        .unwrap();

        assert_eq!(result.pmi, Money::ZERO);
        assert_eq!(result.interest, Money::from_major(1_250));
    }

    #[test]
    fn test_missing_down_payment_is_not_charged_pmi() {
        let result = compute_principal_interest_pmi(Money::from_major(300_000), None, None, None).unwrap();
        assert_eq!(result.pmi, Money::ZERO);
        assert!(result.principal.is_positive());
    }

    #[test]
    fn test_small_down_payment_is_charged_pmi() {
        let result = compute_principal_interest_pmi(
            Money::from_major(300_000),
            Some(Money::from_major(3_000)),
            None,
            None,
        )
        .unwrap();
        assert!(result.pmi.is_positive());
    }

    #[test]
    fn test_defaults_to_720_and_thirty_years() {
        let terms = LoanTerms::derive(Money::from_major(300_000), None, None, None).unwrap();
        assert_eq!(terms.credit_score, DEFAULT_CREDIT_SCORE);
        assert_eq!(terms.annual_rate, Rate::from_percent(dec!(6.50)));
        assert_eq!(terms.term_months, 360);
    }

    #[test]
    fn test_fifteen_year_example() {
        let result = compute_principal_interest_pmi(
            Money::from_major(300_000),
            Some(Money::from_major(30_000)),
            Some(800),
            Some(&MortgageType::FifteenYearFixed),
        )
        .unwrap();

        assert_eq!(result.interest, Money::from_major(1_350));
        assert_eq!(result.principal, Money::from_cents(92_841));
    }

    #[test]
    fn test_rejects_bad_price_and_over_sized_down_payment() {
        assert!(compute_principal_interest_pmi(Money::ZERO, None, None, None).is_err());
        assert!(compute_principal_interest_pmi(Money::from_major(-1), None, None, None).is_err());

        let err = compute_principal_interest_pmi(
            Money::from_major(300_000),
            Some(Money::from_major(300_000)),
            None,
            None,
        )
        .unwrap_err();
        assert!(matches!(err, EstimatorError::InvalidInput { ref field, .. } if field == "downPayment"));

        let huge = Money::from_str_rounded("70000000000000000000000000000").unwrap();
        let err = compute_principal_interest_pmi(huge, None, None, None).unwrap_err();
        assert!(matches!(err, EstimatorError::InvalidInput { ref field, .. } if field == "askingPrice"));
    }

    #[test]
    fn test_is_idempotent() {
        let run = || {
            compute_principal_interest_pmi(
                Money::from_major(412_500),
                Some(Money::from_cents(2_062_550)),
                Some(701),
                Some(&MortgageType::Arm),
            )
            .unwrap()
        };
        assert_eq!(run(), run());
    }

    #[test]
    fn test_schedule_agrees_with_first_month() {
        let terms = LoanTerms::derive(
            Money::from_major(450_000),
            Some(Money::from_major(45_000)),
            Some(690),
            None,
        )
        .unwrap();

        let first = terms.first_month().unwrap();
        let schedule = terms.schedule().unwrap();
        let row = schedule.get_payment(1).unwrap();
        assert_eq!(row.interest_portion, first.interest);
        assert_eq!(row.principal_portion, first.principal);
    }
}

use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};

use crate::decimal::{Money, Rate};
use crate::errors::{EstimatorError, Result};
use crate::types::MortgageType;

/// credit score assumed when the profile has none
pub const DEFAULT_CREDIT_SCORE: u32 = 720;

/// annual rate tiers, highest score floor first
const RATE_TIERS: [(u32, Decimal); 4] = [
    (780, dec!(6.00)),
    (740, dec!(6.25)),
    (700, dec!(6.50)),
    (660, dec!(7.00)),
];
const FLOOR_RATE: Decimal = dec!(7.50);

/// annual interest rate for a credit score
pub fn rate_for_credit_score(credit_score: u32) -> Rate {
    let percent = RATE_TIERS
        .iter()
        .find(|(floor, _)| credit_score >= *floor)
        .map(|(_, rate)| *rate)
        .unwrap_or(FLOOR_RATE);
    Rate::from_percent(percent)
}

/// loan term in months; any product labelled with "15" is a 15-year loan
pub fn term_months(mortgage_type: Option<&MortgageType>) -> u32 {
    let years = match mortgage_type {
        Some(kind) if kind.label().contains("15") => 15,
        _ => 30,
    };
    years * 12
}

/// unrounded fixed monthly payment
///
/// `M = L * r * (1 + r)^n / ((1 + r)^n - 1)`, or `L / n` when `r` is zero.
pub fn monthly_payment(loan_amount: Money, annual_rate: Rate, months: u32) -> Result<Decimal> {
    if !loan_amount.is_positive() {
        return Err(EstimatorError::invalid_input(
            "loanAmount",
            format!("loan amount must be greater than zero, got {}", loan_amount),
        ));
    }
    if months == 0 {
        return Err(EstimatorError::invalid_input("term", "term must be at least one month"));
    }

    let principal = loan_amount.as_decimal();
    let r = annual_rate.monthly_rate().as_decimal();

    if r.is_zero() {
        return Ok(principal / Decimal::from(months));
    }

    let compound = compound_factor(r, months);
    let numerator = principal * r * compound;
    let denominator = compound - Decimal::ONE;

    Ok(numerator / denominator)
}

/// (1 + r)^n by repeated multiplication
fn compound_factor(r: Decimal, n: u32) -> Decimal {
    let base = Decimal::ONE + r;
    let mut compound = Decimal::ONE;
    for _ in 0..n {
        compound *= base;
    }
    compound
}

/// interest and principal for one month, each rounded from unrounded figures
pub(crate) fn split_payment(balance: Money, monthly_rate: Rate, payment: Decimal) -> (Money, Money) {
    let interest = balance.as_decimal() * monthly_rate.as_decimal();
    let principal = payment - interest;
    (Money::from_decimal(interest), Money::from_decimal(principal))
}

/// scheduled payment in amortization schedule
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScheduledPayment {
    pub payment_number: u32,
    pub beginning_balance: Money,
    pub payment_amount: Money,
    pub principal_portion: Money,
    pub interest_portion: Money,
    pub ending_balance: Money,
    pub cumulative_interest: Money,
}

/// equal-installment amortization schedule
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AmortizationSchedule {
    pub loan_amount: Money,
    pub annual_rate: Rate,
    pub term_months: u32,
    pub monthly_payment: Money,
    pub payments: Vec<ScheduledPayment>,
    pub total_interest: Money,
    pub total_paid: Money,
}

impl AmortizationSchedule {
    /// generate the month-by-month schedule
    pub fn generate(loan_amount: Money, annual_rate: Rate, term_months: u32) -> Result<Self> {
        let raw_payment = monthly_payment(loan_amount, annual_rate, term_months)?;
        let monthly_rate = annual_rate.monthly_rate();

        let mut payments = Vec::with_capacity(term_months as usize);
        let mut balance = loan_amount;
        let mut cumulative_interest = Money::ZERO;

        for i in 1..=term_months {
            let (interest_portion, scheduled_principal) =
                split_payment(balance, monthly_rate, raw_payment);
            let principal_portion = scheduled_principal.min(balance);

            cumulative_interest += interest_portion;
            let ending_balance = (balance - principal_portion).non_negative();

            payments.push(ScheduledPayment {
                payment_number: i,
                beginning_balance: balance,
                payment_amount: interest_portion + principal_portion,
                principal_portion,
                interest_portion,
                ending_balance,
                cumulative_interest,
            });

            balance = ending_balance;
        }

        // last payment absorbs whatever rounding left on the balance
        if let Some(last) = payments.last_mut() {
            if last.ending_balance.is_positive() {
                last.principal_portion += last.ending_balance;
                last.payment_amount += last.ending_balance;
                last.ending_balance = Money::ZERO;
            }
        }

        let total_interest = payments.iter().map(|p| p.interest_portion).sum();
        let total_paid = payments.iter().map(|p| p.payment_amount).sum();

        Ok(Self {
            loan_amount,
            annual_rate,
            term_months,
            monthly_payment: Money::from_decimal(raw_payment),
            payments,
            total_interest,
            total_paid,
        })
    }

    /// get payment for specific period (1-based)
    pub fn get_payment(&self, payment_number: u32) -> Option<&ScheduledPayment> {
        payment_number
            .checked_sub(1)
            .and_then(|idx| self.payments.get(idx as usize))
    }

    /// remaining balance after a given payment
    pub fn balance_after_payment(&self, payment_number: u32) -> Money {
        self.get_payment(payment_number)
            .map(|p| p.ending_balance)
            .unwrap_or(self.loan_amount)
    }
}

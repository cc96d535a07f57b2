use rust_decimal::Decimal;
use rust_decimal_macros::dec;

use crate::decimal::{Money, Rate};
use crate::errors::{EstimatorError, Result};

/// down payment share at or above which no PMI is charged
pub const PMI_FREE_DOWN_PAYMENT_PERCENT: Decimal = dec!(20);

/// annual PMI as a share of the loan amount (0.8%)
pub fn pmi_annual_rate() -> Rate {
    Rate::from_bps(80)
}

/// PMI applies only for a known, partial down payment under 20%.
/// A zero percentage means "no down payment given" and is not charged.
pub fn pmi_applies(down_payment_percent: Decimal) -> bool {
    down_payment_percent > Decimal::ZERO && down_payment_percent < PMI_FREE_DOWN_PAYMENT_PERCENT
}

/// monthly PMI premium
pub fn monthly_pmi(loan_amount: Money, down_payment_percent: Decimal) -> Result<Money> {
    if !pmi_applies(down_payment_percent) {
        return Ok(Money::ZERO);
    }
    if !loan_amount.is_positive() {
        return Err(EstimatorError::invalid_input(
            "loanAmount",
            format!("cannot price PMI on a loan of {}", loan_amount),
        ));
    }

    Ok(loan_amount.monthly_share_of_annual(pmi_annual_rate()))
}

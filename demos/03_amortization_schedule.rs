/// amortization schedule - first-month split and the full schedule
use mortgage_estimator_rs::payments::rate_for_credit_score;
use mortgage_estimator_rs::{compute_principal_interest_pmi, LoanTerms, Money, MortgageType};

fn main() -> Result<(), Box<dyn std::error::Error>> {
    println!("=== rate tiers ===");
    for score in [780, 760, 740, 720, 700, 680, 640] {
        println!("  credit {} -> {}", score, rate_for_credit_score(score));
    }

    let pi = compute_principal_interest_pmi(
        Money::from_major(300_000),
        Some(Money::from_major(30_000)),
        Some(760),
        Some(&MortgageType::ThirtyYearFixed),
    )?;
    println!("\nfirst month: principal ${} interest ${} pmi ${}", pi.principal, pi.interest, pi.pmi);

    let terms = LoanTerms::derive(
        Money::from_major(300_000),
        Some(Money::from_major(60_000)),
        Some(760),
        Some(&MortgageType::FifteenYearFixed),
    )?;
    let schedule = terms.schedule()?;

    println!(
        "\n{} months at {} on ${}: payment ${}",
        schedule.term_months, schedule.annual_rate, schedule.loan_amount, schedule.monthly_payment
    );
    println!("{:>5} {:>12} {:>10} {:>10} {:>12}", "month", "begin", "principal", "interest", "end");
    for payment in schedule.payments.iter().filter(|p| p.payment_number <= 3 || p.payment_number % 60 == 0) {
        println!(
            "{:>5} {:>12} {:>10} {:>10} {:>12}",
            payment.payment_number,
            payment.beginning_balance,
            payment.principal_portion,
            payment.interest_portion,
            payment.ending_balance
        );
    }
    println!("total interest ${}, total paid ${}", schedule.total_interest, schedule.total_paid);

    Ok(())
}

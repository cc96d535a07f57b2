use chrono::{DateTime, Utc};
use hourglass_rs::SafeTimeProvider;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::breakdown::{BreakdownRecord, BreakdownSummary, PaymentBreakdown};
use crate::decimal::Money;
use crate::editing::{effective_annual_rate, EditedCosts};
use crate::errors::{EstimatorError, Result};
use crate::estimator::Estimate;
use crate::payments::LoanTerms;
use crate::types::{BorrowerProfile, CalculationId, MortgageType, OwnerId, PropertyInput};

/// a calculation the user chose to keep
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SavedCalculation {
    pub id: CalculationId,
    pub owner_id: OwnerId,
    pub property: PropertyInput,
    pub profile_snapshot: BorrowerProfile,
    pub breakdown: PaymentBreakdown,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl SavedCalculation {
    /// create from a completed estimate
    pub fn from_estimate(
        owner_id: impl Into<OwnerId>,
        estimate: &Estimate,
        time_provider: &SafeTimeProvider,
    ) -> Self {
        let now = time_provider.now();
        Self {
            id: Uuid::new_v4(),
            owner_id: owner_id.into(),
            property: estimate.property.clone(),
            profile_snapshot: estimate.profile_snapshot.clone(),
            breakdown: estimate.breakdown,
            created_at: now,
            updated_at: now,
        }
    }

    pub fn is_owned_by(&self, owner_id: &str) -> bool {
        self.owner_id == owner_id
    }

    pub fn total_monthly_payment(&self) -> Money {
        self.breakdown.total_monthly_payment()
    }

    /// apply user edits; the total is always recomputed here and nothing
    /// changes when an edit is rejected
    pub fn apply_edits(
        &mut self,
        edited: &EditedCosts,
        time_provider: &SafeTimeProvider,
    ) -> Result<()> {
        self.breakdown = self.breakdown.with_edits(edited)?;
        self.updated_at = time_provider.now();
        Ok(())
    }

    /// rate implied by the stored interest, shown on the edit page
    pub fn effective_annual_rate(&self) -> Decimal {
        effective_annual_rate(
            self.breakdown.interest,
            self.property.asking_price,
            self.profile_snapshot.down_payment,
        )
    }

    /// summary against terms re-derived from the snapshot
    pub fn summary(&self) -> Result<BreakdownSummary> {
        let terms = LoanTerms::from_profile(self.property.asking_price, &self.profile_snapshot)?;
        Ok(BreakdownSummary::new(&terms, &self.breakdown))
    }

    pub fn to_record(&self) -> SavedCalculationRecord {
        let profile = &self.profile_snapshot;
        SavedCalculationRecord {
            id: self.id,
            owner_id: self.owner_id.clone(),
            address: self.property.address.clone(),
            asking_price: self.property.asking_price.to_string(),
            photo_reference: self.property.photo_reference.clone(),
            breakdown: self.breakdown.to_record(),
            snapshot_age: profile.age,
            snapshot_annual_income: profile.annual_income.map(|m| m.to_string()),
            snapshot_credit_score: profile.credit_score,
            snapshot_down_payment: profile.down_payment.map(|m| m.to_string()),
            snapshot_mortgage_type: profile.mortgage_type.as_ref().map(|t| t.label().to_string()),
            snapshot_monthly_debt: profile.monthly_debt.map(|m| m.to_string()),
            snapshot_homestead_exemption: profile.homestead_exemption,
            created_at: self.created_at,
            updated_at: self.updated_at,
        }
    }

    /// rebuild from storage, re-deriving the total from the components
    pub fn from_record(record: &SavedCalculationRecord) -> Result<Self> {
        let property = PropertyInput::parse(
            &record.address,
            &record.asking_price,
            record.photo_reference.as_deref(),
        )?;

        let profile_snapshot = BorrowerProfile {
            age: record.snapshot_age,
            annual_income: optional_amount("snapshotAnnualIncome", &record.snapshot_annual_income)?,
            credit_score: record.snapshot_credit_score,
            down_payment: optional_amount("snapshotDownPayment", &record.snapshot_down_payment)?,
            mortgage_type: record
                .snapshot_mortgage_type
                .as_ref()
                .map(|label| MortgageType::from(label.clone())),
            monthly_debt: optional_amount("snapshotMonthlyDebt", &record.snapshot_monthly_debt)?,
            homestead_exemption: record.snapshot_homestead_exemption,
        };

        Ok(Self {
            id: record.id,
            owner_id: record.owner_id.clone(),
            property,
            profile_snapshot,
            breakdown: PaymentBreakdown::from_record(&record.breakdown)?,
            created_at: record.created_at,
            updated_at: record.updated_at,
        })
    }
}

fn optional_amount(field: &str, raw: &Option<String>) -> Result<Option<Money>> {
    raw.as_deref()
        .map(|s| {
            let money = Money::from_str_rounded(s).map_err(|_| {
                EstimatorError::invalid_input(field, format!("'{}' is not a valid amount", s))
            })?;
            if money.exceeds_input_limit() {
                return Err(EstimatorError::invalid_input(
                    field,
                    format!("amount exceeds {}", Money::MAX_INPUT),
                ));
            }
            Ok(money)
        })
        .transpose()
}

/// flat storage/display view of a saved calculation
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SavedCalculationRecord {
    pub id: CalculationId,
    pub owner_id: OwnerId,
    pub address: String,
    pub asking_price: String,
    pub photo_reference: Option<String>,
    #[serde(flatten)]
    pub breakdown: BreakdownRecord,
    pub snapshot_age: Option<u32>,
    pub snapshot_annual_income: Option<String>,
    pub snapshot_credit_score: Option<u32>,
    pub snapshot_down_payment: Option<String>,
    pub snapshot_mortgage_type: Option<String>,
    pub snapshot_monthly_debt: Option<String>,
    #[serde(default)]
    pub snapshot_homestead_exemption: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

use hourglass_rs::SafeTimeProvider;
use std::collections::HashMap;
use std::sync::{Mutex, RwLock};

use crate::calculation::SavedCalculation;
use crate::editing::EditedCosts;
use crate::errors::{EstimatorError, Result};
use crate::events::{CalculationEvent, EventStore};
use crate::types::CalculationId;

/// persistence for saved calculations, scoped by owner
pub trait CalculationStore: Send + Sync {
    fn create(&self, calculation: SavedCalculation) -> Result<SavedCalculation>;

    /// `CalculationNotFound` if absent, `Forbidden` if owned by someone else
    fn get(&self, id: CalculationId, owner_id: &str) -> Result<SavedCalculation>;

    /// newest first
    fn list_for_owner(&self, owner_id: &str) -> Result<Vec<SavedCalculation>>;

    /// re-assembles the breakdown from the edits; a client total is never trusted
    fn update(
        &self,
        id: CalculationId,
        owner_id: &str,
        edited: &EditedCosts,
        time_provider: &SafeTimeProvider,
    ) -> Result<SavedCalculation>;

    fn delete(
        &self,
        id: CalculationId,
        owner_id: &str,
        time_provider: &SafeTimeProvider,
    ) -> Result<()>;

    /// cascade when an owner account is removed; returns how many went
    fn delete_all_for_owner(&self, owner_id: &str, time_provider: &SafeTimeProvider)
        -> Result<usize>;
}

/// events kept before the oldest are discarded
pub const DEFAULT_EVENT_CAPACITY: usize = 1_024;

/// In-process store.
///
/// Events are buffered up to a fixed capacity; callers drain them with
/// [`InMemoryCalculationStore::take_events`], and the oldest are discarded
/// once the buffer is full.
#[derive(Debug)]
pub struct InMemoryCalculationStore {
    calculations: RwLock<HashMap<CalculationId, SavedCalculation>>,
    events: Mutex<EventStore>,
}

impl Default for InMemoryCalculationStore {
    fn default() -> Self {
        Self::with_event_capacity(DEFAULT_EVENT_CAPACITY)
    }
}

impl InMemoryCalculationStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_event_capacity(capacity: usize) -> Self {
        Self {
            calculations: RwLock::new(HashMap::new()),
            events: Mutex::new(EventStore::bounded(capacity)),
        }
    }

    pub fn len(&self) -> usize {
        self.calculations.read().map(|map| map.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// drain events recorded since the last call
    pub fn take_events(&self) -> Vec<CalculationEvent> {
        self.events
            .lock()
            .map(|mut events| events.take_events())
            .unwrap_or_default()
    }

    fn emit(&self, event: CalculationEvent) {
        if let Ok(mut events) = self.events.lock() {
            events.emit(event);
        }
    }
}

fn poisoned() -> EstimatorError {
    EstimatorError::Storage {
        message: "calculation store lock poisoned".to_string(),
    }
}

fn check_owner(calculation: &SavedCalculation, owner_id: &str) -> Result<()> {
    if calculation.is_owned_by(owner_id) {
        Ok(())
    } else {
        Err(EstimatorError::Forbidden { id: calculation.id })
    }
}

impl CalculationStore for InMemoryCalculationStore {
    fn create(&self, calculation: SavedCalculation) -> Result<SavedCalculation> {
        let mut map = self.calculations.write().map_err(|_| poisoned())?;
        map.insert(calculation.id, calculation.clone());
        drop(map);

        self.emit(CalculationEvent::CalculationCreated {
            calculation_id: calculation.id,
            owner_id: calculation.owner_id.clone(),
            total_monthly_payment: calculation.total_monthly_payment(),
            timestamp: calculation.created_at,
        });
        tracing::info!(id = %calculation.id, owner = %calculation.owner_id, "calculation saved");

        Ok(calculation)
    }

    fn get(&self, id: CalculationId, owner_id: &str) -> Result<SavedCalculation> {
        let map = self.calculations.read().map_err(|_| poisoned())?;
        let calculation = map
            .get(&id)
            .ok_or(EstimatorError::CalculationNotFound { id })?;
        check_owner(calculation, owner_id)?;
        Ok(calculation.clone())
    }

    fn list_for_owner(&self, owner_id: &str) -> Result<Vec<SavedCalculation>> {
        let map = self.calculations.read().map_err(|_| poisoned())?;
        let mut owned: Vec<SavedCalculation> = map
            .values()
            .filter(|c| c.is_owned_by(owner_id))
            .cloned()
            .collect();
        owned.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(owned)
    }

    fn update(
        &self,
        id: CalculationId,
        owner_id: &str,
        edited: &EditedCosts,
        time_provider: &SafeTimeProvider,
    ) -> Result<SavedCalculation> {
        // rejected input never reaches the lock
        edited.amounts()?;

        let mut map = self.calculations.write().map_err(|_| poisoned())?;
        let calculation = map
            .get_mut(&id)
            .ok_or(EstimatorError::CalculationNotFound { id })?;
        check_owner(calculation, owner_id)?;

        let old_total = calculation.total_monthly_payment();
        calculation.apply_edits(edited, time_provider)?;
        let updated = calculation.clone();
        drop(map);

        self.emit(CalculationEvent::CalculationUpdated {
            calculation_id: id,
            owner_id: updated.owner_id.clone(),
            old_total,
            new_total: updated.total_monthly_payment(),
            timestamp: updated.updated_at,
        });
        tracing::info!(
            %id,
            old_total = %old_total,
            new_total = %updated.total_monthly_payment(),
            "calculation updated"
        );

        Ok(updated)
    }

    fn delete(
        &self,
        id: CalculationId,
        owner_id: &str,
        time_provider: &SafeTimeProvider,
    ) -> Result<()> {
        let mut map = self.calculations.write().map_err(|_| poisoned())?;
        let calculation = map
            .get(&id)
            .ok_or(EstimatorError::CalculationNotFound { id })?;
        check_owner(calculation, owner_id)?;
        map.remove(&id);
        drop(map);

        self.emit(CalculationEvent::CalculationDeleted {
            calculation_id: id,
            owner_id: owner_id.to_string(),
            timestamp: time_provider.now(),
        });
        tracing::info!(%id, "calculation deleted");

        Ok(())
    }

    fn delete_all_for_owner(
        &self,
        owner_id: &str,
        time_provider: &SafeTimeProvider,
    ) -> Result<usize> {
        let mut map = self.calculations.write().map_err(|_| poisoned())?;
        let before = map.len();
        map.retain(|_, c| !c.is_owned_by(owner_id));
        let removed = before - map.len();
        drop(map);

        self.emit(CalculationEvent::OwnerCalculationsPurged {
            owner_id: owner_id.to_string(),
            removed,
            timestamp: time_provider.now(),
        });
        tracing::info!(owner = %owner_id, removed, "owner calculations purged");

        Ok(removed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::breakdown::assemble_breakdown;
    use crate::decimal::Money;
    use crate::estimation::LocationCosts;
    use crate::estimator::Estimate;
    use crate::payments::LoanTerms;
    use crate::types::{BorrowerProfile, PropertyInput};
    use chrono::{Duration, TimeZone, Utc};
    use hourglass_rs::TimeSource;
    use uuid::Uuid;

    fn estimate(price: i64) -> Estimate {
        let property =
            PropertyInput::new("7 Bay Rd, Tampa, FL 33602", Money::from_major(price), None)
                .unwrap();
        let profile = BorrowerProfile {
            down_payment: Some(Money::from_major(price / 5)),
            ..Default::default()
        };
        let terms = LoanTerms::from_profile(property.asking_price, &profile).unwrap();
        let pi = terms.first_month().unwrap();
        let costs = LocationCosts {
            property_taxes: Money::from_major(200),
            hoa: Money::ZERO,
            homeowners_insurance: Money::from_major(150),
            flood_insurance: Money::from_major(40),
            other: Money::from_major(50),
        };
        Estimate {
            property,
            profile_snapshot: profile,
            terms,
            breakdown: assemble_breakdown(&pi, &costs),
            estimator: "heuristic",
        }
    }

    fn time() -> SafeTimeProvider {
        SafeTimeProvider::new(TimeSource::Test(
            Utc.with_ymd_and_hms(2024, 5, 1, 12, 0, 0).unwrap(),
        ))
    }

    #[test]
    fn test_get_checks_ownership() {
        let time = time();
        let store = InMemoryCalculationStore::new();
        let saved = store
            .create(SavedCalculation::from_estimate("alice", &estimate(250_000), &time))
            .unwrap();

        assert_eq!(store.get(saved.id, "alice").unwrap(), saved);
        assert!(matches!(
            store.get(saved.id, "bob"),
            Err(EstimatorError::Forbidden { .. })
        ));
        assert!(matches!(
            store.get(Uuid::new_v4(), "alice"),
            Err(EstimatorError::CalculationNotFound { .. })
        ));
    }

    #[test]
    fn test_list_is_newest_first_and_scoped() {
        let time = time();
        let control = time.test_control().unwrap();
        let store = InMemoryCalculationStore::new();

        let first = store
            .create(SavedCalculation::from_estimate("alice", &estimate(200_000), &time))
            .unwrap();
        control.advance(Duration::minutes(5));
        let second = store
            .create(SavedCalculation::from_estimate("alice", &estimate(300_000), &time))
            .unwrap();
        store
            .create(SavedCalculation::from_estimate("bob", &estimate(400_000), &time))
            .unwrap();

        let listed: Vec<_> = store
            .list_for_owner("alice")
            .unwrap()
            .into_iter()
            .map(|c| c.id)
            .collect();
        assert_eq!(listed, vec![second.id, first.id]);
    }

    #[test]
    fn test_update_recomputes_total_and_records_event() {
        let time = time();
        let control = time.test_control().unwrap();
        let store = InMemoryCalculationStore::new();
        let saved = store
            .create(SavedCalculation::from_estimate("alice", &estimate(250_000), &time))
            .unwrap();
        store.take_events();

        control.advance(Duration::days(1));
        let edited = EditedCosts {
            property_taxes: "0".to_string(),
            hoa: "0".to_string(),
            pmi: "0".to_string(),
            homeowners_insurance: "0".to_string(),
            flood_insurance: "0".to_string(),
            other: "0".to_string(),
        };
        let updated = store.update(saved.id, "alice", &edited, &time).unwrap();

        let fixed = saved.breakdown.principal + saved.breakdown.interest;
        assert_eq!(updated.total_monthly_payment(), fixed);
        assert_eq!(updated.updated_at - saved.updated_at, Duration::days(1));
        assert_eq!(store.get(saved.id, "alice").unwrap(), updated);

        let events = store.take_events();
        assert_eq!(events.len(), 1);
        assert!(matches!(
            &events[0],
            CalculationEvent::CalculationUpdated { new_total, .. } if *new_total == fixed
        ));
    }

    #[test]
    fn test_update_rejects_other_owner() {
        let time = time();
        let store = InMemoryCalculationStore::new();
        let saved = store
            .create(SavedCalculation::from_estimate("alice", &estimate(250_000), &time))
            .unwrap();

        let result = store.update(saved.id, "mallory", &EditedCosts::default(), &time);
        assert!(matches!(result, Err(EstimatorError::Forbidden { .. })));
        assert_eq!(store.get(saved.id, "alice").unwrap(), saved);
    }

    #[test]
    fn test_delete_and_cascade() {
        let time = time();
        let store = InMemoryCalculationStore::new();
        let mine = store
            .create(SavedCalculation::from_estimate("alice", &estimate(250_000), &time))
            .unwrap();
        store
            .create(SavedCalculation::from_estimate("alice", &estimate(260_000), &time))
            .unwrap();
        store
            .create(SavedCalculation::from_estimate("bob", &estimate(270_000), &time))
            .unwrap();

        assert!(matches!(
            store.delete(mine.id, "bob", &time),
            Err(EstimatorError::Forbidden { .. })
        ));
        store.delete(mine.id, "alice", &time).unwrap();
        assert!(matches!(
            store.get(mine.id, "alice"),
            Err(EstimatorError::CalculationNotFound { .. })
        ));

        assert_eq!(store.delete_all_for_owner("alice", &time).unwrap(), 1);
        assert!(store.list_for_owner("alice").unwrap().is_empty());
        assert_eq!(store.len(), 1);

        let events = store.take_events();
        assert!(events
            .iter()
            .any(|e| matches!(e, CalculationEvent::OwnerCalculationsPurged { removed: 1, .. })));
    }

    #[test]
    fn test_huge_edit_is_rejected_and_store_stays_usable() {
        let time = time();
        let store = InMemoryCalculationStore::new();
        let mine = store
            .create(SavedCalculation::from_estimate("alice", &estimate(250_000), &time))
            .unwrap();
        let theirs = store
            .create(SavedCalculation::from_estimate("bob", &estimate(300_000), &time))
            .unwrap();
        store.take_events();

        let huge = "70000000000000000000000000000".to_string();
        let edited = EditedCosts {
            property_taxes: huge.clone(),
            hoa: huge.clone(),
            pmi: huge.clone(),
            homeowners_insurance: huge.clone(),
            flood_insurance: huge.clone(),
            other: huge,
        };
        assert!(matches!(
            store.update(mine.id, "alice", &edited, &time),
            Err(EstimatorError::InvalidInput { .. })
        ));

        assert_eq!(store.get(mine.id, "alice").unwrap(), mine);
        assert_eq!(store.get(theirs.id, "bob").unwrap(), theirs);
        assert_eq!(store.list_for_owner("alice").unwrap().len(), 1);
        assert!(store.take_events().is_empty());
        store
            .create(SavedCalculation::from_estimate("alice", &estimate(200_000), &time))
            .unwrap();
    }

    #[test]
    fn test_event_buffer_keeps_newest() {
        let time = time();
        let store = InMemoryCalculationStore::with_event_capacity(2);
        let ids: Vec<_> = (0..3)
            .map(|i| {
                store
                    .create(SavedCalculation::from_estimate(
                        "alice",
                        &estimate(200_000 + i * 10_000),
                        &time,
                    ))
                    .unwrap()
                    .id
            })
            .collect();

        let events = store.take_events();
        assert_eq!(events.len(), 2);
        assert!(matches!(
            &events[0],
            CalculationEvent::CalculationCreated { calculation_id, .. } if *calculation_id == ids[1]
        ));
    }
}

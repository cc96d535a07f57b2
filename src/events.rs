use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::decimal::Money;
use crate::types::{CalculationId, OwnerId};

/// events emitted as saved calculations change
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum CalculationEvent {
    CalculationCreated {
        calculation_id: CalculationId,
        owner_id: OwnerId,
        total_monthly_payment: Money,
        timestamp: DateTime<Utc>,
    },
    CalculationUpdated {
        calculation_id: CalculationId,
        owner_id: OwnerId,
        old_total: Money,
        new_total: Money,
        timestamp: DateTime<Utc>,
    },
    CalculationDeleted {
        calculation_id: CalculationId,
        owner_id: OwnerId,
        timestamp: DateTime<Utc>,
    },
    /// cascade after the owning account was removed
    OwnerCalculationsPurged {
        owner_id: OwnerId,
        removed: usize,
        timestamp: DateTime<Utc>,
    },
}

impl CalculationEvent {
    pub fn timestamp(&self) -> DateTime<Utc> {
        match self {
            CalculationEvent::CalculationCreated { timestamp, .. }
            | CalculationEvent::CalculationUpdated { timestamp, .. }
            | CalculationEvent::CalculationDeleted { timestamp, .. }
            | CalculationEvent::OwnerCalculationsPurged { timestamp, .. } => *timestamp,
        }
    }
}

/// event store for collecting events during operations
#[derive(Debug, Default)]
pub struct EventStore {
    events: Vec<CalculationEvent>,
    capacity: Option<usize>,
    discarded: usize,
}

impl EventStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// keep at most `capacity` events, discarding the oldest
    pub fn bounded(capacity: usize) -> Self {
        Self {
            events: Vec::new(),
            capacity: Some(capacity.max(1)),
            discarded: 0,
        }
    }

    pub fn emit(&mut self, event: CalculationEvent) {
        tracing::debug!(?event, "calculation event");
        if let Some(capacity) = self.capacity {
            if self.events.len() >= capacity {
                let overflow = self.events.len() + 1 - capacity;
                self.events.drain(..overflow);
                self.discarded += overflow;
            }
        }
        self.events.push(event);
    }

    /// events dropped because the buffer was full
    pub fn discarded(&self) -> usize {
        self.discarded
    }

    pub fn take_events(&mut self) -> Vec<CalculationEvent> {
        std::mem::take(&mut self.events)
    }

    pub fn events(&self) -> &[CalculationEvent] {
        &self.events
    }

    pub fn clear(&mut self) {
        self.events.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use uuid::Uuid;

    #[test]
    fn test_take_events_drains() {
        let at = Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap();
        let mut store = EventStore::new();
        store.emit(CalculationEvent::CalculationDeleted {
            calculation_id: Uuid::new_v4(),
            owner_id: "user-1".to_string(),
            timestamp: at,
        });

        assert_eq!(store.events().len(), 1);
        assert_eq!(store.events()[0].timestamp(), at);

        let drained = store.take_events();
        assert_eq!(drained.len(), 1);
        assert!(store.events().is_empty());
    }

    #[test]
    fn test_bounded_store_discards_oldest() {
        let at = Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap();
        let mut store = EventStore::bounded(2);
        let ids: Vec<Uuid> = (0..3).map(|_| Uuid::new_v4()).collect();
        for id in &ids {
            store.emit(CalculationEvent::CalculationDeleted {
                calculation_id: *id,
                owner_id: "user-1".to_string(),
                timestamp: at,
            });
        }

        assert_eq!(store.events().len(), 2);
        assert_eq!(store.discarded(), 1);
        assert!(matches!(
            &store.events()[0],
            CalculationEvent::CalculationDeleted { calculation_id, .. } if *calculation_id == ids[1]
        ));
    }
}

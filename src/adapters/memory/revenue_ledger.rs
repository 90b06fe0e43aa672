//! In-memory revenue ledger for testing and single-process use.
//!
//! The map entry for an event id is the serialization point: appends for
//! the same id resolve to exactly one stored payload, while appends for
//! different ids, tenants, and types proceed without ordering between
//! them. No cross-tenant lock exists beyond the map itself.

use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;

use crate::domain::foundation::{DomainError, ErrorCode, RevenueEventId};
use crate::domain::revenue::RevenueEvent;
use crate::ports::{EventFilter, RecordOutcome, RevenueLedger};

/// Deterministic in-memory implementation of `RevenueLedger`.
#[derive(Debug, Default)]
pub struct InMemoryRevenueLedger {
    events: Arc<RwLock<HashMap<RevenueEventId, RevenueEvent>>>,
}

impl InMemoryRevenueLedger {
    /// Creates an empty ledger.
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of recorded events, for test assertions.
    pub async fn len(&self) -> usize {
        self.events.read().await.len()
    }

    /// Returns true if no events are recorded.
    pub async fn is_empty(&self) -> bool {
        self.events.read().await.is_empty()
    }
}

#[async_trait]
impl RevenueLedger for InMemoryRevenueLedger {
    async fn record(&self, event: RevenueEvent) -> Result<RecordOutcome, DomainError> {
        let mut events = self.events.write().await;

        if let Some(existing) = events.get(&event.id) {
            if existing == &event {
                return Ok(RecordOutcome::AlreadyRecorded);
            }
            return Err(DomainError::new(
                ErrorCode::DuplicateEvent,
                "Event id already recorded with a different payload",
            )
            .with_detail("event_id", event.id.to_string()));
        }

        events.insert(event.id.clone(), event);
        Ok(RecordOutcome::Recorded)
    }

    async fn events_for(&self, filter: EventFilter) -> Result<Vec<RevenueEvent>, DomainError> {
        let mut matched: Vec<RevenueEvent> = self
            .events
            .read()
            .await
            .values()
            .filter(|e| filter.matches(e))
            .cloned()
            .collect();
        // Stable replay order: occurrence time, then id.
        matched.sort_by(|a, b| {
            a.occurred_at
                .cmp(&b.occurred_at)
                .then_with(|| a.id.cmp(&b.id))
        });
        Ok(matched)
    }
}

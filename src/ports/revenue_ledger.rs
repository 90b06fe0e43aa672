//! RevenueLedger port - the append-only, idempotent event store.
//!
//! The ledger is the single source of truth for all money facts. Appends
//! are serialized per event id only; across tenants and event types they
//! are fully concurrent; no cross-tenant lock is ever held.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::domain::foundation::{DomainError, TenantId, Timestamp};
use crate::domain::revenue::{RevenueEvent, RevenueEventType};

/// What happened to a `record` call.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RecordOutcome {
    /// First time this event id was seen; the event was appended.
    Recorded,

    /// The id was already recorded with an identical payload; nothing
    /// was appended. Success for idempotent retries.
    AlreadyRecorded,
}

/// Query filter for ledger reads. All fields are conjunctive; `None`
/// means "any".
#[derive(Debug, Clone, Default, PartialEq)]
pub struct EventFilter {
    /// Restrict to one tenant.
    pub tenant_id: Option<TenantId>,

    /// Restrict to one event type.
    pub event_type: Option<RevenueEventType>,

    /// Inclusive lower bound on `occurred_at`.
    pub from: Option<Timestamp>,

    /// Exclusive upper bound on `occurred_at`.
    pub to: Option<Timestamp>,
}

impl EventFilter {
    /// Matches everything.
    pub fn any() -> Self {
        Self::default()
    }

    /// Restricts to a tenant.
    pub fn for_tenant(tenant_id: TenantId) -> Self {
        Self {
            tenant_id: Some(tenant_id),
            ..Self::default()
        }
    }

    /// Restricts to an event type.
    pub fn with_type(mut self, event_type: RevenueEventType) -> Self {
        self.event_type = Some(event_type);
        self
    }

    /// Restricts to `[from, to)`.
    pub fn between(mut self, from: Timestamp, to: Timestamp) -> Self {
        self.from = Some(from);
        self.to = Some(to);
        self
    }

    /// Returns true if the event passes the filter.
    pub fn matches(&self, event: &RevenueEvent) -> bool {
        if let Some(tenant_id) = &self.tenant_id {
            if &event.tenant_id != tenant_id {
                return false;
            }
        }
        if let Some(event_type) = &self.event_type {
            if &event.event_type != event_type {
                return false;
            }
        }
        if let Some(from) = &self.from {
            if event.occurred_at < *from {
                return false;
            }
        }
        if let Some(to) = &self.to {
            if event.occurred_at >= *to {
                return false;
            }
        }
        true
    }
}

/// Port for the revenue event store.
#[async_trait]
pub trait RevenueLedger: Send + Sync {
    /// Appends an event, idempotently keyed by the event's id.
    ///
    /// Replaying an identical payload under an already-recorded id is a
    /// no-op success (`AlreadyRecorded`); the billing cycle retries
    /// after ambiguous failures and must not double-count.
    ///
    /// # Errors
    ///
    /// `DuplicateEvent` when the id exists with a *different* payload:
    /// that is a real conflict, not an idempotent replay.
    async fn record(&self, event: RevenueEvent) -> Result<RecordOutcome, DomainError>;

    /// Reads events matching the filter, ordered by occurrence time then
    /// event id for a stable, replayable sequence.
    async fn events_for(&self, filter: EventFilter) -> Result<Vec<RevenueEvent>, DomainError>;
}

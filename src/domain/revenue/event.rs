//! Immutable revenue events.
//!
//! A RevenueEvent is an append-only fact recording a single billable
//! occurrence. Once recorded it is never mutated or deleted; corrections
//! are made by appending an offsetting event. The caller-supplied id is
//! the idempotency key: replaying the same id never double-counts.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::domain::foundation::{
    CustomerId, DomainError, InvoiceId, Money, RevenueEventId, SubscriptionId, TenantId,
    TenantScoped, Timestamp,
};

/// What kind of billable occurrence an event records.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RevenueEventType {
    /// First charge of a new subscription.
    SubscriptionCreated,

    /// Periodic renewal charge.
    SubscriptionRenewed,

    /// One-time onboarding fee.
    SetupFee,

    /// Usage overage billed at period close.
    UsageCharge,

    /// Add-on purchase (lessons, analytics packs, API seats).
    AddOnPurchase,

    /// Refund; amount is negative.
    Refund,

    /// Balance migration between systems; signed.
    Migration,
}

impl RevenueEventType {
    /// Stable string form used in metadata and storage.
    pub fn as_str(&self) -> &'static str {
        match self {
            RevenueEventType::SubscriptionCreated => "subscription_created",
            RevenueEventType::SubscriptionRenewed => "subscription_renewed",
            RevenueEventType::SetupFee => "setup_fee",
            RevenueEventType::UsageCharge => "usage_charge",
            RevenueEventType::AddOnPurchase => "add_on_purchase",
            RevenueEventType::Refund => "refund",
            RevenueEventType::Migration => "migration",
        }
    }

    /// Returns true if this event type contributes to recurring revenue.
    pub fn is_recurring(&self) -> bool {
        matches!(
            self,
            RevenueEventType::SubscriptionCreated | RevenueEventType::SubscriptionRenewed
        )
    }

    /// Returns true if a negative amount is permitted for this type.
    pub fn allows_negative_amount(&self) -> bool {
        matches!(self, RevenueEventType::Refund | RevenueEventType::Migration)
    }
}

impl std::fmt::Display for RevenueEventType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Where the event originated.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EventSource {
    /// Confirmed by the external payment processor.
    PaymentProcessor,

    /// Produced by the billing cycle itself.
    Internal,

    /// Manually entered correction.
    Manual,
}

/// Product stream the revenue is attributed to.
///
/// Attribution rides in the event's metadata (`stream` key) rather than a
/// side table, so re-tagging and re-aggregation always agree with the
/// underlying facts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RevenueStream {
    /// Consumer golfer subscriptions.
    Consumer,

    /// White-label course and chain deployments.
    WhiteLabel,

    /// Analytics add-on packages.
    Analytics,

    /// Metered API access.
    Api,
}

impl RevenueStream {
    /// Metadata key carrying the stream tag.
    pub const METADATA_KEY: &'static str = "stream";

    /// All streams, in reporting order.
    pub const ALL: [RevenueStream; 4] = [
        RevenueStream::Consumer,
        RevenueStream::WhiteLabel,
        RevenueStream::Analytics,
        RevenueStream::Api,
    ];

    /// Stable string form used in metadata.
    pub fn as_str(&self) -> &'static str {
        match self {
            RevenueStream::Consumer => "consumer",
            RevenueStream::WhiteLabel => "white_label",
            RevenueStream::Analytics => "analytics",
            RevenueStream::Api => "api",
        }
    }

    /// Parses a metadata tag.
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "consumer" => Some(RevenueStream::Consumer),
            "white_label" => Some(RevenueStream::WhiteLabel),
            "analytics" => Some(RevenueStream::Analytics),
            "api" => Some(RevenueStream::Api),
            _ => None,
        }
    }
}

/// An immutable, append-only revenue fact.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RevenueEvent {
    /// Caller-supplied unique id; doubles as the idempotency key.
    pub id: RevenueEventId,

    /// Tenant the revenue belongs to.
    pub tenant_id: TenantId,

    /// Kind of occurrence.
    pub event_type: RevenueEventType,

    /// Signed amount. Non-negative for charges; negative only for types
    /// that allow it (refund, migration).
    pub amount: Money,

    /// When the occurrence happened.
    pub occurred_at: Timestamp,

    /// Subscription link, when applicable.
    pub subscription_id: Option<SubscriptionId>,

    /// Customer link, when applicable.
    pub customer_id: Option<CustomerId>,

    /// Invoice link, when applicable.
    pub invoice_id: Option<InvoiceId>,

    /// Free-form metadata; carries the stream tag among others.
    pub metadata: BTreeMap<String, String>,

    /// Origin of the event.
    pub source: EventSource,
}

impl RevenueEvent {
    /// Creates a revenue event, validating the amount sign for its type.
    pub fn new(
        id: RevenueEventId,
        tenant_id: TenantId,
        event_type: RevenueEventType,
        amount: Money,
        occurred_at: Timestamp,
        source: EventSource,
    ) -> Result<Self, DomainError> {
        if amount.is_negative() && !event_type.allows_negative_amount() {
            return Err(DomainError::validation(
                "amount",
                format!("{} events cannot carry a negative amount", event_type),
            ));
        }

        Ok(Self {
            id,
            tenant_id,
            event_type,
            amount,
            occurred_at,
            subscription_id: None,
            customer_id: None,
            invoice_id: None,
            metadata: BTreeMap::new(),
            source,
        })
    }

    /// Links the event to a subscription.
    pub fn with_subscription(mut self, id: SubscriptionId) -> Self {
        self.subscription_id = Some(id);
        self
    }

    /// Links the event to a customer.
    pub fn with_customer(mut self, id: CustomerId) -> Self {
        self.customer_id = Some(id);
        self
    }

    /// Links the event to an invoice.
    pub fn with_invoice(mut self, id: InvoiceId) -> Self {
        self.invoice_id = Some(id);
        self
    }

    /// Adds a metadata entry.
    pub fn with_metadata(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.metadata.insert(key.into(), value.into());
        self
    }

    /// Tags the event with a revenue stream.
    pub fn with_stream(self, stream: RevenueStream) -> Self {
        self.with_metadata(RevenueStream::METADATA_KEY, stream.as_str())
    }

    /// The revenue stream this event is attributed to.
    ///
    /// Untagged events fall back to the consumer stream, the platform's
    /// original product line.
    pub fn stream(&self) -> RevenueStream {
        self.metadata
            .get(RevenueStream::METADATA_KEY)
            .and_then(|s| RevenueStream::parse(s))
            .unwrap_or(RevenueStream::Consumer)
    }
}

impl TenantScoped for RevenueEvent {
    fn tenant_id(&self) -> &TenantId {
        &self.tenant_id
    }
}

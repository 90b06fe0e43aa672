//! PostgreSQL implementation of RevenueLedger.
//!
//! The event id is the primary key, so `INSERT ... ON CONFLICT DO
//! NOTHING` makes the append serialize per event id only; concurrent
//! appends for different ids, tenants, and types never contend. Rows
//! are never updated or deleted.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::types::Json;
use sqlx::PgPool;
use std::collections::BTreeMap;
use uuid::Uuid;

use crate::domain::foundation::{
    CurrencyCode, CustomerId, DomainError, ErrorCode, InvoiceId, Money, RevenueEventId,
    SubscriptionId, TenantId, Timestamp,
};
use crate::domain::revenue::{EventSource, RevenueEvent, RevenueEventType};
use crate::ports::{EventFilter, RecordOutcome, RevenueLedger};

/// PostgreSQL implementation of the `RevenueLedger` port.
pub struct PostgresRevenueLedger {
    pool: PgPool,
}

impl PostgresRevenueLedger {
    /// Creates a ledger over the given connection pool.
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    async fn find_by_event_id(
        &self,
        id: &RevenueEventId,
    ) -> Result<Option<RevenueEvent>, DomainError> {
        let row: Option<RevenueEventRow> = sqlx::query_as(&format!(
            "SELECT {} FROM revenue_events WHERE id = $1",
            SELECT_COLUMNS
        ))
        .bind(id.as_str())
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| db_error("Failed to read event", e))?;

        row.map(RevenueEvent::try_from).transpose()
    }
}

/// Database row representation of a revenue event.
#[derive(Debug, sqlx::FromRow)]
struct RevenueEventRow {
    id: String,
    tenant_id: Uuid,
    event_type: String,
    amount_cents: i64,
    currency: String,
    occurred_at: DateTime<Utc>,
    subscription_id: Option<Uuid>,
    customer_id: Option<Uuid>,
    invoice_id: Option<Uuid>,
    metadata: Json<BTreeMap<String, String>>,
    source: String,
}

impl TryFrom<RevenueEventRow> for RevenueEvent {
    type Error = DomainError;

    fn try_from(row: RevenueEventRow) -> Result<Self, Self::Error> {
        let currency = CurrencyCode::new(&row.currency)
            .map_err(|e| DomainError::new(ErrorCode::DatabaseError, e.to_string()))?;

        Ok(RevenueEvent {
            id: RevenueEventId::new(row.id)
                .map_err(|e| DomainError::new(ErrorCode::DatabaseError, e.to_string()))?,
            tenant_id: TenantId::from_uuid(row.tenant_id),
            event_type: parse_event_type(&row.event_type)?,
            amount: Money::from_cents(row.amount_cents, currency),
            occurred_at: Timestamp::from_datetime(row.occurred_at),
            subscription_id: row.subscription_id.map(SubscriptionId::from_uuid),
            customer_id: row.customer_id.map(CustomerId::from_uuid),
            invoice_id: row.invoice_id.map(InvoiceId::from_uuid),
            metadata: row.metadata.0,
            source: parse_source(&row.source)?,
        })
    }
}

fn parse_event_type(s: &str) -> Result<RevenueEventType, DomainError> {
    match s {
        "subscription_created" => Ok(RevenueEventType::SubscriptionCreated),
        "subscription_renewed" => Ok(RevenueEventType::SubscriptionRenewed),
        "setup_fee" => Ok(RevenueEventType::SetupFee),
        "usage_charge" => Ok(RevenueEventType::UsageCharge),
        "add_on_purchase" => Ok(RevenueEventType::AddOnPurchase),
        "refund" => Ok(RevenueEventType::Refund),
        "migration" => Ok(RevenueEventType::Migration),
        _ => Err(DomainError::new(
            ErrorCode::DatabaseError,
            format!("Invalid event type: {}", s),
        )),
    }
}

fn parse_source(s: &str) -> Result<EventSource, DomainError> {
    match s {
        "payment_processor" => Ok(EventSource::PaymentProcessor),
        "internal" => Ok(EventSource::Internal),
        "manual" => Ok(EventSource::Manual),
        _ => Err(DomainError::new(
            ErrorCode::DatabaseError,
            format!("Invalid event source: {}", s),
        )),
    }
}

fn source_to_string(source: EventSource) -> &'static str {
    match source {
        EventSource::PaymentProcessor => "payment_processor",
        EventSource::Internal => "internal",
        EventSource::Manual => "manual",
    }
}

const SELECT_COLUMNS: &str = "id, tenant_id, event_type, amount_cents, currency, occurred_at, \
     subscription_id, customer_id, invoice_id, metadata, source";

fn db_error(context: &str, e: sqlx::Error) -> DomainError {
    DomainError::new(ErrorCode::DatabaseError, format!("{}: {}", context, e))
}

#[async_trait]
impl RevenueLedger for PostgresRevenueLedger {
    async fn record(&self, event: RevenueEvent) -> Result<RecordOutcome, DomainError> {
        let result = sqlx::query(
            r#"
            INSERT INTO revenue_events (
                id, tenant_id, event_type, amount_cents, currency, occurred_at,
                subscription_id, customer_id, invoice_id, metadata, source
            ) VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11)
            ON CONFLICT (id) DO NOTHING
            "#,
        )
        .bind(event.id.as_str())
        .bind(event.tenant_id.as_uuid())
        .bind(event.event_type.as_str())
        .bind(event.amount.amount_cents)
        .bind(event.amount.currency.as_str())
        .bind(event.occurred_at.as_datetime())
        .bind(event.subscription_id.map(|id| *id.as_uuid()))
        .bind(event.customer_id.map(|id| *id.as_uuid()))
        .bind(event.invoice_id.map(|id| *id.as_uuid()))
        .bind(Json(&event.metadata))
        .bind(source_to_string(event.source))
        .execute(&self.pool)
        .await
        .map_err(|e| db_error("Failed to record event", e))?;

        if result.rows_affected() == 1 {
            return Ok(RecordOutcome::Recorded);
        }

        // The id already exists: idempotent replay or a real conflict.
        match self.find_by_event_id(&event.id).await? {
            Some(existing) if existing == event => Ok(RecordOutcome::AlreadyRecorded),
            Some(_) => Err(DomainError::new(
                ErrorCode::DuplicateEvent,
                "Event id already recorded with a different payload",
            )
            .with_detail("event_id", event.id.to_string())),
            // Raced with nothing visible; treat as infrastructure noise.
            None => Err(DomainError::new(
                ErrorCode::DatabaseError,
                "Conflicting insert not visible on re-read",
            )),
        }
    }

    async fn events_for(&self, filter: EventFilter) -> Result<Vec<RevenueEvent>, DomainError> {
        let rows: Vec<RevenueEventRow> = sqlx::query_as(&format!(
            "SELECT {} FROM revenue_events \
             WHERE ($1::uuid IS NULL OR tenant_id = $1) \
               AND ($2::text IS NULL OR event_type = $2) \
               AND ($3::timestamptz IS NULL OR occurred_at >= $3) \
               AND ($4::timestamptz IS NULL OR occurred_at < $4) \
             ORDER BY occurred_at, id",
            SELECT_COLUMNS
        ))
        .bind(filter.tenant_id.map(|id| *id.as_uuid()))
        .bind(filter.event_type.map(|t| t.as_str()))
        .bind(filter.from.map(|t| *t.as_datetime()))
        .bind(filter.to.map(|t| *t.as_datetime()))
        .fetch_all(&self.pool)
        .await
        .map_err(|e| db_error("Failed to query events", e))?;

        rows.into_iter().map(RevenueEvent::try_from).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn event_type_strings_roundtrip() {
        for event_type in [
            RevenueEventType::SubscriptionCreated,
            RevenueEventType::SubscriptionRenewed,
            RevenueEventType::SetupFee,
            RevenueEventType::UsageCharge,
            RevenueEventType::AddOnPurchase,
            RevenueEventType::Refund,
            RevenueEventType::Migration,
        ] {
            assert_eq!(parse_event_type(event_type.as_str()).unwrap(), event_type);
        }
    }

    #[test]
    fn source_strings_roundtrip() {
        for source in [
            EventSource::PaymentProcessor,
            EventSource::Internal,
            EventSource::Manual,
        ] {
            assert_eq!(parse_source(source_to_string(source)).unwrap(), source);
        }
    }

    #[test]
    fn unknown_strings_are_database_errors() {
        assert!(parse_event_type("chargeback").is_err());
        assert!(parse_source("carrier_pigeon").is_err());
    }
}

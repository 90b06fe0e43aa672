//! PostgreSQL implementation of SubscriptionRepository.
//!
//! The one-live-per-family invariant is a partial unique index
//! (`uniq_live_subscription_family`); optimistic concurrency is a
//! compare-and-increment on the `version` column, so two concurrent
//! transitions on the same subscription cannot both win.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::PgPool;
use uuid::Uuid;

use crate::domain::foundation::{
    CurrencyCode, CustomerId, DomainError, ErrorCode, Money, SubscriptionId, TenantId, TierId,
    Timestamp,
};
use crate::domain::subscription::{
    BillingCycle, Subscription, SubscriptionStatus, TrialWindow,
};
use crate::ports::SubscriptionRepository;

/// PostgreSQL implementation of the `SubscriptionRepository` port.
pub struct PostgresSubscriptionRepository {
    pool: PgPool,
}

impl PostgresSubscriptionRepository {
    /// Creates a repository over the given connection pool.
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

/// Database row representation of a subscription.
#[derive(Debug, sqlx::FromRow)]
struct SubscriptionRow {
    id: Uuid,
    tenant_id: Uuid,
    customer_id: Uuid,
    tier_id: String,
    tier_family: String,
    billing_cycle: String,
    price_cents: i64,
    currency: String,
    trial_start: Option<DateTime<Utc>>,
    trial_end: Option<DateTime<Utc>>,
    status: String,
    paused_until: Option<DateTime<Utc>>,
    canceled_at: Option<DateTime<Utc>>,
    cancellation_reason: Option<String>,
    current_period_start: DateTime<Utc>,
    current_period_end: DateTime<Utc>,
    flagged_for_dunning: bool,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
    version: i64,
}

impl TryFrom<SubscriptionRow> for Subscription {
    type Error = DomainError;

    fn try_from(row: SubscriptionRow) -> Result<Self, Self::Error> {
        let currency = CurrencyCode::new(&row.currency)
            .map_err(|e| DomainError::new(ErrorCode::DatabaseError, e.to_string()))?;
        let trial = match (row.trial_start, row.trial_end) {
            (Some(start), Some(end)) => Some(TrialWindow {
                start: Timestamp::from_datetime(start),
                end: Timestamp::from_datetime(end),
            }),
            _ => None,
        };

        Ok(Subscription {
            id: SubscriptionId::from_uuid(row.id),
            tenant_id: TenantId::from_uuid(row.tenant_id),
            customer_id: CustomerId::from_uuid(row.customer_id),
            tier_id: TierId::new(row.tier_id)
                .map_err(|e| DomainError::new(ErrorCode::DatabaseError, e.to_string()))?,
            tier_family: row.tier_family,
            billing_cycle: parse_cycle(&row.billing_cycle)?,
            price: Money::from_cents(row.price_cents, currency),
            trial,
            status: parse_status(&row.status)?,
            paused_until: row.paused_until.map(Timestamp::from_datetime),
            canceled_at: row.canceled_at.map(Timestamp::from_datetime),
            cancellation_reason: row.cancellation_reason,
            current_period_start: Timestamp::from_datetime(row.current_period_start),
            current_period_end: Timestamp::from_datetime(row.current_period_end),
            flagged_for_dunning: row.flagged_for_dunning,
            created_at: Timestamp::from_datetime(row.created_at),
            updated_at: Timestamp::from_datetime(row.updated_at),
            version: row.version.max(0) as u64,
        })
    }
}

fn parse_cycle(s: &str) -> Result<BillingCycle, DomainError> {
    match s {
        "monthly" => Ok(BillingCycle::Monthly),
        "annual" => Ok(BillingCycle::Annual),
        _ => Err(DomainError::new(
            ErrorCode::DatabaseError,
            format!("Invalid billing cycle: {}", s),
        )),
    }
}

fn cycle_to_string(cycle: BillingCycle) -> &'static str {
    match cycle {
        BillingCycle::Monthly => "monthly",
        BillingCycle::Annual => "annual",
    }
}

fn parse_status(s: &str) -> Result<SubscriptionStatus, DomainError> {
    match s {
        "active" => Ok(SubscriptionStatus::Active),
        "paused" => Ok(SubscriptionStatus::Paused),
        "canceled" => Ok(SubscriptionStatus::Canceled),
        _ => Err(DomainError::new(
            ErrorCode::DatabaseError,
            format!("Invalid subscription status: {}", s),
        )),
    }
}

fn status_to_string(status: SubscriptionStatus) -> &'static str {
    match status {
        SubscriptionStatus::Active => "active",
        SubscriptionStatus::Paused => "paused",
        SubscriptionStatus::Canceled => "canceled",
    }
}

const SELECT_COLUMNS: &str = "id, tenant_id, customer_id, tier_id, tier_family, billing_cycle, \
     price_cents, currency, trial_start, trial_end, status, paused_until, canceled_at, \
     cancellation_reason, current_period_start, current_period_end, flagged_for_dunning, \
     created_at, updated_at, version";

fn db_error(context: &str, e: sqlx::Error) -> DomainError {
    DomainError::new(ErrorCode::DatabaseError, format!("{}: {}", context, e))
}

#[async_trait]
impl SubscriptionRepository for PostgresSubscriptionRepository {
    async fn save(&self, subscription: &Subscription) -> Result<(), DomainError> {
        sqlx::query(
            r#"
            INSERT INTO subscriptions (
                id, tenant_id, customer_id, tier_id, tier_family, billing_cycle,
                price_cents, currency, trial_start, trial_end, status, paused_until,
                canceled_at, cancellation_reason, current_period_start,
                current_period_end, flagged_for_dunning, created_at, updated_at, version
            ) VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14,
                      $15, $16, $17, $18, $19, $20)
            "#,
        )
        .bind(subscription.id.as_uuid())
        .bind(subscription.tenant_id.as_uuid())
        .bind(subscription.customer_id.as_uuid())
        .bind(subscription.tier_id.as_str())
        .bind(&subscription.tier_family)
        .bind(cycle_to_string(subscription.billing_cycle))
        .bind(subscription.price.amount_cents)
        .bind(subscription.price.currency.as_str())
        .bind(subscription.trial.map(|t| *t.start.as_datetime()))
        .bind(subscription.trial.map(|t| *t.end.as_datetime()))
        .bind(status_to_string(subscription.status))
        .bind(subscription.paused_until.map(|t| *t.as_datetime()))
        .bind(subscription.canceled_at.map(|t| *t.as_datetime()))
        .bind(&subscription.cancellation_reason)
        .bind(subscription.current_period_start.as_datetime())
        .bind(subscription.current_period_end.as_datetime())
        .bind(subscription.flagged_for_dunning)
        .bind(subscription.created_at.as_datetime())
        .bind(subscription.updated_at.as_datetime())
        .bind(subscription.version as i64)
        .execute(&self.pool)
        .await
        .map_err(|e| {
            if let sqlx::Error::Database(db_err) = &e {
                if db_err.constraint() == Some("uniq_live_subscription_family") {
                    return DomainError::new(
                        ErrorCode::DuplicateSubscription,
                        format!(
                            "Customer already has a live subscription in the '{}' family",
                            subscription.tier_family
                        ),
                    );
                }
            }
            db_error("Failed to save subscription", e)
        })?;

        Ok(())
    }

    async fn update(&self, subscription: &Subscription) -> Result<(), DomainError> {
        let result = sqlx::query(
            r#"
            UPDATE subscriptions SET
                tier_id = $3,
                tier_family = $4,
                price_cents = $5,
                status = $6,
                paused_until = $7,
                canceled_at = $8,
                cancellation_reason = $9,
                current_period_start = $10,
                current_period_end = $11,
                flagged_for_dunning = $12,
                updated_at = $13,
                version = version + 1
            WHERE id = $1 AND version = $2
            "#,
        )
        .bind(subscription.id.as_uuid())
        .bind(subscription.version as i64)
        .bind(subscription.tier_id.as_str())
        .bind(&subscription.tier_family)
        .bind(subscription.price.amount_cents)
        .bind(status_to_string(subscription.status))
        .bind(subscription.paused_until.map(|t| *t.as_datetime()))
        .bind(subscription.canceled_at.map(|t| *t.as_datetime()))
        .bind(&subscription.cancellation_reason)
        .bind(subscription.current_period_start.as_datetime())
        .bind(subscription.current_period_end.as_datetime())
        .bind(subscription.flagged_for_dunning)
        .bind(subscription.updated_at.as_datetime())
        .execute(&self.pool)
        .await
        .map_err(|e| db_error("Failed to update subscription", e))?;

        if result.rows_affected() == 0 {
            return match self.find_by_id(subscription.id).await? {
                None => Err(DomainError::new(
                    ErrorCode::SubscriptionNotFound,
                    "Subscription not found",
                )
                .with_detail("subscription_id", subscription.id.to_string())),
                Some(stored) => Err(DomainError::new(
                    ErrorCode::StaleVersion,
                    "Subscription was modified concurrently",
                )
                .with_detail("expected_version", subscription.version.to_string())
                .with_detail("stored_version", stored.version.to_string())),
            };
        }
        Ok(())
    }

    async fn find_by_id(&self, id: SubscriptionId) -> Result<Option<Subscription>, DomainError> {
        let row: Option<SubscriptionRow> = sqlx::query_as(&format!(
            "SELECT {} FROM subscriptions WHERE id = $1",
            SELECT_COLUMNS
        ))
        .bind(id.as_uuid())
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| db_error("Failed to find subscription", e))?;

        row.map(Subscription::try_from).transpose()
    }

    async fn list_by_tenant(&self, tenant_id: TenantId) -> Result<Vec<Subscription>, DomainError> {
        let rows: Vec<SubscriptionRow> = sqlx::query_as(&format!(
            "SELECT {} FROM subscriptions WHERE tenant_id = $1 ORDER BY created_at, id",
            SELECT_COLUMNS
        ))
        .bind(tenant_id.as_uuid())
        .fetch_all(&self.pool)
        .await
        .map_err(|e| db_error("Failed to list subscriptions", e))?;

        rows.into_iter().map(Subscription::try_from).collect()
    }

    async fn list_by_customer(
        &self,
        tenant_id: TenantId,
        customer_id: CustomerId,
    ) -> Result<Vec<Subscription>, DomainError> {
        let rows: Vec<SubscriptionRow> = sqlx::query_as(&format!(
            "SELECT {} FROM subscriptions \
             WHERE tenant_id = $1 AND customer_id = $2 ORDER BY created_at, id",
            SELECT_COLUMNS
        ))
        .bind(tenant_id.as_uuid())
        .bind(customer_id.as_uuid())
        .fetch_all(&self.pool)
        .await
        .map_err(|e| db_error("Failed to list subscriptions", e))?;

        rows.into_iter().map(Subscription::try_from).collect()
    }

    async fn list_due_for_renewal(&self, now: Timestamp) -> Result<Vec<Subscription>, DomainError> {
        let rows: Vec<SubscriptionRow> = sqlx::query_as(&format!(
            "SELECT {} FROM subscriptions \
             WHERE status = 'active' \
               AND current_period_end <= $1 \
               AND NOT (trial_start IS NOT NULL AND trial_start <= $1 AND trial_end > $1) \
             ORDER BY current_period_end, id",
            SELECT_COLUMNS
        ))
        .bind(now.as_datetime())
        .fetch_all(&self.pool)
        .await
        .map_err(|e| db_error("Failed to list due subscriptions", e))?;

        rows.into_iter().map(Subscription::try_from).collect()
    }

    async fn list_pause_expired(&self, now: Timestamp) -> Result<Vec<Subscription>, DomainError> {
        let rows: Vec<SubscriptionRow> = sqlx::query_as(&format!(
            "SELECT {} FROM subscriptions \
             WHERE status = 'paused' AND paused_until IS NOT NULL AND paused_until <= $1 \
             ORDER BY id",
            SELECT_COLUMNS
        ))
        .bind(now.as_datetime())
        .fetch_all(&self.pool)
        .await
        .map_err(|e| db_error("Failed to list expired pauses", e))?;

        rows.into_iter().map(Subscription::try_from).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cycle_strings_roundtrip() {
        for cycle in [BillingCycle::Monthly, BillingCycle::Annual] {
            assert_eq!(parse_cycle(cycle_to_string(cycle)).unwrap(), cycle);
        }
    }

    #[test]
    fn status_strings_roundtrip() {
        for status in [
            SubscriptionStatus::Active,
            SubscriptionStatus::Paused,
            SubscriptionStatus::Canceled,
        ] {
            assert_eq!(parse_status(status_to_string(status)).unwrap(), status);
        }
    }

    #[test]
    fn unknown_strings_are_database_errors() {
        assert!(parse_cycle("weekly").is_err());
        assert!(parse_status("dormant").is_err());
    }
}

//! PostgreSQL sink for usage rollup buckets.
//!
//! The meter itself stays in-process (sharded atomic counters on the
//! hot path); this store is the durable side; the rollup flusher task
//! periodically compacts the meter and upserts the resulting buckets
//! keyed by (tenant, endpoint, granularity, bucket_start).

use chrono::{DateTime, Utc};
use sqlx::PgPool;
use uuid::Uuid;

use crate::domain::foundation::{DomainError, ErrorCode, TenantId, Timestamp};
use crate::domain::usage::{Granularity, UsageBucket};

/// Durable store for usage rollups.
pub struct PostgresRollupStore {
    pool: PgPool,
}

/// Database row representation of a rollup bucket.
#[derive(Debug, sqlx::FromRow)]
struct RollupRow {
    tenant_id: Uuid,
    endpoint: String,
    granularity: String,
    bucket_start: DateTime<Utc>,
    calls: i64,
    error_count: i64,
    bytes: i64,
    total_latency_ms: i64,
}

impl TryFrom<RollupRow> for UsageBucket {
    type Error = DomainError;

    fn try_from(row: RollupRow) -> Result<Self, Self::Error> {
        Ok(UsageBucket {
            tenant_id: TenantId::from_uuid(row.tenant_id),
            endpoint: row.endpoint,
            granularity: parse_granularity(&row.granularity)?,
            bucket_start: Timestamp::from_datetime(row.bucket_start),
            calls: row.calls.max(0) as u64,
            error_count: row.error_count.max(0) as u64,
            bytes: row.bytes.max(0) as u64,
            total_latency_ms: row.total_latency_ms.max(0) as u64,
        })
    }
}

fn parse_granularity(s: &str) -> Result<Granularity, DomainError> {
    match s {
        "minute" => Ok(Granularity::Minute),
        "hour" => Ok(Granularity::Hour),
        "day" => Ok(Granularity::Day),
        "month" => Ok(Granularity::Month),
        _ => Err(DomainError::new(
            ErrorCode::DatabaseError,
            format!("Invalid granularity: {}", s),
        )),
    }
}

impl PostgresRollupStore {
    /// Creates a store over the given connection pool.
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Upserts buckets, adding counts into any existing cell.
    pub async fn upsert(&self, buckets: &[UsageBucket]) -> Result<(), DomainError> {
        for bucket in buckets {
            sqlx::query(
                r#"
                INSERT INTO usage_rollups (
                    tenant_id, endpoint, granularity, bucket_start,
                    calls, error_count, bytes, total_latency_ms
                ) VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
                ON CONFLICT (tenant_id, endpoint, granularity, bucket_start) DO UPDATE SET
                    calls = usage_rollups.calls + EXCLUDED.calls,
                    error_count = usage_rollups.error_count + EXCLUDED.error_count,
                    bytes = usage_rollups.bytes + EXCLUDED.bytes,
                    total_latency_ms = usage_rollups.total_latency_ms + EXCLUDED.total_latency_ms
                "#,
            )
            .bind(bucket.tenant_id.as_uuid())
            .bind(&bucket.endpoint)
            .bind(bucket.granularity.as_str())
            .bind(bucket.bucket_start.as_datetime())
            .bind(bucket.calls as i64)
            .bind(bucket.error_count as i64)
            .bind(bucket.bytes as i64)
            .bind(bucket.total_latency_ms as i64)
            .execute(&self.pool)
            .await
            .map_err(|e| {
                DomainError::new(
                    ErrorCode::DatabaseError,
                    format!("Failed to upsert rollup: {}", e),
                )
            })?;
        }
        Ok(())
    }

    /// Loads a tenant's buckets for a granularity and window.
    pub async fn load(
        &self,
        tenant_id: TenantId,
        granularity: Granularity,
        from: Timestamp,
        to: Timestamp,
    ) -> Result<Vec<UsageBucket>, DomainError> {
        let rows: Vec<RollupRow> = sqlx::query_as(
            "SELECT tenant_id, endpoint, granularity, bucket_start, \
                    calls, error_count, bytes, total_latency_ms \
             FROM usage_rollups \
             WHERE tenant_id = $1 AND granularity = $2 \
               AND bucket_start >= $3 AND bucket_start < $4 \
             ORDER BY bucket_start, endpoint",
        )
        .bind(tenant_id.as_uuid())
        .bind(granularity.as_str())
        .bind(from.as_datetime())
        .bind(to.as_datetime())
        .fetch_all(&self.pool)
        .await
        .map_err(|e| {
            DomainError::new(
                ErrorCode::DatabaseError,
                format!("Failed to load rollups: {}", e),
            )
        })?;

        rows.into_iter().map(UsageBucket::try_from).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn granularity_strings_roundtrip() {
        for granularity in [
            Granularity::Minute,
            Granularity::Hour,
            Granularity::Day,
            Granularity::Month,
        ] {
            assert_eq!(
                parse_granularity(granularity.as_str()).unwrap(),
                granularity
            );
        }
    }

    #[test]
    fn unknown_granularity_is_a_database_error() {
        assert!(parse_granularity("fortnight").is_err());
    }
}

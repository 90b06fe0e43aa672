//! Raw call samples and time-bucketed usage rollups.
//!
//! The meter ingests raw per-call samples and compacts them into
//! minute/hour/day/month buckets. Raw samples may be discarded after
//! rollup; buckets are retained for at least one full billing cycle and
//! never discarded before they have been billed.

use chrono::{DateTime, Datelike, TimeZone, Timelike, Utc};
use serde::{Deserialize, Serialize};

use crate::domain::foundation::{TenantId, Timestamp};

/// A single metered API call.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CallSample {
    /// Tenant the call was served for.
    pub tenant_id: TenantId,

    /// Logical endpoint name (e.g. `"tee-times.search"`).
    pub endpoint: String,

    /// HTTP status code returned.
    pub status_code: u16,

    /// Request latency in milliseconds.
    pub latency_ms: u32,

    /// Bytes transferred (request + response bodies).
    pub bytes: u64,

    /// When the call occurred.
    pub occurred_at: Timestamp,
}

impl CallSample {
    /// Returns true if the call counts as an error (HTTP 5xx).
    pub fn is_error(&self) -> bool {
        self.status_code >= 500
    }
}

/// Rollup bucket width.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Granularity {
    Minute,
    Hour,
    Day,
    Month,
}

impl Granularity {
    /// Truncates a timestamp to the start of its bucket.
    pub fn bucket_start(&self, at: &Timestamp) -> Timestamp {
        let dt: &DateTime<Utc> = at.as_datetime();
        let truncated = match self {
            Granularity::Minute => Utc
                .with_ymd_and_hms(dt.year(), dt.month(), dt.day(), dt.hour(), dt.minute(), 0)
                .unwrap(),
            Granularity::Hour => Utc
                .with_ymd_and_hms(dt.year(), dt.month(), dt.day(), dt.hour(), 0, 0)
                .unwrap(),
            Granularity::Day => Utc
                .with_ymd_and_hms(dt.year(), dt.month(), dt.day(), 0, 0, 0)
                .unwrap(),
            Granularity::Month => Utc
                .with_ymd_and_hms(dt.year(), dt.month(), 1, 0, 0, 0)
                .unwrap(),
        };
        Timestamp::from_datetime(truncated)
    }

    /// Stable string form used in storage keys.
    pub fn as_str(&self) -> &'static str {
        match self {
            Granularity::Minute => "minute",
            Granularity::Hour => "hour",
            Granularity::Day => "day",
            Granularity::Month => "month",
        }
    }
}

/// Aggregated usage for one (tenant, endpoint, bucket) cell.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UsageBucket {
    /// Tenant the bucket belongs to.
    pub tenant_id: TenantId,

    /// Endpoint the bucket aggregates.
    pub endpoint: String,

    /// Bucket width.
    pub granularity: Granularity,

    /// Start of the bucket window.
    pub bucket_start: Timestamp,

    /// Calls in the bucket.
    pub calls: u64,

    /// Error (5xx) calls in the bucket.
    pub error_count: u64,

    /// Bytes transferred in the bucket.
    pub bytes: u64,

    /// Sum of latencies, for mean-latency reporting.
    pub total_latency_ms: u64,
}

impl UsageBucket {
    /// Creates an empty bucket for a sample's cell.
    pub fn empty_for(sample: &CallSample, granularity: Granularity) -> Self {
        Self {
            tenant_id: sample.tenant_id,
            endpoint: sample.endpoint.clone(),
            granularity,
            bucket_start: granularity.bucket_start(&sample.occurred_at),
            calls: 0,
            error_count: 0,
            bytes: 0,
            total_latency_ms: 0,
        }
    }

    /// Folds a sample into the bucket.
    pub fn absorb(&mut self, sample: &CallSample) {
        self.calls += 1;
        if sample.is_error() {
            self.error_count += 1;
        }
        self.bytes += sample.bytes;
        self.total_latency_ms += sample.latency_ms as u64;
    }

    /// Merges another bucket of the same cell into this one.
    pub fn merge(&mut self, other: &UsageBucket) {
        self.calls += other.calls;
        self.error_count += other.error_count;
        self.bytes += other.bytes;
        self.total_latency_ms += other.total_latency_ms;
    }

    /// Mean latency over the bucket, zero when empty.
    pub fn mean_latency_ms(&self) -> u64 {
        if self.calls == 0 {
            0
        } else {
            self.total_latency_ms / self.calls
        }
    }
}

/// Running totals reported by `current_usage`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct UsageTotals {
    /// Calls recorded.
    pub calls: u64,

    /// Bytes transferred.
    pub bytes: u64,
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::DateTime;

    fn ts(rfc3339: &str) -> Timestamp {
        Timestamp::from_datetime(
            DateTime::parse_from_rfc3339(rfc3339)
                .unwrap()
                .with_timezone(&Utc),
        )
    }

    fn sample_at(rfc3339: &str, status: u16) -> CallSample {
        CallSample {
            tenant_id: TenantId::new(),
            endpoint: "tee-times.search".to_string(),
            status_code: status,
            latency_ms: 40,
            bytes: 2_048,
            occurred_at: ts(rfc3339),
        }
    }

    #[test]
    fn bucket_start_truncates_per_granularity() {
        let at = ts("2026-07-19T14:37:42Z");

        assert_eq!(
            Granularity::Minute.bucket_start(&at),
            ts("2026-07-19T14:37:00Z")
        );
        assert_eq!(
            Granularity::Hour.bucket_start(&at),
            ts("2026-07-19T14:00:00Z")
        );
        assert_eq!(Granularity::Day.bucket_start(&at), ts("2026-07-19T00:00:00Z"));
        assert_eq!(
            Granularity::Month.bucket_start(&at),
            ts("2026-07-01T00:00:00Z")
        );
    }

    #[test]
    fn absorb_accumulates_calls_errors_and_bytes() {
        let ok = sample_at("2026-07-19T14:37:42Z", 200);
        let failed = sample_at("2026-07-19T14:37:43Z", 503);

        let mut bucket = UsageBucket::empty_for(&ok, Granularity::Minute);
        bucket.absorb(&ok);
        bucket.absorb(&failed);

        assert_eq!(bucket.calls, 2);
        assert_eq!(bucket.error_count, 1);
        assert_eq!(bucket.bytes, 4_096);
        assert_eq!(bucket.mean_latency_ms(), 40);
    }

    #[test]
    fn client_errors_are_not_error_count() {
        assert!(!sample_at("2026-07-19T14:00:00Z", 404).is_error());
        assert!(sample_at("2026-07-19T14:00:00Z", 500).is_error());
    }

    #[test]
    fn merge_combines_cells() {
        let a = sample_at("2026-07-19T14:37:42Z", 200);
        let mut left = UsageBucket::empty_for(&a, Granularity::Hour);
        left.absorb(&a);

        let mut right = left.clone();
        right.absorb(&a);

        left.merge(&right);
        assert_eq!(left.calls, 3);
        assert_eq!(left.bytes, 3 * 2_048);
    }

    #[test]
    fn mean_latency_is_zero_for_empty_bucket() {
        let sample = sample_at("2026-07-19T14:37:42Z", 200);
        let bucket = UsageBucket::empty_for(&sample, Granularity::Day);
        assert_eq!(bucket.mean_latency_ms(), 0);
    }
}

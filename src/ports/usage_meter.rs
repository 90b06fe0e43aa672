//! UsageMeter port - per-tenant API consumption accounting.
//!
//! The meter sits on the hot request path, so its contract is shaped by
//! two rules: `record_call` never blocks the caller's business logic and
//! never propagates failure (metering degrades to "unmetered", logged),
//! and rate-limit state is strictly per (tenant, endpoint); one
//! tenant's burst must never throttle another.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::domain::foundation::{TenantId, Timestamp};
use crate::domain::usage::{
    CallSample, Granularity, IncludedQuotas, PeriodUsage, QuotaStatus, QuotaType, UsageBucket,
    UsageTotals,
};

/// Sliding-window rate-limit ceiling for one tenant.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct RateLimitCeiling {
    /// Maximum calls per (tenant, endpoint) in the trailing window.
    pub max_calls: u32,

    /// Trailing window length in seconds.
    pub window_secs: u32,
}

impl Default for RateLimitCeiling {
    fn default() -> Self {
        Self {
            max_calls: 120,
            window_secs: 60,
        }
    }
}

/// Metering configuration for one tenant.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TenantMeterConfig {
    /// Included allowances per billing period.
    pub included: IncludedQuotas,

    /// Per-endpoint sliding-window ceiling.
    pub rate_limit: RateLimitCeiling,
}

/// Result of a rate-limit check.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct RateLimitDecision {
    /// Whether the call may proceed.
    pub allowed: bool,

    /// The ceiling that applied.
    pub limit: u32,

    /// Seconds until the caller should retry, when denied.
    pub retry_after_secs: Option<u32>,
}

/// Errors from meter read paths.
///
/// The write path (`record_call`) deliberately has no error: ingestion
/// failures are logged and dropped rather than surfaced.
#[derive(Debug, thiserror::Error)]
pub enum MeterError {
    /// Meter backend unavailable.
    #[error("usage meter unavailable: {0}")]
    Unavailable(String),
}

/// Port for usage metering.
#[async_trait]
pub trait UsageMeter: Send + Sync {
    /// Sets a tenant's quotas and rate-limit ceiling.
    ///
    /// Unconfigured tenants are metered against defaults rather than
    /// rejected.
    async fn configure_tenant(&self, tenant_id: TenantId, config: TenantMeterConfig);

    /// Records one API call. Fire-and-forget: never blocks on contention
    /// beyond an atomic increment, never returns an error.
    async fn record_call(&self, sample: CallSample);

    /// Running totals for a tenant since meter start.
    async fn current_usage(&self, tenant_id: TenantId) -> Result<UsageTotals, MeterError>;

    /// Standing of a tenant against one quota type.
    async fn check_quota(
        &self,
        tenant_id: TenantId,
        quota: QuotaType,
    ) -> Result<QuotaStatus, MeterError>;

    /// Sliding-window rate-limit decision for a (tenant, endpoint) pair.
    /// Does not consume an allowance; `record_call` is the consumption.
    async fn check_rate_limit(
        &self,
        tenant_id: TenantId,
        endpoint: &str,
    ) -> Result<RateLimitDecision, MeterError>;

    /// Actual consumption over `[from, to)`, for overage billing at
    /// period close.
    async fn period_usage(
        &self,
        tenant_id: TenantId,
        from: Timestamp,
        to: Timestamp,
    ) -> Result<PeriodUsage, MeterError>;

    /// Rollup buckets for export and reporting.
    async fn buckets_for(
        &self,
        tenant_id: TenantId,
        granularity: Granularity,
        from: Timestamp,
        to: Timestamp,
    ) -> Result<Vec<UsageBucket>, MeterError>;

    /// Compacts raw samples older than the cutoff into rollup buckets.
    /// Returns the number of samples compacted. Buckets are never
    /// discarded here; retention policy runs above this port, after
    /// billing.
    async fn compact(&self, older_than: Timestamp) -> Result<u64, MeterError>;
}

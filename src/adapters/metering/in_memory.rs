//! In-memory usage meter.
//!
//! Counter layout follows the concurrency contract: totals and
//! month cells are per-tenant shards of atomics, so concurrent writers
//! on one tenant's hot endpoint contend only on that tenant's atomics;
//! never on another tenant's. Sliding-window rate-limit state is one
//! mutex per (tenant, endpoint) cell for the same reason. The outer maps
//! take a write lock only to create a missing cell.

use async_trait::async_trait;
use std::collections::{HashMap, VecDeque};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use tokio::sync::{Mutex, RwLock};

use crate::domain::foundation::{TenantId, Timestamp};
use crate::domain::usage::{
    CallSample, Granularity, IncludedQuotas, PeriodUsage, QuotaStatus, QuotaType, UsageBucket,
    UsageTotals,
};
use crate::ports::{
    MeterError, RateLimitCeiling, RateLimitDecision, TenantMeterConfig, UsageMeter,
};

/// Per-tenant atomic counter shard.
#[derive(Debug, Default)]
struct CounterShard {
    calls: AtomicU64,
    bytes: AtomicU64,
}

/// Key for a rollup bucket cell.
type BucketKey = (TenantId, String, Granularity, Timestamp);

/// Key for a rate-limit window cell.
type WindowKey = (TenantId, String);

fn default_config() -> TenantMeterConfig {
    TenantMeterConfig {
        included: IncludedQuotas {
            api_calls: 1_000_000,
            storage_bytes: 50 << 30,
            bandwidth_bytes: 200 << 30,
        },
        rate_limit: RateLimitCeiling::default(),
    }
}

/// In-memory implementation of `UsageMeter`.
#[derive(Default)]
pub struct InMemoryUsageMeter {
    /// Ceiling applied to tenants with no explicit configuration.
    default_rate_limit: Option<RateLimitCeiling>,

    /// Per-tenant quota and rate-limit configuration.
    configs: RwLock<HashMap<TenantId, TenantMeterConfig>>,

    /// Running totals since meter start, per tenant.
    totals: RwLock<HashMap<TenantId, Arc<CounterShard>>>,

    /// Calendar-month cells, per tenant, for quota accounting.
    months: RwLock<HashMap<(TenantId, Timestamp), Arc<CounterShard>>>,

    /// Sliding-window call timestamps (unix seconds) per (tenant, endpoint).
    windows: RwLock<HashMap<WindowKey, Arc<Mutex<VecDeque<u64>>>>>,

    /// Raw samples not yet compacted into buckets.
    samples: RwLock<Vec<CallSample>>,

    /// Rollup buckets.
    buckets: RwLock<HashMap<BucketKey, UsageBucket>>,

    /// Storage gauge per tenant (bytes currently stored).
    storage: RwLock<HashMap<TenantId, u64>>,

    /// Delta buckets produced by compaction, awaiting a durable flush.
    pending_flush: RwLock<Vec<UsageBucket>>,
}

impl InMemoryUsageMeter {
    /// Creates an empty meter.
    pub fn new() -> Self {
        Self::default()
    }

    /// Overrides the rate-limit ceiling applied to unconfigured tenants.
    pub fn with_default_rate_limit(mut self, ceiling: RateLimitCeiling) -> Self {
        self.default_rate_limit = Some(ceiling);
        self
    }

    /// Takes the delta buckets accumulated by `compact` since the last
    /// call. The rollup flusher upserts these into durable storage;
    /// deltas add into existing cells there.
    pub async fn take_pending_flush(&self) -> Vec<UsageBucket> {
        std::mem::take(&mut *self.pending_flush.write().await)
    }

    /// Sets the storage gauge for a tenant.
    ///
    /// Storage is a level, not a flow: it comes from the storage
    /// subsystem's accounting rather than call samples.
    pub async fn record_storage(&self, tenant_id: TenantId, bytes: u64) {
        self.storage.write().await.insert(tenant_id, bytes);
    }

    async fn config_for(&self, tenant_id: TenantId) -> TenantMeterConfig {
        self.configs
            .read()
            .await
            .get(&tenant_id)
            .copied()
            .unwrap_or_else(|| {
                let mut config = default_config();
                if let Some(ceiling) = self.default_rate_limit {
                    config.rate_limit = ceiling;
                }
                config
            })
    }

    async fn shard<K>(
        map: &RwLock<HashMap<K, Arc<CounterShard>>>,
        key: K,
    ) -> Arc<CounterShard>
    where
        K: std::hash::Hash + Eq + Clone,
    {
        if let Some(shard) = map.read().await.get(&key) {
            return Arc::clone(shard);
        }
        let mut write = map.write().await;
        Arc::clone(write.entry(key).or_default())
    }

    async fn window_cell(&self, key: WindowKey) -> Arc<Mutex<VecDeque<u64>>> {
        if let Some(cell) = self.windows.read().await.get(&key) {
            return Arc::clone(cell);
        }
        let mut write = self.windows.write().await;
        Arc::clone(write.entry(key).or_default())
    }

    /// Month-cell totals for the month containing `at`.
    async fn month_usage(&self, tenant_id: TenantId, at: Timestamp) -> UsageTotals {
        let month = Granularity::Month.bucket_start(&at);
        match self.months.read().await.get(&(tenant_id, month)) {
            Some(shard) => UsageTotals {
                calls: shard.calls.load(Ordering::Relaxed),
                bytes: shard.bytes.load(Ordering::Relaxed),
            },
            None => UsageTotals::default(),
        }
    }
}

#[async_trait]
impl UsageMeter for InMemoryUsageMeter {
    async fn configure_tenant(&self, tenant_id: TenantId, config: TenantMeterConfig) {
        self.configs.write().await.insert(tenant_id, config);
    }

    async fn record_call(&self, sample: CallSample) {
        let tenant_id = sample.tenant_id;

        // Totals and month cell: atomic increments on per-tenant shards.
        let totals = Self::shard(&self.totals, tenant_id).await;
        totals.calls.fetch_add(1, Ordering::Relaxed);
        totals.bytes.fetch_add(sample.bytes, Ordering::Relaxed);

        let month = Granularity::Month.bucket_start(&sample.occurred_at);
        let month_shard = Self::shard(&self.months, (tenant_id, month)).await;
        month_shard.calls.fetch_add(1, Ordering::Relaxed);
        month_shard.bytes.fetch_add(sample.bytes, Ordering::Relaxed);

        // Sliding window for rate limiting.
        let ceiling = self.config_for(tenant_id).await.rate_limit;
        let cell = self
            .window_cell((tenant_id, sample.endpoint.clone()))
            .await;
        {
            let mut window = cell.lock().await;
            let now_secs = sample.occurred_at.as_unix_secs();
            let cutoff = now_secs.saturating_sub(ceiling.window_secs as u64);
            while window.front().is_some_and(|&t| t < cutoff) {
                window.pop_front();
            }
            window.push_back(now_secs);
        }

        // Raw sample, awaiting compaction.
        self.samples.write().await.push(sample);
    }

    async fn current_usage(&self, tenant_id: TenantId) -> Result<UsageTotals, MeterError> {
        Ok(match self.totals.read().await.get(&tenant_id) {
            Some(shard) => UsageTotals {
                calls: shard.calls.load(Ordering::Relaxed),
                bytes: shard.bytes.load(Ordering::Relaxed),
            },
            None => UsageTotals::default(),
        })
    }

    async fn check_quota(
        &self,
        tenant_id: TenantId,
        quota: QuotaType,
    ) -> Result<QuotaStatus, MeterError> {
        let config = self.config_for(tenant_id).await;
        let limit = config.included.included(quota);

        let used = match quota {
            QuotaType::ApiCalls => self.month_usage(tenant_id, Timestamp::now()).await.calls,
            QuotaType::BandwidthBytes => self.month_usage(tenant_id, Timestamp::now()).await.bytes,
            QuotaType::StorageBytes => self
                .storage
                .read()
                .await
                .get(&tenant_id)
                .copied()
                .unwrap_or(0),
        };

        Ok(QuotaStatus::from_counts(used, limit))
    }

    async fn check_rate_limit(
        &self,
        tenant_id: TenantId,
        endpoint: &str,
    ) -> Result<RateLimitDecision, MeterError> {
        let ceiling = self.config_for(tenant_id).await.rate_limit;
        let cell = self
            .window_cell((tenant_id, endpoint.to_string()))
            .await;

        let mut window = cell.lock().await;
        let now_secs = Timestamp::now().as_unix_secs();
        let cutoff = now_secs.saturating_sub(ceiling.window_secs as u64);
        while window.front().is_some_and(|&t| t < cutoff) {
            window.pop_front();
        }

        let in_window = window.len() as u32;
        if in_window < ceiling.max_calls {
            Ok(RateLimitDecision {
                allowed: true,
                limit: ceiling.max_calls,
                retry_after_secs: None,
            })
        } else {
            let oldest = window.front().copied().unwrap_or(now_secs);
            let retry_after = (oldest + ceiling.window_secs as u64).saturating_sub(now_secs) as u32;
            Ok(RateLimitDecision {
                allowed: false,
                limit: ceiling.max_calls,
                retry_after_secs: Some(retry_after.max(1)),
            })
        }
    }

    async fn period_usage(
        &self,
        tenant_id: TenantId,
        from: Timestamp,
        to: Timestamp,
    ) -> Result<PeriodUsage, MeterError> {
        let mut calls = 0u64;
        let mut bytes = 0u64;

        for sample in self.samples.read().await.iter() {
            if sample.tenant_id == tenant_id
                && sample.occurred_at >= from
                && sample.occurred_at < to
            {
                calls += 1;
                bytes += sample.bytes;
            }
        }

        for ((bucket_tenant, _, granularity, bucket_start), bucket) in
            self.buckets.read().await.iter()
        {
            if *bucket_tenant == tenant_id
                && *granularity == Granularity::Day
                && *bucket_start >= Granularity::Day.bucket_start(&from)
                && *bucket_start < to
            {
                calls += bucket.calls;
                bytes += bucket.bytes;
            }
        }

        let storage_bytes = self
            .storage
            .read()
            .await
            .get(&tenant_id)
            .copied()
            .unwrap_or(0);

        Ok(PeriodUsage {
            api_calls: calls,
            storage_bytes,
            bandwidth_bytes: bytes,
        })
    }

    async fn buckets_for(
        &self,
        tenant_id: TenantId,
        granularity: Granularity,
        from: Timestamp,
        to: Timestamp,
    ) -> Result<Vec<UsageBucket>, MeterError> {
        let mut matched: Vec<UsageBucket> = self
            .buckets
            .read()
            .await
            .values()
            .filter(|b| {
                b.tenant_id == tenant_id
                    && b.granularity == granularity
                    && b.bucket_start >= from
                    && b.bucket_start < to
            })
            .cloned()
            .collect();
        matched.sort_by(|a, b| {
            a.bucket_start
                .cmp(&b.bucket_start)
                .then_with(|| a.endpoint.cmp(&b.endpoint))
        });
        Ok(matched)
    }

    async fn compact(&self, older_than: Timestamp) -> Result<u64, MeterError> {
        let drained: Vec<CallSample> = {
            let mut samples = self.samples.write().await;
            let (old, keep): (Vec<_>, Vec<_>) = samples
                .drain(..)
                .partition(|s| s.occurred_at < older_than);
            *samples = keep;
            old
        };

        // Build this compaction's deltas first, then merge: the same
        // deltas feed both the local bucket map and the durable flush
        // queue, so the two can never disagree.
        let mut deltas: HashMap<BucketKey, UsageBucket> = HashMap::new();
        for sample in &drained {
            for granularity in [
                Granularity::Minute,
                Granularity::Hour,
                Granularity::Day,
                Granularity::Month,
            ] {
                let key = (
                    sample.tenant_id,
                    sample.endpoint.clone(),
                    granularity,
                    granularity.bucket_start(&sample.occurred_at),
                );
                deltas
                    .entry(key)
                    .or_insert_with(|| UsageBucket::empty_for(sample, granularity))
                    .absorb(sample);
            }
        }

        {
            let mut buckets = self.buckets.write().await;
            for (key, delta) in &deltas {
                buckets
                    .entry(key.clone())
                    .and_modify(|existing| existing.merge(delta))
                    .or_insert_with(|| delta.clone());
            }
        }
        self.pending_flush
            .write()
            .await
            .extend(deltas.into_values());

        if !drained.is_empty() {
            tracing::debug!(compacted = drained.len(), "usage samples compacted");
        }
        Ok(drained.len() as u64)
    }
}

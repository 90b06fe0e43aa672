//! Usage domain - metering samples, rollups, quotas, and overage pricing.

mod quota;
mod rollup;

pub use quota::{
    compute_overage, overage_total, IncludedQuotas, OverageLine, OverageRates, PeriodUsage,
    QuotaStatus, QuotaType,
};
pub use rollup::{CallSample, Granularity, UsageBucket, UsageTotals};

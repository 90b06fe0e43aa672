//! Analytics domain - read-only reductions over the revenue ledger.
//!
//! Everything here is a pure function of an event slice: no hidden
//! counters, no wall-clock reads, no randomness. Re-running any reduction
//! over the same slice produces identical output.

pub mod churn;
pub mod forecast;
pub mod lifetime;
pub mod metrics;

pub use churn::{churn_risk, ChurnParams, ChurnRisk};
pub use forecast::{forecast_mrr, ForecastParams, RevenueForecast};
pub use lifetime::{customer_lifetime_value, ClvParams, CustomerLifetimeValue};
pub use metrics::{compute_metrics, ReportingPeriod, RevenueMetrics, StreamBreakdown};

//! Revenue reporting query handlers.

pub mod get_revenue_metrics;

pub use get_revenue_metrics::{
    GetRevenueMetricsHandler, GetRevenueMetricsQuery, RevenueReport,
};

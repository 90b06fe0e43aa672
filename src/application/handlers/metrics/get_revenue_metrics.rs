//! GetRevenueMetricsHandler - Query handler for period revenue reporting.

use serde::Serialize;
use std::sync::Arc;

use crate::domain::analytics::{
    churn_risk, compute_metrics, forecast_mrr, ChurnParams, ChurnRisk, ForecastParams,
    ReportingPeriod, RevenueForecast, RevenueMetrics,
};
use crate::domain::foundation::{CurrencyCode, DomainError, TenantId, Timestamp};
use crate::ports::{EventFilter, RevenueLedger};

/// Query for a period revenue report.
#[derive(Debug, Clone)]
pub struct GetRevenueMetricsQuery {
    /// Restrict to one tenant; `None` reports platform-wide.
    pub tenant_id: Option<TenantId>,
    pub period: ReportingPeriod,
    pub currency: CurrencyCode,
    /// Future periods to forecast.
    pub forecast_periods: u32,
}

/// A full revenue report: period metrics, churn risk, and a bounded
/// forecast; every figure a pure reduction over the ledger slice.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RevenueReport {
    pub metrics: RevenueMetrics,
    pub churn: ChurnRisk,
    pub forecast: RevenueForecast,
}

/// Handler for revenue reporting.
pub struct GetRevenueMetricsHandler {
    revenue_ledger: Arc<dyn RevenueLedger>,
}

impl GetRevenueMetricsHandler {
    pub fn new(revenue_ledger: Arc<dyn RevenueLedger>) -> Self {
        Self { revenue_ledger }
    }

    pub async fn handle(&self, query: GetRevenueMetricsQuery) -> Result<RevenueReport, DomainError> {
        let period = query.period;
        let period_days = period.start.whole_days_until(&period.end).max(1);

        // One read covers the reporting period plus the previous period
        // (for growth) and renewal history (for churn).
        let mut filter = EventFilter::default();
        filter.tenant_id = query.tenant_id;
        filter.to = Some(period.end);
        filter.from = Some(period.start.minus_days(period_days * 3));
        let events = self.revenue_ledger.events_for(filter).await?;

        let metrics = compute_metrics(&events, period, query.currency)?;

        let previous_period = ReportingPeriod::new(
            period.start.minus_days(period_days),
            period.start,
        )?;
        let previous = compute_metrics(&events, previous_period, query.currency)?;

        let churn = churn_risk(&events, period.end, ChurnParams::default());
        let forecast = forecast_mrr(
            previous.recurring_revenue,
            metrics.recurring_revenue,
            query.forecast_periods,
            ForecastParams::default(),
        )?;

        Ok(RevenueReport {
            metrics,
            churn,
            forecast,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::memory::InMemoryRevenueLedger;
    use crate::domain::foundation::{CustomerId, Money, RevenueEventId};
    use crate::domain::revenue::{EventSource, RevenueEvent, RevenueEventType};
    use crate::ports::RevenueLedger as _;

    fn usd(cents: i64) -> Money {
        Money::from_cents(cents, CurrencyCode::USD)
    }

    async fn seed(
        ledger: &InMemoryRevenueLedger,
        id: &str,
        tenant_id: TenantId,
        event_type: RevenueEventType,
        cents: i64,
        at: Timestamp,
    ) {
        ledger
            .record(
                RevenueEvent::new(
                    RevenueEventId::new(id).unwrap(),
                    tenant_id,
                    event_type,
                    usd(cents),
                    at,
                    EventSource::Internal,
                )
                .unwrap()
                .with_customer(CustomerId::new()),
            )
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn report_reduces_metrics_churn_and_forecast_together() {
        let ledger = Arc::new(InMemoryRevenueLedger::new());
        let tenant_id = TenantId::new();
        let now = Timestamp::now();

        // Previous period: $1000 recurring. Current period: $1100.
        seed(
            &ledger,
            "prev-renewal",
            tenant_id,
            RevenueEventType::SubscriptionRenewed,
            100_000,
            now.minus_days(45),
        )
        .await;
        seed(
            &ledger,
            "cur-renewal",
            tenant_id,
            RevenueEventType::SubscriptionRenewed,
            110_000,
            now.minus_days(15),
        )
        .await;
        seed(
            &ledger,
            "cur-setup",
            tenant_id,
            RevenueEventType::SetupFee,
            50_000,
            now.minus_days(15),
        )
        .await;

        let handler = GetRevenueMetricsHandler::new(ledger);
        let report = handler
            .handle(GetRevenueMetricsQuery {
                tenant_id: Some(tenant_id),
                period: ReportingPeriod::trailing_days(now, 30),
                currency: CurrencyCode::USD,
                forecast_periods: 2,
            })
            .await
            .unwrap();

        assert_eq!(report.metrics.total_revenue, usd(160_000));
        assert_eq!(report.metrics.recurring_revenue, usd(110_000));
        // 10% growth, clamped well inside the bound.
        assert_eq!(report.forecast.growth_permille, 100);
        assert_eq!(report.forecast.projected.len(), 2);
        // Both renewal customers are current.
        assert_eq!(report.churn.at_risk_customers, 1); // prev customer lapsed
        assert_eq!(report.churn.total_customers, 2);
    }

    #[tokio::test]
    async fn scoped_report_ignores_other_tenants() {
        let ledger = Arc::new(InMemoryRevenueLedger::new());
        let mine = TenantId::new();
        let now = Timestamp::now();

        seed(
            &ledger,
            "mine",
            mine,
            RevenueEventType::SubscriptionRenewed,
            100_000,
            now.minus_days(5),
        )
        .await;
        seed(
            &ledger,
            "other",
            TenantId::new(),
            RevenueEventType::SubscriptionRenewed,
            900_000,
            now.minus_days(5),
        )
        .await;

        let handler = GetRevenueMetricsHandler::new(ledger);
        let report = handler
            .handle(GetRevenueMetricsQuery {
                tenant_id: Some(mine),
                period: ReportingPeriod::trailing_days(now, 30),
                currency: CurrencyCode::USD,
                forecast_periods: 0,
            })
            .await
            .unwrap();

        assert_eq!(report.metrics.total_revenue, usd(100_000));
    }

    #[tokio::test]
    async fn rerunning_the_report_is_deterministic() {
        let ledger = Arc::new(InMemoryRevenueLedger::new());
        let tenant_id = TenantId::new();
        let now = Timestamp::now();
        seed(
            &ledger,
            "r1",
            tenant_id,
            RevenueEventType::SubscriptionRenewed,
            150_000,
            now.minus_days(3),
        )
        .await;

        let handler = GetRevenueMetricsHandler::new(ledger);
        let query = GetRevenueMetricsQuery {
            tenant_id: Some(tenant_id),
            period: ReportingPeriod::trailing_days(now, 30),
            currency: CurrencyCode::USD,
            forecast_periods: 3,
        };

        let a = handler.handle(query.clone()).await.unwrap();
        let b = handler.handle(query).await.unwrap();
        assert_eq!(
            serde_json::to_string(&a).unwrap(),
            serde_json::to_string(&b).unwrap()
        );
    }
}

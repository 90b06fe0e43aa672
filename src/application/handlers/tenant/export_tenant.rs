//! ExportTenantHandler - Query handler for full tenant data export.

use serde::Serialize;
use std::sync::Arc;

use crate::domain::customer::Customer;
use crate::domain::foundation::{DomainError, ErrorCode, TenantId, Timestamp};
use crate::domain::revenue::RevenueEvent;
use crate::domain::subscription::Subscription;
use crate::domain::tenant::Tenant;
use crate::domain::usage::{Granularity, UsageBucket};
use crate::ports::{
    CustomerRepository, EventFilter, RevenueLedger, SubscriptionRepository, TenantRepository,
    UsageMeter,
};

/// Query for a tenant's full data snapshot.
#[derive(Debug, Clone)]
pub struct ExportTenantQuery {
    pub tenant_id: TenantId,
    /// Earliest usage/revenue data to include.
    pub from: Timestamp,
    /// Latest usage/revenue data to include (exclusive).
    pub to: Timestamp,
}

/// A complete, strictly tenant-scoped snapshot.
///
/// Everything a white-label tenant needs to take its data elsewhere:
/// the tenant record, its customers, subscriptions, day-level usage
/// rollups, and every revenue event. Nothing from any other tenant can
/// appear here; each section is fetched through a tenant-scoped query.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TenantExport {
    pub tenant: Tenant,
    pub customers: Vec<Customer>,
    pub subscriptions: Vec<Subscription>,
    pub usage_rollups: Vec<UsageBucket>,
    pub revenue_events: Vec<RevenueEvent>,
    pub exported_at: Timestamp,
}

/// Handler for tenant export.
pub struct ExportTenantHandler {
    tenant_repository: Arc<dyn TenantRepository>,
    customer_repository: Arc<dyn CustomerRepository>,
    subscription_repository: Arc<dyn SubscriptionRepository>,
    revenue_ledger: Arc<dyn RevenueLedger>,
    usage_meter: Arc<dyn UsageMeter>,
}

impl ExportTenantHandler {
    pub fn new(
        tenant_repository: Arc<dyn TenantRepository>,
        customer_repository: Arc<dyn CustomerRepository>,
        subscription_repository: Arc<dyn SubscriptionRepository>,
        revenue_ledger: Arc<dyn RevenueLedger>,
        usage_meter: Arc<dyn UsageMeter>,
    ) -> Self {
        Self {
            tenant_repository,
            customer_repository,
            subscription_repository,
            revenue_ledger,
            usage_meter,
        }
    }

    pub async fn handle(&self, query: ExportTenantQuery) -> Result<TenantExport, DomainError> {
        let tenant = self
            .tenant_repository
            .find_by_id(query.tenant_id)
            .await?
            .ok_or_else(|| {
                DomainError::new(ErrorCode::TenantNotFound, "Tenant not found")
                    .with_detail("tenant_id", query.tenant_id.to_string())
            })?;

        let customers = self.customer_repository.list_by_tenant(tenant.id).await?;
        let subscriptions = self
            .subscription_repository
            .list_by_tenant(tenant.id)
            .await?;
        let usage_rollups = self
            .usage_meter
            .buckets_for(tenant.id, Granularity::Day, query.from, query.to)
            .await
            .map_err(|e| DomainError::new(ErrorCode::InternalError, e.to_string()))?;
        let revenue_events = self
            .revenue_ledger
            .events_for(EventFilter::for_tenant(tenant.id).between(query.from, query.to))
            .await?;

        Ok(TenantExport {
            tenant,
            customers,
            subscriptions,
            usage_rollups,
            revenue_events,
            exported_at: Timestamp::now(),
        })
    }
}

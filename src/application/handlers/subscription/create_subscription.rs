//! CreateSubscriptionHandler - Command handler for starting a subscription.

use std::sync::Arc;

use crate::domain::foundation::{
    DomainError, ErrorCode, RevenueEventId, SubscriptionId, TenantId, TenantScoped, TierId,
    Timestamp,
};
use crate::domain::revenue::{EventSource, RevenueEvent, RevenueEventType, RevenueStream};
use crate::domain::subscription::{BillingCycle, Subscription, TierCatalog, TrialWindow};
use crate::domain::tenant::{Tenant, TenantKind};
use crate::ports::{
    CustomerRepository, RevenueLedger, SubscriptionRepository, TenantRepository,
};

/// Command to start a subscription for an existing customer.
#[derive(Debug, Clone)]
pub struct CreateSubscriptionCommand {
    pub tenant_id: TenantId,
    pub customer_id: crate::domain::foundation::CustomerId,
    pub tier_id: TierId,
    pub billing_cycle: BillingCycle,
    pub trial: Option<TrialWindow>,
}

/// Result of a successful subscription creation.
#[derive(Debug, Clone)]
pub struct CreateSubscriptionResult {
    pub subscription: Subscription,
    /// The subscription-created and (if any) setup-fee events recorded.
    pub recorded_events: Vec<RevenueEvent>,
}

/// Handler for subscription creation.
///
/// Validates the tier against the catalog and the customer against the
/// tenant boundary, persists the subscription (the repository enforces
/// the one-live-per-family invariant), and appends the creation and
/// setup-fee revenue events.
pub struct CreateSubscriptionHandler {
    tenant_repository: Arc<dyn TenantRepository>,
    customer_repository: Arc<dyn CustomerRepository>,
    subscription_repository: Arc<dyn SubscriptionRepository>,
    revenue_ledger: Arc<dyn RevenueLedger>,
    catalog: Arc<TierCatalog>,
}

impl CreateSubscriptionHandler {
    pub fn new(
        tenant_repository: Arc<dyn TenantRepository>,
        customer_repository: Arc<dyn CustomerRepository>,
        subscription_repository: Arc<dyn SubscriptionRepository>,
        revenue_ledger: Arc<dyn RevenueLedger>,
        catalog: Arc<TierCatalog>,
    ) -> Self {
        Self {
            tenant_repository,
            customer_repository,
            subscription_repository,
            revenue_ledger,
            catalog,
        }
    }

    pub async fn handle(
        &self,
        cmd: CreateSubscriptionCommand,
    ) -> Result<CreateSubscriptionResult, DomainError> {
        let tenant = self
            .tenant_repository
            .find_by_id(cmd.tenant_id)
            .await?
            .ok_or_else(|| {
                DomainError::new(ErrorCode::TenantNotFound, "Tenant not found")
                    .with_detail("tenant_id", cmd.tenant_id.to_string())
            })?;
        if !tenant.status.is_operational() {
            return Err(DomainError::new(
                ErrorCode::TenantSuspended,
                "Tenant is not operational",
            ));
        }

        let customer = self
            .customer_repository
            .find_by_id(cmd.customer_id)
            .await?
            .ok_or_else(|| {
                DomainError::new(ErrorCode::CustomerNotFound, "Customer not found")
                    .with_detail("customer_id", cmd.customer_id.to_string())
            })?;
        // The customer must already be bound to the same tenant.
        customer.check_tenant(&cmd.tenant_id)?;

        let tier = self.catalog.find(&cmd.tier_id).ok_or_else(|| {
            DomainError::new(ErrorCode::TierNotFound, "Tier not in catalog")
                .with_detail("tier_id", cmd.tier_id.to_string())
        })?;

        let now = Timestamp::now();
        let subscription = Subscription::create(
            SubscriptionId::new(),
            tenant.id,
            customer.id,
            tier,
            cmd.billing_cycle,
            cmd.trial,
            now,
        )?;

        self.subscription_repository.save(&subscription).await?;

        let stream = stream_for(&tenant);
        let mut recorded_events = Vec::new();

        let created = RevenueEvent::new(
            RevenueEventId::new(format!("created-{}", subscription.id))?,
            tenant.id,
            RevenueEventType::SubscriptionCreated,
            subscription.price,
            now,
            EventSource::Internal,
        )?
        .with_subscription(subscription.id)
        .with_customer(customer.id)
        .with_stream(stream)
        .with_metadata("tier_id", tier.id.as_str());
        self.revenue_ledger.record(created.clone()).await?;
        recorded_events.push(created);

        if !tier.setup_fee.is_zero() {
            let setup = RevenueEvent::new(
                RevenueEventId::new(format!("setup-{}", subscription.id))?,
                tenant.id,
                RevenueEventType::SetupFee,
                tier.setup_fee,
                now,
                EventSource::Internal,
            )?
            .with_subscription(subscription.id)
            .with_customer(customer.id)
            .with_stream(stream);
            self.revenue_ledger.record(setup.clone()).await?;
            recorded_events.push(setup);
        }

        tracing::info!(
            subscription_id = %subscription.id,
            tenant_id = %tenant.id,
            tier = %tier.id,
            "subscription created"
        );
        Ok(CreateSubscriptionResult {
            subscription,
            recorded_events,
        })
    }
}

/// Revenue stream a tenant's subscription charges are attributed to.
pub fn stream_for(tenant: &Tenant) -> RevenueStream {
    match tenant.kind {
        TenantKind::Individual => RevenueStream::Consumer,
        TenantKind::GolfCourse | TenantKind::EnterpriseChain => RevenueStream::WhiteLabel,
    }
}

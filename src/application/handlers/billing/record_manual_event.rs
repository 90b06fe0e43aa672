//! RecordManualEventHandler - Command handler for manual ledger corrections.

use std::collections::BTreeMap;
use std::sync::Arc;

use crate::domain::foundation::{
    CustomerId, DomainError, ErrorCode, InvoiceId, Money, RevenueEventId, SubscriptionId,
    TenantId, Timestamp,
};
use crate::domain::revenue::{EventSource, RevenueEvent, RevenueEventType};
use crate::ports::{RecordOutcome, RevenueLedger, TenantRepository};

/// Command to append a manual revenue event.
///
/// Corrections are always additive: a wrong charge is fixed by
/// appending an offsetting refund/migration event, never by editing
/// history.
#[derive(Debug, Clone)]
pub struct RecordManualEventCommand {
    pub event_id: String,
    pub tenant_id: TenantId,
    pub event_type: RevenueEventType,
    pub amount: Money,
    pub subscription_id: Option<SubscriptionId>,
    pub customer_id: Option<CustomerId>,
    pub invoice_id: Option<InvoiceId>,
    pub metadata: BTreeMap<String, String>,
    /// Operator identity, kept in metadata for audit.
    pub entered_by: String,
}

/// Handler for manual revenue entries.
pub struct RecordManualEventHandler {
    tenant_repository: Arc<dyn TenantRepository>,
    revenue_ledger: Arc<dyn RevenueLedger>,
}

impl RecordManualEventHandler {
    pub fn new(
        tenant_repository: Arc<dyn TenantRepository>,
        revenue_ledger: Arc<dyn RevenueLedger>,
    ) -> Self {
        Self {
            tenant_repository,
            revenue_ledger,
        }
    }

    pub async fn handle(
        &self,
        cmd: RecordManualEventCommand,
    ) -> Result<RecordOutcome, DomainError> {
        if self
            .tenant_repository
            .find_by_id(cmd.tenant_id)
            .await?
            .is_none()
        {
            return Err(
                DomainError::new(ErrorCode::TenantNotFound, "Tenant not found")
                    .with_detail("tenant_id", cmd.tenant_id.to_string()),
            );
        }

        let mut event = RevenueEvent::new(
            RevenueEventId::new(cmd.event_id)?,
            cmd.tenant_id,
            cmd.event_type,
            cmd.amount,
            Timestamp::now(),
            EventSource::Manual,
        )?
        .with_metadata("entered_by", cmd.entered_by);

        if let Some(id) = cmd.subscription_id {
            event = event.with_subscription(id);
        }
        if let Some(id) = cmd.customer_id {
            event = event.with_customer(id);
        }
        if let Some(id) = cmd.invoice_id {
            event = event.with_invoice(id);
        }
        for (key, value) in cmd.metadata {
            event = event.with_metadata(key, value);
        }

        let outcome = self.revenue_ledger.record(event).await?;
        tracing::info!(tenant_id = %cmd.tenant_id, ?outcome, "manual revenue event recorded");
        Ok(outcome)
    }
}

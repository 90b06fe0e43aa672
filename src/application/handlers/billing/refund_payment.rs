//! RefundPaymentHandler - Command handler for refunding a settled charge.

use std::sync::Arc;

use crate::domain::foundation::{
    CustomerId, DomainError, ErrorCode, Money, RevenueEventId, TenantId, Timestamp,
};
use crate::domain::revenue::{EventSource, RevenueEvent, RevenueEventType};
use crate::ports::{ChargeStatus, PaymentProcessor, RefundRequest, RevenueLedger};

/// Command to refund part or all of a settled charge.
#[derive(Debug, Clone)]
pub struct RefundPaymentCommand {
    pub tenant_id: TenantId,
    pub customer_id: Option<CustomerId>,
    /// Positive amount to return to the customer.
    pub amount: Money,
    /// Processor reference of the original charge.
    pub processor_reference: String,
    /// Reason tag kept in the event metadata.
    pub reason: String,
}

/// Handler for refunds.
///
/// Runs the refund through the processor, then appends an offsetting
/// (negative) Revenue Event; the original charge is never touched.
pub struct RefundPaymentHandler {
    payment_processor: Arc<dyn PaymentProcessor>,
    revenue_ledger: Arc<dyn RevenueLedger>,
}

impl RefundPaymentHandler {
    pub fn new(
        payment_processor: Arc<dyn PaymentProcessor>,
        revenue_ledger: Arc<dyn RevenueLedger>,
    ) -> Self {
        Self {
            payment_processor,
            revenue_ledger,
        }
    }

    pub async fn handle(&self, cmd: RefundPaymentCommand) -> Result<RevenueEvent, DomainError> {
        if cmd.amount.is_negative() || cmd.amount.is_zero() {
            return Err(DomainError::validation(
                "amount",
                "refund amount must be positive",
            ));
        }

        let event_id =
            RevenueEventId::new(format!("refund-{}", cmd.processor_reference))?;

        let outcome = self
            .payment_processor
            .refund(RefundRequest {
                amount: cmd.amount,
                processor_reference: cmd.processor_reference.clone(),
                idempotency_key: event_id.to_string(),
            })
            .await
            .map_err(|err| {
                DomainError::new(ErrorCode::PaymentProcessorError, err.to_string())
                    .with_detail("retryable", err.retryable.to_string())
            })?;

        if !outcome.status.is_success() {
            let reason = match outcome.status {
                ChargeStatus::Declined { reason } => reason,
                ChargeStatus::Succeeded => unreachable!(),
            };
            return Err(
                DomainError::new(ErrorCode::PaymentDeclined, "Refund was declined")
                    .with_detail("reason", reason),
            );
        }

        let mut event = RevenueEvent::new(
            event_id,
            cmd.tenant_id,
            RevenueEventType::Refund,
            cmd.amount.negated(),
            Timestamp::now(),
            EventSource::PaymentProcessor,
        )?
        .with_metadata("reason", cmd.reason)
        .with_metadata("processor_reference", outcome.processor_reference);
        if let Some(customer_id) = cmd.customer_id {
            event = event.with_customer(customer_id);
        }

        self.revenue_ledger.record(event.clone()).await?;
        tracing::info!(
            tenant_id = %cmd.tenant_id,
            refunded_cents = cmd.amount.amount_cents,
            "refund recorded"
        );
        Ok(event)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::memory::InMemoryRevenueLedger;
    use crate::adapters::payment::MockPaymentProcessor;
    use crate::domain::foundation::CurrencyCode;
    use crate::ports::EventFilter;

    fn usd(cents: i64) -> Money {
        Money::from_cents(cents, CurrencyCode::USD)
    }

    #[tokio::test]
    async fn refund_appends_a_negative_event() {
        let processor = Arc::new(MockPaymentProcessor::new());
        let ledger = Arc::new(InMemoryRevenueLedger::new());
        let handler = RefundPaymentHandler::new(processor, ledger.clone());
        let tenant_id = TenantId::new();

        let event = handler
            .handle(RefundPaymentCommand {
                tenant_id,
                customer_id: None,
                amount: usd(46_667),
                processor_reference: "ch_42".to_string(),
                reason: "billing-error".to_string(),
            })
            .await
            .unwrap();

        assert_eq!(event.amount, usd(-46_667));
        assert_eq!(event.event_type, RevenueEventType::Refund);

        let events = ledger
            .events_for(EventFilter::for_tenant(tenant_id))
            .await
            .unwrap();
        assert_eq!(events.len(), 1);
    }

    #[tokio::test]
    async fn nonpositive_amount_is_rejected() {
        let processor = Arc::new(MockPaymentProcessor::new());
        let ledger = Arc::new(InMemoryRevenueLedger::new());
        let handler = RefundPaymentHandler::new(processor, ledger);

        let err = handler
            .handle(RefundPaymentCommand {
                tenant_id: TenantId::new(),
                customer_id: None,
                amount: usd(-100),
                processor_reference: "ch_42".to_string(),
                reason: "test".to_string(),
            })
            .await
            .unwrap_err();
        assert_eq!(err.code, ErrorCode::ValidationFailed);
    }
}

//! PayInvoiceHandler - Command handler for settling an invoice.

use std::collections::BTreeMap;
use std::sync::Arc;

use crate::domain::foundation::{
    DomainError, ErrorCode, InvoiceId, RevenueEventId, Timestamp,
};
use crate::domain::invoice::Invoice;
use crate::domain::revenue::{EventSource, RevenueEvent, RevenueEventType};
use crate::ports::{
    ChargeRequest, ChargeStatus, InvoiceRepository, PaymentProcessor, RevenueLedger,
};

/// Command to pay a sent invoice.
#[derive(Debug, Clone)]
pub struct PayInvoiceCommand {
    pub invoice_id: InvoiceId,
    pub payment_method_token: String,
}

/// Outcome of a payment attempt. A decline is a result, not an error.
#[derive(Debug, Clone)]
pub enum PayInvoiceOutcome {
    /// Funds captured; the invoice is paid and the ledger updated.
    Paid(Invoice),

    /// The processor declined; the invoice stays `Sent`.
    Declined { invoice: Invoice, reason: String },
}

/// Handler for invoice payment.
///
/// The idempotency key and the Revenue Event id are both derived from
/// the invoice id, so an ambiguous network failure followed by a retry
/// settles exactly once on both sides.
pub struct PayInvoiceHandler {
    invoice_repository: Arc<dyn InvoiceRepository>,
    payment_processor: Arc<dyn PaymentProcessor>,
    revenue_ledger: Arc<dyn RevenueLedger>,
}

impl PayInvoiceHandler {
    pub fn new(
        invoice_repository: Arc<dyn InvoiceRepository>,
        payment_processor: Arc<dyn PaymentProcessor>,
        revenue_ledger: Arc<dyn RevenueLedger>,
    ) -> Self {
        Self {
            invoice_repository,
            payment_processor,
            revenue_ledger,
        }
    }

    pub async fn handle(&self, cmd: PayInvoiceCommand) -> Result<PayInvoiceOutcome, DomainError> {
        let mut invoice = self
            .invoice_repository
            .find_by_id(cmd.invoice_id)
            .await?
            .ok_or_else(|| {
                DomainError::new(ErrorCode::InvoiceNotFound, "Invoice not found")
                    .with_detail("invoice_id", cmd.invoice_id.to_string())
            })?;

        let total = invoice.total()?;
        let event_id = RevenueEventId::new(format!("invoice-paid-{}", invoice.id))?;

        let mut metadata = BTreeMap::new();
        metadata.insert("invoice_id".to_string(), invoice.id.to_string());

        let outcome = self
            .payment_processor
            .charge(ChargeRequest {
                amount: total,
                payment_method_token: cmd.payment_method_token,
                idempotency_key: event_id.to_string(),
                metadata,
            })
            .await
            .map_err(|err| {
                DomainError::new(ErrorCode::PaymentProcessorError, err.to_string())
                    .with_detail("retryable", err.retryable.to_string())
            })?;

        match outcome.status {
            ChargeStatus::Succeeded => {
                let now = Timestamp::now();
                invoice.mark_paid(now)?;
                self.invoice_repository.update(&invoice).await?;

                let event = RevenueEvent::new(
                    event_id,
                    invoice.tenant_id,
                    RevenueEventType::AddOnPurchase,
                    total,
                    now,
                    EventSource::PaymentProcessor,
                )?
                .with_customer(invoice.customer_id)
                .with_invoice(invoice.id)
                .with_metadata("processor_reference", outcome.processor_reference);
                self.revenue_ledger.record(event).await?;

                Ok(PayInvoiceOutcome::Paid(invoice))
            }
            ChargeStatus::Declined { reason } => {
                invoice.record_attempt(Timestamp::now().add_days(1));
                self.invoice_repository.update(&invoice).await?;
                tracing::warn!(invoice_id = %invoice.id, reason = %reason, "invoice payment declined");
                Ok(PayInvoiceOutcome::Declined { invoice, reason })
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::memory::{InMemoryInvoiceRepository, InMemoryRevenueLedger};
    use crate::adapters::payment::{MockPaymentProcessor, ScriptedResult};
    use crate::domain::foundation::{CurrencyCode, CustomerId, Money, TenantId};
    use crate::domain::invoice::{InvoiceStatus, LineItem};
    use crate::ports::{EventFilter, ProcessorError};

    fn usd(cents: i64) -> Money {
        Money::from_cents(cents, CurrencyCode::USD)
    }

    async fn sent_invoice(repo: &InMemoryInvoiceRepository) -> Invoice {
        let mut invoice = Invoice::draft(
            InvoiceId::new(),
            TenantId::new(),
            CustomerId::new(),
            CurrencyCode::USD,
            Timestamp::now().add_days(14),
        );
        invoice
            .add_line_item(LineItem::new("Renewal", usd(120_000), 1))
            .unwrap();
        invoice.send().unwrap();
        repo.save(&invoice).await.unwrap();
        invoice
    }

    fn handler(
        invoices: Arc<InMemoryInvoiceRepository>,
        processor: Arc<MockPaymentProcessor>,
        ledger: Arc<InMemoryRevenueLedger>,
    ) -> PayInvoiceHandler {
        PayInvoiceHandler::new(invoices, processor, ledger)
    }

    #[tokio::test]
    async fn successful_payment_marks_paid_and_records_revenue() {
        let invoices = Arc::new(InMemoryInvoiceRepository::new());
        let processor = Arc::new(MockPaymentProcessor::new());
        let ledger = Arc::new(InMemoryRevenueLedger::new());
        let invoice = sent_invoice(&invoices).await;
        let handler = handler(invoices.clone(), processor, ledger.clone());

        let outcome = handler
            .handle(PayInvoiceCommand {
                invoice_id: invoice.id,
                payment_method_token: "pm_test".to_string(),
            })
            .await
            .unwrap();

        let PayInvoiceOutcome::Paid(paid) = outcome else {
            panic!("expected paid outcome");
        };
        assert_eq!(paid.status, InvoiceStatus::Paid);

        let events = ledger
            .events_for(EventFilter::for_tenant(invoice.tenant_id))
            .await
            .unwrap();
        assert_eq!(events.len(), 1);
        assert_eq!(events[0].amount, usd(120_000));
        assert_eq!(events[0].invoice_id, Some(invoice.id));
    }

    #[tokio::test]
    async fn decline_keeps_invoice_sent_and_ledger_untouched() {
        let invoices = Arc::new(InMemoryInvoiceRepository::new());
        let processor = Arc::new(MockPaymentProcessor::new());
        processor.script(ScriptedResult::Decline("card_expired".to_string()));
        let ledger = Arc::new(InMemoryRevenueLedger::new());
        let invoice = sent_invoice(&invoices).await;
        let handler = handler(invoices.clone(), processor, ledger.clone());

        let outcome = handler
            .handle(PayInvoiceCommand {
                invoice_id: invoice.id,
                payment_method_token: "pm_test".to_string(),
            })
            .await
            .unwrap();

        let PayInvoiceOutcome::Declined { invoice, reason } = outcome else {
            panic!("expected declined outcome");
        };
        assert_eq!(reason, "card_expired");
        assert_eq!(invoice.status, InvoiceStatus::Sent);
        assert_eq!(invoice.attempt_count, 1);
        assert!(ledger.is_empty().await);
    }

    #[tokio::test]
    async fn retry_after_ambiguous_failure_settles_exactly_once() {
        let invoices = Arc::new(InMemoryInvoiceRepository::new());
        let processor = Arc::new(MockPaymentProcessor::new());
        processor.script(ScriptedResult::Fail(ProcessorError::timeout("no answer")));
        let ledger = Arc::new(InMemoryRevenueLedger::new());
        let invoice = sent_invoice(&invoices).await;
        let handler = handler(invoices.clone(), processor, ledger.clone());
        let cmd = PayInvoiceCommand {
            invoice_id: invoice.id,
            payment_method_token: "pm_test".to_string(),
        };

        let err = handler.handle(cmd.clone()).await.unwrap_err();
        assert_eq!(err.code, ErrorCode::PaymentProcessorError);

        // The retry uses the same idempotency key and event id.
        let outcome = handler.handle(cmd).await.unwrap();
        assert!(matches!(outcome, PayInvoiceOutcome::Paid(_)));
        assert_eq!(ledger.len().await, 1);
    }

    #[tokio::test]
    async fn missing_invoice_is_not_found() {
        let invoices = Arc::new(InMemoryInvoiceRepository::new());
        let processor = Arc::new(MockPaymentProcessor::new());
        let ledger = Arc::new(InMemoryRevenueLedger::new());
        let handler = handler(invoices, processor, ledger);

        let err = handler
            .handle(PayInvoiceCommand {
                invoice_id: InvoiceId::new(),
                payment_method_token: "pm_test".to_string(),
            })
            .await
            .unwrap_err();
        assert_eq!(err.code, ErrorCode::InvoiceNotFound);
    }
}

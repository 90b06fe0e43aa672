//! CreateInvoiceHandler - Command handler for drafting and issuing invoices.

use std::sync::Arc;

use crate::domain::foundation::{
    CurrencyCode, CustomerId, DomainError, ErrorCode, InvoiceId, TenantId, TenantScoped,
    Timestamp,
};
use crate::domain::invoice::{Invoice, LineItem};
use crate::ports::{CustomerRepository, InvoiceRepository};

/// Command to create and issue an invoice.
#[derive(Debug, Clone)]
pub struct CreateInvoiceCommand {
    pub tenant_id: TenantId,
    pub customer_id: CustomerId,
    pub currency: CurrencyCode,
    pub items: Vec<LineItem>,
    pub due_date: Timestamp,
}

/// Handler for invoice creation.
///
/// Builds the draft, adds every line item (the aggregate rejects
/// currency mismatches so the total stays well-defined), issues it, and
/// persists it in `Sent` status ready for payment.
pub struct CreateInvoiceHandler {
    customer_repository: Arc<dyn CustomerRepository>,
    invoice_repository: Arc<dyn InvoiceRepository>,
}

impl CreateInvoiceHandler {
    pub fn new(
        customer_repository: Arc<dyn CustomerRepository>,
        invoice_repository: Arc<dyn InvoiceRepository>,
    ) -> Self {
        Self {
            customer_repository,
            invoice_repository,
        }
    }

    pub async fn handle(&self, cmd: CreateInvoiceCommand) -> Result<Invoice, DomainError> {
        let customer = self
            .customer_repository
            .find_by_id(cmd.customer_id)
            .await?
            .ok_or_else(|| {
                DomainError::new(ErrorCode::CustomerNotFound, "Customer not found")
                    .with_detail("customer_id", cmd.customer_id.to_string())
            })?;
        customer.check_tenant(&cmd.tenant_id)?;

        if cmd.items.is_empty() {
            return Err(DomainError::validation(
                "items",
                "an invoice needs at least one line item",
            ));
        }

        let mut invoice = Invoice::draft(
            InvoiceId::new(),
            cmd.tenant_id,
            customer.id,
            cmd.currency,
            cmd.due_date,
        );
        for item in cmd.items {
            invoice.add_line_item(item)?;
        }
        invoice.send()?;

        self.invoice_repository.save(&invoice).await?;
        Ok(invoice)
    }
}

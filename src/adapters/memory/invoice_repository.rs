//! In-memory invoice repository for testing and single-process use.

use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;

use crate::domain::foundation::{CustomerId, DomainError, ErrorCode, InvoiceId, TenantId};
use crate::domain::invoice::Invoice;
use crate::ports::InvoiceRepository;

/// Deterministic in-memory implementation of `InvoiceRepository`.
#[derive(Debug, Default)]
pub struct InMemoryInvoiceRepository {
    invoices: Arc<RwLock<HashMap<InvoiceId, Invoice>>>,
}

impl InMemoryInvoiceRepository {
    /// Creates an empty repository.
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl InvoiceRepository for InMemoryInvoiceRepository {
    async fn save(&self, invoice: &Invoice) -> Result<(), DomainError> {
        self.invoices
            .write()
            .await
            .insert(invoice.id, invoice.clone());
        Ok(())
    }

    async fn update(&self, invoice: &Invoice) -> Result<(), DomainError> {
        let mut invoices = self.invoices.write().await;
        if !invoices.contains_key(&invoice.id) {
            return Err(DomainError::new(ErrorCode::InvoiceNotFound, "Invoice not found")
                .with_detail("invoice_id", invoice.id.to_string()));
        }
        invoices.insert(invoice.id, invoice.clone());
        Ok(())
    }

    async fn find_by_id(&self, id: InvoiceId) -> Result<Option<Invoice>, DomainError> {
        Ok(self.invoices.read().await.get(&id).cloned())
    }

    async fn list_by_customer(
        &self,
        tenant_id: TenantId,
        customer_id: CustomerId,
    ) -> Result<Vec<Invoice>, DomainError> {
        let mut list: Vec<Invoice> = self
            .invoices
            .read()
            .await
            .values()
            .filter(|i| i.tenant_id == tenant_id && i.customer_id == customer_id)
            .cloned()
            .collect();
        list.sort_by_key(|i| (i.created_at, i.id.to_string()));
        Ok(list)
    }

    async fn list_by_tenant(&self, tenant_id: TenantId) -> Result<Vec<Invoice>, DomainError> {
        let mut list: Vec<Invoice> = self
            .invoices
            .read()
            .await
            .values()
            .filter(|i| i.tenant_id == tenant_id)
            .cloned()
            .collect();
        list.sort_by_key(|i| (i.created_at, i.id.to_string()));
        Ok(list)
    }
}

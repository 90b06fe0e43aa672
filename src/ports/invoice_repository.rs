//! InvoiceRepository port - persistence for invoices.

use async_trait::async_trait;

use crate::domain::foundation::{CustomerId, DomainError, InvoiceId, TenantId};
use crate::domain::invoice::Invoice;

/// Port for invoice persistence.
#[async_trait]
pub trait InvoiceRepository: Send + Sync {
    /// Persists a new invoice.
    async fn save(&self, invoice: &Invoice) -> Result<(), DomainError>;

    /// Updates an existing invoice.
    ///
    /// # Errors
    ///
    /// `InvoiceNotFound` if absent.
    async fn update(&self, invoice: &Invoice) -> Result<(), DomainError>;

    /// Finds an invoice by id.
    async fn find_by_id(&self, id: InvoiceId) -> Result<Option<Invoice>, DomainError>;

    /// Lists a customer's invoices within a tenant.
    async fn list_by_customer(
        &self,
        tenant_id: TenantId,
        customer_id: CustomerId,
    ) -> Result<Vec<Invoice>, DomainError>;

    /// Lists a tenant's invoices.
    async fn list_by_tenant(&self, tenant_id: TenantId) -> Result<Vec<Invoice>, DomainError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn invoice_repository_is_object_safe() {
        fn _accepts_dyn(_repo: &dyn InvoiceRepository) {}
    }
}

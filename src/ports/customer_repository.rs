//! CustomerRepository port - persistence for billing identities.

use async_trait::async_trait;

use crate::domain::customer::Customer;
use crate::domain::foundation::{CustomerId, DomainError, TenantId};

/// Port for customer persistence.
///
/// Customers are strictly tenant-partitioned: every query is scoped by
/// tenant, and implementations must never return a customer to a query
/// scoped to another tenant.
#[async_trait]
pub trait CustomerRepository: Send + Sync {
    /// Persists a new customer.
    ///
    /// # Errors
    ///
    /// `DuplicateCustomer` if the (tenant, email) pair already exists.
    async fn save(&self, customer: &Customer) -> Result<(), DomainError>;

    /// Finds a customer by id.
    async fn find_by_id(&self, id: CustomerId) -> Result<Option<Customer>, DomainError>;

    /// Finds a customer by email within one tenant.
    async fn find_by_email(
        &self,
        tenant_id: TenantId,
        email: &str,
    ) -> Result<Option<Customer>, DomainError>;

    /// Lists a tenant's customers.
    async fn list_by_tenant(&self, tenant_id: TenantId) -> Result<Vec<Customer>, DomainError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn customer_repository_is_object_safe() {
        fn _accepts_dyn(_repo: &dyn CustomerRepository) {}
    }
}

//! In-memory customer repository for testing and single-process use.

use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;

use crate::domain::customer::Customer;
use crate::domain::foundation::{CustomerId, DomainError, ErrorCode, TenantId};
use crate::ports::CustomerRepository;

/// Deterministic in-memory implementation of `CustomerRepository`.
#[derive(Debug, Default)]
pub struct InMemoryCustomerRepository {
    customers: Arc<RwLock<HashMap<CustomerId, Customer>>>,
}

impl InMemoryCustomerRepository {
    /// Creates an empty repository.
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl CustomerRepository for InMemoryCustomerRepository {
    async fn save(&self, customer: &Customer) -> Result<(), DomainError> {
        let mut customers = self.customers.write().await;

        let duplicate = customers
            .values()
            .any(|c| c.tenant_id == customer.tenant_id && c.email == customer.email);
        if duplicate {
            return Err(DomainError::new(
                ErrorCode::DuplicateCustomer,
                format!("Customer '{}' already exists in tenant", customer.email),
            )
            .with_detail("email", customer.email.clone()));
        }

        customers.insert(customer.id, customer.clone());
        Ok(())
    }

    async fn find_by_id(&self, id: CustomerId) -> Result<Option<Customer>, DomainError> {
        Ok(self.customers.read().await.get(&id).cloned())
    }

    async fn find_by_email(
        &self,
        tenant_id: TenantId,
        email: &str,
    ) -> Result<Option<Customer>, DomainError> {
        Ok(self
            .customers
            .read()
            .await
            .values()
            .find(|c| c.tenant_id == tenant_id && c.email == email)
            .cloned())
    }

    async fn list_by_tenant(&self, tenant_id: TenantId) -> Result<Vec<Customer>, DomainError> {
        let mut list: Vec<Customer> = self
            .customers
            .read()
            .await
            .values()
            .filter(|c| c.tenant_id == tenant_id)
            .cloned()
            .collect();
        list.sort_by(|a, b| a.email.cmp(&b.email));
        Ok(list)
    }
}

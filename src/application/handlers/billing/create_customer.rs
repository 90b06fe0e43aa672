//! CreateCustomerHandler - Command handler for creating billing identities.

use std::collections::BTreeMap;
use std::sync::Arc;

use crate::domain::customer::Customer;
use crate::domain::foundation::{CustomerId, DomainError, ErrorCode, TenantId};
use crate::ports::{CustomerRepository, TenantRepository};

/// Command to create a customer within a tenant.
#[derive(Debug, Clone)]
pub struct CreateCustomerCommand {
    pub tenant_id: TenantId,
    pub email: String,
    pub display_name: String,
    pub metadata: BTreeMap<String, String>,
}

/// Handler for customer creation.
pub struct CreateCustomerHandler {
    tenant_repository: Arc<dyn TenantRepository>,
    customer_repository: Arc<dyn CustomerRepository>,
}

impl CreateCustomerHandler {
    pub fn new(
        tenant_repository: Arc<dyn TenantRepository>,
        customer_repository: Arc<dyn CustomerRepository>,
    ) -> Self {
        Self {
            tenant_repository,
            customer_repository,
        }
    }

    pub async fn handle(&self, cmd: CreateCustomerCommand) -> Result<Customer, DomainError> {
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

        let customer = Customer::new(
            CustomerId::new(),
            tenant.id,
            cmd.email,
            cmd.display_name,
            cmd.metadata,
        )?;
        self.customer_repository.save(&customer).await?;

        tracing::info!(customer_id = %customer.id, tenant_id = %tenant.id, "customer created");
        Ok(customer)
    }
}

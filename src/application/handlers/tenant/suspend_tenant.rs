//! SuspendTenantHandler - Command handler for tenant suspension.

use std::sync::Arc;

use crate::domain::foundation::{DomainError, ErrorCode, TenantId};
use crate::domain::tenant::Tenant;
use crate::ports::TenantRepository;

/// Command to suspend an active tenant.
#[derive(Debug, Clone)]
pub struct SuspendTenantCommand {
    pub tenant_id: TenantId,
    /// Operator-supplied reason, logged for audit.
    pub reason: String,
}

/// Handler for tenant suspension.
pub struct SuspendTenantHandler {
    tenant_repository: Arc<dyn TenantRepository>,
}

impl SuspendTenantHandler {
    pub fn new(tenant_repository: Arc<dyn TenantRepository>) -> Self {
        Self { tenant_repository }
    }

    pub async fn handle(&self, cmd: SuspendTenantCommand) -> Result<Tenant, DomainError> {
        let mut tenant = self
            .tenant_repository
            .find_by_id(cmd.tenant_id)
            .await?
            .ok_or_else(|| {
                DomainError::new(ErrorCode::TenantNotFound, "Tenant not found")
                    .with_detail("tenant_id", cmd.tenant_id.to_string())
            })?;

        tenant.suspend()?;
        self.tenant_repository.update(&tenant).await?;

        tracing::warn!(
            tenant_id = %tenant.id,
            slug = %tenant.slug,
            reason = %cmd.reason,
            "tenant suspended"
        );
        Ok(tenant)
    }
}

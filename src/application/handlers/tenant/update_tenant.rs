//! UpdateTenantHandler - Command handler for branding and limit changes.

use std::sync::Arc;

use crate::domain::foundation::{DomainError, ErrorCode, TenantId};
use crate::domain::tenant::{BrandingConfig, ResourceLimits, Tenant};
use crate::ports::{TenantRepository, UsageMeter};

use super::create_tenant::meter_config_for;

/// Command to update a tenant's branding and/or limits.
#[derive(Debug, Clone)]
pub struct UpdateTenantCommand {
    pub tenant_id: TenantId,
    pub branding: Option<BrandingConfig>,
    pub limits: Option<ResourceLimits>,
}

/// Handler for tenant updates.
///
/// Limit changes are validated both upward (a child must still fit its
/// parent) and downward (every existing child must still fit the new
/// limits); metering ceilings follow the stored limits.
pub struct UpdateTenantHandler {
    tenant_repository: Arc<dyn TenantRepository>,
    usage_meter: Arc<dyn UsageMeter>,
}

impl UpdateTenantHandler {
    pub fn new(
        tenant_repository: Arc<dyn TenantRepository>,
        usage_meter: Arc<dyn UsageMeter>,
    ) -> Self {
        Self {
            tenant_repository,
            usage_meter,
        }
    }

    pub async fn handle(&self, cmd: UpdateTenantCommand) -> Result<Tenant, DomainError> {
        let mut tenant = self
            .tenant_repository
            .find_by_id(cmd.tenant_id)
            .await?
            .ok_or_else(|| {
                DomainError::new(ErrorCode::TenantNotFound, "Tenant not found")
                    .with_detail("tenant_id", cmd.tenant_id.to_string())
            })?;

        if let Some(branding) = cmd.branding {
            tenant.set_branding(branding);
        }

        if let Some(limits) = cmd.limits {
            let parent_limits = match tenant.parent_id {
                Some(parent_id) => self
                    .tenant_repository
                    .find_by_id(parent_id)
                    .await?
                    .map(|p| p.limits),
                None => None,
            };

            for child in self.tenant_repository.children_of(tenant.id).await? {
                if !child.limits.fits_within(&limits) {
                    return Err(DomainError::validation(
                        "limits",
                        format!("child tenant '{}' would exceed the new limits", child.slug),
                    ));
                }
            }

            tenant.set_limits(limits, parent_limits.as_ref())?;
            self.usage_meter
                .configure_tenant(tenant.id, meter_config_for(&tenant))
                .await;
        }

        self.tenant_repository.update(&tenant).await?;
        Ok(tenant)
    }
}

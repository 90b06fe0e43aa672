//! CreateTenantHandler - Command handler for tenant onboarding.

use std::sync::Arc;

use crate::domain::foundation::{DomainError, ErrorCode, TenantId};
use crate::domain::tenant::{Tenant, TenantKind, TenantSlug};
use crate::ports::{RateLimitCeiling, TenantMeterConfig, TenantRepository, UsageMeter};
use crate::domain::usage::IncludedQuotas;

/// Command to onboard a new tenant.
#[derive(Debug, Clone)]
pub struct CreateTenantCommand {
    pub slug: String,
    pub display_name: String,
    pub kind: TenantKind,
    pub parent_id: Option<TenantId>,
}

/// Handler for tenant onboarding.
///
/// Provisions the tenant, activates it, and registers its metering
/// ceilings so the usage meter can enforce quotas from the first call.
pub struct CreateTenantHandler {
    tenant_repository: Arc<dyn TenantRepository>,
    usage_meter: Arc<dyn UsageMeter>,
}

impl CreateTenantHandler {
    pub fn new(
        tenant_repository: Arc<dyn TenantRepository>,
        usage_meter: Arc<dyn UsageMeter>,
    ) -> Self {
        Self {
            tenant_repository,
            usage_meter,
        }
    }

    pub async fn handle(&self, cmd: CreateTenantCommand) -> Result<Tenant, DomainError> {
        let slug = TenantSlug::new(cmd.slug)?;

        // A chain child must hang off an existing chain parent, and its
        // default limits must fit under the parent's.
        let parent = match cmd.parent_id {
            Some(parent_id) => {
                let parent = self
                    .tenant_repository
                    .find_by_id(parent_id)
                    .await?
                    .ok_or_else(|| {
                        DomainError::new(ErrorCode::TenantNotFound, "Parent tenant not found")
                            .with_detail("tenant_id", parent_id.to_string())
                    })?;
                if parent.kind != TenantKind::EnterpriseChain {
                    return Err(DomainError::validation(
                        "parent_id",
                        "only enterprise chains can own child tenants",
                    ));
                }
                Some(parent)
            }
            None => None,
        };

        let mut tenant = Tenant::provision(
            TenantId::new(),
            slug,
            cmd.display_name,
            cmd.kind,
            parent.as_ref().map(|p| p.id),
        );
        if let Some(parent) = &parent {
            let limits = tenant.limits;
            tenant.set_limits(limits, Some(&parent.limits))?;
        }
        tenant.activate()?;

        self.tenant_repository.save(&tenant).await?;

        self.usage_meter
            .configure_tenant(tenant.id, meter_config_for(&tenant))
            .await;

        tracing::info!(tenant_id = %tenant.id, slug = %tenant.slug, "tenant onboarded");
        Ok(tenant)
    }
}

/// Derives metering ceilings from a tenant's resource limits.
pub fn meter_config_for(tenant: &Tenant) -> TenantMeterConfig {
    TenantMeterConfig {
        included: IncludedQuotas {
            api_calls: tenant.limits.max_api_calls_per_month,
            storage_bytes: tenant.limits.max_storage_bytes,
            bandwidth_bytes: tenant.limits.max_storage_bytes.saturating_mul(4),
        },
        rate_limit: RateLimitCeiling::default(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::memory::InMemoryTenantRepository;
    use crate::adapters::metering::InMemoryUsageMeter;
    use crate::domain::tenant::TenantStatus;
    use crate::domain::usage::QuotaType;

    fn handler() -> (CreateTenantHandler, Arc<InMemoryTenantRepository>) {
        let repo = Arc::new(InMemoryTenantRepository::new());
        let meter = Arc::new(InMemoryUsageMeter::new());
        (CreateTenantHandler::new(repo.clone(), meter), repo)
    }

    fn command(slug: &str, kind: TenantKind, parent_id: Option<TenantId>) -> CreateTenantCommand {
        CreateTenantCommand {
            slug: slug.to_string(),
            display_name: slug.to_string(),
            kind,
            parent_id,
        }
    }

    #[tokio::test]
    async fn onboarded_tenant_is_active_and_persisted() {
        let (handler, repo) = handler();

        let tenant = handler
            .handle(command("golf-club-42", TenantKind::GolfCourse, None))
            .await
            .unwrap();

        assert_eq!(tenant.status, TenantStatus::Active);
        assert!(repo.find_by_id(tenant.id).await.unwrap().is_some());
    }

    #[tokio::test]
    async fn duplicate_slug_is_rejected() {
        let (handler, _repo) = handler();
        handler
            .handle(command("golf-club-42", TenantKind::GolfCourse, None))
            .await
            .unwrap();

        let err = handler
            .handle(command("golf-club-42", TenantKind::GolfCourse, None))
            .await
            .unwrap_err();
        assert_eq!(err.code, ErrorCode::DuplicateSlug);
    }

    #[tokio::test]
    async fn invalid_slug_is_rejected_before_persistence() {
        let (handler, _repo) = handler();
        let err = handler
            .handle(command("Bad Slug!", TenantKind::GolfCourse, None))
            .await
            .unwrap_err();
        assert_eq!(err.code, ErrorCode::InvalidFormat);
    }

    #[tokio::test]
    async fn chain_child_requires_chain_parent() {
        let (handler, _repo) = handler();
        let course = handler
            .handle(command("golf-club-42", TenantKind::GolfCourse, None))
            .await
            .unwrap();

        let err = handler
            .handle(command("club-child", TenantKind::GolfCourse, Some(course.id)))
            .await
            .unwrap_err();
        assert_eq!(err.code, ErrorCode::ValidationFailed);
    }

    #[tokio::test]
    async fn chain_child_onboards_under_chain_parent() {
        let (handler, _repo) = handler();
        let chain = handler
            .handle(command("fairway-chain", TenantKind::EnterpriseChain, None))
            .await
            .unwrap();

        let child = handler
            .handle(command("chain-course-1", TenantKind::GolfCourse, Some(chain.id)))
            .await
            .unwrap();
        assert_eq!(child.parent_id, Some(chain.id));
        assert!(child.limits.fits_within(&chain.limits));
    }

    #[tokio::test]
    async fn missing_parent_is_not_found() {
        let (handler, _repo) = handler();
        let err = handler
            .handle(command("orphan", TenantKind::GolfCourse, Some(TenantId::new())))
            .await
            .unwrap_err();
        assert_eq!(err.code, ErrorCode::TenantNotFound);
    }

    #[tokio::test]
    async fn onboarding_configures_the_meter() {
        let repo = Arc::new(InMemoryTenantRepository::new());
        let meter = Arc::new(InMemoryUsageMeter::new());
        let handler = CreateTenantHandler::new(repo, meter.clone());

        let tenant = handler
            .handle(command("golf-club-42", TenantKind::GolfCourse, None))
            .await
            .unwrap();

        let status = meter
            .check_quota(tenant.id, QuotaType::ApiCalls)
            .await
            .unwrap();
        assert_eq!(status.limit, tenant.limits.max_api_calls_per_month);
    }
}

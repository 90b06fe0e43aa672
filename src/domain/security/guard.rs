//! Tenant boundary validation.
//!
//! The guard decides every cross-component access: same-tenant requests
//! need a covering permission; cross-tenant requests additionally need a
//! parent-chain-scoped grant *and* the target must be a direct child of
//! the requester. Everything else is `CrossTenantViolation`; never
//! silently filtered, never downgraded to NotFound, always logged with
//! both tenant ids.
//!
//! The guard is deliberately independent of billing logic so it can be
//! audited in isolation; it sees resolved tenants, not repositories.

use crate::domain::foundation::{DomainError, ErrorCode, TenantId};
use crate::domain::tenant::Tenant;

use super::PermissionSet;

/// Why an access was granted.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BoundaryGrant {
    /// Requester and resource owner are the same tenant.
    SameTenant,

    /// Requester holds a chain-scoped grant over a direct child.
    ParentChain,
}

/// Validates an access request against tenant boundaries and permissions.
///
/// `target` is the resolved tenant that owns the resource being touched.
///
/// # Errors
///
/// - `Forbidden` when the requester is in the right tenant but holds no
///   covering permission.
/// - `CrossTenantViolation` for any access across the boundary without an
///   explicit chain-scoped grant over a *direct* descendant.
pub fn validate_boundary(
    permissions: &PermissionSet,
    requesting_tenant: &TenantId,
    target: &Tenant,
    resource: &str,
    action: &str,
) -> Result<BoundaryGrant, DomainError> {
    if &target.id == requesting_tenant {
        if permissions.allows_in_tenant(resource, action) {
            return Ok(BoundaryGrant::SameTenant);
        }
        return Err(DomainError::new(
            ErrorCode::Forbidden,
            format!("No permission for {} on {}", action, resource),
        )
        .with_detail("resource", resource)
        .with_detail("action", action));
    }

    if permissions.allows_in_chain(resource, action) && target.is_direct_child_of(requesting_tenant)
    {
        return Ok(BoundaryGrant::ParentChain);
    }

    tracing::warn!(
        requesting_tenant = %requesting_tenant,
        target_tenant = %target.id,
        resource,
        action,
        "cross-tenant access denied"
    );
    Err(DomainError::new(
        ErrorCode::CrossTenantViolation,
        "Access across tenant boundary denied",
    )
    .with_detail("requesting_tenant", requesting_tenant.to_string())
    .with_detail("target_tenant", target.id.to_string())
    .with_detail("resource", resource)
    .with_detail("action", action))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::security::{Permission, PermissionScope};
    use crate::domain::foundation::UserId;
    use crate::domain::tenant::{TenantKind, TenantSlug};

    fn tenant(slug: &str, parent: Option<TenantId>) -> Tenant {
        Tenant::provision(
            TenantId::new(),
            TenantSlug::new(slug).unwrap(),
            slug,
            TenantKind::GolfCourse,
            parent,
        )
    }

    fn perms(tenant_id: TenantId, scope: PermissionScope) -> PermissionSet {
        PermissionSet::new(
            tenant_id,
            UserId::new("user-1").unwrap(),
            vec![Permission::new("admin", "*", "*", scope)],
        )
    }

    #[test]
    fn same_tenant_with_permission_is_granted() {
        let target = tenant("golf-club-42", None);
        let set = perms(target.id, PermissionScope::Tenant);

        let grant = validate_boundary(&set, &target.id, &target, "revenue", "read").unwrap();
        assert_eq!(grant, BoundaryGrant::SameTenant);
    }

    #[test]
    fn same_tenant_without_permission_is_forbidden_not_violation() {
        let target = tenant("golf-club-42", None);
        let set = perms(target.id, PermissionScope::SelfOnly);

        let err = validate_boundary(&set, &target.id, &target, "revenue", "read").unwrap_err();
        assert_eq!(err.code, ErrorCode::Forbidden);
    }

    #[test]
    fn cross_tenant_without_chain_grant_is_violation() {
        let requester = tenant("golf-club-42", None);
        let target = tenant("golf-club-43", None);
        let set = perms(requester.id, PermissionScope::Tenant);

        let err = validate_boundary(&set, &requester.id, &target, "revenue", "read").unwrap_err();
        assert_eq!(err.code, ErrorCode::CrossTenantViolation);
        assert_eq!(
            err.details.get("target_tenant"),
            Some(&target.id.to_string())
        );
        assert_eq!(
            err.details.get("requesting_tenant"),
            Some(&requester.id.to_string())
        );
    }

    #[test]
    fn chain_grant_reaches_direct_child() {
        let parent = tenant("fairway-chain", None);
        let child = tenant("chain-course-1", Some(parent.id));
        let set = perms(parent.id, PermissionScope::ParentChain);

        let grant = validate_boundary(&set, &parent.id, &child, "revenue", "read").unwrap();
        assert_eq!(grant, BoundaryGrant::ParentChain);
    }

    #[test]
    fn chain_grant_does_not_reach_grandchild() {
        let parent = tenant("fairway-chain", None);
        let child = tenant("chain-region-1", Some(parent.id));
        let grandchild = tenant("chain-course-9", Some(child.id));
        let set = perms(parent.id, PermissionScope::ParentChain);

        let err =
            validate_boundary(&set, &parent.id, &grandchild, "revenue", "read").unwrap_err();
        assert_eq!(err.code, ErrorCode::CrossTenantViolation);
    }

    #[test]
    fn chain_grant_does_not_reach_unrelated_tenant() {
        let parent = tenant("fairway-chain", None);
        let stranger = tenant("golf-club-43", None);
        let set = perms(parent.id, PermissionScope::ParentChain);

        let err = validate_boundary(&set, &parent.id, &stranger, "revenue", "read").unwrap_err();
        assert_eq!(err.code, ErrorCode::CrossTenantViolation);
    }
}

//! Role permissions scoped within a tenant.

use serde::{Deserialize, Serialize};

use crate::domain::foundation::{TenantId, UserId};

/// How far a permission reaches.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PermissionScope {
    /// Only resources the user personally owns.
    SelfOnly,

    /// Any resource inside the user's own tenant.
    Tenant,

    /// The tenant plus its *direct* child tenants (chain managers).
    ParentChain,
}

/// A single (role, resource, action, scope) grant.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Permission {
    /// Role the grant belongs to (e.g. `"chain-admin"`).
    pub role: String,

    /// Resource family (e.g. `"subscriptions"`, `"revenue"`), `"*"` for all.
    pub resource: String,

    /// Action (e.g. `"read"`, `"manage"`), `"*"` for all.
    pub action: String,

    /// Reach of the grant.
    pub scope: PermissionScope,
}

impl Permission {
    /// Creates a permission grant.
    pub fn new(
        role: impl Into<String>,
        resource: impl Into<String>,
        action: impl Into<String>,
        scope: PermissionScope,
    ) -> Self {
        Self {
            role: role.into(),
            resource: resource.into(),
            action: action.into(),
            scope,
        }
    }

    /// Returns true if this grant covers the resource/action pair.
    pub fn covers(&self, resource: &str, action: &str) -> bool {
        (self.resource == "*" || self.resource == resource)
            && (self.action == "*" || self.action == action)
    }
}

/// The permissions a user holds within one tenant.
///
/// Assembled from the identity provider's role claims; the guard only
/// ever consults this set, never raw claims.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PermissionSet {
    /// Tenant the permissions are bound to.
    pub tenant_id: TenantId,

    /// User holding the permissions.
    pub user_id: UserId,

    /// The individual grants.
    pub permissions: Vec<Permission>,
}

impl PermissionSet {
    /// Creates a permission set for a user within a tenant.
    pub fn new(tenant_id: TenantId, user_id: UserId, permissions: Vec<Permission>) -> Self {
        Self {
            tenant_id,
            user_id,
            permissions,
        }
    }

    /// Returns true if any grant covers the pair at tenant scope or wider.
    pub fn allows_in_tenant(&self, resource: &str, action: &str) -> bool {
        self.permissions.iter().any(|p| {
            p.covers(resource, action)
                && matches!(p.scope, PermissionScope::Tenant | PermissionScope::ParentChain)
        })
    }

    /// Returns true if any grant covers the pair at parent-chain scope.
    pub fn allows_in_chain(&self, resource: &str, action: &str) -> bool {
        self.permissions
            .iter()
            .any(|p| p.covers(resource, action) && p.scope == PermissionScope::ParentChain)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn user() -> UserId {
        UserId::new("user-1").unwrap()
    }

    #[test]
    fn covers_matches_exact_and_wildcard() {
        let p = Permission::new("admin", "subscriptions", "manage", PermissionScope::Tenant);
        assert!(p.covers("subscriptions", "manage"));
        assert!(!p.covers("subscriptions", "read"));
        assert!(!p.covers("revenue", "manage"));

        let star = Permission::new("admin", "*", "*", PermissionScope::Tenant);
        assert!(star.covers("revenue", "read"));
    }

    #[test]
    fn tenant_scope_does_not_grant_chain_access() {
        let set = PermissionSet::new(
            TenantId::new(),
            user(),
            vec![Permission::new(
                "course-admin",
                "subscriptions",
                "manage",
                PermissionScope::Tenant,
            )],
        );

        assert!(set.allows_in_tenant("subscriptions", "manage"));
        assert!(!set.allows_in_chain("subscriptions", "manage"));
    }

    #[test]
    fn chain_scope_grants_both_levels() {
        let set = PermissionSet::new(
            TenantId::new(),
            user(),
            vec![Permission::new(
                "chain-admin",
                "*",
                "*",
                PermissionScope::ParentChain,
            )],
        );

        assert!(set.allows_in_tenant("revenue", "read"));
        assert!(set.allows_in_chain("revenue", "read"));
    }

    #[test]
    fn self_scope_grants_neither_tenant_nor_chain() {
        let set = PermissionSet::new(
            TenantId::new(),
            user(),
            vec![Permission::new(
                "golfer",
                "profile",
                "manage",
                PermissionScope::SelfOnly,
            )],
        );

        assert!(!set.allows_in_tenant("profile", "manage"));
        assert!(!set.allows_in_chain("profile", "manage"));
    }
}

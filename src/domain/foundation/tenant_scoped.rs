//! Tenant scoping trait for tenant-owned resources.
//!
//! Every aggregate in this crate is owned by exactly one tenant. This trait
//! standardizes how that owning tenant is exposed and checked, so query
//! paths and command handlers all enforce the boundary the same way.
//!
//! # Example
//!
//! ```ignore
//! impl TenantScoped for Subscription {
//!     fn tenant_id(&self) -> &TenantId {
//!         &self.tenant_id
//!     }
//! }
//!
//! // In a handler:
//! subscription.check_tenant(&requesting_tenant)?; // CrossTenantViolation if foreign
//! ```

use super::{DomainError, ErrorCode, TenantId};

/// Trait for resources owned by a single tenant.
///
/// The default `check_tenant` raises `CrossTenantViolation`; never a
/// NotFound; so callers can always distinguish "denied" from "absent".
/// Every denial is logged with both tenant ids for audit.
pub trait TenantScoped {
    /// Returns the id of the tenant that owns this resource.
    fn tenant_id(&self) -> &TenantId;

    /// Returns true if the resource belongs to the given tenant.
    fn belongs_to(&self, tenant_id: &TenantId) -> bool {
        self.tenant_id() == tenant_id
    }

    /// Validates that the requesting tenant owns this resource.
    fn check_tenant(&self, requesting: &TenantId) -> Result<(), DomainError> {
        if self.belongs_to(requesting) {
            Ok(())
        } else {
            tracing::warn!(
                requesting_tenant = %requesting,
                owning_tenant = %self.tenant_id(),
                "cross-tenant access denied"
            );
            Err(DomainError::new(
                ErrorCode::CrossTenantViolation,
                "Resource belongs to a different tenant",
            )
            .with_detail("requesting_tenant", requesting.to_string())
            .with_detail("owning_tenant", self.tenant_id().to_string()))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct TestResource {
        owner: TenantId,
    }

    impl TenantScoped for TestResource {
        fn tenant_id(&self) -> &TenantId {
            &self.owner
        }
    }

    #[test]
    fn belongs_to_matches_owner() {
        let owner = TenantId::new();
        let resource = TestResource { owner };

        assert!(resource.belongs_to(&owner));
        assert!(!resource.belongs_to(&TenantId::new()));
    }

    #[test]
    fn check_tenant_succeeds_for_owner() {
        let owner = TenantId::new();
        let resource = TestResource { owner };

        assert!(resource.check_tenant(&owner).is_ok());
    }

    #[test]
    fn check_tenant_raises_cross_tenant_violation() {
        let owner = TenantId::new();
        let other = TenantId::new();
        let resource = TestResource { owner };

        let err = resource.check_tenant(&other).unwrap_err();
        assert_eq!(err.code, ErrorCode::CrossTenantViolation);
        assert_eq!(
            err.details.get("owning_tenant"),
            Some(&owner.to_string())
        );
        assert_eq!(
            err.details.get("requesting_tenant"),
            Some(&other.to_string())
        );
    }
}

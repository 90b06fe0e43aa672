//! TenantRepository port - persistence for the tenant registry.

use async_trait::async_trait;

use crate::domain::foundation::{DomainError, TenantId};
use crate::domain::tenant::{Tenant, TenantSlug};

/// Port for tenant persistence.
///
/// Implementations enforce two registry invariants:
/// - slugs are globally unique (`save` fails with `DuplicateSlug`),
/// - updates use optimistic concurrency (`update` fails with
///   `StaleVersion` when the stored version differs).
#[async_trait]
pub trait TenantRepository: Send + Sync {
    /// Persists a new tenant.
    ///
    /// # Errors
    ///
    /// `DuplicateSlug` if the slug is already registered.
    async fn save(&self, tenant: &Tenant) -> Result<(), DomainError>;

    /// Updates an existing tenant with an optimistic version check.
    ///
    /// # Errors
    ///
    /// `TenantNotFound` if absent; `StaleVersion` on a version conflict.
    async fn update(&self, tenant: &Tenant) -> Result<(), DomainError>;

    /// Finds a tenant by id.
    async fn find_by_id(&self, id: TenantId) -> Result<Option<Tenant>, DomainError>;

    /// Finds a tenant by slug.
    async fn find_by_slug(&self, slug: &TenantSlug) -> Result<Option<Tenant>, DomainError>;

    /// Lists the direct children of a tenant.
    async fn children_of(&self, parent: TenantId) -> Result<Vec<Tenant>, DomainError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tenant_repository_is_object_safe() {
        fn _accepts_dyn(_repo: &dyn TenantRepository) {}
    }
}

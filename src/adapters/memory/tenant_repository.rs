//! In-memory tenant repository for testing and single-process use.

use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;

use crate::domain::foundation::{DomainError, ErrorCode, TenantId};
use crate::domain::tenant::{Tenant, TenantSlug};
use crate::ports::TenantRepository;

/// Deterministic in-memory implementation of `TenantRepository`.
#[derive(Debug, Default)]
pub struct InMemoryTenantRepository {
    tenants: Arc<RwLock<HashMap<TenantId, Tenant>>>,
}

impl InMemoryTenantRepository {
    /// Creates an empty repository.
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl TenantRepository for InMemoryTenantRepository {
    async fn save(&self, tenant: &Tenant) -> Result<(), DomainError> {
        let mut tenants = self.tenants.write().await;

        if tenants.values().any(|t| t.slug == tenant.slug) {
            return Err(DomainError::new(
                ErrorCode::DuplicateSlug,
                format!("Slug '{}' is already registered", tenant.slug),
            )
            .with_detail("slug", tenant.slug.to_string()));
        }

        tenants.insert(tenant.id, tenant.clone());
        Ok(())
    }

    async fn update(&self, tenant: &Tenant) -> Result<(), DomainError> {
        let mut tenants = self.tenants.write().await;

        let stored = tenants.get(&tenant.id).ok_or_else(|| {
            DomainError::new(ErrorCode::TenantNotFound, "Tenant not found")
                .with_detail("tenant_id", tenant.id.to_string())
        })?;

        if stored.version != tenant.version {
            return Err(DomainError::new(
                ErrorCode::StaleVersion,
                "Tenant was modified concurrently",
            )
            .with_detail("expected_version", tenant.version.to_string())
            .with_detail("stored_version", stored.version.to_string()));
        }

        let mut next = tenant.clone();
        next.version += 1;
        tenants.insert(next.id, next);
        Ok(())
    }

    async fn find_by_id(&self, id: TenantId) -> Result<Option<Tenant>, DomainError> {
        Ok(self.tenants.read().await.get(&id).cloned())
    }

    async fn find_by_slug(&self, slug: &TenantSlug) -> Result<Option<Tenant>, DomainError> {
        Ok(self
            .tenants
            .read()
            .await
            .values()
            .find(|t| &t.slug == slug)
            .cloned())
    }

    async fn children_of(&self, parent: TenantId) -> Result<Vec<Tenant>, DomainError> {
        let mut children: Vec<Tenant> = self
            .tenants
            .read()
            .await
            .values()
            .filter(|t| t.parent_id == Some(parent))
            .cloned()
            .collect();
        children.sort_by(|a, b| a.slug.cmp(&b.slug));
        Ok(children)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::tenant::TenantKind;

    fn tenant(slug: &str, parent: Option<TenantId>) -> Tenant {
        Tenant::provision(
            TenantId::new(),
            TenantSlug::new(slug).unwrap(),
            slug,
            TenantKind::GolfCourse,
            parent,
        )
    }

    #[tokio::test]
    async fn save_and_find_roundtrip() {
        let repo = InMemoryTenantRepository::new();
        let t = tenant("golf-club-42", None);

        repo.save(&t).await.unwrap();
        assert_eq!(repo.find_by_id(t.id).await.unwrap(), Some(t.clone()));
        assert_eq!(repo.find_by_slug(&t.slug).await.unwrap(), Some(t));
    }

    #[tokio::test]
    async fn duplicate_slug_is_rejected() {
        let repo = InMemoryTenantRepository::new();
        repo.save(&tenant("golf-club-42", None)).await.unwrap();

        let err = repo.save(&tenant("golf-club-42", None)).await.unwrap_err();
        assert_eq!(err.code, ErrorCode::DuplicateSlug);
    }

    #[tokio::test]
    async fn update_bumps_version_and_detects_staleness() {
        let repo = InMemoryTenantRepository::new();
        let mut t = tenant("golf-club-42", None);
        repo.save(&t).await.unwrap();

        t.activate().unwrap();
        repo.update(&t).await.unwrap();

        // The caller's copy is now stale: stored version advanced.
        let err = repo.update(&t).await.unwrap_err();
        assert_eq!(err.code, ErrorCode::StaleVersion);

        let stored = repo.find_by_id(t.id).await.unwrap().unwrap();
        assert_eq!(stored.version, 1);
    }

    #[tokio::test]
    async fn update_of_missing_tenant_is_not_found() {
        let repo = InMemoryTenantRepository::new();
        let err = repo.update(&tenant("golf-club-42", None)).await.unwrap_err();
        assert_eq!(err.code, ErrorCode::TenantNotFound);
    }

    #[tokio::test]
    async fn children_of_lists_direct_children_sorted() {
        let repo = InMemoryTenantRepository::new();
        let parent = tenant("fairway-chain", None);
        repo.save(&parent).await.unwrap();

        let b = tenant("chain-course-b", Some(parent.id));
        let a = tenant("chain-course-a", Some(parent.id));
        let unrelated = tenant("golf-club-43", None);
        repo.save(&b).await.unwrap();
        repo.save(&a).await.unwrap();
        repo.save(&unrelated).await.unwrap();

        let children = repo.children_of(parent.id).await.unwrap();
        let slugs: Vec<_> = children.iter().map(|t| t.slug.to_string()).collect();
        assert_eq!(slugs, vec!["chain-course-a", "chain-course-b"]);
    }
}

//! Static identity provider for testing.

use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;

use crate::ports::{AuthenticatedPrincipal, IdentityError, IdentityProvider};

/// `IdentityProvider` resolving from a fixed assertion table.
#[derive(Debug, Default)]
pub struct StaticIdentityProvider {
    principals: Arc<RwLock<HashMap<String, AuthenticatedPrincipal>>>,
}

impl StaticIdentityProvider {
    /// Creates an empty provider; unknown assertions are invalid.
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers an assertion string to resolve to a principal.
    pub async fn register(&self, assertion: impl Into<String>, principal: AuthenticatedPrincipal) {
        self.principals
            .write()
            .await
            .insert(assertion.into(), principal);
    }
}

#[async_trait]
impl IdentityProvider for StaticIdentityProvider {
    async fn resolve(&self, assertion: &str) -> Result<AuthenticatedPrincipal, IdentityError> {
        self.principals
            .read()
            .await
            .get(assertion)
            .cloned()
            .ok_or_else(|| IdentityError::InvalidAssertion("unknown assertion".to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::foundation::{TenantId, UserId};

    #[tokio::test]
    async fn registered_assertion_resolves() {
        let provider = StaticIdentityProvider::new();
        let principal = AuthenticatedPrincipal {
            user_id: UserId::new("user-1").unwrap(),
            tenant_id: TenantId::new(),
            roles: vec!["course-admin".to_string()],
        };
        provider.register("token-1", principal.clone()).await;

        assert_eq!(provider.resolve("token-1").await.unwrap(), principal);
    }

    #[tokio::test]
    async fn unknown_assertion_is_invalid() {
        let provider = StaticIdentityProvider::new();
        assert!(matches!(
            provider.resolve("missing").await.unwrap_err(),
            IdentityError::InvalidAssertion(_)
        ));
    }
}

//! IdentityProvider port - resolving external authentication assertions.
//!
//! The surrounding application authenticates against an external SSO
//! provider; this port resolves the resulting assertion into the
//! (user, tenant, role claims) triple the isolation guard consumes. The
//! guard treats the triple as already-verified input and performs no
//! protocol-level validation itself.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::domain::foundation::{TenantId, UserId};

/// The resolved identity behind a request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuthenticatedPrincipal {
    /// User within the tenant.
    pub user_id: UserId,

    /// Tenant the assertion was issued for.
    pub tenant_id: TenantId,

    /// Role claims (e.g. `"course-admin"`, `"chain-admin"`), mapped to
    /// permissions by the security layer.
    pub roles: Vec<String>,
}

/// Errors from assertion resolution.
#[derive(Debug, thiserror::Error)]
pub enum IdentityError {
    /// The assertion failed signature or shape checks.
    #[error("invalid assertion: {0}")]
    InvalidAssertion(String),

    /// The assertion was valid once but has expired.
    #[error("assertion expired")]
    Expired,

    /// The provider could not be reached.
    #[error("identity provider unavailable: {0}")]
    Unavailable(String),
}

/// Port for the identity/SSO provider.
#[async_trait]
pub trait IdentityProvider: Send + Sync {
    /// Resolves an opaque assertion (e.g. a bearer token) to a principal.
    async fn resolve(&self, assertion: &str) -> Result<AuthenticatedPrincipal, IdentityError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn identity_provider_is_object_safe() {
        fn _accepts_dyn(_provider: &dyn IdentityProvider) {}
    }
}

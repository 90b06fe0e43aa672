//! JWT-based identity provider.
//!
//! Resolves a bearer token minted by the external SSO layer into the
//! (user, tenant, roles) triple. Signature and expiry are checked here;
//! downstream, the isolation guard treats the triple as already
//! verified.

use async_trait::async_trait;
use jsonwebtoken::{decode, Algorithm, DecodingKey, Validation};
use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Serialize};

use crate::domain::foundation::{TenantId, UserId};
use crate::ports::{AuthenticatedPrincipal, IdentityError, IdentityProvider};

/// Claims carried in a platform access token.
#[derive(Debug, Serialize, Deserialize)]
pub struct AccessClaims {
    /// Subject: the user id.
    pub sub: String,

    /// Tenant the token was issued for.
    pub tid: String,

    /// Role claims.
    #[serde(default)]
    pub roles: Vec<String>,

    /// Expiry, unix seconds.
    pub exp: u64,
}

/// `IdentityProvider` backed by HS256 JWT verification.
pub struct JwtIdentityProvider {
    decoding_key: DecodingKey,
    validation: Validation,
}

impl JwtIdentityProvider {
    /// Creates a provider verifying against a shared secret.
    pub fn new(secret: &SecretString) -> Self {
        Self {
            decoding_key: DecodingKey::from_secret(secret.expose_secret().as_bytes()),
            validation: Validation::new(Algorithm::HS256),
        }
    }
}

#[async_trait]
impl IdentityProvider for JwtIdentityProvider {
    async fn resolve(&self, assertion: &str) -> Result<AuthenticatedPrincipal, IdentityError> {
        let token = decode::<AccessClaims>(assertion, &self.decoding_key, &self.validation)
            .map_err(|err| match err.kind() {
                jsonwebtoken::errors::ErrorKind::ExpiredSignature => IdentityError::Expired,
                _ => IdentityError::InvalidAssertion(err.to_string()),
            })?;

        let claims = token.claims;
        let user_id = UserId::new(claims.sub)
            .map_err(|e| IdentityError::InvalidAssertion(e.to_string()))?;
        let tenant_id: TenantId = claims
            .tid
            .parse()
            .map_err(|_| IdentityError::InvalidAssertion("malformed tenant id".to_string()))?;

        Ok(AuthenticatedPrincipal {
            user_id,
            tenant_id,
            roles: claims.roles,
        })
    }
}

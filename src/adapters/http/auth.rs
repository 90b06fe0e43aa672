//! Bearer-token authentication middleware.
//!
//! Resolves the `Authorization: Bearer` assertion through the
//! `IdentityProvider` port and stores the resulting principal in
//! request extensions. The admin surface additionally requires the
//! `platform-admin` role claim.

use std::sync::Arc;

use axum::extract::{Request, State};
use axum::http::header::AUTHORIZATION;
use axum::middleware::Next;
use axum::response::Response;

use crate::domain::foundation::{DomainError, ErrorCode};
use crate::ports::{AuthenticatedPrincipal, IdentityError, IdentityProvider};

use super::error::ApiError;

/// Role claim required for administrative endpoints.
pub const PLATFORM_ADMIN_ROLE: &str = "platform-admin";

/// State for the authentication middleware.
#[derive(Clone)]
pub struct AuthState {
    pub identity_provider: Arc<dyn IdentityProvider>,
}

fn unauthorized(message: &str) -> ApiError {
    ApiError(DomainError::new(ErrorCode::Unauthorized, message))
}

/// Middleware requiring a valid platform-admin assertion.
pub async fn require_platform_admin(
    State(state): State<AuthState>,
    mut request: Request,
    next: Next,
) -> Result<Response, ApiError> {
    let token = request
        .headers()
        .get(AUTHORIZATION)
        .and_then(|value| value.to_str().ok())
        .and_then(|value| value.strip_prefix("Bearer "))
        .ok_or_else(|| unauthorized("Missing bearer token"))?;

    let principal: AuthenticatedPrincipal = state
        .identity_provider
        .resolve(token)
        .await
        .map_err(|err| match err {
            IdentityError::Expired => unauthorized("Assertion expired"),
            IdentityError::InvalidAssertion(_) => unauthorized("Invalid assertion"),
            IdentityError::Unavailable(msg) => {
                ApiError(DomainError::new(ErrorCode::InternalError, msg))
            }
        })?;

    if !principal.roles.iter().any(|r| r == PLATFORM_ADMIN_ROLE) {
        return Err(ApiError(
            DomainError::new(ErrorCode::Forbidden, "platform-admin role required")
                .with_detail("user_id", principal.user_id.to_string()),
        ));
    }

    request.extensions_mut().insert(principal);
    Ok(next.run(request).await)
}

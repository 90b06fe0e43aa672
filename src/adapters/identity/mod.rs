//! Identity adapters - SSO assertion resolution.

mod jwt;
mod static_provider;

pub use jwt::{AccessClaims, JwtIdentityProvider};
pub use static_provider::StaticIdentityProvider;

//! Authentication configuration.

use secrecy::{ExposeSecret, SecretString};
use serde::Deserialize;

use super::error::ConfigError;

/// JWT verification configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct AuthConfig {
    /// HS256 signing secret shared with the SSO layer.
    pub jwt_secret: SecretString,
}

impl AuthConfig {
    /// Validates the secret strength.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.jwt_secret.expose_secret().len() < 32 {
            return Err(ConfigError::invalid(
                "auth.jwt_secret",
                "secret must be at least 32 bytes",
            ));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn short_secrets_are_rejected() {
        let config = AuthConfig {
            jwt_secret: SecretString::new("short".to_string()),
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn long_secrets_validate() {
        let config = AuthConfig {
            jwt_secret: SecretString::new("a".repeat(48)),
        };
        assert!(config.validate().is_ok());
    }
}

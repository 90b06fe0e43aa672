//! Application configuration module
//!
//! Type-safe configuration loading from environment variables using the
//! `config` and `dotenvy` crates. Values are read with the `FAIRWAY`
//! prefix and `__` (double underscore) as the nesting separator.
//!
//! # Environment Variable Format
//!
//! - `FAIRWAY__SERVER__PORT=8080` -> `server.port = 8080`
//! - `FAIRWAY__DATABASE__URL=postgres://...` -> `database.url = ...`
//! - `FAIRWAY__BILLING__MAX_ATTEMPTS=5` -> `billing.max_attempts = 5`

mod auth;
mod billing;
mod database;
mod error;
mod metering;
mod server;

pub use auth::AuthConfig;
pub use billing::BillingConfig;
pub use database::DatabaseConfig;
pub use error::ConfigError;
pub use metering::MeteringConfig;
pub use server::{Environment, ServerConfig};

use serde::Deserialize;

/// Root application configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct AppConfig {
    /// Server configuration (host, port, environment).
    #[serde(default)]
    pub server: ServerConfig,

    /// Database configuration (PostgreSQL connection).
    pub database: DatabaseConfig,

    /// Authentication configuration (JWT secret).
    pub auth: AuthConfig,

    /// Billing cycle configuration.
    #[serde(default)]
    pub billing: BillingConfig,

    /// Usage metering configuration.
    #[serde(default)]
    pub metering: MeteringConfig,
}

impl AppConfig {
    /// Loads configuration from environment variables.
    ///
    /// Reads a `.env` file first when present (development), then the
    /// `FAIRWAY`-prefixed environment.
    pub fn load() -> Result<Self, ConfigError> {
        dotenvy::dotenv().ok();

        let config = config::Config::builder()
            .add_source(
                config::Environment::default()
                    .prefix("FAIRWAY")
                    .separator("__"),
            )
            .build()?;

        Ok(config.try_deserialize()?)
    }

    /// Validates every section after loading.
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.database.validate()?;
        self.auth.validate()?;
        self.billing.validate()?;
        self.metering.validate()?;
        Ok(())
    }
}

//! Billing cycle configuration.

use serde::Deserialize;

use super::error::ConfigError;
use crate::application::handlers::billing::BillingCycleConfig;

/// Billing orchestration configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct BillingConfig {
    /// Payment attempts per invoice before dunning.
    #[serde(default = "default_max_attempts")]
    pub max_attempts: u32,

    /// Exponential backoff base between attempts, in seconds.
    #[serde(default = "default_backoff_base_secs")]
    pub backoff_base_secs: u64,

    /// Subscriptions processed concurrently per batch.
    #[serde(default = "default_concurrency")]
    pub concurrency: usize,

    /// Deadline per payment attempt, in seconds.
    #[serde(default = "default_payment_timeout_secs")]
    pub payment_timeout_secs: u64,
}

fn default_max_attempts() -> u32 {
    3
}

fn default_backoff_base_secs() -> u64 {
    86_400
}

fn default_concurrency() -> usize {
    4
}

fn default_payment_timeout_secs() -> u64 {
    30
}

impl Default for BillingConfig {
    fn default() -> Self {
        Self {
            max_attempts: default_max_attempts(),
            backoff_base_secs: default_backoff_base_secs(),
            concurrency: default_concurrency(),
            payment_timeout_secs: default_payment_timeout_secs(),
        }
    }
}

impl BillingConfig {
    /// Validates the cycle settings.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.max_attempts == 0 {
            return Err(ConfigError::invalid(
                "billing.max_attempts",
                "at least one payment attempt is required",
            ));
        }
        if self.concurrency == 0 {
            return Err(ConfigError::invalid(
                "billing.concurrency",
                "batch concurrency must be positive",
            ));
        }
        Ok(())
    }

    /// Converts into the handler's runtime config.
    pub fn to_cycle_config(&self) -> BillingCycleConfig {
        BillingCycleConfig {
            max_attempts: self.max_attempts,
            backoff_base_secs: self.backoff_base_secs,
            concurrency: self.concurrency,
            payment_timeout_secs: self.payment_timeout_secs,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_validate() {
        assert!(BillingConfig::default().validate().is_ok());
    }

    #[test]
    fn zero_attempts_is_rejected() {
        let config = BillingConfig {
            max_attempts: 0,
            ..BillingConfig::default()
        };
        assert!(config.validate().is_err());
    }
}

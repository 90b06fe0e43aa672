//! Usage metering configuration.

use serde::Deserialize;

use super::error::ConfigError;

/// Metering and rollup configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct MeteringConfig {
    /// Default sliding-window ceiling for unconfigured tenants.
    #[serde(default = "default_rate_limit_max_calls")]
    pub rate_limit_max_calls: u32,

    /// Sliding window length in seconds.
    #[serde(default = "default_rate_limit_window_secs")]
    pub rate_limit_window_secs: u32,

    /// How often the rollup flusher compacts raw samples, in seconds.
    #[serde(default = "default_rollup_interval_secs")]
    pub rollup_interval_secs: u64,

    /// Minimum bucket retention. Must cover a full billing cycle so
    /// nothing is discarded before it has been billed.
    #[serde(default = "default_retention_days")]
    pub retention_days: u32,
}

fn default_rate_limit_max_calls() -> u32 {
    120
}

fn default_rate_limit_window_secs() -> u32 {
    60
}

fn default_rollup_interval_secs() -> u64 {
    300
}

fn default_retention_days() -> u32 {
    60
}

impl Default for MeteringConfig {
    fn default() -> Self {
        Self {
            rate_limit_max_calls: default_rate_limit_max_calls(),
            rate_limit_window_secs: default_rate_limit_window_secs(),
            rollup_interval_secs: default_rollup_interval_secs(),
            retention_days: default_retention_days(),
        }
    }
}

impl MeteringConfig {
    /// Validates the metering settings.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.rate_limit_window_secs == 0 {
            return Err(ConfigError::invalid(
                "metering.rate_limit_window_secs",
                "window must be positive",
            ));
        }
        if self.retention_days < 31 {
            return Err(ConfigError::invalid(
                "metering.retention_days",
                "retention must cover at least one monthly billing cycle",
            ));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_validate() {
        assert!(MeteringConfig::default().validate().is_ok());
    }

    #[test]
    fn retention_below_a_billing_cycle_is_rejected() {
        let config = MeteringConfig {
            retention_days: 14,
            ..MeteringConfig::default()
        };
        assert!(config.validate().is_err());
    }
}

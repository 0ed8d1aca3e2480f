//! Configuration Module
//!
//! Handles loading and validating cache configuration from environment variables.

use std::env;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::cache::{DEFAULT_CAPACITY, DEFAULT_SWEEP_INTERVAL_MS};
use crate::error::{CacheError, Result};

/// Cache configuration parameters.
///
/// All values can be configured via environment variables with sensible defaults.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Maximum number of addresses the cache can hold
    pub capacity: usize,
    /// Time-to-live in milliseconds, 0 disables expiry
    pub ttl_ms: u64,
    /// Expiry sweep period in milliseconds
    pub sweep_interval_ms: u64,
}

impl Config {
    /// Creates a config with the given capacity and TTL and the default sweep period.
    pub fn new(capacity: usize, ttl_ms: u64) -> Self {
        Self {
            capacity,
            ttl_ms,
            ..Self::default()
        }
    }

    /// Creates a new Config by loading values from environment variables.
    ///
    /// # Environment Variables
    /// - `IPCACHE_CAPACITY` - Maximum cached addresses (default: 10)
    /// - `IPCACHE_TTL_MS` - Entry time-to-live in milliseconds (default: 0, disabled)
    /// - `IPCACHE_SWEEP_INTERVAL_MS` - Expiry sweep period in milliseconds (default: 5000)
    pub fn from_env() -> Self {
        Self {
            capacity: env::var("IPCACHE_CAPACITY")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(DEFAULT_CAPACITY),
            ttl_ms: env::var("IPCACHE_TTL_MS")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(0),
            sweep_interval_ms: env::var("IPCACHE_SWEEP_INTERVAL_MS")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(DEFAULT_SWEEP_INTERVAL_MS),
        }
    }

    /// Overrides the sweep period.
    pub fn with_sweep_interval_ms(mut self, sweep_interval_ms: u64) -> Self {
        self.sweep_interval_ms = sweep_interval_ms;
        self
    }

    /// Entry time-to-live, zero when expiry is disabled.
    pub fn ttl(&self) -> Duration {
        Duration::from_millis(self.ttl_ms)
    }

    /// Period between two expiry sweeps.
    pub fn sweep_interval(&self) -> Duration {
        Duration::from_millis(self.sweep_interval_ms)
    }

    /// Returns true when a positive TTL is configured.
    pub fn expiry_enabled(&self) -> bool {
        self.ttl_ms > 0
    }

    // == Validate ==
    /// Rejects configurations the cache cannot be built from.
    pub fn validate(&self) -> Result<()> {
        if self.capacity == 0 {
            return Err(CacheError::InvalidConfiguration(
                "capacity must be positive".to_string(),
            ));
        }
        if self.expiry_enabled() && self.sweep_interval_ms == 0 {
            return Err(CacheError::InvalidConfiguration(
                "sweep interval must be positive when a TTL is set".to_string(),
            ));
        }
        Ok(())
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            capacity: DEFAULT_CAPACITY,
            ttl_ms: 0,
            sweep_interval_ms: DEFAULT_SWEEP_INTERVAL_MS,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_config_default() {
        let config = Config::default();
        assert_eq!(config.capacity, 10);
        assert_eq!(config.ttl_ms, 0);
        assert_eq!(config.sweep_interval_ms, 5000);
        assert!(!config.expiry_enabled());
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_config_from_env_defaults() {
        // Clear any existing env vars to test defaults
        env::remove_var("IPCACHE_CAPACITY");
        env::remove_var("IPCACHE_TTL_MS");
        env::remove_var("IPCACHE_SWEEP_INTERVAL_MS");

        let config = Config::from_env();
        assert_eq!(config, Config::default());
    }

    #[test]
    fn test_config_rejects_zero_capacity() {
        let result = Config::new(0, 0).validate();
        assert!(matches!(result, Err(CacheError::InvalidConfiguration(_))));
    }

    #[test]
    fn test_config_rejects_zero_sweep_interval_with_ttl() {
        let config = Config::new(4, 1000).with_sweep_interval_ms(0);
        assert!(matches!(
            config.validate(),
            Err(CacheError::InvalidConfiguration(_))
        ));

        // Without a TTL the sweep period is never used
        assert!(Config::new(4, 0).with_sweep_interval_ms(0).validate().is_ok());
    }

    #[test]
    fn test_config_durations() {
        let config = Config::new(2, 1500).with_sweep_interval_ms(250);
        assert_eq!(config.ttl(), Duration::from_millis(1500));
        assert_eq!(config.sweep_interval(), Duration::from_millis(250));
        assert!(config.expiry_enabled());
    }

    #[test]
    fn test_config_deserialize_partial() {
        let config: Config = serde_json::from_str(r#"{"ttl_ms":2000}"#).unwrap();
        assert_eq!(config.capacity, 10);
        assert_eq!(config.ttl_ms, 2000);
        assert_eq!(config.sweep_interval_ms, 5000);
    }
}

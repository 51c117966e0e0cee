//! Simulator configuration with TOML file support.

use crate::SimError;
use gauge_types::{FactoryParams, Timestamp};
use gauge_utils::LogFormat;
use serde::{Deserialize, Serialize};

/// Engine and logging settings for a simulation run.
///
/// Loaded from a TOML file via [`SimConfig::from_toml_file`]; every field
/// has a default so an empty file is valid.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct SimConfig {
    /// Length of one epoch in seconds.
    #[serde(default = "default_epoch_duration_secs")]
    pub epoch_duration_secs: u64,

    /// Unix time at which epoch 1 starts.
    #[serde(default)]
    pub genesis_time: u64,

    /// Lock length at which escrow power stops growing.
    #[serde(default = "default_max_lock_secs")]
    pub max_lock_secs: u64,

    /// Name of the factory foreman.
    #[serde(default = "default_foreman")]
    pub foreman: String,

    #[serde(default)]
    pub log_format: LogFormat,

    /// `tracing` filter directive used when `RUST_LOG` is unset.
    #[serde(default = "default_log_level")]
    pub log_level: String,
}

// ── Defaults ───────────────────────────────────────────────────────────

fn default_epoch_duration_secs() -> u64 {
    FactoryParams::DEFAULT_EPOCH_DURATION_SECS
}

fn default_max_lock_secs() -> u64 {
    4 * 365 * 24 * 3600
}

fn default_foreman() -> String {
    "foreman".to_string()
}

fn default_log_level() -> String {
    "info".to_string()
}

// ── Impl ───────────────────────────────────────────────────────────────

impl SimConfig {
    pub fn from_toml_file(path: &str) -> Result<Self, SimError> {
        let content =
            std::fs::read_to_string(path).map_err(|e| SimError::Config(format!("{path}: {e}")))?;
        Self::from_toml_str(&content)
    }

    pub fn from_toml_str(s: &str) -> Result<Self, SimError> {
        let config: Self = toml::from_str(s).map_err(|e| SimError::Config(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    pub fn to_toml_string(&self) -> Result<String, SimError> {
        toml::to_string_pretty(self).map_err(|e| SimError::Config(e.to_string()))
    }

    pub fn validate(&self) -> Result<(), SimError> {
        if self.epoch_duration_secs == 0 {
            return Err(SimError::Config("epoch_duration_secs must be non-zero".into()));
        }
        if self.max_lock_secs == 0 {
            return Err(SimError::Config("max_lock_secs must be non-zero".into()));
        }
        Ok(())
    }

    pub fn factory_params(&self) -> FactoryParams {
        FactoryParams::new(self.epoch_duration_secs, Timestamp::new(self.genesis_time))
    }
}

impl Default for SimConfig {
    fn default() -> Self {
        Self {
            epoch_duration_secs: default_epoch_duration_secs(),
            genesis_time: 0,
            max_lock_secs: default_max_lock_secs(),
            foreman: default_foreman(),
            log_format: LogFormat::default(),
            log_level: default_log_level(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_round_trips_through_toml() {
        let config = SimConfig::default();
        let toml_str = config.to_toml_string().unwrap();
        let parsed = SimConfig::from_toml_str(&toml_str).expect("should parse");
        assert_eq!(parsed, config);
    }

    #[test]
    fn empty_toml_uses_defaults() {
        let config = SimConfig::from_toml_str("").expect("empty toml should use defaults");
        assert_eq!(config.epoch_duration_secs, 604_800);
        assert_eq!(config.log_format, LogFormat::Human);
        assert_eq!(config.foreman, "foreman");
    }

    #[test]
    fn partial_toml_overrides() {
        let config = SimConfig::from_toml_str(
            r#"
            epoch_duration_secs = 3
            log_format = "json"
        "#,
        )
        .expect("should parse");
        assert_eq!(config.epoch_duration_secs, 3);
        assert_eq!(config.log_format, LogFormat::Json);
        assert_eq!(config.log_level, "info");
        assert_eq!(config.factory_params().epoch_duration_secs, 3);
    }

    #[test]
    fn zero_duration_rejected() {
        let result = SimConfig::from_toml_str("epoch_duration_secs = 0");
        assert!(matches!(result, Err(SimError::Config(_))));
    }

    #[test]
    fn missing_file_returns_config_error() {
        let result = SimConfig::from_toml_file("/nonexistent/gauge-sim.toml");
        assert!(matches!(result, Err(SimError::Config(_))));
    }
}

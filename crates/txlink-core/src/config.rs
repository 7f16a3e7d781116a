//! Client configuration.
//!
//! Configuration is read from a TOML file and may be overridden by
//! environment variables:
//!
//! - `TXLINK_APPLICATION_ID`
//! - `TXLINK_TX_SERVICE_GROUP`
//! - `TXLINK_HEARTBEAT_MAX_RETRIES`
//!
//! ```toml
//! application_id = "order-service"
//! tx_service_group = "default_tx_group"
//! protocol_version = "1.0"
//!
//! [heartbeat]
//! max_retries = 3
//! interval_secs = 5
//! ```

use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::debug;

/// Default number of failed heartbeat sends tolerated before a session is released.
pub const DEFAULT_MAX_HEARTBEAT_RETRIES: u32 = 3;

/// Default interval between heartbeat probes.
pub const DEFAULT_HEARTBEAT_INTERVAL_SECS: u64 = 5;

/// Default protocol version tag sent in the registration handshake.
pub const DEFAULT_PROTOCOL_VERSION: &str = "1.0";

const ENV_APPLICATION_ID: &str = "TXLINK_APPLICATION_ID";
const ENV_TX_SERVICE_GROUP: &str = "TXLINK_TX_SERVICE_GROUP";
const ENV_HEARTBEAT_MAX_RETRIES: &str = "TXLINK_HEARTBEAT_MAX_RETRIES";

/// Heartbeat settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct HeartbeatConfig {
    /// Failed probe sends tolerated before the session is released.
    pub max_retries: u32,

    /// Seconds between probes.
    pub interval_secs: u64,
}

impl HeartbeatConfig {
    /// Returns the probe interval as a Duration.
    pub fn interval(&self) -> Duration {
        Duration::from_secs(self.interval_secs)
    }
}

impl Default for HeartbeatConfig {
    fn default() -> Self {
        Self {
            max_retries: DEFAULT_MAX_HEARTBEAT_RETRIES,
            interval_secs: DEFAULT_HEARTBEAT_INTERVAL_SECS,
        }
    }
}

/// Identity and liveness configuration for a client link.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClientConfig {
    /// Local application identity announced in the handshake.
    pub application_id: String,

    /// Transaction service group announced in the handshake.
    pub tx_service_group: String,

    /// Protocol version tag (e.g. "1.0").
    #[serde(default = "default_protocol_version")]
    pub protocol_version: String,

    /// Heartbeat settings
    #[serde(default)]
    pub heartbeat: HeartbeatConfig,
}

fn default_protocol_version() -> String {
    DEFAULT_PROTOCOL_VERSION.to_string()
}

impl ClientConfig {
    /// Creates a config with default protocol version and heartbeat settings.
    pub fn new(application_id: impl Into<String>, tx_service_group: impl Into<String>) -> Self {
        Self {
            application_id: application_id.into(),
            tx_service_group: tx_service_group.into(),
            protocol_version: default_protocol_version(),
            heartbeat: HeartbeatConfig::default(),
        }
    }

    /// Returns the default config file location (`<config_dir>/txlink/client.toml`).
    pub fn default_path() -> PathBuf {
        dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("/etc"))
            .join("txlink")
            .join("client.toml")
    }

    /// Parses a config from TOML text and validates it.
    pub fn from_toml_str(text: &str) -> Result<Self, ConfigError> {
        let config: ClientConfig =
            toml::from_str(text).map_err(|e| ConfigError::Parse(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    /// Loads a config file, applies environment overrides, and validates.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let text = fs::read_to_string(path).map_err(|e| ConfigError::Read {
            path: path.to_path_buf(),
            error: e.to_string(),
        })?;

        let mut config: ClientConfig =
            toml::from_str(&text).map_err(|e| ConfigError::Parse(e.to_string()))?;
        config.apply_env_overrides()?;
        config.validate()?;

        debug!(
            path = %path.display(),
            application_id = %config.application_id,
            tx_service_group = %config.tx_service_group,
            "Loaded client config"
        );
        Ok(config)
    }

    /// Applies overrides from the process environment.
    pub fn apply_env_overrides(&mut self) -> Result<(), ConfigError> {
        self.apply_overrides(|key| std::env::var(key).ok())
    }

    /// Applies overrides from an arbitrary variable lookup.
    pub fn apply_overrides<F>(&mut self, lookup: F) -> Result<(), ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(id) = lookup(ENV_APPLICATION_ID) {
            self.application_id = id;
        }
        if let Some(group) = lookup(ENV_TX_SERVICE_GROUP) {
            self.tx_service_group = group;
        }
        if let Some(raw) = lookup(ENV_HEARTBEAT_MAX_RETRIES) {
            self.heartbeat.max_retries =
                raw.trim()
                    .parse()
                    .map_err(|_| ConfigError::InvalidValue {
                        field: ENV_HEARTBEAT_MAX_RETRIES.to_string(),
                        value: raw.clone(),
                        expected: "a positive integer".to_string(),
                    })?;
        }
        Ok(())
    }

    /// Checks that identities are present and the retry budget is usable.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.application_id.trim().is_empty() {
            return Err(ConfigError::MissingField("application_id"));
        }
        if self.tx_service_group.trim().is_empty() {
            return Err(ConfigError::MissingField("tx_service_group"));
        }
        if self.heartbeat.max_retries == 0 {
            return Err(ConfigError::InvalidValue {
                field: "heartbeat.max_retries".to_string(),
                value: "0".to_string(),
                expected: "at least 1".to_string(),
            });
        }
        if self.heartbeat.interval_secs == 0 {
            return Err(ConfigError::InvalidValue {
                field: "heartbeat.interval_secs".to_string(),
                value: "0".to_string(),
                expected: "at least 1".to_string(),
            });
        }
        Ok(())
    }
}

/// Errors that can occur while loading configuration.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ConfigError {
    #[error("Failed to read config at {path}: {error}")]
    Read { path: PathBuf, error: String },

    #[error("Failed to parse config: {0}")]
    Parse(String),

    #[error("Missing required config field: {0}")]
    MissingField(&'static str),

    #[error("Invalid {field}: {value} (expected {expected})")]
    InvalidValue {
        field: String,
        value: String,
        expected: String,
    },
}

//! alertd configuration types and loading

use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use eyre::{Context, Result};
use serde::{Deserialize, Serialize};

/// Main alertd configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Remote alerting service endpoint
    pub server: ServerConfig,

    /// In-process provider settings
    pub provider: ProviderConfig,
}

/// Remote alerting service settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    /// Base URL of the remote service
    pub url: String,

    /// Request timeout in milliseconds
    pub timeout_ms: u64,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            url: "http://localhost:9093".into(),
            timeout_ms: 30_000,
        }
    }
}

/// In-process alert provider settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ProviderConfig {
    /// Seconds between GC sweeps of the expiring store
    pub gc_interval_secs: u64,

    /// Capacity of each subscriber's delivery channel. Once full, writers
    /// block until the subscriber drains; alerts are never dropped.
    pub channel_capacity: usize,
}

impl Default for ProviderConfig {
    fn default() -> Self {
        Self {
            gc_interval_secs: 1800,
            channel_capacity: 200,
        }
    }
}

impl ProviderConfig {
    pub fn gc_interval(&self) -> Duration {
        Duration::from_secs(self.gc_interval_secs)
    }
}

impl Config {
    /// Load configuration with fallback chain
    pub fn load(config_path: Option<&PathBuf>) -> Result<Self> {
        // If explicit config path provided, try to load it
        if let Some(path) = config_path {
            return Self::load_from_file(path).context(format!("Failed to load config from {}", path.display()));
        }

        // Try project-local config: .alertd.yml
        let local_config = PathBuf::from(".alertd.yml");
        if local_config.exists() {
            match Self::load_from_file(&local_config) {
                Ok(config) => return Ok(config),
                Err(e) => {
                    tracing::warn!("Failed to load config from {}: {}", local_config.display(), e);
                }
            }
        }

        // Try user config: ~/.config/alertd/alertd.yml
        if let Some(config_dir) = dirs::config_dir() {
            let user_config = config_dir.join("alertd").join("alertd.yml");
            if user_config.exists() {
                match Self::load_from_file(&user_config) {
                    Ok(config) => return Ok(config),
                    Err(e) => {
                        tracing::warn!("Failed to load config from {}: {}", user_config.display(), e);
                    }
                }
            }
        }

        Ok(Self::default())
    }

    /// Load configuration from a YAML file
    pub fn load_from_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let contents = fs::read_to_string(path).context(format!("Failed to read {}", path.display()))?;
        let config = serde_yaml::from_str(&contents).context(format!("Failed to parse {}", path.display()))?;
        Ok(config)
    }
}

//! Configuration management for scriptcreds

pub mod schema;

pub use schema::{Config, ScriptConfig};

use crate::error::{ScriptCredsError, ScriptCredsResult};
use std::path::{Path, PathBuf};
use tokio::fs;
use tracing::debug;

/// Configuration manager
pub struct ConfigManager {
    config_path: PathBuf,
}

impl ConfigManager {
    /// Create a new config manager with default path
    pub fn new() -> Self {
        Self {
            config_path: Self::default_config_path(),
        }
    }

    /// Create a config manager with a custom path
    pub fn with_path(path: PathBuf) -> Self {
        Self { config_path: path }
    }

    /// Get the default config file path
    pub fn default_config_path() -> PathBuf {
        dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("scriptcreds")
            .join("config.toml")
    }

    /// Load and validate configuration, using defaults if the file is absent
    pub async fn load(&self) -> ScriptCredsResult<Config> {
        if !self.config_path.exists() {
            debug!("Config file not found, using defaults");
            return Ok(Config::default());
        }

        self.load_from_file(&self.config_path).await
    }

    /// Load and validate configuration from a specific file
    pub async fn load_from_file(&self, path: &Path) -> ScriptCredsResult<Config> {
        let content = fs::read_to_string(path)
            .await
            .map_err(|e| ScriptCredsError::io(format!("reading config from {}", path.display()), e))?;

        let config: Config =
            toml::from_str(&content).map_err(|e| ScriptCredsError::ConfigInvalid {
                path: path.to_path_buf(),
                reason: e.to_string(),
            })?;

        config.validate()?;
        Ok(config)
    }

    /// Get the config file path
    pub fn path(&self) -> &Path {
        &self.config_path
    }
}

impl Default for ConfigManager {
    fn default() -> Self {
        Self::new()
    }
}

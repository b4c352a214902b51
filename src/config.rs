//! Channel finder configuration
//!
//! Loaded from YAML. Every section is optional:
//!
//! ```yaml
//! database:
//!   path: data/optional_levels.json
//! filters:
//!   sector_level: sector
//!   device_level: device
//! preview:
//!   depth: 3
//!   max_items: 10
//! ```
//!
//! A relative `database.path` is resolved against the directory of the
//! config file it was read from.

use std::path::{Path, PathBuf};

use serde::Deserialize;

use crate::error::ConfigError;

/// Environment variable naming the config file
pub const CONFIG_ENV_VAR: &str = "CHANNEL_FINDER_CONFIG";

/// Used when the environment variable is unset
pub const DEFAULT_CONFIG_PATH: &str = "config/channel_finder.yaml";

#[derive(Debug, Clone, Default, Deserialize)]
pub struct ChannelFinderConfig {
    #[serde(default)]
    pub database: DatabaseConfig,
    #[serde(default)]
    pub filters: FilterConfig,
    #[serde(default)]
    pub preview: PreviewConfig,
    /// Directory of the file this config came from
    #[serde(skip)]
    base_dir: Option<PathBuf>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct DatabaseConfig {
    /// Hierarchy definition (JSON)
    #[serde(default)]
    pub path: Option<PathBuf>,
}

/// Levels that the sector / device number filters apply to
#[derive(Debug, Clone, Deserialize)]
pub struct FilterConfig {
    #[serde(default = "default_sector_level")]
    pub sector_level: String,
    #[serde(default = "default_device_level")]
    pub device_level: String,
}

impl Default for FilterConfig {
    fn default() -> Self {
        Self {
            sector_level: default_sector_level(),
            device_level: default_device_level(),
        }
    }
}

fn default_sector_level() -> String {
    "sector".to_string()
}

fn default_device_level() -> String {
    "device".to_string()
}

/// Preview limits; negative means unlimited
#[derive(Debug, Clone, Deserialize)]
pub struct PreviewConfig {
    #[serde(default = "default_depth")]
    pub depth: i32,
    #[serde(default = "default_max_items")]
    pub max_items: i32,
}

impl Default for PreviewConfig {
    fn default() -> Self {
        Self {
            depth: default_depth(),
            max_items: default_max_items(),
        }
    }
}

fn default_depth() -> i32 {
    3
}

fn default_max_items() -> i32 {
    10
}

impl ChannelFinderConfig {
    /// Load configuration from a YAML file
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.display().to_string(),
            source,
        })?;
        let mut config = Self::from_yaml(&content)?;
        config.base_dir = path.parent().map(Path::to_path_buf);
        Ok(config)
    }

    /// Load configuration from a YAML string
    pub fn from_yaml(content: &str) -> Result<Self, ConfigError> {
        // An empty document deserializes as null
        if content.trim().is_empty() {
            return Ok(Self::default());
        }
        Ok(serde_yaml::from_str(content)?)
    }

    /// `$CHANNEL_FINDER_CONFIG`, falling back to the default path
    pub fn from_env() -> Result<Self, ConfigError> {
        let path = std::env::var(CONFIG_ENV_VAR).unwrap_or_else(|_| DEFAULT_CONFIG_PATH.into());
        Self::from_file(path)
    }

    /// Definition file path, resolved against the config file location
    pub fn database_path(&self) -> Result<PathBuf, ConfigError> {
        let path = self
            .database
            .path
            .as_ref()
            .ok_or(ConfigError::MissingDatabasePath)?;
        Ok(match &self.base_dir {
            Some(base) if path.is_relative() => base.join(path),
            _ => path.clone(),
        })
    }
}

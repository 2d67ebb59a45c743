//! Configuration loading and management

use crate::core::error::ConfigError;
use crate::core::favorites::DEFAULT_STORAGE_KEY;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use validator::Validate;

pub const DEFAULT_BASE_URL: &str = "https://rickandmortyapi.com/api";

/// Remote character API settings
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
#[serde(default)]
pub struct ApiConfig {
    /// Root of the REST API (e.g., "https://rickandmortyapi.com/api")
    #[validate(url)]
    pub base_url: String,

    /// Extra attempts after a transient failure
    #[validate(range(max = 10))]
    pub retry: u32,

    /// Pause between attempts, in milliseconds
    pub retry_delay_ms: u64,

    /// How long a fetched page stays fresh, in seconds
    pub stale_time_secs: u64,

    /// Per-request timeout, in seconds
    #[validate(range(min = 1))]
    pub timeout_secs: u64,
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            retry: 1,
            retry_delay_ms: 1000,
            stale_time_secs: 30,
            timeout_secs: 10,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
#[serde(default)]
pub struct FavoritesConfig {
    /// Storage key holding the serialized favorites
    #[validate(length(min = 1))]
    pub storage_key: String,
}

impl Default for FavoritesConfig {
    fn default() -> Self {
        Self {
            storage_key: DEFAULT_STORAGE_KEY.to_string(),
        }
    }
}

/// Where key-value state is kept
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum StorageBackend {
    /// Process-local, lost on exit
    #[default]
    Memory,
    /// JSON file on disk
    File,
}

#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
#[serde(default)]
pub struct StorageConfig {
    pub backend: StorageBackend,

    /// Storage file, required by the `file` backend
    pub path: Option<PathBuf>,

    /// How often the file is checked for changes from other processes
    #[validate(range(min = 10))]
    pub poll_interval_ms: u64,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            backend: StorageBackend::Memory,
            path: None,
            poll_interval_ms: 500,
        }
    }
}

/// Complete configuration of the explorer
#[derive(Debug, Clone, Default, Serialize, Deserialize, Validate)]
#[serde(default)]
pub struct ExplorerConfig {
    #[validate(nested)]
    pub api: ApiConfig,

    #[validate(nested)]
    pub favorites: FavoritesConfig,

    #[validate(nested)]
    pub storage: StorageConfig,
}

impl ExplorerConfig {
    /// Load configuration from a YAML file
    pub fn from_yaml_file(path: &str) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(|e| match e.kind() {
            std::io::ErrorKind::NotFound => ConfigError::FileNotFound {
                path: path.to_string(),
            },
            _ => ConfigError::IoError {
                message: e.to_string(),
            },
        })?;

        Self::parse(&content, Some(path))
    }

    /// Load configuration from a YAML string
    pub fn from_yaml_str(yaml: &str) -> Result<Self, ConfigError> {
        Self::parse(yaml, None)
    }

    fn parse(yaml: &str, file: Option<&str>) -> Result<Self, ConfigError> {
        let config: Self = serde_yaml::from_str(yaml).map_err(|e| ConfigError::ParseError {
            file: file.map(str::to_string),
            message: e.to_string(),
        })?;
        config.check()?;
        Ok(config)
    }

    /// Validate field ranges and cross-section requirements
    pub fn check(&self) -> Result<(), ConfigError> {
        self.validate()?;

        if self.storage.backend == StorageBackend::File && self.storage.path.is_none() {
            return Err(ConfigError::Invalid {
                message: "storage.path is required for the file backend".to_string(),
            });
        }
        Ok(())
    }

    /// Create a default configuration (public API, in-memory storage)
    pub fn default_config() -> Self {
        Self::default()
    }
}

//! Configuration System
//!
//! Layered configuration for the walker, the hash store and logging. Defaults
//! are overridden by the global config file (or an explicit one), then by
//! `TREESYNC__SECTION__KEY` environment variables. Tests included.

use crate::cache::CachePolicy;
use crate::logging::LoggingConfig;
use crate::walk::{WalkOptions, DEFAULT_PROGRESS_INTERVAL, DEFAULT_WORKERS};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;

mod facade;
mod merge;
mod paths;
mod sources;

pub use facade::ConfigLoader;

/// XDG path helpers
pub mod xdg {
    pub use super::paths::{config_home, default_store_path, global_config_path, APP_NAME};
}

/// Root configuration structure
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SyncConfig {
    #[serde(default)]
    pub walker: WalkerConfig,

    #[serde(default)]
    pub storage: StorageConfig,

    #[serde(default)]
    pub logging: LoggingConfig,
}

/// Walk engine settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WalkerConfig {
    /// Number of worker threads
    #[serde(default = "default_workers")]
    pub workers: usize,

    /// Interval between progress reports while waiting for a walk
    #[serde(default = "default_progress_interval_ms")]
    pub progress_interval_ms: u64,

    #[serde(default)]
    pub cache_policy: CachePolicy,
}

fn default_workers() -> usize {
    DEFAULT_WORKERS
}

fn default_progress_interval_ms() -> u64 {
    DEFAULT_PROGRESS_INTERVAL.as_millis() as u64
}

impl Default for WalkerConfig {
    fn default() -> Self {
        Self {
            workers: default_workers(),
            progress_interval_ms: default_progress_interval_ms(),
            cache_policy: CachePolicy::default(),
        }
    }
}

impl WalkerConfig {
    pub fn validate(&self) -> Result<(), String> {
        if self.workers == 0 {
            return Err("workers must be at least 1".to_string());
        }
        if self.progress_interval_ms == 0 {
            return Err("progress_interval_ms must be greater than zero".to_string());
        }
        Ok(())
    }

    pub fn walk_options(&self) -> WalkOptions {
        WalkOptions {
            workers: self.workers,
            progress_interval: Duration::from_millis(self.progress_interval_ms),
        }
    }
}

/// Hash store location
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct StorageConfig {
    /// Store directory; the platform data directory when unset
    #[serde(default)]
    pub store_path: Option<PathBuf>,
}

impl StorageConfig {
    /// Configured store directory, else the platform default
    pub fn resolved_store_path(&self) -> Option<PathBuf> {
        self.store_path.clone().or_else(paths::default_store_path)
    }

    pub fn validate(&self) -> Result<(), String> {
        match &self.store_path {
            Some(path) if path.as_os_str().is_empty() => {
                Err("Store path cannot be empty".to_string())
            }
            _ => Ok(()),
        }
    }
}

/// Configuration validation errors
#[derive(Debug, Clone)]
pub enum ValidationError {
    Walker(String),
    Storage(String),
    Logging(String),
}

impl std::fmt::Display for ValidationError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ValidationError::Walker(msg) => write!(f, "Walker: {}", msg),
            ValidationError::Storage(msg) => write!(f, "Storage: {}", msg),
            ValidationError::Logging(msg) => write!(f, "Logging: {}", msg),
        }
    }
}

impl std::error::Error for ValidationError {}

impl SyncConfig {
    /// Validate the entire configuration
    pub fn validate(&self) -> Result<(), Vec<ValidationError>> {
        let mut errors = Vec::new();
        if let Err(e) = self.walker.validate() {
            errors.push(ValidationError::Walker(e));
        }
        if let Err(e) = self.storage.validate() {
            errors.push(ValidationError::Storage(e));
        }
        if let Err(e) = self.logging.validate() {
            errors.push(ValidationError::Logging(e));
        }

        if errors.is_empty() {
            Ok(())
        } else {
            Err(errors)
        }
    }
}

//! Loading entry point over the merge policy and sources

use crate::config::merge::builder_with_defaults;
use crate::config::sources::{environment, explicit_file, global_file};
use crate::config::SyncConfig;
use crate::error::ApiError;
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use tracing::debug;

/// Builds a [`SyncConfig`] from defaults, a config file and the environment
#[derive(Debug, Clone, Default)]
pub struct ConfigLoader {
    config_file: Option<PathBuf>,
    env: Option<HashMap<String, String>>,
}

impl ConfigLoader {
    pub fn new() -> Self {
        Self::default()
    }

    /// Read `path` instead of the global config file
    pub fn with_file(mut self, path: impl Into<PathBuf>) -> Self {
        self.config_file = Some(path.into());
        self
    }

    /// Use `vars` instead of the process environment
    pub fn with_env(mut self, vars: HashMap<String, String>) -> Self {
        self.env = Some(vars);
        self
    }

    /// Load and validate the configuration
    pub fn load(&self) -> Result<SyncConfig, ApiError> {
        let mut builder = builder_with_defaults()?;
        builder = match &self.config_file {
            Some(path) => explicit_file::add_to_builder(builder, path)?,
            None => global_file::add_to_builder(builder)?,
        };
        builder = environment::add_to_builder(builder, self.env.clone())?;

        let config: SyncConfig = builder.build()?.try_deserialize()?;
        config.validate().map_err(|errors| {
            let messages: Vec<String> = errors.iter().map(|e| e.to_string()).collect();
            ApiError::ConfigError(format!(
                "Configuration validation failed:\n{}",
                messages.join("\n")
            ))
        })?;
        debug!(?config, "Configuration loaded");
        Ok(config)
    }

    /// Load from an explicit config file, then the environment
    pub fn load_from_file(path: &Path) -> Result<SyncConfig, ApiError> {
        Self::new().with_file(path).load()
    }
}

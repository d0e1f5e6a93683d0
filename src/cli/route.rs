//! CLI route: builds the run context from configuration and executes a sync.

use crate::cache::{CachePolicy, HashCache};
use crate::cli::parse::{Cli, OutputFormat};
use crate::cli::presentation::{
    format_json_output, format_summary_text, format_tree_text, SyncReport,
};
use crate::config::{ConfigLoader, SyncConfig};
use crate::error::{ApiError, StorageError};
use crate::store::{Store, DETAILS_MAP};
use crate::tree::hasher::FileHash;
use crate::walk::TreeWalker;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Instant;
use tracing::{debug, info};

/// Load configuration for `cli` and apply its flags on top
pub fn load_config(cli: &Cli) -> Result<SyncConfig, ApiError> {
    let mut config = match &cli.config {
        Some(path) => ConfigLoader::load_from_file(path)?,
        None => ConfigLoader::new().load()?,
    };
    apply_cli_overrides(&mut config, cli);
    config.validate().map_err(|errors| {
        let messages: Vec<String> = errors.iter().map(|e| e.to_string()).collect();
        ApiError::ConfigError(messages.join("\n"))
    })?;
    Ok(config)
}

fn apply_cli_overrides(config: &mut SyncConfig, cli: &Cli) {
    if let Some(workers) = cli.workers {
        config.walker.workers = workers;
    }
    if let Some(ref store) = cli.store {
        config.storage.store_path = Some(store.clone());
    }
    if cli.trust_cache {
        config.walker.cache_policy = CachePolicy::PathOnly;
    }
    if cli.verbose {
        config.logging.level = "debug".to_string();
    }
    if cli.quiet {
        config.logging.level = "error".to_string();
    }
    if let Some(ref level) = cli.log_level {
        config.logging.level = level.clone();
    }
    if let Some(ref format) = cli.log_format {
        config.logging.format = format.clone();
    }
    if let Some(ref output) = cli.log_output {
        config.logging.output = output.clone();
    }
    if let Some(ref file) = cli.log_file {
        config.logging.file = Some(file.clone());
    }
}

/// Holds the open hash store and the walker built over it
pub struct RunContext {
    walker: TreeWalker,
    store: Option<Store>,
}

impl RunContext {
    /// Open the configured store (unless `no_cache`) and build the walker
    pub fn new(config: &SyncConfig, no_cache: bool) -> Result<Self, ApiError> {
        let policy = config.walker.cache_policy;
        let (cache, store) = if no_cache {
            debug!("Persistent cache disabled");
            (HashCache::in_memory(policy), None)
        } else {
            let store_path = config.storage.resolved_store_path().ok_or_else(|| {
                ApiError::StorageError(StorageError::InvalidPath(
                    "No store path configured and no home directory found".to_string(),
                ))
            })?;
            let store = Store::open(&store_path)?;
            let details = store.map::<String, FileHash>(DETAILS_MAP)?;
            info!(store = %store_path.display(), ?policy, "Hash store opened");
            (HashCache::new(details, policy), Some(store))
        };

        let walker = TreeWalker::new(Arc::new(cache)).with_options(config.walker.walk_options());
        Ok(Self { walker, store })
    }

    pub fn store_path(&self) -> Option<&Path> {
        self.store.as_ref().map(Store::path)
    }

    /// Walk `path` and render the result in `format`
    pub fn execute(&self, path: &Path, format: OutputFormat) -> Result<String, ApiError> {
        let started = Instant::now();
        info!(path = %path.display(), workers = self.walker.options().workers, "Sync started");

        let tree = self.walker.walk(path)?;
        info!(total = tree.count(), "Sync total: {} entries", tree.count());

        let root = crate::tree::path::absolute_path(path).unwrap_or_else(|_| PathBuf::from(path));
        let report = SyncReport::new(
            root,
            &tree,
            self.walker.cache().stats(),
            started.elapsed().as_millis() as u64,
        );
        match format {
            OutputFormat::Text => Ok(format_summary_text(&report)),
            OutputFormat::Tree => Ok(format_tree_text(&report)),
            OutputFormat::Json => format_json_output(&report),
        }
    }

    /// Flush the store, if one is open
    pub fn close(self) -> Result<(), ApiError> {
        let Self { walker, store } = self;
        // the cache holds a map of the store; release it first
        drop(walker);
        if let Some(store) = store {
            store.close()?;
        }
        Ok(())
    }
}

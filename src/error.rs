//! Error types for the treesync snapshot engine.

use std::path::{Path, PathBuf};
use thiserror::Error;

/// Persistent store errors
#[derive(Debug, Error)]
pub enum StorageError {
    #[error("Failed to open store at {path:?}: {reason}")]
    Open { path: PathBuf, reason: String },

    #[error("Store I/O error: {0}")]
    Io(String),

    #[error("Failed to encode or decode store record: {0}")]
    Codec(String),

    #[error("Invalid path: {0}")]
    InvalidPath(String),
}

impl From<sled::Error> for StorageError {
    fn from(err: sled::Error) -> Self {
        StorageError::Io(err.to_string())
    }
}

impl From<bincode::Error> for StorageError {
    fn from(err: bincode::Error) -> Self {
        StorageError::Codec(err.to_string())
    }
}

/// Faults that abort a tree walk.
///
/// Every variant is fatal: the first one raised by any worker cancels the walk
/// and is handed to the caller blocked in the walker.
#[derive(Debug, Error)]
pub enum WalkError {
    #[error("I/O failure at {path:?}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Unsupported entry kind at {path:?}")]
    UnsupportedEntryKind { path: PathBuf },

    #[error("Invariant violated at {path:?}: {detail}")]
    InvariantViolation { path: PathBuf, detail: String },

    #[error("Walk root is not a directory: {path:?}")]
    NotADirectory { path: PathBuf },

    #[error("Hash cache failure: {0}")]
    Store(#[from] StorageError),

    #[error("Worker {worker} panicked")]
    WorkerPanicked { worker: usize },

    #[error("Invalid walk options: {0}")]
    InvalidOptions(String),
}

impl WalkError {
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        WalkError::Io {
            path: path.into(),
            source,
        }
    }

    pub fn invariant(path: impl Into<PathBuf>, detail: impl Into<String>) -> Self {
        WalkError::InvariantViolation {
            path: path.into(),
            detail: detail.into(),
        }
    }

    /// Attribute an invariant violation raised without a path to `path`
    pub(crate) fn located_at(self, path: &Path) -> Self {
        match self {
            WalkError::InvariantViolation { path: at, detail } if at.as_os_str().is_empty() => {
                WalkError::invariant(path, detail)
            }
            other => other,
        }
    }
}

/// Top-level errors surfaced by the CLI, configuration and logging layers
#[derive(Debug, Error)]
pub enum ApiError {
    #[error("Walk failed: {0}")]
    Walk(#[from] WalkError),

    #[error("Storage error: {0}")]
    StorageError(#[from] StorageError),

    #[error("Configuration error: {0}")]
    ConfigError(String),
}

impl From<config::ConfigError> for ApiError {
    fn from(err: config::ConfigError) -> Self {
        ApiError::ConfigError(err.to_string())
    }
}

//! Persistent Store
//!
//! Key/value storage that outlives a process run. The hash cache keeps one map,
//! [`DETAILS_MAP`], keyed by absolute path.

pub mod persistence;

pub use persistence::{PersistentMap, Store};

use crate::error::StorageError;
use crate::tree::hasher::FileHash;
use std::collections::HashMap;

/// Name of the map holding cached file hashes
pub const DETAILS_MAP: &str = "details";

/// Backing storage for cached file hashes.
///
/// Implementations are not required to be thread-safe; the hash cache
/// serializes every call behind its own lock.
pub trait HashStore: Send {
    fn get(&self, path: &str) -> Result<Option<FileHash>, StorageError>;
    fn set(&mut self, path: &str, hash: &FileHash) -> Result<(), StorageError>;
}

/// Process-local store that forgets everything on exit
#[derive(Debug, Default)]
pub struct MemoryHashStore {
    entries: HashMap<String, FileHash>,
}

impl MemoryHashStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl HashStore for MemoryHashStore {
    fn get(&self, path: &str) -> Result<Option<FileHash>, StorageError> {
        Ok(self.entries.get(path).copied())
    }

    fn set(&mut self, path: &str, hash: &FileHash) -> Result<(), StorageError> {
        self.entries.insert(path.to_string(), *hash);
        Ok(())
    }
}

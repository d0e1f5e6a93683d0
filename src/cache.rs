//! Hash Cache
//!
//! Lock-guarded adapter over a [`HashStore`], keyed by absolute path. All store
//! access from every worker goes through one coarse lock. A lookup and the store
//! that may follow it take the lock separately, so two workers can both miss on
//! the same file and hash it twice; both write the same digest.

use crate::error::StorageError;
use crate::store::{HashStore, MemoryHashStore};
use crate::tree::hasher::FileHash;
use crate::tree::path::cache_key;
use crate::tree::walker::FileMetadata;
use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::sync::atomic::{AtomicU64, Ordering};

/// When a cached hash may be reused
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CachePolicy {
    /// Reuse only if the cached size and modification time match the live file
    #[default]
    Validated,
    /// Reuse any record for the path without looking at the live file.
    /// A file rewritten in place keeps its old hash.
    PathOnly,
}

/// Outcome of [`HashCache::lookup`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Lookup {
    Hit(FileHash),
    /// A record exists but no longer describes the live file
    Stale(FileHash),
    Miss,
}

/// Counters since the cache was created
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct CacheStats {
    pub hits: u64,
    pub misses: u64,
    pub stale: u64,
    pub writes: u64,
}

pub struct HashCache {
    store: Mutex<Box<dyn HashStore>>,
    policy: CachePolicy,
    hits: AtomicU64,
    misses: AtomicU64,
    stale: AtomicU64,
    writes: AtomicU64,
}

impl HashCache {
    pub fn new(store: impl HashStore + 'static, policy: CachePolicy) -> Self {
        Self {
            store: Mutex::new(Box::new(store)),
            policy,
            hits: AtomicU64::new(0),
            misses: AtomicU64::new(0),
            stale: AtomicU64::new(0),
            writes: AtomicU64::new(0),
        }
    }

    /// Cache that lives only as long as this process
    pub fn in_memory(policy: CachePolicy) -> Self {
        Self::new(MemoryHashStore::new(), policy)
    }

    pub fn get(&self, path: &Path) -> Result<Option<FileHash>, StorageError> {
        let key = cache_key(path);
        self.store.lock().get(&key)
    }

    pub fn set(&self, path: &Path, hash: &FileHash) -> Result<(), StorageError> {
        let key = cache_key(path);
        self.store.lock().set(&key, hash)?;
        self.writes.fetch_add(1, Ordering::Relaxed);
        Ok(())
    }

    /// Look up `path` and apply the cache policy against its live metadata
    pub fn lookup(&self, path: &Path, live: &FileMetadata) -> Result<Lookup, StorageError> {
        let lookup = match self.get(path)? {
            None => Lookup::Miss,
            Some(cached) => match self.policy {
                CachePolicy::PathOnly => Lookup::Hit(cached),
                CachePolicy::Validated if cached.matches(live.size, live.modified) => {
                    Lookup::Hit(cached)
                }
                CachePolicy::Validated => Lookup::Stale(cached),
            },
        };
        let counter = match lookup {
            Lookup::Hit(_) => &self.hits,
            Lookup::Stale(_) => &self.stale,
            Lookup::Miss => &self.misses,
        };
        counter.fetch_add(1, Ordering::Relaxed);
        Ok(lookup)
    }

    pub fn stats(&self) -> CacheStats {
        CacheStats {
            hits: self.hits.load(Ordering::Relaxed),
            misses: self.misses.load(Ordering::Relaxed),
            stale: self.stale.load(Ordering::Relaxed),
            writes: self.writes.load(Ordering::Relaxed),
        }
    }
}

//! Sled-backed persistent store

use crate::error::StorageError;
use crate::store::HashStore;
use crate::tree::hasher::FileHash;
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::borrow::Borrow;
use std::marker::PhantomData;
use std::path::{Path, PathBuf};
use tracing::debug;

/// An on-disk key/value store holding any number of named maps.
///
/// The database directory is locked exclusively while open. [`Store::close`]
/// flushes pending writes; the lock is released once the store and every map
/// obtained from it have been dropped.
pub struct Store {
    db: sled::Db,
    path: PathBuf,
}

impl Store {
    /// Open the store at `path`, creating the directory if needed
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self, StorageError> {
        let path = path.as_ref().to_path_buf();
        std::fs::create_dir_all(&path).map_err(|e| StorageError::Open {
            path: path.clone(),
            reason: e.to_string(),
        })?;
        let db = sled::open(&path).map_err(|e| StorageError::Open {
            path: path.clone(),
            reason: e.to_string(),
        })?;
        debug!(store = %path.display(), "Opened store");
        Ok(Self { db, path })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Typed view of the named map
    pub fn map<K, V>(&self, name: &str) -> Result<PersistentMap<K, V>, StorageError>
    where
        K: Serialize,
        V: Serialize + DeserializeOwned,
    {
        let tree = self.db.open_tree(name)?;
        Ok(PersistentMap {
            tree,
            _types: PhantomData,
        })
    }

    /// Flush all pending writes to disk
    pub fn close(self) -> Result<(), StorageError> {
        self.db.flush()?;
        debug!(store = %self.path.display(), "Closed store");
        Ok(())
    }
}

/// A persistent map with bincode-encoded keys and values
pub struct PersistentMap<K, V> {
    tree: sled::Tree,
    _types: PhantomData<fn(&K) -> V>,
}

impl<K, V> PersistentMap<K, V>
where
    K: Serialize,
    V: Serialize + DeserializeOwned,
{
    pub fn get<Q>(&self, key: &Q) -> Result<Option<V>, StorageError>
    where
        K: Borrow<Q>,
        Q: Serialize + ?Sized,
    {
        let key = bincode::serialize(key)?;
        match self.tree.get(key)? {
            Some(bytes) => Ok(Some(bincode::deserialize(&bytes)?)),
            None => Ok(None),
        }
    }

    pub fn set<Q>(&self, key: &Q, value: &V) -> Result<(), StorageError>
    where
        K: Borrow<Q>,
        Q: Serialize + ?Sized,
    {
        let key = bincode::serialize(key)?;
        let value = bincode::serialize(value)?;
        self.tree.insert(key, value)?;
        Ok(())
    }

    pub fn len(&self) -> usize {
        self.tree.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tree.is_empty()
    }
}

impl HashStore for PersistentMap<String, FileHash> {
    fn get(&self, path: &str) -> Result<Option<FileHash>, StorageError> {
        PersistentMap::get(self, path)
    }

    fn set(&mut self, path: &str, hash: &FileHash) -> Result<(), StorageError> {
        PersistentMap::set(self, path, hash)
    }
}

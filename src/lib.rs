//! Treesync
//!
//! Concurrent directory snapshots. A pool of worker threads lists directories
//! and hashes regular files (SHA-256), reusing hashes from a persistent cache,
//! and assembles an immutable [`tree::DirTree`] of the walked directory.

pub mod cache;
pub mod cli;
pub mod config;
pub mod error;
pub mod logging;
pub mod store;
pub mod tree;
pub mod walk;

pub use cache::{CachePolicy, HashCache};
pub use error::{ApiError, StorageError, WalkError};
pub use tree::{DirTree, FileHash, TreeEntry};
pub use walk::{TreeWalker, WalkOptions};

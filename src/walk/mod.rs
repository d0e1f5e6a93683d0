//! Concurrent tree walk
//!
//! [`TreeWalker::walk`] builds a [`DirTree`] of a directory using a fixed pool of
//! worker threads. Directories are listed, regular files are hashed (or served
//! from the [`HashCache`]) and symlinks are recorded without being followed.
//! A node finishes once it has been visited and all of its children have
//! finished; the walk is complete when the root finishes.

pub mod node;
pub mod observer;
pub mod queue;
mod worker;

pub use observer::{HashSource, NoopObserver, TracingObserver, WalkObserver};
pub use queue::{QueueSnapshot, WalkQueue};

use crate::cache::HashCache;
use crate::error::WalkError;
use crate::tree::entry::DirTree;
use crate::tree::path::display_name;
use crate::tree::walker::{EntryKind, FileSystem, LocalFileSystem};
use std::path::Path;
use std::sync::Arc;
use std::thread;
use std::time::{Duration, Instant};
use tracing::{debug, error, info, instrument};
use worker::Worker;

pub const DEFAULT_WORKERS: usize = 4;
pub const DEFAULT_PROGRESS_INTERVAL: Duration = Duration::from_secs(2);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WalkOptions {
    /// Number of worker threads, at least 1
    pub workers: usize,
    /// How often the waiting caller reports progress
    pub progress_interval: Duration,
}

impl Default for WalkOptions {
    fn default() -> Self {
        Self {
            workers: DEFAULT_WORKERS,
            progress_interval: DEFAULT_PROGRESS_INTERVAL,
        }
    }
}

impl WalkOptions {
    pub fn validate(&self) -> Result<(), WalkError> {
        if self.workers == 0 {
            return Err(WalkError::InvalidOptions(
                "worker count must be at least 1".to_string(),
            ));
        }
        if self.progress_interval.is_zero() {
            return Err(WalkError::InvalidOptions(
                "progress interval must be greater than zero".to_string(),
            ));
        }
        Ok(())
    }
}

/// Builds directory snapshots backed by a shared hash cache
pub struct TreeWalker {
    cache: Arc<HashCache>,
    fs: Arc<dyn FileSystem>,
    observer: Arc<dyn WalkObserver>,
    options: WalkOptions,
}

impl TreeWalker {
    /// Walker over the local disk with default options
    pub fn new(cache: Arc<HashCache>) -> Self {
        Self {
            cache,
            fs: Arc::new(LocalFileSystem),
            observer: Arc::new(TracingObserver),
            options: WalkOptions::default(),
        }
    }

    pub fn with_file_system(mut self, fs: impl FileSystem + 'static) -> Self {
        self.fs = Arc::new(fs);
        self
    }

    pub fn with_observer(mut self, observer: impl WalkObserver + 'static) -> Self {
        self.observer = Arc::new(observer);
        self
    }

    pub fn with_options(mut self, options: WalkOptions) -> Self {
        self.options = options;
        self
    }

    pub fn with_workers(mut self, workers: usize) -> Self {
        self.options.workers = workers;
        self
    }

    pub fn options(&self) -> &WalkOptions {
        &self.options
    }

    pub fn cache(&self) -> &Arc<HashCache> {
        &self.cache
    }

    /// Walk `root` and return its snapshot.
    ///
    /// Blocks until every entry below `root` has been recorded, or returns the
    /// first fault any worker hit. Worker threads have exited when this returns.
    #[instrument(skip(self, root), fields(root = %root.display(), workers = self.options.workers))]
    pub fn walk(&self, root: &Path) -> Result<DirTree, WalkError> {
        self.options.validate()?;
        let start = Instant::now();

        let root = self
            .fs
            .resolve_root(root)
            .map_err(|e| WalkError::io(root, e))?;
        let metadata = self.fs.metadata(&root).map_err(|e| WalkError::io(&root, e))?;
        if metadata.kind != EntryKind::Directory {
            return Err(WalkError::NotADirectory { path: root });
        }

        self.observer.walk_started(&root, self.options.workers);
        let queue = Arc::new(WalkQueue::new());
        queue.seed(display_name(&root), root.clone());

        let mut handles = Vec::with_capacity(self.options.workers);
        for index in 0..self.options.workers {
            let worker = Worker {
                index,
                queue: Arc::clone(&queue),
                cache: Arc::clone(&self.cache),
                fs: Arc::clone(&self.fs),
                observer: Arc::clone(&self.observer),
            };
            let spawned = thread::Builder::new()
                .name(format!("treesync-worker-{}", index))
                .spawn(move || worker.run());
            match spawned {
                Ok(handle) => handles.push(handle),
                Err(e) => {
                    queue.fail(WalkError::io(&root, e));
                    break;
                }
            }
        }

        let observer = Arc::clone(&self.observer);
        let result = queue.await_result(self.options.progress_interval, |snapshot| {
            observer.progress(snapshot)
        });

        for (index, handle) in handles.into_iter().enumerate() {
            if handle.join().is_err() {
                error!(worker = index, "Walk worker terminated by panic");
            }
        }

        let tree = result?;
        let elapsed = start.elapsed();
        self.observer.walk_finished(tree.count(), elapsed);
        let stats = self.cache.stats();
        info!(
            entries = tree.count(),
            cache_hits = stats.hits,
            cache_misses = stats.misses + stats.stale,
            duration_ms = elapsed.as_millis() as u64,
            "Walk completed"
        );
        debug!(live_nodes = queue.snapshot().live, "Queue drained");
        Ok(tree)
    }
}

//! Worker loop: take a task, do its I/O outside the queue lock, report back

use crate::cache::{HashCache, Lookup};
use crate::error::WalkError;
use crate::tree::hasher::FileHash;
use crate::tree::walker::{EntryKind, FileSystem};
use crate::walk::node::NodeKind;
use crate::walk::observer::{HashSource, WalkObserver};
use crate::walk::queue::{Task, WalkQueue};
use std::sync::Arc;
use std::thread;
use tracing::{debug, error, trace};

pub(crate) struct Worker {
    pub index: usize,
    pub queue: Arc<WalkQueue>,
    pub cache: Arc<HashCache>,
    pub fs: Arc<dyn FileSystem>,
    pub observer: Arc<dyn WalkObserver>,
}

/// Cancels the walk if the worker unwinds
struct PanicGuard<'a> {
    queue: &'a WalkQueue,
    worker: usize,
}

impl Drop for PanicGuard<'_> {
    fn drop(&mut self) {
        if thread::panicking() {
            error!(worker = self.worker, "Walk worker panicked");
            self.queue.fail(WalkError::WorkerPanicked {
                worker: self.worker,
            });
        }
    }
}

impl Worker {
    /// Run until the queue reports the walk is over or cancelled
    pub fn run(self) {
        let _guard = PanicGuard {
            queue: &self.queue,
            worker: self.index,
        };
        let mut visited = 0usize;
        while let Some(task) = self.queue.take() {
            if let Err(err) = self.visit(&task) {
                debug!(worker = self.index, path = %task.path.display(), error = %err, "Visit failed");
                self.queue.fail(err);
                break;
            }
            visited += 1;
        }
        trace!(worker = self.index, visited, "Worker exiting");
    }

    fn visit(&self, task: &Task) -> Result<(), WalkError> {
        match task.kind {
            NodeKind::Directory => self.visit_directory(task),
            NodeKind::RegularFile => self.visit_file(task),
        }
    }

    fn visit_directory(&self, task: &Task) -> Result<(), WalkError> {
        let listing = self
            .fs
            .list_dir(&task.path)
            .map_err(|e| WalkError::io(&task.path, e))?;
        trace!(path = %task.path.display(), children = listing.len(), "Listed directory");

        self.queue.complete_visit(task, |discovery| {
            for entry in listing {
                let name = entry.name();
                let path = task.path.join(&entry.file_name);
                match entry.kind {
                    EntryKind::Directory => discovery.add_directory(name, path)?,
                    EntryKind::RegularFile => discovery.add_file(name, path)?,
                    EntryKind::Symlink => discovery.add_symlink(name)?,
                    EntryKind::Other => return Err(WalkError::UnsupportedEntryKind { path }),
                }
            }
            Ok(())
        })
    }

    fn visit_file(&self, task: &Task) -> Result<(), WalkError> {
        let path = &task.path;
        let live = self.fs.metadata(path).map_err(|e| WalkError::io(path, e))?;

        let (hash, source) = match self.cache.lookup(path, &live)? {
            Lookup::Hit(hash) => (hash, HashSource::Cached),
            lookup => {
                if let Lookup::Stale(previous) = lookup {
                    debug!(path = %path.display(), previous = %previous, "Cached hash is stale");
                }
                let reader = self.fs.open(path).map_err(|e| WalkError::io(path, e))?;
                let hash = FileHash::compute(reader, live.size, live.modified)
                    .map_err(|e| WalkError::io(path, e))?;
                self.cache.set(path, &hash)?;
                (hash, HashSource::Computed)
            }
        };
        self.observer.file_hashed(path, source);

        self.queue.complete_visit(task, |discovery| discovery.set_hash(hash))
    }
}

//! Walk observability hooks

use crate::walk::queue::QueueSnapshot;
use std::path::Path;
use std::time::Duration;
use tracing::{debug, info};

/// Where a file's hash came from
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HashSource {
    /// Reused from the hash cache
    Cached,
    /// Read and hashed during this walk
    Computed,
}

/// Receives walk events. Called from worker threads and the waiting caller,
/// never while the queue lock is held.
pub trait WalkObserver: Send + Sync {
    fn walk_started(&self, _root: &Path, _workers: usize) {}

    /// Periodic report while the caller waits for the result
    fn progress(&self, _snapshot: QueueSnapshot) {}

    fn file_hashed(&self, _path: &Path, _source: HashSource) {}

    fn walk_finished(&self, _entries: usize, _elapsed: Duration) {}
}

/// Reports walk events through `tracing`
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingObserver;

impl WalkObserver for TracingObserver {
    fn walk_started(&self, root: &Path, workers: usize) {
        info!(root = %root.display(), workers, "Walk started");
    }

    fn progress(&self, snapshot: QueueSnapshot) {
        info!(
            entries_seen = snapshot.entries_seen,
            queued = snapshot.ready,
            in_flight = snapshot.live,
            "{} entries seen",
            snapshot.entries_seen
        );
    }

    fn file_hashed(&self, path: &Path, source: HashSource) {
        debug!(path = %path.display(), ?source, "File hashed");
    }

    fn walk_finished(&self, entries: usize, elapsed: Duration) {
        info!(entries, elapsed_ms = elapsed.as_millis() as u64, "Walk finished");
    }
}

/// Discards every event
#[derive(Debug, Clone, Copy, Default)]
pub struct NoopObserver;

impl WalkObserver for NoopObserver {}

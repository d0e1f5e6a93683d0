//! Completion-tracking work queue
//!
//! The single synchronization point of a walk. One lock guards the ready list,
//! every live [`Node`], the final result and the failure slot; one condition
//! variable signals every change. Workers block in [`WalkQueue::take`], the
//! caller blocks in [`WalkQueue::await_result`].
//!
//! Only in-memory bookkeeping runs under the lock. Workers do their listing,
//! reading and hashing first, then hand the outcome to
//! [`WalkQueue::complete_visit`].
//!
//! Once the ready list is empty and the root has finished no node is left to
//! enqueue more work, so every `take` returns `None` from then on.

use crate::error::WalkError;
use crate::tree::entry::{DirTree, SymlinkEntry, TreeEntry};
use crate::tree::hasher::FileHash;
use crate::walk::node::{Node, NodeArena, NodeId, NodeKind};
use parking_lot::{Condvar, Mutex, MutexGuard};
use std::collections::VecDeque;
use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};
use tracing::{debug, trace};

/// A node ready to be visited. Carries what the worker needs for I/O; the
/// node's mutable state stays in the queue.
#[derive(Debug, Clone)]
pub struct Task {
    pub id: NodeId,
    pub path: PathBuf,
    pub kind: NodeKind,
}

/// Point-in-time view of the queue, for progress reporting
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct QueueSnapshot {
    /// Entries discovered so far, including the root
    pub entries_seen: u64,
    /// Tasks waiting for a worker
    pub ready: usize,
    /// Nodes not yet finished
    pub live: usize,
}

#[derive(Debug, Default)]
struct QueueState {
    /// FIFO. Order only affects scheduling, never the result's content.
    ready: VecDeque<Task>,
    nodes: NodeArena,
    result: Option<DirTree>,
    root_finished: bool,
    cancelled: bool,
    failure: Option<WalkError>,
    entries_seen: u64,
}

impl QueueState {
    fn enqueue(&mut self, task: Task) {
        self.ready.push_back(task);
    }

    fn add_node(&mut self, node: Node) -> NodeId {
        let path = node.path().to_path_buf();
        let kind = node.kind();
        let id = self.nodes.insert(node);
        self.entries_seen += 1;
        self.enqueue(Task { id, path, kind });
        id
    }

    fn complete<F>(&mut self, task: &Task, discover: F) -> Result<(), WalkError>
    where
        F: FnOnce(&mut Discovery<'_>) -> Result<(), WalkError>,
    {
        let id = task.id;
        let mut discovery = Discovery { state: self, node: id };
        let outcome = discover(&mut discovery)
            .and_then(|()| self.nodes.get_mut(id)?.mark_visited())
            .and_then(|()| self.settle(id));
        outcome.map_err(|e| e.located_at(&task.path))
    }

    /// Walk finished nodes upwards: each finished node becomes an entry of its
    /// parent, which may finish in turn.
    fn settle(&mut self, mut id: NodeId) -> Result<(), WalkError> {
        loop {
            if !self.nodes.get(id)?.is_finished() {
                return Ok(());
            }
            let node = self.nodes.remove(id)?;
            let parent = node.parent();
            let path = node.path().to_path_buf();
            let entry = node.into_entry()?;
            match parent {
                Some(parent) => {
                    self.nodes
                        .get_mut(parent)
                        .and_then(|p| p.child_finished(entry))
                        .map_err(|e| e.located_at(&path))?;
                    id = parent;
                }
                None => return self.finish_root(path, entry),
            }
        }
    }

    fn finish_root(&mut self, path: PathBuf, entry: TreeEntry) -> Result<(), WalkError> {
        if self.root_finished {
            return Err(WalkError::invariant(path, "root finished twice"));
        }
        match entry {
            TreeEntry::Directory(tree) => {
                debug!(entries = tree.count(), "Root finished");
                self.result = Some(tree);
                self.root_finished = true;
                Ok(())
            }
            _ => Err(WalkError::invariant(path, "root is not a directory")),
        }
    }

    fn snapshot(&self) -> QueueSnapshot {
        QueueSnapshot {
            entries_seen: self.entries_seen,
            ready: self.ready.len(),
            live: self.nodes.live(),
        }
    }
}

/// Mutations available while completing a visit. Runs under the queue lock, so
/// it must not block.
pub struct Discovery<'a> {
    state: &'a mut QueueState,
    node: NodeId,
}

impl Discovery<'_> {
    /// Register a subdirectory as a pending child and schedule it
    pub fn add_directory(&mut self, name: String, path: PathBuf) -> Result<(), WalkError> {
        self.add_child(name, path, NodeKind::Directory)
    }

    /// Register a regular file as a pending child and schedule it for hashing
    pub fn add_file(&mut self, name: String, path: PathBuf) -> Result<(), WalkError> {
        self.add_child(name, path, NodeKind::RegularFile)
    }

    /// Append a symlink entry directly; symlinks are never scheduled
    pub fn add_symlink(&mut self, name: String) -> Result<(), WalkError> {
        self.state
            .nodes
            .get_mut(self.node)?
            .append_entry(TreeEntry::Symlink(SymlinkEntry { name }))?;
        self.state.entries_seen += 1;
        Ok(())
    }

    /// Record the content hash of the file node being completed
    pub fn set_hash(&mut self, hash: FileHash) -> Result<(), WalkError> {
        self.state.nodes.get_mut(self.node)?.set_hash(hash)
    }

    fn add_child(&mut self, name: String, path: PathBuf, kind: NodeKind) -> Result<(), WalkError> {
        self.state.nodes.get_mut(self.node)?.register_child()?;
        trace!(path = %path.display(), ?kind, "Registered child");
        self.state
            .add_node(Node::new(name, path, kind, Some(self.node)));
        Ok(())
    }
}

#[derive(Debug, Default)]
pub struct WalkQueue {
    state: Mutex<QueueState>,
    changed: Condvar,
}

impl WalkQueue {
    pub fn new() -> Self {
        Self::default()
    }

    /// Create the root directory node and schedule it
    pub fn seed(&self, name: String, path: PathBuf) -> NodeId {
        let mut state = self.state.lock();
        let id = state.add_node(Node::new(name, path, NodeKind::Directory, None));
        drop(state);
        self.changed.notify_all();
        id
    }

    /// Next task to visit, FIFO.
    ///
    /// Blocks while there is no work and the root is unfinished. Returns `None`
    /// once the walk is over (root finished and no work left) or cancelled.
    pub fn take(&self) -> Option<Task> {
        let mut state = self.state.lock();
        loop {
            if state.cancelled {
                return None;
            }
            if let Some(task) = state.ready.pop_front() {
                return Some(task);
            }
            if state.root_finished {
                return None;
            }
            self.changed.wait(&mut state);
        }
    }

    /// Apply a visit's outcome and mark the task's node visited, atomically.
    ///
    /// `discover` registers children and appends entries; it runs under the
    /// lock and must not do I/O. A node that ends up finished is delivered to
    /// its parent, cascading upwards. On error the queue is cancelled at once;
    /// the caller reports the error through [`WalkQueue::fail`]. After
    /// cancellation this is a no-op.
    pub fn complete_visit<F>(&self, task: &Task, discover: F) -> Result<(), WalkError>
    where
        F: FnOnce(&mut Discovery<'_>) -> Result<(), WalkError>,
    {
        let mut state = self.state.lock();
        if state.cancelled {
            trace!("Dropping visit result of cancelled walk");
            return Ok(());
        }
        let outcome = state.complete(task, discover);
        if outcome.is_err() {
            state.cancelled = true;
        }
        drop(state);
        self.changed.notify_all();
        outcome
    }

    /// Cancel the walk with `err`. The first fault is kept; later ones are
    /// logged and dropped.
    pub fn fail(&self, err: WalkError) {
        let mut state = self.state.lock();
        state.cancelled = true;
        if state.failure.is_none() {
            state.failure = Some(err);
        } else {
            debug!(error = %err, "Dropping fault raised after the walk was cancelled");
        }
        drop(state);
        self.changed.notify_all();
    }

    /// Block until the root finishes or the walk fails.
    ///
    /// `on_progress` is called every `interval` while waiting; the timed wake
    /// has no other effect. The result can be taken only once.
    pub fn await_result<F>(&self, interval: Duration, mut on_progress: F) -> Result<DirTree, WalkError>
    where
        F: FnMut(QueueSnapshot),
    {
        let mut next_report = Instant::now() + interval;
        let mut state = self.state.lock();
        loop {
            if let Some(err) = state.failure.take() {
                return Err(err);
            }
            if !state.cancelled {
                if let Some(tree) = state.result.take() {
                    return Ok(tree);
                }
            }
            let now = Instant::now();
            if now >= next_report {
                let snapshot = state.snapshot();
                MutexGuard::unlocked(&mut state, || on_progress(snapshot));
                next_report = (next_report + interval).max(now + interval / 2);
                continue;
            }
            self.changed.wait_until(&mut state, next_report);
        }
    }

    pub fn snapshot(&self) -> QueueSnapshot {
        self.state.lock().snapshot()
    }

    pub fn is_cancelled(&self) -> bool {
        self.state.lock().cancelled
    }
}

/// Path of a task, for diagnostics
impl Task {
    pub fn path(&self) -> &Path {
        &self.path
    }
}

//! Per-entry task state
//!
//! A directory node moves `Created -> ChildrenRegistered -> Visited -> Finished`;
//! a file node moves `Created -> Visited (= Finished)`. Nodes live in a
//! [`NodeArena`] owned by the queue and are only touched under its lock. A
//! child refers to its parent by [`NodeId`]; parents hold no references to
//! their children beyond the pending counter.

use crate::error::WalkError;
use crate::tree::entry::{DirTree, RegularFileEntry, TreeEntry};
use crate::tree::hasher::FileHash;
use std::path::{Path, PathBuf};

/// Handle to a live node in its arena. A handle outlives its node only as a
/// stale value: the slot generation makes it stop resolving once the node has
/// finished, even if the slot is reused.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct NodeId {
    index: usize,
    generation: u64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NodeKind {
    Directory,
    RegularFile,
}

#[derive(Debug)]
pub struct Node {
    name: String,
    path: PathBuf,
    kind: NodeKind,
    parent: Option<NodeId>,
    visited: bool,
    pending_children: usize,
    entries: Vec<TreeEntry>,
    hash: Option<FileHash>,
}

impl Node {
    pub fn new(name: String, path: PathBuf, kind: NodeKind, parent: Option<NodeId>) -> Self {
        Self {
            name,
            path,
            kind,
            parent,
            visited: false,
            pending_children: 0,
            entries: Vec::new(),
            hash: None,
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn kind(&self) -> NodeKind {
        self.kind
    }

    pub fn parent(&self) -> Option<NodeId> {
        self.parent
    }

    /// Visited with no outstanding children
    pub fn is_finished(&self) -> bool {
        self.visited && self.pending_children == 0
    }

    /// Count one more child that must finish before this directory can.
    /// Children are only registered before the visit completes.
    pub fn register_child(&mut self) -> Result<(), WalkError> {
        self.expect_directory("register a child")?;
        if self.visited {
            return Err(WalkError::invariant(
                &self.path,
                "child registered after the directory was visited",
            ));
        }
        self.pending_children += 1;
        Ok(())
    }

    /// Append an entry that needs no scheduling (a symlink)
    pub fn append_entry(&mut self, entry: TreeEntry) -> Result<(), WalkError> {
        self.expect_directory("append an entry")?;
        if self.visited {
            return Err(WalkError::invariant(
                &self.path,
                "entry appended after the directory was visited",
            ));
        }
        self.entries.push(entry);
        Ok(())
    }

    /// Record the content hash of a file node
    pub fn set_hash(&mut self, hash: FileHash) -> Result<(), WalkError> {
        if self.kind != NodeKind::RegularFile {
            return Err(WalkError::invariant(&self.path, "hash set on a directory"));
        }
        if self.hash.replace(hash).is_some() {
            return Err(WalkError::invariant(&self.path, "hash set twice"));
        }
        Ok(())
    }

    /// `visited: false -> true`, exactly once
    pub fn mark_visited(&mut self) -> Result<(), WalkError> {
        if self.visited {
            return Err(WalkError::invariant(&self.path, "node visited twice"));
        }
        self.visited = true;
        Ok(())
    }

    /// A registered child finished and produced `entry`
    pub fn child_finished(&mut self, entry: TreeEntry) -> Result<(), WalkError> {
        if self.pending_children == 0 {
            return Err(WalkError::invariant(
                &self.path,
                format!("child {:?} finished with no pending children", entry.name()),
            ));
        }
        self.pending_children -= 1;
        self.entries.push(entry);
        Ok(())
    }

    /// Convert a finished node into its immutable entry
    pub fn into_entry(self) -> Result<TreeEntry, WalkError> {
        if !self.is_finished() {
            return Err(WalkError::invariant(
                &self.path,
                format!(
                    "finished before completion (visited: {}, pending: {})",
                    self.visited, self.pending_children
                ),
            ));
        }
        match self.kind {
            NodeKind::Directory => Ok(TreeEntry::Directory(DirTree::new(self.name, self.entries))),
            NodeKind::RegularFile => {
                let hash = self
                    .hash
                    .ok_or_else(|| WalkError::invariant(&self.path, "file finished without a hash"))?;
                Ok(TreeEntry::RegularFile(RegularFileEntry {
                    name: self.name,
                    hash,
                }))
            }
        }
    }

    fn expect_directory(&self, action: &str) -> Result<(), WalkError> {
        if self.kind != NodeKind::Directory {
            return Err(WalkError::invariant(
                &self.path,
                format!("cannot {} on a file node", action),
            ));
        }
        Ok(())
    }
}

#[derive(Debug)]
struct Slot {
    generation: u64,
    node: Option<Node>,
}

/// Slot storage for live nodes. Slots of finished nodes are reused.
#[derive(Debug, Default)]
pub struct NodeArena {
    slots: Vec<Slot>,
    free: Vec<usize>,
    live: usize,
}

impl NodeArena {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, node: Node) -> NodeId {
        self.live += 1;
        match self.free.pop() {
            Some(index) => {
                let slot = &mut self.slots[index];
                slot.generation += 1;
                slot.node = Some(node);
                NodeId {
                    index,
                    generation: slot.generation,
                }
            }
            None => {
                self.slots.push(Slot {
                    generation: 0,
                    node: Some(node),
                });
                NodeId {
                    index: self.slots.len() - 1,
                    generation: 0,
                }
            }
        }
    }

    pub fn get(&self, id: NodeId) -> Result<&Node, WalkError> {
        self.slots
            .get(id.index)
            .filter(|slot| slot.generation == id.generation)
            .and_then(|slot| slot.node.as_ref())
            .ok_or_else(|| Self::missing(id))
    }

    pub fn get_mut(&mut self, id: NodeId) -> Result<&mut Node, WalkError> {
        self.slots
            .get_mut(id.index)
            .filter(|slot| slot.generation == id.generation)
            .and_then(|slot| slot.node.as_mut())
            .ok_or_else(|| Self::missing(id))
    }

    /// Take a node out of the arena. Removing a node that is no longer live is
    /// an invariant violation (a node finished twice).
    pub fn remove(&mut self, id: NodeId) -> Result<Node, WalkError> {
        let node = self
            .slots
            .get_mut(id.index)
            .filter(|slot| slot.generation == id.generation)
            .and_then(|slot| slot.node.take())
            .ok_or_else(|| Self::missing(id))?;
        self.free.push(id.index);
        self.live -= 1;
        Ok(node)
    }

    /// Number of nodes not yet finished
    pub fn live(&self) -> usize {
        self.live
    }

    /// The path is attributed by the queue, which knows the task being completed
    fn missing(id: NodeId) -> WalkError {
        WalkError::invariant(
            PathBuf::new(),
            format!("node #{} is not live (already finished)", id.index),
        )
    }
}

//! Immutable snapshot types produced by a walk

use crate::tree::hasher::FileHash;
use serde::Serialize;
use std::collections::BTreeMap;
use std::path::PathBuf;

/// One entry of a directory snapshot
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum TreeEntry {
    Directory(DirTree),
    RegularFile(RegularFileEntry),
    Symlink(SymlinkEntry),
}

impl TreeEntry {
    pub fn name(&self) -> &str {
        match self {
            TreeEntry::Directory(dir) => dir.name(),
            TreeEntry::RegularFile(file) => &file.name,
            TreeEntry::Symlink(link) => &link.name,
        }
    }

    /// Number of entries in this subtree, counting the entry itself
    pub fn count(&self) -> usize {
        match self {
            TreeEntry::Directory(dir) => dir.count(),
            TreeEntry::RegularFile(_) | TreeEntry::Symlink(_) => 1,
        }
    }

    pub fn as_directory(&self) -> Option<&DirTree> {
        match self {
            TreeEntry::Directory(dir) => Some(dir),
            _ => None,
        }
    }

    pub fn as_file(&self) -> Option<&RegularFileEntry> {
        match self {
            TreeEntry::RegularFile(file) => Some(file),
            _ => None,
        }
    }

    pub fn is_symlink(&self) -> bool {
        matches!(self, TreeEntry::Symlink(_))
    }

    fn sorted(&self) -> TreeEntry {
        match self {
            TreeEntry::Directory(dir) => TreeEntry::Directory(dir.sorted()),
            other => other.clone(),
        }
    }
}

/// A regular file and its content hash
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RegularFileEntry {
    pub name: String,
    pub hash: FileHash,
}

/// A symbolic link. The target is never resolved or hashed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SymlinkEntry {
    pub name: String,
}

/// Immutable snapshot of a directory.
///
/// Children appear in the order the walk finished them, which varies between
/// runs. Use [`DirTree::sorted`] before comparing two snapshots.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DirTree {
    name: String,
    entries: Vec<TreeEntry>,
}

/// Entry counts by kind, including the root directory
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct TreeStats {
    pub directories: usize,
    pub files: usize,
    pub symlinks: usize,
    pub total_bytes: u64,
}

impl DirTree {
    pub fn new(name: impl Into<String>, entries: Vec<TreeEntry>) -> Self {
        Self {
            name: name.into(),
            entries,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn entries(&self) -> &[TreeEntry] {
        &self.entries
    }

    /// `1 + Σ child.count()`
    pub fn count(&self) -> usize {
        1 + self.entries.iter().map(TreeEntry::count).sum::<usize>()
    }

    /// Direct child with the given name
    pub fn find(&self, name: &str) -> Option<&TreeEntry> {
        self.entries.iter().find(|entry| entry.name() == name)
    }

    /// Canonical copy with children ordered by name at every level
    pub fn sorted(&self) -> DirTree {
        let mut entries: Vec<TreeEntry> = self.entries.iter().map(TreeEntry::sorted).collect();
        entries.sort_by(|a, b| a.name().cmp(b.name()));
        DirTree::new(self.name.clone(), entries)
    }

    /// Every regular file below this directory, keyed by path relative to it
    pub fn file_hashes(&self) -> BTreeMap<PathBuf, FileHash> {
        let mut out = BTreeMap::new();
        self.collect_hashes(PathBuf::new(), &mut out);
        out
    }

    fn collect_hashes(&self, prefix: PathBuf, out: &mut BTreeMap<PathBuf, FileHash>) {
        for entry in &self.entries {
            match entry {
                TreeEntry::Directory(dir) => dir.collect_hashes(prefix.join(dir.name()), out),
                TreeEntry::RegularFile(file) => {
                    out.insert(prefix.join(&file.name), file.hash);
                }
                TreeEntry::Symlink(_) => {}
            }
        }
    }

    pub fn stats(&self) -> TreeStats {
        let mut stats = TreeStats {
            directories: 1,
            ..TreeStats::default()
        };
        for entry in &self.entries {
            match entry {
                TreeEntry::Directory(dir) => {
                    let child = dir.stats();
                    stats.directories += child.directories;
                    stats.files += child.files;
                    stats.symlinks += child.symlinks;
                    stats.total_bytes += child.total_bytes;
                }
                TreeEntry::RegularFile(file) => {
                    stats.files += 1;
                    stats.total_bytes += file.hash.size;
                }
                TreeEntry::Symlink(_) => stats.symlinks += 1,
            }
        }
        stats
    }
}

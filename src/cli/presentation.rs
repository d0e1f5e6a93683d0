//! CLI presentation: text, tree and json formatters for a sync result.

use crate::cache::CacheStats;
use crate::error::{ApiError, StorageError};
use crate::tree::entry::{DirTree, TreeEntry};
use serde::Serialize;
use std::path::PathBuf;

/// Everything a sync run reports
#[derive(Debug, Clone, Serialize)]
pub struct SyncReport {
    pub root: PathBuf,
    pub count: usize,
    pub cache: CacheStats,
    pub elapsed_ms: u64,
    pub tree: DirTree,
}

impl SyncReport {
    /// Report over `tree`, children sorted by name for stable output
    pub fn new(root: PathBuf, tree: &DirTree, cache: CacheStats, elapsed_ms: u64) -> Self {
        Self {
            root,
            count: tree.count(),
            cache,
            elapsed_ms,
            tree: tree.sorted(),
        }
    }
}

pub fn format_summary_text(report: &SyncReport) -> String {
    let stats = report.tree.stats();
    format!(
        "Synced {}\n  Entries: {}\n  Directories: {}\n  Files: {}\n  Symlinks: {}\n  Bytes: {}\n  Cache: {} hits, {} misses, {} stale\n  Elapsed: {} ms",
        report.root.display(),
        report.count,
        stats.directories,
        stats.files,
        stats.symlinks,
        stats.total_bytes,
        report.cache.hits,
        report.cache.misses,
        report.cache.stale,
        report.elapsed_ms
    )
}

/// Indented listing; directories end in `/`, symlinks in `@`
pub fn format_tree_text(report: &SyncReport) -> String {
    let mut lines = vec![format!("{}/", report.tree.name())];
    push_entries(&report.tree, 1, &mut lines);
    lines.push(format!("\n{} entries", report.count));
    lines.join("\n")
}

fn push_entries(dir: &DirTree, depth: usize, lines: &mut Vec<String>) {
    let indent = "  ".repeat(depth);
    for entry in dir.entries() {
        match entry {
            TreeEntry::Directory(child) => {
                lines.push(format!("{}{}/", indent, child.name()));
                push_entries(child, depth + 1, lines);
            }
            TreeEntry::RegularFile(file) => {
                lines.push(format!("{}{}  {}", indent, file.name, file.hash))
            }
            TreeEntry::Symlink(link) => lines.push(format!("{}{}@", indent, link.name)),
        }
    }
}

pub fn format_json_output(report: &SyncReport) -> Result<String, ApiError> {
    serde_json::to_string_pretty(report)
        .map_err(|e| ApiError::StorageError(StorageError::Codec(e.to_string())))
}

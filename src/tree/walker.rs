//! File system access used by the walk workers

use crate::tree::path::absolute_path;
use chrono::{DateTime, Utc};
use std::ffi::OsString;
use std::fs::File;
use std::io::{self, Read};
use std::path::{Path, PathBuf};
use walkdir::WalkDir;

/// Kind of a directory entry, as reported without following symlinks
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EntryKind {
    Directory,
    RegularFile,
    Symlink,
    /// Sockets, FIFOs, devices and anything else
    Other,
}

/// One child of a listed directory
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DirEntry {
    pub file_name: OsString,
    pub kind: EntryKind,
}

impl DirEntry {
    pub fn new(file_name: impl Into<OsString>, kind: EntryKind) -> Self {
        Self {
            file_name: file_name.into(),
            kind,
        }
    }

    /// Lossy UTF-8 name for the snapshot
    pub fn name(&self) -> String {
        self.file_name.to_string_lossy().into_owned()
    }
}

/// Metadata of a single path (symlinks are not followed)
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FileMetadata {
    pub kind: EntryKind,
    pub size: u64,
    pub modified: DateTime<Utc>,
}

/// File system collaborator.
///
/// Every method may block; the engine calls them only from worker threads and
/// never while holding its coordination lock.
pub trait FileSystem: Send + Sync {
    /// Absolute form of the walk root. Entries below it are reached by joining
    /// names and are never resolved.
    fn resolve_root(&self, path: &Path) -> io::Result<PathBuf>;

    /// List the immediate children of a directory
    fn list_dir(&self, path: &Path) -> io::Result<Vec<DirEntry>>;

    fn metadata(&self, path: &Path) -> io::Result<FileMetadata>;

    /// Open a regular file for streaming reads
    fn open(&self, path: &Path) -> io::Result<Box<dyn Read + Send>>;
}

/// The local disk
#[derive(Debug, Clone, Copy, Default)]
pub struct LocalFileSystem;

fn kind_of(file_type: std::fs::FileType) -> EntryKind {
    if file_type.is_symlink() {
        EntryKind::Symlink
    } else if file_type.is_dir() {
        EntryKind::Directory
    } else if file_type.is_file() {
        EntryKind::RegularFile
    } else {
        EntryKind::Other
    }
}

impl FileSystem for LocalFileSystem {
    fn resolve_root(&self, path: &Path) -> io::Result<PathBuf> {
        absolute_path(path)
    }

    fn list_dir(&self, path: &Path) -> io::Result<Vec<DirEntry>> {
        let walker = WalkDir::new(path)
            .min_depth(1)
            .max_depth(1)
            .follow_links(false);

        let mut entries = Vec::new();
        for entry in walker {
            let entry = entry.map_err(|e| {
                let message = e.to_string();
                e.into_io_error()
                    .unwrap_or_else(|| io::Error::new(io::ErrorKind::Other, message))
            })?;
            entries.push(DirEntry::new(
                entry.file_name().to_os_string(),
                kind_of(entry.file_type()),
            ));
        }
        Ok(entries)
    }

    fn metadata(&self, path: &Path) -> io::Result<FileMetadata> {
        let metadata = std::fs::symlink_metadata(path)?;
        Ok(FileMetadata {
            kind: kind_of(metadata.file_type()),
            size: metadata.len(),
            modified: DateTime::<Utc>::from(metadata.modified()?),
        })
    }

    fn open(&self, path: &Path) -> io::Result<Box<dyn Read + Send>> {
        Ok(Box::new(File::open(path)?))
    }
}

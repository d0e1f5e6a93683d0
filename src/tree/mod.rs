//! Directory snapshot model
//!
//! Immutable result types of a walk, the file content hash they carry, and the
//! file system access used to discover them.

pub mod entry;
pub mod hasher;
pub mod path;
pub mod walker;

pub use entry::{DirTree, RegularFileEntry, SymlinkEntry, TreeEntry, TreeStats};
pub use hasher::{Checksum, FileHash};
pub use walker::{DirEntry, EntryKind, FileMetadata, FileSystem, LocalFileSystem};

//! Path resolution and cache keys

use std::io;
use std::path::{Path, PathBuf};

/// Prefix of keys for paths that are not valid UTF-8. No OS path contains NUL.
const RAW_KEY_MARKER: char = '\0';

/// Resolve the walk root to an absolute path.
///
/// Resolves `..`, `.` and symlinks in the root itself. Entries below the root are
/// addressed by joining names onto this path and are never resolved.
pub fn absolute_path(path: &Path) -> io::Result<PathBuf> {
    dunce::canonicalize(path)
}

/// Cache key for an absolute path.
///
/// Distinct paths always get distinct keys: a UTF-8 path is used verbatim, with
/// no Unicode normalization, and any other path is keyed by the hex of its raw
/// bytes behind a NUL marker.
pub fn cache_key(path: &Path) -> String {
    match path.to_str() {
        Some(utf8) => utf8.to_string(),
        None => {
            let raw = path.as_os_str().as_encoded_bytes();
            format!("{}{}", RAW_KEY_MARKER, hex::encode(raw))
        }
    }
}

/// Display name of a directory: its final component, or the path itself for a
/// filesystem root
pub fn display_name(path: &Path) -> String {
    match path.file_name() {
        Some(name) => name.to_string_lossy().into_owned(),
        None => path.to_string_lossy().into_owned(),
    }
}

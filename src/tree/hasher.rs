//! Content hashing for regular files using SHA-256

use chrono::{DateTime, Utc};
use serde::de::{self, Deserializer, Visitor};
use serde::{Deserialize, Serialize, Serializer};
use sha2::{Digest, Sha256};
use std::fmt;
use std::io::Read;

/// Digest size in bytes
pub const CHECKSUM_SIZE: usize = 32;

/// Files are streamed through the digest in chunks of this many bytes
pub const CHUNK_SIZE: usize = 4096;

/// A 32-byte SHA-256 content digest.
///
/// Serializes as lowercase hex for human-readable formats (JSON) and as raw
/// bytes otherwise (the bincode records in the hash cache).
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Checksum([u8; CHECKSUM_SIZE]);

impl Checksum {
    pub fn from_bytes(bytes: [u8; CHECKSUM_SIZE]) -> Self {
        Checksum(bytes)
    }

    pub fn to_hex(&self) -> String {
        hex::encode(self.0)
    }

    /// Parse a 64 character hex string
    pub fn from_hex(hex_str: &str) -> Result<Self, String> {
        let bytes = hex::decode(hex_str).map_err(|e| format!("Invalid hex: {}", e))?;
        let bytes: [u8; CHECKSUM_SIZE] = bytes.try_into().map_err(|b: Vec<u8>| {
            format!("Expected {} bytes, got {}", CHECKSUM_SIZE, b.len())
        })?;
        Ok(Checksum(bytes))
    }

    /// Hash an in-memory buffer
    pub fn of_bytes(data: &[u8]) -> Self {
        Checksum(Sha256::digest(data).into())
    }

    /// Stream a reader through the digest in `CHUNK_SIZE` pieces
    pub fn of_reader<R: Read>(mut reader: R) -> std::io::Result<Self> {
        let mut hasher = Sha256::new();
        let mut buffer = [0u8; CHUNK_SIZE];
        loop {
            let read = match reader.read(&mut buffer) {
                Ok(0) => break,
                Ok(n) => n,
                Err(e) if e.kind() == std::io::ErrorKind::Interrupted => continue,
                Err(e) => return Err(e),
            };
            hasher.update(&buffer[..read]);
        }
        Ok(Checksum(hasher.finalize().into()))
    }
}

impl fmt::Display for Checksum {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_hex())
    }
}

impl fmt::Debug for Checksum {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Checksum({})", self.to_hex())
    }
}

impl Serialize for Checksum {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        if serializer.is_human_readable() {
            serializer.serialize_str(&self.to_hex())
        } else {
            serializer.serialize_bytes(&self.0)
        }
    }
}

struct ChecksumVisitor;

impl<'de> Visitor<'de> for ChecksumVisitor {
    type Value = Checksum;

    fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "a {}-byte checksum", CHECKSUM_SIZE)
    }

    fn visit_str<E: de::Error>(self, v: &str) -> Result<Checksum, E> {
        Checksum::from_hex(v).map_err(E::custom)
    }

    fn visit_bytes<E: de::Error>(self, v: &[u8]) -> Result<Checksum, E> {
        let bytes: [u8; CHECKSUM_SIZE] = v
            .try_into()
            .map_err(|_| E::invalid_length(v.len(), &self))?;
        Ok(Checksum(bytes))
    }
}

impl<'de> Deserialize<'de> for Checksum {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        if deserializer.is_human_readable() {
            deserializer.deserialize_str(ChecksumVisitor)
        } else {
            deserializer.deserialize_bytes(ChecksumVisitor)
        }
    }
}

/// Content digest plus the metadata it was computed against.
///
/// `size` and `last_modified` describe the file at hashing time and are what
/// the hash cache compares against the live file before trusting a hit.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct FileHash {
    pub size: u64,
    pub last_modified: DateTime<Utc>,
    pub checksum: Checksum,
}

impl FileHash {
    pub fn new(size: u64, last_modified: DateTime<Utc>, checksum: Checksum) -> Self {
        Self {
            size,
            last_modified,
            checksum,
        }
    }

    /// Hash the content of `reader`, recording the given metadata
    pub fn compute<R: Read>(
        reader: R,
        size: u64,
        last_modified: DateTime<Utc>,
    ) -> std::io::Result<Self> {
        let checksum = Checksum::of_reader(reader)?;
        Ok(Self::new(size, last_modified, checksum))
    }

    /// True when the recorded size and modification time match `size`/`modified`
    pub fn matches(&self, size: u64, modified: DateTime<Utc>) -> bool {
        self.size == size && self.last_modified == modified
    }
}

impl fmt::Display for FileHash {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(&self.checksum, f)
    }
}

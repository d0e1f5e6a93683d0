//! CLI parse: clap types for treesync. No behavior; definitions only.

use clap::{Parser, ValueEnum};
use std::path::PathBuf;

/// Treesync - snapshot a directory tree with cached content hashes
#[derive(Parser, Debug)]
#[command(name = "treesync", version)]
#[command(about = "Snapshot a directory tree, hashing files through a persistent cache")]
pub struct Cli {
    /// Directory to walk
    pub path: PathBuf,

    /// Number of worker threads
    #[arg(long, short = 'w')]
    pub workers: Option<usize>,

    /// Hash store directory (overrides storage.store_path)
    #[arg(long)]
    pub store: Option<PathBuf>,

    /// Hash every file; do not read or write the persistent store
    #[arg(long, conflicts_with = "store")]
    pub no_cache: bool,

    /// Reuse cached hashes without checking size and modification time
    #[arg(long)]
    pub trust_cache: bool,

    /// Output format
    #[arg(long, value_enum, default_value_t = OutputFormat::Text)]
    pub format: OutputFormat,

    /// Configuration file path (replaces the global config file)
    #[arg(long)]
    pub config: Option<PathBuf>,

    /// Enable debug logging
    #[arg(long, short = 'v', conflicts_with = "quiet")]
    pub verbose: bool,

    /// Only log errors
    #[arg(long, short = 'q')]
    pub quiet: bool,

    /// Log level (trace, debug, info, warn, error, off)
    #[arg(long)]
    pub log_level: Option<String>,

    /// Log format (json, text)
    #[arg(long)]
    pub log_format: Option<String>,

    /// Log output (stdout, stderr, file)
    #[arg(long)]
    pub log_output: Option<String>,

    /// Log file path (if output is "file")
    #[arg(long)]
    pub log_file: Option<PathBuf>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    /// Counts and cache statistics
    Text,
    /// The snapshot as JSON
    Json,
    /// Indented listing of the snapshot
    Tree,
}

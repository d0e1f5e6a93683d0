//! XDG and platform directory resolution

use directories::{BaseDirs, ProjectDirs};
use std::path::PathBuf;

pub const APP_NAME: &str = "treesync";

/// Directory holding user config: `$XDG_CONFIG_HOME`, else `~/.config`
pub fn config_home() -> Option<PathBuf> {
    match std::env::var_os("XDG_CONFIG_HOME") {
        Some(dir) if !dir.is_empty() => Some(PathBuf::from(dir)),
        _ => BaseDirs::new().map(|dirs| dirs.home_dir().join(".config")),
    }
}

/// `<config home>/treesync/config.toml`
pub fn global_config_path() -> Option<PathBuf> {
    config_home().map(|dir| dir.join(APP_NAME).join("config.toml"))
}

/// Default location of the hash store, under the platform data directory
/// (`~/.local/share/treesync/store` on Linux)
pub fn default_store_path() -> Option<PathBuf> {
    ProjectDirs::from("", "", APP_NAME).map(|dirs| dirs.data_dir().join("store"))
}

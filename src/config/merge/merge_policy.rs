//! Merge rules: defaults and override order.
//!
//! Lowest to highest: built-in defaults, the global (or explicit) config file,
//! `TREESYNC__SECTION__KEY` environment variables. CLI flags are applied by the
//! caller on the deserialized value.

use crate::walk::{DEFAULT_PROGRESS_INTERVAL, DEFAULT_WORKERS};
use config::builder::DefaultState;
use config::Config;
use config::ConfigBuilder;
use config::ConfigError;

/// Create a Config builder with merge policy defaults applied.
pub fn builder_with_defaults() -> Result<ConfigBuilder<DefaultState>, ConfigError> {
    Config::builder()
        .set_default("walker.workers", DEFAULT_WORKERS as i64)?
        .set_default(
            "walker.progress_interval_ms",
            DEFAULT_PROGRESS_INTERVAL.as_millis() as i64,
        )?
        .set_default("walker.cache_policy", "validated")
}

//! Environment source: `TREESYNC__WALKER__WORKERS=8` sets `walker.workers`.

use config::builder::DefaultState;
use config::ConfigBuilder;
use config::ConfigError;
use config::Environment;
use std::collections::HashMap;

pub const ENV_PREFIX: &str = "TREESYNC";
pub const ENV_SEPARATOR: &str = "__";

/// Add environment overrides. `vars` replaces the process environment when
/// given.
pub fn add_to_builder(
    builder: ConfigBuilder<DefaultState>,
    vars: Option<HashMap<String, String>>,
) -> Result<ConfigBuilder<DefaultState>, ConfigError> {
    let source = Environment::with_prefix(ENV_PREFIX)
        .prefix_separator(ENV_SEPARATOR)
        .separator(ENV_SEPARATOR)
        .try_parsing(true)
        .source(vars);
    Ok(builder.add_source(source))
}

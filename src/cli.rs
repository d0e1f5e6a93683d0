//! CLI domain: parse, route, output, and presentation only.

mod output;
mod parse;
mod presentation;
mod route;

pub use output::map_error;
pub use parse::{Cli, OutputFormat};
pub use presentation::{format_json_output, format_summary_text, format_tree_text, SyncReport};
pub use route::{load_config, RunContext};

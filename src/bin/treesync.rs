//! Treesync CLI Binary
//!
//! Walks a directory, hashing files through the persistent cache, and prints
//! the snapshot.

use clap::Parser;
use std::process;
use treesync::cli::{load_config, map_error, Cli, RunContext};
use treesync::logging::{init_logging, LoggingConfig};
use tracing::{error, info};

fn main() {
    let cli = Cli::parse();

    let config = match load_config(&cli) {
        Ok(config) => config,
        Err(e) => {
            // logging may itself be misconfigured; fall back to defaults
            let _ = init_logging(Some(&LoggingConfig::default()));
            error!("Configuration failed: {}", e);
            eprintln!("{}", map_error(&e));
            process::exit(1);
        }
    };

    if let Err(e) = init_logging(Some(&config.logging)) {
        eprintln!("Failed to initialize logging: {}", e);
        process::exit(1);
    }

    info!("Treesync starting");

    let context = match RunContext::new(&config, cli.no_cache) {
        Ok(ctx) => ctx,
        Err(e) => {
            error!("Error opening hash store: {}", e);
            eprintln!("{}", map_error(&e));
            process::exit(1);
        }
    };

    let result = context.execute(&cli.path, cli.format);
    let closed = context.close();
    match result.and_then(|output| closed.map(|()| output)) {
        Ok(output) => {
            info!("Sync finished");
            println!("{}", output);
        }
        Err(e) => {
            error!("Sync failed: {}", e);
            eprintln!("{}", map_error(&e));
            process::exit(1);
        }
    }
}

//! ## ntask-cli
//! **Operator tool for the native task runtime**
//!
//! Inspects and writes spill index files, lists the classes a registry
//! resolves, and exercises the memory arena with the configured sizing.

use clap::Parser;
use ntask_telemetry::{EventLogger, LogRouter};

mod commands;
mod error;

use commands::Cli;

fn main() -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
    let cli = Cli::parse();
    let config = commands::load_config(&cli)?;

    let router = LogRouter::new();
    EventLogger::init(router.clone(), &config.log.level);

    commands::run_command(cli, config, router)?;
    Ok(())
}

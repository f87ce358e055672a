//! # Resequencer CLI
//!
//! Command line entry point.
//!
//! Provides:
//! - scenario loading and validation
//! - scenario replay through the reordering buffers
//! - delivery statistics reporting

mod cli;
mod commands;
mod error;
mod replay;

use anyhow::Result;
use clap::Parser;
use tracing::info;

use cli::{Cli, Commands};
use commands::{run_replay_command, run_validate};

fn main() -> Result<()> {
    // Load .env file if present
    dotenvy::dotenv().ok();

    let cli = Cli::parse();

    // Initialize logging based on CLI options
    init_logging(&cli)?;

    info!(
        version = env!("CARGO_PKG_VERSION"),
        "Resequencer CLI starting"
    );

    // Execute command
    let result = match &cli.command {
        Commands::Run(args) => run_replay_command(args),
        Commands::Validate(args) => run_validate(args),
    };

    if let Err(ref e) = result {
        tracing::error!(error = %e, "Command failed");
    }

    Ok(result?)
}

/// Initialize logging based on CLI options.
///
/// The tracing bootstrap lives in the observability crate; only the level
/// and format selection happen here. The metrics exporter is started
/// separately by the `run` command when requested.
fn init_logging(cli: &Cli) -> Result<()> {
    let default_log_level = if cli.quiet {
        "warn"
    } else {
        match cli.verbose {
            0 => "info",
            1 => "debug",
            _ => "trace",
        }
    };

    observability::init_with_config(observability::ObservabilityConfig {
        log_format: cli.log_format.clone().into(),
        metrics_port: None,
        default_log_level: default_log_level.to_string(),
    })
}

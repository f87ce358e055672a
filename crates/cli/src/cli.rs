//! CLI argument definitions using clap.

use clap::{Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

/// Resequencer - time-ordered delivery for multi-source measurement streams
#[derive(Parser, Debug)]
#[command(
    name = "resequencer",
    author,
    version,
    about = "Reordering buffer scenario replay",
    long_about = "Replays synthetic multi-source measurement scenarios through the \n\
                  reordering buffers.\n\n\
                  Loads a scenario file, generates jittered periodic streams, drives \n\
                  them through a fixed-lag or minimal-latency buffer, and reports \n\
                  delivery statistics."
)]
pub struct Cli {
    /// Increase logging verbosity (-v for debug, -vv for trace)
    #[arg(short, long, action = clap::ArgAction::Count, global = true, env = "RESEQUENCER_VERBOSE")]
    pub verbose: u8,

    /// Suppress all output except errors
    #[arg(short, long, global = true, conflicts_with = "verbose")]
    pub quiet: bool,

    /// Log output format
    #[arg(
        long,
        value_enum,
        default_value = "pretty",
        global = true,
        env = "RESEQUENCER_LOG_FORMAT"
    )]
    pub log_format: LogFormat,

    #[command(subcommand)]
    pub command: Commands,
}

/// Available CLI commands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Replay a scenario through a reordering buffer
    Run(RunArgs),

    /// Validate a scenario file without running it
    Validate(ValidateArgs),
}

/// Arguments for the `run` command
#[derive(Parser, Debug, Clone)]
pub struct RunArgs {
    /// Path to the scenario file (TOML or JSON)
    #[arg(
        short,
        long,
        default_value = "scenario.toml",
        env = "RESEQUENCER_SCENARIO"
    )]
    pub scenario: PathBuf,

    /// Override the scenario seed
    #[arg(long, env = "RESEQUENCER_SEED")]
    pub seed: Option<u64>,

    /// Metrics server port (0 = disabled)
    #[arg(long, default_value = "0", env = "RESEQUENCER_METRICS_PORT")]
    pub metrics_port: u16,

    /// Validate the scenario and exit without replaying it
    #[arg(long)]
    pub dry_run: bool,
}

/// Arguments for the `validate` command
#[derive(Parser, Debug)]
pub struct ValidateArgs {
    /// Path to the scenario file to validate
    #[arg(short, long, default_value = "scenario.toml")]
    pub scenario: PathBuf,

    /// Output the validation result as JSON
    #[arg(long)]
    pub json: bool,
}

/// Log output format
#[derive(ValueEnum, Clone, Debug, Default)]
pub enum LogFormat {
    /// JSON structured logging
    Json,
    /// Human-readable pretty format
    #[default]
    Pretty,
    /// Compact single-line format
    Compact,
}

impl From<LogFormat> for observability::LogFormat {
    fn from(format: LogFormat) -> Self {
        match format {
            LogFormat::Json => observability::LogFormat::Json,
            LogFormat::Pretty => observability::LogFormat::Pretty,
            LogFormat::Compact => observability::LogFormat::Compact,
        }
    }
}

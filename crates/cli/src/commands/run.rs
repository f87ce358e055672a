//! `run` command implementation.

use tracing::info;

use config_loader::ScenarioLoader;
use contracts::BufferError;

use crate::cli::RunArgs;
use crate::error::{CliError, Result};
use crate::replay;

/// Execute the `run` command
pub fn run_replay_command(args: &RunArgs) -> Result<()> {
    if !args.scenario.exists() {
        return Err(CliError::scenario_not_found(
            args.scenario.display().to_string(),
        ));
    }

    let blueprint = ScenarioLoader::load_from_path(&args.scenario).map_err(|error| match error {
        BufferError::ConfigValidation { field, message } => {
            CliError::scenario_validation(format!("{field}: {message}"))
        }
        BufferError::Io(error) => CliError::Io(error),
        other => CliError::scenario_parse(other.to_string()),
    })?;

    info!(
        scenario = %blueprint.scenario.name,
        flavor = ?blueprint.buffer.flavor,
        mode = ?blueprint.buffer.mode,
        "scenario loaded"
    );

    if args.dry_run {
        println!("✓ Scenario is valid: {}", args.scenario.display());
        return Ok(());
    }

    if args.metrics_port > 0 {
        observability::init_metrics_only(args.metrics_port).map_err(|error| {
            CliError::replay_execution(format!("could not start metrics exporter: {error}"))
        })?;
    }

    let seed = args.seed.unwrap_or(blueprint.scenario.seed);
    let report = replay::run_replay(&blueprint, seed);

    println!("{}", report.aggregator.summary());
    println!("Generated samples: {}", report.generated_samples);
    println!("Buffer resets: {}", report.resets);
    if report.unaccounted() > 0 {
        println!("Still buffered at shutdown: {}", report.unaccounted());
    }

    Ok(())
}

//! `validate` command implementation.

use serde::Serialize;
use tracing::info;

use config_loader::{ScenarioBlueprint, ScenarioLoader};

use crate::cli::ValidateArgs;
use crate::error::{CliError, Result};

/// Validation result for JSON output
#[derive(Serialize)]
struct ValidationResult {
    valid: bool,
    scenario_path: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    error: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    warnings: Option<Vec<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    summary: Option<ScenarioSummary>,
}

#[derive(Serialize)]
struct ScenarioSummary {
    name: String,
    duration_ms: u64,
    source_count: usize,
    flavor: String,
    mode: String,
}

/// Execute the `validate` command
pub fn run_validate(args: &ValidateArgs) -> Result<()> {
    info!(scenario = %args.scenario.display(), "Validating scenario");

    let result = validate_scenario(args);

    if args.json {
        let json = serde_json::to_string_pretty(&result)
            .map_err(|error| anyhow::anyhow!("Failed to serialize validation result: {error}"))?;
        println!("{}", json);
    } else {
        print_validation_result(&result);
    }

    if result.valid {
        Ok(())
    } else {
        Err(CliError::scenario_validation(
            result
                .error
                .unwrap_or_else(|| format!("see report for {}", result.scenario_path)),
        ))
    }
}

fn validate_scenario(args: &ValidateArgs) -> ValidationResult {
    let scenario_path = args.scenario.display().to_string();

    // Check file exists
    if !args.scenario.exists() {
        return ValidationResult {
            valid: false,
            scenario_path,
            error: Some(format!("File not found: {}", args.scenario.display())),
            warnings: None,
            summary: None,
        };
    }

    // Try to load and validate
    match ScenarioLoader::load_from_path(&args.scenario) {
        Ok(blueprint) => {
            let warnings = collect_warnings(&blueprint);

            ValidationResult {
                valid: true,
                scenario_path,
                error: None,
                warnings: if warnings.is_empty() {
                    None
                } else {
                    Some(warnings)
                },
                summary: Some(ScenarioSummary {
                    name: blueprint.scenario.name.clone(),
                    duration_ms: blueprint.scenario.duration_ms,
                    source_count: blueprint.sources.len(),
                    flavor: format!("{:?}", blueprint.buffer.flavor),
                    mode: format!("{:?}", blueprint.buffer.mode),
                }),
            }
        }
        Err(e) => ValidationResult {
            valid: false,
            scenario_path,
            error: Some(e.to_string()),
            warnings: None,
            summary: None,
        },
    }
}

/// Collect scenario warnings (non-fatal issues)
fn collect_warnings(blueprint: &ScenarioBlueprint) -> Vec<String> {
    let mut warnings = Vec::new();

    for source in &blueprint.sources {
        // fewer than three samples never initialize the estimator
        let samples = blueprint.scenario.duration_ms as f64 / source.period_ms;
        if samples < 3.0 {
            warnings.push(format!(
                "Source '{}' produces fewer than 3 samples - its estimates never initialize",
                source.id
            ));
        }

        if source.latency_jitter_ms > source.period_ms / 2.0 {
            warnings.push(format!(
                "Source '{}' jitter exceeds half its period - expect frequent reordering",
                source.id
            ));
        }
    }

    warnings
}

fn print_validation_result(result: &ValidationResult) {
    if result.valid {
        println!("✓ Scenario is valid: {}", result.scenario_path);

        if let Some(ref summary) = result.summary {
            println!("\n  Name: {}", summary.name);
            println!("  Duration: {}ms", summary.duration_ms);
            println!("  Sources: {}", summary.source_count);
            println!("  Buffer: {} ({})", summary.flavor, summary.mode);
        }

        if let Some(ref warnings) = result.warnings {
            println!("\n⚠ Warnings:");
            for warning in warnings {
                println!("  - {}", warning);
            }
        }
    } else {
        println!("✗ Scenario is invalid: {}", result.scenario_path);
        if let Some(ref error) = result.error {
            println!("\n  Error: {}", error);
        }
    }
}

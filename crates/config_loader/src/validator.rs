//! Scenario validation.
//!
//! Rules:
//! - at least one source, source ids unique
//! - period > 0, latency >= 0, jitter >= 0
//! - duration > 0
//! - Match mode names a reference stream that exists among the sources
//! - fixed-lag delay spread/quantile are plausible

use std::collections::HashSet;

use contracts::{BufferError, BufferMode};

use crate::{BufferFlavor, ScenarioBlueprint};

/// Validate a scenario.
///
/// Returns the first error encountered, or Ok(()).
pub fn validate(blueprint: &ScenarioBlueprint) -> Result<(), BufferError> {
    validate_run(blueprint)?;
    validate_sources(blueprint)?;
    validate_buffer(blueprint)?;
    Ok(())
}

fn validate_run(blueprint: &ScenarioBlueprint) -> Result<(), BufferError> {
    if blueprint.scenario.duration_ms == 0 {
        return Err(BufferError::config_validation(
            "scenario.duration_ms",
            "duration must be > 0",
        ));
    }
    Ok(())
}

fn validate_sources(blueprint: &ScenarioBlueprint) -> Result<(), BufferError> {
    if blueprint.sources.is_empty() {
        return Err(BufferError::config_validation(
            "sources",
            "at least one source is required",
        ));
    }

    let mut seen = HashSet::new();
    for source in &blueprint.sources {
        if !seen.insert(&source.id) {
            return Err(BufferError::config_validation(
                format!("sources[id={}]", source.id),
                "duplicate source id",
            ));
        }
        if source.period_ms <= 0.0 {
            return Err(BufferError::config_validation(
                format!("sources[{}].period_ms", source.id),
                format!("period must be > 0, got {}", source.period_ms),
            ));
        }
        if source.latency_ms < 0.0 {
            return Err(BufferError::config_validation(
                format!("sources[{}].latency_ms", source.id),
                format!("latency must be >= 0, got {}", source.latency_ms),
            ));
        }
        if source.latency_jitter_ms < 0.0 {
            return Err(BufferError::config_validation(
                format!("sources[{}].latency_jitter_ms", source.id),
                format!("jitter must be >= 0, got {}", source.latency_jitter_ms),
            ));
        }
    }
    Ok(())
}

fn validate_buffer(blueprint: &ScenarioBlueprint) -> Result<(), BufferError> {
    let buffer = &blueprint.buffer;

    if buffer.mode == BufferMode::Match {
        let Some(reference) = &buffer.reference_stream else {
            return Err(BufferError::config_validation(
                "buffer.reference_stream",
                "match mode requires a reference stream",
            ));
        };
        if !blueprint.sources.iter().any(|s| s.id == *reference) {
            return Err(BufferError::config_validation(
                "buffer.reference_stream",
                format!("reference stream '{reference}' not found among sources"),
            ));
        }
    }

    if buffer.mode == BufferMode::Batch && buffer.batch_window_ms <= 0.0 {
        return Err(BufferError::config_validation(
            "buffer.batch_window_ms",
            format!("batch window must be > 0, got {}", buffer.batch_window_ms),
        ));
    }

    if buffer.flavor == BufferFlavor::FixedLag {
        if buffer.delay_mean_ms < 0.0 || buffer.delay_stddev_ms < 0.0 {
            return Err(BufferError::config_validation(
                "buffer.delay_mean_ms / buffer.delay_stddev_ms",
                "delay distribution must be non-negative",
            ));
        }
        if !(0.0..1.0).contains(&buffer.delay_quantile) {
            return Err(BufferError::config_validation(
                "buffer.delay_quantile",
                format!("quantile must be in [0, 1), got {}", buffer.delay_quantile),
            ));
        }
    }

    Ok(())
}

//! Scenario schema for the replay tool.
//!
//! A scenario describes a set of synthetic periodic sources and the buffer
//! they feed. Human-facing durations are in milliseconds; the conversion
//! helpers produce the nanosecond-based parameter records of the engine.

use serde::{Deserialize, Serialize};

use contracts::{
    BatchParams, BufferMode, FixedLagParams, MatchParams, MinimalLatencyParams, SourceId, TimeDelta,
};

/// Complete replay scenario.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScenarioBlueprint {
    pub scenario: ScenarioSection,

    #[serde(default)]
    pub buffer: BufferSection,

    pub sources: Vec<SourceSpec>,
}

/// Run-level settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScenarioSection {
    pub name: String,

    /// Simulated wall time to cover, in milliseconds.
    pub duration_ms: u64,

    /// Seed for the jitter generator; equal seeds replay identically.
    #[serde(default)]
    pub seed: u64,
}

/// Which buffer flavor the scenario drives.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BufferFlavor {
    #[default]
    MinimalLatency,
    FixedLag,
}

/// Buffer knobs exposed to scenario files.
///
/// Only the settings the replay varies are surfaced here; everything else
/// stays at the engine defaults.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BufferSection {
    #[serde(default)]
    pub flavor: BufferFlavor,

    #[serde(default)]
    pub mode: BufferMode,

    /// Batch window width in milliseconds.
    #[serde(default = "default_batch_window_ms")]
    pub batch_window_ms: f64,

    /// Reference stream for Match mode.
    #[serde(default)]
    pub reference_stream: Option<SourceId>,

    /// Assumed delay mean in milliseconds (fixed-lag only).
    #[serde(default)]
    pub delay_mean_ms: f64,

    /// Assumed delay standard deviation in milliseconds (fixed-lag only).
    #[serde(default)]
    pub delay_stddev_ms: f64,

    /// Delay quantile folded into the fixed lag.
    #[serde(default = "default_delay_quantile")]
    pub delay_quantile: f64,
}

impl Default for BufferSection {
    fn default() -> Self {
        Self {
            flavor: BufferFlavor::MinimalLatency,
            mode: BufferMode::Single,
            batch_window_ms: default_batch_window_ms(),
            reference_stream: None,
            delay_mean_ms: 0.0,
            delay_stddev_ms: 0.0,
            delay_quantile: default_delay_quantile(),
        }
    }
}

impl BufferSection {
    pub fn minimal_latency_params(&self) -> MinimalLatencyParams {
        MinimalLatencyParams {
            mode: self.mode,
            batch: self.batch_params(),
            match_: self.match_params(0),
            ..Default::default()
        }
    }

    pub fn fixed_lag_params(&self, num_streams: usize) -> FixedLagParams {
        FixedLagParams {
            mode: self.mode,
            delay_mean: millis(self.delay_mean_ms),
            delay_stddev: millis(self.delay_stddev_ms),
            delay_quantile: self.delay_quantile,
            batch: self.batch_params(),
            match_: self.match_params(num_streams),
            ..Default::default()
        }
    }

    fn batch_params(&self) -> BatchParams {
        BatchParams {
            max_delta: millis(self.batch_window_ms),
        }
    }

    fn match_params(&self, num_streams: usize) -> MatchParams {
        MatchParams {
            reference_stream: self.reference_stream.clone().unwrap_or_default(),
            num_streams,
        }
    }
}

/// One synthetic periodic source.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SourceSpec {
    pub id: SourceId,

    /// Measurement period in milliseconds.
    pub period_ms: f64,

    /// Mean end-to-end latency in milliseconds.
    pub latency_ms: f64,

    /// Uniform latency jitter half-width in milliseconds.
    #[serde(default)]
    pub latency_jitter_ms: f64,

    /// Measurement time of the first sample, in milliseconds.
    #[serde(default)]
    pub start_offset_ms: f64,

    /// Payload size carried by each generated sample.
    #[serde(default = "default_payload_bytes")]
    pub payload_bytes: usize,
}

fn millis(ms: f64) -> TimeDelta {
    TimeDelta::from_nanos_f64(ms * 1e6)
}

fn default_batch_window_ms() -> f64 {
    10.0
}

fn default_delay_quantile() -> f64 {
    0.99
}

fn default_payload_bytes() -> usize {
    64
}

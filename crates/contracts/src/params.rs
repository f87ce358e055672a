//! Buffer parameter records shared across crates.

use serde::{Deserialize, Serialize};

use crate::{SourceId, TimeDelta};

/// Release policy applied by both buffer flavors.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BufferMode {
    /// Deliver samples with increasing time stamps as soon as possible.
    #[default]
    Single,
    /// Group samples whose measurement times lie close together; may
    /// introduce an additional delay.
    Batch,
    /// Emit one tuple per reference sample with the nearest neighbor from
    /// each other source; may introduce an additional delay.
    Match,
}

/// Batch release parameters.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct BatchParams {
    /// Maximum measurement-time spread of a batch.
    pub max_delta: TimeDelta,
}

impl Default for BatchParams {
    fn default() -> Self {
        Self {
            max_delta: TimeDelta::from_millis(10),
        }
    }
}

/// Match release parameters.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct MatchParams {
    /// Source whose samples anchor each tuple.
    pub reference_stream: SourceId,
    /// Expected number of distinct sources. Only consulted by the
    /// fixed-lag buffer; the minimal-latency buffer derives the source set
    /// from its estimators.
    #[serde(default)]
    pub num_streams: usize,
}

/// Minimal-latency buffer configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MinimalLatencyParams {
    #[serde(default)]
    pub mode: BufferMode,

    /// If the receipt time jumps further into the past than this threshold,
    /// the whole buffer is reset.
    #[serde(default = "default_reset_threshold")]
    pub reset_threshold: TimeDelta,

    /// Two-sided confidence used to bound a placeholder's earliest
    /// measurement time from the period distribution.
    #[serde(default = "default_confidence")]
    pub measurement_confidence_quantile: f64,

    /// Clamp on the measurement jitter term.
    #[serde(default = "default_abs_jitter")]
    pub max_abs_measurement_jitter: TimeDelta,

    /// One-sided confidence used to bound a placeholder's latest receipt
    /// time (variance is the sum of period and latency variance).
    #[serde(default = "default_confidence")]
    pub wait_confidence_quantile: f64,

    /// Clamp on the wait jitter term.
    #[serde(default = "default_abs_jitter")]
    pub max_abs_wait_jitter: TimeDelta,

    /// Absolute ceiling on how long the buffer waits for a sample
    /// (latency plus wait jitter).
    #[serde(default = "default_max_total_wait")]
    pub max_total_wait_time: TimeDelta,

    #[serde(default)]
    pub batch: BatchParams,

    #[serde(default, rename = "match")]
    pub match_: MatchParams,
}

impl Default for MinimalLatencyParams {
    fn default() -> Self {
        Self {
            mode: BufferMode::Single,
            reset_threshold: default_reset_threshold(),
            measurement_confidence_quantile: default_confidence(),
            max_abs_measurement_jitter: default_abs_jitter(),
            wait_confidence_quantile: default_confidence(),
            max_abs_wait_jitter: default_abs_jitter(),
            max_total_wait_time: default_max_total_wait(),
            batch: BatchParams::default(),
            match_: MatchParams::default(),
        }
    }
}

/// Fixed-lag buffer configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FixedLagParams {
    #[serde(default)]
    pub mode: BufferMode,

    /// If the receipt time jumps further into the past than this threshold,
    /// the whole buffer is reset.
    #[serde(default)]
    pub reset_threshold: TimeDelta,

    /// Mean of the assumed end-to-end delay distribution.
    #[serde(default)]
    pub delay_mean: TimeDelta,

    /// Standard deviation of the assumed delay distribution.
    #[serde(default)]
    pub delay_stddev: TimeDelta,

    /// Two-sided quantile of the delay distribution folded into the lag.
    #[serde(default = "default_delay_quantile")]
    pub delay_quantile: f64,

    #[serde(default)]
    pub batch: BatchParams,

    #[serde(default, rename = "match")]
    pub match_: MatchParams,
}

impl Default for FixedLagParams {
    fn default() -> Self {
        Self {
            mode: BufferMode::Single,
            reset_threshold: TimeDelta::ZERO,
            delay_mean: TimeDelta::ZERO,
            delay_stddev: TimeDelta::ZERO,
            delay_quantile: default_delay_quantile(),
            batch: BatchParams::default(),
            match_: MatchParams::default(),
        }
    }
}

fn default_reset_threshold() -> TimeDelta {
    TimeDelta::from_secs(1)
}

fn default_confidence() -> f64 {
    0.99
}

fn default_abs_jitter() -> TimeDelta {
    TimeDelta::from_secs(100)
}

fn default_max_total_wait() -> TimeDelta {
    TimeDelta::from_secs(1000)
}

fn default_delay_quantile() -> f64 {
    0.5
}

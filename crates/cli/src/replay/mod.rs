//! Scenario replay driver.
//!
//! Drives a generated timeline through the configured buffer with a
//! millisecond tick loop: each tick pushes every sample whose receipt time
//! has passed, then polls once. After the scenario duration a flush phase
//! keeps polling so lagged samples still drain.

mod generator;

pub use generator::{generate_timeline, ScheduledSample};

use bytes::Bytes;
use tracing::{debug, info};

use config_loader::{BufferFlavor, ScenarioBlueprint};
use contracts::{PopReturn, PushReturn, TimeDelta, TimePoint};
use observability::ReplayMetricsAggregator;
use reorder_engine::{FixedLagBuffer, MinimalLatencyBuffer};

/// Extra replay time after the scenario duration so the buffers drain.
const FLUSH_WINDOW: TimeDelta = TimeDelta::from_millis(2000);

/// Either buffer flavor behind one push/pop surface.
enum ReplayBuffer {
    MinimalLatency(MinimalLatencyBuffer<Bytes>),
    FixedLag(FixedLagBuffer<Bytes>),
}

impl ReplayBuffer {
    fn from_blueprint(blueprint: &ScenarioBlueprint) -> Self {
        match blueprint.buffer.flavor {
            BufferFlavor::MinimalLatency => Self::MinimalLatency(MinimalLatencyBuffer::new(
                blueprint.buffer.minimal_latency_params(),
            )),
            BufferFlavor::FixedLag => Self::FixedLag(FixedLagBuffer::new(
                blueprint.buffer.fixed_lag_params(blueprint.sources.len()),
            )),
        }
    }

    fn push(&mut self, sample: ScheduledSample) -> PushReturn {
        match self {
            Self::MinimalLatency(buffer) => buffer.push(
                sample.id,
                sample.receipt_time,
                sample.meas_time,
                sample.payload,
            ),
            Self::FixedLag(buffer) => buffer.push(
                sample.id,
                sample.receipt_time,
                sample.meas_time,
                sample.payload,
            ),
        }
    }

    fn pop(&mut self, now: TimePoint) -> PopReturn<Bytes> {
        match self {
            Self::MinimalLatency(buffer) => buffer.pop(now),
            Self::FixedLag(buffer) => buffer.pop(now),
        }
    }
}

/// Outcome of one replay run.
#[derive(Debug)]
pub struct ReplayReport {
    pub generated_samples: usize,
    pub resets: usize,
    pub aggregator: ReplayMetricsAggregator,
}

impl ReplayReport {
    /// Samples the buffer neither released nor discarded (still queued or
    /// dropped by a reset).
    pub fn unaccounted(&self) -> u64 {
        self.generated_samples as u64
            - self.aggregator.total_released
            - self.aggregator.total_discarded
    }
}

/// Replay the scenario and collect delivery statistics.
pub fn run_replay(blueprint: &ScenarioBlueprint, seed: u64) -> ReplayReport {
    let timeline = generate_timeline(blueprint, seed);
    let generated_samples = timeline.len();
    info!(
        scenario = %blueprint.scenario.name,
        samples = generated_samples,
        sources = blueprint.sources.len(),
        seed,
        "starting replay"
    );

    let mut buffer = ReplayBuffer::from_blueprint(blueprint);
    let mut aggregator = ReplayMetricsAggregator::new();
    let mut resets = 0usize;

    let end = TimePoint::from_millis(blueprint.scenario.duration_ms as i64) + FLUSH_WINDOW;
    let mut pending = timeline.into_iter().peekable();

    let mut now = TimePoint::EPOCH;
    while now <= end {
        while let Some(sample) = pending.next_if(|sample| sample.receipt_time <= now) {
            debug!(source_id = %sample.id, meas_time = %sample.meas_time, "pushing sample");
            if buffer.push(sample) == PushReturn::Reset {
                resets += 1;
            }
        }

        let released = buffer.pop(now);
        observability::metrics::record_pop_metrics(now, &released);
        aggregator.update(now, &released);

        now += TimeDelta::from_millis(1);
    }

    info!(
        released = aggregator.total_released,
        discarded = aggregator.total_discarded,
        resets,
        "replay finished"
    );

    ReplayReport {
        generated_samples,
        resets,
        aggregator,
    }
}

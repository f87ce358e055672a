//! Synthetic stream generation.
//!
//! Expands the scenario's source specs into a receipt-time-ordered timeline
//! of samples. All randomness comes from a seeded generator, so a scenario
//! replays identically for the same seed.

use bytes::Bytes;
use rand::{rngs::StdRng, Rng, SeedableRng};

use config_loader::ScenarioBlueprint;
use contracts::{SourceId, TimePoint};

/// One sample waiting to be pushed at its receipt time.
#[derive(Debug, Clone)]
pub struct ScheduledSample {
    pub id: SourceId,
    pub meas_time: TimePoint,
    pub receipt_time: TimePoint,
    pub payload: Bytes,
}

/// Expand the scenario into a timeline sorted by receipt time.
pub fn generate_timeline(blueprint: &ScenarioBlueprint, seed: u64) -> Vec<ScheduledSample> {
    let mut rng = StdRng::seed_from_u64(seed);
    let duration_ns = blueprint.scenario.duration_ms as i64 * 1_000_000;

    let mut timeline = Vec::new();
    for source in &blueprint.sources {
        let payload = Bytes::from(vec![0u8; source.payload_bytes]);
        let period_ns = source.period_ms * 1e6;
        let latency_ns = source.latency_ms * 1e6;
        let jitter_ns = source.latency_jitter_ms * 1e6;

        let mut meas_ns = source.start_offset_ms * 1e6 + period_ns;
        while (meas_ns as i64) <= duration_ns {
            let jitter = if jitter_ns > 0.0 {
                rng.gen_range(-jitter_ns..=jitter_ns)
            } else {
                0.0
            };
            // latency never becomes negative, receipt follows measurement
            let receipt_ns = meas_ns + (latency_ns + jitter).max(0.0);

            timeline.push(ScheduledSample {
                id: source.id.clone(),
                meas_time: TimePoint::from_nanos(meas_ns as i64),
                receipt_time: TimePoint::from_nanos(receipt_ns as i64),
                payload: payload.clone(),
            });

            meas_ns += period_ns;
        }
    }

    timeline.sort_by_key(|sample| sample.receipt_time);
    timeline
}

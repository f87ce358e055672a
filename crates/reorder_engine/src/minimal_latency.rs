//! Minimal-latency reordering buffer.
//!
//! Releases samples as early as the per-source estimates allow instead of
//! paying a fixed lag. For every known source the buffer keeps virtual
//! placeholders predicting the next arrivals; a sample is held back only
//! while an earlier placeholder can still be filled.
//!
//! Assumptions:
//!  - update period and latency change slowly relative to the measurement
//!    frequency
//!  - a source delivers data with increasing time stamps
//!
//! Jumps within update period and/or latency are possible, but may lead to
//! suboptimal release timing until the parameter estimation has converged
//! again.

use std::collections::HashMap;

use contracts::{
    BufferMode, MinimalLatencyParams, PopReturn, PushReturn, SampleSlot, SourceId, StampedSample,
    TimeDelta, TimePoint,
};
use tracing::instrument;

use crate::estimator::StreamEstimator;
use crate::policy;
use crate::quantile::normal_quantile;
use crate::queue;

/// Maximum number of newly inserted placeholders for a single expansion.
/// Should only be reached while the estimates are still poor, e.g. right
/// after initialization.
const MAX_INSERTED_PLACEHOLDERS: usize = 10;

/// Reordering buffer that waits no longer than the per-source confidence
/// bounds require.
#[derive(Debug)]
pub struct MinimalLatencyBuffer<T> {
    params: MinimalLatencyParams,
    data: Vec<StampedSample<T>>,
    estimators: HashMap<SourceId, StreamEstimator>,
    /// Measurement time of the last released sample; lower bound for all
    /// future releases.
    buffer_time: TimePoint,
    /// Maximum receipt time observed so far (external time).
    current_time: TimePoint,
}

impl<T> MinimalLatencyBuffer<T> {
    pub fn new(params: MinimalLatencyParams) -> Self {
        Self {
            params,
            data: Vec::new(),
            estimators: HashMap::new(),
            buffer_time: TimePoint::EPOCH,
            current_time: TimePoint::EPOCH,
        }
    }

    #[instrument(
        level = "trace",
        name = "minimal_latency_push",
        skip(self, payload),
        fields(source_id = %id, meas_time = %meas_time, receipt_time = %receipt_time)
    )]
    pub fn push(
        &mut self,
        id: SourceId,
        receipt_time: TimePoint,
        meas_time: TimePoint,
        payload: T,
    ) -> PushReturn {
        debug_assert!(
            self.data.is_sorted_by(|a, b| a.meas_time <= b.meas_time),
            "sample queue is not sorted by measurement time"
        );

        // Data should arrive in consecutive order with respect to the
        // receipt time. A jump backwards beyond the threshold means the
        // caller restarted its timeline (e.g. a looped recording), so the
        // whole buffer starts over.
        if self.current_time - receipt_time > self.params.reset_threshold {
            tracing::warn!(receipt_time = %receipt_time, current_time = %self.current_time,
                "receipt time jumped backwards, resetting buffer");
            metrics::counter!("reorder_buffer_resets_total", "buffer" => "minimal_latency")
                .increment(1);
            self.reset();
            return PushReturn::Reset;
        }
        self.current_time = self.current_time.max(receipt_time);

        let Some(estimated_period) = self.estimators.get(&id).map(StreamEstimator::period) else {
            // First contact with this source: remember it and queue the
            // sample. No placeholders yet, the estimator is uninitialized.
            self.estimators
                .insert(id.clone(), StreamEstimator::new(receipt_time, meas_time));
            self.data
                .push(StampedSample::measured(id, meas_time, receipt_time, payload));
            queue::sort_by_meas_time(&mut self.data);
            return PushReturn::Ok;
        };

        // Look for the placeholder this sample was predicted by. A match
        // requires a distance below half a period; every older placeholder
        // of the source counts as a missed measurement (the best fit is
        // corrected afterwards).
        let mut min_distance = estimated_period / 2;
        let mut best_idx: Option<usize> = None;
        let mut num_missed: usize = 0;
        for (idx, sample) in self.data.iter().enumerate() {
            if sample.id != id || !sample.is_placeholder() {
                continue;
            }
            if sample.meas_time < meas_time {
                num_missed += 1;
            }
            let distance = (sample.meas_time - meas_time).abs();
            if distance < min_distance {
                min_distance = distance;
                best_idx = Some(idx);
            }
        }

        let matched = best_idx.is_some();
        if let Some(best) = best_idx {
            if num_missed > 0 && meas_time > self.data[best].meas_time {
                // the best fit was pre-counted as missed though it is
                // actually the match
                num_missed -= 1;
            }

            // Replace the placeholder identity with the real sample. The
            // estimated bounds stay untouched for later inspection.
            let element = &mut self.data[best];
            element.slot = SampleSlot::Measured(payload);
            element.meas_time = meas_time;
            element.receipt_time = receipt_time;

            let spawned = Self::expand_placeholders(
                &self.estimators,
                &self.params,
                self.buffer_time,
                &mut self.data[best],
            );
            self.data.extend(spawned);
        } else {
            let mut element = StampedSample::measured(id.clone(), meas_time, receipt_time, payload);
            let spawned = Self::expand_placeholders(
                &self.estimators,
                &self.params,
                self.buffer_time,
                &mut element,
            );
            self.data.extend(spawned);
            self.data.push(element);
        }

        if let Some(estimator) = self.estimators.get_mut(&id) {
            let update = if !estimator.is_initialized() {
                // the missed count is meaningless before initialization
                estimator.update(receipt_time, meas_time, 0)
            } else if matched {
                estimator.update(receipt_time, meas_time, num_missed)
            } else {
                // without a matched placeholder the missed count may be
                // wrong, only the latency is safe to update
                estimator.update_latency_only(receipt_time, meas_time);
                Ok(())
            };
            if let Err(error) = update {
                tracing::warn!(source_id = %id, %error, "skipping estimator update");
                metrics::counter!("reorder_estimator_desync_total").increment(1);
            }
        }

        // The new sample supersedes every older placeholder of its source.
        let mut stale: Vec<usize> = self
            .data
            .iter()
            .enumerate()
            .filter(|(_, sample)| {
                sample.id == id && sample.is_placeholder() && sample.meas_time < meas_time
            })
            .map(|(idx, _)| idx)
            .collect();
        queue::remove_indices(&mut self.data, &mut stale);

        queue::sort_by_meas_time(&mut self.data);

        PushReturn::Ok
    }

    #[instrument(level = "trace", name = "minimal_latency_pop", skip(self), fields(now = %now))]
    pub fn pop(&mut self, mut now: TimePoint) -> PopReturn<T> {
        debug_assert!(
            self.data.is_sorted_by(|a, b| a.meas_time <= b.meas_time),
            "sample queue is not sorted by measurement time"
        );

        // push and pop must follow a shared clock; a backwards poll is
        // answered without touching any state
        if now < self.current_time {
            return PopReturn::empty(self.buffer_time);
        }

        let mut output_inds: Vec<usize> = Vec::new();
        let mut discard_inds: Vec<usize> = Vec::new();
        // placeholders minted while walking, appended after the removal
        let mut carry: Vec<StampedSample<T>> = Vec::new();

        let mut idx = 0;
        while idx < self.data.len() {
            let element = &self.data[idx];
            // The queue may start with samples older than our last output,
            // e.g. when we stopped waiting for a sample that then arrived a
            // little later. Placeholders in that range are reclaimed during
            // push of their source.
            if element.meas_time < self.buffer_time {
                if !element.is_placeholder() {
                    discard_inds.push(idx);
                }
            } else if !element.is_placeholder() {
                if element.meas_time > now {
                    break;
                }
                output_inds.push(idx);
            } else {
                if element.receipt_time >= now {
                    break;
                }
                // Expired placeholder: the real sample did not arrive in
                // time. It is not emitted and will be swept on the next
                // push of its source, but its expansion below may still
                // hold back later elements.
            }

            let spawned = Self::expand_placeholders(
                &self.estimators,
                &self.params,
                self.buffer_time,
                &mut self.data[idx],
            );
            if let Some(last) = spawned.last() {
                // do not run past freshly minted expectations
                now = now.min(last.meas_time);
            }
            carry.extend(spawned);

            idx += 1;
        }

        if self.params.mode == BufferMode::Batch && !output_inds.is_empty() {
            output_inds =
                policy::batch_or_wait(&self.data, output_inds, self.params.batch.max_delta, now);
        } else if self.params.mode == BufferMode::Match && !output_inds.is_empty() {
            let reference_period = self
                .estimators
                .get(&self.params.match_.reference_stream)
                .map(StreamEstimator::period);
            let outcome = policy::match_minimal_latency(
                &self.data,
                &output_inds,
                &self.params.match_.reference_stream,
                reference_period,
                self.estimators.len(),
            );
            output_inds = outcome.output;
            discard_inds.extend(outcome.discard);
        }

        let (data, discarded_data) = queue::split_released(&mut self.data, output_inds, discard_inds);

        self.data.append(&mut carry);
        queue::sort_by_meas_time(&mut self.data);

        // Advance the buffer time to the last released element: anything
        // arriving with an older measurement time afterwards would be an
        // out-of-sequence delivery and must be discarded instead.
        if let Some(last) = data.last() {
            self.buffer_time = last.meas_time;
        }
        if !data.is_empty() {
            metrics::histogram!("reorder_buffer_release_size", "buffer" => "minimal_latency")
                .record(data.len() as f64);
        }
        if !discarded_data.is_empty() {
            metrics::counter!("reorder_buffer_discarded_total", "buffer" => "minimal_latency")
                .increment(discarded_data.len() as u64);
        }

        PopReturn {
            buffer_time: self.buffer_time,
            data,
            discarded_data,
        }
    }

    pub fn reset(&mut self) {
        self.data.clear();
        self.buffer_time = TimePoint::EPOCH;
        self.current_time = TimePoint::EPOCH;
        self.estimators.clear();
    }

    /// Number of queued real samples (placeholders excluded).
    pub fn num_queued_elements(&self) -> usize {
        self.data
            .iter()
            .filter(|sample| !sample.is_placeholder())
            .count()
    }

    /// Queue length including placeholders, for diagnosing the expansion.
    pub fn total_size(&self) -> usize {
        self.data.len()
    }

    /// Measurement time of the last released sample.
    pub fn buffer_time(&self) -> TimePoint {
        self.buffer_time
    }

    /// Maximum receipt time observed so far.
    pub fn current_time(&self) -> TimePoint {
        self.current_time
    }

    /// Earliest measurement time that may still be delivered.
    ///
    /// With the configured confidence, no measurement older than the
    /// returned time will be received in the future (excluding new
    /// sources).
    pub fn estimated_buffer_time(&self) -> TimePoint {
        self.data
            .first()
            .map(|sample| sample.meas_time)
            .unwrap_or(self.buffer_time)
    }

    /// Oldest receipt time across all real samples currently held back.
    pub fn earliest_held_back_receipt_time(&self) -> Option<TimePoint> {
        self.data
            .iter()
            .filter(|sample| !sample.is_placeholder())
            .map(|sample| sample.receipt_time)
            .min()
    }

    pub fn estimated_latency(&self, id: &str) -> TimeDelta {
        self.estimator_query(id, StreamEstimator::latency)
    }

    pub fn estimated_latency_stddev(&self, id: &str) -> TimeDelta {
        self.estimator_query(id, StreamEstimator::latency_stddev)
    }

    pub fn estimated_latency_quantile(&self, id: &str, quantile: f64) -> TimeDelta {
        self.estimator_query(id, |estimator| estimator.latency_quantile(quantile))
    }

    pub fn estimated_period(&self, id: &str) -> TimeDelta {
        self.estimator_query(id, StreamEstimator::period)
    }

    pub fn estimated_period_stddev(&self, id: &str) -> TimeDelta {
        self.estimator_query(id, StreamEstimator::period_stddev)
    }

    pub fn estimated_period_quantile(&self, id: &str, quantile: f64) -> TimeDelta {
        self.estimator_query(id, |estimator| estimator.period_quantile(quantile))
    }

    fn estimator_query(&self, id: &str, query: impl Fn(&StreamEstimator) -> TimeDelta) -> TimeDelta {
        self.estimators.get(id).map(query).unwrap_or_default()
    }

    /// Spawn the follow-up placeholders for `element`, if it has not done
    /// so already and its source estimator is initialized. The first few
    /// measurements of a new source spawn nothing and might be discarded.
    ///
    /// Placeholders are produced until one reaches past the buffer time;
    /// that last one keeps its expansion flag clear so it can seed further
    /// placeholders later.
    fn expand_placeholders(
        estimators: &HashMap<SourceId, StreamEstimator>,
        params: &MinimalLatencyParams,
        buffer_time: TimePoint,
        element: &mut StampedSample<T>,
    ) -> Vec<StampedSample<T>> {
        let mut spawned = Vec::new();
        let Some(estimator) = estimators.get(&element.id).filter(|e| e.is_initialized()) else {
            return spawned;
        };
        if element.created_placeholder {
            return spawned;
        }
        element.created_placeholder = true;

        for index in 1..=MAX_INSERTED_PLACEHOLDERS {
            let mut placeholder =
                Self::build_placeholder(estimator, params, &element.id, element.meas_time, index);
            placeholder.created_placeholder = true;
            let earliest = placeholder.earliest_estimated_meas_time;
            spawned.push(placeholder);

            if earliest > buffer_time {
                if let Some(last) = spawned.last_mut() {
                    // seed for the next expansion round
                    last.created_placeholder = false;
                }
                break;
            }
        }
        spawned
    }

    /// Build the `index`-th placeholder following `meas_time`.
    ///
    /// The placeholder is inserted at its worst-case expected measurement
    /// time (the left jitter boundary): the quantile is evaluated without a
    /// mean, so the result can be used in both directions.
    fn build_placeholder(
        estimator: &StreamEstimator,
        params: &MinimalLatencyParams,
        id: &SourceId,
        meas_time: TimePoint,
        index: usize,
    ) -> StampedSample<T> {
        let period_offset = estimator.period() * index as i64;
        let period_variance = estimator.period_stddev().as_nanos_f64().powi(2);
        let period_stddev_sum = (index as f64 * period_variance).sqrt();

        // perfect input timing yields zero deviations, skip the quantiles
        let mut meas_jitter = TimeDelta::ZERO;
        if period_stddev_sum > 0.0 {
            let left_tail = (1.0 - params.measurement_confidence_quantile) / 2.0;
            meas_jitter = TimeDelta::from_nanos_f64(normal_quantile(0.0, period_stddev_sum, left_tail))
                .clamp_abs(params.max_abs_measurement_jitter);
        }

        let mut wait_jitter = TimeDelta::ZERO;
        if estimator.latency_stddev() > TimeDelta::ZERO {
            let wait_stddev = period_stddev_sum.hypot(estimator.latency_stddev().as_nanos_f64());
            let right_tail = 1.0 - (1.0 - params.wait_confidence_quantile) / 2.0;
            wait_jitter = TimeDelta::from_nanos_f64(normal_quantile(0.0, wait_stddev, right_tail))
                .clamp_abs(params.max_abs_wait_jitter);
        }

        let earliest = meas_time + period_offset + meas_jitter;
        let wait = (estimator.latency() + wait_jitter).min(params.max_total_wait_time);
        let latest_receipt = meas_time + period_offset + wait;

        StampedSample::placeholder(id.clone(), earliest, latest_receipt)
    }
}

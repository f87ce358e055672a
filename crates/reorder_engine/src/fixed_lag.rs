//! Fixed-lag reordering buffer.
//!
//! Releases every sample once it is older than `now - fixed_lag`, where
//! the lag is computed once at construction from the configured delay
//! distribution. Simple and predictable, at the price of always paying the
//! full lag even when all sources are currently fast.

use contracts::{
    BufferMode, FixedLagParams, PopReturn, PushReturn, SourceId, StampedSample, TimeDelta,
    TimePoint,
};
use tracing::instrument;

use crate::policy;
use crate::quantile::normal_quantile;
use crate::queue;

/// Reordering buffer with a statically computed release delay.
#[derive(Debug)]
pub struct FixedLagBuffer<T> {
    params: FixedLagParams,
    data: Vec<StampedSample<T>>,
    fixed_lag: TimeDelta,
    /// Measurement time of the last released sample; lower bound for all
    /// future releases.
    buffer_time: TimePoint,
    /// Reset reference. Known quirk kept from the original design: nothing
    /// ever advances this, so the reset path only fires for receipt times
    /// more than `reset_threshold` before the epoch.
    current_time: TimePoint,
}

impl<T> FixedLagBuffer<T> {
    pub fn new(params: FixedLagParams) -> Self {
        let mut fixed_lag = params.delay_mean;
        if params.mode == BufferMode::Batch {
            fixed_lag = fixed_lag + params.batch.max_delta;
        }
        let delay_stddev = params.delay_stddev.as_nanos_f64();
        if delay_stddev > f64::EPSILON {
            let two_sided = 1.0 - (1.0 - params.delay_quantile) / 2.0;
            fixed_lag =
                fixed_lag + TimeDelta::from_nanos_f64(normal_quantile(0.0, delay_stddev, two_sided));
        }

        Self {
            params,
            data: Vec::new(),
            fixed_lag,
            buffer_time: TimePoint::EPOCH,
            current_time: TimePoint::EPOCH,
        }
    }

    /// The release delay applied to every sample.
    pub fn fixed_lag(&self) -> TimeDelta {
        self.fixed_lag
    }

    #[instrument(
        level = "trace",
        name = "fixed_lag_push",
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
        if self.current_time - receipt_time > self.params.reset_threshold {
            tracing::warn!(receipt_time = %receipt_time, "receipt time jumped backwards, resetting buffer");
            metrics::counter!("reorder_buffer_resets_total", "buffer" => "fixed_lag").increment(1);
            self.reset();
            return PushReturn::Reset;
        }

        self.data
            .push(StampedSample::measured(id, meas_time, receipt_time, payload));
        queue::sort_by_meas_time(&mut self.data);

        PushReturn::Ok
    }

    #[instrument(level = "trace", name = "fixed_lag_pop", skip(self), fields(now = %now))]
    pub fn pop(&mut self, now: TimePoint) -> PopReturn<T> {
        let mut output_inds: Vec<usize> = Vec::new();
        let mut discard_inds: Vec<usize> = Vec::new();

        // everything measured before this may be released
        let ref_meas_time = now - self.fixed_lag;

        for (idx, element) in self.data.iter().enumerate() {
            if element.meas_time <= self.buffer_time {
                discard_inds.push(idx);
            } else if element.meas_time <= ref_meas_time {
                output_inds.push(idx);
            } else {
                // the queue is sorted, nothing further back is old enough
                break;
            }
        }

        if self.params.mode == BufferMode::Batch && !output_inds.is_empty() {
            output_inds = policy::batch_window(&self.data, output_inds, self.params.batch.max_delta);
        } else if self.params.mode == BufferMode::Match && !output_inds.is_empty() {
            let outcome = policy::match_fixed_lag(
                &self.data,
                &output_inds,
                &self.params.match_.reference_stream,
                self.params.match_.num_streams,
            );
            output_inds = outcome.output;
            discard_inds.extend(outcome.discard);
        }

        let (data, discarded_data) = queue::split_released(&mut self.data, output_inds, discard_inds);
        queue::sort_by_meas_time(&mut self.data);

        if let Some(last) = data.last() {
            self.buffer_time = last.meas_time;
        }
        if !data.is_empty() {
            metrics::histogram!("reorder_buffer_release_size", "buffer" => "fixed_lag")
                .record(data.len() as f64);
        }
        if !discarded_data.is_empty() {
            metrics::counter!("reorder_buffer_discarded_total", "buffer" => "fixed_lag")
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
    }

    /// Measurement time of the last released sample.
    pub fn buffer_time(&self) -> TimePoint {
        self.buffer_time
    }

    pub fn current_time(&self) -> TimePoint {
        self.current_time
    }

    pub fn num_queued_elements(&self) -> usize {
        self.data.len()
    }
}

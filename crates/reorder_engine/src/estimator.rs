//! Per-source stream characteristics estimation.
//!
//! Maintains exponentially weighted mean/variance estimates of the
//! measurement period and the end-to-end latency of one source. The
//! variance update is coupled to the mean update (weighted Welford form),
//! so both stay numerically safe when the inputs are perfectly timed and
//! the variance is exactly zero.
//!
//! Assumptions:
//!  - period and latency change slowly relative to the measurement rate
//!  - a source delivers data with increasing measurement time stamps

use contracts::{BufferError, TimeDelta, TimePoint};

use crate::quantile::normal_quantile;

const DEFAULT_ALPHA: f64 = 0.05;

/// Mean/variance pair for one tracked quantity, in nanoseconds.
#[derive(Debug, Clone, Copy, Default)]
struct State {
    mean: f64,
    variance: f64,
}

/// Online estimator for one source's measurement period and latency.
#[derive(Debug, Clone)]
pub struct StreamEstimator {
    num_updates: usize,
    last_meas_time: TimePoint,
    last_current_time: TimePoint,
    alpha: f64,
    period_state: State,
    latency_state: State,
}

impl StreamEstimator {
    /// Start tracking a source from its first sample.
    ///
    /// The latency can be initialized directly from the first sample while
    /// the period requires a second one.
    pub fn new(current_time: TimePoint, meas_time: TimePoint) -> Self {
        Self::with_alpha(current_time, meas_time, DEFAULT_ALPHA)
    }

    pub fn with_alpha(current_time: TimePoint, meas_time: TimePoint, alpha: f64) -> Self {
        Self {
            num_updates: 0,
            last_meas_time: meas_time,
            last_current_time: current_time,
            alpha,
            period_state: State::default(),
            latency_state: State {
                mean: (current_time - meas_time).as_nanos_f64(),
                variance: 0.0,
            },
        }
    }

    /// Apply a full update from the next sample of this source.
    ///
    /// `num_missing` is the number of measurements assumed lost between the
    /// previous sample and this one; the period observation is corrected by
    /// that many mean periods before entering the filter. A corrected
    /// observation below zero means the missing count and the period
    /// estimate contradict each other: during warm-up (up to ten updates)
    /// the period update is silently skipped, afterwards the update is
    /// rejected with [`BufferError::EstimatorDesync`] and no state changes.
    pub fn update(
        &mut self,
        current_time: TimePoint,
        meas_time: TimePoint,
        num_missing: usize,
    ) -> Result<(), BufferError> {
        let estimated_latency = (current_time - meas_time).as_nanos_f64();
        let estimated_period = (meas_time - self.last_meas_time).as_nanos_f64();

        self.update_period_estimate(estimated_period, num_missing)?;
        self.update_latency_estimate(estimated_latency);

        self.last_meas_time = meas_time;
        self.last_current_time = current_time;
        self.num_updates += 1;
        Ok(())
    }

    /// Update only the latency statistics and advance the anchors.
    ///
    /// Used when a sample could not be associated with a placeholder, so
    /// the missing-measurement count would be unreliable. Does not count as
    /// a full update.
    pub fn update_latency_only(&mut self, current_time: TimePoint, meas_time: TimePoint) {
        let estimated_latency = (current_time - meas_time).as_nanos_f64();

        self.update_latency_estimate(estimated_latency);

        self.last_meas_time = meas_time;
        self.last_current_time = current_time;
    }

    pub fn latency(&self) -> TimeDelta {
        TimeDelta::from_nanos_f64(self.latency_state.mean)
    }

    pub fn latency_stddev(&self) -> TimeDelta {
        TimeDelta::from_nanos_f64(self.latency_state.variance.sqrt())
    }

    pub fn latency_quantile(&self, quantile: f64) -> TimeDelta {
        if self.latency_state.variance == 0.0 {
            // without variance, every quantile sits on the mean
            return self.latency();
        }
        TimeDelta::from_nanos_f64(normal_quantile(
            self.latency_state.mean,
            self.latency_state.variance.sqrt(),
            quantile,
        ))
    }

    pub fn period(&self) -> TimeDelta {
        TimeDelta::from_nanos_f64(self.period_state.mean)
    }

    pub fn period_stddev(&self) -> TimeDelta {
        TimeDelta::from_nanos_f64(self.period_state.variance.sqrt())
    }

    pub fn period_quantile(&self, quantile: f64) -> TimeDelta {
        if self.period_state.variance == 0.0 {
            // without variance, every quantile sits on the mean
            return self.period();
        }
        TimeDelta::from_nanos_f64(normal_quantile(
            self.period_state.mean,
            self.period_state.variance.sqrt(),
            quantile,
        ))
    }

    pub fn num_updates(&self) -> usize {
        self.num_updates
    }

    /// The period needs two inter-sample differences before its variance is
    /// meaningful, hence two full updates.
    pub fn is_initialized(&self) -> bool {
        self.num_updates >= 2
    }

    /// One exponentially weighted mean/variance step.
    fn updated(&self, state: State, estimate: f64, update_variance: bool) -> State {
        let diff = estimate - state.mean;
        let increment = self.alpha * diff;
        let mean = state.mean + increment;

        let variance = if update_variance {
            (1.0 - self.alpha) * (state.variance + diff * increment)
        } else {
            state.variance
        };

        State { mean, variance }
    }

    fn update_period_estimate(
        &mut self,
        estimate: f64,
        num_missing: usize,
    ) -> Result<(), BufferError> {
        // In contrast to the latency the period requires three data points:
        // two differences are needed to initialize the variance.
        if self.num_updates == 0 {
            self.period_state.mean = estimate;
            return Ok(());
        }
        if self.num_updates == 1 {
            let first_estimate = self.period_state.mean;

            // update only the mean, the variance is not yet initialized
            self.period_state = self.updated(self.period_state, estimate, false);

            self.period_state.variance = (first_estimate - self.period_state.mean).powi(2)
                + (estimate - self.period_state.mean).powi(2);
            return Ok(());
        }

        let corrected = estimate - num_missing as f64 * self.period_state.mean;

        // if signs differ, something seems off
        if corrected < 0.0 {
            if self.num_updates > 10 {
                return Err(BufferError::EstimatorDesync {
                    num_missing,
                    estimate,
                    mean: self.period_state.mean,
                    corrected,
                    num_updates: self.num_updates,
                });
            }
            return Ok(());
        }

        self.period_state = self.updated(self.period_state, corrected, true);
        Ok(())
    }

    fn update_latency_estimate(&mut self, estimate: f64) {
        if self.num_updates == 0 {
            // the first latency observation arrived with the construction,
            // so the variance can already be initialized here
            self.latency_state = self.updated(self.latency_state, estimate, false);

            let first_estimate = (self.last_current_time - self.last_meas_time).as_nanos_f64();
            self.latency_state.variance = (first_estimate - self.latency_state.mean).powi(2)
                + (estimate - self.latency_state.mean).powi(2);
            return;
        }

        self.latency_state = self.updated(self.latency_state, estimate, true);
    }
}

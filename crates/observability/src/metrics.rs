//! Replay metrics collection.
//!
//! Aggregates delivery statistics from pop results, both into the
//! `metrics` facade for the Prometheus exporter and into an in-memory
//! summary for the end-of-run report.

use std::collections::HashMap;

use contracts::{PopReturn, TimePoint};
use metrics::{counter, gauge, histogram};

/// Record one pop result into the metrics facade.
///
/// Call this after every `pop` that is worth accounting for.
pub fn record_pop_metrics<T>(now: TimePoint, result: &PopReturn<T>) {
    if !result.data.is_empty() {
        counter!("resequencer_samples_released_total").increment(result.data.len() as u64);
        histogram!("resequencer_release_batch_size").record(result.data.len() as f64);
    }
    if !result.discarded_data.is_empty() {
        counter!("resequencer_samples_discarded_total")
            .increment(result.discarded_data.len() as u64);
    }
    gauge!("resequencer_buffer_time_ms").set(result.buffer_time.as_nanos() as f64 / 1e6);

    for sample in &result.data {
        let hold_ms = (now - sample.receipt_time).as_secs_f64() * 1e3;
        let age_ms = (now - sample.meas_time).as_secs_f64() * 1e3;
        histogram!(
            "resequencer_hold_back_ms",
            "source_id" => sample.id.to_string()
        )
        .record(hold_ms);
        histogram!(
            "resequencer_delivery_age_ms",
            "source_id" => sample.id.to_string()
        )
        .record(age_ms);
    }
}

/// Replay metrics aggregator
///
/// Aggregates metrics in memory for summaries at the end of a run.
#[derive(Debug, Clone, Default)]
pub struct ReplayMetricsAggregator {
    /// Total released samples
    pub total_released: u64,

    /// Total discarded samples
    pub total_discarded: u64,

    /// Number of pop calls that produced output
    pub delivering_pops: u64,

    /// Per-source released counts
    pub released_per_source: HashMap<String, u64>,

    /// Per-source discarded counts
    pub discarded_per_source: HashMap<String, u64>,

    /// Hold-back time (release minus receipt) statistics, milliseconds
    pub hold_back_ms: RunningStats,

    /// Delivery age (release minus measurement) statistics, milliseconds
    pub delivery_age_ms: RunningStats,

    /// Release batch size statistics
    pub batch_size: RunningStats,
}

impl ReplayMetricsAggregator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Fold one pop result into the aggregate.
    pub fn update<T>(&mut self, now: TimePoint, result: &PopReturn<T>) {
        self.total_released += result.data.len() as u64;
        self.total_discarded += result.discarded_data.len() as u64;

        if !result.data.is_empty() {
            self.delivering_pops += 1;
            self.batch_size.push(result.data.len() as f64);
        }

        for sample in &result.data {
            *self
                .released_per_source
                .entry(sample.id.to_string())
                .or_insert(0) += 1;
            self.hold_back_ms
                .push((now - sample.receipt_time).as_secs_f64() * 1e3);
            self.delivery_age_ms
                .push((now - sample.meas_time).as_secs_f64() * 1e3);
        }
        for sample in &result.discarded_data {
            *self
                .discarded_per_source
                .entry(sample.id.to_string())
                .or_insert(0) += 1;
        }
    }

    /// Produce the end-of-run summary.
    pub fn summary(&self) -> MetricsSummary {
        let delivered_total = self.total_released + self.total_discarded;
        MetricsSummary {
            total_released: self.total_released,
            total_discarded: self.total_discarded,
            delivering_pops: self.delivering_pops,
            discard_rate: if delivered_total > 0 {
                self.total_discarded as f64 / delivered_total as f64 * 100.0
            } else {
                0.0
            },
            hold_back_ms: StatsSummary::from(&self.hold_back_ms),
            delivery_age_ms: StatsSummary::from(&self.delivery_age_ms),
            batch_size: StatsSummary::from(&self.batch_size),
            released_per_source: self.released_per_source.clone(),
            discarded_per_source: self.discarded_per_source.clone(),
        }
    }

    pub fn reset(&mut self) {
        *self = Self::default();
    }
}

/// Metrics summary
#[derive(Debug, Clone, Default)]
pub struct MetricsSummary {
    pub total_released: u64,
    pub total_discarded: u64,
    pub delivering_pops: u64,
    pub discard_rate: f64,
    pub hold_back_ms: StatsSummary,
    pub delivery_age_ms: StatsSummary,
    pub batch_size: StatsSummary,
    pub released_per_source: HashMap<String, u64>,
    pub discarded_per_source: HashMap<String, u64>,
}

impl std::fmt::Display for MetricsSummary {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        writeln!(f, "=== Replay Summary ===")?;
        writeln!(f, "Released samples: {}", self.total_released)?;
        writeln!(
            f,
            "Discarded samples: {} ({:.2}%)",
            self.total_discarded, self.discard_rate
        )?;
        writeln!(f, "Delivering pops: {}", self.delivering_pops)?;
        writeln!(f, "Hold-back (ms): {}", self.hold_back_ms)?;
        writeln!(f, "Delivery age (ms): {}", self.delivery_age_ms)?;
        writeln!(f, "Release batch size: {}", self.batch_size)?;

        if !self.released_per_source.is_empty() {
            writeln!(f, "Released per source:")?;
            let mut sources: Vec<_> = self.released_per_source.iter().collect();
            sources.sort_by_key(|(id, _)| id.as_str());
            for (source, count) in sources {
                let discarded = self.discarded_per_source.get(source).unwrap_or(&0);
                writeln!(f, "  {source}: {count} (discarded {discarded})")?;
            }
        }

        Ok(())
    }
}

/// Stats summary
#[derive(Debug, Clone, Default)]
pub struct StatsSummary {
    pub count: u64,
    pub min: f64,
    pub max: f64,
    pub mean: f64,
    pub std_dev: f64,
}

impl From<&RunningStats> for StatsSummary {
    fn from(stats: &RunningStats) -> Self {
        Self {
            count: stats.count(),
            min: stats.min(),
            max: stats.max(),
            mean: stats.mean(),
            std_dev: stats.std_dev(),
        }
    }
}

impl std::fmt::Display for StatsSummary {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        if self.count == 0 {
            write!(f, "N/A")
        } else {
            write!(
                f,
                "min={:.3}, max={:.3}, mean={:.3}, std={:.3} (n={})",
                self.min, self.max, self.mean, self.std_dev, self.count
            )
        }
    }
}

/// Online statistics calculator (Welford's algorithm)
#[derive(Debug, Clone, Default)]
pub struct RunningStats {
    count: u64,
    mean: f64,
    m2: f64,
    min: f64,
    max: f64,
}

impl RunningStats {
    /// Add a new value
    pub fn push(&mut self, value: f64) {
        self.count += 1;

        if self.count == 1 {
            self.min = value;
            self.max = value;
            self.mean = value;
            self.m2 = 0.0;
        } else {
            self.min = self.min.min(value);
            self.max = self.max.max(value);

            let delta = value - self.mean;
            self.mean += delta / self.count as f64;
            let delta2 = value - self.mean;
            self.m2 += delta * delta2;
        }
    }

    pub fn count(&self) -> u64 {
        self.count
    }

    pub fn mean(&self) -> f64 {
        if self.count == 0 {
            0.0
        } else {
            self.mean
        }
    }

    pub fn variance(&self) -> f64 {
        if self.count < 2 {
            0.0
        } else {
            self.m2 / (self.count - 1) as f64
        }
    }

    pub fn std_dev(&self) -> f64 {
        self.variance().sqrt()
    }

    pub fn min(&self) -> f64 {
        self.min
    }

    pub fn max(&self) -> f64 {
        self.max
    }
}

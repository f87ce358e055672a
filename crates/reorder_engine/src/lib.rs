//! # Reorder Engine
//!
//! Time-ordered reordering buffers for multi-source measurement streams.
//!
//! Independent sources emit timestamped samples whose receipt is delayed
//! and jittered relative to the measurement time. The buffers here restore
//! non-decreasing measurement-time order for downstream consumers:
//!
//! - [`FixedLagBuffer`] releases samples after a statically computed delay
//!   quantile
//! - [`MinimalLatencyBuffer`] releases samples as early as the online
//!   per-source period/latency estimates allow, using virtual placeholders
//!   for not-yet-received samples
//!
//! Both support `Single`, `Batch`, and `Match` release policies. The core
//! is a single-threaded state machine: callers drive it with `push` and
//! `pop`, all time is caller-supplied.
//!
//! ## Usage example
//!
//! ```
//! use reorder_engine::{MinimalLatencyBuffer, MinimalLatencyParams, TimePoint};
//!
//! let mut buffer: MinimalLatencyBuffer<Vec<u8>> =
//!     MinimalLatencyBuffer::new(MinimalLatencyParams::default());
//!
//! buffer.push(
//!     "lidar_front".into(),
//!     TimePoint::from_millis(60),
//!     TimePoint::from_millis(50),
//!     vec![0u8; 16],
//! );
//!
//! let released = buffer.pop(TimePoint::from_millis(60));
//! assert_eq!(released.data.len(), 1);
//! ```

mod estimator;
mod fixed_lag;
mod minimal_latency;
mod policy;
mod quantile;
pub mod queue;

pub use estimator::StreamEstimator;
pub use fixed_lag::FixedLagBuffer;
pub use minimal_latency::MinimalLatencyBuffer;

// Re-export the contract types the public surface is built from
pub use contracts::{
    BatchParams, BufferError, BufferMode, FixedLagParams, MatchParams, MinimalLatencyParams,
    PopReturn, PushReturn, SampleSlot, SourceId, StampedSample, TimeDelta, TimePoint,
};

//! Monotonic time primitives with signed nanosecond arithmetic.
//!
//! The engine keeps no clock of its own: every `TimePoint` is supplied by
//! the caller, and only differences between caller-supplied points are ever
//! computed. `TimeDelta` is signed so that latency and jitter terms may go
//! negative during estimation.

use std::fmt;
use std::ops::{Add, AddAssign, Div, Mul, Neg, Sub, SubAssign};

use serde::{Deserialize, Serialize};

/// Signed duration with nanosecond resolution.
#[derive(
    Clone, Copy, Debug, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(transparent)]
pub struct TimeDelta(i64);

impl TimeDelta {
    pub const ZERO: TimeDelta = TimeDelta(0);

    #[inline]
    pub const fn from_nanos(ns: i64) -> Self {
        Self(ns)
    }

    #[inline]
    pub const fn from_micros(us: i64) -> Self {
        Self(us * 1_000)
    }

    #[inline]
    pub const fn from_millis(ms: i64) -> Self {
        Self(ms * 1_000_000)
    }

    #[inline]
    pub const fn from_secs(s: i64) -> Self {
        Self(s * 1_000_000_000)
    }

    /// Truncating conversion from a fractional nanosecond count.
    ///
    /// Quantile computations run in `f64` nanoseconds; the result is cut
    /// back to the integer grid the queue operates on.
    #[inline]
    pub fn from_nanos_f64(ns: f64) -> Self {
        Self(ns as i64)
    }

    #[inline]
    pub const fn as_nanos(self) -> i64 {
        self.0
    }

    #[inline]
    pub fn as_nanos_f64(self) -> f64 {
        self.0 as f64
    }

    #[inline]
    pub fn as_secs_f64(self) -> f64 {
        self.0 as f64 / 1e9
    }

    #[inline]
    pub const fn abs(self) -> Self {
        Self(self.0.abs())
    }

    #[inline]
    pub const fn is_positive(self) -> bool {
        self.0 > 0
    }

    /// Clamp into `[-limit, limit]`.
    #[inline]
    pub fn clamp_abs(self, limit: TimeDelta) -> Self {
        Self(self.0.clamp(-limit.0.abs(), limit.0.abs()))
    }
}

impl Add for TimeDelta {
    type Output = TimeDelta;

    #[inline]
    fn add(self, rhs: TimeDelta) -> TimeDelta {
        TimeDelta(self.0 + rhs.0)
    }
}

impl Sub for TimeDelta {
    type Output = TimeDelta;

    #[inline]
    fn sub(self, rhs: TimeDelta) -> TimeDelta {
        TimeDelta(self.0 - rhs.0)
    }
}

impl Neg for TimeDelta {
    type Output = TimeDelta;

    #[inline]
    fn neg(self) -> TimeDelta {
        TimeDelta(-self.0)
    }
}

impl Mul<i64> for TimeDelta {
    type Output = TimeDelta;

    #[inline]
    fn mul(self, rhs: i64) -> TimeDelta {
        TimeDelta(self.0 * rhs)
    }
}

impl Div<i64> for TimeDelta {
    type Output = TimeDelta;

    #[inline]
    fn div(self, rhs: i64) -> TimeDelta {
        TimeDelta(self.0 / rhs)
    }
}

impl fmt::Display for TimeDelta {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:+}ns", self.0)
    }
}

/// A point on the caller's monotonic timeline.
///
/// The zero value is the epoch; both buffers reset their internal times to
/// it. Ordering and hashing follow the underlying nanosecond count.
#[derive(
    Clone, Copy, Debug, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(transparent)]
pub struct TimePoint(i64);

impl TimePoint {
    pub const EPOCH: TimePoint = TimePoint(0);

    #[inline]
    pub const fn from_nanos(ns: i64) -> Self {
        Self(ns)
    }

    #[inline]
    pub const fn from_millis(ms: i64) -> Self {
        Self(ms * 1_000_000)
    }

    #[inline]
    pub const fn as_nanos(self) -> i64 {
        self.0
    }

    #[inline]
    pub fn min(self, other: TimePoint) -> TimePoint {
        TimePoint(self.0.min(other.0))
    }

    #[inline]
    pub fn max(self, other: TimePoint) -> TimePoint {
        TimePoint(self.0.max(other.0))
    }
}

impl Add<TimeDelta> for TimePoint {
    type Output = TimePoint;

    #[inline]
    fn add(self, rhs: TimeDelta) -> TimePoint {
        TimePoint(self.0 + rhs.as_nanos())
    }
}

impl AddAssign<TimeDelta> for TimePoint {
    #[inline]
    fn add_assign(&mut self, rhs: TimeDelta) {
        self.0 += rhs.as_nanos();
    }
}

impl Sub<TimeDelta> for TimePoint {
    type Output = TimePoint;

    #[inline]
    fn sub(self, rhs: TimeDelta) -> TimePoint {
        TimePoint(self.0 - rhs.as_nanos())
    }
}

impl SubAssign<TimeDelta> for TimePoint {
    #[inline]
    fn sub_assign(&mut self, rhs: TimeDelta) {
        self.0 -= rhs.as_nanos();
    }
}

impl Sub for TimePoint {
    type Output = TimeDelta;

    #[inline]
    fn sub(self, rhs: TimePoint) -> TimeDelta {
        TimeDelta::from_nanos(self.0 - rhs.0)
    }
}

impl fmt::Display for TimePoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}ns", self.0)
    }
}

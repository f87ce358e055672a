//! Queued sample record and the push/pop result types.
//!
//! A queue element is either a received measurement carrying its payload or
//! a placeholder reserving the spot where a measurement is still expected.
//! For placeholders the `meas_time` equals the earliest estimated
//! measurement time so that push and pop can treat both kinds uniformly
//! when walking the time-sorted queue.

use std::cmp::Ordering;

use crate::{SourceId, TimePoint};

/// Payload slot of a queue element.
///
/// Placeholders carry no data; they only reserve an expected arrival
/// interval for a known source.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SampleSlot<T> {
    /// A received measurement with its opaque owned payload.
    Measured(T),
    /// An expected-but-not-yet-received measurement.
    Placeholder,
}

impl<T> SampleSlot<T> {
    #[inline]
    pub fn is_placeholder(&self) -> bool {
        matches!(self, SampleSlot::Placeholder)
    }
}

/// A single element of the time-sorted sample queue.
#[derive(Debug, Clone)]
pub struct StampedSample<T> {
    /// Identifies the stream this sample (or expectation) belongs to.
    pub id: SourceId,
    /// Time the measurement represents. Placeholders mirror their
    /// `earliest_estimated_meas_time` here.
    pub meas_time: TimePoint,
    /// Time the measurement became available. Placeholders mirror their
    /// `latest_receipt_time` here.
    pub receipt_time: TimePoint,
    /// Earliest measurement time the engine believes the real sample can
    /// still take. Untouched when a placeholder is filled, for later
    /// inspection.
    pub earliest_estimated_meas_time: TimePoint,
    /// Latest receipt the engine will still wait for (placeholders only).
    pub latest_receipt_time: TimePoint,
    /// Payload or placeholder marker.
    pub slot: SampleSlot<T>,
    /// One-shot flag: whether placeholder expansion already ran from here.
    pub created_placeholder: bool,
}

impl<T> StampedSample<T> {
    /// A freshly received measurement. The estimated bounds collapse onto
    /// the observed stamps.
    pub fn measured(
        id: SourceId,
        meas_time: TimePoint,
        receipt_time: TimePoint,
        payload: T,
    ) -> Self {
        Self {
            id,
            meas_time,
            receipt_time,
            earliest_estimated_meas_time: meas_time,
            latest_receipt_time: receipt_time,
            slot: SampleSlot::Measured(payload),
            created_placeholder: false,
        }
    }

    /// A placeholder spanning `[earliest, latest_receipt]`.
    pub fn placeholder(id: SourceId, earliest: TimePoint, latest_receipt: TimePoint) -> Self {
        Self {
            id,
            meas_time: earliest,
            receipt_time: latest_receipt,
            earliest_estimated_meas_time: earliest,
            latest_receipt_time: latest_receipt,
            slot: SampleSlot::Placeholder,
            created_placeholder: false,
        }
    }

    #[inline]
    pub fn is_placeholder(&self) -> bool {
        self.slot.is_placeholder()
    }

    /// Consume the record and hand out the payload, if any.
    pub fn into_payload(self) -> Option<T> {
        match self.slot {
            SampleSlot::Measured(payload) => Some(payload),
            SampleSlot::Placeholder => None,
        }
    }

    /// Ordering used to keep the queue sorted. Ties resolve arbitrarily but
    /// the sort applying this comparator must be stable.
    #[inline]
    pub fn meas_time_cmp(&self, other: &Self) -> Ordering {
        self.meas_time.cmp(&other.meas_time)
    }
}

/// Result of pushing one sample into a buffer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PushReturn {
    /// The sample was admitted (it may still be discarded later).
    Ok,
    /// The receipt time jumped too far into the past; the buffer performed
    /// a full reset and the triggering sample was dropped.
    Reset,
}

/// Result of a single `pop` call.
#[derive(Debug)]
pub struct PopReturn<T> {
    /// Measurement time of the last released sample.
    pub buffer_time: TimePoint,
    /// Samples released in non-decreasing measurement-time order.
    pub data: Vec<StampedSample<T>>,
    /// Samples dropped because they can no longer be released in sequence.
    pub discarded_data: Vec<StampedSample<T>>,
}

impl<T> PopReturn<T> {
    pub fn empty(buffer_time: TimePoint) -> Self {
        Self {
            buffer_time,
            data: Vec::new(),
            discarded_data: Vec::new(),
        }
    }
}

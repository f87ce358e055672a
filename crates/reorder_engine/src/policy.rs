//! Batch and Match release policies.
//!
//! Both policies operate on a sorted list of queue indices (`ready`) that
//! identify the real samples currently eligible for output, plus read
//! access to the underlying time-sorted queue. They decide which indices
//! are actually released, which are discarded, and whether the buffer
//! should keep waiting.

use std::collections::HashMap;

use contracts::{SourceId, StampedSample, TimeDelta, TimePoint};

/// Candidate for one source within a match tuple.
#[derive(Debug, Clone, Copy)]
struct MatchEntry {
    idx: usize,
    /// Absolute measurement time difference to the reference, in seconds.
    tau: f64,
}

/// Outcome of a matching pass.
#[derive(Debug, Default)]
pub(crate) struct MatchOutcome {
    /// Queue indices forming the released tuple, ascending.
    pub output: Vec<usize>,
    /// Queue indices to discard (an unachievable reference).
    pub discard: Vec<usize>,
}

/// Fixed-lag batching: extend the ready set with every queue element whose
/// measurement time falls within `max_delta` of the oldest ready sample,
/// regardless of whether it already passed the lag horizon.
pub(crate) fn batch_window<T>(
    queue: &[StampedSample<T>],
    ready: Vec<usize>,
    max_delta: TimeDelta,
) -> Vec<usize> {
    let first = ready[0];
    let batch_limit = queue[first].meas_time + max_delta;

    let mut batch = vec![first];
    for idx in first + 1..queue.len() {
        if queue[idx].meas_time < batch_limit {
            // queue order is preserved for the output
            batch.push(idx);
        }
    }
    batch
}

/// Minimal-latency batching: suppress the whole output while a placeholder
/// predicts another sample inside the batch window whose wait deadline has
/// not yet passed.
pub(crate) fn batch_or_wait<T>(
    queue: &[StampedSample<T>],
    ready: Vec<usize>,
    max_delta: TimeDelta,
    now: TimePoint,
) -> Vec<usize> {
    let batch_start = queue[ready[0]].meas_time;
    let last_ready = *ready.last().unwrap_or(&0);

    let worth_waiting = queue[last_ready..].iter().any(|element| {
        element.is_placeholder()
            && element.earliest_estimated_meas_time - batch_start < max_delta
            && element.latest_receipt_time > now
    });

    if worth_waiting {
        // hold back the ready elements until the expected sample arrives
        // or its wait deadline expires
        Vec::new()
    } else {
        ready
    }
}

/// Fixed-lag matching.
///
/// The reference must be ready; candidates for the other sources are taken
/// from the whole queue, so a tuple may contain samples that have not yet
/// passed the lag horizon themselves. The reference is discarded only when
/// the tuple is incomplete and some source already fits the next reference
/// better without having produced a candidate for the current one.
pub(crate) fn match_fixed_lag<T>(
    queue: &[StampedSample<T>],
    ready: &[usize],
    reference_stream: &SourceId,
    num_streams: usize,
) -> MatchOutcome {
    let Some((ref_idx, oldest_ref, mut next_ref, mut found_next)) =
        find_reference(queue, ready, reference_stream)
    else {
        return MatchOutcome::default();
    };

    if !found_next {
        // search received but not yet ready samples for the next reference
        for element in &queue[ref_idx + 1..] {
            if element.id == *reference_stream {
                found_next = true;
                next_ref = element.meas_time;
                break;
            }
        }
        if !found_next {
            // without stream characteristics there is no way of estimating
            // the next reference sample if not already received
            next_ref = TimePoint::EPOCH;
        }
    }

    let mut matching_map: HashMap<SourceId, MatchEntry> = HashMap::new();
    matching_map.insert(reference_stream.clone(), MatchEntry { idx: ref_idx, tau: 0.0 });

    // flags a stream that fits the next reference better while having no
    // candidate for the current one
    let mut found_better_for_next = false;
    for (idx, element) in queue.iter().enumerate() {
        if element.id == *reference_stream {
            // only the oldest reference may be considered
            continue;
        }

        let current_diff = (element.meas_time - oldest_ref).abs();
        let next_diff = (element.meas_time - next_ref).abs();

        if next_diff < current_diff {
            if !matching_map.contains_key(&element.id) {
                found_better_for_next = true;
            }
            // further samples won't fit better
            break;
        }

        let entry = matching_map
            .entry(element.id.clone())
            .or_insert(MatchEntry { idx, tau: f64::MAX });
        let current_diff_secs = current_diff.as_secs_f64();
        if current_diff_secs < entry.tau {
            entry.idx = idx;
            entry.tau = current_diff_secs;
        }
    }

    if matching_map.len() != num_streams {
        let mut outcome = MatchOutcome::default();
        if found_better_for_next {
            // delete the current reference since the tuple is impossible;
            // other entries are dropped once another tuple succeeds
            outcome.discard.push(ref_idx);
        }
        return outcome;
    }

    MatchOutcome {
        output: sorted_tuple(matching_map),
        discard: Vec::new(),
    }
}

/// Minimal-latency matching.
///
/// Candidates are first taken from the ready set; the scan then continues
/// beyond it over real samples and placeholders alike. An anticipated
/// source counts toward tuple completeness, and an anticipated sample that
/// would fit the current reference better than the selected candidate
/// forces the buffer to keep waiting even when the tuple is complete.
pub(crate) fn match_minimal_latency<T>(
    queue: &[StampedSample<T>],
    ready: &[usize],
    reference_stream: &SourceId,
    reference_period: Option<TimeDelta>,
    num_known_sources: usize,
) -> MatchOutcome {
    let Some((ref_idx, oldest_ref, mut next_ref, found_next)) =
        find_reference(queue, ready, reference_stream)
    else {
        return MatchOutcome::default();
    };

    if !found_next {
        if let Some(period) = reference_period {
            next_ref = oldest_ref + period;
        }
    }

    // Assumption: no overlapping intervals within a single stream, so the
    // earliest estimated measurement time is a sufficient stand-in when
    // considering placeholders.

    let mut matching_map: HashMap<SourceId, MatchEntry> = HashMap::new();
    matching_map.insert(reference_stream.clone(), MatchEntry { idx: ref_idx, tau: 0.0 });

    // remember the highest queue index consulted; the queue is sorted, so
    // the follow-up scan can resume right after it
    let mut latest_data_idx = 0;
    for &idx in ready {
        let element = &queue[idx];
        latest_data_idx = idx;

        if element.id == *reference_stream {
            // only the oldest reference may be considered
            continue;
        }

        let current_diff = (element.meas_time - oldest_ref).abs();
        let next_diff = (element.meas_time - next_ref).abs();

        if next_diff < current_diff {
            // no other ready sample fits the current reference, since the
            // indices are sorted
            break;
        }

        let entry = matching_map
            .entry(element.id.clone())
            .or_insert(MatchEntry { idx, tau: f64::MAX });
        let current_diff_secs = current_diff.as_secs_f64();
        if current_diff_secs < entry.tau {
            entry.idx = idx;
            entry.tau = current_diff_secs;
        }
    }

    // Everything after latest_data_idx is not yet available for output, so
    // real samples and placeholders are interchangeable here: waiting would
    // be required either way.
    let mut found_better_sample = false;
    for (idx, element) in queue.iter().enumerate().skip(latest_data_idx + 1) {
        if element.id == *reference_stream {
            continue;
        }

        let current_diff = (element.meas_time - oldest_ref).abs();
        let next_diff = (element.meas_time - next_ref).abs();

        if next_diff < current_diff {
            break;
        }

        // creating new entries is explicitly intended: an anticipated
        // source still completes the tuple
        let entry = matching_map
            .entry(element.id.clone())
            .or_insert(MatchEntry { idx, tau: f64::MAX });
        if current_diff.as_secs_f64() < entry.tau {
            found_better_sample = true;
            break;
        }
    }

    // completeness must be checked before deciding to wait
    if matching_map.len() != num_known_sources {
        // the current reference must be deleted, as no tuple is possible
        // (not even an anticipated one); other entries are dropped
        // automatically once another tuple succeeds
        return MatchOutcome {
            output: Vec::new(),
            discard: vec![ref_idx],
        };
    }

    if found_better_sample {
        return MatchOutcome::default();
    }

    MatchOutcome {
        output: sorted_tuple(matching_map),
        discard: Vec::new(),
    }
}

/// Locate the oldest ready reference sample and, if present, the next one.
///
/// Returns `(ref_idx, ref_meas_time, next_ref_meas_time, found_next)`.
fn find_reference<T>(
    queue: &[StampedSample<T>],
    ready: &[usize],
    reference_stream: &SourceId,
) -> Option<(usize, TimePoint, TimePoint, bool)> {
    let mut found: Option<(usize, TimePoint)> = None;
    for &idx in ready {
        let element = &queue[idx];
        if element.id != *reference_stream {
            continue;
        }
        match found {
            None => found = Some((idx, element.meas_time)),
            Some((ref_idx, oldest)) => {
                return Some((ref_idx, oldest, element.meas_time, true));
            }
        }
    }
    found.map(|(ref_idx, oldest)| (ref_idx, oldest, TimePoint::EPOCH, false))
}

fn sorted_tuple(matching_map: HashMap<SourceId, MatchEntry>) -> Vec<usize> {
    let mut tuple: Vec<usize> = matching_map.into_values().map(|entry| entry.idx).collect();
    // release in queue order so the output stays measurement-time sorted
    tuple.sort_unstable();
    tuple
}

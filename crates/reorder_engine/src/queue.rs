//! Time-sorted queue utilities.
//!
//! The buffers keep one flat `Vec` of samples sorted by measurement time
//! and mutate it through index sets collected while walking it. The
//! helpers here remove such index sets in a single pass, preserving the
//! order of the survivors and moving payloads instead of copying them.

use contracts::StampedSample;

/// Restore the measurement-time ordering after appends.
///
/// Stable, so equal measurement times keep their insertion order.
pub fn sort_by_meas_time<T>(queue: &mut [StampedSample<T>]) {
    queue.sort_by(StampedSample::meas_time_cmp);
}

/// Remove the elements at `indices` from `vec`, preserving the order of the
/// remaining elements.
///
/// `indices` may be unordered and may contain duplicates; it is sorted and
/// deduplicated in place. O(n + k log k).
pub fn remove_indices<T>(vec: &mut Vec<T>, indices: &mut Vec<usize>) {
    let _ = extract_indices(vec, indices);
}

/// Remove the elements at `indices` from `vec` and return them in ascending
/// index order. The order of the remaining elements is preserved.
///
/// `indices` may be unordered and may contain duplicates; it is sorted and
/// deduplicated in place so the result aligns with it one-to-one.
/// O(n + k log k); every element is moved exactly once.
pub fn extract_indices<T>(vec: &mut Vec<T>, indices: &mut Vec<usize>) -> Vec<T> {
    if indices.is_empty() {
        return Vec::new();
    }

    indices.sort_unstable();
    indices.dedup();
    debug_assert!(indices.last().is_none_or(|&last| last < vec.len()));

    let mut extracted = Vec::with_capacity(indices.len());
    let mut kept = Vec::with_capacity(vec.len() - indices.len());
    let mut next = indices.iter().copied().peekable();

    for (idx, element) in vec.drain(..).enumerate() {
        if next.peek() == Some(&idx) {
            next.next();
            extracted.push(element);
        } else {
            kept.push(element);
        }
    }

    *vec = kept;
    extracted
}

/// Move the released and discarded elements out of the queue in one pass.
///
/// `output` and `discard` must be disjoint. Both result vectors come back
/// in ascending index order, i.e. in queue (measurement-time) order.
pub fn split_released<T>(
    queue: &mut Vec<T>,
    mut output: Vec<usize>,
    mut discard: Vec<usize>,
) -> (Vec<T>, Vec<T>) {
    output.sort_unstable();
    discard.sort_unstable();
    debug_assert!(output.iter().all(|idx| !discard.contains(idx)));

    let mut delete: Vec<usize> = output.iter().chain(discard.iter()).copied().collect();
    let extracted = extract_indices(queue, &mut delete);

    let mut released = Vec::with_capacity(output.len());
    let mut dropped = Vec::with_capacity(discard.len());
    let mut next_output = output.iter().copied().peekable();
    for (idx, element) in delete.iter().zip(extracted) {
        if next_output.peek() == Some(idx) {
            next_output.next();
            released.push(element);
        } else {
            dropped.push(element);
        }
    }

    (released, dropped)
}

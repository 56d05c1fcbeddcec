//! Time window overlap tests.
//!
//! Two windows overlap iff `min(a.end, b.end) - max(a.start, b.start) > 0`.
//! Windows that merely touch at a boundary do not overlap.

use crate::models::TimeWindow;

/// Whether two windows share a stretch of positive length.
pub fn overlaps(a: &TimeWindow, b: &TimeWindow) -> bool {
    a.end.min(b.end) > a.start.max(b.start)
}

/// Whether any window of `windows` overlaps any window of `candidate`.
///
/// Exhaustive pairwise check; lists are neither merged nor deduplicated.
pub fn any_overlap(windows: &[TimeWindow], candidate: &[TimeWindow]) -> bool {
    windows
        .iter()
        .any(|w| candidate.iter().any(|c| overlaps(w, c)))
}

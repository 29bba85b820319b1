//! Removal of unconfirmed insertion runs from a global alignment.
//!
//! When a container's glyph range has been widened, the global alignment of
//! its text against the range shows extra glyphs as runs of
//! [`EditOp::Insertion`] columns. A run survives only when the alignment
//! immediately picks up again with a solid stretch of matches; a run at the
//! very end of the trace is always dropped.

use super::edit_distance::EditOp;

/// Default upper bound on the number of confirming matches.
pub const DEFAULT_TOLERANCE_CAP: usize = 5;

/// Matches required after an insertion run: `min(cap, max(1, target_len - 1))`.
///
/// # Examples
///
/// ```
/// use glyph_anchor::align::noise::tolerance;
///
/// assert_eq!(tolerance(40, 5), 5);
/// assert_eq!(tolerance(3, 5), 2);
/// assert_eq!(tolerance(1, 5), 1);
/// ```
pub fn tolerance(target_len: usize, cap: usize) -> usize {
    cap.min(target_len.saturating_sub(1).max(1))
}

/// Sequence indices covered by removed insertion runs, ascending.
pub fn noise_indices(trace: &[EditOp], k: usize) -> Vec<usize> {
    let mut removed = Vec::new();
    let mut seq_pos = 0usize;
    let mut col = 0usize;

    while col < trace.len() {
        if trace[col] != EditOp::Insertion {
            if trace[col].consumes_sequence() {
                seq_pos += 1;
            }
            col += 1;
            continue;
        }

        let run_start_seq = seq_pos;
        while col < trace.len() && trace[col] == EditOp::Insertion {
            col += 1;
            seq_pos += 1;
        }

        let confirming = trace[col..]
            .iter()
            .take_while(|op| **op == EditOp::Match)
            .count();
        if col == trace.len() || confirming < k {
            removed.extend(run_start_seq..seq_pos);
        }
    }

    removed
}

/// Keep the items whose index is not listed in `removed` (ascending).
pub fn retain_unremoved<T: Clone>(items: &[T], removed: &[usize]) -> Vec<T> {
    let mut out = Vec::with_capacity(items.len().saturating_sub(removed.len()));
    let mut skip = removed.iter().peekable();
    for (i, item) in items.iter().enumerate() {
        if skip.peek() == Some(&&i) {
            skip.next();
            continue;
        }
        out.push(item.clone());
    }
    out
}

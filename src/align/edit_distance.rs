//! Levenshtein alignment of a target against a sequence.
//!
//! Two modes are supported:
//!
//! - **Infix**: the target must be consumed completely, but may match any
//!   substring of the sequence. Leading and trailing sequence characters are
//!   free.
//! - **Global**: both target and sequence are consumed end to end, and the
//!   column trace of the optimal alignment is reported.
//!
//! Every edit costs 1. Pairs declared in an [`EquivalenceTable`] substitute
//! for free, exactly like identical characters.

use crate::text::EquivalenceTable;

/// How the target is laid against the sequence.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AlignMode {
    /// Target against any substring of the sequence
    Infix,
    /// Target against the whole sequence
    Global,
}

/// One column of a global alignment.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EditOp {
    /// Target and sequence characters are equal (or equivalent)
    Match,
    /// Target and sequence characters differ
    Substitution,
    /// Sequence character with no target counterpart
    Insertion,
    /// Target character with no sequence counterpart
    Deletion,
}

impl EditOp {
    /// Whether the column consumes a sequence character.
    pub fn consumes_sequence(&self) -> bool {
        !matches!(self, EditOp::Deletion)
    }

    /// Single-character rendering used in debug output.
    pub fn symbol(&self) -> char {
        match self {
            EditOp::Match => '|',
            EditOp::Substitution => '.',
            EditOp::Insertion => '-',
            EditOp::Deletion => '+',
        }
    }
}

/// Outcome of [`align`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Alignment {
    /// Minimal number of edits
    pub edit_distance: usize,
    /// Inclusive `(start, end)` sequence ranges, one per optimal end position
    /// (infix mode only)
    pub locations: Vec<(usize, usize)>,
    /// Column trace from the start of both strings (global mode only)
    pub trace: Vec<EditOp>,
}

impl Alignment {
    /// The lexicographically smallest location: leftmost, then shortest.
    pub fn primary_location(&self) -> Option<(usize, usize)> {
        self.locations.iter().copied().min()
    }

    /// Trace rendered with [`EditOp::symbol`].
    pub fn trace_string(&self) -> String {
        self.trace.iter().map(EditOp::symbol).collect()
    }
}

/// Similarity of an alignment: `1 - distance / max(1, target_len)`.
///
/// # Examples
///
/// ```
/// use glyph_anchor::align::similarity;
///
/// assert_eq!(similarity(0, 5), 1.0);
/// assert_eq!(similarity(1, 4), 0.75);
/// assert_eq!(similarity(0, 0), 1.0);
/// ```
pub fn similarity(edit_distance: usize, target_len: usize) -> f64 {
    1.0 - edit_distance as f64 / target_len.max(1) as f64
}

/// Align `target` against `sequence`.
///
/// An empty target aligns with distance 0 and no location. An empty sequence
/// yields no location.
///
/// # Examples
///
/// ```
/// use glyph_anchor::align::{align, AlignMode};
/// use glyph_anchor::text::EquivalenceTable;
///
/// let target: Vec<char> = "hello".chars().collect();
/// let sequence: Vec<char> = "hello world".chars().collect();
/// let result = align(&target, &sequence, AlignMode::Infix, &EquivalenceTable::new());
///
/// assert_eq!(result.edit_distance, 0);
/// assert_eq!(result.primary_location(), Some((0, 4)));
/// ```
pub fn align(
    target: &[char],
    sequence: &[char],
    mode: AlignMode,
    equivalences: &EquivalenceTable,
) -> Alignment {
    if target.is_empty() {
        return Alignment {
            edit_distance: 0,
            locations: Vec::new(),
            trace: Vec::new(),
        };
    }
    match mode {
        AlignMode::Infix => align_infix(target, sequence, equivalences),
        AlignMode::Global => align_global(target, sequence, equivalences),
    }
}

/// Infix alignment with two rolling rows.
///
/// Each cell carries the cost and the smallest sequence start among the
/// optimal paths reaching it.
fn align_infix(target: &[char], sequence: &[char], eq: &EquivalenceTable) -> Alignment {
    let m = target.len();
    let n = sequence.len();

    // Row 0: the empty target prefix matches for free starting anywhere.
    let mut prev: Vec<(usize, usize)> = (0..=n).map(|j| (0, j)).collect();
    let mut curr: Vec<(usize, usize)> = vec![(0, 0); n + 1];

    for i in 1..=m {
        curr[0] = (i, 0);
        let t = target[i - 1];
        for j in 1..=n {
            let cost = if eq.equivalent(t, sequence[j - 1]) { 0 } else { 1 };
            let diag = (prev[j - 1].0 + cost, prev[j - 1].1);
            let up = (prev[j].0 + 1, prev[j].1);
            let left = (curr[j - 1].0 + 1, curr[j - 1].1);
            curr[j] = best_cell(best_cell(diag, up), left);
        }
        std::mem::swap(&mut prev, &mut curr);
    }

    let best = match prev.iter().skip(1).map(|cell| cell.0).min() {
        Some(best) => best,
        None => {
            return Alignment {
                edit_distance: m,
                locations: Vec::new(),
                trace: Vec::new(),
            }
        },
    };

    let locations = (1..=n)
        .filter(|&j| prev[j].0 == best && prev[j].1 < j)
        .map(|j| (prev[j].1, j - 1))
        .collect();

    Alignment {
        edit_distance: best,
        locations,
        trace: Vec::new(),
    }
}

/// Lower cost wins; equal costs keep the smaller start.
#[inline]
fn best_cell(a: (usize, usize), b: (usize, usize)) -> (usize, usize) {
    if b.0 < a.0 || (b.0 == a.0 && b.1 < a.1) {
        b
    } else {
        a
    }
}

/// Global alignment with a full matrix and traceback.
///
/// Traceback prefers, in order: match, insertion, substitution, deletion.
/// Once the whole target is consumed, insertion is preferred over match, so
/// extra sequence characters after the target form one trailing run.
fn align_global(target: &[char], sequence: &[char], eq: &EquivalenceTable) -> Alignment {
    let m = target.len();
    let n = sequence.len();
    let width = n + 1;
    let mut d = vec![0usize; (m + 1) * width];

    for j in 0..=n {
        d[j] = j;
    }
    for i in 1..=m {
        d[i * width] = i;
        let t = target[i - 1];
        for j in 1..=n {
            let cost = if eq.equivalent(t, sequence[j - 1]) { 0 } else { 1 };
            let diag = d[(i - 1) * width + j - 1] + cost;
            let up = d[(i - 1) * width + j] + 1;
            let left = d[i * width + j - 1] + 1;
            d[i * width + j] = diag.min(up).min(left);
        }
    }

    let mut trace = Vec::with_capacity(m + n);
    let (mut i, mut j) = (m, n);
    while i > 0 || j > 0 {
        let here = d[i * width + j];
        if i > 0 && j > 0 {
            if i == m && here == d[i * width + j - 1] + 1 {
                trace.push(EditOp::Insertion);
                j -= 1;
                continue;
            }
            let diag = d[(i - 1) * width + j - 1];
            if eq.equivalent(target[i - 1], sequence[j - 1]) && here == diag {
                trace.push(EditOp::Match);
                i -= 1;
                j -= 1;
                continue;
            }
            if here == d[i * width + j - 1] + 1 {
                trace.push(EditOp::Insertion);
                j -= 1;
                continue;
            }
            if here == diag + 1 {
                trace.push(EditOp::Substitution);
                i -= 1;
                j -= 1;
                continue;
            }
            trace.push(EditOp::Deletion);
            i -= 1;
        } else if j > 0 {
            trace.push(EditOp::Insertion);
            j -= 1;
        } else {
            trace.push(EditOp::Deletion);
            i -= 1;
        }
    }
    trace.reverse();

    let edit_distance = d[m * width + n];
    let locations = if n > 0 { vec![(0, n - 1)] } else { Vec::new() };
    Alignment {
        edit_distance,
        locations,
        trace,
    }
}

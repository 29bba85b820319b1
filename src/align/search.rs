//! Windowed search for one unit inside a glyph sequence.
//!
//! The search starts with a window of `len(target) + buffer` characters from
//! the cursor and grows it one character at a time while the similarity keeps
//! strictly improving and is not yet perfect. The climb is greedy: it stops at
//! the first plateau.

use super::edit_distance::{align, similarity, AlignMode};
use crate::error::{Error, Result};
use crate::text::EquivalenceTable;

/// Where and how widely to look for the next unit.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AlignmentWindow {
    /// First sequence index the window may cover
    pub search_from: usize,
    /// Extra characters beyond the target length
    pub buffer: usize,
    /// Search the whole remainder of the sequence instead of a window
    pub resync: bool,
}

impl AlignmentWindow {
    /// Create a window at `search_from` with an initial buffer.
    pub fn new(search_from: usize, buffer: usize) -> Self {
        Self {
            search_from,
            buffer,
            resync: false,
        }
    }

    /// Search the remainder of the sequence.
    pub fn with_resync(mut self, resync: bool) -> Self {
        self.resync = resync;
        self
    }
}

/// A located unit.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AlignmentResult {
    /// First matched sequence index
    pub best_match_start: usize,
    /// Last matched sequence index (inclusive)
    pub best_match_end: usize,
    /// Edits needed to turn the match into the target
    pub edit_distance: usize,
    /// `1 - edit_distance / max(1, len(target))`
    pub similarity: f64,
    /// Buffer of the window that produced this result
    pub buffer: usize,
}

impl AlignmentResult {
    /// Half-open range of the match.
    pub fn range(&self) -> std::ops::Range<usize> {
        self.best_match_start..self.best_match_end + 1
    }
}

/// Result of a windowed search.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum SearchOutcome {
    /// The target was located (acceptance is up to the caller)
    Match(AlignmentResult),
    /// The window held no alignment at all
    NoMatch,
}

impl SearchOutcome {
    /// The result, if any.
    pub fn result(&self) -> Option<&AlignmentResult> {
        match self {
            SearchOutcome::Match(result) => Some(result),
            SearchOutcome::NoMatch => None,
        }
    }

    /// Keep the match only when it reaches `min_similarity`.
    pub fn accepted(self, min_similarity: f64) -> SearchOutcome {
        match self {
            SearchOutcome::Match(result) if result.similarity >= min_similarity => self,
            _ => SearchOutcome::NoMatch,
        }
    }
}

/// Locate `target` in `sequence` starting at the window's cursor.
///
/// # Errors
///
/// An empty target is [`Error::DegenerateInput`]; callers skip units without
/// comparable text before searching.
///
/// # Examples
///
/// ```
/// use glyph_anchor::align::{search, AlignmentWindow, SearchOutcome};
/// use glyph_anchor::text::EquivalenceTable;
///
/// let target: Vec<char> = "dan".chars().collect();
/// let sequence: Vec<char> = "Dobardan.".chars().collect();
/// let window = AlignmentWindow::new(5, 1);
///
/// match search(&target, &sequence, &window, &EquivalenceTable::new()).unwrap() {
///     SearchOutcome::Match(result) => {
///         assert_eq!((result.best_match_start, result.best_match_end), (5, 7));
///         assert_eq!(result.similarity, 1.0);
///     },
///     SearchOutcome::NoMatch => unreachable!(),
/// }
/// ```
pub fn search(
    target: &[char],
    sequence: &[char],
    window: &AlignmentWindow,
    equivalences: &EquivalenceTable,
) -> Result<SearchOutcome> {
    if target.is_empty() {
        return Err(Error::DegenerateInput);
    }

    let from = window.search_from;
    let n = sequence.len();
    if from >= n {
        return Ok(SearchOutcome::NoMatch);
    }

    let mut buffer = window.buffer;
    let mut previous = 0.0_f64;
    let mut best: Option<AlignmentResult> = None;

    loop {
        let end = if window.resync {
            n
        } else {
            from.saturating_add(target.len()).saturating_add(buffer).min(n)
        };

        let alignment = align(target, &sequence[from..end], AlignMode::Infix, equivalences);
        let current = similarity(alignment.edit_distance, target.len());

        if let Some((start, stop)) = alignment.primary_location() {
            if best.map_or(true, |b| current > b.similarity) {
                best = Some(AlignmentResult {
                    best_match_start: from + start,
                    best_match_end: from + stop,
                    edit_distance: alignment.edit_distance,
                    similarity: current,
                    buffer,
                });
            }
        }

        if end == n || !(current > previous && current < 1.0) {
            break;
        }
        previous = current;
        buffer += 1;
    }

    Ok(match best {
        Some(result) => SearchOutcome::Match(result),
        None => SearchOutcome::NoMatch,
    })
}

//! Per-document alignment statistics.

use crate::structure::{TextTree, UnitKind};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// What happened to one document.
///
/// Unit-level failures never surface as errors; they are counted here and
/// logged once per document.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AlignmentSummary {
    /// Document identifier
    pub document_id: String,
    /// Glyphs delivered by the glyph source
    pub glyphs_total: usize,
    /// Glyphs left after cropping and preprocessing
    pub glyphs_kept: usize,
    /// Word and punctuation units in the reference tree
    pub leaves_total: usize,
    /// Leaves that received coordinates
    pub resolved_leaves: usize,
    /// Leaves left without coordinates
    pub unresolved_leaves: usize,
    /// Units searched for but not accepted, by kind
    pub rejected_by_kind: BTreeMap<String, usize>,
    /// Units skipped because they have no comparable text
    pub skipped_empty: usize,
    /// Notes skipped because of their subtype
    pub ignored_notes: usize,
    /// Notes located in the glyph stream
    pub matched_notes: usize,
    /// Glyph characters excised as noise runs before descending into a
    /// located container
    pub noise_chars_removed: usize,
}

impl AlignmentSummary {
    /// Create an empty summary for a document.
    pub fn new(document_id: impl Into<String>) -> Self {
        Self {
            document_id: document_id.into(),
            ..Default::default()
        }
    }

    /// Count a rejected unit.
    pub fn record_rejection(&mut self, kind: UnitKind) {
        *self.rejected_by_kind.entry(kind.to_string()).or_insert(0) += 1;
    }

    /// Total number of rejected units.
    pub fn rejected(&self) -> usize {
        self.rejected_by_kind.values().sum()
    }

    /// Fill in the leaf counts from an aligned tree.
    pub fn count_leaves(&mut self, tree: &TextTree) {
        self.leaves_total = 0;
        self.resolved_leaves = 0;
        for id in tree.leaves() {
            self.leaves_total += 1;
            if tree.unit(id).is_resolved() {
                self.resolved_leaves += 1;
            }
        }
        self.unresolved_leaves = self.leaves_total - self.resolved_leaves;
    }

    /// Fraction of leaves that received coordinates (1.0 for a tree without
    /// leaves).
    pub fn coverage(&self) -> f64 {
        if self.leaves_total == 0 {
            1.0
        } else {
            self.resolved_leaves as f64 / self.leaves_total as f64
        }
    }

    /// Write the summary to the log at info level.
    pub fn log(&self) {
        log::info!(
            "{}: {}/{} leaves resolved ({:.1}%), {} rejected {:?}, {} empty, {} notes matched, {} ignored, {}/{} glyphs kept, {} noise characters excised",
            self.document_id,
            self.resolved_leaves,
            self.leaves_total,
            self.coverage() * 100.0,
            self.rejected(),
            self.rejected_by_kind,
            self.skipped_empty,
            self.matched_notes,
            self.ignored_notes,
            self.glyphs_kept,
            self.glyphs_total,
            self.noise_chars_removed
        );
    }
}

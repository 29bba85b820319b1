//! Top-down alignment of a reference tree against a glyph stream.
//!
//! Every container is searched inside the glyph span resolved for its
//! parent, and its children are then searched inside the container's own
//! span. A scope tracks the cursor of one such span: siblings are searched
//! in document order, each starting where the previous accepted sibling
//! ended.
//!
//! ```text
//! root scope (whole stream)
//!   seg ──► span ──► sentence scope
//!                      s ──► span ──► word scope
//!                                       w, pc ──► CoordinateSpan
//! ```
//!
//! A rejected unit leaves the cursor where it was and makes the next sibling
//! search the rest of the scope. Nothing is retried.

use super::summary::AlignmentSummary;
use super::AlignmentContext;
use crate::align::noise::{noise_indices, retain_unremoved, tolerance};
use crate::align::{align, search, AlignMode, AlignmentResult, AlignmentWindow, SearchOutcome};
use crate::config::{Level, LevelConfig};
use crate::error::{Error, Result};
use crate::glyph::{owning_glyphs, span_chars, Glyph, SpanChar};
use crate::structure::{NodeId, TextTree, TextUnit, UnitKind};
use crate::text::{LanguageHint, ScriptLens};
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};

/// Glyph characters a group of siblings is searched in.
#[derive(Debug)]
pub struct Scope {
    chars: Vec<SpanChar>,
    views: HashMap<ScriptLens, Vec<char>>,
    cursor: usize,
    resync: bool,
    searched: usize,
    is_root: bool,
}

impl Scope {
    /// Scope over the whole glyph stream.
    pub fn root(glyphs: &[Glyph]) -> Self {
        Self {
            is_root: true,
            ..Self::new(span_chars(glyphs))
        }
    }

    /// Scope over a resolved span.
    pub fn new(chars: Vec<SpanChar>) -> Self {
        Self {
            chars,
            views: HashMap::new(),
            cursor: 0,
            resync: false,
            searched: 0,
            is_root: false,
        }
    }

    /// Characters of the scope as extracted.
    pub fn chars(&self) -> &[SpanChar] {
        &self.chars
    }

    /// Index the next sibling is searched from.
    pub fn cursor(&self) -> usize {
        self.cursor
    }

    /// Characters of the scope seen through a lens.
    fn view(&mut self, lens: ScriptLens) -> &[char] {
        let chars = &self.chars;
        self.views
            .entry(lens)
            .or_insert_with(|| lens.apply_all(chars.iter().map(|c| c.ch)))
    }
}

/// Aligns one reference tree.
pub struct HierarchicalAligner<'a> {
    context: &'a AlignmentContext,
    hint: &'a dyn LanguageHint,
    cancel: Option<&'a AtomicBool>,
    document_id: String,
}

impl<'a> HierarchicalAligner<'a> {
    /// Create an aligner using `hint` to pick comparison lenses.
    pub fn new(context: &'a AlignmentContext, hint: &'a dyn LanguageHint) -> Self {
        Self {
            context,
            hint,
            cancel: None,
            document_id: String::new(),
        }
    }

    /// Abandon the tree with [`Error::Cancelled`] once `flag` is set.
    pub fn with_cancel_flag(mut self, flag: &'a AtomicBool) -> Self {
        self.cancel = Some(flag);
        self
    }

    /// Name the document in logs, summaries and errors.
    pub fn with_document_id(mut self, document_id: impl Into<String>) -> Self {
        self.document_id = document_id.into();
        self
    }

    /// Align `tree` against `glyphs`, attaching coordinates to resolved
    /// leaves.
    ///
    /// Coordinates already present on the tree are cleared first, so the
    /// result depends only on the inputs.
    pub fn align_tree(&self, tree: &mut TextTree, glyphs: &[Glyph]) -> Result<AlignmentSummary> {
        let mut summary = AlignmentSummary::new(self.document_id.clone());
        for id in tree.leaves().collect::<Vec<_>>() {
            tree.unit_mut(id).coordinates = None;
        }

        let mut scope = Scope::root(glyphs);
        let inherited = self.context.normalizer().fallback_lens();
        for id in tree.roots().to_vec() {
            self.visit(tree, glyphs, id, &mut scope, inherited, &mut summary)?;
        }

        summary.count_leaves(tree);
        Ok(summary)
    }

    fn visit(
        &self,
        tree: &mut TextTree,
        glyphs: &[Glyph],
        id: NodeId,
        scope: &mut Scope,
        inherited: ScriptLens,
        summary: &mut AlignmentSummary,
    ) -> Result<()> {
        self.check_cancelled()?;

        let config = self.context.config();
        let kind = tree.unit(id).kind;
        let parent_kind = tree.unit(id).parent.map(|p| tree.unit(p).kind);
        let params = config.level(Level::of(kind, parent_kind));
        let lens = self
            .context
            .normalizer()
            .lens_for_unit(tree, id, self.hint, inherited);

        if kind.is_container() && !params.searched {
            return self.visit_children(tree, glyphs, id, scope, lens, summary);
        }

        if kind == UnitKind::Note && self.is_ignored(tree.unit(id)) {
            log::debug!("Skipping {} note '{}'", tree.unit(id).subtype.as_deref().unwrap_or(""), tree.unit(id).id);
            summary.ignored_notes += 1;
            return Ok(());
        }

        let target = lens.apply_all(tree.emitted_text(id).chars().filter(|c| !c.is_whitespace()));
        if target.is_empty() {
            log::debug!("Skipping {} '{}' without text", kind, tree.unit(id).id);
            summary.skipped_empty += 1;
            return Ok(());
        }

        let window = AlignmentWindow::new(scope.cursor, params.initial_buffer(target.len(), scope.searched == 0))
            .with_resync(scope.resync || (scope.is_root && scope.searched < config.leading_resync));
        scope.searched += 1;
        scope.resync = false;

        let outcome = search(&target, scope.view(lens), &window, self.context.equivalences())?
            .accepted(params.min_similarity);
        let result = match outcome {
            SearchOutcome::Match(result) => result,
            SearchOutcome::NoMatch => {
                log::debug!(
                    "{} '{}' not located from {} (resync={})",
                    kind,
                    tree.unit(id).id,
                    window.search_from,
                    window.resync
                );
                summary.record_rejection(kind);
                scope.resync = true;
                return Ok(());
            },
        };

        log::debug!(
            "{} '{}' at {}..={} (similarity {:.3})",
            kind,
            tree.unit(id).id,
            result.best_match_start,
            result.best_match_end,
            result.similarity
        );
        scope.cursor = result.best_match_end + 1;

        match kind {
            UnitKind::Word | UnitKind::Punctuation => {
                let owners = owning_glyphs(&scope.chars[result.range()]);
                tree.unit_mut(id).coordinates = self.context.synthesizer().synthesize(glyphs, &owners);
            },
            UnitKind::Note => {
                summary.matched_notes += 1;
            },
            UnitKind::Section | UnitKind::Segment | UnitKind::Sentence => {
                let mut inner = self.inner_scope(glyphs, scope, &result, &target, lens, params, summary);
                self.visit_children(tree, glyphs, id, &mut inner, lens, summary)?;
            },
        }
        Ok(())
    }

    fn visit_children(
        &self,
        tree: &mut TextTree,
        glyphs: &[Glyph],
        id: NodeId,
        scope: &mut Scope,
        lens: ScriptLens,
        summary: &mut AlignmentSummary,
    ) -> Result<()> {
        for child in tree.children(id).to_vec() {
            self.visit(tree, glyphs, child, scope, lens, summary)?;
        }
        Ok(())
    }

    /// Scope the children of a located container are searched in.
    ///
    /// The matched range is widened on both sides when the match was not
    /// exact or when it crosses a page. Levels with a noise filter then drop
    /// the insertion runs the container's text does not account for.
    fn inner_scope(
        &self,
        glyphs: &[Glyph],
        scope: &mut Scope,
        result: &AlignmentResult,
        target: &[char],
        lens: ScriptLens,
        params: &LevelConfig,
        summary: &mut AlignmentSummary,
    ) -> Scope {
        let config = self.context.config();
        let mut slop = 0;
        if result.similarity < config.exact_threshold {
            if let Some(cap) = params.exact_slop_cap {
                slop = cap.min(target.len() / 2);
            }
        }
        if let Some(extra) = params.page_break_slop {
            if crosses_page(glyphs, &scope.chars[result.range()]) {
                slop = slop.max(result.buffer + extra);
            }
        }

        let lo = result.best_match_start.saturating_sub(slop);
        let hi = (result.best_match_end + 1 + slop).min(scope.chars.len());
        let chars = &scope.chars[lo..hi];

        if !params.noise_filter {
            return Scope::new(chars.to_vec());
        }

        let chars = chars.to_vec();
        let trace = align(target, &scope.view(lens)[lo..hi], AlignMode::Global, self.context.equivalences()).trace;
        let removed = noise_indices(&trace, tolerance(target.len(), config.noise_tolerance_cap));
        if !removed.is_empty() {
            log::debug!("Dropped {} noise characters from {}..{}", removed.len(), lo, hi);
            summary.noise_chars_removed += removed.len();
        }
        Scope::new(retain_unremoved(&chars, &removed))
    }

    fn is_ignored(&self, unit: &TextUnit) -> bool {
        unit.subtype
            .as_deref()
            .map_or(false, |subtype| self.context.config().ignored_note_subtypes.iter().any(|s| s == subtype))
    }

    fn check_cancelled(&self) -> Result<()> {
        match self.cancel {
            Some(flag) if flag.load(Ordering::Relaxed) => Err(Error::Cancelled(self.document_id.clone())),
            _ => Ok(()),
        }
    }
}

fn crosses_page(glyphs: &[Glyph], chars: &[SpanChar]) -> bool {
    match (chars.first(), chars.last()) {
        (Some(first), Some(last)) => glyphs[first.glyph].page_number != glyphs[last.glyph].page_number,
        _ => false,
    }
}

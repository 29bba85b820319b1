//! Document alignment pipeline.
//!
//! ```text
//! GlyphSource ──► Vec<Glyph> ──► [GlyphPreprocessor] (noise, filler runs,
//!                                       │              session crop)
//!                                       ↓
//! ReferenceSource ──► TeiDocument ──► [HierarchicalAligner]
//!                                       ↓
//!                                 AlignedDocument
//!                                   ├─ annotated TEI (resolved leaves carry coordinates)
//!                                   ├─ CoordinateIndex (id → page rectangles)
//!                                   └─ AlignmentSummary (logged at info level)
//! ```
//!
//! # Key Design Principles
//!
//! 1. **One context per run**: [`AlignmentContext`] is built once from an
//!    [`AlignerConfig`] and shared read-only by every document.
//!
//! 2. **Local failures**: a unit that cannot be located is counted in the
//!    summary and the rest of the document proceeds. Only unusable inputs
//!    fail a document.
//!
//! 3. **Sequential documents**: a single document is aligned in strict
//!    document order. Parallelism happens across documents in
//!    [`batch::BatchRunner`].

pub mod batch;
pub mod hierarchical;
pub mod sink;
pub mod summary;

pub use batch::{BatchReport, BatchRunner, DocumentReport};
pub use hierarchical::{HierarchicalAligner, Scope};
pub use sink::{DirectorySink, DocumentSink};
pub use summary::AlignmentSummary;

use crate::config::AlignerConfig;
use crate::coordinates::{CoordinateIndex, CoordinateSynthesizer};
use crate::error::{Error, Result};
use crate::glyph::{Glyph, GlyphPreprocessor, GlyphSource};
use crate::structure::{annotate_tei, ReferenceSource, TeiDocument};
use crate::text::{EquivalenceTable, LanguageHint, ScriptNormalizer, UnitLanguage};
use std::sync::atomic::{AtomicBool, Ordering};

/// Everything derived from an [`AlignerConfig`] that alignment needs.
#[derive(Debug, Clone)]
pub struct AlignmentContext {
    config: AlignerConfig,
    normalizer: ScriptNormalizer,
    equivalences: EquivalenceTable,
    preprocessor: GlyphPreprocessor,
    synthesizer: CoordinateSynthesizer,
}

impl AlignmentContext {
    /// Validate `config` and build the context.
    pub fn new(config: AlignerConfig) -> Result<Self> {
        config.validate()?;

        let preprocessor = GlyphPreprocessor::new()
            .with_noise_chars(config.noise_chars.iter().copied())
            .with_collapse_chars(config.collapse_chars.iter().copied())
            .with_session_top_margin(config.session_top_margin);

        Ok(Self {
            normalizer: ScriptNormalizer::new(config.normalizer.clone()),
            equivalences: EquivalenceTable::from_pairs(&config.equivalences),
            synthesizer: CoordinateSynthesizer::new(config.break_threshold),
            preprocessor,
            config,
        })
    }

    /// The configuration this context was built from.
    pub fn config(&self) -> &AlignerConfig {
        &self.config
    }

    /// Lens selection.
    pub fn normalizer(&self) -> &ScriptNormalizer {
        &self.normalizer
    }

    /// Characters that compare as equal.
    pub fn equivalences(&self) -> &EquivalenceTable {
        &self.equivalences
    }

    /// Glyph cleanup.
    pub fn preprocessor(&self) -> &GlyphPreprocessor {
        &self.preprocessor
    }

    /// Coordinate synthesis.
    pub fn synthesizer(&self) -> &CoordinateSynthesizer {
        &self.synthesizer
    }
}

/// A reference document with coordinates attached.
#[derive(Debug, Clone)]
pub struct AlignedDocument {
    /// Document identifier
    pub document_id: String,
    /// Source XML and the aligned tree
    pub document: TeiDocument,
    /// What happened during alignment
    pub summary: AlignmentSummary,
}

impl AlignedDocument {
    /// The source XML with coordinate attributes on resolved leaves.
    pub fn annotated_xml(&self) -> Result<String> {
        annotate_tei(&self.document.source, &self.document.tree)
    }

    /// Page rectangles of every resolved leaf, in document order.
    pub fn coordinate_index(&self) -> CoordinateIndex {
        CoordinateIndex::from_tree(&self.document.tree)
    }
}

/// Aligns whole documents: load, clean, align, summarize.
///
/// # Examples
///
/// ```
/// use glyph_anchor::config::AlignerConfig;
/// use glyph_anchor::glyph::Glyph;
/// use glyph_anchor::pipeline::DocumentAligner;
/// use glyph_anchor::structure::TeiDocument;
///
/// let glyphs: Vec<Glyph> = "Hvala."
///     .chars()
///     .enumerate()
///     .map(|(i, c)| Glyph::new(c.to_string(), i as f32 * 5.0, 100.0, i as f32 * 5.0 + 5.0, 110.0, 1))
///     .collect();
/// let tei = TeiDocument::parse(
///     r#"<seg xml:id="g1"><s xml:id="s1"><w xml:id="w1">Hvala</w><pc xml:id="p1">.</pc></s></seg>"#,
/// )
/// .unwrap();
///
/// let aligner = DocumentAligner::new(AlignerConfig::default()).unwrap();
/// let aligned = aligner.align_loaded("doc", glyphs, tei, None).unwrap();
/// assert_eq!(aligned.summary.resolved_leaves, 2);
/// assert!(aligned.annotated_xml().unwrap().contains(r#"fromPage="0""#));
/// ```
pub struct DocumentAligner {
    context: AlignmentContext,
    hint: Box<dyn LanguageHint>,
}

impl DocumentAligner {
    /// Create an aligner reading language tags from the reference units.
    pub fn new(config: AlignerConfig) -> Result<Self> {
        Ok(Self::with_context(AlignmentContext::new(config)?))
    }

    /// Create an aligner from a prepared context.
    pub fn with_context(context: AlignmentContext) -> Self {
        Self {
            context,
            hint: Box::new(UnitLanguage),
        }
    }

    /// Use a different source of language tags.
    pub fn with_language_hint(mut self, hint: impl LanguageHint + 'static) -> Self {
        self.hint = Box::new(hint);
        self
    }

    /// The shared alignment context.
    pub fn context(&self) -> &AlignmentContext {
        &self.context
    }

    /// Load and align one document.
    ///
    /// # Errors
    ///
    /// [`Error::Extraction`] when the glyphs cannot be loaded and
    /// [`Error::Schema`] when the reference tree is malformed.
    pub fn align(
        &self,
        document_id: &str,
        glyphs: &dyn GlyphSource,
        references: &dyn ReferenceSource,
    ) -> Result<AlignedDocument> {
        self.align_with_cancel(document_id, glyphs, references, None)
    }

    /// Load and align one document, giving up once `cancel` is set.
    pub fn align_with_cancel(
        &self,
        document_id: &str,
        glyphs: &dyn GlyphSource,
        references: &dyn ReferenceSource,
        cancel: Option<&AtomicBool>,
    ) -> Result<AlignedDocument> {
        if cancel.map_or(false, |flag| flag.load(Ordering::Relaxed)) {
            return Err(Error::Cancelled(document_id.to_string()));
        }
        let document = references.load_reference(document_id)?;
        let glyphs = glyphs.load_glyphs(document_id)?;
        self.align_loaded(document_id, glyphs, document, cancel)
    }

    /// Align a document whose inputs are already in memory.
    pub fn align_loaded(
        &self,
        document_id: &str,
        glyphs: Vec<Glyph>,
        mut document: TeiDocument,
        cancel: Option<&AtomicBool>,
    ) -> Result<AlignedDocument> {
        let glyphs_total = glyphs.len();
        let glyphs = self.prepare_glyphs(glyphs, &document);

        let mut aligner = HierarchicalAligner::new(&self.context, self.hint.as_ref()).with_document_id(document_id);
        if let Some(flag) = cancel {
            aligner = aligner.with_cancel_flag(flag);
        }
        let mut summary = aligner.align_tree(&mut document.tree, &glyphs)?;
        summary.glyphs_total = glyphs_total;
        summary.glyphs_kept = glyphs.len();
        summary.log();

        Ok(AlignedDocument {
            document_id: document_id.to_string(),
            document,
            summary,
        })
    }

    fn prepare_glyphs(&self, glyphs: Vec<Glyph>, document: &TeiDocument) -> Vec<Glyph> {
        let preprocessor = self.context.preprocessor();
        let glyphs = preprocessor.preprocess(glyphs);
        if !self.context.config().crop_to_session {
            return glyphs;
        }

        match (document.first_note_text(), document.last_note_text()) {
            (Some(start), Some(end)) => {
                preprocessor.crop_to_session(glyphs, start, end, self.context.equivalences())
            },
            _ => {
                log::warn!("Session crop requested but the reference has no notes; keeping all glyphs");
                glyphs
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::CorpusProfile;

    fn glyph_line(text: &str, top: f32, page: u32) -> Vec<Glyph> {
        text.chars()
            .enumerate()
            .map(|(i, c)| {
                let x = i as f32 * 6.0;
                Glyph::new(c.to_string(), x, top, x + 6.0, top + 10.0, page)
            })
            .collect()
    }

    #[test]
    fn test_context_rejects_invalid_config() {
        let config = AlignerConfig::default().with_break_threshold(0.0);
        assert!(matches!(AlignmentContext::new(config), Err(Error::Config(_))));
    }

    #[test]
    fn test_context_from_profile() {
        let context = AlignmentContext::new(CorpusProfile::Carniolan.create_config()).unwrap();
        assert!(context.equivalences().equivalent('m', 'n'));
        assert_eq!(context.synthesizer().break_threshold(), 4.0);
    }

    #[test]
    fn test_session_crop_drops_front_matter() {
        let tei = TeiDocument::parse(concat!(
            r#"<div><note>Seja</note>"#,
            r#"<s xml:id="s1"><w xml:id="w1">danes</w></s>"#,
            r#"<note>Konec</note></div>"#
        ))
        .unwrap();

        let mut glyphs = glyph_line("danes", 100.0, 1);
        glyphs.extend(glyph_line("Seja", 100.0, 2));
        glyphs.extend(glyph_line("danes", 120.0, 2));
        glyphs.extend(glyph_line("Konec", 140.0, 2));

        let aligner = DocumentAligner::new(CorpusProfile::Carniolan.create_config()).unwrap();
        let aligned = aligner.align_loaded("dzk", glyphs, tei, None).unwrap();

        assert_eq!(aligned.summary.glyphs_total, 19);
        assert_eq!(aligned.summary.glyphs_kept, 14);
        let w1 = aligned.document.tree.find("w1").unwrap();
        let span = aligned.document.tree.unit(w1).coordinates.clone().unwrap();
        assert_eq!(span.from_page, 1);
    }

    #[test]
    fn test_cancelled_before_loading() {
        struct NoGlyphs;
        impl GlyphSource for NoGlyphs {
            fn load_glyphs(&self, document_id: &str) -> Result<Vec<Glyph>> {
                Err(Error::extraction(document_id, "unreachable"))
            }
        }
        struct NoReference;
        impl ReferenceSource for NoReference {
            fn load_reference(&self, document_id: &str) -> Result<TeiDocument> {
                Err(Error::schema(document_id, "unreachable"))
            }
        }

        let aligner = DocumentAligner::new(AlignerConfig::default()).unwrap();
        let flag = AtomicBool::new(true);
        let err = aligner
            .align_with_cancel("d", &NoGlyphs, &NoReference, Some(&flag))
            .unwrap_err();
        assert!(matches!(err, Error::Cancelled(_)));
        assert!(aligner.align("d", &NoGlyphs, &NoReference).unwrap_err().is_document_error());
    }
}

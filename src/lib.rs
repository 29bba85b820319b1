// Allow some clippy lints that are too pedantic for this project
#![allow(clippy::too_many_arguments)]
#![allow(clippy::needless_range_loop)]
#![allow(clippy::unnecessary_map_or)]
// Allow unused for tests
#![cfg_attr(test, allow(dead_code))]

//! # Glyph Anchor
//!
//! Attaches page coordinates to the tokens of linguistically annotated
//! reference documents by aligning them against the glyph stream extracted
//! from the corresponding PDF pages.
//!
//! The reference text (TEI) is clean and tokenized; the glyph stream is
//! positional but noisy: OCR substitutions, stray symbols, filler runs, mixed
//! Cyrillic and Latin script, page furniture. Alignment is fuzzy and
//! hierarchical: segments are located in the whole stream, sentences inside
//! their segment's span and words inside their sentence's span.
//!
//! ## Core Features
//!
//! - **Fuzzy Alignment**: infix and global edit distance with a configurable
//!   character equivalence relation
//! - **Windowed Search**: greedy window growth from a monotonic cursor, with
//!   resynchronization after a failed unit
//! - **Script Lenses**: Cyrillic/Latin transliteration, case and diacritic
//!   folding, chosen per unit from language tags
//! - **Coordinates**: corner lists split at line and page breaks, written back
//!   into the TEI and exported as a JSON index
//! - **Batch Runs**: one document per worker, atomic outputs, cancellation
//!
//! ## Quick Start
//!
//! ```no_run
//! use glyph_anchor::config::CorpusProfile;
//! use glyph_anchor::glyph::DirectoryGlyphSource;
//! use glyph_anchor::pipeline::{DirectorySink, DocumentAligner, DocumentSink};
//! use glyph_anchor::structure::DirectoryTeiSource;
//!
//! # fn main() -> glyph_anchor::Result<()> {
//! let aligner = DocumentAligner::new(CorpusProfile::Yugoslav.create_config())?;
//! let aligned = aligner.align(
//!     "session-1950-03-01",
//!     &DirectoryGlyphSource::new("glyphs"),
//!     &DirectoryTeiSource::new("tei"),
//! )?;
//! println!("{} of {} tokens resolved", aligned.summary.resolved_leaves, aligned.summary.leaves_total);
//!
//! DirectorySink::create("out")?.write(&aligned)?;
//! # Ok(())
//! # }
//! ```

#![warn(missing_docs)]

// Error handling
pub mod error;

// Configuration
pub mod config;

// Page geometry
pub mod geometry;

// Inputs
pub mod glyph;
pub mod structure;

// Comparison lenses
pub mod text;

// Alignment
pub mod align;
pub mod coordinates;

// Document and batch orchestration
pub mod pipeline;

// Re-exports
pub use config::{AlignerConfig, CorpusProfile, Level, LevelConfig};
pub use coordinates::{CoordinateIndex, CoordinateSpan, CoordinateSynthesizer};
pub use error::{Error, Result};
pub use glyph::{Glyph, GlyphSource};
pub use pipeline::{AlignedDocument, AlignmentSummary, BatchRunner, DocumentAligner};
pub use structure::{ReferenceSource, TeiDocument, TextTree, TextUnit, UnitKind};
pub use text::LanguageHint;

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

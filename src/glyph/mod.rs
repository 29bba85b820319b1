//! Positioned glyphs and the sources they are loaded from.
//!
//! A glyph is one rendered character from a layout-extracted document. Glyph
//! extraction itself happens outside this crate; glyphs arrive as a JSON dump
//! whose field names match the character dictionaries produced by common
//! layout extractors (`text`, `x0`, `x1`, `top`, `bottom`, `page_number`, ...).

pub mod preprocess;

pub use preprocess::{GlyphPreprocessor, SessionBounds};

use crate::error::{Error, Result};
use crate::geometry::Rect;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

/// A single character with its position on a page.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Glyph {
    /// The rendered text (normally one character)
    pub text: String,
    /// Left edge
    pub x0: f32,
    /// Lower edge in bottom-up page space
    pub y0: f32,
    /// Right edge
    pub x1: f32,
    /// Upper edge in bottom-up page space
    pub y1: f32,
    /// Distance from the top of the page to the glyph's top edge
    pub top: f32,
    /// Distance from the top of the page to the glyph's bottom edge
    pub bottom: f32,
    /// Page the glyph sits on (1-based)
    pub page_number: u32,
}

impl Glyph {
    /// Create a glyph with a top-down bounding box on a page.
    ///
    /// `y0`/`y1` are filled with the same values as `top`/`bottom`; callers
    /// that need the bottom-up values set them explicitly.
    ///
    /// # Examples
    ///
    /// ```
    /// use glyph_anchor::glyph::Glyph;
    ///
    /// let g = Glyph::new("a", 10.0, 100.0, 15.0, 110.0, 1);
    /// assert_eq!(g.page_number, 1);
    /// assert_eq!(g.bbox().right(), 15.0);
    /// ```
    pub fn new(text: impl Into<String>, x0: f32, top: f32, x1: f32, bottom: f32, page_number: u32) -> Self {
        Self {
            text: text.into(),
            x0,
            y0: top,
            x1,
            y1: bottom,
            top,
            bottom,
            page_number,
        }
    }

    /// Top-down bounding box of the glyph.
    pub fn bbox(&self) -> Rect {
        Rect::from_points(self.x0, self.top, self.x1, self.bottom)
    }

    /// Whether the glyph carries no visible text.
    pub fn is_blank(&self) -> bool {
        self.text.chars().all(char::is_whitespace)
    }

    /// 0-based page index.
    pub fn page_index(&self) -> u32 {
        self.page_number.saturating_sub(1)
    }
}

/// One comparable character of a glyph sequence, tagged with its owning glyph.
///
/// Alignment works on characters while coordinates come from glyphs. A
/// glyph normally yields exactly one `SpanChar`; ligature glyphs yield one per
/// character, all pointing at the same glyph.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SpanChar {
    /// The character as extracted
    pub ch: char,
    /// Index of the owning glyph in the document's glyph vector
    pub glyph: usize,
}

/// Flatten glyphs into comparable characters, skipping whitespace.
///
/// # Examples
///
/// ```
/// use glyph_anchor::glyph::{span_chars, Glyph};
///
/// let glyphs = vec![
///     Glyph::new("ﬁ", 0.0, 0.0, 5.0, 10.0, 1),
///     Glyph::new(" ", 5.0, 0.0, 7.0, 10.0, 1),
///     Glyph::new("x", 7.0, 0.0, 12.0, 10.0, 1),
/// ];
/// let chars = span_chars(&glyphs);
/// assert_eq!(chars.len(), 2);
/// assert_eq!(chars[1].glyph, 2);
/// ```
pub fn span_chars(glyphs: &[Glyph]) -> Vec<SpanChar> {
    glyphs
        .iter()
        .enumerate()
        .flat_map(|(idx, glyph)| {
            glyph
                .text
                .chars()
                .filter(|c| !c.is_whitespace())
                .map(move |ch| SpanChar { ch, glyph: idx })
        })
        .collect()
}

/// Indices of the glyphs covered by a run of span characters, in order and
/// without repeats.
pub fn owning_glyphs(chars: &[SpanChar]) -> Vec<usize> {
    let mut owners: Vec<usize> = Vec::with_capacity(chars.len());
    for c in chars {
        if owners.last() != Some(&c.glyph) {
            owners.push(c.glyph);
        }
    }
    owners
}

/// Supplies the ordered glyph stream of a document.
pub trait GlyphSource: Send + Sync {
    /// Load all glyphs of a document in reading order.
    ///
    /// Missing or corrupt sources fail with [`Error::Extraction`].
    fn load_glyphs(&self, document_id: &str) -> Result<Vec<Glyph>>;
}

/// Parse a glyph dump.
///
/// Accepts either a single JSON array of glyph objects or JSON Lines (one
/// glyph object per line). Unknown fields are ignored.
pub fn parse_glyph_dump(document_id: &str, content: &str) -> Result<Vec<Glyph>> {
    let trimmed = content.trim_start();
    if trimmed.starts_with('[') {
        return serde_json::from_str(trimmed).map_err(|e| Error::extraction(document_id, e));
    }

    let mut glyphs = Vec::new();
    for (line_no, line) in content.lines().enumerate() {
        let line = line.trim();
        if line.is_empty() {
            continue;
        }
        let glyph: Glyph = serde_json::from_str(line)
            .map_err(|e| Error::extraction(document_id, format!("line {}: {}", line_no + 1, e)))?;
        glyphs.push(glyph);
    }
    Ok(glyphs)
}

/// Loads glyph dumps from a directory, one file per document.
///
/// The file for document `id` is the first existing one of
/// `<dir>/<id>.chars.json`, `<dir>/<id>.chars.jsonl`, `<dir>/<id>.json`.
#[derive(Debug, Clone)]
pub struct DirectoryGlyphSource {
    dir: PathBuf,
}

impl DirectoryGlyphSource {
    const SUFFIXES: [&'static str; 3] = [".chars.json", ".chars.jsonl", ".json"];

    /// Create a source rooted at `dir`.
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    /// Directory glyph dumps are read from.
    pub fn dir(&self) -> &Path {
        &self.dir
    }

    fn locate(&self, document_id: &str) -> Option<PathBuf> {
        Self::SUFFIXES
            .iter()
            .map(|suffix| self.dir.join(format!("{}{}", document_id, suffix)))
            .find(|path| path.is_file())
    }
}

impl GlyphSource for DirectoryGlyphSource {
    fn load_glyphs(&self, document_id: &str) -> Result<Vec<Glyph>> {
        let path = self.locate(document_id).ok_or_else(|| {
            Error::extraction(
                document_id,
                format!("no glyph dump in {}", self.dir.display()),
            )
        })?;
        log::debug!("Loading glyphs for {} from {}", document_id, path.display());

        let content = fs::read_to_string(&path).map_err(|e| Error::extraction(document_id, e))?;
        let glyphs = parse_glyph_dump(document_id, &content)?;
        log::debug!("Loaded {} glyphs for {}", glyphs.len(), document_id);
        Ok(glyphs)
    }
}

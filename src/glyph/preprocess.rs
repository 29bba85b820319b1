//! Cleanup of raw glyph streams before alignment.
//!
//! Layout extraction leaves behind scanning debris: stray symbols, runs of
//! filler dots or dashes, whitespace glyphs. None of it appears in the
//! reference text, so it is removed up front. Optionally the stream is also
//! cropped to the session proper, dropping front matter before the first
//! reference note.

use super::{span_chars, Glyph};
use crate::align::{align, AlignMode};
use crate::text::EquivalenceTable;
use std::collections::HashSet;

/// Default distance above the start marker that still belongs to the session.
pub const DEFAULT_SESSION_TOP_MARGIN: f32 = 10.0;

/// Removes noise glyphs and collapses filler runs.
#[derive(Debug, Clone)]
pub struct GlyphPreprocessor {
    noise_chars: HashSet<char>,
    collapse_chars: HashSet<char>,
    session_top_margin: f32,
}

impl GlyphPreprocessor {
    /// Create a preprocessor that only drops whitespace glyphs.
    pub fn new() -> Self {
        Self {
            noise_chars: HashSet::new(),
            collapse_chars: HashSet::new(),
            session_top_margin: DEFAULT_SESSION_TOP_MARGIN,
        }
    }

    /// Set the characters whose glyphs are dropped.
    pub fn with_noise_chars<I: IntoIterator<Item = char>>(mut self, chars: I) -> Self {
        self.noise_chars = chars.into_iter().collect();
        self
    }

    /// Set the characters whose immediate repeats collapse to one glyph.
    pub fn with_collapse_chars<I: IntoIterator<Item = char>>(mut self, chars: I) -> Self {
        self.collapse_chars = chars.into_iter().collect();
        self
    }

    /// Set the margin kept above the session start marker.
    pub fn with_session_top_margin(mut self, margin: f32) -> Self {
        self.session_top_margin = margin;
        self
    }

    /// Drop whitespace-only and noise glyphs, then collapse repeated filler
    /// glyphs, keeping the first of each run. Order is preserved.
    ///
    /// # Examples
    ///
    /// ```
    /// use glyph_anchor::glyph::{Glyph, GlyphPreprocessor};
    ///
    /// let glyphs: Vec<Glyph> = ["a", " ", "*", ".", ".", ".", "b"]
    ///     .iter()
    ///     .map(|t| Glyph::new(*t, 0.0, 0.0, 1.0, 1.0, 1))
    ///     .collect();
    /// let pre = GlyphPreprocessor::new()
    ///     .with_noise_chars(['*'])
    ///     .with_collapse_chars(['.']);
    /// let texts: Vec<String> = pre.preprocess(glyphs).into_iter().map(|g| g.text).collect();
    /// assert_eq!(texts, vec!["a", ".", "b"]);
    /// ```
    pub fn preprocess(&self, glyphs: Vec<Glyph>) -> Vec<Glyph> {
        let before = glyphs.len();
        let mut kept: Vec<Glyph> = Vec::with_capacity(before);

        for glyph in glyphs {
            if glyph.is_blank() || self.is_noise(&glyph) {
                continue;
            }
            if let Some(prev) = kept.last() {
                if prev.text == glyph.text && self.collapses(&glyph) {
                    continue;
                }
            }
            kept.push(glyph);
        }

        log::debug!("Preprocessing kept {} of {} glyphs", kept.len(), before);
        kept
    }

    /// Crop the stream to the session delimited by two marker texts.
    ///
    /// Glyphs before the first match of `start_marker` (less the top margin
    /// on its page) are dropped, as are glyphs on pages after the page of
    /// the last match of `end_marker`. The end page is never earlier than
    /// the last page of the stream. Without a locatable start marker the
    /// stream is returned unchanged.
    pub fn crop_to_session(
        &self,
        glyphs: Vec<Glyph>,
        start_marker: &str,
        end_marker: &str,
        equivalences: &EquivalenceTable,
    ) -> Vec<Glyph> {
        match SessionBounds::locate(&glyphs, start_marker, end_marker, equivalences, self.session_top_margin) {
            Some(bounds) => {
                log::debug!(
                    "Session spans pages {}..={} (start below y={})",
                    bounds.first_page,
                    bounds.last_page,
                    bounds.start_top
                );
                bounds.crop(glyphs)
            },
            None => glyphs,
        }
    }

    fn is_noise(&self, glyph: &Glyph) -> bool {
        single_char(&glyph.text).map_or(false, |c| self.noise_chars.contains(&c))
    }

    fn collapses(&self, glyph: &Glyph) -> bool {
        single_char(&glyph.text).map_or(false, |c| self.collapse_chars.contains(&c))
    }
}

impl Default for GlyphPreprocessor {
    fn default() -> Self {
        Self::new()
    }
}

fn single_char(text: &str) -> Option<char> {
    let mut chars = text.chars();
    match (chars.next(), chars.next()) {
        (Some(c), None) => Some(c),
        _ => None,
    }
}

/// Page extent of a session inside a glyph stream.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SessionBounds {
    /// Page (1-based) the session starts on
    pub first_page: u32,
    /// Glyphs on `first_page` above this `top` value are dropped
    pub start_top: f32,
    /// Last page (1-based) kept
    pub last_page: u32,
}

impl SessionBounds {
    /// Find the session delimited by two marker texts.
    ///
    /// Returns `None` when either marker is empty or the start marker cannot
    /// be located.
    pub fn locate(
        glyphs: &[Glyph],
        start_marker: &str,
        end_marker: &str,
        equivalences: &EquivalenceTable,
        top_margin: f32,
    ) -> Option<SessionBounds> {
        let start: Vec<char> = start_marker.chars().filter(|c| !c.is_whitespace()).collect();
        let end: Vec<char> = end_marker.chars().filter(|c| !c.is_whitespace()).collect();
        if start.is_empty() || end.is_empty() {
            return None;
        }

        let chars = span_chars(glyphs);
        let sequence: Vec<char> = chars.iter().map(|c| c.ch).collect();

        let start_at = align(&start, &sequence, AlignMode::Infix, equivalences)
            .primary_location()
            .map(|(s, _)| chars[s].glyph)?;
        let end_at = align(&end, &sequence, AlignMode::Infix, equivalences)
            .locations
            .last()
            .map(|&(_, e)| chars[e].glyph);

        let start_glyph = &glyphs[start_at];
        let stream_last_page = glyphs.last().map_or(start_glyph.page_number, |g| g.page_number);
        let last_page = end_at
            .map(|i| glyphs[i].page_number)
            .unwrap_or(stream_last_page)
            .max(stream_last_page);

        Some(SessionBounds {
            first_page: start_glyph.page_number,
            start_top: start_glyph.top - top_margin,
            last_page,
        })
    }

    /// Whether a glyph lies inside the session.
    pub fn contains(&self, glyph: &Glyph) -> bool {
        if glyph.page_number > self.last_page || glyph.page_number < self.first_page {
            return false;
        }
        glyph.page_number != self.first_page || glyph.top >= self.start_top
    }

    /// Keep only the glyphs inside the session.
    pub fn crop(&self, glyphs: Vec<Glyph>) -> Vec<Glyph> {
        glyphs.into_iter().filter(|g| self.contains(g)).collect()
    }
}

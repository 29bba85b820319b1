//! Coordinate synthesis for aligned tokens.
//!
//! A resolved token covers a run of glyphs. The run is turned into a list of
//! corner points: the top-left of the first glyph, the bottom-right of the
//! last glyph and, for every line or page break inside the run, the
//! bottom-right of the glyph before the break plus the top-left of the glyph
//! after it. Two consecutive corners always describe one rectangle.

use crate::geometry::Point;
use crate::glyph::Glyph;
use crate::structure::TextTree;
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

/// Default vertical distance (layout units) between two glyphs' bottoms that
/// counts as a line break.
pub const DEFAULT_BREAK_THRESHOLD: f32 = 4.0;

/// Page location of one token.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CoordinateSpan {
    /// Page of the first glyph (0-based)
    pub from_page: u32,
    /// Page of the last glyph (0-based)
    pub to_page: u32,
    /// Whether the token crosses a line or page break
    pub is_broken: bool,
    /// Corner points, two per contiguous run, rounded to two decimals
    pub corners: Vec<Point>,
}

impl CoordinateSpan {
    /// Pair corners into rectangles.
    ///
    /// The first rectangle lies on `from_page`, every later one on
    /// `to_page`.
    ///
    /// # Examples
    ///
    /// ```
    /// use glyph_anchor::coordinates::CoordinateSpan;
    /// use glyph_anchor::geometry::Point;
    ///
    /// let span = CoordinateSpan {
    ///     from_page: 0,
    ///     to_page: 1,
    ///     is_broken: true,
    ///     corners: vec![
    ///         Point::new(10.0, 690.0),
    ///         Point::new(30.0, 700.0),
    ///         Point::new(12.0, 40.0),
    ///         Point::new(25.0, 50.0),
    ///     ],
    /// };
    /// let rects = span.rects();
    /// assert_eq!(rects.len(), 2);
    /// assert_eq!(rects[0].page, 0);
    /// assert_eq!(rects[1].page, 1);
    /// ```
    pub fn rects(&self) -> Vec<PageRect> {
        self.corners
            .chunks_exact(2)
            .enumerate()
            .map(|(i, pair)| PageRect {
                page: if i == 0 { self.from_page } else { self.to_page },
                x0: pair[0].x,
                y0: pair[0].y,
                x1: pair[1].x,
                y1: pair[1].y,
            })
            .collect()
    }

    /// Attribute name/value pairs in output order: `fromPage`, `toPage`,
    /// `isBroken`, then `x0`, `y0`, `x1`, `y1`, ...
    pub fn attributes(&self) -> Vec<(String, String)> {
        let mut attrs = Vec::with_capacity(3 + self.corners.len() * 2);
        attrs.push(("fromPage".to_string(), self.from_page.to_string()));
        attrs.push(("toPage".to_string(), self.to_page.to_string()));
        attrs.push(("isBroken".to_string(), self.is_broken.to_string()));
        for (i, corner) in self.corners.iter().enumerate() {
            attrs.push((format!("x{}", i), corner.x.to_string()));
            attrs.push((format!("y{}", i), corner.y.to_string()));
        }
        attrs
    }
}

/// One rectangle of a token on a page.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PageRect {
    /// Page (0-based)
    pub page: u32,
    /// Left edge
    pub x0: f32,
    /// Top edge
    pub y0: f32,
    /// Right edge
    pub x1: f32,
    /// Bottom edge
    pub y1: f32,
}

/// Turns glyph runs into [`CoordinateSpan`]s.
#[derive(Debug, Clone, Copy)]
pub struct CoordinateSynthesizer {
    break_threshold: f32,
}

impl CoordinateSynthesizer {
    /// Create a synthesizer with a custom break threshold.
    pub fn new(break_threshold: f32) -> Self {
        Self { break_threshold }
    }

    /// Distance between bottoms that splits a token into runs.
    pub fn break_threshold(&self) -> f32 {
        self.break_threshold
    }

    /// Synthesize the span covered by `indices` (glyph indices in reading
    /// order). An empty run has no span.
    pub fn synthesize(&self, glyphs: &[Glyph], indices: &[usize]) -> Option<CoordinateSpan> {
        let run: Vec<&Glyph> = indices.iter().filter_map(|&i| glyphs.get(i)).collect();
        self.synthesize_run(&run)
    }

    /// Synthesize the span of a contiguous glyph slice.
    pub fn synthesize_slice(&self, glyphs: &[Glyph]) -> Option<CoordinateSpan> {
        let run: Vec<&Glyph> = glyphs.iter().collect();
        self.synthesize_run(&run)
    }

    fn synthesize_run(&self, run: &[&Glyph]) -> Option<CoordinateSpan> {
        let first = run.first()?;
        let last = run.last()?;

        let start = first.bbox();
        let mut corners = vec![Point::rounded(start.left(), start.top())];
        let mut is_broken = false;
        for pair in run.windows(2) {
            let (before, after) = (pair[0].bbox(), pair[1].bbox());
            if (before.bottom() - after.bottom()).abs() >= self.break_threshold {
                corners.push(Point::rounded(before.right(), before.bottom()));
                corners.push(Point::rounded(after.left(), after.top()));
                is_broken = true;
            }
        }
        let end = last.bbox();
        corners.push(Point::rounded(end.right(), end.bottom()));

        Some(CoordinateSpan {
            from_page: first.page_index(),
            to_page: last.page_index(),
            is_broken,
            corners,
        })
    }
}

impl Default for CoordinateSynthesizer {
    fn default() -> Self {
        Self::new(DEFAULT_BREAK_THRESHOLD)
    }
}

/// Map from token id to its page rectangles, in document order.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CoordinateIndex {
    entries: IndexMap<String, Vec<PageRect>>,
}

impl CoordinateIndex {
    /// Create an empty index.
    pub fn new() -> Self {
        Self::default()
    }

    /// Collect every resolved leaf of a tree.
    pub fn from_tree(tree: &TextTree) -> Self {
        let mut index = Self::new();
        for id in tree.leaves() {
            let unit = tree.unit(id);
            if let Some(span) = &unit.coordinates {
                index.insert(unit.id.clone(), span.rects());
            }
        }
        index
    }

    /// Add or replace the rectangles of a token.
    pub fn insert(&mut self, id: String, rects: Vec<PageRect>) {
        self.entries.insert(id, rects);
    }

    /// Rectangles of a token.
    pub fn get(&self, id: &str) -> Option<&[PageRect]> {
        self.entries.get(id).map(Vec::as_slice)
    }

    /// Number of tokens in the index.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Check if the index is empty.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Iterate over tokens in insertion order.
    pub fn iter(&self) -> impl Iterator<Item = (&String, &Vec<PageRect>)> {
        self.entries.iter()
    }

    /// Serialize to pretty-printed JSON.
    pub fn to_json(&self) -> crate::error::Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::structure::{TextUnit, UnitKind};

    fn glyph(x0: f32, top: f32, x1: f32, bottom: f32, page: u32) -> Glyph {
        Glyph::new("a", x0, top, x1, bottom, page)
    }

    #[test]
    fn test_single_line_has_two_corners() {
        let glyphs = vec![
            glyph(10.0, 690.0, 15.0, 700.0, 1),
            glyph(15.0, 691.0, 20.0, 701.0, 1),
        ];
        let span = CoordinateSynthesizer::default().synthesize_slice(&glyphs).unwrap();
        assert!(!span.is_broken);
        assert_eq!(span.corners, vec![Point::new(10.0, 690.0), Point::new(20.0, 701.0)]);
    }

    #[test]
    fn test_break_emits_four_corners() {
        let glyphs = vec![
            glyph(500.0, 690.0, 505.0, 700.0, 1),
            glyph(40.0, 40.0, 45.0, 50.0, 2),
        ];
        let span = CoordinateSynthesizer::default().synthesize_slice(&glyphs).unwrap();
        assert!(span.is_broken);
        assert_eq!(
            span.corners,
            vec![
                Point::new(500.0, 690.0),
                Point::new(505.0, 700.0),
                Point::new(40.0, 40.0),
                Point::new(45.0, 50.0),
            ]
        );
        assert_eq!(span.from_page, 0);
        assert_eq!(span.to_page, 1);
    }

    #[test]
    fn test_break_threshold_is_inclusive() {
        let glyphs = vec![glyph(0.0, 0.0, 1.0, 10.0, 1), glyph(1.0, 4.0, 2.0, 14.0, 1)];
        let span = CoordinateSynthesizer::default().synthesize_slice(&glyphs).unwrap();
        assert!(span.is_broken);

        let narrow = vec![glyph(0.0, 0.0, 1.0, 10.0, 1), glyph(1.0, 3.9, 2.0, 13.9, 1)];
        let span = CoordinateSynthesizer::default().synthesize_slice(&narrow).unwrap();
        assert!(!span.is_broken);
    }

    #[test]
    fn test_first_page_is_page_zero() {
        let glyphs = vec![glyph(1.0, 2.0, 3.0, 4.0, 1)];
        let span = CoordinateSynthesizer::default().synthesize(&glyphs, &[0]).unwrap();
        assert_eq!(span.from_page, 0);
        assert_eq!(span.to_page, 0);
        assert_eq!(span.corners.len(), 2);
    }

    #[test]
    fn test_empty_run_has_no_span() {
        let glyphs = vec![glyph(1.0, 2.0, 3.0, 4.0, 1)];
        let synth = CoordinateSynthesizer::default();
        assert!(synth.synthesize(&glyphs, &[]).is_none());
        assert!(synth.synthesize_slice(&[]).is_none());
    }

    #[test]
    fn test_coordinates_are_rounded() {
        let glyphs = vec![glyph(10.123, 20.456, 30.789, 40.001, 3)];
        let span = CoordinateSynthesizer::default().synthesize_slice(&glyphs).unwrap();
        assert_eq!(span.corners[0], Point::new(10.12, 20.46));
        assert_eq!(span.corners[1], Point::new(30.79, 40.0));
    }

    #[test]
    fn test_attributes_order() {
        let span = CoordinateSpan {
            from_page: 2,
            to_page: 2,
            is_broken: false,
            corners: vec![Point::new(1.5, 2.0), Point::new(3.0, 4.25)],
        };
        let names: Vec<String> = span.attributes().into_iter().map(|(k, _)| k).collect();
        assert_eq!(names, vec!["fromPage", "toPage", "isBroken", "x0", "y0", "x1", "y1"]);
        assert_eq!(span.attributes()[2].1, "false");
        assert_eq!(span.attributes()[3].1, "1.5");
    }

    #[test]
    fn test_index_from_tree_skips_unresolved() {
        let mut tree = TextTree::new();
        let s = tree.push(TextUnit::new(UnitKind::Sentence, "s.1"), None);
        let w1 = tree.push(TextUnit::new(UnitKind::Word, "w.1").with_text("a"), Some(s));
        tree.push(TextUnit::new(UnitKind::Word, "w.2").with_text("b"), Some(s));
        tree.unit_mut(w1).coordinates = CoordinateSynthesizer::default()
            .synthesize_slice(&[glyph(1.0, 2.0, 3.0, 4.0, 1)]);

        let index = CoordinateIndex::from_tree(&tree);
        assert_eq!(index.len(), 1);
        let rects = index.get("w.1").unwrap();
        assert_eq!(rects[0].page, 0);
        assert_eq!(rects[0].x1, 3.0);
        assert!(index.get("w.2").is_none());

        let json = index.to_json().unwrap();
        assert!(json.contains("\"w.1\""));
    }
}

//! Types for reference document trees.
//!
//! A reference document is a hierarchy of sections, segments, sentences and
//! tokens. Units live in a flat arena ([`TextTree`]) and point at each other
//! through [`NodeId`] indices, so the aligner can walk the tree while
//! attaching coordinates to leaves without fighting the borrow checker.

use crate::coordinates::CoordinateSpan;
use std::collections::HashMap;
use std::fmt;

/// Index of a unit inside a [`TextTree`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId(pub usize);

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Kind of a reference unit.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum UnitKind {
    /// Section (TEI `div`)
    Section,
    /// Segment, usually one utterance (TEI `seg`)
    Segment,
    /// Sentence (TEI `s`)
    Sentence,
    /// Word token (TEI `w`)
    Word,
    /// Punctuation token (TEI `pc`)
    Punctuation,
    /// Editorial note (TEI `note`); carries text but never coordinates
    Note,
}

impl UnitKind {
    /// Map a TEI element name to a unit kind.
    ///
    /// Returns `None` for elements that are transparent to the tree.
    pub fn from_tag(tag: &str) -> Option<Self> {
        match tag {
            "div" => Some(Self::Section),
            "seg" => Some(Self::Segment),
            "s" => Some(Self::Sentence),
            "w" => Some(Self::Word),
            "pc" => Some(Self::Punctuation),
            "note" => Some(Self::Note),
            _ => None,
        }
    }

    /// TEI element name for this kind.
    pub fn tag_name(&self) -> &'static str {
        match self {
            Self::Section => "div",
            Self::Segment => "seg",
            Self::Sentence => "s",
            Self::Word => "w",
            Self::Punctuation => "pc",
            Self::Note => "note",
        }
    }

    /// Check if this kind groups other units (section, segment, sentence).
    pub fn is_container(&self) -> bool {
        matches!(self, Self::Section | Self::Segment | Self::Sentence)
    }

    /// Check if this kind is a token that receives coordinates.
    pub fn is_leaf(&self) -> bool {
        matches!(self, Self::Word | Self::Punctuation)
    }

    /// Check if units of this kind hold literal text.
    pub fn holds_text(&self) -> bool {
        matches!(self, Self::Word | Self::Punctuation | Self::Note)
    }

    /// Whether a unit of kind `child` may appear directly under a unit of
    /// this kind.
    pub fn allows_child(&self, child: UnitKind) -> bool {
        match self {
            Self::Section => matches!(
                child,
                Self::Section | Self::Segment | Self::Sentence | Self::Note
            ),
            Self::Segment => matches!(child, Self::Sentence | Self::Note),
            Self::Sentence => matches!(child, Self::Word | Self::Punctuation | Self::Note),
            Self::Word | Self::Punctuation | Self::Note => false,
        }
    }

    /// Whether a unit of kind `child` may appear at the top of the tree.
    pub fn allowed_at_root(child: UnitKind) -> bool {
        matches!(
            child,
            Self::Section | Self::Segment | Self::Sentence | Self::Note
        )
    }
}

impl fmt::Display for UnitKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Section => "section",
            Self::Segment => "segment",
            Self::Sentence => "sentence",
            Self::Word => "word",
            Self::Punctuation => "punctuation",
            Self::Note => "note",
        };
        f.write_str(name)
    }
}

/// A node of the reference tree.
#[derive(Debug, Clone)]
pub struct TextUnit {
    /// What kind of unit this is
    pub kind: UnitKind,

    /// Stable identifier (`xml:id`, or a synthetic id for containers and notes)
    pub id: String,

    /// Whether `id` was generated rather than read from the source
    pub synthetic_id: bool,

    /// Language tag (`xml:lang`), if present
    pub lang: Option<String>,

    /// Subtype attribute (used to mark duplicate notes)
    pub subtype: Option<String>,

    /// Literal text for words, punctuation and notes
    pub text: String,

    /// Children in document order
    pub children: Vec<NodeId>,

    /// Parent unit (None for top-level units)
    pub parent: Option<NodeId>,

    /// Coordinates attached by the aligner (leaves only)
    pub coordinates: Option<CoordinateSpan>,
}

impl TextUnit {
    /// Create a unit with an identifier.
    pub fn new(kind: UnitKind, id: impl Into<String>) -> Self {
        Self {
            kind,
            id: id.into(),
            synthetic_id: false,
            lang: None,
            subtype: None,
            text: String::new(),
            children: Vec::new(),
            parent: None,
            coordinates: None,
        }
    }

    /// Set the literal text.
    pub fn with_text(mut self, text: impl Into<String>) -> Self {
        self.text = text.into();
        self
    }

    /// Set the language tag.
    pub fn with_lang(mut self, lang: impl Into<String>) -> Self {
        self.lang = Some(lang.into());
        self
    }

    /// Set the subtype.
    pub fn with_subtype(mut self, subtype: impl Into<String>) -> Self {
        self.subtype = Some(subtype.into());
        self
    }

    /// Check if the unit has been given coordinates.
    pub fn is_resolved(&self) -> bool {
        self.coordinates.is_some()
    }
}

/// Arena holding every unit of a reference document.
#[derive(Debug, Clone, Default)]
pub struct TextTree {
    units: Vec<TextUnit>,
    roots: Vec<NodeId>,
    by_id: HashMap<String, NodeId>,
}

impl TextTree {
    /// Create an empty tree.
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a unit under `parent` (or at the top level) and return its id.
    ///
    /// The unit's `parent` and `children` fields are managed by the tree.
    pub fn push(&mut self, mut unit: TextUnit, parent: Option<NodeId>) -> NodeId {
        let id = NodeId(self.units.len());
        unit.parent = parent;
        unit.children.clear();
        self.by_id.entry(unit.id.clone()).or_insert(id);
        self.units.push(unit);
        match parent {
            Some(p) => self.units[p.0].children.push(id),
            None => self.roots.push(id),
        }
        id
    }

    /// Borrow a unit.
    ///
    /// # Panics
    ///
    /// Panics if `id` does not belong to this tree.
    pub fn unit(&self, id: NodeId) -> &TextUnit {
        &self.units[id.0]
    }

    /// Mutably borrow a unit.
    pub fn unit_mut(&mut self, id: NodeId) -> &mut TextUnit {
        &mut self.units[id.0]
    }

    /// Look a unit up by its identifier.
    pub fn find(&self, id: &str) -> Option<NodeId> {
        self.by_id.get(id).copied()
    }

    /// Top-level units in document order.
    pub fn roots(&self) -> &[NodeId] {
        &self.roots
    }

    /// Children of a unit in document order.
    pub fn children(&self, id: NodeId) -> &[NodeId] {
        &self.units[id.0].children
    }

    /// Number of units.
    pub fn len(&self) -> usize {
        self.units.len()
    }

    /// Check if the tree is empty.
    pub fn is_empty(&self) -> bool {
        self.units.is_empty()
    }

    /// All unit ids in document (pre-)order.
    pub fn iter(&self) -> impl Iterator<Item = NodeId> + '_ {
        let roots = self.roots.clone();
        roots.into_iter().flat_map(move |r| std::iter::once(r).chain(self.descendants(r)))
    }

    /// All descendants of a unit in document order, excluding the unit.
    pub fn descendants(&self, id: NodeId) -> Descendants<'_> {
        let mut stack: Vec<NodeId> = self.children(id).to_vec();
        stack.reverse();
        Descendants { tree: self, stack }
    }

    /// Word and punctuation units in document order.
    pub fn leaves(&self) -> impl Iterator<Item = NodeId> + '_ {
        self.iter().filter(move |&id| self.unit(id).kind.is_leaf())
    }

    /// Notes in document order.
    pub fn notes(&self) -> impl Iterator<Item = NodeId> + '_ {
        self.iter().filter(move |&id| self.unit(id).kind == UnitKind::Note)
    }

    /// Text a unit contributes to the page: its own text for words,
    /// punctuation and notes, the concatenated text of its descendants for
    /// containers.
    pub fn emitted_text(&self, id: NodeId) -> String {
        let unit = self.unit(id);
        if unit.kind.holds_text() {
            return unit.text.clone();
        }
        self.descendants(id)
            .map(|d| self.unit(d))
            .filter(|u| u.kind.holds_text())
            .map(|u| u.text.as_str())
            .collect()
    }
}

/// Pre-order iterator over the descendants of a unit.
pub struct Descendants<'a> {
    tree: &'a TextTree,
    stack: Vec<NodeId>,
}

impl Iterator for Descendants<'_> {
    type Item = NodeId;

    fn next(&mut self) -> Option<NodeId> {
        let id = self.stack.pop()?;
        self.stack
            .extend(self.tree.children(id).iter().rev().copied());
        Some(id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_tree() -> (TextTree, NodeId, NodeId) {
        // seg
        //   s
        //     w "Dobar"  w "dan"  pc "."
        //   note "(Aplauz)"
        let mut tree = TextTree::new();
        let seg = tree.push(TextUnit::new(UnitKind::Segment, "seg.1"), None);
        let s = tree.push(TextUnit::new(UnitKind::Sentence, "s.1").with_lang("sr"), Some(seg));
        tree.push(TextUnit::new(UnitKind::Word, "w.1").with_text("Dobar"), Some(s));
        tree.push(TextUnit::new(UnitKind::Word, "w.2").with_text("dan"), Some(s));
        tree.push(TextUnit::new(UnitKind::Punctuation, "pc.1").with_text("."), Some(s));
        tree.push(TextUnit::new(UnitKind::Note, "note.1").with_text("(Aplauz)"), Some(seg));
        (tree, seg, s)
    }

    #[test]
    fn test_unit_kind_from_tag() {
        assert_eq!(UnitKind::from_tag("div"), Some(UnitKind::Section));
        assert_eq!(UnitKind::from_tag("pc"), Some(UnitKind::Punctuation));
        assert_eq!(UnitKind::from_tag("hi"), None);
        assert_eq!(UnitKind::Word.tag_name(), "w");
    }

    #[test]
    fn test_nesting_rules() {
        assert!(UnitKind::Segment.allows_child(UnitKind::Sentence));
        assert!(UnitKind::Sentence.allows_child(UnitKind::Note));
        assert!(!UnitKind::Segment.allows_child(UnitKind::Word));
        assert!(!UnitKind::Word.allows_child(UnitKind::Word));
        assert!(UnitKind::allowed_at_root(UnitKind::Section));
        assert!(!UnitKind::allowed_at_root(UnitKind::Word));
    }

    #[test]
    fn test_tree_links() {
        let (tree, seg, s) = sample_tree();
        assert_eq!(tree.len(), 6);
        assert_eq!(tree.roots(), &[seg]);
        assert_eq!(tree.unit(s).parent, Some(seg));
        assert_eq!(tree.children(s).len(), 3);
        assert_eq!(tree.find("w.2").map(|id| tree.unit(id).text.as_str()), Some("dan"));
        assert_eq!(tree.find("missing"), None);
    }

    #[test]
    fn test_descendants_are_in_document_order() {
        let (tree, seg, _) = sample_tree();
        let ids: Vec<&str> = tree.descendants(seg).map(|d| tree.unit(d).id.as_str()).collect();
        assert_eq!(ids, vec!["s.1", "w.1", "w.2", "pc.1", "note.1"]);
    }

    #[test]
    fn test_emitted_text() {
        let (tree, seg, s) = sample_tree();
        assert_eq!(tree.emitted_text(s), "Dobardan.");
        assert_eq!(tree.emitted_text(seg), "Dobardan.(Aplauz)");
    }

    #[test]
    fn test_leaves_and_notes() {
        let (tree, _, _) = sample_tree();
        assert_eq!(tree.leaves().count(), 3);
        assert_eq!(tree.notes().count(), 1);
        assert_eq!(tree.iter().count(), 6);
    }
}

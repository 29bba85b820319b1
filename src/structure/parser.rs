//! Reader for TEI reference documents.
//!
//! Maps TEI elements onto [`TextUnit`]s:
//!
//! | element | unit kind |
//! |---------|-----------|
//! | `div`   | section   |
//! | `seg`   | segment   |
//! | `s`     | sentence  |
//! | `w`     | word      |
//! | `pc`    | punctuation |
//! | `note`  | note      |
//!
//! Every other element is transparent: its children attach to the nearest
//! mapped ancestor. The `teiHeader` is skipped entirely.

use super::types::{NodeId, TextTree, TextUnit, UnitKind};
use crate::error::{Error, Result};
use quick_xml::events::{BytesStart, Event};
use quick_xml::Reader;
use std::fs;
use std::path::{Path, PathBuf};

/// A parsed reference document together with the source it came from.
///
/// The source is kept so the annotated output can be produced by
/// re-streaming it with coordinate attributes added.
#[derive(Debug, Clone)]
pub struct TeiDocument {
    /// Original XML text
    pub source: String,
    /// Unit tree parsed from `source`
    pub tree: TextTree,
}

impl TeiDocument {
    /// Parse a document from XML text.
    pub fn parse(source: impl Into<String>) -> Result<Self> {
        let source = source.into();
        let tree = TeiReader::new().read(&source)?;
        Ok(Self { source, tree })
    }

    /// Text of the first note, used as the session start marker.
    pub fn first_note_text(&self) -> Option<&str> {
        self.tree.notes().next().map(|id| self.tree.unit(id).text.as_str())
    }

    /// Text of the last note, used as the session end marker.
    pub fn last_note_text(&self) -> Option<&str> {
        self.tree.notes().last().map(|id| self.tree.unit(id).text.as_str())
    }
}

/// Supplies reference documents by id.
pub trait ReferenceSource: Send + Sync {
    /// Load and parse the reference document `document_id`.
    ///
    /// Malformed trees fail with [`Error::Schema`].
    fn load_reference(&self, document_id: &str) -> Result<TeiDocument>;
}

/// Open element on the reader's stack.
#[derive(Debug, Clone, Copy)]
enum Frame {
    /// Element mapped to a unit
    Unit(NodeId),
    /// Element whose children attach to the enclosing unit
    Transparent,
}

/// Streaming TEI reader building a [`TextTree`].
#[derive(Debug, Clone, Default)]
pub struct TeiReader {
    skip_elements: Vec<String>,
}

impl TeiReader {
    /// Create a reader that skips the `teiHeader`.
    pub fn new() -> Self {
        Self {
            skip_elements: vec!["teiHeader".to_string()],
        }
    }

    /// Skip an additional element (and everything inside it).
    pub fn with_skipped_element(mut self, name: impl Into<String>) -> Self {
        self.skip_elements.push(name.into());
        self
    }

    /// Parse TEI XML into a unit tree.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Schema`] when a word or punctuation element has no
    /// `xml:id`, or when a unit appears where it is not allowed (for example a
    /// word directly inside a segment). Malformed XML is [`Error::Xml`].
    ///
    /// # Examples
    ///
    /// ```
    /// use glyph_anchor::structure::TeiReader;
    ///
    /// let xml = r#"<TEI><text><body>
    ///   <seg xml:id="seg1"><s xml:lang="hr">
    ///     <w xml:id="w1">Dobar</w> <w xml:id="w2">dan</w><pc xml:id="pc1">.</pc>
    ///   </s></seg>
    /// </body></text></TEI>"#;
    /// let tree = TeiReader::new().read(xml).unwrap();
    /// assert_eq!(tree.leaves().count(), 3);
    /// ```
    pub fn read(&self, xml: &str) -> Result<TextTree> {
        let mut reader = Reader::from_str(xml);
        reader.trim_text(false);

        let mut tree = TextTree::new();
        let mut stack: Vec<Frame> = Vec::new();
        let mut skip_depth = 0usize;

        loop {
            match reader.read_event()? {
                Event::Start(e) => {
                    if skip_depth > 0 || self.is_skipped(&e) {
                        skip_depth += 1;
                        continue;
                    }
                    let frame = self.open_unit(&mut tree, &stack, &e)?;
                    stack.push(frame);
                },
                Event::Empty(e) => {
                    if skip_depth > 0 || self.is_skipped(&e) {
                        continue;
                    }
                    self.open_unit(&mut tree, &stack, &e)?;
                },
                Event::End(_) => {
                    if skip_depth > 0 {
                        skip_depth -= 1;
                        continue;
                    }
                    stack.pop();
                },
                Event::Text(t) => {
                    if skip_depth > 0 {
                        continue;
                    }
                    if let Some(owner) = text_owner(&tree, &stack) {
                        let text = t.unescape()?;
                        tree.unit_mut(owner).text.push_str(&text);
                    }
                },
                Event::CData(t) => {
                    if skip_depth > 0 {
                        continue;
                    }
                    if let Some(owner) = text_owner(&tree, &stack) {
                        let text = String::from_utf8_lossy(&t);
                        tree.unit_mut(owner).text.push_str(&text);
                    }
                },
                Event::Eof => break,
                _ => {},
            }
        }

        log::debug!("Parsed reference tree with {} units", tree.len());
        Ok(tree)
    }

    fn is_skipped(&self, e: &BytesStart) -> bool {
        let local = e.local_name();
        self.skip_elements
            .iter()
            .any(|name| name.as_bytes() == local.as_ref())
    }

    /// Create the unit for an element (if it maps to one) and return the
    /// frame to push for it.
    fn open_unit(&self, tree: &mut TextTree, stack: &[Frame], e: &BytesStart) -> Result<Frame> {
        let local = e.local_name();
        let tag = String::from_utf8_lossy(local.as_ref());
        let kind = match UnitKind::from_tag(&tag) {
            Some(kind) => kind,
            None => return Ok(Frame::Transparent),
        };

        let parent = enclosing_unit(stack);
        let allowed = match parent {
            Some(p) => tree.unit(p).kind.allows_child(kind),
            None => UnitKind::allowed_at_root(kind),
        };

        let mut xml_id = None;
        let mut lang = None;
        let mut subtype = None;
        for attr in e.attributes() {
            let attr = attr.map_err(quick_xml::Error::from)?;
            match attr.key.as_ref() {
                b"xml:id" => xml_id = Some(attr.unescape_value()?.into_owned()),
                b"xml:lang" => lang = Some(attr.unescape_value()?.into_owned()),
                b"subtype" => subtype = Some(attr.unescape_value()?.into_owned()),
                _ => {},
            }
        }

        if !allowed {
            let unit_id = xml_id
                .clone()
                .or_else(|| parent.map(|p| tree.unit(p).id.clone()))
                .unwrap_or_else(|| "<root>".to_string());
            let location = match parent {
                Some(p) => format!("inside {}", tree.unit(p).kind),
                None => "at the top level".to_string(),
            };
            return Err(Error::schema(unit_id, format!("{} not allowed {}", kind, location)));
        }

        let (id, synthetic) = match xml_id {
            Some(id) => (id, false),
            None if kind.is_leaf() => {
                let parent_id = parent
                    .map(|p| tree.unit(p).id.clone())
                    .unwrap_or_else(|| "<root>".to_string());
                return Err(Error::schema(parent_id, format!("{} without xml:id", kind)));
            },
            None => (format!("{}#{}", kind.tag_name(), tree.len()), true),
        };

        let mut unit = TextUnit::new(kind, id);
        unit.synthetic_id = synthetic;
        unit.lang = lang;
        unit.subtype = subtype;
        Ok(Frame::Unit(tree.push(unit, parent)))
    }
}

/// Nearest mapped unit on the stack.
fn enclosing_unit(stack: &[Frame]) -> Option<NodeId> {
    stack.iter().rev().find_map(|frame| match frame {
        Frame::Unit(id) => Some(*id),
        Frame::Transparent => None,
    })
}

/// Unit that receives character data at the current position, if any.
fn text_owner(tree: &TextTree, stack: &[Frame]) -> Option<NodeId> {
    enclosing_unit(stack).filter(|&id| tree.unit(id).kind.holds_text())
}

/// Loads reference documents from a directory.
///
/// The file for document `id` is `<dir>/<id>.tei.xml`, or `<dir>/<id>.xml`
/// when the former does not exist.
#[derive(Debug, Clone)]
pub struct DirectoryTeiSource {
    dir: PathBuf,
    reader: TeiReader,
}

impl DirectoryTeiSource {
    /// Create a source rooted at `dir`.
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self {
            dir: dir.into(),
            reader: TeiReader::new(),
        }
    }

    /// Directory reference files are read from.
    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Path of the reference file for a document, if it exists.
    pub fn locate(&self, document_id: &str) -> Option<PathBuf> {
        [".tei.xml", ".xml"]
            .iter()
            .map(|suffix| self.dir.join(format!("{}{}", document_id, suffix)))
            .find(|path| path.is_file())
    }
}

impl ReferenceSource for DirectoryTeiSource {
    fn load_reference(&self, document_id: &str) -> Result<TeiDocument> {
        let path = self.locate(document_id).ok_or_else(|| {
            Error::schema(
                document_id,
                format!("no reference document in {}", self.dir.display()),
            )
        })?;
        log::debug!("Loading reference for {} from {}", document_id, path.display());

        let source = fs::read_to_string(&path)?;
        let tree = self.reader.read(&source)?;
        Ok(TeiDocument { source, tree })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE: &str = r##"<?xml version="1.0" encoding="UTF-8"?>
<TEI xmlns="http://www.tei-c.org/ns/1.0">
  <teiHeader><fileDesc><title>Zapisnik</title></fileDesc></teiHeader>
  <text><body>
    <div type="debateSection">
      <note type="time">Počelo u 10 sati.</note>
      <u who="#speaker1">
        <seg xml:id="seg1">
          <s xml:id="s1" xml:lang="sr">
            <w xml:id="w1">Раде</w>
            <w xml:id="w2">&amp;c</w><pc xml:id="pc1">.</pc>
          </s>
          <note subtype="latin">Rade</note>
        </seg>
      </u>
    </div>
  </body></text>
</TEI>"##;

    #[test]
    fn test_reads_units_and_attributes() {
        let tree = TeiReader::new().read(SAMPLE).unwrap();
        let kinds: Vec<UnitKind> = tree.iter().map(|id| tree.unit(id).kind).collect();
        assert_eq!(
            kinds,
            vec![
                UnitKind::Section,
                UnitKind::Note,
                UnitKind::Segment,
                UnitKind::Sentence,
                UnitKind::Word,
                UnitKind::Word,
                UnitKind::Punctuation,
                UnitKind::Note,
            ]
        );

        let s1 = tree.find("s1").unwrap();
        assert_eq!(tree.unit(s1).lang.as_deref(), Some("sr"));
        let w2 = tree.find("w2").unwrap();
        assert_eq!(tree.unit(w2).text, "&c");
        let last_note = tree.notes().last().unwrap();
        assert_eq!(tree.unit(last_note).subtype.as_deref(), Some("latin"));
    }

    #[test]
    fn test_header_is_skipped() {
        let tree = TeiReader::new().read(SAMPLE).unwrap();
        assert!(tree.iter().all(|id| !tree.unit(id).text.contains("Zapisnik")));
    }

    #[test]
    fn test_synthetic_ids_for_containers() {
        let tree = TeiReader::new().read(SAMPLE).unwrap();
        let section = tree.roots()[0];
        assert!(tree.unit(section).synthetic_id);
        assert!(tree.unit(section).id.starts_with("div#"));
        assert!(!tree.unit(tree.find("seg1").unwrap()).synthetic_id);
    }

    #[test]
    fn test_word_without_id_names_parent() {
        let xml = r#"<body><s xml:id="s9"><w>bez</w></s></body>"#;
        match TeiReader::new().read(xml).unwrap_err() {
            Error::Schema { unit_id, reason } => {
                assert_eq!(unit_id, "s9");
                assert!(reason.contains("xml:id"));
            },
            other => panic!("unexpected error: {:?}", other),
        }
    }

    #[test]
    fn test_disallowed_nesting() {
        let xml = r#"<body><seg xml:id="seg2"><w xml:id="w5">a</w></seg></body>"#;
        let err = TeiReader::new().read(xml).unwrap_err();
        assert!(matches!(err, Error::Schema { ref unit_id, .. } if unit_id == "w5"));

        let xml = r#"<body><w xml:id="w6">a</w></body>"#;
        assert!(matches!(TeiReader::new().read(xml), Err(Error::Schema { .. })));
    }

    #[test]
    fn test_transparent_elements_inside_words() {
        let xml = r#"<s xml:id="s1"><w xml:id="w1">Ra<hi rend="bold">de</hi></w></s>"#;
        let tree = TeiReader::new().read(xml).unwrap();
        assert_eq!(tree.unit(tree.find("w1").unwrap()).text, "Rade");
    }

    #[test]
    fn test_extra_skipped_element() {
        let xml = r#"<body><back><note>appendix</note></back><note>kept</note></body>"#;
        let tree = TeiReader::new().with_skipped_element("back").read(xml).unwrap();
        assert_eq!(tree.len(), 1);
        assert_eq!(tree.unit(tree.roots()[0]).text, "kept");
    }

    #[test]
    fn test_session_markers() {
        let doc = TeiDocument::parse(SAMPLE).unwrap();
        assert_eq!(doc.first_note_text(), Some("Počelo u 10 sati."));
        assert_eq!(doc.last_note_text(), Some("Rade"));
    }

    #[test]
    fn test_malformed_xml_is_xml_error() {
        let xml = r#"<s xml:id="s1"><w xml:id="w1">a</s>"#;
        assert!(matches!(TeiReader::new().read(xml), Err(Error::Xml(_))));
    }
}

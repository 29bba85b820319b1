//! Writer for annotated TEI documents.
//!
//! The source XML is re-streamed event by event. Word and punctuation
//! elements lose any coordinate attributes they already carried; resolved
//! ones then receive `fromPage`, `toPage`, `isBroken` and the corner
//! attributes `x0`, `y0`, `x1`, `y1`, ... Everything else is written back
//! unchanged.

use super::types::{TextTree, UnitKind};
use crate::error::Result;
use lazy_static::lazy_static;
use quick_xml::events::attributes::Attribute;
use quick_xml::events::{BytesStart, Event};
use quick_xml::name::QName;
use quick_xml::{Reader, Writer};
use regex::Regex;
use std::borrow::Cow;

lazy_static! {
    /// Corner attribute names (`x0`, `y12`, ...).
    static ref CORNER_ATTRIBUTE: Regex = Regex::new(r"^[xy]\d+$").unwrap();
}

const SPAN_ATTRIBUTES: [&str; 3] = ["fromPage", "toPage", "isBroken"];

/// Whether an attribute name belongs to the coordinate annotation.
pub fn is_coordinate_attribute(name: &str) -> bool {
    SPAN_ATTRIBUTES.contains(&name) || CORNER_ATTRIBUTE.is_match(name)
}

/// Re-emit `source` with the coordinates attached to the leaves of `tree`.
///
/// Leaves are matched to elements through their `xml:id`. Leaves without
/// coordinates come out with no coordinate attributes at all. Applying the
/// function to its own output with the same tree yields the same document.
///
/// # Examples
///
/// ```
/// use glyph_anchor::coordinates::CoordinateSynthesizer;
/// use glyph_anchor::glyph::Glyph;
/// use glyph_anchor::structure::{annotate_tei, TeiReader};
///
/// let xml = r#"<s xml:id="s1"><w xml:id="w1">a</w></s>"#;
/// let mut tree = TeiReader::new().read(xml).unwrap();
/// let w1 = tree.find("w1").unwrap();
/// tree.unit_mut(w1).coordinates = CoordinateSynthesizer::default()
///     .synthesize_slice(&[Glyph::new("a", 1.0, 2.0, 3.0, 4.0, 1)]);
///
/// let out = annotate_tei(xml, &tree).unwrap();
/// assert!(out.contains(r#"fromPage="0""#));
/// assert!(out.contains(r#"x1="3""#));
/// ```
pub fn annotate_tei(source: &str, tree: &TextTree) -> Result<String> {
    let mut reader = Reader::from_str(source);
    reader.trim_text(false);
    let mut writer = Writer::new(Vec::with_capacity(source.len() + source.len() / 4));

    loop {
        match reader.read_event()? {
            Event::Start(e) => {
                let e = annotate_element(e, tree)?;
                writer.write_event(Event::Start(e))?;
            },
            Event::Empty(e) => {
                let e = annotate_element(e, tree)?;
                writer.write_event(Event::Empty(e))?;
            },
            Event::Eof => break,
            other => writer.write_event(other)?,
        }
    }

    Ok(String::from_utf8_lossy(&writer.into_inner()).into_owned())
}

fn annotate_element<'a>(e: BytesStart<'a>, tree: &TextTree) -> Result<BytesStart<'a>> {
    let is_leaf = UnitKind::from_tag(&String::from_utf8_lossy(e.local_name().as_ref()))
        .map(|kind| kind.is_leaf())
        .unwrap_or(false);
    if !is_leaf {
        return Ok(e);
    }

    let mut kept: Vec<(Vec<u8>, Vec<u8>)> = Vec::new();
    let mut xml_id: Option<String> = None;
    for attr in e.attributes() {
        let attr = attr.map_err(quick_xml::Error::from)?;
        let name = String::from_utf8_lossy(attr.key.as_ref()).into_owned();
        if is_coordinate_attribute(&name) {
            continue;
        }
        if name == "xml:id" {
            xml_id = Some(attr.unescape_value()?.into_owned());
        }
        kept.push((attr.key.as_ref().to_vec(), attr.value.into_owned()));
    }

    let mut out = e.to_owned();
    out.clear_attributes();
    for (key, value) in &kept {
        out.push_attribute(Attribute {
            key: QName(key),
            value: Cow::Borrowed(value),
        });
    }

    let span = xml_id
        .as_deref()
        .and_then(|id| tree.find(id))
        .and_then(|node| tree.unit(node).coordinates.as_ref());
    if let Some(span) = span {
        for (name, value) in span.attributes() {
            out.push_attribute((name.as_str(), value.as_str()));
        }
    }

    Ok(out)
}

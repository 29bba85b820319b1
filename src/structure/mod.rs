//! Reference document trees.
//!
//! A reference document is the clean, linguistically annotated version of a
//! page stream: sections contain segments, segments contain sentences and
//! sentences contain word and punctuation tokens. Editorial notes may appear
//! at any container level.
//!
//! ## Reading and writing
//!
//! - [`TeiReader`] parses TEI XML into a [`TextTree`].
//! - [`annotate_tei`] writes the source back with coordinates attached to
//!   resolved tokens.
//!
//! ## Example
//!
//! ```
//! use glyph_anchor::structure::{TeiDocument, UnitKind};
//!
//! let doc = TeiDocument::parse(r#"<seg xml:id="a"><s><w xml:id="b">x</w></s></seg>"#).unwrap();
//! let seg = doc.tree.roots()[0];
//! assert_eq!(doc.tree.unit(seg).kind, UnitKind::Segment);
//! ```

pub mod parser;
mod types;
pub mod writer;

pub use parser::{DirectoryTeiSource, ReferenceSource, TeiDocument, TeiReader};
pub use types::{Descendants, NodeId, TextTree, TextUnit, UnitKind};
pub use writer::annotate_tei;

//! Error types for the alignment library.
//!
//! Document-level failures (unreadable glyph source, malformed reference
//! tree) are surfaced as [`Error`]. A unit that cannot be aligned is not an
//! error: it is reported as [`crate::align::SearchOutcome::NoMatch`] and
//! folded into the per-document summary.

/// Result type alias for alignment library operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Error types that can occur while aligning a document.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// Glyph source missing or unreadable; the whole document is skipped.
    #[error("Glyph extraction failed for '{document_id}': {reason}")]
    Extraction {
        /// Document whose glyphs could not be loaded
        document_id: String,
        /// Reason for the failure
        reason: String,
    },

    /// Reference tree malformed; the whole document is skipped.
    #[error("Malformed reference tree at unit '{unit_id}': {reason}")]
    Schema {
        /// Identifier of the offending unit (or its nearest identified ancestor)
        unit_id: String,
        /// What was wrong with it
        reason: String,
    },

    /// Empty target text reached the search controller.
    ///
    /// Callers must skip units with no comparable text before searching.
    #[error("Degenerate input: empty target text")]
    DegenerateInput,

    /// Invalid configuration value
    #[error("Invalid configuration: {0}")]
    Config(String),

    /// The document job was abandoned before it finished
    #[error("Alignment of '{0}' was cancelled")]
    Cancelled(String),

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON (de)serialization error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// XML reading or writing error
    #[error("XML error: {0}")]
    Xml(#[from] quick_xml::Error),
}

impl Error {
    /// Build an extraction error for a document.
    pub fn extraction(document_id: impl Into<String>, reason: impl ToString) -> Self {
        Error::Extraction {
            document_id: document_id.into(),
            reason: reason.to_string(),
        }
    }

    /// Build a schema error naming the offending unit.
    pub fn schema(unit_id: impl Into<String>, reason: impl Into<String>) -> Self {
        Error::Schema {
            unit_id: unit_id.into(),
            reason: reason.into(),
        }
    }

    /// Whether this error means the document itself is unusable (as opposed
    /// to an environment failure such as a full disk).
    pub fn is_document_error(&self) -> bool {
        matches!(self, Error::Extraction { .. } | Error::Schema { .. })
    }
}

//! Destinations for aligned documents.

use super::AlignedDocument;
use crate::error::Result;
use std::fs;
use std::path::{Path, PathBuf};

/// Receives aligned documents.
pub trait DocumentSink: Send + Sync {
    /// Persist one aligned document.
    fn write(&self, document: &AlignedDocument) -> Result<()>;
}

/// Writes `<id>.xml` (annotated TEI) and `<id>.coords.json` (coordinate
/// index) into a directory.
///
/// Each file is written to a temporary name and renamed into place, so a
/// reader never sees a partial file and re-running a document replaces its
/// outputs.
#[derive(Debug, Clone)]
pub struct DirectorySink {
    dir: PathBuf,
}

impl DirectorySink {
    /// Create a sink, creating `dir` if needed.
    pub fn create(dir: impl Into<PathBuf>) -> Result<Self> {
        let dir = dir.into();
        fs::create_dir_all(&dir)?;
        Ok(Self { dir })
    }

    /// Output directory.
    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Path of the annotated TEI for a document.
    pub fn xml_path(&self, document_id: &str) -> PathBuf {
        self.dir.join(format!("{}.xml", document_id))
    }

    /// Path of the coordinate index for a document.
    pub fn coordinates_path(&self, document_id: &str) -> PathBuf {
        self.dir.join(format!("{}.coords.json", document_id))
    }
}

impl DocumentSink for DirectorySink {
    fn write(&self, document: &AlignedDocument) -> Result<()> {
        let xml = document.annotated_xml()?;
        let coordinates = document.coordinate_index().to_json()?;

        write_atomic(&self.xml_path(&document.document_id), xml.as_bytes())?;
        write_atomic(&self.coordinates_path(&document.document_id), coordinates.as_bytes())?;
        log::debug!("Wrote {} to {}", document.document_id, self.dir.display());
        Ok(())
    }
}

fn write_atomic(path: &Path, content: &[u8]) -> Result<()> {
    let file_name = path
        .file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_default();
    let tmp = path.with_file_name(format!(".{}.tmp", file_name));
    fs::write(&tmp, content)?;
    if let Err(e) = fs::rename(&tmp, path) {
        let _ = fs::remove_file(&tmp);
        return Err(e.into());
    }
    Ok(())
}

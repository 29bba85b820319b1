//! Parallel alignment of many documents.
//!
//! Documents are independent, so each one is handed to a rayon worker. A
//! failing document is recorded in the report and the batch continues.
//! Setting the cancellation flag makes every document that has not finished
//! yet end with [`Error::Cancelled`]; nothing is written for it.

use super::sink::DocumentSink;
use super::summary::AlignmentSummary;
use super::DocumentAligner;
use crate::error::{Error, Result};
use crate::glyph::GlyphSource;
use crate::structure::ReferenceSource;
use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Instant;

/// Outcome of one document.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DocumentReport {
    /// Document identifier
    pub document_id: String,
    /// Whether the document was aligned and written
    pub success: bool,
    /// Wall time spent on the document
    pub duration_ms: f64,
    /// Alignment statistics (absent for failed documents)
    pub summary: Option<AlignmentSummary>,
    /// Failure message
    pub error: Option<String>,
}

/// Outcome of a batch.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BatchReport {
    /// Local time the batch finished
    pub timestamp: String,
    /// Documents attempted
    pub total_documents: usize,
    /// Documents aligned and written
    pub successful: usize,
    /// Documents that failed or were cancelled
    pub failed: usize,
    /// Wall time of the batch
    pub total_duration_ms: f64,
    /// Per-document outcomes, in input order
    pub results: Vec<DocumentReport>,
}

impl BatchReport {
    /// Serialize to pretty-printed JSON.
    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// Reports of the documents that failed.
    pub fn failures(&self) -> impl Iterator<Item = &DocumentReport> {
        self.results.iter().filter(|r| !r.success)
    }
}

/// Runs a [`DocumentAligner`] over many documents on a thread pool.
pub struct BatchRunner {
    aligner: DocumentAligner,
    workers: usize,
    cancel: Arc<AtomicBool>,
}

impl BatchRunner {
    /// Create a runner using one worker per available CPU.
    pub fn new(aligner: DocumentAligner) -> Self {
        Self {
            aligner,
            workers: 0,
            cancel: Arc::new(AtomicBool::new(false)),
        }
    }

    /// Use a fixed number of workers (0 = one per CPU).
    pub fn with_workers(mut self, workers: usize) -> Self {
        self.workers = workers;
        self
    }

    /// Handle that cancels the batch when set.
    pub fn cancel_flag(&self) -> Arc<AtomicBool> {
        Arc::clone(&self.cancel)
    }

    /// Align and write every document in `document_ids`.
    ///
    /// # Errors
    ///
    /// Only a thread pool that cannot be built fails the batch; document
    /// failures are recorded in the report.
    pub fn run(
        &self,
        document_ids: &[String],
        glyphs: &dyn GlyphSource,
        references: &dyn ReferenceSource,
        sink: &dyn DocumentSink,
    ) -> Result<BatchReport> {
        let pool = rayon::ThreadPoolBuilder::new()
            .num_threads(self.workers)
            .build()
            .map_err(|e| Error::Config(format!("cannot start worker pool: {}", e)))?;

        log::info!(
            "Aligning {} documents on {} workers",
            document_ids.len(),
            pool.current_num_threads()
        );

        let start = Instant::now();
        let done = AtomicUsize::new(0);
        let total = document_ids.len();

        let results: Vec<DocumentReport> = pool.install(|| {
            document_ids
                .par_iter()
                .map(|id| {
                    let report = self.process(id, glyphs, references, sink);
                    let finished = done.fetch_add(1, Ordering::Relaxed) + 1;
                    log::debug!("[{}/{}] {} finished", finished, total, id);
                    report
                })
                .collect()
        });

        let successful = results.iter().filter(|r| r.success).count();
        let report = BatchReport {
            timestamp: chrono::Local::now().format("%Y-%m-%dT%H:%M:%S").to_string(),
            total_documents: total,
            successful,
            failed: total - successful,
            total_duration_ms: start.elapsed().as_secs_f64() * 1000.0,
            results,
        };
        log::info!(
            "Batch finished: {} aligned, {} failed in {:.2}s",
            report.successful,
            report.failed,
            report.total_duration_ms / 1000.0
        );
        Ok(report)
    }

    fn process(
        &self,
        document_id: &str,
        glyphs: &dyn GlyphSource,
        references: &dyn ReferenceSource,
        sink: &dyn DocumentSink,
    ) -> DocumentReport {
        let start = Instant::now();
        let outcome = self
            .aligner
            .align_with_cancel(document_id, glyphs, references, Some(self.cancel.as_ref()))
            .and_then(|aligned| {
                sink.write(&aligned)?;
                Ok(aligned.summary)
            });
        let duration_ms = start.elapsed().as_secs_f64() * 1000.0;

        match outcome {
            Ok(summary) => DocumentReport {
                document_id: document_id.to_string(),
                success: true,
                duration_ms,
                summary: Some(summary),
                error: None,
            },
            Err(e) => {
                match &e {
                    Error::Cancelled(_) => log::info!("{}", e),
                    _ => log::warn!("Skipping {}: {}", document_id, e),
                }
                DocumentReport {
                    document_id: document_id.to_string(),
                    success: false,
                    duration_ms,
                    summary: None,
                    error: Some(e.to_string()),
                }
            },
        }
    }
}

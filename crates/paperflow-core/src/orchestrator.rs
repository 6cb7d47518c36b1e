use std::sync::Arc;
use std::time::Instant;

use thiserror::Error;

use crate::analyzer::{AnalysisError, DocumentInput, DocumentSource, PaperAnalyzer};
use crate::backend::ThumbnailRenderer;
use crate::{AnalyzedPaper, BatchEvent};

/// Why one file in a batch produced no record.
#[derive(Error, Debug)]
pub enum FileError {
    #[error("failed to read file: {0}")]
    Read(#[from] std::io::Error),
    #[error("{0}")]
    Rejected(String),
    #[error(transparent)]
    Analysis(#[from] AnalysisError),
}

/// A file that produced no record.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileFailure {
    /// 0-based position in the input list.
    pub index: usize,
    pub file_name: String,
    pub error: String,
}

/// Fold result of a batch: successes in input order, plus the failures.
#[derive(Debug, Clone, Default)]
pub struct BatchOutcome {
    pub papers: Vec<AnalyzedPaper>,
    pub failures: Vec<FileFailure>,
}

impl BatchOutcome {
    pub fn total(&self) -> usize {
        self.papers.len() + self.failures.len()
    }
}

/// Analyze one document: the preview render (on the blocking pool) and the
/// backend call run concurrently. A preview failure only drops the thumbnail.
pub async fn analyze_document(
    document: DocumentInput,
    analyzer: &dyn PaperAnalyzer,
    thumbnailer: &Arc<dyn ThumbnailRenderer>,
) -> Result<AnalyzedPaper, AnalysisError> {
    let render = {
        let renderer = Arc::clone(thumbnailer);
        let data = Arc::clone(&document.data);
        tokio::task::spawn_blocking(move || renderer.render_first_page(&data))
    };

    let (rendered, analysis) = tokio::join!(render, analyzer.analyze(&document));
    let analysis = analysis?;

    let thumbnail = match rendered {
        Ok(Ok(thumb)) => Some(thumb.data_uri),
        Ok(Err(e)) => {
            tracing::warn!(file = %document.file_name, error = %e, "preview unavailable");
            None
        }
        Err(e) => {
            tracing::warn!(file = %document.file_name, error = %e, "preview task panicked");
            None
        }
    };

    Ok(AnalyzedPaper::new(document.file_name, analysis, thumbnail))
}

/// Process `inputs` strictly in order, one backend call at a time.
///
/// Every outcome is reported through `on_event` as soon as it is known.
/// A failing file is logged and skipped; the batch always runs to the end
/// and always finishes with [`BatchEvent::Complete`].
pub async fn run_batch(
    inputs: Vec<DocumentSource>,
    analyzer: &dyn PaperAnalyzer,
    thumbnailer: Arc<dyn ThumbnailRenderer>,
    on_event: impl Fn(BatchEvent) + Send + Sync,
) -> BatchOutcome {
    let total = inputs.len();
    let started = Instant::now();
    let mut outcome = BatchOutcome::default();

    tracing::info!(total, backend = analyzer.name(), "batch started");
    on_event(BatchEvent::Started { total });

    for (index, source) in inputs.into_iter().enumerate() {
        let file_name = source.file_name();
        on_event(BatchEvent::Analyzing {
            index,
            total,
            file_name: file_name.clone(),
        });

        let result: Result<AnalyzedPaper, FileError> = match source {
            DocumentSource::Rejected { reason, .. } => Err(FileError::Rejected(reason)),
            source => match source.load().await {
                Ok(document) => analyze_document(document, analyzer, &thumbnailer)
                    .await
                    .map_err(FileError::from),
                Err(e) => Err(FileError::from(e)),
            },
        };

        match result {
            Ok(paper) => {
                tracing::info!(file = %file_name, title = %paper.meta.paper_title, "paper analyzed");
                outcome.papers.push(paper.clone());
                on_event(BatchEvent::PaperReady {
                    index,
                    total,
                    paper: Box::new(paper),
                });
            }
            Err(e) => {
                tracing::error!(file = %file_name, error = %e, "analysis failed");
                let error = e.to_string();
                outcome.failures.push(FileFailure {
                    index,
                    file_name: file_name.clone(),
                    error: error.clone(),
                });
                on_event(BatchEvent::FileFailed {
                    index,
                    total,
                    file_name,
                    error,
                });
            }
        }
    }

    tracing::info!(
        succeeded = outcome.papers.len(),
        failed = outcome.failures.len(),
        elapsed_ms = started.elapsed().as_millis() as u64,
        "batch complete"
    );
    on_event(BatchEvent::Complete {
        succeeded: outcome.papers.len(),
        failed: outcome.failures.len(),
    });

    outcome
}

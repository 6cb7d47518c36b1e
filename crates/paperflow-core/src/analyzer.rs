//! Analysis backend trait and the document types it consumes.

use std::future::Future;
use std::path::{Path, PathBuf};
use std::pin::Pin;
use std::sync::Arc;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::{PaperContent, PaperMetadata};

/// The structured payload returned by an analysis backend, before it is
/// stamped with an id, file name and thumbnail.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PaperAnalysis {
    pub meta: PaperMetadata,
    pub content_en: PaperContent,
    pub content_zh: PaperContent,
}

#[derive(Error, Debug)]
pub enum AnalysisError {
    #[error("HTTP request error: {0}")]
    Http(#[from] reqwest::Error),
    #[error("rate limited (429){}", retry_suffix(.retry_after))]
    RateLimited { retry_after: Option<Duration> },
    #[error("backend returned HTTP {status}: {message}")]
    Status { status: u16, message: String },
    #[error("backend returned an empty response")]
    EmptyResponse,
    #[error("malformed response: {0}")]
    MalformedResponse(String),
    #[error("required field `{0}` is missing or blank")]
    MissingField(&'static str),
}

fn retry_suffix(retry_after: &Option<Duration>) -> String {
    retry_after
        .map(|d| format!(", retry after {}s", d.as_secs()))
        .unwrap_or_default()
}

/// One input document held in memory.
#[derive(Debug, Clone)]
pub struct DocumentInput {
    pub file_name: String,
    pub mime_type: String,
    pub data: Arc<[u8]>,
}

impl DocumentInput {
    pub fn new(file_name: impl Into<String>, mime_type: impl Into<String>, data: Vec<u8>) -> Self {
        Self {
            file_name: file_name.into(),
            mime_type: mime_type.into(),
            data: Arc::from(data),
        }
    }

    /// A PDF document.
    pub fn pdf(file_name: impl Into<String>, data: Vec<u8>) -> Self {
        Self::new(file_name, "application/pdf", data)
    }

    /// Read a document from disk. The MIME type is inferred from the extension.
    pub async fn from_path(path: &Path) -> std::io::Result<Self> {
        let data = tokio::fs::read(path).await?;
        Ok(Self::new(display_name(path), mime_for_path(path), data))
    }
}

/// Where a batch item's bytes come from.
///
/// Files are read lazily when the orchestrator reaches them, so a read
/// failure counts against that one item only.
#[derive(Debug, Clone)]
pub enum DocumentSource {
    File(PathBuf),
    Memory(DocumentInput),
    /// An upload refused before analysis. It still takes its slot in the
    /// batch and fails there.
    Rejected { file_name: String, reason: String },
}

impl DocumentSource {
    pub fn file_name(&self) -> String {
        match self {
            DocumentSource::File(path) => display_name(path),
            DocumentSource::Memory(doc) => doc.file_name.clone(),
            DocumentSource::Rejected { file_name, .. } => file_name.clone(),
        }
    }

    pub async fn load(self) -> std::io::Result<DocumentInput> {
        match self {
            DocumentSource::File(path) => DocumentInput::from_path(&path).await,
            DocumentSource::Memory(doc) => Ok(doc),
            DocumentSource::Rejected { reason, .. } => {
                Err(std::io::Error::new(std::io::ErrorKind::InvalidData, reason))
            }
        }
    }
}

impl From<DocumentInput> for DocumentSource {
    fn from(doc: DocumentInput) -> Self {
        DocumentSource::Memory(doc)
    }
}

impl From<PathBuf> for DocumentSource {
    fn from(path: PathBuf) -> Self {
        DocumentSource::File(path)
    }
}

fn display_name(path: &Path) -> String {
    path.file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string())
}

fn mime_for_path(path: &Path) -> &'static str {
    match path
        .extension()
        .and_then(|e| e.to_str())
        .map(|e| e.to_ascii_lowercase())
        .as_deref()
    {
        Some("pdf") | None => "application/pdf",
        Some("png") => "image/png",
        Some("jpg") | Some("jpeg") => "image/jpeg",
        Some("txt") => "text/plain",
        Some(_) => "application/pdf",
    }
}

/// A backend that turns one document into a bilingual analysis.
pub trait PaperAnalyzer: Send + Sync {
    /// Display name of this backend (e.g., "Gemini").
    fn name(&self) -> &str;

    /// Analyze a document. Each call is a fresh request; nothing is cached.
    fn analyze<'a>(
        &'a self,
        document: &'a DocumentInput,
    ) -> Pin<Box<dyn Future<Output = Result<PaperAnalysis, AnalysisError>> + Send + 'a>>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn mime_inferred_from_extension() {
        assert_eq!(mime_for_path(Path::new("paper.PDF")), "application/pdf");
        assert_eq!(mime_for_path(Path::new("figure.jpeg")), "image/jpeg");
        assert_eq!(mime_for_path(Path::new("noext")), "application/pdf");
    }

    #[test]
    fn source_file_name_is_basename() {
        let source = DocumentSource::from(PathBuf::from("/tmp/papers/bert.pdf"));
        assert_eq!(source.file_name(), "bert.pdf");
    }

    #[test]
    fn rate_limited_message_includes_retry_after() {
        let err = AnalysisError::RateLimited {
            retry_after: Some(Duration::from_secs(30)),
        };
        assert_eq!(err.to_string(), "rate limited (429), retry after 30s");
        let err = AnalysisError::RateLimited { retry_after: None };
        assert_eq!(err.to_string(), "rate limited (429)");
    }

    #[tokio::test]
    async fn missing_file_fails_to_load() {
        let source = DocumentSource::from(PathBuf::from("/definitely/not/here.pdf"));
        assert!(source.load().await.is_err());
    }
}

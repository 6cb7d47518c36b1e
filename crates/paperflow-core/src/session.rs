//! In-memory session store: the accumulated results, the active language and
//! the batch status.

use thiserror::Error;
use uuid::Uuid;

use crate::{AnalyzedPaper, ApiKey, BatchEvent, Language};

/// Where the session is in its batch lifecycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum BatchStatus {
    #[default]
    Idle,
    Analyzing,
    Complete,
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum BatchError {
    #[error("no Gemini API key configured")]
    MissingApiKey,
    #[error("no files selected")]
    NoFiles,
    #[error("a batch is already running")]
    AlreadyRunning,
}

/// Results and status for one user session. Nothing here outlives the process.
#[derive(Debug, Default)]
pub struct Session {
    results: Vec<AnalyzedPaper>,
    language: Language,
    status: BatchStatus,
    progress: Option<String>,
    failures: Vec<String>,
}

impl Session {
    pub fn new(language: Language) -> Self {
        Self {
            language,
            ..Self::default()
        }
    }

    /// Enter `Analyzing`. Requires a credential and at least one file.
    ///
    /// Results from earlier batches are kept; new ones are appended.
    pub fn begin_batch(
        &mut self,
        file_count: usize,
        api_key: Option<&ApiKey>,
    ) -> Result<(), BatchError> {
        if self.status == BatchStatus::Analyzing {
            return Err(BatchError::AlreadyRunning);
        }
        if api_key.is_none() {
            return Err(BatchError::MissingApiKey);
        }
        if file_count == 0 {
            return Err(BatchError::NoFiles);
        }
        self.status = BatchStatus::Analyzing;
        self.progress = None;
        self.failures.clear();
        Ok(())
    }

    /// Fold one orchestrator event into the session.
    pub fn apply(&mut self, event: &BatchEvent) {
        match event {
            BatchEvent::Started { .. } => {}
            BatchEvent::Analyzing { .. } => self.progress = event.progress_message(),
            BatchEvent::PaperReady { paper, .. } => self.results.push(paper.as_ref().clone()),
            BatchEvent::FileFailed { .. } => {
                if let Some(msg) = event.progress_message() {
                    self.failures.push(msg);
                }
            }
            BatchEvent::Complete { .. } => {
                self.status = BatchStatus::Complete;
                self.progress = event.progress_message();
            }
        }
    }

    pub fn results(&self) -> &[AnalyzedPaper] {
        &self.results
    }

    pub fn find(&self, id: Uuid) -> Option<&AnalyzedPaper> {
        self.results.iter().find(|p| p.id == id)
    }

    pub fn language(&self) -> Language {
        self.language
    }

    /// Switch the language of every rendering. Results are untouched.
    pub fn set_language(&mut self, language: Language) {
        self.language = language;
    }

    pub fn status(&self) -> BatchStatus {
        self.status
    }

    pub fn progress(&self) -> Option<&str> {
        self.progress.as_deref()
    }

    /// Failure lines from the current or most recent batch.
    pub fn failures(&self) -> &[String] {
        &self.failures
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mock::sample_analysis;

    fn key() -> ApiKey {
        ApiKey::new("k").unwrap()
    }

    fn ready(index: usize, title: &str) -> BatchEvent {
        BatchEvent::PaperReady {
            index,
            total: 2,
            paper: Box::new(AnalyzedPaper::new(
                format!("{index}.pdf"),
                sample_analysis(title),
                None,
            )),
        }
    }

    #[test]
    fn begin_requires_key_and_files() {
        let mut session = Session::default();
        assert_eq!(session.begin_batch(1, None), Err(BatchError::MissingApiKey));
        assert_eq!(session.begin_batch(0, Some(&key())), Err(BatchError::NoFiles));
        assert_eq!(session.status(), BatchStatus::Idle);
        assert!(session.begin_batch(2, Some(&key())).is_ok());
        assert_eq!(session.status(), BatchStatus::Analyzing);
        assert_eq!(
            session.begin_batch(1, Some(&key())),
            Err(BatchError::AlreadyRunning)
        );
    }

    #[test]
    fn events_drive_lifecycle() {
        let mut session = Session::new(Language::Zh);
        session.begin_batch(2, Some(&key())).unwrap();
        session.apply(&BatchEvent::Analyzing {
            index: 0,
            total: 2,
            file_name: "0.pdf".into(),
        });
        assert_eq!(session.progress(), Some("Analyzing 1/2: 0.pdf..."));
        session.apply(&ready(0, "First"));
        assert_eq!(session.results().len(), 1);
        session.apply(&BatchEvent::FileFailed {
            index: 1,
            total: 2,
            file_name: "1.pdf".into(),
            error: "boom".into(),
        });
        session.apply(&BatchEvent::Complete {
            succeeded: 1,
            failed: 1,
        });
        assert_eq!(session.status(), BatchStatus::Complete);
        assert_eq!(session.progress(), Some("Batch Processing Complete."));
        assert_eq!(session.failures().len(), 1);
        assert_eq!(session.language(), Language::Zh);
    }

    #[test]
    fn complete_reenters_analyzing_and_appends() {
        let mut session = Session::default();
        session.begin_batch(1, Some(&key())).unwrap();
        session.apply(&ready(0, "First"));
        session.apply(&BatchEvent::Complete {
            succeeded: 1,
            failed: 0,
        });
        session.begin_batch(1, Some(&key())).unwrap();
        assert_eq!(session.status(), BatchStatus::Analyzing);
        session.apply(&ready(0, "Second"));
        let titles: Vec<_> = session
            .results()
            .iter()
            .map(|p| p.meta.paper_title.as_str())
            .collect();
        assert_eq!(titles, ["First", "Second"]);
        let id = session.results()[1].id;
        assert_eq!(session.find(id).unwrap().meta.paper_title, "Second");
    }

    #[test]
    fn language_switch_keeps_results() {
        let mut session = Session::default();
        session.begin_batch(1, Some(&key())).unwrap();
        session.apply(&ready(0, "First"));
        session.set_language(Language::Zh);
        assert_eq!(session.results().len(), 1);
        assert_eq!(session.language(), Language::Zh);
    }
}

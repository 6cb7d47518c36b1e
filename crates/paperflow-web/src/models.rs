use axum::response::sse::Event;
use paperflow_core::BatchEvent;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

// ── SSE Event Structs ───────────────────────────────────────────────────

#[derive(Debug, Serialize)]
pub struct StartedEvent {
    pub total: usize,
}

#[derive(Debug, Serialize)]
pub struct AnalyzingEvent {
    pub index: usize,
    pub total: usize,
    pub filename: String,
    pub message: String,
}

/// A finished paper, with its card markup ready to insert.
#[derive(Debug, Serialize)]
pub struct PaperEvent {
    pub index: usize,
    pub total: usize,
    pub id: Uuid,
    pub title: String,
    pub html: String,
}

#[derive(Debug, Serialize)]
pub struct FileFailedEvent {
    pub index: usize,
    pub total: usize,
    pub filename: String,
    pub error: String,
    pub message: String,
}

#[derive(Debug, Serialize)]
pub struct CompleteEvent {
    pub succeeded: usize,
    pub failed: usize,
    pub message: String,
}

#[derive(Debug, Serialize)]
pub struct ErrorEvent {
    pub message: String,
}

// ── Query strings ───────────────────────────────────────────────────────

#[derive(Debug, Default, Deserialize)]
pub struct CardsQuery {
    pub lang: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
pub struct ExportQuery {
    pub lang: Option<String>,
    pub format: Option<String>,
}

/// Build a named SSE event with a JSON payload.
pub fn sse_event<T: Serialize>(event_type: &str, data: &T) -> Event {
    Event::default()
        .event(event_type)
        .data(serde_json::to_string(data).unwrap_or_default())
}

/// Translate a batch event into its SSE name and payload. `card_html` is the
/// rendered card for `PaperReady`.
pub fn batch_sse(event: &BatchEvent, card_html: Option<String>) -> Event {
    let message = event.progress_message().unwrap_or_default();
    match event {
        BatchEvent::Started { total } => sse_event("started", &StartedEvent { total: *total }),
        BatchEvent::Analyzing {
            index,
            total,
            file_name,
        } => sse_event(
            "analyzing",
            &AnalyzingEvent {
                index: *index,
                total: *total,
                filename: file_name.clone(),
                message,
            },
        ),
        BatchEvent::PaperReady {
            index,
            total,
            paper,
        } => sse_event(
            "paper",
            &PaperEvent {
                index: *index,
                total: *total,
                id: paper.id,
                title: paper.meta.paper_title.clone(),
                html: card_html.unwrap_or_default(),
            },
        ),
        BatchEvent::FileFailed {
            index,
            total,
            file_name,
            error,
        } => sse_event(
            "file_failed",
            &FileFailedEvent {
                index: *index,
                total: *total,
                filename: file_name.clone(),
                error: error.clone(),
                message,
            },
        ),
        BatchEvent::Complete { succeeded, failed } => sse_event(
            "complete",
            &CompleteEvent {
                succeeded: *succeeded,
                failed: *failed,
                message,
            },
        ),
    }
}

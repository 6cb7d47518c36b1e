use axum::extract::{Multipart, State};
use axum::response::IntoResponse;
use axum::response::sse::{Event, KeepAlive, Sse};
use std::convert::Infallible;
use std::sync::Arc;
use tokio::sync::mpsc;
use tokio_stream::wrappers::UnboundedReceiverStream;

use paperflow_core::{Config, GeminiAnalyzer};

use crate::models::*;
use crate::state::AppState;
use crate::upload;

type EventSender = mpsc::UnboundedSender<Result<Event, Infallible>>;
type EventStream = UnboundedReceiverStream<Result<Event, Infallible>>;

/// Channel from the batch callback to the SSE response. Unbounded, so a
/// slow client never loses an event.
fn event_channel() -> (EventSender, EventStream) {
    let (tx, rx) = mpsc::unbounded_channel();
    (tx, UnboundedReceiverStream::new(rx))
}

pub async fn stream(State(state): State<Arc<AppState>>, multipart: Multipart) -> impl IntoResponse {
    let (tx, events) = event_channel();

    tokio::spawn(async move {
        if let Err(e) = handle_stream(state, multipart, tx.clone()).await {
            tracing::warn!(error = %e, "batch not started");
            let _ = tx.send(Ok(sse_event("error", &ErrorEvent { message: e })));
        }
    });

    Sse::new(events).keep_alive(KeepAlive::default())
}

async fn handle_stream(
    state: Arc<AppState>,
    multipart: Multipart,
    tx: EventSender,
) -> Result<(), String> {
    let fields = upload::parse_multipart(multipart).await?;

    // The credential is read at batch start, not at server start
    let config = Config::load(None);
    {
        let mut web = state.lock();
        web.session
            .begin_batch(fields.files.len(), config.api_key.as_ref())
            .map_err(|e| e.to_string())?;
        if let Some(language) = fields.language {
            web.session.set_language(language);
        }
    }

    let analyzer = match GeminiAnalyzer::from_config(&config) {
        Ok(analyzer) => analyzer,
        Err(e) => {
            // Close the batch so the session does not stay in Analyzing
            state.apply(&paperflow_core::BatchEvent::Complete {
                succeeded: 0,
                failed: 0,
            });
            return Err(e.to_string());
        }
    };

    let inputs = fields.files;
    let thumbnailer = Arc::clone(&state.thumbnailer);
    let tx_progress = tx.clone();
    let on_event = move |event: paperflow_core::BatchEvent| {
        let card_html = state.apply(&event);
        // Fails only once the client is gone; the batch still runs to
        // completion and results stay in the session.
        if tx_progress.send(Ok(batch_sse(&event, card_html))).is_err() {
            tracing::debug!("client disconnected, event not delivered");
        }
    };

    paperflow_core::run_batch(inputs, &analyzer, thumbnailer, on_event).await;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use paperflow_core::BatchEvent;
    use tokio_stream::StreamExt;

    #[tokio::test]
    async fn unread_events_are_all_delivered() {
        let (tx, events) = event_channel();
        let total = 500;
        for index in 0..total {
            let event = BatchEvent::FileFailed {
                index,
                total,
                file_name: format!("{}.pdf", index),
                error: "boom".into(),
            };
            assert!(tx.send(Ok(batch_sse(&event, None))).is_ok());
        }
        drop(tx);

        let received: Vec<_> = events.collect().await;
        assert_eq!(received.len(), total);
    }
}

//! Integration tests for [`run_batch`].
//!
//! These use the mock analyzer and thumbnailer so no HTTP requests are made
//! and no PDF library is needed.

use std::path::PathBuf;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use paperflow_core::mock::{MockAnalyzer, MockResponse, MockThumbnailer, sample_analysis};
use paperflow_core::{
    ApiKey, BatchEvent, BatchStatus, DocumentInput, DocumentSource, Language, Session,
    ThumbnailRenderer, run_batch,
};

fn pdf(name: &str) -> DocumentSource {
    DocumentInput::pdf(name, b"%PDF-1.7 dummy".to_vec()).into()
}

fn recorder() -> (Arc<Mutex<Vec<BatchEvent>>>, impl Fn(BatchEvent) + Send + Sync) {
    let events = Arc::new(Mutex::new(Vec::new()));
    let sink = Arc::clone(&events);
    (events, move |e| sink.lock().unwrap().push(e))
}

#[tokio::test]
async fn failing_middle_file_yields_two_of_three_in_order() {
    let analyzer = MockAnalyzer::with_sequence(vec![
        MockResponse::Sample,
        MockResponse::Error("backend exploded".into()),
        MockResponse::Sample,
    ]);
    let (events, on_event) = recorder();

    let outcome = run_batch(
        vec![pdf("alpha.pdf"), pdf("beta.pdf"), pdf("gamma.pdf")],
        &analyzer,
        Arc::new(MockThumbnailer::working()),
        on_event,
    )
    .await;

    let names: Vec<_> = outcome.papers.iter().map(|p| p.file_name.as_str()).collect();
    assert_eq!(names, ["alpha.pdf", "gamma.pdf"]);
    assert_eq!(outcome.failures.len(), 1);
    assert_eq!(outcome.failures[0].index, 1);
    assert_eq!(outcome.failures[0].file_name, "beta.pdf");
    assert!(outcome.failures[0].error.contains("backend exploded"));
    assert_eq!(analyzer.call_count(), 3);

    let events = events.lock().unwrap();
    assert!(matches!(
        events.last(),
        Some(BatchEvent::Complete {
            succeeded: 2,
            failed: 1
        })
    ));
}

#[tokio::test]
async fn files_are_processed_in_list_order() {
    let analyzer = MockAnalyzer::new(MockResponse::Sample).with_delay(Duration::from_millis(5));
    let (_, on_event) = recorder();
    let names = ["c.pdf", "a.pdf", "b.pdf", "d.pdf"];

    let outcome = run_batch(
        names.iter().map(|n| pdf(n)).collect(),
        &analyzer,
        Arc::new(MockThumbnailer::working()),
        on_event,
    )
    .await;

    assert_eq!(analyzer.seen_files(), names);
    let produced: Vec<_> = outcome.papers.iter().map(|p| p.file_name.as_str()).collect();
    assert_eq!(produced, names);
}

#[tokio::test]
async fn results_arrive_incrementally() {
    let analyzer = MockAnalyzer::new(MockResponse::Sample);
    let (events, on_event) = recorder();

    run_batch(
        vec![pdf("one.pdf"), pdf("two.pdf")],
        &analyzer,
        Arc::new(MockThumbnailer::working()),
        on_event,
    )
    .await;

    let events = events.lock().unwrap();
    let kinds: Vec<&str> = events
        .iter()
        .map(|e| match e {
            BatchEvent::Started { .. } => "started",
            BatchEvent::Analyzing { .. } => "analyzing",
            BatchEvent::PaperReady { .. } => "ready",
            BatchEvent::FileFailed { .. } => "failed",
            BatchEvent::Complete { .. } => "complete",
        })
        .collect();
    assert_eq!(
        kinds,
        ["started", "analyzing", "ready", "analyzing", "ready", "complete"]
    );
    let messages: Vec<String> = events.iter().filter_map(|e| e.progress_message()).collect();
    assert_eq!(messages[0], "Analyzing 1/2: one.pdf...");
    assert_eq!(messages[1], "Analyzing 2/2: two.pdf...");
    assert_eq!(messages[2], "Batch Processing Complete.");
}

#[tokio::test]
async fn all_failures_still_complete() {
    let analyzer = MockAnalyzer::new(MockResponse::RateLimited);
    let (events, on_event) = recorder();

    let outcome = run_batch(
        vec![pdf("a.pdf"), pdf("b.pdf")],
        &analyzer,
        Arc::new(MockThumbnailer::working()),
        on_event,
    )
    .await;

    assert!(outcome.papers.is_empty());
    assert_eq!(outcome.failures.len(), 2);
    assert!(outcome.failures[0].error.contains("429"));
    assert!(matches!(
        events.lock().unwrap().last(),
        Some(BatchEvent::Complete {
            succeeded: 0,
            failed: 2
        })
    ));
}

#[tokio::test]
async fn unreadable_file_fails_alone() {
    let analyzer = MockAnalyzer::new(MockResponse::Sample);
    let (_, on_event) = recorder();

    let outcome = run_batch(
        vec![
            DocumentSource::File(PathBuf::from("/nonexistent/paperflow/missing.pdf")),
            pdf("present.pdf"),
        ],
        &analyzer,
        Arc::new(MockThumbnailer::working()),
        on_event,
    )
    .await;

    assert_eq!(outcome.papers.len(), 1);
    assert_eq!(outcome.failures[0].file_name, "missing.pdf");
    assert!(outcome.failures[0].error.starts_with("failed to read file"));
    assert_eq!(analyzer.call_count(), 1);
}

#[tokio::test]
async fn preview_failure_does_not_fail_the_file() {
    let analyzer = MockAnalyzer::new(MockResponse::Sample);
    let thumbs = Arc::new(MockThumbnailer::failing());
    let renderer: Arc<dyn ThumbnailRenderer> = thumbs.clone();
    let (_, on_event) = recorder();

    let outcome = run_batch(vec![pdf("a.pdf")], &analyzer, renderer, on_event).await;

    assert_eq!(outcome.papers.len(), 1);
    assert!(outcome.papers[0].thumbnail.is_none());
    assert_eq!(thumbs.call_count(), 1);
}

#[tokio::test]
async fn repo_flag_follows_url() {
    let mut with_repo = sample_analysis("With Repo");
    with_repo.meta.github_url = Some("https://github.com/google-research/bert".into());
    let analyzer = MockAnalyzer::with_sequence(vec![
        MockResponse::Analysis(Box::new(with_repo)),
        MockResponse::Sample,
    ]);
    let (_, on_event) = recorder();

    let outcome = run_batch(
        vec![pdf("a.pdf"), pdf("b.pdf")],
        &analyzer,
        Arc::new(MockThumbnailer::working()),
        on_event,
    )
    .await;

    for paper in &outcome.papers {
        assert_eq!(paper.has_repo_link, paper.meta.github_url.is_some());
    }
    assert!(outcome.papers[0].has_repo_link);
    assert!(!outcome.papers[1].has_repo_link);
}

#[tokio::test]
async fn session_folds_batch_events() {
    let analyzer = MockAnalyzer::with_sequence(vec![
        MockResponse::Sample,
        MockResponse::Empty,
    ]);
    let session = Arc::new(Mutex::new(Session::new(Language::En)));
    session
        .lock()
        .unwrap()
        .begin_batch(2, ApiKey::new("test-key").as_ref())
        .unwrap();

    let sink = Arc::clone(&session);
    run_batch(
        vec![pdf("a.pdf"), pdf("b.pdf")],
        &analyzer,
        Arc::new(MockThumbnailer::working()),
        move |e| sink.lock().unwrap().apply(&e),
    )
    .await;

    let session = session.lock().unwrap();
    assert_eq!(session.status(), BatchStatus::Complete);
    assert_eq!(session.results().len(), 1);
    assert_eq!(session.failures().len(), 1);
    assert_eq!(session.progress(), Some("Batch Processing Complete."));
}

use axum::extract::{Query, State};
use axum::http::{StatusCode, header};
use axum::response::{IntoResponse, Response};
use std::sync::Arc;

use paperflow_core::Language;
use paperflow_reporting::{ExportFormat, export_filename, export_html, export_json};

use crate::models::ExportQuery;
use crate::state::AppState;

/// Download the current results as a standalone report.
pub async fn export(State(state): State<Arc<AppState>>, Query(query): Query<ExportQuery>) -> Response {
    let format = match query.format.as_deref().map(str::parse::<ExportFormat>) {
        Some(Ok(format)) => format,
        Some(Err(e)) => return (StatusCode::BAD_REQUEST, e).into_response(),
        None => ExportFormat::default(),
    };

    let (papers, session_language) = {
        let web = state.lock();
        (web.session.results().to_vec(), web.session.language())
    };
    let language = match query.lang.as_deref().map(str::parse::<Language>) {
        Some(Ok(lang)) => lang,
        Some(Err(e)) => return (StatusCode::BAD_REQUEST, e).into_response(),
        None => session_language,
    };

    if papers.is_empty() {
        return (StatusCode::NOT_FOUND, "No results to export").into_response();
    }

    let generated_at = chrono::Utc::now();
    let body = match format {
        ExportFormat::Html => export_html(&papers, language, generated_at),
        ExportFormat::Json => match export_json(&papers) {
            Ok(json) => json,
            Err(e) => {
                tracing::error!(error = %e, "JSON export failed");
                return (StatusCode::INTERNAL_SERVER_ERROR, e.to_string()).into_response();
            }
        },
    };

    let filename = export_filename(language, format, generated_at);
    tracing::info!(papers = papers.len(), %language, format = format.label(), "report downloaded");
    (
        [
            (header::CONTENT_TYPE, format.mime_type().to_string()),
            (
                header::CONTENT_DISPOSITION,
                format!("attachment; filename=\"{}\"", filename),
            ),
        ],
        body,
    )
        .into_response()
}

use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::response::{Html, IntoResponse, Response};
use std::sync::Arc;
use uuid::Uuid;

use paperflow_core::Language;

use crate::models::CardsQuery;
use crate::state::{AppState, LightboxAction};

/// All cards in the requested (or current) language.
pub async fn cards(State(state): State<Arc<AppState>>, Query(query): Query<CardsQuery>) -> Response {
    let language = match query.lang.as_deref().map(str::parse::<Language>) {
        Some(Ok(lang)) => Some(lang),
        Some(Err(e)) => return (StatusCode::BAD_REQUEST, e).into_response(),
        None => None,
    };
    Html(state.render_cards(language)).into_response()
}

pub async fn flip(State(state): State<Arc<AppState>>, Path(id): Path<Uuid>) -> Response {
    match state.flip(id) {
        Some(html) => Html(html).into_response(),
        None => not_found(id),
    }
}

pub async fn lightbox(
    State(state): State<Arc<AppState>>,
    Path((id, action)): Path<(Uuid, String)>,
) -> Response {
    let action = match action.parse::<LightboxAction>() {
        Ok(action) => action,
        Err(e) => return (StatusCode::BAD_REQUEST, e).into_response(),
    };
    match state.lightbox(id, action) {
        Some(html) => Html(html).into_response(),
        None => not_found(id),
    }
}

fn not_found(id: Uuid) -> Response {
    (StatusCode::NOT_FOUND, format!("No paper with id {}", id)).into_response()
}

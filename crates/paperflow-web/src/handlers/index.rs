use axum::extract::State;
use axum::response::Html;
use std::sync::Arc;

use crate::state::AppState;
use crate::template;

pub async fn index(State(state): State<Arc<AppState>>) -> Html<String> {
    let (language, cards) = {
        let cards = state.render_cards(None);
        (state.lock().session.language(), cards)
    };
    template::render_index(language, &cards)
}

use std::net::SocketAddr;
use std::sync::Arc;

use paperflow_core::{Config, DisabledThumbnails, ThumbnailRenderer};
use paperflow_pdf_mupdf::MupdfThumbnailer;
use tracing_subscriber::EnvFilter;

mod handlers;
mod models;
mod state;
mod template;
mod upload;

use state::AppState;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("paperflow=info")),
        )
        .init();

    // Preview and language settings are fixed for the process; the
    // credential is re-read for every batch.
    let config = Config::load(None);
    if config.api_key.is_none() {
        tracing::warn!("no Gemini API key configured; batches will be refused until one is set");
    }

    let thumbnailer: Arc<dyn ThumbnailRenderer> = if config.preview_enabled {
        Arc::new(
            MupdfThumbnailer::new()
                .with_scale(config.preview_scale)
                .with_quality(config.jpeg_quality),
        )
    } else {
        Arc::new(DisabledThumbnails)
    };

    let state = Arc::new(AppState::new(config.language, thumbnailer));

    // Allow multi-paper uploads (200MB)
    let body_limit = axum::extract::DefaultBodyLimit::max(200 * 1024 * 1024);

    let app = axum::Router::new()
        .route("/", axum::routing::get(handlers::index::index))
        .route(
            "/analyze/stream",
            axum::routing::post(handlers::stream::stream),
        )
        .route("/cards", axum::routing::get(handlers::cards::cards))
        .route("/cards/{id}/flip", axum::routing::post(handlers::cards::flip))
        .route(
            "/cards/{id}/lightbox/{action}",
            axum::routing::post(handlers::cards::lightbox),
        )
        .route("/export", axum::routing::get(handlers::export::export))
        .layer(body_limit)
        .with_state(state);

    let port: u16 = std::env::var("PORT")
        .ok()
        .and_then(|v| v.parse().ok())
        .unwrap_or(5001);
    let addr = SocketAddr::from(([0, 0, 0, 0], port));
    tracing::info!("Listening on http://{addr}");
    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}

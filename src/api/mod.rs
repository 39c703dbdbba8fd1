//! HTTP control surface for the preview deck
//!
//! Stands in for the page's DOM triggers: control activations arrive as
//! POSTs, visual state (icons, pulses, toasts) leaves as SSE events.

pub mod handlers;
pub mod sse;

use axum::{
    extract::State,
    response::Json,
    routing::{delete, get, post},
    Router,
};
use serde_json::json;
use std::sync::Arc;
use tower_http::{cors::CorsLayer, trace::TraceLayer};

use crate::events::EventBus;
use crate::notify::Notifier;
use crate::playback::Coordinator;

/// Application state shared across handlers
#[derive(Clone)]
pub struct AppState {
    pub coordinator: Arc<Coordinator>,
    pub notifier: Arc<Notifier>,
    pub bus: EventBus,
    pub port: u16,
}

/// Create the API router
pub fn create_router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health_check))
        .nest(
            "/api/v1",
            Router::new()
                .route("/tracks", get(handlers::get_tracks))
                .route("/playback/toggle/:slug", post(handlers::toggle))
                .route("/playback/state", get(handlers::get_state))
                .route("/download/:slug", post(handlers::download))
                .route("/toasts", get(handlers::get_toasts))
                .route("/toasts/:id", delete(handlers::dismiss_toast))
                .route("/events", get(sse::event_stream)),
        )
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(state)
}

/// Health check endpoint
async fn health_check(State(state): State<AppState>) -> Json<serde_json::Value> {
    Json(json!({
        "status": "ok",
        "module": "preview-deck",
        "version": env!("CARGO_PKG_VERSION"),
        "port": state.port,
        "tracks": state.coordinator.registry().len(),
    }))
}

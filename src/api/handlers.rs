//! HTTP request handlers
//!
//! Implements the playback, download, and toast endpoints.

use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use serde::Serialize;
use uuid::Uuid;

use crate::api::AppState;
use crate::download;
use crate::error::Error;
use crate::notify::Toast;
use crate::track::ControlIcon;

// ============================================================================
// Response Types
// ============================================================================

#[derive(Debug, Serialize)]
pub struct TrackInfo {
    pub slug: String,
    pub title: String,
    pub icon: ControlIcon,
    pub pulsing: bool,
    pub playing: bool,
    pub position_ms: u64,
    pub has_download: bool,
}

#[derive(Debug, Serialize)]
pub struct TracksResponse {
    pub tracks: Vec<TrackInfo>,
}

#[derive(Debug, Serialize)]
pub struct ActiveTrackInfo {
    pub slug: String,
    pub title: String,
    pub position_ms: u64,
}

#[derive(Debug, Serialize)]
pub struct StateResponse {
    pub active: Option<ActiveTrackInfo>,
    pub fading: bool,
}

#[derive(Debug, Serialize)]
pub struct ToggleResponse {
    pub status: String,
    pub slug: String,
}

#[derive(Debug, Serialize)]
pub struct DownloadResponse {
    pub slug: String,
    pub url: String,
}

#[derive(Debug, Serialize)]
pub struct ToastsResponse {
    pub toasts: Vec<Toast>,
}

#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub error: String,
}

fn error_response(error: &Error) -> (StatusCode, Json<ErrorResponse>) {
    let status = match error {
        Error::TrackNotFound(_) => StatusCode::NOT_FOUND,
        Error::InvalidState(_) => StatusCode::CONFLICT,
        _ => StatusCode::INTERNAL_SERVER_ERROR,
    };
    (
        status,
        Json(ErrorResponse {
            error: error.to_string(),
        }),
    )
}

// ============================================================================
// Handlers
// ============================================================================

/// GET /api/v1/tracks - registered preview tracks with control state
pub async fn get_tracks(State(state): State<AppState>) -> Json<TracksResponse> {
    let tracks = state
        .coordinator
        .registry()
        .iter()
        .map(|track| TrackInfo {
            slug: track.slug.clone(),
            title: track.title.clone(),
            icon: track.icon(),
            pulsing: track.is_pulsing(),
            playing: track.handle.is_playing(),
            position_ms: track.handle.position_ms(),
            has_download: track.download_url.is_some(),
        })
        .collect();
    Json(TracksResponse { tracks })
}

/// POST /api/v1/playback/toggle/:slug - control activation
///
/// Accepted requests complete asynchronously (fades and starts resolve on
/// their own schedule); the response only acknowledges arbitration.
pub async fn toggle(
    State(state): State<AppState>,
    Path(slug): Path<String>,
) -> Result<(StatusCode, Json<ToggleResponse>), (StatusCode, Json<ErrorResponse>)> {
    match state.coordinator.toggle(&slug).await {
        Ok(()) => Ok((
            StatusCode::ACCEPTED,
            Json(ToggleResponse {
                status: "accepted".to_string(),
                slug,
            }),
        )),
        Err(e) => Err(error_response(&e)),
    }
}

/// GET /api/v1/playback/state - current coordinator state
pub async fn get_state(State(state): State<AppState>) -> Json<StateResponse> {
    let active = state.coordinator.active().await.map(|track| ActiveTrackInfo {
        slug: track.slug.clone(),
        title: track.title.clone(),
        position_ms: track.handle.position_ms(),
    });
    Json(StateResponse {
        active,
        fading: state.coordinator.is_fading(),
    })
}

/// POST /api/v1/download/:slug - download affordance
pub async fn download(
    State(state): State<AppState>,
    Path(slug): Path<String>,
) -> Result<Json<DownloadResponse>, (StatusCode, Json<ErrorResponse>)> {
    match download::request_download(&state.coordinator, &slug).await {
        Ok(url) => Ok(Json(DownloadResponse { slug, url })),
        Err(e) => Err(error_response(&e)),
    }
}

/// GET /api/v1/toasts - currently visible toasts
pub async fn get_toasts(State(state): State<AppState>) -> Json<ToastsResponse> {
    Json(ToastsResponse {
        toasts: state.notifier.active().await,
    })
}

/// DELETE /api/v1/toasts/:id - direct user dismissal
pub async fn dismiss_toast(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> StatusCode {
    state.notifier.dismiss(id).await;
    StatusCode::NO_CONTENT
}

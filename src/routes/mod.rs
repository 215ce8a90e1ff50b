//! Router assembly.
//!
//! SYSTEM CONTEXT
//! ==============
//! One Axum router serves three audiences: viewers pulling the MJPEG
//! stream, the game-master console driving mutations through JSON POSTs,
//! and static files for both pages. CORS stays wide open; the server is
//! built for a trusted table-top LAN, not the public internet.

pub mod fog;
pub mod maps;
pub mod stream;
pub mod strokes;
pub mod tokens;

use axum::Router;
use axum::http::StatusCode;
use axum::response::Json;
use axum::routing::{get, post};
use serde::Serialize;
use tower_http::cors::{Any, CorsLayer};
use tower_http::services::ServeDir;
use tower_http::trace::TraceLayer;

use crate::state::AppState;

/// JSON error payload shared by every API route.
#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub success: bool,
    pub error: String,
}

/// Bare acknowledgement for mutations with nothing else to report.
#[derive(Debug, Serialize)]
pub struct OkResponse {
    pub success: bool,
}

pub(crate) fn error_response(
    status: StatusCode,
    error: impl Into<String>,
) -> (StatusCode, Json<ErrorResponse>) {
    (status, Json(ErrorResponse { success: false, error: error.into() }))
}

pub(crate) fn ok_response() -> Json<OkResponse> {
    Json(OkResponse { success: true })
}

/// Build the full application router.
pub fn app(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);
    let static_files =
        ServeDir::new(&state.config.static_dir).append_index_html_on_directories(true);

    Router::new()
        .route("/stream", get(stream::video_feed))
        .route("/api/state", get(maps::world_state))
        .route("/api/tokens", get(tokens::list_tokens))
        .route("/api/token_image", get(tokens::token_image))
        .route("/api/add_token", post(tokens::add_token))
        .route("/api/move_token", post(tokens::move_token))
        .route("/api/remove_token", post(tokens::remove_token))
        .route("/api/active_tokens", get(tokens::active_tokens))
        .route("/api/next_map", post(maps::next_map))
        .route("/api/prev_map", post(maps::prev_map))
        .route("/api/toggle_grid", post(maps::toggle_grid))
        .route("/api/toggle_fullscreen", post(maps::toggle_fullscreen))
        .route("/api/toggle_pause", post(maps::toggle_pause))
        .route("/api/add_stroke_point", post(strokes::add_stroke_point))
        .route("/api/end_stroke", post(strokes::end_stroke))
        .route("/api/clear_strokes", post(strokes::clear_strokes))
        .route("/api/reveal_fog", post(fog::reveal_fog))
        .route("/api/reset_fog", post(fog::reset_fog))
        .route("/api/clear_fog", post(fog::clear_fog))
        .route("/healthz", get(healthz))
        .fallback_service(static_files)
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

async fn healthz() -> StatusCode {
    StatusCode::OK
}

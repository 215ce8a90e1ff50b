//! Deck navigation, display toggles, and the world summary.

use axum::extract::State;
use axum::response::Json;
use serde::Serialize;

use crate::services::map::{self, MapSummary, WorldSummary};
use crate::state::AppState;

#[derive(Debug, Serialize)]
pub struct MapResponse {
    pub success: bool,
    pub map: MapSummary,
}

#[derive(Debug, Serialize)]
pub struct GridResponse {
    pub success: bool,
    pub grid_enabled: bool,
}

#[derive(Debug, Serialize)]
pub struct FullscreenResponse {
    pub success: bool,
    pub fullscreen: bool,
}

#[derive(Debug, Serialize)]
pub struct PauseResponse {
    pub success: bool,
    pub paused: bool,
}

/// `POST /api/next_map` advances the deck, parking on the last map.
pub async fn next_map(State(state): State<AppState>) -> Json<MapResponse> {
    let map = map::next_map(&state).await;
    Json(MapResponse { success: true, map })
}

/// `POST /api/prev_map` steps back, parking on the first map.
pub async fn prev_map(State(state): State<AppState>) -> Json<MapResponse> {
    let map = map::prev_map(&state).await;
    Json(MapResponse { success: true, map })
}

/// `POST /api/toggle_grid` flips the grid overlay on the current map.
pub async fn toggle_grid(State(state): State<AppState>) -> Json<GridResponse> {
    let grid_enabled = map::toggle_grid(&state).await;
    Json(GridResponse { success: true, grid_enabled })
}

/// `POST /api/toggle_fullscreen` flips the fullscreen flag for the GM display.
pub async fn toggle_fullscreen(State(state): State<AppState>) -> Json<FullscreenResponse> {
    let fullscreen = map::toggle_fullscreen(&state).await;
    Json(FullscreenResponse { success: true, fullscreen })
}

/// `POST /api/toggle_pause` pauses or resumes the stream.
pub async fn toggle_pause(State(state): State<AppState>) -> Json<PauseResponse> {
    let paused = map::toggle_pause(&state).await;
    Json(PauseResponse { success: true, paused })
}

/// `GET /api/state` reports the whole session for the console.
pub async fn world_state(State(state): State<AppState>) -> Json<WorldSummary> {
    Json(map::world_summary(&state).await)
}

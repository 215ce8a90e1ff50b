//! Fog of war routes.

use axum::extract::State;
use axum::http::StatusCode;
use axum::response::Json;
use serde::Deserialize;

use crate::routes::{ErrorResponse, OkResponse, error_response, ok_response};
use crate::services::fog::{self, FogError};
use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub struct RevealFogBody {
    /// Canvas-space `[x, y]`.
    pub center: [f64; 2],
    pub radius: f64,
}

/// `POST /api/reveal_fog` uncovers a circle around a canvas point.
pub async fn reveal_fog(
    State(state): State<AppState>,
    Json(body): Json<RevealFogBody>,
) -> Result<Json<OkResponse>, (StatusCode, Json<ErrorResponse>)> {
    let [x, y] = body.center;
    fog::reveal_fog(&state, x, y, body.radius)
        .await
        .map_err(fog_error_response)?;
    Ok(ok_response())
}

/// `POST /api/reset_fog` covers the whole map again.
pub async fn reset_fog(
    State(state): State<AppState>,
) -> Result<Json<OkResponse>, (StatusCode, Json<ErrorResponse>)> {
    fog::reset_fog(&state).await.map_err(fog_error_response)?;
    Ok(ok_response())
}

/// `POST /api/clear_fog` removes the mask entirely.
pub async fn clear_fog(State(state): State<AppState>) -> Json<OkResponse> {
    fog::clear_fog(&state).await;
    ok_response()
}

fn fog_error_response(err: FogError) -> (StatusCode, Json<ErrorResponse>) {
    let status = match err {
        FogError::NoMapImage => StatusCode::BAD_REQUEST,
    };
    error_response(status, err.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::state::test_helpers;

    #[test]
    fn blank_maps_map_to_bad_request() {
        let (status, Json(body)) = fog_error_response(FogError::NoMapImage);
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert!(!body.success);
        assert!(body.error.contains("no image"));
    }

    #[tokio::test]
    async fn reveal_fails_cleanly_on_the_blank_map() {
        let state = test_helpers::test_app_state();
        let result = reveal_fog(
            State(state),
            Json(RevealFogBody { center: [10.0, 10.0], radius: 30.0 }),
        )
        .await;
        let (status, _) = result.expect_err("blank map has nothing to mask");
        assert_eq!(status, StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn reveal_reset_clear_round_trip() {
        let state = test_helpers::test_app_state_with_deck(vec![test_helpers::named_map("cave")]);

        reveal_fog(
            State(state.clone()),
            Json(RevealFogBody { center: [100.0, 100.0], radius: 30.0 }),
        )
        .await
        .unwrap();
        assert!(state.world.read().await.current_map().fog.is_some());

        reset_fog(State(state.clone())).await.unwrap();
        let covered = {
            let world = state.world.read().await;
            world.current_map().fog.as_ref().unwrap().hidden_at(100, 100)
        };
        assert!(covered);

        let Json(acked) = clear_fog(State(state.clone())).await;
        assert!(acked.success);
        assert!(state.world.read().await.current_map().fog.is_none());
    }
}

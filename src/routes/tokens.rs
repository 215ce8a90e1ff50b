//! Token palette and placement routes.

use axum::extract::{Query, State};
use axum::http::StatusCode;
use axum::http::header::CONTENT_TYPE;
use axum::response::{IntoResponse, Json, Response};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::routes::{ErrorResponse, OkResponse, error_response, ok_response};
use crate::services::assets::{self, AssetError, TokenImage};
use crate::services::token::{self, TokenError};
use crate::state::{AppState, Token};

#[derive(Debug, Serialize)]
pub struct TokenListResponse {
    pub tokens: Vec<TokenImage>,
}

#[derive(Debug, Deserialize)]
pub struct TokenImageQuery {
    pub path: String,
}

#[derive(Debug, Deserialize)]
pub struct AddTokenBody {
    pub token_path: String,
    /// Canvas-space `[x, y]`.
    pub position: [f64; 2],
}

#[derive(Debug, Deserialize)]
pub struct MoveTokenBody {
    pub id: Uuid,
    pub position: [f64; 2],
}

#[derive(Debug, Deserialize)]
pub struct RemoveTokenBody {
    pub id: Uuid,
}

#[derive(Debug, Serialize)]
pub struct TokenResponse {
    pub success: bool,
    pub token: Token,
}

#[derive(Debug, Serialize)]
pub struct ActiveTokensResponse {
    pub tokens: Vec<Token>,
}

/// `GET /api/tokens` lists the artwork available for placement.
pub async fn list_tokens(State(state): State<AppState>) -> Json<TokenListResponse> {
    Json(TokenListResponse { tokens: assets::list_inventory(&state.config.tokens_dir) })
}

/// `GET /api/token_image?path=...` serves raw artwork bytes for the
/// console palette.
pub async fn token_image(
    State(state): State<AppState>,
    Query(query): Query<TokenImageQuery>,
) -> Response {
    let Ok(path) = assets::resolve_under(&state.config.tokens_dir, &query.path) else {
        return error_response(StatusCode::NOT_FOUND, "no such token image").into_response();
    };
    match tokio::fs::read(&path).await {
        Ok(bytes) => {
            ([(CONTENT_TYPE, assets::content_type_for(&query.path))], bytes).into_response()
        }
        Err(_) => error_response(StatusCode::NOT_FOUND, "no such token image").into_response(),
    }
}

/// `POST /api/add_token` places a token on the current map.
pub async fn add_token(
    State(state): State<AppState>,
    Json(body): Json<AddTokenBody>,
) -> Result<(StatusCode, Json<TokenResponse>), (StatusCode, Json<ErrorResponse>)> {
    let [x, y] = body.position;
    let token = token::add_token(&state, &body.token_path, x, y)
        .await
        .map_err(token_error_response)?;
    Ok((StatusCode::CREATED, Json(TokenResponse { success: true, token })))
}

/// `POST /api/move_token` repositions a token, clamped into the canvas.
pub async fn move_token(
    State(state): State<AppState>,
    Json(body): Json<MoveTokenBody>,
) -> Result<Json<TokenResponse>, (StatusCode, Json<ErrorResponse>)> {
    let [x, y] = body.position;
    let token = token::move_token(&state, body.id, x, y)
        .await
        .map_err(token_error_response)?;
    Ok(Json(TokenResponse { success: true, token }))
}

/// `POST /api/remove_token` deletes a token from the current map.
pub async fn remove_token(
    State(state): State<AppState>,
    Json(body): Json<RemoveTokenBody>,
) -> Result<Json<OkResponse>, (StatusCode, Json<ErrorResponse>)> {
    token::remove_token(&state, body.id).await.map_err(token_error_response)?;
    Ok(ok_response())
}

/// `GET /api/active_tokens` lists placed tokens in draw order.
pub async fn active_tokens(State(state): State<AppState>) -> Json<ActiveTokensResponse> {
    Json(ActiveTokensResponse { tokens: token::active_tokens(&state).await })
}

fn token_error_response(err: TokenError) -> (StatusCode, Json<ErrorResponse>) {
    let status = match &err {
        TokenError::NotFound(_)
        | TokenError::Asset(AssetError::NotFound(_) | AssetError::PathEscape(_)) => {
            StatusCode::NOT_FOUND
        }
        TokenError::Asset(AssetError::Decode { .. }) => StatusCode::BAD_REQUEST,
        TokenError::Asset(AssetError::Read { .. }) => StatusCode::INTERNAL_SERVER_ERROR,
    };
    error_response(status, err.to_string())
}

#[cfg(test)]
#[path = "tokens_test.rs"]
mod tests;

//! Token service: placement, movement, and removal on the current map.
//!
//! DESIGN
//! ======
//! `add_token` resolves the artwork through the asset cache BEFORE taking
//! the world lock, so decode I/O never stalls other writers and a broken
//! path fails with the world untouched. Every mutation holds the write lock
//! for a few map operations, releases it, then fires the dirty signal.
//! Concurrent moves of one token resolve last-write-wins in lock order.

use std::path::Path;

use uuid::Uuid;

use crate::services::assets::{self, AssetError};
use crate::state::{AppState, Token};

// =============================================================================
// TYPES
// =============================================================================

#[derive(Debug, thiserror::Error)]
pub enum TokenError {
    #[error("token not found: {0}")]
    NotFound(Uuid),
    #[error(transparent)]
    Asset(#[from] AssetError),
}

// =============================================================================
// ADD
// =============================================================================

/// Place a new token on the current map. The position is clamped into
/// canvas bounds, never rejected.
///
/// # Errors
///
/// Returns `Asset` if `image_path` escapes the tokens directory or cannot
/// be loaded. The world is unchanged on error.
pub async fn add_token(
    state: &AppState,
    image_path: &str,
    x: f64,
    y: f64,
) -> Result<Token, TokenError> {
    let abs = assets::resolve_under(&state.config.tokens_dir, image_path)?;

    // Warm the circular bitmap the compositor will ask for.
    let grid_size = { state.world.read().await.current_map().grid_size };
    state.assets.token_circle(&abs, grid_size).await?;

    let token = {
        let mut world = state.world.write().await;
        let (x, y) = world.clamp_position(x, y);
        let token = Token {
            id: Uuid::new_v4(),
            image_path: image_path.to_string(),
            name: display_name(image_path),
            x,
            y,
            z_index: 0,
            seq: world.take_seq(),
        };
        world.current_map_mut().tokens.insert(token.id, token.clone());
        token
    };
    state.mark_dirty();
    Ok(token)
}

// =============================================================================
// MOVE
// =============================================================================

/// Move a token on the current map to a new (clamped) position.
///
/// # Errors
///
/// Returns `NotFound` if the id is not on the current map.
pub async fn move_token(state: &AppState, id: Uuid, x: f64, y: f64) -> Result<Token, TokenError> {
    let updated = {
        let mut world = state.world.write().await;
        let (x, y) = world.clamp_position(x, y);
        let token = world
            .current_map_mut()
            .tokens
            .get_mut(&id)
            .ok_or(TokenError::NotFound(id))?;
        token.x = x;
        token.y = y;
        token.clone()
    };
    state.mark_dirty();
    Ok(updated)
}

// =============================================================================
// REMOVE
// =============================================================================

/// Remove a token from the current map.
///
/// # Errors
///
/// Returns `NotFound` if the id is not on the current map; the world is
/// unchanged in that case.
pub async fn remove_token(state: &AppState, id: Uuid) -> Result<(), TokenError> {
    {
        let mut world = state.world.write().await;
        if world.current_map_mut().tokens.remove(&id).is_none() {
            return Err(TokenError::NotFound(id));
        }
    }
    state.mark_dirty();
    Ok(())
}

// =============================================================================
// QUERY
// =============================================================================

/// Tokens on the current map, in draw order.
pub async fn active_tokens(state: &AppState) -> Vec<Token> {
    state.world.read().await.current_map().tokens_in_draw_order()
}

fn display_name(image_path: &str) -> String {
    Path::new(image_path)
        .file_stem()
        .and_then(|s| s.to_str())
        .unwrap_or(image_path)
        .to_string()
}

#[cfg(test)]
#[path = "token_test.rs"]
mod tests;

//! Fog of war over the current map.
//!
//! DESIGN
//! ======
//! The mask lives in map-image pixel space, so its dimensions always match
//! the source art rather than the letterboxed canvas. Reveal requests
//! arrive in canvas coordinates and are mapped through the inverse of the
//! scale-to-fit placement, radius included. The mask is shared
//! copy-on-write: snapshots hold the `Arc`, and a reveal on a shared mask
//! clones it once before mutating.
//!
//! A blank map has no image and therefore nothing to mask; fog requests
//! against it fail instead of covering an empty canvas.

use std::sync::Arc;

use crate::services::compositor::MapPlacement;
use crate::state::{AppState, FogMask};

#[derive(Debug, thiserror::Error)]
pub enum FogError {
    #[error("current map has no image to mask")]
    NoMapImage,
}

/// Reveal a circle of the map, laying down full fog first if none exists.
/// Center and radius are canvas-space.
///
/// # Errors
///
/// Returns `NoMapImage` on a blank map.
pub async fn reveal_fog(state: &AppState, x: f64, y: f64, radius: f64) -> Result<(), FogError> {
    {
        let mut world = state.world.write().await;
        let canvas = (world.canvas_width, world.canvas_height);
        let map = world.current_map_mut();
        let (width, height) = map.image_size.ok_or(FogError::NoMapImage)?;

        let placement = MapPlacement::fit(width, height, canvas.0, canvas.1);
        let (mx, my) = placement.canvas_to_image(x, y);
        let mask = map
            .fog
            .get_or_insert_with(|| Arc::new(FogMask::covered(width, height)));
        Arc::make_mut(mask).reveal_circle(mx, my, radius / placement.scale);
    }
    state.mark_dirty();
    Ok(())
}

/// Cover the whole map with fresh fog.
///
/// # Errors
///
/// Returns `NoMapImage` on a blank map.
pub async fn reset_fog(state: &AppState) -> Result<(), FogError> {
    {
        let mut world = state.world.write().await;
        let map = world.current_map_mut();
        let (width, height) = map.image_size.ok_or(FogError::NoMapImage)?;
        map.fog = Some(Arc::new(FogMask::covered(width, height)));
    }
    state.mark_dirty();
    Ok(())
}

/// Drop the fog entirely. Returns whether there was any to drop.
pub async fn clear_fog(state: &AppState) -> bool {
    let had_fog = {
        let mut world = state.world.write().await;
        world.current_map_mut().fog.take().is_some()
    };
    if had_fog {
        state.mark_dirty();
    }
    had_fog
}

#[cfg(test)]
#[path = "fog_test.rs"]
mod tests;

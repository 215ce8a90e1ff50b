//! Map deck construction, navigation, and display toggles.
//!
//! DESIGN
//! ======
//! The deck is built once at startup by scanning the maps directory. Each
//! image file becomes one `MapState` whose pixel dimensions are read from
//! the file header without decoding the full image. Navigation saturates at
//! both ends of the deck rather than wrapping, so repeated "next" presses
//! park on the last map instead of looping back to the first.
//!
//! Toggles flip a single flag under the write lock and return the new value
//! so route handlers can echo it back without re-reading the world.

use serde::Serialize;
use tracing::warn;
use uuid::Uuid;

use crate::config::AppConfig;
use crate::services::assets;
use crate::state::{AppState, MapState, World};

// =============================================================================
// TYPES
// =============================================================================

/// Summary of the current map after a deck mutation.
#[derive(Debug, Clone, Serialize)]
pub struct MapSummary {
    pub id: Uuid,
    pub name: String,
    pub index: usize,
    pub deck_len: usize,
    pub grid_enabled: bool,
}

/// Read-only snapshot of world state for the control console.
#[derive(Debug, Clone, Serialize)]
pub struct WorldSummary {
    pub map_id: Uuid,
    pub map_name: String,
    pub map_index: usize,
    pub deck_len: usize,
    pub grid_enabled: bool,
    pub grid_size: u32,
    pub canvas_width: u32,
    pub canvas_height: u32,
    pub token_count: usize,
    pub stroke_count: usize,
    pub fog_active: bool,
    pub fullscreen: bool,
    pub paused: bool,
}

// =============================================================================
// DECK CONSTRUCTION
// =============================================================================

/// Scan the maps directory and build the startup deck.
///
/// Files whose headers cannot be read are skipped with a warning rather
/// than aborting startup. An empty result is valid; `World::new` falls
/// back to a single blank map.
#[must_use]
pub fn build_deck(config: &AppConfig) -> Vec<MapState> {
    let mut deck = Vec::new();
    for path in assets::image_files(&config.maps_dir) {
        let dims = match image::image_dimensions(&path) {
            Ok(dims) => dims,
            Err(e) => {
                warn!(path = %path.display(), error = %e, "skipping unreadable map image");
                continue;
            }
        };
        let name = path
            .file_stem()
            .map_or_else(|| "map".to_string(), |stem| stem.to_string_lossy().into_owned());
        deck.push(MapState::new(
            &name,
            Some(path),
            Some(dims),
            config.grid_size,
            config.grid_enabled,
        ));
    }
    deck
}

// =============================================================================
// NAVIGATION
// =============================================================================

/// Advance to the next map in the deck, saturating at the end.
pub async fn next_map(state: &AppState) -> MapSummary {
    let (summary, changed) = {
        let mut world = state.world.write().await;
        let changed = world.current + 1 < world.deck.len();
        if changed {
            world.current += 1;
        }
        (summary_of(&world), changed)
    };
    if changed {
        state.mark_dirty();
    }
    summary
}

/// Step back to the previous map in the deck, saturating at the start.
pub async fn prev_map(state: &AppState) -> MapSummary {
    let (summary, changed) = {
        let mut world = state.world.write().await;
        let changed = world.current > 0;
        if changed {
            world.current -= 1;
        }
        (summary_of(&world), changed)
    };
    if changed {
        state.mark_dirty();
    }
    summary
}

// =============================================================================
// TOGGLES
// =============================================================================

/// Flip the grid overlay on the current map. Returns the new setting.
pub async fn toggle_grid(state: &AppState) -> bool {
    let enabled = {
        let mut world = state.world.write().await;
        let map = world.current_map_mut();
        map.grid_enabled = !map.grid_enabled;
        map.grid_enabled
    };
    state.mark_dirty();
    enabled
}

/// Flip the fullscreen flag read by the GM display. Returns the new value.
pub async fn toggle_fullscreen(state: &AppState) -> bool {
    let fullscreen = {
        let mut world = state.world.write().await;
        world.fullscreen = !world.fullscreen;
        world.fullscreen
    };
    state.mark_dirty();
    fullscreen
}

/// Pause or resume the stream. Returns true when now paused.
pub async fn toggle_pause(state: &AppState) -> bool {
    let paused = {
        let mut world = state.world.write().await;
        world.stream_paused = !world.stream_paused;
        world.stream_paused
    };
    state.mark_dirty();
    paused
}

// =============================================================================
// QUERIES
// =============================================================================

/// Snapshot the world into a serializable summary for `/api/state`.
pub async fn world_summary(state: &AppState) -> WorldSummary {
    let world = state.world.read().await;
    let map = world.current_map();
    WorldSummary {
        map_id: map.id,
        map_name: map.name.clone(),
        map_index: world.current,
        deck_len: world.deck.len(),
        grid_enabled: map.grid_enabled,
        grid_size: map.grid_size,
        canvas_width: world.canvas_width,
        canvas_height: world.canvas_height,
        token_count: map.tokens.len(),
        stroke_count: map.strokes.len(),
        fog_active: map.fog.is_some(),
        fullscreen: world.fullscreen,
        paused: world.stream_paused,
    }
}

fn summary_of(world: &World) -> MapSummary {
    let map = world.current_map();
    MapSummary {
        id: map.id,
        name: map.name.clone(),
        index: world.current,
        deck_len: world.deck.len(),
        grid_enabled: map.grid_enabled,
    }
}

#[cfg(test)]
#[path = "map_test.rs"]
mod tests;

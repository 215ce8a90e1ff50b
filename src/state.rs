//! Shared application state.
//!
//! DESIGN
//! ======
//! `AppState` is injected into Axum handlers via the `State` extractor. It
//! holds the world behind a single `RwLock`, the decoded-artwork cache, the
//! frame broadcaster, and the dirty signal that wakes the render loop.
//! Mutations take the write lock for the in-memory update only (asset I/O
//! happens before the lock) and fire the dirty signal after releasing it,
//! so the render loop always snapshots committed state.

use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tokio::sync::{Notify, RwLock};
use uuid::Uuid;

use crate::broadcast::FrameBroadcaster;
use crate::config::AppConfig;
use crate::services::assets::AssetCache;

// =============================================================================
// GEOMETRY
// =============================================================================

/// A position in canvas space.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Point {
    pub x: f64,
    pub y: f64,
}

// =============================================================================
// TOKEN
// =============================================================================

/// A token placed on a map. Position is the token's center in canvas space.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Token {
    pub id: Uuid,
    /// Artwork path relative to the tokens directory.
    pub image_path: String,
    pub name: String,
    pub x: f64,
    pub y: f64,
    pub z_index: i32,
    /// Process-wide insertion counter; breaks z-index ties in draw order.
    pub seq: u64,
}

// =============================================================================
// STROKE
// =============================================================================

/// One recorded drawing gesture: ordered canvas-space points with pen settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Stroke {
    pub id: Uuid,
    /// CSS hex color, `#RRGGBB`.
    pub color: String,
    /// Pen width in pixels.
    pub width: f32,
    pub points: Vec<Point>,
}

// =============================================================================
// FOG MASK
// =============================================================================

/// Hidden-area mask with the same pixel dimensions as its map's source
/// image. 255 = hidden, 0 = revealed.
#[derive(Debug, Clone, PartialEq)]
pub struct FogMask {
    pub width: u32,
    pub height: u32,
    mask: Vec<u8>,
}

impl FogMask {
    /// A mask hiding the entire image.
    #[must_use]
    pub fn covered(width: u32, height: u32) -> Self {
        Self { width, height, mask: vec![255; (width as usize) * (height as usize)] }
    }

    #[must_use]
    pub fn hidden_at(&self, x: u32, y: u32) -> bool {
        if x >= self.width || y >= self.height {
            return false;
        }
        self.mask[(y as usize) * (self.width as usize) + (x as usize)] >= 128
    }

    /// Reveal a filled circle. Center and radius are in mask (image) space;
    /// areas outside the mask are ignored.
    #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss, clippy::cast_precision_loss)]
    pub fn reveal_circle(&mut self, cx: f64, cy: f64, radius: f64) {
        if self.width == 0 || self.height == 0 {
            return;
        }
        let r = radius.max(0.0);
        let x0 = ((cx - r).floor() as i64).clamp(0, i64::from(self.width) - 1);
        let x1 = ((cx + r).ceil() as i64).clamp(0, i64::from(self.width) - 1);
        let y0 = ((cy - r).floor() as i64).clamp(0, i64::from(self.height) - 1);
        let y1 = ((cy + r).ceil() as i64).clamp(0, i64::from(self.height) - 1);

        for y in y0..=y1 {
            for x in x0..=x1 {
                let dx = x as f64 - cx;
                let dy = y as f64 - cy;
                if dx * dx + dy * dy <= r * r {
                    self.mask[(y as usize) * (self.width as usize) + (x as usize)] = 0;
                }
            }
        }
    }
}

// =============================================================================
// MAP STATE
// =============================================================================

/// One battlemap in the deck, with its per-map tokens and overlays.
#[derive(Debug, Clone)]
pub struct MapState {
    pub id: Uuid,
    pub name: String,
    /// `None` for the blank placeholder used when the maps directory is empty.
    pub image_path: Option<PathBuf>,
    /// Source image dimensions, read from the file header at deck build.
    pub image_size: Option<(u32, u32)>,
    pub grid_enabled: bool,
    pub grid_size: u32,
    pub fog: Option<Arc<FogMask>>,
    pub tokens: HashMap<Uuid, Token>,
    pub strokes: Vec<Stroke>,
    /// Id of the stroke currently being drawn. When set, that stroke is the
    /// last element of `strokes`.
    pub open_stroke: Option<Uuid>,
}

impl MapState {
    #[must_use]
    pub fn new(
        name: &str,
        image_path: Option<PathBuf>,
        image_size: Option<(u32, u32)>,
        grid_size: u32,
        grid_enabled: bool,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            name: name.to_string(),
            image_path,
            image_size,
            grid_enabled,
            grid_size,
            fog: None,
            tokens: HashMap::new(),
            strokes: Vec::new(),
            open_stroke: None,
        }
    }

    /// The placeholder map shown when no map images are on disk.
    #[must_use]
    pub fn blank(grid_size: u32, grid_enabled: bool) -> Self {
        Self::new("blank", None, None, grid_size, grid_enabled)
    }

    /// Tokens in draw order: ascending z-index, ties by insertion sequence.
    #[must_use]
    pub fn tokens_in_draw_order(&self) -> Vec<Token> {
        let mut tokens: Vec<Token> = self.tokens.values().cloned().collect();
        tokens.sort_by_key(|t| (t.z_index, t.seq));
        tokens
    }
}

// =============================================================================
// WORLD
// =============================================================================

/// The single source of truth for the session. Exclusively owned behind
/// `AppState::world`; the deck is never empty and `current` is always a
/// valid index into it.
#[derive(Debug, Clone)]
pub struct World {
    pub canvas_width: u32,
    pub canvas_height: u32,
    pub deck: Vec<MapState>,
    pub current: usize,
    next_seq: u64,
    pub fullscreen: bool,
    pub stream_paused: bool,
}

impl World {
    /// Build a world over `deck`, falling back to the blank map when the
    /// deck is empty.
    #[must_use]
    pub fn new(config: &AppConfig, deck: Vec<MapState>) -> Self {
        let deck = if deck.is_empty() {
            vec![MapState::blank(config.grid_size, config.grid_enabled)]
        } else {
            deck
        };
        Self {
            canvas_width: config.canvas_width,
            canvas_height: config.canvas_height,
            deck,
            current: 0,
            next_seq: 1,
            fullscreen: false,
            stream_paused: false,
        }
    }

    #[must_use]
    pub fn current_map(&self) -> &MapState {
        &self.deck[self.current]
    }

    pub fn current_map_mut(&mut self) -> &mut MapState {
        &mut self.deck[self.current]
    }

    /// Clamp a canvas-space position into bounds. Both edges are inclusive:
    /// a token at `x == canvas_width` sits on the right border.
    #[must_use]
    pub fn clamp_position(&self, x: f64, y: f64) -> (f64, f64) {
        (
            x.clamp(0.0, f64::from(self.canvas_width)),
            y.clamp(0.0, f64::from(self.canvas_height)),
        )
    }

    /// Next value of the process-wide insertion counter.
    pub fn take_seq(&mut self) -> u64 {
        let seq = self.next_seq;
        self.next_seq += 1;
        seq
    }

    /// Deep, consistent copy for the compositor. Never observes a
    /// partially-applied mutation because the caller holds the read lock.
    #[must_use]
    pub fn snapshot(&self) -> WorldSnapshot {
        WorldSnapshot {
            canvas_width: self.canvas_width,
            canvas_height: self.canvas_height,
            map: self.current_map().clone(),
            deck_index: self.current,
            deck_len: self.deck.len(),
            fullscreen: self.fullscreen,
            stream_paused: self.stream_paused,
        }
    }
}

/// Read-only copy of the renderable world, taken under the world lock.
#[derive(Debug, Clone)]
pub struct WorldSnapshot {
    pub canvas_width: u32,
    pub canvas_height: u32,
    pub map: MapState,
    pub deck_index: usize,
    pub deck_len: usize,
    pub fullscreen: bool,
    pub stream_paused: bool,
}

// =============================================================================
// APP STATE
// =============================================================================

/// Shared application state, injected into Axum handlers via State extractor.
/// Clone is required by Axum; all inner fields are Arc-wrapped or Clone.
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<AppConfig>,
    pub world: Arc<RwLock<World>>,
    pub assets: AssetCache,
    pub broadcaster: FrameBroadcaster,
    /// Wakes the render loop after a mutation commits.
    pub dirty: Arc<Notify>,
}

impl AppState {
    #[must_use]
    pub fn new(config: AppConfig, world: World) -> Self {
        Self {
            config: Arc::new(config),
            world: Arc::new(RwLock::new(world)),
            assets: AssetCache::new(),
            broadcaster: FrameBroadcaster::new(),
            dirty: Arc::new(Notify::new()),
        }
    }

    /// Signal the render loop that the world changed. Call after the write
    /// lock is released.
    pub fn mark_dirty(&self) {
        self.dirty.notify_one();
    }
}

// =============================================================================
// TEST HELPERS
// =============================================================================

//! Frame composition: world snapshot in, RGBA canvas out.
//!
//! DESIGN
//! ======
//! `compose` is a pure function of a `WorldSnapshot` plus pre-fetched
//! bitmaps, so it holds no locks, does no I/O, and can sit inside a panic
//! guard. Layer order is fixed: black letterbox, scaled map, grid,
//! strokes, tokens, fog. The fog mask lives in map-image pixel space;
//! `MapPlacement` converts between canvas and image coordinates for both
//! reveal requests and the final occlusion pass.
//!
//! Asset fetching happens separately in `gather_assets` because the cache
//! is async and composition is not. Missing artwork never fails a frame;
//! tokens degrade to a placeholder disc and the map to a bare canvas.

use std::collections::HashMap;
use std::sync::Arc;

use image::codecs::jpeg::JpegEncoder;
use image::imageops;
use image::{ExtendedColorType, ImageEncoder, Pixel, Rgba, RgbaImage};
use tracing::warn;
use uuid::Uuid;

use crate::services::assets;
use crate::state::{AppState, FogMask, Stroke, Token, WorldSnapshot};

// =============================================================================
// CONSTANTS
// =============================================================================

const CANVAS_BACKGROUND: Rgba<u8> = Rgba([0, 0, 0, 255]);
const GRID_COLOR: Rgba<u8> = Rgba([100, 100, 100, 128]);
const FOG_COLOR: Rgba<u8> = Rgba([10, 10, 10, 255]);
const PAUSE_BACKGROUND: Rgba<u8> = Rgba([40, 40, 40, 255]);
const PAUSE_BAR_COLOR: Rgba<u8> = Rgba([230, 230, 230, 255]);
const STROKE_FALLBACK_COLOR: Rgba<u8> = Rgba([255, 0, 0, 255]);
const PLACEHOLDER_FILL: Rgba<u8> = Rgba([255, 0, 0, 255]);
const PLACEHOLDER_RING: Rgba<u8> = Rgba([255, 255, 255, 255]);
const PLACEHOLDER_RING_WIDTH: f64 = 2.0;

// =============================================================================
// PLACEMENT
// =============================================================================

/// Scale-to-fit placement of a map image on the canvas.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MapPlacement {
    pub scale: f64,
    pub offset_x: u32,
    pub offset_y: u32,
    pub scaled_width: u32,
    pub scaled_height: u32,
}

impl MapPlacement {
    /// Fit an image inside the canvas preserving aspect ratio, centered.
    /// Scaled dimensions truncate, so the map never overhangs the canvas.
    #[must_use]
    #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
    pub fn fit(image_width: u32, image_height: u32, canvas_width: u32, canvas_height: u32) -> Self {
        let scale = (f64::from(canvas_width) / f64::from(image_width.max(1)))
            .min(f64::from(canvas_height) / f64::from(image_height.max(1)));
        let scaled_width = ((f64::from(image_width) * scale) as u32).max(1);
        let scaled_height = ((f64::from(image_height) * scale) as u32).max(1);
        Self {
            scale,
            offset_x: canvas_width.saturating_sub(scaled_width) / 2,
            offset_y: canvas_height.saturating_sub(scaled_height) / 2,
            scaled_width,
            scaled_height,
        }
    }

    /// Map a canvas-space point into map-image pixel space.
    #[must_use]
    pub fn canvas_to_image(&self, x: f64, y: f64) -> (f64, f64) {
        (
            (x - f64::from(self.offset_x)) / self.scale,
            (y - f64::from(self.offset_y)) / self.scale,
        )
    }
}

// =============================================================================
// ASSET GATHERING
// =============================================================================

/// Decoded bitmaps fetched ahead of composition.
#[derive(Debug, Default)]
pub struct RenderAssets {
    pub base: Option<Arc<RgbaImage>>,
    pub tokens: HashMap<Uuid, Arc<RgbaImage>>,
}

/// Fetch every bitmap `compose` will need for this snapshot. Broken or
/// missing artwork is logged and skipped; affected tokens fall back to a
/// placeholder disc at composition time.
pub async fn gather_assets(state: &AppState, snapshot: &WorldSnapshot) -> RenderAssets {
    let mut gathered = RenderAssets::default();

    if let (Some(path), Some((width, height))) = (&snapshot.map.image_path, snapshot.map.image_size)
    {
        let placement =
            MapPlacement::fit(width, height, snapshot.canvas_width, snapshot.canvas_height);
        match state
            .assets
            .base_scaled(path, placement.scaled_width, placement.scaled_height)
            .await
        {
            Ok(base) => gathered.base = Some(base),
            Err(e) => warn!(path = %path.display(), error = %e, "map image unavailable"),
        }
    }

    let diameter = snapshot.map.grid_size;
    for token in snapshot.map.tokens.values() {
        let art = match assets::resolve_under(&state.config.tokens_dir, &token.image_path) {
            Ok(path) => state.assets.token_circle(&path, diameter).await,
            Err(e) => Err(e),
        };
        match art {
            Ok(circle) => {
                gathered.tokens.insert(token.id, circle);
            }
            Err(e) => {
                warn!(token = %token.id, path = %token.image_path, error = %e, "token art unavailable");
            }
        }
    }
    gathered
}

// =============================================================================
// COMPOSITION
// =============================================================================

/// Compose one frame. Pure: no locks, no I/O, no await.
#[must_use]
pub fn compose(snapshot: &WorldSnapshot, assets: &RenderAssets) -> RgbaImage {
    if snapshot.stream_paused {
        return pause_card(snapshot.canvas_width, snapshot.canvas_height);
    }

    let mut canvas = RgbaImage::from_pixel(
        snapshot.canvas_width,
        snapshot.canvas_height,
        CANVAS_BACKGROUND,
    );

    let placement = snapshot.map.image_size.map(|(width, height)| {
        MapPlacement::fit(width, height, snapshot.canvas_width, snapshot.canvas_height)
    });

    if let (Some(base), Some(placement)) = (&assets.base, placement) {
        imageops::overlay(
            &mut canvas,
            base.as_ref(),
            i64::from(placement.offset_x),
            i64::from(placement.offset_y),
        );
        if snapshot.map.grid_enabled {
            draw_grid(&mut canvas, placement, snapshot.map.grid_size);
        }
    }

    for stroke in &snapshot.map.strokes {
        draw_stroke(&mut canvas, stroke);
    }

    let diameter = snapshot.map.grid_size;
    for token in snapshot.map.tokens_in_draw_order() {
        draw_token(&mut canvas, &token, assets.tokens.get(&token.id), diameter);
    }

    if let (Some(fog), Some(placement)) = (&snapshot.map.fog, placement) {
        draw_fog(&mut canvas, fog, placement);
    }

    canvas
}

/// Grid lines over the map rectangle only, alpha-blended so the map shows
/// through.
fn draw_grid(canvas: &mut RgbaImage, placement: MapPlacement, grid_size: u32) {
    if grid_size == 0 {
        return;
    }
    let x_end = placement.offset_x + placement.scaled_width;
    let y_end = placement.offset_y + placement.scaled_height;

    let mut x = placement.offset_x;
    while x < x_end {
        for y in placement.offset_y..y_end {
            canvas.get_pixel_mut(x, y).blend(&GRID_COLOR);
        }
        x += grid_size;
    }
    let mut y = placement.offset_y;
    while y < y_end {
        for x in placement.offset_x..x_end {
            canvas.get_pixel_mut(x, y).blend(&GRID_COLOR);
        }
        y += grid_size;
    }
}

/// A stroke is stamped as one opaque disc per recorded point plus discs
/// along each segment at roughly one-pixel spacing, which is how a round
/// pen looks without an anti-aliased line rasterizer.
#[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
fn draw_stroke(canvas: &mut RgbaImage, stroke: &Stroke) {
    let color = parse_hex_color(&stroke.color).unwrap_or(STROKE_FALLBACK_COLOR);
    let radius = f64::from(stroke.width) / 2.0;

    for point in &stroke.points {
        stamp_disc(canvas, point.x, point.y, radius, color);
    }
    for pair in stroke.points.windows(2) {
        let (a, b) = (pair[0], pair[1]);
        let dx = b.x - a.x;
        let dy = b.y - a.y;
        let length = (dx * dx + dy * dy).sqrt();
        if length <= f64::EPSILON {
            continue;
        }
        let steps = length.ceil() as u32;
        for i in 1..steps {
            let t = f64::from(i) / f64::from(steps);
            stamp_disc(canvas, a.x + dx * t, a.y + dy * t, radius, color);
        }
    }
}

fn draw_token(canvas: &mut RgbaImage, token: &Token, art: Option<&Arc<RgbaImage>>, diameter: u32) {
    match art {
        Some(circle) => {
            #[allow(clippy::cast_possible_truncation)]
            let x = (token.x - f64::from(circle.width()) / 2.0).round() as i64;
            #[allow(clippy::cast_possible_truncation)]
            let y = (token.y - f64::from(circle.height()) / 2.0).round() as i64;
            imageops::overlay(canvas, circle.as_ref(), x, y);
        }
        None => placeholder_disc(canvas, token.x, token.y, f64::from(diameter.max(1)) / 2.0),
    }
}

/// Occlude hidden map areas. The mask is in image space, so each canvas
/// pixel inside the map rectangle samples the mask through the placement
/// transform at its center.
#[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
fn draw_fog(canvas: &mut RgbaImage, fog: &FogMask, placement: MapPlacement) {
    let x_end = placement.offset_x + placement.scaled_width;
    let y_end = placement.offset_y + placement.scaled_height;

    for y in placement.offset_y..y_end {
        for x in placement.offset_x..x_end {
            let (mx, my) =
                placement.canvas_to_image(f64::from(x) + 0.5, f64::from(y) + 0.5);
            if mx < 0.0 || my < 0.0 {
                continue;
            }
            if fog.hidden_at(mx as u32, my as u32) {
                canvas.put_pixel(x, y, FOG_COLOR);
            }
        }
    }
}

/// Full-frame card shown while the stream is paused: a dark background
/// with a two-bar pause glyph, so viewers see a deliberate hold rather
/// than a stalled feed.
fn pause_card(width: u32, height: u32) -> RgbaImage {
    let mut card = RgbaImage::from_pixel(width, height, PAUSE_BACKGROUND);

    let bar_height = height / 4;
    let bar_width = (width / 40).max(4);
    let gap = bar_width;
    let top = height.saturating_sub(bar_height) / 2;
    let center = width / 2;
    let bars = [center.saturating_sub(gap / 2 + bar_width), center + gap.div_ceil(2)];

    for bar_x in bars {
        for x in bar_x..(bar_x + bar_width).min(width) {
            for y in top..(top + bar_height).min(height) {
                card.put_pixel(x, y, PAUSE_BAR_COLOR);
            }
        }
    }
    card
}

// =============================================================================
// PRIMITIVES
// =============================================================================

#[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss, clippy::cast_precision_loss)]
fn stamp_disc(canvas: &mut RgbaImage, cx: f64, cy: f64, radius: f64, color: Rgba<u8>) {
    let (width, height) = canvas.dimensions();
    if width == 0 || height == 0 {
        return;
    }
    let r = radius.max(0.5);
    let x0 = ((cx - r).floor() as i64).clamp(0, i64::from(width) - 1);
    let x1 = ((cx + r).ceil() as i64).clamp(0, i64::from(width) - 1);
    let y0 = ((cy - r).floor() as i64).clamp(0, i64::from(height) - 1);
    let y1 = ((cy + r).ceil() as i64).clamp(0, i64::from(height) - 1);

    for y in y0..=y1 {
        for x in x0..=x1 {
            let dx = x as f64 + 0.5 - cx;
            let dy = y as f64 + 0.5 - cy;
            if dx * dx + dy * dy <= r * r {
                canvas.put_pixel(x as u32, y as u32, color);
            }
        }
    }
}

#[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss, clippy::cast_precision_loss)]
fn placeholder_disc(canvas: &mut RgbaImage, cx: f64, cy: f64, radius: f64) {
    let (width, height) = canvas.dimensions();
    if width == 0 || height == 0 {
        return;
    }
    let x0 = ((cx - radius).floor() as i64).clamp(0, i64::from(width) - 1);
    let x1 = ((cx + radius).ceil() as i64).clamp(0, i64::from(width) - 1);
    let y0 = ((cy - radius).floor() as i64).clamp(0, i64::from(height) - 1);
    let y1 = ((cy + radius).ceil() as i64).clamp(0, i64::from(height) - 1);

    for y in y0..=y1 {
        for x in x0..=x1 {
            let dx = x as f64 + 0.5 - cx;
            let dy = y as f64 + 0.5 - cy;
            let dist = (dx * dx + dy * dy).sqrt();
            if dist > radius {
                continue;
            }
            let color = if dist >= radius - PLACEHOLDER_RING_WIDTH {
                PLACEHOLDER_RING
            } else {
                PLACEHOLDER_FILL
            };
            canvas.put_pixel(x as u32, y as u32, color);
        }
    }
}

fn parse_hex_color(value: &str) -> Option<Rgba<u8>> {
    let hex = value.strip_prefix('#')?;
    if hex.len() != 6 {
        return None;
    }
    let r = u8::from_str_radix(hex.get(0..2)?, 16).ok()?;
    let g = u8::from_str_radix(hex.get(2..4)?, 16).ok()?;
    let b = u8::from_str_radix(hex.get(4..6)?, 16).ok()?;
    Some(Rgba([r, g, b, 255]))
}

// =============================================================================
// ENCODING
// =============================================================================

/// Encode the canvas as a baseline JPEG, dropping the alpha channel.
///
/// # Errors
///
/// Returns the encoder's error; callers skip the frame and keep the loop
/// alive.
pub fn encode_jpeg(image: &RgbaImage, quality: u8) -> Result<Vec<u8>, image::ImageError> {
    let (width, height) = image.dimensions();
    let mut rgb = Vec::with_capacity(image.as_raw().len() / 4 * 3);
    for pixel in image.pixels() {
        rgb.extend_from_slice(&pixel.0[..3]);
    }

    let mut jpeg = Vec::new();
    let encoder = JpegEncoder::new_with_quality(&mut jpeg, quality);
    encoder.write_image(&rgb, width, height, ExtendedColorType::Rgb8)?;
    Ok(jpeg)
}

#[cfg(test)]
#[path = "compositor_test.rs"]
mod tests;

//! Freehand drawing strokes on the current map.
//!
//! DESIGN
//! ======
//! A stroke accumulates points while it is open. The first point for a
//! stroke id that is not the open one starts a fresh stroke at the end of
//! the stroke list, which is also how a client beginning a new line
//! implicitly closes the previous one. Ending a stroke only clears the
//! open marker; no pixels change, so the render loop is not woken.

use tracing::debug;
use uuid::Uuid;

use crate::state::{AppState, Point, Stroke};

/// Pen color used when a client omits one.
pub const DEFAULT_STROKE_COLOR: &str = "#FF0000";
/// Pen width in pixels used when a client omits one.
pub const DEFAULT_STROKE_WIDTH: f32 = 4.0;

/// Append a canvas-space point to stroke `stroke_id`, opening it first if
/// it is not the current open stroke. The point is clamped into canvas
/// bounds. Returns the number of points now in the stroke.
pub async fn add_stroke_point(
    state: &AppState,
    stroke_id: Uuid,
    x: f64,
    y: f64,
    color: &str,
    width: f32,
) -> usize {
    let count = {
        let mut world = state.world.write().await;
        let (x, y) = world.clamp_position(x, y);
        let point = Point { x, y };
        let map = world.current_map_mut();

        let open_index = if map.open_stroke == Some(stroke_id) {
            map.strokes.iter().rposition(|stroke| stroke.id == stroke_id)
        } else {
            None
        };
        match open_index {
            Some(index) => {
                let stroke = &mut map.strokes[index];
                stroke.points.push(point);
                stroke.points.len()
            }
            None => {
                map.strokes.push(Stroke {
                    id: stroke_id,
                    color: color.to_string(),
                    width: width.max(1.0),
                    points: vec![point],
                });
                map.open_stroke = Some(stroke_id);
                1
            }
        }
    };
    state.mark_dirty();
    count
}

/// Close the open stroke so the next point starts a new one.
pub async fn end_stroke(state: &AppState) {
    let mut world = state.world.write().await;
    world.current_map_mut().open_stroke = None;
}

/// Erase every stroke on the current map. Returns how many were removed.
pub async fn clear_strokes(state: &AppState) -> usize {
    let cleared = {
        let mut world = state.world.write().await;
        let map = world.current_map_mut();
        let cleared = map.strokes.len();
        map.strokes.clear();
        map.open_stroke = None;
        cleared
    };
    if cleared > 0 {
        debug!(cleared, "strokes cleared");
        state.mark_dirty();
    }
    cleared
}

#[cfg(test)]
#[path = "stroke_test.rs"]
mod tests;

//! Freehand drawing routes.

use axum::extract::State;
use axum::response::Json;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::routes::{OkResponse, ok_response};
use crate::services::stroke;
use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub struct AddStrokePointBody {
    pub stroke_id: Uuid,
    /// Canvas-space `[x, y]`.
    pub point: [f64; 2],
    #[serde(default = "default_color")]
    pub color: String,
    #[serde(default = "default_width")]
    pub width: f32,
}

fn default_color() -> String {
    stroke::DEFAULT_STROKE_COLOR.to_string()
}

fn default_width() -> f32 {
    stroke::DEFAULT_STROKE_WIDTH
}

#[derive(Debug, Serialize)]
pub struct StrokeProgressResponse {
    pub success: bool,
    pub stroke_id: Uuid,
    pub points: usize,
}

#[derive(Debug, Serialize)]
pub struct ClearStrokesResponse {
    pub success: bool,
    pub cleared: usize,
}

/// `POST /api/add_stroke_point` extends (or opens) a stroke.
pub async fn add_stroke_point(
    State(state): State<AppState>,
    Json(body): Json<AddStrokePointBody>,
) -> Json<StrokeProgressResponse> {
    let [x, y] = body.point;
    let points =
        stroke::add_stroke_point(&state, body.stroke_id, x, y, &body.color, body.width).await;
    Json(StrokeProgressResponse { success: true, stroke_id: body.stroke_id, points })
}

/// `POST /api/end_stroke` closes the open stroke.
pub async fn end_stroke(State(state): State<AppState>) -> Json<OkResponse> {
    stroke::end_stroke(&state).await;
    ok_response()
}

/// `POST /api/clear_strokes` erases every stroke on the current map.
pub async fn clear_strokes(State(state): State<AppState>) -> Json<ClearStrokesResponse> {
    let cleared = stroke::clear_strokes(&state).await;
    Json(ClearStrokesResponse { success: true, cleared })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::state::test_helpers;

    #[test]
    fn omitted_pen_settings_fall_back_to_defaults() {
        let id = Uuid::new_v4();
        let body: AddStrokePointBody =
            serde_json::from_str(&format!(r#"{{"stroke_id":"{id}","point":[1.0,2.0]}}"#)).unwrap();
        assert_eq!(body.point, [1.0, 2.0]);
        assert_eq!(body.color, stroke::DEFAULT_STROKE_COLOR);
        assert!((body.width - stroke::DEFAULT_STROKE_WIDTH).abs() < f32::EPSILON);
    }

    #[tokio::test]
    async fn draw_end_clear_round_trip() {
        let state = test_helpers::test_app_state();
        let id = Uuid::new_v4();

        let Json(first) = add_stroke_point(
            State(state.clone()),
            Json(AddStrokePointBody {
                stroke_id: id,
                point: [10.0, 10.0],
                color: "#00FF00".into(),
                width: 4.0,
            }),
        )
        .await;
        assert!(first.success);
        assert_eq!(first.points, 1);
        assert_eq!(first.stroke_id, id);

        let Json(acked) = end_stroke(State(state.clone())).await;
        assert!(acked.success);

        let Json(cleared) = clear_strokes(State(state)).await;
        assert_eq!(cleared.cleared, 1);
    }
}

use super::*;
use std::path::PathBuf;

use crate::state::{World, test_helpers};

fn state_with_tokens_dir(dir: PathBuf) -> AppState {
    let mut config = test_helpers::test_config();
    config.tokens_dir = dir;
    let world = World::new(&config, Vec::new());
    AppState::new(config, world)
}

fn temp_tokens_dir() -> PathBuf {
    let dir = std::env::temp_dir().join(format!("mapcast-routes-{}", Uuid::new_v4()));
    std::fs::create_dir_all(&dir).unwrap();
    dir
}

fn write_png(dir: &std::path::Path, name: &str) {
    test_helpers::solid_image(16, 16, image::Rgba([200, 40, 40, 255]))
        .save_with_format(dir.join(name), image::ImageFormat::Png)
        .unwrap();
}

#[test]
fn error_mapping_covers_every_failure() {
    let (status, _) = token_error_response(TokenError::NotFound(Uuid::nil()));
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (status, _) =
        token_error_response(TokenError::Asset(AssetError::NotFound(PathBuf::from("x.png"))));
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (status, _) =
        token_error_response(TokenError::Asset(AssetError::PathEscape("../x".into())));
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (status, body) = token_error_response(TokenError::Asset(AssetError::Read {
        path: PathBuf::from("x.png"),
        source: std::io::Error::other("disk on fire"),
    }));
    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert!(!body.0.success);
    assert!(body.0.error.contains("x.png"));
}

#[test]
fn add_token_body_takes_a_position_pair() {
    let body: AddTokenBody =
        serde_json::from_str(r#"{"token_path": "goblin.png", "position": [40, 60]}"#).unwrap();
    assert_eq!(body.token_path, "goblin.png");
    assert!((body.position[0] - 40.0).abs() < f64::EPSILON);
    assert!((body.position[1] - 60.0).abs() < f64::EPSILON);
}

#[tokio::test]
async fn add_token_returns_created_with_the_token() {
    let state = test_helpers::test_app_state();
    test_helpers::seed_token_art(&state, "goblin.png");

    let body = AddTokenBody { token_path: "goblin.png".into(), position: [40.0, 60.0] };
    let (status, Json(response)) =
        add_token(State(state.clone()), Json(body)).await.expect("seeded art");

    assert_eq!(status, StatusCode::CREATED);
    assert!(response.success);
    assert_eq!(response.token.name, "goblin");
    assert!((response.token.x - 40.0).abs() < f64::EPSILON);
}

#[tokio::test]
async fn add_token_surfaces_missing_art_as_not_found() {
    let state = test_helpers::test_app_state();

    let body = AddTokenBody { token_path: "nope.png".into(), position: [0.0, 0.0] };
    let (status, Json(error)) =
        add_token(State(state), Json(body)).await.expect_err("no art seeded");

    assert_eq!(status, StatusCode::NOT_FOUND);
    assert!(!error.success);
}

#[tokio::test]
async fn move_and_remove_round_trip() {
    let state = test_helpers::test_app_state();
    test_helpers::seed_token_art(&state, "goblin.png");
    let (_, Json(placed)) = add_token(
        State(state.clone()),
        Json(AddTokenBody { token_path: "goblin.png".into(), position: [10.0, 10.0] }),
    )
    .await
    .unwrap();

    let Json(moved) = move_token(
        State(state.clone()),
        Json(MoveTokenBody { id: placed.token.id, position: [999_999.0, 20.0] }),
    )
    .await
    .unwrap();
    assert!((moved.token.x - 800.0).abs() < f64::EPSILON);

    let Json(removed) = remove_token(
        State(state.clone()),
        Json(RemoveTokenBody { id: placed.token.id }),
    )
    .await
    .unwrap();
    assert!(removed.success);

    let (status, _) = remove_token(State(state), Json(RemoveTokenBody { id: placed.token.id }))
        .await
        .expect_err("second remove");
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn active_tokens_reports_placements() {
    let state = test_helpers::test_app_state();
    test_helpers::seed_token_art(&state, "goblin.png");
    add_token(
        State(state.clone()),
        Json(AddTokenBody { token_path: "goblin.png".into(), position: [5.0, 5.0] }),
    )
    .await
    .unwrap();

    let Json(listing) = active_tokens(State(state)).await;
    assert_eq!(listing.tokens.len(), 1);
}

#[tokio::test]
async fn list_tokens_scans_the_palette_directory() {
    let dir = temp_tokens_dir();
    write_png(&dir, "b.png");
    write_png(&dir, "a.png");
    let state = state_with_tokens_dir(dir.clone());

    let Json(listing) = list_tokens(State(state)).await;
    let names: Vec<&str> = listing.tokens.iter().map(|t| t.name.as_str()).collect();
    assert_eq!(names, vec!["a", "b"]);

    std::fs::remove_dir_all(&dir).ok();
}

#[tokio::test]
async fn token_image_serves_bytes_with_a_content_type() {
    let dir = temp_tokens_dir();
    write_png(&dir, "hero.png");
    let state = state_with_tokens_dir(dir.clone());

    let response = token_image(
        State(state),
        Query(TokenImageQuery { path: "hero.png".into() }),
    )
    .await;
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(response.headers()[CONTENT_TYPE], "image/png");

    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX).await.unwrap();
    assert_eq!(&bytes[1..4], b"PNG");

    std::fs::remove_dir_all(&dir).ok();
}

#[tokio::test]
async fn token_image_rejects_traversal_and_misses() {
    let dir = temp_tokens_dir();
    let state = state_with_tokens_dir(dir.clone());

    let escape = token_image(
        State(state.clone()),
        Query(TokenImageQuery { path: "../secrets.png".into() }),
    )
    .await;
    assert_eq!(escape.status(), StatusCode::NOT_FOUND);

    let missing = token_image(
        State(state),
        Query(TokenImageQuery { path: "ghost.png".into() }),
    )
    .await;
    assert_eq!(missing.status(), StatusCode::NOT_FOUND);

    std::fs::remove_dir_all(&dir).ok();
}

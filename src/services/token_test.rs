use super::*;
use std::collections::HashSet;
use std::time::Duration;

use futures::future::join_all;
use tokio::time::timeout;

use crate::state::test_helpers;

#[tokio::test]
async fn add_token_places_on_current_map() {
    let state = test_helpers::test_app_state();
    test_helpers::seed_token_art(&state, "goblin.png");

    let token = add_token(&state, "goblin.png", 10.0, 20.0).await.unwrap();
    assert_eq!(token.name, "goblin");
    assert!((token.x - 10.0).abs() < f64::EPSILON);
    assert!((token.y - 20.0).abs() < f64::EPSILON);

    let world = state.world.read().await;
    assert!(world.current_map().tokens.contains_key(&token.id));
}

#[tokio::test]
async fn add_token_clamps_out_of_bounds_positions() {
    let state = test_helpers::test_app_state();
    test_helpers::seed_token_art(&state, "goblin.png");

    let token = add_token(&state, "goblin.png", -50.0, 999_999.0).await.unwrap();
    assert!((token.x - 0.0).abs() < f64::EPSILON);
    assert!((token.y - 600.0).abs() < f64::EPSILON);

    let world = state.world.read().await;
    assert_eq!(world.current_map().tokens.len(), 1);
}

#[tokio::test]
async fn add_token_derives_name_from_file_stem() {
    let state = test_helpers::test_app_state();
    test_helpers::seed_token_art(&state, "monsters/ogre.png");

    let token = add_token(&state, "monsters/ogre.png", 5.0, 5.0).await.unwrap();
    assert_eq!(token.name, "ogre");
}

#[tokio::test]
async fn add_token_with_missing_art_leaves_world_unchanged() {
    let state = test_helpers::test_app_state();

    let result = add_token(&state, "missing.png", 10.0, 10.0).await;
    assert!(matches!(result, Err(TokenError::Asset(AssetError::NotFound(_)))));

    let world = state.world.read().await;
    assert!(world.current_map().tokens.is_empty());
}

#[tokio::test]
async fn add_token_rejects_escaping_paths() {
    let state = test_helpers::test_app_state();

    let result = add_token(&state, "../../etc/passwd", 0.0, 0.0).await;
    assert!(matches!(result, Err(TokenError::Asset(AssetError::PathEscape(_)))));
}

#[tokio::test]
async fn move_token_clamps_and_updates() {
    let state = test_helpers::test_app_state();
    test_helpers::seed_token_art(&state, "goblin.png");
    let token = add_token(&state, "goblin.png", 10.0, 10.0).await.unwrap();

    let moved = move_token(&state, token.id, 999_999.0, 10.0).await.unwrap();
    assert!((moved.x - 800.0).abs() < f64::EPSILON);
    assert!((moved.y - 10.0).abs() < f64::EPSILON);
}

#[tokio::test]
async fn move_token_not_found() {
    let state = test_helpers::test_app_state();
    let result = move_token(&state, Uuid::new_v4(), 0.0, 0.0).await;
    assert!(matches!(result, Err(TokenError::NotFound(_))));
}

#[tokio::test]
async fn remove_twice_fails_the_second_time() {
    let state = test_helpers::test_app_state();
    test_helpers::seed_token_art(&state, "goblin.png");
    let token = add_token(&state, "goblin.png", 10.0, 10.0).await.unwrap();

    remove_token(&state, token.id).await.unwrap();
    let result = remove_token(&state, token.id).await;
    assert!(matches!(result, Err(TokenError::NotFound(id)) if id == token.id));
}

#[tokio::test]
async fn token_lifecycle_round_trip() {
    let state = test_helpers::test_app_state();
    test_helpers::seed_token_art(&state, "goblin.png");

    let token = add_token(&state, "goblin.png", 10.0, 10.0).await.unwrap();

    let moved = move_token(&state, token.id, 999_999.0, 10.0).await.unwrap();
    assert!((moved.x - 800.0).abs() < f64::EPSILON);

    let snapshot = state.world.read().await.snapshot();
    let observed = &snapshot.map.tokens[&token.id];
    assert!((observed.x - 800.0).abs() < f64::EPSILON);

    remove_token(&state, token.id).await.unwrap();
    assert!(state.world.read().await.snapshot().map.tokens.is_empty());

    let result = remove_token(&state, token.id).await;
    assert!(matches!(result, Err(TokenError::NotFound(_))));
}

#[tokio::test]
async fn active_tokens_returns_draw_order() {
    let state = test_helpers::test_app_state();
    test_helpers::seed_token_art(&state, "a.png");
    test_helpers::seed_token_art(&state, "b.png");

    let first = add_token(&state, "a.png", 1.0, 1.0).await.unwrap();
    let second = add_token(&state, "b.png", 2.0, 2.0).await.unwrap();

    let tokens = active_tokens(&state).await;
    assert_eq!(tokens.len(), 2);
    assert_eq!(tokens[0].id, first.id);
    assert_eq!(tokens[1].id, second.id);
    assert!(tokens[0].seq < tokens[1].seq);
}

#[tokio::test]
async fn mutations_store_a_dirty_signal() {
    let state = test_helpers::test_app_state();
    test_helpers::seed_token_art(&state, "goblin.png");

    add_token(&state, "goblin.png", 1.0, 1.0).await.unwrap();
    timeout(Duration::from_millis(50), state.dirty.notified())
        .await
        .expect("add should leave a stored dirty permit");
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn thousand_concurrent_adds_lose_nothing() {
    let state = test_helpers::test_app_state();
    for i in 0..1000 {
        test_helpers::seed_token_art(&state, &format!("stress/t{i}.png"));
    }

    let handles: Vec<_> = (0..1000)
        .map(|i| {
            let state = state.clone();
            tokio::spawn(async move {
                add_token(&state, &format!("stress/t{i}.png"), f64::from(i % 100) * 8.0, 300.0).await
            })
        })
        .collect();

    let mut ids = HashSet::new();
    for result in join_all(handles).await {
        let token = result.unwrap().unwrap();
        assert!(ids.insert(token.id));
    }

    let world = state.world.read().await;
    assert_eq!(world.current_map().tokens.len(), 1000);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn snapshots_stay_consistent_under_interleaved_mutations() {
    let state = test_helpers::test_app_state();
    test_helpers::seed_token_art(&state, "goblin.png");
    let anchor = add_token(&state, "goblin.png", 100.0, 100.0).await.unwrap();

    let movers: Vec<_> = (0..50)
        .map(|i| {
            let state = state.clone();
            let id = anchor.id;
            tokio::spawn(async move { move_token(&state, id, f64::from(i) * 1_000.0, 50.0).await })
        })
        .collect();
    let adders: Vec<_> = (0..50)
        .map(|i| {
            let state = state.clone();
            tokio::spawn(
                async move { add_token(&state, "goblin.png", f64::from(i), f64::from(i)).await },
            )
        })
        .collect();
    let readers: Vec<_> = (0..20)
        .map(|_| {
            let state = state.clone();
            tokio::spawn(async move {
                let snapshot = state.world.read().await.snapshot();
                for token in snapshot.map.tokens.values() {
                    assert!(token.x >= 0.0 && token.x <= 800.0);
                    assert!(token.y >= 0.0 && token.y <= 600.0);
                }
                snapshot.map.tokens.len()
            })
        })
        .collect();

    for handle in movers {
        handle.await.unwrap().unwrap();
    }
    for handle in adders {
        handle.await.unwrap().unwrap();
    }
    for handle in readers {
        assert!(handle.await.unwrap() <= 51);
    }

    let world = state.world.read().await;
    assert_eq!(world.current_map().tokens.len(), 51);
    let moved = &world.current_map().tokens[&anchor.id];
    assert!(moved.x <= 800.0 && moved.y <= 600.0);
}

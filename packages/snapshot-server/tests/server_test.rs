use axum::{
    body::{to_bytes, Body},
    http::{Request, StatusCode},
    Router,
};
use serde_json::{json, Value};
use snapshot_server::{
    app::create_app_with_state,
    state::{AppState, GAME_FILE, PHASE_FILE},
};
use std::path::PathBuf;
use tower::ServiceExt;

/// テストごとに使い捨てのデータディレクトリ
fn temp_data_dir() -> PathBuf {
    let dir = std::env::temp_dir().join(format!("snapshot-server-{}", uuid::Uuid::new_v4()));
    std::fs::create_dir_all(&dir).unwrap();
    dir
}

fn setup_app() -> (Router, PathBuf) {
    let dir = temp_data_dir();
    (create_app_with_state(AppState::load(&dir)), dir)
}

async fn send(app: &Router, method: &str, uri: &str, body: Option<Value>) -> (StatusCode, Value) {
    let builder = Request::builder().method(method).uri(uri);
    let request = match body {
        Some(value) => builder
            .header("content-type", "application/json")
            .body(Body::from(value.to_string()))
            .unwrap(),
        None => builder.body(Body::empty()).unwrap(),
    };

    let response = app.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    let value = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap()
    };
    (status, value)
}

#[tokio::test]
async fn test_empty_store_returns_empty_objects() {
    let (app, _dir) = setup_app();

    let (status, game) = send(&app, "GET", "/game-data", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(game, json!({}));

    let (status, phase) = send(&app, "GET", "/phase-data", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(phase, json!({}));
}

#[tokio::test]
async fn test_post_overwrites_and_persists() {
    let (app, dir) = setup_app();
    let game = json!({ "gameType": "test", "phase": { "active": 2 }, "livePlayers": ["alice"] });

    let (status, stored) = send(&app, "POST", "/game-data", Some(game.clone())).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(stored, game);

    let (_, fetched) = send(&app, "GET", "/game-data", None).await;
    assert_eq!(fetched, game);

    let on_disk: Value =
        serde_json::from_slice(&std::fs::read(dir.join(GAME_FILE)).unwrap()).unwrap();
    assert_eq!(on_disk, game);

    // 部分更新はしない
    let replacement = json!({ "gameType": "matrix6" });
    send(&app, "POST", "/game-data", Some(replacement.clone())).await;
    let (_, fetched) = send(&app, "GET", "/game-data", None).await;
    assert_eq!(fetched, replacement);
}

#[tokio::test]
async fn test_phase_data_round_trip_survives_restart() {
    let (app, dir) = setup_app();
    let phase = json!({ "votes": { "alice": "bob" }, "wolfKill": "carol", "wolfKiller": "dave" });
    send(&app, "POST", "/phase-data", Some(phase.clone())).await;

    // 同じディレクトリから再起動
    let restarted = create_app_with_state(AppState::load(&dir));
    let (_, fetched) = send(&restarted, "GET", "/phase-data", None).await;
    assert_eq!(fetched, phase);
}

#[tokio::test]
async fn test_new_game_resets_phase_data() {
    let (app, dir) = setup_app();
    send(&app, "POST", "/phase-data", Some(json!({ "votes": { "a": "b" } }))).await;

    let game = json!({ "gameType": "test", "mainVenue": "mafiamain" });
    let (status, stored) = send(&app, "POST", "/new-game", Some(game.clone())).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(stored, game);

    let (_, phase) = send(&app, "GET", "/phase-data", None).await;
    assert_eq!(phase, json!({}));
    let on_disk: Value =
        serde_json::from_slice(&std::fs::read(dir.join(PHASE_FILE)).unwrap()).unwrap();
    assert_eq!(on_disk, json!({}));
}

#[tokio::test]
async fn test_new_game_without_body_uses_default() {
    let (app, _dir) = setup_app();

    let (status, stored) = send(&app, "POST", "/new-game", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(stored, json!({ "gameType": "matrix6" }));

    let (_, stored) = send(&app, "POST", "/new-game", Some(json!({}))).await;
    assert_eq!(stored, json!({ "gameType": "matrix6" }));
}

#[tokio::test]
async fn test_corrupt_file_starts_empty() {
    let dir = temp_data_dir();
    std::fs::write(dir.join(GAME_FILE), b"{ not json").unwrap();
    let app = create_app_with_state(AppState::load(&dir));

    let (status, game) = send(&app, "GET", "/game-data", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(game, json!({}));
}

#[tokio::test]
async fn test_invalid_new_game_body_is_rejected() {
    let (app, _dir) = setup_app();
    let request = Request::builder()
        .method("POST")
        .uri("/new-game")
        .body(Body::from("{ broken"))
        .unwrap();

    let response = app.oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

use axum::{
    body::Bytes,
    extract::State,
    routing::{get, post},
    Json, Router,
};
use serde_json::Value;

use crate::services::snapshot_service::{self, SnapshotServiceError};
use crate::state::AppState;

pub fn routes(state: AppState) -> Router {
    Router::new()
        .route("/game-data", get(get_game_data).post(put_game_data))
        .route("/phase-data", get(get_phase_data).post(put_phase_data))
        .route("/new-game", post(new_game))
        .with_state(state)
}

pub async fn get_game_data(State(state): State<AppState>) -> Json<Value> {
    Json(snapshot_service::get_game_data(&state).await)
}

pub async fn put_game_data(
    State(state): State<AppState>,
    Json(value): Json<Value>,
) -> Result<Json<Value>, SnapshotServiceError> {
    snapshot_service::put_game_data(&state, value).await.map(Json)
}

pub async fn get_phase_data(State(state): State<AppState>) -> Json<Value> {
    Json(snapshot_service::get_phase_data(&state).await)
}

pub async fn put_phase_data(
    State(state): State<AppState>,
    Json(value): Json<Value>,
) -> Result<Json<Value>, SnapshotServiceError> {
    snapshot_service::put_phase_data(&state, value).await.map(Json)
}

/// 空のボディなら既定のゲームで初期化する
pub async fn new_game(
    State(state): State<AppState>,
    body: Bytes,
) -> Result<Json<Value>, SnapshotServiceError> {
    let game = if body.iter().all(|b| b.is_ascii_whitespace()) {
        None
    } else {
        Some(
            serde_json::from_slice(&body)
                .map_err(|e| SnapshotServiceError::InvalidBody(e.to_string()))?,
        )
    };
    snapshot_service::new_game(&state, game).await.map(Json)
}

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::{json, Value};
use std::path::Path;
use tracing::{debug, error, info};

use crate::state::AppState;

#[derive(Debug, thiserror::Error)]
pub enum SnapshotServiceError {
    #[error("スナップショットの書き込みに失敗しました: {0}")]
    Io(#[from] std::io::Error),
    #[error("スナップショットのシリアライズに失敗しました: {0}")]
    Json(#[from] serde_json::Error),
    #[error("リクエストボディが不正です: {0}")]
    InvalidBody(String),
}

impl IntoResponse for SnapshotServiceError {
    fn into_response(self) -> Response {
        let status = match self {
            SnapshotServiceError::InvalidBody(_) => StatusCode::BAD_REQUEST,
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        };
        error!("{}", self);
        (status, Json(json!({ "error": self.to_string() }))).into_response()
    }
}

/// 新しいゲームの既定スナップショット
pub fn default_game() -> Value {
    json!({ "gameType": "matrix6" })
}

pub async fn get_game_data(state: &AppState) -> Value {
    state.game.lock().await.clone()
}

pub async fn put_game_data(state: &AppState, value: Value) -> Result<Value, SnapshotServiceError> {
    let mut game = state.game.lock().await;
    write_snapshot(&state.game_path(), &value).await?;
    *game = value;
    debug!("Game data updated");
    Ok(game.clone())
}

pub async fn get_phase_data(state: &AppState) -> Value {
    state.phase.lock().await.clone()
}

pub async fn put_phase_data(state: &AppState, value: Value) -> Result<Value, SnapshotServiceError> {
    let mut phase = state.phase.lock().await;
    write_snapshot(&state.phase_path(), &value).await?;
    *phase = value;
    debug!("Phase data updated");
    Ok(phase.clone())
}

/// ゲームを上書きし、フェーズデータを空に戻す
pub async fn new_game(state: &AppState, game: Option<Value>) -> Result<Value, SnapshotServiceError> {
    let game = match game {
        Some(value) if value.as_object().map(|o| !o.is_empty()).unwrap_or(true) => value,
        _ => default_game(),
    };
    info!("Resetting game: {}", game);

    let stored = put_game_data(state, game).await?;
    put_phase_data(state, json!({})).await?;
    Ok(stored)
}

async fn write_snapshot(path: &Path, value: &Value) -> Result<(), SnapshotServiceError> {
    if let Some(dir) = path.parent() {
        tokio::fs::create_dir_all(dir).await?;
    }
    let bytes = serde_json::to_vec_pretty(value)?;
    tokio::fs::write(path, bytes).await?;
    Ok(())
}

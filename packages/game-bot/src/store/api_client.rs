use reqwest::Client;
use serde::{de::DeserializeOwned, Serialize};
use std::time::Duration;
use thiserror::Error;

use crate::models::{GameData, GameState, PhaseData};

#[derive(Error, Debug)]
pub enum StoreError {
    #[error("Network error: {0}")]
    NetworkError(#[from] reqwest::Error),
    #[error("Server error: {0}")]
    ServerError(String),
    #[error("Invalid snapshot: {0}")]
    DecodeError(#[from] serde_json::Error),
}

/// スナップショットストアのHTTPクライアント
pub struct SnapshotClient {
    client: Client,
    base_url: String,
}

impl SnapshotClient {
    pub fn new(base_url: String) -> Result<Self, StoreError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(10))
            .build()?;

        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
        })
    }

    pub async fn get_game_data(&self) -> Result<GameData, StoreError> {
        self.get("/game-data").await
    }

    pub async fn put_game_data(&self, game: &GameData) -> Result<(), StoreError> {
        self.post("/game-data", game).await
    }

    pub async fn get_phase_data(&self) -> Result<PhaseData, StoreError> {
        self.get("/phase-data").await
    }

    pub async fn put_phase_data(&self, phase: &PhaseData) -> Result<(), StoreError> {
        self.post("/phase-data", phase).await
    }

    pub async fn load(&self) -> Result<GameState, StoreError> {
        let game = self.get_game_data().await?;
        let phase_data = self.get_phase_data().await?;
        Ok(GameState::new(game, phase_data))
    }

    /// Writes the game snapshot first, then the phase snapshot.
    pub async fn save(&self, state: &GameState) -> Result<(), StoreError> {
        self.put_game_data(&state.game).await?;
        self.put_phase_data(&state.phase_data).await
    }

    /// ゲームを初期化し、フェーズデータを空にする
    pub async fn new_game(&self, game: &GameData) -> Result<(), StoreError> {
        self.post("/new-game", game).await
    }

    async fn get<T: DeserializeOwned>(&self, path: &str) -> Result<T, StoreError> {
        let response = self
            .client
            .get(format!("{}{}", self.base_url, path))
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(StoreError::ServerError(format!(
                "GET {} returned {}",
                path,
                response.status()
            )));
        }
        let bytes = response.bytes().await?;
        Ok(serde_json::from_slice(&bytes)?)
    }

    async fn post<T: Serialize>(&self, path: &str, body: &T) -> Result<(), StoreError> {
        let response = self
            .client
            .post(format!("{}{}", self.base_url, path))
            .json(body)
            .send()
            .await?;

        if response.status().is_success() {
            Ok(())
        } else {
            Err(StoreError::ServerError(format!(
                "POST {} returned {}",
                path,
                response.status()
            )))
        }
    }
}

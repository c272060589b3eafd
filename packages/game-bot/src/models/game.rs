use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

use super::{phase::PhaseData, player::PlayerName, role::Role};

/// ゲームテンプレートの選択子
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum GameType {
    #[default]
    Matrix6,
    Test,
}

impl std::str::FromStr for GameType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "matrix6" => Ok(GameType::Matrix6),
            "test" => Ok(GameType::Test),
            other => Err(format!("unknown game type: {}", other)),
        }
    }
}

impl fmt::Display for GameType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            GameType::Matrix6 => write!(f, "matrix6"),
            GameType::Test => write!(f, "test"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum GamePhase {
    #[default]
    Init,         // サインアップ投稿前
    Signup,       // 参加者募集
    Confirmation, // 役職PMの送信と確認待ち
    Active(u32),  // 進行中のフェーズ
    Finale,       // ゲーム終了
}

impl fmt::Display for GamePhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            GamePhase::Init => write!(f, "init"),
            GamePhase::Signup => write!(f, "signup"),
            GamePhase::Confirmation => write!(f, "confirmation"),
            GamePhase::Active(n) => write!(f, "phase {}", n),
            GamePhase::Finale => write!(f, "finale"),
        }
    }
}

/// Game snapshot persisted in the store between ticks.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct GameData {
    pub game_type: GameType,
    pub phase: GamePhase,
    pub phase_length_hours: u32,
    pub main_venue: String,
    pub wolf_venue: String,
    pub main_post_id: String,
    pub wolf_post_id: String,
    pub pending_players: Vec<PlayerName>,
    pub confirmed_players: Vec<PlayerName>,
    pub roles: BTreeMap<PlayerName, Role>,
    pub live_players: Vec<PlayerName>,
    pub dead_players: Vec<PlayerName>,
    pub last_comment_time: DateTime<Utc>,
    pub last_wolf_comment_time: DateTime<Utc>,
}

impl Default for GameData {
    fn default() -> Self {
        GameData {
            game_type: GameType::default(),
            phase: GamePhase::Init,
            phase_length_hours: 1,
            main_venue: "HWWBotTest".to_string(),
            wolf_venue: "HWWBotTest".to_string(),
            main_post_id: String::new(),
            wolf_post_id: String::new(),
            pending_players: Vec::new(),
            confirmed_players: Vec::new(),
            roles: BTreeMap::new(),
            live_players: Vec::new(),
            dead_players: Vec::new(),
            last_comment_time: DateTime::<Utc>::default(),
            last_wolf_comment_time: DateTime::<Utc>::default(),
        }
    }
}

impl GameData {
    pub fn new(
        game_type: GameType,
        main_venue: String,
        wolf_venue: String,
        phase_length_hours: u32,
    ) -> Self {
        GameData {
            game_type,
            main_venue,
            wolf_venue,
            phase_length_hours,
            ..GameData::default()
        }
    }

    pub fn is_signed_up(&self, player: &PlayerName) -> bool {
        self.live_players.contains(player)
    }
}

/// 1回のtickで受け渡す状態一式
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct GameState {
    pub game: GameData,
    pub phase_data: PhaseData,
}

impl GameState {
    pub fn new(game: GameData, phase_data: PhaseData) -> Self {
        GameState { game, phase_data }
    }
}

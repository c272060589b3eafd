use serde_json::{json, Value};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tokio::sync::Mutex;
use tracing::{debug, error};

pub const GAME_FILE: &str = "active_game.json";
pub const PHASE_FILE: &str = "active_phase.json";

/// ゲーム・フェーズのスナップショット。中身は解釈せずにそのまま保持する。
#[derive(Clone)]
pub struct AppState {
    pub game: Arc<Mutex<Value>>,
    pub phase: Arc<Mutex<Value>>,
    pub data_dir: Arc<PathBuf>,
}

impl AppState {
    /// 保存済みのファイルがあれば読み込む。読めなければ空のオブジェクトから始める。
    pub fn load(data_dir: &Path) -> Self {
        AppState {
            game: Arc::new(Mutex::new(load_snapshot(&data_dir.join(GAME_FILE)))),
            phase: Arc::new(Mutex::new(load_snapshot(&data_dir.join(PHASE_FILE)))),
            data_dir: Arc::new(data_dir.to_path_buf()),
        }
    }

    pub fn game_path(&self) -> PathBuf {
        self.data_dir.join(GAME_FILE)
    }

    pub fn phase_path(&self) -> PathBuf {
        self.data_dir.join(PHASE_FILE)
    }
}

fn load_snapshot(path: &Path) -> Value {
    debug!("Loading snapshot from {}", path.display());
    let loaded = std::fs::read(path)
        .map_err(|e| e.to_string())
        .and_then(|bytes| serde_json::from_slice::<Value>(&bytes).map_err(|e| e.to_string()));

    match loaded {
        Ok(value) => value,
        Err(e) => {
            error!("Failed to load snapshot from {}: {}", path.display(), e);
            json!({})
        }
    }
}

use std::env;
use thiserror::Error;

use crate::messaging::reddit::{DEFAULT_API_URL, DEFAULT_AUTH_URL};
use crate::messaging::RedditCredentials;
use crate::models::PlayerName;

const DEFAULT_USER_AGENT: &str = "Mafia Game Bot v0.2";
const DEFAULT_STORE_URL: &str = "http://0.0.0.0:8800";

#[derive(Error, Debug, PartialEq, Eq)]
pub enum ConfigError {
    #[error("{0} must be set")]
    Missing(&'static str),
    #[error("{name} has an invalid value: {value}")]
    Invalid { name: &'static str, value: String },
}

#[derive(Debug, Clone)]
pub struct BotConfig {
    pub credentials: RedditCredentials,
    pub auth_url: String,
    pub api_url: String,
    pub staff: Vec<PlayerName>,
}

impl BotConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        let username = required("BOT_USERNAME")?;
        let staff = staff_list(&username, &env::var("GAME_STAFF").unwrap_or_default());

        Ok(BotConfig {
            credentials: RedditCredentials {
                client_id: required("REDDIT_CLIENT_ID")?,
                client_secret: required("REDDIT_CLIENT_SECRET")?,
                refresh_token: required("REDDIT_REFRESH_TOKEN")?,
                user_agent: env::var("REDDIT_USER_AGENT")
                    .unwrap_or_else(|_| DEFAULT_USER_AGENT.to_string()),
            },
            auth_url: env::var("REDDIT_AUTH_URL").unwrap_or_else(|_| DEFAULT_AUTH_URL.to_string()),
            api_url: env::var("REDDIT_API_URL").unwrap_or_else(|_| DEFAULT_API_URL.to_string()),
            staff,
        })
    }
}

/// スナップショットストアのURL。Reddit の認証情報なしで使えるように分けてある。
pub fn store_url() -> String {
    env::var("SNAPSHOT_STORE_URL").unwrap_or_else(|_| DEFAULT_STORE_URL.to_string())
}

/// デバッグ用の設定
#[derive(Debug, Clone, Default)]
pub struct DebugConfig {
    pub verbose_logging: bool,
    /// 乱数シードの固定
    pub rng_seed: Option<u64>,
}

impl DebugConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        let verbose_logging = env::var("DEBUG_VERBOSE_LOGGING")
            .map(|v| v.eq_ignore_ascii_case("true"))
            .unwrap_or(false);
        let rng_seed = match env::var("DEBUG_RNG_SEED") {
            Ok(value) => Some(value.parse().map_err(|_| ConfigError::Invalid {
                name: "DEBUG_RNG_SEED",
                value,
            })?),
            Err(_) => None,
        };

        Ok(DebugConfig {
            verbose_logging,
            rng_seed,
        })
    }
}

fn required(name: &'static str) -> Result<String, ConfigError> {
    env::var(name)
        .ok()
        .filter(|value| !value.is_empty())
        .ok_or(ConfigError::Missing(name))
}

/// ボット自身は常にスタッフ扱い
fn staff_list(bot: &str, extra: &str) -> Vec<PlayerName> {
    let mut staff = vec![PlayerName::new(bot)];
    for handle in extra.split(',').map(PlayerName::new) {
        if !handle.is_empty() && !staff.contains(&handle) {
            staff.push(handle);
        }
    }
    staff
}

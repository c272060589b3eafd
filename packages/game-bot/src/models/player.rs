use serde::{Deserialize, Serialize};
use std::borrow::Borrow;
use std::fmt;

/// Reddit上のハンドル。常に小文字で保持し、`u/`・`/u/` の接頭辞は取り除く。
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub struct PlayerName(String);

impl PlayerName {
    pub fn new(raw: &str) -> Self {
        let trimmed = raw.trim();
        let lowered = trimmed.to_lowercase();
        let handle = lowered
            .strip_prefix("/u/")
            .or_else(|| lowered.strip_prefix("u/"))
            .unwrap_or(&lowered);
        PlayerName(handle.to_string())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl From<String> for PlayerName {
    fn from(raw: String) -> Self {
        PlayerName::new(&raw)
    }
}

impl From<&str> for PlayerName {
    fn from(raw: &str) -> Self {
        PlayerName::new(raw)
    }
}

impl From<PlayerName> for String {
    fn from(name: PlayerName) -> Self {
        name.0
    }
}

impl Borrow<str> for PlayerName {
    fn borrow(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for PlayerName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use thiserror::Error;

pub mod reddit;

pub use reddit::{RedditClient, RedditCredentials};

#[derive(Error, Debug)]
pub enum MessengerError {
    #[error("Network error: {0}")]
    NetworkError(#[from] reqwest::Error),
    #[error("Authentication failed: {0}")]
    AuthError(String),
    #[error("API error: {0}")]
    ApiError(String),
    #[error("Unexpected response: {0}")]
    UnexpectedResponse(String),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Submission {
    pub id: String,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Comment {
    /// 返信・削除に使うID
    pub id: String,
    pub author: String,
    pub body: String,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PrivateMessage {
    pub id: String,
    pub author: String,
    pub body: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Visibility {
    Public,
    Private,
}

impl Visibility {
    pub fn as_str(&self) -> &'static str {
        match self {
            Visibility::Public => "public",
            Visibility::Private => "private",
        }
    }
}

/// 掲示板・メッセージ基盤とのやりとり
#[async_trait]
pub trait Messenger: Send + Sync {
    async fn submit(&self, venue: &str, title: &str, body: &str)
        -> Result<Submission, MessengerError>;

    async fn post_created(&self, post_id: &str) -> Result<DateTime<Utc>, MessengerError>;

    /// 投稿時刻の古い順
    async fn list_comments(&self, post_id: &str) -> Result<Vec<Comment>, MessengerError>;

    /// Reply to a comment or a private message.
    async fn reply(&self, thing_id: &str, body: &str) -> Result<(), MessengerError>;

    async fn remove(&self, comment_id: &str) -> Result<(), MessengerError>;

    async fn lock(&self, post_id: &str) -> Result<(), MessengerError>;

    async fn set_venue_visibility(
        &self,
        venue: &str,
        visibility: Visibility,
    ) -> Result<(), MessengerError>;

    async fn add_member(&self, venue: &str, handle: &str) -> Result<(), MessengerError>;

    async fn remove_member(&self, venue: &str, handle: &str) -> Result<(), MessengerError>;

    async fn list_unread_private_messages(&self) -> Result<Vec<PrivateMessage>, MessengerError>;

    async fn mark_read(&self, message_id: &str) -> Result<(), MessengerError>;

    async fn send_private_message(
        &self,
        handle: &str,
        subject: &str,
        body: &str,
    ) -> Result<(), MessengerError>;
}

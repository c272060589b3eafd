use async_trait::async_trait;
use chrono::{DateTime, TimeZone, Utc};
use reqwest::{Client, Response};
use serde::Deserialize;
use serde_json::Value;
use std::time::Duration;
use tokio::sync::Mutex;
use tracing::debug;

use super::{
    Comment, Messenger, MessengerError, PrivateMessage, Submission, Visibility,
};

pub const DEFAULT_AUTH_URL: &str = "https://www.reddit.com";
pub const DEFAULT_API_URL: &str = "https://oauth.reddit.com";

#[derive(Debug, Clone)]
pub struct RedditCredentials {
    pub client_id: String,
    pub client_secret: String,
    pub refresh_token: String,
    pub user_agent: String,
}

#[derive(Debug, Deserialize)]
struct TokenResponse {
    access_token: String,
}

#[derive(Debug, Deserialize)]
struct Listing {
    data: ListingData,
}

#[derive(Debug, Deserialize)]
struct ListingData {
    children: Vec<Thing>,
}

#[derive(Debug, Deserialize)]
struct Thing {
    kind: String,
    data: Value,
}

/// Reddit OAuth APIのクライアント
pub struct RedditClient {
    client: Client,
    credentials: RedditCredentials,
    auth_url: String,
    api_url: String,
    token: Mutex<Option<String>>,
}

impl RedditClient {
    pub fn new(
        credentials: RedditCredentials,
        auth_url: String,
        api_url: String,
    ) -> Result<Self, MessengerError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(30))
            .user_agent(credentials.user_agent.clone())
            .build()?;

        Ok(Self {
            client,
            credentials,
            auth_url,
            api_url,
            token: Mutex::new(None),
        })
    }

    /// アクセストークンはプロセスの間キャッシュする
    async fn access_token(&self) -> Result<String, MessengerError> {
        let mut token = self.token.lock().await;
        if let Some(token) = token.as_ref() {
            return Ok(token.clone());
        }

        let response = self
            .client
            .post(format!("{}/api/v1/access_token", self.auth_url))
            .basic_auth(
                &self.credentials.client_id,
                Some(&self.credentials.client_secret),
            )
            .form(&[
                ("grant_type", "refresh_token"),
                ("refresh_token", self.credentials.refresh_token.as_str()),
            ])
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(MessengerError::AuthError(format!(
                "token request returned {}",
                response.status()
            )));
        }
        let body: TokenResponse = response.json().await?;
        *token = Some(body.access_token.clone());
        Ok(body.access_token)
    }

    async fn get(&self, path: &str) -> Result<Value, MessengerError> {
        let token = self.access_token().await?;
        let response = self
            .client
            .get(format!("{}{}", self.api_url, path))
            .bearer_auth(token)
            .send()
            .await?;
        Self::read_json(response).await
    }

    async fn post_form(&self, path: &str, form: &[(&str, &str)]) -> Result<Value, MessengerError> {
        let token = self.access_token().await?;
        let response = self
            .client
            .post(format!("{}{}", self.api_url, path))
            .bearer_auth(token)
            .form(form)
            .send()
            .await?;
        let body = Self::read_json(response).await?;

        // api_type=json のエラーは200で返ってくる
        if let Some(errors) = body.pointer("/json/errors").and_then(Value::as_array) {
            if !errors.is_empty() {
                return Err(MessengerError::ApiError(Value::Array(errors.clone()).to_string()));
            }
        }
        Ok(body)
    }

    async fn read_json(response: Response) -> Result<Value, MessengerError> {
        let status = response.status();
        if !status.is_success() {
            let text = response.text().await.unwrap_or_default();
            return Err(MessengerError::ApiError(format!("{}: {}", status, text)));
        }
        let text = response.text().await?;
        if text.trim().is_empty() {
            return Ok(Value::Object(Default::default()));
        }
        serde_json::from_str(&text).map_err(|e| MessengerError::UnexpectedResponse(e.to_string()))
    }

    fn parse_listing(value: Value) -> Result<Listing, MessengerError> {
        serde_json::from_value(value).map_err(|e| MessengerError::UnexpectedResponse(e.to_string()))
    }
}

fn timestamp(data: &Value) -> Result<DateTime<Utc>, MessengerError> {
    let seconds = data
        .get("created_utc")
        .and_then(Value::as_f64)
        .ok_or_else(|| MessengerError::UnexpectedResponse("missing created_utc".to_string()))?;
    Utc.timestamp_millis_opt((seconds * 1000.0) as i64)
        .single()
        .ok_or_else(|| MessengerError::UnexpectedResponse(format!("bad timestamp {}", seconds)))
}

fn string_field(data: &Value, field: &str) -> Result<String, MessengerError> {
    data.get(field)
        .and_then(Value::as_str)
        .map(str::to_string)
        .ok_or_else(|| MessengerError::UnexpectedResponse(format!("missing {}", field)))
}

/// 返信ツリーを時系列順に平坦化する。"more" のスタブは展開しない。
fn flatten_comments(children: &[Thing], out: &mut Vec<Comment>) -> Result<(), MessengerError> {
    for child in children {
        if child.kind != "t1" {
            continue;
        }
        let author = child.data.get("author").and_then(Value::as_str);
        if let Some(author) = author.filter(|a| *a != "[deleted]") {
            out.push(Comment {
                id: string_field(&child.data, "name")?,
                author: author.to_string(),
                body: string_field(&child.data, "body")?,
                created_at: timestamp(&child.data)?,
            });
        }
        if let Some(replies) = child.data.get("replies").filter(|r| r.is_object()) {
            let listing = RedditClient::parse_listing(replies.clone())?;
            flatten_comments(&listing.data.children, out)?;
        }
    }
    Ok(())
}

fn post_fullname(post_id: &str) -> String {
    if post_id.starts_with("t3_") {
        post_id.to_string()
    } else {
        format!("t3_{}", post_id)
    }
}

#[async_trait]
impl Messenger for RedditClient {
    async fn submit(
        &self,
        venue: &str,
        title: &str,
        body: &str,
    ) -> Result<Submission, MessengerError> {
        let response = self
            .post_form(
                "/api/submit",
                &[
                    ("sr", venue),
                    ("kind", "self"),
                    ("title", title),
                    ("text", body),
                    ("sendreplies", "false"),
                    ("api_type", "json"),
                ],
            )
            .await?;
        let id = response
            .pointer("/json/data/id")
            .and_then(Value::as_str)
            .ok_or_else(|| MessengerError::UnexpectedResponse("submit returned no id".to_string()))?
            .to_string();
        debug!("Submitted [{}] to r/{}", id, venue);

        let created_at = self.post_created(&id).await?;
        Ok(Submission { id, created_at })
    }

    async fn post_created(&self, post_id: &str) -> Result<DateTime<Utc>, MessengerError> {
        let value = self.get(&format!("/by_id/{}", post_fullname(post_id))).await?;
        let listing = Self::parse_listing(value)?;
        let post = listing
            .data
            .children
            .first()
            .ok_or_else(|| MessengerError::ApiError(format!("post {} not found", post_id)))?;
        timestamp(&post.data)
    }

    async fn list_comments(&self, post_id: &str) -> Result<Vec<Comment>, MessengerError> {
        let id = post_id.trim_start_matches("t3_");
        let value = self
            .get(&format!("/comments/{}?sort=old&limit=500&raw_json=1", id))
            .await?;

        // [投稿, コメント一覧] の2要素配列
        let comments = value
            .as_array()
            .and_then(|parts| parts.get(1))
            .cloned()
            .ok_or_else(|| MessengerError::UnexpectedResponse("no comment listing".to_string()))?;
        let listing = Self::parse_listing(comments)?;

        let mut out = Vec::new();
        flatten_comments(&listing.data.children, &mut out)?;
        // 返信の平坦化で順序が崩れるので並べ直す
        out.sort_by_key(|comment| comment.created_at);
        Ok(out)
    }

    async fn reply(&self, thing_id: &str, body: &str) -> Result<(), MessengerError> {
        self.post_form(
            "/api/comment",
            &[("thing_id", thing_id), ("text", body), ("api_type", "json")],
        )
        .await?;
        Ok(())
    }

    async fn remove(&self, comment_id: &str) -> Result<(), MessengerError> {
        self.post_form("/api/remove", &[("id", comment_id), ("spam", "false")])
            .await?;
        Ok(())
    }

    async fn lock(&self, post_id: &str) -> Result<(), MessengerError> {
        let fullname = post_fullname(post_id);
        self.post_form("/api/lock", &[("id", fullname.as_str())])
            .await?;
        Ok(())
    }

    async fn set_venue_visibility(
        &self,
        venue: &str,
        visibility: Visibility,
    ) -> Result<(), MessengerError> {
        // site_admin は全設定の送信が必要なので、現在の設定を読んで type だけ差し替える
        let current = self.get(&format!("/r/{}/about/edit", venue)).await?;
        let settings = current
            .get("data")
            .and_then(Value::as_object)
            .ok_or_else(|| MessengerError::UnexpectedResponse("no subreddit settings".to_string()))?;

        let mut form: Vec<(String, String)> = settings
            .iter()
            .filter_map(|(key, value)| {
                let text = match value {
                    Value::String(s) => s.clone(),
                    Value::Bool(b) => b.to_string(),
                    Value::Number(n) => n.to_string(),
                    _ => return None,
                };
                Some((key.clone(), text))
            })
            .filter(|(key, _)| key != "type" && key != "subreddit_id")
            .collect();
        let sr = string_field(&current["data"], "subreddit_id")?;
        form.push(("sr".to_string(), sr));
        form.push(("type".to_string(), visibility.as_str().to_string()));
        form.push(("api_type".to_string(), "json".to_string()));

        let form: Vec<(&str, &str)> = form.iter().map(|(k, v)| (k.as_str(), v.as_str())).collect();
        self.post_form("/api/site_admin", &form).await?;
        Ok(())
    }

    async fn add_member(&self, venue: &str, handle: &str) -> Result<(), MessengerError> {
        self.post_form(
            &format!("/r/{}/api/friend", venue),
            &[("name", handle), ("type", "contributor"), ("api_type", "json")],
        )
        .await?;
        Ok(())
    }

    async fn remove_member(&self, venue: &str, handle: &str) -> Result<(), MessengerError> {
        self.post_form(
            &format!("/r/{}/api/unfriend", venue),
            &[("name", handle), ("type", "contributor"), ("api_type", "json")],
        )
        .await?;
        Ok(())
    }

    async fn list_unread_private_messages(&self) -> Result<Vec<PrivateMessage>, MessengerError> {
        let value = self.get("/message/unread?limit=100&raw_json=1").await?;
        let listing = Self::parse_listing(value)?;

        let mut messages = Vec::new();
        // コメント返信(t1)も未読に入るので、プライベートメッセージ(t4)だけを拾う
        for child in listing.data.children.iter().filter(|c| c.kind == "t4") {
            let Some(author) = child.data.get("author").and_then(Value::as_str) else {
                continue;
            };
            messages.push(PrivateMessage {
                id: string_field(&child.data, "name")?,
                author: author.to_string(),
                body: string_field(&child.data, "body")?,
            });
        }
        // 未読一覧は新しい順
        messages.reverse();
        Ok(messages)
    }

    async fn mark_read(&self, message_id: &str) -> Result<(), MessengerError> {
        self.post_form("/api/read_message", &[("id", message_id)])
            .await?;
        Ok(())
    }

    async fn send_private_message(
        &self,
        handle: &str,
        subject: &str,
        body: &str,
    ) -> Result<(), MessengerError> {
        self.post_form(
            "/api/compose",
            &[
                ("to", handle),
                ("subject", subject),
                ("text", body),
                ("api_type", "json"),
            ],
        )
        .await?;
        Ok(())
    }
}

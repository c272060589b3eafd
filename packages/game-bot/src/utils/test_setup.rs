//! In-memory stand-in for the messaging platform, used by the engine tests.

use async_trait::async_trait;
use chrono::{DateTime, Duration, Utc};
use std::collections::{BTreeMap, BTreeSet};
use std::sync::{Mutex, MutexGuard};

use crate::messaging::{
    Comment, Messenger, MessengerError, PrivateMessage, Submission, Visibility,
};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FakePost {
    pub id: String,
    pub venue: String,
    pub title: String,
    pub body: String,
    pub created_at: DateTime<Utc>,
    pub locked: bool,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SentMessage {
    pub to: String,
    pub subject: String,
    pub body: String,
}

#[derive(Debug, Default)]
pub struct FakeState {
    /// 投稿・コメントの作成時刻に使う
    pub clock: DateTime<Utc>,
    next_id: u64,
    pub posts: Vec<FakePost>,
    pub comments: BTreeMap<String, Vec<Comment>>,
    pub replies: Vec<(String, String)>,
    pub removed: Vec<String>,
    pub inbox: Vec<(PrivateMessage, bool)>,
    pub sent: Vec<SentMessage>,
    pub visibility: BTreeMap<String, Visibility>,
    pub members: BTreeMap<String, BTreeSet<String>>,
    /// 設定すると以降の呼び出しがすべて失敗する
    pub failure: Option<String>,
    /// (操作名, n): その操作のn回目の呼び出しだけ失敗させる
    pub fail_on: Option<(&'static str, usize)>,
    calls: BTreeMap<&'static str, usize>,
}

impl FakeState {
    fn next_id(&mut self, prefix: &str) -> String {
        self.next_id += 1;
        format!("{}{}", prefix, self.next_id)
    }

    fn check(&mut self, operation: &'static str) -> Result<(), MessengerError> {
        if let Some(message) = &self.failure {
            return Err(MessengerError::ApiError(message.clone()));
        }
        let calls = self.calls.entry(operation).or_default();
        *calls += 1;
        match self.fail_on {
            Some((target, n)) if target == operation && *calls == n => Err(
                MessengerError::ApiError(format!("{} call {} failed", operation, n)),
            ),
            _ => Ok(()),
        }
    }
}

#[derive(Debug, Default)]
pub struct FakeMessenger {
    state: Mutex<FakeState>,
}

impl FakeMessenger {
    pub fn new(clock: DateTime<Utc>) -> Self {
        let messenger = FakeMessenger::default();
        messenger.state().clock = clock;
        messenger
    }

    pub fn state(&self) -> MutexGuard<'_, FakeState> {
        self.state.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    pub fn advance(&self, by: Duration) -> DateTime<Utc> {
        let mut state = self.state();
        state.clock = state.clock + by;
        state.clock
    }

    pub fn now(&self) -> DateTime<Utc> {
        self.state().clock
    }

    /// 1秒進めた時刻でコメントを追加する
    pub fn add_comment(&self, post_id: &str, author: &str, body: &str) -> String {
        let mut state = self.state();
        state.clock = state.clock + Duration::seconds(1);
        let id = state.next_id("c");
        let comment = Comment {
            id: id.clone(),
            author: author.to_string(),
            body: body.to_string(),
            created_at: state.clock,
        };
        state
            .comments
            .entry(post_id.to_string())
            .or_default()
            .push(comment);
        id
    }

    pub fn add_private_message(&self, author: &str, body: &str) -> String {
        let mut state = self.state();
        let id = state.next_id("m");
        let message = PrivateMessage {
            id: id.clone(),
            author: author.to_string(),
            body: body.to_string(),
        };
        state.inbox.push((message, false));
        id
    }

    pub fn fail_with(&self, message: &str) {
        self.state().failure = Some(message.to_string());
    }

    /// `operation` の呼び出し回数を数え直し、`n` 回目だけ失敗させる
    pub fn fail_nth(&self, operation: &'static str, n: usize) {
        let mut state = self.state();
        state.calls.clear();
        state.fail_on = Some((operation, n));
    }

    pub fn recover(&self) {
        let mut state = self.state();
        state.failure = None;
        state.fail_on = None;
    }

    pub fn is_read(&self, message_id: &str) -> bool {
        self.state()
            .inbox
            .iter()
            .any(|(message, read)| message.id == message_id && *read)
    }

    pub fn posts(&self) -> Vec<FakePost> {
        self.state().posts.clone()
    }

    pub fn last_post_in(&self, venue: &str) -> Option<FakePost> {
        self.state()
            .posts
            .iter()
            .rev()
            .find(|post| post.venue == venue)
            .cloned()
    }

    pub fn replies_to(&self, thing_id: &str) -> Vec<String> {
        self.state()
            .replies
            .iter()
            .filter(|(id, _)| id == thing_id)
            .map(|(_, body)| body.clone())
            .collect()
    }

    pub fn reply_count(&self) -> usize {
        self.state().replies.len()
    }

    pub fn sent_to(&self, handle: &str) -> Vec<SentMessage> {
        self.state()
            .sent
            .iter()
            .filter(|message| message.to == handle)
            .cloned()
            .collect()
    }

    pub fn is_removed(&self, comment_id: &str) -> bool {
        self.state().removed.iter().any(|id| id == comment_id)
    }

    pub fn is_locked(&self, post_id: &str) -> bool {
        self.state()
            .posts
            .iter()
            .any(|post| post.id == post_id && post.locked)
    }

    pub fn visibility(&self, venue: &str) -> Option<Visibility> {
        self.state().visibility.get(venue).copied()
    }

    pub fn members(&self, venue: &str) -> BTreeSet<String> {
        self.state().members.get(venue).cloned().unwrap_or_default()
    }
}

#[async_trait]
impl Messenger for FakeMessenger {
    async fn submit(
        &self,
        venue: &str,
        title: &str,
        body: &str,
    ) -> Result<Submission, MessengerError> {
        let mut state = self.state();
        state.check("submit")?;
        let id = state.next_id("p");
        let created_at = state.clock;
        state.posts.push(FakePost {
            id: id.clone(),
            venue: venue.to_string(),
            title: title.to_string(),
            body: body.to_string(),
            created_at,
            locked: false,
        });
        Ok(Submission { id, created_at })
    }

    async fn post_created(&self, post_id: &str) -> Result<DateTime<Utc>, MessengerError> {
        let mut state = self.state();
        state.check("post_created")?;
        state
            .posts
            .iter()
            .find(|post| post.id == post_id)
            .map(|post| post.created_at)
            .ok_or_else(|| MessengerError::UnexpectedResponse(format!("no post {}", post_id)))
    }

    async fn list_comments(&self, post_id: &str) -> Result<Vec<Comment>, MessengerError> {
        let mut state = self.state();
        state.check("list_comments")?;
        let mut comments = state.comments.get(post_id).cloned().unwrap_or_default();
        comments.sort_by_key(|comment| comment.created_at);
        Ok(comments)
    }

    async fn reply(&self, thing_id: &str, body: &str) -> Result<(), MessengerError> {
        let mut state = self.state();
        state.check("reply")?;
        state.replies.push((thing_id.to_string(), body.to_string()));
        Ok(())
    }

    async fn remove(&self, comment_id: &str) -> Result<(), MessengerError> {
        let mut state = self.state();
        state.check("remove")?;
        state.removed.push(comment_id.to_string());
        Ok(())
    }

    async fn lock(&self, post_id: &str) -> Result<(), MessengerError> {
        let mut state = self.state();
        state.check("lock")?;
        if let Some(post) = state.posts.iter_mut().find(|post| post.id == post_id) {
            post.locked = true;
        }
        Ok(())
    }

    async fn set_venue_visibility(
        &self,
        venue: &str,
        visibility: Visibility,
    ) -> Result<(), MessengerError> {
        let mut state = self.state();
        state.check("set_venue_visibility")?;
        state.visibility.insert(venue.to_string(), visibility);
        Ok(())
    }

    async fn add_member(&self, venue: &str, handle: &str) -> Result<(), MessengerError> {
        let mut state = self.state();
        state.check("add_member")?;
        state
            .members
            .entry(venue.to_string())
            .or_default()
            .insert(handle.to_string());
        Ok(())
    }

    async fn remove_member(&self, venue: &str, handle: &str) -> Result<(), MessengerError> {
        let mut state = self.state();
        state.check("remove_member")?;
        if let Some(members) = state.members.get_mut(venue) {
            members.remove(handle);
        }
        Ok(())
    }

    async fn list_unread_private_messages(&self) -> Result<Vec<PrivateMessage>, MessengerError> {
        let mut state = self.state();
        state.check("list_unread_private_messages")?;
        Ok(state
            .inbox
            .iter()
            .filter(|(_, read)| !read)
            .map(|(message, _)| message.clone())
            .collect())
    }

    async fn mark_read(&self, message_id: &str) -> Result<(), MessengerError> {
        let mut state = self.state();
        state.check("mark_read")?;
        for (message, read) in state.inbox.iter_mut() {
            if message.id == message_id {
                *read = true;
            }
        }
        Ok(())
    }

    async fn send_private_message(
        &self,
        handle: &str,
        subject: &str,
        body: &str,
    ) -> Result<(), MessengerError> {
        let mut state = self.state();
        state.check("send_private_message")?;
        state.sent.push(SentMessage {
            to: handle.to_string(),
            subject: subject.to_string(),
            body: body.to_string(),
        });
        Ok(())
    }
}

//! Game lifecycle: `Init -> Signup -> Confirmation -> Active(n) -> Finale`.
//!
//! One call to [`PhaseEngine::tick`] handles the current state once and
//! returns the updated snapshots. Nothing is persisted from here; the
//! caller writes the returned state back to the store and only then
//! passes [`TickOutcome::read`] to [`PhaseEngine::acknowledge`].

use chrono::{DateTime, Duration, Utc};
use rand::Rng;
use tracing::{debug, error, info};

use crate::command::{self, Keyword};
use crate::error::EngineError;
use crate::messaging::{Comment, Messenger, Visibility};
use crate::models::{GameData, GamePhase, GameState, PhaseData, PlayerName, Team};
use crate::roster::Roster;
use crate::tally::Tally;
use crate::templates::{GameTemplate, PhasePost};

mod submission;
mod turnover;

pub use submission::{validate_kill, validate_target, validate_vote};
pub use turnover::winner;

const WOLF_TITLE_PREFIX: &str = "WOLF SUB ";

/// 1回のtickの結果
#[derive(Debug, Clone, PartialEq)]
pub struct TickOutcome {
    pub state: GameState,
    /// 処理済みの個人メッセージ。保存が成功するまで既読にしない。
    pub read: Vec<String>,
}

pub struct PhaseEngine<'a, M: Messenger + ?Sized, R: Rng> {
    messenger: &'a M,
    /// 生存者でなくてもコメントを削除されないアカウント
    staff: Vec<PlayerName>,
    rng: R,
    read: Vec<String>,
}

impl<'a, M: Messenger + ?Sized, R: Rng> PhaseEngine<'a, M, R> {
    pub fn new(messenger: &'a M, staff: Vec<PlayerName>, rng: R) -> Self {
        PhaseEngine {
            messenger,
            staff,
            rng,
            read: Vec::new(),
        }
    }

    pub async fn tick(
        &mut self,
        state: GameState,
        now: DateTime<Utc>,
    ) -> Result<TickOutcome, EngineError> {
        let GameState {
            mut game,
            mut phase_data,
        } = state;
        self.read.clear();
        let template = game.game_type.template();
        info!("Running {} game, state: {}", game.game_type, game.phase);

        let current = game.phase;
        let result = match current {
            GamePhase::Init => self.post_signups(&mut game, template.as_ref()).await,
            GamePhase::Signup => self.handle_signups(&mut game, template.as_ref()).await,
            GamePhase::Confirmation => {
                self.handle_confirmations(&mut game, template.as_ref())
                    .await
            }
            GamePhase::Active(number) => {
                self.handle_phase(&mut game, &mut phase_data, number, now, template.as_ref())
                    .await
            }
            GamePhase::Finale => {
                debug!("Game is over, nothing to do");
                Ok(())
            }
        };

        if let Err(e) = &result {
            error!("Tick aborted during {}: {}", game.phase, e);
        }
        result?;

        Ok(TickOutcome {
            state: GameState::new(game, phase_data),
            read: std::mem::take(&mut self.read),
        })
    }

    /// 保存済みのtickで処理したメッセージを既読にする
    pub async fn acknowledge(&self, read: &[String]) -> Result<(), EngineError> {
        for id in read {
            self.messenger.mark_read(id).await?;
        }
        debug!("Marked {} messages read", read.len());
        Ok(())
    }

    async fn post_signups(
        &mut self,
        game: &mut GameData,
        template: &dyn GameTemplate,
    ) -> Result<(), EngineError> {
        info!("Posting signups in {}", game.main_venue);
        let post = template.signup_post();
        let submission = self
            .messenger
            .submit(&game.main_venue, &post.title, &post.body)
            .await?;

        game.main_post_id = submission.id;
        game.last_comment_time = submission.created_at;
        game.phase = GamePhase::Signup;
        Ok(())
    }

    async fn handle_signups(
        &mut self,
        game: &mut GameData,
        template: &dyn GameTemplate,
    ) -> Result<(), EngineError> {
        let limit = template.player_limit();
        let watermark = game.last_comment_time;
        let comments = self.messenger.list_comments(&game.main_post_id).await?;

        for comment in comments.into_iter().filter(|c| c.created_at > watermark) {
            if command::contains(&comment.body, Keyword::Signup) {
                let player = PlayerName::new(&comment.author);
                let reply = if game.is_signed_up(&player) {
                    info!("Duplicate signup from {}", player);
                    format!("u/{} already signed up", player)
                } else if game.live_players.len() >= limit {
                    info!("Signup from {} rejected, game is full", player);
                    "Sorry, the game is full".to_string()
                } else {
                    info!("{} signed up", player);
                    let reply = format!("u/{} has signed up", player);
                    game.live_players.push(player);
                    reply
                };
                self.messenger.reply(&comment.id, &reply).await?;
            }
            game.last_comment_time = game.last_comment_time.max(comment.created_at);
        }

        debug!("{}/{} players signed up", game.live_players.len(), limit);
        if game.live_players.len() < limit {
            return Ok(());
        }

        let roles = template.assign_roles(&game.live_players, &mut self.rng)?;
        info!("Game is full, assigned {} roles", roles.len());

        self.messenger.lock(&game.main_post_id).await?;
        let confirmation = self
            .messenger
            .submit(
                &game.main_venue,
                "Confirmation Phase",
                "Role PMs are being sent. Feel free to chat amongst yourselves while we wait for everyone to confirm.",
            )
            .await?;

        game.roles = roles;
        game.main_post_id = confirmation.id;
        game.last_comment_time = confirmation.created_at;
        game.phase = GamePhase::Confirmation;
        Ok(())
    }

    async fn handle_confirmations(
        &mut self,
        game: &mut GameData,
        template: &dyn GameTemplate,
    ) -> Result<(), EngineError> {
        // 1回のtickで送る役職PMは1通だけ
        let next = game
            .live_players
            .iter()
            .find(|p| !game.pending_players.contains(p) && !game.confirmed_players.contains(p))
            .cloned();
        if let Some(player) = next {
            let role = game.roles.get(&player).copied().ok_or_else(|| {
                EngineError::CorruptSnapshot(format!("player {} has no role", player))
            })?;
            info!("Sending role PM to {}", player);
            self.messenger
                .send_private_message(
                    player.as_str(),
                    "Your role for this game",
                    &template.role_description(role),
                )
                .await?;
            game.pending_players.push(player);
        }

        let messages = self.messenger.list_unread_private_messages().await?;
        for message in messages {
            let player = PlayerName::new(&message.author);
            if game.pending_players.contains(&player)
                && command::contains(&message.body, Keyword::Confirm)
            {
                info!("{} confirmed", player);
                game.pending_players.retain(|p| p != &player);
                game.confirmed_players.push(player);
                self.messenger
                    .reply(&message.id, "Thanks for confirming!")
                    .await?;
            }
            self.read.push(message.id);
        }

        debug!(
            "{}/{} players confirmed",
            game.confirmed_players.len(),
            template.player_limit()
        );
        if game.confirmed_players.len() < template.player_limit() {
            return Ok(());
        }

        self.start_game(game, template).await
    }

    async fn start_game(
        &mut self,
        game: &mut GameData,
        template: &dyn GameTemplate,
    ) -> Result<(), EngineError> {
        info!("All players confirmed, starting the game");
        self.messenger
            .set_venue_visibility(&game.wolf_venue, Visibility::Private)
            .await?;
        for player in &game.confirmed_players {
            if game.roles.get(player).map(|r| r.team()) == Some(Team::Wolf) {
                self.messenger
                    .add_member(&game.wolf_venue, player.as_str())
                    .await?;
            }
        }

        game.live_players = game.confirmed_players.clone();
        game.dead_players.clear();
        game.pending_players.clear();

        for player in &game.live_players {
            self.messenger
                .send_private_message(
                    player.as_str(),
                    "The game has begun",
                    &format!(
                        "Everyone has confirmed. Phase 1 is now open in r/{}.",
                        game.main_venue
                    ),
                )
                .await?;
        }

        self.post_phase(game, template.phase_narrative(1, None)).await?;
        game.phase = GamePhase::Active(1);
        Ok(())
    }

    async fn handle_phase(
        &mut self,
        game: &mut GameData,
        phase: &mut PhaseData,
        number: u32,
        now: DateTime<Utc>,
        template: &dyn GameTemplate,
    ) -> Result<(), EngineError> {
        let roster = Roster::from_game(game)?;

        self.process_votes(game, phase, &roster, number).await?;
        self.process_kills(game, phase, &roster, number).await?;
        self.process_targets(phase, &roster, number).await?;

        let started = self.messenger.post_created(&game.main_post_id).await?;
        let length = Duration::hours(i64::from(game.phase_length_hours));
        let elapsed = now - started;
        if elapsed <= length {
            debug!(
                "{} minutes until turnover",
                (length - elapsed).num_minutes()
            );
            return Ok(());
        }

        self.turnover(game, phase, roster, number, template).await
    }

    async fn process_votes(
        &mut self,
        game: &mut GameData,
        phase: &mut PhaseData,
        roster: &Roster,
        number: u32,
    ) -> Result<(), EngineError> {
        let watermark = game.last_comment_time;
        let comments = self.messenger.list_comments(&game.main_post_id).await?;

        for comment in comments.into_iter().filter(|c| c.created_at > watermark) {
            let author = PlayerName::new(&comment.author);
            if self.admit(roster, &author, &comment).await? {
                if let Some(target) = command::scan_target(&comment.body, Keyword::Vote) {
                    let reply = match validate_vote(roster, &author, target) {
                        Ok(target) => {
                            info!("{} votes for {}", author, target);
                            let reply = format!(
                                "u/{} has voted for u/{} in Phase {}.",
                                author, target, number
                            );
                            phase.record_vote(author.clone(), target);
                            reply
                        }
                        Err(e) => {
                            info!("Rejected vote from {}: {}", author, e);
                            e.to_string()
                        }
                    };
                    self.messenger.reply(&comment.id, &reply).await?;
                }
                if command::contains(&comment.body, Keyword::Table) {
                    let tally = Tally::count(roster.live(), &phase.votes);
                    self.messenger.reply(&comment.id, &tally.render()).await?;
                }
            }
            game.last_comment_time = game.last_comment_time.max(comment.created_at);
        }
        Ok(())
    }

    async fn process_kills(
        &mut self,
        game: &mut GameData,
        phase: &mut PhaseData,
        roster: &Roster,
        number: u32,
    ) -> Result<(), EngineError> {
        let watermark = game.last_wolf_comment_time;
        let comments = self.messenger.list_comments(&game.wolf_post_id).await?;

        for comment in comments.into_iter().filter(|c| c.created_at > watermark) {
            let author = PlayerName::new(&comment.author);
            if self.admit(roster, &author, &comment).await? {
                if let Some(target) = command::scan_target(&comment.body, Keyword::Kill) {
                    let reply = match validate_kill(roster, &author, target) {
                        Ok(target) => {
                            info!("{} orders the kill on {}", author, target);
                            let reply = format!(
                                "Kill order for Phase {} accepted: u/{}.",
                                number, target
                            );
                            phase.record_kill(author.clone(), target);
                            reply
                        }
                        Err(e) => {
                            info!("Rejected kill from {}: {}", author, e);
                            e.to_string()
                        }
                    };
                    self.messenger.reply(&comment.id, &reply).await?;
                }
            }
            game.last_wolf_comment_time = game.last_wolf_comment_time.max(comment.created_at);
        }
        Ok(())
    }

    async fn process_targets(
        &mut self,
        phase: &mut PhaseData,
        roster: &Roster,
        number: u32,
    ) -> Result<(), EngineError> {
        let messages = self.messenger.list_unread_private_messages().await?;

        for message in messages {
            let author = PlayerName::new(&message.author);
            if let Some(target) = command::scan_target(&message.body, Keyword::Target) {
                let reply = match validate_target(roster, &author, target) {
                    Ok(target) => {
                        info!("{} targets {}", author, target);
                        let reply = format!(
                            "Your target for Phase {} is u/{}.",
                            number, target
                        );
                        phase.record_action(author.clone(), target);
                        reply
                    }
                    Err(e) => {
                        info!("Rejected target from {}: {}", author, e);
                        e.to_string()
                    }
                };
                self.messenger.reply(&message.id, &reply).await?;
            }
            self.read.push(message.id);
        }
        Ok(())
    }

    /// 生存者のコメントなら `true`。参加者以外のコメントは警告して削除する。
    async fn admit(
        &self,
        roster: &Roster,
        author: &PlayerName,
        comment: &Comment,
    ) -> Result<bool, EngineError> {
        if roster.is_alive(author) {
            return Ok(true);
        }
        if self.staff.contains(author) {
            return Ok(false);
        }

        info!("Removing comment {} from non-player {}", comment.id, author);
        self.messenger
            .reply(
                &comment.id,
                &format!(
                    "u/{} is not a living player in this game, so this comment has been removed.",
                    author
                ),
            )
            .await?;
        self.messenger.remove(&comment.id).await?;
        Ok(false)
    }

    /// 両方の会場にフェーズ投稿を出し、監視対象とウォーターマークを切り替える
    async fn post_phase(&self, game: &mut GameData, post: PhasePost) -> Result<(), EngineError> {
        let main = self
            .messenger
            .submit(&game.main_venue, &post.title, &post.body)
            .await?;
        let wolf_title = format!("{}{}", WOLF_TITLE_PREFIX, post.title);
        let wolf = self
            .messenger
            .submit(&game.wolf_venue, &wolf_title, &post.body)
            .await?;

        info!("Posted {} as {} / {}", post.title, main.id, wolf.id);
        game.main_post_id = main.id;
        game.last_comment_time = main.created_at;
        game.wolf_post_id = wolf.id;
        game.last_wolf_comment_time = wolf.created_at;
        Ok(())
    }
}

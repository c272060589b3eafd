use thiserror::Error;

use crate::messaging::MessengerError;
use crate::models::PlayerName;
use crate::store::StoreError;

/// tickを中断させるエラー
#[derive(Error, Debug)]
pub enum EngineError {
    #[error("Messaging call failed: {0}")]
    Messenger(#[from] MessengerError),
    #[error("Snapshot store call failed: {0}")]
    Store(#[from] StoreError),
    #[error("Game template {template} does not implement {hook}")]
    Unimplemented {
        template: &'static str,
        hook: &'static str,
    },
    #[error("Corrupt snapshot: {0}")]
    CorruptSnapshot(String),
}

/// Rejected player command. The message doubles as the reply text.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum SubmissionError {
    #[error("Please name a target, e.g. `{0} u/username`.")]
    MissingTarget(&'static str),
    #[error("u/{0} is not a valid target.")]
    InvalidTarget(PlayerName),
    #[error("I'm sorry, u/{0} is already dead.")]
    DeadTarget(PlayerName),
    #[error("I'm sorry, you are not a living player in this game.")]
    NotAlive,
    #[error("Your role has no night action.")]
    NoNightAction,
    #[error("Your role does not allow you to target yourself.")]
    SelfTarget,
    #[error("Only a wolf holding the kill can submit a kill.")]
    NoKillRights,
    #[error("The wolves cannot kill one of their own.")]
    WolfTarget,
}

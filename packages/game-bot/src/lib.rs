pub mod command;
pub mod engine;
pub mod error;
pub mod messaging;
pub mod models;
pub mod resolver;
pub mod roster;
pub mod store;
pub mod tally;
pub mod templates;
pub mod utils;

pub use engine::{PhaseEngine, TickOutcome};
pub use error::{EngineError, SubmissionError};
pub use models::{GameData, GamePhase, GameState, GameType, PhaseData, PlayerName, Role, Team};

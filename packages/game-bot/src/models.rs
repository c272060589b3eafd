pub mod cli;
pub mod game;
pub mod phase;
pub mod player;
pub mod role;

pub use cli::*;
pub use game::*;
pub use phase::*;
pub use player::*;
pub use role::*;

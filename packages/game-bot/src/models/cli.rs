use structopt::StructOpt;

use super::game::GameType;

#[derive(Debug, StructOpt)]
#[structopt(name = "game-bot", about = "usage of game-bot commands.")]
pub enum Command {
    /// run one engine tick against the stored game
    #[structopt(name = "tick")]
    Tick,
    /// reset the store to a fresh game
    #[structopt(name = "new-game")]
    NewGame {
        /// game template (matrix6 | test)
        #[structopt(long, default_value = "matrix6")]
        game_type: GameType,
        /// subreddit hosting signups and day phases
        #[structopt(long)]
        main_venue: String,
        /// private subreddit for the wolves
        #[structopt(long)]
        wolf_venue: String,
        /// hours before a phase turns over
        #[structopt(long, default_value = "24")]
        phase_length_hours: u32,
    },
    /// print the stored snapshots
    #[structopt(name = "show")]
    Show,
}

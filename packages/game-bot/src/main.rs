use anyhow::Context;
use chrono::Utc;
use dotenvy::dotenv;
use env_logger::Builder;
use game_bot::{
    messaging::RedditClient,
    models::{Command, GameData},
    store::SnapshotClient,
    utils::config::{store_url, BotConfig, DebugConfig},
    PhaseEngine,
};
use log::LevelFilter;
use rand::rngs::StdRng;
use rand::SeedableRng;
use structopt::StructOpt;
use tracing::{error, info};

// ログ設定
fn init_logger(debug: &DebugConfig) {
    let level = if debug.verbose_logging {
        LevelFilter::Debug
    } else {
        LevelFilter::Info
    };

    let mut builder = Builder::new();
    builder
        .filter_level(LevelFilter::Info)
        .filter_module("game_bot", level)
        .format_timestamp(Some(env_logger::TimestampPrecision::Millis))
        .format_target(true);
    if let Ok(filters) = std::env::var("RUST_LOG") {
        builder.parse_filters(&filters);
    }
    builder.init();
}

async fn tick(store: &SnapshotClient, debug: &DebugConfig) -> anyhow::Result<()> {
    let config = BotConfig::from_env()?;
    let reddit = RedditClient::new(config.credentials, config.auth_url, config.api_url)?;
    let rng = match debug.rng_seed {
        Some(seed) => StdRng::seed_from_u64(seed),
        None => StdRng::from_entropy(),
    };

    let state = store.load().await.context("failed to load snapshots")?;
    let mut engine = PhaseEngine::new(&reddit, config.staff, rng);
    // 失敗したtickの結果は保存しない。次のtickで同じ範囲から再処理する。
    let outcome = engine.tick(state, Utc::now()).await?;
    store
        .save(&outcome.state)
        .await
        .context("failed to save snapshots")?;
    engine
        .acknowledge(&outcome.read)
        .await
        .context("failed to mark messages read")?;

    info!("Tick finished, game is in {}", outcome.state.game.phase);
    Ok(())
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // 環境変数をロード
    if let Err(e) = dotenv() {
        eprintln!("Warning: failed to load .env file: {}", e);
    }

    let debug = DebugConfig::from_env()?;
    init_logger(&debug);

    let command = Command::from_args();
    let store = SnapshotClient::new(store_url())?;

    match command {
        Command::Tick => {
            if let Err(e) = tick(&store, &debug).await {
                error!("Tick failed: {:#}", e);
                return Err(e);
            }
        }
        Command::NewGame {
            game_type,
            main_venue,
            wolf_venue,
            phase_length_hours,
        } => {
            let game = GameData::new(game_type, main_venue, wolf_venue, phase_length_hours);
            store.new_game(&game).await?;
            info!("Created new {} game", game_type);
        }
        Command::Show => {
            let state = store.load().await?;
            println!("{}", serde_json::to_string_pretty(&state.game)?);
            println!("{}", serde_json::to_string_pretty(&state.phase_data)?);
        }
    }

    Ok(())
}

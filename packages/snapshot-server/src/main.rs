use axum::http;
use dotenvy::dotenv;
use env_logger::Builder;
use log::LevelFilter;
use snapshot_server::{app, utils::config::CONFIG};
use std::time::Duration;
use tower_http::trace::TraceLayer;
use tracing::{info, Span};

// ログ設定
fn init_logger() {
    let mut builder = Builder::new();
    builder
        .filter_level(LevelFilter::Info)
        .filter_module("tower_http", LevelFilter::Info)
        .format_timestamp(Some(env_logger::TimestampPrecision::Millis))
        .format_target(true);
    if let Ok(filters) = std::env::var("RUST_LOG") {
        builder.parse_filters(&filters);
    }
    builder.init();
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // 環境変数をロード
    if let Err(e) = dotenv() {
        eprintln!("Warning: failed to load .env file: {}", e);
    }

    init_logger();
    info!("Starting server, data in {}", CONFIG.data_dir.display());

    let app = app::create_app().layer(
        TraceLayer::new_for_http()
            .make_span_with(|request: &http::Request<_>| {
                tracing::info_span!(
                    "HTTP request",
                    method = %request.method(),
                    uri = %request.uri(),
                )
            })
            // 2xx 以外だけ記録する
            .on_response(
                |response: &http::Response<_>, latency: Duration, _span: &Span| {
                    if !response.status().is_success() {
                        info!("{} in {:?}", response.status(), latency);
                    }
                },
            ),
    );

    let listener = tokio::net::TcpListener::bind(&CONFIG.addr).await?;
    info!("Listening on {}", CONFIG.addr);
    axum::serve(listener, app).await?;

    Ok(())
}

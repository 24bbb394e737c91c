use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use anyhow::Context;
use clap::Parser;
use teloxide::prelude::*;
use tracing::{info, warn};

use polybot_core::config::{BotMode, PolybotConfig, WebhookConfig};
use polybot_detect::{HttpDetectionBackend, S3ObjectStore, SqlitePredictionStore};
use polybot_telegram::{
    build_handler, DetectionServices, MessageHandler, TelegramAdapter, TelegramTransport,
    Transport,
};

mod app;
mod http;

#[derive(Debug, Parser)]
#[command(name = "polybot-gateway", version, about = "Telegram photo bot")]
struct Cli {
    /// Config file. Defaults to ~/.polybot/polybot.toml.
    #[arg(long, env = "POLYBOT_CONFIG")]
    config: Option<String>,

    /// Override `bot.mode` (echo, quote, image-processing, object-detection).
    #[arg(long)]
    mode: Option<BotMode>,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| {
                "polybot_gateway=info,polybot_telegram=info,tower_http=debug".into()
            }),
        )
        .init();

    let cli = Cli::parse();

    // config: --config / POLYBOT_CONFIG > ~/.polybot/polybot.toml
    let mut config = PolybotConfig::load(cli.config.as_deref()).unwrap_or_else(|e| {
        warn!("Config load failed ({}), using defaults", e);
        PolybotConfig::default()
    });
    if let Some(mode) = cli.mode {
        config.bot.mode = mode;
    }

    let token = config.telegram.token()?;
    let bot = Bot::new(&token);
    let transport: Arc<dyn Transport> =
        Arc::new(TelegramTransport::new(bot.clone(), &config.telegram));

    let detection = match config.bot.mode {
        BotMode::ObjectDetection => Some(build_detection(&config)?),
        _ => None,
    };
    let handler = build_handler(&config.bot, &config.image, transport, detection)?;

    match config.telegram.webhook {
        Some(ref webhook) => serve_webhook(bot, token, webhook, config.bot.mode, handler).await,
        None => {
            TelegramAdapter::new(bot, handler).run().await;
            Ok(())
        }
    }
}

/// Wire the object-detection collaborators from `[detection]`, `[storage]`
/// and `[database]`.
fn build_detection(config: &PolybotConfig) -> anyhow::Result<DetectionServices> {
    let backend = HttpDetectionBackend::new(&config.detection)?;

    let storage_cfg = config
        .storage
        .as_ref()
        .context("object-detection mode needs a [storage] section")?;
    let storage = S3ObjectStore::from_config(storage_cfg)?;

    let db_path = &config.database.path;
    ensure_parent_dir(db_path);
    info!(path = %db_path, "opening SQLite database");
    let db = rusqlite::Connection::open(db_path)?;
    db.execute_batch("PRAGMA journal_mode=WAL;")?;
    let predictions = SqlitePredictionStore::new(db)?;

    Ok(DetectionServices {
        backend: Arc::new(backend),
        storage: Arc::new(storage),
        predictions: Some(Arc::new(predictions)),
        upload_prefix: config.detection.upload_prefix.clone(),
    })
}

/// Register `<public_url>/<token>/` with Telegram and serve updates over HTTP.
async fn serve_webhook(
    bot: Bot,
    token: String,
    webhook: &WebhookConfig,
    mode: BotMode,
    handler: Arc<dyn MessageHandler>,
) -> anyhow::Result<()> {
    let public_url = webhook.public_url()?;
    let hook_url = reqwest::Url::parse(&format!("{public_url}/{token}/"))
        .context("telegram.webhook.public_url is not a valid URL")?;

    bot.delete_webhook().await?;
    tokio::time::sleep(Duration::from_millis(500)).await;
    bot.set_webhook(hook_url).await?;
    info!(url = %public_url, "Telegram webhook registered");

    let state = Arc::new(app::AppState::new(handler, token, mode));
    let router = app::build_router(state);

    let addr: SocketAddr = format!("{}:{}", webhook.bind, webhook.port).parse()?;
    info!("Polybot gateway listening on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, router).await?;
    Ok(())
}

fn ensure_parent_dir(path: &str) {
    if let Some(parent) = std::path::Path::new(path).parent() {
        let _ = std::fs::create_dir_all(parent);
    }
}

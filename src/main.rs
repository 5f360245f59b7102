use clap::Parser;
use std::sync::Arc;
use tracing::info;
use tracing_subscriber::EnvFilter;

use tootbot::api::mastodon::MastodonTransport;
use tootbot::bot::{CommandLineBot, ImageSource, PostJournal, TootBot};
use tootbot::config::{Config, LogLevel};
use tootbot::error::AppResult;

#[tokio::main]
async fn main() -> AppResult<()> {
    // Парсим конфигурацию из CLI и env
    let config = Config::parse();

    // Валидируем конфигурацию
    config.validate()?;
    let options = Arc::new(config.publish_options()?);

    // Инициализируем логирование
    init_tracing(options.loglevel())?;

    info!(
        "Starting tootbot - instance: {}, visibility: {}, retries: {}",
        options.instance(),
        options.visibility(),
        options.retries()
    );

    let transport = Arc::new(MastodonTransport::new(&options)?);
    let journal = options.data_dir().map(PostJournal::new);

    let mut bot = CommandLineBot::new(transport, Arc::clone(&options), &config.text)
        .with_image(ImageSource::from_config(&config)?)
        .with_hooks(journal);

    bot.post().await
}

/// Инициализирует систему логирования с использованием tracing
fn init_tracing(level: LogLevel) -> AppResult<()> {
    let env_filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(level.filter_directive()))
        .unwrap_or_else(|_| EnvFilter::new("info"));

    tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_target(true)
        .with_line_number(true)
        .with_file(true)
        .try_init()
        .map_err(|e| tootbot::error::AppError::Custom(format!("tracing init failed: {}", e)))?;

    info!("Tracing initialized");
    Ok(())
}

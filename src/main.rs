use std::sync::Arc;

use teloxide::prelude::*;
use tracing::info;
use tracing_subscriber::prelude::*;

use lullabot::alerts::AlertLayer;
use lullabot::config::Config;
use lullabot::tracker::AppState;
use lullabot::tracker::database::Database;
use lullabot::tracker::handlers::{self, Command};
use lullabot::tracker::reminders::spawn_reminder_loop;

#[tokio::main]
async fn main() {
    let config_path = std::env::args()
        .nth(1)
        .unwrap_or_else(|| "lullabot.json".to_string());
    let config = match Config::load(&config_path) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("{e}");
            std::process::exit(1);
        }
    };

    let bot = Bot::new(&config.telegram_bot_token);

    // Setup logging
    let log_dir = config.data_dir.join("logs");
    std::fs::create_dir_all(&log_dir).ok();
    let log_file = std::fs::OpenOptions::new()
        .create(true)
        .append(true)
        .open(log_dir.join("lullabot.log"))
        .expect("Failed to open log file");
    let (non_blocking, _guard) = tracing_appender::non_blocking(log_file);

    let registry = tracing_subscriber::registry()
        .with(
            tracing_subscriber::fmt::layer()
                .with_writer(std::io::stdout)
                .with_filter(
                    tracing_subscriber::EnvFilter::from_default_env()
                        .add_directive(tracing::Level::INFO.into()),
                ),
        )
        .with(
            tracing_subscriber::fmt::layer()
                .with_writer(non_blocking)
                .with_ansi(false)
                .with_filter(
                    tracing_subscriber::EnvFilter::from_default_env()
                        .add_directive(tracing::Level::INFO.into()),
                ),
        );

    if let Some(log_chat_id) = config.log_chat_id {
        let alert_layer = AlertLayer::new(bot.clone(), log_chat_id);
        registry.with(alert_layer).init();
    } else {
        registry.init();
    }

    info!("🚀 Starting lullabot...");
    info!("Loaded config from {config_path}");
    info!("Timezone: {}", config.timezone);

    let db = match Database::open(&config.database_path) {
        Ok(db) => db,
        Err(e) => {
            eprintln!("failed to open database {:?}: {e}", config.database_path);
            std::process::exit(1);
        }
    };

    let state = Arc::new(AppState::new(config, db));
    spawn_reminder_loop(bot.clone(), state.clone());

    let handler = dptree::entry()
        .branch(
            Update::filter_message()
                .filter_command::<Command>()
                .endpoint(handlers::handle_command),
        )
        .branch(Update::filter_message().endpoint(handlers::handle_text))
        .branch(Update::filter_callback_query().endpoint(handlers::handle_callback));

    Dispatcher::builder(bot, handler)
        .dependencies(dptree::deps![state])
        .enable_ctrlc_handler()
        .build()
        .dispatch()
        .await;
}

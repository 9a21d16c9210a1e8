use serde::Deserialize;
use std::fmt;
use std::path::{Path, PathBuf};
use teloxide::types::ChatId;

use chrono_tz::Tz;

/// Errors that can occur when loading configuration.
#[derive(Debug)]
pub enum ConfigError {
    /// Failed to read the config file.
    ReadFile { path: PathBuf, source: std::io::Error },
    /// Failed to parse JSON.
    ParseJson { path: PathBuf, source: serde_json::Error },
    /// Unknown IANA timezone name.
    InvalidTimezone { value: String },
    /// Validation error.
    Validation(String),
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::ReadFile { path, source } => {
                write!(f, "failed to read config file '{}': {}", path.display(), source)
            }
            Self::ParseJson { path, source } => {
                write!(f, "failed to parse config file '{}': {}", path.display(), source)
            }
            Self::InvalidTimezone { value } => {
                write!(f, "unknown timezone '{}' (expected an IANA name like Europe/Moscow)", value)
            }
            Self::Validation(msg) => write!(f, "config validation error: {}", msg),
        }
    }
}

impl std::error::Error for ConfigError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::ReadFile { source, .. } => Some(source),
            Self::ParseJson { source, .. } => Some(source),
            Self::InvalidTimezone { .. } => None,
            Self::Validation(_) => None,
        }
    }
}

#[derive(Deserialize)]
struct ConfigFile {
    /// Bot token; falls back to the TELEGRAM_BOT_TOKEN environment variable.
    telegram_bot_token: Option<String>,
    /// Directory for state files (database, logs). Defaults to the current directory.
    data_dir: Option<String>,
    /// Database file, relative to data_dir unless absolute.
    database_file: Option<String>,
    /// IANA timezone all records are kept in.
    timezone: Option<String>,
    /// Seconds between reminder polls.
    #[serde(default = "default_reminder_poll_secs")]
    reminder_poll_secs: u64,
    /// Chat that receives WARN/ERROR log alerts.
    log_chat_id: Option<i64>,
}

fn default_reminder_poll_secs() -> u64 {
    3600
}

pub struct Config {
    pub telegram_bot_token: String,
    /// Directory for state files (database, logs).
    pub data_dir: PathBuf,
    pub database_path: PathBuf,
    /// Timezone all record timestamps are local to.
    pub timezone: Tz,
    pub reminder_poll_secs: u64,
    /// Chat that receives WARN/ERROR log alerts.
    pub log_chat_id: Option<ChatId>,
}

impl Config {
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let config_path = path.as_ref().to_path_buf();
        let content = std::fs::read_to_string(&config_path)
            .map_err(|e| ConfigError::ReadFile { path: config_path.clone(), source: e })?;
        let file: ConfigFile = serde_json::from_str(&content)
            .map_err(|e| ConfigError::ParseJson { path: config_path.clone(), source: e })?;

        let telegram_bot_token = file
            .telegram_bot_token
            .or_else(|| std::env::var("TELEGRAM_BOT_TOKEN").ok())
            .ok_or_else(|| {
                ConfigError::Validation(
                    "telegram_bot_token is required (config field or TELEGRAM_BOT_TOKEN env var)"
                        .into(),
                )
            })?;

        // Telegram tokens are formatted as {bot_id}:{secret} where bot_id is numeric
        let token_parts: Vec<&str> = telegram_bot_token.split(':').collect();
        if token_parts.len() != 2 || token_parts[0].parse::<u64>().is_err() || token_parts[1].is_empty() {
            return Err(ConfigError::Validation(
                "telegram_bot_token appears invalid (expected format: 123456789:ABCdefGHI...)".into(),
            ));
        }

        let timezone_name = file.timezone.unwrap_or_else(|| "Europe/Moscow".to_string());
        let timezone: Tz = timezone_name
            .parse()
            .map_err(|_| ConfigError::InvalidTimezone { value: timezone_name })?;

        let data_dir = file
            .data_dir
            .map(PathBuf::from)
            .unwrap_or_else(|| PathBuf::from("."));
        let database_path = data_dir.join(
            file.database_file
                .unwrap_or_else(|| "baby_tracker.db".to_string()),
        );

        if file.reminder_poll_secs == 0 {
            return Err(ConfigError::Validation("reminder_poll_secs must be positive".into()));
        }

        Ok(Self {
            telegram_bot_token,
            data_dir,
            database_path,
            timezone,
            reminder_poll_secs: file.reminder_poll_secs,
            log_chat_id: file.log_chat_id.map(ChatId),
        })
    }
}

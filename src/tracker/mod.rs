//! Infant care tracking: records, sessions, flows, and chat handlers.

pub mod database;
pub mod flows;
pub mod handlers;
pub mod keyboards;
pub mod model;
pub mod reminders;
pub mod sessions;
pub mod stats;

use std::collections::HashMap;

use chrono::{NaiveDate, NaiveDateTime, Utc};
use tokio::sync::Mutex;

use crate::config::Config;
use database::Database;
use flows::Flow;

/// Application context shared by every handler.
pub struct AppState {
    pub config: Config,
    pub db: Database,
    /// Per-chat input flow in progress, keyed by chat id.
    pub flows: Mutex<HashMap<i64, Flow>>,
}

impl AppState {
    pub fn new(config: Config, db: Database) -> Self {
        Self {
            config,
            db,
            flows: Mutex::new(HashMap::new()),
        }
    }

    /// Naive local time in the configured timezone; all records use it.
    pub fn now(&self) -> NaiveDateTime {
        Utc::now().with_timezone(&self.config.timezone).naive_local()
    }

    /// The local date.
    pub fn today(&self) -> NaiveDate {
        self.now().date()
    }
}

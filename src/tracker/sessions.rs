//! Active-session tracking over the interval tables.
//!
//! Feedings, sleep, and wakefulness are exclusive time-bounded intervals:
//! at most one open feeding per chat, at most one open sleep and one open
//! wakefulness per child, and starting sleep or wakefulness force-closes
//! the other.

use chrono::NaiveDateTime;
use tracing::info;

use crate::tracker::database::Database;
use crate::tracker::model::ClosedInterval;

/// Result of trying to open a sleep or wake interval.
#[derive(Debug)]
pub enum StartOutcome {
    Started {
        /// The opposite interval that was force-closed, if one was open.
        interrupted: Option<ClosedInterval>,
    },
    /// The same activity is already running.
    AlreadyActive { since: NaiveDateTime },
}

/// Result of trying to close a sleep or wake interval.
#[derive(Debug)]
pub enum EndOutcome {
    Ended(ClosedInterval),
    NotActive,
}

/// Result of trying to open a feeding.
#[derive(Debug)]
pub enum FeedingStart {
    Started { id: i64 },
    AlreadyActive,
}

/// Open a sleep interval, force-closing any open wakefulness.
pub fn start_sleep(
    db: &Database,
    child_id: i64,
    now: NaiveDateTime,
) -> rusqlite::Result<StartOutcome> {
    if let Some(open) = db.active_sleep(child_id)? {
        return Ok(StartOutcome::AlreadyActive { since: open.started_at });
    }

    let interrupted = match db.active_wake(child_id)? {
        Some(open) => {
            let closed = db.close_wake(open.id, now)?;
            info!("Closed wake interval {} for child {} ({}m)", open.id, child_id, closed.minutes);
            Some(closed)
        }
        None => None,
    };

    db.insert_sleep(child_id, now)?;
    info!("Sleep started for child {}", child_id);
    Ok(StartOutcome::Started { interrupted })
}

/// Close the open sleep interval, if any.
pub fn end_sleep(
    db: &Database,
    child_id: i64,
    now: NaiveDateTime,
) -> rusqlite::Result<EndOutcome> {
    match db.active_sleep(child_id)? {
        Some(open) => {
            let closed = db.close_sleep(open.id, now)?;
            info!("Sleep ended for child {} ({}m)", child_id, closed.minutes);
            Ok(EndOutcome::Ended(closed))
        }
        None => Ok(EndOutcome::NotActive),
    }
}

/// Open a wakefulness interval, force-closing any open sleep.
pub fn start_wake(
    db: &Database,
    child_id: i64,
    now: NaiveDateTime,
) -> rusqlite::Result<StartOutcome> {
    if let Some(open) = db.active_wake(child_id)? {
        return Ok(StartOutcome::AlreadyActive { since: open.started_at });
    }

    let interrupted = match db.active_sleep(child_id)? {
        Some(open) => {
            let closed = db.close_sleep(open.id, now)?;
            info!("Closed sleep interval {} for child {} ({}m)", open.id, child_id, closed.minutes);
            Some(closed)
        }
        None => None,
    };

    db.insert_wake(child_id, now)?;
    info!("Wakefulness started for child {}", child_id);
    Ok(StartOutcome::Started { interrupted })
}

/// Close the open wakefulness interval, if any.
pub fn end_wake(
    db: &Database,
    child_id: i64,
    now: NaiveDateTime,
) -> rusqlite::Result<EndOutcome> {
    match db.active_wake(child_id)? {
        Some(open) => {
            let closed = db.close_wake(open.id, now)?;
            info!("Wakefulness ended for child {} ({}m)", child_id, closed.minutes);
            Ok(EndOutcome::Ended(closed))
        }
        None => Ok(EndOutcome::NotActive),
    }
}

/// Open a feeding unless the chat already has one running.
pub fn start_feeding(
    db: &Database,
    chat_id: i64,
    child_id: i64,
    now: NaiveDateTime,
) -> rusqlite::Result<FeedingStart> {
    if db.active_feeding(chat_id)?.is_some() {
        return Ok(FeedingStart::AlreadyActive);
    }
    let id = db.insert_feeding(chat_id, child_id, now)?;
    info!("Feeding {} started for chat {}", id, chat_id);
    Ok(FeedingStart::Started { id })
}

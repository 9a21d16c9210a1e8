//! Persistent SQLite store: one table per tracked activity.

use std::path::Path;
use std::sync::Mutex;
use std::time::Duration;

use chrono::{NaiveDate, NaiveDateTime};
use rusqlite::{Connection, OptionalExtension, params};
use tracing::info;

use crate::tracker::model::{
    Child, ClosedInterval, DiaperDayCount, DiaperKind, DueReminder, Feeding, FeedingDayStats,
    FeedingDayTotal, FeedingRecord, Gender, IntervalDayStats, JournalNote, Measurement, NewChild,
    OpenInterval,
};

const TS_FMT: &str = "%Y-%m-%d %H:%M:%S";
const DATE_FMT: &str = "%Y-%m-%d";

/// Reminder kind for periodic growth measurements.
const REMINDER_GROWTH: &str = "growth";

/// Measurement reminder frequencies seeded at registration, in days.
const REMINDER_FREQUENCIES: [i64; 3] = [1, 7, 30];

const SLEEP_TABLE: &str = "sleep_intervals";
const WAKE_TABLE: &str = "wake_intervals";

fn fmt_ts(ts: NaiveDateTime) -> String {
    ts.format(TS_FMT).to_string()
}

fn fmt_date(date: NaiveDate) -> String {
    date.format(DATE_FMT).to_string()
}

fn ts_from_sql(idx: usize, s: String) -> rusqlite::Result<NaiveDateTime> {
    NaiveDateTime::parse_from_str(&s, TS_FMT).map_err(|e| {
        rusqlite::Error::FromSqlConversionFailure(idx, rusqlite::types::Type::Text, Box::new(e))
    })
}

fn date_from_sql(idx: usize, s: String) -> rusqlite::Result<NaiveDate> {
    NaiveDate::parse_from_str(&s, DATE_FMT).map_err(|e| {
        rusqlite::Error::FromSqlConversionFailure(idx, rusqlite::types::Type::Text, Box::new(e))
    })
}

/// SQLite database behind a mutex-guarded connection.
pub struct Database {
    conn: Mutex<Connection>,
}

impl Database {
    /// Open (or create) the database file and apply the schema.
    pub fn open(path: &Path) -> rusqlite::Result<Self> {
        let conn = Connection::open(path)?;
        let db = Self::bootstrap(conn)?;
        info!("Opened database at {:?}", path);
        Ok(db)
    }

    /// In-memory database, used by tests.
    pub fn in_memory() -> rusqlite::Result<Self> {
        Self::bootstrap(Connection::open_in_memory()?)
    }

    fn bootstrap(conn: Connection) -> rusqlite::Result<Self> {
        conn.busy_timeout(Duration::from_secs(5))?;
        conn.execute_batch("PRAGMA foreign_keys = ON;")?;
        let db = Self { conn: Mutex::new(conn) };
        db.init_schema()?;
        Ok(db)
    }

    fn init_schema(&self) -> rusqlite::Result<()> {
        let conn = self.conn.lock().expect("database lock poisoned");
        conn.execute_batch(
            r#"
            CREATE TABLE IF NOT EXISTS children (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                chat_id INTEGER NOT NULL UNIQUE,
                first_name TEXT NOT NULL,
                last_name TEXT,
                gender TEXT NOT NULL,
                birth_date TEXT NOT NULL,
                gestation_weeks INTEGER NOT NULL,
                gestation_days INTEGER NOT NULL,
                birth_weight_g REAL NOT NULL,
                birth_height_cm INTEGER NOT NULL,
                registered_at TEXT NOT NULL
            );

            CREATE TABLE IF NOT EXISTS feedings (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                chat_id INTEGER NOT NULL,
                child_id INTEGER NOT NULL REFERENCES children(id),
                started_at TEXT NOT NULL,
                ended_at TEXT,
                prepared_ml INTEGER,
                total_eaten_ml INTEGER
            );

            CREATE TABLE IF NOT EXISTS sleep_intervals (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                child_id INTEGER NOT NULL REFERENCES children(id),
                started_at TEXT NOT NULL,
                ended_at TEXT,
                duration_minutes INTEGER
            );

            CREATE TABLE IF NOT EXISTS wake_intervals (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                child_id INTEGER NOT NULL REFERENCES children(id),
                started_at TEXT NOT NULL,
                ended_at TEXT,
                duration_minutes INTEGER
            );

            CREATE TABLE IF NOT EXISTS diaper_events (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                child_id INTEGER NOT NULL REFERENCES children(id),
                logged_at TEXT NOT NULL,
                kind TEXT NOT NULL
            );

            CREATE TABLE IF NOT EXISTS measurements (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                child_id INTEGER NOT NULL REFERENCES children(id),
                weight_g REAL NOT NULL,
                height_cm INTEGER NOT NULL,
                measured_on TEXT NOT NULL,
                age_days INTEGER NOT NULL,
                recorded_at TEXT NOT NULL
            );

            CREATE TABLE IF NOT EXISTS journal_notes (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                child_id INTEGER NOT NULL REFERENCES children(id),
                note TEXT NOT NULL,
                category TEXT,
                created_at TEXT NOT NULL
            );

            CREATE TABLE IF NOT EXISTS reminders (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                chat_id INTEGER NOT NULL,
                child_id INTEGER NOT NULL REFERENCES children(id),
                kind TEXT NOT NULL,
                next_due TEXT NOT NULL,
                frequency_days INTEGER NOT NULL,
                active INTEGER NOT NULL DEFAULT 1,
                last_sent TEXT
            );

            CREATE INDEX IF NOT EXISTS idx_feedings_chat_open ON feedings(chat_id, ended_at);
            CREATE INDEX IF NOT EXISTS idx_feedings_child_start ON feedings(child_id, started_at);
            CREATE INDEX IF NOT EXISTS idx_sleep_child_open ON sleep_intervals(child_id, ended_at);
            CREATE INDEX IF NOT EXISTS idx_wake_child_open ON wake_intervals(child_id, ended_at);
            CREATE INDEX IF NOT EXISTS idx_diapers_child_time ON diaper_events(child_id, logged_at);
            CREATE INDEX IF NOT EXISTS idx_measurements_child ON measurements(child_id, measured_on);
            CREATE INDEX IF NOT EXISTS idx_notes_child_time ON journal_notes(child_id, created_at);
            CREATE INDEX IF NOT EXISTS idx_reminders_due ON reminders(active, next_due);
            "#,
        )
    }

    // ==================== CHILDREN ====================

    /// Register a child and seed the measurement reminder schedule.
    pub fn register_child(
        &self,
        chat_id: i64,
        child: &NewChild,
        now: NaiveDateTime,
    ) -> rusqlite::Result<i64> {
        let mut conn = self.conn.lock().expect("database lock poisoned");
        let tx = conn.transaction()?;

        tx.execute(
            "INSERT INTO children
             (chat_id, first_name, last_name, gender, birth_date, gestation_weeks,
              gestation_days, birth_weight_g, birth_height_cm, registered_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10)",
            params![
                chat_id,
                child.first_name,
                child.last_name,
                child.gender.as_str(),
                fmt_date(child.birth_date),
                child.gestation_weeks,
                child.gestation_days,
                child.birth_weight_g,
                child.birth_height_cm,
                fmt_ts(now),
            ],
        )?;
        let child_id = tx.last_insert_rowid();

        let today = fmt_date(now.date());
        for frequency in REMINDER_FREQUENCIES {
            tx.execute(
                "INSERT INTO reminders (chat_id, child_id, kind, next_due, frequency_days)
                 VALUES (?1, ?2, ?3, ?4, ?5)",
                params![chat_id, child_id, REMINDER_GROWTH, today, frequency],
            )?;
        }

        tx.commit()?;
        info!("Registered child {} for chat {}", child_id, chat_id);
        Ok(child_id)
    }

    /// The chat's registered child, if any.
    pub fn child_by_chat(&self, chat_id: i64) -> rusqlite::Result<Option<Child>> {
        let conn = self.conn.lock().expect("database lock poisoned");
        conn.query_row(
            "SELECT id, chat_id, first_name, last_name, gender, birth_date, gestation_weeks,
                    gestation_days, birth_weight_g, birth_height_cm, registered_at
             FROM children WHERE chat_id = ?1",
            params![chat_id],
            child_from_row,
        )
        .optional()
    }

    // ==================== MEASUREMENTS ====================

    /// Store a growth measurement and push the reminder schedule forward.
    pub fn add_measurement(
        &self,
        child_id: i64,
        weight_g: f64,
        height_cm: i64,
        now: NaiveDateTime,
    ) -> rusqlite::Result<Measurement> {
        let mut conn = self.conn.lock().expect("database lock poisoned");
        let tx = conn.transaction()?;

        let birth_date: NaiveDate = tx.query_row(
            "SELECT birth_date FROM children WHERE id = ?1",
            params![child_id],
            |row| date_from_sql(0, row.get(0)?),
        )?;
        let age_days = (now.date() - birth_date).num_days();

        tx.execute(
            "INSERT INTO measurements (child_id, weight_g, height_cm, measured_on, age_days, recorded_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
            params![
                child_id,
                weight_g,
                height_cm,
                fmt_date(now.date()),
                age_days,
                fmt_ts(now),
            ],
        )?;
        let id = tx.last_insert_rowid();

        // Each reminder advances by its own frequency from the measurement date.
        tx.execute(
            "UPDATE reminders
             SET next_due = date(?1, '+' || frequency_days || ' days')
             WHERE child_id = ?2 AND kind = ?3 AND active = 1",
            params![fmt_date(now.date()), child_id, REMINDER_GROWTH],
        )?;

        tx.commit()?;
        Ok(Measurement {
            id,
            child_id,
            weight_g,
            height_cm,
            measured_on: now.date(),
            age_days,
            recorded_at: now,
        })
    }

    /// Most recent measurement for the child.
    pub fn last_measurement(&self, child_id: i64) -> rusqlite::Result<Option<Measurement>> {
        let conn = self.conn.lock().expect("database lock poisoned");
        conn.query_row(
            "SELECT id, child_id, weight_g, height_cm, measured_on, age_days, recorded_at
             FROM measurements WHERE child_id = ?1
             ORDER BY measured_on DESC, recorded_at DESC LIMIT 1",
            params![child_id],
            measurement_from_row,
        )
        .optional()
    }

    /// Latest measurements, newest first.
    pub fn recent_measurements(
        &self,
        child_id: i64,
        limit: usize,
    ) -> rusqlite::Result<Vec<Measurement>> {
        let conn = self.conn.lock().expect("database lock poisoned");
        let mut stmt = conn.prepare(
            "SELECT id, child_id, weight_g, height_cm, measured_on, age_days, recorded_at
             FROM measurements WHERE child_id = ?1
             ORDER BY measured_on DESC, recorded_at DESC LIMIT ?2",
        )?;
        let rows = stmt.query_map(params![child_id, limit as i64], measurement_from_row)?;
        rows.collect()
    }

    // ==================== FEEDINGS ====================

    /// Open a feeding interval. Exclusivity is checked by the caller.
    pub fn insert_feeding(
        &self,
        chat_id: i64,
        child_id: i64,
        at: NaiveDateTime,
    ) -> rusqlite::Result<i64> {
        let conn = self.conn.lock().expect("database lock poisoned");
        conn.execute(
            "INSERT INTO feedings (chat_id, child_id, started_at) VALUES (?1, ?2, ?3)",
            params![chat_id, child_id, fmt_ts(at)],
        )?;
        Ok(conn.last_insert_rowid())
    }

    /// The chat's open feeding, if any.
    pub fn active_feeding(&self, chat_id: i64) -> rusqlite::Result<Option<Feeding>> {
        let conn = self.conn.lock().expect("database lock poisoned");
        conn.query_row(
            "SELECT id, chat_id, child_id, started_at, ended_at, prepared_ml, total_eaten_ml
             FROM feedings WHERE chat_id = ?1 AND ended_at IS NULL
             ORDER BY started_at DESC LIMIT 1",
            params![chat_id],
            feeding_from_row,
        )
        .optional()
    }

    /// Accumulate eaten milliliters onto an open feeding.
    pub fn add_eaten_ml(&self, feeding_id: i64, eaten_ml: i64) -> rusqlite::Result<()> {
        let conn = self.conn.lock().expect("database lock poisoned");
        conn.execute(
            "UPDATE feedings SET total_eaten_ml = COALESCE(total_eaten_ml, 0) + ?1 WHERE id = ?2",
            params![eaten_ml, feeding_id],
        )?;
        Ok(())
    }

    /// Record how much formula was prepared for the feeding.
    pub fn set_prepared_ml(&self, feeding_id: i64, prepared_ml: i64) -> rusqlite::Result<()> {
        let conn = self.conn.lock().expect("database lock poisoned");
        conn.execute(
            "UPDATE feedings SET prepared_ml = ?1 WHERE id = ?2",
            params![prepared_ml, feeding_id],
        )?;
        Ok(())
    }

    /// Close a feeding interval.
    pub fn finish_feeding(&self, feeding_id: i64, at: NaiveDateTime) -> rusqlite::Result<()> {
        let conn = self.conn.lock().expect("database lock poisoned");
        conn.execute(
            "UPDATE feedings SET ended_at = ?1 WHERE id = ?2",
            params![fmt_ts(at), feeding_id],
        )?;
        Ok(())
    }

    /// Drop a feeding record entirely (the cancel button).
    pub fn delete_feeding(&self, feeding_id: i64) -> rusqlite::Result<()> {
        let conn = self.conn.lock().expect("database lock poisoned");
        conn.execute("DELETE FROM feedings WHERE id = ?1", params![feeding_id])?;
        Ok(())
    }

    /// Remove any open feedings for the chat (stuck-state recovery).
    pub fn delete_active_feedings(&self, chat_id: i64) -> rusqlite::Result<usize> {
        let conn = self.conn.lock().expect("database lock poisoned");
        conn.execute(
            "DELETE FROM feedings WHERE chat_id = ?1 AND ended_at IS NULL",
            params![chat_id],
        )
    }

    /// Count and volume of feedings started on the given day.
    pub fn feeding_day_stats(
        &self,
        child_id: i64,
        day: NaiveDate,
    ) -> rusqlite::Result<FeedingDayStats> {
        let conn = self.conn.lock().expect("database lock poisoned");
        conn.query_row(
            "SELECT COUNT(*), COALESCE(SUM(total_eaten_ml), 0)
             FROM feedings WHERE child_id = ?1 AND DATE(started_at) = ?2",
            params![child_id, fmt_date(day)],
            |row| {
                Ok(FeedingDayStats {
                    count: row.get(0)?,
                    total_ml: row.get(1)?,
                })
            },
        )
    }

    /// Completed feedings of the given day, in start order.
    pub fn feedings_on(
        &self,
        child_id: i64,
        day: NaiveDate,
    ) -> rusqlite::Result<Vec<FeedingRecord>> {
        let conn = self.conn.lock().expect("database lock poisoned");
        let mut stmt = conn.prepare(
            "SELECT started_at, ended_at, COALESCE(total_eaten_ml, 0)
             FROM feedings
             WHERE child_id = ?1 AND DATE(started_at) = ?2 AND ended_at IS NOT NULL
             ORDER BY started_at ASC",
        )?;
        let rows = stmt.query_map(params![child_id, fmt_date(day)], |row| {
            Ok(FeedingRecord {
                started_at: ts_from_sql(0, row.get(0)?)?,
                ended_at: ts_from_sql(1, row.get(1)?)?,
                total_eaten_ml: row.get(2)?,
            })
        })?;
        rows.collect()
    }

    /// Per-day feeding totals for the trailing week, newest first.
    pub fn feeding_week(
        &self,
        child_id: i64,
        today: NaiveDate,
    ) -> rusqlite::Result<Vec<FeedingDayTotal>> {
        let conn = self.conn.lock().expect("database lock poisoned");
        let mut stmt = conn.prepare(
            "SELECT DATE(started_at) AS day, COUNT(*), COALESCE(SUM(total_eaten_ml), 0)
             FROM feedings
             WHERE child_id = ?1 AND DATE(started_at) >= date(?2, '-7 days')
             GROUP BY day ORDER BY day DESC",
        )?;
        let rows = stmt.query_map(params![child_id, fmt_date(today)], |row| {
            Ok(FeedingDayTotal {
                date: date_from_sql(0, row.get(0)?)?,
                count: row.get(1)?,
                total_ml: row.get(2)?,
            })
        })?;
        rows.collect()
    }

    // ==================== SLEEP / WAKE INTERVALS ====================

    pub fn active_sleep(&self, child_id: i64) -> rusqlite::Result<Option<OpenInterval>> {
        self.active_interval(SLEEP_TABLE, child_id)
    }

    pub fn active_wake(&self, child_id: i64) -> rusqlite::Result<Option<OpenInterval>> {
        self.active_interval(WAKE_TABLE, child_id)
    }

    pub fn insert_sleep(&self, child_id: i64, at: NaiveDateTime) -> rusqlite::Result<i64> {
        self.insert_interval(SLEEP_TABLE, child_id, at)
    }

    pub fn insert_wake(&self, child_id: i64, at: NaiveDateTime) -> rusqlite::Result<i64> {
        self.insert_interval(WAKE_TABLE, child_id, at)
    }

    pub fn close_sleep(&self, id: i64, at: NaiveDateTime) -> rusqlite::Result<ClosedInterval> {
        self.close_interval(SLEEP_TABLE, id, at)
    }

    pub fn close_wake(&self, id: i64, at: NaiveDateTime) -> rusqlite::Result<ClosedInterval> {
        self.close_interval(WAKE_TABLE, id, at)
    }

    pub fn sleep_day_stats(
        &self,
        child_id: i64,
        day: NaiveDate,
    ) -> rusqlite::Result<IntervalDayStats> {
        self.interval_day_stats(SLEEP_TABLE, child_id, day)
    }

    pub fn wake_day_stats(
        &self,
        child_id: i64,
        day: NaiveDate,
    ) -> rusqlite::Result<IntervalDayStats> {
        self.interval_day_stats(WAKE_TABLE, child_id, day)
    }

    fn active_interval(
        &self,
        table: &str,
        child_id: i64,
    ) -> rusqlite::Result<Option<OpenInterval>> {
        let conn = self.conn.lock().expect("database lock poisoned");
        conn.query_row(
            &format!(
                "SELECT id, child_id, started_at FROM {table}
                 WHERE child_id = ?1 AND ended_at IS NULL
                 ORDER BY started_at DESC LIMIT 1"
            ),
            params![child_id],
            |row| {
                Ok(OpenInterval {
                    id: row.get(0)?,
                    child_id: row.get(1)?,
                    started_at: ts_from_sql(2, row.get(2)?)?,
                })
            },
        )
        .optional()
    }

    fn insert_interval(
        &self,
        table: &str,
        child_id: i64,
        at: NaiveDateTime,
    ) -> rusqlite::Result<i64> {
        let conn = self.conn.lock().expect("database lock poisoned");
        conn.execute(
            &format!("INSERT INTO {table} (child_id, started_at) VALUES (?1, ?2)"),
            params![child_id, fmt_ts(at)],
        )?;
        Ok(conn.last_insert_rowid())
    }

    fn close_interval(
        &self,
        table: &str,
        id: i64,
        at: NaiveDateTime,
    ) -> rusqlite::Result<ClosedInterval> {
        let conn = self.conn.lock().expect("database lock poisoned");
        let started_at: NaiveDateTime = conn.query_row(
            &format!("SELECT started_at FROM {table} WHERE id = ?1"),
            params![id],
            |row| ts_from_sql(0, row.get(0)?),
        )?;

        let minutes = (at - started_at).num_minutes();
        conn.execute(
            &format!("UPDATE {table} SET ended_at = ?1, duration_minutes = ?2 WHERE id = ?3"),
            params![fmt_ts(at), minutes, id],
        )?;

        Ok(ClosedInterval {
            started_at,
            ended_at: at,
            minutes,
        })
    }

    fn interval_day_stats(
        &self,
        table: &str,
        child_id: i64,
        day: NaiveDate,
    ) -> rusqlite::Result<IntervalDayStats> {
        let conn = self.conn.lock().expect("database lock poisoned");
        conn.query_row(
            &format!(
                "SELECT COUNT(*), COALESCE(SUM(duration_minutes), 0),
                        COALESCE(AVG(duration_minutes), 0)
                 FROM {table}
                 WHERE child_id = ?1 AND DATE(started_at) = ?2 AND ended_at IS NOT NULL"
            ),
            params![child_id, fmt_date(day)],
            |row| {
                Ok(IntervalDayStats {
                    count: row.get(0)?,
                    total_minutes: row.get(1)?,
                    avg_minutes: row.get::<_, f64>(2)?.round() as i64,
                })
            },
        )
    }

    // ==================== DIAPERS ====================

    pub fn add_diaper(
        &self,
        child_id: i64,
        kind: DiaperKind,
        at: NaiveDateTime,
    ) -> rusqlite::Result<()> {
        let conn = self.conn.lock().expect("database lock poisoned");
        conn.execute(
            "INSERT INTO diaper_events (child_id, logged_at, kind) VALUES (?1, ?2, ?3)",
            params![child_id, fmt_ts(at), kind.as_str()],
        )?;
        Ok(())
    }

    /// Per-kind counts for the day, with a sub-count for the last three hours.
    pub fn diaper_day_stats(
        &self,
        child_id: i64,
        day: NaiveDate,
        now: NaiveDateTime,
    ) -> rusqlite::Result<Vec<DiaperDayCount>> {
        let recent_cutoff = fmt_ts(now - chrono::Duration::hours(3));
        let conn = self.conn.lock().expect("database lock poisoned");
        let mut stmt = conn.prepare(
            "SELECT kind, COUNT(*),
                    SUM(CASE WHEN logged_at >= ?3 THEN 1 ELSE 0 END)
             FROM diaper_events
             WHERE child_id = ?1 AND DATE(logged_at) = ?2
             GROUP BY kind",
        )?;
        let rows = stmt.query_map(params![child_id, fmt_date(day), recent_cutoff], |row| {
            Ok(DiaperDayCount {
                kind: DiaperKind::from_str(&row.get::<_, String>(0)?),
                count: row.get(1)?,
                recent: row.get(2)?,
            })
        })?;
        rows.collect()
    }

    // ==================== JOURNAL NOTES ====================

    pub fn add_note(
        &self,
        child_id: i64,
        note: &str,
        category: Option<&str>,
        at: NaiveDateTime,
    ) -> rusqlite::Result<i64> {
        let conn = self.conn.lock().expect("database lock poisoned");
        conn.execute(
            "INSERT INTO journal_notes (child_id, note, category, created_at)
             VALUES (?1, ?2, ?3, ?4)",
            params![child_id, note, category, fmt_ts(at)],
        )?;
        Ok(conn.last_insert_rowid())
    }

    /// Latest notes, newest first.
    pub fn recent_notes(&self, child_id: i64, limit: usize) -> rusqlite::Result<Vec<JournalNote>> {
        let conn = self.conn.lock().expect("database lock poisoned");
        let mut stmt = conn.prepare(
            "SELECT id, child_id, note, category, created_at
             FROM journal_notes WHERE child_id = ?1
             ORDER BY created_at DESC, id DESC LIMIT ?2",
        )?;
        let rows = stmt.query_map(params![child_id, limit as i64], |row| {
            Ok(JournalNote {
                id: row.get(0)?,
                child_id: row.get(1)?,
                note: row.get(2)?,
                category: row.get(3)?,
                created_at: ts_from_sql(4, row.get(4)?)?,
            })
        })?;
        rows.collect()
    }

    // ==================== REMINDERS ====================

    /// Reminders due today that have not been sent today.
    pub fn due_reminders(&self, today: NaiveDate) -> rusqlite::Result<Vec<DueReminder>> {
        let conn = self.conn.lock().expect("database lock poisoned");
        let mut stmt = conn.prepare(
            "SELECT r.id, r.chat_id, r.child_id, c.first_name, c.birth_date
             FROM reminders r JOIN children c ON r.child_id = c.id
             WHERE r.next_due <= ?1 AND r.active = 1
               AND (r.last_sent IS NULL OR r.last_sent < ?1)",
        )?;
        let rows = stmt.query_map(params![fmt_date(today)], |row| {
            Ok(DueReminder {
                id: row.get(0)?,
                chat_id: row.get(1)?,
                child_id: row.get(2)?,
                first_name: row.get(3)?,
                birth_date: date_from_sql(4, row.get(4)?)?,
            })
        })?;
        rows.collect()
    }

    /// Stamp a reminder as delivered today.
    pub fn mark_reminder_sent(&self, reminder_id: i64, today: NaiveDate) -> rusqlite::Result<()> {
        let conn = self.conn.lock().expect("database lock poisoned");
        conn.execute(
            "UPDATE reminders SET last_sent = ?1 WHERE id = ?2",
            params![fmt_date(today), reminder_id],
        )?;
        Ok(())
    }
}

fn child_from_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<Child> {
    Ok(Child {
        id: row.get(0)?,
        chat_id: row.get(1)?,
        first_name: row.get(2)?,
        last_name: row.get(3)?,
        gender: Gender::from_str(&row.get::<_, String>(4)?),
        birth_date: date_from_sql(5, row.get(5)?)?,
        gestation_weeks: row.get(6)?,
        gestation_days: row.get(7)?,
        birth_weight_g: row.get(8)?,
        birth_height_cm: row.get(9)?,
        registered_at: ts_from_sql(10, row.get(10)?)?,
    })
}

fn measurement_from_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<Measurement> {
    Ok(Measurement {
        id: row.get(0)?,
        child_id: row.get(1)?,
        weight_g: row.get(2)?,
        height_cm: row.get(3)?,
        measured_on: date_from_sql(4, row.get(4)?)?,
        age_days: row.get(5)?,
        recorded_at: ts_from_sql(6, row.get(6)?)?,
    })
}

fn feeding_from_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<Feeding> {
    let ended_at = match row.get::<_, Option<String>>(4)? {
        Some(s) => Some(ts_from_sql(4, s)?),
        None => None,
    };
    Ok(Feeding {
        id: row.get(0)?,
        chat_id: row.get(1)?,
        child_id: row.get(2)?,
        started_at: ts_from_sql(3, row.get(3)?)?,
        ended_at,
        prepared_ml: row.get(5)?,
        total_eaten_ml: row.get(6)?,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tracker::model::Gender;

    fn ts(s: &str) -> NaiveDateTime {
        NaiveDateTime::parse_from_str(s, TS_FMT).unwrap()
    }

    fn day(s: &str) -> NaiveDate {
        NaiveDate::parse_from_str(s, DATE_FMT).unwrap()
    }

    fn sample_child() -> NewChild {
        NewChild {
            first_name: "Emma".to_string(),
            last_name: None,
            gender: Gender::Girl,
            birth_date: day("2025-06-01"),
            gestation_weeks: 38,
            gestation_days: 4,
            birth_weight_g: 3100.0,
            birth_height_cm: 50,
        }
    }

    fn registered(db: &Database) -> i64 {
        db.register_child(100, &sample_child(), ts("2025-06-02 09:00:00"))
            .unwrap()
    }

    #[test]
    fn test_register_and_fetch_child() {
        let db = Database::in_memory().unwrap();
        let id = registered(&db);

        let child = db.child_by_chat(100).unwrap().expect("child registered");
        assert_eq!(child.id, id);
        assert_eq!(child.first_name, "Emma");
        assert_eq!(child.gender, Gender::Girl);
        assert_eq!(child.birth_date, day("2025-06-01"));

        assert!(db.child_by_chat(200).unwrap().is_none());
    }

    #[test]
    fn test_registration_seeds_due_reminders() {
        let db = Database::in_memory().unwrap();
        registered(&db);

        let due = db.due_reminders(day("2025-06-02")).unwrap();
        assert_eq!(due.len(), 3);
        assert!(due.iter().all(|r| r.first_name == "Emma"));
    }

    #[test]
    fn test_measurement_advances_reminders() {
        let db = Database::in_memory().unwrap();
        let child_id = registered(&db);

        let m = db
            .add_measurement(child_id, 3400.0, 52, ts("2025-06-10 10:00:00"))
            .unwrap();
        assert_eq!(m.age_days, 9);
        assert_eq!(m.measured_on, day("2025-06-10"));

        // The daily reminder is due again the next day, the others later.
        assert!(db.due_reminders(day("2025-06-10")).unwrap().is_empty());
        assert_eq!(db.due_reminders(day("2025-06-11")).unwrap().len(), 1);
        assert_eq!(db.due_reminders(day("2025-06-17")).unwrap().len(), 2);
        assert_eq!(db.due_reminders(day("2025-07-10")).unwrap().len(), 3);
    }

    #[test]
    fn test_reminder_not_resent_same_day() {
        let db = Database::in_memory().unwrap();
        registered(&db);

        let due = db.due_reminders(day("2025-06-02")).unwrap();
        for r in &due {
            db.mark_reminder_sent(r.id, day("2025-06-02")).unwrap();
        }
        assert!(db.due_reminders(day("2025-06-02")).unwrap().is_empty());
        // Still unsatisfied the next day (no measurement recorded).
        assert_eq!(db.due_reminders(day("2025-06-03")).unwrap().len(), 3);
    }

    #[test]
    fn test_feeding_lifecycle() {
        let db = Database::in_memory().unwrap();
        let child_id = registered(&db);

        assert!(db.active_feeding(100).unwrap().is_none());

        let id = db
            .insert_feeding(100, child_id, ts("2025-06-05 08:00:00"))
            .unwrap();
        let open = db.active_feeding(100).unwrap().expect("open feeding");
        assert_eq!(open.id, id);
        assert_eq!(open.total_eaten_ml, None);

        db.add_eaten_ml(id, 30).unwrap();
        db.add_eaten_ml(id, 50).unwrap();
        let open = db.active_feeding(100).unwrap().unwrap();
        assert_eq!(open.total_eaten_ml, Some(80));

        db.finish_feeding(id, ts("2025-06-05 08:25:00")).unwrap();
        assert!(db.active_feeding(100).unwrap().is_none());

        let stats = db.feeding_day_stats(child_id, day("2025-06-05")).unwrap();
        assert_eq!(stats.count, 1);
        assert_eq!(stats.total_ml, 80);

        let records = db.feedings_on(child_id, day("2025-06-05")).unwrap();
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].total_eaten_ml, 80);
    }

    #[test]
    fn test_prepared_ml_recorded() {
        let db = Database::in_memory().unwrap();
        let child_id = registered(&db);

        let id = db
            .insert_feeding(100, child_id, ts("2025-06-05 08:00:00"))
            .unwrap();
        db.set_prepared_ml(id, 120).unwrap();

        let open = db.active_feeding(100).unwrap().unwrap();
        assert_eq!(open.prepared_ml, Some(120));
    }

    #[test]
    fn test_delete_active_feedings() {
        let db = Database::in_memory().unwrap();
        let child_id = registered(&db);

        db.insert_feeding(100, child_id, ts("2025-06-05 08:00:00"))
            .unwrap();
        assert_eq!(db.delete_active_feedings(100).unwrap(), 1);
        assert_eq!(db.delete_active_feedings(100).unwrap(), 0);
        assert!(db.active_feeding(100).unwrap().is_none());
    }

    #[test]
    fn test_feeding_week_groups_by_day() {
        let db = Database::in_memory().unwrap();
        let child_id = registered(&db);

        for (start, end, ml) in [
            ("2025-06-04 08:00:00", "2025-06-04 08:20:00", 60),
            ("2025-06-04 12:00:00", "2025-06-04 12:30:00", 90),
            ("2025-06-05 09:00:00", "2025-06-05 09:15:00", 70),
        ] {
            let id = db.insert_feeding(100, child_id, ts(start)).unwrap();
            db.add_eaten_ml(id, ml).unwrap();
            db.finish_feeding(id, ts(end)).unwrap();
        }

        let week = db.feeding_week(child_id, day("2025-06-05")).unwrap();
        assert_eq!(week.len(), 2);
        assert_eq!(week[0].date, day("2025-06-05"));
        assert_eq!(week[0].count, 1);
        assert_eq!(week[1].date, day("2025-06-04"));
        assert_eq!(week[1].total_ml, 150);
    }

    #[test]
    fn test_interval_close_computes_duration() {
        let db = Database::in_memory().unwrap();
        let child_id = registered(&db);

        let id = db.insert_sleep(child_id, ts("2025-06-05 13:00:00")).unwrap();
        let open = db.active_sleep(child_id).unwrap().expect("open sleep");
        assert_eq!(open.id, id);

        let closed = db.close_sleep(id, ts("2025-06-05 14:30:00")).unwrap();
        assert_eq!(closed.minutes, 90);
        assert!(db.active_sleep(child_id).unwrap().is_none());

        let stats = db.sleep_day_stats(child_id, day("2025-06-05")).unwrap();
        assert_eq!(stats.count, 1);
        assert_eq!(stats.total_minutes, 90);
        assert_eq!(stats.avg_minutes, 90);
    }

    #[test]
    fn test_interval_stats_skip_open_intervals() {
        let db = Database::in_memory().unwrap();
        let child_id = registered(&db);

        let id = db.insert_wake(child_id, ts("2025-06-05 07:00:00")).unwrap();
        db.close_wake(id, ts("2025-06-05 09:00:00")).unwrap();
        db.insert_wake(child_id, ts("2025-06-05 10:00:00")).unwrap();

        let stats = db.wake_day_stats(child_id, day("2025-06-05")).unwrap();
        assert_eq!(stats.count, 1);
        assert_eq!(stats.total_minutes, 120);
    }

    #[test]
    fn test_diaper_day_stats() {
        let db = Database::in_memory().unwrap();
        let child_id = registered(&db);

        db.add_diaper(child_id, DiaperKind::Wet, ts("2025-06-05 06:00:00"))
            .unwrap();
        db.add_diaper(child_id, DiaperKind::Wet, ts("2025-06-05 11:30:00"))
            .unwrap();
        db.add_diaper(child_id, DiaperKind::Stool, ts("2025-06-05 11:45:00"))
            .unwrap();

        let stats = db
            .diaper_day_stats(child_id, day("2025-06-05"), ts("2025-06-05 12:00:00"))
            .unwrap();
        assert_eq!(stats.len(), 2);

        let wet = stats.iter().find(|s| s.kind == DiaperKind::Wet).unwrap();
        assert_eq!(wet.count, 2);
        assert_eq!(wet.recent, 1);

        let stool = stats.iter().find(|s| s.kind == DiaperKind::Stool).unwrap();
        assert_eq!(stool.count, 1);
        assert_eq!(stool.recent, 1);
    }

    #[test]
    fn test_notes_newest_first() {
        let db = Database::in_memory().unwrap();
        let child_id = registered(&db);

        db.add_note(child_id, "slept well", None, ts("2025-06-05 08:00:00"))
            .unwrap();
        db.add_note(child_id, "temp 36.8", Some("health"), ts("2025-06-05 09:00:00"))
            .unwrap();

        let notes = db.recent_notes(child_id, 5).unwrap();
        assert_eq!(notes.len(), 2);
        assert_eq!(notes[0].note, "temp 36.8");
        assert_eq!(notes[0].category.as_deref(), Some("health"));
        assert_eq!(notes[1].note, "slept well");
    }

    #[test]
    fn test_measurement_history_ordering() {
        let db = Database::in_memory().unwrap();
        let child_id = registered(&db);

        db.add_measurement(child_id, 3200.0, 51, ts("2025-06-05 10:00:00"))
            .unwrap();
        db.add_measurement(child_id, 3350.0, 52, ts("2025-06-12 10:00:00"))
            .unwrap();

        let last = db.last_measurement(child_id).unwrap().unwrap();
        assert_eq!(last.weight_g, 3350.0);

        let all = db.recent_measurements(child_id, 5).unwrap();
        assert_eq!(all.len(), 2);
        assert_eq!(all[0].weight_g, 3350.0);
        assert_eq!(all[1].weight_g, 3200.0);
    }
}

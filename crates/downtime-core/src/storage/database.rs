//! SQLite-based session storage and statistics.
//!
//! Provides persistent storage for:
//! - Completed focus and exercise sessions (the activity log)
//! - Session statistics (daily and all-time)
//! - Key-value store for application state (in-flight timer, ledger balance)

use chrono::{DateTime, Utc};
use rusqlite::{params, Connection};
use serde::{Deserialize, Serialize};

use super::data_dir;
use crate::error::DatabaseError;

/// What kind of session a history row records.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SessionKind {
    /// Phone-down focus countdown.
    Focus,
    /// Rep-counted exercise burst.
    Exercise,
}

impl SessionKind {
    fn as_str(self) -> &'static str {
        match self {
            SessionKind::Focus => "focus",
            SessionKind::Exercise => "exercise",
        }
    }

    fn parse(s: &str) -> Self {
        match s {
            "exercise" => SessionKind::Exercise,
            _ => SessionKind::Focus,
        }
    }
}

/// One completed session in the activity log.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionRecord {
    pub id: i64,
    pub kind: SessionKind,
    pub label: String,
    /// Target duration in ms (focus) or target reps (exercise).
    pub target: u64,
    /// Consumed ms (focus) or counted reps (exercise).
    pub achieved: u64,
    pub minutes_earned: u32,
    pub started_at: DateTime<Utc>,
    pub completed_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct Stats {
    pub total_sessions: u64,
    pub focus_sessions: u64,
    pub exercise_sessions: u64,
    pub total_minutes_earned: u64,
    pub today_sessions: u64,
}

/// SQLite database for session storage.
pub struct Database {
    conn: Connection,
}

impl Database {
    /// Open the database at `~/.config/downtime/downtime.db`.
    ///
    /// Creates the database file and schema if they don't exist.
    ///
    /// # Errors
    /// Returns an error if the database cannot be opened or migrated.
    pub fn open() -> Result<Self, DatabaseError> {
        let path = data_dir()
            .map_err(|e| DatabaseError::QueryFailed(format!("data directory: {e}")))?
            .join("downtime.db");
        let conn = Connection::open(&path)
            .map_err(|source| DatabaseError::OpenFailed { path, source })?;
        let db = Self { conn };
        db.migrate()?;
        Ok(db)
    }

    /// Open an in-memory database (for tests).
    pub fn open_memory() -> Result<Self, DatabaseError> {
        let conn = Connection::open_in_memory().map_err(DatabaseError::from)?;
        let db = Self { conn };
        db.migrate()?;
        Ok(db)
    }

    fn migrate(&self) -> Result<(), DatabaseError> {
        self.conn
            .execute_batch(
                "CREATE TABLE IF NOT EXISTS sessions (
                    id             INTEGER PRIMARY KEY AUTOINCREMENT,
                    kind           TEXT NOT NULL,
                    label          TEXT NOT NULL DEFAULT '',
                    target         INTEGER NOT NULL,
                    achieved       INTEGER NOT NULL,
                    minutes_earned INTEGER NOT NULL DEFAULT 0,
                    started_at     TEXT NOT NULL,
                    completed_at   TEXT NOT NULL
                );

                CREATE TABLE IF NOT EXISTS kv (
                    key   TEXT PRIMARY KEY,
                    value TEXT NOT NULL
                );

                CREATE INDEX IF NOT EXISTS idx_sessions_completed_at ON sessions(completed_at);
                CREATE INDEX IF NOT EXISTS idx_sessions_kind ON sessions(kind);",
            )
            .map_err(DatabaseError::from)
    }

    /// Record a completed session to the activity log.
    ///
    /// # Errors
    /// Returns an error if the insert fails.
    #[allow(clippy::too_many_arguments)]
    pub fn record_session(
        &self,
        kind: SessionKind,
        label: &str,
        target: u64,
        achieved: u64,
        minutes_earned: u32,
        started_at: DateTime<Utc>,
        completed_at: DateTime<Utc>,
    ) -> Result<i64, DatabaseError> {
        self.conn.execute(
            "INSERT INTO sessions (kind, label, target, achieved, minutes_earned, started_at, completed_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
            params![
                kind.as_str(),
                label,
                target,
                achieved,
                minutes_earned,
                started_at.to_rfc3339(),
                completed_at.to_rfc3339(),
            ],
        )?;
        Ok(self.conn.last_insert_rowid())
    }

    /// Most recent sessions, newest first.
    pub fn recent_sessions(&self, limit: u64) -> Result<Vec<SessionRecord>, DatabaseError> {
        let mut stmt = self.conn.prepare(
            "SELECT id, kind, label, target, achieved, minutes_earned, started_at, completed_at
             FROM sessions ORDER BY completed_at DESC LIMIT ?1",
        )?;
        let rows = stmt.query_map(params![limit], |row| {
            let kind: String = row.get(1)?;
            let started: String = row.get(6)?;
            let completed: String = row.get(7)?;
            Ok(SessionRecord {
                id: row.get(0)?,
                kind: SessionKind::parse(&kind),
                label: row.get(2)?,
                target: row.get(3)?,
                achieved: row.get(4)?,
                minutes_earned: row.get(5)?,
                started_at: parse_utc(&started),
                completed_at: parse_utc(&completed),
            })
        })?;
        let mut records = Vec::new();
        for row in rows {
            records.push(row?);
        }
        Ok(records)
    }

    /// Aggregate statistics over the activity log.
    pub fn stats(&self) -> Result<Stats, DatabaseError> {
        let (total_sessions, total_minutes_earned): (u64, u64) = self.conn.query_row(
            "SELECT COUNT(*), COALESCE(SUM(minutes_earned), 0) FROM sessions",
            [],
            |row| Ok((row.get(0)?, row.get(1)?)),
        )?;
        let focus_sessions: u64 = self.conn.query_row(
            "SELECT COUNT(*) FROM sessions WHERE kind = 'focus'",
            [],
            |row| row.get(0),
        )?;
        let exercise_sessions: u64 = self.conn.query_row(
            "SELECT COUNT(*) FROM sessions WHERE kind = 'exercise'",
            [],
            |row| row.get(0),
        )?;
        let today = Utc::now().format("%Y-%m-%d").to_string();
        let today_sessions: u64 = self.conn.query_row(
            "SELECT COUNT(*) FROM sessions WHERE completed_at LIKE ?1 || '%'",
            params![today],
            |row| row.get(0),
        )?;
        Ok(Stats {
            total_sessions,
            focus_sessions,
            exercise_sessions,
            total_minutes_earned,
            today_sessions,
        })
    }

    // ── Key-value store ──────────────────────────────────────────────

    pub fn kv_get(&self, key: &str) -> Result<Option<String>, DatabaseError> {
        let mut stmt = self.conn.prepare("SELECT value FROM kv WHERE key = ?1")?;
        let mut rows = stmt.query(params![key])?;
        match rows.next()? {
            Some(row) => Ok(Some(row.get(0)?)),
            None => Ok(None),
        }
    }

    pub fn kv_set(&self, key: &str, value: &str) -> Result<(), DatabaseError> {
        self.conn.execute(
            "INSERT INTO kv (key, value) VALUES (?1, ?2)
             ON CONFLICT(key) DO UPDATE SET value = excluded.value",
            params![key, value],
        )?;
        Ok(())
    }

    pub fn kv_delete(&self, key: &str) -> Result<(), DatabaseError> {
        self.conn
            .execute("DELETE FROM kv WHERE key = ?1", params![key])?;
        Ok(())
    }

    // ── Reward ledger balance ────────────────────────────────────────

    const LEDGER_KEY: &'static str = "reward_minutes";

    /// Current persisted ledger balance, or `initial` on a fresh install.
    pub fn reward_minutes(&self, initial: u32) -> Result<u32, DatabaseError> {
        match self.kv_get(Self::LEDGER_KEY)? {
            Some(value) => Ok(value.parse().unwrap_or(initial)),
            None => Ok(initial),
        }
    }

    pub fn set_reward_minutes(&self, minutes: u32) -> Result<(), DatabaseError> {
        self.kv_set(Self::LEDGER_KEY, &minutes.to_string())
    }
}

fn parse_utc(s: &str) -> DateTime<Utc> {
    DateTime::parse_from_rfc3339(s)
        .map(|dt| dt.with_timezone(&Utc))
        .unwrap_or_else(|_| Utc::now())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn record_and_list_sessions() {
        let db = Database::open_memory().unwrap();
        let now = Utc::now();
        db.record_session(SessionKind::Focus, "Focus sprint", 60_000, 60_000, 10, now, now)
            .unwrap();
        db.record_session(SessionKind::Exercise, "Squats", 15, 15, 5, now, now)
            .unwrap();

        let sessions = db.recent_sessions(10).unwrap();
        assert_eq!(sessions.len(), 2);
        assert!(sessions.iter().any(|s| s.kind == SessionKind::Exercise));
    }

    #[test]
    fn stats_aggregates() {
        let db = Database::open_memory().unwrap();
        let now = Utc::now();
        db.record_session(SessionKind::Focus, "a", 60_000, 60_000, 10, now, now)
            .unwrap();
        db.record_session(SessionKind::Exercise, "b", 15, 15, 5, now, now)
            .unwrap();

        let stats = db.stats().unwrap();
        assert_eq!(stats.total_sessions, 2);
        assert_eq!(stats.focus_sessions, 1);
        assert_eq!(stats.exercise_sessions, 1);
        assert_eq!(stats.total_minutes_earned, 15);
        assert_eq!(stats.today_sessions, 2);
    }

    #[test]
    fn kv_roundtrip() {
        let db = Database::open_memory().unwrap();
        assert!(db.kv_get("missing").unwrap().is_none());
        db.kv_set("k", "v1").unwrap();
        db.kv_set("k", "v2").unwrap();
        assert_eq!(db.kv_get("k").unwrap().as_deref(), Some("v2"));
        db.kv_delete("k").unwrap();
        assert!(db.kv_get("k").unwrap().is_none());
    }

    #[test]
    fn ledger_balance_defaults_to_initial() {
        let db = Database::open_memory().unwrap();
        assert_eq!(db.reward_minutes(140).unwrap(), 140);
        db.set_reward_minutes(155).unwrap();
        assert_eq!(db.reward_minutes(140).unwrap(), 155);
    }
}

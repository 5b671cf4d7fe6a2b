//! Storage layer for the activity tracker.
//!
//! Provides an append-only table of closed sessions using `rusqlite`.
//!
//! # Thread Safety
//!
//! A `rusqlite::Connection` is `Send` but not `Sync`. [`SessionStore`] keeps
//! its connection behind a `Mutex`, so one store can be shared (via `Arc`)
//! between the mouse and keyboard trackers and the query side. Each append is
//! a single `INSERT` executed while the lock is held.
//!
//! # Schema
//!
//! ## Timestamp Format
//!
//! Timestamps are stored as TEXT in naive local ISO 8601 format with
//! millisecond precision (e.g., `2025-01-15T09:30:00.250`). This ensures:
//! - Lexicographic ordering matches chronological ordering
//! - SQLite's `date()` extracts the calendar date for day/range filters
//! - `duration` is derived from the stored values, so it always matches them
//!
//! Rows written by older versions may carry microseconds or no fraction at
//! all; both parse.

use std::path::Path;
use std::sync::{Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use chrono::{NaiveDate, NaiveDateTime, SubsecRound};
use rusqlite::{Connection, OptionalExtension, params, params_from_iter};
use thiserror::Error;

use nat_core::{
    InputType, MIN_SESSION_DURATION_SECS, Scope, Session, SessionSink, SessionSource, Summary,
    ValidationError, duration_secs,
};

const TIMESTAMP_FORMAT: &str = "%Y-%m-%dT%H:%M:%S%.3f";
const TIMESTAMP_PARSE_FORMAT: &str = "%Y-%m-%dT%H:%M:%S%.f";
const DATE_FORMAT: &str = "%Y-%m-%d";
const BUSY_TIMEOUT: Duration = Duration::from_secs(5);

/// Database errors.
#[derive(Debug, Error)]
pub enum DbError {
    /// An error from the underlying database.
    #[error("sqlite error: {0}")]
    Sqlite(#[from] rusqlite::Error),
    /// Failed to parse a stored timestamp.
    #[error("invalid timestamp for session {session_id}: {timestamp}")]
    TimestampParse {
        session_id: i64,
        timestamp: String,
        #[source]
        source: chrono::ParseError,
    },
    /// A stored session type is not a known input type.
    #[error("invalid type for session {session_id}")]
    InvalidInputType {
        session_id: i64,
        #[source]
        source: ValidationError,
    },
}

/// SQLite-backed session storage.
///
/// See the [module documentation](self) for thread safety considerations.
#[derive(Debug)]
pub struct SessionStore {
    conn: Mutex<Connection>,
}

impl SessionStore {
    /// Opens a database at the given path, creating it if necessary.
    ///
    /// The database schema is automatically initialized on first open.
    pub fn open(path: &Path) -> Result<Self, DbError> {
        let conn = Connection::open(path)?;
        conn.busy_timeout(BUSY_TIMEOUT)?;
        conn.pragma_update_and_check(None, "journal_mode", "WAL", |row| {
            row.get::<_, String>(0)
        })?;
        Self::init(conn)
    }

    /// Opens an in-memory database.
    ///
    /// Useful for testing. The database is destroyed when the store is dropped.
    pub fn open_in_memory() -> Result<Self, DbError> {
        Self::init(Connection::open_in_memory()?)
    }

    /// Initializes the database schema.
    ///
    /// This is idempotent - safe to call on an already-initialized database.
    fn init(conn: Connection) -> Result<Self, DbError> {
        conn.execute_batch(
            "
            -- Sessions table: closed, immutable spans of input activity
            -- type: 'mouse' or 'keyboard'
            -- start_time/end_time: naive local ISO 8601 (e.g., '2025-01-15T09:30:00.250')
            -- duration: end_time - start_time in seconds
            CREATE TABLE IF NOT EXISTS sessions (
                session_id INTEGER PRIMARY KEY AUTOINCREMENT,
                type TEXT NOT NULL DEFAULT 'mouse',
                start_time TEXT NOT NULL,
                end_time TEXT NOT NULL,
                duration REAL NOT NULL
            );
            ",
        )?;
        migrate_type_column(&conn)?;
        conn.execute_batch(
            "
            CREATE INDEX IF NOT EXISTS idx_sessions_start ON sessions(start_time);
            CREATE INDEX IF NOT EXISTS idx_sessions_type ON sessions(type);
            ",
        )?;
        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    /// Inserts a closed session, or drops it if shorter than the minimum.
    ///
    /// Timestamps are truncated to milliseconds before the duration is
    /// computed.
    pub fn insert_session(
        &self,
        input_type: InputType,
        start: NaiveDateTime,
        end: NaiveDateTime,
    ) -> Result<Option<Session>, DbError> {
        let start = start.trunc_subsecs(3);
        let end = end.trunc_subsecs(3);
        let duration = duration_secs(start, end);
        if duration < MIN_SESSION_DURATION_SECS {
            tracing::debug!(%input_type, duration, "dropping session below minimum duration");
            return Ok(None);
        }

        let conn = self.lock();
        conn.execute(
            "INSERT INTO sessions (type, start_time, end_time, duration) VALUES (?, ?, ?, ?)",
            params![
                input_type.as_str(),
                format_timestamp(start),
                format_timestamp(end),
                duration,
            ],
        )?;
        Ok(Some(Session {
            id: conn.last_insert_rowid(),
            input_type,
            start_time: start,
            end_time: end,
            duration,
        }))
    }

    /// Lists sessions starting within `scope`, ordered by start time then ID.
    pub fn list_sessions(
        &self,
        scope: &Scope,
        input_type: Option<InputType>,
    ) -> Result<Vec<Session>, DbError> {
        let (clause, values) = filter_clause(scope, input_type);
        let conn = self.lock();
        let mut stmt = conn.prepare(&format!(
            "
            SELECT session_id, type, start_time, end_time, duration
            FROM sessions
            WHERE {clause}
            ORDER BY start_time ASC, session_id ASC
            "
        ))?;
        let rows = stmt.query_map(params_from_iter(values.iter()), |row| {
            Ok(SessionRow {
                id: row.get(0)?,
                kind: row.get(1)?,
                start_time: row.get(2)?,
                end_time: row.get(3)?,
                duration: row.get(4)?,
            })
        })?;
        let mut sessions = Vec::new();
        for row in rows {
            sessions.push(row?.into_session()?);
        }
        Ok(sessions)
    }

    /// Sums, counts and averages session durations within `scope`.
    pub fn summarize(
        &self,
        scope: &Scope,
        input_type: Option<InputType>,
    ) -> Result<Summary, DbError> {
        let (clause, values) = filter_clause(scope, input_type);
        let conn = self.lock();
        let (total_duration, count, avg_duration) = conn.query_row(
            &format!(
                "
                SELECT COALESCE(SUM(duration), 0), COUNT(*), COALESCE(AVG(duration), 0)
                FROM sessions
                WHERE {clause}
                "
            ),
            params_from_iter(values.iter()),
            |row| Ok((row.get::<_, f64>(0)?, row.get::<_, i64>(1)?, row.get::<_, f64>(2)?)),
        )?;
        Ok(Summary {
            total_duration,
            session_count: u64::try_from(count).unwrap_or_default(),
            avg_duration,
        })
    }

    /// Lists dates that have at least one session, newest first.
    pub fn list_dates(&self) -> Result<Vec<NaiveDate>, DbError> {
        let conn = self.lock();
        let mut stmt = conn.prepare(
            "
            SELECT DISTINCT date(start_time) AS d
            FROM sessions
            WHERE date(start_time) IS NOT NULL
            ORDER BY d DESC
            ",
        )?;
        let rows = stmt.query_map([], |row| row.get::<_, String>(0))?;
        let mut dates = Vec::new();
        for row in rows {
            let value = row?;
            match NaiveDate::parse_from_str(&value, DATE_FORMAT) {
                Ok(date) => dates.push(date),
                Err(err) => tracing::warn!(%value, error = %err, "skipping unparseable date"),
            }
        }
        Ok(dates)
    }

    /// Timestamp of the most recently ended session, if any.
    pub fn last_session_end(&self) -> Result<Option<NaiveDateTime>, DbError> {
        let conn = self.lock();
        let row: Option<(i64, String)> = conn
            .query_row(
                "SELECT session_id, end_time FROM sessions ORDER BY end_time DESC LIMIT 1",
                [],
                |row| Ok((row.get(0)?, row.get(1)?)),
            )
            .optional()?;
        row.map(|(id, end)| parse_timestamp(&end, id)).transpose()
    }

    fn lock(&self) -> MutexGuard<'_, Connection> {
        self.conn.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl SessionSink for SessionStore {
    type Error = DbError;

    fn append(
        &self,
        input_type: InputType,
        start: NaiveDateTime,
        end: NaiveDateTime,
    ) -> Result<Option<Session>, Self::Error> {
        self.insert_session(input_type, start, end)
    }
}

impl SessionSource for SessionStore {
    type Error = DbError;

    fn sessions_for(
        &self,
        scope: &Scope,
        input_type: Option<InputType>,
    ) -> Result<Vec<Session>, Self::Error> {
        self.list_sessions(scope, input_type)
    }

    fn summary_for(
        &self,
        scope: &Scope,
        input_type: Option<InputType>,
    ) -> Result<Summary, Self::Error> {
        self.summarize(scope, input_type)
    }

    fn distinct_dates(&self) -> Result<Vec<NaiveDate>, Self::Error> {
        self.list_dates()
    }
}

#[derive(Debug)]
struct SessionRow {
    id: i64,
    kind: String,
    start_time: String,
    end_time: String,
    duration: f64,
}

impl SessionRow {
    fn into_session(self) -> Result<Session, DbError> {
        let input_type = self
            .kind
            .parse()
            .map_err(|source| DbError::InvalidInputType {
                session_id: self.id,
                source,
            })?;
        Ok(Session {
            id: self.id,
            input_type,
            start_time: parse_timestamp(&self.start_time, self.id)?,
            end_time: parse_timestamp(&self.end_time, self.id)?,
            duration: self.duration,
        })
    }
}

/// Adds the `type` column to databases created before it existed.
fn migrate_type_column(conn: &Connection) -> Result<(), DbError> {
    let mut stmt = conn.prepare("PRAGMA table_info(sessions)")?;
    let has_type = stmt
        .query_map([], |row| row.get::<_, String>(1))?
        .collect::<Result<Vec<_>, _>>()?
        .iter()
        .any(|name| name == "type");
    if !has_type {
        tracing::info!("adding type column to sessions table");
        conn.execute_batch("ALTER TABLE sessions ADD COLUMN type TEXT NOT NULL DEFAULT 'mouse'")?;
    }
    Ok(())
}

/// Builds a `WHERE` clause and its positional parameters.
fn filter_clause(scope: &Scope, input_type: Option<InputType>) -> (String, Vec<String>) {
    let mut clause = match scope {
        Scope::Day(_) => "date(start_time) = ?".to_string(),
        Scope::Range { .. } => "date(start_time) >= ? AND date(start_time) <= ?".to_string(),
    };
    let mut values = match *scope {
        Scope::Day(date) => vec![format_date(date)],
        Scope::Range { start, end } => vec![format_date(start), format_date(end)],
    };
    if let Some(input_type) = input_type {
        clause.push_str(" AND type = ?");
        values.push(input_type.as_str().to_string());
    }
    (clause, values)
}

fn parse_timestamp(timestamp: &str, session_id: i64) -> Result<NaiveDateTime, DbError> {
    NaiveDateTime::parse_from_str(timestamp, TIMESTAMP_PARSE_FORMAT).map_err(|source| {
        DbError::TimestampParse {
            session_id,
            timestamp: timestamp.to_string(),
            source,
        }
    })
}

fn format_timestamp(timestamp: NaiveDateTime) -> String {
    timestamp.format(TIMESTAMP_FORMAT).to_string()
}

fn format_date(date: NaiveDate) -> String {
    date.format(DATE_FORMAT).to_string()
}

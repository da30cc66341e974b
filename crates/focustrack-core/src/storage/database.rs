//! SQLite-backed session history.
//!
//! The database lives at `~/.config/focustrack/focustrack.db` and holds one
//! row per recorded work interval. Schema changes go through
//! [`migrations`](super::migrations).

use std::path::Path;

use chrono::{DateTime, SecondsFormat, Utc};
use rusqlite::{params, Connection, Row};
use tracing::debug;

use crate::error::{CoreError, DatabaseError, Result};
use crate::ports::SessionStore;
use crate::session::{SessionRecord, StoredSession};

use super::{data_dir, migrations};

/// SQLite database for session storage.
pub struct Database {
    conn: Connection,
}

impl Database {
    /// Open the database at `~/.config/focustrack/focustrack.db`.
    ///
    /// Creates the database file and schema if they don't exist.
    ///
    /// # Errors
    /// Returns an error if the database cannot be opened or migrated.
    pub fn open() -> Result<Self> {
        Self::open_at(&data_dir()?.join("focustrack.db"))
    }

    /// Open (or create) the database at `path`.
    ///
    /// # Errors
    /// Returns an error if the database cannot be opened or migrated.
    pub fn open_at(path: &Path) -> Result<Self> {
        let conn = Connection::open(path).map_err(|source| DatabaseError::OpenFailed {
            path: path.to_path_buf(),
            source,
        })?;
        debug!(path = %path.display(), "session database opened");
        Self::with_connection(conn)
    }

    /// Open an in-memory database.
    ///
    /// # Errors
    /// Returns an error if the schema cannot be created.
    pub fn open_memory() -> Result<Self> {
        let conn = Connection::open_in_memory()?;
        Self::with_connection(conn)
    }

    fn with_connection(conn: Connection) -> Result<Self> {
        migrations::migrate(&conn)
            .map_err(|e| DatabaseError::MigrationFailed(e.to_string()))?;
        Ok(Self { conn })
    }

    /// Insert a session record and return its row id.
    ///
    /// # Errors
    /// Returns an error if the insert fails.
    pub fn record_session(&self, record: &SessionRecord) -> Result<i64> {
        self.conn.execute(
            "INSERT INTO sessions (category, duration_min, distraction_count, completed, recorded_at)
             VALUES (?1, ?2, ?3, ?4, ?5)",
            params![
                record.category,
                record.duration_minutes,
                record.distraction_count,
                record.completed,
                encode_timestamp(record.timestamp),
            ],
        )?;
        Ok(self.conn.last_insert_rowid())
    }

    /// All sessions, newest first.
    ///
    /// # Errors
    /// Returns an error if the query fails or a stored timestamp is corrupt.
    pub fn sessions(&self) -> Result<Vec<StoredSession>> {
        let mut stmt = self.conn.prepare(
            "SELECT id, category, duration_min, distraction_count, completed, recorded_at
             FROM sessions
             ORDER BY recorded_at DESC, id DESC",
        )?;
        let rows = stmt.query_map([], read_row)?;

        let mut sessions = Vec::new();
        for row in rows {
            let (id, category, duration_minutes, distraction_count, completed, recorded_at) = row?;
            let timestamp = decode_timestamp(&recorded_at)?;
            sessions.push(StoredSession {
                id,
                record: SessionRecord {
                    category,
                    duration_minutes,
                    distraction_count,
                    timestamp,
                    completed,
                },
            });
        }
        Ok(sessions)
    }

    /// Delete every session. Returns the number of rows removed.
    ///
    /// # Errors
    /// Returns an error if the delete fails.
    pub fn clear_sessions(&self) -> Result<usize> {
        let removed = self.conn.execute("DELETE FROM sessions", [])?;
        debug!(removed, "session history cleared");
        Ok(removed)
    }
}

type RawRow = (i64, String, u32, u32, bool, String);

fn read_row(row: &Row<'_>) -> rusqlite::Result<RawRow> {
    Ok((
        row.get(0)?,
        row.get(1)?,
        row.get(2)?,
        row.get(3)?,
        row.get(4)?,
        row.get(5)?,
    ))
}

// Fixed-width UTC text keeps lexical order equal to chronological order.
fn encode_timestamp(at: DateTime<Utc>) -> String {
    at.to_rfc3339_opts(SecondsFormat::Millis, true)
}

fn decode_timestamp(raw: &str) -> Result<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(raw)
        .map(|t| t.with_timezone(&Utc))
        .map_err(|e| CoreError::from(DatabaseError::QueryFailed(format!("bad timestamp '{raw}': {e}"))))
}

impl SessionStore for Database {
    fn append(&mut self, record: &SessionRecord) -> Result<i64> {
        self.record_session(record)
    }

    fn list_all(&self) -> Result<Vec<StoredSession>> {
        self.sessions()
    }

    fn delete_all(&mut self) -> Result<usize> {
        self.clear_sessions()
    }
}

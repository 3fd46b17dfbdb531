//! Append-only message log.
//!
//! A single connection behind a mutex serializes appends, so id assignment
//! and `created_at` stamping happen atomically with the insert.

use chrono::{DateTime, Utc};
use pollfeed_core::policy::{self, HARD_CAP};
use pollfeed_core::{FeedError, LogStats, Message};
use rusqlite::{params, Connection, OptionalExtension, Row};
use std::path::Path;
use std::sync::{Mutex, MutexGuard};

use super::{connection, queries};

pub struct MessageLog {
    conn: Mutex<Connection>,
}

impl MessageLog {
    /// Open the log stored at `path`.
    pub fn open(path: &Path) -> anyhow::Result<Self> {
        Ok(Self::from_connection(connection::open_db(path)?))
    }

    pub fn open_in_memory() -> anyhow::Result<Self> {
        Ok(Self::from_connection(connection::open_in_memory()?))
    }

    /// Wrap an existing connection. The schema must already be applied.
    pub fn from_connection(conn: Connection) -> Self {
        Self {
            conn: Mutex::new(conn),
        }
    }

    fn lock(&self) -> Result<MutexGuard<'_, Connection>, FeedError> {
        self.conn
            .lock()
            .map_err(|_| FeedError::Persistence("Message log lock poisoned".to_string()))
    }

    /// Append a message and return its id.
    ///
    /// Validation happens before the store is touched. On error nothing is
    /// written and no id is consumed.
    pub fn append(&self, author: Option<&str>, body: &str) -> Result<u64, FeedError> {
        let body = policy::validate_body(body)?;
        let author = policy::normalize_author(author);

        let mut conn = self.lock()?;
        let insert_failed = |e: rusqlite::Error| FeedError::persistence("Insert", e);

        let tx = conn.transaction().map_err(insert_failed)?;
        let previous: Option<i64> = tx
            .query_row(queries::LAST_CREATED_AT, [], |row| row.get(0))
            .optional()
            .map_err(insert_failed)?;
        let now = Utc::now().timestamp_millis();
        let created_at = previous.map_or(now, |prev| prev.max(now));

        tx.execute(queries::INSERT_MESSAGE, params![author, body, created_at])
            .map_err(insert_failed)?;
        let id = tx.last_insert_rowid();
        tx.commit().map_err(insert_failed)?;

        tracing::debug!(id, author = %author, "appended message");
        Ok(id as u64)
    }

    /// Messages with `id > cursor`, ascending, at most `min(limit, HARD_CAP)`.
    pub fn fetch_since(&self, cursor: u64, limit: u32) -> Result<Vec<Message>, FeedError> {
        let limit = limit.min(HARD_CAP);
        if limit == 0 {
            return Ok(Vec::new());
        }
        let cursor = i64::try_from(cursor).unwrap_or(i64::MAX);

        let conn = self.lock()?;
        let fetch_failed = |e: rusqlite::Error| FeedError::persistence("Fetch", e);
        let mut stmt = conn.prepare_cached(queries::MESSAGES_SINCE).map_err(fetch_failed)?;
        let rows = stmt
            .query_map(params![cursor, limit], row_to_message)
            .map_err(fetch_failed)?;
        rows.collect::<Result<Vec<_>, _>>().map_err(fetch_failed)
    }

    /// The newest `count` messages (clamped to `[1, HARD_CAP]`), ascending.
    pub fn fetch_recent(&self, count: u32) -> Result<Vec<Message>, FeedError> {
        let count = count.clamp(1, HARD_CAP);

        let conn = self.lock()?;
        let fetch_failed = |e: rusqlite::Error| FeedError::persistence("Recent fetch", e);
        let mut stmt = conn.prepare_cached(queries::MESSAGES_RECENT).map_err(fetch_failed)?;
        let rows = stmt
            .query_map(params![count], row_to_message)
            .map_err(fetch_failed)?;
        let mut messages = rows.collect::<Result<Vec<_>, _>>().map_err(fetch_failed)?;
        messages.reverse();
        Ok(messages)
    }

    pub fn stats(&self) -> Result<LogStats, FeedError> {
        let conn = self.lock()?;
        let (total, max_id): (i64, i64) = conn
            .query_row(queries::STATS, [], |row| Ok((row.get(0)?, row.get(1)?)))
            .map_err(|e| FeedError::persistence("Stats", e))?;
        Ok(LogStats {
            total: u64::try_from(total).unwrap_or(0),
            max_id: u64::try_from(max_id).unwrap_or(0),
        })
    }
}

fn row_to_message(row: &Row<'_>) -> rusqlite::Result<Message> {
    let id: i64 = row.get(0)?;
    let created_ms: i64 = row.get(3)?;
    let created_at = DateTime::<Utc>::from_timestamp_millis(created_ms)
        .ok_or(rusqlite::Error::IntegralValueOutOfRange(3, created_ms))?;
    Ok(Message {
        id: u64::try_from(id).map_err(|_| rusqlite::Error::IntegralValueOutOfRange(0, id))?,
        author: row.get(1)?,
        body: row.get(2)?,
        created_at,
    })
}

//! SQLite connection management for the feed database.

use anyhow::{Context, Result};
use rusqlite::Connection;
use std::path::{Path, PathBuf};
use std::time::Duration;

use super::queries;

/// Default feed database path.
pub fn default_db_path() -> PathBuf {
    dirs::home_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join(".pollfeed")
        .join("feed.db")
}

/// Open (creating if needed) the feed database at `path`.
pub fn open_db(path: &Path) -> Result<Connection> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("Failed to create database directory {:?}", parent))?;
    }

    let conn = Connection::open(path)
        .with_context(|| format!("Failed to open feed database at {:?}", path))?;
    prepare(conn)
}

/// Open a private in-memory database (tests, ephemeral servers).
pub fn open_in_memory() -> Result<Connection> {
    let conn = Connection::open_in_memory().context("Failed to open in-memory database")?;
    prepare(conn)
}

fn prepare(conn: Connection) -> Result<Connection> {
    conn.busy_timeout(Duration::from_secs(5))
        .context("Failed to set busy timeout")?;
    conn.execute_batch(queries::SCHEMA)
        .context("Failed to apply messages schema")?;
    Ok(conn)
}

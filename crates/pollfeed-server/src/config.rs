//! Server configuration: CLI flag, then environment, then default.

use anyhow::{Context, Result};
use std::net::SocketAddr;
use std::path::PathBuf;

use crate::db::connection::default_db_path;

pub const DEFAULT_BIND: &str = "127.0.0.1:8080";

/// Environment variable overriding the listen address.
pub const BIND_ENV: &str = "POLLFEED_BIND";

/// Environment variable overriding the database path.
pub const DB_ENV: &str = "POLLFEED_DB";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServerConfig {
    pub bind: SocketAddr,
    pub db_path: PathBuf,
}

impl ServerConfig {
    /// Resolve the configuration from optional CLI values and the environment.
    pub fn resolve(bind: Option<String>, db: Option<String>) -> Result<Self> {
        let bind = bind
            .or_else(|| std::env::var(BIND_ENV).ok())
            .unwrap_or_else(|| DEFAULT_BIND.to_string());
        let bind: SocketAddr = bind
            .parse()
            .with_context(|| format!("Invalid listen address '{}'", bind))?;

        Ok(Self {
            bind,
            db_path: resolve_db_path(db),
        })
    }
}

/// Database path from an optional CLI value, then `POLLFEED_DB`, then the
/// default location. A leading `~` is expanded.
pub fn resolve_db_path(db: Option<String>) -> PathBuf {
    db.or_else(|| std::env::var(DB_ENV).ok())
        .map(|raw| PathBuf::from(shellexpand::tilde(&raw).to_string()))
        .unwrap_or_else(default_db_path)
}

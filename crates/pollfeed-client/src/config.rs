//! Client configuration.

use std::time::Duration;

use crate::sync::FocusState;

pub const DEFAULT_URL: &str = "http://127.0.0.1:8080";

/// Environment variable overriding the server base URL.
pub const URL_ENV: &str = "POLLFEED_URL";

/// Tuning for one sync session.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SyncConfig {
    /// Poll period while in the foreground.
    pub active_interval: Duration,
    /// Poll period while in the background.
    pub background_interval: Duration,
    /// `limit` for incremental polls and window size for a forced resync.
    pub fetch_limit: u32,
    /// Maximum number of messages kept in the local view.
    pub capacity: usize,
    /// Refresh log stats after each successful scheduled poll.
    pub track_stats: bool,
}

impl Default for SyncConfig {
    fn default() -> Self {
        Self {
            active_interval: Duration::from_millis(1500),
            background_interval: Duration::from_millis(5000),
            fetch_limit: 200,
            capacity: 1200,
            track_stats: true,
        }
    }
}

impl SyncConfig {
    pub fn interval_for(&self, focus: FocusState) -> Duration {
        match focus {
            FocusState::Foreground => self.active_interval,
            FocusState::Background => self.background_interval,
        }
    }
}

/// Server base URL from an optional CLI value, then `POLLFEED_URL`, then
/// the default.
pub fn resolve_base_url(url: Option<String>) -> String {
    url.or_else(|| std::env::var(URL_ENV).ok())
        .unwrap_or_else(|| DEFAULT_URL.to_string())
}

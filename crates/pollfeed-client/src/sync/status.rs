//! Observable session states.

use std::fmt;

/// Outcome of the most recent poll or send, as observed by the session.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConnectionStatus {
    /// No response received yet.
    Connecting,
    Connected,
    /// The last request never completed.
    Offline,
    /// The last response was `{ok: false}` or unreadable.
    ServerError,
}

impl fmt::Display for ConnectionStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            ConnectionStatus::Connecting => "connecting",
            ConnectionStatus::Connected => "connected",
            ConnectionStatus::Offline => "offline",
            ConnectionStatus::ServerError => "server error",
        })
    }
}

/// Whether the participant is actively looking at the feed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum FocusState {
    #[default]
    Foreground,
    Background,
}

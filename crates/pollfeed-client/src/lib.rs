//! Polling sync client for pollfeed.
//!
//! [`sync::SyncSession`] keeps one participant's bounded local view
//! converged with the shared log over any [`api::FeedApi`] transport;
//! [`sync::PollScheduler`] drives it on an adaptive timer.

pub mod api;
pub mod config;
pub mod http;
pub mod output;
pub mod sync;

// Re-export commonly used types
pub use api::{ClientError, FeedApi};
pub use config::SyncConfig;
pub use http::HttpFeedClient;
pub use sync::{ConnectionStatus, FocusState, LocalView, PollReport, PollScheduler, SyncSession};

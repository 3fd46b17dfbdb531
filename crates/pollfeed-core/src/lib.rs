//! Shared core library for pollfeed servers and clients.
//!
//! This crate provides the message model, the `{ok: ...}` JSON protocol
//! spoken over the single `action` endpoint, and the input policy (length
//! limits, result caps) that both sides agree on.

pub mod error;
pub mod model;
pub mod policy;
pub mod protocol;

// Re-export commonly used types
pub use error::{ErrorKind, FeedError};
pub use model::{LogStats, Message};
pub use protocol::{Action, Envelope, MessageBatch, SendAck, SendRequest};

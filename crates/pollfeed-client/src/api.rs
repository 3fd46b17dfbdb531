//! Transport seam between the sync client and the query service.

use async_trait::async_trait;
use pollfeed_core::{LogStats, Message};
use std::sync::Arc;
use thiserror::Error;

/// Errors that can occur when talking to the query service.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ClientError {
    /// The request never reached the service or no response came back.
    #[error("Network error: {0}")]
    Network(String),

    /// Well-formed `{ok: false}` response.
    #[error("{0}")]
    Server(String),

    /// A response arrived but was not a valid envelope.
    #[error("Invalid response: {0}")]
    Decode(String),
}

impl From<reqwest::Error> for ClientError {
    fn from(e: reqwest::Error) -> Self {
        if e.is_decode() {
            ClientError::Decode(e.to_string())
        } else {
            ClientError::Network(e.to_string())
        }
    }
}

/// The four operations of the query service.
#[async_trait]
pub trait FeedApi: Send + Sync {
    /// Append a message; returns the id the log assigned.
    async fn send(&self, author: Option<&str>, body: &str) -> Result<u64, ClientError>;

    /// Messages with `id > cursor`, ascending.
    async fn fetch_since(&self, cursor: u64, limit: u32) -> Result<Vec<Message>, ClientError>;

    /// The newest `count` messages, ascending.
    async fn fetch_recent(&self, count: u32) -> Result<Vec<Message>, ClientError>;

    async fn stats(&self) -> Result<LogStats, ClientError>;
}

#[async_trait]
impl<T: FeedApi + ?Sized> FeedApi for Arc<T> {
    async fn send(&self, author: Option<&str>, body: &str) -> Result<u64, ClientError> {
        (**self).send(author, body).await
    }

    async fn fetch_since(&self, cursor: u64, limit: u32) -> Result<Vec<Message>, ClientError> {
        (**self).fetch_since(cursor, limit).await
    }

    async fn fetch_recent(&self, count: u32) -> Result<Vec<Message>, ClientError> {
        (**self).fetch_recent(count).await
    }

    async fn stats(&self) -> Result<LogStats, ClientError> {
        (**self).stats().await
    }
}

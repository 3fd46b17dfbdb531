//! Typed errors shared by the log, the query service and its callers.

use thiserror::Error;

/// Errors produced while validating or executing a feed operation.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum FeedError {
    /// Unknown action, or a known action called with the wrong method.
    #[error("Invalid action or method.")]
    InvalidRequest,

    /// Rejected before touching the log.
    #[error("{0}")]
    Validation(String),

    /// The store failed; nothing was applied.
    #[error("{0}")]
    Persistence(String),
}

/// Coarse classification of a [`FeedError`], used for logging.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    InvalidRequest,
    Validation,
    Persistence,
}

impl FeedError {
    pub fn validation(message: impl Into<String>) -> Self {
        Self::Validation(message.into())
    }

    /// Build a persistence error whose message names the failing operation.
    pub fn persistence(operation: &str, cause: impl std::fmt::Display) -> Self {
        Self::Persistence(format!("{} failed: {}", operation, cause))
    }

    pub fn kind(&self) -> ErrorKind {
        match self {
            FeedError::InvalidRequest => ErrorKind::InvalidRequest,
            FeedError::Validation(_) => ErrorKind::Validation,
            FeedError::Persistence(_) => ErrorKind::Persistence,
        }
    }
}

impl ErrorKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ErrorKind::InvalidRequest => "invalid_request",
            ErrorKind::Validation => "validation",
            ErrorKind::Persistence => "persistence",
        }
    }
}

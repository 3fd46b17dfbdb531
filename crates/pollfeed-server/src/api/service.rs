//! Query service - translates requests into log operations.
//!
//! Stateless per request: the only shared state is the log itself. Result
//! bounds are enforced here regardless of what the client asked for.

use pollfeed_core::policy::{clamp_count, clamp_limit};
use pollfeed_core::protocol::{failure, success};
use pollfeed_core::{FeedError, MessageBatch, SendAck};
use serde_json::Value;
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Instant;

use crate::api::request::ApiRequest;
use crate::db::MessageLog;

#[derive(Clone)]
pub struct QueryService {
    log: Arc<MessageLog>,
}

impl QueryService {
    pub fn new(log: Arc<MessageLog>) -> Self {
        Self { log }
    }

    pub fn log(&self) -> &MessageLog {
        &self.log
    }

    /// Dispatch a parsed request. Returns the full `{ok: true, ...}` payload.
    pub fn dispatch(&self, request: ApiRequest) -> Result<Value, FeedError> {
        match request {
            ApiRequest::Send(req) => {
                let id = self.log.append(req.author.as_deref(), &req.body)?;
                Ok(success(&SendAck { id }))
            }
            ApiRequest::FetchSince { cursor, limit } => {
                let messages = self.log.fetch_since(cursor, clamp_limit(limit))?;
                Ok(success(&MessageBatch { messages }))
            }
            ApiRequest::FetchRecent { count } => {
                let messages = self.log.fetch_recent(clamp_count(count))?;
                Ok(success(&MessageBatch { messages }))
            }
            ApiRequest::Stats => Ok(success(&self.log.stats()?)),
        }
    }

    /// Parse and dispatch one raw request. Never fails: every error becomes
    /// an `{ok: false, error}` payload.
    pub fn handle(&self, method: &str, params: &HashMap<String, String>, body: &[u8]) -> Value {
        let start = Instant::now();
        let action = params.get("action").cloned().unwrap_or_default();

        let result = ApiRequest::parse(method, params, body).and_then(|req| self.dispatch(req));
        let server_ms = start.elapsed().as_secs_f64() * 1000.0;

        match result {
            Ok(payload) => {
                tracing::debug!(%method, %action, server_ms, "request served");
                payload
            }
            Err(e) => {
                tracing::warn!(
                    %method,
                    %action,
                    kind = e.kind().as_str(),
                    error = %e,
                    server_ms,
                    "request failed"
                );
                failure(&e.to_string())
            }
        }
    }

    /// Store reachability check.
    pub fn health(&self) -> Value {
        match self.log.stats() {
            Ok(_) => serde_json::json!({ "ok": true }),
            Err(e) => failure(&e.to_string()),
        }
    }
}

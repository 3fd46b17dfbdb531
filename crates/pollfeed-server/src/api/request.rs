//! Typed requests parsed from the raw `action` endpoint inputs.

use pollfeed_core::policy::{parse_u32_param, parse_u64_param};
use pollfeed_core::{Action, FeedError, SendRequest};
use std::collections::HashMap;

/// A validated-in-shape request. Bounds are applied later by the service.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ApiRequest {
    Send(SendRequest),
    FetchSince { cursor: u64, limit: Option<u32> },
    FetchRecent { count: Option<u32> },
    Stats,
}

impl ApiRequest {
    /// Build a request from the HTTP method, query parameters and body.
    ///
    /// An unknown action or a method mismatch is [`FeedError::InvalidRequest`];
    /// malformed parameters are validation errors.
    pub fn parse(
        method: &str,
        params: &HashMap<String, String>,
        body: &[u8],
    ) -> Result<Self, FeedError> {
        let action = params
            .get("action")
            .and_then(|name| Action::parse(name))
            .ok_or(FeedError::InvalidRequest)?;

        if !method.eq_ignore_ascii_case(action.method()) {
            return Err(FeedError::InvalidRequest);
        }

        let param = |name: &str| params.get(name).map(String::as_str);

        match action {
            Action::Send => Ok(ApiRequest::Send(parse_send_body(body)?)),
            Action::FetchSince => Ok(ApiRequest::FetchSince {
                cursor: parse_u64_param("cursor", param("cursor"))?.unwrap_or(0),
                limit: parse_u32_param("limit", param("limit"))?,
            }),
            Action::FetchRecent => Ok(ApiRequest::FetchRecent {
                count: parse_u32_param("count", param("count"))?,
            }),
            Action::Stats => Ok(ApiRequest::Stats),
        }
    }

    pub fn action(&self) -> Action {
        match self {
            ApiRequest::Send(_) => Action::Send,
            ApiRequest::FetchSince { .. } => Action::FetchSince,
            ApiRequest::FetchRecent { .. } => Action::FetchRecent,
            ApiRequest::Stats => Action::Stats,
        }
    }
}

fn parse_send_body(body: &[u8]) -> Result<SendRequest, FeedError> {
    // No body at all is treated as an empty message so the caller gets the
    // usual "cannot be empty" rejection.
    if body.iter().all(u8::is_ascii_whitespace) {
        return Ok(SendRequest {
            author: None,
            body: String::new(),
        });
    }
    serde_json::from_slice(body).map_err(|_| {
        FeedError::validation("Request body must be a JSON object with a string `body` field.")
    })
}

//! Wire protocol for the single `action` endpoint.
//!
//! Every response is a JSON object with an `ok` flag:
//! ```json
//! {"ok": true, "messages": [...]}
//! {"ok": false, "error": "Message cannot be empty."}
//! ```

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::model::Message;

/// Operations exposed by the query service, selected by `?action=`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Action {
    Send,
    FetchSince,
    FetchRecent,
    Stats,
}

impl Action {
    pub const ALL: [Action; 4] = [
        Action::Send,
        Action::FetchSince,
        Action::FetchRecent,
        Action::Stats,
    ];

    pub fn parse(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|a| a.as_str() == name)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Action::Send => "send",
            Action::FetchSince => "fetchSince",
            Action::FetchRecent => "fetchRecent",
            Action::Stats => "stats",
        }
    }

    /// HTTP method the action must be called with.
    pub fn method(&self) -> &'static str {
        match self {
            Action::Send => "POST",
            _ => "GET",
        }
    }
}

/// JSON body of a `send` request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SendRequest {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub author: Option<String>,
    #[serde(default)]
    pub body: String,
}

/// Payload of a successful `send`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SendAck {
    pub id: u64,
}

/// Payload of a successful `fetchSince` / `fetchRecent`, ascending by id.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MessageBatch {
    pub messages: Vec<Message>,
}

#[derive(Serialize)]
struct Success<'a, T> {
    ok: bool,
    #[serde(flatten)]
    data: &'a T,
}

/// Wrap a payload as `{ok: true, ...payload}`.
pub fn success<T: Serialize>(data: &T) -> Value {
    serde_json::to_value(Success { ok: true, data })
        .unwrap_or_else(|e| failure(&format!("Serialization failed: {}", e)))
}

/// Build `{ok: false, error}`.
pub fn failure(error: &str) -> Value {
    serde_json::json!({ "ok": false, "error": error })
}

/// A decoded response: the payload, or the server's error string.
#[derive(Debug, Clone, PartialEq)]
pub enum Envelope<T> {
    Ok(T),
    Err(String),
}

impl<T: DeserializeOwned> Envelope<T> {
    /// Decode a response object. Fails only when the JSON is not an envelope
    /// at all (no boolean `ok`) or a success payload has the wrong shape.
    pub fn from_value(value: Value) -> Result<Self, serde_json::Error> {
        match value.get("ok").and_then(Value::as_bool) {
            Some(true) => T::deserialize(value).map(Envelope::Ok),
            Some(false) => Ok(Envelope::Err(
                value
                    .get("error")
                    .and_then(Value::as_str)
                    .unwrap_or("unknown error")
                    .to_string(),
            )),
            None => Err(serde::de::Error::custom("response has no boolean `ok` field")),
        }
    }

    pub fn into_result(self) -> Result<T, String> {
        match self {
            Envelope::Ok(data) => Ok(data),
            Envelope::Err(error) => Err(error),
        }
    }
}

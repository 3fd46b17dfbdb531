//! Message model shared by the log and every client.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// An immutable entry of the shared log.
///
/// `id` is assigned by the log on append and is strictly increasing;
/// `created_at` never decreases along id order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Message {
    pub id: u64,
    pub author: String,
    pub body: String,
    pub created_at: DateTime<Utc>,
}

/// Aggregate counters for the log. `max_id` is 0 when the log is empty.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LogStats {
    pub total: u64,
    pub max_id: u64,
}

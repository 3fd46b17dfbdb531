//! In-memory feed used by the sync tests.

use async_trait::async_trait;
use chrono::{TimeZone, Utc};
use pollfeed_core::policy::{self, HARD_CAP};
use pollfeed_core::{LogStats, Message};
use std::collections::VecDeque;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;

use crate::api::{ClientError, FeedApi};

pub(crate) fn message(id: u64) -> Message {
    Message {
        id,
        author: "tester".to_string(),
        body: format!("message {}", id),
        created_at: Utc.timestamp_opt(1_700_000_000 + id as i64, 0).unwrap(),
    }
}

/// A log held in memory, with scripted failures and call counters.
#[derive(Default)]
pub(crate) struct MemoryFeed {
    messages: Mutex<Vec<Message>>,
    failures: Mutex<VecDeque<ClientError>>,
    pub since_calls: AtomicUsize,
    pub recent_calls: AtomicUsize,
    pub send_calls: AtomicUsize,
    pub stats_calls: AtomicUsize,
}

impl MemoryFeed {
    pub fn append(&self, author: &str, body: &str) -> u64 {
        let mut messages = self.messages.lock().unwrap();
        let id = messages.len() as u64 + 1;
        let mut msg = message(id);
        msg.author = author.to_string();
        msg.body = body.to_string();
        messages.push(msg);
        id
    }

    /// Make the next call (of any kind) fail with `err`.
    pub fn fail_next(&self, err: ClientError) {
        self.failures.lock().unwrap().push_back(err);
    }

    fn scripted_failure(&self) -> Result<(), ClientError> {
        match self.failures.lock().unwrap().pop_front() {
            Some(err) => Err(err),
            None => Ok(()),
        }
    }

    pub fn total(&self) -> usize {
        self.messages.lock().unwrap().len()
    }
}

#[async_trait]
impl FeedApi for MemoryFeed {
    async fn send(&self, author: Option<&str>, body: &str) -> Result<u64, ClientError> {
        self.send_calls.fetch_add(1, Ordering::SeqCst);
        self.scripted_failure()?;
        let body = policy::validate_body(body).map_err(|e| ClientError::Server(e.to_string()))?;
        Ok(self.append(&policy::normalize_author(author), &body))
    }

    async fn fetch_since(&self, cursor: u64, limit: u32) -> Result<Vec<Message>, ClientError> {
        self.since_calls.fetch_add(1, Ordering::SeqCst);
        self.scripted_failure()?;
        let limit = limit.min(HARD_CAP) as usize;
        Ok(self
            .messages
            .lock()
            .unwrap()
            .iter()
            .filter(|m| m.id > cursor)
            .take(limit)
            .cloned()
            .collect())
    }

    async fn fetch_recent(&self, count: u32) -> Result<Vec<Message>, ClientError> {
        self.recent_calls.fetch_add(1, Ordering::SeqCst);
        self.scripted_failure()?;
        let count = count.clamp(1, HARD_CAP) as usize;
        let messages = self.messages.lock().unwrap();
        let start = messages.len().saturating_sub(count);
        Ok(messages[start..].to_vec())
    }

    async fn stats(&self) -> Result<LogStats, ClientError> {
        self.stats_calls.fetch_add(1, Ordering::SeqCst);
        self.scripted_failure()?;
        let total = self.total() as u64;
        Ok(LogStats { total, max_id: total })
    }
}

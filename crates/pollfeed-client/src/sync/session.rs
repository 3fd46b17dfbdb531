//! One participant's sync session.
//!
//! The session owns the cursor, the local view and the connection status.
//! Only a successful response ever mutates the view; a failed poll or send
//! changes nothing but the status (and, for sends, the preserved draft).

use chrono::{DateTime, Utc};
use pollfeed_core::{LogStats, Message};
use std::sync::Arc;
use uuid::Uuid;

use crate::api::{ClientError, FeedApi};
use crate::config::SyncConfig;
use crate::sync::status::ConnectionStatus;
use crate::sync::view::{LocalView, MergeOutcome};

/// A session shared between a scheduler and user-triggered sends.
pub type SharedSession<A> = Arc<tokio::sync::Mutex<SyncSession<A>>>;

/// Input of a send that did not go through, kept for retry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Draft {
    pub author: String,
    pub body: String,
}

/// Result of one successful poll.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PollReport {
    /// The view was rebuilt from the most recent window.
    pub resync: bool,
    /// Messages that entered the view, ascending by id.
    pub added: Vec<Message>,
    pub duplicates: usize,
    pub evicted: Vec<u64>,
    /// Cursor after the merge.
    pub cursor: u64,
}

impl PollReport {
    fn new(resync: bool, outcome: MergeOutcome, cursor: u64) -> Self {
        Self {
            resync,
            added: outcome.added,
            duplicates: outcome.duplicates,
            evicted: outcome.evicted,
            cursor,
        }
    }

    /// Nothing a presenter would need to react to.
    pub fn is_empty(&self) -> bool {
        !self.resync && self.added.is_empty() && self.evicted.is_empty()
    }
}

/// Result of a confirmed send. The message reaches the view only through
/// the forced resync that follows, never by local insertion.
#[derive(Debug)]
pub struct SendReport {
    pub id: u64,
    pub resync: Result<PollReport, ClientError>,
}

pub struct SyncSession<A> {
    id: Uuid,
    api: A,
    config: SyncConfig,
    view: LocalView,
    status: ConnectionStatus,
    draft: Option<Draft>,
    last_stats: Option<LogStats>,
    last_sync: Option<DateTime<Utc>>,
}

impl<A: FeedApi> SyncSession<A> {
    pub fn new(api: A, config: SyncConfig) -> Self {
        let view = LocalView::new(config.capacity);
        Self {
            id: Uuid::new_v4(),
            api,
            config,
            view,
            status: ConnectionStatus::Connecting,
            draft: None,
            last_stats: None,
            last_sync: None,
        }
    }

    pub fn into_shared(self) -> SharedSession<A> {
        Arc::new(tokio::sync::Mutex::new(self))
    }

    /// Fetch and merge. `force` discards local state and rebuilds the view
    /// from the newest `fetch_limit` messages; otherwise only messages past
    /// the cursor are requested. A session that has not seen anything yet
    /// (cursor 0) loads the newest window instead of the start of the log.
    pub async fn poll(&mut self, force: bool) -> Result<PollReport, ClientError> {
        let cursor = self.view.cursor();
        let response = if force || cursor == 0 {
            self.api.fetch_recent(self.config.fetch_limit).await
        } else {
            self.api.fetch_since(cursor, self.config.fetch_limit).await
        };

        let batch = match response {
            Ok(batch) => batch,
            Err(e) => {
                self.record_failure(if force { "resync" } else { "poll" }, &e);
                return Err(e);
            }
        };

        let outcome = if force {
            self.view.replace(batch)
        } else {
            self.view.merge(batch)
        };
        self.last_sync = Some(Utc::now());
        self.record_success();

        let report = PollReport::new(force, outcome, self.view.cursor());
        if !report.is_empty() {
            tracing::debug!(
                session = %self.id,
                resync = force,
                added = report.added.len(),
                duplicates = report.duplicates,
                evicted = report.evicted.len(),
                cursor = report.cursor,
                "merged poll results"
            );
        }
        Ok(report)
    }

    /// Submit a message. On success the draft is cleared and a forced
    /// resync follows; on failure the input is kept as the draft.
    pub async fn send(&mut self, author: &str, body: &str) -> Result<SendReport, ClientError> {
        let author_param = Some(author).filter(|a| !a.trim().is_empty());
        match self.api.send(author_param, body).await {
            Ok(id) => {
                self.draft = None;
                self.record_success();
                tracing::debug!(session = %self.id, id, "message accepted");
                let resync = self.poll(true).await;
                Ok(SendReport { id, resync })
            }
            Err(e) => {
                self.draft = Some(Draft {
                    author: author.to_string(),
                    body: body.to_string(),
                });
                self.record_failure("send", &e);
                Err(e)
            }
        }
    }

    /// Resubmit the preserved draft, if any.
    pub async fn retry_send(&mut self) -> Result<Option<SendReport>, ClientError> {
        let Some(draft) = self.draft.clone() else {
            return Ok(None);
        };
        self.send(&draft.author, &draft.body).await.map(Some)
    }

    /// Refresh the log counters. Failures only affect the status.
    pub async fn refresh_stats(&mut self) -> Result<LogStats, ClientError> {
        match self.api.stats().await {
            Ok(stats) => {
                self.last_stats = Some(stats);
                self.record_success();
                Ok(stats)
            }
            Err(e) => {
                self.record_failure("stats", &e);
                Err(e)
            }
        }
    }

    fn record_success(&mut self) {
        self.set_status(ConnectionStatus::Connected);
    }

    fn record_failure(&mut self, operation: &str, err: &ClientError) {
        let next = match err {
            ClientError::Network(_) => ConnectionStatus::Offline,
            ClientError::Server(_) | ClientError::Decode(_) => ConnectionStatus::ServerError,
        };
        tracing::debug!(session = %self.id, operation, error = %err, "request failed");
        self.set_status(next);
    }

    fn set_status(&mut self, next: ConnectionStatus) {
        if self.status != next {
            tracing::info!(session = %self.id, from = %self.status, to = %next, "status changed");
            self.status = next;
        }
    }
}

impl<A> SyncSession<A> {
    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn api(&self) -> &A {
        &self.api
    }

    pub fn config(&self) -> &SyncConfig {
        &self.config
    }

    pub fn view(&self) -> &LocalView {
        &self.view
    }

    pub fn cursor(&self) -> u64 {
        self.view.cursor()
    }

    pub fn status(&self) -> ConnectionStatus {
        self.status
    }

    pub fn draft(&self) -> Option<&Draft> {
        self.draft.as_ref()
    }

    pub fn last_stats(&self) -> Option<LogStats> {
        self.last_stats
    }

    pub fn last_sync(&self) -> Option<DateTime<Utc>> {
        self.last_sync
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sync::testing::{message, MemoryFeed};
    use std::sync::atomic::Ordering;

    fn session_with(feed: &Arc<MemoryFeed>, capacity: usize) -> SyncSession<Arc<MemoryFeed>> {
        let config = SyncConfig {
            capacity,
            ..SyncConfig::default()
        };
        SyncSession::new(Arc::clone(feed), config)
    }

    #[tokio::test]
    async fn test_starts_connecting_and_empty() {
        let feed = Arc::new(MemoryFeed::default());
        let session = session_with(&feed, 10);
        assert_eq!(session.status(), ConnectionStatus::Connecting);
        assert_eq!(session.cursor(), 0);
        assert!(session.view().is_empty());
    }

    #[tokio::test]
    async fn test_full_resync_sees_messages_in_order() {
        let feed = Arc::new(MemoryFeed::default());
        feed.append("Alice", "hello");
        feed.append("Bob", "world");
        let mut session = session_with(&feed, 10);

        let report = session.poll(true).await.unwrap();
        assert!(report.resync);
        assert_eq!(session.view().ids(), vec![1, 2]);
        assert_eq!(session.cursor(), 2);
        assert_eq!(session.status(), ConnectionStatus::Connected);
        assert_eq!(feed.recent_calls.load(Ordering::SeqCst), 1);
        assert!(session.last_sync().is_some());
    }

    #[tokio::test]
    async fn test_incremental_poll_requests_past_cursor() {
        let feed = Arc::new(MemoryFeed::default());
        feed.append("Alice", "one");
        let mut session = session_with(&feed, 10);
        session.poll(true).await.unwrap();

        feed.append("Bob", "two");
        feed.append("Bob", "three");
        let report = session.poll(false).await.unwrap();
        assert!(!report.resync);
        assert_eq!(report.added.iter().map(|m| m.id).collect::<Vec<_>>(), vec![2, 3]);
        assert_eq!(session.cursor(), 3);

        let idle = session.poll(false).await.unwrap();
        assert!(idle.is_empty());
        assert_eq!(feed.since_calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn test_send_goes_through_forced_resync() {
        let feed = Arc::new(MemoryFeed::default());
        feed.append("Bob", "earlier");
        let mut session = session_with(&feed, 10);
        session.poll(false).await.unwrap();
        let since_before = feed.since_calls.load(Ordering::SeqCst);
        let recent_before = feed.recent_calls.load(Ordering::SeqCst);

        let report = session.send("Alice", "hello").await.unwrap();
        assert_eq!(report.id, 2);
        let resync = report.resync.unwrap();
        assert!(resync.resync);
        assert!(session.view().contains(2));
        assert_eq!(session.view().ids(), vec![1, 2]);
        assert_eq!(feed.recent_calls.load(Ordering::SeqCst), recent_before + 1);
        assert_eq!(feed.since_calls.load(Ordering::SeqCst), since_before);
        assert!(session.draft().is_none());
    }

    #[tokio::test]
    async fn test_network_failure_preserves_draft_and_view() {
        let feed = Arc::new(MemoryFeed::default());
        feed.append("Bob", "earlier");
        let mut session = session_with(&feed, 10);
        session.poll(true).await.unwrap();

        feed.fail_next(ClientError::Network("connection refused".to_string()));
        let err = session.send("Alice", "hello").await.unwrap_err();
        assert!(matches!(err, ClientError::Network(_)));
        assert_eq!(session.status(), ConnectionStatus::Offline);
        assert_eq!(
            session.draft(),
            Some(&Draft { author: "Alice".to_string(), body: "hello".to_string() })
        );
        assert_eq!(session.view().ids(), vec![1]);
        assert_eq!(session.cursor(), 1);

        let retried = session.retry_send().await.unwrap().unwrap();
        assert_eq!(retried.id, 2);
        assert!(session.draft().is_none());
        assert_eq!(session.status(), ConnectionStatus::Connected);
        assert_eq!(session.view().ids(), vec![1, 2]);
    }

    #[tokio::test]
    async fn test_rejected_send_is_server_error() {
        let feed = Arc::new(MemoryFeed::default());
        let mut session = session_with(&feed, 10);

        let err = session.send("Alice", "").await.unwrap_err();
        assert_eq!(err, ClientError::Server("Message cannot be empty.".to_string()));
        assert_eq!(session.status(), ConnectionStatus::ServerError);
        assert!(session.draft().is_some());
        assert_eq!(feed.total(), 0);
    }

    #[tokio::test]
    async fn test_retry_without_draft_is_noop() {
        let feed = Arc::new(MemoryFeed::default());
        let mut session = session_with(&feed, 10);
        assert!(session.retry_send().await.unwrap().is_none());
        assert_eq!(feed.send_calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_failed_poll_leaves_state_and_recovers() {
        let feed = Arc::new(MemoryFeed::default());
        feed.append("Alice", "one");
        let mut session = session_with(&feed, 10);
        session.poll(true).await.unwrap();

        feed.append("Bob", "two");
        feed.fail_next(ClientError::Server("Fetch failed: locked".to_string()));
        assert!(session.poll(false).await.is_err());
        assert_eq!(session.status(), ConnectionStatus::ServerError);
        assert_eq!(session.view().ids(), vec![1]);

        feed.fail_next(ClientError::Network("timeout".to_string()));
        assert!(session.poll(true).await.is_err());
        assert_eq!(session.status(), ConnectionStatus::Offline);
        assert_eq!(session.view().ids(), vec![1]);

        session.poll(false).await.unwrap();
        assert_eq!(session.status(), ConnectionStatus::Connected);
        assert_eq!(session.view().ids(), vec![1, 2]);
    }

    #[tokio::test]
    async fn test_resync_drops_stale_entries() {
        let feed = Arc::new(MemoryFeed::default());
        feed.append("Alice", "one");
        let mut session = session_with(&feed, 10);
        session.poll(true).await.unwrap();

        // An entry the log never had.
        session.view.merge([message(99)]);
        assert_eq!(session.cursor(), 99);

        session.poll(true).await.unwrap();
        assert_eq!(session.view().ids(), vec![1]);
        assert_eq!(session.cursor(), 1);
    }

    #[tokio::test]
    async fn test_cursor_monotonic_and_view_bounded() {
        let feed = Arc::new(MemoryFeed::default());
        let mut session = session_with(&feed, 5);
        let mut last_cursor = 0;

        for round in 0..20 {
            for i in 0..3 {
                feed.append("bot", &format!("r{} m{}", round, i));
            }
            session.poll(false).await.unwrap();
            assert!(session.cursor() >= last_cursor);
            assert!(session.view().len() <= 5);
            last_cursor = session.cursor();
        }
        assert_eq!(session.cursor(), 60);
        assert_eq!(session.view().ids(), vec![56, 57, 58, 59, 60]);
    }

    #[tokio::test]
    async fn test_first_poll_loads_newest_window() {
        let feed = Arc::new(MemoryFeed::default());
        for i in 0..300 {
            feed.append("bot", &format!("m{}", i));
        }
        let mut session = session_with(&feed, 1200);

        feed.fail_next(ClientError::Network("down".to_string()));
        assert!(session.poll(true).await.is_err());

        let report = session.poll(false).await.unwrap();
        assert!(!report.resync);
        assert_eq!(report.added.first().map(|m| m.id), Some(101));
        assert_eq!(report.added.last().map(|m| m.id), Some(300));
        assert_eq!(session.view().len(), 200);
        assert_eq!(session.cursor(), 300);
        assert_eq!(feed.since_calls.load(Ordering::SeqCst), 0);

        feed.append("bot", "next");
        session.poll(false).await.unwrap();
        assert_eq!(feed.since_calls.load(Ordering::SeqCst), 1);
        assert_eq!(session.cursor(), 301);
    }

    #[tokio::test]
    async fn test_refresh_stats() {
        let feed = Arc::new(MemoryFeed::default());
        feed.append("Alice", "one");
        let mut session = session_with(&feed, 10);

        let stats = session.refresh_stats().await.unwrap();
        assert_eq!(stats, LogStats { total: 1, max_id: 1 });
        assert_eq!(session.last_stats(), Some(stats));

        feed.fail_next(ClientError::Server("Stats failed: x".to_string()));
        assert!(session.refresh_stats().await.is_err());
        assert_eq!(session.status(), ConnectionStatus::ServerError);
        assert_eq!(session.last_stats(), Some(stats));
    }
}

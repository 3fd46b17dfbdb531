//! Adaptive poll timer.
//!
//! A scheduler owns at most one armed timer. Changing focus cancels the
//! running timer and arms a new one with the other period, so polling
//! never runs at two rates at once.

use std::time::Duration;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

use crate::api::{ClientError, FeedApi};
use crate::config::SyncConfig;
use crate::sync::session::{PollReport, SharedSession};
use crate::sync::status::FocusState;

struct Timer {
    cancel: CancellationToken,
    handle: JoinHandle<()>,
}

pub struct PollScheduler<A: FeedApi + 'static> {
    session: SharedSession<A>,
    active_interval: Duration,
    background_interval: Duration,
    track_stats: bool,
    focus: FocusState,
    reports: Option<mpsc::UnboundedSender<PollReport>>,
    timer: Option<Timer>,
}

impl<A: FeedApi + 'static> PollScheduler<A> {
    pub fn new(session: SharedSession<A>, config: &SyncConfig) -> Self {
        Self {
            session,
            active_interval: config.active_interval,
            background_interval: config.background_interval,
            track_stats: config.track_stats,
            focus: FocusState::default(),
            reports: None,
            timer: None,
        }
    }

    /// Forward every non-empty poll report to `tx`.
    pub fn with_reports(mut self, tx: mpsc::UnboundedSender<PollReport>) -> Self {
        self.reports = Some(tx);
        self
    }

    /// Run the initial full load, then arm the timer. The timer is armed
    /// even when the initial load fails so the session keeps retrying.
    pub async fn start(&mut self) -> Result<PollReport, ClientError> {
        self.stop();
        let initial = self.session.lock().await.poll(true).await;
        if let Ok(report) = &initial {
            forward(&self.reports, report.clone());
        }
        self.arm();
        initial
    }

    /// Switch poll rate. A no-op when the focus is unchanged.
    pub fn set_focus(&mut self, focus: FocusState) {
        if self.focus == focus {
            return;
        }
        self.focus = focus;
        if self.is_running() {
            tracing::debug!(?focus, period_ms = self.period().as_millis() as u64, "re-arming poll timer");
            self.arm();
        }
    }

    pub fn stop(&mut self) {
        if let Some(timer) = self.timer.take() {
            timer.cancel.cancel();
        }
    }

    pub fn is_running(&self) -> bool {
        self.timer.as_ref().is_some_and(|t| !t.handle.is_finished())
    }

    pub fn focus(&self) -> FocusState {
        self.focus
    }

    pub fn period(&self) -> Duration {
        match self.focus {
            FocusState::Foreground => self.active_interval,
            FocusState::Background => self.background_interval,
        }
    }

    pub fn session(&self) -> &SharedSession<A> {
        &self.session
    }

    fn arm(&mut self) {
        self.stop();
        let cancel = CancellationToken::new();
        let handle = tokio::spawn(run(
            self.session.clone(),
            self.period(),
            self.track_stats,
            self.reports.clone(),
            cancel.clone(),
        ));
        self.timer = Some(Timer { cancel, handle });
    }
}

impl<A: FeedApi + 'static> Drop for PollScheduler<A> {
    fn drop(&mut self) {
        self.stop();
    }
}

async fn run<A: FeedApi + 'static>(
    session: SharedSession<A>,
    period: Duration,
    track_stats: bool,
    reports: Option<mpsc::UnboundedSender<PollReport>>,
    cancel: CancellationToken,
) {
    loop {
        tokio::select! {
            _ = cancel.cancelled() => break,
            _ = tokio::time::sleep(period) => {}
        }

        let mut guard = session.lock().await;
        if cancel.is_cancelled() {
            break;
        }
        match guard.poll(false).await {
            Ok(report) => {
                if track_stats {
                    if let Err(e) = guard.refresh_stats().await {
                        tracing::debug!(session = %guard.id(), error = %e, "stats refresh failed");
                    }
                }
                drop(guard);
                forward(&reports, report);
            }
            Err(e) => {
                tracing::debug!(session = %guard.id(), error = %e, "scheduled poll failed");
            }
        }
    }
}

fn forward(reports: &Option<mpsc::UnboundedSender<PollReport>>, report: PollReport) {
    if report.is_empty() {
        return;
    }
    if let Some(tx) = reports {
        if tx.send(report).is_err() {
            tracing::debug!("poll report receiver dropped");
        }
    }
}

//! Poll loop driving one tracked task

use chrono::{DateTime, Utc};
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use super::observer::{DownloadSummary, ProgressObserver};
use super::view::ProgressView;
use crate::client::{ClientError, StatusSource};
use crate::models::{ProgressSnapshot, TaskState, VideoRef};
use crate::observability::PollMetrics;

const DEFAULT_INTERVAL: Duration = Duration::from_secs(1);
const DEFAULT_ERROR_MESSAGE: &str = "Download failed";

#[derive(Debug, Error)]
pub enum TrackerError {
    #[error("tracker task did not finish: {0}")]
    Join(#[from] tokio::task::JoinError),
}

/// How a tracked task ended
#[derive(Debug, Clone, PartialEq)]
pub enum TrackerOutcome {
    Completed(DownloadSummary),
    Failed(String),
    Cancelled,
}

/// Converts status polls for a task into observer events
#[derive(Clone)]
pub struct ProgressTracker {
    source: Arc<dyn StatusSource>,
    observer: Arc<dyn ProgressObserver>,
    interval: Duration,
    metrics: Arc<PollMetrics>,
}

impl ProgressTracker {
    pub fn new(source: Arc<dyn StatusSource>, observer: Arc<dyn ProgressObserver>) -> Self {
        Self {
            source,
            observer,
            interval: DEFAULT_INTERVAL,
            metrics: Arc::new(PollMetrics::new()),
        }
    }

    pub fn with_interval(mut self, interval: Duration) -> Self {
        self.interval = interval;
        self
    }

    pub fn with_metrics(mut self, metrics: Arc<PollMetrics>) -> Self {
        self.metrics = metrics;
        self
    }

    pub fn metrics(&self) -> &Arc<PollMetrics> {
        &self.metrics
    }

    /// Render the initial view and start polling `task_id`.
    ///
    /// The caller guarantees a non-empty task id and video list. Must be
    /// called from within a tokio runtime.
    pub fn start(&self, task_id: impl Into<String>, videos: Vec<VideoRef>) -> TrackerHandle {
        let task_id = task_id.into();
        let view = ProgressView::new(task_id.clone(), videos);
        self.observer.on_update(&view);

        info!(task_id = %task_id, videos = view.total(), interval = ?self.interval, "Tracking download task");

        let token = CancellationToken::new();
        let poll = PollLoop {
            task_id: task_id.clone(),
            view,
            source: Arc::clone(&self.source),
            observer: Arc::clone(&self.observer),
            interval: self.interval,
            metrics: Arc::clone(&self.metrics),
            token: token.clone(),
            started_at: Utc::now(),
        };

        TrackerHandle {
            task_id,
            token,
            task: tokio::spawn(poll.run()),
        }
    }
}

/// Handle to a running tracker.
///
/// Dropping the handle detaches the tracker; it keeps polling until the task
/// reaches a terminal state.
#[derive(Debug)]
pub struct TrackerHandle {
    task_id: String,
    token: CancellationToken,
    task: JoinHandle<TrackerOutcome>,
}

impl TrackerHandle {
    pub fn task_id(&self) -> &str {
        &self.task_id
    }

    /// Stop polling. Idempotent, and a no-op once the tracker has finished.
    pub fn cancel(&self) {
        if !self.token.is_cancelled() && !self.task.is_finished() {
            debug!(task_id = %self.task_id, "Cancelling progress tracker");
        }
        self.token.cancel();
    }

    pub fn is_cancelled(&self) -> bool {
        self.token.is_cancelled()
    }

    pub fn is_finished(&self) -> bool {
        self.task.is_finished()
    }

    /// Token that cancels this tracker when triggered
    pub fn cancellation_token(&self) -> CancellationToken {
        self.token.clone()
    }

    /// Wait for the tracker to finish
    pub async fn wait(self) -> Result<TrackerOutcome, TrackerError> {
        Ok(self.task.await?)
    }
}

struct PollLoop {
    task_id: String,
    view: ProgressView,
    source: Arc<dyn StatusSource>,
    observer: Arc<dyn ProgressObserver>,
    interval: Duration,
    metrics: Arc<PollMetrics>,
    token: CancellationToken,
    started_at: DateTime<Utc>,
}

impl PollLoop {
    /// One request at a time: sleep, fetch, apply, repeat
    async fn run(mut self) -> TrackerOutcome {
        loop {
            tokio::select! {
                biased;
                _ = self.token.cancelled() => {
                    debug!(task_id = %self.task_id, "Tracker cancelled");
                    return TrackerOutcome::Cancelled;
                }
                _ = tokio::time::sleep(self.interval) => {}
            }

            self.metrics.poll_issued();
            let result = self.source.fetch_status(&self.task_id).await;

            // In-flight requests are not aborted; their responses are dropped
            if self.token.is_cancelled() {
                self.metrics.response_discarded();
                debug!(task_id = %self.task_id, "Discarding response received after cancel");
                return TrackerOutcome::Cancelled;
            }

            match result {
                Ok(snapshot) => {
                    if let Some(outcome) = self.on_snapshot(snapshot) {
                        return outcome;
                    }
                }
                Err(e) => self.on_fetch_error(e),
            }
        }
    }

    fn on_snapshot(&mut self, snapshot: ProgressSnapshot) -> Option<TrackerOutcome> {
        if snapshot.state == TaskState::Error {
            let message = snapshot
                .error_message
                .unwrap_or_else(|| DEFAULT_ERROR_MESSAGE.to_string());
            warn!(task_id = %self.task_id, error = %message, "Download task failed");
            self.observer.on_error(&message);
            return Some(TrackerOutcome::Failed(message));
        }

        for change in self.view.apply(&snapshot) {
            debug!(
                task_id = %self.task_id,
                video_id = %change.video_id,
                from = %change.from,
                to = %change.to,
                "Video status changed"
            );
        }
        self.metrics.snapshot_applied();
        self.observer.on_update(&self.view);

        if !snapshot.state.is_terminal() {
            return None;
        }

        let summary = DownloadSummary::new(&self.view, &snapshot, self.started_at);
        info!(
            task_id = %self.task_id,
            completed = summary.completed(),
            failed = summary.failed(),
            "Download task completed"
        );
        self.observer.on_complete(&summary);
        Some(TrackerOutcome::Completed(summary))
    }

    fn on_fetch_error(&self, error: ClientError) {
        if error.is_transport() {
            self.metrics.transport_failure();
            warn!(task_id = %self.task_id, error = %error, "Progress poll failed, retrying on next tick");
        } else {
            self.metrics.malformed_response();
            warn!(task_id = %self.task_id, error = %error, "Skipping unusable progress response");
        }
    }
}

use chrono::{DateTime, Utc};
use std::sync::Mutex;

use super::view::ProgressView;
use crate::models::{ProgressSnapshot, VideoRef, VideoStatus};

/// Presentation layer for a progress tracker.
///
/// Lifecycle:
/// - `on_update` is called once with the initial all-pending view, then after
///   every applied snapshot.
/// - `on_complete` is called once when the service reports the task completed.
/// - `on_error` is called once when the service reports a task error.
///
/// At most one of `on_complete` / `on_error` fires, and neither fires after
/// the tracker is cancelled.
pub trait ProgressObserver: Send + Sync {
    fn on_update(&self, view: &ProgressView);

    fn on_complete(&self, summary: &DownloadSummary);

    fn on_error(&self, message: &str);
}

/// Final outcome of one video
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VideoOutcome {
    pub video: VideoRef,
    pub status: VideoStatus,
}

/// Terminal summary of a completed task
#[derive(Debug, Clone, PartialEq)]
pub struct DownloadSummary {
    pub task_id: String,
    pub completed_ids: Vec<String>,
    pub failed_ids: Vec<String>,
    pub total: usize,
    pub outcomes: Vec<VideoOutcome>,
    pub started_at: DateTime<Utc>,
    pub finished_at: DateTime<Utc>,
}

impl DownloadSummary {
    pub(crate) fn new(
        view: &ProgressView,
        snapshot: &ProgressSnapshot,
        started_at: DateTime<Utc>,
    ) -> Self {
        Self {
            task_id: view.task_id().to_string(),
            completed_ids: snapshot.completed_ids.clone(),
            failed_ids: snapshot.failed_ids.clone(),
            total: view.total(),
            outcomes: view
                .rows()
                .iter()
                .map(|row| VideoOutcome {
                    video: row.video.clone(),
                    status: row.status,
                })
                .collect(),
            started_at,
            finished_at: Utc::now(),
        }
    }

    pub fn completed(&self) -> usize {
        self.completed_ids.len()
    }

    pub fn failed(&self) -> usize {
        self.failed_ids.len()
    }

    /// "N downloaded, M failed"
    pub fn status_line(&self) -> String {
        format!("{} downloaded, {} failed", self.completed(), self.failed())
    }

    pub fn elapsed(&self) -> chrono::Duration {
        self.finished_at - self.started_at
    }
}

/// Event captured by [`RecordingObserver`]
#[derive(Debug, Clone)]
pub enum ObservedEvent {
    Update(ProgressView),
    Complete(DownloadSummary),
    Error(String),
}

/// Observer that stores every event it receives
#[derive(Debug, Default)]
pub struct RecordingObserver {
    events: Mutex<Vec<ObservedEvent>>,
}

impl RecordingObserver {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn events(&self) -> Vec<ObservedEvent> {
        self.events.lock().map(|e| e.clone()).unwrap_or_default()
    }

    pub fn updates(&self) -> Vec<ProgressView> {
        self.events()
            .into_iter()
            .filter_map(|event| match event {
                ObservedEvent::Update(view) => Some(view),
                _ => None,
            })
            .collect()
    }

    pub fn last_view(&self) -> Option<ProgressView> {
        self.updates().pop()
    }

    pub fn completion(&self) -> Option<DownloadSummary> {
        self.events().into_iter().find_map(|event| match event {
            ObservedEvent::Complete(summary) => Some(summary),
            _ => None,
        })
    }

    pub fn error(&self) -> Option<String> {
        self.events().into_iter().find_map(|event| match event {
            ObservedEvent::Error(message) => Some(message),
            _ => None,
        })
    }

    fn record(&self, event: ObservedEvent) {
        if let Ok(mut events) = self.events.lock() {
            events.push(event);
        }
    }
}

impl ProgressObserver for RecordingObserver {
    fn on_update(&self, view: &ProgressView) {
        self.record(ObservedEvent::Update(view.clone()));
    }

    fn on_complete(&self, summary: &DownloadSummary) {
        self.record(ObservedEvent::Complete(summary.clone()));
    }

    fn on_error(&self, message: &str) {
        self.record(ObservedEvent::Error(message.to_string()));
    }
}

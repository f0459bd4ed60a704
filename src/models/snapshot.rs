//! Task status snapshots as reported by the download service.
//!
//! The service answers `GET /download-progress/{task_id}` with a JSON object:
//!
//! ```json
//! {
//!   "status": "downloading",
//!   "progress": 50,
//!   "message": "Downloading Video 2...",
//!   "current_video": "b",
//!   "completed_videos": ["a"],
//!   "failed_videos": [],
//!   "total": 3
//! }
//! ```
//!
//! Id lists are cumulative: each snapshot restates everything completed or
//! failed so far. Any status other than `completed` or `error` means the task
//! is still running.

use serde::Deserialize;
use std::collections::HashSet;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum SnapshotError {
    #[error("invalid snapshot JSON: {0}")]
    InvalidJson(#[from] serde_json::Error),

    #[error("snapshot is missing required field '{0}'")]
    MissingField(&'static str),
}

/// Overall task phase reported by the service
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TaskState {
    Running,
    Completed,
    Error,
}

impl TaskState {
    fn from_wire(status: &str) -> Self {
        match status {
            "completed" => TaskState::Completed,
            "error" => TaskState::Error,
            _ => TaskState::Running,
        }
    }

    pub fn is_terminal(self) -> bool {
        !matches!(self, TaskState::Running)
    }
}

/// One validated poll response
#[derive(Debug, Clone, PartialEq)]
pub struct ProgressSnapshot {
    /// Raw percentage; may be out of range or regress between polls
    pub percent: i64,
    pub message: Option<String>,
    pub current_video_id: Option<String>,
    pub completed_ids: Vec<String>,
    pub failed_ids: Vec<String>,
    pub state: TaskState,
    pub error_message: Option<String>,
    pub total: Option<u64>,
}

#[derive(Debug, Deserialize)]
struct WireSnapshot {
    #[serde(default, alias = "progress")]
    percent: Option<f64>,
    #[serde(default)]
    message: Option<String>,
    #[serde(default)]
    current_video: Option<String>,
    #[serde(default)]
    completed_videos: Option<Vec<String>>,
    #[serde(default)]
    failed_videos: Option<Vec<String>>,
    #[serde(default)]
    status: Option<String>,
    #[serde(default)]
    error: Option<String>,
    #[serde(default)]
    total: Option<u64>,
}

impl ProgressSnapshot {
    pub fn from_slice(body: &[u8]) -> Result<Self, SnapshotError> {
        let wire: WireSnapshot = serde_json::from_slice(body)?;
        Self::try_from(wire)
    }

    pub fn running(percent: i64) -> Self {
        Self {
            percent,
            message: None,
            current_video_id: None,
            completed_ids: Vec::new(),
            failed_ids: Vec::new(),
            state: TaskState::Running,
            error_message: None,
            total: None,
        }
    }

    pub fn completed(completed: &[&str], failed: &[&str]) -> Self {
        Self {
            completed_ids: completed.iter().map(|id| id.to_string()).collect(),
            failed_ids: failed.iter().map(|id| id.to_string()).collect(),
            state: TaskState::Completed,
            ..Self::running(100)
        }
    }

    pub fn error(message: impl Into<String>) -> Self {
        Self {
            state: TaskState::Error,
            error_message: Some(message.into()),
            ..Self::running(0)
        }
    }

    pub fn with_current(mut self, id: impl Into<String>) -> Self {
        self.current_video_id = Some(id.into());
        self
    }

    pub fn with_message(mut self, message: impl Into<String>) -> Self {
        self.message = Some(message.into());
        self
    }

    pub fn with_completed(mut self, ids: &[&str]) -> Self {
        self.completed_ids = ids.iter().map(|id| id.to_string()).collect();
        self
    }

    pub fn with_failed(mut self, ids: &[&str]) -> Self {
        self.failed_ids = ids.iter().map(|id| id.to_string()).collect();
        self
    }
}

impl TryFrom<WireSnapshot> for ProgressSnapshot {
    type Error = SnapshotError;

    fn try_from(wire: WireSnapshot) -> Result<Self, Self::Error> {
        let status = wire.status.ok_or(SnapshotError::MissingField("status"))?;
        let state = TaskState::from_wire(&status);

        let percent = match (wire.percent, state) {
            (Some(p), _) if p.is_finite() => p.round() as i64,
            (_, TaskState::Error) => 0,
            _ => return Err(SnapshotError::MissingField("percent")),
        };

        let error_message = match state {
            TaskState::Error => wire.error.filter(|e| !e.trim().is_empty()),
            _ => None,
        };

        Ok(Self {
            percent,
            message: wire.message.filter(|m| !m.is_empty()),
            current_video_id: wire.current_video.filter(|id| !id.is_empty()),
            completed_ids: dedup(wire.completed_videos.unwrap_or_default()),
            failed_ids: dedup(wire.failed_videos.unwrap_or_default()),
            state,
            error_message,
            total: wire.total,
        })
    }
}

/// Collapse repeated ids, keeping first-seen order
fn dedup(ids: Vec<String>) -> Vec<String> {
    let mut seen = HashSet::with_capacity(ids.len());
    ids.into_iter().filter(|id| seen.insert(id.clone())).collect()
}

//! Render model for one tracked task.
//!
//! Rows are fixed at construction, one per video id, in submission order.
//! Snapshots only ever replace a row's status; they never add or remove rows.

use std::collections::HashMap;

use crate::models::{ProgressSnapshot, TaskState, VideoRef, VideoStatus};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VideoRow {
    pub video: VideoRef,
    pub status: VideoStatus,
}

/// One per-video status transition caused by a snapshot
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StatusChange {
    pub video_id: String,
    pub from: VideoStatus,
    pub to: VideoStatus,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ProgressView {
    task_id: String,
    rows: Vec<VideoRow>,
    index: HashMap<String, usize>,
    percent: u8,
    message: Option<String>,
    completed: usize,
    failed: usize,
}

impl ProgressView {
    /// Build the initial view with every video pending.
    ///
    /// Repeated ids keep only their first row.
    pub fn new(task_id: impl Into<String>, videos: Vec<VideoRef>) -> Self {
        let mut rows = Vec::with_capacity(videos.len());
        let mut index = HashMap::with_capacity(videos.len());

        for video in videos {
            if index.contains_key(&video.id) {
                tracing::warn!(video_id = %video.id, "Duplicate video id ignored");
                continue;
            }
            index.insert(video.id.clone(), rows.len());
            rows.push(VideoRow {
                video,
                status: VideoStatus::Pending,
            });
        }

        Self {
            task_id: task_id.into(),
            rows,
            index,
            percent: 0,
            message: None,
            completed: 0,
            failed: 0,
        }
    }

    /// Reconcile a running or completed snapshot into the view.
    ///
    /// Error snapshots change nothing. Ids that are not part of the task are
    /// ignored. Applying the same snapshot twice yields the same view.
    pub fn apply(&mut self, snapshot: &ProgressSnapshot) -> Vec<StatusChange> {
        let mut changes = Vec::new();

        if snapshot.state == TaskState::Error {
            return changes;
        }

        if let Some(current) = &snapshot.current_video_id {
            if self.status(current) == Some(VideoStatus::Pending) {
                self.transition(current, VideoStatus::Downloading, &mut changes);
            }
        }

        // Failed wins when one snapshot lists an id in both sets
        for id in &snapshot.completed_ids {
            if !snapshot.failed_ids.contains(id) {
                self.transition(id, VideoStatus::Completed, &mut changes);
            }
        }

        for id in &snapshot.failed_ids {
            self.transition(id, VideoStatus::Failed, &mut changes);
        }

        self.percent = snapshot.percent.clamp(0, 100) as u8;
        if let Some(message) = &snapshot.message {
            self.message = Some(message.clone());
        }
        self.completed = snapshot.completed_ids.len();
        self.failed = snapshot.failed_ids.len();

        changes
    }

    fn transition(&mut self, id: &str, to: VideoStatus, changes: &mut Vec<StatusChange>) {
        let Some(&pos) = self.index.get(id) else {
            tracing::trace!(task_id = %self.task_id, video_id = id, "Ignoring unknown video id");
            return;
        };

        let row = &mut self.rows[pos];
        if row.status != to {
            changes.push(StatusChange {
                video_id: id.to_string(),
                from: row.status,
                to,
            });
            row.status = to;
        }
    }

    pub fn task_id(&self) -> &str {
        &self.task_id
    }

    pub fn rows(&self) -> &[VideoRow] {
        &self.rows
    }

    pub fn status(&self, video_id: &str) -> Option<VideoStatus> {
        self.index.get(video_id).map(|&pos| self.rows[pos].status)
    }

    pub fn percent(&self) -> u8 {
        self.percent
    }

    pub fn message(&self) -> Option<&str> {
        self.message.as_deref()
    }

    pub fn completed_count(&self) -> usize {
        self.completed
    }

    pub fn failed_count(&self) -> usize {
        self.failed
    }

    pub fn total(&self) -> usize {
        self.rows.len()
    }

    /// "N of M completed"
    pub fn status_line(&self) -> String {
        format!("{} of {} completed", self.completed, self.total())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn two_videos() -> ProgressView {
        ProgressView::new(
            "task-1",
            vec![
                VideoRef::new("a", "https://youtu.be/a"),
                VideoRef::new("b", "https://youtu.be/b"),
            ],
        )
    }

    #[test]
    fn initial_view_is_all_pending() {
        let view = two_videos();
        assert_eq!(view.total(), 2);
        assert_eq!(view.percent(), 0);
        assert!(view.rows().iter().all(|r| r.status == VideoStatus::Pending));
        assert_eq!(view.status_line(), "0 of 2 completed");
    }

    #[test]
    fn current_video_starts_downloading() {
        let mut view = two_videos();
        let changes = view.apply(&ProgressSnapshot::running(50).with_current("a"));

        assert_eq!(view.status("a"), Some(VideoStatus::Downloading));
        assert_eq!(view.status("b"), Some(VideoStatus::Pending));
        assert_eq!(view.percent(), 50);
        assert_eq!(
            changes,
            vec![StatusChange {
                video_id: "a".into(),
                from: VideoStatus::Pending,
                to: VideoStatus::Downloading,
            }]
        );
    }

    #[test]
    fn reapplying_snapshot_is_idempotent() {
        let snapshot = ProgressSnapshot::running(60)
            .with_current("b")
            .with_completed(&["a"])
            .with_message("Downloading Video 2...");

        let mut once = two_videos();
        once.apply(&snapshot);

        let mut twice = two_videos();
        twice.apply(&snapshot);
        let changes = twice.apply(&snapshot);

        assert!(changes.is_empty());
        assert_eq!(once, twice);
        assert_eq!(twice.rows().len(), 2);
        assert_eq!(twice.completed_count(), 1);
    }

    #[test]
    fn terminal_status_survives_later_snapshots() {
        let mut view = two_videos();
        view.apply(&ProgressSnapshot::running(50).with_completed(&["a"]).with_failed(&["b"]));

        // Later snapshot lists neither id and points current_video at "a"
        view.apply(&ProgressSnapshot::running(70).with_current("a"));

        assert_eq!(view.status("a"), Some(VideoStatus::Completed));
        assert_eq!(view.status("b"), Some(VideoStatus::Failed));
    }

    #[test]
    fn unknown_ids_add_no_rows() {
        let mut view = two_videos();
        let changes = view.apply(
            &ProgressSnapshot::running(10)
                .with_current("ghost")
                .with_completed(&["phantom"])
                .with_failed(&["spectre"]),
        );

        assert!(changes.is_empty());
        assert_eq!(view.rows().len(), 2);
        assert_eq!(view.status("ghost"), None);
    }

    #[test]
    fn partial_failure_classification() {
        let mut view = two_videos();
        view.apply(&ProgressSnapshot::completed(&["a"], &["b"]));

        assert_eq!(view.status("a"), Some(VideoStatus::Completed));
        assert_eq!(view.status("b"), Some(VideoStatus::Failed));
        assert_eq!(view.completed_count(), 1);
        assert_eq!(view.failed_count(), 1);
        assert_eq!(view.percent(), 100);
    }

    #[test]
    fn id_in_both_lists_is_failed() {
        let mut view = two_videos();
        let snapshot = ProgressSnapshot::completed(&["a", "b"], &["b"]);

        view.apply(&snapshot);
        assert_eq!(view.status("b"), Some(VideoStatus::Failed));
        assert!(view.apply(&snapshot).is_empty());

        // A later snapshot reclassifying "b" as completed wins
        view.apply(&ProgressSnapshot::completed(&["a", "b"], &[]));
        assert_eq!(view.status("b"), Some(VideoStatus::Completed));
    }

    #[test]
    fn error_snapshot_changes_nothing() {
        let mut view = two_videos();
        let before = view.clone();

        let changes = view.apply(&ProgressSnapshot::error("disk full").with_completed(&["a"]));

        assert!(changes.is_empty());
        assert_eq!(view, before);
    }

    #[test]
    fn percent_is_clamped_and_may_regress() {
        let mut view = two_videos();
        view.apply(&ProgressSnapshot::running(140));
        assert_eq!(view.percent(), 100);

        view.apply(&ProgressSnapshot::running(-5));
        assert_eq!(view.percent(), 0);

        view.apply(&ProgressSnapshot::running(30));
        assert_eq!(view.percent(), 30);
    }

    #[test]
    fn message_is_kept_when_snapshot_has_none() {
        let mut view = two_videos();
        view.apply(&ProgressSnapshot::running(10).with_message("Processing Video 1..."));
        view.apply(&ProgressSnapshot::running(20));
        assert_eq!(view.message(), Some("Processing Video 1..."));
    }

    #[test]
    fn duplicate_video_ids_keep_one_row() {
        let view = ProgressView::new(
            "task-1",
            vec![
                VideoRef::new("a", "https://youtu.be/a").with_title("First"),
                VideoRef::new("a", "https://youtu.be/a2").with_title("Second"),
            ],
        );
        assert_eq!(view.total(), 1);
        assert_eq!(view.rows()[0].video.display_title(), "First");
    }
}

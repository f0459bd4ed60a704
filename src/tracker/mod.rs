//! Download progress tracking
//!
//! A [`ProgressTracker`] polls the status of one task at a fixed interval,
//! reconciles each snapshot into a [`ProgressView`] and reports to a
//! [`ProgressObserver`] until the service reports the task completed or
//! failed, or until the returned [`TrackerHandle`] is cancelled.
//!
//! ```rust,ignore
//! let tracker = ProgressTracker::new(Arc::new(client), Arc::new(renderer))
//!     .with_interval(Duration::from_secs(1));
//! let handle = tracker.start(task_id, videos);
//! match handle.wait().await? {
//!     TrackerOutcome::Completed(summary) => println!("{}", summary.status_line()),
//!     TrackerOutcome::Failed(message) => eprintln!("{message}"),
//!     TrackerOutcome::Cancelled => {}
//! }
//! ```

pub mod observer;
pub mod runner;
pub mod view;

pub use observer::{
    DownloadSummary, ObservedEvent, ProgressObserver, RecordingObserver, VideoOutcome,
};
pub use runner::{ProgressTracker, TrackerError, TrackerHandle, TrackerOutcome};
pub use view::{ProgressView, StatusChange, VideoRow};

//! Data model shared by the client, tracker and renderer.
//!
//! - [`VideoRef`] / [`VideoStatus`]: one item of a download task and its
//!   rendered state
//! - [`ProgressSnapshot`]: one validated status poll
//! - [`service`]: wire bodies for task creation and playlist extraction

pub mod service;
pub mod snapshot;
pub mod video;

pub use snapshot::{ProgressSnapshot, SnapshotError, TaskState};
pub use video::{VideoRef, VideoStatus};

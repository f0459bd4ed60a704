//! Request and response bodies for the task-creation and playlist-extraction
//! endpoints.

use serde::{Deserialize, Serialize};

use super::video::VideoRef;

/// Body of `POST /api/download`
#[derive(Debug, Serialize)]
pub struct CreateTaskRequest<'a> {
    pub videos: &'a [VideoRef],
    pub path: &'a str,
}

/// Response of `POST /api/download`
#[derive(Debug, Deserialize)]
pub struct CreateTaskResponse {
    #[serde(default)]
    pub success: bool,
    #[serde(default)]
    pub task_id: Option<String>,
    #[serde(default)]
    pub error: Option<String>,
}

/// Body of `POST /extract-playlist`
#[derive(Debug, Serialize)]
pub struct ExtractRequest<'a> {
    pub url: &'a str,
}

/// Response of `POST /extract-playlist`
#[derive(Debug, Deserialize)]
pub struct ExtractResponse {
    #[serde(default)]
    pub success: bool,
    #[serde(default)]
    pub videos: Vec<VideoRef>,
    #[serde(default)]
    pub count: Option<usize>,
    #[serde(default)]
    pub error: Option<String>,
    #[serde(default)]
    pub require_login: bool,
}

//! HTTP client for the download service

use reqwest::{Client, RequestBuilder, StatusCode};
use tracing::{debug, warn};
use url::Url;

use super::{ClientError, Result};
use crate::config::ServiceConfig;
use crate::models::service::{
    CreateTaskRequest, CreateTaskResponse, ExtractRequest, ExtractResponse,
};
use crate::models::{ProgressSnapshot, VideoRef};

const STATUS_PATH: &str = "download-progress";
const CREATE_TASK_PATH: [&str; 2] = ["api", "download"];
const EXTRACT_PATH: &str = "extract-playlist";

/// Client for the download service endpoints
#[derive(Debug, Clone)]
pub struct ServiceClient {
    client: Client,
    base: Url,
}

impl ServiceClient {
    /// Create a new client from service configuration
    pub fn new(config: &ServiceConfig) -> Result<Self> {
        let base = Url::parse(&config.base_url)
            .map_err(|e| ClientError::InvalidUrl(format!("{}: {}", config.base_url, e)))?;

        if base.cannot_be_a_base() {
            return Err(ClientError::InvalidUrl(config.base_url.clone()));
        }

        let mut builder = Client::builder()
            .connect_timeout(config.connect_timeout.as_duration())
            .user_agent(&config.user_agent);

        if let Some(timeout) = config.request_timeout {
            builder = builder.timeout(timeout.as_duration());
        }

        let client = builder
            .build()
            .map_err(|e| ClientError::RequestFailed(e.to_string()))?;

        Ok(Self { client, base })
    }

    /// Fetch the current status of a task (GET /download-progress/{task_id})
    pub async fn fetch_status(&self, task_id: &str) -> Result<ProgressSnapshot> {
        let url = self.endpoint(&[STATUS_PATH, task_id])?;
        let (status, body) = self.send(self.client.get(url)).await?;

        if !status.is_success() {
            return Err(status_error(status, &body));
        }

        ProgressSnapshot::from_slice(&body).map_err(|e| ClientError::Malformed(e.to_string()))
    }

    /// Submit a download task (POST /api/download) and return its id
    pub async fn create_task(&self, videos: &[VideoRef], path: &str) -> Result<String> {
        if videos.is_empty() {
            return Err(ClientError::rejected("No videos to download"));
        }

        let url = self.endpoint(&CREATE_TASK_PATH)?;
        let request = CreateTaskRequest { videos, path };
        let (status, body) = self.send(self.client.post(url).json(&request)).await?;

        let response: CreateTaskResponse = match serde_json::from_slice(&body) {
            Ok(response) => response,
            Err(_) if !status.is_success() => return Err(status_error(status, &body)),
            Err(e) => return Err(ClientError::Malformed(e.to_string())),
        };

        match response.task_id.filter(|id| !id.is_empty()) {
            Some(task_id) => {
                debug!(task_id = %task_id, videos = videos.len(), "Download task created");
                Ok(task_id)
            }
            None => {
                let message = response
                    .error
                    .unwrap_or_else(|| "Failed to start download".to_string());
                warn!(success = response.success, error = %message, "Task creation rejected");
                Err(ClientError::rejected(message))
            }
        }
    }

    /// Extract the videos of a playlist (POST /extract-playlist)
    pub async fn extract_playlist(&self, playlist_url: &str) -> Result<Vec<VideoRef>> {
        let url = self.endpoint(&[EXTRACT_PATH])?;
        let request = ExtractRequest { url: playlist_url };
        let (status, body) = self.send(self.client.post(url).json(&request)).await?;

        let response: ExtractResponse = match serde_json::from_slice(&body) {
            Ok(response) => response,
            Err(_) if !status.is_success() => return Err(status_error(status, &body)),
            Err(e) => return Err(ClientError::Malformed(e.to_string())),
        };

        if response.error.is_none() && !response.videos.is_empty() {
            if let Some(count) = response.count.filter(|&c| c != response.videos.len()) {
                debug!(count, received = response.videos.len(), "Playlist count mismatch");
            }
            return Ok(response.videos);
        }

        let message = response
            .error
            .unwrap_or_else(|| "No videos found in playlist".to_string());

        Err(ClientError::Rejected {
            message,
            login_required: response.require_login,
        })
    }

    /// Send a request and read the whole body
    async fn send(&self, request: RequestBuilder) -> Result<(StatusCode, Vec<u8>)> {
        let response = request.send().await.map_err(map_reqwest_error)?;
        let status = response.status();

        let body = response
            .bytes()
            .await
            .map_err(|e| ClientError::RequestFailed(format!("Failed to read body: {}", e)))?;

        Ok((status, body.to_vec()))
    }

    /// Append path segments to the base URL, percent-encoding each one
    fn endpoint(&self, segments: &[&str]) -> Result<Url> {
        let mut url = self.base.clone();
        url.path_segments_mut()
            .map_err(|_| ClientError::InvalidUrl(self.base.to_string()))?
            .pop_if_empty()
            .extend(segments);
        Ok(url)
    }
}

fn map_reqwest_error(e: reqwest::Error) -> ClientError {
    if e.is_timeout() {
        ClientError::Timeout
    } else {
        ClientError::RequestFailed(e.to_string())
    }
}

/// Build a status error, preferring the service's `{"error": ...}` text
fn status_error(status: StatusCode, body: &[u8]) -> ClientError {
    let message = serde_json::from_slice::<serde_json::Value>(body)
        .ok()
        .and_then(|v| v.get("error").and_then(|e| e.as_str()).map(str::to_owned))
        .unwrap_or_else(|| status.canonical_reason().unwrap_or("Unknown").to_string());

    ClientError::Status {
        code: status.as_u16(),
        message,
    }
}

//! Download service client
//!
//! [`ServiceClient`] talks to the download service over HTTP. The tracker
//! only needs task status, so it depends on the narrower [`StatusSource`]
//! trait; [`ScriptedSource`] replays canned responses for tests.

pub mod http;

pub use http::ServiceClient;

use async_trait::async_trait;
use std::collections::VecDeque;
use std::sync::Mutex;
use std::sync::atomic::{AtomicUsize, Ordering};
use thiserror::Error;

use crate::models::ProgressSnapshot;

#[derive(Debug, Error)]
pub enum ClientError {
    #[error("HTTP request failed: {0}")]
    RequestFailed(String),

    #[error("Request timed out")]
    Timeout,

    #[error("HTTP {code}: {message}")]
    Status { code: u16, message: String },

    #[error("Malformed response: {0}")]
    Malformed(String),

    #[error("{message}")]
    Rejected {
        message: String,
        login_required: bool,
    },

    #[error("Invalid URL: {0}")]
    InvalidUrl(String),
}

impl ClientError {
    pub fn rejected(message: impl Into<String>) -> Self {
        ClientError::Rejected {
            message: message.into(),
            login_required: false,
        }
    }

    /// The request did not produce a usable response at the HTTP level
    pub fn is_transport(&self) -> bool {
        matches!(
            self,
            ClientError::RequestFailed(_) | ClientError::Timeout | ClientError::Status { .. }
        )
    }
}

pub type Result<T> = std::result::Result<T, ClientError>;

/// Source of task status snapshots
#[async_trait]
pub trait StatusSource: Send + Sync {
    /// Fetch the current status of `task_id`
    async fn fetch_status(&self, task_id: &str) -> Result<ProgressSnapshot>;
}

#[async_trait]
impl StatusSource for ServiceClient {
    async fn fetch_status(&self, task_id: &str) -> Result<ProgressSnapshot> {
        ServiceClient::fetch_status(self, task_id).await
    }
}

/// Replays a fixed sequence of responses, one per fetch.
///
/// Once the script runs out every fetch fails with a transport error, so a
/// tracker fed by an exhausted script keeps polling without new state.
#[derive(Debug, Default)]
pub struct ScriptedSource {
    script: Mutex<VecDeque<Result<ProgressSnapshot>>>,
    calls: AtomicUsize,
}

impl ScriptedSource {
    pub fn new(script: impl IntoIterator<Item = Result<ProgressSnapshot>>) -> Self {
        Self {
            script: Mutex::new(script.into_iter().collect()),
            calls: AtomicUsize::new(0),
        }
    }

    /// Number of fetches issued so far
    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl StatusSource for ScriptedSource {
    async fn fetch_status(&self, task_id: &str) -> Result<ProgressSnapshot> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        let next = self
            .script
            .lock()
            .map_err(|_| ClientError::RequestFailed("script lock poisoned".into()))?
            .pop_front();

        tracing::trace!(task_id, exhausted = next.is_none(), "Scripted status fetch");
        next.unwrap_or_else(|| Err(ClientError::RequestFailed("script exhausted".into())))
    }
}

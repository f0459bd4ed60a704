//! Integration tests against a scripted download service.
//!
//! Each test starts an axum server on an ephemeral port that replays canned
//! `/download-progress/{task_id}` responses and fixed replies for task
//! creation and playlist extraction, then drives the real HTTP client and
//! tracker against it.

use axum::{
    Json, Router,
    extract::{Path, State},
    http::{StatusCode, header},
    response::{IntoResponse, Response},
    routing::{get, post},
};
use serde_json::{Value, json};
use std::collections::VecDeque;
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::net::TcpListener;

use plgrab::client::{ClientError, ServiceClient};
use plgrab::config::ServiceConfig;
use plgrab::humanize::HumanDuration;
use plgrab::models::{VideoRef, VideoStatus};
use plgrab::observability::PollMetrics;
use plgrab::tracker::{ProgressTracker, RecordingObserver, TrackerOutcome};

const POLL_INTERVAL: Duration = Duration::from_millis(20);
const TEST_TIMEOUT: Duration = Duration::from_secs(5);

/// Download service double with a scripted progress feed
struct ScriptedService {
    progress: Mutex<VecDeque<(StatusCode, String)>>,
    polled: Mutex<Vec<String>>,
    submitted: Mutex<Vec<Value>>,
    create_reply: (StatusCode, Value),
    extract_reply: (StatusCode, Value),
}

impl ScriptedService {
    fn new() -> Self {
        Self {
            progress: Mutex::new(VecDeque::new()),
            polled: Mutex::new(Vec::new()),
            submitted: Mutex::new(Vec::new()),
            create_reply: (
                StatusCode::OK,
                json!({"success": true, "task_id": "task-42"}),
            ),
            extract_reply: (
                StatusCode::OK,
                json!({"success": true, "videos": [], "count": 0}),
            ),
        }
    }

    fn with_progress(self, body: Value) -> Self {
        self.with_raw_progress(StatusCode::OK, body.to_string())
    }

    fn with_raw_progress(self, status: StatusCode, body: impl Into<String>) -> Self {
        self.progress.lock().unwrap().push_back((status, body.into()));
        self
    }

    fn with_create_reply(mut self, status: StatusCode, body: Value) -> Self {
        self.create_reply = (status, body);
        self
    }

    fn with_extract_reply(mut self, status: StatusCode, body: Value) -> Self {
        self.extract_reply = (status, body);
        self
    }

    fn polls(&self) -> Vec<String> {
        self.polled.lock().unwrap().clone()
    }

    fn submitted(&self) -> Vec<Value> {
        self.submitted.lock().unwrap().clone()
    }
}

async fn progress(
    State(service): State<Arc<ScriptedService>>,
    Path(task_id): Path<String>,
) -> Response {
    service.polled.lock().unwrap().push(task_id);
    let next = service.progress.lock().unwrap().pop_front();

    match next {
        Some((status, body)) => {
            (status, [(header::CONTENT_TYPE, "application/json")], body).into_response()
        }
        None => (
            StatusCode::NOT_FOUND,
            Json(json!({"error": "Task not found"})),
        )
            .into_response(),
    }
}

async fn create_task(
    State(service): State<Arc<ScriptedService>>,
    Json(body): Json<Value>,
) -> Response {
    service.submitted.lock().unwrap().push(body);
    let (status, reply) = service.create_reply.clone();
    (status, Json(reply)).into_response()
}

async fn extract_playlist(State(service): State<Arc<ScriptedService>>) -> Response {
    let (status, reply) = service.extract_reply.clone();
    (status, Json(reply)).into_response()
}

/// Serve `service` on an ephemeral port and return a client pointed at it
async fn spawn_service(service: ScriptedService) -> (ServiceClient, Arc<ScriptedService>) {
    let service = Arc::new(service);
    let app = Router::new()
        .route("/download-progress/{task_id}", get(progress))
        .route("/api/download", post(create_task))
        .route("/extract-playlist", post(extract_playlist))
        .with_state(Arc::clone(&service));

    let listener = TcpListener::bind("127.0.0.1:0")
        .await
        .expect("Failed to bind test listener");
    let addr = listener.local_addr().expect("Failed to read local addr");

    tokio::spawn(async move {
        axum::serve(listener, app).await.expect("Test server failed");
    });

    let config = ServiceConfig {
        base_url: format!("http://{addr}"),
        request_timeout: Some(HumanDuration::from_secs(2)),
        ..ServiceConfig::default()
    };
    let client = ServiceClient::new(&config).expect("Failed to build client");

    (client, service)
}

fn playlist() -> Vec<VideoRef> {
    vec![
        VideoRef::new("a", "https://www.youtube.com/watch?v=a").with_title("Intro"),
        VideoRef::new("b", "https://www.youtube.com/watch?v=b").with_title("Part 2"),
        VideoRef::new("c", "https://www.youtube.com/watch?v=c").with_title("Outro"),
    ]
}

fn tracker(
    client: ServiceClient,
    observer: Arc<RecordingObserver>,
    metrics: Arc<PollMetrics>,
) -> ProgressTracker {
    ProgressTracker::new(Arc::new(client), observer)
        .with_interval(POLL_INTERVAL)
        .with_metrics(metrics)
}

async fn run_to_end(tracker: ProgressTracker, videos: Vec<VideoRef>) -> TrackerOutcome {
    let handle = tracker.start("task-42", videos);
    tokio::time::timeout(TEST_TIMEOUT, handle.wait())
        .await
        .expect("Tracker did not finish in time")
        .expect("Tracker task panicked")
}

#[tokio::test]
async fn test_tracks_task_until_completed() {
    let service = ScriptedService::new()
        .with_progress(json!({
            "status": "downloading",
            "progress": 10,
            "message": "Downloading Intro...",
            "current_video": "a"
        }))
        .with_progress(json!({
            "status": "downloading",
            "progress": 60,
            "current_video": "b",
            "completed_videos": ["a"]
        }))
        .with_progress(json!({
            "status": "completed",
            "progress": 100,
            "completed_videos": ["a", "b", "c"],
            "failed_videos": []
        }));
    let (client, service) = spawn_service(service).await;
    let observer = Arc::new(RecordingObserver::new());
    let metrics = Arc::new(PollMetrics::new());

    let outcome = run_to_end(
        tracker(client, observer.clone(), metrics.clone()),
        playlist(),
    )
    .await;

    let TrackerOutcome::Completed(summary) = outcome else {
        panic!("expected completion");
    };
    assert_eq!(summary.task_id, "task-42");
    assert_eq!(summary.completed(), 3);
    assert_eq!(summary.failed(), 0);

    // Initial render plus one update per snapshot
    let updates = observer.updates();
    assert_eq!(updates.len(), 4);
    assert_eq!(updates[0].status_line(), "0 of 3 completed");
    assert_eq!(updates[1].status("a"), Some(VideoStatus::Downloading));
    assert_eq!(updates[1].percent(), 10);
    assert_eq!(updates[1].message(), Some("Downloading Intro..."));
    assert_eq!(updates[2].status("a"), Some(VideoStatus::Completed));
    assert_eq!(updates[2].status("b"), Some(VideoStatus::Downloading));
    assert_eq!(updates[2].status("c"), Some(VideoStatus::Pending));
    assert_eq!(updates[3].percent(), 100);
    assert!(
        updates[3]
            .rows()
            .iter()
            .all(|row| row.status == VideoStatus::Completed)
    );

    // No polling after the terminal snapshot
    tokio::time::sleep(POLL_INTERVAL * 5).await;
    let polls = service.polls();
    assert_eq!(polls.len(), 3);
    assert!(polls.iter().all(|id| id == "task-42"));

    let stats = metrics.snapshot();
    assert_eq!(stats.polls_issued, 3);
    assert_eq!(stats.snapshots_applied, 3);
}

#[tokio::test]
async fn test_partial_failure_reports_both_lists() {
    let service = ScriptedService::new().with_progress(json!({
        "status": "completed",
        "progress": 100,
        "completed_videos": ["a", "c"],
        "failed_videos": ["b"]
    }));
    let (client, _service) = spawn_service(service).await;
    let observer = Arc::new(RecordingObserver::new());

    let outcome = run_to_end(
        tracker(client, observer.clone(), Arc::new(PollMetrics::new())),
        playlist(),
    )
    .await;

    let TrackerOutcome::Completed(summary) = outcome else {
        panic!("expected completion");
    };
    assert_eq!(summary.completed_ids, vec!["a", "c"]);
    assert_eq!(summary.failed_ids, vec!["b"]);
    assert_eq!(summary.status_line(), "2 downloaded, 1 failed");

    let last = observer.last_view().expect("at least one update");
    assert_eq!(last.status("b"), Some(VideoStatus::Failed));
    assert_eq!(last.failed_count(), 1);
}

#[tokio::test]
async fn test_service_error_stops_tracking() {
    let service = ScriptedService::new()
        .with_progress(json!({"status": "downloading", "progress": 20, "current_video": "a"}))
        .with_progress(json!({"status": "error", "error": "Disk full"}));
    let (client, service) = spawn_service(service).await;
    let observer = Arc::new(RecordingObserver::new());

    let outcome = run_to_end(
        tracker(client, observer.clone(), Arc::new(PollMetrics::new())),
        playlist(),
    )
    .await;

    assert_eq!(outcome, TrackerOutcome::Failed("Disk full".to_string()));
    assert_eq!(observer.error().as_deref(), Some("Disk full"));
    assert!(observer.completion().is_none());

    // The error snapshot leaves the last rendered view untouched
    let last = observer.last_view().expect("at least one update");
    assert_eq!(last.status("a"), Some(VideoStatus::Downloading));
    assert_eq!(last.percent(), 20);

    tokio::time::sleep(POLL_INTERVAL * 5).await;
    assert_eq!(service.polls().len(), 2);
}

#[tokio::test]
async fn test_bad_ticks_are_skipped() {
    let service = ScriptedService::new()
        .with_raw_progress(StatusCode::INTERNAL_SERVER_ERROR, "upstream exploded")
        .with_raw_progress(StatusCode::OK, "<html>not json</html>")
        .with_raw_progress(StatusCode::OK, r#"{"progress": 50}"#)
        .with_progress(json!({
            "status": "completed",
            "progress": 100,
            "completed_videos": ["a", "b", "c"]
        }));
    let (client, service) = spawn_service(service).await;
    let observer = Arc::new(RecordingObserver::new());
    let metrics = Arc::new(PollMetrics::new());

    let outcome = run_to_end(
        tracker(client, observer.clone(), metrics.clone()),
        playlist(),
    )
    .await;

    assert!(matches!(outcome, TrackerOutcome::Completed(_)));
    assert!(observer.error().is_none());
    // Failed ticks never reach the observer
    assert_eq!(observer.updates().len(), 2);
    assert_eq!(service.polls().len(), 4);

    let stats = metrics.snapshot();
    assert_eq!(stats.transport_failures, 1);
    assert_eq!(stats.malformed_responses, 2);
    assert_eq!(stats.snapshots_applied, 1);
}

#[tokio::test]
async fn test_cancel_stops_polling() {
    // Nothing scripted: every poll answers 404 and the tracker keeps retrying
    let (client, service) = spawn_service(ScriptedService::new()).await;
    let observer = Arc::new(RecordingObserver::new());
    let metrics = Arc::new(PollMetrics::new());

    let handle = tracker(client, observer.clone(), metrics.clone()).start("task-42", playlist());
    tokio::time::sleep(POLL_INTERVAL * 4).await;

    handle.cancel();
    handle.cancel();
    let outcome = tokio::time::timeout(TEST_TIMEOUT, handle.wait())
        .await
        .expect("Tracker did not stop after cancel")
        .expect("Tracker task panicked");
    assert_eq!(outcome, TrackerOutcome::Cancelled);

    let polls_at_cancel = service.polls().len();
    assert!(polls_at_cancel >= 1);
    tokio::time::sleep(POLL_INTERVAL * 5).await;
    assert_eq!(service.polls().len(), polls_at_cancel);

    assert!(observer.completion().is_none());
    assert!(observer.error().is_none());
    assert!(metrics.snapshot().transport_failures >= 1);
}

#[tokio::test]
async fn test_create_task_submits_videos_and_path() {
    let (client, service) = spawn_service(ScriptedService::new()).await;

    let task_id = client
        .create_task(&playlist(), "/srv/media")
        .await
        .expect("task creation should succeed");
    assert_eq!(task_id, "task-42");

    let submitted = service.submitted();
    assert_eq!(submitted.len(), 1);
    assert_eq!(submitted[0]["path"], "/srv/media");
    assert_eq!(submitted[0]["videos"].as_array().map(Vec::len), Some(3));
    assert_eq!(submitted[0]["videos"][1]["id"], "b");
    assert_eq!(submitted[0]["videos"][1]["title"], "Part 2");
}

#[tokio::test]
async fn test_create_task_rejection_carries_service_message() {
    let service = ScriptedService::new().with_create_reply(
        StatusCode::BAD_REQUEST,
        json!({"success": false, "error": "Destination is not writable"}),
    );
    let (client, _service) = spawn_service(service).await;

    let err = client
        .create_task(&playlist(), "/readonly")
        .await
        .expect_err("task creation should be rejected");

    match err {
        ClientError::Rejected { message, .. } => {
            assert_eq!(message, "Destination is not writable")
        }
        other => panic!("unexpected error: {other:?}"),
    }
}

#[tokio::test]
async fn test_extract_playlist_returns_videos() {
    let service = ScriptedService::new().with_extract_reply(
        StatusCode::OK,
        json!({
            "success": true,
            "count": 2,
            "videos": [
                {"id": "x1", "url": "https://www.youtube.com/watch?v=x1", "title": "First"},
                {"id": "x2", "url": "https://www.youtube.com/watch?v=x2", "title": "Second",
                 "thumbnail": "https://i.ytimg.com/vi/x2/default.jpg"}
            ]
        }),
    );
    let (client, _service) = spawn_service(service).await;

    let videos = client
        .extract_playlist("https://www.youtube.com/playlist?list=PL123")
        .await
        .expect("extraction should succeed");

    assert_eq!(videos.len(), 2);
    assert_eq!(videos[0].id, "x1");
    assert_eq!(videos[0].display_title(), "First");
    assert!(videos[1].thumbnail.is_some());
}

#[tokio::test]
async fn test_extract_playlist_requiring_login() {
    let service = ScriptedService::new().with_extract_reply(
        StatusCode::OK,
        json!({
            "success": false,
            "error": "This playlist is private",
            "require_login": true
        }),
    );
    let (client, _service) = spawn_service(service).await;

    let err = client
        .extract_playlist("https://www.youtube.com/playlist?list=PLprivate")
        .await
        .expect_err("extraction should be rejected");

    match err {
        ClientError::Rejected {
            message,
            login_required,
        } => {
            assert_eq!(message, "This playlist is private");
            assert!(login_required);
        }
        other => panic!("unexpected error: {other:?}"),
    }
}

#[tokio::test]
async fn test_extract_empty_playlist_is_rejected() {
    let (client, _service) = spawn_service(ScriptedService::new()).await;

    let err = client
        .extract_playlist("https://www.youtube.com/playlist?list=PLempty")
        .await
        .expect_err("empty playlist should be rejected");

    assert_eq!(err.to_string(), "No videos found in playlist");
}

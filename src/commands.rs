use std::sync::Arc;
use tracing::{info, warn};

use plgrab::client::ServiceClient;
use plgrab::config::Config;
use plgrab::models::VideoRef;
use plgrab::observability::PollMetrics;
use plgrab::render::TerminalRenderer;
use plgrab::tracker::{ProgressTracker, TrackerOutcome};
use plgrab::validation;

use crate::cli::{DownloadArgs, ExtractArgs};

type AnyError = Box<dyn std::error::Error + Send + Sync + 'static>;

pub async fn extract(config: &Config, args: ExtractArgs) -> Result<(), AnyError> {
    let url = validation::validate_playlist_url(&args.url)?;
    let client = ServiceClient::new(&config.service)?;

    info!(url, "Extracting playlist");
    let videos = client.extract_playlist(url).await?;

    println!("{} videos found", videos.len());
    for (index, video) in videos.iter().enumerate() {
        println!("{:>3}. {} ({})", index + 1, video.display_title(), video.id);
        println!("     {}", video.url);
    }

    Ok(())
}

pub async fn download(config: &Config, args: DownloadArgs) -> Result<(), AnyError> {
    let client = ServiceClient::new(&config.service)?;
    let videos = collect_videos(&client, &args).await?;

    let path = args
        .path
        .unwrap_or_else(|| config.download.default_path.clone());
    let path = path.to_string_lossy();

    let task_id = client.create_task(&videos, &path).await?;
    info!(task_id = %task_id, videos = videos.len(), path = %path, "Download started");

    let interval = args.interval.unwrap_or(config.poll.interval);
    let metrics = Arc::new(PollMetrics::new());
    let renderer = Arc::new(TerminalRenderer::new());
    let tracker = ProgressTracker::new(Arc::new(client), renderer.clone())
        .with_interval(interval.as_duration())
        .with_metrics(Arc::clone(&metrics));

    let handle = tracker.start(task_id, videos);

    let token = handle.cancellation_token();
    let watcher = tokio::spawn(async move {
        shutdown_signal().await;
        token.cancel();
    });

    let outcome = handle.wait().await?;
    watcher.abort();

    tracing::debug!(stats = ?metrics.snapshot(), "Polling finished");

    match outcome {
        TrackerOutcome::Completed(summary) => {
            if summary.failed() > 0 {
                warn!(failed = summary.failed(), "Some videos failed to download");
            }
            Ok(())
        }
        TrackerOutcome::Failed(message) => Err(message.into()),
        TrackerOutcome::Cancelled => {
            renderer.cancelled();
            warn!("Stopped tracking; the download continues on the server");
            Ok(())
        }
    }
}

async fn collect_videos(
    client: &ServiceClient,
    args: &DownloadArgs,
) -> Result<Vec<VideoRef>, AnyError> {
    match &args.playlist {
        Some(playlist) => {
            let url = validation::validate_playlist_url(playlist)?;
            let videos = client.extract_playlist(url).await?;
            info!(count = videos.len(), "Found videos in playlist");
            Ok(videos)
        }
        None => Ok(validation::manual_videos(&args.urls)?),
    }
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            warn!(error = %e, "Failed to install Ctrl+C handler");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        use tokio::signal::unix::{SignalKind, signal};
        match signal(SignalKind::terminate()) {
            Ok(mut sigterm) => {
                sigterm.recv().await;
            }
            Err(e) => {
                warn!(error = %e, "Failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }

    info!("Shutdown signal received");
}

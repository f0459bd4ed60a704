//! Terminal presentation of tracker events

use indicatif::{ProgressBar, ProgressStyle};
use std::collections::HashMap;
use std::sync::Mutex;
use std::time::Duration;

use crate::models::VideoStatus;
use crate::tracker::{DownloadSummary, ProgressObserver, ProgressView, VideoRow};

const BAR_TEMPLATE: &str = "{spinner:.green} [{bar:40.cyan/blue}] {pos:>3}% {msg}";

/// Draws an aggregate progress bar and prints one line per video status
/// change.
pub struct TerminalRenderer {
    bar: ProgressBar,
    printed: Mutex<HashMap<String, VideoStatus>>,
}

impl TerminalRenderer {
    pub fn new() -> Self {
        let bar = ProgressBar::new(100);
        if let Ok(style) = ProgressStyle::default_bar().template(BAR_TEMPLATE) {
            bar.set_style(style.progress_chars("#>-"));
        }
        bar.enable_steady_tick(Duration::from_millis(120));
        Self::with_bar(bar)
    }

    /// Renderer whose bar never draws
    pub fn hidden() -> Self {
        Self::with_bar(ProgressBar::hidden())
    }

    fn with_bar(bar: ProgressBar) -> Self {
        Self {
            bar,
            printed: Mutex::new(HashMap::new()),
        }
    }

    /// Lines for rows whose status differs from what was last printed
    fn changed_rows(&self, view: &ProgressView) -> Vec<String> {
        let Ok(mut printed) = self.printed.lock() else {
            return Vec::new();
        };

        let mut lines = Vec::new();
        for row in view.rows() {
            if printed.get(&row.video.id) == Some(&row.status) {
                continue;
            }
            printed.insert(row.video.id.clone(), row.status);
            lines.push(row_line(row));
        }
        lines
    }

    /// Stop the bar when tracking is cancelled before a terminal state
    pub fn cancelled(&self) {
        if !self.bar.is_finished() {
            self.bar.abandon_with_message("Tracking stopped");
        }
    }

    fn print_lines(&self, lines: &[String]) {
        if lines.is_empty() {
            return;
        }
        self.bar.suspend(|| {
            for line in lines {
                println!("{line}");
            }
        });
    }
}

impl Default for TerminalRenderer {
    fn default() -> Self {
        Self::new()
    }
}

impl ProgressObserver for TerminalRenderer {
    fn on_update(&self, view: &ProgressView) {
        self.bar.set_position(u64::from(view.percent()));
        self.bar.set_message(status_message(view));
        self.print_lines(&self.changed_rows(view));
    }

    fn on_complete(&self, summary: &DownloadSummary) {
        self.bar.set_position(100);
        self.bar
            .finish_with_message(format!("Download Complete: {}", summary.status_line()));
        self.print_lines(&summary_lines(summary));
    }

    fn on_error(&self, message: &str) {
        self.bar.abandon_with_message(format!("Download failed: {message}"));
        self.bar.suspend(|| eprintln!("Error: {message}"));
    }
}

fn status_message(view: &ProgressView) -> String {
    match view.message() {
        Some(message) => format!("{} | {}", view.status_line(), message),
        None => view.status_line(),
    }
}

fn row_line(row: &VideoRow) -> String {
    let marker = match row.status {
        VideoStatus::Pending => "…",
        VideoStatus::Downloading => "↓",
        VideoStatus::Completed => "✔",
        VideoStatus::Failed => "✘",
    };
    format!(
        "{marker} [{:<11}] {} ({})",
        row.status.label(),
        row.video.display_title(),
        row.video.id
    )
}

/// One line per task video, then the processed count
fn summary_lines(summary: &DownloadSummary) -> Vec<String> {
    let mut lines = Vec::with_capacity(summary.outcomes.len() + 1);

    for outcome in &summary.outcomes {
        let title = outcome.video.display_title();
        lines.push(match outcome.status {
            VideoStatus::Completed => format!("✔ {title} downloaded successfully"),
            VideoStatus::Failed => format!("✘ {title} failed to download"),
            VideoStatus::Pending | VideoStatus::Downloading => {
                format!("… {title} was not reported by the service")
            }
        });
    }

    let processed = summary
        .outcomes
        .iter()
        .filter(|outcome| outcome.status.is_terminal())
        .count();
    let elapsed = summary.elapsed().num_seconds().max(0);
    lines.push(format!(
        "{} of {} videos processed in {}s",
        processed, summary.total, elapsed
    ));
    lines
}

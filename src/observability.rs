//! Tracing setup and poll counters

use std::sync::atomic::{AtomicU64, Ordering};
use tracing_subscriber::EnvFilter;

const DEFAULT_FILTER: &str = "plgrab=info";

/// Install the global tracing subscriber.
///
/// Logs go to stderr so progress rendering on stdout stays readable.
/// `RUST_LOG` overrides the default filter.
pub fn init_tracing() {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_FILTER));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

/// Counters for one or more progress trackers
#[derive(Debug, Default)]
pub struct PollMetrics {
    polls_issued: AtomicU64,
    snapshots_applied: AtomicU64,
    transport_failures: AtomicU64,
    malformed_responses: AtomicU64,
    discarded_responses: AtomicU64,
}

impl PollMetrics {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn poll_issued(&self) {
        self.polls_issued.fetch_add(1, Ordering::Relaxed);
        tracing::trace!(counter = "polls_issued", "Metric incremented");
    }

    pub fn snapshot_applied(&self) {
        self.snapshots_applied.fetch_add(1, Ordering::Relaxed);
        tracing::trace!(counter = "snapshots_applied", "Metric incremented");
    }

    pub fn transport_failure(&self) {
        self.transport_failures.fetch_add(1, Ordering::Relaxed);
        tracing::debug!(counter = "transport_failures", "Metric incremented");
    }

    pub fn malformed_response(&self) {
        self.malformed_responses.fetch_add(1, Ordering::Relaxed);
        tracing::debug!(counter = "malformed_responses", "Metric incremented");
    }

    pub fn response_discarded(&self) {
        self.discarded_responses.fetch_add(1, Ordering::Relaxed);
        tracing::debug!(counter = "discarded_responses", "Metric incremented");
    }

    pub fn snapshot(&self) -> MetricsSnapshot {
        MetricsSnapshot {
            polls_issued: self.polls_issued.load(Ordering::Relaxed),
            snapshots_applied: self.snapshots_applied.load(Ordering::Relaxed),
            transport_failures: self.transport_failures.load(Ordering::Relaxed),
            malformed_responses: self.malformed_responses.load(Ordering::Relaxed),
            discarded_responses: self.discarded_responses.load(Ordering::Relaxed),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MetricsSnapshot {
    pub polls_issued: u64,
    pub snapshots_applied: u64,
    pub transport_failures: u64,
    pub malformed_responses: u64,
    pub discarded_responses: u64,
}

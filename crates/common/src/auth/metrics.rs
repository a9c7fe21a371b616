//! Pipeline counters
//!
//! Lock-free atomic counters updated on the request path. Read them through
//! [`PipelineMetrics::snapshot`].

use std::sync::atomic::{AtomicU64, Ordering};

use serde::Serialize;

/// Atomic counters for one pipeline
#[derive(Debug, Default)]
pub struct PipelineMetrics {
    /// Transport calls made, first attempts and retries
    dispatched: AtomicU64,
    /// Responses classified as authorization failures
    auth_failures: AtomicU64,
    /// Requests parked behind a refresh cycle (the trigger excluded)
    queued: AtomicU64,
    refresh_started: AtomicU64,
    refresh_failures: AtomicU64,
    /// Replays dispatched after a successful refresh
    retries: AtomicU64,
    /// Calls that ended with `PipelineError::Unauthorized`
    unauthorized: AtomicU64,
    /// Deferred requests dropped by their caller
    cancelled: AtomicU64,
}

/// Point-in-time copy of [`PipelineMetrics`]
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct MetricsSnapshot {
    pub dispatched: u64,
    pub auth_failures: u64,
    pub queued: u64,
    pub refresh_started: u64,
    pub refresh_failures: u64,
    pub retries: u64,
    pub unauthorized: u64,
    pub cancelled: u64,
}

impl PipelineMetrics {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record_dispatch(&self) {
        self.dispatched.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_auth_failure(&self) {
        self.auth_failures.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_queued(&self) {
        self.queued.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_refresh_started(&self) {
        self.refresh_started.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_refresh_failure(&self) {
        self.refresh_failures.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_retry(&self) {
        self.retries.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_unauthorized(&self) {
        self.unauthorized.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_cancelled(&self) {
        self.cancelled.fetch_add(1, Ordering::Relaxed);
    }

    #[must_use]
    pub fn snapshot(&self) -> MetricsSnapshot {
        MetricsSnapshot {
            dispatched: self.dispatched.load(Ordering::Relaxed),
            auth_failures: self.auth_failures.load(Ordering::Relaxed),
            queued: self.queued.load(Ordering::Relaxed),
            refresh_started: self.refresh_started.load(Ordering::Relaxed),
            refresh_failures: self.refresh_failures.load(Ordering::Relaxed),
            retries: self.retries.load(Ordering::Relaxed),
            unauthorized: self.unauthorized.load(Ordering::Relaxed),
            cancelled: self.cancelled.load(Ordering::Relaxed),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_snapshot_reflects_recorded_events() {
        let metrics = PipelineMetrics::new();
        metrics.record_dispatch();
        metrics.record_dispatch();
        metrics.record_auth_failure();
        metrics.record_refresh_started();
        metrics.record_retry();

        let snapshot = metrics.snapshot();
        assert_eq!(snapshot.dispatched, 2);
        assert_eq!(snapshot.auth_failures, 1);
        assert_eq!(snapshot.refresh_started, 1);
        assert_eq!(snapshot.retries, 1);
        assert_eq!(snapshot.unauthorized, 0);
    }

    #[test]
    fn test_snapshot_serializes() {
        let metrics = PipelineMetrics::new();
        metrics.record_cancelled();

        let json = serde_json::to_value(metrics.snapshot()).unwrap();
        assert_eq!(json["cancelled"], 1);
        assert_eq!(json["queued"], 0);
    }
}

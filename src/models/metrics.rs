//! Session metrics and observable state models

use crate::types::{Status, UploadMethod};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Accumulated results of one measurement session.
///
/// Every field starts unset and is written at most once, by the phase that
/// owns it. `None` means the phase produced no usable reading.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Metrics {
    /// Best-case round-trip latency in milliseconds
    pub ping_ms: Option<f64>,

    /// Mean consecutive-difference latency variation in milliseconds
    pub jitter_ms: Option<f64>,

    /// Sustained inbound rate in megabits per second
    pub download_mbps: Option<f64>,

    /// Outbound rate in megabits per second
    pub upload_mbps: Option<f64>,

    /// Whether the upload figure was measured or synthesized
    pub upload_method: Option<UploadMethod>,
}

impl Metrics {
    /// All-unset metrics, the state at session start
    pub fn unset() -> Self {
        Self::default()
    }

    /// Record the probe phase outcome
    pub fn record_latency(&mut self, ping_ms: f64, jitter_ms: f64) {
        self.ping_ms = Some(ping_ms);
        self.jitter_ms = Some(jitter_ms);
    }

    /// Record the download phase outcome
    pub fn record_download(&mut self, mbps: f64) {
        self.download_mbps = Some(mbps);
    }

    /// Record the upload phase outcome and how it was obtained
    pub fn record_upload(&mut self, mbps: f64, method: UploadMethod) {
        self.upload_mbps = Some(mbps);
        self.upload_method = Some(method);
    }

    /// True when every phase produced a value
    pub fn is_complete(&self) -> bool {
        self.ping_ms.is_some()
            && self.jitter_ms.is_some()
            && self.download_mbps.is_some()
            && self.upload_mbps.is_some()
    }

    /// True when the upload figure came from the simulated estimator
    pub fn upload_was_estimated(&self) -> bool {
        matches!(self.upload_method, Some(UploadMethod::Estimated))
    }
}

/// One read-only view of the running session, published on every state
/// change. This is the entire contract the presentation layer consumes.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SessionSnapshot {
    /// Current phase
    pub status: Status,

    /// 0-100 progress, scoped to the current phase
    pub progress_percent: f64,

    /// Instantaneous rate in Mbps; meaningful only during transfer phases
    pub current_rate_mbps: f64,

    /// Results committed so far
    pub metrics: Metrics,
}

impl SessionSnapshot {
    /// Snapshot for a fresh engine that has never run
    pub fn idle() -> Self {
        Self::default()
    }
}

/// Final report handed to the presentation layer after a session completes
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionReport {
    /// Endpoint the session measured against
    pub endpoint: String,

    /// Final metrics
    pub metrics: Metrics,

    /// When the session started
    pub started_at: DateTime<Utc>,

    /// When the session completed
    pub completed_at: DateTime<Utc>,
}

impl SessionReport {
    pub fn new(endpoint: String, metrics: Metrics, started_at: DateTime<Utc>) -> Self {
        Self {
            endpoint,
            metrics,
            started_at,
            completed_at: Utc::now(),
        }
    }

    /// Total wall time of the session in seconds
    pub fn duration_secs(&self) -> f64 {
        (self.completed_at - self.started_at)
            .num_milliseconds()
            .max(0) as f64
            / 1000.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_metrics_start_unset() {
        let metrics = Metrics::unset();
        assert_eq!(metrics.ping_ms, None);
        assert_eq!(metrics.jitter_ms, None);
        assert_eq!(metrics.download_mbps, None);
        assert_eq!(metrics.upload_mbps, None);
        assert!(!metrics.is_complete());
    }

    #[test]
    fn test_metrics_recording() {
        let mut metrics = Metrics::unset();
        metrics.record_latency(19.0, 3.4);
        metrics.record_download(10.0);
        metrics.record_upload(6.0, UploadMethod::Estimated);

        assert_eq!(metrics.ping_ms, Some(19.0));
        assert_eq!(metrics.download_mbps, Some(10.0));
        assert!(metrics.is_complete());
        assert!(metrics.upload_was_estimated());
    }

    #[test]
    fn test_measured_upload_not_estimated() {
        let mut metrics = Metrics::unset();
        metrics.record_upload(42.0, UploadMethod::Measured);
        assert!(!metrics.upload_was_estimated());
    }

    #[test]
    fn test_idle_snapshot() {
        let snapshot = SessionSnapshot::idle();
        assert_eq!(snapshot.status, Status::Idle);
        assert_eq!(snapshot.progress_percent, 0.0);
        assert_eq!(snapshot.current_rate_mbps, 0.0);
        assert_eq!(snapshot.metrics, Metrics::unset());
    }

    #[test]
    fn test_snapshot_serializes() {
        let snapshot = SessionSnapshot::idle();
        let json = serde_json::to_string(&snapshot).unwrap();
        assert!(json.contains("\"status\""));
        assert!(json.contains("\"progress_percent\""));
    }

    #[test]
    fn test_report_duration() {
        let started = Utc::now();
        let report = SessionReport::new("https://example.net".into(), Metrics::unset(), started);
        assert!(report.duration_secs() >= 0.0);
    }
}

//! Type definitions and aliases

use serde::{Deserialize, Serialize};

// Re-export commonly used types
pub use crate::error::{AppError, Result};

/// Phase of a measurement session
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Status {
    /// No session running and none has completed yet
    Idle,
    /// Latency probes in flight
    Probing,
    /// Download sampler running
    Downloading,
    /// Upload sampler running (real or simulated)
    Uploading,
    /// Session finished; metrics are final
    Completed,
}

impl Status {
    /// Get a human-readable name for this phase
    pub fn name(&self) -> &'static str {
        match self {
            Status::Idle => "idle",
            Status::Probing => "ping",
            Status::Downloading => "download",
            Status::Uploading => "upload",
            Status::Completed => "completed",
        }
    }

    /// A new session may only begin from Idle or Completed
    pub fn is_startable(&self) -> bool {
        matches!(self, Status::Idle | Status::Completed)
    }

    /// True for the phases where `current_rate_mbps` is meaningful
    pub fn is_transfer(&self) -> bool {
        matches!(self, Status::Downloading | Status::Uploading)
    }
}

impl Default for Status {
    fn default() -> Self {
        Status::Idle
    }
}

/// How the final upload figure was obtained
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum UploadMethod {
    /// Real blocks were sent and timed
    Measured,
    /// No connectivity for upload; figure synthesized from the download rate
    Estimated,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_startable_states() {
        assert!(Status::Idle.is_startable());
        assert!(Status::Completed.is_startable());
        assert!(!Status::Probing.is_startable());
        assert!(!Status::Downloading.is_startable());
        assert!(!Status::Uploading.is_startable());
    }

    #[test]
    fn test_transfer_states() {
        assert!(Status::Downloading.is_transfer());
        assert!(Status::Uploading.is_transfer());
        assert!(!Status::Probing.is_transfer());
        assert!(!Status::Completed.is_transfer());
    }

    #[test]
    fn test_phase_names() {
        assert_eq!(Status::Idle.name(), "idle");
        assert_eq!(Status::Probing.name(), "ping");
        assert_eq!(Status::Completed.name(), "completed");
    }
}

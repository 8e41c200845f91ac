//! speedview
//!
//! A network path measurement engine estimating round-trip latency,
//! latency variance, download throughput and upload throughput against a
//! single remote endpoint, with live progress published to observers and
//! cancellable sessions.

pub mod cli;
pub mod client;
pub mod config;
pub mod engine;
pub mod error;
pub mod logging;
pub mod models;
pub mod output;
pub mod stats;
pub mod types;

// Re-export commonly used types
pub use client::{HttpTransport, Transport};
pub use engine::{Engine, EngineSettings};
pub use error::{AppError, Result};
pub use models::{Metrics, SessionReport, SessionSnapshot};
pub use types::{Status, UploadMethod};

/// Application version information
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
pub const PKG_NAME: &str = env!("CARGO_PKG_NAME");

/// Default configuration values
pub mod defaults {
    use std::time::Duration;

    /// Public measurement endpoint used when none is configured
    pub const DEFAULT_ENDPOINT: &str = "https://speed.cloudflare.com";

    /// Fixed time budget for each transfer phase
    pub const PHASE_WINDOW: Duration = Duration::from_millis(10_000);

    /// Initial slice of a window excluded from rate computation
    pub const RATE_WARMUP: Duration = Duration::from_millis(200);

    /// Latency probes issued per session
    pub const PROBE_COUNT: u32 = 8;

    /// Readings at or below this many milliseconds are local-cache noise
    pub const PROBE_FLOOR_MS: f64 = 0.5;

    /// Requested size of each chained download payload; large enough that
    /// a typical link cannot finish one inside the window
    pub const DOWNLOAD_PAYLOAD_BYTES: u64 = 50_000_000;

    /// Upload block size
    pub const UPLOAD_BLOCK_BYTES: usize = 2 * 1024 * 1024;

    /// Simulated estimator tick interval
    pub const ESTIMATOR_TICK: Duration = Duration::from_millis(50);

    /// Estimator anchor when the download produced no rate
    pub const ESTIMATOR_DEFAULT_MBPS: f64 = 30.0;

    /// Estimator anchor as a fraction of the download rate
    pub const ESTIMATOR_DOWNLOAD_RATIO: f64 = 0.6;

    /// Ramp gain of the synthetic rate curve
    pub const ESTIMATOR_RAMP_GAIN: f64 = 1.5;

    /// Half-width of the estimator's symmetric noise band
    pub const ESTIMATOR_NOISE_MBPS: f64 = 5.0;

    pub const DEFAULT_ENABLE_COLOR: bool = true;
}

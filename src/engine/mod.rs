//! Measurement engine: phase state machine and session orchestration
//!
//! The engine owns all mutable session state. Observers get read-only
//! [`SessionSnapshot`] values over a watch channel; the only command the
//! outside world can issue is [`Engine::start`] (plus [`Engine::cancel`]).
//! Phases run strictly in order (ping, download, upload) and never overlap,
//! so no two writers ever touch the shared state concurrently.

pub mod download;
pub mod prober;
pub mod upload;

use crate::{
    client::Transport,
    logging::Logger,
    models::{Metrics, SessionSnapshot},
    types::Status,
};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::sync::watch;
use tokio_util::sync::CancellationToken;

/// Tuning values for the engine. These are compile-time defaults, not
/// runtime inputs; tests shrink them to keep scenarios fast.
#[derive(Debug, Clone)]
pub struct EngineSettings {
    /// Fixed time budget for the download and upload phases
    pub phase_window: Duration,
    /// Initial slice of a window excluded from rate computation
    pub warmup: Duration,
    /// Number of latency probes per session
    pub probe_count: u32,
    /// Readings at or below this many milliseconds are cache artifacts
    pub probe_floor_ms: f64,
    /// Requested size of each chained download payload
    pub download_payload_bytes: u64,
    /// Size of the reusable upload block
    pub upload_block_bytes: usize,
    /// Tick interval of the simulated upload estimator
    pub estimator_tick: Duration,
    /// Estimator anchor when no download rate is available
    pub estimator_default_mbps: f64,
    /// Estimator anchor as a fraction of the download rate
    pub estimator_download_ratio: f64,
    /// Ramp gain so the synthetic curve rises faster than linearly
    pub estimator_ramp_gain: f64,
    /// Half-width of the symmetric estimator noise band
    pub estimator_noise_mbps: f64,
}

impl Default for EngineSettings {
    fn default() -> Self {
        use crate::defaults;
        Self {
            phase_window: defaults::PHASE_WINDOW,
            warmup: defaults::RATE_WARMUP,
            probe_count: defaults::PROBE_COUNT,
            probe_floor_ms: defaults::PROBE_FLOOR_MS,
            download_payload_bytes: defaults::DOWNLOAD_PAYLOAD_BYTES,
            upload_block_bytes: defaults::UPLOAD_BLOCK_BYTES,
            estimator_tick: defaults::ESTIMATOR_TICK,
            estimator_default_mbps: defaults::ESTIMATOR_DEFAULT_MBPS,
            estimator_download_ratio: defaults::ESTIMATOR_DOWNLOAD_RATIO,
            estimator_ramp_gain: defaults::ESTIMATOR_RAMP_GAIN,
            estimator_noise_mbps: defaults::ESTIMATOR_NOISE_MBPS,
        }
    }
}

/// Single writer handle over the observable session state.
///
/// Whichever phase is currently running holds the only write path, which
/// keeps the "one writer per phase" rule an API property instead of a
/// convention.
pub(crate) struct StatePublisher {
    tx: watch::Sender<SessionSnapshot>,
}

impl StatePublisher {
    fn new() -> Self {
        let (tx, _) = watch::channel(SessionSnapshot::idle());
        Self { tx }
    }

    fn subscribe(&self) -> watch::Receiver<SessionSnapshot> {
        self.tx.subscribe()
    }

    pub(crate) fn snapshot(&self) -> SessionSnapshot {
        self.tx.borrow().clone()
    }

    /// Reset everything for a fresh session and move straight to Probing
    /// so a racing start command observes a non-startable status.
    fn begin_session(&self) {
        self.tx.send_modify(|s| {
            s.status = Status::Probing;
            s.progress_percent = 0.0;
            s.current_rate_mbps = 0.0;
            s.metrics = Metrics::unset();
        });
    }

    /// Enter a phase, zeroing the per-phase rate and progress
    pub(crate) fn enter_phase(&self, status: Status) {
        self.tx.send_modify(|s| {
            s.status = status;
            s.progress_percent = 0.0;
            s.current_rate_mbps = 0.0;
        });
    }

    pub(crate) fn set_progress(&self, percent: f64) {
        self.tx.send_modify(|s| s.progress_percent = percent);
    }

    pub(crate) fn set_rate(&self, mbps: f64) {
        self.tx.send_modify(|s| s.current_rate_mbps = mbps);
    }

    pub(crate) fn update_metrics<F: FnOnce(&mut Metrics)>(&self, apply: F) {
        self.tx.send_modify(|s| apply(&mut s.metrics));
    }

    fn finalize(&self) {
        self.tx.send_modify(|s| {
            s.status = Status::Completed;
            s.progress_percent = 100.0;
            s.current_rate_mbps = 0.0;
        });
    }
}

/// Everything a phase needs, passed explicitly instead of living in
/// ambient mutable state.
pub(crate) struct PhaseContext<'a> {
    pub transport: &'a dyn Transport,
    pub publisher: &'a StatePublisher,
    pub token: &'a CancellationToken,
    pub settings: &'a EngineSettings,
    pub logger: &'a Logger,
}

/// The measurement engine. One instance manages at most one session at a
/// time; a session runs ping, download and upload phases sequentially and
/// always finishes in `Completed` with best-effort metrics.
pub struct Engine {
    transport: Arc<dyn Transport>,
    settings: EngineSettings,
    logger: Logger,
    publisher: StatePublisher,
    session: Mutex<CancellationToken>,
}

impl Engine {
    /// Create an engine with default settings and a quiet logger
    pub fn new(transport: Arc<dyn Transport>) -> Self {
        Self::with_settings(transport, EngineSettings::default(), Logger::quiet())
    }

    /// Create an engine with explicit settings and logger
    pub fn with_settings(
        transport: Arc<dyn Transport>,
        settings: EngineSettings,
        logger: Logger,
    ) -> Self {
        Self {
            transport,
            settings,
            logger,
            publisher: StatePublisher::new(),
            session: Mutex::new(CancellationToken::new()),
        }
    }

    /// Subscribe to session state changes
    pub fn subscribe(&self) -> watch::Receiver<SessionSnapshot> {
        self.publisher.subscribe()
    }

    /// Current state, for one-shot reads
    pub fn snapshot(&self) -> SessionSnapshot {
        self.publisher.snapshot()
    }

    /// Cancel the running session, if any. Committed per-phase metrics
    /// are left intact; samplers exit at their next suspension point.
    pub fn cancel(&self) {
        self.logger.info("engine", "cancellation requested");
        self.session.lock().expect("session lock poisoned").cancel();
    }

    /// Run one full measurement session.
    ///
    /// A no-op returning `false` unless the engine is Idle or Completed.
    /// Otherwise resets all shared state, replaces (and thereby
    /// invalidates) any prior cancellation token, runs the three phases
    /// strictly in order and finishes in `Completed`, returning `true`.
    pub async fn start(&self) -> bool {
        let token = {
            let mut session = self.session.lock().expect("session lock poisoned");
            if !self.publisher.snapshot().status.is_startable() {
                self.logger.debug("engine", "start ignored: session already running");
                return false;
            }
            session.cancel();
            let token = CancellationToken::new();
            *session = token.clone();
            self.publisher.begin_session();
            token
        };

        self.logger.info("engine", "session started");
        let ctx = PhaseContext {
            transport: self.transport.as_ref(),
            publisher: &self.publisher,
            token: &token,
            settings: &self.settings,
            logger: &self.logger,
        };

        prober::run(&ctx).await;
        let download_mbps = download::run(&ctx).await;
        upload::run(&ctx, download_mbps).await;

        self.publisher.finalize();
        self.logger.info("engine", "session completed");
        true
    }
}

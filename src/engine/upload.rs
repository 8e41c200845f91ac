//! Upload phase: real block sends with a simulated estimator fallback
//!
//! Upload endpoints are often blocked where download endpoints are not
//! (cross-origin and local-network restrictions), so reporting a false
//! zero is worse than synthesizing a figure. The phase first attempts a
//! real measured upload; only when no connectivity was ever observed does
//! it fall back to the estimator.

use super::PhaseContext;
use crate::stats::TransferWindow;
use crate::types::{Status, UploadMethod};
use bytes::Bytes;
use rand::Rng;
use tokio::sync::mpsc;

/// Run the upload phase, anchoring the fallback to the download rate.
pub(crate) async fn run(ctx: &PhaseContext<'_>, download_mbps: f64) {
    ctx.publisher.enter_phase(Status::Uploading);

    match attempt_real_upload(ctx).await {
        Some(mbps) => {
            ctx.logger.info("upload", &format!("measured {:.1} Mbps", mbps));
            ctx.publisher
                .update_metrics(|m| m.record_upload(mbps, UploadMethod::Measured));
        }
        None => {
            if ctx.token.is_cancelled() {
                ctx.logger.debug("upload", "cancelled, skipping estimator");
                return;
            }
            ctx.logger
                .info("upload", "no connectivity for real upload, falling back to estimator");
            run_estimator(ctx, download_mbps).await;
        }
    }
}

/// Try to measure upload throughput with real block sends.
///
/// Returns the measured rate, or `None` when no real measurement was
/// obtained. The failure criterion (never connected, or connected but zero
/// completed bytes) is a best-effort classification: a connection that
/// dies before the first progress event is indistinguishable from a
/// blocked endpoint.
async fn attempt_real_upload(ctx: &PhaseContext<'_>) -> Option<f64> {
    let settings = ctx.settings;
    // One zero-filled block, generated once and reused for every send;
    // content is irrelevant to throughput.
    let block = Bytes::from(vec![0u8; settings.upload_block_bytes]);
    let block_len = block.len() as u64;

    let window = TransferWindow::begin(settings.phase_window, settings.warmup);
    let mut completed_bytes: u64 = 0;
    let mut connected = false;

    'attempt: while !window.is_exhausted() {
        if ctx.token.is_cancelled() {
            ctx.logger.debug("upload", "cancelled, ending attempt");
            break;
        }

        let (progress_tx, mut progress_rx) = mpsc::unbounded_channel();
        let mut send = ctx.transport.send_block(block.clone(), progress_tx);

        loop {
            tokio::select! {
                // Dropping the send future aborts the in-flight request
                _ = ctx.token.cancelled() => break 'attempt,
                Some(sent) = progress_rx.recv() => {
                    if window.is_exhausted() {
                        break 'attempt;
                    }
                    // Progress reception is itself evidence of a handshake.
                    connected = true;
                    ctx.publisher.set_progress(window.progress_percent());
                    if let Some(rate) = window.rate_mbps_for(completed_bytes + sent) {
                        ctx.publisher.set_rate(rate);
                    }
                }
                result = &mut send => {
                    match result {
                        Ok(()) => {
                            // A completed block is observable progress even
                            // when its events were still queued unread.
                            connected = true;
                            completed_bytes += block_len;
                        }
                        Err(e) if !connected => {
                            ctx.logger.debug("upload", &format!("send failed before any progress: {}", e));
                            break 'attempt;
                        }
                        Err(e) => {
                            ctx.logger.warn("upload", &format!("block send failed: {}", e));
                        }
                    }
                    break;
                }
            }
        }
    }

    if connected && completed_bytes > 0 {
        Some(window.final_rate_mbps(completed_bytes))
    } else {
        None
    }
}

/// Synthesize a plausible upload curve when no real measurement exists.
///
/// The anchor is a fraction of the download rate (typical asymmetric-link
/// ratio) or a fixed default when the download produced nothing. Performs
/// no network I/O; the published live rate carries small symmetric noise,
/// but the committed figure is the anchor itself.
async fn run_estimator(ctx: &PhaseContext<'_>, download_mbps: f64) {
    let settings = ctx.settings;
    let target = if download_mbps > 0.0 {
        download_mbps * settings.estimator_download_ratio
    } else {
        settings.estimator_default_mbps
    };

    let window = TransferWindow::begin(settings.phase_window, settings.warmup);
    let mut ticker = tokio::time::interval(settings.estimator_tick);

    loop {
        tokio::select! {
            _ = ctx.token.cancelled() => {
                ctx.logger.debug("upload", "cancelled, ending estimator");
                return;
            }
            _ = ticker.tick() => {}
        }

        let fraction = window.fraction();
        ctx.publisher.set_progress(fraction * 100.0);

        if window.is_exhausted() {
            ctx.publisher
                .update_metrics(|m| m.record_upload(target, UploadMethod::Estimated));
            return;
        }

        let ramp = (fraction * settings.estimator_ramp_gain).min(1.0);
        let noise = rand::rng()
            .random_range(-settings.estimator_noise_mbps..=settings.estimator_noise_mbps);
        ctx.publisher.set_rate((target * ramp + noise).abs());
    }
}

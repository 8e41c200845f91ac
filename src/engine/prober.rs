//! Latency probe phase: round-trip timing, ping and jitter derivation

use super::PhaseContext;
use crate::stats::LatencySamples;
use crate::types::Status;
use tokio::time::Instant;

/// Run the probe phase: a fixed number of sequential minimal round trips.
///
/// Individual probe failures are logged and skipped. With no surviving
/// readings, ping and jitter stay unset and the session still advances.
pub(crate) async fn run(ctx: &PhaseContext<'_>) {
    ctx.publisher.enter_phase(Status::Probing);

    let count = ctx.settings.probe_count;
    let mut samples = LatencySamples::new(ctx.settings.probe_floor_ms);

    for i in 0..count {
        if ctx.token.is_cancelled() {
            ctx.logger.debug("prober", "cancelled, ending probe loop");
            break;
        }

        let issued = Instant::now();
        let outcome = tokio::select! {
            _ = ctx.token.cancelled() => None,
            result = ctx.transport.probe() => Some(result),
        };

        match outcome {
            // Cancellation aborted the in-flight probe
            None => break,
            Some(Ok(())) => {
                let reading_ms = issued.elapsed().as_secs_f64() * 1000.0;
                if !samples.record(reading_ms) {
                    ctx.logger.debug(
                        "prober",
                        &format!("probe {}/{} read {:.3} ms, discarded as cache artifact", i + 1, count, reading_ms),
                    );
                }
            }
            Some(Err(e)) => {
                ctx.logger.warn("prober", &format!("probe {}/{} failed: {}", i + 1, count, e));
            }
        }

        ctx.publisher
            .set_progress((i + 1) as f64 / count as f64 * 100.0);
    }

    if let (Some(ping_ms), Some(jitter_ms)) = (samples.min_ms(), samples.jitter_ms()) {
        ctx.logger.info(
            "prober",
            &format!("{} readings kept: ping {:.1} ms, jitter {:.1} ms", samples.len(), ping_ms, jitter_ms),
        );
        ctx.publisher
            .update_metrics(|m| m.record_latency(ping_ms, jitter_ms));
    } else {
        ctx.logger.warn("prober", "no usable readings, latency metrics stay unset");
    }
}

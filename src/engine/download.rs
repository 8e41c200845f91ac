//! Download phase: time-boxed streamed sampling with transfer chaining

use super::PhaseContext;
use crate::stats::TransferWindow;
use crate::types::Status;
use futures::StreamExt;

/// Run the download phase and return the final rate in Mbps (0.0 when no
/// rate was ever computed).
///
/// Transfers are chained: when a payload ends before the window closes, a
/// new transfer is opened into the same byte accumulator. The chain is an
/// explicit loop, not recursion, so slow paths with many small completions
/// cannot grow the stack.
pub(crate) async fn run(ctx: &PhaseContext<'_>) -> f64 {
    ctx.publisher.enter_phase(Status::Downloading);

    let settings = ctx.settings;
    let mut window = TransferWindow::begin(settings.phase_window, settings.warmup);
    let mut last_rate: Option<f64> = None;

    'window: while !window.is_exhausted() {
        if ctx.token.is_cancelled() {
            ctx.logger.debug("download", "cancelled, ending phase");
            break;
        }

        let open = tokio::select! {
            _ = ctx.token.cancelled() => break 'window,
            opened = ctx.transport.open_download(settings.download_payload_bytes) => opened,
        };
        let mut stream = match open {
            Ok(stream) => stream,
            Err(e) => {
                if !e.is_cancellation() {
                    ctx.logger.warn("download", &format!("transfer failed to open: {}", e));
                }
                break;
            }
        };

        loop {
            let chunk = tokio::select! {
                // Dropping the stream aborts the in-flight transfer
                _ = ctx.token.cancelled() => break 'window,
                chunk = stream.next() => chunk,
            };

            match chunk {
                None => {
                    ctx.logger.debug("download", "payload exhausted, chaining next transfer");
                    break;
                }
                Some(Ok(bytes)) => {
                    window.add_bytes(bytes.len() as u64);
                    ctx.publisher.set_progress(window.progress_percent());
                    if let Some(rate) = window.rate_mbps() {
                        ctx.publisher.set_rate(rate);
                        last_rate = Some(rate);
                    }
                    if window.is_exhausted() {
                        break 'window;
                    }
                }
                Some(Err(e)) => {
                    if !e.is_cancellation() {
                        ctx.logger.warn("download", &format!("stream error: {}", e));
                    }
                    break 'window;
                }
            }
        }
    }

    let final_rate = last_rate.unwrap_or(0.0);
    ctx.logger.info(
        "download",
        &format!("{} bytes in {:.1}s, final rate {:.1} Mbps", window.total_bytes(), window.elapsed().as_secs_f64(), final_rate),
    );
    ctx.publisher.update_metrics(|m| m.record_download(final_rate));
    final_rate
}

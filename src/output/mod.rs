//! Output formatting for reports and live progress
//!
//! The engine publishes state; everything here is presentation. Formatters
//! never write engine state.

use crate::models::{SessionReport, SessionSnapshot};
use crate::types::Status;
use colored::Colorize;

/// Final-report formatting interface
pub trait ReportFormatter {
    /// Format a section header
    fn format_header(&self, title: &str) -> String;

    /// Format the final session report
    fn format_report(&self, report: &SessionReport) -> String;

    /// Format a warning line
    fn format_warning(&self, warning: &str) -> String;
}

/// Display an optional metric rounded to whole units, "--" when unset
fn metric_cell(value: Option<f64>) -> String {
    match value {
        Some(v) => format!("{:.0}", v),
        None => "--".to_string(),
    }
}

/// Plain text formatter for scripts and logs
pub struct PlainFormatter;

impl ReportFormatter for PlainFormatter {
    fn format_header(&self, title: &str) -> String {
        format!("=== {} ===", title)
    }

    fn format_report(&self, report: &SessionReport) -> String {
        let metrics = &report.metrics;
        let upload_note = if metrics.upload_was_estimated() {
            " (estimated)"
        } else {
            ""
        };
        format!(
            "{}\nEndpoint: {}\nPing:     {} ms\nJitter:   {} ms\nDownload: {} Mbps\nUpload:   {} Mbps{}\nDuration: {:.1}s",
            self.format_header("Results"),
            report.endpoint,
            metric_cell(metrics.ping_ms),
            metric_cell(metrics.jitter_ms),
            metric_cell(metrics.download_mbps),
            metric_cell(metrics.upload_mbps),
            upload_note,
            report.duration_secs(),
        )
    }

    fn format_warning(&self, warning: &str) -> String {
        format!("warning: {}", warning)
    }
}

/// Colored formatter for interactive terminals
pub struct ColoredFormatter;

impl ReportFormatter for ColoredFormatter {
    fn format_header(&self, title: &str) -> String {
        format!("{}", format!("=== {} ===", title).bold())
    }

    fn format_report(&self, report: &SessionReport) -> String {
        let metrics = &report.metrics;
        let upload_note = if metrics.upload_was_estimated() {
            " (estimated)".dimmed().to_string()
        } else {
            String::new()
        };
        format!(
            "{}\n{} {}\n{} {} ms\n{} {} ms\n{} {} Mbps\n{} {} Mbps{}\n{} {:.1}s",
            self.format_header("Results"),
            "Endpoint:".dimmed(),
            report.endpoint,
            "Ping:    ".dimmed(),
            metric_cell(metrics.ping_ms).green().bold(),
            "Jitter:  ".dimmed(),
            metric_cell(metrics.jitter_ms).green(),
            "Download:".dimmed(),
            metric_cell(metrics.download_mbps).blue().bold(),
            "Upload:  ".dimmed(),
            metric_cell(metrics.upload_mbps).magenta().bold(),
            upload_note,
            "Duration:".dimmed(),
            report.duration_secs(),
        )
    }

    fn format_warning(&self, warning: &str) -> String {
        format!("{} {}", "warning:".yellow().bold(), warning)
    }
}

/// Create a formatter matching the color preference
pub fn create_formatter(enable_color: bool) -> Box<dyn ReportFormatter> {
    if enable_color {
        Box::new(ColoredFormatter)
    } else {
        Box::new(PlainFormatter)
    }
}

/// Render one live progress line from a snapshot
pub fn render_progress_line(snapshot: &SessionSnapshot, use_color: bool) -> String {
    let phase = snapshot.status.name();
    let line = if snapshot.status.is_transfer() {
        format!(
            "[{:>9}] {:5.1}%  {:7.1} Mbps",
            phase, snapshot.progress_percent, snapshot.current_rate_mbps
        )
    } else {
        format!("[{:>9}] {:5.1}%", phase, snapshot.progress_percent)
    };
    if use_color && snapshot.status == Status::Uploading {
        line.magenta().to_string()
    } else if use_color {
        line.blue().to_string()
    } else {
        line
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Metrics;
    use crate::types::UploadMethod;
    use chrono::Utc;

    fn sample_report(estimated: bool) -> SessionReport {
        let mut metrics = Metrics::unset();
        metrics.record_latency(19.0, 3.4);
        metrics.record_download(10.0);
        let method = if estimated {
            UploadMethod::Estimated
        } else {
            UploadMethod::Measured
        };
        metrics.record_upload(6.0, method);
        SessionReport::new("https://speed.example.net".into(), metrics, Utc::now())
    }

    #[test]
    fn test_plain_report_rounds_to_whole_units() {
        let text = PlainFormatter.format_report(&sample_report(false));
        assert!(text.contains("Ping:     19 ms"));
        assert!(text.contains("Jitter:   3 ms"));
        assert!(text.contains("Download: 10 Mbps"));
        assert!(text.contains("Upload:   6 Mbps"));
        assert!(!text.contains("estimated"));
    }

    #[test]
    fn test_estimated_upload_is_marked() {
        let text = PlainFormatter.format_report(&sample_report(true));
        assert!(text.contains("(estimated)"));
    }

    #[test]
    fn test_unset_metrics_render_as_dashes() {
        let report = SessionReport::new("https://x.example".into(), Metrics::unset(), Utc::now());
        let text = PlainFormatter.format_report(&report);
        assert!(text.contains("Ping:     -- ms"));
        assert!(text.contains("Upload:   -- Mbps"));
    }

    #[test]
    fn test_progress_line_shows_rate_only_in_transfer_phases() {
        let mut snapshot = SessionSnapshot::idle();
        snapshot.status = Status::Probing;
        snapshot.progress_percent = 37.5;
        assert!(!render_progress_line(&snapshot, false).contains("Mbps"));

        snapshot.status = Status::Downloading;
        snapshot.current_rate_mbps = 93.4;
        let line = render_progress_line(&snapshot, false);
        assert!(line.contains("Mbps"));
        assert!(line.contains("download"));
    }

    #[test]
    fn test_formatter_factory() {
        // Both implementations must produce the same information
        let report = sample_report(false);
        for enable_color in [true, false] {
            let formatter = create_formatter(enable_color);
            let text = formatter.format_report(&report);
            assert!(text.contains("19"));
            assert!(text.contains("10"));
        }
    }
}

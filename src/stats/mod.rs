//! Measurement accounting: latency sample sets and transfer windows
//!
//! Timekeeping is on `tokio::time::Instant` so the whole engine can run
//! under a paused test clock.

use std::time::Duration;
use tokio::time::Instant;

/// Jitter value reported when only one reading survived filtering.
/// This is a documented "insufficient data" sentinel, not a measurement.
pub const INSUFFICIENT_JITTER_MS: f64 = 1.0;

/// Convert a byte total over an elapsed duration to megabits per second.
pub fn mbps(bytes: u64, elapsed: Duration) -> f64 {
    let secs = elapsed.as_secs_f64();
    if secs <= 0.0 {
        return 0.0;
    }
    (bytes as f64 * 8.0) / secs / 1_000_000.0
}

/// Ordered round-trip readings collected by the prober.
///
/// Readings below the realism threshold are discarded on entry as
/// local-cache artifacts and never participate in ping or jitter.
#[derive(Debug, Clone)]
pub struct LatencySamples {
    threshold_ms: f64,
    kept: Vec<f64>,
}

impl LatencySamples {
    /// Create an empty sample set with the given sub-threshold filter
    pub fn new(threshold_ms: f64) -> Self {
        Self {
            threshold_ms,
            kept: Vec::new(),
        }
    }

    /// Record one reading. Returns false when the reading was discarded
    /// as sub-threshold noise.
    pub fn record(&mut self, reading_ms: f64) -> bool {
        if reading_ms > self.threshold_ms {
            self.kept.push(reading_ms);
            true
        } else {
            false
        }
    }

    pub fn len(&self) -> usize {
        self.kept.len()
    }

    pub fn is_empty(&self) -> bool {
        self.kept.is_empty()
    }

    /// Best-case path latency: the minimum surviving reading.
    /// Transient congestion spikes are thereby excluded from the headline
    /// value.
    pub fn min_ms(&self) -> Option<f64> {
        self.kept.iter().cloned().fold(None, |acc, r| match acc {
            None => Some(r),
            Some(m) => Some(m.min(r)),
        })
    }

    /// Mean absolute difference between consecutive readings in
    /// measurement order. Deliberately not a sorted or windowed jitter.
    ///
    /// Returns `None` with no surviving readings and
    /// [`INSUFFICIENT_JITTER_MS`] with exactly one.
    pub fn jitter_ms(&self) -> Option<f64> {
        match self.kept.len() {
            0 => None,
            1 => Some(INSUFFICIENT_JITTER_MS),
            n => {
                let sum: f64 = self
                    .kept
                    .windows(2)
                    .map(|pair| (pair[0] - pair[1]).abs())
                    .sum();
                Some(sum / (n as f64 - 1.0))
            }
        }
    }
}

/// Time-boxed byte accounting for one sampler phase.
///
/// Owns the phase start timestamp, the fixed budget, and the running byte
/// total. The byte total only grows; rate readings are gated behind the
/// warm-up period to avoid connection-setup skew.
#[derive(Debug, Clone)]
pub struct TransferWindow {
    started: Instant,
    budget: Duration,
    warmup: Duration,
    total_bytes: u64,
}

impl TransferWindow {
    /// Open a window starting now
    pub fn begin(budget: Duration, warmup: Duration) -> Self {
        Self {
            started: Instant::now(),
            budget,
            warmup,
            total_bytes: 0,
        }
    }

    pub fn elapsed(&self) -> Duration {
        self.started.elapsed()
    }

    /// True once the budget is spent; the current transfer should be
    /// aborted and the phase closed out.
    pub fn is_exhausted(&self) -> bool {
        self.elapsed() >= self.budget
    }

    /// Fraction of the budget consumed, clamped to 1.0
    pub fn fraction(&self) -> f64 {
        let f = self.elapsed().as_secs_f64() / self.budget.as_secs_f64();
        f.min(1.0)
    }

    /// Phase progress as 0-100
    pub fn progress_percent(&self) -> f64 {
        self.fraction() * 100.0
    }

    pub fn add_bytes(&mut self, n: u64) {
        self.total_bytes += n;
    }

    pub fn total_bytes(&self) -> u64 {
        self.total_bytes
    }

    /// Rate over the accumulated total, or `None` inside the warm-up
    pub fn rate_mbps(&self) -> Option<f64> {
        self.rate_mbps_for(self.total_bytes)
    }

    /// Rate over an arbitrary byte count (used when in-flight bytes are
    /// counted on top of completed ones), gated by the same warm-up.
    pub fn rate_mbps_for(&self, bytes: u64) -> Option<f64> {
        let elapsed = self.elapsed();
        if elapsed <= self.warmup {
            return None;
        }
        Some(mbps(bytes, elapsed))
    }

    /// Final rate over the actual elapsed time, ignoring the warm-up gate
    pub fn final_rate_mbps(&self, bytes: u64) -> f64 {
        mbps(bytes, self.elapsed())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_mbps_formula() {
        // 12,500,000 bytes over 10s is exactly 10 Mbps
        assert_eq!(mbps(12_500_000, Duration::from_secs(10)), 10.0);
        assert_eq!(mbps(1_000_000, Duration::from_secs(1)), 8.0);
        assert_eq!(mbps(0, Duration::from_secs(1)), 0.0);
        assert_eq!(mbps(1_000_000, Duration::ZERO), 0.0);
    }

    #[test]
    fn test_sub_threshold_readings_discarded() {
        let mut samples = LatencySamples::new(0.5);
        assert!(!samples.record(0.1));
        assert!(!samples.record(0.5));
        assert!(samples.record(0.6));
        assert_eq!(samples.len(), 1);
    }

    #[test]
    fn test_ping_is_minimum() {
        let mut samples = LatencySamples::new(0.5);
        for r in [20.0, 22.0, 19.0, 25.0, 21.0, 23.0, 20.0, 24.0] {
            samples.record(r);
        }
        assert_eq!(samples.min_ms(), Some(19.0));
    }

    #[test]
    fn test_jitter_consecutive_differences() {
        let mut samples = LatencySamples::new(0.5);
        for r in [20.0, 22.0, 19.0, 25.0, 21.0, 23.0, 20.0, 24.0] {
            samples.record(r);
        }
        // |20-22| + |22-19| + |19-25| + |25-21| + |21-23| + |23-20| + |20-24|
        let expected = (2.0 + 3.0 + 6.0 + 4.0 + 2.0 + 3.0 + 4.0) / 7.0;
        let jitter = samples.jitter_ms().unwrap();
        assert!((jitter - expected).abs() < 1e-9);
        assert_eq!(jitter.round() as i64, 3);
    }

    #[test]
    fn test_jitter_insufficient_data_sentinel() {
        let mut samples = LatencySamples::new(0.5);
        assert_eq!(samples.jitter_ms(), None);
        samples.record(12.0);
        assert_eq!(samples.jitter_ms(), Some(INSUFFICIENT_JITTER_MS));
    }

    #[test]
    fn test_empty_set_leaves_metrics_unset() {
        let samples = LatencySamples::new(0.5);
        assert_eq!(samples.min_ms(), None);
        assert_eq!(samples.jitter_ms(), None);
    }

    #[tokio::test(start_paused = true)]
    async fn test_window_exhaustion_and_progress() {
        let mut window = TransferWindow::begin(Duration::from_secs(10), Duration::from_millis(200));
        assert!(!window.is_exhausted());
        assert_eq!(window.progress_percent(), 0.0);

        tokio::time::advance(Duration::from_secs(5)).await;
        window.add_bytes(1_000);
        assert!((window.progress_percent() - 50.0).abs() < 1e-9);
        assert!(!window.is_exhausted());

        tokio::time::advance(Duration::from_secs(5)).await;
        assert!(window.is_exhausted());
        assert_eq!(window.progress_percent(), 100.0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_rate_gated_by_warmup() {
        let mut window = TransferWindow::begin(Duration::from_secs(10), Duration::from_millis(200));
        window.add_bytes(1_000_000);
        assert_eq!(window.rate_mbps(), None);

        tokio::time::advance(Duration::from_millis(100)).await;
        assert_eq!(window.rate_mbps(), None);

        tokio::time::advance(Duration::from_millis(900)).await;
        // 1 MB over 1s = 8 Mbps
        let rate = window.rate_mbps().unwrap();
        assert!((rate - 8.0).abs() < 1e-9);
    }

    #[tokio::test(start_paused = true)]
    async fn test_final_rate_ignores_warmup_gate() {
        let window = TransferWindow::begin(Duration::from_secs(10), Duration::from_millis(200));
        tokio::time::advance(Duration::from_millis(100)).await;
        assert_eq!(window.rate_mbps(), None);
        assert!(window.final_rate_mbps(125_000) > 0.0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_byte_total_monotone() {
        let mut window = TransferWindow::begin(Duration::from_secs(10), Duration::from_millis(200));
        let mut last = 0;
        for chunk in [10u64, 0, 250, 3, 99] {
            window.add_bytes(chunk);
            assert!(window.total_bytes() >= last);
            last = window.total_bytes();
        }
        assert_eq!(last, 362);
    }

    proptest! {
        #[test]
        fn prop_ping_bounds_all_readings(readings in proptest::collection::vec(0.6f64..500.0, 2..32)) {
            let mut samples = LatencySamples::new(0.5);
            for r in &readings {
                samples.record(*r);
            }
            let ping = samples.min_ms().unwrap();
            for r in &readings {
                prop_assert!(ping <= *r);
            }
            prop_assert!(readings.contains(&ping));
        }

        #[test]
        fn prop_jitter_non_negative_and_finite(readings in proptest::collection::vec(0.6f64..500.0, 2..32)) {
            let mut samples = LatencySamples::new(0.5);
            for r in &readings {
                samples.record(*r);
            }
            let jitter = samples.jitter_ms().unwrap();
            prop_assert!(jitter >= 0.0);
            prop_assert!(jitter.is_finite());
        }
    }
}

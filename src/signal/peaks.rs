//! Adaptive peak detection.
//!
//! The detector is deliberately lenient early in a scan and stricter later.
//! The tier in effect (amplitude fraction, debounce, required peak count) is
//! chosen by elapsed scan time from [`crate::config::DetectionConfig`].

use crate::config::TierConfig;
use serde::Serialize;

/// A local maximum accepted as a pulse peak
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Peak {
    /// Index into the normalized signal window
    pub index: usize,
    /// Capture time of the peak sample
    pub timestamp_ms: f64,
    /// Normalized amplitude at the peak
    pub amplitude: f64,
}

/// Thresholded local-maximum detector with a time-based debounce
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PeakDetector {
    threshold_percent: f64,
    min_debounce_ms: f64,
}

impl PeakDetector {
    /// Create a detector
    ///
    /// # Panics
    ///
    /// Panics if `threshold_percent` is outside [0, 1] or `min_debounce_ms` is negative
    #[must_use]
    pub fn new(threshold_percent: f64, min_debounce_ms: f64) -> Self {
        assert!(
            (0.0..=1.0).contains(&threshold_percent),
            "Threshold percent must be in [0, 1], got {threshold_percent}"
        );
        assert!(min_debounce_ms >= 0.0, "Debounce must be non-negative, got {min_debounce_ms}");
        Self {
            threshold_percent,
            min_debounce_ms,
        }
    }

    /// Create a detector for one tier
    #[must_use]
    pub fn for_tier(tier: &TierConfig) -> Self {
        Self::new(tier.threshold_percent, tier.min_debounce_ms)
    }

    /// Find peaks in `signal`, whose samples were captured at `timestamps_ms`
    ///
    /// A sample is a peak when it is strictly greater than both neighbours,
    /// exceeds `max |signal| * threshold_percent`, and lies at least
    /// `min_debounce_ms` after the previous accepted peak.
    #[must_use]
    pub fn detect(&self, signal: &[f64], timestamps_ms: &[f64]) -> Vec<Peak> {
        let n = signal.len().min(timestamps_ms.len());
        if n < 3 {
            return Vec::new();
        }

        let max_amplitude = signal[..n].iter().fold(0.0_f64, |acc, v| acc.max(v.abs()));
        let threshold = max_amplitude * self.threshold_percent;

        let mut peaks: Vec<Peak> = Vec::new();
        for i in 1..n - 1 {
            let value = signal[i];
            if !(value > signal[i - 1] && value > signal[i + 1] && value > threshold) {
                continue;
            }

            if let Some(last) = peaks.last() {
                if timestamps_ms[i] - last.timestamp_ms < self.min_debounce_ms {
                    continue;
                }
            }

            peaks.push(Peak {
                index: i,
                timestamp_ms: timestamps_ms[i],
                amplitude: value,
            });
        }

        peaks
    }
}

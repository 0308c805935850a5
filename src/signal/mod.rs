//! Per-frame signal stages of the rPPG pipeline.
//!
//! Each stage is a small, independently testable type. The engine wires them
//! together in order: motion gate, sliding buffer, detrender, peak detector
//! and interval validator.

/// Bounded, time-stamped history of accepted intensities
pub mod buffer;

/// Effective frame rate recalculation from recent timestamps
pub mod frame_rate;

/// Consecutive-delta motion gate
pub mod motion;

/// Centered moving-average detrending and zero-mean normalization
pub mod detrend;

/// Tiered adaptive peak detection
pub mod peaks;

/// Beat interval validation and outlier rejection
pub mod intervals;

use crate::utils::safe_cast::count_to_f64;
use std::cmp::Ordering;

/// Statistical summary of a data window
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Statistics {
    /// Mean value of the data
    pub mean: f64,
    /// Population variance of the data
    pub variance: f64,
    /// Standard deviation of the data
    pub std_dev: f64,
    /// Minimum value in the window
    pub min: f64,
    /// Maximum value in the window
    pub max: f64,
    /// Range (max - min) of the data
    pub range: f64,
}

impl Statistics {
    /// Calculate statistics for a data window, `None` when empty
    #[must_use]
    pub fn of(data: &[f64]) -> Option<Self> {
        if data.is_empty() {
            return None;
        }

        let n = count_to_f64(data.len());
        let mean = data.iter().sum::<f64>() / n;

        let variance = data.iter().map(|x| (x - mean).powi(2)).sum::<f64>() / n;

        let min = data.iter().copied().fold(f64::INFINITY, f64::min);
        let max = data.iter().copied().fold(f64::NEG_INFINITY, f64::max);

        Some(Self {
            mean,
            variance,
            std_dev: variance.sqrt(),
            min,
            max,
            range: max - min,
        })
    }
}

/// Median of a slice, `None` when empty
#[must_use]
pub fn median(values: &[f64]) -> Option<f64> {
    if values.is_empty() {
        return None;
    }

    let mut sorted = values.to_vec();
    sorted.sort_by(|a, b| a.partial_cmp(b).unwrap_or(Ordering::Equal));

    let len = sorted.len();
    if len % 2 == 0 {
        Some((sorted[len / 2 - 1] + sorted[len / 2]) / 2.0)
    } else {
        Some(sorted[len / 2])
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_statistics_calculation() {
        let stats = Statistics::of(&[1.0, 2.0, 3.0, 4.0, 5.0]).unwrap();
        assert_eq!(stats.mean, 3.0);
        assert_eq!(stats.min, 1.0);
        assert_eq!(stats.max, 5.0);
        assert_eq!(stats.range, 4.0);
        assert_eq!(stats.variance, 2.0);
        assert!((stats.std_dev - 1.414_213_562_373_095_1).abs() < 1e-10);
    }

    #[test]
    fn test_statistics_empty() {
        assert!(Statistics::of(&[]).is_none());
    }

    #[test]
    fn test_median() {
        assert_eq!(median(&[3.0, 1.0, 2.0]), Some(2.0));
        assert_eq!(median(&[800.0, 810.0, 790.0, 805.0]), Some(802.5));
        assert_eq!(median(&[]), None);
    }
}

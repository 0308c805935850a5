//! Beat interval validation and robust averaging.
//!
//! Intervals outside the plausible range are discarded first. The survivors
//! are compared with their median and any that deviate by more than the
//! tolerance are dropped before averaging.

use super::{median, peaks::Peak, Statistics};
use crate::config::HeartRateConfig;
use crate::constants::MS_PER_MINUTE;

/// Minimum plausible intervals needed for an estimate
pub const MIN_VALID_INTERVALS: usize = 2;

/// Result of filtering one window's intervals
#[derive(Debug, Clone, PartialEq)]
pub enum IntervalOutcome {
    /// Fewer than two intervals survived the range check
    TooFew {
        /// Intervals inside the plausible range
        valid: usize,
    },
    /// Every plausible interval deviated too far from the median
    HighVariance {
        /// Median of the plausible intervals
        median_ms: f64,
    },
    /// A usable estimate
    Estimate(IntervalEstimate),
}

/// Robust interval estimate for one window
#[derive(Debug, Clone, PartialEq)]
pub struct IntervalEstimate {
    /// Intervals kept after both filtering passes
    pub intervals: Vec<f64>,
    /// Median of the plausible intervals
    pub median_ms: f64,
    /// Mean of the kept intervals
    pub mean_interval_ms: f64,
    /// Population variance of the kept intervals (ms^2)
    pub variance: f64,
    /// `60000 / mean_interval_ms`
    pub bpm: f64,
    /// Intervals dropped by the range check
    pub out_of_range: usize,
    /// Intervals dropped by the median deviation check
    pub outliers: usize,
}

/// Converts peak timing into a heart-rate estimate
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct IntervalValidator {
    min_interval_ms: f64,
    max_interval_ms: f64,
    tolerance: f64,
}

impl IntervalValidator {
    /// Create a validator
    #[must_use]
    pub const fn new(min_interval_ms: f64, max_interval_ms: f64, tolerance: f64) -> Self {
        Self {
            min_interval_ms,
            max_interval_ms,
            tolerance,
        }
    }

    /// Create a validator from the heart rate section of the configuration
    #[must_use]
    pub const fn from_config(config: &HeartRateConfig) -> Self {
        Self::new(config.min_interval_ms, config.max_interval_ms, config.outlier_tolerance)
    }

    /// Time deltas between consecutive peaks
    #[must_use]
    pub fn peak_intervals(peaks: &[Peak]) -> Vec<f64> {
        peaks.windows(2).map(|pair| pair[1].timestamp_ms - pair[0].timestamp_ms).collect()
    }

    /// Interval lies in the plausible range
    #[must_use]
    pub fn is_plausible(&self, interval_ms: f64) -> bool {
        (self.min_interval_ms..=self.max_interval_ms).contains(&interval_ms)
    }

    /// Plausible intervals, in order
    #[must_use]
    pub fn plausible(&self, intervals: &[f64]) -> Vec<f64> {
        intervals.iter().copied().filter(|&ms| self.is_plausible(ms)).collect()
    }

    /// Run both filtering passes over raw intervals
    #[must_use]
    pub fn evaluate(&self, intervals: &[f64]) -> IntervalOutcome {
        let plausible = self.plausible(intervals);
        let out_of_range = intervals.len() - plausible.len();

        if plausible.len() < MIN_VALID_INTERVALS {
            return IntervalOutcome::TooFew {
                valid: plausible.len(),
            };
        }

        let Some(median_ms) = median(&plausible) else {
            return IntervalOutcome::TooFew { valid: 0 };
        };

        let kept: Vec<f64> = plausible
            .iter()
            .copied()
            .filter(|ms| ((ms - median_ms) / median_ms).abs() <= self.tolerance)
            .collect();
        let outliers = plausible.len() - kept.len();

        let Some(stats) = Statistics::of(&kept) else {
            return IntervalOutcome::HighVariance { median_ms };
        };

        IntervalOutcome::Estimate(IntervalEstimate {
            intervals: kept,
            median_ms,
            mean_interval_ms: stats.mean,
            variance: stats.variance,
            bpm: MS_PER_MINUTE / stats.mean,
            out_of_range,
            outliers,
        })
    }
}

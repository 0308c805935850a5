//! Heart-rate variability from pulse peak timing.
//!
//! All metrics are time-domain. The "LF/HF ratio" reported here is **not** a
//! spectral measure: without frequency analysis it is approximated by the
//! Poincaré SD2/SD1 ratio, which tracks the same long-term/short-term
//! variability balance only loosely. The stress score and autonomic balance
//! label built on it are coarse indicators, not clinical values.

use crate::config::HrvConfig;
use crate::constants::{
    EPSILON, LF_HF_PARASYMPATHETIC_BELOW, LF_HF_SYMPATHETIC_ABOVE, MIN_HRV_PEAKS, NN50_THRESHOLD_MS,
};
use crate::signal::{intervals::IntervalValidator, peaks::Peak, Statistics};
use crate::utils::safe_cast::{count_to_f64, score_to_u8};
use serde::{Deserialize, Serialize};

/// Stress score weights
const RMSSD_WEIGHT: f64 = 0.35;
const SDNN_WEIGHT: f64 = 0.25;
const PNN50_WEIGHT: f64 = 0.15;
const LF_HF_WEIGHT: f64 = 0.25;

/// RMSSD/SDNN at or above this many ms contribute no stress
const RELAXED_VARIABILITY_MS: f64 = 100.0;

/// Ratio at which the LF/HF stress component saturates
const LF_HF_SATURATION: f64 = 4.0;

/// Plausible intervals needed (two successive differences)
const MIN_HRV_INTERVALS: usize = MIN_HRV_PEAKS - 1;

/// Coarse autonomic balance label
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AutonomicBalance {
    /// Rest-and-digest dominance
    Parasympathetic,
    /// Neither branch dominates
    Balanced,
    /// Fight-or-flight dominance
    Sympathetic,
}

impl AutonomicBalance {
    /// Threshold the approximate LF/HF ratio
    #[must_use]
    pub fn from_lf_hf(ratio: Option<f64>) -> Self {
        match ratio {
            Some(r) if r < LF_HF_PARASYMPATHETIC_BELOW => Self::Parasympathetic,
            Some(r) if r > LF_HF_SYMPATHETIC_ABOVE => Self::Sympathetic,
            _ => Self::Balanced,
        }
    }
}

/// HRV statistics for one window
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HrvMetrics {
    /// Number of intervals analysed
    pub interval_count: usize,
    /// Mean beat interval (ms)
    pub mean_interval_ms: f64,
    /// Root mean square of successive differences (ms)
    pub rmssd_ms: f64,
    /// Standard deviation of intervals (ms)
    pub sdnn_ms: f64,
    /// Percentage of successive differences above 50 ms
    pub pnn50_percent: f64,
    /// Poincaré SD2/SD1 stand-in for LF/HF; `None` when SD1 is ~0
    pub lf_hf_ratio: Option<f64>,
    /// 0-100, higher means more stressed
    pub stress_score: u8,
    /// Label derived from `lf_hf_ratio`
    pub balance: AutonomicBalance,
}

/// Computes HRV metrics when enough peaks are available
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HrvAnalyzer {
    min_peaks: usize,
}

impl HrvAnalyzer {
    /// Create an analyzer requiring `min_peaks` peaks
    ///
    /// Fewer than [`MIN_HRV_PEAKS`] peaks never produce metrics regardless.
    #[must_use]
    pub const fn new(min_peaks: usize) -> Self {
        Self { min_peaks }
    }

    /// Create an analyzer from configuration, `None` when disabled
    #[must_use]
    pub fn from_config(config: &HrvConfig) -> Option<Self> {
        config.enabled.then(|| Self::new(config.min_peaks))
    }

    /// Analyse the plausible intervals between `peaks`
    #[must_use]
    pub fn analyze(&self, peaks: &[Peak], validator: &IntervalValidator) -> Option<HrvMetrics> {
        if peaks.len() < self.min_peaks {
            return None;
        }
        let intervals = validator.plausible(&IntervalValidator::peak_intervals(peaks));
        Self::from_intervals(&intervals)
    }

    /// Compute metrics from an interval sequence (ms)
    #[must_use]
    pub fn from_intervals(intervals: &[f64]) -> Option<HrvMetrics> {
        if intervals.len() < MIN_HRV_INTERVALS {
            return None;
        }

        let stats = Statistics::of(intervals)?;
        let differences: Vec<f64> = intervals.windows(2).map(|pair| pair[1] - pair[0]).collect();
        let diff_count = count_to_f64(differences.len());

        let rmssd = (differences.iter().map(|d| d * d).sum::<f64>() / diff_count).sqrt();
        let nn50 = differences.iter().filter(|d| d.abs() > NN50_THRESHOLD_MS).count();
        let pnn50 = count_to_f64(nn50) / diff_count * 100.0;

        let lf_hf_ratio = Self::poincare_ratio(stats.std_dev, &differences);
        let balance = AutonomicBalance::from_lf_hf(lf_hf_ratio);

        Some(HrvMetrics {
            interval_count: intervals.len(),
            mean_interval_ms: stats.mean,
            rmssd_ms: rmssd,
            sdnn_ms: stats.std_dev,
            pnn50_percent: pnn50,
            lf_hf_ratio,
            stress_score: Self::stress_score(rmssd, stats.std_dev, pnn50, lf_hf_ratio),
            balance,
        })
    }

    /// SD2/SD1 from the Poincaré plot of successive intervals
    fn poincare_ratio(sdnn: f64, differences: &[f64]) -> Option<f64> {
        let sdsd = Statistics::of(differences)?.std_dev;
        let sd1 = (0.5 * sdsd * sdsd).sqrt();
        if sd1 < EPSILON {
            return None;
        }
        let sd2 = (2.0 * sdnn * sdnn - 0.5 * sdsd * sdsd).max(0.0).sqrt();
        Some(sd2 / sd1)
    }

    fn stress_score(rmssd: f64, sdnn: f64, pnn50: f64, lf_hf_ratio: Option<f64>) -> u8 {
        let low_variability = |ms: f64| (1.0 - ms.clamp(0.0, RELAXED_VARIABILITY_MS) / RELAXED_VARIABILITY_MS) * 100.0;
        let lf_hf = lf_hf_ratio.map_or(50.0, |r| (r / LF_HF_SATURATION).clamp(0.0, 1.0) * 100.0);

        score_to_u8(
            RMSSD_WEIGHT * low_variability(rmssd)
                + SDNN_WEIGHT * low_variability(sdnn)
                + PNN50_WEIGHT * (100.0 - pnn50.clamp(0.0, 100.0))
                + LF_HF_WEIGHT * lf_hf,
        )
    }
}

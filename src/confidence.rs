//! Confidence scoring and quality labels.
//!
//! Confidence combines two sub-scores: how tightly the beat intervals agree
//! (variance) and how long the displayed value has held steady (stability).
//! The quality label is for display only and never gates an estimate.

use crate::config::ConfidenceConfig;
use crate::constants::{QUALITY_EXCELLENT, QUALITY_FAIR, QUALITY_GOOD};
use crate::utils::safe_cast::score_to_u8;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Coarse quality label derived from confidence
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Quality {
    /// Confidence below 40
    Poor,
    /// Confidence 40-59
    Fair,
    /// Confidence 60-79
    Good,
    /// Confidence 80 and above
    Excellent,
}

impl Quality {
    /// Step function of confidence
    #[must_use]
    pub const fn from_confidence(confidence: u8) -> Self {
        if confidence >= QUALITY_EXCELLENT {
            Self::Excellent
        } else if confidence >= QUALITY_GOOD {
            Self::Good
        } else if confidence >= QUALITY_FAIR {
            Self::Fair
        } else {
            Self::Poor
        }
    }
}

impl fmt::Display for Quality {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            Self::Poor => "poor",
            Self::Fair => "fair",
            Self::Good => "good",
            Self::Excellent => "excellent",
        };
        f.write_str(label)
    }
}

/// Weighted variance/stability confidence scorer
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ConfidenceScorer {
    variance_weight: f64,
    stability_weight: f64,
    variance_divisor: f64,
    full_stability_frames: u32,
}

impl ConfidenceScorer {
    /// Create a scorer
    #[must_use]
    pub fn new(variance_weight: f64, stability_weight: f64, variance_divisor: f64, full_stability_frames: u32) -> Self {
        Self {
            variance_weight,
            stability_weight,
            variance_divisor,
            full_stability_frames: full_stability_frames.max(1),
        }
    }

    /// Create a scorer from configuration and the smoother's saturation count
    #[must_use]
    pub fn from_config(config: &ConfidenceConfig, full_stability_frames: u32) -> Self {
        Self::new(
            config.variance_weight,
            config.stability_weight,
            config.variance_divisor,
            full_stability_frames,
        )
    }

    /// `max(0, 100 - variance / divisor)`
    #[must_use]
    pub fn variance_confidence(&self, variance_ms2: f64) -> f64 {
        (100.0 - variance_ms2 / self.variance_divisor).max(0.0)
    }

    /// `min(100, stable / full * 100)`
    #[must_use]
    pub fn stability_confidence(&self, stable_frames: u32) -> f64 {
        (f64::from(stable_frames) / f64::from(self.full_stability_frames) * 100.0).min(100.0)
    }

    /// Combined confidence in [0, 100]
    #[must_use]
    pub fn score(&self, variance_ms2: f64, stable_frames: u32) -> u8 {
        let combined = self.variance_weight.mul_add(
            self.variance_confidence(variance_ms2),
            self.stability_weight * self.stability_confidence(stable_frames),
        );
        score_to_u8(combined)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn scorer() -> ConfidenceScorer {
        ConfidenceScorer::new(0.6, 0.4, 10.0, 20)
    }

    #[test]
    fn test_variance_confidence() {
        assert_eq!(scorer().variance_confidence(0.0), 100.0);
        assert_eq!(scorer().variance_confidence(500.0), 50.0);
        assert_eq!(scorer().variance_confidence(1000.0), 0.0);
        assert_eq!(scorer().variance_confidence(5000.0), 0.0);
    }

    #[test]
    fn test_stability_confidence() {
        assert_eq!(scorer().stability_confidence(0), 0.0);
        assert_eq!(scorer().stability_confidence(10), 50.0);
        assert_eq!(scorer().stability_confidence(20), 100.0);
        assert_eq!(scorer().stability_confidence(40), 100.0);
    }

    #[test]
    fn test_combined_score() {
        assert_eq!(scorer().score(0.0, 20), 100);
        assert_eq!(scorer().score(0.0, 1), 62);
        assert_eq!(scorer().score(1000.0, 0), 0);
        assert_eq!(scorer().score(250.0, 10), 65);
    }

    #[test]
    fn test_quality_steps() {
        assert_eq!(Quality::from_confidence(100), Quality::Excellent);
        assert_eq!(Quality::from_confidence(80), Quality::Excellent);
        assert_eq!(Quality::from_confidence(79), Quality::Good);
        assert_eq!(Quality::from_confidence(60), Quality::Good);
        assert_eq!(Quality::from_confidence(40), Quality::Fair);
        assert_eq!(Quality::from_confidence(39), Quality::Poor);
        assert_eq!(Quality::from_confidence(0), Quality::Poor);
        assert!(Quality::Excellent > Quality::Poor);
    }

    proptest! {
        #[test]
        fn prop_score_in_range(variance in 0.0f64..1e7, stable in 0u32..1000) {
            prop_assert!(scorer().score(variance, stable) <= 100);
        }

        #[test]
        fn prop_quality_is_monotone(a in 0u8..=100, b in 0u8..=100) {
            let (lo, hi) = if a <= b { (a, b) } else { (b, a) };
            prop_assert!(Quality::from_confidence(lo) <= Quality::from_confidence(hi));
        }
    }
}

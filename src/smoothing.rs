//! Stability smoother for displayed heart rate.

use crate::config::SmoothingConfig;

/// Blends instantaneous estimates into a displayed BPM and counts stable frames
#[derive(Debug, Clone)]
pub struct StabilitySmoother {
    previous_weight: f64,
    stable_delta_bpm: f64,
    max_stable_frames: u32,
    last_displayed: Option<f64>,
    stable_frames: u32,
}

impl StabilitySmoother {
    /// Create a smoother
    ///
    /// # Panics
    ///
    /// Panics if `previous_weight` is outside [0, 1)
    #[must_use]
    pub fn new(previous_weight: f64, stable_delta_bpm: f64, max_stable_frames: u32) -> Self {
        assert!(
            (0.0..1.0).contains(&previous_weight),
            "Previous weight must be in [0, 1), got {previous_weight}"
        );
        Self {
            previous_weight,
            stable_delta_bpm,
            max_stable_frames: max_stable_frames.max(1),
            last_displayed: None,
            stable_frames: 0,
        }
    }

    /// Create a smoother from configuration
    #[must_use]
    pub fn from_config(config: &SmoothingConfig) -> Self {
        Self::new(
            config.previous_weight,
            config.stable_delta_bpm,
            config.stable_frames_for_full_confidence,
        )
    }

    /// Fold in a new instantaneous estimate and return the displayed value
    pub fn update(&mut self, instantaneous_bpm: f64) -> f64 {
        let displayed = match self.last_displayed {
            None => {
                self.stable_frames = 1;
                instantaneous_bpm
            }
            Some(last) => {
                let blended = self
                    .previous_weight
                    .mul_add(last, (1.0 - self.previous_weight) * instantaneous_bpm);
                if (blended - last).abs() < self.stable_delta_bpm {
                    self.stable_frames = (self.stable_frames + 1).min(self.max_stable_frames);
                } else {
                    self.stable_frames = self.stable_frames.saturating_sub(1);
                }
                blended
            }
        };

        self.last_displayed = Some(displayed);
        displayed
    }

    /// Last displayed BPM
    #[must_use]
    pub const fn last_displayed(&self) -> Option<f64> {
        self.last_displayed
    }

    /// Consecutive stable frames, saturating at the full-confidence count
    #[must_use]
    pub const fn stable_frames(&self) -> u32 {
        self.stable_frames
    }
}

//! Motion gate for raw frame intensities.
//!
//! A single large frame-to-frame delta is usually camera jitter; several in a
//! row mean the head or hand is moving and the samples are unusable.

use crate::config::MotionConfig;
use std::collections::VecDeque;

/// Outcome of gating one sample
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MotionVerdict {
    /// Absolute change from the previous raw sample, if any
    pub delta: Option<f64>,
    /// Consecutive frames whose delta exceeded the threshold
    pub motion_frames: u32,
    /// Gate is tripped for this frame
    pub in_motion: bool,
}

/// Tracks consecutive large deltas over a short raw history
#[derive(Debug, Clone)]
pub struct MotionGate {
    history: VecDeque<f64>,
    history_len: usize,
    threshold: f64,
    consecutive_required: u32,
    motion_frames: u32,
}

impl MotionGate {
    /// Create a new motion gate
    #[must_use]
    pub fn new(threshold: f64, consecutive_required: u32, history_len: usize) -> Self {
        Self {
            history: VecDeque::with_capacity(history_len),
            history_len: history_len.max(2),
            threshold,
            consecutive_required: consecutive_required.max(1),
            motion_frames: 0,
        }
    }

    /// Create a motion gate from configuration
    #[must_use]
    pub fn from_config(config: &MotionConfig) -> Self {
        Self::new(config.threshold, config.consecutive_frames, config.history_len)
    }

    /// Feed a raw intensity and decide whether motion is in progress
    pub fn update(&mut self, value: f64) -> MotionVerdict {
        let delta = self.history.back().map(|previous| (value - previous).abs());

        if self.history.len() >= self.history_len {
            self.history.pop_front();
        }
        self.history.push_back(value);

        match delta {
            Some(d) if d > self.threshold => self.motion_frames = self.motion_frames.saturating_add(1),
            _ => self.motion_frames = 0,
        }

        MotionVerdict {
            delta,
            motion_frames: self.motion_frames,
            in_motion: self.motion_frames >= self.consecutive_required,
        }
    }

    /// Consecutive suspect frames so far
    #[must_use]
    pub const fn motion_frames(&self) -> u32 {
        self.motion_frames
    }
}

//! Tracks the device's actual frame rate so that window sizes expressed in
//! seconds map to the right number of samples.

use crate::constants::{MAX_EFFECTIVE_FPS, MIN_EFFECTIVE_FPS};
use crate::utils::safe_cast::count_to_f64;
use std::collections::VecDeque;

/// Recalculates frames per second from recent timestamps on a fixed cadence
#[derive(Debug, Clone)]
pub struct FrameRateTracker {
    timestamps: VecDeque<f64>,
    history_len: usize,
    update_interval_ms: f64,
    fps: f64,
    last_update_ms: Option<f64>,
}

impl FrameRateTracker {
    /// Create a tracker starting from `fps_hint`
    #[must_use]
    pub fn new(fps_hint: f64, history_len: usize, update_interval_ms: f64) -> Self {
        Self {
            timestamps: VecDeque::with_capacity(history_len),
            history_len: history_len.max(2),
            update_interval_ms,
            fps: fps_hint,
            last_update_ms: None,
        }
    }

    /// Record a frame timestamp; returns the new rate when it was recalculated
    pub fn record(&mut self, timestamp_ms: f64) -> Option<f64> {
        if self.timestamps.len() >= self.history_len {
            self.timestamps.pop_front();
        }
        self.timestamps.push_back(timestamp_ms);

        let last_update = *self.last_update_ms.get_or_insert(timestamp_ms);
        if timestamp_ms - last_update < self.update_interval_ms {
            return None;
        }
        self.last_update_ms = Some(timestamp_ms);

        let (first, last) = (self.timestamps.front()?, self.timestamps.back()?);
        let span = last - first;
        if self.timestamps.len() < 2 || span <= 0.0 {
            return None;
        }

        let fps = count_to_f64(self.timestamps.len() - 1) * 1000.0 / span;
        self.fps = fps.clamp(MIN_EFFECTIVE_FPS, MAX_EFFECTIVE_FPS);
        Some(self.fps)
    }

    /// Current effective frame rate
    #[must_use]
    pub const fn fps(&self) -> f64 {
        self.fps
    }
}

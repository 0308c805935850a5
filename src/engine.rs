//! The rPPG engine: one instance per scan.
//!
//! Each call to [`RppgEngine::process_frame`] runs the whole pipeline
//! synchronously: reduce, motion gate, buffer, detrend, detect peaks,
//! validate intervals, smooth, score. Noisy input never produces an error;
//! it is reported through [`RppgResult::status`] with the previous BPM kept.

use crate::config::Config;
use crate::confidence::{ConfidenceScorer, Quality};
use crate::constants::{DETECTING_CONFIDENCE, FILTERING_CONFIDENCE, HIGH_VARIANCE_CONFIDENCE};
use crate::frame::{Frame, FrameReducer};
use crate::hrv::{HrvAnalyzer, HrvMetrics};
use crate::signal::{
    buffer::{Sample, SlidingBuffer},
    detrend::Detrender,
    frame_rate::FrameRateTracker,
    intervals::{IntervalEstimate, IntervalOutcome, IntervalValidator},
    motion::MotionGate,
    peaks::PeakDetector,
};
use crate::smoothing::StabilitySmoother;
use crate::utils::safe_cast::seconds_to_samples;
use crate::{Error, Result};
use log::{debug, info, trace, warn};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Lifecycle of one scan
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ScanState {
    /// Constructed, no scan started
    Idle,
    /// Collecting the minimum window
    Warming,
    /// Producing estimates
    Estimating,
    /// Motion gate tripped, buffer frozen
    MotionPaused,
    /// Scan ended by the caller
    Finished,
}

impl ScanState {
    /// Frames are accepted in this state
    #[must_use]
    pub const fn is_active(self) -> bool {
        matches!(self, Self::Warming | Self::Estimating | Self::MotionPaused)
    }
}

impl fmt::Display for ScanState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Idle => "idle",
            Self::Warming => "warming",
            Self::Estimating => "estimating",
            Self::MotionPaused => "motion_paused",
            Self::Finished => "finished",
        };
        f.write_str(name)
    }
}

/// Why a result does or does not carry a fresh estimate
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EstimateStatus {
    /// Buffer below the minimum window
    Warming,
    /// Motion gate tripped
    Motion,
    /// Too few peaks for the current tier
    Detecting,
    /// Too few plausible intervals
    Filtering,
    /// Every interval deviated from the median
    HighVariance,
    /// Estimate outside the physiological bounds
    OutOfRange,
    /// Fresh estimate accepted
    Measured,
}

/// Per-frame output
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RppgResult {
    /// Displayed heart rate, or the previous one when no fresh estimate exists
    pub bpm: Option<f64>,
    /// 0-100
    pub confidence: u8,
    /// Display label derived from confidence
    pub quality: Quality,
    /// Motion gate tripped on this frame
    pub motion: bool,
    /// Consecutive stable estimates
    pub stable_frames: u32,
    /// Outcome of this frame
    pub status: EstimateStatus,
    /// Engine state after this frame
    pub state: ScanState,
    /// Human-readable detail
    pub debug: String,
    /// HRV block when enough peaks were found
    pub hrv: Option<HrvMetrics>,
    /// Reduced intensity of this frame
    pub intensity: f64,
    /// Capture time of this frame
    pub timestamp_ms: f64,
}

/// Streaming heart-rate estimator
#[derive(Debug, Clone)]
pub struct RppgEngine {
    config: Config,
    reducer: FrameReducer,
    motion_gate: MotionGate,
    buffer: SlidingBuffer,
    frame_rate: FrameRateTracker,
    validator: IntervalValidator,
    smoother: StabilitySmoother,
    scorer: ConfidenceScorer,
    hrv: Option<HrvAnalyzer>,
    state: ScanState,
    scan_start_ms: Option<f64>,
    last_timestamp_ms: Option<f64>,
    last_result: Option<RppgResult>,
}

impl RppgEngine {
    /// Build an idle engine; call [`reset`](Self::reset) to begin a scan
    ///
    /// # Errors
    ///
    /// Returns a `ConfigError` if the configuration does not validate
    pub fn new(config: Config) -> Result<Self> {
        config.validate()?;

        let fps = config.capture.frame_rate_hint;
        let min_len = config.window.min_window_samples(fps);
        let max_len = config.window.max_window_samples(fps);

        Ok(Self {
            reducer: FrameReducer::from_config(&config.capture)?,
            motion_gate: MotionGate::from_config(&config.motion),
            buffer: SlidingBuffer::new(min_len, max_len),
            frame_rate: FrameRateTracker::new(fps, config.window.fps_history_len, config.window.fps_update_interval_ms),
            validator: IntervalValidator::from_config(&config.heart_rate),
            smoother: StabilitySmoother::from_config(&config.smoothing),
            scorer: ConfidenceScorer::from_config(
                &config.confidence,
                config.smoothing.stable_frames_for_full_confidence,
            ),
            hrv: HrvAnalyzer::from_config(&config.hrv),
            state: ScanState::Idle,
            scan_start_ms: None,
            last_timestamp_ms: None,
            last_result: None,
            config,
        })
    }

    /// Build an engine with a scan already started
    ///
    /// # Errors
    ///
    /// Returns a `ConfigError` if the configuration does not validate
    pub fn start(config: Config) -> Result<Self> {
        let mut engine = Self::new(config.clone())?;
        engine.reset(config)?;
        Ok(engine)
    }

    /// Reinitialize every piece of mutable state and begin a new scan
    ///
    /// # Errors
    ///
    /// Returns a `ConfigError` if the configuration does not validate; the
    /// engine is left unchanged in that case
    pub fn reset(&mut self, config: Config) -> Result<()> {
        let mut fresh = Self::new(config)?;
        fresh.state = ScanState::Warming;
        *self = fresh;

        info!(
            "rPPG scan started: warm-up {} samples, window {} samples at {:.1} fps",
            self.buffer.min_len(),
            self.buffer.max_len(),
            self.frame_rate.fps()
        );
        Ok(())
    }

    /// End the scan and return the last result
    pub fn finish(&mut self) -> Option<RppgResult> {
        if self.state != ScanState::Finished {
            info!(
                "rPPG scan finished: bpm {:?}, stable frames {}",
                self.smoother.last_displayed(),
                self.smoother.stable_frames()
            );
        }
        self.state = ScanState::Finished;
        self.last_result.clone()
    }

    /// Reduce `frame` and run the pipeline
    ///
    /// # Errors
    ///
    /// Returns an error for an empty or malformed frame, a timestamp that does
    /// not follow the previous frame, or when no scan is active
    pub fn process_frame(&mut self, frame: &Frame<'_>, timestamp_ms: f64) -> Result<RppgResult> {
        self.ensure_active()?;
        let intensity = self.reducer.reduce(frame)?;
        self.process_intensity(intensity, timestamp_ms)
    }

    /// Run the pipeline on an already reduced intensity
    ///
    /// # Errors
    ///
    /// Returns an error for a non-finite intensity or timestamp, a timestamp
    /// that does not follow the previous frame, or when no scan is active
    pub fn process_intensity(&mut self, intensity: f64, timestamp_ms: f64) -> Result<RppgResult> {
        self.ensure_active()?;
        if !intensity.is_finite() || !timestamp_ms.is_finite() {
            return Err(Error::InvalidInput(format!(
                "Non-finite sample: intensity {intensity}, timestamp {timestamp_ms}"
            )));
        }
        if let Some(previous) = self.last_timestamp_ms {
            if timestamp_ms <= previous {
                return Err(Error::NonMonotonicTimestamp {
                    previous,
                    current: timestamp_ms,
                });
            }
        }
        self.last_timestamp_ms = Some(timestamp_ms);
        self.scan_start_ms.get_or_insert(timestamp_ms);

        if let Some(fps) = self.frame_rate.record(timestamp_ms) {
            self.apply_frame_rate(fps);
        }

        let verdict = self.motion_gate.update(intensity);
        let result = if verdict.in_motion {
            if verdict.motion_frames == self.config.motion.consecutive_frames {
                // Suspect frames admitted before the gate tripped
                let suspect = usize::try_from(verdict.motion_frames.saturating_sub(1)).unwrap_or(usize::MAX);
                let dropped = self.buffer.drop_recent(suspect);
                debug!("motion gate tripped: dropped {dropped} suspect samples");
            }
            if let Some(seconds) = self.config.motion.retain_seconds {
                self.buffer.retain_recent(seconds_to_samples(seconds, self.frame_rate.fps()));
            }
            self.transition(ScanState::MotionPaused);
            self.degraded(
                EstimateStatus::Motion,
                0,
                format!(
                    "motion detected: delta {:.1} for {} frames",
                    verdict.delta.unwrap_or_default(),
                    verdict.motion_frames
                ),
                None,
            )
        } else {
            self.buffer.push(Sample::new(intensity, timestamp_ms))?;
            if self.buffer.is_ready() {
                self.transition(ScanState::Estimating);
                self.estimate(timestamp_ms)
            } else {
                self.transition(ScanState::Warming);
                self.degraded(
                    EstimateStatus::Warming,
                    0,
                    format!("warming up: {}/{} samples", self.buffer.len(), self.buffer.min_len()),
                    None,
                )
            }
        };

        let result = RppgResult {
            intensity,
            timestamp_ms,
            ..result
        };
        trace!("frame @{timestamp_ms:.0} ms: {}", result.debug);
        self.last_result = Some(result.clone());
        Ok(result)
    }

    fn ensure_active(&self) -> Result<()> {
        if self.state.is_active() {
            Ok(())
        } else {
            Err(Error::ScanNotActive(self.state.to_string()))
        }
    }

    fn transition(&mut self, next: ScanState) {
        if self.state != next {
            debug!("scan state {} -> {}", self.state, next);
            self.state = next;
        }
    }

    fn apply_frame_rate(&mut self, fps: f64) {
        let min_len = self.config.window.min_window_samples(fps);
        let max_len = self.config.window.max_window_samples(fps).max(min_len);
        if (min_len, max_len) != (self.buffer.min_len(), self.buffer.max_len()) {
            debug!("effective frame rate {fps:.2} fps: window {min_len}..{max_len} samples");
        }
        self.buffer.set_limits(min_len, max_len);
    }

    /// Detrend, detect, validate and score the current window
    fn estimate(&mut self, timestamp_ms: f64) -> RppgResult {
        let (values, timestamps) = self.buffer.split();
        let detrender = Detrender::new(self.config.window.detrend_window_samples(self.frame_rate.fps()));
        let signal = detrender.apply(&values);

        let elapsed_seconds = (timestamp_ms - self.scan_start_ms.unwrap_or(timestamp_ms)) / 1000.0;
        let Some(tier) = self.config.detection.tier_for(elapsed_seconds).copied() else {
            let debug = "no detection tier".to_string();
            return self.degraded(EstimateStatus::Detecting, DETECTING_CONFIDENCE, debug, None);
        };

        let peaks = PeakDetector::for_tier(&tier).detect(&signal, &timestamps);
        let hrv = self.hrv.and_then(|analyzer| analyzer.analyze(&peaks, &self.validator));

        if peaks.len() < tier.min_peaks {
            return self.degraded(
                EstimateStatus::Detecting,
                DETECTING_CONFIDENCE,
                format!("detecting: {}/{} peaks", peaks.len(), tier.min_peaks),
                hrv,
            );
        }

        match self.validator.evaluate(&IntervalValidator::peak_intervals(&peaks)) {
            IntervalOutcome::TooFew { valid } => self.degraded(
                EstimateStatus::Filtering,
                FILTERING_CONFIDENCE,
                format!("filtering outliers: {valid} valid intervals from {} peaks", peaks.len()),
                hrv,
            ),
            IntervalOutcome::HighVariance { median_ms } => self.degraded(
                EstimateStatus::HighVariance,
                HIGH_VARIANCE_CONFIDENCE,
                format!("high variance around {median_ms:.0} ms, stabilizing"),
                hrv,
            ),
            IntervalOutcome::Estimate(estimate) => self.accept_estimate(&estimate, hrv),
        }
    }

    /// Bounds-check an instantaneous estimate, then smooth and score it
    fn accept_estimate(&mut self, estimate: &IntervalEstimate, hrv: Option<HrvMetrics>) -> RppgResult {
        let bounds = &self.config.heart_rate;
        if !(bounds.min_bpm..=bounds.max_bpm).contains(&estimate.bpm) {
            warn!(
                "rejected estimate {:.1} bpm outside {:.0}-{:.0}",
                estimate.bpm, bounds.min_bpm, bounds.max_bpm
            );
            return self.degraded(
                EstimateStatus::OutOfRange,
                0,
                format!("out of range: {:.1} bpm", estimate.bpm),
                hrv,
            );
        }

        let displayed = self.smoother.update(estimate.bpm);
        let stable_frames = self.smoother.stable_frames();
        let confidence = self.scorer.score(estimate.variance, stable_frames);

        RppgResult {
            bpm: Some(displayed),
            confidence,
            quality: Quality::from_confidence(confidence),
            motion: false,
            stable_frames,
            status: EstimateStatus::Measured,
            state: self.state,
            debug: format!(
                "{:.1} bpm (instant {:.1}) from {} intervals, {} rejected",
                displayed,
                estimate.bpm,
                estimate.intervals.len(),
                estimate.out_of_range + estimate.outliers
            ),
            hrv,
            intensity: 0.0,
            timestamp_ms: 0.0,
        }
    }

    /// Result that keeps the previous BPM
    fn degraded(
        &self,
        status: EstimateStatus,
        confidence: u8,
        debug: String,
        hrv: Option<HrvMetrics>,
    ) -> RppgResult {
        RppgResult {
            bpm: self.smoother.last_displayed(),
            confidence,
            quality: Quality::from_confidence(confidence),
            motion: status == EstimateStatus::Motion,
            stable_frames: self.smoother.stable_frames(),
            status,
            state: self.state,
            debug,
            hrv,
            intensity: 0.0,
            timestamp_ms: 0.0,
        }
    }

    /// Current scan state
    #[must_use]
    pub const fn state(&self) -> ScanState {
        self.state
    }

    /// Active configuration
    #[must_use]
    pub const fn config(&self) -> &Config {
        &self.config
    }

    /// Frame rate used for window sizing
    #[must_use]
    pub const fn effective_frame_rate(&self) -> f64 {
        self.frame_rate.fps()
    }

    /// Samples in the signal buffer
    #[must_use]
    pub fn buffer_len(&self) -> usize {
        self.buffer.len()
    }

    /// Samples required before estimating
    #[must_use]
    pub const fn min_window_samples(&self) -> usize {
        self.buffer.min_len()
    }

    /// Samples retained
    #[must_use]
    pub const fn max_window_samples(&self) -> usize {
        self.buffer.max_len()
    }

    /// Consecutive stable estimates
    #[must_use]
    pub const fn stable_frame_count(&self) -> u32 {
        self.smoother.stable_frames()
    }

    /// Last displayed BPM
    #[must_use]
    pub const fn last_bpm(&self) -> Option<f64> {
        self.smoother.last_displayed()
    }

    /// Consecutive frames flagged by the motion gate
    #[must_use]
    pub const fn motion_frame_count(&self) -> u32 {
        self.motion_gate.motion_frames()
    }

    /// Most recent result
    #[must_use]
    pub const fn last_result(&self) -> Option<&RppgResult> {
        self.last_result.as_ref()
    }

    /// Copy of the raw signal window for waveform display
    #[must_use]
    pub fn signal_snapshot(&self) -> Vec<Sample> {
        self.buffer.snapshot()
    }

    /// The newest `count` samples of the signal window, oldest first
    #[must_use]
    pub fn recent_signal(&self, count: usize) -> Vec<Sample> {
        self.buffer.recent(count).copied().collect()
    }
}

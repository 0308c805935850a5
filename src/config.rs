//! Configuration management for the rPPG engine

use crate::constants::{
    DEFAULT_DETREND_WINDOW_SECONDS, DEFAULT_FPS, DEFAULT_FPS_HISTORY_LEN, DEFAULT_FPS_UPDATE_INTERVAL_MS,
    DEFAULT_HRV_MIN_PEAKS, DEFAULT_MAX_BPM, DEFAULT_MAX_BUFFER_SECONDS, DEFAULT_MAX_INTERVAL_MS, DEFAULT_MIN_BPM,
    DEFAULT_MIN_INTERVAL_MS, DEFAULT_MIN_WINDOW_SECONDS, DEFAULT_MIN_ACCEPT_CONFIDENCE,
    DEFAULT_MOTION_CONSECUTIVE_FRAMES, DEFAULT_MOTION_HISTORY_LEN, DEFAULT_MOTION_THRESHOLD,
    DEFAULT_OUTLIER_TOLERANCE, DEFAULT_PREVIOUS_WEIGHT, DEFAULT_SCAN_DURATION_SECONDS,
    DEFAULT_STABILITY_WEIGHT, DEFAULT_STABLE_DELTA_BPM, DEFAULT_STABLE_FRAMES_FOR_FULL_CONFIDENCE,
    DEFAULT_VARIANCE_DIVISOR, DEFAULT_VARIANCE_WEIGHT, EPSILON, GREEN_CHANNEL, MAX_BUFFER_SECONDS, MAX_EFFECTIVE_FPS,
    MIN_EFFECTIVE_FPS, MIN_HRV_PEAKS,
};
use crate::utils::safe_cast::seconds_to_samples;
use crate::{Error, Result};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::Path;

/// Engine configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Frame capture and reduction
    pub capture: CaptureConfig,

    /// Signal window sizing
    pub window: WindowConfig,

    /// Motion gate
    pub motion: MotionConfig,

    /// Physiological bounds and interval filtering
    pub heart_rate: HeartRateConfig,

    /// Adaptive peak detection tiers
    pub detection: DetectionConfig,

    /// Stability smoother
    pub smoothing: SmoothingConfig,

    /// Confidence scorer
    pub confidence: ConfidenceConfig,

    /// HRV analyzer
    pub hrv: HrvConfig,

    /// Scan session runner
    pub session: SessionConfig,
}

/// Frame capture parameters
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CaptureConfig {
    /// Assumed frames per second before the first recalculation
    pub frame_rate_hint: f64,

    /// Pixel subsampling factor for the frame reducer
    pub pixel_stride: usize,

    /// Channel index reduced to the scalar intensity
    pub channel: usize,
}

/// Signal window parameters
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct WindowConfig {
    /// Seconds of data required before estimating
    pub min_window_seconds: f64,

    /// Seconds of history retained
    pub max_buffer_seconds: f64,

    /// Milliseconds between effective frame rate recalculations
    pub fps_update_interval_ms: f64,

    /// Number of recent frame timestamps used for the frame rate
    pub fps_history_len: usize,

    /// Width of the centered detrending average, in seconds
    pub detrend_window_seconds: f64,
}

/// Motion gate parameters
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MotionConfig {
    /// Per-frame intensity delta above which motion is suspected
    pub threshold: f64,

    /// Consecutive suspect frames before the gate trips
    pub consecutive_frames: u32,

    /// Raw intensity history length
    pub history_len: usize,

    /// When set, trim the signal to this many recent seconds while motion persists
    pub retain_seconds: Option<f64>,
}

/// Physiological bounds
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct HeartRateConfig {
    /// Lowest plausible heart rate
    pub min_bpm: f64,

    /// Highest plausible heart rate
    pub max_bpm: f64,

    /// Shortest plausible beat interval
    pub min_interval_ms: f64,

    /// Longest plausible beat interval
    pub max_interval_ms: f64,

    /// Maximum relative deviation from the median interval
    pub outlier_tolerance: f64,
}

/// One tier of the adaptive peak detector
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TierConfig {
    /// Tier applies while elapsed scan time is below this; `None` for the last tier
    pub until_seconds: Option<f64>,

    /// Fraction of the maximum absolute amplitude a peak must exceed
    pub threshold_percent: f64,

    /// Minimum time between accepted peaks
    pub min_debounce_ms: f64,

    /// Peaks required before intervals are evaluated
    pub min_peaks: usize,
}

/// Adaptive peak detection configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DetectionConfig {
    /// Tiers ordered by elapsed time
    pub tiers: Vec<TierConfig>,
}

/// Stability smoother parameters
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SmoothingConfig {
    /// Weight of the previous displayed BPM in the blend
    pub previous_weight: f64,

    /// Blended change below which the frame counts as stable
    pub stable_delta_bpm: f64,

    /// Stable frames at which stability confidence saturates
    pub stable_frames_for_full_confidence: u32,
}

/// Confidence scorer parameters
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ConfidenceConfig {
    /// Weight of the interval variance sub-score
    pub variance_weight: f64,

    /// Weight of the stability sub-score
    pub stability_weight: f64,

    /// Variance (ms^2) per confidence point lost
    pub variance_divisor: f64,
}

/// HRV analyzer parameters
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct HrvConfig {
    /// Compute HRV when enough peaks exist
    pub enabled: bool,

    /// Peaks required for HRV metrics
    pub min_peaks: usize,
}

/// Scan session parameters
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SessionConfig {
    /// Scan length used for progress reporting
    pub scan_duration_seconds: f64,

    /// Confidence required to accept the final reading
    pub min_accept_confidence: u8,
}

impl Default for Config {
    fn default() -> Self {
        Preset::Standard.config()
    }
}

impl Default for CaptureConfig {
    fn default() -> Self {
        Self {
            frame_rate_hint: DEFAULT_FPS,
            pixel_stride: 1,
            channel: GREEN_CHANNEL,
        }
    }
}

impl Default for WindowConfig {
    fn default() -> Self {
        Self {
            min_window_seconds: DEFAULT_MIN_WINDOW_SECONDS,
            max_buffer_seconds: DEFAULT_MAX_BUFFER_SECONDS,
            fps_update_interval_ms: DEFAULT_FPS_UPDATE_INTERVAL_MS,
            fps_history_len: DEFAULT_FPS_HISTORY_LEN,
            detrend_window_seconds: DEFAULT_DETREND_WINDOW_SECONDS,
        }
    }
}

impl Default for MotionConfig {
    fn default() -> Self {
        Self {
            threshold: DEFAULT_MOTION_THRESHOLD,
            consecutive_frames: DEFAULT_MOTION_CONSECUTIVE_FRAMES,
            history_len: DEFAULT_MOTION_HISTORY_LEN,
            retain_seconds: None,
        }
    }
}

impl Default for HeartRateConfig {
    fn default() -> Self {
        Self {
            min_bpm: DEFAULT_MIN_BPM,
            max_bpm: DEFAULT_MAX_BPM,
            min_interval_ms: DEFAULT_MIN_INTERVAL_MS,
            max_interval_ms: DEFAULT_MAX_INTERVAL_MS,
            outlier_tolerance: DEFAULT_OUTLIER_TOLERANCE,
        }
    }
}

impl Default for DetectionConfig {
    fn default() -> Self {
        Self {
            tiers: vec![
                TierConfig {
                    until_seconds: Some(3.0),
                    threshold_percent: 0.15,
                    min_debounce_ms: 150.0,
                    min_peaks: 1,
                },
                TierConfig {
                    until_seconds: Some(8.0),
                    threshold_percent: 0.20,
                    min_debounce_ms: 200.0,
                    min_peaks: 2,
                },
                TierConfig {
                    until_seconds: None,
                    threshold_percent: 0.25,
                    min_debounce_ms: 250.0,
                    min_peaks: 3,
                },
            ],
        }
    }
}

impl Default for SmoothingConfig {
    fn default() -> Self {
        Self {
            previous_weight: DEFAULT_PREVIOUS_WEIGHT,
            stable_delta_bpm: DEFAULT_STABLE_DELTA_BPM,
            stable_frames_for_full_confidence: DEFAULT_STABLE_FRAMES_FOR_FULL_CONFIDENCE,
        }
    }
}

impl Default for ConfidenceConfig {
    fn default() -> Self {
        Self {
            variance_weight: DEFAULT_VARIANCE_WEIGHT,
            stability_weight: DEFAULT_STABILITY_WEIGHT,
            variance_divisor: DEFAULT_VARIANCE_DIVISOR,
        }
    }
}

impl Default for HrvConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            min_peaks: DEFAULT_HRV_MIN_PEAKS,
        }
    }
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            scan_duration_seconds: DEFAULT_SCAN_DURATION_SECONDS,
            min_accept_confidence: DEFAULT_MIN_ACCEPT_CONFIDENCE,
        }
    }
}

/// Calibration presets.
///
/// Two tunings exist in the field: a standalone module with a long warm-up
/// and a UI-embedded variant tuned for quick feedback. Neither is a merge of
/// the other; pick the one matching the capture setup.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Preset {
    /// 5 s warm-up, 15 s history, 40-222 BPM
    #[default]
    Standard,
    /// 1 s warm-up, 10 s history, 45-200 BPM, heavier smoothing
    Responsive,
}

impl Preset {
    /// Parse a preset by name
    ///
    /// # Errors
    ///
    /// Returns an error for unknown preset names
    pub fn from_name(name: &str) -> Result<Self> {
        match name.to_lowercase().as_str() {
            "standard" | "default" => Ok(Self::Standard),
            "responsive" | "embedded" | "ui" => Ok(Self::Responsive),
            _ => Err(Error::ConfigError(format!("Unknown preset: {name}"))),
        }
    }

    /// Preset name
    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::Standard => "standard",
            Self::Responsive => "responsive",
        }
    }

    /// Build the configuration for this preset
    #[must_use]
    pub fn config(self) -> Config {
        let standard = Config {
            capture: CaptureConfig::default(),
            window: WindowConfig::default(),
            motion: MotionConfig::default(),
            heart_rate: HeartRateConfig::default(),
            detection: DetectionConfig::default(),
            smoothing: SmoothingConfig::default(),
            confidence: ConfidenceConfig::default(),
            hrv: HrvConfig::default(),
            session: SessionConfig::default(),
        };

        match self {
            Self::Standard => standard,
            Self::Responsive => Config {
                window: WindowConfig {
                    min_window_seconds: 1.0,
                    max_buffer_seconds: 10.0,
                    ..standard.window
                },
                motion: MotionConfig {
                    threshold: 5.0,
                    retain_seconds: Some(2.0),
                    ..standard.motion
                },
                heart_rate: HeartRateConfig {
                    min_bpm: 45.0,
                    max_bpm: 200.0,
                    ..standard.heart_rate
                },
                detection: DetectionConfig {
                    tiers: vec![
                        TierConfig {
                            until_seconds: Some(2.0),
                            threshold_percent: 0.15,
                            min_debounce_ms: 150.0,
                            min_peaks: 1,
                        },
                        TierConfig {
                            until_seconds: Some(5.0),
                            threshold_percent: 0.20,
                            min_debounce_ms: 200.0,
                            min_peaks: 2,
                        },
                        TierConfig {
                            until_seconds: None,
                            threshold_percent: 0.25,
                            min_debounce_ms: 250.0,
                            min_peaks: 3,
                        },
                    ],
                },
                smoothing: SmoothingConfig {
                    previous_weight: 0.7,
                    ..standard.smoothing
                },
                ..standard
            },
        }
    }
}

impl fmt::Display for Preset {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl DetectionConfig {
    /// Tier in effect after `elapsed_seconds` of scanning
    ///
    /// Falls back to the last tier; [`Config::validate`] guarantees one exists.
    #[must_use]
    pub fn tier_for(&self, elapsed_seconds: f64) -> Option<&TierConfig> {
        self.tiers
            .iter()
            .find(|tier| tier.until_seconds.map_or(true, |until| elapsed_seconds < until))
            .or_else(|| self.tiers.last())
    }
}

impl WindowConfig {
    /// Samples required before estimating at the given frame rate
    #[must_use]
    pub fn min_window_samples(&self, fps: f64) -> usize {
        seconds_to_samples(self.min_window_seconds, fps).max(1)
    }

    /// Samples retained at the given frame rate
    #[must_use]
    pub fn max_window_samples(&self, fps: f64) -> usize {
        seconds_to_samples(self.max_buffer_seconds, fps)
    }

    /// Odd-sized detrending window at the given frame rate, at least 3 samples
    #[must_use]
    pub fn detrend_window_samples(&self, fps: f64) -> usize {
        let samples = seconds_to_samples(self.detrend_window_seconds, fps).max(3);
        if samples % 2 == 0 {
            samples + 1
        } else {
            samples
        }
    }
}

impl Config {
    /// Configuration for a named preset
    #[must_use]
    pub fn preset(preset: Preset) -> Self {
        preset.config()
    }

    /// Load configuration from a YAML file
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or parsed
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = std::fs::read_to_string(path).map_err(|e| Error::IoError(e.to_string()))?;

        Self::from_yaml(&content)
    }

    /// Parse configuration from YAML text
    ///
    /// # Errors
    ///
    /// Returns an error if the YAML is malformed
    pub fn from_yaml(content: &str) -> Result<Self> {
        serde_yaml::from_str(content).map_err(|e| Error::ConfigError(format!("Failed to parse config: {e}")))
    }

    /// Save configuration to a YAML file
    ///
    /// # Errors
    ///
    /// Returns an error if serialization or the write fails
    pub fn to_file<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let content = self.to_yaml()?;

        std::fs::write(path, content).map_err(|e| Error::IoError(e.to_string()))?;

        Ok(())
    }

    /// Serialize configuration to YAML text
    ///
    /// # Errors
    ///
    /// Returns an error if serialization fails
    pub fn to_yaml(&self) -> Result<String> {
        serde_yaml::to_string(self).map_err(|e| Error::ConfigError(format!("Failed to serialize config: {e}")))
    }

    /// Validate configuration
    ///
    /// # Errors
    ///
    /// Returns a `ConfigError` describing the first invalid setting
    pub fn validate(&self) -> Result<()> {
        // Capture
        let fps = self.capture.frame_rate_hint;
        if !(MIN_EFFECTIVE_FPS..=MAX_EFFECTIVE_FPS).contains(&fps) {
            return Err(Error::ConfigError(format!(
                "Frame rate hint must be in [{MIN_EFFECTIVE_FPS}, {MAX_EFFECTIVE_FPS}], got {fps}"
            )));
        }
        if self.capture.pixel_stride == 0 {
            return Err(Error::ConfigError("Pixel stride must be at least 1".to_string()));
        }

        // Windows
        let window = &self.window;
        if !(is_positive(window.min_window_seconds) && is_positive(window.max_buffer_seconds)) {
            return Err(Error::ConfigError("Window durations must be positive".to_string()));
        }
        if window.max_buffer_seconds > MAX_BUFFER_SECONDS {
            return Err(Error::ConfigError(format!(
                "Max buffer of {} s exceeds the {MAX_BUFFER_SECONDS} s limit",
                window.max_buffer_seconds
            )));
        }
        let (min_samples, max_samples) = (window.min_window_samples(fps), window.max_window_samples(fps));
        if max_samples < min_samples {
            return Err(Error::ConfigError(format!(
                "Max window ({max_samples} samples) is smaller than min window ({min_samples} samples)"
            )));
        }
        if !is_positive(window.fps_update_interval_ms) {
            return Err(Error::ConfigError("Frame rate update interval must be positive".to_string()));
        }
        if window.fps_history_len < 2 {
            return Err(Error::ConfigError("Frame rate history must hold at least 2 timestamps".to_string()));
        }
        if !(is_positive(window.detrend_window_seconds) && window.detrend_window_seconds <= window.max_buffer_seconds) {
            return Err(Error::ConfigError(
                "Detrend window must be positive and no longer than the max buffer".to_string(),
            ));
        }

        // Motion
        if !is_positive(self.motion.threshold) {
            return Err(Error::ConfigError("Motion threshold must be greater than 0".to_string()));
        }
        if self.motion.consecutive_frames == 0 {
            return Err(Error::ConfigError("Motion consecutive frames must be greater than 0".to_string()));
        }
        if self.motion.history_len < 2 {
            return Err(Error::ConfigError("Motion history must hold at least 2 samples".to_string()));
        }
        if matches!(self.motion.retain_seconds, Some(seconds) if !is_positive(seconds)) {
            return Err(Error::ConfigError("Motion retain window must be positive".to_string()));
        }

        // Heart rate
        let hr = &self.heart_rate;
        if !(is_positive(hr.min_bpm) && hr.max_bpm.is_finite() && hr.min_bpm < hr.max_bpm) {
            return Err(Error::ConfigError(format!(
                "Heart rate bounds invalid: min {} must be positive and below max {}",
                hr.min_bpm, hr.max_bpm
            )));
        }
        let intervals_valid = is_positive(hr.min_interval_ms)
            && hr.max_interval_ms.is_finite()
            && hr.min_interval_ms < hr.max_interval_ms;
        if !intervals_valid {
            return Err(Error::ConfigError(format!(
                "Interval bounds invalid: min {} ms must be positive and below max {} ms",
                hr.min_interval_ms, hr.max_interval_ms
            )));
        }
        if !(hr.outlier_tolerance > 0.0 && hr.outlier_tolerance <= 1.0) {
            return Err(Error::ConfigError("Outlier tolerance must be in (0, 1]".to_string()));
        }

        self.validate_tiers()?;

        // Smoothing and confidence
        if !(0.0..1.0).contains(&self.smoothing.previous_weight) {
            return Err(Error::ConfigError("Previous weight must be in [0, 1)".to_string()));
        }
        if !is_positive(self.smoothing.stable_delta_bpm) {
            return Err(Error::ConfigError("Stable delta must be positive".to_string()));
        }
        if self.smoothing.stable_frames_for_full_confidence == 0 {
            return Err(Error::ConfigError(
                "Stable frames for full confidence must be greater than 0".to_string(),
            ));
        }
        let confidence = &self.confidence;
        let weights = confidence.variance_weight + confidence.stability_weight;
        let weights_valid = is_non_negative(confidence.variance_weight)
            && is_non_negative(confidence.stability_weight)
            && (weights - 1.0).abs() <= 1e-6;
        if !weights_valid {
            return Err(Error::ConfigError(
                "Confidence weights must be non-negative and sum to 1.0".to_string(),
            ));
        }
        if !(confidence.variance_divisor.is_finite() && confidence.variance_divisor > EPSILON) {
            return Err(Error::ConfigError("Variance divisor must be positive".to_string()));
        }

        // HRV and session
        if self.hrv.min_peaks < MIN_HRV_PEAKS {
            return Err(Error::ConfigError(format!("HRV needs at least {MIN_HRV_PEAKS} peaks")));
        }
        if !is_positive(self.session.scan_duration_seconds) {
            return Err(Error::ConfigError("Scan duration must be positive".to_string()));
        }
        if self.session.min_accept_confidence > 100 {
            return Err(Error::ConfigError("Accept confidence must be at most 100".to_string()));
        }

        Ok(())
    }

    fn validate_tiers(&self) -> Result<()> {
        let tiers = &self.detection.tiers;
        let Some(last) = tiers.last() else {
            return Err(Error::ConfigError("At least one detection tier is required".to_string()));
        };
        if last.until_seconds.is_some() {
            return Err(Error::ConfigError("Last detection tier must be open-ended".to_string()));
        }

        let mut previous_until = 0.0;
        for (index, tier) in tiers.iter().enumerate() {
            if !(tier.threshold_percent > 0.0 && tier.threshold_percent < 1.0) {
                return Err(Error::ConfigError(format!(
                    "Tier {index}: threshold percent must be in (0, 1)"
                )));
            }
            if !is_non_negative(tier.min_debounce_ms) {
                return Err(Error::ConfigError(format!("Tier {index}: debounce must be non-negative")));
            }
            if tier.min_peaks == 0 {
                return Err(Error::ConfigError(format!("Tier {index}: min peaks must be greater than 0")));
            }
            if index + 1 < tiers.len() {
                match tier.until_seconds {
                    Some(until) if until > previous_until => previous_until = until,
                    _ => {
                        return Err(Error::ConfigError(format!(
                            "Tier {index}: boundaries must be strictly increasing"
                        )))
                    }
                }
            }
        }

        Ok(())
    }
}

/// Finite and greater than zero
fn is_positive(value: f64) -> bool {
    value.is_finite() && value > 0.0
}

/// Finite and not negative
fn is_non_negative(value: f64) -> bool {
    value.is_finite() && value >= 0.0
}

/// Example configuration file content
pub const EXAMPLE_CONFIG: &str = r#"# rPPG Engine Configuration (standard preset)

capture:
  frame_rate_hint: 30.0
  pixel_stride: 4
  channel: 1

window:
  min_window_seconds: 5.0
  max_buffer_seconds: 15.0
  fps_update_interval_ms: 1000.0
  fps_history_len: 60
  detrend_window_seconds: 1.0

motion:
  threshold: 8.0
  consecutive_frames: 3
  history_len: 10
  retain_seconds: null

heart_rate:
  min_bpm: 40.0
  max_bpm: 222.0
  min_interval_ms: 270.0
  max_interval_ms: 1500.0
  outlier_tolerance: 0.4

detection:
  tiers:
    - { until_seconds: 3.0, threshold_percent: 0.15, min_debounce_ms: 150.0, min_peaks: 1 }
    - { until_seconds: 8.0, threshold_percent: 0.20, min_debounce_ms: 200.0, min_peaks: 2 }
    - { until_seconds: null, threshold_percent: 0.25, min_debounce_ms: 250.0, min_peaks: 3 }

smoothing:
  previous_weight: 0.6
  stable_delta_bpm: 5.0
  stable_frames_for_full_confidence: 20

confidence:
  variance_weight: 0.6
  stability_weight: 0.4
  variance_divisor: 10.0

hrv:
  enabled: true
  min_peaks: 5

session:
  scan_duration_seconds: 15.0
  min_accept_confidence: 40
"#;

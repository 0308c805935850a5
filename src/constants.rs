//! Constants used throughout the engine

/// Default assumed frame rate before the first recalculation
pub const DEFAULT_FPS: f64 = 30.0;

/// Lowest and highest frame rate accepted from the recalculation
pub const MIN_EFFECTIVE_FPS: f64 = 1.0;
pub const MAX_EFFECTIVE_FPS: f64 = 240.0;

/// Channel index most absorbed by hemoglobin (green in RGB/RGBA order)
pub const GREEN_CHANNEL: usize = 1;

/// Minimum channels a frame sample must carry
pub const MIN_CHANNELS: usize = 3;

/// Warm-up and retention windows
pub const DEFAULT_MIN_WINDOW_SECONDS: f64 = 5.0;
pub const DEFAULT_MAX_BUFFER_SECONDS: f64 = 15.0;

/// Longest retention window a configuration may request
pub const MAX_BUFFER_SECONDS: f64 = 600.0;

/// Frame-rate recalculation cadence and history
pub const DEFAULT_FPS_UPDATE_INTERVAL_MS: f64 = 1000.0;
pub const DEFAULT_FPS_HISTORY_LEN: usize = 60;

/// Centered moving-average window for detrending
pub const DEFAULT_DETREND_WINDOW_SECONDS: f64 = 1.0;

/// Motion gate defaults
pub const DEFAULT_MOTION_THRESHOLD: f64 = 8.0;
pub const DEFAULT_MOTION_CONSECUTIVE_FRAMES: u32 = 3;
pub const DEFAULT_MOTION_HISTORY_LEN: usize = 10;

/// Physiological bounds
pub const DEFAULT_MIN_BPM: f64 = 40.0;
pub const DEFAULT_MAX_BPM: f64 = 222.0;
pub const DEFAULT_MIN_INTERVAL_MS: f64 = 270.0;
pub const DEFAULT_MAX_INTERVAL_MS: f64 = 1500.0;

/// Maximum relative deviation from the median interval
pub const DEFAULT_OUTLIER_TOLERANCE: f64 = 0.40;

/// Milliseconds per minute, for interval to BPM conversion
pub const MS_PER_MINUTE: f64 = 60_000.0;

/// Weight of the previous displayed value in the stability blend
pub const DEFAULT_PREVIOUS_WEIGHT: f64 = 0.6;

/// Blended change below which a frame counts as stable
pub const DEFAULT_STABLE_DELTA_BPM: f64 = 5.0;

/// Stable frames needed for full stability confidence
pub const DEFAULT_STABLE_FRAMES_FOR_FULL_CONFIDENCE: u32 = 20;

/// Confidence weights and variance mapping
pub const DEFAULT_VARIANCE_WEIGHT: f64 = 0.6;
pub const DEFAULT_STABILITY_WEIGHT: f64 = 0.4;
pub const DEFAULT_VARIANCE_DIVISOR: f64 = 10.0;

/// Confidence reported for degraded statuses
pub const DETECTING_CONFIDENCE: u8 = 10;
pub const FILTERING_CONFIDENCE: u8 = 15;
pub const HIGH_VARIANCE_CONFIDENCE: u8 = 20;

/// Quality label cut-offs
pub const QUALITY_EXCELLENT: u8 = 80;
pub const QUALITY_GOOD: u8 = 60;
pub const QUALITY_FAIR: u8 = 40;

/// HRV analysis
pub const DEFAULT_HRV_MIN_PEAKS: usize = 5;
/// Fewest peaks that yield two successive interval differences
pub const MIN_HRV_PEAKS: usize = 4;
pub const NN50_THRESHOLD_MS: f64 = 50.0;
pub const LF_HF_PARASYMPATHETIC_BELOW: f64 = 1.5;
pub const LF_HF_SYMPATHETIC_ABOVE: f64 = 3.0;

/// Scan session defaults
pub const DEFAULT_SCAN_DURATION_SECONDS: f64 = 15.0;
pub const CALIBRATING_PROGRESS_PERCENT: f64 = 33.0;
pub const DEFAULT_MIN_ACCEPT_CONFIDENCE: u8 = 40;
pub const ACCEPT_MIN_BPM: f64 = 40.0;
pub const ACCEPT_MAX_BPM: f64 = 200.0;

/// Numeric precision epsilon
pub const EPSILON: f64 = 1e-10;

//! Scan runner: drives one engine over a frame source for a fixed duration
//! and turns its last result into an accept/reject decision.

use crate::{
    config::Config,
    confidence::Quality,
    constants::{ACCEPT_MAX_BPM, ACCEPT_MIN_BPM, CALIBRATING_PROGRESS_PERCENT},
    engine::{RppgEngine, RppgResult},
    error::{Error, Result},
    frame::Frame,
    hrv::HrvMetrics,
    utils::{
        image_conversion::{dynamic_to_array3, Roi},
        safe_cast::{count_to_f64, seconds_to_samples},
    },
};
use log::{debug, info};
use ndarray::Array3;
use serde::Serialize;
use std::f64::consts::PI;
use std::fmt;
use std::path::{Path, PathBuf};

/// Image extensions picked up by [`ImageSequenceSource`]
const IMAGE_EXTENSIONS: [&str; 4] = ["png", "jpg", "jpeg", "bmp"];

/// Edge length of synthetic frames in pixels
const SYNTHETIC_FRAME_SIZE: usize = 8;

/// Pulse phase at t = 0 (rad); keeps crests off the sample grid
const SYNTHETIC_PHASE: f64 = 0.3;

/// One frame produced by a source
#[derive(Debug, Clone)]
pub struct SourceFrame {
    /// `(height, width, channels)` pixels of the skin region
    pub pixels: Array3<u8>,
    /// Capture time
    pub timestamp_ms: f64,
}

/// Anything that yields timestamped skin-region frames
pub trait FrameSource {
    /// Next frame, `None` when exhausted
    ///
    /// # Errors
    ///
    /// Returns an error if a frame cannot be loaded
    fn next_frame(&mut self) -> Result<Option<SourceFrame>>;

    /// Human-readable source name
    fn name(&self) -> &str;

    /// Frame rate the source was captured or generated at
    fn nominal_fps(&self) -> f64;
}

/// Sinusoidal pulse rendered into uniform frames
#[derive(Debug, Clone)]
pub struct SyntheticSource {
    bpm: f64,
    fps: f64,
    amplitude: f64,
    baseline: f64,
    total_frames: usize,
    motion_frames: Option<(usize, usize)>,
    motion_offset: f64,
    index: usize,
}

impl SyntheticSource {
    /// Pulse at `bpm` sampled at `fps` for `duration_seconds`
    ///
    /// # Errors
    ///
    /// Returns an error if any argument is not positive
    pub fn new(bpm: f64, fps: f64, duration_seconds: f64) -> Result<Self> {
        if !(bpm > 0.0 && fps > 0.0 && duration_seconds > 0.0) {
            return Err(Error::InvalidInput(format!(
                "Synthetic source needs positive bpm, fps and duration (got {bpm}, {fps}, {duration_seconds})"
            )));
        }
        Ok(Self {
            bpm,
            fps,
            amplitude: 10.0,
            baseline: 100.0,
            total_frames: seconds_to_samples(duration_seconds, fps),
            motion_frames: None,
            motion_offset: 40.0,
            index: 0,
        })
    }

    /// Set pulse amplitude and baseline intensity
    #[must_use]
    pub const fn with_amplitude(mut self, amplitude: f64, baseline: f64) -> Self {
        self.amplitude = amplitude;
        self.baseline = baseline;
        self
    }

    /// Alternate a large intensity offset on frames `start..end`
    #[must_use]
    pub const fn with_motion_burst(mut self, start: usize, end: usize) -> Self {
        self.motion_frames = Some((start, end));
        self
    }

    /// Intensity of frame `index` before rendering
    #[must_use]
    pub fn intensity_at(&self, index: usize) -> f64 {
        let t = count_to_f64(index) / self.fps;
        let phase = (2.0 * PI * self.bpm / 60.0).mul_add(t, SYNTHETIC_PHASE);
        let mut value = self.amplitude.mul_add(phase.sin(), self.baseline);
        if let Some((start, end)) = self.motion_frames {
            if (start..end).contains(&index) {
                value += if index % 2 == 0 { self.motion_offset } else { -self.motion_offset };
            }
        }
        value.clamp(0.0, 255.0)
    }

    /// Frames this source yields in total
    #[must_use]
    pub const fn total_frames(&self) -> usize {
        self.total_frames
    }
}

impl FrameSource for SyntheticSource {
    fn next_frame(&mut self) -> Result<Option<SourceFrame>> {
        if self.index >= self.total_frames {
            return Ok(None);
        }
        let pixels = render_dithered(self.intensity_at(self.index), SYNTHETIC_FRAME_SIZE);
        let timestamp_ms = count_to_f64(self.index) * 1000.0 / self.fps;
        self.index += 1;
        Ok(Some(SourceFrame { pixels, timestamp_ms }))
    }

    fn name(&self) -> &str {
        "synthetic"
    }

    fn nominal_fps(&self) -> f64 {
        self.fps
    }
}

/// Uniform `size × size` RGB frame whose green plane averages to `green`
///
/// The fractional part is spread evenly over the pixels, so the plane mean
/// resolves steps of `1 / size²`.
#[must_use]
#[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)] // Clamped to 0-255
pub fn render_dithered(green: f64, size: usize) -> Array3<u8> {
    let green = green.clamp(0.0, 255.0);
    let base = green.floor();
    let pixel_count = size * size;
    let raised = ((green - base) * count_to_f64(pixel_count)).round() as usize;
    let (base, pixel_count) = (base as u8, pixel_count.max(1));

    Array3::from_shape_fn((size, size, 3), |(y, x, c)| match c {
        0 => 100,
        1 => {
            let k = y * size + x;
            if (k + 1) * raised / pixel_count > k * raised / pixel_count {
                base.saturating_add(1)
            } else {
                base
            }
        }
        _ => 50,
    })
}

/// Directory of still images played back at a nominal frame rate
#[derive(Debug, Clone)]
pub struct ImageSequenceSource {
    name: String,
    paths: Vec<PathBuf>,
    fps: f64,
    roi: Option<Roi>,
    index: usize,
}

impl ImageSequenceSource {
    /// Collect image files in `dir`, sorted by file name
    ///
    /// # Errors
    ///
    /// Returns an error if the directory cannot be read, holds no images,
    /// or `fps` is not positive
    pub fn new<P: AsRef<Path>>(dir: P, fps: f64, roi: Option<Roi>) -> Result<Self> {
        let dir = dir.as_ref();
        if !(fps.is_finite() && fps > 0.0) {
            return Err(Error::InvalidInput(format!("Frame rate must be positive, got {fps}")));
        }

        let mut paths = Vec::new();
        for entry in std::fs::read_dir(dir)? {
            let path = entry?.path();
            let is_image = path
                .extension()
                .and_then(|ext| ext.to_str())
                .is_some_and(|ext| IMAGE_EXTENSIONS.contains(&ext.to_ascii_lowercase().as_str()));
            if is_image {
                paths.push(path);
            }
        }
        paths.sort();

        if paths.is_empty() {
            return Err(Error::InvalidInput(format!("No image files found in {}", dir.display())));
        }
        info!("Found {} frames in {}", paths.len(), dir.display());

        Ok(Self {
            name: dir.display().to_string(),
            paths,
            fps,
            roi,
            index: 0,
        })
    }

    /// Number of frames in the sequence
    #[must_use]
    pub fn len(&self) -> usize {
        self.paths.len()
    }

    /// The sequence holds no frames
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.paths.is_empty()
    }
}

impl FrameSource for ImageSequenceSource {
    fn next_frame(&mut self) -> Result<Option<SourceFrame>> {
        let Some(path) = self.paths.get(self.index) else {
            return Ok(None);
        };
        let image = image::open(path)?;
        let pixels = dynamic_to_array3(&image, self.roi)?;
        let timestamp_ms = count_to_f64(self.index) * 1000.0 / self.fps;
        self.index += 1;
        Ok(Some(SourceFrame { pixels, timestamp_ms }))
    }

    fn name(&self) -> &str {
        &self.name
    }

    fn nominal_fps(&self) -> f64 {
        self.fps
    }
}

/// Coarse scan phase shown to the user
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ScanPhase {
    /// First third of the scan
    Calibrating,
    /// Remainder of the scan
    Measuring,
}

impl ScanPhase {
    /// Phase for a progress percentage
    #[must_use]
    pub fn from_progress(progress_percent: f64) -> Self {
        if progress_percent < CALIBRATING_PROGRESS_PERCENT {
            Self::Calibrating
        } else {
            Self::Measuring
        }
    }
}

impl fmt::Display for ScanPhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Calibrating => f.write_str("calibrating"),
            Self::Measuring => f.write_str("measuring"),
        }
    }
}

/// Result of one frame plus scan progress
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SessionUpdate {
    /// Engine output for this frame
    pub result: RppgResult,
    /// 0-100
    pub progress_percent: f64,
    /// Phase at this progress
    pub phase: ScanPhase,
}

/// Final decision for a scan
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum ScanOutcome {
    /// Reading shown to the user
    Accepted {
        /// Final displayed heart rate
        bpm: f64,
        /// Confidence of the final reading
        confidence: u8,
        /// Quality label of the final reading
        quality: Quality,
        /// HRV block of the final reading, if any
        hrv: Option<HrvMetrics>,
        /// Frames processed
        frames: usize,
    },
    /// No trustworthy reading
    Rejected {
        /// Why the reading was rejected
        reason: String,
        /// Last engine result, if any frame was processed
        last: Option<RppgResult>,
        /// Frames processed
        frames: usize,
    },
}

impl ScanOutcome {
    /// The scan produced an accepted reading
    #[must_use]
    pub const fn is_accepted(&self) -> bool {
        matches!(self, Self::Accepted { .. })
    }

    /// Accepted heart rate
    #[must_use]
    pub const fn bpm(&self) -> Option<f64> {
        match self {
            Self::Accepted { bpm, .. } => Some(*bpm),
            Self::Rejected { .. } => None,
        }
    }
}

/// One timed scan over one engine
#[derive(Debug, Clone)]
pub struct ScanSession {
    config: Config,
    engine: RppgEngine,
    frames: usize,
    first_timestamp_ms: Option<f64>,
    last_timestamp_ms: Option<f64>,
}

impl ScanSession {
    /// Create a session; call [`start`](Self::start) before feeding frames
    ///
    /// # Errors
    ///
    /// Returns a `ConfigError` if the configuration does not validate
    pub fn new(config: Config) -> Result<Self> {
        Ok(Self {
            engine: RppgEngine::new(config.clone())?,
            config,
            frames: 0,
            first_timestamp_ms: None,
            last_timestamp_ms: None,
        })
    }

    /// Begin (or restart) the scan
    ///
    /// # Errors
    ///
    /// Returns a `ConfigError` if the configuration does not validate
    pub fn start(&mut self) -> Result<()> {
        self.engine.reset(self.config.clone())?;
        self.frames = 0;
        self.first_timestamp_ms = None;
        self.last_timestamp_ms = None;
        Ok(())
    }

    /// Process one frame
    ///
    /// # Errors
    ///
    /// Propagates engine errors (malformed frame, bad timestamp, scan not started)
    pub fn feed(&mut self, frame: &Frame<'_>, timestamp_ms: f64) -> Result<SessionUpdate> {
        let result = self.engine.process_frame(frame, timestamp_ms)?;
        self.frames += 1;
        self.first_timestamp_ms.get_or_insert(timestamp_ms);
        self.last_timestamp_ms = Some(timestamp_ms);

        let progress_percent = self.progress();
        Ok(SessionUpdate {
            result,
            progress_percent,
            phase: ScanPhase::from_progress(progress_percent),
        })
    }

    /// Share of the scan duration covered so far, 0-100
    ///
    /// Each frame covers one frame period, so a full scan at a steady rate
    /// reaches exactly 100.
    #[must_use]
    pub fn progress(&self) -> f64 {
        let (Some(first), Some(last)) = (self.first_timestamp_ms, self.last_timestamp_ms) else {
            return 0.0;
        };
        let covered_ms = last - first + 1000.0 / self.engine.effective_frame_rate();
        let duration_ms = self.config.session.scan_duration_seconds * 1000.0;
        (covered_ms / duration_ms * 100.0).clamp(0.0, 100.0)
    }

    /// Current phase
    #[must_use]
    pub fn phase(&self) -> ScanPhase {
        ScanPhase::from_progress(self.progress())
    }

    /// Scan duration reached
    #[must_use]
    pub fn is_complete(&self) -> bool {
        self.progress() >= 100.0
    }

    /// Frames processed since the last start
    #[must_use]
    pub const fn frames(&self) -> usize {
        self.frames
    }

    /// Underlying engine
    #[must_use]
    pub const fn engine(&self) -> &RppgEngine {
        &self.engine
    }

    /// End the scan and decide whether to show the reading
    pub fn stop(&mut self) -> ScanOutcome {
        let last = self.engine.finish();
        let outcome = decide(last, self.config.session.min_accept_confidence, self.frames);
        match &outcome {
            ScanOutcome::Accepted { bpm, confidence, .. } => {
                info!("Scan accepted: {bpm:.1} bpm at {confidence}% confidence");
            }
            ScanOutcome::Rejected { reason, .. } => info!("Scan rejected: {reason}"),
        }
        outcome
    }

    /// Start, feed every frame of `source` until the scan completes or the
    /// source runs dry, then stop
    ///
    /// # Errors
    ///
    /// Propagates source and engine errors
    pub fn run<S: FrameSource + ?Sized>(&mut self, source: &mut S) -> Result<ScanOutcome> {
        info!(
            "Scanning {} at {:.1} fps for {:.0} s",
            source.name(),
            source.nominal_fps(),
            self.config.session.scan_duration_seconds
        );
        self.start()?;

        let mut last_logged_decile = 0_u8;
        while let Some(source_frame) = source.next_frame()? {
            let frame = Frame::new(source_frame.pixels.view())?;
            let update = self.feed(&frame, source_frame.timestamp_ms)?;
            debug!(
                "{:>6.0} ms {:?} bpm={:?} conf={} {}",
                source_frame.timestamp_ms,
                update.result.status,
                update.result.bpm,
                update.result.confidence,
                update.result.debug
            );

            #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)] // Progress is 0-100
            let decile = (update.progress_percent / 10.0).floor() as u8;
            if decile > last_logged_decile {
                last_logged_decile = decile;
                info!("{} {:.0}%", update.phase, update.progress_percent);
            }

            if self.is_complete() {
                break;
            }
        }

        Ok(self.stop())
    }
}

/// Accept the last reading when it is plausible and confident enough
fn decide(last: Option<RppgResult>, min_confidence: u8, frames: usize) -> ScanOutcome {
    let reject = |reason: String, last: Option<RppgResult>| ScanOutcome::Rejected { reason, last, frames };

    let Some(result) = last else {
        return reject("no frames processed".to_string(), None);
    };
    let Some(bpm) = result.bpm else {
        return reject("no heart rate detected".to_string(), Some(result));
    };
    if !(ACCEPT_MIN_BPM..=ACCEPT_MAX_BPM).contains(&bpm) {
        return reject(
            format!("heart rate {bpm:.1} outside {ACCEPT_MIN_BPM:.0}-{ACCEPT_MAX_BPM:.0} bpm"),
            Some(result),
        );
    }
    if result.confidence < min_confidence {
        return reject(
            format!("confidence {} below {min_confidence}", result.confidence),
            Some(result),
        );
    }

    ScanOutcome::Accepted {
        bpm,
        confidence: result.confidence,
        quality: result.quality,
        hrv: result.hrv,
        frames,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::{EstimateStatus, ScanState};

    fn result_with(bpm: Option<f64>, confidence: u8) -> RppgResult {
        RppgResult {
            bpm,
            confidence,
            quality: Quality::from_confidence(confidence),
            motion: false,
            stable_frames: 5,
            status: EstimateStatus::Measured,
            state: ScanState::Finished,
            debug: String::new(),
            hrv: None,
            intensity: 150.0,
            timestamp_ms: 15_000.0,
        }
    }

    #[test]
    fn test_decide() {
        assert!(decide(Some(result_with(Some(72.0), 80)), 40, 450).is_accepted());
        assert_eq!(decide(Some(result_with(Some(72.0), 80)), 40, 450).bpm(), Some(72.0));

        assert!(!decide(None, 40, 0).is_accepted());
        assert!(!decide(Some(result_with(None, 0)), 40, 10).is_accepted());
        assert!(!decide(Some(result_with(Some(210.0), 90)), 40, 450).is_accepted());
        assert!(!decide(Some(result_with(Some(35.0), 90)), 40, 450).is_accepted());
        assert!(!decide(Some(result_with(Some(72.0), 39)), 40, 450).is_accepted());
        assert!(decide(Some(result_with(Some(200.0), 40)), 40, 450).is_accepted());
    }

    #[test]
    fn test_phase_cut() {
        assert_eq!(ScanPhase::from_progress(0.0), ScanPhase::Calibrating);
        assert_eq!(ScanPhase::from_progress(32.9), ScanPhase::Calibrating);
        assert_eq!(ScanPhase::from_progress(33.0), ScanPhase::Measuring);
        assert_eq!(ScanPhase::from_progress(100.0), ScanPhase::Measuring);
    }

    #[test]
    fn test_synthetic_source() {
        let mut source = SyntheticSource::new(75.0, 30.0, 1.0).unwrap();
        assert_eq!(source.total_frames(), 30);

        let first = source.next_frame().unwrap().unwrap();
        assert_eq!(first.pixels.dim(), (SYNTHETIC_FRAME_SIZE, SYNTHETIC_FRAME_SIZE, 3));
        let green_mean = first.pixels.index_axis(ndarray::Axis(2), 1).mapv(f64::from).mean().unwrap();
        assert!((green_mean - source.intensity_at(0)).abs() <= 1.0 / 64.0);
        assert_eq!(first.timestamp_ms, 0.0);

        let mut count = 1;
        while source.next_frame().unwrap().is_some() {
            count += 1;
        }
        assert_eq!(count, 30);
        assert!(SyntheticSource::new(0.0, 30.0, 1.0).is_err());
    }

    #[test]
    fn test_render_dithered_mean() {
        for green in [0.0, 99.5, 100.25, 137.9, 255.0] {
            let pixels = render_dithered(green, 8);
            let mean = pixels.index_axis(ndarray::Axis(2), 1).mapv(f64::from).mean().unwrap();
            assert!((mean - green).abs() <= 1.0 / 128.0, "{green} rendered as {mean}");
        }
    }

    #[test]
    fn test_motion_burst_intensity() {
        let source = SyntheticSource::new(75.0, 30.0, 2.0).unwrap().with_motion_burst(10, 20);
        let calm = source.intensity_at(9);
        let jolted = source.intensity_at(10);
        assert!((jolted - calm).abs() > 30.0);
    }
}

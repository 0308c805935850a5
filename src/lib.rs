//! Remote photoplethysmography (rPPG) heart-rate estimation from camera frames.
//!
//! This library estimates heart rate, a confidence score and basic heart-rate
//! variability from a stream of frames showing a patch of facial skin. Blood
//! volume changes modulate the green channel slightly with every heartbeat;
//! the engine recovers that pulse wave and times its peaks.
//!
//! The estimation pipeline consists of:
//! 1. Frame reduction to one green-channel intensity per frame
//! 2. Motion gating on frame-to-frame intensity jumps
//! 3. A sliding window sized from the measured frame rate
//! 4. Detrending with a centered moving average
//! 5. Adaptive peak detection that tightens as the scan matures
//! 6. Interval validation, outlier rejection and BPM conversion
//! 7. Stability smoothing and confidence scoring
//!
//! Face detection and region-of-interest selection are up to the caller.
//!
//! # Examples
//!
//! ## Basic Usage
//!
//! ```
//! use rppg_engine::{config::Config, engine::RppgEngine, frame::Frame};
//! use ndarray::Array3;
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let mut engine = RppgEngine::start(Config::default())?;
//!
//! let pixels = Array3::from_shape_fn((32, 32, 3), |(_, _, c)| [100, 150, 50][c]);
//! let frame = Frame::new(pixels.view())?;
//!
//! let result = engine.process_frame(&frame, 0.0)?;
//! assert!(result.bpm.is_none());
//! println!("{}", result.debug);
//! # Ok(())
//! # }
//! ```
//!
//! ## Running a Timed Scan
//!
//! ```
//! use rppg_engine::{app::{ScanSession, SyntheticSource}, config::Config};
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let mut source = SyntheticSource::new(72.0, 30.0, 15.0)?;
//! let mut session = ScanSession::new(Config::default())?;
//!
//! let outcome = session.run(&mut source)?;
//! if let Some(bpm) = outcome.bpm() {
//!     println!("Heart rate: {bpm:.0} bpm");
//! }
//! # Ok(())
//! # }
//! ```
//!
//! ## Choosing a Preset
//!
//! ```no_run
//! use rppg_engine::config::{Config, Preset};
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let mut config = Config::preset(Preset::from_name("responsive")?);
//! config.capture.pixel_stride = 4;
//! config.to_file("rppg.yaml")?;
//! # Ok(())
//! # }
//! ```

/// Error types and result handling
pub mod error;

/// Constants used throughout the library
pub mod constants;

/// Configuration management and calibration presets
pub mod config;

/// Frame view and green-channel reduction
pub mod frame;

/// Signal conditioning stages
pub mod signal;

/// Stability smoothing of displayed heart rate
pub mod smoothing;

/// Confidence scoring and quality labels
pub mod confidence;

/// Heart-rate variability metrics
pub mod hrv;

/// The per-scan estimation engine
pub mod engine;

/// Scan runner and frame sources
pub mod app;

/// Numeric conversions and image helpers
pub mod utils;

pub use error::{Error, Result};

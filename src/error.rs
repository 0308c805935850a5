//! Error types for the rPPG engine.
//!
//! Only caller-contract violations are errors. Noisy input (warm-up, motion,
//! implausible estimates) is reported through [`crate::engine::RppgResult`].

use thiserror::Error;

/// Main error type for the library
#[derive(Error, Debug)]
pub enum Error {
    /// File I/O operation failed
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Image decoding failed
    #[error("Image processing error: {0}")]
    Image(#[from] image::ImageError),

    /// Invalid input parameters provided
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// Frame has no pixels to reduce
    #[error("Empty frame: region contains zero pixels")]
    EmptyFrame,

    /// Frame timestamps must strictly increase within a scan
    #[error("Non-monotonic timestamp: {current} ms does not follow {previous} ms")]
    NonMonotonicTimestamp {
        /// Timestamp of the last accepted frame
        previous: f64,
        /// Offending timestamp
        current: f64,
    },

    /// Frame delivered while no scan is running
    #[error("Scan not active (state: {0}); call reset() first")]
    ScanNotActive(String),

    /// Configuration error
    #[error("Configuration error: {0}")]
    ConfigError(String),

    /// Generic I/O error with description
    #[error("I/O error: {0}")]
    IoError(String),
}

/// Convenience type alias for Results with our Error type
pub type Result<T> = std::result::Result<T, Error>;

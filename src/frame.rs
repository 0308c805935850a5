//! Camera frame view and the frame reducer.
//!
//! A [`Frame`] borrows a caller-cropped skin region as a `height × width ×
//! channels` grid of 8-bit samples. The [`FrameReducer`] collapses it to the
//! mean of the channel most absorbed by hemoglobin.

use crate::config::CaptureConfig;
use crate::constants::{GREEN_CHANNEL, MIN_CHANNELS};
use crate::utils::safe_cast::count_to_f64;
use crate::{Error, Result};
use ndarray::{ArrayView3, Axis};

/// Borrowed view of one frame's region of interest
#[derive(Debug, Clone, Copy)]
pub struct Frame<'a> {
    pixels: ArrayView3<'a, u8>,
}

impl<'a> Frame<'a> {
    /// Wrap an existing `(height, width, channels)` view
    ///
    /// # Errors
    ///
    /// Returns an error if samples carry fewer than 3 channels
    pub fn new(pixels: ArrayView3<'a, u8>) -> Result<Self> {
        let channels = pixels.len_of(Axis(2));
        if channels < MIN_CHANNELS {
            return Err(Error::InvalidInput(format!(
                "Frame needs at least {MIN_CHANNELS} channels, got {channels}"
            )));
        }
        Ok(Self { pixels })
    }

    /// Interpret interleaved row-major bytes as a frame
    ///
    /// # Errors
    ///
    /// Returns an error if `data` does not hold exactly `width * height * channels` bytes
    /// or if there are fewer than 3 channels
    pub fn from_raw(data: &'a [u8], width: usize, height: usize, channels: usize) -> Result<Self> {
        let pixels = ArrayView3::from_shape((height, width, channels), data).map_err(|e| {
            Error::InvalidInput(format!(
                "Buffer of {} bytes does not match {width}x{height}x{channels}: {e}",
                data.len()
            ))
        })?;
        Self::new(pixels)
    }

    /// Frame width in pixels
    #[must_use]
    pub fn width(&self) -> usize {
        self.pixels.len_of(Axis(1))
    }

    /// Frame height in pixels
    #[must_use]
    pub fn height(&self) -> usize {
        self.pixels.len_of(Axis(0))
    }

    /// Channels per pixel
    #[must_use]
    pub fn channels(&self) -> usize {
        self.pixels.len_of(Axis(2))
    }

    /// Total number of pixels
    #[must_use]
    pub fn pixel_count(&self) -> usize {
        self.width() * self.height()
    }

    /// Underlying sample grid
    #[must_use]
    pub fn view(&self) -> ArrayView3<'a, u8> {
        self.pixels
    }
}

/// Reduces a frame to one scalar intensity
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FrameReducer {
    stride: usize,
    channel: usize,
}

impl Default for FrameReducer {
    fn default() -> Self {
        Self {
            stride: 1,
            channel: GREEN_CHANNEL,
        }
    }
}

impl FrameReducer {
    /// Create a reducer sampling every `stride`-th pixel of `channel`
    ///
    /// # Errors
    ///
    /// Returns an error if `stride` is zero
    pub fn new(stride: usize, channel: usize) -> Result<Self> {
        if stride == 0 {
            return Err(Error::InvalidInput("Pixel stride must be at least 1".to_string()));
        }
        Ok(Self { stride, channel })
    }

    /// Create a reducer from the capture section of the configuration
    ///
    /// # Errors
    ///
    /// Returns an error if the configured stride is zero
    pub fn from_config(config: &CaptureConfig) -> Result<Self> {
        Self::new(config.pixel_stride, config.channel)
    }

    /// Pixel stride
    #[must_use]
    pub const fn stride(&self) -> usize {
        self.stride
    }

    /// Mean of the configured channel over every `stride`-th pixel in row-major order
    ///
    /// # Errors
    ///
    /// Returns `EmptyFrame` for a region with zero pixels and `InvalidInput` if the
    /// configured channel does not exist in the frame
    pub fn reduce(&self, frame: &Frame<'_>) -> Result<f64> {
        if frame.pixel_count() == 0 {
            return Err(Error::EmptyFrame);
        }
        if self.channel >= frame.channels() {
            return Err(Error::InvalidInput(format!(
                "Channel {} out of range for {}-channel frame",
                self.channel,
                frame.channels()
            )));
        }

        let plane = frame.view().index_axis_move(Axis(2), self.channel);
        let (sum, count) = plane
            .iter()
            .step_by(self.stride)
            .fold((0_u64, 0_usize), |(sum, count), &value| (sum + u64::from(value), count + 1));

        #[allow(clippy::cast_precision_loss)] // Pixel sums stay far below 2^52
        let mean = sum as f64 / count_to_f64(count);
        Ok(mean)
    }
}

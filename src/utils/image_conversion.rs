//! Image conversion utilities for `image` buffers and ndarray interoperability.

use crate::{Error, Result};
use image::{DynamicImage, RgbImage};
use ndarray::Array3;
use std::str::FromStr;

/// Rectangular region of interest in pixel coordinates
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Roi {
    /// Left edge
    pub x: u32,
    /// Top edge
    pub y: u32,
    /// Width in pixels
    pub width: u32,
    /// Height in pixels
    pub height: u32,
}

impl Roi {
    /// Create a region
    #[must_use]
    pub const fn new(x: u32, y: u32, width: u32, height: u32) -> Self {
        Self { x, y, width, height }
    }

    /// Check that the region lies inside a `width × height` image
    ///
    /// # Errors
    ///
    /// Returns an error if the region is empty or extends past the image
    pub fn check_bounds(&self, width: u32, height: u32) -> Result<()> {
        let fits = self.width > 0
            && self.height > 0
            && u64::from(self.x) + u64::from(self.width) <= u64::from(width)
            && u64::from(self.y) + u64::from(self.height) <= u64::from(height);
        if fits {
            Ok(())
        } else {
            Err(Error::InvalidInput(format!(
                "Region {}x{} at ({}, {}) does not fit a {width}x{height} image",
                self.width, self.height, self.x, self.y
            )))
        }
    }
}

impl FromStr for Roi {
    type Err = Error;

    /// Parse `x,y,width,height`
    fn from_str(s: &str) -> Result<Self> {
        let parts = s
            .split(',')
            .map(|part| part.trim().parse::<u32>())
            .collect::<std::result::Result<Vec<_>, _>>()
            .map_err(|e| Error::InvalidInput(format!("Invalid region '{s}': {e}")))?;

        match parts.as_slice() {
            &[x, y, width, height] => Ok(Self::new(x, y, width, height)),
            _ => Err(Error::InvalidInput(format!(
                "Region '{s}' must have the form x,y,width,height"
            ))),
        }
    }
}

/// Convert an RGB image to a `(height, width, 3)` array
///
/// # Errors
///
/// Returns an error if the buffer length does not match the dimensions
pub fn rgb_image_to_array3(image: &RgbImage) -> Result<Array3<u8>> {
    let (width, height) = image.dimensions();
    Array3::from_shape_vec((height as usize, width as usize, 3), image.as_raw().clone())
        .map_err(|e| Error::InvalidInput(format!("Failed to create array from image: {e}")))
}

/// Convert any decoded image to RGB, optionally cropping first
///
/// # Errors
///
/// Returns an error if the region does not fit inside the image
pub fn dynamic_to_array3(image: &DynamicImage, roi: Option<Roi>) -> Result<Array3<u8>> {
    let rgb = match roi {
        Some(roi) => {
            roi.check_bounds(image.width(), image.height())?;
            image.crop_imm(roi.x, roi.y, roi.width, roi.height).to_rgb8()
        }
        None => image.to_rgb8(),
    };
    rgb_image_to_array3(&rgb)
}

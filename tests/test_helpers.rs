//! Helper functions and utilities for tests
#![allow(dead_code)]

use ndarray::Array3;
use rppg_engine::{
    engine::{RppgEngine, RppgResult},
    frame::Frame,
    Result,
};
use std::f64::consts::PI;

/// Frame period at 30 fps
pub const FRAME_MS: f64 = 1000.0 / 30.0;

/// Create a uniform frame with the given RGB value
pub fn uniform_frame(height: usize, width: usize, rgb: [u8; 3]) -> Array3<u8> {
    Array3::from_shape_fn((height, width, 3), |(_, _, c)| rgb[c])
}

/// Rounded green intensity of a sine with `period_frames` samples per beat
pub fn sine_green(index: usize, baseline: f64, amplitude: f64, period_frames: f64) -> u8 {
    let value = amplitude.mul_add((2.0 * PI * index as f64 / period_frames).sin(), baseline);
    value.round().clamp(0.0, 255.0) as u8
}

/// Feed `count` uniform sine frames at 30 fps, starting at frame `start`
pub fn feed_sine_frames(
    engine: &mut RppgEngine,
    start: usize,
    count: usize,
    baseline: f64,
    amplitude: f64,
    period_frames: f64,
) -> Result<Vec<RppgResult>> {
    let mut results = Vec::with_capacity(count);
    for i in start..start + count {
        let green = sine_green(i, baseline, amplitude, period_frames);
        let pixels = uniform_frame(16, 16, [100, green, 50]);
        let frame = Frame::new(pixels.view())?;
        results.push(engine.process_frame(&frame, i as f64 * FRAME_MS)?);
    }
    Ok(results)
}

/// Feed raw intensities at 30 fps, starting at frame `start`
pub fn feed_intensities(
    engine: &mut RppgEngine,
    start: usize,
    values: impl IntoIterator<Item = f64>,
) -> Result<Vec<RppgResult>> {
    values
        .into_iter()
        .enumerate()
        .map(|(offset, value)| engine.process_intensity(value, (start + offset) as f64 * FRAME_MS))
        .collect()
}

//! Tests for frame reduction

mod test_helpers;

use ndarray::{s, Array3};
use proptest::prelude::*;
use rppg_engine::{
    config::CaptureConfig,
    frame::{Frame, FrameReducer},
    Error,
};
use test_helpers::uniform_frame;

#[test]
fn test_uniform_frame_at_common_strides() {
    let pixels = uniform_frame(48, 64, [100, 150, 50]);
    let frame = Frame::new(pixels.view()).unwrap();

    for stride in [1, 4, 8, 16] {
        let reducer = FrameReducer::new(stride, 1).unwrap();
        let value = reducer.reduce(&frame).unwrap();
        assert!((value - 150.0).abs() <= 2.0, "stride {stride} gave {value}");
    }
}

#[test]
fn test_only_green_contributes() {
    let mut pixels = uniform_frame(10, 10, [0, 80, 0]);
    pixels.slice_mut(s![.., .., 0]).fill(255);
    pixels.slice_mut(s![.., .., 2]).fill(255);
    let frame = Frame::new(pixels.view()).unwrap();

    let value = FrameReducer::default().reduce(&frame).unwrap();
    assert!((value - 80.0).abs() < 1e-9);
}

#[test]
fn test_stride_follows_row_major_order() {
    // Green is 200 on even pixels and 0 on odd ones; stride 2 only sees even pixels
    let pixels = Array3::from_shape_fn((4, 5, 3), |(y, x, c)| {
        if c == 1 && (y * 5 + x) % 2 == 0 {
            200
        } else {
            0
        }
    });
    let frame = Frame::new(pixels.view()).unwrap();

    assert!((FrameReducer::new(2, 1).unwrap().reduce(&frame).unwrap() - 200.0).abs() < 1e-9);
    assert!((FrameReducer::new(1, 1).unwrap().reduce(&frame).unwrap() - 100.0).abs() < 1e-9);
}

#[test]
fn test_bgr_frames_use_same_channel_index() {
    // BGR order keeps green at index 1
    let data: Vec<u8> = std::iter::repeat([30, 120, 210]).take(12).flatten().collect();
    let frame = Frame::from_raw(&data, 4, 3, 3).unwrap();

    assert!((FrameReducer::default().reduce(&frame).unwrap() - 120.0).abs() < 1e-9);
}

#[test]
fn test_stride_larger_than_frame() {
    let pixels = uniform_frame(2, 2, [0, 42, 0]);
    let frame = Frame::new(pixels.view()).unwrap();

    // Only the first pixel is sampled
    let value = FrameReducer::new(1000, 1).unwrap().reduce(&frame).unwrap();
    assert!((value - 42.0).abs() < 1e-9);
}

#[test]
fn test_reducer_from_config() {
    let config = CaptureConfig {
        pixel_stride: 4,
        ..CaptureConfig::default()
    };
    assert_eq!(FrameReducer::from_config(&config).unwrap().stride(), 4);

    let zero = CaptureConfig {
        pixel_stride: 0,
        ..CaptureConfig::default()
    };
    assert!(FrameReducer::from_config(&zero).is_err());
}

#[test]
fn test_malformed_frames() {
    let empty = Array3::<u8>::zeros((10, 0, 3));
    let frame = Frame::new(empty.view()).unwrap();
    assert!(matches!(FrameReducer::default().reduce(&frame), Err(Error::EmptyFrame)));

    let gray = Array3::<u8>::zeros((10, 10, 1));
    assert!(matches!(Frame::new(gray.view()), Err(Error::InvalidInput(_))));
}

proptest! {
    #[test]
    fn prop_uniform_frame_any_stride(
        green in 0u8..=255,
        height in 1usize..40,
        width in 1usize..40,
        stride in 1usize..64,
    ) {
        let pixels = uniform_frame(height, width, [17, green, 230]);
        let frame = Frame::new(pixels.view()).unwrap();
        let value = FrameReducer::new(stride, 1).unwrap().reduce(&frame).unwrap();
        prop_assert!((value - f64::from(green)).abs() < 1e-9);
    }
}

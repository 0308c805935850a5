//! Benchmarks for the individual signal stages

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use ndarray::Array3;
use rppg_engine::{
    frame::{Frame, FrameReducer},
    signal::{
        detrend::Detrender,
        intervals::IntervalValidator,
        peaks::PeakDetector,
    },
};
use std::f64::consts::PI;

fn benchmark_frame_reducer(c: &mut Criterion) {
    let mut group = c.benchmark_group("frame_reducer");

    // Noisy 200x200 skin patch
    let pixels = Array3::from_shape_fn((200, 200, 3), |_| 100 + (rand::random::<u8>() % 40));
    let frame = Frame::new(pixels.view()).unwrap();

    for stride in [1, 4, 8, 16] {
        let reducer = FrameReducer::new(stride, 1).unwrap();
        group.bench_with_input(BenchmarkId::new("stride", stride), &frame, |b, frame| {
            b.iter(|| black_box(reducer.reduce(black_box(frame)).unwrap()));
        });
    }

    group.finish();
}

fn benchmark_window_stages(c: &mut Criterion) {
    let mut group = c.benchmark_group("window_stages");

    // 15 s of 72 bpm pulse with drift and sensor noise
    let values: Vec<f64> = (0..450)
        .map(|i| {
            let t = i as f64 / 30.0;
            120.0 + 2.0 * t + 5.0 * (2.0 * PI * 1.2 * t).sin() + rand::random::<f64>()
        })
        .collect();
    let timestamps: Vec<f64> = (0..450).map(|i| i as f64 * 1000.0 / 30.0).collect();

    for window in [15, 31, 61] {
        let detrender = Detrender::new(window);
        group.bench_with_input(BenchmarkId::new("detrend", window), &values, |b, values| {
            b.iter(|| black_box(detrender.apply(black_box(values))));
        });
    }

    let detrended = Detrender::new(31).apply(&values);
    let detector = PeakDetector::new(0.25, 250.0);
    group.bench_function("detect_peaks_450", |b| {
        b.iter(|| black_box(detector.detect(black_box(&detrended), black_box(&timestamps))));
    });

    let peaks = detector.detect(&detrended, &timestamps);
    let intervals = IntervalValidator::peak_intervals(&peaks);
    let validator = IntervalValidator::new(270.0, 1500.0, 0.4);
    group.bench_function("validate_intervals", |b| {
        b.iter(|| black_box(validator.evaluate(black_box(&intervals))));
    });

    group.finish();
}

criterion_group!(benches, benchmark_frame_reducer, benchmark_window_stages);
criterion_main!(benches);

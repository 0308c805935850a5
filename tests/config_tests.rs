//! Tests for configuration loading, presets and validation

use rppg_engine::{
    config::{Config, Preset, TierConfig, EXAMPLE_CONFIG},
    engine::RppgEngine,
    Error,
};
use tempfile::tempdir;

#[test]
fn test_config_file_round_trip() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("rppg.yaml");

    let mut config = Config::preset(Preset::Responsive);
    config.capture.pixel_stride = 8;
    config.to_file(&path).unwrap();

    let loaded = Config::from_file(&path).unwrap();
    assert_eq!(loaded, config);
}

#[test]
fn test_example_config_matches_standard_preset() {
    let example = Config::from_yaml(EXAMPLE_CONFIG).unwrap();
    let standard = Config::preset(Preset::Standard);

    assert_eq!(example.window, standard.window);
    assert_eq!(example.motion, standard.motion);
    assert_eq!(example.heart_rate, standard.heart_rate);
    assert_eq!(example.smoothing, standard.smoothing);
    assert_eq!(example.session, standard.session);
}

#[test]
fn test_partial_config_uses_defaults() {
    let yaml = "capture:\n  pixel_stride: 8\nheart_rate:\n  max_bpm: 180.0\n";
    let config = Config::from_yaml(yaml).unwrap();

    assert_eq!(config.capture.pixel_stride, 8);
    assert_eq!(config.capture.channel, 1);
    assert_eq!(config.heart_rate.max_bpm, 180.0);
    assert_eq!(config.heart_rate.min_bpm, 40.0);
    assert_eq!(config.detection.tiers.len(), 3);
    assert!(config.validate().is_ok());
}

#[test]
fn test_missing_and_malformed_files() {
    let dir = tempdir().unwrap();
    assert!(matches!(
        Config::from_file(dir.path().join("missing.yaml")),
        Err(Error::IoError(_))
    ));

    let bad = dir.path().join("bad.yaml");
    std::fs::write(&bad, "capture: [not, a, map]").unwrap();
    assert!(matches!(Config::from_file(&bad), Err(Error::ConfigError(_))));
}

#[test]
fn test_preset_values() {
    let standard = Config::preset(Preset::Standard);
    assert_eq!(standard.window.min_window_seconds, 5.0);
    assert_eq!(standard.window.max_buffer_seconds, 15.0);
    assert_eq!(standard.motion.threshold, 8.0);
    assert_eq!((standard.heart_rate.min_bpm, standard.heart_rate.max_bpm), (40.0, 222.0));
    assert_eq!(standard.smoothing.previous_weight, 0.6);

    let responsive = Config::preset(Preset::Responsive);
    assert_eq!(responsive.window.min_window_seconds, 1.0);
    assert_eq!(responsive.window.max_buffer_seconds, 10.0);
    assert_eq!(responsive.motion.threshold, 5.0);
    assert_eq!(responsive.motion.retain_seconds, Some(2.0));
    assert_eq!((responsive.heart_rate.min_bpm, responsive.heart_rate.max_bpm), (45.0, 200.0));
    assert_eq!(responsive.smoothing.previous_weight, 0.7);
    assert_eq!(responsive.detection.tiers[0].until_seconds, Some(2.0));
    assert_eq!(responsive.detection.tiers[1].until_seconds, Some(5.0));

    assert_eq!(Preset::default(), Preset::Standard);
    assert_eq!(Preset::Responsive.to_string(), "responsive");
}

#[test]
fn test_validation_rejects_bad_settings() {
    let cases: Vec<(&str, Box<dyn Fn(&mut Config)>)> = vec![
        ("zero stride", Box::new(|c: &mut Config| c.capture.pixel_stride = 0)),
        ("zero fps", Box::new(|c: &mut Config| c.capture.frame_rate_hint = 0.0)),
        ("nan fps", Box::new(|c: &mut Config| c.capture.frame_rate_hint = f64::NAN)),
        ("inverted bpm", Box::new(|c: &mut Config| c.heart_rate.min_bpm = 250.0)),
        ("inverted intervals", Box::new(|c: &mut Config| c.heart_rate.min_interval_ms = 2000.0)),
        ("tolerance", Box::new(|c: &mut Config| c.heart_rate.outlier_tolerance = 1.5)),
        ("weight", Box::new(|c: &mut Config| c.smoothing.previous_weight = 1.0)),
        ("confidence weights", Box::new(|c: &mut Config| c.confidence.variance_weight = 0.9)),
        ("motion frames", Box::new(|c: &mut Config| c.motion.consecutive_frames = 0)),
        ("no tiers", Box::new(|c: &mut Config| c.detection.tiers.clear())),
        ("tier percent", Box::new(|c: &mut Config| c.detection.tiers[0].threshold_percent = 1.2)),
        ("tier order", Box::new(|c: &mut Config| c.detection.tiers[1].until_seconds = Some(2.0))),
        (
            "closed last tier",
            Box::new(|c: &mut Config| {
                let extra = TierConfig {
                    until_seconds: Some(60.0),
                    ..c.detection.tiers[0]
                };
                c.detection.tiers.push(extra);
            }),
        ),
        ("window", Box::new(|c: &mut Config| c.window.max_buffer_seconds = 2.0)),
    ];

    for (name, mutate) in cases {
        let mut config = Config::default();
        mutate(&mut config);
        assert!(
            matches!(config.validate(), Err(Error::ConfigError(_))),
            "{name} was accepted"
        );
        assert!(RppgEngine::new(config).is_err(), "engine accepted {name}");
    }
}

#[test]
fn test_validation_rejects_non_finite_and_oversized_values() {
    let cases: Vec<(&str, Box<dyn Fn(&mut Config)>)> = vec![
        ("nan debounce", Box::new(|c: &mut Config| c.detection.tiers[1].min_debounce_ms = f64::NAN)),
        ("infinite debounce", Box::new(|c: &mut Config| c.detection.tiers[2].min_debounce_ms = f64::INFINITY)),
        ("huge buffer", Box::new(|c: &mut Config| c.window.max_buffer_seconds = 1e17)),
        ("infinite buffer", Box::new(|c: &mut Config| c.window.max_buffer_seconds = f64::INFINITY)),
        ("huge fps hint", Box::new(|c: &mut Config| c.capture.frame_rate_hint = 1e15)),
        ("nan warm-up", Box::new(|c: &mut Config| c.window.min_window_seconds = f64::NAN)),
        ("nan fps interval", Box::new(|c: &mut Config| c.window.fps_update_interval_ms = f64::NAN)),
        ("nan detrend", Box::new(|c: &mut Config| c.window.detrend_window_seconds = f64::NAN)),
        ("detrend past buffer", Box::new(|c: &mut Config| c.window.detrend_window_seconds = 20.0)),
        ("nan retain", Box::new(|c: &mut Config| c.motion.retain_seconds = Some(f64::NAN))),
        ("nan motion threshold", Box::new(|c: &mut Config| c.motion.threshold = f64::NAN)),
        ("infinite max bpm", Box::new(|c: &mut Config| c.heart_rate.max_bpm = f64::INFINITY)),
        ("infinite max interval", Box::new(|c: &mut Config| c.heart_rate.max_interval_ms = f64::INFINITY)),
        ("nan stable delta", Box::new(|c: &mut Config| c.smoothing.stable_delta_bpm = f64::NAN)),
        ("nan variance weight", Box::new(|c: &mut Config| c.confidence.variance_weight = f64::NAN)),
        ("infinite divisor", Box::new(|c: &mut Config| c.confidence.variance_divisor = f64::INFINITY)),
        ("hrv peaks", Box::new(|c: &mut Config| c.hrv.min_peaks = 3)),
        ("nan scan duration", Box::new(|c: &mut Config| c.session.scan_duration_seconds = f64::NAN)),
    ];

    for (name, mutate) in cases {
        let mut config = Config::default();
        mutate(&mut config);
        assert!(
            matches!(config.validate(), Err(Error::ConfigError(_))),
            "{name} was accepted"
        );

        let mut engine = RppgEngine::new(Config::default()).unwrap();
        assert!(engine.reset(config).is_err(), "engine accepted {name}");
    }
}

#[test]
fn test_nan_from_yaml_is_rejected() {
    let yaml = r#"
detection:
  tiers:
    - until_seconds: null
      threshold_percent: 0.25
      min_debounce_ms: .nan
      min_peaks: 3
"#;
    let config = Config::from_yaml(yaml).unwrap();
    assert!(config.detection.tiers[0].min_debounce_ms.is_nan());
    assert!(matches!(config.validate(), Err(Error::ConfigError(_))));

    let config = Config::from_yaml("smoothing:\n  stable_delta_bpm: .nan\n").unwrap();
    assert!(matches!(config.validate(), Err(Error::ConfigError(_))));
}

#[test]
fn test_limits_at_the_edge_are_accepted() {
    let mut config = Config::default();
    config.window.max_buffer_seconds = 600.0;
    config.capture.frame_rate_hint = 240.0;
    config.hrv.min_peaks = 4;
    config.detection.tiers[0].min_debounce_ms = 0.0;
    config.validate().unwrap();

    let engine = RppgEngine::new(config).unwrap();
    assert_eq!(engine.max_window_samples(), 144_000);
}

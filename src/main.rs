//! rPPG heart-rate scanner for image sequences and synthetic pulses.

use anyhow::{bail, Context, Result};
use clap::Parser;
use log::info;
use rppg_engine::{
    app::{FrameSource, ImageSequenceSource, ScanSession, SyntheticSource},
    config::{Config, Preset},
    utils::image_conversion::Roi,
};
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Directory of frame images (sorted by name)
    #[arg(long, conflicts_with = "synthetic_bpm")]
    frames: Option<PathBuf>,

    /// Generate a synthetic pulse at this heart rate instead of reading frames
    #[arg(long)]
    synthetic_bpm: Option<f64>,

    /// Frame rate of the input
    #[arg(long, default_value = "30")]
    fps: f64,

    /// Scan duration in seconds
    #[arg(long, default_value = "15")]
    duration: f64,

    /// Calibration preset (standard, responsive)
    #[arg(short, long, default_value = "standard")]
    preset: String,

    /// Path to configuration file (YAML format), overrides the preset
    #[arg(short = 'C', long)]
    config: Option<PathBuf>,

    /// Sample every n-th pixel of the region
    #[arg(long)]
    stride: Option<usize>,

    /// Skin region to crop from each frame as x,y,width,height
    #[arg(long)]
    roi: Option<Roi>,

    /// Enable debug output
    #[arg(short, long)]
    debug: bool,

    /// Print the effective configuration and exit
    #[arg(long)]
    print_config: bool,
}

fn main() -> Result<()> {
    // Parse command line arguments
    let args = Args::parse();

    // Initialize logger
    if args.debug {
        env_logger::init_from_env(env_logger::Env::new().default_filter_or("debug"));
    } else {
        env_logger::init_from_env(env_logger::Env::new().default_filter_or("info"));
    }

    let mut config = if let Some(path) = &args.config {
        info!("Loading configuration from: {}", path.display());
        Config::from_file(path).with_context(|| format!("loading {}", path.display()))?
    } else {
        let preset = Preset::from_name(&args.preset)?;
        info!("Using {preset} preset");
        Config::preset(preset)
    };
    config.capture.frame_rate_hint = args.fps;
    config.session.scan_duration_seconds = args.duration;
    if let Some(stride) = args.stride {
        config.capture.pixel_stride = stride;
    }
    config.validate()?;

    if args.print_config {
        print!("{}", config.to_yaml()?);
        return Ok(());
    }

    let mut source: Box<dyn FrameSource> = match (&args.frames, args.synthetic_bpm) {
        (Some(dir), _) => Box::new(ImageSequenceSource::new(dir, args.fps, args.roi)?),
        (None, Some(bpm)) => Box::new(SyntheticSource::new(bpm, args.fps, args.duration)?),
        (None, None) => bail!("either --frames <dir> or --synthetic-bpm <bpm> is required"),
    };

    let mut session = ScanSession::new(config)?;
    let outcome = session.run(source.as_mut())?;

    print!("{}", serde_yaml::to_string(&outcome)?);
    Ok(())
}

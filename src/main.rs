//! Baby position validator for recorded or live infant monitoring video.

use anyhow::{Context, Result};
use baby_position_validator::{
    app::{AppConfig, ValidatorApp, VideoSource},
    config::{Config, EXAMPLE_CONFIG},
    detection::{LandmarkDetector, OnnxLandmarkDetector, ScriptedDetector},
};
use clap::Parser;
use log::{info, warn};

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Camera index to use
    #[arg(long, default_value = "0")]
    cam: i32,

    /// Video file to process
    #[arg(short, long)]
    video: Option<String>,

    /// Path to configuration file (YAML format)
    #[arg(short = 'C', long)]
    config: Option<String>,

    /// Replay recorded detections (JSON lines) instead of running the models
    #[arg(long)]
    detections: Option<String>,

    /// Run without a display window
    #[arg(long)]
    no_gui: bool,

    /// Print each frame result and the final summary as JSON
    #[arg(long)]
    json: bool,

    /// Number of warm-up frames before the boundary is set
    #[arg(long)]
    init_frames: Option<u32>,

    /// Padding around landmarks in pixels
    #[arg(long)]
    buffer: Option<i32>,

    /// Distance past the boundary that triggers expansion
    #[arg(long)]
    stretch: Option<i32>,

    /// Write an example configuration file and exit
    #[arg(long, value_name = "PATH")]
    write_config: Option<String>,

    /// Enable debug output
    #[arg(short, long)]
    debug: bool,
}

fn main() -> Result<()> {
    let args = Args::parse();

    if args.debug {
        env_logger::init_from_env(env_logger::Env::new().default_filter_or("debug"));
    } else {
        env_logger::init_from_env(env_logger::Env::new().default_filter_or("info"));
    }

    if let Some(path) = &args.write_config {
        std::fs::write(path, EXAMPLE_CONFIG).with_context(|| format!("Failed to write {path}"))?;
        info!("Example configuration written to {path}");
        return Ok(());
    }

    info!("Baby Position Validator");

    let mut config = if let Some(config_path) = &args.config {
        info!("Loading configuration from: {config_path}");
        match Config::from_file(config_path) {
            Ok(cfg) => cfg,
            Err(e) => {
                warn!("Failed to load config file: {e}. Using defaults.");
                Config::default()
            }
        }
    } else {
        Config::default()
    };

    if let Some(frames) = args.init_frames {
        config.tracker.initialization_frames = frames;
    }
    if let Some(buffer) = args.buffer {
        config.tracker.buffer_distance = buffer;
    }
    if let Some(stretch) = args.stretch {
        config.tracker.stretch_threshold = stretch;
    }
    if args.no_gui {
        config.display.show_window = false;
    }
    config.validate().context("Invalid configuration")?;

    let detector: Box<dyn LandmarkDetector> = if let Some(path) = &args.detections {
        Box::new(ScriptedDetector::from_json_lines(path)?)
    } else {
        config.validate_models()?;
        Box::new(OnnxLandmarkDetector::from_config(&config)?)
    };

    let settings = AppConfig {
        video_source: args.video.map_or(VideoSource::Camera(args.cam), VideoSource::File),
        config,
        json_lines: args.json,
    };

    let report = ValidatorApp::new(settings, detector)?.run()?;

    if args.json {
        println!("{}", serde_json::to_string(&report.summary())?);
    } else {
        println!("\n{report}");
    }

    Ok(())
}

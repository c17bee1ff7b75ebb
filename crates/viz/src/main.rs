//! Billboard scene visualization
//!
//! Run with: cargo run -p viz
//!
//! Examples:
//!   cargo run -p viz -- --demo --seed 7
//!   cargo run -p viz -- --scene scenes/harbor.json --watch
//!   cargo run -p viz -- --scene scenes/harbor.json --headless --frames 120 --step 0.5

use bevy::prelude::*;
use billboard_visualizer::VisualizerConfig;
use clap::Parser;
use scene_data::{SceneDocument, SceneTime};
use std::path::PathBuf;
use std::process::ExitCode;
use viz::demo::demo_scene;
use viz::headless::{self, HeadlessOptions};
use viz::playback::PlaybackClock;
use viz::scene_watch::SceneWatchSettings;
use viz::{BillboardVizPlugin, SceneRuntime};

/// Billboard scene visualization
#[derive(Parser, Debug)]
#[command(name = "viz")]
#[command(about = "Draws time-varying billboard scenes")]
struct Args {
    /// Scene file (JSON) to load
    #[arg(long)]
    scene: Option<PathBuf>,

    /// Visualizer configuration file (TOML)
    #[arg(long)]
    config: Option<PathBuf>,

    /// Generate a demo scene instead of loading one
    #[arg(long)]
    demo: bool,

    /// Number of billboards in the demo scene
    #[arg(long, default_value_t = 40)]
    demo_count: usize,

    /// Random seed for the demo scene
    #[arg(long, default_value_t = 42)]
    seed: u64,

    /// Run without a window and print one JSON report per frame
    #[arg(long)]
    headless: bool,

    /// Number of frames to run in headless mode
    #[arg(long, default_value_t = 60)]
    frames: u64,

    /// Scene seconds per headless frame
    #[arg(long, default_value_t = 1.0)]
    step: f64,

    /// Playback speed multiplier, overriding the scene clock
    #[arg(long)]
    speed: Option<f64>,

    /// Reload the scene file when it changes
    #[arg(long)]
    watch: bool,
}

fn main() -> ExitCode {
    let args = Args::parse();

    if args.headless {
        // The windowed app gets its subscriber from Bevy's LogPlugin.
        init_tracing();
    }

    match run(args) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("viz: {e}");
            ExitCode::FAILURE
        }
    }
}

fn init_tracing() {
    use tracing_subscriber::{fmt, EnvFilter};

    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("warn,viz=info,billboard_visualizer=info"));
    // Reports go to stdout, logs to stderr
    fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

fn run(args: Args) -> Result<(), Box<dyn std::error::Error>> {
    let config = match &args.config {
        Some(path) => VisualizerConfig::from_file(path)?,
        None => VisualizerConfig::default(),
    };

    let scene_path = args.scene.clone().filter(|_| !args.demo);
    let document = match &scene_path {
        Some(path) => SceneDocument::from_file(path)?,
        None => demo_scene(args.seed, args.demo_count),
    };

    let mut clock = PlaybackClock::from_scene_clock(&document.clock);
    if let Some(speed) = args.speed {
        clock.speed = speed;
    }

    let runtime = SceneRuntime::new(document, config)?;

    if args.headless {
        let options = HeadlessOptions {
            frames: args.frames,
            step: args.step,
            start: clock.start,
        };
        let reports = headless::run(&runtime, options);
        headless::write_reports(&reports, std::io::stdout().lock())?;
        tracing::info!(
            "Ran {} frames up to {}",
            reports.len(),
            reports
                .last()
                .map_or(SceneTime::EPOCH, |report| report.time)
        );
        return Ok(());
    }

    App::new()
        .insert_non_send_resource(runtime)
        .insert_resource(clock)
        .insert_resource(SceneWatchSettings {
            path: scene_path,
            watch: args.watch,
        })
        .add_plugins(BillboardVizPlugin)
        .run();

    Ok(())
}

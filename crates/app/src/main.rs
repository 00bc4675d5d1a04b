//! Replays the latest receding-horizon controller run: exports one still
//! frame per control cycle and optionally opens a live playback window.

mod export;
mod live;

use std::path::PathBuf;

use clap::Parser;
use log::{LevelFilter, info};
use replay::{LogSeries, ReplayConfig, ReplayEngine, find_latest_directory};
use simplelog::{ColorChoice, Config, TermLogger, TerminalMode};

use crate::export::PngFrameExporter;
use crate::live::LiveCanvas;

#[derive(Parser, Debug)]
#[command(name = "mpc-replay")]
#[command(about = "Replay the predicted paths of a receding-horizon controller", long_about = None)]
struct Args {
    /// Run directory holding t.log, x.log and uopt.log (default: latest run under --log-root)
    #[arg(short, long)]
    log_dir: Option<PathBuf>,

    /// Directory holding controller runs (default: ~/.ros/log)
    #[arg(long)]
    log_root: Option<PathBuf>,

    /// Name prefix of controller run directories
    #[arg(long, default_value = "cgmres_debug_")]
    prefix: String,

    /// JSON replay configuration
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Only show every n-th logged sample
    #[arg(short, long)]
    skip_frames: Option<usize>,

    /// Where frames and timing metadata are written (default: the run directory)
    #[arg(short, long)]
    out_dir: Option<PathBuf>,

    /// Open a live playback window
    #[arg(long)]
    live: bool,

    /// Skip writing still frames
    #[arg(long)]
    no_export: bool,

    /// Verbose output
    #[arg(short, long)]
    verbose: bool,
}

fn default_log_root() -> Option<PathBuf> {
    std::env::var_os("HOME").map(|home| PathBuf::from(home).join(".ros").join("log"))
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args = Args::parse();

    let level = if args.verbose {
        LevelFilter::Debug
    } else {
        LevelFilter::Info
    };
    TermLogger::init(
        level,
        Config::default(),
        TerminalMode::Mixed,
        ColorChoice::Auto,
    )?;

    let mut config = match &args.config {
        Some(path) => ReplayConfig::load(path)?,
        None => ReplayConfig::default(),
    };
    if let Some(stride) = args.skip_frames {
        config.skip_frames = stride;
    }

    let log_dir = match args.log_dir {
        Some(dir) => dir,
        None => {
            let root = args
                .log_root
                .or_else(default_log_root)
                .ok_or("no --log-root given and HOME is not set")?;
            find_latest_directory(&root, &args.prefix)?
        }
    };
    info!("replaying {}", log_dir.display());

    let series = LogSeries::load(&log_dir)?;
    let mut engine = ReplayEngine::from_config(series, &config)?;

    if !args.no_export {
        let out_dir = args.out_dir.unwrap_or_else(|| log_dir.clone());
        let mut exporter = PngFrameExporter::new(out_dir);
        engine.play_into(&mut exporter)?;
        println!(
            "{} frames of the replay are generated at {}",
            exporter.written(),
            exporter.plots_dir().display()
        );
    }

    if args.live {
        let mut canvas = LiveCanvas::new();
        engine.play_into(&mut canvas)?;
        info!("opening live playback of {} frames", canvas.len());

        let title = format!("MPC replay - {}", log_dir.display());
        let options = eframe::NativeOptions {
            viewport: egui::ViewportBuilder::default()
                .with_inner_size([1280.0, 720.0])
                .with_title(title.as_str()),
            ..Default::default()
        };
        eframe::run_native(&title, options, Box::new(|_cc| Ok(Box::new(canvas))))
            .map_err(|e| e.to_string())?;
    }

    Ok(())
}

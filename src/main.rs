// src/main.rs
use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};
use std::path::{Path, PathBuf};
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use sibi_capture::config::CaptureConfig;
use sibi_capture::error::CaptureError;
use sibi_capture::export::{default_session_name, DatasetExporter, SnapshotSeries};
use sibi_capture::pipeline::FramePipeline;
use sibi_capture::recorder::Recorder;
use sibi_capture::replay::CaptureReplay;
use sibi_capture::roi::HandView;

#[derive(Parser)]
#[command(author, version, about = "Sign-language capture dataset builder", long_about = None)]
struct Cli {
    /// JSON settings file; defaults apply to anything it leaves out
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,
    /// Overrides the configured output directory
    #[arg(short, long, global = true)]
    output: Option<PathBuf>,
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Record every frame of a capture and export it as one word
    Replay {
        /// Path to the capture manifest
        capture: PathBuf,
        /// Session id (default: the manifest's, else a timestamp)
        #[arg(short, long)]
        session: Option<String>,
        /// Target length of the sampled track
        #[arg(short = 'f', long)]
        frame_length: Option<f64>,
    },
    /// Save a numbered right-hand reference pair from one frame
    Snapshot {
        /// Path to the capture manifest
        capture: PathBuf,
        /// Label of the hand shape, e.g. "A"
        #[arg(short, long)]
        label: String,
        /// Frame to take the snapshot from
        #[arg(long, default_value_t = 0)]
        frame: usize,
        /// Number of the first snapshot in the series
        #[arg(short, long, default_value_t = 1)]
        number: u32,
        #[arg(long, default_value = "Alphabet")]
        folder: String,
    },
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let cli = Cli::parse();
    let mut config = load_config(cli.config.as_deref())?;
    if let Some(output) = cli.output {
        config.output_directory = output;
    }

    match cli.command {
        Commands::Replay {
            capture,
            session,
            frame_length,
        } => replay(&config, &capture, session, frame_length),
        Commands::Snapshot {
            capture,
            label,
            frame,
            number,
            folder,
        } => snapshot(&config, &capture, &label, frame, number, &folder),
    }
}

fn load_config(path: Option<&Path>) -> Result<CaptureConfig> {
    match path {
        Some(path) => CaptureConfig::load(path),
        None => Ok(CaptureConfig::default()),
    }
}

fn replay(
    config: &CaptureConfig,
    capture: &Path,
    session: Option<String>,
    frame_length: Option<f64>,
) -> Result<()> {
    let mut source = CaptureReplay::open(capture)?;
    let session = session
        .or_else(|| source.session().map(str::to_string))
        .unwrap_or_else(default_session_name);
    let frame_length = frame_length.unwrap_or(config.frame_length);

    let mut pipeline = FramePipeline::new(config);
    let mut recorder = Recorder::new(pipeline.output_size());
    let exporter = DatasetExporter::new(&config.output_directory);

    recorder.start(session.clone())?;

    let mut index = 0;
    while let Some(frame) = source.next_frame() {
        let frame = frame?;
        let outcome = pipeline.process(&frame);
        match recorder.append(&frame.skeleton, outcome.normalized) {
            Ok(_) => {}
            Err(CaptureError::MissingJoint(joint)) => {
                warn!(index, ?joint, "frame skipped, skeleton incomplete");
            }
            Err(e) => return Err(e.into()),
        }
        index += 1;
    }

    let report = recorder
        .finalize(frame_length, &exporter)
        .with_context(|| format!("Failed to export session {}", session))?;

    println!(
        "Exported {} sampled and {} full frames to {}",
        report.sampled_frames,
        report.full_frames,
        report.session_dir.display()
    );
    if !report.is_complete() {
        warn!(failed = report.failures.len(), "some artifacts could not be written");
        for failure in &report.failures {
            eprintln!("  {}: {}", failure.path.display(), failure.error);
        }
    }
    Ok(())
}

fn snapshot(
    config: &CaptureConfig,
    capture: &Path,
    label: &str,
    frame: usize,
    number: u32,
    folder: &str,
) -> Result<()> {
    let source = CaptureReplay::open(capture)?;
    let frame = source.frame(frame)?;

    let mut pipeline = FramePipeline::new(config);
    let outcome = pipeline.process(&frame);

    let (Some(color), Some(depth)) = (
        outcome.raw[HandView::RIGHT_COLOR].as_ref(),
        outcome.raw[HandView::RIGHT_DEPTH].as_ref(),
    ) else {
        bail!("Right hand is too close to the image border for a snapshot");
    };

    let exporter = DatasetExporter::new(&config.output_directory);
    let mut series = SnapshotSeries::new(folder, label, number);
    let (color_path, depth_path) = series.save(&exporter, color, depth)?;

    info!(label, number, "snapshot pair written");
    println!("{}\n{}", color_path.display(), depth_path.display());
    Ok(())
}

//! speech-strip — batch speech removal CLI.
//!
//! Walks an input directory, loudness-normalizes each recording, strips
//! detected speech, and writes the survivors as 16-bit PCM WAV files.

use std::path::PathBuf;
use std::process::ExitCode;

use clap::Parser;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

use speech_strip::config::{self, PipelineConfig};
use speech_strip::loudness::Bs1770Meter;
use speech_strip::pipeline::{FileReport, Outcome, Pipeline};
use speech_strip::vad::{Aggressiveness, FrameDuration, WebRtcDetector};

#[derive(Parser, Debug)]
#[command(version, about = "Strip detected speech from a directory of recordings")]
struct Args {
    /// Input directory of audio files.
    input: PathBuf,

    /// Output directory (same file names, .wav extension).
    output: PathBuf,

    /// VAD aggressiveness.
    #[arg(long, value_enum)]
    aggressiveness: Option<Aggressiveness>,

    /// VAD frame duration.
    #[arg(long, value_enum)]
    frame: Option<FrameDuration>,

    /// Target sample rate in Hz (8000, 16000, 32000, or 48000).
    #[arg(long)]
    sample_rate: Option<u32>,

    /// Target integrated loudness in LUFS.
    #[arg(long)]
    target_loudness: Option<f64>,

    /// Skip stripping; only write the normalized waveform.
    #[arg(long)]
    normalize_only: bool,

    /// Minimum stripped duration in seconds to keep a file.
    #[arg(long)]
    min_keep_secs: Option<f64>,

    /// Optional JSON config file; explicit flags override its values.
    #[arg(long)]
    config: Option<PathBuf>,
}

fn main() -> ExitCode {
    // Initialize tracing (respects RUST_LOG env, defaults to info)
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let args = Args::parse();

    let mut cfg = match &args.config {
        Some(path) => config::read_config(path),
        None => PipelineConfig::default(),
    };
    if let Some(agg) = args.aggressiveness {
        cfg.aggressiveness = agg;
    }
    if let Some(frame) = args.frame {
        cfg.frame = frame;
    }
    if let Some(rate) = args.sample_rate {
        cfg.sample_rate = rate;
    }
    if let Some(lufs) = args.target_loudness {
        cfg.target_loudness = lufs;
    }
    if let Some(secs) = args.min_keep_secs {
        cfg.min_keep_secs = secs;
    }
    if args.normalize_only {
        cfg.normalize_only = true;
    }

    // Detection only runs at the WebRTC rates; refuse up front rather than
    // failing every file mid-batch.
    if !cfg.normalize_only && !speech_strip::vad::supported_rate(cfg.sample_rate) {
        error!(
            sample_rate = cfg.sample_rate,
            "unsupported sample rate for speech detection (use 8000, 16000, 32000, or 48000)"
        );
        return ExitCode::FAILURE;
    }

    info!(
        input = %args.input.display(),
        output = %args.output.display(),
        ?cfg,
        "starting batch"
    );

    let detector = WebRtcDetector::new(cfg.aggressiveness, cfg.frame);
    let mut pipeline = Pipeline::new(Bs1770Meter, detector, cfg.clone());

    match pipeline.run_batch(&args.input, &args.output, |report| {
        print_report(report, cfg.target_loudness)
    }) {
        Ok(_) => ExitCode::SUCCESS,
        Err(e) => {
            error!(error = %e, "batch aborted");
            ExitCode::FAILURE
        }
    }
}

/// Human-readable per-file report on stdout. Advisory only.
fn print_report(report: &FileReport, target_loudness: f64) {
    println!("\n{}", report.file);
    println!("Length = {:.2}s", report.original_secs);
    println!("Loudness = {:.2}dB", report.original_loudness);
    match &report.outcome {
        Outcome::Accepted { stripped_secs, .. } => {
            println!("New length = {:.2}s", stripped_secs);
            println!("New loudness = {:.2}dB", target_loudness);
        }
        Outcome::NormalizedOnly => {
            println!("New loudness = {:.2}dB", target_loudness);
        }
        Outcome::Rejected => {
            println!("File not processed, entirely speech detected");
        }
    }
}

// Copyright (c) 2025 Jonathan Fontanez
// SPDX-License-Identifier: BUSL-1.1

//! lapsecam — record timed webcam captures from the command line.

use std::io::Write as _;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::{Duration, Instant};

use anyhow::Context;
use clap::{Parser, Subcommand, ValueEnum};

use lapselib::{
    format_mm_ss, CameraId, CellDisplay, FrameCell, PostProcessConfig, Recorder,
    ResolutionProfile, SessionConfig,
};

#[derive(Parser)]
#[command(name = "lapsecam", version, about = "Timed webcam capture to MP4")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// List attached camera devices
    Devices,
    /// Record a capture session
    Record(RecordArgs),
}

#[derive(clap::Args)]
struct RecordArgs {
    /// Camera device id (0 = default)
    #[arg(long, default_value_t = 0)]
    device: u32,

    /// Milliseconds between captured frames
    #[arg(long = "interval-ms", default_value_t = 1000)]
    interval_ms: u64,

    /// Capture resolution profile
    #[arg(long, value_enum, default_value_t = ProfileArg::Standard)]
    profile: ProfileArg,

    /// Directory recordings are written to
    #[arg(long, default_value = "./output_videos")]
    output_dir: PathBuf,

    /// Stop after this much recorded (pause-adjusted) time, in seconds.
    /// Without it, record until Ctrl+C.
    #[arg(long)]
    duration_secs: Option<u64>,

    /// Pause automatically this many seconds into the run
    #[arg(long)]
    pause_at_secs: Option<u64>,

    /// How long an automatic pause lasts before resuming
    #[arg(long, default_value_t = 5)]
    pause_for_secs: u64,

    /// Re-encode the finished file (CRF 23, preset medium) and drop the raw
    /// original
    #[arg(long)]
    post_process: bool,
}

#[derive(Clone, Copy, ValueEnum)]
enum ProfileArg {
    /// 640×480
    Standard,
    /// 1280×960
    High,
}

impl From<ProfileArg> for ResolutionProfile {
    fn from(value: ProfileArg) -> Self {
        match value {
            ProfileArg::Standard => ResolutionProfile::Standard,
            ProfileArg::High => ResolutionProfile::High,
        }
    }
}

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_max_level(tracing::Level::WARN)
        .init();

    let cli = Cli::parse();
    match cli.command {
        Commands::Devices => devices(),
        Commands::Record(args) => record(args),
    }
}

fn devices() -> anyhow::Result<()> {
    let devices = lapselib::list_devices().context("querying camera devices")?;
    if devices.is_empty() {
        println!("No camera devices found");
        return Ok(());
    }
    for line in devices {
        println!("{line}");
    }
    Ok(())
}

fn record(args: RecordArgs) -> anyhow::Result<()> {
    lapselib::install_shutdown_hook().context("installing shutdown hook")?;

    let config = SessionConfig {
        interval_ms: args.interval_ms,
        profile: args.profile.into(),
        output_dir: args.output_dir,
        ..Default::default()
    };

    let preview = FrameCell::new();
    let mut recorder = Recorder::new(config, Arc::new(CellDisplay::new(preview.clone())));
    if args.post_process {
        recorder = recorder.with_post_process(PostProcessConfig::default());
    }

    recorder
        .select_device(CameraId(args.device))
        .context("selecting camera")?;
    recorder.start().context("starting capture")?;

    let readout = recorder.readout();
    match args.duration_secs {
        Some(secs) => println!("Recording for {secs}s of capture time..."),
        None => println!("Recording... press Ctrl+C to stop"),
    }

    let started = Instant::now();
    let mut pause_plan = args
        .pause_at_secs
        .map(|at| (Duration::from_secs(at), Duration::from_secs(args.pause_for_secs)));
    let mut resume_at: Option<Instant> = None;

    loop {
        std::thread::sleep(Duration::from_millis(250));

        if let Some((at, pause_for)) = pause_plan {
            if started.elapsed() >= at {
                recorder.pause().context("pausing")?;
                resume_at = Some(Instant::now() + pause_for);
                pause_plan = None;
            }
        }
        if let Some(when) = resume_at {
            if Instant::now() >= when {
                recorder.resume().context("resuming")?;
                resume_at = None;
            }
        }

        let frames = preview
            .latest_frame_number()
            .map(|n| n + 1)
            .unwrap_or(0);
        print!(
            "\r  {}  frames: {}  {}",
            readout.read(),
            frames,
            if resume_at.is_some() { "[paused]" } else { "         " }
        );
        std::io::stdout().flush()?;

        if let Some(secs) = args.duration_secs {
            if recorder.elapsed() >= Duration::from_secs(secs) {
                break;
            }
        }
    }
    println!();

    let outcome = recorder.stop().context("stopping capture")?;
    println!(
        "Saved {} ({} frames, {} recorded)",
        outcome.summary.output_path.display(),
        outcome.summary.frames_written,
        format_mm_ss(outcome.summary.recorded),
    );

    if let Some(handle) = outcome.post_process {
        println!("Post-processing...");
        match handle.join() {
            Ok(processed) => println!("Compressed to {}", processed.display()),
            Err(err) => eprintln!("Post-processing failed: {err}"),
        }
    }

    Ok(())
}

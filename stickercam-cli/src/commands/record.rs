//! Record command - record a clip for a fixed duration

use anyhow::{bail, Context, Result};
use clap::Args;
use std::path::Path;
use std::time::Duration;
use stickercam_core::{
    scheduler::{record_for, FrameClock},
    session::Session,
    types::CaptureMode,
};
use tokio::signal;
use tracing::{info, warn};

use super::{
    load_config, open_source, place_stickers, save_download, CaptureOptions, Placement,
};

/// Arguments for the record command
#[derive(Args)]
pub struct RecordArgs {
    #[command(flatten)]
    options: CaptureOptions,

    /// Sticker to place before recording, as id@x,y (repeatable)
    #[arg(short, long = "sticker")]
    stickers: Vec<Placement>,

    /// Recording length in seconds
    #[arg(long, default_value = "3")]
    seconds: f64,

    /// Recording framerate (overrides the config file)
    #[arg(long)]
    fps: Option<u32>,
}

/// Record a clip and write it to the output directory
pub async fn record(args: RecordArgs, config_path: Option<&Path>) -> Result<()> {
    if args.seconds.is_nan() || args.seconds <= 0.0 {
        bail!("--seconds must be positive");
    }

    let mut config = load_config(config_path, &args.options)?.with_mode(CaptureMode::Continuous);
    if let Some(fps) = args.fps {
        config = config.with_fps(fps);
        config.validate_strict()?;
    }
    let output_dir = config.output_dir.clone();
    let fps = config.fps;

    let mut session = Session::from_config(config);
    open_source(&mut session).await?;

    place_stickers(&mut session, &args.stickers)?;
    session
        .start_recording()
        .context("Failed to start recording")?;

    println!("Recording {:.1}s at {}fps... (Ctrl+C to stop early)", args.seconds, fps);

    let mut clock = FrameClock::new(fps);
    let duration = Duration::from_secs_f64(args.seconds);
    let run = tokio::select! {
        run = record_for(&mut session, &mut clock, duration) => Some(run),
        _ = signal::ctrl_c() => None,
    };

    match run {
        Some(run) => info!(
            "Recording loop done: {} rendered, {} dropped, {} skipped",
            run.rendered, run.dropped, run.skipped
        ),
        None => {
            warn!("Interrupted, stopping recording");
            session.stop_recording();
        }
    }

    println!("Finalizing...");
    if !session.wait_finalized().await {
        bail!("Recording failed: {}", session.feedback());
    }

    let download = session.download()?;
    let path = save_download(&output_dir, &download)?;
    let stats = session.capture_stats();

    println!(
        "Saved {} ({} bytes, {} frames, {} dropped)",
        path.display(),
        download.bytes.len(),
        stats.frames_rendered,
        stats.frames_dropped
    );

    session.disable_source();
    Ok(())
}

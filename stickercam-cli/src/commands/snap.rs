//! Snap command - take one photo

use anyhow::{Context, Result};
use clap::Args;
use std::path::Path;
use stickercam_core::{session::Session, types::CaptureMode};
use tracing::info;

use super::{
    load_config, open_source, place_stickers, save_download, CaptureOptions, Placement,
};

/// Arguments for the snap command
#[derive(Args)]
pub struct SnapArgs {
    #[command(flatten)]
    options: CaptureOptions,

    /// Sticker to place, as id@x,y (repeatable, placed in order)
    #[arg(short, long = "sticker")]
    stickers: Vec<Placement>,
}

/// Take a photo and write it to the output directory
pub async fn snap(args: SnapArgs, config_path: Option<&Path>) -> Result<()> {
    let config = load_config(config_path, &args.options)?.with_mode(CaptureMode::Still);
    let output_dir = config.output_dir.clone();

    let mut session = Session::from_config(config);
    open_source(&mut session).await?;

    place_stickers(&mut session, &args.stickers)?;
    session.capture_still().context("Failed to take photo")?;

    let download = session.download()?;
    let path = save_download(&output_dir, &download)?;
    info!("Photo written to {}", path.display());

    println!(
        "Saved {} ({} bytes, filter {}, {} stickers)",
        path.display(),
        download.bytes.len(),
        session.filter().css(),
        session.overlays().len()
    );

    session.disable_source();
    Ok(())
}

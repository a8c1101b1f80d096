//! CLI command implementations

mod config;
mod record;
mod run;
mod snap;
mod stickers;

pub use config::{config, ConfigArgs};
pub use record::{record, RecordArgs};
pub use run::{run, RunArgs};
pub use snap::{snap, SnapArgs};
pub use stickers::stickers;

use anyhow::{anyhow, Context, Result};
use clap::Args;
use std::path::{Path, PathBuf};
use stickercam_core::{
    artifact::Download,
    config::{CaptureConfig, ConfigFile, SourceConfig},
    filter::FilterKind,
    session::Session,
    source::VideoDevice,
};

/// Options shared by `snap`, `record` and `run`
#[derive(Args, Clone, Default)]
pub struct CaptureOptions {
    /// Filter (none, grayscale, sepia, invert)
    #[arg(short, long)]
    filter: Option<String>,

    /// Use an image file as the camera
    #[arg(short, long)]
    image: Option<PathBuf>,

    /// Directory downloads are written to
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Surface size, e.g. 640x480
    #[arg(long)]
    size: Option<String>,
}

/// A sticker to place, parsed from `id@x,y`
#[derive(Debug, Clone, PartialEq)]
pub struct Placement {
    pub sticker: String,
    pub x: f32,
    pub y: f32,
}

impl std::str::FromStr for Placement {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        let (sticker, coords) = s
            .split_once('@')
            .ok_or_else(|| format!("expected id@x,y, got '{}'", s))?;
        let (x, y) = coords
            .split_once(',')
            .ok_or_else(|| format!("expected x,y after '@', got '{}'", coords))?;

        Ok(Self {
            sticker: sticker.trim().to_string(),
            x: x.trim().parse().map_err(|_| format!("invalid x '{}'", x))?,
            y: y.trim().parse().map_err(|_| format!("invalid y '{}'", y))?,
        })
    }
}

/// Load the config file and apply command line overrides
pub fn load_config(path: Option<&Path>, options: &CaptureOptions) -> Result<CaptureConfig> {
    let file = match path {
        Some(path) => ConfigFile::load_from(path.to_path_buf())?,
        None => ConfigFile::load_or_default(),
    };
    let mut config = CaptureConfig::from_file(&file).context("Invalid configuration")?;

    if let Some(filter) = &options.filter {
        let filter: FilterKind = filter.parse().map_err(|e: String| anyhow!(e))?;
        config = config.with_filter(filter);
    }
    if let Some(image) = &options.image {
        config = config.with_source(SourceConfig::Image {
            path: image.clone(),
        });
    }
    if let Some(output) = &options.output {
        config = config.with_output_dir(output.clone());
    }
    if let Some(size) = &options.size {
        let (width, height) = parse_size(size)?;
        config = config.with_size(width, height);
    }

    config.validate_strict()?;
    for warning in config.validate() {
        println!("Warning: {}", warning);
    }

    Ok(config)
}

/// Enable the session's source, naming the device on failure
pub async fn open_source<D: VideoDevice>(session: &mut Session<D>) -> Result<()> {
    session
        .enable_source()
        .await
        .with_context(|| format!("Failed to open {}", session.device().name()))
}

/// Select and place each sticker in order
pub fn place_stickers<D: VideoDevice>(
    session: &mut Session<D>,
    placements: &[Placement],
) -> Result<()> {
    for placement in placements {
        session
            .select_sticker(&placement.sticker)
            .with_context(|| session.feedback().to_string())?;
        session
            .place_overlay(placement.x, placement.y)
            .with_context(|| format!("Cannot place {}", placement.sticker))?;
    }
    Ok(())
}

/// Write a download into `dir`, returning the file path
pub fn save_download(dir: &Path, download: &Download) -> Result<PathBuf> {
    if !dir.as_os_str().is_empty() && !dir.exists() {
        std::fs::create_dir_all(dir)
            .with_context(|| format!("Failed to create {}", dir.display()))?;
    }

    let path = dir.join(&download.file_name);
    std::fs::write(&path, &download.bytes)
        .with_context(|| format!("Failed to write {}", path.display()))?;
    Ok(path)
}

fn parse_size(s: &str) -> Result<(u32, u32)> {
    let (w, h) = s
        .split_once(['x', 'X'])
        .ok_or_else(|| anyhow!("Invalid size '{}', expected WIDTHxHEIGHT", s))?;
    Ok((
        w.trim().parse().context("Invalid width")?,
        h.trim().parse().context("Invalid height")?,
    ))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_placement() {
        let p: Placement = "cool@12.5,40".parse().unwrap();
        assert_eq!(p.sticker, "cool");
        assert_eq!((p.x, p.y), (12.5, 40.0));

        assert!("cool".parse::<Placement>().is_err());
        assert!("cool@1".parse::<Placement>().is_err());
        assert!("cool@a,b".parse::<Placement>().is_err());
    }

    #[tokio::test]
    async fn test_open_source_names_device() {
        let config = CaptureConfig::default().with_source(SourceConfig::Image {
            path: PathBuf::from("/nonexistent/stickercam/face.png"),
        });
        let mut session = Session::from_config(config);

        let err = open_source(&mut session).await.unwrap_err();
        assert!(err
            .to_string()
            .contains("Failed to open image /nonexistent/stickercam/face.png"));
        assert!(!session.is_source_active());
    }

    #[tokio::test]
    async fn test_open_source_and_place() {
        let config = CaptureConfig::default()
            .with_size(64, 48)
            .with_source(SourceConfig::TestPattern {
                width: 32,
                height: 24,
                fps: 30,
            });
        let mut session = Session::from_config(config);
        open_source(&mut session).await.unwrap();

        let placements: [Placement; 2] = [
            "heart@10,40".parse().unwrap(),
            "joy@60,47".parse().unwrap(),
        ];
        place_stickers(&mut session, &placements).unwrap();
        assert_eq!(session.overlays().len(), 2);

        let bad: [Placement; 1] = ["heart@64,10".parse().unwrap()];
        assert!(place_stickers(&mut session, &bad).is_err());
    }

    #[test]
    fn test_parse_size() {
        assert_eq!(parse_size("320x240").unwrap(), (320, 240));
        assert!(parse_size("320").is_err());
    }
}

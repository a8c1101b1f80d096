//! Still image served as a live feed

use std::path::{Path, PathBuf};
use tracing::info;

use super::{LiveFeed, VideoDevice};
use crate::error::{Result, StickercamError};
use crate::types::Frame;

/// Decode an image file into an RGBA frame
pub fn load_image_frame(path: &Path) -> Result<Frame> {
    let image = image::open(path).map_err(|e| {
        StickercamError::device(format!("failed to load image '{}': {}", path.display(), e))
    })?;

    let rgba = image.to_rgba8();
    let (width, height) = rgba.dimensions();
    info!(width, height, "Loaded image {}", path.display());

    Ok(Frame::from_rgba(width, height, rgba.into_raw(), 0))
}

/// Device that opens an image file as its feed
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImageFileDevice {
    path: PathBuf,
}

impl ImageFileDevice {
    /// Create a device for `path`; the file is read on request
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Image path
    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl VideoDevice for ImageFileDevice {
    type Feed = LiveFeed;

    fn name(&self) -> String {
        format!("image {}", self.path.display())
    }

    async fn request_video_feed(&mut self) -> Result<LiveFeed> {
        let frame = load_image_frame(&self.path)?;
        Ok(LiveFeed::from_frame(self.name(), frame))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::source::FrameSource;
    use image::{Rgba, RgbaImage};

    #[tokio::test]
    async fn test_image_feed() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("face.png");
        RgbaImage::from_pixel(5, 3, Rgba([9, 8, 7, 255]))
            .save(&path)
            .unwrap();

        let mut device = ImageFileDevice::new(&path);
        let feed = device.request_video_feed().await.unwrap();
        assert_eq!(feed.dimensions(), Some((5, 3)));
        assert_eq!(&feed.latest_frame().unwrap().data[..4], &[9, 8, 7, 255]);
    }

    #[test]
    fn test_garbage_file_is_unavailable() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("broken.png");
        std::fs::write(&path, b"not an image").unwrap();

        let err = load_image_frame(&path).unwrap_err();
        assert!(matches!(err, StickercamError::DeviceUnavailable(_)));
    }
}

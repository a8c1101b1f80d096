//! Live frame sources
//!
//! This module handles:
//! - The [`FrameSource`] interface the session reads frames from
//! - The [`VideoDevice`] interface used to request a feed
//! - Built-in devices: an animated test pattern and a still image file

mod feed;
mod file;
mod pattern;

pub use feed::LiveFeed;
pub use file::{load_image_frame, ImageFileDevice};
pub use pattern::{pattern_frame, TestPatternDevice};

use std::future::Future;
use std::sync::Arc;

use crate::config::SourceConfig;
use crate::error::Result;
use crate::types::Frame;

/// Provider of live frames
///
/// Owned exclusively by the session that activated it.
pub trait FrameSource: Send {
    /// Most recent frame, `None` until the first frame arrives
    fn latest_frame(&self) -> Option<Arc<Frame>>;

    /// Whether a frame can be read right now
    fn is_ready(&self) -> bool {
        self.latest_frame().is_some()
    }

    /// Intrinsic frame size once known
    fn dimensions(&self) -> Option<(u32, u32)>;

    /// Stop producing frames; calling it again does nothing
    fn stop(&mut self);
}

/// Camera-like device a feed can be requested from
pub trait VideoDevice: Send {
    /// Feed handed out on success
    type Feed: FrameSource + 'static;

    /// Human readable device name
    fn name(&self) -> String;

    /// Request a live feed
    ///
    /// Fails with `DeviceUnavailable` when access is denied or the device
    /// cannot be opened.
    fn request_video_feed(&mut self) -> impl Future<Output = Result<Self::Feed>> + Send;
}

/// Device selected by the configuration
#[derive(Debug, Clone)]
pub enum SourceDevice {
    /// Synthetic animated pattern
    TestPattern(TestPatternDevice),
    /// Still image served as a feed
    Image(ImageFileDevice),
}

impl SourceDevice {
    /// Build the device described by `config`
    pub fn from_config(config: &SourceConfig) -> Self {
        match config {
            SourceConfig::TestPattern { width, height, fps } => {
                Self::TestPattern(TestPatternDevice::new(*width, *height, *fps))
            }
            SourceConfig::Image { path } => Self::Image(ImageFileDevice::new(path.clone())),
        }
    }
}

impl VideoDevice for SourceDevice {
    type Feed = LiveFeed;

    fn name(&self) -> String {
        match self {
            Self::TestPattern(device) => device.name(),
            Self::Image(device) => device.name(),
        }
    }

    async fn request_video_feed(&mut self) -> Result<LiveFeed> {
        match self {
            Self::TestPattern(device) => device.request_video_feed().await,
            Self::Image(device) => device.request_video_feed().await,
        }
    }
}

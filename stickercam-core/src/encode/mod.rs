//! Still-image export and streaming video encoding
//!
//! This module provides:
//! - PNG export of a composited surface
//! - The [`StreamEncoder`] seam the recorder feeds surfaces into
//! - A Motion-JPEG encoder as the built-in video format
//! - The encode loop that drains the recorder's surface queue and
//!   finalizes the clip once the queue closes

mod mjpeg;
mod still;

pub use mjpeg::{MjpegEncoder, MJPEG_QUALITY};
pub use still::{encode_png, STILL_EXTENSION, STILL_MIME};

use bytes::{Bytes, BytesMut};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tokio::sync::mpsc;
use tracing::{debug, error, info};

use crate::artifact::VideoClip;
use crate::compositor::Surface;
use crate::config::CaptureConfig;
use crate::error::Result;

/// Container used for recorded clips
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum VideoFormat {
    /// Concatenated JPEG frames
    #[default]
    Mjpeg,
}

impl VideoFormat {
    /// File extension for downloads
    pub fn extension(&self) -> &'static str {
        match self {
            Self::Mjpeg => "mjpeg",
        }
    }

    /// MIME type of the finalized stream
    pub fn mime(&self) -> &'static str {
        match self {
            Self::Mjpeg => "video/x-motion-jpeg",
        }
    }
}

impl std::fmt::Display for VideoFormat {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.extension())
    }
}

impl std::str::FromStr for VideoFormat {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "mjpeg" | "mjpg" | "motion-jpeg" => Ok(Self::Mjpeg),
            _ => Err(format!("Unknown video format: {}", s)),
        }
    }
}

/// Streaming video encoder fed one surface per render tick
pub trait StreamEncoder: Send {
    /// Container this encoder produces
    fn format(&self) -> VideoFormat;

    /// Encode one frame, returning any chunk that became available
    fn push_frame(&mut self, surface: &Surface) -> Result<Option<Bytes>>;

    /// Flush remaining data at end of stream
    fn finish(&mut self) -> Result<Option<Bytes>>;
}

/// Creates a fresh encoder for each recording
pub type EncoderFactory =
    Arc<dyn Fn(&CaptureConfig) -> Result<Box<dyn StreamEncoder>> + Send + Sync>;

/// Create the encoder selected in the configuration
pub fn create_encoder(config: &CaptureConfig) -> Result<Box<dyn StreamEncoder>> {
    match config.video_format {
        VideoFormat::Mjpeg => Ok(Box::new(MjpegEncoder::new())),
    }
}

/// Factory that builds encoders from the configuration
pub fn default_factory() -> EncoderFactory {
    Arc::new(create_encoder)
}

/// Drain surfaces from the recorder queue and finalize the clip
///
/// Runs until every sender is dropped, so only surfaces queued before the
/// recording stopped end up in the clip. Blocks the calling thread; run it
/// on a dedicated thread. A frame that fails to encode is logged and skipped.
pub fn encode_from_channel(
    mut encoder: Box<dyn StreamEncoder>,
    mut rx: mpsc::Receiver<Surface>,
    fps: u32,
) -> Result<VideoClip> {
    let format = encoder.format();
    let mut chunks: Vec<Bytes> = Vec::new();
    let mut frames = 0u64;
    let mut failed = 0u64;
    let mut dimensions = (0, 0);

    while let Some(surface) = rx.blocking_recv() {
        if frames == 0 {
            dimensions = surface.dimensions();
        }

        match encoder.push_frame(&surface) {
            Ok(Some(chunk)) => chunks.push(chunk),
            Ok(None) => {}
            Err(e) => {
                error!("Failed to encode frame {}: {}", frames, e);
                failed += 1;
            }
        }
        frames += 1;

        if frames % 300 == 0 {
            debug!("Encoded {} frames ({} chunks)", frames, chunks.len());
        }
    }

    if let Some(tail) = encoder.finish()? {
        chunks.push(tail);
    }

    let total: usize = chunks.iter().map(Bytes::len).sum();
    let mut blob = BytesMut::with_capacity(total);
    for chunk in &chunks {
        blob.extend_from_slice(chunk);
    }

    info!(
        "Encoder finalized: {} frames ({} failed), {} chunks, {} bytes",
        frames,
        failed,
        chunks.len(),
        total
    );

    Ok(VideoClip::new(
        blob.freeze(),
        format,
        frames - failed,
        fps,
        dimensions,
    ))
}

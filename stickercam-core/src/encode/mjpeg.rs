//! Motion-JPEG stream encoder
//!
//! Every pushed surface becomes one baseline JPEG chunk. The finalized clip
//! is the chunks back to back, which ffmpeg and most players open as a raw
//! `mjpeg` stream.

use bytes::Bytes;
use image::codecs::jpeg::JpegEncoder;
use image::{ExtendedColorType, RgbImage};
use tracing::trace;

use super::{StreamEncoder, VideoFormat};
use crate::compositor::Surface;
use crate::error::{Result, StickercamError};

/// JPEG quality used for every frame
pub const MJPEG_QUALITY: u8 = 85;

/// Encoder producing one JPEG per frame
#[derive(Debug, Default)]
pub struct MjpegEncoder {
    frames: u64,
    bytes_out: u64,
    finished: bool,
}

impl MjpegEncoder {
    /// Create a new encoder
    pub fn new() -> Self {
        Self::default()
    }

    /// Frames encoded so far
    pub fn frames(&self) -> u64 {
        self.frames
    }

    /// Bytes produced so far
    pub fn bytes_out(&self) -> u64 {
        self.bytes_out
    }
}

impl StreamEncoder for MjpegEncoder {
    fn format(&self) -> VideoFormat {
        VideoFormat::Mjpeg
    }

    fn push_frame(&mut self, surface: &Surface) -> Result<Option<Bytes>> {
        if self.finished {
            return Err(StickercamError::encoder("frame pushed after finish"));
        }

        // JPEG has no alpha channel
        let rgba = surface.as_image();
        let rgb = RgbImage::from_fn(rgba.width(), rgba.height(), |x, y| {
            let p = rgba.get_pixel(x, y).0;
            image::Rgb([p[0], p[1], p[2]])
        });

        let mut buffer = Vec::new();
        let mut encoder = JpegEncoder::new_with_quality(&mut buffer, MJPEG_QUALITY);
        encoder
            .encode(rgb.as_raw(), rgb.width(), rgb.height(), ExtendedColorType::Rgb8)
            .map_err(|e| StickercamError::encoder(format!("JPEG encoding failed: {}", e)))?;

        self.frames += 1;
        self.bytes_out += buffer.len() as u64;
        trace!("MJPEG frame {} -> {} bytes", self.frames, buffer.len());

        Ok(Some(Bytes::from(buffer)))
    }

    fn finish(&mut self) -> Result<Option<Bytes>> {
        self.finished = true;
        Ok(None)
    }
}

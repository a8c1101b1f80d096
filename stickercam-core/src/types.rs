//! Core types for stickercam
//!
//! Frames, handles and the small enums shared by the compositing and
//! capture pipeline.

use serde::{Deserialize, Serialize};
use std::sync::atomic::{AtomicU64, Ordering};

/// Global handle counter for unique ids
static HANDLE_COUNTER: AtomicU64 = AtomicU64::new(1);

/// Opaque handle for a session or a stored artifact
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Handle(u64);

impl Handle {
    /// Create a new unique handle
    pub fn new() -> Self {
        Self(HANDLE_COUNTER.fetch_add(1, Ordering::SeqCst))
    }

    /// Get the raw handle value
    pub fn as_u64(&self) -> u64 {
        self.0
    }
}

impl Default for Handle {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for Handle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "Handle({})", self.0)
    }
}

/// Capture mode selected by the user
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CaptureMode {
    /// Single photo per capture
    #[default]
    Still,
    /// Continuous video recording
    Continuous,
}

impl std::fmt::Display for CaptureMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Still => write!(f, "still"),
            Self::Continuous => write!(f, "continuous"),
        }
    }
}

impl std::str::FromStr for CaptureMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "still" | "photo" | "foto" => Ok(Self::Still),
            "continuous" | "video" | "record" => Ok(Self::Continuous),
            _ => Err(format!("Unknown capture mode: {}", s)),
        }
    }
}

/// Recording state of the capture controller
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum RecordingState {
    #[default]
    Idle,
    Recording,
}

/// Frame format information
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FrameFormat {
    /// Width in pixels
    pub width: u32,
    /// Height in pixels
    pub height: u32,
    /// Stride in bytes
    pub stride: u32,
}

impl FrameFormat {
    /// Tightly packed RGBA format
    pub fn rgba(width: u32, height: u32) -> Self {
        Self {
            width,
            height,
            stride: width * 4,
        }
    }
}

/// One RGBA8 image read from the live source
#[derive(Debug, Clone)]
pub struct Frame {
    /// Frame format
    pub format: FrameFormat,
    /// Pixel data, `stride * height` bytes
    pub data: Vec<u8>,
    /// Presentation timestamp in nanoseconds
    pub pts: u64,
}

impl Frame {
    /// Create a frame from tightly packed RGBA data
    pub fn from_rgba(width: u32, height: u32, data: Vec<u8>, pts: u64) -> Self {
        Self {
            format: FrameFormat::rgba(width, height),
            data,
            pts,
        }
    }

    /// Width in pixels
    pub fn width(&self) -> u32 {
        self.format.width
    }

    /// Height in pixels
    pub fn height(&self) -> u32 {
        self.format.height
    }

    /// Whether the buffer holds enough bytes for the declared format
    pub fn is_complete(&self) -> bool {
        let needed = self.format.stride as usize * self.format.height as usize;
        self.format.width > 0
            && self.format.height > 0
            && self.format.stride >= self.format.width * 4
            && self.data.len() >= needed
    }

    /// Copy into a tightly packed `RgbaImage`, dropping row padding
    pub fn to_image(&self) -> Option<image::RgbaImage> {
        if !self.is_complete() {
            return None;
        }

        let row_bytes = self.format.width as usize * 4;
        let stride = self.format.stride as usize;
        let packed = if stride == row_bytes {
            self.data[..row_bytes * self.format.height as usize].to_vec()
        } else {
            let mut packed = Vec::with_capacity(row_bytes * self.format.height as usize);
            for row in self.data.chunks(stride).take(self.format.height as usize) {
                packed.extend_from_slice(&row[..row_bytes]);
            }
            packed
        };

        image::RgbaImage::from_raw(self.format.width, self.format.height, packed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_handles_are_unique() {
        let a = Handle::new();
        let b = Handle::new();
        assert_ne!(a, b);
        assert!(b.as_u64() > a.as_u64());
    }

    #[test]
    fn test_capture_mode_parse() {
        assert_eq!("photo".parse::<CaptureMode>().ok(), Some(CaptureMode::Still));
        assert_eq!("video".parse::<CaptureMode>().ok(), Some(CaptureMode::Continuous));
        assert!("burst".parse::<CaptureMode>().is_err());
    }

    #[test]
    fn test_frame_to_image_strips_padding() {
        // 2x2 frame with 4 bytes of padding per row
        let mut data = Vec::new();
        for row in 0..2u8 {
            data.extend_from_slice(&[row, 0, 0, 255, row, 1, 0, 255]);
            data.extend_from_slice(&[9, 9, 9, 9]);
        }
        let frame = Frame {
            format: FrameFormat {
                width: 2,
                height: 2,
                stride: 12,
            },
            data,
            pts: 0,
        };

        let image = frame.to_image().unwrap();
        assert_eq!(image.get_pixel(1, 1).0, [1, 1, 0, 255]);
        assert_eq!(image.as_raw().len(), 16);
    }

    #[test]
    fn test_incomplete_frame() {
        let frame = Frame::from_rgba(4, 4, vec![0; 10], 0);
        assert!(!frame.is_complete());
        assert!(frame.to_image().is_none());
    }
}

//! Mock infrastructure for testing
//!
//! Provides a scriptable video device, an encoder that keeps every surface
//! it receives, and frame builders.

#![allow(dead_code)]

use bytes::Bytes;
use parking_lot::Mutex;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Arc;
use stickercam_core::compositor::Surface;
use stickercam_core::config::CaptureConfig;
use stickercam_core::encode::{EncoderFactory, StreamEncoder, VideoFormat};
use stickercam_core::error::{Result, StickercamError};
use stickercam_core::source::{FrameSource, VideoDevice};
use stickercam_core::types::Frame;

pub const RED: [u8; 4] = [221, 46, 68, 255];
pub const YELLOW: [u8; 4] = [255, 204, 51, 255];

/// Create a test frame with solid color
///
/// # Arguments
/// * `width` - Frame width in pixels
/// * `height` - Frame height in pixels
/// * `color` - RGBA color values
pub fn create_test_frame(width: u32, height: u32, color: [u8; 4]) -> Frame {
    let data = color.repeat((width * height) as usize);
    Frame::from_rgba(width, height, data, 0)
}

/// Create a test frame with a gradient pattern
pub fn create_gradient_frame(width: u32, height: u32) -> Frame {
    let mut data = Vec::with_capacity((width * height * 4) as usize);
    for y in 0..height {
        for x in 0..width {
            // Create a diagonal gradient
            let r = ((x as f32 / width as f32) * 255.0) as u8;
            let g = ((y as f32 / height as f32) * 255.0) as u8;
            let b = (((x + y) as f32 / (width + height) as f32) * 255.0) as u8;
            data.extend_from_slice(&[r, g, b, 255]);
        }
    }
    Frame::from_rgba(width, height, data, 0)
}

/// Frame slot shared between a test and the feeds it handed out
#[derive(Clone, Default)]
pub struct FrameSlot(Arc<Mutex<Option<Arc<Frame>>>>);

impl FrameSlot {
    /// Replace the frame every feed will return next
    pub fn set(&self, frame: Frame) {
        *self.0.lock() = Some(Arc::new(frame));
    }

    /// Make the feed not ready
    pub fn empty(&self) {
        self.0.lock().take();
    }
}

/// Feed reading from a [`FrameSlot`]
pub struct MockFeed {
    slot: FrameSlot,
    stopped: Arc<AtomicBool>,
}

impl FrameSource for MockFeed {
    fn latest_frame(&self) -> Option<Arc<Frame>> {
        if self.stopped.load(Ordering::SeqCst) {
            return None;
        }
        self.slot.0.lock().clone()
    }

    fn dimensions(&self) -> Option<(u32, u32)> {
        self.latest_frame().map(|f| (f.width(), f.height()))
    }

    fn stop(&mut self) {
        self.stopped.store(true, Ordering::SeqCst);
    }
}

/// Device that hands out [`MockFeed`]s or fails on request
#[derive(Clone, Default)]
pub struct MockDevice {
    pub slot: FrameSlot,
    pub fail: Arc<AtomicBool>,
    pub requests: Arc<AtomicUsize>,
    pub stopped: Arc<AtomicBool>,
}

impl MockDevice {
    /// Device whose feed serves `frame`
    pub fn with_frame(frame: Frame) -> Self {
        let device = Self::default();
        device.slot.set(frame);
        device
    }

    /// Device that denies access
    pub fn failing() -> Self {
        let device = Self::default();
        device.fail.store(true, Ordering::SeqCst);
        device
    }

    /// Whether the last feed was stopped
    pub fn feed_stopped(&self) -> bool {
        self.stopped.load(Ordering::SeqCst)
    }
}

impl VideoDevice for MockDevice {
    type Feed = MockFeed;

    fn name(&self) -> String {
        "mock camera".to_string()
    }

    async fn request_video_feed(&mut self) -> Result<MockFeed> {
        self.requests.fetch_add(1, Ordering::SeqCst);
        if self.fail.load(Ordering::SeqCst) {
            return Err(StickercamError::device("permission denied"));
        }
        self.stopped.store(false, Ordering::SeqCst);
        Ok(MockFeed {
            slot: self.slot.clone(),
            stopped: self.stopped.clone(),
        })
    }
}

/// Surfaces received by a [`CapturingEncoder`]
pub type Captured = Arc<Mutex<Vec<Surface>>>;

/// Encoder that keeps a copy of every surface
pub struct CapturingEncoder {
    frames: Captured,
}

impl StreamEncoder for CapturingEncoder {
    fn format(&self) -> VideoFormat {
        VideoFormat::Mjpeg
    }

    fn push_frame(&mut self, surface: &Surface) -> Result<Option<Bytes>> {
        self.frames.lock().push(surface.clone());
        Ok(Some(Bytes::from_static(b"F")))
    }

    fn finish(&mut self) -> Result<Option<Bytes>> {
        Ok(None)
    }
}

/// Factory building [`CapturingEncoder`]s that share one surface list
pub fn capturing_factory() -> (EncoderFactory, Captured) {
    let captured: Captured = Arc::default();
    let frames = captured.clone();
    let factory: EncoderFactory =
        Arc::new(move |_: &CaptureConfig| -> Result<Box<dyn StreamEncoder>> {
            Ok(Box::new(CapturingEncoder {
                frames: frames.clone(),
            }))
        });
    (factory, captured)
}

/// Factory whose encoder cannot be created
pub fn failing_factory() -> EncoderFactory {
    Arc::new(|_: &CaptureConfig| -> Result<Box<dyn StreamEncoder>> {
        Err(StickercamError::encoder("no encoder available"))
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_create_test_frame_data_size() {
        let frame = create_test_frame(100, 100, [0, 255, 0, 255]);
        assert_eq!(frame.data.len(), 100 * 100 * 4);
        assert!(frame.is_complete());
    }

    #[test]
    fn test_gradient_frame_dimensions() {
        let frame = create_gradient_frame(640, 480);
        assert_eq!(frame.width(), 640);
        assert_eq!(frame.height(), 480);
    }
}

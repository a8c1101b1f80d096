//! Animated test pattern device

use super::{LiveFeed, VideoDevice};
use crate::config::{MAX_HEIGHT, MAX_WIDTH};
use crate::error::{Result, StickercamError};
use crate::types::Frame;

/// Width of the moving bar as a fraction of the frame width
const BAR_DIVISOR: usize = 16;
/// Pixels the bar moves per frame
const BAR_SPEED: u64 = 8;

/// Render frame `index` of the test pattern
///
/// Diagonal gradient whose blue channel pulses with the frame index, plus a
/// white vertical bar sweeping left to right.
pub fn pattern_frame(width: u32, height: u32, index: u64) -> Frame {
    let (w, h) = (width as usize, height as usize);
    let bar_width = (w / BAR_DIVISOR).max(1);
    let bar_x = (index * BAR_SPEED % w.max(1) as u64) as usize;
    let pulse = (index % 256) as u8;
    let diagonal = w + h;

    let red: Vec<u8> = (0..w).map(|x| (x * 255 / w) as u8).collect();
    let mut data = Vec::with_capacity(w * h * 4);
    for y in 0..h {
        let green = (y * 255 / h) as u8;
        for (x, &r) in red.iter().enumerate() {
            if x >= bar_x && x < bar_x + bar_width {
                data.extend_from_slice(&[255, 255, 255, 255]);
                continue;
            }
            let b = ((x + y) * 255 / diagonal) as u8;
            data.extend_from_slice(&[r, green, b.wrapping_add(pulse), 255]);
        }
    }

    Frame::from_rgba(width, height, data, index)
}

/// Synthetic camera producing [`pattern_frame`] at a fixed rate
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TestPatternDevice {
    width: u32,
    height: u32,
    fps: u32,
}

impl TestPatternDevice {
    /// Create a pattern device
    pub fn new(width: u32, height: u32, fps: u32) -> Self {
        Self { width, height, fps }
    }

    /// Pattern size
    pub fn dimensions(&self) -> (u32, u32) {
        (self.width, self.height)
    }
}

impl VideoDevice for TestPatternDevice {
    type Feed = LiveFeed;

    fn name(&self) -> String {
        format!("test pattern {}x{}@{}", self.width, self.height, self.fps)
    }

    async fn request_video_feed(&mut self) -> Result<LiveFeed> {
        let (width, height) = (self.width, self.height);
        if width == 0 || height == 0 || width > MAX_WIDTH || height > MAX_HEIGHT {
            return Err(StickercamError::device(format!(
                "invalid test pattern size {}x{}",
                width, height
            )));
        }

        LiveFeed::spawn(self.name(), self.fps, move |index| {
            pattern_frame(width, height, index)
        })
    }
}

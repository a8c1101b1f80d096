//! Configuration types for stickercam
//!
//! Runtime capture configuration plus the on-disk TOML file it can be
//! built from.

mod file;

pub use file::{
    sample_config, CaptureSettings, ConfigFile, OutputSettings, SourceSettings, SurfaceSettings,
};

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

use crate::encode::VideoFormat;
use crate::error::{Result, StickercamError};
use crate::filter::FilterKind;
use crate::types::CaptureMode;

/// Default surface width in pixels
pub const DEFAULT_WIDTH: u32 = 640;
/// Default surface height in pixels
pub const DEFAULT_HEIGHT: u32 = 480;
/// Default recording framerate
pub const DEFAULT_FPS: u32 = 30;
/// Default sticker glyph size in pixels
pub const DEFAULT_GLYPH_SIZE: u32 = 60;
/// Default depth of the surface queue feeding the encoder
pub const DEFAULT_FRAME_QUEUE: usize = 8;

/// Largest supported surface or source width
pub const MAX_WIDTH: u32 = 7680;
/// Largest supported surface or source height
pub const MAX_HEIGHT: u32 = 4320;

/// Which live source to open
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "kebab-case")]
pub enum SourceConfig {
    /// Synthetic animated test pattern
    TestPattern {
        /// Pattern width in pixels
        width: u32,
        /// Pattern height in pixels
        height: u32,
        /// Frames generated per second
        fps: u32,
    },
    /// A still image served as a live feed
    Image {
        /// Image file to decode
        path: PathBuf,
    },
}

impl Default for SourceConfig {
    fn default() -> Self {
        Self::TestPattern {
            width: DEFAULT_WIDTH,
            height: DEFAULT_HEIGHT,
            fps: DEFAULT_FPS,
        }
    }
}

impl std::fmt::Display for SourceConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::TestPattern { width, height, fps } => {
                write!(f, "test pattern {}x{}@{}", width, height, fps)
            }
            Self::Image { path } => write!(f, "image {}", path.display()),
        }
    }
}

/// Complete capture configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CaptureConfig {
    /// Output surface width
    pub width: u32,
    /// Output surface height
    pub height: u32,
    /// Recording framerate (render ticks per second)
    pub fps: u32,
    /// Sticker glyph size in pixels
    pub glyph_size: u32,
    /// Container for recorded clips
    pub video_format: VideoFormat,
    /// Surfaces buffered between the render loop and the encoder
    pub frame_queue: usize,
    /// Filter selected at startup
    pub filter: FilterKind,
    /// Mode selected at startup
    pub mode: CaptureMode,
    /// Where downloads are written
    pub output_dir: PathBuf,
    /// Live source to open
    pub source: SourceConfig,
}

impl Default for CaptureConfig {
    fn default() -> Self {
        Self {
            width: DEFAULT_WIDTH,
            height: DEFAULT_HEIGHT,
            fps: DEFAULT_FPS,
            glyph_size: DEFAULT_GLYPH_SIZE,
            video_format: VideoFormat::default(),
            frame_queue: DEFAULT_FRAME_QUEUE,
            filter: FilterKind::default(),
            mode: CaptureMode::default(),
            output_dir: PathBuf::from("."),
            source: SourceConfig::default(),
        }
    }
}

impl CaptureConfig {
    /// Build a runtime config from the parsed config file
    pub fn from_file(file: &ConfigFile) -> Result<Self> {
        let filter = file
            .capture
            .filter
            .parse::<FilterKind>()
            .map_err(StickercamError::config)?;
        let mode = file
            .capture
            .mode
            .parse::<CaptureMode>()
            .map_err(StickercamError::config)?;
        let video_format = file
            .capture
            .video_format
            .parse::<VideoFormat>()
            .map_err(StickercamError::config)?;

        let source = match file.source.kind.to_lowercase().as_str() {
            "test-pattern" | "pattern" => SourceConfig::TestPattern {
                width: file.source.width,
                height: file.source.height,
                fps: file.source.fps,
            },
            "image" => {
                let path = file.source.path.clone().ok_or_else(|| {
                    StickercamError::config("source kind 'image' requires a path")
                })?;
                SourceConfig::Image { path }
            }
            other => {
                return Err(StickercamError::config(format!(
                    "Unknown source kind: {}",
                    other
                )));
            }
        };

        let config = Self {
            width: file.surface.width,
            height: file.surface.height,
            fps: file.capture.fps,
            glyph_size: file.capture.glyph_size,
            video_format,
            frame_queue: file.capture.frame_queue,
            filter,
            mode,
            output_dir: file.output.directory.clone(),
            source,
        };
        config.validate_strict()?;
        Ok(config)
    }

    /// Set the surface size
    pub fn with_size(mut self, width: u32, height: u32) -> Self {
        self.width = width;
        self.height = height;
        self
    }

    /// Set the recording framerate
    pub fn with_fps(mut self, fps: u32) -> Self {
        self.fps = fps;
        self
    }

    /// Set the glyph size
    pub fn with_glyph_size(mut self, size: u32) -> Self {
        self.glyph_size = size;
        self
    }

    /// Set the startup filter
    pub fn with_filter(mut self, filter: FilterKind) -> Self {
        self.filter = filter;
        self
    }

    /// Set the startup mode
    pub fn with_mode(mut self, mode: CaptureMode) -> Self {
        self.mode = mode;
        self
    }

    /// Set the encoder queue depth
    pub fn with_frame_queue(mut self, depth: usize) -> Self {
        self.frame_queue = depth;
        self
    }

    /// Set the download directory
    pub fn with_output_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.output_dir = dir.into();
        self
    }

    /// Set the live source
    pub fn with_source(mut self, source: SourceConfig) -> Self {
        self.source = source;
        self
    }

    /// Duration of one render tick
    pub fn frame_interval(&self) -> std::time::Duration {
        std::time::Duration::from_secs_f64(1.0 / self.fps.max(1) as f64)
    }

    /// Validate the configuration and return any warnings
    ///
    /// An empty list means the configuration looks good.
    pub fn validate(&self) -> Vec<String> {
        let mut warnings = Vec::new();

        if self.fps > 60 {
            warnings.push(format!(
                "{}fps is above typical display refresh; ticks may be skipped",
                self.fps
            ));
        }

        if self.glyph_size > self.width.min(self.height) {
            warnings.push(format!(
                "Glyph size {}px is larger than the {}x{} surface",
                self.glyph_size, self.width, self.height
            ));
        }

        if self.frame_queue < 2 {
            warnings.push(
                "Frame queue below 2 will drop frames whenever the encoder lags".to_string(),
            );
        }

        if let SourceConfig::TestPattern { fps, .. } = self.source {
            if fps < self.fps {
                warnings.push(format!(
                    "Source produces {}fps but recording runs at {}fps; frames will repeat",
                    fps, self.fps
                ));
            }
        }

        warnings
    }

    /// Validate and return an error if configuration is invalid
    pub fn validate_strict(&self) -> Result<()> {
        if self.width == 0 || self.height == 0 {
            return Err(StickercamError::config("Surface size cannot be zero"));
        }

        if self.width > MAX_WIDTH || self.height > MAX_HEIGHT {
            return Err(StickercamError::config(format!(
                "Surface {}x{} exceeds maximum supported ({}x{})",
                self.width, self.height, MAX_WIDTH, MAX_HEIGHT
            )));
        }

        if self.fps == 0 || self.fps > 240 {
            return Err(StickercamError::config(format!(
                "Framerate {} must be between 1 and 240",
                self.fps
            )));
        }

        if self.glyph_size == 0 {
            return Err(StickercamError::config("Glyph size cannot be zero"));
        }

        if self.frame_queue == 0 {
            return Err(StickercamError::config("Frame queue cannot be zero"));
        }

        if let SourceConfig::TestPattern { width, height, fps } = self.source {
            if width == 0 || height == 0 || fps == 0 {
                return Err(StickercamError::config(
                    "Test pattern size and framerate cannot be zero",
                ));
            }
            if width > MAX_WIDTH || height > MAX_HEIGHT {
                return Err(StickercamError::config(format!(
                    "Test pattern {}x{} exceeds maximum supported ({}x{})",
                    width, height, MAX_WIDTH, MAX_HEIGHT
                )));
            }
        }

        Ok(())
    }
}

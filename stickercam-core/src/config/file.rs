//! Configuration file loading and saving
//!
//! Loads user configuration from `~/.config/stickercam/config.toml`

use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use tracing::{debug, info, warn};

use crate::error::{Result, StickercamError};

/// Configuration file structure
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ConfigFile {
    /// Output surface settings
    #[serde(default)]
    pub surface: SurfaceSettings,

    /// Capture and recording settings
    #[serde(default)]
    pub capture: CaptureSettings,

    /// Live source settings
    #[serde(default)]
    pub source: SourceSettings,

    /// Download settings
    #[serde(default)]
    pub output: OutputSettings,
}

/// Output surface settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SurfaceSettings {
    /// Surface width in pixels
    #[serde(default = "default_width")]
    pub width: u32,

    /// Surface height in pixels
    #[serde(default = "default_height")]
    pub height: u32,
}

/// Capture and recording settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CaptureSettings {
    /// Recording framerate
    #[serde(default = "default_fps")]
    pub fps: u32,

    /// Sticker glyph size in pixels
    #[serde(default = "default_glyph_size")]
    pub glyph_size: u32,

    /// Startup filter (none, grayscale, sepia, invert)
    #[serde(default = "default_filter")]
    pub filter: String,

    /// Startup mode (still, continuous)
    #[serde(default = "default_mode")]
    pub mode: String,

    /// Recording container (mjpeg)
    #[serde(default = "default_video_format")]
    pub video_format: String,

    /// Surfaces buffered for the encoder
    #[serde(default = "default_frame_queue")]
    pub frame_queue: usize,
}

/// Live source settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SourceSettings {
    /// Source kind (test-pattern, image)
    #[serde(default = "default_source_kind")]
    pub kind: String,

    /// Image path for the `image` source
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub path: Option<PathBuf>,

    /// Test pattern width
    #[serde(default = "default_source_width")]
    pub width: u32,

    /// Test pattern height
    #[serde(default = "default_source_height")]
    pub height: u32,

    /// Test pattern framerate
    #[serde(default = "default_fps")]
    pub fps: u32,
}

/// Download settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OutputSettings {
    /// Directory downloads are written to
    #[serde(default = "default_output_dir")]
    pub directory: PathBuf,
}

// Default value functions
fn default_width() -> u32 {
    super::DEFAULT_WIDTH
}

fn default_height() -> u32 {
    super::DEFAULT_HEIGHT
}

fn default_fps() -> u32 {
    super::DEFAULT_FPS
}

fn default_glyph_size() -> u32 {
    super::DEFAULT_GLYPH_SIZE
}

fn default_frame_queue() -> usize {
    super::DEFAULT_FRAME_QUEUE
}

fn default_filter() -> String {
    "none".to_string()
}

fn default_mode() -> String {
    "still".to_string()
}

fn default_video_format() -> String {
    "mjpeg".to_string()
}

fn default_source_kind() -> String {
    "test-pattern".to_string()
}

fn default_source_width() -> u32 {
    640
}

fn default_source_height() -> u32 {
    480
}

fn default_output_dir() -> PathBuf {
    PathBuf::from(".")
}

impl Default for SurfaceSettings {
    fn default() -> Self {
        Self {
            width: default_width(),
            height: default_height(),
        }
    }
}

impl Default for CaptureSettings {
    fn default() -> Self {
        Self {
            fps: default_fps(),
            glyph_size: default_glyph_size(),
            filter: default_filter(),
            mode: default_mode(),
            video_format: default_video_format(),
            frame_queue: default_frame_queue(),
        }
    }
}

impl Default for SourceSettings {
    fn default() -> Self {
        Self {
            kind: default_source_kind(),
            path: None,
            width: default_source_width(),
            height: default_source_height(),
            fps: default_fps(),
        }
    }
}

impl Default for OutputSettings {
    fn default() -> Self {
        Self {
            directory: default_output_dir(),
        }
    }
}

impl ConfigFile {
    /// Get the default config file path
    pub fn default_path() -> PathBuf {
        if let Some(config_dir) = dirs::config_dir() {
            config_dir.join("stickercam").join("config.toml")
        } else if let Ok(home) = std::env::var("HOME") {
            PathBuf::from(home)
                .join(".config")
                .join("stickercam")
                .join("config.toml")
        } else {
            PathBuf::from("/etc/stickercam/config.toml")
        }
    }

    /// Load configuration from the default path
    pub fn load() -> Result<Self> {
        Self::load_from(Self::default_path())
    }

    /// Load configuration from a specific path
    pub fn load_from(path: PathBuf) -> Result<Self> {
        if !path.exists() {
            debug!("Config file not found at {:?}, using defaults", path);
            return Ok(Self::default());
        }

        let content = std::fs::read_to_string(&path)
            .map_err(|e| StickercamError::config(format!("Failed to read config file: {}", e)))?;

        let config: ConfigFile = toml::from_str(&content)
            .map_err(|e| StickercamError::config(format!("Failed to parse config file: {}", e)))?;

        info!("Loaded configuration from {:?}", path);
        Ok(config)
    }

    /// Load configuration, logging warnings but returning defaults on error
    pub fn load_or_default() -> Self {
        match Self::load() {
            Ok(config) => config,
            Err(e) => {
                warn!("Failed to load config file: {}, using defaults", e);
                Self::default()
            }
        }
    }

    /// Save configuration to a specific path
    pub fn save_to(&self, path: PathBuf) -> Result<()> {
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() && !parent.exists() {
                std::fs::create_dir_all(parent).map_err(|e| {
                    StickercamError::config(format!("Failed to create config directory: {}", e))
                })?;
            }
        }

        let content = toml::to_string_pretty(self)
            .map_err(|e| StickercamError::config(format!("Failed to serialize config: {}", e)))?;

        std::fs::write(&path, content)
            .map_err(|e| StickercamError::config(format!("Failed to write config file: {}", e)))?;

        info!("Saved configuration to {:?}", path);
        Ok(())
    }
}

/// Generate a sample configuration file
pub fn sample_config() -> String {
    r#"# stickercam configuration

[surface]
# Output surface size; the camera image is stretched to fill it
width = 640
height = 480

[capture]
# Render ticks per second while recording
fps = 30

# Sticker size in pixels
glyph_size = 60

# Startup filter: none, grayscale, sepia, invert
filter = "none"

# Startup mode: still, continuous
mode = "still"

# Recording container: mjpeg
video_format = "mjpeg"

# Rendered frames buffered for the encoder before frames are dropped
frame_queue = 8

[source]
# Live source: test-pattern, image
kind = "test-pattern"

# Image file served as the feed when kind = "image"
# path = "/path/to/picture.png"

# Test pattern size and framerate
width = 640
height = 480
fps = 30

[output]
# Directory photo.png / video.mjpeg are written to
directory = "."
"#
    .to_string()
}

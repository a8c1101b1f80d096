//! Error types for stickercam

use thiserror::Error;

/// Result type alias using StickercamError
pub type Result<T> = std::result::Result<T, StickercamError>;

/// Main error type for stickercam operations
#[derive(Debug, Error)]
pub enum StickercamError {
    /// Video device access denied or failed
    #[error("Device unavailable: {0}")]
    DeviceUnavailable(String),

    /// Capture or placement attempted without an active source
    #[error("No active video source")]
    SourceNotActive,

    /// Recording requested while a recording is already running
    #[error("Recording already in progress")]
    AlreadyRecording,

    /// Download requested with nothing captured
    #[error("No artifact available")]
    NoArtifactAvailable,

    /// Placement attempted with no sticker selected
    #[error("No sticker selected")]
    NoStickerSelected,

    /// Sticker id not in the palette
    #[error("Unknown sticker: {0}")]
    UnknownSticker(String),

    /// Placement outside the rendering surface
    #[error("Placement ({x}, {y}) is outside the {width}x{height} surface")]
    PlacementOutOfBounds {
        x: f32,
        y: f32,
        width: u32,
        height: u32,
    },

    /// Source active but no frame delivered yet
    #[error("Source has not produced a frame yet")]
    FrameNotReady,

    /// Encoder error
    #[error("Encoder error: {0}")]
    Encoder(String),

    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),

    /// I/O error
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Generic error with context
    #[error("{context}: {source}")]
    WithContext {
        context: String,
        #[source]
        source: Box<StickercamError>,
    },
}

impl StickercamError {
    /// Create a device error
    pub fn device(msg: impl Into<String>) -> Self {
        Self::DeviceUnavailable(msg.into())
    }

    /// Create an encoder error
    pub fn encoder(msg: impl Into<String>) -> Self {
        Self::Encoder(msg.into())
    }

    /// Create a config error
    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config(msg.into())
    }

    /// Add context to an error
    pub fn with_context(self, context: impl Into<String>) -> Self {
        Self::WithContext {
            context: context.into(),
            source: Box::new(self),
        }
    }

    /// Innermost error, skipping context wrappers
    pub fn root(&self) -> &StickercamError {
        match self {
            Self::WithContext { source, .. } => source.root(),
            other => other,
        }
    }

    /// Short status line shown to the user after a failed operation
    pub fn feedback(&self) -> String {
        match self.root() {
            Self::DeviceUnavailable(_) => "could not access the camera".to_string(),
            Self::SourceNotActive => "source is not active".to_string(),
            Self::AlreadyRecording => "already recording".to_string(),
            Self::NoArtifactAvailable => "nothing to download".to_string(),
            Self::NoStickerSelected => "select a sticker first".to_string(),
            Self::UnknownSticker(id) => format!("unknown sticker '{}'", id),
            Self::PlacementOutOfBounds { .. } => "click inside the picture".to_string(),
            Self::FrameNotReady => "camera is not ready yet".to_string(),
            Self::Encoder(_) => "encoding failed".to_string(),
            Self::Config(msg) => format!("invalid configuration: {}", msg),
            Self::Io(_) => "could not write the file".to_string(),
            Self::WithContext { .. } => unreachable!("root() strips context"),
        }
    }

    /// Suggestion for resolving the error, if there is one
    pub fn user_hint(&self) -> Option<&'static str> {
        match self.root() {
            Self::DeviceUnavailable(_) => {
                Some("Check that the camera is connected and not used by another application")
            }
            Self::SourceNotActive => Some("Enable the source first ('enable')"),
            Self::AlreadyRecording => Some("Stop the current recording before starting another"),
            Self::NoArtifactAvailable => Some("Take a photo or record a clip first"),
            Self::NoStickerSelected => Some("Pick a sticker with 'sticker <id>'"),
            Self::UnknownSticker(_) => Some("Run 'stickercam stickers' to list the palette"),
            Self::Config(_) => Some("Check ~/.config/stickercam/config.toml"),
            _ => None,
        }
    }

    /// Whether the user can fix this without a code change
    pub fn is_user_recoverable(&self) -> bool {
        !matches!(self.root(), Self::Encoder(_) | Self::Io(_))
    }
}

/// Extension trait for adding context to Results
pub trait ResultExt<T> {
    /// Add context to an error
    fn context(self, context: impl Into<String>) -> Result<T>;
}

impl<T> ResultExt<T> for Result<T> {
    fn context(self, context: impl Into<String>) -> Result<T> {
        self.map_err(|e| e.with_context(context))
    }
}

impl From<image::ImageError> for StickercamError {
    fn from(err: image::ImageError) -> Self {
        Self::Encoder(err.to_string())
    }
}

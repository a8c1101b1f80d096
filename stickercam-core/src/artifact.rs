//! Captured artifacts and the single-slot store holding them
//!
//! Exactly one artifact is kept at a time. Every stored artifact gets a
//! fresh [`Handle`] that previews refer to; replacing or clearing the
//! artifact releases the handle before the bytes are dropped.

use bytes::Bytes;
use serde::Serialize;
use tracing::debug;

use crate::encode::{VideoFormat, STILL_EXTENSION, STILL_MIME};
use crate::error::{Result, StickercamError};
use crate::filter::FilterKind;
use crate::types::Handle;

/// Encoded photo
#[derive(Debug, Clone)]
pub struct StillImage {
    bytes: Bytes,
    filter: FilterKind,
    dimensions: (u32, u32),
    overlays: usize,
}

impl StillImage {
    /// Wrap encoded PNG bytes
    pub fn new(bytes: Bytes, filter: FilterKind, dimensions: (u32, u32), overlays: usize) -> Self {
        Self {
            bytes,
            filter,
            dimensions,
            overlays,
        }
    }

    /// Encoded PNG bytes
    pub fn bytes(&self) -> &Bytes {
        &self.bytes
    }

    /// Filter that was applied when the photo was taken
    pub fn filter(&self) -> FilterKind {
        self.filter
    }

    /// Surface dimensions
    pub fn dimensions(&self) -> (u32, u32) {
        self.dimensions
    }

    /// Number of stickers stamped on the photo
    pub fn overlay_count(&self) -> usize {
        self.overlays
    }
}

/// Finalized recording
#[derive(Debug, Clone)]
pub struct VideoClip {
    bytes: Bytes,
    format: VideoFormat,
    frames: u64,
    fps: u32,
    dimensions: (u32, u32),
}

impl VideoClip {
    /// Wrap a finalized byte stream
    pub fn new(
        bytes: Bytes,
        format: VideoFormat,
        frames: u64,
        fps: u32,
        dimensions: (u32, u32),
    ) -> Self {
        Self {
            bytes,
            format,
            frames,
            fps,
            dimensions,
        }
    }

    /// Encoded stream
    pub fn bytes(&self) -> &Bytes {
        &self.bytes
    }

    /// Container format
    pub fn format(&self) -> VideoFormat {
        self.format
    }

    /// Frames in the clip
    pub fn frames(&self) -> u64 {
        self.frames
    }

    /// Nominal framerate
    pub fn fps(&self) -> u32 {
        self.fps
    }

    /// Frame dimensions, `(0, 0)` for an empty clip
    pub fn dimensions(&self) -> (u32, u32) {
        self.dimensions
    }

    /// Clip length in seconds at the nominal framerate
    pub fn duration_secs(&self) -> f64 {
        if self.fps == 0 {
            return 0.0;
        }
        self.frames as f64 / self.fps as f64
    }
}

/// Final exportable output
#[derive(Debug, Clone)]
pub enum Artifact {
    /// A photo
    Still(StillImage),
    /// A recorded clip
    Video(VideoClip),
}

impl Artifact {
    /// Encoded bytes
    pub fn bytes(&self) -> &Bytes {
        match self {
            Self::Still(still) => still.bytes(),
            Self::Video(clip) => clip.bytes(),
        }
    }

    /// Download file name
    pub fn file_name(&self) -> String {
        match self {
            Self::Still(_) => format!("photo.{}", STILL_EXTENSION),
            Self::Video(clip) => format!("video.{}", clip.format().extension()),
        }
    }

    /// MIME type of the bytes
    pub fn mime(&self) -> &'static str {
        match self {
            Self::Still(_) => STILL_MIME,
            Self::Video(clip) => clip.format().mime(),
        }
    }

    /// Whether this is a photo
    pub fn is_still(&self) -> bool {
        matches!(self, Self::Still(_))
    }

    /// Borrow as a photo
    pub fn as_still(&self) -> Option<&StillImage> {
        match self {
            Self::Still(still) => Some(still),
            Self::Video(_) => None,
        }
    }

    /// Borrow as a clip
    pub fn as_video(&self) -> Option<&VideoClip> {
        match self {
            Self::Video(clip) => Some(clip),
            Self::Still(_) => None,
        }
    }
}

/// Bytes ready to be saved under a fixed file name
#[derive(Debug, Clone)]
pub struct Download {
    /// `photo.png` or `video.<ext>`
    pub file_name: String,
    /// MIME type of the bytes
    pub mime: &'static str,
    /// Encoded content
    pub bytes: Bytes,
}

/// Summary of the stored artifact, for status output
#[derive(Debug, Clone, Serialize)]
pub struct ArtifactSummary {
    pub handle: u64,
    pub kind: &'static str,
    pub file_name: String,
    pub size: usize,
}

/// Holds the most recent artifact
#[derive(Debug, Default)]
pub struct ArtifactStore {
    current: Option<(Handle, Artifact)>,
    released: u64,
}

impl ArtifactStore {
    /// Create an empty store
    pub fn new() -> Self {
        Self::default()
    }

    /// Current artifact, if any
    pub fn current(&self) -> Option<&Artifact> {
        self.current.as_ref().map(|(_, artifact)| artifact)
    }

    /// Handle of the current artifact
    pub fn handle(&self) -> Option<Handle> {
        self.current.as_ref().map(|(handle, _)| *handle)
    }

    /// Store an artifact, releasing the previous one
    pub fn set(&mut self, artifact: Artifact) -> Handle {
        self.release();
        let handle = Handle::new();
        debug!("Stored {} as {}", artifact.file_name(), handle);
        self.current = Some((handle, artifact));
        handle
    }

    /// Release and drop the current artifact
    pub fn clear(&mut self) {
        self.release();
    }

    /// Whether an artifact is stored
    pub fn is_empty(&self) -> bool {
        self.current.is_none()
    }

    /// Number of handles released so far
    pub fn released(&self) -> u64 {
        self.released
    }

    /// Export the current artifact
    pub fn download(&self) -> Result<Download> {
        let artifact = self.current().ok_or(StickercamError::NoArtifactAvailable)?;
        Ok(Download {
            file_name: artifact.file_name(),
            mime: artifact.mime(),
            bytes: artifact.bytes().clone(),
        })
    }

    /// Summary for status output
    pub fn summary(&self) -> Option<ArtifactSummary> {
        self.current.as_ref().map(|(handle, artifact)| ArtifactSummary {
            handle: handle.as_u64(),
            kind: if artifact.is_still() { "still" } else { "video" },
            file_name: artifact.file_name(),
            size: artifact.bytes().len(),
        })
    }

    fn release(&mut self) {
        if let Some((handle, artifact)) = self.current.take() {
            debug!(
                "Released {} ({}, {} bytes)",
                handle,
                artifact.file_name(),
                artifact.bytes().len()
            );
            self.released += 1;
        }
    }
}

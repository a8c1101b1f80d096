//! Stickercam Core Library
//!
//! Live camera compositing with filters, stickers, photo and video capture.
//!
//! This library provides:
//! - Live frame sources (test pattern, image file, or any [`VideoDevice`])
//! - Color filters and emoji sticker overlays composited per frame
//! - PNG photos and Motion-JPEG recordings of the composited surface
//!
//! # Architecture
//!
//! ```text
//! ┌──────────────┐    ┌──────────────────────┐    ┌───────────────┐
//! │ FrameSource  │───▶│ Compositor           │───▶│ Capture       │
//! │ (live feed)  │    │ filter + stickers    │    │ PNG / MJPEG   │
//! └──────────────┘    └──────────────────────┘    └───────┬───────┘
//!                                                         ▼
//!                                                 ┌───────────────┐
//!                                                 │ ArtifactStore │
//!                                                 └───────────────┘
//! ```

pub mod artifact;
pub mod capture;
pub mod compositor;
pub mod config;
pub mod encode;
pub mod error;
pub mod filter;
pub mod overlay;
pub mod scheduler;
pub mod session;
pub mod source;
pub mod types;

pub use artifact::{Artifact, ArtifactStore, Download, StillImage, VideoClip};
pub use capture::{CaptureController, TickOutcome};
pub use compositor::{Compositor, Surface};
pub use config::{CaptureConfig, ConfigFile, SourceConfig};
pub use error::{Result, StickercamError};
pub use filter::FilterKind;
pub use overlay::{find_sticker, OverlaySet, PlacedOverlay, StickerDefinition, PALETTE};
pub use scheduler::{record_for, FrameClock};
pub use session::{Affordances, Session, SessionStatus, UiEvent};
pub use source::{FrameSource, LiveFeed, SourceDevice, VideoDevice};
pub use types::{CaptureMode, Frame, Handle, RecordingState};

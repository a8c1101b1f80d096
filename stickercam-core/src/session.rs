//! Session aggregate
//!
//! A [`Session`] owns everything scoped to one user session: the device and
//! its active feed, the selected filter, mode and sticker, the placed
//! overlays, the capture controller and the artifact store. It is mutated
//! only through `&mut self`, so every UI event runs to completion before
//! the next render tick.
//!
//! Every operation leaves a short feedback line for the UI. [`Session::dispatch`]
//! is the UI boundary: it recovers every error into that feedback line.

use serde::Serialize;
use std::sync::Arc;
use std::time::Instant;
use tracing::{debug, error, info, warn};

use crate::artifact::{Artifact, ArtifactStore, ArtifactSummary, Download, VideoClip};
use crate::capture::{CaptureController, CaptureStats, TickOutcome};
use crate::config::CaptureConfig;
use crate::encode::{default_factory, EncoderFactory};
use crate::error::{Result, StickercamError};
use crate::filter::FilterKind;
use crate::overlay::{find_sticker, OverlaySet, PlacedOverlay, StickerDefinition};
use crate::source::{FrameSource, SourceDevice, VideoDevice};
use crate::types::{CaptureMode, Frame, Handle, RecordingState};

/// Discrete events emitted by the UI
#[derive(Debug, Clone, PartialEq)]
pub enum UiEvent {
    /// Turn the camera on
    EnableSource,
    /// Turn the camera off
    DisableSource,
    /// Pick a filter
    SetFilter(FilterKind),
    /// Switch between photo and video mode
    SetMode(CaptureMode),
    /// Pick the sticker used by the next placement
    SelectSticker(String),
    /// Click on the surface
    PlaceOverlay { x: f32, y: f32 },
    /// Capture button
    CaptureOrToggleRecording,
    /// Clear button
    Clear,
    /// Download button
    Download,
}

/// Which UI controls are usable right now
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Affordances {
    pub enable: bool,
    pub disable: bool,
    pub capture: bool,
    pub clear: bool,
    pub filter: bool,
    pub download: bool,
    /// Text on the capture button
    pub capture_label: &'static str,
}

/// Snapshot of the session for status output
#[derive(Debug, Clone, Serialize)]
pub struct SessionStatus {
    pub handle: u64,
    pub device: String,
    pub source_active: bool,
    pub source_dimensions: Option<(u32, u32)>,
    pub surface: (u32, u32),
    pub mode: CaptureMode,
    pub filter: FilterKind,
    pub sticker: Option<&'static str>,
    pub overlays: usize,
    pub epoch: u64,
    pub capture: CaptureStats,
    pub artifact: Option<ArtifactSummary>,
    pub feedback: String,
    pub elapsed_seconds: f64,
}

impl std::fmt::Display for SessionStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "Session {}: {} ({}), {} mode, filter {}, {} stickers, {:?}, {} frames, {} dropped, artifact: {}",
            self.handle,
            self.device,
            if self.source_active { "on" } else { "off" },
            self.mode,
            self.filter,
            self.overlays,
            self.capture.state,
            self.capture.frames_rendered,
            self.capture.frames_dropped,
            self.artifact
                .as_ref()
                .map(|a| a.file_name.as_str())
                .unwrap_or("none")
        )
    }
}

/// One user session over a video device
pub struct Session<D: VideoDevice> {
    handle: Handle,
    config: CaptureConfig,
    device: D,
    feed: Option<D::Feed>,
    filter: FilterKind,
    mode: CaptureMode,
    selected: Option<&'static StickerDefinition>,
    overlays: OverlaySet,
    capture: CaptureController,
    artifacts: ArtifactStore,
    feedback: String,
    epoch: u64,
    enabled_at: Option<Instant>,
}

impl Session<SourceDevice> {
    /// Create a session over the device selected in `config`
    pub fn from_config(config: CaptureConfig) -> Self {
        let device = SourceDevice::from_config(&config.source);
        Self::new(device, config)
    }
}

impl<D: VideoDevice> Session<D> {
    /// Create a session with the default encoder
    pub fn new(device: D, config: CaptureConfig) -> Self {
        let capture = CaptureController::new(config.clone(), default_factory());
        let handle = Handle::new();
        info!(
            "Session {} created for {} ({}x{}, {} mode)",
            handle,
            device.name(),
            config.width,
            config.height,
            config.mode
        );

        Self {
            handle,
            filter: config.filter,
            mode: config.mode,
            config,
            device,
            feed: None,
            selected: None,
            overlays: OverlaySet::new(),
            capture,
            artifacts: ArtifactStore::new(),
            feedback: String::new(),
            epoch: 0,
            enabled_at: None,
        }
    }

    /// Use `factory` for every recording started from now on
    pub fn with_encoder_factory(mut self, factory: EncoderFactory) -> Self {
        self.capture.set_encoder_factory(factory);
        self
    }

    /// Session handle
    pub fn handle(&self) -> Handle {
        self.handle
    }

    /// Capture configuration
    pub fn config(&self) -> &CaptureConfig {
        &self.config
    }

    /// The device feeds are requested from
    pub fn device(&self) -> &D {
        &self.device
    }

    /// Whether a feed is active
    pub fn is_source_active(&self) -> bool {
        self.feed.is_some()
    }

    /// Current filter
    pub fn filter(&self) -> FilterKind {
        self.filter
    }

    /// Current mode
    pub fn mode(&self) -> CaptureMode {
        self.mode
    }

    /// Sticker used by the next placement
    pub fn selected_sticker(&self) -> Option<&'static StickerDefinition> {
        self.selected
    }

    /// Placed stickers in draw order
    pub fn overlays(&self) -> &OverlaySet {
        &self.overlays
    }

    /// Recording state
    pub fn recording_state(&self) -> RecordingState {
        self.capture.state()
    }

    /// Whether a recording is running
    pub fn is_recording(&self) -> bool {
        self.capture.is_recording()
    }

    /// Counter bumped whenever pending clips must be thrown away
    pub fn epoch(&self) -> u64 {
        self.epoch
    }

    /// Latest feedback line
    pub fn feedback(&self) -> &str {
        &self.feedback
    }

    /// Current artifact, if any
    pub fn preview_artifact(&self) -> Option<&Artifact> {
        self.artifacts.current()
    }

    /// Artifact store
    pub fn artifacts(&self) -> &ArtifactStore {
        &self.artifacts
    }

    /// Capture counters
    pub fn capture_stats(&self) -> CaptureStats {
        self.capture.stats()
    }

    /// Request a feed from the device
    ///
    /// On `DeviceUnavailable` nothing changes and the source stays off.
    pub async fn enable_source(&mut self) -> Result<()> {
        if self.feed.is_some() {
            self.set_feedback("source already enabled");
            return Ok(());
        }

        match self.device.request_video_feed().await {
            Ok(feed) => {
                info!(
                    "Session {}: source {} enabled{}",
                    self.handle,
                    self.device.name(),
                    feed.dimensions()
                        .map(|(w, h)| format!(" at {}x{}", w, h))
                        .unwrap_or_default()
                );
                self.feed = Some(feed);
                self.enabled_at = Some(Instant::now());
                self.set_feedback("source enabled");
                Ok(())
            }
            Err(e) => {
                error!("Session {}: failed to enable source: {}", self.handle, e);
                Err(self.fail(e))
            }
        }
    }

    /// Release the feed and reset everything scoped to it
    ///
    /// Safe to call while already off. A running recording is aborted and
    /// its clip is never published.
    pub fn disable_source(&mut self) {
        if let Some(mut feed) = self.feed.take() {
            feed.stop();
            info!("Session {}: source disabled", self.handle);
        } else {
            debug!("Session {}: source already disabled", self.handle);
        }

        self.capture.abort();
        self.reset_scope();
        self.enabled_at = None;
        self.set_feedback("source disabled");
    }

    /// Select the filter used by subsequent renders
    pub fn set_filter(&mut self, filter: FilterKind) {
        self.filter = filter;
        debug!("Session {}: filter {}", self.handle, filter);
        self.set_feedback(format!("filter set to {}", filter));
    }

    /// Switch mode, clearing stickers and the artifact
    ///
    /// A running recording is aborted and its clip discarded.
    pub fn set_mode(&mut self, mode: CaptureMode) {
        if self.capture.abort() {
            warn!(
                "Session {}: mode switched while recording, clip discarded",
                self.handle
            );
        }
        self.reset_scope();
        self.mode = mode;
        info!("Session {}: mode {}", self.handle, mode);
        self.set_feedback(format!("mode set to {}", mode));
    }

    /// Select the sticker for the next placements, by id or emoji
    pub fn select_sticker(&mut self, key: &str) -> Result<()> {
        let sticker = find_sticker(key).map_err(|e| self.fail(e))?;
        self.selected = Some(sticker);
        self.set_feedback(format!("sticker {} selected", sticker.id));
        Ok(())
    }

    /// Place the selected sticker at surface coordinates
    ///
    /// In still mode the photo is re-captured so it shows the new sticker.
    pub fn place_overlay(&mut self, x: f32, y: f32) -> Result<()> {
        self.ensure_active()?;
        let Some(sticker) = self.selected else {
            return Err(self.fail(StickercamError::NoStickerSelected));
        };

        let (width, height) = self.capture.compositor().dimensions();
        let inside = x >= 0.0 && y >= 0.0 && x < width as f32 && y < height as f32;
        if !inside {
            return Err(self.fail(StickercamError::PlacementOutOfBounds {
                x,
                y,
                width,
                height,
            }));
        }

        self.overlays.push(PlacedOverlay::new(sticker, x, y));
        debug!(
            "Session {}: placed {} at ({}, {}), {} total",
            self.handle,
            sticker.id,
            x,
            y,
            self.overlays.len()
        );
        self.set_feedback("sticker placed");

        if self.mode == CaptureMode::Still && !self.is_recording() {
            match self.snapshot() {
                Ok(()) => self.set_feedback("photo captured"),
                Err(e) => debug!("Session {}: photo not refreshed: {}", self.handle, e),
            }
        }
        Ok(())
    }

    /// Take a photo of the current frame
    pub fn capture_still(&mut self) -> Result<()> {
        self.ensure_active()?;
        self.snapshot().map_err(|e| self.fail(e))?;
        self.set_feedback("photo captured");
        Ok(())
    }

    /// Start recording render ticks
    pub fn start_recording(&mut self) -> Result<()> {
        self.ensure_active()?;
        self.capture.start_recording().map_err(|e| self.fail(e))?;
        self.set_feedback("recording...");
        Ok(())
    }

    /// Stop recording; the clip is published once the encoder finalizes
    ///
    /// Returns `false` and changes nothing while idle.
    pub fn stop_recording(&mut self) -> bool {
        let stopped = self.capture.stop_recording(self.epoch);
        if stopped {
            self.set_feedback("recording stopped");
        }
        stopped
    }

    /// Capture button: photo in still mode, start/stop in continuous mode
    pub fn capture_or_toggle_recording(&mut self) -> Result<()> {
        match self.mode {
            CaptureMode::Still => self.capture_still(),
            CaptureMode::Continuous if self.is_recording() => {
                self.stop_recording();
                Ok(())
            }
            CaptureMode::Continuous => self.start_recording(),
        }
    }

    /// Remove stickers, the artifact and any clip still finalizing
    ///
    /// A running recording keeps going.
    pub fn clear(&mut self) {
        self.reset_scope();
        info!("Session {}: cleared", self.handle);
        self.set_feedback("screen cleared");
    }

    /// Export the current artifact
    pub fn download(&mut self) -> Result<Download> {
        match self.artifacts.download() {
            Ok(download) => {
                info!(
                    "Session {}: download {} ({} bytes)",
                    self.handle,
                    download.file_name,
                    download.bytes.len()
                );
                self.set_feedback(format!("download ready: {}", download.file_name));
                Ok(download)
            }
            Err(e) => Err(self.fail(e)),
        }
    }

    /// Render one frame of the running recording
    ///
    /// Returns [`TickOutcome::Idle`] when not recording; the caller should
    /// stop scheduling ticks then.
    pub fn render_tick(&mut self) -> TickOutcome {
        let frame = self.current_frame();
        self.capture
            .render_tick(frame.as_deref(), self.filter, &self.overlays)
    }

    /// Publish a finished clip if the encoder is done
    ///
    /// Returns `true` when a clip became the current artifact.
    pub fn poll_finalized(&mut self) -> bool {
        match self.capture.poll_finalized(self.epoch) {
            Some(result) => self.publish(result),
            None => false,
        }
    }

    /// Wait for the next pending clip and publish it
    pub async fn wait_finalized(&mut self) -> bool {
        match self.capture.wait_finalized(self.epoch).await {
            Some(result) => self.publish(result),
            None => false,
        }
    }

    /// Which controls the UI should enable
    pub fn affordances(&self) -> Affordances {
        let active = self.is_source_active();
        let capture_label = match (self.mode, self.is_recording()) {
            (CaptureMode::Still, _) => "Take Photo",
            (CaptureMode::Continuous, false) => "Start Recording",
            (CaptureMode::Continuous, true) => "Stop Recording",
        };

        Affordances {
            enable: !active,
            disable: active,
            capture: active,
            clear: active,
            filter: active,
            download: !self.artifacts.is_empty(),
            capture_label,
        }
    }

    /// Snapshot for status output
    pub fn status(&self) -> SessionStatus {
        SessionStatus {
            handle: self.handle.as_u64(),
            device: self.device.name(),
            source_active: self.is_source_active(),
            source_dimensions: self.feed.as_ref().and_then(|f| f.dimensions()),
            surface: self.capture.compositor().dimensions(),
            mode: self.mode,
            filter: self.filter,
            sticker: self.selected.map(|s| s.id),
            overlays: self.overlays.len(),
            epoch: self.epoch,
            capture: self.capture.stats(),
            artifact: self.artifacts.summary(),
            feedback: self.feedback.clone(),
            elapsed_seconds: self
                .enabled_at
                .map(|t| t.elapsed().as_secs_f64())
                .unwrap_or(0.0),
        }
    }

    /// Apply one UI event, turning every error into feedback
    ///
    /// Returns the exported bytes for [`UiEvent::Download`].
    pub async fn dispatch(&mut self, event: UiEvent) -> Option<Download> {
        debug!("Session {}: {:?}", self.handle, event);
        let result = match event {
            UiEvent::EnableSource => self.enable_source().await,
            UiEvent::DisableSource => {
                self.disable_source();
                Ok(())
            }
            UiEvent::SetFilter(filter) => {
                self.set_filter(filter);
                Ok(())
            }
            UiEvent::SetMode(mode) => {
                self.set_mode(mode);
                Ok(())
            }
            UiEvent::SelectSticker(key) => self.select_sticker(&key),
            UiEvent::PlaceOverlay { x, y } => self.place_overlay(x, y),
            UiEvent::CaptureOrToggleRecording => self.capture_or_toggle_recording(),
            UiEvent::Clear => {
                self.clear();
                Ok(())
            }
            UiEvent::Download => return self.download().ok(),
        };

        if let Err(e) = result {
            debug!("Session {}: event recovered: {}", self.handle, e);
        }
        None
    }

    fn current_frame(&self) -> Option<Arc<Frame>> {
        self.feed.as_ref().and_then(|feed| feed.latest_frame())
    }

    fn snapshot(&mut self) -> Result<()> {
        let frame = self.current_frame();
        let still = self
            .capture
            .capture_still(frame.as_deref(), self.filter, &self.overlays)?;
        self.artifacts.set(Artifact::Still(still));
        Ok(())
    }

    fn publish(&mut self, result: Result<VideoClip>) -> bool {
        match result {
            Ok(clip) => {
                self.artifacts.set(Artifact::Video(clip));
                self.set_feedback("recording finished");
                true
            }
            Err(e) => {
                error!("Session {}: recording lost: {}", self.handle, e);
                self.fail(e);
                false
            }
        }
    }

    /// Clear overlays, the artifact and pending clips; bump the epoch
    fn reset_scope(&mut self) {
        self.overlays.clear();
        self.artifacts.clear();
        self.capture.discard_pending();
        self.epoch += 1;
    }

    fn ensure_active(&mut self) -> Result<()> {
        if self.feed.is_none() {
            return Err(self.fail(StickercamError::SourceNotActive));
        }
        Ok(())
    }

    fn set_feedback(&mut self, message: impl Into<String>) {
        self.feedback = message.into();
        debug!("Session {}: {}", self.handle, self.feedback);
    }

    fn fail(&mut self, err: StickercamError) -> StickercamError {
        warn!("Session {}: {}", self.handle, err);
        self.feedback = err.feedback();
        err
    }
}

impl<D: VideoDevice> Drop for Session<D> {
    fn drop(&mut self) {
        if let Some(mut feed) = self.feed.take() {
            feed.stop();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::source::TestPatternDevice;

    fn session() -> Session<TestPatternDevice> {
        let config = CaptureConfig::default().with_size(32, 24).with_glyph_size(8);
        Session::new(TestPatternDevice::new(16, 12, 30), config)
    }

    #[tokio::test]
    async fn test_enable_and_disable() {
        let mut session = session();
        assert!(session.affordances().enable);

        session.enable_source().await.unwrap();
        assert!(session.is_source_active());
        assert_eq!(session.feedback(), "source enabled");
        assert!(session.affordances().capture);

        session.enable_source().await.unwrap();
        assert_eq!(session.feedback(), "source already enabled");

        session.disable_source();
        session.disable_source();
        assert!(!session.is_source_active());
        assert_eq!(session.feedback(), "source disabled");
    }

    #[test]
    fn test_place_requires_source() {
        let mut session = session();
        session.select_sticker("cool").unwrap();
        assert!(matches!(
            session.place_overlay(1.0, 1.0),
            Err(StickercamError::SourceNotActive)
        ));
        assert_eq!(session.feedback(), "source is not active");
    }

    #[tokio::test]
    async fn test_place_requires_sticker() {
        let mut session = session();
        session.enable_source().await.unwrap();
        assert!(matches!(
            session.place_overlay(1.0, 1.0),
            Err(StickercamError::NoStickerSelected)
        ));
        assert_eq!(session.feedback(), "select a sticker first");
    }

    #[tokio::test]
    async fn test_out_of_bounds_rejected() {
        let mut session = session();
        session.enable_source().await.unwrap();
        session.select_sticker("joy").unwrap();

        assert!(session.place_overlay(32.0, 5.0).is_err());
        assert!(session.place_overlay(-1.0, 5.0).is_err());
        assert!(session.place_overlay(f32::NAN, 5.0).is_err());
        assert!(session.overlays().is_empty());
    }

    #[test]
    fn test_capture_labels() {
        let mut session = session();
        assert_eq!(session.affordances().capture_label, "Take Photo");
        session.set_mode(CaptureMode::Continuous);
        assert_eq!(session.affordances().capture_label, "Start Recording");
    }

    #[tokio::test]
    async fn test_dispatch_recovers_errors() {
        let mut session = session();
        assert!(session.dispatch(UiEvent::Download).await.is_none());
        assert_eq!(session.feedback(), "nothing to download");

        session
            .dispatch(UiEvent::SelectSticker("unicorn".into()))
            .await;
        assert_eq!(session.feedback(), "unknown sticker 'unicorn'");
    }
}

//! Capture state machine
//!
//! Owns the recording state, the encoder lifecycle and the list of
//! finalizations still in flight. States are `Idle` and `Recording`;
//! there is no terminal state.
//!
//! While recording, every render tick composites one surface and hands it
//! to the encoder thread over a bounded channel. Stopping drops the sender,
//! so the encoder thread sees the channel close, finalizes and reports the
//! clip through a oneshot. Each finalization is tagged with the session
//! epoch current at stop time and only published if the epoch still
//! matches when it resolves.

use serde::Serialize;
use std::collections::VecDeque;
use std::time::Instant;
use tokio::sync::{mpsc, oneshot};
use tracing::{debug, error, info, trace, warn};

use crate::artifact::{StillImage, VideoClip};
use crate::compositor::{Compositor, Surface};
use crate::config::CaptureConfig;
use crate::encode::{encode_from_channel, encode_png, EncoderFactory};
use crate::error::{Result, StickercamError};
use crate::filter::FilterKind;
use crate::overlay::OverlaySet;
use crate::types::{Frame, RecordingState};

/// What a render tick did
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TickOutcome {
    /// Not recording; the scheduler should stop ticking
    Idle,
    /// Surface rendered and queued for the encoder
    Rendered,
    /// No usable frame this tick, nothing rendered
    NoFrame,
    /// Surface rendered but the encoder queue was full
    Dropped,
}

impl TickOutcome {
    /// Whether another tick should be scheduled
    pub fn keep_running(&self) -> bool {
        !matches!(self, Self::Idle)
    }
}

/// Recording in progress
struct ActiveRecording {
    /// Surface queue into the encoder thread
    frame_tx: mpsc::Sender<Surface>,
    /// Resolves once the encoder thread has finalized
    done_rx: oneshot::Receiver<Result<VideoClip>>,
    /// Recording start
    started: Instant,
    /// Surfaces queued during this recording
    frames_sent: u64,
}

/// Finalization waiting to be published
struct PendingFinalization {
    /// Session epoch at stop time
    epoch: u64,
    /// Encoder thread result
    done_rx: oneshot::Receiver<Result<VideoClip>>,
}

/// Capture counters
#[derive(Debug, Clone, Copy, Default, Serialize)]
pub struct CaptureStats {
    /// Current recording state
    pub state: RecordingState,
    /// Surfaces queued for encoding across all recordings
    pub frames_rendered: u64,
    /// Surfaces dropped because the encoder queue was full
    pub frames_dropped: u64,
    /// Recordings started
    pub recordings_started: u64,
    /// Finalizations not yet published
    pub pending_finalizations: usize,
}

/// Still capture and recording lifecycle
pub struct CaptureController {
    config: CaptureConfig,
    compositor: Compositor,
    factory: EncoderFactory,
    state: RecordingState,
    active: Option<ActiveRecording>,
    pending: VecDeque<PendingFinalization>,
    frames_rendered: u64,
    frames_dropped: u64,
    recordings_started: u64,
}

impl CaptureController {
    /// Create an idle controller
    pub fn new(config: CaptureConfig, factory: EncoderFactory) -> Self {
        let compositor = Compositor::from_config(&config);
        Self {
            config,
            compositor,
            factory,
            state: RecordingState::Idle,
            active: None,
            pending: VecDeque::new(),
            frames_rendered: 0,
            frames_dropped: 0,
            recordings_started: 0,
        }
    }

    /// Replace the encoder factory used by later recordings
    pub fn set_encoder_factory(&mut self, factory: EncoderFactory) {
        self.factory = factory;
    }

    /// Current recording state
    pub fn state(&self) -> RecordingState {
        self.state
    }

    /// Whether a recording is running
    pub fn is_recording(&self) -> bool {
        self.state == RecordingState::Recording
    }

    /// Compositor shared by stills and recordings
    pub fn compositor(&self) -> &Compositor {
        &self.compositor
    }

    /// Number of finalizations not yet published
    pub fn pending_finalizations(&self) -> usize {
        self.pending.len()
    }

    /// Composite the current frame and encode it as a photo
    pub fn capture_still(
        &self,
        frame: Option<&Frame>,
        filter: FilterKind,
        overlays: &OverlaySet,
    ) -> Result<StillImage> {
        if self.is_recording() {
            return Err(StickercamError::AlreadyRecording);
        }

        let surface = self
            .compositor
            .render(frame, filter, overlays)
            .ok_or(StickercamError::FrameNotReady)?;
        let bytes = encode_png(&surface)?;

        debug!(
            "Captured still: {}x{}, filter {}, {} stickers, {} bytes",
            self.compositor.dimensions().0,
            self.compositor.dimensions().1,
            filter,
            overlays.len(),
            bytes.len()
        );

        Ok(StillImage::new(
            bytes,
            filter,
            surface.dimensions(),
            overlays.len(),
        ))
    }

    /// Create an encoder and start feeding it render ticks
    ///
    /// The encoder runs on its own thread until the recording stops.
    pub fn start_recording(&mut self) -> Result<()> {
        if self.is_recording() {
            return Err(StickercamError::AlreadyRecording);
        }

        let encoder = (self.factory)(&self.config)?;
        let format = encoder.format();
        let fps = self.config.fps;

        let (frame_tx, frame_rx) = mpsc::channel(self.config.frame_queue.max(1));
        let (done_tx, done_rx) = oneshot::channel();

        std::thread::Builder::new()
            .name("stickercam-encoder".to_string())
            .spawn(move || {
                let result = encode_from_channel(encoder, frame_rx, fps);
                if let Err(e) = &result {
                    error!("Encoder failed to finalize: {}", e);
                }
                // Receiver is gone when the recording was aborted
                let _ = done_tx.send(result);
            })
            .map_err(|e| {
                StickercamError::encoder(format!("failed to start encoder thread: {}", e))
            })?;

        self.active = Some(ActiveRecording {
            frame_tx,
            done_rx,
            started: Instant::now(),
            frames_sent: 0,
        });
        self.state = RecordingState::Recording;
        self.recordings_started += 1;

        info!(
            "Recording started: {} at {}x{}@{}fps",
            format, self.config.width, self.config.height, fps
        );
        Ok(())
    }

    /// Render one surface for the running recording
    ///
    /// Never blocks: a full encoder queue drops the surface.
    pub fn render_tick(
        &mut self,
        frame: Option<&Frame>,
        filter: FilterKind,
        overlays: &OverlaySet,
    ) -> TickOutcome {
        let Some(active) = self.active.as_mut() else {
            return TickOutcome::Idle;
        };

        let Some(surface) = self.compositor.render(frame, filter, overlays) else {
            trace!("Tick skipped, no frame");
            return TickOutcome::NoFrame;
        };

        match active.frame_tx.try_send(surface) {
            Ok(()) => {
                active.frames_sent += 1;
                self.frames_rendered += 1;
                trace!("Queued frame {}", active.frames_sent);
                TickOutcome::Rendered
            }
            Err(mpsc::error::TrySendError::Full(_)) => {
                self.frames_dropped += 1;
                warn!(
                    "Encoder queue full, dropped frame ({} dropped total)",
                    self.frames_dropped
                );
                TickOutcome::Dropped
            }
            Err(mpsc::error::TrySendError::Closed(_)) => {
                self.frames_dropped += 1;
                error!("Encoder task is gone, dropping frame");
                TickOutcome::Dropped
            }
        }
    }

    /// Stop recording and queue its finalization under `epoch`
    ///
    /// Returns `false` without doing anything while idle.
    pub fn stop_recording(&mut self, epoch: u64) -> bool {
        let Some(active) = self.active.take() else {
            debug!("Stop requested while idle, ignoring");
            return false;
        };

        let ActiveRecording {
            frame_tx,
            done_rx,
            started,
            frames_sent,
        } = active;
        drop(frame_tx);

        self.pending.push_back(PendingFinalization { epoch, done_rx });
        self.state = RecordingState::Idle;

        info!(
            "Recording stopped after {:.1}s, {} frames queued",
            started.elapsed().as_secs_f64(),
            frames_sent
        );
        true
    }

    /// Stop recording and throw the clip away
    pub fn abort(&mut self) -> bool {
        let Some(active) = self.active.take() else {
            return false;
        };

        self.state = RecordingState::Idle;
        warn!(
            "Recording aborted after {} frames, clip discarded",
            active.frames_sent
        );
        true
    }

    /// Drop every finalization still in flight
    pub fn discard_pending(&mut self) -> usize {
        let count = self.pending.len();
        if count > 0 {
            warn!("Discarding {} pending finalization(s)", count);
        }
        self.pending.clear();
        count
    }

    /// Publish the next finished finalization, if one is ready
    ///
    /// Finalizations resolve in stop order. Results tagged with an epoch
    /// other than `epoch` are dropped.
    pub fn poll_finalized(&mut self, epoch: u64) -> Option<Result<VideoClip>> {
        while let Some(front) = self.pending.front_mut() {
            let result = match front.done_rx.try_recv() {
                Ok(result) => result,
                Err(oneshot::error::TryRecvError::Empty) => return None,
                Err(oneshot::error::TryRecvError::Closed) => Err(StickercamError::encoder(
                    "encoder task ended without a result",
                )),
            };

            let Some(finished) = self.pending.pop_front() else {
                break;
            };
            if let Some(result) = Self::accept(finished.epoch, epoch, result) {
                return Some(result);
            }
        }
        None
    }

    /// Wait for the next finalization and publish it
    pub async fn wait_finalized(&mut self, epoch: u64) -> Option<Result<VideoClip>> {
        while let Some(finished) = self.pending.pop_front() {
            let result = finished.done_rx.await.unwrap_or_else(|_| {
                Err(StickercamError::encoder(
                    "encoder task ended without a result",
                ))
            });
            if let Some(result) = Self::accept(finished.epoch, epoch, result) {
                return Some(result);
            }
        }
        None
    }

    /// Counters and state
    pub fn stats(&self) -> CaptureStats {
        CaptureStats {
            state: self.state,
            frames_rendered: self.frames_rendered,
            frames_dropped: self.frames_dropped,
            recordings_started: self.recordings_started,
            pending_finalizations: self.pending.len(),
        }
    }

    fn accept(
        tagged: u64,
        current: u64,
        result: Result<VideoClip>,
    ) -> Option<Result<VideoClip>> {
        if tagged != current {
            warn!(
                "Dropping finalization from epoch {} (current {})",
                tagged, current
            );
            return None;
        }
        if let Ok(clip) = &result {
            info!(
                "Recording finalized: {} frames, {} bytes",
                clip.frames(),
                clip.bytes().len()
            );
        }
        Some(result)
    }
}

impl Drop for CaptureController {
    fn drop(&mut self) {
        self.abort();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::encode::default_factory;

    fn controller() -> CaptureController {
        let config = CaptureConfig::default().with_size(16, 12).with_glyph_size(4);
        CaptureController::new(config, default_factory())
    }

    fn frame() -> Frame {
        Frame::from_rgba(8, 6, vec![128; 8 * 6 * 4], 0)
    }

    #[test]
    fn test_still_requires_frame() {
        let ctl = controller();
        let err = ctl
            .capture_still(None, FilterKind::None, &OverlaySet::new())
            .unwrap_err();
        assert!(matches!(err, StickercamError::FrameNotReady));
    }

    #[test]
    fn test_still_capture() {
        let ctl = controller();
        let still = ctl
            .capture_still(Some(&frame()), FilterKind::Sepia, &OverlaySet::new())
            .unwrap();
        assert_eq!(still.dimensions(), (16, 12));
        assert_eq!(still.filter(), FilterKind::Sepia);
        assert_eq!(&still.bytes()[1..4], b"PNG");
    }

    #[test]
    fn test_record_without_runtime() {
        let mut ctl = controller();
        ctl.start_recording().unwrap();
        assert_eq!(
            ctl.render_tick(Some(&frame()), FilterKind::None, &OverlaySet::new()),
            TickOutcome::Rendered
        );
        assert!(ctl.stop_recording(0));

        let clip = tokio_test::block_on(ctl.wait_finalized(0)).unwrap().unwrap();
        assert_eq!(clip.frames(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_paused_clock_advances_while_recording() {
        let mut ctl = controller();
        ctl.start_recording().unwrap();

        tokio::time::sleep(std::time::Duration::from_secs(5)).await;
        ctl.render_tick(Some(&frame()), FilterKind::None, &OverlaySet::new());
        ctl.stop_recording(0);

        let clip = ctl.wait_finalized(0).await.unwrap().unwrap();
        assert_eq!(clip.frames(), 1);
    }

    #[test]
    fn test_idle_tick_does_nothing() {
        let mut ctl = controller();
        let outcome = ctl.render_tick(Some(&frame()), FilterKind::None, &OverlaySet::new());
        assert_eq!(outcome, TickOutcome::Idle);
        assert!(!outcome.keep_running());
        assert!(!ctl.stop_recording(0));
        assert_eq!(ctl.pending_finalizations(), 0);
    }

    #[tokio::test]
    async fn test_record_cycle() {
        let mut ctl = controller();
        ctl.start_recording().unwrap();
        assert!(matches!(
            ctl.start_recording(),
            Err(StickercamError::AlreadyRecording)
        ));
        assert!(matches!(
            ctl.capture_still(Some(&frame()), FilterKind::None, &OverlaySet::new()),
            Err(StickercamError::AlreadyRecording)
        ));

        for _ in 0..3 {
            ctl.render_tick(Some(&frame()), FilterKind::None, &OverlaySet::new());
        }
        assert!(ctl.stop_recording(1));
        assert!(!ctl.stop_recording(1));
        assert_eq!(ctl.pending_finalizations(), 1);

        let clip = ctl.wait_finalized(1).await.unwrap().unwrap();
        assert_eq!(clip.frames(), 3);
        assert_eq!(clip.dimensions(), (16, 12));
    }

    #[tokio::test]
    async fn test_stale_epoch_is_dropped() {
        let mut ctl = controller();
        ctl.start_recording().unwrap();
        ctl.render_tick(Some(&frame()), FilterKind::None, &OverlaySet::new());
        ctl.stop_recording(1);

        assert!(ctl.wait_finalized(2).await.is_none());
        assert_eq!(ctl.pending_finalizations(), 0);
    }

    #[tokio::test]
    async fn test_abort_registers_nothing() {
        let mut ctl = controller();
        ctl.start_recording().unwrap();
        assert!(ctl.abort());
        assert_eq!(ctl.state(), RecordingState::Idle);
        assert_eq!(ctl.pending_finalizations(), 0);
        assert_eq!(ctl.stats().recordings_started, 1);
    }
}

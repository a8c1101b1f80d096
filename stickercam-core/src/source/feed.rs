//! Latest-frame slot fed by a producer task

use parking_lot::Mutex;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use tracing::{debug, info, warn};

use super::FrameSource;
use crate::error::{Result, StickercamError};
use crate::types::Frame;

/// Shared state between the producer task and readers
struct SharedState {
    /// Most recent frame
    latest: Mutex<Option<Arc<Frame>>>,
    /// Frames produced so far
    frame_count: AtomicU64,
    /// Whether the producer is running
    running: AtomicBool,
}

/// Built-in frame source
///
/// A producer task overwrites the latest-frame slot at the source rate;
/// readers always see the newest complete frame.
pub struct LiveFeed {
    name: String,
    shared: Arc<SharedState>,
    producer: Option<JoinHandle<()>>,
}

impl LiveFeed {
    /// Start a producer calling `generate` with the frame index at `fps`
    ///
    /// The first frame is generated before returning, so the feed is ready
    /// immediately. Must be called from within a tokio runtime.
    pub fn spawn<G>(name: impl Into<String>, fps: u32, mut generate: G) -> Result<Self>
    where
        G: FnMut(u64) -> Frame + Send + 'static,
    {
        let name = name.into();
        let runtime = tokio::runtime::Handle::try_current()
            .map_err(|_| StickercamError::device(format!("{}: no async runtime", name)))?;

        let shared = Arc::new(SharedState {
            latest: Mutex::new(Some(Arc::new(generate(0)))),
            frame_count: AtomicU64::new(1),
            running: AtomicBool::new(true),
        });

        let period = Duration::from_secs_f64(1.0 / fps.max(1) as f64);
        let state = shared.clone();
        let producer = runtime.spawn(async move {
            let mut ticker = tokio::time::interval(period);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);
            // First tick completes immediately; frame 0 is already in the slot
            ticker.tick().await;

            while state.running.load(Ordering::SeqCst) {
                ticker.tick().await;
                if !state.running.load(Ordering::SeqCst) {
                    break;
                }
                let index = state.frame_count.fetch_add(1, Ordering::Relaxed);

                // Pixel generation stays off the async workers
                let produced = tokio::task::spawn_blocking(move || {
                    let frame = generate(index);
                    (generate, frame)
                })
                .await;
                let Ok((returned, frame)) = produced else {
                    warn!("Frame generator panicked, feed stopped");
                    state.running.store(false, Ordering::SeqCst);
                    break;
                };
                generate = returned;
                *state.latest.lock() = Some(Arc::new(frame));
            }
        });

        info!("Live feed started: {}", name);
        Ok(Self {
            name,
            shared,
            producer: Some(producer),
        })
    }

    /// Feed that serves one fixed frame without a producer task
    pub fn from_frame(name: impl Into<String>, frame: Frame) -> Self {
        let name = name.into();
        info!("Static feed started: {}", name);
        Self {
            name,
            shared: Arc::new(SharedState {
                latest: Mutex::new(Some(Arc::new(frame))),
                frame_count: AtomicU64::new(1),
                running: AtomicBool::new(true),
            }),
            producer: None,
        }
    }

    /// Name of the device this feed came from
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Frames produced so far
    pub fn frame_count(&self) -> u64 {
        self.shared.frame_count.load(Ordering::Relaxed)
    }

    /// Whether the feed is still delivering frames
    pub fn is_running(&self) -> bool {
        self.shared.running.load(Ordering::SeqCst)
    }
}

impl FrameSource for LiveFeed {
    fn latest_frame(&self) -> Option<Arc<Frame>> {
        if !self.is_running() {
            return None;
        }
        self.shared.latest.lock().clone()
    }

    fn dimensions(&self) -> Option<(u32, u32)> {
        self.shared
            .latest
            .lock()
            .as_ref()
            .map(|frame| (frame.width(), frame.height()))
    }

    fn stop(&mut self) {
        if !self.shared.running.swap(false, Ordering::SeqCst) {
            return;
        }

        if let Some(producer) = self.producer.take() {
            producer.abort();
        }
        self.shared.latest.lock().take();

        debug!("{} produced {} frames", self.name, self.frame_count());
        info!("Live feed stopped: {}", self.name);
    }
}

impl Drop for LiveFeed {
    fn drop(&mut self) {
        self.stop();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn frame(index: u64) -> Frame {
        Frame::from_rgba(2, 2, vec![index as u8; 16], index)
    }

    #[tokio::test]
    async fn test_ready_immediately() {
        let mut feed = LiveFeed::spawn("test", 30, frame).unwrap();
        assert!(feed.is_ready());
        assert_eq!(feed.dimensions(), Some((2, 2)));
        feed.stop();
    }

    #[tokio::test(start_paused = true)]
    async fn test_producer_advances() {
        let mut feed = LiveFeed::spawn("test", 10, frame).unwrap();
        tokio::time::sleep(Duration::from_millis(350)).await;

        let latest = feed.latest_frame().unwrap();
        assert!(latest.pts >= 2);
        assert!(feed.frame_count() >= 3);
        feed.stop();
    }

    #[tokio::test]
    async fn test_stop_is_idempotent() {
        let mut feed = LiveFeed::spawn("test", 30, frame).unwrap();
        feed.stop();
        feed.stop();
        assert!(!feed.is_ready());
        assert!(!feed.is_running());
    }

    #[test]
    fn test_spawn_without_runtime() {
        assert!(LiveFeed::spawn("test", 30, frame).is_err());
    }

    #[test]
    fn test_static_feed() {
        let mut feed = LiveFeed::from_frame("still", frame(7));
        assert_eq!(feed.latest_frame().unwrap().pts, 7);
        feed.stop();
        assert!(feed.latest_frame().is_none());
    }
}

//! Frame clock driving render ticks while recording
//!
//! The clock only paces ticks. Whether another tick is scheduled is decided
//! by the tick itself: [`Session::render_tick`] reports
//! [`TickOutcome::Idle`] once the recording has stopped, and the loop ends
//! there without rendering again.

use std::time::Duration;
use tokio::time::{Instant, Interval, MissedTickBehavior};
use tracing::{debug, trace};

use crate::capture::TickOutcome;
use crate::session::Session;
use crate::source::VideoDevice;

/// Fixed-rate tick source
pub struct FrameClock {
    interval: Interval,
    period: Duration,
    ticks: u64,
}

impl FrameClock {
    /// Tick `fps` times per second; late ticks are skipped, not bunched up
    pub fn new(fps: u32) -> Self {
        let period = Duration::from_secs_f64(1.0 / fps.max(1) as f64);
        let mut interval = tokio::time::interval(period);
        interval.set_missed_tick_behavior(MissedTickBehavior::Skip);
        Self {
            interval,
            period,
            ticks: 0,
        }
    }

    /// Wait for the next tick
    pub async fn tick(&mut self) -> Instant {
        let at = self.interval.tick().await;
        self.ticks += 1;
        at
    }

    /// Time between ticks
    pub fn period(&self) -> Duration {
        self.period
    }

    /// Ticks delivered so far
    pub fn ticks(&self) -> u64 {
        self.ticks
    }
}

/// Summary of a [`record_for`] run
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RecordRun {
    /// Surfaces handed to the encoder
    pub rendered: u64,
    /// Surfaces dropped on a full queue
    pub dropped: u64,
    /// Ticks without a usable frame
    pub skipped: u64,
}

/// Drive render ticks until `duration` has elapsed or the recording stops
///
/// Stops the recording when the time is up. The clip still has to be
/// collected with `poll_finalized` or `wait_finalized`.
pub async fn record_for<D: VideoDevice>(
    session: &mut Session<D>,
    clock: &mut FrameClock,
    duration: Duration,
) -> RecordRun {
    let deadline = Instant::now() + duration;
    let mut run = RecordRun::default();

    loop {
        let at = clock.tick().await;
        if at >= deadline {
            break;
        }

        match session.render_tick() {
            TickOutcome::Idle => {
                debug!("Recording stopped externally after {} ticks", clock.ticks());
                return run;
            }
            TickOutcome::Rendered => run.rendered += 1,
            TickOutcome::Dropped => run.dropped += 1,
            TickOutcome::NoFrame => run.skipped += 1,
        }
        trace!("Tick {} at {:?}", clock.ticks(), at);
    }

    session.stop_recording();
    debug!(
        "Recorded {} frames ({} dropped, {} skipped)",
        run.rendered, run.dropped, run.skipped
    );
    run
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_clock_period() {
        tokio_test::block_on(async {
            let clock = FrameClock::new(25);
            assert_eq!(clock.period(), Duration::from_millis(40));
            assert_eq!(clock.ticks(), 0);
        });
    }

    #[tokio::test(start_paused = true)]
    async fn test_clock_ticks() {
        let mut clock = FrameClock::new(10);
        let start = clock.tick().await;
        let next = clock.tick().await;
        assert_eq!(next - start, Duration::from_millis(100));
        assert_eq!(clock.ticks(), 2);
    }
}

//! Headless runtime - paces a `HeadlessHost` at a target frame rate
//!
//! Stands in for a display's vsync: every budget period the host fires its
//! pending frame, and the remainder of the budget is slept away.

use std::thread;
use std::time::{Duration, Instant};

use crate::config::RuntimeConfig;
use crate::host::HeadlessHost;

/// Time allotted to one frame at a target rate.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FrameBudget {
    budget: Duration,
}

impl FrameBudget {
    pub fn new(target_fps: u32) -> Self {
        let safe_fps = target_fps.max(1);
        let budget = Duration::from_nanos(1_000_000_000u64 / safe_fps as u64);
        Self { budget }
    }

    pub fn duration(&self) -> Duration {
        self.budget
    }

    /// Time left in the budget after `spent`.
    pub fn remaining(&self, spent: Duration) -> Option<Duration> {
        self.budget.checked_sub(spent).filter(|d| !d.is_zero())
    }
}

/// Why a frame loop returned.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StopReason {
    /// The configured frame limit was reached
    MaxFrames,
    /// Nothing requested another frame (the scheduler was stopped)
    Idle,
}

/// Summary of a frame loop run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunReport {
    /// Frames in which at least one host callback ran
    pub frames: u64,
    pub elapsed: Duration,
    pub reason: StopReason,
}

/// Drives a headless host's frames at a fixed budget.
#[derive(Debug, Clone)]
pub struct FrameLoop {
    budget: FrameBudget,
    max_frames: Option<u64>,
    pace: bool,
}

impl FrameLoop {
    pub fn new(config: &RuntimeConfig) -> Self {
        Self {
            budget: FrameBudget::new(config.target_fps),
            max_frames: config.max_frames,
            pace: true,
        }
    }

    /// Override the frame limit.
    pub fn with_max_frames(mut self, max_frames: Option<u64>) -> Self {
        self.max_frames = max_frames;
        self
    }

    /// Disable sleeping between frames. The host clock must then be advanced
    /// by the caller, typically from `before_frame`.
    pub fn unpaced(mut self) -> Self {
        self.pace = false;
        self
    }

    pub fn budget(&self) -> FrameBudget {
        self.budget
    }

    /// Fire frames until the limit is hit or no frame is pending.
    ///
    /// `before_frame` runs ahead of each frame with the frame index, so
    /// callers can move the host's signals.
    pub fn run(&self, host: &HeadlessHost, mut before_frame: impl FnMut(u64, &HeadlessHost)) -> RunReport {
        log::info!(
            "Frame loop starting: budget={:?} max_frames={:?}",
            self.budget.duration(),
            self.max_frames
        );
        let started = Instant::now();
        let mut frame: u64 = 0;

        let reason = loop {
            if let Some(max) = self.max_frames {
                if frame >= max {
                    log::info!("Reached max_frames={}, exiting loop", max);
                    break StopReason::MaxFrames;
                }
            }
            if host.pending_frames() == 0 {
                log::info!("No frame pending after {} frames, exiting loop", frame);
                break StopReason::Idle;
            }

            let frame_start = Instant::now();
            before_frame(frame, host);
            if host.fire_frame() == 0 {
                log::info!("Frame cancelled after {} frames, exiting loop", frame);
                break StopReason::Idle;
            }
            frame += 1;
            if frame % 120 == 0 {
                log::debug!("frame={}", frame);
            }

            if self.pace {
                if let Some(rest) = self.budget.remaining(frame_start.elapsed()) {
                    thread::sleep(rest);
                }
            }
        };

        RunReport {
            frames: frame,
            elapsed: started.elapsed(),
            reason,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::host::Host;
    use crate::queue::QueueKind;
    use crate::scheduler::FrameScheduler;
    use std::cell::Cell;
    use std::rc::Rc;

    #[test]
    fn test_frame_budget() {
        assert_eq!(FrameBudget::new(60).duration(), Duration::from_nanos(16_666_666));
        assert_eq!(FrameBudget::new(1).duration(), Duration::from_secs(1));
        // Zero is clamped to 1 fps
        assert_eq!(FrameBudget::new(0).duration(), Duration::from_secs(1));
    }

    #[test]
    fn test_frame_budget_remaining() {
        let budget = FrameBudget::new(100);
        assert_eq!(budget.remaining(Duration::from_millis(4)), Some(Duration::from_millis(6)));
        assert_eq!(budget.remaining(Duration::from_millis(10)), None);
        assert_eq!(budget.remaining(Duration::from_millis(25)), None);
    }

    #[test]
    fn test_run_until_max_frames() {
        let host = Rc::new(HeadlessHost::new());
        let scheduler = FrameScheduler::new(Rc::clone(&host)).unwrap();
        let hits = Rc::new(Cell::new(0));
        let counter = Rc::clone(&hits);
        scheduler.add("tick", move || counter.set(counter.get() + 1), QueueKind::Default);

        let frame_loop = FrameLoop::new(&RuntimeConfig::default())
            .with_max_frames(Some(5))
            .unpaced();
        let report = frame_loop.run(&host, |_, host| host.advance_ms(16));

        assert_eq!(report.frames, 5);
        assert_eq!(report.reason, StopReason::MaxFrames);
        assert_eq!(hits.get(), 6);
        assert_eq!(host.now_ms(), 80);
    }

    #[test]
    fn test_run_stops_when_idle() {
        let host = Rc::new(HeadlessHost::new());
        let scheduler = FrameScheduler::new(Rc::clone(&host)).unwrap();
        let handle = scheduler.clone();
        let frame_loop = FrameLoop::new(&RuntimeConfig::default()).unpaced();

        let report = frame_loop.run(&host, move |frame, _| {
            if frame == 3 {
                handle.stop();
            }
        });

        assert_eq!(report.frames, 3);
        assert_eq!(report.reason, StopReason::Idle);
        assert!(!scheduler.is_running());
    }

    #[test]
    fn test_before_frame_moves_signals() {
        let host = Rc::new(HeadlessHost::new());
        let scheduler = FrameScheduler::new(Rc::clone(&host)).unwrap();
        let hits = Rc::new(Cell::new(0));
        let counter = Rc::clone(&hits);
        scheduler.add("parallax", move || counter.set(counter.get() + 1), QueueKind::Scroll);

        let frame_loop = FrameLoop::new(&RuntimeConfig::default())
            .with_max_frames(Some(4))
            .unpaced();
        frame_loop.run(&host, |frame, host| {
            if frame % 2 == 0 {
                host.scroll_by(0.0, 10.0);
            }
        });

        // Registration plus frames 0 and 2
        assert_eq!(hits.get(), 3);
    }
}

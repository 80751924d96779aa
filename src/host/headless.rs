//! Headless host - an in-process `Host` driven by hand
//!
//! Frames only fire when `fire_frame` is called, and scroll, size, clock and
//! focus are all set explicitly. Used by tests and by the headless runtime.

use std::cell::{Cell, RefCell};
use std::mem;
use std::time::Instant;

use super::{FocusEvent, FocusHandler, FrameCallback, FrameHandle, Host, SubscriptionId};
use crate::signal::{ScrollOffset, ViewportSize};

/// Viewport size a new headless host reports.
pub const DEFAULT_VIEWPORT: ViewportSize = ViewportSize {
    width: 1920,
    height: 1080,
};

#[derive(Debug)]
enum Clock {
    Manual(Cell<u64>),
    System(Instant),
}

/// A host whose frames, signals and clock are under caller control.
pub struct HeadlessHost {
    frames_supported: bool,
    next_id: Cell<u64>,
    pending: RefCell<Vec<(FrameHandle, FrameCallback)>>,
    scroll: Cell<ScrollOffset>,
    viewport: Cell<ViewportSize>,
    clock: Clock,
    focus_handlers: RefCell<Vec<(SubscriptionId, FocusHandler)>>,
    frames_fired: Cell<u64>,
}

impl HeadlessHost {
    /// Host with a manual clock starting at 0 ms.
    pub fn new() -> Self {
        Self::with_clock(Clock::Manual(Cell::new(0)))
    }

    /// Host whose clock follows real elapsed time.
    pub fn realtime() -> Self {
        Self::with_clock(Clock::System(Instant::now()))
    }

    /// Host that reports no animation-frame support.
    pub fn without_frames() -> Self {
        Self {
            frames_supported: false,
            ..Self::new()
        }
    }

    fn with_clock(clock: Clock) -> Self {
        Self {
            frames_supported: true,
            next_id: Cell::new(1),
            pending: RefCell::new(Vec::new()),
            scroll: Cell::new(ScrollOffset::default()),
            viewport: Cell::new(DEFAULT_VIEWPORT),
            clock,
            focus_handlers: RefCell::new(Vec::new()),
            frames_fired: Cell::new(0),
        }
    }

    /// Builder-style viewport override.
    pub fn with_viewport(self, width: u32, height: u32) -> Self {
        self.viewport.set(ViewportSize::new(width, height));
        self
    }

    /// Run every frame callback requested so far.
    ///
    /// Callbacks requested while firing wait for the next call. Returns the
    /// number of callbacks run.
    pub fn fire_frame(&self) -> usize {
        let due = mem::take(&mut *self.pending.borrow_mut());
        let count = due.len();
        for (_, callback) in due {
            callback();
        }
        self.frames_fired.set(self.frames_fired.get() + count as u64);
        count
    }

    /// Advance the manual clock by `ms`, then fire a frame.
    pub fn step(&self, ms: u64) -> usize {
        self.advance_ms(ms);
        self.fire_frame()
    }

    pub fn pending_frames(&self) -> usize {
        self.pending.borrow().len()
    }

    pub fn frames_fired(&self) -> u64 {
        self.frames_fired.get()
    }

    pub fn set_scroll(&self, x: f64, y: f64) {
        self.scroll.set(ScrollOffset::new(x, y));
    }

    pub fn scroll_by(&self, dx: f64, dy: f64) {
        let current = self.scroll.get();
        self.scroll.set(ScrollOffset::new(current.x + dx, current.y + dy));
    }

    pub fn set_viewport(&self, width: u32, height: u32) {
        self.viewport.set(ViewportSize::new(width, height));
    }

    /// Set the manual clock. No effect on a realtime host.
    pub fn set_time_ms(&self, ms: u64) {
        match &self.clock {
            Clock::Manual(now) => now.set(ms),
            Clock::System(_) => log::warn!("set_time_ms ignored on realtime headless host"),
        }
    }

    /// Advance the manual clock. No effect on a realtime host.
    pub fn advance_ms(&self, ms: u64) {
        if let Clock::Manual(now) = &self.clock {
            now.set(now.get() + ms);
        }
    }

    pub fn blur(&self) {
        self.emit_focus(FocusEvent::Blur);
    }

    pub fn focus(&self) {
        self.emit_focus(FocusEvent::Focus);
    }

    pub fn focus_subscriptions(&self) -> usize {
        self.focus_handlers.borrow().len()
    }

    fn emit_focus(&self, event: FocusEvent) {
        let handlers: Vec<FocusHandler> = self
            .focus_handlers
            .borrow()
            .iter()
            .map(|(_, handler)| handler.clone())
            .collect();
        for handler in handlers {
            handler(event);
        }
    }

    fn next_id(&self) -> u64 {
        let id = self.next_id.get();
        self.next_id.set(id + 1);
        id
    }
}

impl Default for HeadlessHost {
    fn default() -> Self {
        Self::new()
    }
}

impl Host for HeadlessHost {
    fn supports_animation_frames(&self) -> bool {
        self.frames_supported
    }

    fn request_frame(&self, callback: FrameCallback) -> FrameHandle {
        let handle = FrameHandle(self.next_id());
        self.pending.borrow_mut().push((handle, callback));
        handle
    }

    fn cancel_frame(&self, handle: FrameHandle) {
        self.pending.borrow_mut().retain(|(pending, _)| *pending != handle);
    }

    fn scroll_offset(&self) -> ScrollOffset {
        self.scroll.get()
    }

    fn viewport_size(&self) -> ViewportSize {
        self.viewport.get()
    }

    fn subscribe_focus(&self, handler: FocusHandler) -> SubscriptionId {
        let id = SubscriptionId(self.next_id());
        self.focus_handlers.borrow_mut().push((id, handler));
        id
    }

    fn unsubscribe_focus(&self, id: SubscriptionId) {
        self.focus_handlers.borrow_mut().retain(|(sub, _)| *sub != id);
    }

    fn now_ms(&self) -> u64 {
        match &self.clock {
            Clock::Manual(now) => now.get(),
            Clock::System(start) => start.elapsed().as_millis() as u64,
        }
    }
}

//! Frame Scheduler - coalesces registered callbacks into one tick per frame
//!
//! Each tick, while playing:
//! - Runs the `default` queue
//! - Runs the `scroll` queue if the scroll offset changed
//! - Runs the `resize` queue if the viewport size changed
//! - Counts the frame for FPS sampling
//!
//! The next tick is requested from the host at the end of every tick, paused
//! or not, until `stop` is called.

use std::any::Any;
use std::cell::{Cell, RefCell};
use std::fmt;
use std::panic::{self, AssertUnwindSafe};
use std::rc::Rc;

use crate::config::TickrConfig;
use crate::error::{Result, TickrError};
use crate::fps::FpsCounter;
use crate::host::{FocusEvent, FrameHandle, Host, SubscriptionId};
use crate::lifecycle::Lifecycle;
use crate::queue::{Callback, QueueKind, QueueSet};
use crate::signal::Signal;

struct Inner {
    host: Rc<dyn Host>,
    queues: RefCell<QueueSet>,
    lifecycle: Cell<Lifecycle>,
    fps: RefCell<FpsCounter>,
    frame: Cell<Option<FrameHandle>>,
    stopped: Cell<bool>,
    focus_subscription: Cell<Option<SubscriptionId>>,
    callback_failures: Cell<u64>,
}

impl Drop for Inner {
    fn drop(&mut self) {
        if let Some(handle) = self.frame.take() {
            self.host.cancel_frame(handle);
        }
        if let Some(id) = self.focus_subscription.take() {
            self.host.unsubscribe_focus(id);
        }
    }
}

/// Handle to a frame scheduler.
///
/// Clones share the same scheduler, so a handle can be passed to every
/// dependent and captured by callbacks that need to add, remove or pause.
#[derive(Clone)]
pub struct FrameScheduler {
    inner: Rc<Inner>,
}

impl FrameScheduler {
    /// Create a scheduler with default configuration and arm its first tick.
    pub fn new<H: Host + 'static>(host: Rc<H>) -> Result<Self> {
        Self::with_config(host, &TickrConfig::default())
    }

    /// Create a scheduler from `config` and arm its first tick.
    pub fn with_config<H: Host + 'static>(host: Rc<H>, config: &TickrConfig) -> Result<Self> {
        Self::with_host(host, config)
    }

    /// Create a scheduler over a type-erased host.
    ///
    /// Fails with `FrameSourceUnavailable` if the host cannot schedule frames.
    pub fn with_host(host: Rc<dyn Host>, config: &TickrConfig) -> Result<Self> {
        config.validate()?;
        if !host.supports_animation_frames() {
            return Err(TickrError::FrameSourceUnavailable(
                "host cannot schedule animation frames".to_string(),
            ));
        }

        let mut queues = QueueSet::new();
        for kind in QueueKind::ALL {
            queues.get_mut(kind).set_active(config.queues.is_active(kind));
        }
        let fps = FpsCounter::with_window(host.now_ms(), config.fps_sample_window_ms);

        let scheduler = Self {
            inner: Rc::new(Inner {
                host,
                queues: RefCell::new(queues),
                lifecycle: Cell::new(Lifecycle::new(config.pause_on_blur)),
                fps: RefCell::new(fps),
                frame: Cell::new(None),
                stopped: Cell::new(false),
                focus_subscription: Cell::new(None),
                callback_failures: Cell::new(0),
            }),
        };
        scheduler.subscribe_focus();
        scheduler.arm();

        log::debug!(
            "Scheduler created: pause_on_blur={} fps_window={}ms",
            config.pause_on_blur,
            config.fps_sample_window_ms
        );
        Ok(scheduler)
    }

    /// Register `callback` under `id` in `queue` and call it once right away.
    ///
    /// If `id` is already registered in that queue the original callback is
    /// kept, but `callback` is still called. Returns `id`.
    pub fn add<F>(&self, id: impl Into<String>, callback: F, queue: impl Into<QueueKind>) -> String
    where
        F: Fn() + 'static,
    {
        let id = id.into();
        let kind = queue.into();
        let callback: Callback = Rc::new(callback);

        let stored = self
            .inner
            .queues
            .borrow_mut()
            .get_mut(kind)
            .insert(id.clone(), Rc::clone(&callback));
        if stored {
            log::debug!("Registered '{}' in {} queue", id, kind);
        } else {
            log::debug!("'{}' already registered in {} queue, keeping original", id, kind);
        }

        callback();
        id
    }

    /// Remove `id` from `queue`. Unknown ids are ignored.
    pub fn remove(&self, id: &str, queue: impl Into<QueueKind>) {
        let kind = queue.into();
        if self.inner.queues.borrow_mut().get_mut(kind).remove(id) {
            log::debug!("Removed '{}' from {} queue", id, kind);
        }
    }

    pub fn contains(&self, id: &str, queue: impl Into<QueueKind>) -> bool {
        self.inner.queues.borrow().get(queue.into()).contains(id)
    }

    /// Identifiers registered in `queue`, in registration order.
    pub fn registered(&self, queue: impl Into<QueueKind>) -> Vec<String> {
        self.inner.queues.borrow().get(queue.into()).ids()
    }

    pub fn is_queue_active(&self, kind: QueueKind) -> bool {
        self.inner.queues.borrow().get(kind).is_active()
    }

    /// Enable or disable a queue without touching its registrations.
    pub fn set_queue_active(&self, kind: QueueKind, active: bool) {
        self.inner.queues.borrow_mut().get_mut(kind).set_active(active);
        log::debug!("{} queue active={}", kind, active);
    }

    /// Last signal recorded by `kind`'s change gate.
    pub fn queue_signal(&self, kind: QueueKind) -> Signal {
        self.inner.queues.borrow().get(kind).previous_signal()
    }

    pub fn pause(&self) {
        self.update_lifecycle(Lifecycle::pause);
    }

    pub fn play(&self) {
        self.update_lifecycle(Lifecycle::play);
    }

    /// Flip the explicit pause flag. Returns true if now paused.
    pub fn toggle(&self) -> bool {
        let mut lifecycle = self.inner.lifecycle.get();
        let paused = lifecycle.toggle();
        self.inner.lifecycle.set(lifecycle);
        log::debug!("Scheduler toggled: paused={}", paused);
        paused
    }

    /// Set whether losing focus pauses the scheduler.
    pub fn pause_on_blur(&self, value: bool) {
        self.update_lifecycle(|lc| lc.set_pause_on_blur(value));
    }

    pub fn lifecycle(&self) -> Lifecycle {
        self.inner.lifecycle.get()
    }

    pub fn is_paused(&self) -> bool {
        self.lifecycle().paused
    }

    pub fn should_play(&self) -> bool {
        self.lifecycle().should_play()
    }

    /// Measured frames per second, or 0 while not playing.
    pub fn get_fps(&self) -> u32 {
        if self.should_play() {
            self.inner.fps.borrow().frames_per_second
        } else {
            0
        }
    }

    /// Frames counted since the last FPS sample.
    pub fn frames_processed(&self) -> u64 {
        self.inner.fps.borrow().frames_processed
    }

    /// Number of callback panics caught during ticks.
    pub fn callback_failures(&self) -> u64 {
        self.inner.callback_failures.get()
    }

    /// Whether a tick is pending with the host.
    pub fn is_running(&self) -> bool {
        self.inner.frame.get().is_some()
    }

    /// Cancel the pending tick and release the focus subscription.
    ///
    /// Registrations and pause state survive; `run` restarts the loop.
    pub fn stop(&self) {
        self.inner.stopped.set(true);
        if let Some(handle) = self.inner.frame.take() {
            self.inner.host.cancel_frame(handle);
        }
        if let Some(id) = self.inner.focus_subscription.take() {
            self.inner.host.unsubscribe_focus(id);
        }
        log::debug!("Scheduler stopped");
    }

    /// Run one tick now and keep the loop going.
    ///
    /// Restarts a stopped scheduler. A tick already pending is replaced, so
    /// only one chain of ticks ever exists.
    pub fn run(&self) {
        self.inner.stopped.set(false);
        if let Some(handle) = self.inner.frame.take() {
            self.inner.host.cancel_frame(handle);
        }
        self.subscribe_focus();
        self.tick();
    }

    fn tick(&self) {
        if self.should_play() {
            self.dispatch();
        } else {
            log::trace!("Tick skipped: paused");
        }

        if self.inner.stopped.get() {
            log::debug!("Scheduler stopped during tick, not re-arming");
            return;
        }
        self.arm();
    }

    fn dispatch(&self) {
        if self.is_queue_active(QueueKind::Default) {
            self.execute(QueueKind::Default);
        }

        if self.is_queue_active(QueueKind::Scroll) {
            let current = Signal::Scroll(self.inner.host.scroll_offset());
            if self.observe(QueueKind::Scroll, current) {
                self.execute(QueueKind::Scroll);
            }
        }

        if self.is_queue_active(QueueKind::Resize) {
            let current = Signal::Resize(self.inner.host.viewport_size());
            if self.observe(QueueKind::Resize, current) {
                self.execute(QueueKind::Resize);
            }
        }

        let now = self.inner.host.now_ms();
        if let Some(rate) = self.inner.fps.borrow_mut().record_frame(now) {
            log::trace!("FPS sample: {}", rate);
        }
    }

    fn observe(&self, kind: QueueKind, current: Signal) -> bool {
        self.inner.queues.borrow_mut().get_mut(kind).observe(current)
    }

    /// Invoke every callback in `kind` against a snapshot of the queue.
    ///
    /// Entries removed or replaced by an earlier callback in the same pass
    /// are skipped. Entries added during the pass wait for the next tick.
    fn execute(&self, kind: QueueKind) -> usize {
        let snapshot = self.inner.queues.borrow().get(kind).snapshot();
        let mut invoked = 0;
        for (id, callback) in snapshot {
            if !self.inner.queues.borrow().get(kind).holds(&id, &callback) {
                continue;
            }
            self.invoke_guarded(kind, &id, &callback);
            invoked += 1;
        }
        log::trace!("{} queue: {} callbacks", kind, invoked);
        invoked
    }

    fn invoke_guarded(&self, kind: QueueKind, id: &str, callback: &Callback) {
        if let Err(payload) = panic::catch_unwind(AssertUnwindSafe(|| callback())) {
            let failures = self.inner.callback_failures.get() + 1;
            self.inner.callback_failures.set(failures);
            log::error!(
                "Callback '{}' in {} queue panicked: {}",
                id,
                kind,
                panic_message(payload.as_ref())
            );
        }
    }

    fn arm(&self) {
        if self.inner.frame.get().is_some() {
            return;
        }
        let weak = Rc::downgrade(&self.inner);
        let handle = self.inner.host.request_frame(Box::new(move || {
            if let Some(inner) = weak.upgrade() {
                inner.frame.set(None);
                FrameScheduler { inner }.tick();
            }
        }));
        self.inner.frame.set(Some(handle));
    }

    fn subscribe_focus(&self) {
        if self.inner.focus_subscription.get().is_some() {
            return;
        }
        let weak = Rc::downgrade(&self.inner);
        let id = self.inner.host.subscribe_focus(Rc::new(move |event| {
            if let Some(inner) = weak.upgrade() {
                FrameScheduler { inner }.on_focus_event(event);
            }
        }));
        self.inner.focus_subscription.set(Some(id));
    }

    fn on_focus_event(&self, event: FocusEvent) {
        self.update_lifecycle(|lc| lc.on_focus_event(event));
    }

    fn update_lifecycle(&self, f: impl FnOnce(&mut Lifecycle)) {
        let mut lifecycle = self.inner.lifecycle.get();
        let before = lifecycle;
        f(&mut lifecycle);
        self.inner.lifecycle.set(lifecycle);
        if before != lifecycle {
            log::debug!(
                "Lifecycle: paused={} paused_by_blur={} pause_on_blur={}",
                lifecycle.paused,
                lifecycle.paused_by_blur,
                lifecycle.pause_on_blur
            );
        }
    }
}

impl fmt::Debug for FrameScheduler {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FrameScheduler")
            .field("queues", &*self.inner.queues.borrow())
            .field("lifecycle", &self.inner.lifecycle.get())
            .field("fps", &*self.inner.fps.borrow())
            .field("frame", &self.inner.frame.get())
            .finish()
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> &str {
    if let Some(msg) = payload.downcast_ref::<&str>() {
        msg
    } else if let Some(msg) = payload.downcast_ref::<String>() {
        msg.as_str()
    } else {
        "non-string panic payload"
    }
}

//! Host - the environment a scheduler runs in
//!
//! The host supplies:
//! - A one-shot animation-frame primitive (request/cancel)
//! - Scroll offset and viewport size samples
//! - Blur/focus notifications
//! - A millisecond clock for FPS sampling

pub mod headless;

pub use headless::HeadlessHost;

use std::rc::Rc;

use crate::signal::{ScrollOffset, ViewportSize};

/// One-shot callback run by the host on the next frame.
pub type FrameCallback = Box<dyn FnOnce()>;

/// Handler invoked on blur/focus changes.
pub type FocusHandler = Rc<dyn Fn(FocusEvent)>;

/// Opaque handle to a requested frame, used to cancel it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct FrameHandle(pub u64);

/// Opaque handle to a focus subscription.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SubscriptionId(pub u64);

/// Input-focus change of the hosting surface.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FocusEvent {
    Blur,
    Focus,
}

/// Environment primitives consumed by the scheduler.
///
/// Hosts are single-threaded and use interior mutability, so every method
/// takes `&self`.
pub trait Host {
    /// Whether the host can schedule animation frames at all.
    fn supports_animation_frames(&self) -> bool {
        true
    }

    /// Schedule `callback` for the next frame.
    ///
    /// The callback runs at most once, after the current call stack returns.
    fn request_frame(&self, callback: FrameCallback) -> FrameHandle;

    /// Cancel a pending frame. Unknown or already-fired handles are ignored.
    fn cancel_frame(&self, handle: FrameHandle);

    /// Current scroll offset of the viewport/document.
    fn scroll_offset(&self) -> ScrollOffset;

    /// Current viewport size.
    fn viewport_size(&self) -> ViewportSize;

    /// Subscribe to blur/focus changes.
    fn subscribe_focus(&self, handler: FocusHandler) -> SubscriptionId;

    /// Drop a focus subscription. Unknown ids are ignored.
    fn unsubscribe_focus(&self, id: SubscriptionId);

    /// Wall clock in milliseconds.
    fn now_ms(&self) -> u64;
}

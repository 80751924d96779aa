//! tickr - a per-frame callback scheduler
//!
//! tickr coalesces independently registered callbacks into one tick per
//! rendering frame, with `scroll` and `resize` queues that only run when
//! their signal changed since the previous tick.

pub mod bus;
pub mod config;
pub mod error;
pub mod fps;
pub mod host;
pub mod lifecycle;
pub mod queue;
pub mod runtime;
pub mod scheduler;
pub mod signal;

pub use error::{Result, TickrError};
pub use host::{HeadlessHost, Host};
pub use queue::QueueKind;
pub use scheduler::FrameScheduler;

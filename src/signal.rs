//! Signals - the host values that gate the scroll and resize queues

use std::fmt;

/// Scroll offset of the viewport/document.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct ScrollOffset {
    pub x: f64,
    pub y: f64,
}

impl ScrollOffset {
    pub fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }

    /// Positional equality where a NaN coordinate matches a NaN coordinate,
    /// so a host reporting NaN does not count as moving every tick.
    pub fn same_position(&self, other: &ScrollOffset) -> bool {
        same_coord(self.x, other.x) && same_coord(self.y, other.y)
    }
}

fn same_coord(a: f64, b: f64) -> bool {
    a == b || (a.is_nan() && b.is_nan())
}

impl fmt::Display for ScrollOffset {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({}, {})", self.x, self.y)
    }
}

/// Inner size of the viewport.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ViewportSize {
    pub width: u32,
    pub height: u32,
}

impl ViewportSize {
    pub fn new(width: u32, height: u32) -> Self {
        Self { width, height }
    }
}

impl fmt::Display for ViewportSize {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}x{}", self.width, self.height)
    }
}

/// The value a queue last saw, used for change-gating.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Signal {
    /// Ungated: the queue fires every tick
    None,
    Scroll(ScrollOffset),
    Resize(ViewportSize),
}

impl Signal {
    /// Whether `current` should trigger a queue whose last value is `self`.
    ///
    /// An ungated signal always triggers. A signal of a different kind is
    /// treated as a change.
    pub fn differs_from(&self, current: &Signal) -> bool {
        match (self, current) {
            (Signal::None, _) | (_, Signal::None) => true,
            (Signal::Scroll(prev), Signal::Scroll(cur)) => !prev.same_position(cur),
            (Signal::Resize(prev), Signal::Resize(cur)) => prev != cur,
            _ => true,
        }
    }
}

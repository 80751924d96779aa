//! Lifecycle Controller - explicit and blur-induced pause state

use crate::host::FocusEvent;

/// Pause flags and the pause-on-blur policy.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Lifecycle {
    /// Explicit, user-requested pause
    pub paused: bool,
    /// Implicit pause while the surface is unfocused
    pub paused_by_blur: bool,
    /// Whether losing focus pauses
    pub pause_on_blur: bool,
}

impl Default for Lifecycle {
    fn default() -> Self {
        Self {
            paused: false,
            paused_by_blur: false,
            pause_on_blur: true,
        }
    }
}

impl Lifecycle {
    pub fn new(pause_on_blur: bool) -> Self {
        Self {
            pause_on_blur,
            ..Default::default()
        }
    }

    /// Whether ticks should run callbacks.
    pub fn should_play(&self) -> bool {
        !self.paused && !self.paused_by_blur
    }

    pub fn pause(&mut self) {
        if !self.paused {
            self.paused = true;
        }
    }

    pub fn play(&mut self) {
        if self.paused {
            self.paused = false;
        }
    }

    /// Flip the explicit pause flag and return the new value.
    pub fn toggle(&mut self) -> bool {
        self.paused = !self.paused;
        self.paused
    }

    /// Set the policy. Current pause state is left alone.
    pub fn set_pause_on_blur(&mut self, value: bool) {
        self.pause_on_blur = value;
    }

    pub fn on_focus_event(&mut self, event: FocusEvent) {
        match event {
            FocusEvent::Blur => self.paused_by_blur = self.pause_on_blur,
            FocusEvent::Focus => self.paused_by_blur = false,
        }
    }
}

//! FPS Estimator - frames counted per sampling window

/// Default sampling window in milliseconds.
pub const DEFAULT_SAMPLE_WINDOW_MS: u64 = 1000;

/// Shortest window a configuration may ask for.
pub const MIN_SAMPLE_WINDOW_MS: u64 = 1000;

/// Rolling frame counter recomputed once per sampling window.
#[derive(Debug, Clone)]
pub struct FpsCounter {
    /// Frames since the last sample
    pub frames_processed: u64,
    /// Rate computed at the last sample
    pub frames_per_second: u32,
    /// Timestamp (ms) of the last sample
    pub last_sample_ms: u64,
    window_ms: u64,
}

impl FpsCounter {
    /// Create a counter whose first window starts at `now_ms`.
    pub fn new(now_ms: u64) -> Self {
        Self::with_window(now_ms, DEFAULT_SAMPLE_WINDOW_MS)
    }

    pub fn with_window(now_ms: u64, window_ms: u64) -> Self {
        Self {
            frames_processed: 0,
            frames_per_second: 0,
            last_sample_ms: now_ms,
            window_ms: window_ms.max(1),
        }
    }

    pub fn window_ms(&self) -> u64 {
        self.window_ms
    }

    /// Count one frame and resample if the window elapsed.
    ///
    /// Returns the new rate when a sample was taken.
    pub fn record_frame(&mut self, now_ms: u64) -> Option<u32> {
        self.frames_processed += 1;

        let elapsed = now_ms.saturating_sub(self.last_sample_ms);
        if elapsed < self.window_ms {
            return None;
        }

        let rate = (self.frames_processed as f64 / (elapsed as f64 / 1000.0)).floor();
        self.frames_per_second = rate as u32;
        self.frames_processed = 0;
        self.last_sample_ms = now_ms;
        Some(self.frames_per_second)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_counter() {
        let fps = FpsCounter::new(5_000);
        assert_eq!(fps.frames_processed, 0);
        assert_eq!(fps.frames_per_second, 0);
        assert_eq!(fps.last_sample_ms, 5_000);
        assert_eq!(fps.window_ms(), 1000);
    }

    #[test]
    fn test_no_sample_inside_window() {
        let mut fps = FpsCounter::new(0);
        for t in 1..=10 {
            assert_eq!(fps.record_frame(t * 16), None);
        }
        assert_eq!(fps.frames_processed, 10);
        assert_eq!(fps.frames_per_second, 0);
    }

    #[test]
    fn test_sample_at_window_boundary() {
        let mut fps = FpsCounter::new(0);
        for _ in 0..59 {
            fps.record_frame(500);
        }
        assert_eq!(fps.record_frame(1000), Some(60));
        assert_eq!(fps.frames_processed, 0);
        assert_eq!(fps.last_sample_ms, 1000);
    }

    #[test]
    fn test_rate_is_floored_over_long_window() {
        let mut fps = FpsCounter::new(0);
        for _ in 0..44 {
            fps.record_frame(100);
        }
        // 45 frames over 1.5 s = 30 fps
        assert_eq!(fps.record_frame(1500), Some(30));

        for _ in 0..9 {
            fps.record_frame(1600);
        }
        // 10 frames over 1.5 s = 6.66.. fps
        assert_eq!(fps.record_frame(3000), Some(6));
    }

    #[test]
    fn test_custom_window() {
        let mut fps = FpsCounter::with_window(0, 250);
        for _ in 0..4 {
            fps.record_frame(100);
        }
        // 5 frames over 0.25 s
        assert_eq!(fps.record_frame(250), Some(20));
    }

    #[test]
    fn test_zero_window_clamped() {
        let fps = FpsCounter::with_window(0, 0);
        assert_eq!(fps.window_ms(), 1);
    }

    #[test]
    fn test_clock_going_backwards_does_not_sample() {
        let mut fps = FpsCounter::new(2_000);
        assert_eq!(fps.record_frame(1_000), None);
        assert_eq!(fps.frames_processed, 1);
    }
}

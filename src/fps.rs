//! Windowed frame-rate estimator for the render loop.

use std::time::{Duration, Instant};

/// Default measurement window.
pub const DEFAULT_WINDOW: Duration = Duration::from_millis(1000);

/// Counts frames over a wall-clock window and reports the rate measured in
/// the last completed window.
///
/// `tick()` returns 0.0 until the first window closes and is never reset by
/// a query; only the thread driving the render loop mutates it.
#[derive(Debug)]
pub struct FpsMeter {
    window: Duration,
    window_start: Instant,
    frames: u32,
    fps: f64,
}

impl FpsMeter {
    pub fn new() -> Self {
        Self::with_window(DEFAULT_WINDOW)
    }

    pub fn with_window(window: Duration) -> Self {
        Self {
            window,
            window_start: Instant::now(),
            frames: 0,
            fps: 0.0,
        }
    }

    /// Record one rendered frame and return the current estimate.
    pub fn tick(&mut self) -> f64 {
        self.tick_at(Instant::now())
    }

    /// Clock-injected variant of [`tick`](Self::tick), used by tests.
    pub fn tick_at(&mut self, now: Instant) -> f64 {
        self.frames += 1;
        let elapsed = now.duration_since(self.window_start);
        if elapsed >= self.window {
            let elapsed_ms = elapsed.as_secs_f64() * 1000.0;
            self.fps = self.frames as f64 * (1000.0 / elapsed_ms);
            self.frames = 0;
            self.window_start = now;
        }
        self.fps
    }

    /// Last completed-window estimate without recording a frame.
    pub fn current(&self) -> f64 {
        self.fps
    }
}

impl Default for FpsMeter {
    fn default() -> Self {
        Self::new()
    }
}

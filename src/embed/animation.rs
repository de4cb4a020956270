//! Collapse animation played when the embedded region hides.
//!
//! The host is single-threaded, so the animation is a short blocking loop
//! that hands control to the host between frames to let it repaint.

use std::time::{Duration, Instant};

/// How long the collapse takes.
pub const HIDE_ANIMATION: Duration = Duration::from_millis(50);

/// Quadratic ease-out: starts fast, decelerates. `1 - (1-t)²`.
pub fn ease_out_quad(t: f32) -> f32 {
    let t = t.clamp(0.0, 1.0);
    1.0 - (1.0 - t) * (1.0 - t)
}

/// A height shrinking from `full` to (almost) zero over `duration`.
#[derive(Debug, Clone, Copy)]
pub struct Collapse {
    full: u32,
    duration: Duration,
}

impl Collapse {
    pub const fn new(full: u32, duration: Duration) -> Self {
        Self { full, duration }
    }

    /// Height after `elapsed`. Never reaches zero while running; the caller
    /// removes the region once the loop ends.
    pub fn height_at(&self, elapsed: Duration) -> u32 {
        let progress = if self.duration.is_zero() {
            1.0
        } else {
            elapsed.as_secs_f32() / self.duration.as_secs_f32()
        };
        let remaining = 1.0 - ease_out_quad(progress);
        (remaining * self.full as f32) as u32 + 1
    }

    /// Run to completion, calling `frame` with each intermediate height.
    ///
    /// Blocks the calling thread for the whole duration; cannot be cancelled.
    pub fn run(&self, mut frame: impl FnMut(u32)) {
        let start = Instant::now();
        loop {
            let elapsed = start.elapsed();
            if elapsed >= self.duration {
                break;
            }
            frame(self.height_at(elapsed));
        }
    }
}

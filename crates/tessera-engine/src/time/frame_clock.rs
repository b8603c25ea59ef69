use std::time::Instant;

/// Monotonic millisecond clock for hosts without their own frame timestamps.
///
/// Mirrors what a display-refresh callback hands out: a timestamp in
/// milliseconds that never decreases, plus a frame index.
#[derive(Debug, Clone)]
pub struct FrameClock {
    origin: Instant,
    last_ms: f64,
    frame_index: u64,
}

/// Timestamp handed to one frame.
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct FrameTime {
    /// Milliseconds since the clock was created.
    pub now_ms: f64,

    /// Monotonic frame counter.
    pub frame_index: u64,
}

impl FrameClock {
    pub fn new() -> Self {
        Self {
            origin: Instant::now(),
            last_ms: 0.0,
            frame_index: 0,
        }
    }

    /// Milliseconds since creation without advancing the frame index.
    pub fn now_ms(&self) -> f64 {
        self.origin.elapsed().as_secs_f64() * 1000.0
    }

    /// Advances the clock and returns the timestamp for the next frame.
    pub fn tick(&mut self) -> FrameTime {
        // Instant is monotonic already; the max() guards against float rounding.
        let now_ms = self.now_ms().max(self.last_ms);
        self.last_ms = now_ms;

        let ft = FrameTime {
            now_ms,
            frame_index: self.frame_index,
        };
        self.frame_index = self.frame_index.wrapping_add(1);
        ft
    }
}

impl Default for FrameClock {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ticks_are_monotonic_and_indexed() {
        let mut clock = FrameClock::new();
        let a = clock.tick();
        let b = clock.tick();
        assert!(b.now_ms >= a.now_ms);
        assert_eq!(a.frame_index, 0);
        assert_eq!(b.frame_index, 1);
    }
}

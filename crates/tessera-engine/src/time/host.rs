/// Source of display-refresh callbacks.
///
/// Each call blocks (or simulates blocking) until the next refresh and returns
/// its timestamp in milliseconds. `None` ends the loop.
pub trait SchedulingHost {
    fn next_frame(&mut self) -> Option<f64>;
}

/// Deterministic host advancing by a fixed step per frame.
///
/// Used to drive the scheduler without a display.
#[derive(Debug, Clone)]
pub struct FixedStepHost {
    now_ms: f64,
    step_ms: f64,
    remaining: Option<u64>,
}

impl FixedStepHost {
    /// Host starting at `start_ms`; the first frame is stamped `start_ms + step_ms`.
    pub fn new(start_ms: f64, step_ms: f64) -> Self {
        Self {
            now_ms: start_ms,
            step_ms,
            remaining: None,
        }
    }

    /// Limits the host to `frames` refreshes.
    pub fn with_frame_limit(mut self, frames: u64) -> Self {
        self.remaining = Some(frames);
        self
    }

    pub fn now_ms(&self) -> f64 {
        self.now_ms
    }
}

impl SchedulingHost for FixedStepHost {
    fn next_frame(&mut self) -> Option<f64> {
        if let Some(remaining) = self.remaining.as_mut() {
            if *remaining == 0 {
                return None;
            }
            *remaining -= 1;
        }
        self.now_ms += self.step_ms;
        Some(self.now_ms)
    }
}

/// Length of one FPS sampling window.
pub const FPS_SAMPLE_WINDOW_MS: f64 = 1000.0;

/// Rolling frames-per-second meter over fixed sampling windows.
///
/// Each recorded frame bumps a counter. Once at least [`FPS_SAMPLE_WINDOW_MS`]
/// has elapsed since the last sample, the counter is turned into an FPS value,
/// and both the counter and the sample timestamp reset.
///
/// The metric is advisory telemetry; it never drives control flow.
#[derive(Debug, Clone)]
pub struct FpsCounter {
    window_ms: f64,
    last_sample_ms: Option<f64>,
    frames_since_sample: u32,
    last_fps: Option<f64>,
}

impl FpsCounter {
    pub fn new() -> Self {
        Self::with_window(FPS_SAMPLE_WINDOW_MS)
    }

    pub fn with_window(window_ms: f64) -> Self {
        debug_assert!(window_ms > 0.0);
        Self {
            window_ms,
            last_sample_ms: None,
            frames_since_sample: 0,
            last_fps: None,
        }
    }

    /// Starts the first sampling window at `now_ms`.
    ///
    /// Without an explicit start, the first recorded frame opens the window
    /// and is not itself counted: a window holds one frame per interval.
    pub fn start_at(&mut self, now_ms: f64) {
        self.last_sample_ms = Some(now_ms);
        self.frames_since_sample = 0;
    }

    /// Records one completed frame at `now_ms`.
    ///
    /// Returns (and logs at `info`) the FPS value when this frame closes a
    /// sampling window.
    pub fn record_frame(&mut self, now_ms: f64) -> Option<f64> {
        let Some(start) = self.last_sample_ms else {
            self.start_at(now_ms);
            return None;
        };
        self.frames_since_sample += 1;

        let elapsed = now_ms - start;
        if elapsed < self.window_ms {
            return None;
        }

        let fps = f64::from(self.frames_since_sample) * 1000.0 / elapsed;
        self.frames_since_sample = 0;
        self.last_sample_ms = Some(now_ms);
        self.last_fps = Some(fps);
        log::info!("FPS: {fps:.2}");
        Some(fps)
    }

    /// Frames counted in the currently open window.
    pub fn frames_since_sample(&self) -> u32 {
        self.frames_since_sample
    }

    /// Most recently emitted value.
    pub fn last_fps(&self) -> Option<f64> {
        self.last_fps
    }
}

impl Default for FpsCounter {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const FRAME_MS: f64 = 16.67;

    #[test]
    fn sixty_frames_at_60hz_report_sixty_fps() {
        let mut fps = FpsCounter::new();
        fps.start_at(0.0);

        let mut emitted = None;
        for i in 1..=60 {
            let now = f64::from(i) * FRAME_MS;
            if let Some(v) = fps.record_frame(now) {
                emitted = Some((i, v));
            }
        }

        let (frame, value) = emitted.expect("a sample after ~1000 ms");
        assert_eq!(frame, 60);
        assert!((value - 60.0).abs() < 0.05, "fps = {value}");
        assert_eq!(fps.frames_since_sample(), 0);
    }

    #[test]
    fn no_sample_before_window_elapses() {
        let mut fps = FpsCounter::new();
        fps.start_at(0.0);
        for i in 1..=59 {
            assert!(fps.record_frame(f64::from(i) * FRAME_MS).is_none());
        }
        assert_eq!(fps.frames_since_sample(), 59);
        assert!(fps.last_fps().is_none());
    }

    #[test]
    fn sample_timestamp_resets_after_emission() {
        let mut fps = FpsCounter::new();
        fps.start_at(0.0);
        assert!(fps.record_frame(1000.0).is_some());
        // The next window starts at 1000 ms, not 0.
        assert!(fps.record_frame(1500.0).is_none());
        let v = fps.record_frame(2000.0).expect("second window closes");
        assert!((v - 2.0).abs() < 1e-9);
    }

    #[test]
    fn first_frame_opens_window_without_explicit_start() {
        let mut fps = FpsCounter::new();
        assert!(fps.record_frame(5000.0).is_none());
        assert_eq!(fps.frames_since_sample(), 0);
        assert!(fps.record_frame(5999.0).is_none());
        let v = fps.record_frame(6000.0).expect("window closes at +1000 ms");
        assert!((v - 2.0).abs() < 1e-9);
    }

    #[test]
    fn implicit_start_counts_intervals_not_timestamps() {
        let mut fps = FpsCounter::new();

        let mut emitted = Vec::new();
        for i in 1..=61 {
            if let Some(v) = fps.record_frame(f64::from(i) * FRAME_MS) {
                emitted.push((i, v));
            }
        }

        // Frame 1 opens the window; frames 2..=61 are the 60 counted ones.
        assert_eq!(emitted.len(), 1);
        let (frame, value) = emitted[0];
        assert_eq!(frame, 61);
        assert!((value - 60.0).abs() < 0.05, "fps = {value}");
        assert_eq!(fps.frames_since_sample(), 0);
    }

    #[test]
    fn slow_frames_report_fractional_fps() {
        let mut fps = FpsCounter::new();
        fps.start_at(0.0);
        let v = fps.record_frame(2000.0).expect("one frame over two seconds");
        assert!((v - 0.5).abs() < 1e-9);
    }
}

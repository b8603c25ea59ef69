use crate::device::RenderDevice;
use crate::time::{FpsCounter, SchedulingHost};

use super::{Session, StopToken};

/// Fixed draw sequence issued every frame.
///
/// The order quads are drawn in is also their hit-test precedence.
pub trait FrameScene {
    fn draw<D: RenderDevice>(&mut self, session: &mut Session<D>);
}

#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum SchedulerState {
    Idle,
    Rendering,
}

/// Result of one scheduler cycle.
#[derive(Debug, Copy, Clone, PartialEq)]
pub enum CycleOutcome {
    Rendered {
        /// Frames rendered so far, this one included.
        frame: u64,
        /// Set when this frame closed an FPS sampling window.
        fps: Option<f64>,
    },
    /// The stop token fired; nothing was rendered.
    Stopped,
}

/// Drives the render loop, one `Idle → Rendering → Idle` cycle per host
/// refresh.
pub struct FrameScheduler<S: FrameScene> {
    scene: S,
    fps: FpsCounter,
    state: SchedulerState,
    frames: u64,
    stop: StopToken,
}

impl<S: FrameScene> FrameScheduler<S> {
    pub fn new(scene: S) -> Self {
        Self::with_stop_token(scene, StopToken::new())
    }

    pub fn with_stop_token(scene: S, stop: StopToken) -> Self {
        Self {
            scene,
            fps: FpsCounter::new(),
            state: SchedulerState::Idle,
            frames: 0,
            stop,
        }
    }

    /// Opens the first FPS sampling window at host time `now_ms`.
    pub fn start_at(&mut self, now_ms: f64) {
        self.fps.start_at(now_ms);
    }

    /// Runs one full cycle at host timestamp `now_ms`:
    /// clear the surface, clear the draw list, draw the scene, count the
    /// frame, then sample FPS once the window has elapsed.
    ///
    /// Scheduling the next cycle is the host's job.
    pub fn cycle<D: RenderDevice>(&mut self, session: &mut Session<D>, now_ms: f64) -> CycleOutcome {
        if self.stop.is_stopped() {
            return CycleOutcome::Stopped;
        }
        debug_assert_eq!(self.state, SchedulerState::Idle, "cycle re-entered");

        self.state = SchedulerState::Rendering;
        session.begin_frame();
        self.scene.draw(session);
        self.frames += 1;
        let fps = self.fps.record_frame(now_ms);
        self.state = SchedulerState::Idle;

        CycleOutcome::Rendered {
            frame: self.frames,
            fps,
        }
    }

    /// Cycles once per host refresh until the host runs out of frames or the
    /// stop token fires. Returns the number of frames rendered by this call.
    pub fn run<D: RenderDevice, H: SchedulingHost + ?Sized>(
        &mut self,
        session: &mut Session<D>,
        host: &mut H,
    ) -> u64 {
        let start = self.frames;
        while !self.stop.is_stopped() {
            let Some(now_ms) = host.next_frame() else { break };
            if self.cycle(session, now_ms) == CycleOutcome::Stopped {
                break;
            }
        }
        log::debug!("frame loop ended after {} frames", self.frames - start);
        self.frames - start
    }

    pub fn state(&self) -> SchedulerState {
        self.state
    }

    pub fn frames(&self) -> u64 {
        self.frames
    }

    pub fn fps(&self) -> &FpsCounter {
        &self.fps
    }

    pub fn stop_token(&self) -> &StopToken {
        &self.stop
    }

    pub fn scene(&self) -> &S {
        &self.scene
    }

    pub fn scene_mut(&mut self) -> &mut S {
        &mut self.scene
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::atlas::{AtlasImage, LoadedAtlas};
    use crate::config::SessionConfig;
    use crate::coords::{ColorRgba, NdcRect};
    use crate::device::{Command, HeadlessDevice};
    use crate::time::FixedStepHost;

    struct OneQuad {
        stop_after: Option<(u64, StopToken)>,
        drawn: u64,
    }

    impl FrameScene for OneQuad {
        fn draw<D: RenderDevice>(&mut self, session: &mut Session<D>) {
            session.draw_quad("q", NdcRect::new(0.0, 0.0, 0.5, 0.5), ColorRgba::white());
            self.drawn += 1;
            if let Some((n, token)) = &self.stop_after {
                if self.drawn == *n {
                    token.stop();
                }
            }
        }
    }

    fn session() -> Session<HeadlessDevice> {
        let atlas = LoadedAtlas {
            image: AtlasImage { width: 1, height: 1, rgba: vec![0; 4] },
            uv: Default::default(),
        };
        Session::new(HeadlessDevice::new(100, 100), atlas, &SessionConfig::default()).unwrap()
    }

    #[test]
    fn cycle_clears_before_drawing() {
        let mut session = session();
        let mut scheduler = FrameScheduler::new(OneQuad { stop_after: None, drawn: 0 });

        let outcome = scheduler.cycle(&mut session, 16.0);

        assert_eq!(outcome, CycleOutcome::Rendered { frame: 1, fps: None });
        assert_eq!(scheduler.state(), SchedulerState::Idle);
        let cmds = session.device().commands();
        assert!(matches!(cmds[0], Command::Clear(_)));
        assert!(matches!(cmds[1], Command::Draw(_)));
        assert_eq!(session.quads().draw_list().len(), 1);
    }

    #[test]
    fn draw_list_holds_only_the_latest_frame() {
        let mut session = session();
        let mut scheduler = FrameScheduler::new(OneQuad { stop_after: None, drawn: 0 });

        for i in 1..=3 {
            scheduler.cycle(&mut session, f64::from(i) * 16.0);
        }
        assert_eq!(session.quads().draw_list().len(), 1);
        assert_eq!(session.hit_test(0.0, 0.0), Some("q"));
    }

    #[test]
    fn run_reports_fps_from_host_timestamps() {
        let mut session = session();
        let mut scheduler = FrameScheduler::new(OneQuad { stop_after: None, drawn: 0 });
        scheduler.start_at(0.0);
        let mut host = FixedStepHost::new(0.0, 16.67).with_frame_limit(60);

        let frames = scheduler.run(&mut session, &mut host);

        assert_eq!(frames, 60);
        let fps = scheduler.fps().last_fps().unwrap();
        assert!((fps - 60.0).abs() < 0.05, "fps = {fps}");
        assert_eq!(scheduler.fps().frames_since_sample(), 0);
    }

    #[test]
    fn run_without_explicit_start_reports_sixty_fps() {
        let mut session = session();
        let mut scheduler = FrameScheduler::new(OneQuad { stop_after: None, drawn: 0 });
        let mut host = FixedStepHost::new(0.0, 16.67).with_frame_limit(61);

        assert_eq!(scheduler.run(&mut session, &mut host), 61);

        let fps = scheduler.fps().last_fps().unwrap();
        assert!((fps - 60.0).abs() < 0.05, "fps = {fps}");
        assert_eq!(scheduler.fps().frames_since_sample(), 0);
    }

    #[test]
    fn stop_token_ends_run() {
        let mut session = session();
        let token = StopToken::new();
        let scene = OneQuad { stop_after: Some((5, token.clone())), drawn: 0 };
        let mut scheduler = FrameScheduler::with_stop_token(scene, token);
        let mut host = FixedStepHost::new(0.0, 16.0);

        assert_eq!(scheduler.run(&mut session, &mut host), 5);
        assert_eq!(scheduler.cycle(&mut session, 1000.0), CycleOutcome::Stopped);
        assert_eq!(scheduler.frames(), 5);
    }
}

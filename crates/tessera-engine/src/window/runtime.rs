use std::sync::Arc;

use anyhow::{Context, Result};
use winit::application::ApplicationHandler;
use winit::dpi::PhysicalSize;
use winit::event::WindowEvent;
use winit::event_loop::{ActiveEventLoop, ControlFlow, EventLoop};
use winit::window::{Window, WindowId};

use crate::atlas::LoadedAtlas;
use crate::config::SessionConfig;
use crate::coords::Viewport;
use crate::core::{CycleOutcome, FrameScene, FrameScheduler, Session};
use crate::device::{GpuInit, PresentOutcome, WgpuDevice};
use crate::input::platform::winit::translate_window_event;
use crate::input::PointerDispatcher;
use crate::time::FrameClock;

/// Window/runtime configuration.
#[derive(Debug, Clone)]
pub struct RuntimeConfig {
    pub title: String,
    /// Fixed surface size in physical pixels.
    pub initial_size: PhysicalSize<u32>,
}

impl Default for RuntimeConfig {
    fn default() -> Self {
        Self {
            title: "tessera".to_string(),
            initial_size: PhysicalSize::new(800, 600),
        }
    }
}

/// Entry point for the windowed run phase.
///
/// The window's redraw loop is the scheduling host: every `RedrawRequested`
/// runs one scheduler cycle, presents it, and requests the next redraw.
pub struct Runtime;

impl Runtime {
    /// Opens the window, builds the session from `atlas`, and runs until the
    /// window closes or the scheduler's stop token fires.
    ///
    /// Setup failures end the loop and are returned.
    pub fn run<S>(
        config: RuntimeConfig,
        gpu_init: GpuInit,
        session_config: SessionConfig,
        atlas: LoadedAtlas,
        scheduler: FrameScheduler<S>,
    ) -> Result<()>
    where
        S: FrameScene + 'static,
    {
        let event_loop = EventLoop::new().context("failed to create winit EventLoop")?;
        let mut state = RunState {
            config,
            gpu_init,
            session_config,
            atlas: Some(atlas),
            scheduler,
            clock: FrameClock::new(),
            window: None,
            session: None,
            dispatcher: PointerDispatcher::new(Viewport::default()),
            error: None,
        };

        event_loop
            .run_app(&mut state)
            .context("winit event loop terminated with error")?;

        match state.error.take() {
            Some(err) => Err(err),
            None => Ok(()),
        }
    }
}

struct RunState<S: FrameScene> {
    config: RuntimeConfig,
    gpu_init: GpuInit,
    session_config: SessionConfig,
    atlas: Option<LoadedAtlas>,
    scheduler: FrameScheduler<S>,
    clock: FrameClock,

    window: Option<Arc<Window>>,
    session: Option<Session<WgpuDevice>>,
    dispatcher: PointerDispatcher,

    error: Option<anyhow::Error>,
}

impl<S: FrameScene> RunState<S> {
    fn setup(&mut self, event_loop: &ActiveEventLoop) -> Result<()> {
        let atlas = self
            .atlas
            .take()
            .context("atlas already consumed by an earlier setup")?;

        let attrs = Window::default_attributes()
            .with_title(self.config.title.clone())
            .with_inner_size(self.config.initial_size)
            .with_resizable(false);
        let window = Arc::new(
            event_loop
                .create_window(attrs)
                .context("failed to create window")?,
        );

        let device = pollster::block_on(WgpuDevice::new(Arc::clone(&window), self.gpu_init.clone()))
            .context("GPU initialization failed")?;
        let session = Session::new(device, atlas, &self.session_config)?;

        self.dispatcher.set_viewport(session.viewport());
        self.scheduler.start_at(self.clock.now_ms());
        window.request_redraw();

        self.window = Some(window);
        self.session = Some(session);
        Ok(())
    }

    fn fail(&mut self, event_loop: &ActiveEventLoop, err: anyhow::Error) {
        log::error!("{err:#}");
        self.error = Some(err);
        event_loop.exit();
    }

    fn redraw(&mut self, event_loop: &ActiveEventLoop) {
        let Some(session) = self.session.as_mut() else { return };

        let ft = self.clock.tick();
        match self.scheduler.cycle(session, ft.now_ms) {
            CycleOutcome::Stopped => {
                event_loop.exit();
                return;
            }
            CycleOutcome::Rendered { .. } => {}
        }

        match session.device_mut().present() {
            PresentOutcome::Presented => {}
            PresentOutcome::Skipped(action) => log::debug!("frame {} skipped: {action:?}", ft.frame_index),
            PresentOutcome::Fatal => {
                self.fail(event_loop, anyhow::anyhow!("surface is no longer usable"));
                return;
            }
        }

        if let Some(window) = &self.window {
            window.request_redraw();
        }
    }
}

impl<S: FrameScene> ApplicationHandler for RunState<S> {
    fn resumed(&mut self, event_loop: &ActiveEventLoop) {
        if self.window.is_some() {
            return;
        }
        if let Err(e) = self.setup(event_loop) {
            self.fail(event_loop, e);
        }
    }

    fn about_to_wait(&mut self, event_loop: &ActiveEventLoop) {
        if self.scheduler.stop_token().is_stopped() {
            event_loop.exit();
            return;
        }
        event_loop.set_control_flow(ControlFlow::Wait);
    }

    fn window_event(&mut self, event_loop: &ActiveEventLoop, _window_id: WindowId, event: WindowEvent) {
        match &event {
            WindowEvent::CloseRequested => {
                self.scheduler.stop_token().stop();
                event_loop.exit();
            }

            WindowEvent::Resized(size) => {
                if let Some(session) = self.session.as_mut() {
                    session.device_mut().resize(size.width, size.height);
                    self.dispatcher
                        .set_viewport(Viewport::from_physical(size.width, size.height));
                }
            }

            WindowEvent::CursorMoved { .. } | WindowEvent::MouseInput { .. } => {
                let Some(session) = self.session.as_ref() else { return };
                if let Some(ev) = translate_window_event(&self.dispatcher.state(), &event) {
                    self.dispatcher.handle(ev, session.quads());
                }
            }

            WindowEvent::RedrawRequested => self.redraw(event_loop),

            _ => {}
        }
    }
}

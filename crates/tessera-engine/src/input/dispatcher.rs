use crate::coords::{pixel_to_ndc, Vec2, Viewport};
use crate::render::QuadRenderer;

use super::{MouseButton, MouseButtonState, PointerEvent, PointerState};

/// Routes pointer presses to a quad hit test.
///
/// Presses convert the pixel position to NDC against the current viewport
/// and query the quad draw list. Releases only update state. Movement is
/// tracked so button events without coordinates can be resolved.
#[derive(Debug, Clone)]
pub struct PointerDispatcher {
    state: PointerState,
    viewport: Viewport,
}

impl PointerDispatcher {
    pub fn new(viewport: Viewport) -> Self {
        Self {
            state: PointerState::default(),
            viewport,
        }
    }

    pub fn set_viewport(&mut self, viewport: Viewport) {
        self.viewport = viewport;
    }

    pub fn viewport(&self) -> Viewport {
        self.viewport
    }

    pub fn state(&self) -> PointerState {
        self.state
    }

    /// Records the press and hit tests it. Returns the id of the quad hit.
    pub fn pointer_down(&mut self, px: f32, py: f32, quads: &QuadRenderer) -> Option<String> {
        self.state.press(px, py);

        if !self.viewport.is_valid() {
            log::warn!("pointer down ignored: viewport {:?} is empty", self.viewport);
            return None;
        }

        let ndc = pixel_to_ndc(Vec2::new(px, py), self.viewport);
        let hit = quads.hit_test(ndc.x, ndc.y)?;
        log::info!("Clicked quad: ID={hit}");
        Some(hit.to_owned())
    }

    /// Records the release. No hit test happens on release.
    pub fn pointer_up(&mut self) {
        self.state.release();
    }

    /// Feeds one raw event. Only the left button is dispatched.
    pub fn handle(&mut self, event: PointerEvent, quads: &QuadRenderer) -> Option<String> {
        match event {
            PointerEvent::Moved { x, y } => {
                self.state.move_to(x, y);
                None
            }
            PointerEvent::Button {
                button: MouseButton::Left,
                state: MouseButtonState::Pressed,
                x,
                y,
            } => self.pointer_down(x, y, quads),
            PointerEvent::Button {
                button: MouseButton::Left,
                state: MouseButtonState::Released,
                ..
            } => {
                self.pointer_up();
                None
            }
            PointerEvent::Button { .. } => None,
        }
    }
}

use winit::event::{ElementState, MouseButton as WinitMouseButton, WindowEvent};

use crate::input::{MouseButton, MouseButtonState, PointerEvent, PointerState};

/// Translates a winit `WindowEvent` into a pointer event in physical pixels.
///
/// Button events carry the last tracked cursor position, since winit reports
/// them without coordinates. Returns `None` for everything else.
pub fn translate_window_event(pointer: &PointerState, event: &WindowEvent) -> Option<PointerEvent> {
    match event {
        WindowEvent::CursorMoved { position, .. } => Some(PointerEvent::Moved {
            x: position.x as f32,
            y: position.y as f32,
        }),

        WindowEvent::MouseInput { state, button, .. } => Some(PointerEvent::Button {
            button: map_mouse_button(*button),
            state: match state {
                ElementState::Pressed => MouseButtonState::Pressed,
                ElementState::Released => MouseButtonState::Released,
            },
            x: pointer.x,
            y: pointer.y,
        }),

        _ => None,
    }
}

fn map_mouse_button(b: WinitMouseButton) -> MouseButton {
    match b {
        WinitMouseButton::Left => MouseButton::Left,
        WinitMouseButton::Right => MouseButton::Right,
        WinitMouseButton::Middle => MouseButton::Middle,
        WinitMouseButton::Back => MouseButton::Other(3),
        WinitMouseButton::Forward => MouseButton::Other(4),
        WinitMouseButton::Other(v) => MouseButton::Other(v),
    }
}

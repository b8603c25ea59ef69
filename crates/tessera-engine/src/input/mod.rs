//! Pointer input.
//!
//! Public API is platform-agnostic and does not expose winit types.
//! The runtime translates platform events into `PointerEvent`s and feeds
//! them to the `PointerDispatcher`.

mod dispatcher;
pub(crate) mod platform;
mod pointer;
mod types;

pub use dispatcher::PointerDispatcher;
pub use pointer::PointerState;
pub use types::{MouseButton, MouseButtonState, PointerEvent};

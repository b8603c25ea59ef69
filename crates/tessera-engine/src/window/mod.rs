//! Window + runtime loop.
//!
//! Owns the `winit` EventLoop and Window, and wires them to the wgpu device,
//! the frame scheduler, and the pointer dispatcher.

mod runtime;

pub use runtime::{Runtime, RuntimeConfig};

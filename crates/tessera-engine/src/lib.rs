//! Tessera engine crate.
//!
//! Draws flat-colored quads and atlas sprites through a small GL-shaped
//! device layer, keeps a per-frame draw list for pointer hit testing, and
//! drives frames from a host refresh callback with FPS accounting.

pub mod atlas;
pub mod config;
pub mod coords;
pub mod core;
pub mod device;
pub mod input;
pub mod logging;
pub mod render;
pub mod scene;
pub mod shader;
pub mod time;
pub mod window;

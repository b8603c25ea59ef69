//! Per-frame scene data.
//!
//! - `DrawList`: the quads drawn this frame, in draw order
//! - `DemoScene`: the fixed sequence the demo renders

mod demo;
mod list;

pub use demo::{DemoScene, DEMO_QUADS, DEMO_SPRITES};
pub use list::{DrawList, QuadRecord};

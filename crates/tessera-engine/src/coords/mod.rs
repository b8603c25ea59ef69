//! Coordinate and geometry types shared by renderers and input.
//!
//! Renderer space is NDC:
//! - x, y in [-1, 1]
//! - origin at the surface center
//! - +X right, +Y up
//!
//! Pointer input arrives in pixels (top-left origin, +Y down) and is converted
//! with [`pixel_to_ndc`].

mod color;
mod ndc;
mod vec2;
mod viewport;

pub use color::ColorRgba;
pub use ndc::{ndc_to_pixel, pixel_to_ndc, NdcRect};
pub use vec2::Vec2;
pub use viewport::Viewport;

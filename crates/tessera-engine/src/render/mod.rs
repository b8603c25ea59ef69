//! Quad and sprite renderers.
//!
//! Both draw a unit triangle strip placed in NDC by the vertex stage
//! (`unit * size + center`), one draw call per primitive.

mod error;
mod quad;
mod sprite;

pub use error::RenderError;
pub use quad::{QuadRenderer, UNIT_STRIP};
pub use sprite::{SpriteRenderer, UNIT_STRIP_UV};

//! Texture atlas: the image, its name → UV mapping, and the uploaded texture
//! shared by sprite renderers.

mod error;
mod loader;
mod texture;
mod uv_map;

pub use error::AtlasError;
pub use loader::{AtlasImage, AtlasLoader, LoadedAtlas};
pub use texture::{AtlasSlot, AtlasTexture, SharedAtlas};
pub use uv_map::{AtlasUvMap, UvRect};

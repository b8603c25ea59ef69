//! Session and asset configuration.

use std::path::PathBuf;

use crate::coords::ColorRgba;

/// Default clear color: dark teal.
pub const DEFAULT_CLEAR_COLOR: ColorRgba = ColorRgba::new(0.0, 0.25, 0.3, 1.0);

/// Per-session rendering parameters.
#[derive(Debug, Clone, PartialEq)]
pub struct SessionConfig {
    /// Color the surface is cleared to at the start of every frame.
    pub clear_color: ColorRgba,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            clear_color: DEFAULT_CLEAR_COLOR,
        }
    }
}

/// Where the atlas resources live.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AssetPaths {
    pub atlas_json: PathBuf,
    pub atlas_image: PathBuf,
}

impl AssetPaths {
    pub const DEFAULT_ATLAS_JSON: &'static str = "static/atlas.json";
    pub const DEFAULT_ATLAS_IMAGE: &'static str = "static/atlas.png";

    /// Both files under `dir`, with the default file names.
    pub fn in_dir(dir: impl Into<PathBuf>) -> Self {
        let dir = dir.into();
        Self {
            atlas_json: dir.join("atlas.json"),
            atlas_image: dir.join("atlas.png"),
        }
    }
}

impl Default for AssetPaths {
    fn default() -> Self {
        Self {
            atlas_json: Self::DEFAULT_ATLAS_JSON.into(),
            atlas_image: Self::DEFAULT_ATLAS_IMAGE.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_point_at_static_dir() {
        let paths = AssetPaths::default();
        assert_eq!(paths, AssetPaths::in_dir("static"));
        assert_eq!(SessionConfig::default().clear_color, DEFAULT_CLEAR_COLOR);
    }
}

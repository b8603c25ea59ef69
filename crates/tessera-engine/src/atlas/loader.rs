use std::path::Path;

use crate::config::AssetPaths;

use super::{AtlasError, AtlasUvMap};

/// Decoded RGBA8 atlas image.
#[derive(Debug, Clone, PartialEq)]
pub struct AtlasImage {
    pub width: u32,
    pub height: u32,
    /// Tightly packed rows, top row first.
    pub rgba: Vec<u8>,
}

impl AtlasImage {
    /// Decodes any format the `image` crate was built with (PNG here).
    pub fn decode(bytes: &[u8]) -> Result<Self, AtlasError> {
        let img = image::load_from_memory(bytes)?.to_rgba8();
        let (width, height) = img.dimensions();
        if width == 0 || height == 0 {
            return Err(AtlasError::EmptyImage);
        }
        Ok(Self {
            width,
            height,
            rgba: img.into_raw(),
        })
    }
}

/// Fully resolved atlas resources. Nothing here is partially loaded.
#[derive(Debug, Clone)]
pub struct LoadedAtlas {
    pub image: AtlasImage,
    pub uv: AtlasUvMap,
}

impl LoadedAtlas {
    pub fn from_bytes(uv_json: &str, image_bytes: &[u8]) -> Result<Self, AtlasError> {
        Ok(Self {
            image: AtlasImage::decode(image_bytes)?,
            uv: AtlasUvMap::from_json(uv_json)?,
        })
    }
}

/// Loads the atlas image and UV mapping from disk.
#[derive(Debug, Clone)]
pub struct AtlasLoader {
    paths: AssetPaths,
}

impl AtlasLoader {
    pub fn new(paths: AssetPaths) -> Self {
        Self { paths }
    }

    pub fn paths(&self) -> &AssetPaths {
        &self.paths
    }

    /// Reads and decodes both resources.
    ///
    /// Completes before the frame loop starts; the result is the only thing
    /// the run phase accepts.
    pub async fn load(&self) -> Result<LoadedAtlas, AtlasError> {
        let uv = AtlasUvMap::from_slice(&read(&self.paths.atlas_json)?)?;

        let image = AtlasImage::decode(&read(&self.paths.atlas_image)?)?;

        log::debug!(
            "atlas loaded: {} sprites, {}x{} image",
            uv.len(),
            image.width,
            image.height
        );
        Ok(LoadedAtlas { image, uv })
    }
}

fn read(path: &Path) -> Result<Vec<u8>, AtlasError> {
    std::fs::read(path).map_err(|source| AtlasError::Io {
        path: path.to_path_buf(),
        source,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    /// 2x1 PNG: one red and one blue pixel.
    fn tiny_png() -> Vec<u8> {
        let img = image::RgbaImage::from_raw(2, 1, vec![255, 0, 0, 255, 0, 0, 255, 255])
            .expect("buffer matches dimensions");
        let mut out = std::io::Cursor::new(Vec::new());
        img.write_to(&mut out, image::ImageFormat::Png).expect("png encodes");
        out.into_inner()
    }

    #[test]
    fn decodes_png_to_rgba8() {
        let image = AtlasImage::decode(&tiny_png()).unwrap();
        assert_eq!((image.width, image.height), (2, 1));
        assert_eq!(image.rgba, vec![255, 0, 0, 255, 0, 0, 255, 255]);
    }

    #[test]
    fn garbage_image_is_an_error() {
        assert!(matches!(
            AtlasImage::decode(b"not a png"),
            Err(AtlasError::Image(_))
        ));
    }

    #[test]
    fn load_reads_both_files() {
        let dir = std::env::temp_dir().join(format!("tessera-atlas-{}", std::process::id()));
        std::fs::create_dir_all(&dir).unwrap();
        let json_path = dir.join("atlas.json");
        let png_path = dir.join("atlas.png");
        std::fs::write(&json_path, r#"{"sprite_0": [0, 0, 0.5, 1]}"#).unwrap();
        std::fs::write(&png_path, tiny_png()).unwrap();

        let loader = AtlasLoader::new(AssetPaths {
            atlas_json: json_path,
            atlas_image: png_path,
        });
        let atlas = pollster::block_on(loader.load()).unwrap();

        assert_eq!(atlas.uv.len(), 1);
        assert_eq!(atlas.image.width, 2);
        std::fs::remove_dir_all(&dir).ok();
    }

    #[test]
    fn non_utf8_uv_map_fails_the_load() {
        let dir = std::env::temp_dir().join(format!("tessera-atlas-utf8-{}", std::process::id()));
        std::fs::create_dir_all(&dir).unwrap();
        let json_path = dir.join("atlas.json");
        let png_path = dir.join("atlas.png");
        std::fs::write(&json_path, b"{\"sprite_\xff\": [0, 0, 1, 1]}").unwrap();
        std::fs::write(&png_path, tiny_png()).unwrap();

        let loader = AtlasLoader::new(AssetPaths {
            atlas_json: json_path,
            atlas_image: png_path,
        });
        let err = pollster::block_on(loader.load()).unwrap_err();

        assert!(matches!(err, AtlasError::Json(_)), "{err}");
        std::fs::remove_dir_all(&dir).ok();
    }

    #[test]
    fn missing_file_names_the_path() {
        let loader = AtlasLoader::new(AssetPaths {
            atlas_json: "/nonexistent/atlas.json".into(),
            atlas_image: "/nonexistent/atlas.png".into(),
        });
        let err = pollster::block_on(loader.load()).unwrap_err();
        assert!(err.to_string().contains("/nonexistent/atlas.json"), "{err}");
    }
}

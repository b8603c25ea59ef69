use std::path::PathBuf;

use thiserror::Error;

/// Atlas loading errors.
#[derive(Debug, Error)]
pub enum AtlasError {
    #[error("failed to read {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid UV mapping: {0}")]
    Json(#[from] serde_json::Error),

    #[error("invalid atlas image: {0}")]
    Image(#[from] image::ImageError),

    #[error("atlas image has zero size")]
    EmptyImage,
}

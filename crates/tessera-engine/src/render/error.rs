use thiserror::Error;

use crate::device::DeviceError;
use crate::shader::ShaderError;

/// Renderer construction failures. All of them are fatal for the renderer.
#[derive(Debug, Error)]
pub enum RenderError {
    #[error(transparent)]
    Shader(#[from] ShaderError),

    #[error(transparent)]
    Device(#[from] DeviceError),

    #[error("sprite renderer needs a valid atlas texture")]
    MissingTexture,
}

//! Rendering devices.
//!
//! [`RenderDevice`] is the GL-shaped surface the renderers draw through.
//! Two backends implement it:
//! - [`WgpuDevice`]: wgpu Instance/Adapter/Device/Queue plus the window
//!   surface, replaying each recorded frame in render passes
//! - [`HeadlessDevice`]: no GPU, records commands for inspection

mod api;
mod error;
mod gpu;
mod headless;
mod init;
mod slots;
mod surface;
mod wgpu_device;

pub use api::{
    ProgramId, RenderDevice, ShaderId, ShaderStage, TextureId, UniformLocation, UniformValue,
    VertexArrayId, VertexAttrib, MAX_TEXTURE_UNITS,
};
pub use error::{DeviceError, PresentOutcome, SurfaceErrorAction};
pub(crate) use gpu::Gpu;
pub use headless::{Command, DrawRecord, HeadlessDevice};
pub use init::GpuInit;
pub use wgpu_device::WgpuDevice;

use crate::shader::reflect::ProgramInterface;

/// Checks caller-supplied attribute pointers against the program's packed
/// vertex layout.
pub(crate) fn check_vertex_layout(
    interface: &ProgramInterface,
    stride: u32,
    attribs: &[VertexAttrib],
) -> Result<(), DeviceError> {
    let layout = interface.vertex_layout();
    if stride != layout.stride {
        return Err(DeviceError::VertexLayout(format!(
            "stride {stride}, program expects {}",
            layout.stride
        )));
    }
    for a in attribs {
        let Some(&(_, components, offset)) =
            layout.attributes.iter().find(|(loc, _, _)| *loc == a.location)
        else {
            return Err(DeviceError::VertexLayout(format!(
                "no vertex input at location {}",
                a.location
            )));
        };
        if components != a.components || offset != a.offset {
            return Err(DeviceError::VertexLayout(format!(
                "location {}: got {}x f32 at offset {}, expected {}x f32 at offset {}",
                a.location, a.components, a.offset, components, offset
            )));
        }
    }
    Ok(())
}

pub(crate) fn check_texture_data(width: u32, height: u32, pixels: &[u8]) -> Result<(), DeviceError> {
    if width == 0 || height == 0 {
        return Err(DeviceError::EmptyTexture);
    }
    let expected = width as usize * height as usize * 4;
    if pixels.len() != expected {
        return Err(DeviceError::TextureSize {
            width,
            height,
            expected,
            actual: pixels.len(),
        });
    }
    Ok(())
}

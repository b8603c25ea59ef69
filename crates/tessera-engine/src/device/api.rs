use std::fmt;

use crate::coords::ColorRgba;

use super::DeviceError;

/// Programmable pipeline stage.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub enum ShaderStage {
    Vertex,
    Fragment,
}

impl fmt::Display for ShaderStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ShaderStage::Vertex => f.write_str("vertex"),
            ShaderStage::Fragment => f.write_str("fragment"),
        }
    }
}

/// Handle to a compiled shader stage.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub struct ShaderId(pub(crate) u32);

/// Handle to a linked program.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub struct ProgramId(pub(crate) u32);

/// Handle to a vertex buffer plus its attribute layout.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub struct VertexArrayId(pub(crate) u32);

/// Handle to an uploaded texture.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub struct TextureId(pub(crate) u32);

/// Resolved uniform location.
///
/// Plain values live in the program's uniform block; textures are bound
/// through a sampler unit.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub enum UniformLocation {
    /// Byte range inside the uniform block.
    Block { offset: u32, size: u32 },
    /// Texture binding slot.
    Texture { binding: u32 },
}

/// Value written through [`RenderDevice::set_uniform`].
#[derive(Debug, Copy, Clone, PartialEq)]
pub enum UniformValue {
    Vec2([f32; 2]),
    Vec4([f32; 4]),
    /// Texture unit a sampler reads from.
    Sampler(u32),
}

/// One vertex attribute pointer into an interleaved `f32` buffer.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub struct VertexAttrib {
    pub location: u32,
    /// Number of `f32` components (1..=4).
    pub components: u32,
    /// Byte offset inside one vertex.
    pub offset: u32,
}

/// Number of texture units a device exposes.
pub const MAX_TEXTURE_UNITS: u32 = 8;

/// Rendering context bound to a fixed-size pixel surface.
///
/// The shape follows a classic GL context: shader objects, linked programs,
/// bind-then-draw state, and uniform writes against the current program.
/// Methods that only mutate bound state never fail; problems are logged and
/// the call becomes a no-op.
pub trait RenderDevice {
    /// Surface size in physical pixels.
    fn surface_size(&self) -> (u32, u32);

    /// Clears the color buffer.
    fn clear(&mut self, color: ColorRgba);

    /// Compiles one stage. The error is the compiler diagnostic.
    fn compile_shader(&mut self, stage: ShaderStage, source: &str) -> Result<ShaderId, String>;

    /// Releases a shader object. Unknown handles are ignored.
    fn delete_shader(&mut self, shader: ShaderId);

    /// Links a vertex and a fragment stage. The error is the link diagnostic.
    fn link_program(&mut self, vertex: ShaderId, fragment: ShaderId) -> Result<ProgramId, String>;

    /// `None` when the program has no such uniform.
    fn uniform_location(&self, program: ProgramId, name: &str) -> Option<UniformLocation>;

    /// `None` when the program has no such vertex input.
    fn attrib_location(&self, program: ProgramId, name: &str) -> Option<u32>;

    /// Uploads a static interleaved vertex buffer for use with `program`.
    fn create_vertex_array(
        &mut self,
        program: ProgramId,
        vertices: &[f32],
        stride: u32,
        attribs: &[VertexAttrib],
    ) -> Result<VertexArrayId, DeviceError>;

    /// Uploads tightly packed RGBA8 pixels.
    fn create_texture_rgba8(
        &mut self,
        width: u32,
        height: u32,
        pixels: &[u8],
    ) -> Result<TextureId, DeviceError>;

    /// `true` while `texture` names a live texture.
    fn is_texture(&self, texture: TextureId) -> bool;

    fn delete_texture(&mut self, texture: TextureId);

    fn use_program(&mut self, program: Option<ProgramId>);

    fn bind_vertex_array(&mut self, vertex_array: Option<VertexArrayId>);

    fn bind_texture(&mut self, unit: u32, texture: Option<TextureId>);

    /// Writes a uniform of the current program. Without a current program
    /// the write is dropped.
    fn set_uniform(&mut self, location: UniformLocation, value: UniformValue);

    /// Draws `count` vertices of the bound vertex array as a triangle strip.
    fn draw_triangle_strip(&mut self, first: u32, count: u32);
}

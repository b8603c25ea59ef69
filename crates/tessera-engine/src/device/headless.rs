use std::collections::HashMap;

use crate::coords::ColorRgba;
use crate::shader::reflect::{self, ProgramInterface, StageInterface};

use super::slots::Slots;
use super::{
    DeviceError, ProgramId, RenderDevice, ShaderId, ShaderStage, TextureId, UniformLocation,
    UniformValue, VertexArrayId, VertexAttrib, MAX_TEXTURE_UNITS,
};

/// One recorded draw with the state bound when it was issued.
#[derive(Debug, Clone, PartialEq)]
pub struct DrawRecord {
    pub program: ProgramId,
    pub vertex_array: VertexArrayId,
    pub first: u32,
    pub count: u32,
    /// Uniform values by name, as set on the program at draw time.
    pub uniforms: HashMap<String, UniformValue>,
    /// Texture sampled by the program's texture uniform, if any.
    pub texture: Option<TextureId>,
}

impl DrawRecord {
    pub fn uniform(&self, name: &str) -> Option<UniformValue> {
        self.uniforms.get(name).copied()
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum Command {
    Clear(ColorRgba),
    Draw(DrawRecord),
}

struct HeadlessProgram {
    interface: ProgramInterface,
    uniforms: HashMap<UniformLocation, UniformValue>,
}

struct HeadlessVertexArray {
    vertices: Vec<f32>,
    stride: u32,
}

/// GPU-less device that records what would be rendered.
///
/// Compile, link and location lookup go through the same WGSL reflection as
/// the wgpu backend, so programs behave identically. Clears and draws are
/// appended to a command log that tests can inspect.
pub struct HeadlessDevice {
    size: (u32, u32),
    shaders: Slots<StageInterface>,
    programs: Slots<HeadlessProgram>,
    vertex_arrays: Slots<HeadlessVertexArray>,
    textures: Slots<(u32, u32)>,
    current_program: Option<ProgramId>,
    current_vertex_array: Option<VertexArrayId>,
    texture_units: [Option<TextureId>; MAX_TEXTURE_UNITS as usize],
    compile_attempts: Vec<ShaderStage>,
    commands: Vec<Command>,
}

impl HeadlessDevice {
    pub fn new(width: u32, height: u32) -> Self {
        Self {
            size: (width, height),
            shaders: Slots::new(),
            programs: Slots::new(),
            vertex_arrays: Slots::new(),
            textures: Slots::new(),
            current_program: None,
            current_vertex_array: None,
            texture_units: [None; MAX_TEXTURE_UNITS as usize],
            compile_attempts: Vec::new(),
            commands: Vec::new(),
        }
    }

    pub fn commands(&self) -> &[Command] {
        &self.commands
    }

    /// Recorded draws in issue order.
    pub fn draws(&self) -> impl Iterator<Item = &DrawRecord> {
        self.commands.iter().filter_map(|c| match c {
            Command::Draw(d) => Some(d),
            Command::Clear(_) => None,
        })
    }

    pub fn clear_commands(&mut self) {
        self.commands.clear();
    }

    /// Stages passed to `compile_shader`, in call order.
    pub fn compile_attempts(&self) -> &[ShaderStage] {
        &self.compile_attempts
    }

    pub fn live_shaders(&self) -> usize {
        self.shaders.live()
    }

    pub fn live_programs(&self) -> usize {
        self.programs.live()
    }

    pub fn live_textures(&self) -> usize {
        self.textures.live()
    }

    pub fn current_program(&self) -> Option<ProgramId> {
        self.current_program
    }

    pub fn current_vertex_array(&self) -> Option<VertexArrayId> {
        self.current_vertex_array
    }

    /// Vertex data and stride uploaded for `vertex_array`.
    pub fn vertex_data(&self, vertex_array: VertexArrayId) -> Option<(&[f32], u32)> {
        self.vertex_arrays
            .get(vertex_array.0)
            .map(|va| (va.vertices.as_slice(), va.stride))
    }

    pub fn set_surface_size(&mut self, width: u32, height: u32) {
        self.size = (width, height);
    }
}

impl RenderDevice for HeadlessDevice {
    fn surface_size(&self) -> (u32, u32) {
        self.size
    }

    fn clear(&mut self, color: ColorRgba) {
        self.commands.push(Command::Clear(color));
    }

    fn compile_shader(&mut self, stage: ShaderStage, source: &str) -> Result<ShaderId, String> {
        self.compile_attempts.push(stage);
        let interface = reflect::compile(stage, source)?;
        Ok(ShaderId(self.shaders.insert(interface)))
    }

    fn delete_shader(&mut self, shader: ShaderId) {
        self.shaders.remove(shader.0);
    }

    fn link_program(&mut self, vertex: ShaderId, fragment: ShaderId) -> Result<ProgramId, String> {
        let vs = self
            .shaders
            .get(vertex.0)
            .ok_or_else(|| format!("unknown shader {}", vertex.0))?;
        let fs = self
            .shaders
            .get(fragment.0)
            .ok_or_else(|| format!("unknown shader {}", fragment.0))?;
        let interface = reflect::link(vs, fs)?;
        Ok(ProgramId(self.programs.insert(HeadlessProgram {
            interface,
            uniforms: HashMap::new(),
        })))
    }

    fn uniform_location(&self, program: ProgramId, name: &str) -> Option<UniformLocation> {
        self.programs.get(program.0)?.interface.uniform_location(name)
    }

    fn attrib_location(&self, program: ProgramId, name: &str) -> Option<u32> {
        self.programs.get(program.0)?.interface.attrib_location(name)
    }

    fn create_vertex_array(
        &mut self,
        program: ProgramId,
        vertices: &[f32],
        stride: u32,
        attribs: &[VertexAttrib],
    ) -> Result<VertexArrayId, DeviceError> {
        let p = self.programs.get(program.0).ok_or(DeviceError::UnknownHandle {
            kind: "program",
            id: program.0,
        })?;
        super::check_vertex_layout(&p.interface, stride, attribs)?;
        Ok(VertexArrayId(self.vertex_arrays.insert(HeadlessVertexArray {
            vertices: vertices.to_vec(),
            stride,
        })))
    }

    fn create_texture_rgba8(
        &mut self,
        width: u32,
        height: u32,
        pixels: &[u8],
    ) -> Result<TextureId, DeviceError> {
        super::check_texture_data(width, height, pixels)?;
        Ok(TextureId(self.textures.insert((width, height))))
    }

    fn is_texture(&self, texture: TextureId) -> bool {
        self.textures.contains(texture.0)
    }

    fn delete_texture(&mut self, texture: TextureId) {
        self.textures.remove(texture.0);
        for unit in &mut self.texture_units {
            if *unit == Some(texture) {
                *unit = None;
            }
        }
    }

    fn use_program(&mut self, program: Option<ProgramId>) {
        self.current_program = program.filter(|p| self.programs.contains(p.0));
    }

    fn bind_vertex_array(&mut self, vertex_array: Option<VertexArrayId>) {
        self.current_vertex_array = vertex_array.filter(|v| self.vertex_arrays.contains(v.0));
    }

    fn bind_texture(&mut self, unit: u32, texture: Option<TextureId>) {
        match self.texture_units.get_mut(unit as usize) {
            Some(slot) => *slot = texture,
            None => log::warn!("texture unit {unit} out of range"),
        }
    }

    fn set_uniform(&mut self, location: UniformLocation, value: UniformValue) {
        let Some(program) = self.current_program.and_then(|p| self.programs.get_mut(p.0)) else {
            log::warn!("set_uniform without a current program");
            return;
        };
        program.uniforms.insert(location, value);
    }

    fn draw_triangle_strip(&mut self, first: u32, count: u32) {
        let (Some(program_id), Some(vertex_array)) = (self.current_program, self.current_vertex_array)
        else {
            log::warn!("draw without a bound program and vertex array");
            return;
        };
        let Some(program) = self.programs.get(program_id.0) else { return };

        let uniforms = program
            .uniforms
            .iter()
            .filter_map(|(loc, value)| {
                program
                    .interface
                    .uniform_name(*loc)
                    .map(|name| (name.to_owned(), *value))
            })
            .collect();

        let texture = program.interface.texture().and_then(|t| {
            match program.uniforms.get(&UniformLocation::Texture { binding: t.binding }) {
                Some(UniformValue::Sampler(unit)) => {
                    self.texture_units.get(*unit as usize).copied().flatten()
                }
                _ => self.texture_units[0],
            }
        });

        self.commands.push(Command::Draw(DrawRecord {
            program: program_id,
            vertex_array,
            first,
            count,
            uniforms,
            texture,
        }));
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const VS: &str = include_str!("../render/shaders/quad.vert.wgsl");
    const FS: &str = include_str!("../render/shaders/quad.frag.wgsl");

    fn linked(device: &mut HeadlessDevice) -> ProgramId {
        let vs = device.compile_shader(ShaderStage::Vertex, VS).unwrap();
        let fs = device.compile_shader(ShaderStage::Fragment, FS).unwrap();
        device.link_program(vs, fs).unwrap()
    }

    #[test]
    fn draws_capture_uniforms_by_name() {
        let mut device = HeadlessDevice::new(100, 100);
        let program = linked(&mut device);
        let attribs = [VertexAttrib { location: 0, components: 2, offset: 0 }];
        let va = device
            .create_vertex_array(program, &[0.0; 8], 8, &attribs)
            .unwrap();

        device.use_program(Some(program));
        device.bind_vertex_array(Some(va));
        let color = device.uniform_location(program, "u_color").unwrap();
        device.set_uniform(color, UniformValue::Vec4([1.0, 0.0, 0.0, 1.0]));
        device.draw_triangle_strip(0, 4);

        let draw = device.draws().next().unwrap();
        assert_eq!(draw.count, 4);
        assert_eq!(draw.uniform("u_color"), Some(UniformValue::Vec4([1.0, 0.0, 0.0, 1.0])));
        assert_eq!(draw.texture, None);
    }

    #[test]
    fn draw_without_bindings_is_dropped() {
        let mut device = HeadlessDevice::new(100, 100);
        device.draw_triangle_strip(0, 4);
        assert!(device.commands().is_empty());
    }

    #[test]
    fn mismatched_vertex_layout_is_rejected() {
        let mut device = HeadlessDevice::new(100, 100);
        let program = linked(&mut device);
        let attribs = [VertexAttrib { location: 0, components: 3, offset: 0 }];
        let err = device.create_vertex_array(program, &[0.0; 12], 12, &attribs);
        assert!(matches!(err, Err(DeviceError::VertexLayout(_))));
    }

    #[test]
    fn deleted_texture_is_no_longer_valid() {
        let mut device = HeadlessDevice::new(100, 100);
        let tex = device.create_texture_rgba8(1, 1, &[255; 4]).unwrap();
        device.bind_texture(0, Some(tex));
        assert!(device.is_texture(tex));

        device.delete_texture(tex);
        assert!(!device.is_texture(tex));
        assert_eq!(device.live_textures(), 0);
    }

    #[test]
    fn short_texture_data_is_rejected() {
        let mut device = HeadlessDevice::new(100, 100);
        let err = device.create_texture_rgba8(2, 2, &[0; 4]);
        assert!(matches!(err, Err(DeviceError::TextureSize { expected: 16, .. })));
    }
}

use std::collections::HashMap;
use std::num::NonZeroU64;
use std::sync::Arc;

use anyhow::Result;
use wgpu::util::DeviceExt;
use winit::dpi::PhysicalSize;
use winit::window::Window;

use crate::coords::ColorRgba;
use crate::shader::reflect::{self, HandleKind, ProgramInterface, StageInterface};

use super::slots::Slots;
use super::{
    DeviceError, Gpu, GpuInit, PresentOutcome, ProgramId, RenderDevice, ShaderId, ShaderStage,
    SurfaceErrorAction, TextureId, UniformLocation, UniformValue, VertexArrayId, VertexAttrib,
    MAX_TEXTURE_UNITS,
};

const MIN_UNIFORM_CAPACITY: u64 = 4096;

struct WgpuShader {
    interface: StageInterface,
    module: wgpu::ShaderModule,
}

struct WgpuProgram {
    interface: ProgramInterface,
    pipeline: wgpu::RenderPipeline,
    uniform_layout: wgpu::BindGroupLayout,
    texture_layout: Option<wgpu::BindGroupLayout>,
    /// Bound at group 0 when the program has textures but no uniform block.
    empty_group: Option<wgpu::BindGroup>,
    /// Current uniform block contents; persists across draws like GL uniforms.
    uniform_bytes: Vec<u8>,
    /// Texture binding → unit, set through sampler uniforms.
    sampler_units: HashMap<u32, u32>,
}

struct WgpuTexture {
    _texture: wgpu::Texture,
    view: wgpu::TextureView,
}

enum FrameCommand {
    Clear(ColorRgba),
    Draw {
        program: ProgramId,
        vertex_array: VertexArrayId,
        first: u32,
        count: u32,
        uniform_offset: Option<u32>,
        texture: Option<TextureId>,
    },
}

/// [`RenderDevice`] on wgpu.
///
/// Bound state and uniform writes behave like a GL context. Clears and draws
/// are recorded during the frame and replayed at [`WgpuDevice::present`]:
/// every clear opens a render pass, and each draw gets its own snapshot of
/// the program's uniform block in a dynamic-offset uniform buffer.
pub struct WgpuDevice {
    gpu: Gpu,
    sampler: wgpu::Sampler,
    uniform_alignment: u32,

    shaders: Slots<WgpuShader>,
    programs: Slots<WgpuProgram>,
    vertex_arrays: Slots<wgpu::Buffer>,
    textures: Slots<WgpuTexture>,

    current_program: Option<ProgramId>,
    current_vertex_array: Option<VertexArrayId>,
    texture_units: [Option<TextureId>; MAX_TEXTURE_UNITS as usize],

    frame: Vec<FrameCommand>,
    uniform_data: Vec<u8>,
    uniform_buffer: Option<wgpu::Buffer>,
    uniform_capacity: u64,
    uniform_groups: HashMap<ProgramId, wgpu::BindGroup>,
    texture_groups: HashMap<(ProgramId, TextureId), wgpu::BindGroup>,
}

impl WgpuDevice {
    /// Creates the GPU context for `window` and the device state on top of it.
    pub async fn new(window: Arc<Window>, init: GpuInit) -> Result<Self> {
        let gpu = Gpu::new(window, init).await?;

        // Atlas texels are addressed exactly; no filtering between sprites.
        let sampler = gpu.device().create_sampler(&wgpu::SamplerDescriptor {
            label: Some("tessera nearest sampler"),
            address_mode_u: wgpu::AddressMode::ClampToEdge,
            address_mode_v: wgpu::AddressMode::ClampToEdge,
            address_mode_w: wgpu::AddressMode::ClampToEdge,
            mag_filter: wgpu::FilterMode::Nearest,
            min_filter: wgpu::FilterMode::Nearest,
            mipmap_filter: wgpu::MipmapFilterMode::Nearest,
            ..Default::default()
        });
        let uniform_alignment = gpu.device().limits().min_uniform_buffer_offset_alignment;

        Ok(Self {
            gpu,
            sampler,
            uniform_alignment,
            shaders: Slots::new(),
            programs: Slots::new(),
            vertex_arrays: Slots::new(),
            textures: Slots::new(),
            current_program: None,
            current_vertex_array: None,
            texture_units: [None; MAX_TEXTURE_UNITS as usize],
            frame: Vec::new(),
            uniform_data: Vec::new(),
            uniform_buffer: None,
            uniform_capacity: 0,
            uniform_groups: HashMap::new(),
            texture_groups: HashMap::new(),
        })
    }

    /// Reconfigures the surface. Zero sizes are deferred.
    pub fn resize(&mut self, width: u32, height: u32) {
        self.gpu.resize(PhysicalSize::new(width, height));
    }

    /// Replays the recorded frame onto the next surface texture and presents it.
    ///
    /// The recorded commands are consumed whether or not the frame could be
    /// acquired.
    pub fn present(&mut self) -> PresentOutcome {
        let mut commands = std::mem::take(&mut self.frame);
        let mut uniform_data = std::mem::take(&mut self.uniform_data);

        self.upload_uniforms(&uniform_data);
        self.prepare_bind_groups(&commands);

        let outcome = match self.gpu.render_to(|encoder, view| self.encode(encoder, view, &commands)) {
            Ok(()) => PresentOutcome::Presented,
            Err(err) => {
                log::debug!("surface acquire failed: {err}");
                match self.gpu.handle_surface_error(err) {
                    SurfaceErrorAction::Fatal => PresentOutcome::Fatal,
                    action => PresentOutcome::Skipped(action),
                }
            }
        };

        commands.clear();
        uniform_data.clear();
        self.frame = commands;
        self.uniform_data = uniform_data;
        outcome
    }

    fn upload_uniforms(&mut self, data: &[u8]) {
        if data.is_empty() {
            return;
        }
        let needed = data.len() as u64;
        if self.uniform_buffer.is_none() || needed > self.uniform_capacity {
            let capacity = needed.next_power_of_two().max(MIN_UNIFORM_CAPACITY);
            self.uniform_buffer = Some(self.gpu.device().create_buffer(&wgpu::BufferDescriptor {
                label: Some("tessera uniform ring"),
                size: capacity,
                usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
                mapped_at_creation: false,
            }));
            self.uniform_capacity = capacity;
            self.uniform_groups.clear();
        }
        if let Some(buffer) = &self.uniform_buffer {
            self.gpu.queue().write_buffer(buffer, 0, data);
        }
    }

    fn prepare_bind_groups(&mut self, commands: &[FrameCommand]) {
        for cmd in commands {
            let FrameCommand::Draw { program: program_id, texture, uniform_offset, .. } = cmd else {
                continue;
            };
            let Some(program) = self.programs.get(program_id.0) else { continue };

            if uniform_offset.is_some() && !self.uniform_groups.contains_key(program_id) {
                if let Some(buffer) = &self.uniform_buffer {
                    let group = self.gpu.device().create_bind_group(&wgpu::BindGroupDescriptor {
                        label: Some("tessera uniform bind group"),
                        layout: &program.uniform_layout,
                        entries: &[wgpu::BindGroupEntry {
                            binding: reflect::UNIFORM_BINDING,
                            resource: wgpu::BindingResource::Buffer(wgpu::BufferBinding {
                                buffer,
                                offset: 0,
                                size: NonZeroU64::new(u64::from(program.interface.uniform_block_size())),
                            }),
                        }],
                    });
                    self.uniform_groups.insert(*program_id, group);
                }
            }

            let (Some(texture_id), Some(layout)) = (texture, &program.texture_layout) else {
                continue;
            };
            if self.texture_groups.contains_key(&(*program_id, *texture_id)) {
                continue;
            }
            let Some(texture) = self.textures.get(texture_id.0) else { continue };

            let entries: Vec<wgpu::BindGroupEntry<'_>> = program
                .interface
                .handles
                .iter()
                .map(|h| wgpu::BindGroupEntry {
                    binding: h.binding,
                    resource: match h.kind {
                        HandleKind::Texture => wgpu::BindingResource::TextureView(&texture.view),
                        HandleKind::Sampler => wgpu::BindingResource::Sampler(&self.sampler),
                    },
                })
                .collect();
            let group = self.gpu.device().create_bind_group(&wgpu::BindGroupDescriptor {
                label: Some("tessera texture bind group"),
                layout,
                entries: &entries,
            });
            self.texture_groups.insert((*program_id, *texture_id), group);
        }
    }

    fn encode(
        &self,
        encoder: &mut wgpu::CommandEncoder,
        view: &wgpu::TextureView,
        commands: &[FrameCommand],
    ) {
        let mut start = 0;
        while start < commands.len() {
            let (load, first_draw) = match &commands[start] {
                FrameCommand::Clear(c) => (
                    wgpu::LoadOp::Clear(wgpu::Color {
                        r: f64::from(c.r),
                        g: f64::from(c.g),
                        b: f64::from(c.b),
                        a: f64::from(c.a),
                    }),
                    start + 1,
                ),
                FrameCommand::Draw { .. } => (wgpu::LoadOp::Load, start),
            };
            let end = commands[first_draw..]
                .iter()
                .position(|c| matches!(c, FrameCommand::Clear(_)))
                .map_or(commands.len(), |p| first_draw + p);

            self.encode_pass(encoder, view, load, &commands[first_draw..end]);
            start = end;
        }
    }

    fn encode_pass(
        &self,
        encoder: &mut wgpu::CommandEncoder,
        view: &wgpu::TextureView,
        load: wgpu::LoadOp<wgpu::Color>,
        draws: &[FrameCommand],
    ) {
        let mut rpass = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
            label: Some("tessera pass"),
            color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                view,
                resolve_target: None,
                ops: wgpu::Operations {
                    load,
                    store: wgpu::StoreOp::Store,
                },
                depth_slice: None,
            })],
            depth_stencil_attachment: None,
            timestamp_writes: None,
            occlusion_query_set: None,
            multiview_mask: None,
        });

        for cmd in draws {
            let FrameCommand::Draw {
                program: program_id,
                vertex_array,
                first,
                count,
                uniform_offset,
                texture,
            } = cmd
            else {
                continue;
            };
            let Some(program) = self.programs.get(program_id.0) else { continue };
            let Some(vbo) = self.vertex_arrays.get(vertex_array.0) else { continue };

            rpass.set_pipeline(&program.pipeline);

            match (uniform_offset, self.uniform_groups.get(program_id)) {
                (Some(offset), Some(group)) => rpass.set_bind_group(0, group, &[*offset]),
                (Some(_), None) => continue,
                (None, _) => {
                    if let Some(group) = &program.empty_group {
                        rpass.set_bind_group(0, group, &[]);
                    }
                }
            }

            if program.texture_layout.is_some() {
                let Some(group) = texture.and_then(|t| self.texture_groups.get(&(*program_id, t)))
                else {
                    continue;
                };
                rpass.set_bind_group(1, group, &[]);
            }

            rpass.set_vertex_buffer(0, vbo.slice(..));
            rpass.draw(*first..*first + *count, 0..1);
        }
    }

    fn create_pipeline(
        &self,
        vs: &WgpuShader,
        fs: &WgpuShader,
        interface: &ProgramInterface,
    ) -> (wgpu::RenderPipeline, wgpu::BindGroupLayout, Option<wgpu::BindGroupLayout>) {
        let device = self.gpu.device();

        let mut uniform_entries = Vec::new();
        if interface.uniform_block.is_some() {
            let mut visibility = wgpu::ShaderStages::NONE;
            if interface.uniform_stages.vertex {
                visibility |= wgpu::ShaderStages::VERTEX;
            }
            if interface.uniform_stages.fragment {
                visibility |= wgpu::ShaderStages::FRAGMENT;
            }
            uniform_entries.push(wgpu::BindGroupLayoutEntry {
                binding: reflect::UNIFORM_BINDING,
                visibility,
                ty: wgpu::BindingType::Buffer {
                    ty: wgpu::BufferBindingType::Uniform,
                    has_dynamic_offset: true,
                    min_binding_size: NonZeroU64::new(u64::from(interface.uniform_block_size())),
                },
                count: None,
            });
        }
        let uniform_layout = device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
            label: Some("tessera uniform bgl"),
            entries: &uniform_entries,
        });

        let texture_layout = (!interface.handles.is_empty()).then(|| {
            let entries: Vec<wgpu::BindGroupLayoutEntry> = interface
                .handles
                .iter()
                .map(|h| wgpu::BindGroupLayoutEntry {
                    binding: h.binding,
                    visibility: wgpu::ShaderStages::VERTEX_FRAGMENT,
                    ty: match h.kind {
                        HandleKind::Texture => wgpu::BindingType::Texture {
                            sample_type: wgpu::TextureSampleType::Float { filterable: true },
                            view_dimension: wgpu::TextureViewDimension::D2,
                            multisampled: false,
                        },
                        HandleKind::Sampler => {
                            wgpu::BindingType::Sampler(wgpu::SamplerBindingType::Filtering)
                        }
                    },
                    count: None,
                })
                .collect();
            device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
                label: Some("tessera texture bgl"),
                entries: &entries,
            })
        });

        let mut layouts = Vec::with_capacity(2);
        if interface.uniform_block.is_some() || texture_layout.is_some() {
            layouts.push(&uniform_layout);
        }
        if let Some(tl) = &texture_layout {
            layouts.push(tl);
        }
        let pipeline_layout = device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
            label: Some("tessera pipeline layout"),
            bind_group_layouts: &layouts,
            immediate_size: 0,
        });

        let layout = interface.vertex_layout();
        let attributes: Vec<wgpu::VertexAttribute> = layout
            .attributes
            .iter()
            .map(|&(location, components, offset)| wgpu::VertexAttribute {
                format: match components {
                    1 => wgpu::VertexFormat::Float32,
                    2 => wgpu::VertexFormat::Float32x2,
                    3 => wgpu::VertexFormat::Float32x3,
                    _ => wgpu::VertexFormat::Float32x4,
                },
                offset: u64::from(offset),
                shader_location: location,
            })
            .collect();
        let mut buffers = Vec::with_capacity(1);
        if !attributes.is_empty() {
            buffers.push(wgpu::VertexBufferLayout {
                array_stride: u64::from(layout.stride),
                step_mode: wgpu::VertexStepMode::Vertex,
                attributes: &attributes,
            });
        }

        let pipeline = device.create_render_pipeline(&wgpu::RenderPipelineDescriptor {
            label: Some("tessera pipeline"),
            layout: Some(&pipeline_layout),
            vertex: wgpu::VertexState {
                module: &vs.module,
                entry_point: Some(interface.vertex_entry.as_str()),
                compilation_options: Default::default(),
                buffers: &buffers,
            },
            fragment: Some(wgpu::FragmentState {
                module: &fs.module,
                entry_point: Some(interface.fragment_entry.as_str()),
                compilation_options: Default::default(),
                targets: &[Some(wgpu::ColorTargetState {
                    format: self.gpu.surface_format(),
                    blend: Some(wgpu::BlendState::REPLACE),
                    write_mask: wgpu::ColorWrites::ALL,
                })],
            }),
            primitive: wgpu::PrimitiveState {
                topology: wgpu::PrimitiveTopology::TriangleStrip,
                strip_index_format: None,
                front_face: wgpu::FrontFace::Ccw,
                cull_mode: None,
                polygon_mode: wgpu::PolygonMode::Fill,
                unclipped_depth: false,
                conservative: false,
            },
            depth_stencil: None,
            multisample: wgpu::MultisampleState::default(),
            multiview_mask: None,
            cache: None,
        });

        (pipeline, uniform_layout, texture_layout)
    }
}

impl RenderDevice for WgpuDevice {
    fn surface_size(&self) -> (u32, u32) {
        let size = self.gpu.size();
        (size.width, size.height)
    }

    fn clear(&mut self, color: ColorRgba) {
        self.frame.push(FrameCommand::Clear(color));
    }

    fn compile_shader(&mut self, stage: ShaderStage, source: &str) -> Result<ShaderId, String> {
        // naga validates first so failures come back as diagnostics rather
        // than device errors.
        let interface = reflect::compile(stage, source)?;
        let module = self
            .gpu
            .device()
            .create_shader_module(wgpu::ShaderModuleDescriptor {
                label: Some(match stage {
                    ShaderStage::Vertex => "tessera vertex shader",
                    ShaderStage::Fragment => "tessera fragment shader",
                }),
                source: wgpu::ShaderSource::Wgsl(source.into()),
            });
        Ok(ShaderId(self.shaders.insert(WgpuShader { interface, module })))
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
        let interface = reflect::link(&vs.interface, &fs.interface)?;

        let (pipeline, uniform_layout, texture_layout) = self.create_pipeline(vs, fs, &interface);
        let empty_group = (interface.uniform_block.is_none() && texture_layout.is_some()).then(|| {
            self.gpu.device().create_bind_group(&wgpu::BindGroupDescriptor {
                label: Some("tessera empty bind group"),
                layout: &uniform_layout,
                entries: &[],
            })
        });

        let uniform_bytes = vec![0; interface.uniform_block_size() as usize];
        Ok(ProgramId(self.programs.insert(WgpuProgram {
            interface,
            pipeline,
            uniform_layout,
            texture_layout,
            empty_group,
            uniform_bytes,
            sampler_units: HashMap::new(),
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

        let buffer = self
            .gpu
            .device()
            .create_buffer_init(&wgpu::util::BufferInitDescriptor {
                label: Some("tessera vertex buffer"),
                contents: bytemuck::cast_slice(vertices),
                usage: wgpu::BufferUsages::VERTEX,
            });
        Ok(VertexArrayId(self.vertex_arrays.insert(buffer)))
    }

    fn create_texture_rgba8(
        &mut self,
        width: u32,
        height: u32,
        pixels: &[u8],
    ) -> Result<TextureId, DeviceError> {
        super::check_texture_data(width, height, pixels)?;

        let size = wgpu::Extent3d {
            width,
            height,
            depth_or_array_layers: 1,
        };
        let texture = self.gpu.device().create_texture(&wgpu::TextureDescriptor {
            label: Some("tessera texture"),
            size,
            mip_level_count: 1,
            sample_count: 1,
            dimension: wgpu::TextureDimension::D2,
            format: wgpu::TextureFormat::Rgba8Unorm,
            usage: wgpu::TextureUsages::TEXTURE_BINDING | wgpu::TextureUsages::COPY_DST,
            view_formats: &[],
        });
        self.gpu.queue().write_texture(
            wgpu::TexelCopyTextureInfo {
                texture: &texture,
                mip_level: 0,
                origin: wgpu::Origin3d::ZERO,
                aspect: wgpu::TextureAspect::All,
            },
            pixels,
            wgpu::TexelCopyBufferLayout {
                offset: 0,
                bytes_per_row: Some(width * 4),
                rows_per_image: Some(height),
            },
            size,
        );
        let view = texture.create_view(&wgpu::TextureViewDescriptor::default());

        Ok(TextureId(self.textures.insert(WgpuTexture {
            _texture: texture,
            view,
        })))
    }

    fn is_texture(&self, texture: TextureId) -> bool {
        self.textures.contains(texture.0)
    }

    fn delete_texture(&mut self, texture: TextureId) {
        self.textures.remove(texture.0);
        self.texture_groups.retain(|(_, t), _| *t != texture);
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

        match (location, value) {
            (UniformLocation::Block { offset, size }, UniformValue::Vec2(v)) => {
                write_block(&mut program.uniform_bytes, offset, size, bytemuck::cast_slice(&v));
            }
            (UniformLocation::Block { offset, size }, UniformValue::Vec4(v)) => {
                write_block(&mut program.uniform_bytes, offset, size, bytemuck::cast_slice(&v));
            }
            (UniformLocation::Texture { binding }, UniformValue::Sampler(unit)) => {
                program.sampler_units.insert(binding, unit);
            }
            (location, value) => {
                log::warn!("uniform type mismatch: {value:?} written to {location:?}");
            }
        }
    }

    fn draw_triangle_strip(&mut self, first: u32, count: u32) {
        let (Some(program_id), Some(vertex_array)) = (self.current_program, self.current_vertex_array)
        else {
            log::warn!("draw without a bound program and vertex array");
            return;
        };
        let Some(program) = self.programs.get(program_id.0) else { return };

        let texture = match program.interface.texture() {
            Some(t) => {
                let unit = program.sampler_units.get(&t.binding).copied().unwrap_or(0);
                let bound = self.texture_units.get(unit as usize).copied().flatten();
                if bound.is_none() {
                    log::warn!("draw skipped: no texture bound to unit {unit}");
                    return;
                }
                bound
            }
            None => None,
        };

        let uniform_offset = if program.uniform_bytes.is_empty() {
            None
        } else {
            let align = self.uniform_alignment.max(4) as usize;
            let offset = self.uniform_data.len().next_multiple_of(align);
            self.uniform_data.resize(offset, 0);
            self.uniform_data.extend_from_slice(&program.uniform_bytes);
            Some(offset as u32)
        };

        self.frame.push(FrameCommand::Draw {
            program: program_id,
            vertex_array,
            first,
            count,
            uniform_offset,
            texture,
        });
    }
}

fn write_block(bytes: &mut [u8], offset: u32, size: u32, value: &[u8]) {
    let start = offset as usize;
    let len = value.len().min(size as usize);
    match bytes.get_mut(start..start + len) {
        Some(dst) => dst.copy_from_slice(&value[..len]),
        None => log::warn!("uniform write at {offset}+{len} outside the block"),
    }
}

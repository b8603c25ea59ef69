//! WGSL front end shared by every device backend.
//!
//! Parses and validates one stage with naga, then extracts the interface the
//! rest of the engine addresses by name: vertex inputs, inter-stage varyings,
//! the uniform block and texture bindings.
//!
//! Binding conventions:
//! - the uniform block is `@group(0) @binding(0) var<uniform>`, one struct;
//! - textures and samplers live in `@group(1)`.

use naga::valid::{Capabilities, ValidationFlags, Validator};
use naga::{AddressSpace, Binding, Module, TypeInner};

use crate::device::{ShaderStage, UniformLocation};

/// Bind group holding the uniform block.
pub const UNIFORM_GROUP: u32 = 0;
/// Binding of the uniform block inside [`UNIFORM_GROUP`].
pub const UNIFORM_BINDING: u32 = 0;
/// Bind group holding textures and samplers.
pub const TEXTURE_GROUP: u32 = 1;

/// Location-bound stage input or output.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InterfaceVar {
    pub name: String,
    pub location: u32,
    pub components: u32,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UniformMember {
    pub name: String,
    pub offset: u32,
    pub size: u32,
}

/// The single uniform struct of a stage.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UniformBlock {
    /// Struct span in bytes.
    pub size: u32,
    pub members: Vec<UniformMember>,
}

impl UniformBlock {
    pub fn member(&self, name: &str) -> Option<&UniformMember> {
        self.members.iter().find(|m| m.name == name)
    }
}

#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum HandleKind {
    Texture,
    Sampler,
}

/// Texture or sampler global inside [`TEXTURE_GROUP`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TextureBinding {
    pub name: String,
    pub binding: u32,
    pub kind: HandleKind,
}

/// Reflected interface of one compiled stage.
#[derive(Debug, Clone)]
pub struct StageInterface {
    pub stage: ShaderStage,
    pub entry_point: String,
    pub inputs: Vec<InterfaceVar>,
    pub outputs: Vec<InterfaceVar>,
    pub uniform_block: Option<UniformBlock>,
    pub handles: Vec<TextureBinding>,
}

/// Merged interface of a linked vertex/fragment pair.
#[derive(Debug, Clone)]
pub struct ProgramInterface {
    pub vertex_entry: String,
    pub fragment_entry: String,
    pub attributes: Vec<InterfaceVar>,
    pub uniform_block: Option<UniformBlock>,
    pub handles: Vec<TextureBinding>,
    /// Stages that read the uniform block.
    pub uniform_stages: StageMask,
}

/// Which stages use a resource.
#[derive(Debug, Copy, Clone, Default, PartialEq, Eq)]
pub struct StageMask {
    pub vertex: bool,
    pub fragment: bool,
}

/// Packed vertex layout derived from the vertex inputs.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VertexLayout {
    pub stride: u32,
    /// `(location, components, offset)` sorted by location.
    pub attributes: Vec<(u32, u32, u32)>,
}

impl ProgramInterface {
    /// Resolves a uniform name to a block range or a texture slot.
    pub fn uniform_location(&self, name: &str) -> Option<UniformLocation> {
        if let Some(m) = self.uniform_block.as_ref().and_then(|b| b.member(name)) {
            return Some(UniformLocation::Block {
                offset: m.offset,
                size: m.size,
            });
        }
        self.handles
            .iter()
            .find(|h| h.kind == HandleKind::Texture && h.name == name)
            .map(|h| UniformLocation::Texture { binding: h.binding })
    }

    /// Reverse lookup of [`Self::uniform_location`].
    pub fn uniform_name(&self, location: UniformLocation) -> Option<&str> {
        match location {
            UniformLocation::Block { offset, size } => self
                .uniform_block
                .as_ref()?
                .members
                .iter()
                .find(|m| m.offset == offset && m.size == size)
                .map(|m| m.name.as_str()),
            UniformLocation::Texture { binding } => self
                .handles
                .iter()
                .find(|h| h.kind == HandleKind::Texture && h.binding == binding)
                .map(|h| h.name.as_str()),
        }
    }

    pub fn attrib_location(&self, name: &str) -> Option<u32> {
        self.attributes
            .iter()
            .find(|a| a.name == name)
            .map(|a| a.location)
    }

    pub fn uniform_block_size(&self) -> u32 {
        self.uniform_block.as_ref().map_or(0, |b| b.size)
    }

    pub fn texture(&self) -> Option<&TextureBinding> {
        self.handles.iter().find(|h| h.kind == HandleKind::Texture)
    }

    pub fn sampler(&self) -> Option<&TextureBinding> {
        self.handles.iter().find(|h| h.kind == HandleKind::Sampler)
    }

    /// Vertex inputs packed by ascending location, all `f32` components.
    pub fn vertex_layout(&self) -> VertexLayout {
        let mut attrs: Vec<&InterfaceVar> = self.attributes.iter().collect();
        attrs.sort_by_key(|a| a.location);

        let mut offset = 0;
        let mut attributes = Vec::with_capacity(attrs.len());
        for a in attrs {
            attributes.push((a.location, a.components, offset));
            offset += a.components * 4;
        }
        VertexLayout {
            stride: offset,
            attributes,
        }
    }
}

/// Parses, validates and reflects one stage.
///
/// The error string is the rendered compiler diagnostic.
pub fn compile(stage: ShaderStage, source: &str) -> Result<StageInterface, String> {
    let module = naga::front::wgsl::parse_str(source).map_err(|e| e.emit_to_string(source))?;

    Validator::new(ValidationFlags::all(), Capabilities::empty())
        .validate(&module)
        .map_err(|e| e.emit_to_string(source))?;

    let wanted = match stage {
        ShaderStage::Vertex => naga::ShaderStage::Vertex,
        ShaderStage::Fragment => naga::ShaderStage::Fragment,
    };
    let mut entries = module.entry_points.iter().filter(|ep| ep.stage == wanted);
    let entry = entries
        .next()
        .ok_or_else(|| format!("no @{stage} entry point"))?;
    if entries.next().is_some() {
        return Err(format!("more than one @{stage} entry point"));
    }

    let mut inputs = Vec::new();
    for arg in &entry.function.arguments {
        collect_vars(&module, arg.name.as_deref(), arg.ty, arg.binding.as_ref(), &mut inputs)?;
    }

    let mut outputs = Vec::new();
    if let Some(result) = &entry.function.result {
        collect_vars(&module, None, result.ty, result.binding.as_ref(), &mut outputs)?;
    }

    let (uniform_block, handles) = reflect_globals(&module)?;

    Ok(StageInterface {
        stage,
        entry_point: entry.name.clone(),
        inputs,
        outputs,
        uniform_block,
        handles,
    })
}

/// Checks that two stages fit together and merges their interfaces.
pub fn link(vs: &StageInterface, fs: &StageInterface) -> Result<ProgramInterface, String> {
    if vs.stage != ShaderStage::Vertex || fs.stage != ShaderStage::Fragment {
        return Err(format!(
            "expected vertex and fragment stages, got {} and {}",
            vs.stage, fs.stage
        ));
    }

    for input in &fs.inputs {
        let Some(out) = vs.outputs.iter().find(|o| o.location == input.location) else {
            return Err(format!(
                "fragment input `{}` at location {} is not written by the vertex stage",
                input.name, input.location
            ));
        };
        if out.components != input.components {
            return Err(format!(
                "location {}: vertex writes {} components, fragment reads {}",
                input.location, out.components, input.components
            ));
        }
    }

    let uniform_block = match (&vs.uniform_block, &fs.uniform_block) {
        (Some(a), Some(b)) => Some(merge_blocks(a, b)?),
        (Some(a), None) => Some(a.clone()),
        (None, Some(b)) => Some(b.clone()),
        (None, None) => None,
    };

    let mut handles = vs.handles.clone();
    for h in &fs.handles {
        match handles.iter().find(|e| e.binding == h.binding) {
            Some(e) if e == h => {}
            Some(e) => {
                return Err(format!(
                    "@group({TEXTURE_GROUP}) @binding({}) declared as `{}` and `{}`",
                    h.binding, e.name, h.name
                ));
            }
            None => handles.push(h.clone()),
        }
    }

    Ok(ProgramInterface {
        vertex_entry: vs.entry_point.clone(),
        fragment_entry: fs.entry_point.clone(),
        attributes: vs.inputs.clone(),
        uniform_block,
        handles,
        uniform_stages: StageMask {
            vertex: vs.uniform_block.is_some(),
            fragment: fs.uniform_block.is_some(),
        },
    })
}

fn merge_blocks(a: &UniformBlock, b: &UniformBlock) -> Result<UniformBlock, String> {
    let mut merged = a.clone();
    for m in &b.members {
        match a.member(&m.name) {
            Some(existing) if existing.offset == m.offset && existing.size == m.size => {}
            Some(existing) => {
                return Err(format!(
                    "uniform `{}` differs between stages (offset {} size {} vs offset {} size {})",
                    m.name, existing.offset, existing.size, m.offset, m.size
                ));
            }
            None => merged.members.push(m.clone()),
        }
    }
    merged.size = a.size.max(b.size);
    Ok(merged)
}

/// Flattens an argument or result into location-bound variables.
/// Builtins are skipped.
fn collect_vars(
    module: &Module,
    name: Option<&str>,
    ty: naga::Handle<naga::Type>,
    binding: Option<&Binding>,
    out: &mut Vec<InterfaceVar>,
) -> Result<(), String> {
    match binding {
        Some(Binding::BuiltIn(_)) => Ok(()),
        Some(Binding::Location { location, .. }) => {
            out.push(InterfaceVar {
                name: name.unwrap_or_default().to_owned(),
                location: *location,
                components: components_of(&module.types[ty].inner)
                    .ok_or_else(|| format!("location {location}: unsupported interface type"))?,
            });
            Ok(())
        }
        None => match &module.types[ty].inner {
            TypeInner::Struct { members, .. } => {
                for m in members {
                    collect_vars(module, m.name.as_deref(), m.ty, m.binding.as_ref(), out)?;
                }
                Ok(())
            }
            _ => Err("entry point value without a binding".to_owned()),
        },
    }
}

fn reflect_globals(module: &Module) -> Result<(Option<UniformBlock>, Vec<TextureBinding>), String> {
    let mut block = None;
    let mut handles = Vec::new();

    for (_, var) in module.global_variables.iter() {
        let name = var.name.clone().unwrap_or_default();
        match var.space {
            AddressSpace::Uniform => {
                let slot = var.binding.as_ref().map(|b| (b.group, b.binding));
                if slot != Some((UNIFORM_GROUP, UNIFORM_BINDING)) {
                    return Err(format!(
                        "uniform `{name}` must be bound at @group({UNIFORM_GROUP}) @binding({UNIFORM_BINDING})"
                    ));
                }
                let TypeInner::Struct { members, span } = &module.types[var.ty].inner else {
                    return Err(format!("uniform `{name}` must be a struct"));
                };
                let mut reflected = Vec::with_capacity(members.len());
                for m in members {
                    let member_name = m.name.clone().unwrap_or_default();
                    let size = byte_size(&module.types[m.ty].inner).ok_or_else(|| {
                        format!("uniform member `{member_name}` has an unsupported type")
                    })?;
                    reflected.push(UniformMember {
                        name: member_name,
                        offset: m.offset,
                        size,
                    });
                }
                block = Some(UniformBlock {
                    size: *span,
                    members: reflected,
                });
            }
            AddressSpace::Handle => {
                let kind = match module.types[var.ty].inner {
                    TypeInner::Image { .. } => HandleKind::Texture,
                    TypeInner::Sampler { .. } => HandleKind::Sampler,
                    _ => return Err(format!("unsupported handle type for `{name}`")),
                };
                let Some(rb) = var.binding.as_ref().filter(|b| b.group == TEXTURE_GROUP) else {
                    return Err(format!("`{name}` must be bound in @group({TEXTURE_GROUP})"));
                };
                handles.push(TextureBinding {
                    name,
                    binding: rb.binding,
                    kind,
                });
            }
            AddressSpace::Private | AddressSpace::Function | AddressSpace::WorkGroup => {}
            _ => return Err(format!("unsupported address space for `{name}`")),
        }
    }

    Ok((block, handles))
}

fn components_of(inner: &TypeInner) -> Option<u32> {
    match inner {
        TypeInner::Scalar(_) => Some(1),
        TypeInner::Vector { size, .. } => Some(*size as u32),
        _ => None,
    }
}

fn byte_size(inner: &TypeInner) -> Option<u32> {
    match inner {
        TypeInner::Scalar(s) => Some(u32::from(s.width)),
        TypeInner::Vector { size, scalar } => Some(*size as u32 * u32::from(scalar.width)),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const QUAD_VS: &str = include_str!("../render/shaders/quad.vert.wgsl");
    const QUAD_FS: &str = include_str!("../render/shaders/quad.frag.wgsl");
    const SPRITE_VS: &str = include_str!("../render/shaders/sprite.vert.wgsl");
    const SPRITE_FS: &str = include_str!("../render/shaders/sprite.frag.wgsl");

    fn program(vs: &str, fs: &str) -> ProgramInterface {
        let vs = compile(ShaderStage::Vertex, vs).expect("vertex compiles");
        let fs = compile(ShaderStage::Fragment, fs).expect("fragment compiles");
        link(&vs, &fs).expect("links")
    }

    #[test]
    fn quad_program_exposes_named_uniforms() {
        let p = program(QUAD_VS, QUAD_FS);

        assert_eq!(
            p.uniform_location("u_pos"),
            Some(UniformLocation::Block { offset: 0, size: 8 })
        );
        assert_eq!(
            p.uniform_location("u_size"),
            Some(UniformLocation::Block { offset: 8, size: 8 })
        );
        assert_eq!(
            p.uniform_location("u_color"),
            Some(UniformLocation::Block { offset: 16, size: 16 })
        );
        assert_eq!(p.uniform_block_size(), 32);
        assert_eq!(p.attrib_location("a_pos"), Some(0));
        assert_eq!(p.uniform_location("u_missing"), None);
        assert_eq!(p.attrib_location("a_missing"), None);
    }

    #[test]
    fn sprite_program_layout_is_interleaved_pos_uv() {
        let p = program(SPRITE_VS, SPRITE_FS);

        let layout = p.vertex_layout();
        assert_eq!(layout.stride, 16);
        assert_eq!(layout.attributes, vec![(0, 2, 0), (1, 2, 8)]);

        assert_eq!(
            p.uniform_location("u_tex"),
            Some(UniformLocation::Texture { binding: 0 })
        );
        assert_eq!(p.uniform_name(UniformLocation::Texture { binding: 0 }), Some("u_tex"));
        assert!(p.sampler().is_some());
        assert!(p.uniform_stages.vertex);
        assert!(!p.uniform_stages.fragment);
    }

    #[test]
    fn syntax_error_carries_diagnostic() {
        let err = compile(ShaderStage::Vertex, "@vertex fn vs_main( -> {").unwrap_err();
        assert!(!err.is_empty());
    }

    #[test]
    fn wrong_stage_is_a_compile_error() {
        let err = compile(ShaderStage::Fragment, QUAD_VS).unwrap_err();
        assert!(err.contains("fragment"), "{err}");
    }

    #[test]
    fn unmatched_varying_fails_link() {
        let vs = compile(ShaderStage::Vertex, QUAD_VS).unwrap();
        let fs = compile(ShaderStage::Fragment, SPRITE_FS).unwrap();
        let err = link(&vs, &fs).unwrap_err();
        assert!(err.contains("location 0"), "{err}");
    }

    #[test]
    fn conflicting_uniform_layout_fails_link() {
        let vs = compile(ShaderStage::Vertex, QUAD_VS).unwrap();
        let fs = compile(
            ShaderStage::Fragment,
            r#"
struct U { u_color: vec4<f32> }
@group(0) @binding(0) var<uniform> u: U;
@fragment
fn fs_main() -> @location(0) vec4<f32> { return u.u_color; }
"#,
        )
        .unwrap();
        let err = link(&vs, &fs).unwrap_err();
        assert!(err.contains("u_color"), "{err}");
    }
}

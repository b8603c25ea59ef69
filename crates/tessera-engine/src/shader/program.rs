use std::collections::HashMap;
use std::fmt;

use crate::device::{ProgramId, RenderDevice, ShaderStage, UniformLocation};

use super::ShaderError;

/// Source and the names a renderer will address.
#[derive(Debug, Clone, Copy)]
pub struct ProgramSource<'a> {
    pub label: &'a str,
    pub vertex: &'a str,
    pub fragment: &'a str,
    pub uniforms: &'a [&'a str],
    pub attributes: &'a [&'a str],
}

/// Lifecycle of a program object.
///
/// A [`ShaderProgram`] value only exists once linked, so `Uncompiled`,
/// `Compiled` and `Failed` are observed through logs and build results.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ProgramState {
    Uncompiled,
    Compiled,
    Linked,
    Active,
    Failed(String),
}

impl fmt::Display for ProgramState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ProgramState::Uncompiled => f.write_str("uncompiled"),
            ProgramState::Compiled => f.write_str("compiled"),
            ProgramState::Linked => f.write_str("linked"),
            ProgramState::Active => f.write_str("active"),
            ProgramState::Failed(reason) => write!(f, "failed ({reason})"),
        }
    }
}

/// Linked program with locations resolved once at link time.
///
/// Locations are immutable after linking. Names the shader doesn't declare
/// resolve to `None`; writes through them are no-ops.
#[derive(Debug)]
pub struct ShaderProgram {
    label: String,
    program: ProgramId,
    state: ProgramState,
    uniforms: HashMap<String, Option<UniformLocation>>,
    attributes: HashMap<String, Option<u32>>,
}

impl ShaderProgram {
    /// Compiles both stages, links them, and caches the declared locations.
    ///
    /// A vertex failure skips the fragment stage. Intermediate shader
    /// objects are released on every path.
    pub fn compile_and_link<D: RenderDevice + ?Sized>(
        device: &mut D,
        source: &ProgramSource<'_>,
    ) -> Result<Self, ShaderError> {
        let label = source.label;
        log::trace!("program '{label}': {}", ProgramState::Uncompiled);

        let vs = device
            .compile_shader(ShaderStage::Vertex, source.vertex)
            .map_err(|log| fail(label, ShaderError::Compile { stage: ShaderStage::Vertex, log }))?;

        let fs = match device.compile_shader(ShaderStage::Fragment, source.fragment) {
            Ok(fs) => fs,
            Err(log) => {
                device.delete_shader(vs);
                return Err(fail(
                    label,
                    ShaderError::Compile { stage: ShaderStage::Fragment, log },
                ));
            }
        };
        log::trace!("program '{label}': {}", ProgramState::Compiled);

        let linked = device.link_program(vs, fs);
        device.delete_shader(vs);
        device.delete_shader(fs);
        let program = linked.map_err(|log| fail(label, ShaderError::Link { log }))?;

        let uniforms = source
            .uniforms
            .iter()
            .map(|&name| {
                let loc = device.uniform_location(program, name);
                if loc.is_none() {
                    log::debug!("program '{label}': uniform '{name}' has no location");
                }
                (name.to_owned(), loc)
            })
            .collect();

        let attributes = source
            .attributes
            .iter()
            .map(|&name| {
                let loc = device.attrib_location(program, name);
                if loc.is_none() {
                    log::debug!("program '{label}': attribute '{name}' has no location");
                }
                (name.to_owned(), loc)
            })
            .collect();

        log::trace!("program '{label}': {}", ProgramState::Linked);

        Ok(Self {
            label: label.to_owned(),
            program,
            state: ProgramState::Linked,
            uniforms,
            attributes,
        })
    }

    /// Cached uniform location. Undeclared names also yield `None`.
    pub fn uniform(&self, name: &str) -> Option<UniformLocation> {
        self.uniforms.get(name).copied().flatten()
    }

    /// Cached attribute location. Undeclared names also yield `None`.
    pub fn attribute(&self, name: &str) -> Option<u32> {
        self.attributes.get(name).copied().flatten()
    }

    /// Makes this the current program.
    pub fn bind<D: RenderDevice + ?Sized>(&mut self, device: &mut D) {
        device.use_program(Some(self.program));
        self.transition(ProgramState::Active);
    }

    /// Clears the current program.
    pub fn unbind<D: RenderDevice + ?Sized>(&mut self, device: &mut D) {
        device.use_program(None);
        self.transition(ProgramState::Linked);
    }

    pub fn state(&self) -> &ProgramState {
        &self.state
    }

    pub fn id(&self) -> ProgramId {
        self.program
    }

    pub fn label(&self) -> &str {
        &self.label
    }

    fn transition(&mut self, next: ProgramState) {
        if self.state != next {
            log::trace!("program '{}': {} -> {}", self.label, self.state, next);
            self.state = next;
        }
    }
}

fn fail(label: &str, err: ShaderError) -> ShaderError {
    log::error!("program '{label}': {}", ProgramState::Failed(err.to_string()));
    err
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::device::{HeadlessDevice, ShaderStage};

    const VS: &str = include_str!("../render/shaders/quad.vert.wgsl");
    const FS: &str = include_str!("../render/shaders/quad.frag.wgsl");

    fn source<'a>(vertex: &'a str, fragment: &'a str) -> ProgramSource<'a> {
        ProgramSource {
            label: "test",
            vertex,
            fragment,
            uniforms: &["u_pos", "u_size", "u_color", "u_unused"],
            attributes: &["a_pos", "a_unused"],
        }
    }

    #[test]
    fn successful_build_releases_stages_and_caches_locations() {
        let mut device = HeadlessDevice::new(800, 600);
        let program = ShaderProgram::compile_and_link(&mut device, &source(VS, FS)).unwrap();

        assert_eq!(device.live_shaders(), 0);
        assert_eq!(*program.state(), ProgramState::Linked);
        assert!(program.uniform("u_color").is_some());
        assert_eq!(program.attribute("a_pos"), Some(0));
        assert_eq!(program.uniform("u_unused"), None);
        assert_eq!(program.attribute("a_unused"), None);
        assert_eq!(program.uniform("never_declared"), None);
    }

    #[test]
    fn vertex_failure_skips_fragment_compile() {
        let mut device = HeadlessDevice::new(800, 600);
        let err = ShaderProgram::compile_and_link(&mut device, &source("not wgsl", FS)).unwrap_err();

        assert!(matches!(err, ShaderError::Compile { stage: ShaderStage::Vertex, .. }));
        assert_eq!(device.compile_attempts(), &[ShaderStage::Vertex]);
        assert_eq!(device.live_shaders(), 0);
    }

    #[test]
    fn fragment_failure_releases_vertex_stage() {
        let mut device = HeadlessDevice::new(800, 600);
        let err = ShaderProgram::compile_and_link(&mut device, &source(VS, "@fragment fn")).unwrap_err();

        match err {
            ShaderError::Compile { stage, log } => {
                assert_eq!(stage, ShaderStage::Fragment);
                assert!(!log.is_empty());
            }
            other => panic!("unexpected error: {other}"),
        }
        assert_eq!(device.live_shaders(), 0);
    }

    #[test]
    fn link_failure_releases_both_stages() {
        let mut device = HeadlessDevice::new(800, 600);
        let fs = include_str!("../render/shaders/sprite.frag.wgsl");
        let err = ShaderProgram::compile_and_link(&mut device, &source(VS, fs)).unwrap_err();

        assert!(matches!(err, ShaderError::Link { .. }));
        assert_eq!(device.live_shaders(), 0);
        assert_eq!(device.live_programs(), 0);
    }

    #[test]
    fn bind_and_unbind_move_between_linked_and_active() {
        let mut device = HeadlessDevice::new(800, 600);
        let mut program = ShaderProgram::compile_and_link(&mut device, &source(VS, FS)).unwrap();

        program.bind(&mut device);
        assert_eq!(*program.state(), ProgramState::Active);
        assert_eq!(device.current_program(), Some(program.id()));

        program.unbind(&mut device);
        assert_eq!(*program.state(), ProgramState::Linked);
        assert_eq!(device.current_program(), None);
    }
}

//! Shader program lifecycle.
//!
//! `reflect` turns WGSL into the named interface the device backends share;
//! `ShaderProgram` drives compile → link → locate against any `RenderDevice`.

mod error;
mod program;
pub mod reflect;

pub use error::ShaderError;
pub use program::{ProgramSource, ProgramState, ShaderProgram};

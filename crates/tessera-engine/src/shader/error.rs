use thiserror::Error;

use crate::device::ShaderStage;

/// Program build failure. Carries the compiler or linker diagnostic.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ShaderError {
    #[error("{stage} shader failed to compile: {log}")]
    Compile { stage: ShaderStage, log: String },

    #[error("program failed to link: {log}")]
    Link { log: String },
}

use thiserror::Error;
use vrend_tgsi::{File, Opcode, Semantic, TextureTarget};

pub use crate::strbuf::BufferError;

/// Why a TGSI program could not be translated.
#[derive(Debug, Error)]
pub enum TranslateError {
    #[error("number of {kind} exceeded at index {index}, max is {max}")]
    CapacityExceeded {
        kind: &'static str,
        index: u32,
        max: u32,
    },
    #[error("unsupported register file {file} in declaration")]
    UnsupportedFile { file: File },
    #[error("unsupported system value {semantic}")]
    UnknownSystemValue { semantic: Semantic },
    #[error("unsupported opcode {opcode} at instruction {inst_index}")]
    UnsupportedOpcode { opcode: Opcode, inst_index: u32 },
    #[error("unsupported texture target {target} in {context}")]
    UnsupportedTextureTarget {
        target: TextureTarget,
        context: &'static str,
    },
    #[error("invalid alpha test function {0:#x}")]
    InvalidAlphaFunc(u32),
    #[error("constant buffer {0} declared twice")]
    DuplicateUbo(u32),
    #[error("temporary register {0} is not covered by a declaration")]
    MissingTempRange(u32),
    #[error("immediate {0} referenced before it was declared")]
    MissingImmediate(u32),
    #[error("{semantic} is not supported for {context}")]
    UnsupportedSemantic {
        semantic: Semantic,
        context: &'static str,
    },
    #[error(transparent)]
    Buffer(#[from] BufferError),
    #[error("{0}")]
    Invalid(String),
}

pub(crate) fn invalid(message: impl Into<String>) -> TranslateError {
    TranslateError::Invalid(message.into())
}

/// Failure of [`crate::patch_vertex_shader_interpolants`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum PatchError {
    #[error("unhandled interpolated semantic {semantic}")]
    UnknownInterpSemantic { semantic: Semantic },
    /// The program has no reserved room after its `#version` line.
    #[error("no reserved extension line after the version pragma")]
    MissingPadding,
}

//! TGSI to GLSL shader translation.
//!
//! [`convert_shader`] turns one [`vrend_tgsi::Program`] into GLSL source for
//! either desktop GL (130 to 150, 330 for compute) or GLES (310 and up),
//! together with a [`ShaderInfo`] record the renderer uses to bind
//! resources and link stages. Once a fragment shader is known,
//! [`patch_vertex_shader_interpolants`] rewrites the interpolation
//! qualifiers of the producer stage in place.
//!
//! Translation is a pure function of its inputs: the same program, key and
//! config always yield byte-identical output.

#![forbid(unsafe_code)]

mod context;
mod decl;
mod exits;
mod instr;
mod ios;
mod memory;
mod operands;
mod texture;

/// Renderer capabilities and per-variant shader keys.
pub mod config;
/// Whole-program translation entry point.
pub mod convert;
/// Translation and patch failures.
pub mod error;
/// Version header selection.
pub mod header;
/// Records describing a translated shader.
pub mod info;
/// Post-link interpolation patching.
pub mod patch;
/// Language feature requirements.
pub mod require;
/// Bounded output text buffer.
pub mod strbuf;
/// Lookup tables from TGSI enumerations to GLSL spellings.
pub mod tables;
/// Operand type qualifiers and literal formatting.
pub mod types;

pub use crate::config::{ShaderConfig, ShaderKey, StreamOutput, StreamOutputInfo, MAX_SO_OUTPUTS};
pub use crate::convert::{convert_shader, GlslShader};
pub use crate::error::{PatchError, TranslateError};
pub use crate::header::desktop_glsl_version;
pub use crate::info::{InterpInfo, ResourceArray, ShaderInfo};
pub use crate::patch::patch_vertex_shader_interpolants;
pub use crate::require::{Requirements, ShaderReq};
pub use crate::strbuf::BufferError;
pub use crate::types::TypeQualifier;

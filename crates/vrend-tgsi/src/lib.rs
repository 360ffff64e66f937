//! Typed model of Gallium TGSI shader programs.
//!
//! The records in this crate are what a TGSI binary decoder produces: a flat
//! stream of declarations, immediates, properties and instructions for one
//! shader stage. Code generators consume them together with the aggregate
//! [`ScanInfo`] computed by [`scan_program`].

#![forbid(unsafe_code)]

/// Opcodes and operand type inference.
pub mod opcode;
/// Program token records.
pub mod program;
/// Indirect addressing scanner.
pub mod scan;
/// Enumerations shared across records.
pub mod types;

/// Helpers for building synthetic programs in tests.
///
/// Only available to this crate's own tests or with the `test-utils` feature.
#[cfg(any(test, feature = "test-utils"))]
pub mod test_utils;

pub use crate::opcode::{Opcode, OpcodeType};
pub use crate::program::{
    DeclImage, DeclSamplerView, DeclSemantic, Declaration, Dimension, DstRegister, Immediate,
    IndirectRef, Instruction, MemoryInfo, Program, Property, SrcRegister, Swizzle, TexOffset,
    TextureInfo, Token, WriteMask,
};
pub use crate::scan::{scan_program, ScanInfo};
pub use crate::types::{
    CompareFunc, File, FileSet, ImageFormat, ImmediateType, InterpLocation, Interpolate,
    MembarFlags, PrimType, Processor, ReturnType, Semantic, Spacing, TextureTarget,
};

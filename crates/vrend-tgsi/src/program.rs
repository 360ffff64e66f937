//! Decoded TGSI program records.
//!
//! A [`Program`] is the flat token stream a TGSI decoder hands to a code
//! generator: declarations, immediates, properties and instructions in the
//! order they appeared in the binary.

use crate::opcode::Opcode;
use crate::types::{
    File, ImageFormat, ImmediateType, InterpLocation, Interpolate, PrimType, Processor,
    ReturnType, Semantic, Spacing, TextureTarget,
};

/// Bitmask of destination components (x=1, y=2, z=4, w=8).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct WriteMask(pub u8);

impl WriteMask {
    pub const NONE: Self = Self(0);
    pub const X: Self = Self(0b0001);
    pub const Y: Self = Self(0b0010);
    pub const Z: Self = Self(0b0100);
    pub const W: Self = Self(0b1000);
    pub const XY: Self = Self(0b0011);
    pub const XYZ: Self = Self(0b0111);
    pub const XYZW: Self = Self(0b1111);

    pub fn contains(self, component: u8) -> bool {
        (self.0 & component) != 0
    }

    pub fn is_full(self) -> bool {
        self.0 & 0xf == 0xf
    }
}

impl Default for WriteMask {
    fn default() -> Self {
        Self::XYZW
    }
}

/// 4-component swizzle.
///
/// Each lane is 0..=3 for x/y/z/w.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Swizzle(pub [u8; 4]);

impl Swizzle {
    pub const XYZW: Self = Self([0, 1, 2, 3]);
    pub const XXXX: Self = Self([0, 0, 0, 0]);
    pub const YYYY: Self = Self([1, 1, 1, 1]);
    pub const ZZZZ: Self = Self([2, 2, 2, 2]);
    pub const WWWW: Self = Self([3, 3, 3, 3]);

    pub fn is_identity(self) -> bool {
        self == Self::XYZW
    }

    pub fn x(self) -> u8 {
        self.0[0]
    }

    pub fn y(self) -> u8 {
        self.0[1]
    }

    pub fn z(self) -> u8 {
        self.0[2]
    }

    pub fn w(self) -> u8 {
        self.0[3]
    }
}

impl Default for Swizzle {
    fn default() -> Self {
        Self::XYZW
    }
}

/// Address register used to index a register file at run time.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct IndirectRef {
    pub file: File,
    pub index: u32,
    /// Component of the address register holding the index.
    pub swizzle: u8,
}

/// Outer (2D) index of a register, e.g. the constant buffer slot of `CONST[1][4]`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Dimension {
    pub index: i32,
    pub indirect: Option<IndirectRef>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct DstRegister {
    pub file: File,
    pub index: i32,
    pub indirect: Option<IndirectRef>,
    pub dimension: Option<Dimension>,
    pub write_mask: WriteMask,
}

impl DstRegister {
    pub fn new(file: File, index: i32) -> Self {
        Self {
            file,
            index,
            indirect: None,
            dimension: None,
            write_mask: WriteMask::XYZW,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct SrcRegister {
    pub file: File,
    pub index: i32,
    pub indirect: Option<IndirectRef>,
    pub dimension: Option<Dimension>,
    pub swizzle: Swizzle,
    pub negate: bool,
    pub absolute: bool,
}

impl SrcRegister {
    pub fn new(file: File, index: i32) -> Self {
        Self {
            file,
            index,
            indirect: None,
            dimension: None,
            swizzle: Swizzle::XYZW,
            negate: false,
            absolute: false,
        }
    }
}

/// Texel offset operand of a texture instruction.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TexOffset {
    pub file: File,
    pub index: u32,
    pub swizzle_x: u8,
    pub swizzle_y: u8,
    pub swizzle_z: u8,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TextureInfo {
    pub target: TextureTarget,
    pub return_type: ReturnType,
    pub offsets: Vec<TexOffset>,
}

/// Resource metadata carried by `LOAD`/`STORE`/`ATOM*`/`RESQ`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct MemoryInfo {
    pub texture: TextureTarget,
    pub format: ImageFormat,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Instruction {
    pub opcode: Opcode,
    pub saturate: bool,
    pub precise: bool,
    pub dst: Vec<DstRegister>,
    pub src: Vec<SrcRegister>,
    pub texture: Option<TextureInfo>,
    pub memory: Option<MemoryInfo>,
}

impl Instruction {
    pub fn new(opcode: Opcode) -> Self {
        Self {
            opcode,
            saturate: false,
            precise: false,
            dst: Vec::new(),
            src: Vec::new(),
            texture: None,
            memory: None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DeclSemantic {
    pub name: Semantic,
    pub index: u32,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DeclSamplerView {
    pub target: TextureTarget,
    pub return_type: ReturnType,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DeclImage {
    pub target: TextureTarget,
    pub format: ImageFormat,
    pub writable: bool,
}

/// A register declaration (`DCL IN[0], GENERIC[3], PERSPECTIVE`).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Declaration {
    pub file: File,
    pub first: u32,
    pub last: u32,
    /// Outer index (`DCL CONST[2][0..15]`).
    pub dimension: Option<u32>,
    pub semantic: Option<DeclSemantic>,
    pub interpolate: Interpolate,
    pub location: InterpLocation,
    pub array_id: u32,
    pub invariant: bool,
    pub sampler_view: Option<DeclSamplerView>,
    pub image: Option<DeclImage>,
    /// Buffer declared as an atomic counter buffer.
    pub atomic: bool,
}

impl Declaration {
    pub fn new(file: File, first: u32, last: u32) -> Self {
        Self {
            file,
            first,
            last,
            dimension: None,
            semantic: None,
            interpolate: Interpolate::default(),
            location: InterpLocation::default(),
            array_id: 0,
            invariant: false,
            sampler_view: None,
            image: None,
            atomic: false,
        }
    }
}

/// A 4-component literal with its raw 32-bit lane payloads.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Immediate {
    pub data_type: ImmediateType,
    pub bits: [u32; 4],
}

impl Immediate {
    pub fn float(values: [f32; 4]) -> Self {
        Self {
            data_type: ImmediateType::Float32,
            bits: values.map(f32::to_bits),
        }
    }

    pub fn uint(values: [u32; 4]) -> Self {
        Self {
            data_type: ImmediateType::Uint32,
            bits: values,
        }
    }

    pub fn int(values: [i32; 4]) -> Self {
        Self {
            data_type: ImmediateType::Int32,
            bits: values.map(|v| v as u32),
        }
    }

    pub fn float64(values: [f64; 2]) -> Self {
        let [a, b] = values.map(f64::to_bits);
        Self {
            data_type: ImmediateType::Float64,
            bits: [a as u32, (a >> 32) as u32, b as u32, (b >> 32) as u32],
        }
    }

    pub fn f32(&self, lane: usize) -> f32 {
        f32::from_bits(self.bits[lane])
    }

    pub fn u32(&self, lane: usize) -> u32 {
        self.bits[lane]
    }

    pub fn i32(&self, lane: usize) -> i32 {
        self.bits[lane] as i32
    }
}

/// Stage configuration scalar.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Property {
    GsInputPrim(PrimType),
    GsOutputPrim(PrimType),
    GsMaxOutputVertices(u32),
    GsInvocations(u32),
    /// 0 selects an upper-left origin, 1 lower-left.
    FsCoordOrigin(u32),
    /// 0 selects half-integer pixel centers, 1 integer.
    FsCoordPixelCenter(u32),
    FsColor0WritesAllCbufs(u32),
    FsEarlyDepthStencil(u32),
    NumClipdistEnabled(u32),
    NumCulldistEnabled(u32),
    TcsVerticesOut(u32),
    TesPrimMode(PrimType),
    TesSpacing(Spacing),
    TesVertexOrderCw(bool),
    TesPointMode(bool),
    CsFixedBlockWidth(u32),
    CsFixedBlockHeight(u32),
    CsFixedBlockDepth(u32),
    VsWindowSpacePosition(u32),
}

#[derive(Debug, Clone, PartialEq)]
pub enum Token {
    Declaration(Declaration),
    Immediate(Immediate),
    Property(Property),
    Instruction(Instruction),
}

/// A decoded TGSI shader.
#[derive(Debug, Clone, PartialEq)]
pub struct Program {
    pub processor: Processor,
    pub tokens: Vec<Token>,
}

impl Program {
    pub fn new(processor: Processor) -> Self {
        Self {
            processor,
            tokens: Vec::new(),
        }
    }

    pub fn instructions(&self) -> impl Iterator<Item = &Instruction> + '_ {
        self.tokens.iter().filter_map(|t| match t {
            Token::Instruction(inst) => Some(inst),
            _ => None,
        })
    }
}

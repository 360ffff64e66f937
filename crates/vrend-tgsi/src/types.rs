//! Enumerations shared by declarations, instructions and properties.

use core::fmt;

use bitflags::bitflags;

/// Shader stage a TGSI program is written for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Processor {
    Vertex,
    Fragment,
    Geometry,
    TessCtrl,
    TessEval,
    Compute,
}

impl Processor {
    /// Two-letter prefix used for per-stage uniform names (`vssamp0`, `fsconst0`, ...).
    pub fn prefix(self) -> &'static str {
        match self {
            Processor::Vertex => "vs",
            Processor::Fragment => "fs",
            Processor::Geometry => "gs",
            Processor::TessCtrl => "tc",
            Processor::TessEval => "te",
            Processor::Compute => "cs",
        }
    }
}

/// Register file an operand or declaration refers to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum File {
    Null,
    Constant,
    Input,
    Output,
    Temporary,
    Sampler,
    Address,
    Immediate,
    SystemValue,
    Image,
    SamplerView,
    Buffer,
    Memory,
    HwAtomic,
}

impl File {
    pub fn name(self) -> &'static str {
        match self {
            File::Null => "NULL",
            File::Constant => "CONST",
            File::Input => "IN",
            File::Output => "OUT",
            File::Temporary => "TEMP",
            File::Sampler => "SAMP",
            File::Address => "ADDR",
            File::Immediate => "IMM",
            File::SystemValue => "SV",
            File::Image => "IMAGE",
            File::SamplerView => "SVIEW",
            File::Buffer => "BUFFER",
            File::Memory => "MEMORY",
            File::HwAtomic => "HWATOMIC",
        }
    }
}

impl fmt::Display for File {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

bitflags! {
    /// Set of register files, as reported by the usage scanner.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
    pub struct FileSet: u32 {
        const CONSTANT = 1 << 1;
        const INPUT = 1 << 2;
        const OUTPUT = 1 << 3;
        const TEMPORARY = 1 << 4;
        const SAMPLER = 1 << 5;
        const ADDRESS = 1 << 6;
        const IMMEDIATE = 1 << 7;
        const SYSTEM_VALUE = 1 << 8;
        const IMAGE = 1 << 9;
        const SAMPLER_VIEW = 1 << 10;
        const BUFFER = 1 << 11;
        const MEMORY = 1 << 12;
        const HW_ATOMIC = 1 << 13;
    }
}

impl From<File> for FileSet {
    fn from(file: File) -> Self {
        match file {
            File::Null => FileSet::empty(),
            File::Constant => FileSet::CONSTANT,
            File::Input => FileSet::INPUT,
            File::Output => FileSet::OUTPUT,
            File::Temporary => FileSet::TEMPORARY,
            File::Sampler => FileSet::SAMPLER,
            File::Address => FileSet::ADDRESS,
            File::Immediate => FileSet::IMMEDIATE,
            File::SystemValue => FileSet::SYSTEM_VALUE,
            File::Image => FileSet::IMAGE,
            File::SamplerView => FileSet::SAMPLER_VIEW,
            File::Buffer => FileSet::BUFFER,
            File::Memory => FileSet::MEMORY,
            File::HwAtomic => FileSet::HW_ATOMIC,
        }
    }
}

/// Semantic role of an input, output or system value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Semantic {
    Position,
    Color,
    BColor,
    Fog,
    PSize,
    Generic,
    Normal,
    Face,
    EdgeFlag,
    PrimId,
    InstanceId,
    VertexId,
    Stencil,
    ClipDist,
    ClipVertex,
    GridSize,
    BlockId,
    BlockSize,
    ThreadId,
    TexCoord,
    PCoord,
    ViewportIndex,
    Layer,
    SampleId,
    SamplePos,
    SampleMask,
    InvocationId,
    VertexIdNoBase,
    BaseVertex,
    TessCoord,
    VerticesIn,
    TessOuter,
    TessInner,
    Patch,
    HelperInvocation,
    BaseInstance,
    DrawId,
}

impl Semantic {
    pub fn name(self) -> &'static str {
        match self {
            Semantic::Position => "POSITION",
            Semantic::Color => "COLOR",
            Semantic::BColor => "BCOLOR",
            Semantic::Fog => "FOG",
            Semantic::PSize => "PSIZE",
            Semantic::Generic => "GENERIC",
            Semantic::Normal => "NORMAL",
            Semantic::Face => "FACE",
            Semantic::EdgeFlag => "EDGEFLAG",
            Semantic::PrimId => "PRIMID",
            Semantic::InstanceId => "INSTANCEID",
            Semantic::VertexId => "VERTEXID",
            Semantic::Stencil => "STENCIL",
            Semantic::ClipDist => "CLIPDIST",
            Semantic::ClipVertex => "CLIPVERTEX",
            Semantic::GridSize => "GRID_SIZE",
            Semantic::BlockId => "BLOCK_ID",
            Semantic::BlockSize => "BLOCK_SIZE",
            Semantic::ThreadId => "THREAD_ID",
            Semantic::TexCoord => "TEXCOORD",
            Semantic::PCoord => "PCOORD",
            Semantic::ViewportIndex => "VIEWPORT_INDEX",
            Semantic::Layer => "LAYER",
            Semantic::SampleId => "SAMPLEID",
            Semantic::SamplePos => "SAMPLEPOS",
            Semantic::SampleMask => "SAMPLEMASK",
            Semantic::InvocationId => "INVOCATIONID",
            Semantic::VertexIdNoBase => "VERTEXID_NOBASE",
            Semantic::BaseVertex => "BASEVERTEX",
            Semantic::TessCoord => "TESSCOORD",
            Semantic::VerticesIn => "VERTICESIN",
            Semantic::TessOuter => "TESSOUTER",
            Semantic::TessInner => "TESSINNER",
            Semantic::Patch => "PATCH",
            Semantic::HelperInvocation => "HELPER_INVOCATION",
            Semantic::BaseInstance => "BASEINSTANCE",
            Semantic::DrawId => "DRAWID",
        }
    }
}

impl fmt::Display for Semantic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Interpolation mode of a fragment input.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum Interpolate {
    #[default]
    Constant,
    Linear,
    Perspective,
    Color,
}

/// Sampling location of an interpolated input.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum InterpLocation {
    #[default]
    Center,
    Centroid,
    Sample,
}

/// Texture dimensionality of a sampler view, image or texture instruction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum TextureTarget {
    Buffer,
    Tex1D,
    #[default]
    Tex2D,
    Tex3D,
    Cube,
    Rect,
    Shadow1D,
    Shadow2D,
    ShadowRect,
    Array1D,
    Array2D,
    ShadowArray1D,
    ShadowArray2D,
    ShadowCube,
    Msaa2D,
    ArrayMsaa2D,
    CubeArray,
    ShadowCubeArray,
    Unknown,
}

impl TextureTarget {
    pub fn is_msaa(self) -> bool {
        matches!(self, TextureTarget::Msaa2D | TextureTarget::ArrayMsaa2D)
    }

    pub fn is_shadow(self) -> bool {
        matches!(
            self,
            TextureTarget::Shadow1D
                | TextureTarget::Shadow2D
                | TextureTarget::ShadowRect
                | TextureTarget::ShadowArray1D
                | TextureTarget::ShadowArray2D
                | TextureTarget::ShadowCube
                | TextureTarget::ShadowCubeArray
        )
    }

    pub fn name(self) -> &'static str {
        match self {
            TextureTarget::Buffer => "BUFFER",
            TextureTarget::Tex1D => "1D",
            TextureTarget::Tex2D => "2D",
            TextureTarget::Tex3D => "3D",
            TextureTarget::Cube => "CUBE",
            TextureTarget::Rect => "RECT",
            TextureTarget::Shadow1D => "SHADOW1D",
            TextureTarget::Shadow2D => "SHADOW2D",
            TextureTarget::ShadowRect => "SHADOWRECT",
            TextureTarget::Array1D => "1D_ARRAY",
            TextureTarget::Array2D => "2D_ARRAY",
            TextureTarget::ShadowArray1D => "SHADOW1D_ARRAY",
            TextureTarget::ShadowArray2D => "SHADOW2D_ARRAY",
            TextureTarget::ShadowCube => "SHADOWCUBE",
            TextureTarget::Msaa2D => "2D_MSAA",
            TextureTarget::ArrayMsaa2D => "2D_ARRAY_MSAA",
            TextureTarget::CubeArray => "CUBE_ARRAY",
            TextureTarget::ShadowCubeArray => "SHADOWCUBE_ARRAY",
            TextureTarget::Unknown => "UNKNOWN",
        }
    }
}

impl fmt::Display for TextureTarget {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Component type returned by a sampler view.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum ReturnType {
    #[default]
    Unorm,
    Snorm,
    Sint,
    Uint,
    Float,
}

/// Storage format of an image declaration or memory instruction.
///
/// Only the formats that have a GLSL image layout qualifier are named;
/// everything else is carried as [`ImageFormat::Other`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum ImageFormat {
    #[default]
    None,
    R11G11B10Float,
    R10G10B10A2Unorm,
    R10G10B10A2Uint,
    R8Unorm,
    R8Snorm,
    R8Uint,
    R8Sint,
    R8G8Unorm,
    R8G8Snorm,
    R8G8Uint,
    R8G8Sint,
    R8G8B8A8Unorm,
    R8G8B8A8Snorm,
    R8G8B8A8Uint,
    R8G8B8A8Sint,
    R16Unorm,
    R16Snorm,
    R16Uint,
    R16Sint,
    R16Float,
    R16G16Unorm,
    R16G16Snorm,
    R16G16Uint,
    R16G16Sint,
    R16G16Float,
    R16G16B16A16Unorm,
    R16G16B16A16Snorm,
    R16G16B16A16Float,
    R16G16B16A16Uint,
    R16G16B16A16Sint,
    R32Float,
    R32Uint,
    R32Sint,
    R32G32Float,
    R32G32Uint,
    R32G32Sint,
    R32G32B32A32Float,
    R32G32B32A32Uint,
    R32G32B32A32Sint,
    Other(u32),
}

/// Primitive topology carried by geometry and tessellation properties.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum PrimType {
    #[default]
    Points,
    Lines,
    LineLoop,
    LineStrip,
    Triangles,
    TriangleStrip,
    TriangleFan,
    Quads,
    QuadStrip,
    Polygon,
    LinesAdjacency,
    LineStripAdjacency,
    TrianglesAdjacency,
    TriangleStripAdjacency,
    Patches,
}

/// Tessellation spacing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum Spacing {
    #[default]
    FractionalOdd,
    FractionalEven,
    Equal,
}

/// Element type of an immediate.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum ImmediateType {
    #[default]
    Float32,
    Uint32,
    Int32,
    /// A pair of doubles, each split into two 32-bit words.
    Float64,
}

/// Compare function used by the fixed-function alpha test.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CompareFunc {
    Never,
    Less,
    Equal,
    LEqual,
    Greater,
    NotEqual,
    GEqual,
    Always,
}

impl CompareFunc {
    /// Decodes the raw `PIPE_FUNC_*` value.
    pub fn from_raw(value: u32) -> Option<Self> {
        Some(match value {
            0 => CompareFunc::Never,
            1 => CompareFunc::Less,
            2 => CompareFunc::Equal,
            3 => CompareFunc::LEqual,
            4 => CompareFunc::Greater,
            5 => CompareFunc::NotEqual,
            6 => CompareFunc::GEqual,
            7 => CompareFunc::Always,
            _ => return None,
        })
    }
}

bitflags! {
    /// Memory barrier scope carried by `MEMBAR`'s immediate operand.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
    pub struct MembarFlags: u32 {
        const SHADER_BUFFER = 1 << 0;
        const ATOMIC_BUFFER = 1 << 1;
        const SHADER_IMAGE = 1 << 2;
        const SHARED = 1 << 3;
        const THREAD_GROUP = 1 << 4;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn file_set_from_file_maps_each_file_to_one_bit() {
        let files = [
            File::Constant,
            File::Input,
            File::Output,
            File::Temporary,
            File::Sampler,
            File::Address,
            File::Immediate,
            File::SystemValue,
            File::Image,
            File::SamplerView,
            File::Buffer,
            File::Memory,
            File::HwAtomic,
        ];
        let mut all = FileSet::empty();
        for file in files {
            let bit = FileSet::from(file);
            assert_eq!(bit.bits().count_ones(), 1, "{file}");
            assert!(!all.intersects(bit));
            all |= bit;
        }
        assert!(FileSet::from(File::Null).is_empty());
    }

    #[test]
    fn shadow_and_msaa_classification() {
        assert!(TextureTarget::ShadowCubeArray.is_shadow());
        assert!(TextureTarget::ShadowRect.is_shadow());
        assert!(!TextureTarget::CubeArray.is_shadow());
        assert!(TextureTarget::ArrayMsaa2D.is_msaa());
        assert!(!TextureTarget::Array2D.is_msaa());
    }

    #[test]
    fn compare_func_rejects_out_of_range_values() {
        assert_eq!(CompareFunc::from_raw(7), Some(CompareFunc::Always));
        assert_eq!(CompareFunc::from_raw(8), None);
    }
}

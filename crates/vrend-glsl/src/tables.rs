//! Static lookup tables mapping TGSI enumerations to GLSL spellings.

use tracing::warn;
use vrend_tgsi::{
    CompareFunc, ImageFormat, InterpLocation, Interpolate, Opcode, PrimType, Processor,
    ReturnType, Spacing, TextureTarget,
};

use crate::config::ShaderKey;
use crate::types::TypeQualifier;

/// Geometry layout name of a primitive type.
pub fn prim_name(prim: PrimType) -> &'static str {
    match prim {
        PrimType::Points => "points",
        PrimType::Lines => "lines",
        PrimType::LineStrip => "line_strip",
        PrimType::LinesAdjacency => "lines_adjacency",
        PrimType::Triangles => "triangles",
        PrimType::TriangleStrip => "triangle_strip",
        PrimType::TrianglesAdjacency => "triangles_adjacency",
        PrimType::Quads => "quads",
        _ => "UNKNOWN",
    }
}

/// Tessellation evaluation layout name of a primitive mode.
pub fn tes_prim_name(prim: PrimType) -> &'static str {
    match prim {
        PrimType::Quads => "quads",
        PrimType::Triangles => "triangles",
        PrimType::Lines => "isolines",
        _ => "UNKNOWN",
    }
}

pub fn spacing_name(spacing: Spacing) -> &'static str {
    match spacing {
        Spacing::FractionalOdd => "fractional_odd_spacing",
        Spacing::FractionalEven => "fractional_even_spacing",
        Spacing::Equal => "equal_spacing",
    }
}

/// Vertices per input primitive of a geometry shader.
pub fn gs_input_prim_size(prim: PrimType) -> Option<u32> {
    match prim {
        PrimType::Points => Some(1),
        PrimType::Lines => Some(2),
        PrimType::LinesAdjacency => Some(4),
        PrimType::Triangles => Some(3),
        PrimType::TrianglesAdjacency => Some(6),
        _ => None,
    }
}

/// Sampler type prefix for a return type: `i`, `u` or a blank.
pub fn sampler_return_conv(ret: ReturnType) -> char {
    match ret {
        ReturnType::Sint => 'i',
        ReturnType::Uint => 'u',
        _ => ' ',
    }
}

/// Suffix of the GLSL sampler/image type and whether it is a shadow sampler.
///
/// GLSL ES has no 1D textures; those targets map to their 2D forms.
pub fn sampler_type_conv(use_gles: bool, target: TextureTarget) -> Option<(&'static str, bool)> {
    use TextureTarget::*;
    Some(match target {
        Buffer => ("Buffer", false),
        Tex1D if !use_gles => ("1D", false),
        Tex1D | Tex2D => ("2D", false),
        Tex3D => ("3D", false),
        Cube => ("Cube", false),
        Rect => ("2DRect", false),
        Shadow1D if !use_gles => ("1DShadow", true),
        Shadow1D | Shadow2D => ("2DShadow", true),
        ShadowRect => ("2DRectShadow", true),
        Array1D if !use_gles => ("1DArray", false),
        Array1D | Array2D => ("2DArray", false),
        ShadowArray1D if !use_gles => ("1DArrayShadow", true),
        ShadowArray1D | ShadowArray2D => ("2DArrayShadow", true),
        ShadowCube => ("CubeShadow", true),
        CubeArray => ("CubeArray", false),
        ShadowCubeArray => ("CubeArrayShadow", true),
        Msaa2D => ("2DMS", false),
        ArrayMsaa2D => ("2DMSArray", false),
        Unknown => return None,
    })
}

/// Interpolation qualifier, or `None` when the default applies.
pub fn interp_string(use_gles: bool, interpolate: Interpolate, flatshade: bool) -> Option<&'static str> {
    match interpolate {
        Interpolate::Linear if use_gles => Some(""),
        Interpolate::Linear => Some("noperspective "),
        Interpolate::Perspective => Some("smooth "),
        Interpolate::Constant => Some("flat "),
        Interpolate::Color if flatshade => Some("flat "),
        Interpolate::Color => None,
    }
}

pub fn aux_string(location: InterpLocation) -> &'static str {
    match location {
        InterpLocation::Center => "",
        InterpLocation::Centroid => "centroid ",
        InterpLocation::Sample => "sample ",
    }
}

/// GLSL image layout qualifier of a format and the type it returns.
pub fn internal_format_string(format: ImageFormat) -> (&'static str, ReturnType) {
    use ImageFormat::*;
    use ReturnType as R;
    match format {
        R11G11B10Float => ("r11f_g11f_b10f", R::Float),
        R10G10B10A2Unorm => ("rgb10_a2", R::Unorm),
        R10G10B10A2Uint => ("rgb10_a2ui", R::Uint),
        R8Unorm => ("r8", R::Unorm),
        R8Snorm => ("r8_snorm", R::Snorm),
        R8Uint => ("r8ui", R::Uint),
        R8Sint => ("r8i", R::Sint),
        R8G8Unorm => ("rg8", R::Unorm),
        R8G8Snorm => ("rg8_snorm", R::Snorm),
        R8G8Uint => ("rg8ui", R::Uint),
        R8G8Sint => ("rg8i", R::Sint),
        R8G8B8A8Unorm => ("rgba8", R::Unorm),
        R8G8B8A8Snorm => ("rgba8_snorm", R::Snorm),
        R8G8B8A8Uint => ("rgba8ui", R::Uint),
        R8G8B8A8Sint => ("rgba8i", R::Sint),
        R16Unorm => ("r16", R::Unorm),
        R16Snorm => ("r16_snorm", R::Snorm),
        R16Uint => ("r16ui", R::Uint),
        R16Sint => ("r16i", R::Sint),
        R16Float => ("r16f", R::Float),
        R16G16Unorm => ("rg16", R::Unorm),
        R16G16Snorm => ("rg16_snorm", R::Snorm),
        R16G16Uint => ("rg16ui", R::Uint),
        R16G16Sint => ("rg16i", R::Sint),
        R16G16Float => ("rg16f", R::Float),
        R16G16B16A16Unorm => ("rgba16", R::Unorm),
        R16G16B16A16Snorm => ("rgba16_snorm", R::Snorm),
        R16G16B16A16Float => ("rgba16f", R::Float),
        R16G16B16A16Uint => ("rgba16ui", R::Uint),
        R16G16B16A16Sint => ("rgba16i", R::Sint),
        R32Float => ("r32f", R::Float),
        R32Uint => ("r32ui", R::Uint),
        R32Sint => ("r32i", R::Sint),
        R32G32Float => ("rg32f", R::Float),
        R32G32Uint => ("rg32ui", R::Uint),
        R32G32Sint => ("rg32i", R::Sint),
        R32G32B32A32Float => ("rgba32f", R::Float),
        R32G32B32A32Uint => ("rgba32ui", R::Uint),
        R32G32B32A32Sint => ("rgba32i", R::Sint),
        None => ("", R::Unorm),
        Other(raw) => {
            warn!(format = raw, "image format has no GLSL layout qualifier");
            ("", R::Unorm)
        }
    }
}

/// Operator of an alpha test comparison against the reference value.
pub fn alpha_test_op(func: CompareFunc) -> &'static str {
    match func {
        CompareFunc::Never => "false",
        CompareFunc::Less => "<",
        CompareFunc::Equal => "==",
        CompareFunc::LEqual => "<=",
        CompareFunc::Greater => ">",
        CompareFunc::NotEqual => "!=",
        CompareFunc::GEqual => ">=",
        CompareFunc::Always => "true",
    }
}

/// `atomic*`/`imageAtomic*` suffix and whether the op is a compare-and-swap.
pub fn atomic_opname(opcode: Opcode) -> Option<(&'static str, bool)> {
    Some(match opcode {
        Opcode::AtomUadd => ("Add", false),
        Opcode::AtomXchg => ("Exchange", false),
        Opcode::AtomCas => ("CompSwap", true),
        Opcode::AtomAnd => ("And", false),
        Opcode::AtomOr => ("Or", false),
        Opcode::AtomXor => ("Xor", false),
        Opcode::AtomUmin | Opcode::AtomImin => ("Min", false),
        Opcode::AtomUmax | Opcode::AtomImax => ("Max", false),
        _ => return None,
    })
}

/// Integer coordinate constructor for image access and whether the image is multisampled.
pub fn coord_prefix(target: TextureTarget) -> (TypeQualifier, bool) {
    use TextureTarget::*;
    match target {
        Tex1D | Buffer => (TypeQualifier::Int, false),
        Tex2D | Rect | Array1D => (TypeQualifier::IVec2, false),
        Tex3D | Cube | Array2D | CubeArray => (TypeQualifier::IVec3, false),
        Msaa2D => (TypeQualifier::IVec2, true),
        ArrayMsaa2D => (TypeQualifier::IVec3, true),
        _ => (TypeQualifier::None, false),
    }
}

/// Prefix of varyings read by `processor`, named after the stage that wrote them.
pub fn input_name_prefix(processor: Processor, key: &ShaderKey) -> &'static str {
    match processor {
        Processor::Fragment if key.gs_present => "gso",
        Processor::Fragment if key.tes_present => "teo",
        Processor::Fragment => "vso",
        Processor::Geometry if key.tes_present => "teo",
        Processor::Geometry => "vso",
        Processor::TessEval if key.tcs_present => "tco",
        Processor::TessEval => "vso",
        Processor::TessCtrl => "vso",
        Processor::Vertex | Processor::Compute => "in",
    }
}

/// Prefix of varyings written by `processor`.
pub fn output_name_prefix(processor: Processor) -> &'static str {
    match processor {
        Processor::Fragment => "fsout",
        Processor::Geometry => "gso",
        Processor::Vertex => "vso",
        Processor::TessCtrl => "tco",
        Processor::TessEval => "teo",
        Processor::Compute => "out",
    }
}

/// Lowest desktop `#version` a stage can be written in.
pub fn stage_min_glsl_version(processor: Processor) -> u32 {
    match processor {
        Processor::Compute => 330,
        Processor::Geometry | Processor::TessCtrl | Processor::TessEval => 150,
        Processor::Vertex | Processor::Fragment => 130,
    }
}

//! Facts about a translated shader that the caller needs to bind and link it.

use vrend_tgsi::{InterpLocation, Interpolate, PrimType, Semantic};

use crate::config::StreamOutputInfo;
use crate::require::ShaderReq;

/// A run of consecutive sampler or image slots declared as one GLSL array.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ResourceArray {
    pub first: u32,
    pub size: u32,
}

impl ResourceArray {
    pub fn contains(&self, index: u32) -> bool {
        index >= self.first && index < self.first + self.size
    }
}

/// Interpolation of one fragment input varying.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct InterpInfo {
    pub semantic: Semantic,
    pub index: u32,
    pub interpolate: Interpolate,
    pub location: InterpLocation,
}

/// Everything the caller learns about a shader besides its text.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct ShaderInfo {
    pub samplers_used_mask: u32,
    pub images_used_mask: u32,
    pub ubo_used_mask: u32,
    pub ssbo_used_mask: u32,
    /// Size of the default uniform block in vec4s.
    pub num_consts: u32,
    /// Constant buffers are indexed through an address register.
    pub ubo_indirect: bool,
    pub num_inputs: u32,
    pub num_interps: u32,
    pub num_outputs: u32,
    /// Samplers that need the `shadmask`/`shadadd` uniforms.
    pub shadow_samp_mask: u32,
    pub num_indirect_generic_inputs: u32,
    pub num_indirect_generic_outputs: u32,
    pub num_indirect_patch_inputs: u32,
    pub num_indirect_patch_outputs: u32,
    /// Minimum GLSL version the shader needs, 0 when the default suffices.
    pub glsl_ver: u32,
    pub shader_req_bits: ShaderReq,
    /// Number of emulated user clip planes (`clipp[]`).
    pub num_ucp: u32,
    pub has_pervertex_out: bool,
    pub has_sample_input: bool,
    pub num_clip_out: u32,
    pub num_cull_out: u32,
    pub gs_out_prim: PrimType,
    pub tes_prim: PrimType,
    pub tes_point_mode: bool,
    /// Vertex attribute slots read by a vertex shader.
    pub attrib_input_mask: u32,
    pub sampler_arrays: Vec<ResourceArray>,
    pub image_arrays: Vec<ResourceArray>,
    /// GLSL variable captured by each transform feedback output.
    pub so_names: Vec<Option<String>>,
    pub so_info: StreamOutputInfo,
    /// Fragment inputs whose interpolation the previous stage must match.
    pub interpinfo: Vec<InterpInfo>,
}

impl ShaderInfo {
    /// First slot of the sampler array that contains `index`.
    pub fn lookup_sampler_array(&self, index: u32) -> Option<u32> {
        self.sampler_arrays
            .iter()
            .find(|a| a.contains(index))
            .map(|a| a.first)
    }
}

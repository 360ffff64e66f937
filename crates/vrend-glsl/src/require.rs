//! Monotonic accumulation of GLSL feature requirements.

use bitflags::bitflags;

bitflags! {
    /// Optional GLSL capabilities a translated shader depends on.
    ///
    /// Bit positions are stable; they are reported back to callers in
    /// [`crate::ShaderInfo::shader_req_bits`].
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
    pub struct ShaderReq: u32 {
        const SAMPLER_RECT = 1 << 0;
        const CUBE_ARRAY = 1 << 1;
        const INTS = 1 << 2;
        const SAMPLER_MS = 1 << 3;
        const INSTANCE_ID = 1 << 4;
        const LODQ = 1 << 5;
        const TXQ_LEVELS = 1 << 6;
        const TG4 = 1 << 7;
        const VIEWPORT_IDX = 1 << 8;
        const STENCIL_EXPORT = 1 << 9;
        const LAYER = 1 << 10;
        const SAMPLE_SHADING = 1 << 11;
        const GPU_SHADER5 = 1 << 12;
        const DERIVATIVE_CONTROL = 1 << 13;
        const FP64 = 1 << 14;
        const IMAGE_LOAD_STORE = 1 << 15;
        const ES31_COMPAT = 1 << 16;
        const IMAGE_SIZE = 1 << 17;
        const TXQS = 1 << 18;
        const FBFETCH = 1 << 19;
        const SHADER_CLOCK = 1 << 20;
        const PSIZE = 1 << 21;
        const IMAGE_ATOMIC = 1 << 22;
    }
}

/// Desktop `#extension` names, in emission order.
pub const EXTENSIONS: &[(ShaderReq, &str)] = &[
    (ShaderReq::SAMPLER_RECT, "ARB_texture_rectangle"),
    (ShaderReq::CUBE_ARRAY, "ARB_texture_cube_map_array"),
    (ShaderReq::INTS, "ARB_shader_bit_encoding"),
    (ShaderReq::SAMPLER_MS, "ARB_texture_multisample"),
    (ShaderReq::INSTANCE_ID, "ARB_draw_instanced"),
    (ShaderReq::LODQ, "ARB_texture_query_lod"),
    (ShaderReq::TXQ_LEVELS, "ARB_texture_query_levels"),
    (ShaderReq::TG4, "ARB_texture_gather"),
    (ShaderReq::VIEWPORT_IDX, "ARB_viewport_array"),
    (ShaderReq::STENCIL_EXPORT, "ARB_shader_stencil_export"),
    (ShaderReq::LAYER, "ARB_fragment_layer_viewport"),
    (ShaderReq::SAMPLE_SHADING, "ARB_sample_shading"),
    (ShaderReq::GPU_SHADER5, "ARB_gpu_shader5"),
    (ShaderReq::DERIVATIVE_CONTROL, "ARB_derivative_control"),
    (ShaderReq::FP64, "ARB_gpu_shader_fp64"),
    (ShaderReq::IMAGE_LOAD_STORE, "ARB_shader_image_load_store"),
    (ShaderReq::ES31_COMPAT, "ARB_ES3_1_compatibility"),
    (ShaderReq::IMAGE_SIZE, "ARB_shader_image_size"),
    (ShaderReq::TXQS, "ARB_shader_texture_image_samples"),
    (ShaderReq::FBFETCH, "EXT_shader_framebuffer_fetch"),
    (ShaderReq::SHADER_CLOCK, "ARB_shader_clock"),
];

/// Required capability bits plus the minimum GLSL version.
///
/// Both only ever grow during a translation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Requirements {
    bits: ShaderReq,
    version: u32,
}

impl Requirements {
    pub fn require(&mut self, req: ShaderReq) {
        self.bits |= req;
    }

    pub fn require_version(&mut self, version: u32) {
        if version > self.version {
            self.version = version;
        }
    }

    pub fn has(&self, req: ShaderReq) -> bool {
        self.bits.intersects(req)
    }

    pub fn bits(&self) -> ShaderReq {
        self.bits
    }

    pub fn version(&self) -> u32 {
        self.version
    }

    /// Desktop extensions to enable, skipping the ones implied by the version.
    pub fn desktop_extensions(&self) -> impl Iterator<Item = &'static str> + '_ {
        EXTENSIONS.iter().filter_map(move |&(req, name)| {
            if req == ShaderReq::SAMPLER_RECT && self.version >= 140 {
                return None;
            }
            self.bits.contains(req).then_some(name)
        })
    }
}

//! `#version` line, extension pragmas and reserved patch lines.

use vrend_tgsi::Processor;

use crate::context::Context;
use crate::require::ShaderReq;
use crate::strbuf::emit;
use crate::tables::stage_min_glsl_version;

/// Room for `#extension GL_ARB_gpu_shader5 : require\n`.
pub(crate) const PAD_GPU_SHADER5: &str = "                                       \n";
/// Room for `#extension GL_OES_shader_multisample_interpolation : require\n`.
pub(crate) const PAD_GPU_MSINTERPOL: &str =
    "                                                            \n";

/// Desktop `#version` for a stage given the accumulated version floor.
pub fn desktop_glsl_version(processor: Processor, required: u32) -> u32 {
    if processor == Processor::Compute {
        return 330;
    }
    match required.max(stage_min_glsl_version(processor)) {
        150.. => 150,
        140..=149 => 140,
        _ => 130,
    }
}

impl Context<'_> {
    fn emit_ext(&mut self, name: &str, verb: &str) {
        emit!(self.hdr, "#extension GL_{name} : {verb}\n");
    }

    /// Whether the fragment shader redeclares `gl_FragCoord` with a layout.
    pub(crate) fn fs_emit_layout(&self) -> bool {
        self.fs_pixel_center != 0
            || (self.fs_coord_origin != 0) == self.key.invert_fs_origin
    }

    pub(crate) fn emit_header(&mut self) {
        if self.cfg.use_gles {
            self.emit_gles_header();
        } else {
            self.emit_desktop_header();
        }
    }

    fn emit_gles_header(&mut self) {
        let version = self.cfg.glsl_version;
        let processor = self.processor;
        let reqs = self.reqs;
        emit!(self.hdr, "#version {version} es\n");

        if version < 320
            && matches!(
                processor,
                Processor::Vertex | Processor::Geometry | Processor::TessEval
            )
        {
            self.hdr.append(PAD_GPU_SHADER5);
            self.hdr.append(PAD_GPU_MSINTERPOL);
        }

        if reqs.has(ShaderReq::SAMPLER_MS) {
            self.emit_ext("OES_texture_storage_multisample_2d_array", "require");
        }
        if processor == Processor::Fragment && reqs.has(ShaderReq::FBFETCH) {
            self.emit_ext("EXT_shader_framebuffer_fetch", "require");
        }
        if processor == Processor::Geometry {
            self.emit_ext("EXT_geometry_shader", "require");
            if reqs.has(ShaderReq::PSIZE) {
                self.emit_ext("OES_geometry_point_size", "enable");
            }
        }
        if matches!(processor, Processor::TessCtrl | Processor::TessEval) {
            if version < 320 {
                self.emit_ext("OES_tessellation_shader", "require");
            }
            self.emit_ext("OES_tessellation_point_size", "enable");
        }

        if version < 320 {
            if reqs.has(ShaderReq::SAMPLE_SHADING) {
                self.emit_ext("OES_sample_variables", "require");
            }
            if reqs.has(ShaderReq::GPU_SHADER5) {
                self.emit_ext("OES_gpu_shader5", "require");
                self.emit_ext("OES_shader_multisample_interpolation", "require");
            }
            if reqs.has(ShaderReq::CUBE_ARRAY) {
                self.emit_ext("OES_texture_cube_map_array", "require");
            }
            if reqs.has(ShaderReq::LAYER) {
                self.emit_ext("EXT_geometry_shader", "require");
            }
            if reqs.has(ShaderReq::IMAGE_ATOMIC) {
                self.emit_ext("OES_shader_image_atomic", "require");
            }
        }

        self.hdr.append(PAD_GPU_SHADER5);
        self.hdr.append("precision highp float;\n");
        self.hdr.append("precision highp int;\n");
    }

    fn emit_desktop_header(&mut self) {
        let processor = self.processor;
        let version = desktop_glsl_version(processor, self.reqs.version());
        emit!(self.hdr, "#version {version}\n");

        match processor {
            Processor::Compute => self.emit_ext("ARB_compute_shader", "require"),
            Processor::Vertex | Processor::Geometry | Processor::TessEval => {
                self.hdr.append(PAD_GPU_SHADER5)
            }
            _ => {}
        }

        if matches!(processor, Processor::TessCtrl | Processor::TessEval) {
            self.emit_ext("ARB_tessellation_shader", "require");
        }
        if processor == Processor::Vertex && self.cfg.use_explicit_locations {
            self.emit_ext("ARB_explicit_attrib_location", "require");
        }
        if processor == Processor::Fragment && self.fs_emit_layout() {
            self.emit_ext("ARB_fragment_coord_conventions", "require");
        }
        if self.ubo_used_mask != 0 {
            self.emit_ext("ARB_uniform_buffer_object", "require");
        }
        if self.num_cull_dist_prop != 0 || self.key.prev_stage_num_cull_out != 0 {
            self.emit_ext("ARB_cull_distance", "require");
        }
        if self.ssbo_used_mask != 0 {
            self.emit_ext("ARB_shader_storage_buffer_object", "require");
        }
        if !self.abos.is_empty() {
            self.emit_ext("ARB_shader_atomic_counters", "require");
            self.emit_ext("ARB_shader_atomic_counter_ops", "require");
        }

        let reqs = self.reqs;
        for name in reqs.desktop_extensions() {
            self.emit_ext(name, "require");
        }
    }
}

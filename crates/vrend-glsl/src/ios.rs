//! Global declarations: varyings, uniforms, resources and scratch variables.
//!
//! Everything here is appended to the header buffer after the body has been
//! generated, so the declarations reflect every register the body touched.

use vrend_tgsi::{File, ImageFormat, Processor, Semantic, TextureTarget};

use crate::context::{bit, Context, SamplerSlot};
use crate::error::TranslateError;
use crate::require::ShaderReq;
use crate::strbuf::emit;
use crate::tables::{
    aux_string, gs_input_prim_size, input_name_prefix, interp_string, internal_format_string,
    output_name_prefix, prim_name, sampler_return_conv, sampler_type_conv, spacing_name,
    tes_prim_name,
};
use crate::types::TypeQualifier;

/// Blank run in front of interpolated outputs, overwritten once the
/// fragment shader's interpolation qualifiers are known.
pub(crate) const INTERP_PREFIX: &str = "                           ";

fn is_interpolated(name: Semantic) -> bool {
    matches!(name, Semantic::Generic | Semantic::Color | Semantic::BColor)
}

/// `(clip, cull)` output declarations of a stage that writes clip distances.
fn clip_cull_outputs(ctx: &Context<'_>) -> (String, String) {
    if ctx.has_clip_cull_props() {
        let clip = match ctx.num_clip_dist_prop {
            0 => String::new(),
            n => format!("out float gl_ClipDistance[{n}];\n"),
        };
        let cull = match ctx.num_cull_dist_prop {
            0 => String::new(),
            n => format!("out float gl_CullDistance[{n}];\n"),
        };
        (clip, cull)
    } else {
        let n = if ctx.num_clip_dist != 0 { ctx.num_clip_dist } else { 8 };
        (format!("out float gl_ClipDistance[{n}];\n"), String::new())
    }
}

impl Context<'_> {
    pub(crate) fn emit_ios(&mut self) -> Result<(), TranslateError> {
        self.num_interps = 0;
        match self.processor {
            Processor::Vertex => self.emit_ios_vs(),
            Processor::Fragment => self.emit_ios_fs(),
            Processor::Geometry => self.emit_ios_gs()?,
            Processor::TessCtrl => self.emit_ios_tcs(),
            Processor::TessEval => self.emit_ios_tes(),
            Processor::Compute => self.emit_ios_cs(),
        }
        self.emit_ios_streamout();
        self.emit_ios_common()?;

        if self.processor == Processor::Fragment && self.key.pstipple_tex {
            self.hdr
                .append("uniform sampler2D pstipple_sampler;\nfloat stip_temp;\n");
        }
        Ok(())
    }

    fn emit_winsys_correction(&mut self) {
        self.hdr.append("uniform float winsys_adjust_y;\n");
    }

    /// One output varying, or the qualifier redeclaration of a builtin.
    fn emit_output_decl(&mut self, i: usize, interp_prefix: bool) {
        let out = &self.outputs[i];
        if !out.predefined_no_emit {
            let prefix = if interp_prefix && is_interpolated(out.name) {
                self.num_interps += 1;
                INTERP_PREFIX
            } else {
                ""
            };
            let out = &self.outputs[i];
            let precise = if out.precise { "precise " } else { "" };
            let invariant = if out.invariant { "invariant " } else { "" };
            let dir = if out.fbfetch_used { "inout" } else { "out" };
            if out.stream != 0 && self.processor == Processor::Geometry {
                emit!(
                    self.hdr,
                    "layout (stream = {}) {prefix}{precise}{invariant}out vec4 {};\n",
                    out.stream,
                    out.glsl_name
                );
            } else {
                emit!(
                    self.hdr,
                    "{prefix}{precise}{invariant}{dir} vec4 {};\n",
                    out.glsl_name
                );
            }
        } else if out.invariant || out.precise {
            let qualifier = if out.precise { "precise " } else { "invariant " };
            emit!(self.hdr, "{qualifier}{};\n", out.glsl_name);
        }
    }

    fn emit_ios_vs(&mut self) {
        for input in &self.inputs {
            if input.predefined_no_emit {
                continue;
            }
            if self.cfg.use_explicit_locations {
                emit!(self.hdr, "layout(location={}) ", input.first);
            }
            emit!(self.hdr, "in vec4 {};\n", input.glsl_name);
        }

        if self.indirect_outputs() && self.generic_output_range.used {
            let range = self.generic_output_range;
            emit!(
                self.hdr,
                "out block {{ vec4 {}{}[{}]; }} oblk;\n",
                output_name_prefix(self.processor),
                range.first,
                range.len()
            );
        }

        let mut fcolor = [false; 2];
        let mut bcolor = [false; 2];
        for i in 0..self.outputs.len() {
            let out = &self.outputs[i];
            if self.key.color_two_side && out.sid < 2 {
                match out.name {
                    Semantic::Color => fcolor[out.sid as usize] = true,
                    Semantic::BColor => bcolor[out.sid as usize] = true,
                    _ => {}
                }
            }
            self.emit_output_decl(i, true);
        }

        if self.key.color_two_side {
            for i in 0..2 {
                if fcolor[i] && !bcolor[i] {
                    emit!(self.hdr, "{INTERP_PREFIX}out vec4 ex_bc{i};\n");
                }
                if bcolor[i] && !fcolor[i] {
                    emit!(self.hdr, "{INTERP_PREFIX}out vec4 ex_c{i};\n");
                }
            }
        }

        self.emit_winsys_correction();

        if self.has_clipvertex {
            let out = if self.has_clipvertex_so { "out " } else { "" };
            emit!(self.hdr, "{out}vec4 clipv_tmp;\n");
        }
        if self.num_clip_dist != 0 || self.key.clip_plane_enable {
            let (clip, cull) = clip_cull_outputs(self);
            if self.key.clip_plane_enable {
                self.hdr.append("uniform vec4 clipp[8];\n");
            }
            if self.key.gs_present || self.key.tes_present {
                self.vs_has_pervertex = true;
                emit!(
                    self.hdr,
                    "out gl_PerVertex {{\n vec4 gl_Position;\n float gl_PointSize;\n{clip}{cull}}};\n"
                );
            } else {
                emit!(self.hdr, "{clip}{cull}");
            }
            self.hdr.append("vec4 clip_dist_temp[2];\n");
        }
    }

    fn emit_ios_fs(&mut self) {
        if self.fs_emit_layout() {
            let upper_left = (self.fs_coord_origin != 0) == self.key.invert_fs_origin;
            let pixel_center = self.fs_pixel_center != 0;
            let comma = if upper_left && pixel_center { ',' } else { ' ' };
            emit!(
                self.hdr,
                "layout({}{comma}{}) in vec4 gl_FragCoord;\n",
                if upper_left { "origin_upper_left" } else { "" },
                if pixel_center { "pixel_center_integer" } else { "" }
            );
        }
        if self.early_depth_stencil {
            self.hdr.append("layout(early_fragment_tests) in;\n");
        }

        if self.indirect_inputs() && self.generic_input_range.used {
            let range = self.generic_input_range;
            emit!(
                self.hdr,
                "in block {{ vec4 {}{}[{}]; }} blk;\n",
                input_name_prefix(self.processor, self.key),
                range.first,
                range.len()
            );
        }

        for i in 0..self.inputs.len() {
            let input = &self.inputs[i];
            if !input.predefined_no_emit {
                let (interp, aux) = if is_interpolated(input.name) {
                    let interp =
                        interp_string(self.cfg.use_gles, input.interpolate, self.key.flatshade)
                            .unwrap_or("");
                    (interp, aux_string(input.location))
                } else {
                    ("", "")
                };
                emit!(self.hdr, "{interp}{aux}in vec4 {};\n", input.glsl_name);
                if is_interpolated(self.inputs[i].name) {
                    self.num_interps += 1;
                }
            }

            let sid = self.inputs[i].sid;
            if self.cfg.use_gles
                && !self.winsys_adjust_y_emitted
                && self.key.coord_replace & bit(sid) != 0
            {
                self.winsys_adjust_y_emitted = true;
                self.emit_winsys_correction();
            }
        }

        if self.key.color_two_side {
            if self.color_in_mask & 1 != 0 {
                self.hdr.append("vec4 realcolor0;\n");
            }
            if self.color_in_mask & 2 != 0 {
                self.hdr.append("vec4 realcolor1;\n");
            }
        }

        if self.write_all_cbufs {
            for i in 0..self.cfg.max_draw_buffers {
                if self.cfg.use_gles {
                    emit!(self.hdr, "layout (location={i}) out vec4 fsout_c{i};\n");
                } else {
                    emit!(self.hdr, "out vec4 fsout_c{i};\n");
                }
            }
        } else {
            for i in 0..self.outputs.len() {
                self.emit_output_decl(i, false);
            }
        }

        if self.num_in_clip_dist != 0 {
            if self.key.prev_stage_num_clip_out != 0 {
                emit!(
                    self.hdr,
                    "in float gl_ClipDistance[{}];\n",
                    self.key.prev_stage_num_clip_out
                );
            }
            if self.key.prev_stage_num_cull_out != 0 {
                emit!(
                    self.hdr,
                    "in float gl_CullDistance[{}];\n",
                    self.key.prev_stage_num_cull_out
                );
            }
        }
    }

    /// `(clip, cull)` members of the `gl_in[]` block.
    fn clip_cull_inputs(&self) -> (String, String) {
        let clip = match self.key.prev_stage_num_clip_out {
            0 => self.num_in_clip_dist,
            n => n,
        };
        let clip = match clip {
            0 => String::new(),
            n => format!("float gl_ClipDistance[{n}];\n"),
        };
        let cull = match self.key.prev_stage_num_cull_out {
            0 => String::new(),
            n => format!("float gl_CullDistance[{n}];\n"),
        };
        (clip, cull)
    }

    fn emit_ios_gs(&mut self) -> Result<(), TranslateError> {
        let invocations = if self.gs_num_invocations > 1 {
            format!(", invocations = {}", self.gs_num_invocations)
        } else {
            String::new()
        };
        emit!(self.hdr, "layout({}{invocations}) in;\n", prim_name(self.gs_in_prim));
        emit!(
            self.hdr,
            "layout({}, max_vertices = {}) out;\n",
            prim_name(self.gs_out_prim),
            self.gs_max_out_verts
        );

        let has_inputs = self.inputs.iter().any(|v| !v.predefined_no_emit);
        if has_inputs {
            let size = gs_input_prim_size(self.gs_in_prim).ok_or_else(|| {
                TranslateError::Invalid(format!(
                    "geometry input primitive {} has no vertex count",
                    prim_name(self.gs_in_prim)
                ))
            })?;
            for input in self.inputs.iter().filter(|v| !v.predefined_no_emit) {
                emit!(self.hdr, "in vec4 {}[{size}];\n", input.glsl_name);
            }
        }

        for i in 0..self.outputs.len() {
            self.emit_output_decl(i, true);
        }

        self.emit_winsys_correction();

        if self.num_in_clip_dist != 0
            || self.key.clip_plane_enable
            || self.key.prev_stage_pervertex_out
        {
            let (clip, cull) = self.clip_cull_inputs();
            emit!(
                self.hdr,
                "in gl_PerVertex {{\n vec4 gl_Position;\n float gl_PointSize; \n {clip}{cull}\n}} gl_in[];\n"
            );
        }
        if self.num_clip_dist != 0 {
            let (clip, cull) = clip_cull_outputs(self);
            emit!(self.hdr, "{clip}{cull}\n");
            self.hdr.append("vec4 clip_dist_temp[2];\n");
        }
        Ok(())
    }

    fn emit_tess_pervertex(&mut self) {
        if self.num_in_clip_dist != 0 || self.key.prev_stage_pervertex_out {
            let (clip, cull) = self.clip_cull_inputs();
            emit!(
                self.hdr,
                "in gl_PerVertex {{\n vec4 gl_Position;\n float gl_PointSize; \n {clip}{cull}}} gl_in[];\n"
            );
        }
        if self.num_clip_dist != 0 {
            emit!(
                self.hdr,
                "out gl_PerVertex {{\n vec4 gl_Position;\n float gl_PointSize;\n float gl_ClipDistance[{}];\n}} gl_out[];\n",
                self.num_clip_dist
            );
            self.hdr.append("vec4 clip_dist_temp[2];\n");
        }
    }

    fn emit_ios_tcs(&mut self) {
        let in_prefix = input_name_prefix(self.processor, self.key);
        if self.indirect_inputs() && self.generic_input_range.used {
            let range = self.generic_input_range;
            let size = range.len().max(self.key.num_indirect_generic_inputs);
            emit!(
                self.hdr,
                "in block {{ vec4 {in_prefix}{}[{size}]; }} blk[];\n",
                range.first
            );
        }

        for input in self.inputs.iter().filter(|v| !v.predefined_no_emit) {
            let postfix = if input.name == Semantic::Patch { "" } else { "[]" };
            emit!(self.hdr, "in vec4 {}{postfix};\n", input.glsl_name);
        }

        emit!(self.hdr, "layout(vertices = {}) out;\n", self.tcs_vertices_out);

        if self.indirect_outputs() {
            let out_prefix = output_name_prefix(self.processor);
            let generic = self.generic_output_range;
            if generic.used {
                emit!(
                    self.hdr,
                    "out block {{ vec4 {out_prefix}{}[{}]; }} oblk[];\n",
                    generic.first,
                    generic.len()
                );
            }
            let patch = self.patch_output_range;
            if patch.used {
                emit!(
                    self.hdr,
                    "patch out vec4 {out_prefix}p{}[{}];\n",
                    patch.first,
                    patch.len()
                );
            }
        }

        for out in &self.outputs {
            if !out.predefined_no_emit {
                if out.name == Semantic::Patch {
                    emit!(self.hdr, "patch out vec4 {};\n", out.glsl_name);
                } else {
                    emit!(self.hdr, "out vec4 {}[];\n", out.glsl_name);
                }
            } else if out.invariant || out.precise {
                let qualifier = if out.precise { "precise " } else { "invariant " };
                emit!(self.hdr, "{qualifier}{};\n", out.glsl_name);
            }
        }

        self.emit_tess_pervertex();
    }

    fn emit_ios_tes(&mut self) {
        if self.indirect_inputs() {
            let in_prefix = input_name_prefix(self.processor, self.key);
            let patch = self.patch_input_range;
            if patch.used {
                let size = patch.len().max(self.key.num_indirect_patch_inputs);
                emit!(self.hdr, "patch in vec4 {in_prefix}p{}[{size}];\n", patch.first);
            }
            let generic = self.generic_input_range;
            if generic.used {
                let size = generic.len().max(self.key.num_indirect_generic_inputs);
                emit!(
                    self.hdr,
                    "in block {{ vec4 {in_prefix}{}[{size}]; }} blk[];\n",
                    generic.first
                );
            }
        }

        for input in self.inputs.iter().filter(|v| !v.predefined_no_emit) {
            if input.name == Semantic::Patch {
                emit!(self.hdr, "patch in vec4 {};\n", input.glsl_name);
            } else {
                emit!(self.hdr, "in vec4 {}[];\n", input.glsl_name);
            }
        }

        emit!(
            self.hdr,
            "layout({}, {}, {}{}) in;\n",
            tes_prim_name(self.tes_prim_mode),
            spacing_name(self.tes_spacing),
            if self.tes_vertex_order_cw { "cw" } else { "ccw" },
            if self.tes_point_mode { ", point_mode" } else { "" }
        );

        for i in 0..self.outputs.len() {
            self.emit_output_decl(i, true);
        }

        self.emit_winsys_correction();
        self.emit_tess_pervertex();
    }

    fn emit_ios_cs(&mut self) {
        let [x, y, z] = self.local_cs_block_size;
        emit!(
            self.hdr,
            "layout (local_size_x = {x}, local_size_y = {y}, local_size_z = {z}) in;\n"
        );
        if self.req_local_mem != 0 {
            let ty = if self.integer_memory {
                TypeQualifier::Int
            } else {
                TypeQualifier::Uint
            };
            emit!(
                self.hdr,
                "shared {} values[{}];\n",
                ty.as_str(),
                self.req_local_mem / 4
            );
        }
    }

    fn emit_ios_streamout(&mut self) {
        let Some(so) = self.so else {
            return;
        };
        for (i, output) in so.outputs.iter().enumerate() {
            if !self.write_so_outputs.get(i).copied().unwrap_or(false) {
                continue;
            }
            let ty = match output.num_components {
                1 => "float".to_owned(),
                n => format!("vec{n}"),
            };
            if self.processor == Processor::TessCtrl {
                emit!(self.hdr, "out {ty} tfout{i}[];\n");
            } else if output.stream != 0 && self.processor == Processor::Geometry {
                emit!(self.hdr, "layout (stream={}) out {ty} tfout{i};\n", output.stream);
            } else {
                emit!(self.hdr, "out {ty} tfout{i};\n");
            }
        }
    }

    fn emit_sampler_decl(&mut self, i: u32, range: u32) -> Result<(), TranslateError> {
        let SamplerSlot {
            target,
            return_type,
        } = self.samplers[i as usize];
        let (stc, shadow) = sampler_type_conv(self.cfg.use_gles, target).ok_or(
            TranslateError::UnsupportedTextureTarget {
                target,
                context: "sampler declaration",
            },
        )?;
        let sname = self.prefix();
        let precision = if self.cfg.use_gles { "highp " } else { " " };
        let ptc = sampler_return_conv(return_type);

        if self.cfg.use_gles && target == TextureTarget::Tex1D {
            emit!(self.hdr, "uniform highp {ptc}sampler2D {sname}samp{i};\n");
        } else if range != 0 {
            emit!(
                self.hdr,
                "uniform {precision}{ptc}sampler{stc} {sname}samp{i}[{range}];\n"
            );
        } else {
            emit!(self.hdr, "uniform {precision}{ptc}sampler{stc} {sname}samp{i};\n");
        }

        if shadow {
            emit!(self.hdr, "uniform {precision}vec4 {sname}shadmask{i};\n");
            emit!(self.hdr, "uniform {precision}vec4 {sname}shadadd{i};\n");
            self.shadow_samp_mask |= bit(i);
        }
        Ok(())
    }

    fn emit_image_decl(&mut self, i: u32, range: u32) -> Result<(), TranslateError> {
        let image = self.images[i as usize].ok_or_else(|| {
            TranslateError::Invalid(format!("image {i} used without a declaration"))
        })?;
        let (format, itype) = internal_format_string(image.format);
        let (stc, _) = sampler_type_conv(self.cfg.use_gles, image.target).ok_or(
            TranslateError::UnsupportedTextureTarget {
                target: image.target,
                context: "image declaration",
            },
        )?;
        let sname = self.prefix();
        let precision = if self.cfg.use_gles { "highp " } else { "" };
        let ptc = sampler_return_conv(itype);

        let gles_atomic_format = matches!(
            image.format,
            ImageFormat::R32Float | ImageFormat::R32Sint | ImageFormat::R32Uint
        );
        let access = if !image.writable {
            "readonly "
        } else if image.format == ImageFormat::None || (self.cfg.use_gles && !gles_atomic_format) {
            "writeonly "
        } else {
            ""
        };

        if self.cfg.use_gles {
            let sep = if format.is_empty() { "" } else { ", " };
            emit!(self.hdr, "layout(binding={i}{sep}{format}) ");
        } else if !format.is_empty() {
            emit!(self.hdr, "layout({format}) ");
        }

        if range != 0 {
            emit!(
                self.hdr,
                "{access}uniform {precision}{ptc}image{stc} {sname}img{i}[{range}];\n"
            );
        } else {
            emit!(self.hdr, "{access}uniform {precision}{ptc}image{stc} {sname}img{i};\n");
        }
        Ok(())
    }

    fn emit_ios_common(&mut self) -> Result<(), TranslateError> {
        let sname = self.prefix();

        for range in &self.temp_ranges {
            emit!(
                self.hdr,
                "vec4 temp{}[{}];\n",
                range.first,
                range.last - range.first + 1
            );
        }
        if self.write_mul_utemp {
            self.hdr.append("uvec4 mul_utemp;\n");
            self.hdr.append("uvec4 umul_temp;\n");
        }
        if self.write_mul_itemp {
            self.hdr.append("ivec4 mul_itemp;\n");
            self.hdr.append("ivec4 imul_temp;\n");
        }
        if self.ssbo_used_mask != 0 || self.has_file_memory {
            self.hdr.append("uint ssbo_addr_temp;\n");
        }
        if self.reqs.has(ShaderReq::FP64) {
            self.hdr.append("dvec2 fp64_dst[3];\n");
            self.hdr.append("dvec2 fp64_src[4];\n");
        }
        for i in 0..self.num_address {
            emit!(self.hdr, "int addr{i};\n");
        }
        if self.num_consts != 0 {
            emit!(self.hdr, "uniform uvec4 {sname}const0[{}];\n", self.num_consts);
        }

        if self.ubo_used_mask != 0 {
            if self.scan.is_dimension_indirect(File::Constant) {
                self.reqs.require_version(150);
                let first = self.ubo_used_mask.trailing_zeros() as usize;
                emit!(
                    self.hdr,
                    "uniform {sname}ubo {{ vec4 ubocontents[{}]; }} {sname}uboarr[{}];\n",
                    self.ubo_sizes[first],
                    self.ubo_used_mask.count_ones()
                );
            } else {
                for i in set_bits(self.ubo_used_mask) {
                    emit!(
                        self.hdr,
                        "uniform {sname}ubo{i} {{ vec4 {sname}ubo{i}contents[{}]; }};\n",
                        self.ubo_sizes[i as usize]
                    );
                }
            }
        }

        if self.scan.is_indirect(File::Sampler) {
            for array in self.sampler_arrays.clone() {
                self.emit_sampler_decl(array.first, array.size)?;
            }
        } else {
            for i in set_bits(self.samplers_used) {
                self.emit_sampler_decl(i, 0)?;
            }
        }

        if self.scan.is_indirect(File::Image) {
            for array in self.image_arrays.clone() {
                self.emit_image_decl(array.first, array.size)?;
            }
        } else {
            for i in set_bits(self.images_used_mask) {
                self.emit_image_decl(i, 0)?;
            }
        }

        for (i, abo) in self.abos.iter().enumerate() {
            let offset = abo.offset * 4;
            if abo.size > 1 {
                emit!(
                    self.hdr,
                    "layout (binding = {}, offset = {offset}) uniform atomic_uint ac{i}[{}];\n",
                    abo.binding,
                    abo.size
                );
            } else {
                emit!(
                    self.hdr,
                    "layout (binding = {}, offset = {offset}) uniform atomic_uint ac{i};\n",
                    abo.binding
                );
            }
        }

        if self.scan.is_indirect(File::Buffer) {
            for (start, count) in consecutive_ranges(self.ssbo_used_mask) {
                let atomic = if self.ssbo_atomic_mask & bit(start) != 0 { "atomic" } else { "" };
                emit!(
                    self.hdr,
                    "layout (binding = {start}, std430) buffer {sname}ssbo{start} {{ uint {sname}ssbocontents{start}[]; }} {sname}ssboarr{atomic}[{count}];\n"
                );
            }
        } else {
            for id in set_bits(self.ssbo_used_mask) {
                let ty = if self.ssbo_integer_mask & bit(id) != 0 {
                    TypeQualifier::Int
                } else {
                    TypeQualifier::Uint
                };
                emit!(
                    self.hdr,
                    "layout (binding = {id}, std430) buffer {sname}ssbo{id} {{ {} {sname}ssbocontents{id}[]; }};\n",
                    ty.as_str()
                );
            }
        }
        Ok(())
    }
}

/// Indices of the set bits of `mask`, lowest first.
fn set_bits(mut mask: u32) -> impl Iterator<Item = u32> {
    std::iter::from_fn(move || {
        if mask == 0 {
            return None;
        }
        let i = mask.trailing_zeros();
        mask &= mask - 1;
        Some(i)
    })
}

/// `(start, count)` of each run of consecutive set bits.
fn consecutive_ranges(mut mask: u32) -> impl Iterator<Item = (u32, u32)> {
    std::iter::from_fn(move || {
        if mask == 0 {
            return None;
        }
        let start = mask.trailing_zeros();
        let count = (mask >> start).trailing_ones();
        let run = if count >= 32 {
            u32::MAX
        } else {
            ((1u32 << count) - 1) << start
        };
        mask &= !run;
        Some((start, count))
    })
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;
    use vrend_tgsi::{
        DeclImage, FileSet, InterpLocation, Interpolate, PrimType, ReturnType, ScanInfo,
    };

    use super::*;
    use crate::config::{ShaderConfig, ShaderKey, StreamOutput, StreamOutputInfo};
    use crate::context::{Abo, IoVar, TempRange};
    use crate::info::ResourceArray;

    fn output(name: Semantic, sid: u32, glsl_name: &str) -> IoVar {
        let mut var = IoVar::new(name, sid, 0);
        var.glsl_name = glsl_name.to_owned();
        var
    }

    #[test]
    fn bit_iterators() {
        assert_eq!(set_bits(0b1010_0001).collect::<Vec<_>>(), [0, 5, 7]);
        assert_eq!(
            consecutive_ranges(0b0111_0110).collect::<Vec<_>>(),
            [(1, 2), (4, 3)]
        );
        assert_eq!(consecutive_ranges(u32::MAX).collect::<Vec<_>>(), [(0, 32)]);
    }

    #[test]
    fn vertex_outputs_reserve_interpolation_room() {
        let cfg = ShaderConfig::default();
        let key = ShaderKey::default();
        let mut ctx = Context::new(&cfg, &key, None, Processor::Vertex, ScanInfo::default(), 0);
        let mut input = IoVar::new(Semantic::Generic, 0, 0);
        input.glsl_name = "in_0".to_owned();
        ctx.inputs.push(input);
        let mut pos = output(Semantic::Position, 0, "gl_Position");
        pos.predefined_no_emit = true;
        pos.invariant = true;
        ctx.outputs.push(pos);
        ctx.outputs.push(output(Semantic::Generic, 1, "vso_g1"));

        ctx.emit_ios().ok();
        assert_eq!(
            ctx.hdr.as_str(),
            format!(
                "in vec4 in_0;\n\
                 invariant gl_Position;\n\
                 {INTERP_PREFIX}out vec4 vso_g1;\n\
                 uniform float winsys_adjust_y;\n"
            )
        );
        assert_eq!(ctx.num_interps, 1);
    }

    #[test]
    fn vertex_clip_planes_with_downstream_geometry() {
        let cfg = ShaderConfig::default();
        let key = ShaderKey {
            clip_plane_enable: true,
            gs_present: true,
            ..ShaderKey::default()
        };
        let mut ctx = Context::new(&cfg, &key, None, Processor::Vertex, ScanInfo::default(), 0);
        ctx.emit_ios().ok();
        assert_eq!(
            ctx.hdr.as_str(),
            "uniform float winsys_adjust_y;\n\
             uniform vec4 clipp[8];\n\
             out gl_PerVertex {\n vec4 gl_Position;\n float gl_PointSize;\nout float gl_ClipDistance[8];\n};\n\
             vec4 clip_dist_temp[2];\n"
        );
        assert!(ctx.vs_has_pervertex);
    }

    #[test]
    fn fragment_inputs_carry_qualifiers() {
        let cfg = ShaderConfig::default();
        let key = ShaderKey::default();
        let mut ctx = Context::new(&cfg, &key, None, Processor::Fragment, ScanInfo::default(), 0);
        ctx.fs_coord_origin = 1;
        let mut input = IoVar::new(Semantic::Generic, 0, 0);
        input.interpolate = Interpolate::Linear;
        input.location = InterpLocation::Centroid;
        input.glsl_name = "vso_g0".to_owned();
        ctx.inputs.push(input);
        ctx.outputs.push(output(Semantic::Color, 0, "fsout_c0"));

        ctx.emit_ios().ok();
        assert_eq!(
            ctx.hdr.as_str(),
            "noperspective centroid in vec4 vso_g0;\n\
             out vec4 fsout_c0;\n"
        );
        assert_eq!(ctx.num_interps, 1);
    }

    #[test]
    fn fragment_coord_layout_and_broadcast() {
        let cfg = ShaderConfig {
            max_draw_buffers: 2,
            ..ShaderConfig::default()
        };
        let key = ShaderKey {
            pstipple_tex: true,
            ..ShaderKey::default()
        };
        let mut ctx = Context::new(&cfg, &key, None, Processor::Fragment, ScanInfo::default(), 0);
        ctx.fs_pixel_center = 1;
        ctx.write_all_cbufs = true;
        ctx.emit_ios().ok();
        assert_eq!(
            ctx.hdr.as_str(),
            "layout(origin_upper_left,pixel_center_integer) in vec4 gl_FragCoord;\n\
             out vec4 fsout_c0;\n\
             out vec4 fsout_c1;\n\
             uniform sampler2D pstipple_sampler;\nfloat stip_temp;\n"
        );
    }

    #[test]
    fn geometry_layouts() -> anyhow::Result<()> {
        let cfg = ShaderConfig::default();
        let key = ShaderKey::default();
        let mut ctx = Context::new(&cfg, &key, None, Processor::Geometry, ScanInfo::default(), 0);
        ctx.gs_in_prim = PrimType::Triangles;
        ctx.gs_out_prim = PrimType::TriangleStrip;
        ctx.gs_max_out_verts = 3;
        ctx.gs_num_invocations = 2;
        let mut input = IoVar::new(Semantic::Generic, 0, 0);
        input.glsl_name = "vso_g0".to_owned();
        ctx.inputs.push(input);
        let mut out = output(Semantic::Generic, 0, "gso_g0");
        out.stream = 1;
        ctx.outputs.push(out);

        ctx.emit_ios()?;
        assert_eq!(
            ctx.hdr.as_str(),
            format!(
                "layout(triangles, invocations = 2) in;\n\
                 layout(triangle_strip, max_vertices = 3) out;\n\
                 in vec4 vso_g0[3];\n\
                 layout (stream = 1) {INTERP_PREFIX}out vec4 gso_g0;\n\
                 uniform float winsys_adjust_y;\n"
            )
        );
        Ok(())
    }

    #[test]
    fn tess_eval_layout() {
        let cfg = ShaderConfig::default();
        let key = ShaderKey::default();
        let mut ctx = Context::new(&cfg, &key, None, Processor::TessEval, ScanInfo::default(), 0);
        ctx.tes_prim_mode = PrimType::Triangles;
        ctx.tes_vertex_order_cw = true;
        ctx.tes_point_mode = true;
        let mut patch = IoVar::new(Semantic::Patch, 0, 0);
        patch.glsl_name = "tco_p0".to_owned();
        ctx.inputs.push(patch);
        ctx.emit_ios().ok();
        assert_eq!(
            ctx.hdr.as_str(),
            "patch in vec4 tco_p0;\n\
             layout(triangles, fractional_odd_spacing, cw, point_mode) in;\n\
             uniform float winsys_adjust_y;\n"
        );
    }

    #[test]
    fn tess_ctrl_pervertex_blocks() {
        let cfg = ShaderConfig::default();
        let key = ShaderKey {
            prev_stage_pervertex_out: true,
            prev_stage_num_clip_out: 4,
            ..ShaderKey::default()
        };
        let mut ctx = Context::new(&cfg, &key, None, Processor::TessCtrl, ScanInfo::default(), 0);
        ctx.tcs_vertices_out = 4;
        ctx.num_clip_dist = 4;
        ctx.emit_ios().ok();
        assert_eq!(
            ctx.hdr.as_str(),
            "layout(vertices = 4) out;\n\
             in gl_PerVertex {\n vec4 gl_Position;\n float gl_PointSize; \n float gl_ClipDistance[4];\n} gl_in[];\n\
             out gl_PerVertex {\n vec4 gl_Position;\n float gl_PointSize;\n float gl_ClipDistance[4];\n} gl_out[];\n\
             vec4 clip_dist_temp[2];\n"
        );
    }

    #[test]
    fn compute_shared_memory() {
        let cfg = ShaderConfig::default();
        let key = ShaderKey::default();
        let mut ctx = Context::new(&cfg, &key, None, Processor::Compute, ScanInfo::default(), 64);
        ctx.local_cs_block_size = [8, 4, 1];
        ctx.integer_memory = true;
        ctx.has_file_memory = true;
        ctx.emit_ios().ok();
        assert_eq!(
            ctx.hdr.as_str(),
            "layout (local_size_x = 8, local_size_y = 4, local_size_z = 1) in;\n\
             shared int values[16];\n\
             uint ssbo_addr_temp;\n"
        );
    }

    #[test]
    fn streamout_declarations() {
        let cfg = ShaderConfig::default();
        let key = ShaderKey::default();
        let so = StreamOutputInfo {
            outputs: vec![
                StreamOutput {
                    num_components: 1,
                    ..StreamOutput::default()
                },
                StreamOutput {
                    num_components: 3,
                    stream: 2,
                    ..StreamOutput::default()
                },
            ],
        };
        let mut ctx = Context::new(&cfg, &key, Some(&so), Processor::Geometry, ScanInfo::default(), 0);
        ctx.write_so_outputs = vec![true, true];
        ctx.emit_ios_streamout();
        assert_eq!(
            ctx.hdr.as_str(),
            "out float tfout0;\n\
             layout (stream=2) out vec3 tfout1;\n"
        );
    }

    #[test]
    fn common_resources() -> anyhow::Result<()> {
        let cfg = ShaderConfig::default();
        let key = ShaderKey::default();
        let mut ctx = Context::new(&cfg, &key, None, Processor::Fragment, ScanInfo::default(), 0);
        ctx.temp_ranges.push(TempRange {
            first: 0,
            last: 3,
            array_id: 0,
        });
        ctx.num_address = 1;
        ctx.num_consts = 4;
        ctx.ubo_used_mask = 0b10;
        ctx.ubo_sizes[1] = 16;
        ctx.samplers_used = 0b101;
        ctx.samplers[2].target = TextureTarget::Shadow2D;
        ctx.samplers[2].return_type = ReturnType::Float;
        ctx.samplers[0].return_type = ReturnType::Uint;
        ctx.abos.push(Abo {
            binding: 0,
            size: 1,
            offset: 2,
        });
        ctx.ssbo_used_mask = 0b1;
        ctx.ssbo_integer_mask = 0b1;

        ctx.emit_ios_common()?;
        assert_eq!(
            ctx.hdr.as_str(),
            "vec4 temp0[4];\n\
             uint ssbo_addr_temp;\n\
             int addr0;\n\
             uniform uvec4 fsconst0[4];\n\
             uniform fsubo1 { vec4 fsubo1contents[16]; };\n\
             uniform  usampler2D fssamp0;\n\
             uniform   sampler2DShadow fssamp2;\n\
             uniform  vec4 fsshadmask2;\n\
             uniform  vec4 fsshadadd2;\n\
             layout (binding = 0, offset = 8) uniform atomic_uint ac0;\n\
             layout (binding = 0, std430) buffer fsssbo0 { int fsssbocontents0[]; };\n"
        );
        assert_eq!(ctx.shadow_samp_mask, 0b100);
        Ok(())
    }

    #[test]
    fn indirect_resources_use_arrays() -> anyhow::Result<()> {
        let cfg = ShaderConfig::default();
        let key = ShaderKey::default();
        let scan = ScanInfo {
            indirect_files: FileSet::SAMPLER | FileSet::BUFFER | FileSet::IMAGE,
            dimension_indirect_files: FileSet::CONSTANT,
            ..ScanInfo::default()
        };
        let mut ctx = Context::new(&cfg, &key, None, Processor::Vertex, scan, 0);
        ctx.ubo_used_mask = 0b110;
        ctx.ubo_sizes[1] = 8;
        ctx.sampler_arrays.push(ResourceArray { first: 0, size: 3 });
        ctx.images[1] = Some(DeclImage {
            target: TextureTarget::Tex2D,
            format: ImageFormat::R32Float,
            writable: false,
        });
        ctx.image_arrays.push(ResourceArray { first: 1, size: 2 });
        ctx.ssbo_used_mask = 0b1101;
        ctx.ssbo_atomic_mask = 0b1000;

        ctx.emit_ios_common()?;
        assert_eq!(
            ctx.hdr.as_str(),
            "uint ssbo_addr_temp;\n\
             uniform vsubo { vec4 ubocontents[8]; } vsuboarr[2];\n\
             uniform   sampler2D vssamp0[3];\n\
             layout(r32f) readonly uniform  image2D vsimg1[2];\n\
             layout (binding = 0, std430) buffer vsssbo0 { uint vsssbocontents0[]; } vsssboarr[1];\n\
             layout (binding = 2, std430) buffer vsssbo2 { uint vsssbocontents2[]; } vsssboarr[2];\n"
        );
        assert_eq!(ctx.reqs.version(), 150);
        Ok(())
    }

    #[test]
    fn unknown_sampler_target_is_rejected() {
        let cfg = ShaderConfig::default();
        let key = ShaderKey::default();
        let mut ctx = Context::new(&cfg, &key, None, Processor::Fragment, ScanInfo::default(), 0);
        ctx.samplers_used = 1;
        ctx.samplers[0].target = TextureTarget::Unknown;
        assert!(matches!(
            ctx.emit_ios_common(),
            Err(TranslateError::UnsupportedTextureTarget {
                context: "sampler declaration",
                ..
            })
        ));
    }
}

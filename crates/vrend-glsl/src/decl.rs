//! Declaration, property and immediate tokens.

use tracing::{debug, warn};
use vrend_tgsi::{
    DeclImage, DeclSamplerView, Declaration, File, Immediate, ImmediateType, InterpLocation,
    Interpolate, Processor, Property, ReturnType, Semantic, TextureTarget,
};

use crate::context::{
    bit, Abo, Context, IoVar, TempRange, MAX_ABOS, MAX_BUFFERS, MAX_IMAGES, MAX_IMMEDIATES,
    MAX_INPUTS, MAX_OUTPUTS, MAX_SAMPLERS, MAX_SYSTEM_VALUES, MAX_UBOS,
};
use crate::error::{invalid, TranslateError};
use crate::info::ResourceArray;
use crate::require::ShaderReq;
use crate::tables::{input_name_prefix, output_name_prefix};

const POINT_COORD_GLES: &str = "vec4(gl_PointCoord.x, mix(1.0 - gl_PointCoord.y, gl_PointCoord.y, clamp(winsys_adjust_y, 0.0, 1.0)), 0.0, 1.0)";
const POINT_COORD: &str = "vec4(gl_PointCoord, 0.0, 1.0)";

fn capacity(kind: &'static str, index: usize, max: usize) -> TranslateError {
    TranslateError::CapacityExceeded {
        kind,
        index: index as u32,
        max: max as u32,
    }
}

fn is_pre_raster(processor: Processor) -> bool {
    matches!(
        processor,
        Processor::Geometry | Processor::TessCtrl | Processor::TessEval
    )
}

/// Name a varying from its prefix, semantic and index.
fn varying_name(prefix: &str, var: &IoVar, with_bcolor: bool) -> String {
    if var.no_index {
        return prefix.to_owned();
    }
    match var.name {
        Semantic::Fog => format!("{prefix}_f{}", var.sid),
        Semantic::Color => format!("{prefix}_c{}", var.sid),
        Semantic::BColor if with_bcolor => format!("{prefix}_bc{}", var.sid),
        Semantic::Generic => format!("{prefix}_g{}", var.sid),
        Semantic::Patch => format!("{prefix}_p{}", var.sid),
        _ => format!("{prefix}_{}", var.first),
    }
}

impl Context<'_> {
    pub fn declare(&mut self, decl: &Declaration) -> Result<(), TranslateError> {
        if decl.first > decl.last {
            return Err(invalid(format!(
                "{} declaration range {}..{} is reversed",
                decl.file, decl.first, decl.last
            )));
        }
        match decl.file {
            File::Input => self.declare_input(decl),
            File::Output => self.declare_output(decl),
            File::Temporary => self.declare_temps(decl),
            File::Sampler => {
                for i in decl.first..=decl.last.min(31) {
                    self.samplers_used |= bit(i);
                }
                Ok(())
            }
            File::SamplerView => self.declare_sampler_views(decl),
            File::Image => self.declare_images(decl),
            File::Buffer => self.declare_buffer(decl),
            File::Constant => self.declare_constants(decl),
            File::Address => {
                self.num_address = decl.last + 1;
                Ok(())
            }
            File::SystemValue => self.declare_system_value(decl),
            File::Memory => {
                self.has_file_memory = true;
                Ok(())
            }
            File::HwAtomic => {
                if self.abos.len() >= MAX_ABOS {
                    return Err(capacity("atomic counter buffers", self.abos.len(), MAX_ABOS));
                }
                self.abos.push(Abo {
                    binding: decl.dimension.unwrap_or(0),
                    size: decl.last - decl.first + 1,
                    offset: decl.first,
                });
                Ok(())
            }
            file @ (File::Null | File::Immediate) => Err(TranslateError::UnsupportedFile { file }),
        }
    }

    fn declare_temps(&mut self, decl: &Declaration) -> Result<(), TranslateError> {
        if let Some(other) = self
            .temp_ranges
            .iter()
            .find(|r| decl.first <= r.last && r.first <= decl.last)
        {
            return Err(invalid(format!(
                "temporaries {}..{} overlap the range declared at {}..{}",
                decl.first, decl.last, other.first, other.last
            )));
        }
        self.temp_ranges.push(TempRange {
            first: decl.first,
            last: decl.last,
            array_id: decl.array_id,
        });
        Ok(())
    }

    fn push_input(&mut self, var: IoVar) -> Result<usize, TranslateError> {
        if self.inputs.len() >= MAX_INPUTS {
            return Err(capacity("inputs", self.inputs.len(), MAX_INPUTS));
        }
        self.inputs.push(var);
        Ok(self.inputs.len() - 1)
    }

    fn declare_input(&mut self, decl: &Declaration) -> Result<(), TranslateError> {
        let (name, sid) = semantic_of(decl);
        if self
            .inputs
            .iter()
            .any(|v| v.name == name && v.sid == sid && v.first == decl.first)
        {
            return Ok(());
        }

        let processor = self.processor;
        let indirect = self.indirect_inputs();
        let mut var = IoVar::new(name, sid, decl.first);
        var.interpolate = decl.interpolate;
        var.location = decl.location;

        if processor == Processor::Vertex {
            self.attrib_input_mask |= bit(decl.first);
        }
        if processor == Processor::Fragment && decl.location == InterpLocation::Sample {
            self.reqs.require(ShaderReq::GPU_SHADER5);
            self.has_sample_input = true;
        }

        let fs = processor == Processor::Fragment;
        let pre_raster = is_pre_raster(processor);
        let mut two_side = false;

        let prefix: &str = match name {
            Semantic::Color if fs => {
                if self.reqs.version() < 140 {
                    var.no_index = true;
                    match sid {
                        0 => "gl_Color",
                        1 => "gl_SecondaryColor",
                        _ => return Err(invalid(format!("illegal color semantic index {sid}"))),
                    }
                } else {
                    two_side = self.key.color_two_side;
                    "ex"
                }
            }
            Semantic::PrimId if processor == Processor::Geometry => {
                var.predefined_no_emit = true;
                var.no_index = true;
                var.override_no_wm = true;
                self.reqs.require(ShaderReq::INTS);
                "gl_PrimitiveIDIn"
            }
            Semantic::PrimId if fs => {
                var.predefined_no_emit = true;
                var.no_index = true;
                self.reqs.require_version(150);
                "gl_PrimitiveID"
            }
            Semantic::ViewportIndex if fs => {
                var.predefined_no_emit = true;
                var.no_index = true;
                var.is_int = true;
                var.override_no_wm = true;
                if self.reqs.version() >= 140 {
                    self.reqs.require(ShaderReq::LAYER);
                }
                "gl_ViewportIndex"
            }
            Semantic::Layer if fs => {
                var.predefined_no_emit = true;
                var.no_index = true;
                var.is_int = true;
                var.override_no_wm = true;
                self.reqs.require(ShaderReq::LAYER);
                "gl_Layer"
            }
            Semantic::PSize if pre_raster => {
                var.predefined_no_emit = true;
                var.no_index = true;
                var.override_no_wm = true;
                var.gl_block = true;
                self.reqs.require(ShaderReq::PSIZE);
                "gl_PointSize"
            }
            Semantic::ClipDist if pre_raster || fs => {
                var.predefined_no_emit = true;
                var.no_index = true;
                var.gl_block = pre_raster;
                self.num_in_clip_dist += 4;
                "gl_ClipDistance"
            }
            Semantic::Position if pre_raster => {
                var.predefined_no_emit = true;
                var.no_index = true;
                var.gl_block = true;
                "gl_Position"
            }
            Semantic::Position if fs => {
                var.predefined_no_emit = true;
                var.no_index = true;
                "gl_FragCoord"
            }
            Semantic::Face if fs => {
                if self.front_face_emitted {
                    return Ok(());
                }
                var.predefined_no_emit = true;
                var.no_index = true;
                self.front_face_emitted = true;
                "gl_FrontFacing"
            }
            Semantic::Generic | Semantic::Patch if fs && self.key.coord_replace & bit(sid) != 0 => {
                var.predefined_no_emit = true;
                var.no_index = true;
                if self.cfg.use_gles {
                    POINT_COORD_GLES
                } else {
                    POINT_COORD
                }
            }
            Semantic::Patch if indirect => {
                var.predefined_no_emit = true;
                let record = self.inputs.len();
                self.patch_input_range.include(sid, record);
                input_name_prefix(processor, self.key)
            }
            Semantic::Generic if indirect => {
                var.predefined_no_emit = true;
                let record = self.inputs.len();
                self.generic_input_range.include(sid, record);
                input_name_prefix(processor, self.key)
            }
            _ => input_name_prefix(processor, self.key),
        };

        var.glsl_name = varying_name(prefix, &var, false);
        self.push_input(var)?;

        if two_side {
            let mut back = IoVar::new(Semantic::BColor, sid, decl.first);
            back.interpolate = decl.interpolate;
            back.location = decl.location;
            back.glsl_name = format!("{prefix}_bc{sid}");
            self.push_input(back)?;
            self.color_in_mask |= bit(sid);

            if !self.front_face_emitted {
                let mut face = IoVar::new(Semantic::Face, 0, 0);
                face.interpolate = Interpolate::Constant;
                face.location = InterpLocation::Center;
                face.predefined_no_emit = true;
                face.no_index = true;
                face.glsl_name = "gl_FrontFacing".to_owned();
                self.push_input(face)?;
                self.front_face_emitted = true;
            }
        }
        Ok(())
    }

    fn declare_output(&mut self, decl: &Declaration) -> Result<(), TranslateError> {
        let (name, sid) = semantic_of(decl);
        if self
            .outputs
            .iter()
            .any(|v| v.name == name && v.sid == sid && v.first == decl.first)
        {
            return Ok(());
        }
        if self.outputs.len() >= MAX_OUTPUTS {
            return Err(capacity("outputs", self.outputs.len(), MAX_OUTPUTS));
        }

        let processor = self.processor;
        let indirect = self.indirect_outputs();
        let mut var = IoVar::new(name, sid, decl.first);
        var.interpolate = decl.interpolate;
        var.invariant = decl.invariant;

        let fs = processor == Processor::Fragment;
        let vs = processor == Processor::Vertex;
        let gs = processor == Processor::Geometry;
        let tcs = processor == Processor::TessCtrl;
        let geometry_stage = vs || is_pre_raster(processor);

        let prefix: &str = match name {
            Semantic::Position if geometry_stage => {
                if decl.first > 0 {
                    warn!(first = decl.first, "position output is not register 0");
                }
                var.predefined_no_emit = true;
                var.no_index = true;
                var.gl_block = tcs;
                "gl_Position"
            }
            Semantic::Position if fs => {
                var.predefined_no_emit = true;
                var.no_index = true;
                var.override_no_wm = true;
                "gl_FragDepth"
            }
            Semantic::Stencil if fs => {
                var.predefined_no_emit = true;
                var.no_index = true;
                var.override_no_wm = true;
                var.is_int = true;
                self.reqs.require(ShaderReq::INTS | ShaderReq::STENCIL_EXPORT);
                "gl_FragStencilRefARB"
            }
            Semantic::ClipDist => {
                var.predefined_no_emit = true;
                var.no_index = true;
                var.gl_block = tcs;
                self.num_clip_dist += 4;
                if vs && (self.key.gs_present || self.key.tcs_present) {
                    self.reqs.require_version(150);
                }
                "gl_ClipDistance"
            }
            Semantic::ClipVertex => {
                var.predefined_no_emit = true;
                var.no_index = true;
                var.override_no_wm = true;
                if self.reqs.version() >= 140 {
                    self.has_clipvertex = true;
                }
                "gl_ClipVertex"
            }
            Semantic::SampleMask if fs => {
                var.predefined_no_emit = true;
                var.no_index = true;
                var.override_no_wm = true;
                var.is_int = true;
                self.reqs.require(ShaderReq::INTS | ShaderReq::SAMPLE_SHADING);
                "gl_SampleMask"
            }
            Semantic::Color | Semantic::BColor if vs => {
                if self.reqs.version() < 140 {
                    var.no_index = true;
                    let back = name == Semantic::BColor;
                    match (back, sid) {
                        (false, 0) => "gl_FrontColor",
                        (false, 1) => "gl_FrontSecondaryColor",
                        (true, 0) => "gl_BackColor",
                        (true, 1) => "gl_BackSecondaryColor",
                        _ => return Err(invalid(format!("illegal color semantic index {sid}"))),
                    }
                } else {
                    "ex"
                }
            }
            Semantic::PSize if geometry_stage => {
                var.predefined_no_emit = true;
                var.no_index = true;
                var.override_no_wm = true;
                var.gl_block = tcs;
                self.reqs.require(ShaderReq::PSIZE);
                "gl_PointSize"
            }
            Semantic::Layer | Semantic::PrimId | Semantic::ViewportIndex if gs => {
                var.predefined_no_emit = true;
                var.no_index = true;
                var.override_no_wm = true;
                var.is_int = true;
                match name {
                    Semantic::Layer => "gl_Layer",
                    Semantic::PrimId => "gl_PrimitiveID",
                    _ => {
                        if self.reqs.version() >= 140 {
                            self.reqs.require(ShaderReq::VIEWPORT_IDX);
                        }
                        "gl_ViewportIndex"
                    }
                }
            }
            Semantic::TessOuter | Semantic::TessInner if tcs => {
                var.predefined_no_emit = true;
                var.no_index = true;
                var.override_no_wm = true;
                if name == Semantic::TessOuter {
                    "gl_TessLevelOuter"
                } else {
                    "gl_TessLevelInner"
                }
            }
            Semantic::Generic if indirect => {
                var.predefined_no_emit = true;
                self.reqs.require_version(150);
                let record = self.outputs.len();
                self.generic_output_range.include(sid, record);
                output_name_prefix(processor)
            }
            Semantic::Patch if indirect => {
                var.predefined_no_emit = true;
                self.reqs.require_version(150);
                let record = self.outputs.len();
                self.patch_output_range.include(sid, record);
                output_name_prefix(processor)
            }
            _ => output_name_prefix(processor),
        };

        var.glsl_name = varying_name(prefix, &var, true);
        self.outputs.push(var);
        Ok(())
    }

    fn declare_sampler_views(&mut self, decl: &Declaration) -> Result<(), TranslateError> {
        if decl.last as usize >= MAX_SAMPLERS {
            return Err(capacity("sampler views", decl.last as usize, MAX_SAMPLERS));
        }
        let DeclSamplerView {
            target,
            return_type,
        } = decl
            .sampler_view
            .ok_or_else(|| invalid("sampler view declaration without a resource"))?;

        if matches!(return_type, ReturnType::Sint | ReturnType::Uint) {
            self.reqs.require(ShaderReq::INTS);
        }
        for slot in &mut self.samplers[decl.first as usize..=decl.last as usize] {
            slot.target = target;
            slot.return_type = return_type;
        }

        if self.scan.is_indirect(File::Sampler) {
            let slots = &self.samplers;
            let extend = self.sampler_arrays.last_mut().filter(|array| {
                let head = slots[array.first as usize];
                array.first + array.size == decl.first
                    && head.target == target
                    && head.return_type == return_type
            });
            match extend {
                Some(array) => array.size += decl.last - decl.first + 1,
                None => self.sampler_arrays.push(ResourceArray {
                    first: decl.first,
                    size: decl.last - decl.first + 1,
                }),
            }
        }
        Ok(())
    }

    fn declare_images(&mut self, decl: &Declaration) -> Result<(), TranslateError> {
        self.reqs.require(ShaderReq::IMAGE_LOAD_STORE);
        if decl.last as usize >= MAX_IMAGES {
            return Err(capacity("images", decl.last as usize, MAX_IMAGES));
        }
        let image: DeclImage = decl
            .image
            .ok_or_else(|| invalid("image declaration without a resource"))?;

        for i in decl.first..=decl.last {
            self.images[i as usize] = Some(image);
            self.images_used_mask |= bit(i);
            match image.target {
                TextureTarget::CubeArray => self.reqs.require(ShaderReq::CUBE_ARRAY),
                TextureTarget::Msaa2D | TextureTarget::ArrayMsaa2D => {
                    self.reqs.require(ShaderReq::SAMPLER_MS)
                }
                TextureTarget::Buffer => self.uses_sampler_buf = true,
                TextureTarget::Rect => self.reqs.require(ShaderReq::SAMPLER_RECT),
                _ => {}
            }
        }

        if self.scan.is_indirect(File::Image) {
            let images = &self.images;
            let extend = self.image_arrays.last_mut().filter(|array| {
                array.first + array.size == decl.first
                    && images[array.first as usize] == Some(image)
            });
            match extend {
                Some(array) => array.size += decl.last - decl.first + 1,
                None => self.image_arrays.push(ResourceArray {
                    first: decl.first,
                    size: decl.last - decl.first + 1,
                }),
            }
        }
        Ok(())
    }

    fn declare_buffer(&mut self, decl: &Declaration) -> Result<(), TranslateError> {
        if decl.first >= MAX_BUFFERS {
            return Err(capacity("buffers", decl.first as usize, MAX_BUFFERS as usize));
        }
        self.ssbo_used_mask |= 1 << decl.first;
        if decl.atomic {
            self.ssbo_atomic_array_base = self.ssbo_atomic_array_base.min(decl.first);
            self.ssbo_atomic_mask |= 1 << decl.first;
        } else {
            self.ssbo_array_base = self.ssbo_array_base.min(decl.first);
        }
        Ok(())
    }

    fn declare_constants(&mut self, decl: &Declaration) -> Result<(), TranslateError> {
        match decl.dimension {
            Some(slot) if slot != 0 => {
                if slot >= MAX_UBOS {
                    return Err(capacity("uniform buffers", slot as usize, MAX_UBOS as usize));
                }
                if self.ubo_used_mask & (1 << slot) != 0 {
                    return Err(TranslateError::DuplicateUbo(slot));
                }
                self.ubo_used_mask |= 1 << slot;
                self.ubo_sizes[slot as usize] = decl.last + 1;
            }
            _ => {
                self.ubo_base = 1;
                if decl.last != 0 {
                    self.num_consts = self.num_consts.max(decl.last + 1);
                } else {
                    self.num_consts += 1;
                }
            }
        }
        Ok(())
    }

    fn declare_system_value(&mut self, decl: &Declaration) -> Result<(), TranslateError> {
        if self.system_values.len() >= MAX_SYSTEM_VALUES {
            return Err(capacity(
                "system values",
                self.system_values.len(),
                MAX_SYSTEM_VALUES,
            ));
        }
        let (name, sid) = semantic_of(decl);
        let mut var = IoVar::new(name, sid, decl.first);
        var.predefined_no_emit = true;
        var.no_index = true;
        var.override_no_wm = true;

        let glsl_name = match name {
            Semantic::InstanceId => {
                self.reqs.require(ShaderReq::INSTANCE_ID | ShaderReq::INTS);
                "gl_InstanceID"
            }
            Semantic::VertexId => {
                self.reqs.require(ShaderReq::INTS);
                "gl_VertexID"
            }
            Semantic::HelperInvocation => {
                self.reqs.require(ShaderReq::ES31_COMPAT);
                "gl_HelperInvocation"
            }
            Semantic::SampleId => {
                self.reqs.require(ShaderReq::SAMPLE_SHADING | ShaderReq::INTS);
                "gl_SampleID"
            }
            Semantic::SamplePos => {
                self.reqs.require(ShaderReq::SAMPLE_SHADING);
                "gl_SamplePosition"
            }
            Semantic::InvocationId => {
                self.reqs.require(ShaderReq::INTS | ShaderReq::GPU_SHADER5);
                "gl_InvocationID"
            }
            Semantic::SampleMask => {
                self.reqs.require(ShaderReq::INTS | ShaderReq::GPU_SHADER5);
                "gl_SampleMaskIn[0]"
            }
            Semantic::PrimId => {
                self.reqs.require(ShaderReq::INTS | ShaderReq::GPU_SHADER5);
                "gl_PrimitiveID"
            }
            Semantic::TessCoord => {
                var.override_no_wm = false;
                "gl_TessCoord"
            }
            Semantic::VerticesIn => {
                self.reqs.require(ShaderReq::INTS);
                "gl_PatchVerticesIn"
            }
            Semantic::TessOuter => "gl_TessLevelOuter",
            Semantic::TessInner => "gl_TessLevelInner",
            Semantic::ThreadId => {
                var.override_no_wm = false;
                "gl_LocalInvocationID"
            }
            Semantic::BlockId => {
                var.override_no_wm = false;
                "gl_WorkGroupID"
            }
            Semantic::GridSize => {
                var.override_no_wm = false;
                "gl_NumWorkGroups"
            }
            semantic => return Err(TranslateError::UnknownSystemValue { semantic }),
        };
        var.glsl_name = glsl_name.to_owned();
        self.system_values.push(var);
        Ok(())
    }

    pub fn property(&mut self, prop: &Property) {
        match *prop {
            Property::FsColor0WritesAllCbufs(v) => {
                if v == 1 {
                    self.write_all_cbufs = true;
                }
            }
            Property::FsCoordOrigin(v) => self.fs_coord_origin = v,
            Property::FsCoordPixelCenter(v) => self.fs_pixel_center = v,
            Property::GsInputPrim(p) => self.gs_in_prim = p,
            Property::GsOutputPrim(p) => self.gs_out_prim = p,
            Property::GsMaxOutputVertices(v) => self.gs_max_out_verts = v,
            Property::GsInvocations(v) => self.gs_num_invocations = v,
            Property::NumClipdistEnabled(v) => self.num_clip_dist_prop = v,
            Property::NumCulldistEnabled(v) => self.num_cull_dist_prop = v,
            Property::TcsVerticesOut(v) => self.tcs_vertices_out = v,
            Property::TesPrimMode(p) => self.tes_prim_mode = p,
            Property::TesSpacing(s) => self.tes_spacing = s,
            Property::TesVertexOrderCw(cw) => self.tes_vertex_order_cw = cw,
            Property::TesPointMode(on) => self.tes_point_mode = on,
            Property::FsEarlyDepthStencil(v) => {
                self.early_depth_stencil = v > 0;
                if self.early_depth_stencil {
                    self.reqs.require_version(150);
                    self.reqs.require(ShaderReq::IMAGE_LOAD_STORE);
                }
            }
            Property::CsFixedBlockWidth(v) => self.local_cs_block_size[0] = v,
            Property::CsFixedBlockHeight(v) => self.local_cs_block_size[1] = v,
            Property::CsFixedBlockDepth(v) => self.local_cs_block_size[2] = v,
            Property::VsWindowSpacePosition(_) => {
                debug!("ignoring window space position property");
            }
        }
    }

    pub fn immediate_token(&mut self, imm: &Immediate) -> Result<(), TranslateError> {
        if self.immediates.len() >= MAX_IMMEDIATES {
            return Err(capacity("immediates", self.immediates.len(), MAX_IMMEDIATES));
        }
        if imm.data_type != ImmediateType::Float32 {
            self.reqs.require(ShaderReq::INTS);
        }
        self.immediates.push(*imm);
        Ok(())
    }
}

fn semantic_of(decl: &Declaration) -> (Semantic, u32) {
    decl.semantic
        .map_or((Semantic::Generic, 0), |s| (s.name, s.index))
}

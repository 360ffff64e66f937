//! Mutable state threaded through one shader translation.

use vrend_tgsi::{
    DeclImage, File, Immediate, InterpLocation, Interpolate, PrimType, Processor, ReturnType,
    ScanInfo, Semantic, Spacing, TextureTarget,
};

use crate::config::{ShaderConfig, ShaderKey, StreamOutputInfo};
use crate::error::TranslateError;
use crate::info::ResourceArray;
use crate::require::Requirements;
use crate::strbuf::StrBuf;

pub(crate) const MAX_INPUTS: usize = 64;
pub(crate) const MAX_OUTPUTS: usize = 64;
pub(crate) const MAX_SYSTEM_VALUES: usize = 32;
pub(crate) const MAX_IMMEDIATES: usize = 1024;
pub(crate) const MAX_SAMPLERS: usize = 32;
pub(crate) const MAX_IMAGES: usize = 32;
pub(crate) const MAX_BUFFERS: u32 = 32;
pub(crate) const MAX_UBOS: u32 = 32;
pub(crate) const MAX_ABOS: usize = 32;

/// One declared input, output or system value.
#[derive(Debug, Clone, PartialEq)]
pub(crate) struct IoVar {
    pub name: Semantic,
    pub sid: u32,
    /// First register index of the declaration.
    pub first: u32,
    pub interpolate: Interpolate,
    pub location: InterpLocation,
    pub invariant: bool,
    pub precise: bool,
    /// Maps to a GLSL builtin or block member that must not be redeclared.
    pub predefined_no_emit: bool,
    /// The GLSL name is used verbatim, without a semantic index suffix.
    pub no_index: bool,
    /// Member of `gl_in[]`/`gl_out[]`.
    pub gl_block: bool,
    /// Scalar builtin; the destination write mask is dropped.
    pub override_no_wm: bool,
    pub is_int: bool,
    pub fbfetch_used: bool,
    pub glsl_name: String,
    pub stream: u32,
}

impl IoVar {
    pub fn new(name: Semantic, sid: u32, first: u32) -> Self {
        Self {
            name,
            sid,
            first,
            interpolate: Interpolate::default(),
            location: InterpLocation::default(),
            invariant: false,
            precise: false,
            predefined_no_emit: false,
            no_index: false,
            gl_block: false,
            override_no_wm: false,
            is_int: false,
            fbfetch_used: false,
            glsl_name: String::new(),
            stream: 0,
        }
    }
}

/// A `DCL TEMP[first..last]` range, emitted as `vec4 temp<first>[n]`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct TempRange {
    pub first: u32,
    pub last: u32,
    pub array_id: u32,
}

/// Semantic index span of indirectly addressed generic or patch varyings.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub(crate) struct IoRange {
    pub first: u32,
    pub last: u32,
    /// Position of the record that opened the range in the input/output list.
    pub array_id: u32,
    pub used: bool,
}

impl IoRange {
    pub fn include(&mut self, sid: u32, record: usize) {
        if !self.used || sid < self.first {
            self.first = sid;
            self.array_id = record as u32;
            self.used = true;
        }
        if sid > self.last {
            self.last = sid;
        }
    }

    pub fn len(&self) -> u32 {
        self.last - self.first + 1
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct SamplerSlot {
    pub target: TextureTarget,
    pub return_type: ReturnType,
}

impl Default for SamplerSlot {
    fn default() -> Self {
        Self {
            target: TextureTarget::Tex2D,
            return_type: ReturnType::Float,
        }
    }
}

/// Atomic counter buffer range.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct Abo {
    pub binding: u32,
    pub size: u32,
    pub offset: u32,
}

pub(crate) struct Context<'a> {
    pub cfg: &'a ShaderConfig,
    pub key: &'a ShaderKey,
    pub so: Option<&'a StreamOutputInfo>,
    pub processor: Processor,
    pub scan: ScanInfo,
    pub req_local_mem: u32,

    pub body: StrBuf,
    pub hdr: StrBuf,
    pub reqs: Requirements,
    pub instno: u32,

    pub inputs: Vec<IoVar>,
    pub outputs: Vec<IoVar>,
    pub system_values: Vec<IoVar>,
    pub attrib_input_mask: u32,
    pub num_interps: u32,

    pub generic_input_range: IoRange,
    pub patch_input_range: IoRange,
    pub generic_output_range: IoRange,
    pub patch_output_range: IoRange,

    pub temp_ranges: Vec<TempRange>,
    pub immediates: Vec<Immediate>,

    pub samplers: [SamplerSlot; MAX_SAMPLERS],
    pub samplers_used: u32,
    pub sampler_arrays: Vec<ResourceArray>,
    pub shadow_samp_mask: u32,

    pub images: [Option<DeclImage>; MAX_IMAGES],
    pub images_used_mask: u32,
    pub image_arrays: Vec<ResourceArray>,

    pub ssbo_used_mask: u32,
    pub ssbo_atomic_mask: u32,
    pub ssbo_integer_mask: u32,
    pub ssbo_array_base: u32,
    pub ssbo_atomic_array_base: u32,

    pub ubo_base: u32,
    pub ubo_used_mask: u32,
    pub ubo_sizes: [u32; MAX_UBOS as usize],
    pub num_consts: u32,
    pub num_address: u32,
    pub abos: Vec<Abo>,

    pub num_in_clip_dist: u32,
    pub num_clip_dist: u32,
    pub num_clip_dist_prop: u32,
    pub num_cull_dist_prop: u32,

    pub color_in_mask: u32,
    pub front_face_emitted: bool,
    pub has_clipvertex: bool,
    pub has_clipvertex_so: bool,
    pub write_all_cbufs: bool,
    pub uses_sampler_buf: bool,
    pub has_file_memory: bool,
    pub integer_memory: bool,
    pub write_mul_utemp: bool,
    pub write_mul_itemp: bool,
    pub has_sample_input: bool,
    pub vs_has_pervertex: bool,
    pub winsys_adjust_y_emitted: bool,

    pub fs_coord_origin: u32,
    pub fs_pixel_center: u32,
    pub early_depth_stencil: bool,
    pub gs_in_prim: PrimType,
    pub gs_out_prim: PrimType,
    pub gs_max_out_verts: u32,
    pub gs_num_invocations: u32,
    pub tcs_vertices_out: u32,
    pub tes_prim_mode: PrimType,
    pub tes_spacing: Spacing,
    pub tes_vertex_order_cw: bool,
    pub tes_point_mode: bool,
    pub local_cs_block_size: [u32; 3],

    pub write_so_outputs: Vec<bool>,
    pub so_names: Vec<Option<String>>,
}

impl<'a> Context<'a> {
    pub fn new(
        cfg: &'a ShaderConfig,
        key: &'a ShaderKey,
        so: Option<&'a StreamOutputInfo>,
        processor: Processor,
        scan: ScanInfo,
        req_local_mem: u32,
    ) -> Self {
        let num_so = so.map_or(0, |so| so.outputs.len());
        Self {
            cfg,
            key,
            so,
            processor,
            scan,
            req_local_mem,
            body: StrBuf::with_capacity(4096),
            hdr: StrBuf::with_capacity(1024),
            reqs: Requirements::default(),
            instno: 0,
            inputs: Vec::new(),
            outputs: Vec::new(),
            system_values: Vec::new(),
            attrib_input_mask: 0,
            num_interps: 0,
            generic_input_range: IoRange::default(),
            patch_input_range: IoRange::default(),
            generic_output_range: IoRange::default(),
            patch_output_range: IoRange::default(),
            temp_ranges: Vec::new(),
            immediates: Vec::new(),
            samplers: [SamplerSlot::default(); MAX_SAMPLERS],
            samplers_used: 0,
            sampler_arrays: Vec::new(),
            shadow_samp_mask: 0,
            images: [None; MAX_IMAGES],
            images_used_mask: 0,
            image_arrays: Vec::new(),
            ssbo_used_mask: 0,
            ssbo_atomic_mask: 0,
            ssbo_integer_mask: 0,
            ssbo_array_base: u32::MAX,
            ssbo_atomic_array_base: u32::MAX,
            ubo_base: 0,
            ubo_used_mask: 0,
            ubo_sizes: [0; MAX_UBOS as usize],
            num_consts: 0,
            num_address: 0,
            abos: Vec::new(),
            num_in_clip_dist: 0,
            num_clip_dist: 0,
            num_clip_dist_prop: 0,
            num_cull_dist_prop: 0,
            color_in_mask: 0,
            front_face_emitted: false,
            has_clipvertex: false,
            has_clipvertex_so: false,
            write_all_cbufs: false,
            uses_sampler_buf: false,
            has_file_memory: false,
            integer_memory: false,
            write_mul_utemp: false,
            write_mul_itemp: false,
            has_sample_input: false,
            vs_has_pervertex: false,
            winsys_adjust_y_emitted: false,
            fs_coord_origin: 0,
            fs_pixel_center: 0,
            early_depth_stencil: false,
            gs_in_prim: PrimType::default(),
            gs_out_prim: PrimType::default(),
            gs_max_out_verts: 0,
            gs_num_invocations: 0,
            tcs_vertices_out: 0,
            tes_prim_mode: PrimType::default(),
            tes_spacing: Spacing::default(),
            tes_vertex_order_cw: false,
            tes_point_mode: false,
            local_cs_block_size: [0; 3],
            write_so_outputs: vec![false; num_so],
            so_names: vec![None; num_so],
        }
    }

    /// Uniform name prefix of this stage (`vs`, `fs`, ...).
    pub fn prefix(&self) -> &'static str {
        self.processor.prefix()
    }

    pub fn indirect_inputs(&self) -> bool {
        self.scan.is_indirect(File::Input)
            || self.key.num_indirect_generic_inputs != 0
            || self.key.num_indirect_patch_inputs != 0
    }

    pub fn indirect_outputs(&self) -> bool {
        self.scan.is_indirect(File::Output)
            || self.key.num_indirect_generic_outputs != 0
            || self.key.num_indirect_patch_outputs != 0
    }

    pub fn temp_range(&self, index: i64) -> Result<TempRange, TranslateError> {
        self.temp_ranges
            .iter()
            .find(|r| index >= i64::from(r.first) && index <= i64::from(r.last))
            .copied()
            .ok_or(TranslateError::MissingTempRange(index.max(0) as u32))
    }

    pub fn immediate(&self, index: i64) -> Result<Immediate, TranslateError> {
        if index < 0 || index as usize >= MAX_IMMEDIATES {
            return Err(TranslateError::MissingImmediate(index.max(0) as u32));
        }
        self.immediates
            .get(index as usize)
            .copied()
            .ok_or(TranslateError::MissingImmediate(index as u32))
    }

    pub fn lookup_sampler_array(&self, index: u32) -> Option<u32> {
        lookup_array(&self.sampler_arrays, index)
    }

    pub fn lookup_image_array(&self, index: u32) -> Option<u32> {
        lookup_array(&self.image_arrays, index)
    }

    pub fn is_integer_memory(&self, file: File, index: u32) -> bool {
        match file {
            File::Buffer => index < 32 && self.ssbo_integer_mask & (1 << index) != 0,
            File::Memory => self.integer_memory,
            _ => false,
        }
    }

    pub fn has_clip_cull_props(&self) -> bool {
        self.num_clip_dist_prop + self.num_cull_dist_prop > 0
    }
}

fn lookup_array(arrays: &[ResourceArray], index: u32) -> Option<u32> {
    arrays.iter().find(|a| a.contains(index)).map(|a| a.first)
}

/// `1 << bit` for semantic or slot indices that may exceed a 32-bit mask.
pub(crate) fn bit(index: u32) -> u32 {
    if index < 32 {
        1 << index
    } else {
        0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn io_range_tracks_lowest_record() {
        let mut range = IoRange::default();
        range.include(3, 0);
        range.include(5, 1);
        range.include(1, 2);
        assert_eq!(
            range,
            IoRange {
                first: 1,
                last: 5,
                array_id: 2,
                used: true,
            }
        );
        assert_eq!(range.len(), 5);
    }

    #[test]
    fn temp_lookup_reports_missing_range() {
        let cfg = ShaderConfig::default();
        let key = ShaderKey::default();
        let mut ctx = Context::new(&cfg, &key, None, Processor::Vertex, ScanInfo::default(), 0);
        ctx.temp_ranges.push(TempRange {
            first: 2,
            last: 4,
            array_id: 0,
        });
        assert_eq!(ctx.temp_range(3).map(|r| r.first).ok(), Some(2));
        assert!(matches!(
            ctx.temp_range(5),
            Err(TranslateError::MissingTempRange(5))
        ));
    }

    #[test]
    fn immediate_index_is_bounded() {
        let cfg = ShaderConfig::default();
        let key = ShaderKey::default();
        let ctx = Context::new(&cfg, &key, None, Processor::Vertex, ScanInfo::default(), 0);
        assert!(matches!(
            ctx.immediate(1024),
            Err(TranslateError::MissingImmediate(1024))
        ));
        assert!(matches!(
            ctx.immediate(0),
            Err(TranslateError::MissingImmediate(0))
        ));
    }

    #[test]
    fn mask_bit_ignores_large_indices() {
        assert_eq!(bit(3), 8);
        assert_eq!(bit(40), 0);
    }
}

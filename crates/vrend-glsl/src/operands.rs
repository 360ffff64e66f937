//! Lowering of instruction operands to GLSL lvalues and rvalues.
//!
//! Every TGSI register is an untyped `vec4`, so each source is wrapped in the
//! bit cast its opcode reads it as, and each destination records the
//! constructor and cast the instruction's result must pass through.

use vrend_tgsi::{
    Dimension, DstRegister, File, ImmediateType, IndirectRef, Instruction, Opcode, OpcodeType,
    Processor, Semantic, SrcRegister,
};

use crate::context::{Context, IoVar};
use crate::error::{invalid, TranslateError};
use crate::require::ShaderReq;
use crate::strbuf::emit;
use crate::tables::{input_name_prefix, output_name_prefix};
use crate::types::{swizzle_char, Float8g, TypeQualifier};

/// Lowered destinations of one instruction.
#[derive(Debug, Clone, Default)]
pub(crate) struct DstInfo {
    pub dsts: Vec<String>,
    /// Real destinations of a double instruction; `dsts` then name `fp64_dst[]`.
    pub fp64_dsts: Vec<String>,
    /// `.xyz`-style mask of the last destination, empty when full.
    pub writemask: String,
    pub dstconv: TypeQualifier,
    pub udstconv: TypeQualifier,
    pub idstconv: TypeQualifier,
    pub dtypeprefix: TypeQualifier,
    pub override_no_wm: Vec<bool>,
}

impl DstInfo {
    pub fn dst(&self, i: usize) -> &str {
        self.dsts.get(i).map_or("", String::as_str)
    }

    pub fn no_wm(&self, i: usize) -> bool {
        self.override_no_wm.get(i).copied().unwrap_or(false)
    }
}

/// Lowered sources of one instruction.
#[derive(Debug, Clone)]
pub(crate) struct SrcInfo {
    pub srcs: Vec<String>,
    /// Vector type the sources are compared as.
    pub svec4: TypeQualifier,
    /// Register index of the last sampler, image, buffer or counter source.
    pub sreg_index: u32,
    pub tg4_has_component: bool,
    pub override_no_wm: Vec<bool>,
    pub override_no_cast: Vec<bool>,
    /// Last integer immediate lane read by the instruction.
    pub imm_value: i32,
    /// Swizzle of source 0 for `INTERP_*`, which names the bare input.
    pub swizzle0: String,
}

impl Default for SrcInfo {
    fn default() -> Self {
        Self {
            srcs: Vec::new(),
            svec4: TypeQualifier::Vec4,
            sreg_index: 0,
            tg4_has_component: false,
            override_no_wm: Vec::new(),
            override_no_cast: Vec::new(),
            imm_value: 0,
            swizzle0: String::new(),
        }
    }
}

impl SrcInfo {
    pub fn src(&self, i: usize) -> &str {
        self.srcs.get(i).map_or("", String::as_str)
    }

    pub fn no_wm(&self, i: usize) -> bool {
        self.override_no_wm.get(i).copied().unwrap_or(false)
    }

    pub fn no_cast(&self, i: usize) -> bool {
        self.override_no_cast.get(i).copied().unwrap_or(false)
    }
}

/// `[addr<n> + <offset>]` or `[<offset>]`.
fn indexed(indirect: Option<IndirectRef>, offset: i64) -> String {
    match indirect {
        Some(ind) => format!("[addr{} + {offset}]", ind.index),
        None => format!("[{offset}]"),
    }
}

/// Like [`indexed`] without blanks around `+`, as sampler and buffer arrays are spelled.
fn indexed_tight(indirect: Option<IndirectRef>, offset: i64) -> String {
    match indirect {
        Some(ind) => format!("[addr{}+{offset}]", ind.index),
        None => format!("[{offset}]"),
    }
}

fn array_name(dimension: Option<Dimension>) -> String {
    match dimension {
        Some(Dimension {
            indirect: Some(ind),
            ..
        }) => format!("[addr{}]", ind.index),
        Some(d) => format!("[{}]", d.index),
        None => String::new(),
    }
}

fn dst_writemask(dst: &DstRegister) -> String {
    let mut wm = String::new();
    if dst.write_mask.is_full() {
        return wm;
    }
    wm.push('.');
    for (bit, c) in [(1u8, 'x'), (2, 'y'), (4, 'z'), (8, 'w')] {
        if dst.write_mask.contains(bit) {
            wm.push(c);
        }
    }
    wm
}

fn is_interp(opcode: Opcode) -> bool {
    matches!(
        opcode,
        Opcode::InterpSample | Opcode::InterpOffset | Opcode::InterpCentroid
    )
}

/// Operand modifiers, spelled once per source.
struct Modifiers {
    /// `-` and/or `abs(`.
    prefix: String,
    /// `)` closing `abs(`.
    close: &'static str,
    /// `.xyzw` unless the swizzle is the identity.
    swz: String,
}

impl Modifiers {
    fn new(src: &SrcRegister, stype: OpcodeType) -> Self {
        let abs = src.absolute && stype != OpcodeType::Double;
        let mut prefix = String::new();
        if src.negate {
            prefix.push('-');
        }
        if abs {
            prefix.push_str("abs(");
        }
        let mut swz = String::new();
        if !src.swizzle.is_identity() {
            swz.push('.');
            for lane in src.swizzle.0 {
                swz.push(swizzle_char(lane));
            }
        }
        Self {
            prefix,
            close: if abs { ")" } else { "" },
            swz,
        }
    }

    /// Closing parenthesis followed by the swizzle.
    fn swizzle(&self) -> String {
        format!("{}{}", self.close, self.swz)
    }

    /// Swizzle of a source that is dropped for scalar integer varyings.
    fn varying_swizzle(&self, var: &IoVar) -> String {
        if var.is_int {
            self.close.to_owned()
        } else {
            self.swizzle()
        }
    }
}

impl Context<'_> {
    pub fn destination_info(&mut self, inst: &Instruction) -> Result<DstInfo, TranslateError> {
        let dtype = inst.opcode.dst_type();
        let mut info = DstInfo::default();

        match dtype {
            OpcodeType::Signed | OpcodeType::Unsigned => self.reqs.require(ShaderReq::INTS),
            OpcodeType::Double => self.reqs.require(ShaderReq::INTS | ShaderReq::FP64),
            _ => {}
        }

        info.dtypeprefix = match (inst.opcode, dtype) {
            (Opcode::Txq, _) => TypeQualifier::IntBitsToFloat,
            (_, OpcodeType::Unsigned) => TypeQualifier::UintBitsToFloat,
            (_, OpcodeType::Signed) => TypeQualifier::IntBitsToFloat,
            _ => TypeQualifier::None,
        };

        for (i, dst) in inst.dst.iter().enumerate() {
            let mut fp64_writemask = String::new();
            info.writemask = dst_writemask(dst);
            let mut no_wm = false;

            if !dst.write_mask.is_full() {
                let components = info.writemask.len() - 1;
                if dtype == OpcodeType::Double {
                    fp64_writemask.push('.');
                    if dst.write_mask.0 & 0x3 != 0 {
                        fp64_writemask.push('x');
                    }
                    if dst.write_mask.0 & 0xc != 0 {
                        fp64_writemask.push('y');
                    }
                    info.dstconv = if fp64_writemask.len() == 2 {
                        TypeQualifier::Double
                    } else {
                        TypeQualifier::DVec2
                    };
                } else {
                    info.dstconv = TypeQualifier::float_vec(components);
                    info.udstconv = TypeQualifier::uint_vec(components);
                    info.idstconv = TypeQualifier::int_vec(components);
                }
            } else {
                info.dstconv = if dtype == OpcodeType::Double {
                    TypeQualifier::DVec2
                } else {
                    TypeQualifier::Vec4
                };
                info.udstconv = TypeQualifier::UVec4;
                info.idstconv = TypeQualifier::IVec4;
            }

            let name = match dst.file {
                File::Output => self.output_destination(inst, dst, &mut info, &mut no_wm)?,
                File::Temporary => {
                    let range = self.temp_range(i64::from(dst.index))?;
                    let offset = i64::from(dst.index) - i64::from(range.first);
                    if dst.indirect.is_some() {
                        format!("temp{}[addr0 + {offset}]{}", range.first, info.writemask)
                    } else {
                        format!("temp{}[{offset}]{}", range.first, info.writemask)
                    }
                }
                File::Image => {
                    let cname = self.prefix();
                    if self.scan.is_indirect(File::Image) {
                        let base = self.image_array_base(dst.index)?;
                        let offset = i64::from(dst.index) - i64::from(base);
                        format!("{cname}img{base}{}", indexed(dst.indirect, offset))
                    } else {
                        format!("{cname}img{}", dst.index)
                    }
                }
                File::Buffer => self.buffer_name(dst.index, dst.indirect),
                File::Memory => "values".to_owned(),
                File::Address => format!("addr{}", dst.index),
                file => return Err(invalid(format!("unsupported destination file {file}"))),
            };

            if dtype == OpcodeType::Double {
                info.fp64_dsts.push(name);
                info.dsts.push(format!("fp64_dst[{i}]{fp64_writemask}"));
                info.writemask.clear();
            } else {
                info.fp64_dsts.push(String::new());
                info.dsts.push(name);
            }
            info.override_no_wm.push(no_wm);
        }
        Ok(info)
    }

    fn output_destination(
        &mut self,
        inst: &Instruction,
        dst: &DstRegister,
        info: &mut DstInfo,
        no_wm: &mut bool,
    ) -> Result<String, TranslateError> {
        let index = i64::from(dst.index);
        let mut name = None;
        let indirect_outputs = self.indirect_outputs();
        let out_prefix = output_name_prefix(self.processor);
        let tcs = self.processor == Processor::TessCtrl;

        for j in 0..self.outputs.len() {
            if i64::from(self.outputs[j].first) != index {
                continue;
            }
            if inst.precise && !self.outputs[j].invariant {
                self.outputs[j].precise = true;
                self.reqs.require(ShaderReq::GPU_SHADER5);
            }
            let out = &self.outputs[j];
            let wm = if out.override_no_wm {
                ""
            } else {
                info.writemask.as_str()
            };

            if self.reqs.version() >= 140 && out.name == Semantic::ClipVertex {
                name = Some("clipv_tmp".to_owned());
            } else if out.name == Semantic::ClipDist {
                name = Some(format!("clip_dist_temp[{}]", out.sid));
            } else if matches!(
                out.name,
                Semantic::TessOuter | Semantic::TessInner | Semantic::SampleMask
            ) {
                let component = match dst.write_mask.0 {
                    0x2 => 1,
                    0x4 => 2,
                    0x8 => 3,
                    _ => 0,
                };
                name = Some(format!("{}[{component}]", out.glsl_name));
                if out.is_int {
                    info.dtypeprefix = TypeQualifier::FloatBitsToInt;
                    info.dstconv = TypeQualifier::Int;
                }
            } else {
                let range = &self.generic_output_range;
                let patch = &self.patch_output_range;
                name = Some(if out.gl_block {
                    let vertex = if tcs { "gl_InvocationID" } else { "0" };
                    format!("gl_out[{vertex}].{}{wm}", out.glsl_name)
                } else if tcs && out.name != Semantic::Patch {
                    if indirect_outputs {
                        let offset = index - i64::from(range.array_id);
                        format!(
                            "oblk[gl_InvocationID].{out_prefix}{}{}{wm}",
                            range.first,
                            indexed(dst.indirect, offset)
                        )
                    } else {
                        format!("{}[gl_InvocationID]{wm}", out.glsl_name)
                    }
                } else if indirect_outputs && out.name == Semantic::Generic {
                    *no_wm = out.override_no_wm;
                    let offset = index - i64::from(range.array_id);
                    format!(
                        "oblk.{out_prefix}{}{}{wm}",
                        range.first,
                        indexed(dst.indirect, offset)
                    )
                } else if indirect_outputs && out.name == Semantic::Patch {
                    *no_wm = out.override_no_wm;
                    let offset = index - i64::from(patch.array_id);
                    format!(
                        "{out_prefix}p{}{}{wm}",
                        patch.first,
                        indexed(dst.indirect, offset)
                    )
                } else {
                    *no_wm = out.override_no_wm;
                    format!("{}{wm}", out.glsl_name)
                });
                if out.is_int {
                    if info.dtypeprefix == TypeQualifier::None {
                        info.dtypeprefix = TypeQualifier::FloatBitsToInt;
                    }
                    info.dstconv = TypeQualifier::Int;
                }
                if out.name == Semantic::PSize {
                    info.dstconv = TypeQualifier::Float;
                    break;
                }
            }
        }
        name.ok_or_else(|| invalid(format!("output register {index} is not declared")))
    }

    fn image_array_base(&self, index: i32) -> Result<u32, TranslateError> {
        u32::try_from(index)
            .ok()
            .and_then(|i| self.lookup_image_array(i))
            .ok_or_else(|| invalid(format!("image {index} is not part of a declared array")))
    }

    fn buffer_name(&self, index: i32, indirect: Option<IndirectRef>) -> String {
        let cname = self.prefix();
        if self.scan.is_indirect(File::Buffer) {
            let atomic = index >= 0 && index < 32 && self.ssbo_atomic_mask & (1 << index) != 0;
            let (atomic_str, base) = if atomic {
                ("atomic", self.ssbo_atomic_array_base)
            } else {
                ("", self.ssbo_array_base)
            };
            let offset = i64::from(index) - i64::from(base);
            format!(
                "{cname}ssboarr{atomic_str}{}.{cname}ssbocontents{base}",
                indexed_tight(indirect, offset)
            )
        } else {
            format!("{cname}ssbocontents{index}")
        }
    }

    /// `[gl_InvocationID]`, the vertex index of a per-vertex block access.
    fn block_array(&self, src: &SrcRegister) -> String {
        if self.processor == Processor::TessCtrl {
            return "[gl_InvocationID]".to_owned();
        }
        match src.dimension {
            Some(Dimension {
                index,
                indirect: Some(ind),
            }) => format!("[addr{} + {index}]", ind.index),
            Some(d) => format!("[{}]", d.index),
            None => "[0]".to_owned(),
        }
    }

    /// Rebuilds a clip distance vec4 from the scalar builtin arrays.
    fn swizzled_clipdist(
        &self,
        src: &SrcRegister,
        input: &IoVar,
        gl_in: bool,
        stypeprefix: TypeQualifier,
        mods: &Modifiers,
        arrayname: &str,
    ) -> String {
        let prev_clip = self.key.prev_stage_num_clip_out;
        let prev_cull = self.key.prev_stage_num_cull_out;
        let has_prev = prev_clip + prev_cull > 0;
        let num_culls = if has_prev { prev_cull } else { 0 };
        let num_clips = if has_prev {
            prev_clip
        } else {
            self.num_in_clip_dist
        };

        let components: Vec<String> = src
            .swizzle
            .0
            .iter()
            .map(|&lane| {
                let mut name = input.glsl_name.as_str();
                let mut idx = input.sid * 4 + u32::from(lane);
                if num_culls > 0 {
                    if idx >= num_clips {
                        idx -= num_clips;
                        name = "gl_CullDistance";
                    }
                    if prev_cull > 0 && idx >= prev_cull {
                        idx = 0;
                    }
                } else if prev_clip > 0 && idx >= prev_clip {
                    idx = 0;
                }
                if gl_in {
                    format!("{}gl_in{arrayname}.{name}[{idx}]{}", mods.prefix, mods.close)
                } else {
                    format!("{}{arrayname}{name}[{idx}]{}", mods.prefix, mods.close)
                }
            })
            .collect();
        format!("{stypeprefix}(vec4({}))", components.join(","))
    }

    pub fn source_info(&mut self, inst: &Instruction) -> Result<SrcInfo, TranslateError> {
        let stype = inst.opcode.src_type();
        let mut info = SrcInfo::default();

        let (stypeprefix, stprefix) = match stype {
            OpcodeType::Double => {
                self.reqs.require(ShaderReq::INTS | ShaderReq::FP64);
                info.svec4 = TypeQualifier::DVec2;
                (TypeQualifier::FloatBitsToUint, true)
            }
            OpcodeType::Unsigned => {
                self.reqs.require(ShaderReq::INTS);
                info.svec4 = TypeQualifier::UVec4;
                (TypeQualifier::FloatBitsToUint, true)
            }
            OpcodeType::Signed => {
                self.reqs.require(ShaderReq::INTS);
                info.svec4 = TypeQualifier::IVec4;
                (TypeQualifier::FloatBitsToInt, true)
            }
            _ => (TypeQualifier::None, false),
        };

        for (i, src) in inst.src.iter().enumerate() {
            let mods = Modifiers::new(src, stype);
            let arrayname = array_name(src.dimension);
            let mut no_wm = false;
            let mut no_cast = false;

            let text = match src.file {
                File::Input => {
                    let (text, input_no_wm) =
                        self.input_source(inst, i, src, stype, stypeprefix, &mods, &arrayname, &mut info)?;
                    no_wm = input_no_wm;
                    text
                }
                File::Output => self.output_source(inst, src, stype, stypeprefix, &mods, &arrayname)?,
                File::Temporary => {
                    let range = self.temp_range(i64::from(src.index))?;
                    let (sp, open) = if inst.opcode == Opcode::InterpSample && i == 1 {
                        (TypeQualifier::FloatBitsToInt, true)
                    } else {
                        (stypeprefix, stprefix)
                    };
                    let offset = i64::from(src.index) - i64::from(range.first);
                    let index = match src.indirect {
                        Some(ind) => format!("[addr{} + {offset}]", ind.index),
                        None => format!("[{offset}]"),
                    };
                    format!(
                        "{sp}{}{}temp{}{index}{}{}",
                        if open { '(' } else { ' ' },
                        mods.prefix,
                        range.first,
                        mods.swizzle(),
                        if open { ')' } else { ' ' },
                    )
                }
                File::Constant => self.constant_source(inst, i, src, stype, stypeprefix, &mods),
                File::Sampler => {
                    let cname = self.prefix();
                    info.sreg_index = src.index.max(0) as u32;
                    if self.scan.is_indirect(File::Sampler) {
                        let base = u32::try_from(src.index)
                            .ok()
                            .and_then(|idx| self.lookup_sampler_array(idx))
                            .ok_or_else(|| {
                                invalid(format!(
                                    "sampler {} is not part of a declared array",
                                    src.index
                                ))
                            })?;
                        let offset = i64::from(src.index) - i64::from(base);
                        format!(
                            "{cname}samp{base}{}{}",
                            indexed_tight(src.indirect, offset),
                            mods.swizzle()
                        )
                    } else {
                        format!("{cname}samp{}{}", src.index, mods.swizzle())
                    }
                }
                File::Image => {
                    let cname = self.prefix();
                    info.sreg_index = src.index.max(0) as u32;
                    if self.scan.is_indirect(File::Image) {
                        let base = self.image_array_base(src.index)?;
                        let offset = i64::from(src.index) - i64::from(base);
                        format!("{cname}img{base}{}", indexed(src.indirect, offset))
                    } else {
                        format!("{cname}img{}{}", src.index, mods.swizzle())
                    }
                }
                File::Buffer => {
                    info.sreg_index = src.index.max(0) as u32;
                    format!("{}{}", self.buffer_name(src.index, src.indirect), mods.swizzle())
                }
                File::Memory => {
                    info.sreg_index = src.index.max(0) as u32;
                    "values".to_owned()
                }
                File::Immediate => {
                    self.immediate_source(inst, i, src, stype, stypeprefix, &mods, &mut info)?
                }
                File::SystemValue => {
                    let (text, sv_no_wm, sv_no_cast) =
                        self.system_value_source(inst, i, src, stype, stypeprefix, &mods)?;
                    no_wm = sv_no_wm;
                    no_cast = sv_no_cast;
                    text
                }
                File::HwAtomic => {
                    info.sreg_index = src.index.max(0) as u32;
                    self.atomic_counter_source(src)?
                }
                file => return Err(invalid(format!("unsupported source file {file}"))),
            };

            let text = if stype == OpcodeType::Double {
                let slot = format!("fp64_src[{i}]");
                let (open, close) = if src.absolute { ("abs(", ")") } else { ("", "") };
                emit!(
                    self.body,
                    "{slot}.x = {open}packDouble2x32(uvec2({text}{})){close};\n",
                    mods.swizzle()
                );
                slot
            } else {
                text
            };

            info.srcs.push(text);
            info.override_no_wm.push(no_wm);
            info.override_no_cast.push(no_cast);
        }
        Ok(info)
    }

    #[allow(clippy::too_many_arguments)]
    fn input_source(
        &mut self,
        inst: &Instruction,
        i: usize,
        src: &SrcRegister,
        stype: OpcodeType,
        stypeprefix: TypeQualifier,
        mods: &Modifiers,
        arrayname: &str,
        info: &mut SrcInfo,
    ) -> Result<(String, bool), TranslateError> {
        let index = i64::from(src.index);
        let input = self
            .inputs
            .iter()
            .find(|v| i64::from(v.first) == index)
            .cloned()
            .ok_or_else(|| invalid(format!("input register {index} is not declared")))?;
        let prefix = &mods.prefix;
        let swizzle = mods.swizzle();

        let text = if self.key.color_two_side && input.name == Semantic::Color {
            format!("{stypeprefix}({prefix}realcolor{}{arrayname}{swizzle})", input.sid)
        } else if input.gl_block {
            if input.name == Semantic::ClipDist {
                self.swizzled_clipdist(src, &input, true, stypeprefix, mods, arrayname)
            } else {
                format!(
                    "{stypeprefix}(vec4({prefix}gl_in{arrayname}.{}){swizzle})",
                    input.glsl_name
                )
            }
        } else if input.name == Semantic::PrimId {
            format!("{stypeprefix}(vec4(intBitsToFloat({})))", input.glsl_name)
        } else if input.name == Semantic::Face {
            format!("{stypeprefix}({} ? 1.0 : -1.0)", input.glsl_name)
        } else if input.name == Semantic::ClipDist {
            self.swizzled_clipdist(src, &input, false, stypeprefix, mods, arrayname)
        } else {
            let sp = if matches!(stype, OpcodeType::Unsigned | OpcodeType::Signed) && input.is_int
            {
                TypeQualifier::None
            } else {
                stypeprefix
            };
            let var_swizzle = mods.varying_swizzle(&input);
            let indirect_inputs = self.indirect_inputs();
            let in_prefix = input_name_prefix(self.processor, self.key);

            if inst.opcode == Opcode::InterpSample && i == 1 {
                format!("floatBitsToInt({prefix}{}{arrayname}{swizzle})", input.glsl_name)
            } else if input.name == Semantic::Generic && indirect_inputs {
                let range = self.generic_input_range;
                let blk = self.block_array(src);
                let offset = index - i64::from(range.array_id);
                format!(
                    "{sp}({prefix}blk{blk}.{in_prefix}{}{}{var_swizzle})",
                    range.first,
                    indexed(src.indirect, offset)
                )
            } else if input.name == Semantic::Patch && indirect_inputs {
                let range = self.patch_input_range;
                let offset = index - i64::from(range.array_id);
                format!(
                    "{sp}({prefix}{in_prefix}p{}{}{var_swizzle})",
                    range.first,
                    indexed(src.indirect, offset)
                )
            } else {
                format!("{sp}({prefix}{}{arrayname}{var_swizzle})", input.glsl_name)
            }
        };

        if is_interp(inst.opcode) && i == 0 {
            info.swizzle0 = swizzle;
            return Ok((input.glsl_name.clone(), input.override_no_wm));
        }
        Ok((text, input.override_no_wm))
    }

    fn output_source(
        &mut self,
        inst: &Instruction,
        src: &SrcRegister,
        stype: OpcodeType,
        stypeprefix: TypeQualifier,
        mods: &Modifiers,
        arrayname: &str,
    ) -> Result<String, TranslateError> {
        let index = i64::from(src.index);
        let indirect_outputs = self.indirect_outputs();
        let out_prefix = output_name_prefix(self.processor);
        let prefix = &mods.prefix;
        let mut text = None;

        for j in 0..self.outputs.len() {
            if i64::from(self.outputs[j].first) != index {
                continue;
            }
            if inst.opcode == Opcode::Fbfetch {
                self.outputs[j].fbfetch_used = true;
                self.reqs.require(ShaderReq::FBFETCH);
            }
            let out = &self.outputs[j];
            let sp = if stype == OpcodeType::Unsigned && out.is_int {
                TypeQualifier::None
            } else {
                stypeprefix
            };
            let swizzle = mods.varying_swizzle(out);

            text = Some(if out.gl_block {
                if out.name == Semantic::ClipDist {
                    format!("clip_dist_temp[{}]", out.sid)
                } else {
                    format!(
                        "{sp}(vec4({prefix}gl_out[gl_InvocationID].{}){})",
                        out.glsl_name,
                        mods.swizzle()
                    )
                }
            } else if out.name == Semantic::Generic && indirect_outputs {
                let range = self.generic_output_range;
                let blk = self.block_array(src);
                let offset = index - i64::from(range.array_id);
                format!(
                    "{sp}({prefix}oblk{blk}.{out_prefix}{}{}{swizzle})",
                    range.first,
                    indexed(src.indirect, offset)
                )
            } else if out.name == Semantic::Patch && indirect_outputs {
                let range = self.patch_output_range;
                let offset = index - i64::from(range.array_id);
                format!(
                    "{sp}({prefix}{out_prefix}p{}{}{swizzle})",
                    range.first,
                    indexed(src.indirect, offset)
                )
            } else {
                format!("{sp}({prefix}{}{arrayname}{swizzle})", out.glsl_name)
            });
        }
        text.ok_or_else(|| invalid(format!("output register {index} is not declared")))
    }

    fn constant_source(
        &mut self,
        inst: &Instruction,
        i: usize,
        src: &SrcRegister,
        stype: OpcodeType,
        stypeprefix: TypeQualifier,
        mods: &Modifiers,
    ) -> String {
        let cname = self.prefix();
        let prefix = &mods.prefix;
        let swizzle = mods.swizzle();
        let idx = src.index;

        match src.dimension {
            Some(dim) if dim.index != 0 => {
                if let Some(dim_ind) = dim.indirect {
                    self.reqs.require(ShaderReq::GPU_SHADER5);
                    let inner = match src.indirect {
                        Some(ind) => format!("[addr{} + {idx}]", ind.index),
                        None => format!("[{idx}]"),
                    };
                    format!(
                        "{stypeprefix}({prefix}{cname}uboarr[addr{}].ubocontents{inner}{swizzle})",
                        dim_ind.index
                    )
                } else if self.scan.is_dimension_indirect(File::Constant) {
                    let inner = match src.indirect {
                        Some(ind) => format!("[addr{} + {idx}]", ind.index),
                        None => format!("[{idx}]"),
                    };
                    let slot = i64::from(dim.index) - i64::from(self.ubo_base);
                    format!("{stypeprefix}({prefix}{cname}uboarr[{slot}].ubocontents{inner}{swizzle})")
                } else {
                    let inner = if src.indirect.is_some() {
                        format!("[addr0 + {idx}]")
                    } else {
                        format!("[{idx}]")
                    };
                    format!(
                        "{stypeprefix}({prefix}{cname}ubo{}contents{inner}{swizzle})",
                        dim.index
                    )
                }
            }
            _ => {
                self.reqs.require(ShaderReq::INTS);
                let csp = if inst.opcode == Opcode::InterpSample && i == 1 {
                    TypeQualifier::IVec4
                } else {
                    match stype {
                        OpcodeType::Float | OpcodeType::Untyped => TypeQualifier::UintBitsToFloat,
                        OpcodeType::Signed => TypeQualifier::IVec4,
                        _ => TypeQualifier::None,
                    }
                };
                let inner = if src.indirect.is_some() {
                    format!("[addr0 + {idx}]")
                } else {
                    format!("[{idx}]")
                };
                format!("{prefix}{csp}({cname}const0{inner}{swizzle})")
            }
        }
    }

    #[allow(clippy::too_many_arguments)]
    fn immediate_source(
        &mut self,
        inst: &Instruction,
        i: usize,
        src: &SrcRegister,
        stype: OpcodeType,
        stypeprefix: TypeQualifier,
        mods: &Modifiers,
        info: &mut SrcInfo,
    ) -> Result<String, TranslateError> {
        let imm = self.immediate(i64::from(src.index))?;
        let stype = if matches!(inst.opcode, Opcode::Tg4 | Opcode::InterpSample) && i == 1 {
            OpcodeType::Signed
        } else {
            stype
        };

        let (vtype, sp) = match imm.data_type {
            ImmediateType::Uint32 | ImmediateType::Int32 => {
                let signed = imm.data_type == ImmediateType::Int32;
                let vtype = if signed {
                    TypeQualifier::IVec4
                } else {
                    TypeQualifier::UVec4
                };
                let sp = match stype {
                    OpcodeType::Unsigned if signed => TypeQualifier::UVec4,
                    OpcodeType::Signed if !signed => TypeQualifier::IVec4,
                    OpcodeType::Float | OpcodeType::Untyped if signed => {
                        TypeQualifier::IntBitsToFloat
                    }
                    OpcodeType::Float | OpcodeType::Untyped => TypeQualifier::UintBitsToFloat,
                    OpcodeType::Unsigned | OpcodeType::Signed => TypeQualifier::None,
                    OpcodeType::Double => stypeprefix,
                };
                (vtype, sp)
            }
            ImmediateType::Float64 => {
                let sp = if stype == OpcodeType::Double {
                    TypeQualifier::None
                } else {
                    TypeQualifier::UintBitsToFloat
                };
                (TypeQualifier::UVec4, sp)
            }
            ImmediateType::Float32 => (TypeQualifier::Vec4, stypeprefix),
        };

        let mut text = format!("{sp}({}{vtype}(", mods.prefix);
        for (j, &lane) in src.swizzle.0.iter().enumerate() {
            let lane = usize::from(lane & 3);
            if inst.opcode == Opcode::Tg4 && i == 1 && j == 0 && imm.u32(lane) > 0 {
                info.tg4_has_component = true;
                if !self.cfg.use_gles {
                    self.reqs.require(ShaderReq::GPU_SHADER5);
                }
            }
            match imm.data_type {
                ImmediateType::Float32 => {
                    let value = imm.f32(lane);
                    if value.is_nan() || value.is_infinite() {
                        self.reqs.require(ShaderReq::INTS);
                        text.push_str(&format!("uintBitsToFloat({}U)", imm.u32(lane)));
                    } else {
                        text.push_str(&Float8g(f64::from(value)).to_string());
                    }
                }
                ImmediateType::Uint32 | ImmediateType::Float64 => {
                    text.push_str(&format!("{}U", imm.u32(lane)));
                }
                ImmediateType::Int32 => {
                    text.push_str(&imm.i32(lane).to_string());
                    info.imm_value = imm.i32(lane);
                }
            }
            text.push_str(if j < 3 { "," } else { "))" });
        }
        text.push_str(mods.close);
        Ok(text)
    }

    fn system_value_source(
        &mut self,
        inst: &Instruction,
        i: usize,
        src: &SrcRegister,
        stype: OpcodeType,
        stypeprefix: TypeQualifier,
        mods: &Modifiers,
    ) -> Result<(String, bool, bool), TranslateError> {
        let index = i64::from(src.index);
        let sv = self
            .system_values
            .iter()
            .find(|v| i64::from(v.first) == index)
            .cloned()
            .ok_or_else(|| invalid(format!("system value {index} is not declared")))?;
        let name = sv.glsl_name.as_str();
        let prefix = &mods.prefix;
        let close = mods.close;
        let lanes = src.swizzle.0;
        let mut no_cast = false;

        let text = match sv.name {
            Semantic::VertexId
            | Semantic::InstanceId
            | Semantic::PrimId
            | Semantic::VerticesIn
            | Semantic::InvocationId
            | Semantic::SampleId => {
                if inst.opcode == Opcode::InterpSample && i == 1 {
                    format!("ivec4({name})")
                } else {
                    format!("{stypeprefix}(vec4(intBitsToFloat({name})))")
                }
            }
            Semantic::HelperInvocation => format!("uvec4({name})"),
            Semantic::TessInner | Semantic::TessOuter => {
                let [x, y, z, w] = lanes;
                format!("{prefix}(vec4({name}[{x}], {name}[{y}], {name}[{z}], {name}[{w}])){close}")
            }
            Semantic::SamplePos => {
                const COMPONENTS: [&str; 4] =
                    ["gl_SamplePosition.x", "gl_SamplePosition.y", "0.0", "0.0"];
                let [x, y, z, w] = lanes.map(|l| COMPONENTS[usize::from(l & 3)]);
                format!("{prefix}(vec4({x}, {y}, {z}, {w})){close}")
            }
            Semantic::TessCoord => {
                let [x, y, z, w] = lanes.map(swizzle_char);
                format!("{prefix}(vec4({name}.{x}, {name}.{y}, {name}.{z}, {name}.{w})){close}")
            }
            Semantic::GridSize | Semantic::ThreadId | Semantic::BlockId => {
                no_cast = true;
                let [x, y, z, w] = lanes.map(swizzle_char);
                format!("uvec4({name}.{x}, {name}.{y}, {name}.{z}, {name}.{w})")
            }
            Semantic::SampleMask => {
                let vec_type = if self.cfg.use_gles
                    && inst.opcode == Opcode::And
                    && stype == OpcodeType::Unsigned
                {
                    "uvec4"
                } else {
                    "ivec4"
                };
                self.reqs.require(ShaderReq::SAMPLE_SHADING | ShaderReq::INTS);
                let [x, y, z, w] = lanes.map(|l| if l == 0 { name } else { "0" });
                format!("{vec_type}({x}, {y}, {z}, {w})")
            }
            _ => format!("{prefix}{name}{close}"),
        };
        Ok((text, sv.override_no_wm, no_cast))
    }

    fn atomic_counter_source(&self, src: &SrcRegister) -> Result<String, TranslateError> {
        let binding = src.dimension.map_or(0, |d| d.index);
        let index = i64::from(src.index);
        self.abos
            .iter()
            .enumerate()
            .find(|(_, abo)| {
                i64::from(abo.binding) == i64::from(binding)
                    && index >= i64::from(abo.offset)
                    && index < i64::from(abo.offset) + i64::from(abo.size)
            })
            .map(|(j, abo)| {
                if abo.size > 1 {
                    let offset = index - i64::from(abo.offset);
                    format!("ac{j}{}", indexed(src.indirect, offset))
                } else {
                    format!("ac{j}")
                }
            })
            .ok_or_else(|| invalid(format!("atomic counter {index} is not declared")))
    }
}

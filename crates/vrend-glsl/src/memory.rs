//! Image, shader storage buffer, shared memory and atomic counter access.
//!
//! Buffers and shared memory are declared as `uint`/`int` arrays, so every
//! access divides the TGSI byte address by four and moves one component at a
//! time.

use vrend_tgsi::{
    DeclImage, File, Instruction, MembarFlags, ReturnType, TextureTarget, WriteMask,
};

use crate::context::{bit, Context};
use crate::error::{invalid, TranslateError};
use crate::operands::{DstInfo, SrcInfo};
use crate::require::ShaderReq;
use crate::strbuf::emit;
use crate::tables::{atomic_opname, coord_prefix, internal_format_string};
use crate::types::{swizzle_char, TypeQualifier};

/// Components written by a per-lane memory access.
fn lanes(mask: WriteMask) -> impl Iterator<Item = u8> {
    (0u8..4).filter(move |&lane| mask.contains(1 << lane))
}

impl Context<'_> {
    fn image_decl(&self, index: i64) -> Result<DeclImage, TranslateError> {
        usize::try_from(index)
            .ok()
            .and_then(|i| self.images.get(i).copied().flatten())
            .ok_or_else(|| invalid(format!("image {index} is not declared")))
    }

    pub(crate) fn translate_store(
        &mut self,
        inst: &Instruction,
        sinfo: &SrcInfo,
        dinfo: &DstInfo,
    ) -> Result<(), TranslateError> {
        let dst = inst
            .dst
            .first()
            .ok_or_else(|| invalid("STORE without a destination"))?;
        let d = dinfo.dst(0);
        let (s0, s1) = (sinfo.src(0), sinfo.src(1));

        match dst.file {
            File::Image => {
                let image = self.image_decl(i64::from(dst.index))?;
                let (cp, is_ms) = coord_prefix(image.target);
                let conversion = if sinfo.no_cast(0) {
                    ""
                } else {
                    "floatBitsToInt"
                };
                let format = inst.memory.map(|m| m.format).unwrap_or_default();
                let stypeprefix = match internal_format_string(format).1 {
                    ReturnType::Uint => TypeQualifier::FloatBitsToUint,
                    ReturnType::Sint => TypeQualifier::FloatBitsToInt,
                    _ => TypeQualifier::None,
                };
                let ms = if is_ms {
                    format!("int({s0}.w),")
                } else {
                    String::new()
                };
                emit!(
                    self.body,
                    "imageStore({d},{cp}({conversion}({s0})),{ms}{stypeprefix}({s1}));\n"
                );
            }
            File::Buffer | File::Memory => {
                let index = dst.index.max(0) as u32;
                let conversion = if sinfo.no_cast(1) {
                    TypeQualifier::None
                } else if self.is_integer_memory(dst.file, index) {
                    TypeQualifier::FloatBitsToInt
                } else {
                    TypeQualifier::FloatBitsToUint
                };
                for lane in lanes(dst.write_mask) {
                    let c = swizzle_char(lane);
                    if lane == 0 {
                        emit!(
                            self.body,
                            "{d}[uint(floatBitsToUint({s0}))>>2] = {conversion}({s1}).{c};\n"
                        );
                    } else {
                        emit!(
                            self.body,
                            "{d}[(uint(floatBitsToUint({s0}))>>2)+{lane}u] = {conversion}({s1}).{c};\n"
                        );
                    }
                }
            }
            file => return Err(invalid(format!("STORE to register file {file}"))),
        }
        Ok(())
    }

    pub(crate) fn translate_load(
        &mut self,
        inst: &Instruction,
        sinfo: &SrcInfo,
        dinfo: &DstInfo,
    ) -> Result<(), TranslateError> {
        let src = inst
            .src
            .first()
            .ok_or_else(|| invalid("LOAD without a resource operand"))?;
        let d = dinfo.dst(0);
        let (s0, s1) = (sinfo.src(0), sinfo.src(1));

        match src.file {
            File::Image => {
                let image = self.image_decl(i64::from(sinfo.sreg_index))?;
                let (cp, is_ms) = coord_prefix(image.target);
                let conversion = if sinfo.no_cast(1) {
                    ""
                } else {
                    "floatBitsToInt"
                };
                let dtypeprefix = match internal_format_string(image.format).1 {
                    ReturnType::Uint => TypeQualifier::UintBitsToFloat,
                    ReturnType::Sint => TypeQualifier::IntBitsToFloat,
                    _ => TypeQualifier::None,
                };
                let ms = if is_ms {
                    format!(", int({s1}.w)")
                } else {
                    String::new()
                };
                let wm = if dinfo.no_wm(0) {
                    ""
                } else {
                    dinfo.writemask.as_str()
                };
                emit!(
                    self.body,
                    "{d} = {dtypeprefix}(imageLoad({s0}, {cp}({conversion}({s1})){ms}){wm});\n"
                );
            }
            File::Buffer | File::Memory => {
                let mydst = d.split('.').next().unwrap_or(d);
                emit!(self.body, "ssbo_addr_temp = uint(floatBitsToUint({s1})) >> 2;\n");

                let index = src.index.max(0) as u32;
                let (atomic_op, atomic_src) = if self.ssbo_atomic_mask & bit(index) != 0 {
                    ("atomicOr", ", uint(0)")
                } else {
                    ("", "")
                };
                let dtypeprefix = if self.is_integer_memory(src.file, index) {
                    TypeQualifier::IntBitsToFloat
                } else {
                    TypeQualifier::UintBitsToFloat
                };
                let mask = inst.dst.first().map_or(WriteMask::NONE, |r| r.write_mask);
                for lane in lanes(mask) {
                    let c = swizzle_char(lane);
                    let addr = if lane == 0 {
                        "ssbo_addr_temp".to_owned()
                    } else {
                        format!("ssbo_addr_temp + {lane}u")
                    };
                    emit!(
                        self.body,
                        "{mydst}.{c} = ({dtypeprefix}({atomic_op}({s0}[{addr}]{atomic_src})));\n"
                    );
                }
            }
            File::HwAtomic => {
                emit!(self.body, "{d} = uintBitsToFloat(atomicCounter({s0}));\n");
            }
            file => return Err(invalid(format!("LOAD from register file {file}"))),
        }
        Ok(())
    }

    pub(crate) fn translate_atomic(
        &mut self,
        inst: &Instruction,
        sinfo: &SrcInfo,
        dinfo: &DstInfo,
        inst_index: u32,
    ) -> Result<(), TranslateError> {
        let src = inst
            .src
            .first()
            .ok_or_else(|| invalid(format!("{} without a resource operand", inst.opcode)))?;
        let d = dinfo.dst(0);
        let s = |i: usize| sinfo.src(i);

        let (mut stypeprefix, mut dtypeprefix, stypecast) = if src.file == File::Image {
            let image = self.image_decl(i64::from(sinfo.sreg_index))?;
            match internal_format_string(image.format).1 {
                ReturnType::Sint => (
                    TypeQualifier::FloatBitsToInt,
                    TypeQualifier::IntBitsToFloat,
                    TypeQualifier::Int,
                ),
                ReturnType::Float => {
                    self.reqs.require(ShaderReq::ES31_COMPAT);
                    (TypeQualifier::None, TypeQualifier::None, TypeQualifier::Float)
                }
                _ => (
                    TypeQualifier::FloatBitsToUint,
                    TypeQualifier::UintBitsToFloat,
                    TypeQualifier::Uint,
                ),
            }
        } else {
            (
                TypeQualifier::FloatBitsToUint,
                TypeQualifier::UintBitsToFloat,
                TypeQualifier::Uint,
            )
        };

        let (opname, is_cas) =
            atomic_opname(inst.opcode).ok_or(TranslateError::UnsupportedOpcode {
                opcode: inst.opcode,
                inst_index,
            })?;
        let cas = if is_cas {
            format!(", {stypecast}({stypeprefix}({}))", s(3))
        } else {
            String::new()
        };

        match src.file {
            File::Image => {
                let image = self.image_decl(i64::from(sinfo.sreg_index))?;
                let (cp, is_ms) = coord_prefix(image.target);
                let conversion = if sinfo.no_cast(1) {
                    ""
                } else {
                    "floatBitsToInt"
                };
                let ms = if is_ms {
                    format!(", int({}.w)", s(1))
                } else {
                    String::new()
                };
                emit!(
                    self.body,
                    "{d} = {dtypeprefix}(imageAtomic{opname}({}, {cp}({conversion}({})){ms}, {stypecast}({stypeprefix}({})){cas}));\n",
                    s(0),
                    s(1),
                    s(2)
                );
                self.reqs.require(ShaderReq::IMAGE_ATOMIC);
            }
            File::Buffer | File::Memory => {
                let ty = if self.is_integer_memory(src.file, src.index.max(0) as u32) {
                    dtypeprefix = TypeQualifier::IntBitsToFloat;
                    stypeprefix = TypeQualifier::FloatBitsToInt;
                    TypeQualifier::Int
                } else {
                    dtypeprefix = TypeQualifier::UintBitsToFloat;
                    stypeprefix = TypeQualifier::FloatBitsToUint;
                    TypeQualifier::Uint
                };
                emit!(
                    self.body,
                    "{d} = {dtypeprefix}(atomic{opname}({}[int(floatBitsToInt({})) >> 2], {ty}({stypeprefix}({}).x){cas}));\n",
                    s(0),
                    s(1),
                    s(2)
                );
            }
            File::HwAtomic => match sinfo.imm_value {
                -1 => emit!(
                    self.body,
                    "{d} = {dtypeprefix}(atomicCounterDecrement({}) + 1u);\n",
                    s(0)
                ),
                1 => emit!(
                    self.body,
                    "{d} = {dtypeprefix}(atomicCounterIncrement({}));\n",
                    s(0)
                ),
                _ => emit!(
                    self.body,
                    "{d} = {dtypeprefix}(atomicCounter{opname}ARB({}, floatBitsToUint({}).x{cas}));\n",
                    s(0),
                    s(2)
                ),
            },
            file => {
                return Err(invalid(format!(
                    "{} on register file {file}",
                    inst.opcode
                )))
            }
        }
        Ok(())
    }

    /// Size and sample count queries of images and buffers.
    pub(crate) fn translate_resq(
        &mut self,
        inst: &Instruction,
        sinfo: &SrcInfo,
        dinfo: &DstInfo,
    ) -> Result<(), TranslateError> {
        let src = inst
            .src
            .first()
            .ok_or_else(|| invalid("RESQ without a resource operand"))?;
        let d = dinfo.dst(0);
        let s0 = sinfo.src(0);

        match src.file {
            File::Image => {
                let mask = inst.dst.first().map_or(WriteMask::NONE, |r| r.write_mask);
                if mask.contains(0x8) {
                    self.reqs.require(ShaderReq::TXQS | ShaderReq::INTS);
                    emit!(self.body, "{d} = intBitsToFloat(imageSamples({s0}));\n");
                }
                if mask.0 & 0x7 != 0 {
                    self.reqs.require(ShaderReq::IMAGE_SIZE | ShaderReq::INTS);
                    let target = inst.memory.map(|m| m.texture).unwrap_or_default();
                    let wm = if matches!(target, TextureTarget::Buffer | TextureTarget::Tex1D) {
                        ""
                    } else {
                        dinfo.writemask.as_str()
                    };
                    emit!(self.body, "{d} = intBitsToFloat(imageSize({s0}){wm});\n");
                }
            }
            File::Buffer => {
                emit!(self.body, "{d} = intBitsToFloat(int({s0}.length()) << 2);\n");
            }
            file => return Err(invalid(format!("RESQ on register file {file}"))),
        }
        Ok(())
    }

    /// `MEMBAR` with the scope held in an immediate.
    pub(crate) fn emit_membar(&mut self, inst: &Instruction) -> Result<(), TranslateError> {
        let src = inst
            .src
            .first()
            .ok_or_else(|| invalid("MEMBAR without a scope operand"))?;
        let imm = self.immediate(i64::from(src.index))?;
        let flags = MembarFlags::from_bits_truncate(imm.u32(usize::from(src.swizzle.x() & 3)));
        let all = MembarFlags::SHADER_BUFFER
            | MembarFlags::ATOMIC_BUFFER
            | MembarFlags::SHADER_IMAGE
            | MembarFlags::SHARED;

        if flags.contains(MembarFlags::THREAD_GROUP) {
            self.body.append("groupMemoryBarrier();\n");
        } else if flags.contains(all) {
            self.body.append("memoryBarrier();\n");
        } else {
            for (flag, call) in [
                (MembarFlags::SHADER_BUFFER, "memoryBarrierBuffer();\n"),
                (MembarFlags::ATOMIC_BUFFER, "memoryBarrierAtomic();\n"),
                (MembarFlags::SHADER_IMAGE, "memoryBarrierImage();\n"),
                (MembarFlags::SHARED, "memoryBarrierShared();\n"),
            ] {
                if flags.contains(flag) {
                    self.body.append(call);
                }
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;
    use vrend_tgsi::test_utils::{dst, dst_mask, src, src_dim, src_swz};
    use vrend_tgsi::{ImageFormat, Immediate, MemoryInfo, Opcode, Processor, ScanInfo};

    use super::*;
    use crate::config::{ShaderConfig, ShaderKey};
    use crate::context::{Abo, TempRange};

    fn compute_ctx<'a>(cfg: &'a ShaderConfig, key: &'a ShaderKey) -> Context<'a> {
        let mut ctx = Context::new(cfg, key, None, Processor::Compute, ScanInfo::default(), 0);
        ctx.temp_ranges.push(TempRange {
            first: 0,
            last: 3,
            array_id: 0,
        });
        ctx
    }

    fn operands(ctx: &mut Context<'_>, inst: &Instruction) -> (SrcInfo, DstInfo) {
        let d = ctx.destination_info(inst).unwrap();
        let s = ctx.source_info(inst).unwrap();
        (s, d)
    }

    #[test]
    fn buffer_store_writes_each_component() {
        let cfg = ShaderConfig::default();
        let key = ShaderKey::default();
        let mut ctx = compute_ctx(&cfg, &key);
        let inst = Instruction {
            dst: vec![dst_mask(File::Buffer, 0, 0b0011)],
            src: vec![src(File::Temporary, 1), src(File::Temporary, 2)],
            ..Instruction::new(Opcode::Store)
        };
        let (s, d) = operands(&mut ctx, &inst);
        ctx.translate_store(&inst, &s, &d).unwrap();
        assert_eq!(
            ctx.body.as_str(),
            "csssbocontents0[uint(floatBitsToUint( temp0[1] ))>>2] = floatBitsToUint( temp0[2] ).x;\n\
             csssbocontents0[(uint(floatBitsToUint( temp0[1] ))>>2)+1u] = floatBitsToUint( temp0[2] ).y;\n"
        );
    }

    #[test]
    fn atomic_buffer_loads_go_through_atomic_or() {
        let cfg = ShaderConfig::default();
        let key = ShaderKey::default();
        let mut ctx = compute_ctx(&cfg, &key);
        ctx.ssbo_atomic_mask = 1;
        let inst = Instruction {
            dst: vec![dst_mask(File::Temporary, 0, 0b0001)],
            src: vec![src(File::Buffer, 0), src(File::Temporary, 1)],
            ..Instruction::new(Opcode::Load)
        };
        let (s, d) = operands(&mut ctx, &inst);
        ctx.translate_load(&inst, &s, &d).unwrap();
        assert_eq!(
            ctx.body.as_str(),
            "ssbo_addr_temp = uint(floatBitsToUint( temp0[1] )) >> 2;\n\
             temp0[0].x = (uintBitsToFloat(atomicOr(csssbocontents0[ssbo_addr_temp], uint(0))));\n"
        );
    }

    #[test]
    fn image_store_casts_by_format() {
        let cfg = ShaderConfig::default();
        let key = ShaderKey::default();
        let mut ctx = compute_ctx(&cfg, &key);
        ctx.images[1] = Some(DeclImage {
            target: TextureTarget::Tex2D,
            format: ImageFormat::R32Uint,
            writable: true,
        });
        let inst = Instruction {
            dst: vec![dst(File::Image, 1)],
            src: vec![src(File::Temporary, 1), src(File::Temporary, 2)],
            memory: Some(MemoryInfo {
                texture: TextureTarget::Tex2D,
                format: ImageFormat::R32Uint,
            }),
            ..Instruction::new(Opcode::Store)
        };
        let (s, d) = operands(&mut ctx, &inst);
        ctx.translate_store(&inst, &s, &d).unwrap();
        assert_eq!(
            ctx.body.as_str(),
            "imageStore(csimg1,ivec2(floatBitsToInt( temp0[1] )),floatBitsToUint( temp0[2] ));\n"
        );
    }

    #[test]
    fn undeclared_image_is_rejected() {
        let cfg = ShaderConfig::default();
        let key = ShaderKey::default();
        let mut ctx = compute_ctx(&cfg, &key);
        let inst = Instruction {
            dst: vec![dst(File::Temporary, 0)],
            src: vec![src(File::Image, 4), src(File::Temporary, 1)],
            ..Instruction::new(Opcode::Load)
        };
        let (s, d) = operands(&mut ctx, &inst);
        assert!(ctx.translate_load(&inst, &s, &d).is_err());
    }

    #[test]
    fn counter_increment_by_one() {
        let cfg = ShaderConfig::default();
        let key = ShaderKey::default();
        let mut ctx = compute_ctx(&cfg, &key);
        ctx.abos.push(Abo {
            binding: 0,
            size: 1,
            offset: 0,
        });
        ctx.immediates.push(Immediate::int([1, 0, 0, 0]));
        let inst = Instruction {
            dst: vec![dst(File::Temporary, 0)],
            src: vec![
                src_dim(File::HwAtomic, 0, 0),
                src(File::Temporary, 1),
                src_swz(File::Immediate, 0, [0, 0, 0, 0]),
            ],
            ..Instruction::new(Opcode::AtomUadd)
        };
        let (s, d) = operands(&mut ctx, &inst);
        ctx.translate_atomic(&inst, &s, &d, 0).unwrap();
        assert_eq!(
            ctx.body.as_str(),
            "temp0[0] = uintBitsToFloat(atomicCounterIncrement(ac0));\n"
        );
    }

    #[test]
    fn buffer_compare_and_swap() {
        let cfg = ShaderConfig::default();
        let key = ShaderKey::default();
        let mut ctx = compute_ctx(&cfg, &key);
        let inst = Instruction {
            dst: vec![dst(File::Temporary, 0)],
            src: vec![
                src(File::Buffer, 0),
                src(File::Temporary, 1),
                src(File::Temporary, 2),
                src(File::Temporary, 3),
            ],
            ..Instruction::new(Opcode::AtomCas)
        };
        let (s, d) = operands(&mut ctx, &inst);
        ctx.translate_atomic(&inst, &s, &d, 0).unwrap();
        assert_eq!(
            ctx.body.as_str(),
            "temp0[0] = uintBitsToFloat(atomicCompSwap(csssbocontents0[int(floatBitsToInt( temp0[1] )) >> 2], uint(floatBitsToUint( temp0[2] ).x), uint(floatBitsToUint( temp0[3] ))));\n"
        );
    }

    #[test]
    fn buffer_size_query() {
        let cfg = ShaderConfig::default();
        let key = ShaderKey::default();
        let mut ctx = compute_ctx(&cfg, &key);
        let inst = Instruction {
            dst: vec![dst(File::Temporary, 0)],
            src: vec![src(File::Buffer, 2)],
            ..Instruction::new(Opcode::Resq)
        };
        let (s, d) = operands(&mut ctx, &inst);
        ctx.translate_resq(&inst, &s, &d).unwrap();
        assert_eq!(
            ctx.body.as_str(),
            "temp0[0] = intBitsToFloat(int(csssbocontents2.length()) << 2);\n"
        );
    }

    #[test]
    fn memory_barrier_scopes() {
        let cfg = ShaderConfig::default();
        let key = ShaderKey::default();
        let mut ctx = compute_ctx(&cfg, &key);
        ctx.immediates.push(Immediate::uint([0b0101, 0b1111, 0b10000, 0]));
        for lane in 0..3 {
            let inst = Instruction {
                src: vec![src_swz(File::Immediate, 0, [lane, lane, lane, lane])],
                ..Instruction::new(Opcode::Membar)
            };
            ctx.emit_membar(&inst).unwrap();
        }
        assert_eq!(
            ctx.body.as_str(),
            "memoryBarrierBuffer();\nmemoryBarrierImage();\nmemoryBarrier();\ngroupMemoryBarrier();\n"
        );
    }
}

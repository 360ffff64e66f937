//! Texture sampling and query instructions.

use vrend_tgsi::{File, Instruction, Opcode, ReturnType, TexOffset, TextureTarget, WriteMask};

use crate::context::{Context, MAX_SAMPLERS};
use crate::error::{invalid, TranslateError};
use crate::operands::{DstInfo, SrcInfo};
use crate::require::ShaderReq;
use crate::strbuf::emit;
use crate::types::{swizzle_char, writemask_suffix, TypeQualifier};

fn texture_target(inst: &Instruction) -> Result<TextureTarget, TranslateError> {
    inst.texture
        .as_ref()
        .map(|t| t.target)
        .ok_or_else(|| invalid(format!("{} without texture information", inst.opcode)))
}

fn num_offsets(inst: &Instruction) -> usize {
    inst.texture.as_ref().map_or(0, |t| t.offsets.len())
}

/// Suffix of the GLSL `texture*` builtin for a sampling opcode.
fn tex_suffix(opcode: Opcode, target: TextureTarget, offsets: usize) -> &'static str {
    use TextureTarget::*;
    match opcode {
        Opcode::Lodq => "QueryLOD",
        Opcode::Txp if matches!(target, Cube | Array2D | Array1D) => "",
        Opcode::Txp if offsets == 1 => "ProjOffset",
        Opcode::Txp => "Proj",
        Opcode::Txl | Opcode::Txl2 if offsets == 1 => "LodOffset",
        Opcode::Txl | Opcode::Txl2 => "Lod",
        Opcode::Txd if offsets == 1 => "GradOffset",
        Opcode::Txd => "Grad",
        Opcode::Tg4 if offsets == 4 => "GatherOffsets",
        Opcode::Tg4 if offsets == 1 => "GatherOffset",
        Opcode::Tg4 => "Gather",
        _ if offsets == 1 => "Offset",
        _ => "",
    }
}

/// Coordinate mask and `texelFetch` coordinate constructor of a target.
fn coord_mask(opcode: Opcode, target: TextureTarget) -> (WriteMask, TypeQualifier) {
    use TextureTarget::*;
    let projected = opcode == Opcode::Txp;
    match target {
        Tex1D | Buffer => (
            if projected { WriteMask::NONE } else { WriteMask::X },
            TypeQualifier::Int,
        ),
        Array1D => (WriteMask::XY, TypeQualifier::IVec2),
        Tex2D | Rect => (
            if projected { WriteMask::NONE } else { WriteMask::XY },
            TypeQualifier::IVec2,
        ),
        Shadow1D | Shadow2D | ShadowArray1D | ShadowRect | Tex3D => {
            let mask = if projected {
                WriteMask::NONE
            } else if opcode == Opcode::Tg4 {
                WriteMask::XY
            } else {
                WriteMask::XYZ
            };
            (mask, TypeQualifier::IVec3)
        }
        Cube | Array2D => (WriteMask::XYZ, TypeQualifier::IVec3),
        Msaa2D => (WriteMask::XY, TypeQualifier::IVec2),
        ArrayMsaa2D => (WriteMask::XYZ, TypeQualifier::IVec3),
        _ => {
            let mask = if opcode == Opcode::Tg4 && !matches!(target, CubeArray | ShadowCubeArray) {
                WriteMask::XYZ
            } else {
                WriteMask::NONE
            };
            (mask, TypeQualifier::None)
        }
    }
}

/// Components of the derivatives passed to `textureGrad`.
fn gradient_mask(target: TextureTarget) -> WriteMask {
    use TextureTarget::*;
    match target {
        Tex1D | Shadow1D | Array1D | ShadowArray1D => WriteMask::X,
        Tex2D | Shadow2D | Array2D | ShadowArray2D | Rect | ShadowRect => WriteMask::XY,
        Tex3D | Cube | ShadowCube | CubeArray => WriteMask::XYZ,
        _ => WriteMask::NONE,
    }
}

/// Number of offset components a target takes, or `None` when offsets are not allowed.
fn offset_components(target: TextureTarget) -> Option<usize> {
    use TextureTarget::*;
    match target {
        Tex1D | Array1D | Shadow1D | ShadowArray1D => Some(1),
        Rect | ShadowRect | Tex2D | Array2D | Shadow2D | ShadowArray2D => Some(2),
        Tex3D => Some(3),
        _ => None,
    }
}

impl Context<'_> {
    /// Records the sampler's target and the requirements it implies.
    ///
    /// Returns whether the target is a depth-compare target.
    fn set_texture_reqs(
        &mut self,
        target: TextureTarget,
        sreg_index: u32,
    ) -> Result<bool, TranslateError> {
        let slot = sreg_index as usize;
        if slot >= MAX_SAMPLERS {
            return Err(TranslateError::CapacityExceeded {
                kind: "sampler views",
                index: sreg_index,
                max: MAX_SAMPLERS as u32,
            });
        }
        self.samplers[slot].target = target;

        use TextureTarget::*;
        let is_shad = match target {
            Tex1D | Tex2D | Tex3D | Cube | Array1D | Array2D => false,
            ShadowCubeArray => {
                self.reqs.require(ShaderReq::CUBE_ARRAY);
                true
            }
            CubeArray => {
                self.reqs.require(ShaderReq::CUBE_ARRAY);
                false
            }
            Msaa2D | ArrayMsaa2D => {
                self.reqs.require(ShaderReq::SAMPLER_MS);
                false
            }
            Buffer => {
                self.uses_sampler_buf = true;
                false
            }
            ShadowRect => {
                self.reqs.require(ShaderReq::SAMPLER_RECT);
                true
            }
            Rect => {
                self.reqs.require(ShaderReq::SAMPLER_RECT);
                false
            }
            Shadow1D | Shadow2D | ShadowCube | ShadowArray1D | ShadowArray2D => true,
            Unknown => {
                return Err(TranslateError::UnsupportedTextureTarget {
                    target,
                    context: "texture instruction",
                })
            }
        };

        if self.cfg.glsl_version >= 140
            && (self.reqs.has(ShaderReq::SAMPLER_RECT) || self.uses_sampler_buf)
        {
            self.reqs.require_version(140);
        }
        Ok(is_shad)
    }

    /// `, ivecN(...)` argument for a texel offset operand.
    fn offset_argument(
        &self,
        target: TextureTarget,
        offset: &TexOffset,
    ) -> Result<String, TranslateError> {
        let components = offset_components(target).ok_or(
            TranslateError::UnsupportedTextureTarget {
                target,
                context: "texel offset",
            },
        )?;
        let lanes = [offset.swizzle_x, offset.swizzle_y, offset.swizzle_z];

        let values: Vec<String> = match offset.file {
            File::Immediate => {
                let imm = self.immediate(i64::from(offset.index))?;
                lanes[..components]
                    .iter()
                    .map(|&l| imm.i32(usize::from(l & 3)).to_string())
                    .collect()
            }
            File::Temporary => {
                let range = self.temp_range(i64::from(offset.index))?;
                let idx = offset.index - range.first;
                lanes[..components]
                    .iter()
                    .map(|&l| {
                        format!(
                            "floatBitsToInt(temp{}[{idx}].{})",
                            range.first,
                            swizzle_char(l)
                        )
                    })
                    .collect()
            }
            File::Input => {
                let input = self
                    .inputs
                    .iter()
                    .rev()
                    .find(|v| v.first == offset.index)
                    .ok_or_else(|| {
                        invalid(format!("texel offset input {} is not declared", offset.index))
                    })?;
                lanes[..components]
                    .iter()
                    .map(|&l| format!("floatBitsToInt({}.{})", input.glsl_name, swizzle_char(l)))
                    .collect()
            }
            file => return Err(invalid(format!("texel offset in register file {file}"))),
        };

        Ok(match components {
            1 => format!(", int({})", values[0]),
            n => format!(", ivec{n}({})", values.join(", ")),
        })
    }

    pub(crate) fn translate_tex(
        &mut self,
        inst: &Instruction,
        sinfo: &SrcInfo,
        dinfo: &DstInfo,
    ) -> Result<(), TranslateError> {
        let opcode = inst.opcode;
        let target = texture_target(inst)?;
        let offsets = num_offsets(inst);
        let is_shad = self.set_texture_reqs(target, sinfo.sreg_index)?;

        let dtypeprefix = match self.samplers[sinfo.sreg_index as usize].return_type {
            ReturnType::Sint if dinfo.dstconv != TypeQualifier::Int => {
                TypeQualifier::IntBitsToFloat
            }
            ReturnType::Uint if dinfo.dstconv != TypeQualifier::Int => {
                TypeQualifier::UintBitsToFloat
            }
            _ => TypeQualifier::None,
        };

        if opcode == Opcode::Lodq {
            self.reqs.require(ShaderReq::LODQ);
        }

        let (twm, txfi) = coord_mask(opcode, target);
        let gwm = if opcode == Opcode::Txd {
            gradient_mask(target)
        } else {
            WriteMask::NONE
        };

        let s = |i: usize| sinfo.src(i);
        let mut sampler_index = 1;
        let mut bias = String::new();
        match opcode {
            Opcode::Txb2 | Opcode::Txl2 | Opcode::Tex2 => {
                sampler_index = 2;
                if opcode != Opcode::Tex2 {
                    bias = format!(", {}.x", s(1));
                } else if target == TextureTarget::ShadowCubeArray {
                    bias = format!(", float({})", s(1));
                }
            }
            Opcode::Txb | Opcode::Txl => bias = format!(", {}.w", s(0)),
            Opcode::Txf => {
                use TextureTarget::*;
                if matches!(
                    target,
                    Tex1D | Tex2D | Msaa2D | ArrayMsaa2D | Tex3D | Array1D | Array2D
                ) {
                    bias = format!(", int({}.w)", s(0));
                }
            }
            Opcode::Txd => {
                let g = writemask_suffix(gwm);
                bias = format!(", {}{g}, {}{g}", s(1), s(2));
                sampler_index = 3;
            }
            Opcode::Tg4 => {
                use TextureTarget::*;
                sampler_index = 2;
                self.reqs.require(ShaderReq::TG4);
                if !self.cfg.use_gles
                    && (offsets > 1 || is_shad || self.reqs.has(ShaderReq::SAMPLER_RECT))
                {
                    self.reqs.require(ShaderReq::GPU_SHADER5);
                }
                if offsets == 1 {
                    let first = inst.texture.as_ref().and_then(|t| t.offsets.first());
                    if first.is_some_and(|o| o.file != File::Immediate) {
                        self.reqs.require(ShaderReq::GPU_SHADER5);
                    }
                }
                if is_shad {
                    bias = match target {
                        ShadowCube | ShadowArray2D => format!(", {}.w", s(0)),
                        ShadowCubeArray => format!(", {}.x", s(1)),
                        _ => format!(", {}.z", s(0)),
                    };
                } else if sinfo.tg4_has_component {
                    let with_component = if offsets == 0 {
                        matches!(target, Tex2D | Rect | Cube | Array2D | CubeArray)
                    } else {
                        matches!(target, Tex2D | Rect | Array2D)
                    };
                    if with_component {
                        bias = format!(", int({})", s(1));
                    }
                }
            }
            _ => {}
        }

        let ext = tex_suffix(opcode, target, offsets);

        let mut offbuf = String::new();
        if offsets == 1 {
            if let Some(offset) = inst.texture.as_ref().and_then(|t| t.offsets.first()) {
                offbuf = self.offset_argument(target, offset)?;
            }
            if matches!(opcode, Opcode::Txl | Opcode::Txl2 | Opcode::Txd)
                || (opcode == Opcode::Tg4 && is_shad)
            {
                core::mem::swap(&mut offbuf, &mut bias);
            }
        }

        let d = dinfo.dst(0);
        let dc = dinfo.dstconv;
        let samp = s(sampler_index);
        let coord = s(0);
        let twm = writemask_suffix(twm);
        let wm = dinfo.writemask.as_str();
        let dst_wm = if dinfo.no_wm(0) { "" } else { wm };

        if opcode == Opcode::Txf {
            emit!(
                self.body,
                "{d} = {dc}({dtypeprefix}(texelFetch{ext}({samp}, {txfi}({coord}{twm}){bias}{offbuf}){dst_wm}));\n"
            );
        } else if self.cfg.glsl_version < 140
            && self.reqs.has(ShaderReq::SAMPLER_RECT)
            && matches!(target, TextureTarget::Rect | TextureTarget::ShadowRect)
        {
            if target == TextureTarget::Rect {
                emit!(self.body, "{d} = texture2DRect({samp}, {coord}.xy){wm};\n");
            } else {
                emit!(self.body, "{d} = shadow2DRect({samp}, {coord}.xyz){wm};\n");
            }
        } else if is_shad && opcode != Opcode::Tg4 {
            let cname = self.prefix();
            let index = inst.src.get(sampler_index).map_or(0, |r| r.index);
            emit!(
                self.body,
                "{d} = {dc}({dtypeprefix}(vec4(vec4(texture{ext}({samp}, {coord}{twm}{offbuf}{bias})) * {cname}shadmask{index} + {cname}shadadd{index}){wm}));\n"
            );
        } else if self.cfg.use_gles && target == TextureTarget::Tex1D {
            if opcode == Opcode::Txp {
                emit!(
                    self.body,
                    "{d} = {dc}({dtypeprefix}(texture2D({samp}, vec2({coord}.x / {coord}.w, 0.5)){dst_wm}));\n"
                );
            } else {
                emit!(
                    self.body,
                    "{d} = {dc}({dtypeprefix}(texture2D({samp}, vec2({coord}{twm}{offbuf}{bias}, 0.5)){dst_wm}));\n"
                );
            }
        } else {
            emit!(
                self.body,
                "{d} = {dc}({dtypeprefix}(texture{ext}({samp}, {coord}{twm}{offbuf}{bias}){dst_wm}));\n"
            );
        }
        Ok(())
    }

    /// Size and mip level count queries.
    pub(crate) fn emit_txq(
        &mut self,
        inst: &Instruction,
        sinfo: &SrcInfo,
        dinfo: &DstInfo,
    ) -> Result<(), TranslateError> {
        use TextureTarget::*;
        let target = texture_target(inst)?;
        self.set_texture_reqs(target, sinfo.sreg_index)?;

        let mask = inst.dst.first().map_or(WriteMask::NONE, |d| d.write_mask);
        let d = dinfo.dst(0);
        let samp = sinfo.src(1);
        let bias = if matches!(target, Rect | ShadowRect | Buffer | Msaa2D | ArrayMsaa2D) {
            String::new()
        } else {
            format!(", int({}.w)", sinfo.src(0))
        };

        let mut twm = WriteMask::NONE;
        if mask.contains(0x8) {
            if !matches!(target, Buffer | Rect | Msaa2D | ArrayMsaa2D) {
                self.reqs.require(ShaderReq::TXQ_LEVELS);
                if mask.0 & 0x7 != 0 {
                    twm = WriteMask::W;
                }
                emit!(
                    self.body,
                    "{d}{} = intBitsToFloat(textureQueryLevels({samp}));\n",
                    writemask_suffix(twm)
                );
            }
            if mask.0 & 0x7 != 0 {
                twm = match target {
                    Tex1D | Buffer | Shadow1D => WriteMask::X,
                    Array1D | ShadowArray1D | Tex2D | Shadow2D | Rect | ShadowRect | Cube
                    | ShadowCube | Msaa2D => WriteMask::XY,
                    Tex3D | Array2D | ShadowArray2D | ShadowCubeArray | CubeArray
                    | ArrayMsaa2D => WriteMask::XYZ,
                    Unknown => twm,
                };
            }
        }

        if mask.0 & 0x7 != 0 {
            let returns_vec = !matches!(target, Buffer | Tex1D | Shadow1D);
            emit!(
                self.body,
                "{d}{} = intBitsToFloat(textureSize({samp}{bias})){};\n",
                writemask_suffix(twm),
                if returns_vec { dinfo.writemask.as_str() } else { "" }
            );
        }
        Ok(())
    }

    /// Sample count query of a multisampled sampler.
    pub(crate) fn emit_txqs(
        &mut self,
        inst: &Instruction,
        sinfo: &SrcInfo,
        dinfo: &DstInfo,
    ) -> Result<(), TranslateError> {
        let target = texture_target(inst)?;
        self.reqs.require(ShaderReq::TXQS);
        self.set_texture_reqs(target, sinfo.sreg_index)?;
        if !target.is_msaa() {
            return Err(TranslateError::UnsupportedTextureTarget {
                target,
                context: "sample count query",
            });
        }
        emit!(
            self.body,
            "{} = intBitsToFloat(textureSamples({}));\n",
            dinfo.dst(0),
            sinfo.src(0)
        );
        Ok(())
    }
}

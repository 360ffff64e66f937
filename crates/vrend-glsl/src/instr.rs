//! Per-instruction lowering of the TGSI body.

use tracing::trace;
use vrend_tgsi::{Instruction, Opcode, OpcodeType, Processor};

use crate::context::Context;
use crate::error::TranslateError;
use crate::operands::{DstInfo, SrcInfo};
use crate::require::ShaderReq;
use crate::strbuf::emit;

/// Operand text shared by the statement templates.
struct Operands<'i> {
    d: &'i str,
    s: [&'i str; 4],
    conv: String,
    prefix: String,
    wm: &'i str,
}

impl<'i> Operands<'i> {
    fn new(sinfo: &'i SrcInfo, dinfo: &'i DstInfo) -> Self {
        Self {
            d: dinfo.dst(0),
            s: [sinfo.src(0), sinfo.src(1), sinfo.src(2), sinfo.src(3)],
            conv: dinfo.dstconv.to_string(),
            prefix: dinfo.dtypeprefix.to_string(),
            wm: dinfo.writemask.as_str(),
        }
    }

    /// `dst = conv(prefix(op(src0)) mask);`
    fn op1(&self, op: &str) -> String {
        let Self { d, s, conv, prefix, wm } = self;
        format!("{d} = {conv}({prefix}({op}({}))){wm});\n", s[0])
    }

    /// `dst = conv(prefix((src0 op src1)) mask);`
    fn arit2(&self, op: &str) -> String {
        let Self { d, s, conv, prefix, wm } = self;
        format!("{d} = {conv}({prefix}(({} {op} {})){wm});\n", s[0], s[1])
    }

    fn compare(&self, op: &str, svec4: &str) -> String {
        let Self { d, s, conv, prefix, wm } = self;
        format!(
            "{d} = {conv}({prefix}(({op}({svec4}({}), {svec4}({})))){wm});\n",
            s[0], s[1]
        )
    }

    /// Integer comparisons produce all-ones lanes, reinterpreted as float.
    fn ucompare(&self, op: &str, svec4: &str, udstconv: &str, wm: &str) -> String {
        let Self { d, s, conv, .. } = self;
        format!(
            "{d} = {conv}(uintBitsToFloat({udstconv}({op}({svec4}({}), {svec4}({})){wm}) * {udstconv}(0xffffffff)));\n",
            s[0], s[1]
        )
    }

    fn min_max(&self, op: &str) -> String {
        let Self { d, s, conv, prefix, .. } = self;
        format!("{d} = {conv}({prefix}({op}({}, {})));\n", s[0], s[1])
    }

    /// `dst = conv(prefix(op(src0)));` without a write mask.
    fn call(&self, op: &str) -> String {
        let Self { d, s, conv, prefix, .. } = self;
        format!("{d} = {conv}({prefix}({op}({})));\n", s[0])
    }

    fn dot(&self, vec: &str) -> String {
        let Self { d, s, conv, .. } = self;
        format!("{d} = {conv}(dot({vec}({}), {vec}({})));\n", s[0], s[1])
    }
}

impl Context<'_> {
    /// Lowers one instruction into the body buffer.
    pub(crate) fn translate_instruction(&mut self, inst: &Instruction) -> Result<(), TranslateError> {
        let instno = self.instno;
        self.instno += 1;

        if instno == 0 {
            self.body.append("void main(void)\n{\n");
            if self.processor == Processor::Fragment {
                self.emit_color_select();
            }
            if self.so.is_some() {
                self.prepare_so_movs();
            }
        }

        trace!(instno, opcode = %inst.opcode, "translating instruction");
        let dinfo = self.destination_info(inst)?;
        let sinfo = self.source_info(inst)?;
        let ops = Operands::new(&sinfo, &dinfo);
        let Operands { d, s, conv, prefix, wm } = &ops;
        let svec4 = sinfo.svec4.to_string();
        let udstconv = dinfo.udstconv.to_string();
        let idstconv = dinfo.idstconv.to_string();

        use Opcode::*;
        match inst.opcode {
            Sqrt | Dsqrt => emit!(self.body, "{d} = sqrt(vec4({})){wm};\n", s[0]),
            Lrp => emit!(
                self.body,
                "{d} = mix(vec4({}), vec4({}), vec4({})){wm};\n",
                s[2],
                s[1],
                s[0]
            ),
            Dp2 => self.body.append(&ops.dot("vec2")),
            Dp3 => self.body.append(&ops.dot("vec3")),
            Dp4 => self.body.append(&ops.dot("vec4")),
            Dph => emit!(
                self.body,
                "{d} = {conv}(dot(vec4(vec3({}), 1.0), vec4({})));\n",
                s[0],
                s[1]
            ),
            Max | Dmax | Imax | Umax => self.body.append(&ops.min_max("max")),
            Min | Dmin | Imin | Umin => self.body.append(&ops.min_max("min")),
            Abs | Iabs | Dabs => self.body.append(&ops.op1("abs")),
            KillIf => emit!(
                self.body,
                "if (any(lessThan({}, vec4(0.0))))\ndiscard;\n",
                s[0]
            ),
            If | Uif => {
                emit!(self.body, "if (any(bvec4({}))) {{\n", s[0]);
                self.body.indent();
            }
            Else => {
                self.body.outdent();
                self.body.append("} else {\n");
                self.body.indent();
            }
            Endif => {
                self.body.append("}\n");
                self.body.outdent();
            }
            Kill => self.body.append("discard;\n"),
            Dst => emit!(
                self.body,
                "{d} = vec4(1.0, {s0}.y * {s1}.y, {s0}.z, {s1}.w);\n",
                s0 = s[0],
                s1 = s[1]
            ),
            Lit => emit!(
                self.body,
                "{d} = {conv}(vec4(1.0, max({s0}.x, 0.0), step(0.0, {s0}.x) * pow(max(0.0, {s0}.y), clamp({s0}.w, -128.0, 128.0)), 1.0){wm});\n",
                s0 = s[0]
            ),
            Ex2 => self.body.append(&ops.op1("exp2")),
            Lg2 => self.body.append(&ops.op1("log2")),
            Exp => emit!(
                self.body,
                "{d} = {conv}(vec4(pow(2.0, floor({s0}.x)), {s0}.x - floor({s0}.x), exp2({s0}.x), 1.0){wm});\n",
                s0 = s[0]
            ),
            Log => emit!(
                self.body,
                "{d} = {conv}(vec4(floor(log2({s0}.x)), {s0}.x / pow(2.0, floor(log2({s0}.x))), log2({s0}.x), 1.0){wm});\n",
                s0 = s[0]
            ),
            Cos => self.body.append(&ops.op1("cos")),
            Sin => self.body.append(&ops.op1("sin")),
            Scs => emit!(
                self.body,
                "{d} = {conv}(vec4(cos({s0}.x), sin({s0}.x), 0, 1){wm});\n",
                s0 = s[0]
            ),
            Ddx => self.body.append(&ops.op1("dFdx")),
            Ddy => self.body.append(&ops.op1("dFdy")),
            DdxFine => {
                self.reqs.require(ShaderReq::DERIVATIVE_CONTROL);
                self.body.append(&ops.op1("dFdxFine"));
            }
            DdyFine => {
                self.reqs.require(ShaderReq::DERIVATIVE_CONTROL);
                self.body.append(&ops.op1("dFdyFine"));
            }
            Rcp => emit!(self.body, "{d} = {conv}(1.0/({}));\n", s[0]),
            Drcp => emit!(self.body, "{d} = {conv}(1.0LF/({}));\n", s[0]),
            Flr => self.body.append(&ops.op1("floor")),
            Round => self.body.append(&ops.op1("round")),
            Issg | Ssg => self.body.append(&ops.op1("sign")),
            Ceil => self.body.append(&ops.op1("ceil")),
            Frc | Dfrac => self.body.append(&ops.op1("fract")),
            Trunc => self.body.append(&ops.op1("trunc")),
            Rsq | Drsq => emit!(self.body, "{d} = {conv}(inversesqrt({}.x));\n", s[0]),
            Mov | Fbfetch => {
                let wm = if sinfo.no_wm(0) { "" } else { *wm };
                emit!(self.body, "{d} = {conv}({prefix}({}{wm}));\n", s[0]);
            }
            Add | Dadd => self.body.append(&ops.arit2("+")),
            Uadd => emit!(
                self.body,
                "{d} = {conv}({prefix}(ivec4((uvec4({}) + uvec4({})))){wm});\n",
                s[0],
                s[1]
            ),
            Sub => self.body.append(&ops.arit2("-")),
            Mul | Dmul => self.body.append(&ops.arit2("*")),
            Div | Ddiv => self.body.append(&ops.arit2("/")),
            Umul | Umod | Udiv | Idiv => {
                let (vec, op) = match inst.opcode {
                    Umul => ("uvec4", "*"),
                    Umod => ("uvec4", "%"),
                    Udiv => ("uvec4", "/"),
                    _ => ("ivec4", "/"),
                };
                emit!(
                    self.body,
                    "{d} = {conv}({prefix}(({vec}({}) {op} {vec}({}))){wm});\n",
                    s[0],
                    s[1]
                );
            }
            Ishr | Ushr => self.body.append(&ops.arit2(">>")),
            Shl => self.body.append(&ops.arit2("<<")),
            Mad => emit!(
                self.body,
                "{d} = {conv}(({} * {} + {}){wm});\n",
                s[0],
                s[1],
                s[2]
            ),
            Umad | Dmad => emit!(
                self.body,
                "{d} = {conv}({prefix}(({} * {} + {}){wm}));\n",
                s[0],
                s[1],
                s[2]
            ),
            Or => self.body.append(&ops.arit2("|")),
            And => self.body.append(&ops.arit2("&")),
            Xor => self.body.append(&ops.arit2("^")),
            Mod => self.body.append(&ops.arit2("%")),
            Tex | Tex2 | Txb | Txl | Txb2 | Txl2 | Txd | Txf | Tg4 | Txp | Lodq => {
                self.translate_tex(inst, &sinfo, &dinfo)?
            }
            Txq => self.emit_txq(inst, &sinfo, &dinfo)?,
            Txqs => self.emit_txqs(inst, &sinfo, &dinfo)?,
            I2f => emit!(self.body, "{d} = {conv}(ivec4({}){wm});\n", s[0]),
            I2d => emit!(self.body, "{d} = {conv}(ivec4({}));\n", s[0]),
            D2f => emit!(self.body, "{d} = {conv}({});\n", s[0]),
            U2f => emit!(self.body, "{d} = {conv}(uvec4({}){wm});\n", s[0]),
            U2d => emit!(self.body, "{d} = {conv}(uvec4({}));\n", s[0]),
            F2i => emit!(self.body, "{d} = {conv}({prefix}(ivec4({})){wm});\n", s[0]),
            D2i => emit!(self.body, "{d} = {conv}({prefix}({idstconv}({})));\n", s[0]),
            F2u => emit!(self.body, "{d} = {conv}({prefix}(uvec4({})){wm});\n", s[0]),
            D2u => emit!(self.body, "{d} = {conv}({prefix}({udstconv}({})));\n", s[0]),
            F2d => emit!(self.body, "{d} = {conv}({prefix}({}));\n", s[0]),
            Not => emit!(
                self.body,
                "{d} = {conv}(uintBitsToFloat(~(uvec4({}))));\n",
                s[0]
            ),
            Ineg => emit!(
                self.body,
                "{d} = {conv}(intBitsToFloat(-(ivec4({}))));\n",
                s[0]
            ),
            Dneg => emit!(self.body, "{d} = {conv}(-{});\n", s[0]),
            Seq => self.body.append(&ops.compare("equal", &svec4)),
            Slt => self.body.append(&ops.compare("lessThan", &svec4)),
            Sne => self.body.append(&ops.compare("notEqual", &svec4)),
            Sge => self.body.append(&ops.compare("greaterThanEqual", &svec4)),
            Useq | Fseq | Dseq | Islt | Uslt | Fslt | Dslt | Usne | Fsne | Dsne | Isge | Usge
            | Fsge | Dsge => {
                let op = match inst.opcode {
                    Useq | Fseq | Dseq => "equal",
                    Islt | Uslt | Fslt | Dslt => "lessThan",
                    Usne | Fsne | Dsne => "notEqual",
                    _ => "greaterThanEqual",
                };
                let wm = if matches!(inst.opcode, Dseq | Dslt | Dsne | Dsge) {
                    ".x"
                } else {
                    *wm
                };
                self.body.append(&ops.ucompare(op, &svec4, &udstconv, wm));
            }
            Pow => emit!(self.body, "{d} = {conv}(pow({}, {}));\n", s[0], s[1]),
            Cmp => emit!(
                self.body,
                "{d} = mix({}, {}, greaterThanEqual({}, vec4(0.0))){wm};\n",
                s[1],
                s[2],
                s[0]
            ),
            Ucmp => emit!(
                self.body,
                "{d} = mix({}, {}, notEqual(floatBitsToUint({}), uvec4(0.0))){wm};\n",
                s[2],
                s[1],
                s[0]
            ),
            End => {
                match self.processor {
                    Processor::Vertex => self.vertex_exit(),
                    Processor::TessCtrl => self.emit_clip_dist_movs(),
                    Processor::TessEval => self.tess_eval_exit(),
                    Processor::Fragment => self.fragment_exit()?,
                    Processor::Geometry | Processor::Compute => {}
                }
                self.body.append("}\n");
            }
            Ret => {
                match self.processor {
                    Processor::Vertex => self.vertex_exit(),
                    Processor::Fragment => self.fragment_exit()?,
                    _ => {}
                }
                self.body.append("return;\n");
            }
            Arl => emit!(self.body, "{d} = int(floor({}){wm});\n", s[0]),
            Uarl => emit!(self.body, "{d} = int({});\n", s[0]),
            Xpd => emit!(
                self.body,
                "{d} = {conv}(cross(vec3({}), vec3({})));\n",
                s[0],
                s[1]
            ),
            BgnLoop => {
                self.body.append("do {\n");
                self.body.indent();
            }
            EndLoop => {
                self.body.outdent();
                self.body.append("} while(true);\n");
            }
            Brk => self.body.append("break;\n"),
            Emit => {
                let stream = self.stream_operand(inst)?;
                self.geometry_vertex_exit();
                if stream > 0 {
                    self.reqs.require(ShaderReq::GPU_SHADER5);
                    emit!(self.body, "EmitStreamVertex({stream});\n");
                } else {
                    self.body.append("EmitVertex();\n");
                }
            }
            EndPrim => {
                let stream = self.stream_operand(inst)?;
                if stream > 0 {
                    self.reqs.require(ShaderReq::GPU_SHADER5);
                    emit!(self.body, "EndStreamPrimitive({stream});\n");
                } else {
                    self.body.append("EndPrimitive();\n");
                }
            }
            InterpCentroid => {
                emit!(
                    self.body,
                    "{d} = {conv}({prefix}(vec4(interpolateAtCentroid({})){}));\n",
                    s[0],
                    sinfo.swizzle0
                );
                self.reqs.require(ShaderReq::GPU_SHADER5);
            }
            InterpSample => {
                emit!(
                    self.body,
                    "{d} = {conv}({prefix}(vec4(interpolateAtSample({}, {}.x)){}));\n",
                    s[0],
                    s[1],
                    sinfo.swizzle0
                );
                self.reqs.require(ShaderReq::GPU_SHADER5);
            }
            InterpOffset => {
                emit!(
                    self.body,
                    "{d} = {conv}({prefix}(vec4(interpolateAtOffset({}, {}.xy)){}));\n",
                    s[0],
                    s[1],
                    sinfo.swizzle0
                );
                self.reqs.require(ShaderReq::GPU_SHADER5);
            }
            UmulHi => {
                emit!(
                    self.body,
                    "umulExtended({}, {}, umul_temp, mul_utemp);\n",
                    s[0],
                    s[1]
                );
                emit!(self.body, "{d} = {conv}({prefix}(umul_temp));\n");
                self.reqs.require(ShaderReq::GPU_SHADER5);
                self.write_mul_utemp = true;
            }
            ImulHi => {
                emit!(
                    self.body,
                    "imulExtended({}, {}, imul_temp, mul_itemp);\n",
                    s[0],
                    s[1]
                );
                emit!(self.body, "{d} = {conv}({prefix}(imul_temp));\n");
                self.reqs.require(ShaderReq::GPU_SHADER5);
                self.write_mul_itemp = true;
            }
            Ibfe | Ubfe => {
                emit!(
                    self.body,
                    "{d} = {conv}({prefix}(bitfieldExtract({}, int({}.x), int({}.x))));\n",
                    s[0],
                    s[1],
                    s[2]
                );
                self.reqs.require(ShaderReq::GPU_SHADER5);
            }
            Bfi => {
                emit!(
                    self.body,
                    "{d} = {conv}(uintBitsToFloat(bitfieldInsert({}, {}, int({}), int({}))));\n",
                    s[0],
                    s[1],
                    s[2],
                    s[3]
                );
                self.reqs.require(ShaderReq::GPU_SHADER5);
            }
            Brev | Popc | Lsb | Imsb | Umsb => {
                let func = match inst.opcode {
                    Brev => "bitfieldReverse",
                    Popc => "bitCount",
                    Lsb => "findLSB",
                    _ => "findMSB",
                };
                self.body.append(&ops.call(func));
                self.reqs.require(ShaderReq::GPU_SHADER5);
            }
            Barrier => self.body.append("barrier();\n"),
            Membar => self.emit_membar(inst)?,
            Store => self.translate_store(inst, &sinfo, &dinfo)?,
            Load => self.translate_load(inst, &sinfo, &dinfo)?,
            AtomUadd | AtomXchg | AtomCas | AtomAnd | AtomOr | AtomXor | AtomUmin | AtomUmax
            | AtomImin | AtomImax => self.translate_atomic(inst, &sinfo, &dinfo, instno)?,
            Resq => self.translate_resq(inst, &sinfo, &dinfo)?,
            Clock => {
                self.reqs.require(ShaderReq::SHADER_CLOCK);
                emit!(self.body, "{d} = uintBitsToFloat(clock2x32ARB());\n");
            }
            Nop => {}
            opcode => {
                return Err(TranslateError::UnsupportedOpcode {
                    opcode,
                    inst_index: instno,
                })
            }
        }

        if inst.opcode.dst_type() == OpcodeType::Double {
            if let Some(fp64_dst) = dinfo.fp64_dsts.first() {
                emit!(
                    self.body,
                    "{fp64_dst} = uintBitsToFloat(unpackDouble2x32({d}));\n"
                );
            }
        }
        if inst.saturate {
            emit!(self.body, "{d} = clamp({d}, 0.0, 1.0);\n");
        }
        self.body.check()?;
        Ok(())
    }

    /// Literal stream index of `EMIT`/`ENDPRIM`.
    fn stream_operand(&self, inst: &Instruction) -> Result<u32, TranslateError> {
        match inst.src.first() {
            Some(src) => {
                let imm = self.immediate(i64::from(src.index))?;
                Ok(imm.u32(usize::from(src.swizzle.x() & 3)))
            }
            None => Ok(0),
        }
    }
}

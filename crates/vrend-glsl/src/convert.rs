//! Top-level translation of one TGSI program into GLSL.

use tracing::{debug, trace, warn};
use vrend_tgsi::{scan_program, File, Opcode, Processor, Program, Semantic, Token};

use crate::config::{ShaderConfig, ShaderKey, StreamOutputInfo, MAX_SO_OUTPUTS};
use crate::context::Context;
use crate::error::TranslateError;
use crate::info::{InterpInfo, ShaderInfo};
use crate::require::ShaderReq;

/// A translated shader: GLSL source plus the facts needed to bind it.
#[derive(Debug, Clone, PartialEq)]
pub struct GlslShader {
    pub glsl: String,
    pub info: ShaderInfo,
}

/// Translates `program` for the host described by `cfg`.
///
/// `req_local_mem` sizes the compute `shared` array in bytes. `so_info`
/// lists the outputs captured by transform feedback, if any.
///
/// # Errors
///
/// Fails on the first construct that has no GLSL lowering, or when a fixed
/// capacity (inputs, outputs, samplers, images, immediates, stream outputs)
/// would be exceeded. No partial output is produced.
pub fn convert_shader(
    cfg: &ShaderConfig,
    program: &Program,
    req_local_mem: u32,
    key: &ShaderKey,
    so_info: Option<&StreamOutputInfo>,
) -> Result<GlslShader, TranslateError> {
    let so = so_info.filter(|so| !so.is_empty());
    if let Some(so) = so {
        if so.outputs.len() >= MAX_SO_OUTPUTS {
            return Err(TranslateError::CapacityExceeded {
                kind: "stream outputs",
                index: so.outputs.len() as u32,
                max: MAX_SO_OUTPUTS as u32,
            });
        }
    }

    let processor = program.processor;
    let scan = scan_program(program);
    let mut ctx = Context::new(cfg, key, so, processor, scan, req_local_mem);

    analyze_integer_memory(&mut ctx, program);
    require_initial(&mut ctx);

    for token in &program.tokens {
        match token {
            Token::Declaration(decl) => ctx.declare(decl)?,
            Token::Immediate(imm) => ctx.immediate_token(imm)?,
            Token::Property(prop) => ctx.property(prop),
            Token::Instruction(inst) => ctx.translate_instruction(inst)?,
        }
    }
    ctx.body.check()?;

    ctx.emit_header();
    ctx.emit_ios()?;
    ctx.hdr.check()?;

    let interpinfo = fill_interpolants(&ctx);
    let info = shader_info(&ctx, interpinfo);

    let Context { hdr, body, .. } = ctx;
    let mut glsl = hdr.into_string();
    glsl.push_str(body.as_str());

    debug!(?processor, len = glsl.len(), glsl_ver = info.glsl_ver, "translated shader");
    trace!(%glsl, "generated GLSL");
    Ok(GlslShader { glsl, info })
}

/// Buffers and shared memory touched by signed atomic min/max hold `int`s.
fn analyze_integer_memory(ctx: &mut Context<'_>, program: &Program) {
    for inst in program.instructions() {
        if !matches!(inst.opcode, Opcode::AtomImin | Opcode::AtomImax) {
            continue;
        }
        let Some(src) = inst.src.first() else {
            continue;
        };
        match src.file {
            File::Buffer if (0..32).contains(&src.index) => {
                ctx.ssbo_integer_mask |= 1 << src.index;
            }
            File::Memory => ctx.integer_memory = true,
            _ => {}
        }
    }
}

/// Version and capability floors implied by the scan alone.
fn require_initial(ctx: &mut Context<'_>) {
    if ctx.cfg.use_core_profile && ctx.cfg.glsl_version >= 140 {
        ctx.reqs.require_version(140);
    }
    if ctx.scan.is_dimension_indirect(File::Constant) {
        ctx.reqs.require_version(150);
    }
    if ctx.scan.is_indirect(File::Buffer) || ctx.scan.is_indirect(File::Image) {
        ctx.reqs.require_version(150);
        ctx.reqs.require(ShaderReq::GPU_SHADER5);
    }
    if ctx.scan.is_indirect(File::Sampler) {
        ctx.reqs.require(ShaderReq::GPU_SHADER5);
    }
    if ctx.processor == Processor::Vertex && ctx.key.gs_present {
        ctx.reqs.require_version(150);
    }
}

/// Interpolation of every emitted generic and color input of a consuming stage.
fn fill_interpolants(ctx: &Context<'_>) -> Vec<InterpInfo> {
    if ctx.num_interps == 0
        || matches!(ctx.processor, Processor::Vertex | Processor::Geometry)
    {
        return Vec::new();
    }

    let mut interps = Vec::with_capacity(ctx.num_interps as usize);
    for input in &ctx.inputs {
        if input.predefined_no_emit
            || !matches!(input.name, Semantic::Generic | Semantic::Color)
        {
            continue;
        }
        if interps.len() >= ctx.num_interps as usize {
            warn!(
                index = interps.len(),
                num_interps = ctx.num_interps,
                "mismatch in number of interpolants"
            );
            break;
        }
        interps.push(InterpInfo {
            semantic: input.name,
            index: input.sid,
            interpolate: input.interpolate,
            location: input.location,
        });
    }
    interps
}

fn range_len(indirect: bool, used: bool, len: u32) -> u32 {
    if indirect && used {
        len
    } else {
        0
    }
}

fn shader_info(ctx: &Context<'_>, interpinfo: Vec<InterpInfo>) -> ShaderInfo {
    let has_prop = ctx.has_clip_cull_props();
    let indirect_in = ctx.indirect_inputs();
    let indirect_out = ctx.indirect_outputs();
    let gin = ctx.generic_input_range;
    let pin = ctx.patch_input_range;
    let gout = ctx.generic_output_range;
    let pout = ctx.patch_output_range;

    ShaderInfo {
        samplers_used_mask: ctx.samplers_used,
        images_used_mask: ctx.images_used_mask,
        ubo_used_mask: ctx.ubo_used_mask,
        ssbo_used_mask: ctx.ssbo_used_mask,
        num_consts: ctx.num_consts,
        ubo_indirect: ctx.scan.is_dimension_indirect(File::Constant),
        num_inputs: ctx.inputs.len() as u32,
        num_interps: ctx.num_interps,
        num_outputs: ctx.outputs.len() as u32,
        shadow_samp_mask: ctx.shadow_samp_mask,
        num_indirect_generic_inputs: range_len(indirect_in, gin.used, gin.len()),
        num_indirect_generic_outputs: range_len(indirect_out, gout.used, gout.len()),
        num_indirect_patch_inputs: range_len(indirect_in, pin.used, pin.len()),
        num_indirect_patch_outputs: range_len(indirect_out, pout.used, pout.len()),
        glsl_ver: ctx.reqs.version(),
        shader_req_bits: ctx.reqs.bits(),
        num_ucp: if ctx.key.clip_plane_enable { 8 } else { 0 },
        has_pervertex_out: ctx.vs_has_pervertex,
        has_sample_input: ctx.has_sample_input,
        num_clip_out: if has_prop {
            ctx.num_clip_dist_prop
        } else if ctx.num_clip_dist != 0 {
            ctx.num_clip_dist
        } else {
            8
        },
        num_cull_out: if has_prop { ctx.num_cull_dist_prop } else { 0 },
        gs_out_prim: ctx.gs_out_prim,
        tes_prim: ctx.tes_prim_mode,
        tes_point_mode: ctx.tes_point_mode,
        attrib_input_mask: ctx.attrib_input_mask,
        sampler_arrays: ctx.sampler_arrays.clone(),
        image_arrays: ctx.image_arrays.clone(),
        so_names: ctx.so_names.clone(),
        so_info: ctx.so.cloned().unwrap_or_default(),
        interpinfo,
    }
}

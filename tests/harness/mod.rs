#![allow(dead_code)]

use anyhow::{Context, Result};
use vrend_glsl::{
    convert_shader, patch_vertex_shader_interpolants, GlslShader, ShaderConfig, ShaderKey,
};
use vrend_tgsi::test_utils::{dst, src, ProgramBuilder};
use vrend_tgsi::{File, InterpLocation, Interpolate, Opcode, Processor, Program, Semantic};

pub fn init_tracing() {
    let _ = tracing_subscriber::fmt().with_test_writer().try_init();
}

/// A vertex shader forwarding attribute 0 to the position and to `GENERIC[sid]`.
pub fn passthrough_vertex(sid: u32) -> Program {
    ProgramBuilder::new(Processor::Vertex)
        .input(0, Semantic::Generic, 0)
        .output(0, Semantic::Position, 0)
        .output(1, Semantic::Generic, sid)
        .op(
            Opcode::Mov,
            vec![dst(File::Output, 0)],
            vec![src(File::Input, 0)],
        )
        .op(
            Opcode::Mov,
            vec![dst(File::Output, 1)],
            vec![src(File::Input, 0)],
        )
        .end()
        .build()
}

/// A fragment shader writing `GENERIC[sid]` straight to color 0.
pub fn varying_fragment(sid: u32, interpolate: Interpolate, location: InterpLocation) -> Program {
    ProgramBuilder::new(Processor::Fragment)
        .input_interp(0, Semantic::Generic, sid, interpolate, location)
        .output(0, Semantic::Color, 0)
        .op(
            Opcode::Mov,
            vec![dst(File::Output, 0)],
            vec![src(File::Input, 0)],
        )
        .end()
        .build()
}

/// Translated and linked vertex/fragment pair.
pub struct LinkedPair {
    pub vs: GlslShader,
    pub fs: GlslShader,
}

/// Translates both stages and patches the vertex shader against the fragment shader.
pub fn link(cfg: &ShaderConfig, vs: &Program, fs: &Program, flatshade: bool) -> Result<LinkedPair> {
    init_tracing();
    let key = ShaderKey {
        flatshade,
        ..ShaderKey::default()
    };
    let mut vs = convert_shader(cfg, vs, 0, &key, None).context("translating vertex shader")?;
    let fs = convert_shader(cfg, fs, 0, &key, None).context("translating fragment shader")?;
    patch_vertex_shader_interpolants(cfg, &mut vs.glsl, &vs.info, &fs.info, "vso", flatshade)
        .context("patching interpolants")?;
    Ok(LinkedPair { vs, fs })
}

/// The declaration line of `name` in `glsl`.
pub fn declaration<'a>(glsl: &'a str, name: &str) -> Option<&'a str> {
    let suffix = format!(" {name};");
    glsl.lines().find(|line| line.ends_with(&suffix))
}

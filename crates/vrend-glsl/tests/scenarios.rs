use pretty_assertions::assert_eq;
use vrend_glsl::{convert_shader, GlslShader, ResourceArray, ShaderConfig, ShaderKey, ShaderReq};
use vrend_tgsi::test_utils::{dst, dst_indirect, dst_mask, src, src_dim, src_indirect, src_swz, ProgramBuilder};
use vrend_tgsi::{
    File, ImageFormat, Immediate, Opcode, Processor, Program, ReturnType, Semantic, TextureTarget,
};

fn init_tracing() {
    let _ = tracing_subscriber::fmt().with_test_writer().try_init();
}

fn compile(program: &Program, key: &ShaderKey) -> anyhow::Result<GlslShader> {
    init_tracing();
    Ok(convert_shader(&ShaderConfig::default(), program, 0, key, None)?)
}

#[test]
fn fragment_constant_to_color() -> anyhow::Result<()> {
    let program = ProgramBuilder::new(Processor::Fragment)
        .constants(0, 0)
        .output(0, Semantic::Color, 0)
        .op(
            Opcode::Mov,
            vec![dst(File::Output, 0)],
            vec![src(File::Constant, 0)],
        )
        .end()
        .build();
    let shader = compile(&program, &ShaderKey::default())?;

    assert!(shader.glsl.contains("uniform uvec4 fsconst0[1];\n"));
    assert!(shader.glsl.ends_with(
        "void main(void)\n{\nfsout_c0 = vec4((uintBitsToFloat(fsconst0[0])));\n}\n"
    ));
    assert!(!shader.glsl.contains("discard"));
    assert_eq!(shader.info.num_consts, 1);
    assert_eq!(shader.info.num_outputs, 1);
    Ok(())
}

#[test]
fn vertex_stage_defers_flip_to_geometry() -> anyhow::Result<()> {
    let program = ProgramBuilder::new(Processor::Vertex)
        .input(0, Semantic::Generic, 0)
        .output(0, Semantic::Position, 0)
        .output(1, Semantic::Generic, 5)
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
        .build();
    let key = ShaderKey {
        gs_present: true,
        ..ShaderKey::default()
    };
    let shader = compile(&program, &key)?;

    assert!(shader.glsl.starts_with("#version 150\n"));
    assert!(shader.glsl.contains("out vec4 vso_g5;\n"));
    assert!(!shader
        .glsl
        .contains("gl_Position.y = gl_Position.y * winsys_adjust_y;"));

    let standalone = compile(&program, &ShaderKey::default())?;
    assert!(standalone.glsl.starts_with("#version 130\n"));
    assert!(standalone
        .glsl
        .ends_with("gl_Position.y = gl_Position.y * winsys_adjust_y;\n}\n"));
    Ok(())
}

#[test]
fn adjacent_sampler_views_share_an_array() -> anyhow::Result<()> {
    let program = ProgramBuilder::new(Processor::Fragment)
        .temps(0, 0)
        .address(0)
        .output(0, Semantic::Color, 0)
        .sampler(3)
        .sampler(4)
        .sampler_view(3, 3, TextureTarget::Tex2D, ReturnType::Float)
        .sampler_view(4, 4, TextureTarget::Tex2D, ReturnType::Float)
        .tex(
            Opcode::Tex,
            TextureTarget::Tex2D,
            vec![dst(File::Output, 0)],
            vec![src(File::Temporary, 0), src_indirect(File::Sampler, 4)],
            vec![],
        )
        .end()
        .build();
    let shader = compile(&program, &ShaderKey::default())?;

    assert_eq!(
        shader.info.sampler_arrays,
        vec![ResourceArray { first: 3, size: 2 }]
    );
    assert_eq!(shader.info.lookup_sampler_array(4), Some(3));
    assert_eq!(shader.info.lookup_sampler_array(5), None);
    assert_eq!(shader.glsl.matches("sampler2D").count(), 1);
    assert!(shader.glsl.contains("uniform   sampler2D fssamp3[2];\n"));
    assert!(shader.glsl.contains("fssamp3[addr0+1]"));
    Ok(())
}

#[test]
fn mismatched_sampler_views_stay_separate() -> anyhow::Result<()> {
    let program = ProgramBuilder::new(Processor::Fragment)
        .temps(0, 0)
        .address(0)
        .output(0, Semantic::Color, 0)
        .sampler_view(0, 1, TextureTarget::Tex2D, ReturnType::Float)
        .sampler_view(2, 2, TextureTarget::Tex2D, ReturnType::Sint)
        .sampler_view(4, 4, TextureTarget::Tex2D, ReturnType::Sint)
        .tex(
            Opcode::Tex,
            TextureTarget::Tex2D,
            vec![dst(File::Output, 0)],
            vec![src(File::Temporary, 0), src_indirect(File::Sampler, 1)],
            vec![],
        )
        .end()
        .build();
    let shader = compile(&program, &ShaderKey::default())?;

    assert_eq!(
        shader.info.sampler_arrays,
        vec![
            ResourceArray { first: 0, size: 2 },
            ResourceArray { first: 2, size: 1 },
            ResourceArray { first: 4, size: 1 },
        ]
    );
    Ok(())
}

fn indirect_image_load(images: &[(u32, u32, ImageFormat)], index: i32) -> Program {
    let mut builder = ProgramBuilder::new(Processor::Compute)
        .temps(0, 1)
        .address(0);
    for &(first, last, format) in images {
        builder = builder.image(first, last, TextureTarget::Tex2D, format, false);
    }
    builder
        .op(
            Opcode::Load,
            vec![dst(File::Temporary, 0)],
            vec![src_indirect(File::Image, index), src(File::Temporary, 1)],
        )
        .end()
        .build()
}

#[test]
fn adjacent_images_share_an_array() -> anyhow::Result<()> {
    let program = indirect_image_load(
        &[(3, 3, ImageFormat::R32Float), (4, 4, ImageFormat::R32Float)],
        4,
    );
    let shader = compile(&program, &ShaderKey::default())?;

    assert_eq!(
        shader.info.image_arrays,
        vec![ResourceArray { first: 3, size: 2 }]
    );
    assert_eq!(shader.glsl.matches("image2D").count(), 1);
    assert!(shader.glsl.contains("image2D csimg3[2];\n"));
    assert!(shader.glsl.contains("csimg3[addr0 + 1]"));
    Ok(())
}

#[test]
fn mismatched_images_stay_separate() -> anyhow::Result<()> {
    let program = indirect_image_load(
        &[
            (0, 1, ImageFormat::R32Float),
            (2, 2, ImageFormat::R32Uint),
            (4, 4, ImageFormat::R32Uint),
        ],
        1,
    );
    let shader = compile(&program, &ShaderKey::default())?;

    assert_eq!(
        shader.info.image_arrays,
        vec![
            ResourceArray { first: 0, size: 2 },
            ResourceArray { first: 2, size: 1 },
            ResourceArray { first: 4, size: 1 },
        ]
    );
    assert!(shader.glsl.contains("csimg0[addr0 + 1]"));
    Ok(())
}

#[test]
fn unit_counter_steps_use_dedicated_builtins() -> anyhow::Result<()> {
    let program = ProgramBuilder::new(Processor::Compute)
        .temps(0, 1)
        .hw_atomic(0, 0, 0)
        .immediate(Immediate::int([1, 0, 0, 0]))
        .immediate(Immediate::int([-1, 0, 0, 0]))
        .op(
            Opcode::AtomUadd,
            vec![dst(File::Temporary, 0)],
            vec![
                src_dim(File::HwAtomic, 0, 0),
                src(File::Temporary, 1),
                src_swz(File::Immediate, 0, [0, 0, 0, 0]),
            ],
        )
        .op(
            Opcode::AtomUadd,
            vec![dst(File::Temporary, 1)],
            vec![
                src_dim(File::HwAtomic, 0, 0),
                src(File::Temporary, 1),
                src_swz(File::Immediate, 1, [0, 0, 0, 0]),
            ],
        )
        .end()
        .build();
    let shader = compile(&program, &ShaderKey::default())?;

    assert!(shader.glsl.contains("atomicCounterIncrement(ac0)"));
    assert!(shader.glsl.contains("atomicCounterDecrement(ac0) + 1u"));
    assert!(!shader.glsl.contains("ARB("));
    assert!(shader
        .glsl
        .contains("#extension GL_ARB_shader_atomic_counters : require\n"));
    Ok(())
}

#[test]
fn indirect_generic_outputs_become_one_block() -> anyhow::Result<()> {
    let program = ProgramBuilder::new(Processor::Vertex)
        .temps(0, 0)
        .address(0)
        .output(0, Semantic::Position, 0)
        .output_array(1, 5, Semantic::Generic, 2)
        .op(
            Opcode::Mov,
            vec![dst_indirect(File::Output, 1)],
            vec![src(File::Temporary, 0)],
        )
        .op(
            Opcode::Mov,
            vec![dst(File::Output, 3)],
            vec![src(File::Temporary, 0)],
        )
        .end()
        .build();
    let shader = compile(&program, &ShaderKey::default())?;

    assert!(shader.glsl.starts_with("#version 150\n"));
    assert!(shader.glsl.contains("out block { vec4 vso2[5]; } oblk;\n"));
    assert!(!shader.glsl.contains("out vec4 vso_g"));
    assert!(shader.glsl.contains("oblk.vso2[addr0 + 0] = "));
    assert!(shader.glsl.contains("oblk.vso2[2] = "));
    assert_eq!(shader.info.num_outputs, 6);
    assert_eq!(shader.info.num_indirect_generic_outputs, 5);
    Ok(())
}

#[test]
fn size_query_splits_levels_from_dimensions() -> anyhow::Result<()> {
    let program = ProgramBuilder::new(Processor::Fragment)
        .temps(0, 1)
        .sampler(0)
        .sampler_view(0, 0, TextureTarget::Tex2D, ReturnType::Float)
        .tex(
            Opcode::Txq,
            TextureTarget::Tex2D,
            vec![dst_mask(File::Temporary, 0, 0b1011)],
            vec![src(File::Temporary, 1), src(File::Sampler, 0)],
            vec![],
        )
        .end()
        .build();
    let shader = compile(&program, &ShaderKey::default())?;

    let levels = shader
        .glsl
        .lines()
        .filter(|line| line.contains("textureQueryLevels(fssamp0)"))
        .count();
    let sizes = shader
        .glsl
        .lines()
        .filter(|line| line.contains("textureSize(fssamp0"))
        .count();
    assert_eq!((levels, sizes), (1, 1));
    assert!(shader.glsl.contains(".w = intBitsToFloat(textureQueryLevels"));
    assert!(shader.glsl.contains(".xy = intBitsToFloat(textureSize"));
    assert!(shader.info.shader_req_bits.contains(ShaderReq::TXQ_LEVELS));
    assert!(shader
        .glsl
        .contains("#extension GL_ARB_texture_query_levels : require\n"));
    Ok(())
}

use pretty_assertions::assert_eq;
use vrend_glsl::{
    convert_shader, ShaderConfig, ShaderKey, StreamOutput, StreamOutputInfo, TranslateError,
    MAX_SO_OUTPUTS,
};
use vrend_tgsi::test_utils::{dst, dst_mask, src, ProgramBuilder};
use vrend_tgsi::{
    File, ImageFormat, Opcode, Processor, Program, ReturnType, Semantic, TextureTarget,
};

fn translate(program: &Program, key: &ShaderKey) -> Result<vrend_glsl::GlslShader, TranslateError> {
    let _ = tracing_subscriber::fmt().with_test_writer().try_init();
    convert_shader(&ShaderConfig::default(), program, 0, key, None)
}

fn textured_fragment_shader() -> Program {
    ProgramBuilder::new(Processor::Fragment)
        .input(0, Semantic::Generic, 0)
        .input(1, Semantic::Color, 0)
        .output(0, Semantic::Color, 0)
        .temps(0, 2)
        .sampler(0)
        .sampler_view(0, 0, TextureTarget::Tex2D, ReturnType::Float)
        .tex(
            Opcode::Tex,
            TextureTarget::Tex2D,
            vec![dst(File::Temporary, 0)],
            vec![src(File::Input, 0), src(File::Sampler, 0)],
            vec![],
        )
        .op(
            Opcode::Mul,
            vec![dst(File::Output, 0)],
            vec![src(File::Temporary, 0), src(File::Input, 1)],
        )
        .end()
        .build()
}

#[test]
fn translation_is_deterministic() -> anyhow::Result<()> {
    let program = textured_fragment_shader();
    let key = ShaderKey {
        add_alpha_test: true,
        alpha_test: 4,
        alpha_ref_val: 0.25,
        ..ShaderKey::default()
    };
    let first = translate(&program, &key)?;
    let second = translate(&program, &key)?;
    assert_eq!(first, second);
    assert!(first
        .glsl
        .contains("if (!(fsout_c0.w > 0.250000)) {\n\tdiscard;\n}\n"));
    Ok(())
}

#[test]
fn repeated_declarations_are_merged() -> anyhow::Result<()> {
    let program = ProgramBuilder::new(Processor::Fragment)
        .input(0, Semantic::Generic, 1)
        .input(0, Semantic::Generic, 1)
        .output(0, Semantic::Color, 0)
        .output(0, Semantic::Color, 0)
        .op(
            Opcode::Mov,
            vec![dst(File::Output, 0)],
            vec![src(File::Input, 0)],
        )
        .end()
        .build();
    let shader = translate(&program, &ShaderKey::default())?;
    assert_eq!(shader.info.num_inputs, 1);
    assert_eq!(shader.info.num_outputs, 1);
    assert_eq!(shader.glsl.matches("in vec4 vso_g1;\n").count(), 1);
    assert_eq!(shader.glsl.matches("out vec4 fsout_c0;\n").count(), 1);
    Ok(())
}

#[test]
fn input_capacity_fails_the_translation() {
    let program = ProgramBuilder::new(Processor::Vertex)
        .input_array(0, 64, Semantic::Generic, 0)
        .end()
        .build();
    assert!(matches!(
        translate(&program, &ShaderKey::default()),
        Err(TranslateError::CapacityExceeded {
            kind: "inputs",
            max: 64,
            ..
        })
    ));

    let fits = ProgramBuilder::new(Processor::Vertex)
        .input_array(0, 63, Semantic::Generic, 0)
        .end()
        .build();
    assert!(translate(&fits, &ShaderKey::default()).is_ok());
}

#[test]
fn sampler_view_capacity_fails_the_translation() {
    let program = ProgramBuilder::new(Processor::Fragment)
        .sampler_view(30, 32, TextureTarget::Tex2D, ReturnType::Float)
        .end()
        .build();
    assert!(matches!(
        translate(&program, &ShaderKey::default()),
        Err(TranslateError::CapacityExceeded {
            kind: "sampler views",
            max: 32,
            ..
        })
    ));
}

#[test]
fn image_capacity_fails_the_translation() {
    let image = |first, last| {
        ProgramBuilder::new(Processor::Compute)
            .image(first, last, TextureTarget::Tex2D, ImageFormat::R32Float, true)
            .end()
            .build()
    };
    assert!(matches!(
        translate(&image(30, 32), &ShaderKey::default()),
        Err(TranslateError::CapacityExceeded {
            kind: "images",
            max: 32,
            ..
        })
    ));
    assert!(translate(&image(30, 31), &ShaderKey::default()).is_ok());
}

#[test]
fn stream_output_capacity_fails_the_translation() {
    let program = ProgramBuilder::new(Processor::Vertex)
        .output(0, Semantic::Position, 0)
        .end()
        .build();
    let so = StreamOutputInfo {
        outputs: vec![
            StreamOutput {
                num_components: 4,
                ..StreamOutput::default()
            };
            MAX_SO_OUTPUTS
        ],
    };
    let result = convert_shader(
        &ShaderConfig::default(),
        &program,
        0,
        &ShaderKey::default(),
        Some(&so),
    );
    assert!(matches!(
        result,
        Err(TranslateError::CapacityExceeded {
            kind: "stream outputs",
            max: 64,
            ..
        })
    ));
}

#[test]
fn reversed_ranges_fail_the_translation() {
    let with_output = |builder: ProgramBuilder| {
        builder.output(0, Semantic::Color, 0).end().build()
    };
    let cases = [
        (
            "sampler view",
            with_output(
                ProgramBuilder::new(Processor::Fragment)
                    .sampler_view(5, 2, TextureTarget::Tex2D, ReturnType::Float),
            ),
        ),
        ("temporary", with_output(ProgramBuilder::new(Processor::Fragment).temps(4, 1))),
        (
            "image",
            ProgramBuilder::new(Processor::Compute)
                .image(5, 2, TextureTarget::Tex2D, ImageFormat::R32Float, false)
                .end()
                .build(),
        ),
        (
            "atomic counter",
            with_output(ProgramBuilder::new(Processor::Fragment).hw_atomic(0, 3, 1)),
        ),
    ];
    for (what, program) in &cases {
        let result = translate(program, &ShaderKey::default());
        assert!(
            matches!(result, Err(TranslateError::Invalid(_))),
            "{what}: {result:?}"
        );
    }
}

#[test]
fn temporary_ranges_must_not_overlap() -> anyhow::Result<()> {
    let program = |second: (u32, u32)| {
        ProgramBuilder::new(Processor::Fragment)
            .output(0, Semantic::Color, 0)
            .temps(0, 3)
            .temps(second.0, second.1)
            .op(
                Opcode::Mov,
                vec![dst(File::Output, 0)],
                vec![src(File::Temporary, 3)],
            )
            .end()
            .build()
    };
    assert!(matches!(
        translate(&program((2, 5)), &ShaderKey::default()),
        Err(TranslateError::Invalid(_))
    ));

    let shader = translate(&program((4, 5)), &ShaderKey::default())?;
    assert!(shader.glsl.contains("vec4 temp0[4];\n"));
    assert!(shader.glsl.contains("vec4 temp4[2];\n"));
    assert!(shader.glsl.contains("temp0[3]"));
    Ok(())
}

#[test]
fn system_value_capacity_fails_the_translation() {
    let mut builder = ProgramBuilder::new(Processor::Vertex);
    for i in 0..33 {
        builder = builder.system_value(i, Semantic::InstanceId);
    }
    assert!(matches!(
        translate(&builder.end().build(), &ShaderKey::default()),
        Err(TranslateError::CapacityExceeded {
            kind: "system values",
            ..
        })
    ));
}

#[test]
fn invalid_alpha_function_fails_the_translation() {
    let key = ShaderKey {
        add_alpha_test: true,
        alpha_test: 9,
        ..ShaderKey::default()
    };
    assert!(matches!(
        translate(&textured_fragment_shader(), &key),
        Err(TranslateError::InvalidAlphaFunc(9))
    ));
}

#[test]
fn extension_pragmas_follow_requirements() -> anyhow::Result<()> {
    let program = ProgramBuilder::new(Processor::Fragment)
        .temps(0, 1)
        .output(0, Semantic::Color, 0)
        .sampler(0)
        .sampler_view(0, 0, TextureTarget::Rect, ReturnType::Float)
        .tex(
            Opcode::Tex,
            TextureTarget::Rect,
            vec![dst(File::Temporary, 0)],
            vec![src(File::Temporary, 1), src(File::Sampler, 0)],
            vec![],
        )
        .op(
            Opcode::Ddx,
            vec![dst_mask(File::Output, 0, 0b0011)],
            vec![src(File::Temporary, 0)],
        )
        .end()
        .build();
    let pragmas = |glsl: &str| -> Vec<String> {
        glsl.lines()
            .filter(|line| line.starts_with("#extension"))
            .map(str::to_owned)
            .collect()
    };

    let legacy = translate(&program, &ShaderKey::default())?;
    assert!(legacy.glsl.starts_with("#version 130\n"));
    assert!(pragmas(&legacy.glsl).contains(&"#extension GL_ARB_texture_rectangle : require".to_owned()));

    let cfg = ShaderConfig {
        glsl_version: 150,
        ..ShaderConfig::default()
    };
    let modern = convert_shader(&cfg, &program, 0, &ShaderKey::default(), None)?;
    assert!(modern.glsl.starts_with("#version 140\n"));
    assert!(!pragmas(&modern.glsl).iter().any(|p| p.contains("texture_rectangle")));
    assert!(pragmas(&modern.glsl).iter().all(|p| p.ends_with(" : require")));
    Ok(())
}

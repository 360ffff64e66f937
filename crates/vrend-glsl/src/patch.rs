//! In-place interpolation fix-up of a producer stage once its consumer is known.
//!
//! Vertex-like stages are emitted with a blank [`INTERP_PREFIX`] in front of
//! every interpolated output. When the fragment shader it links against has
//! been translated, the blanks are overwritten with the qualifiers the
//! fragment inputs were declared with.

use tracing::{debug, trace};
use vrend_tgsi::Semantic;

use crate::config::ShaderConfig;
use crate::error::PatchError;
use crate::header::{PAD_GPU_MSINTERPOL, PAD_GPU_SHADER5};
use crate::info::ShaderInfo;
use crate::ios::INTERP_PREFIX;
use crate::tables::{aux_string, interp_string};

const GPU_SHADER5_EXT: &str = "#extension GL_ARB_gpu_shader5 : require\n";
const GPU_SHADER5_MSINTERP_EXT: &str = "#extension GL_OES_gpu_shader5 : require\n\
                                        #extension GL_OES_shader_multisample_interpolation : require\n";

/// Rewrites the interpolation placeholders of `program` to match `fs_info`.
///
/// `oprefix` is the varying prefix of the producer (`vso`, `teo`, `gso`).
/// Placeholders whose variable cannot be found are left untouched.
///
/// # Errors
///
/// Fails when the fragment shader interpolates a semantic that has no
/// producer naming rule, or when an extension has to be injected into a
/// program that reserved no room for it.
pub fn patch_vertex_shader_interpolants(
    cfg: &ShaderConfig,
    program: &mut String,
    vs_info: &ShaderInfo,
    fs_info: &ShaderInfo,
    oprefix: &str,
    flatshade: bool,
) -> Result<(), PatchError> {
    if fs_info.interpinfo.is_empty() {
        return Ok(());
    }

    if fs_info.has_sample_input {
        if !cfg.use_gles && cfg.glsl_version >= 320 {
            inject_after_version(program, &[PAD_GPU_SHADER5], GPU_SHADER5_EXT)?;
        }
        if cfg.use_gles && cfg.glsl_version < 320 {
            inject_after_version(
                program,
                &[PAD_GPU_SHADER5, PAD_GPU_MSINTERPOL],
                GPU_SHADER5_MSINTERP_EXT,
            )?;
        }
    }

    for interp in &fs_info.interpinfo {
        let Some(qualifier) = interp_string(cfg.use_gles, interp.interpolate, flatshade) else {
            continue;
        };
        let aux = aux_string(interp.location);
        let sid = interp.index;

        match interp.semantic {
            Semantic::Color | Semantic::BColor => {
                if fs_info.glsl_ver < 140 {
                    let (front, back) = if sid == 1 {
                        ("gl_FrontSecondaryColor", "gl_BackSecondaryColor")
                    } else {
                        ("gl_FrontColor", "gl_BackColor")
                    };
                    replace_interp(program, front, qualifier, aux);
                    replace_interp(program, back, qualifier, aux);
                } else {
                    replace_interp(program, &format!("ex_c{sid}"), qualifier, aux);
                    replace_interp(program, &format!("ex_bc{sid}"), qualifier, aux);
                }
            }
            Semantic::Generic => {
                replace_interp(program, &format!("{oprefix}_g{sid}"), qualifier, aux);
            }
            semantic => return Err(PatchError::UnknownInterpSemantic { semantic }),
        }
    }

    debug!(
        interps = fs_info.interpinfo.len(),
        producer_outputs = vs_info.num_outputs,
        "patched interpolation qualifiers"
    );
    trace!(%program, "GLSL after interpolation patch");
    Ok(())
}

/// Overwrites the reserved lines that follow the `#version` line with `ext`.
fn inject_after_version(program: &mut String, pads: &[&str], ext: &str) -> Result<(), PatchError> {
    let start = program.find('\n').ok_or(PatchError::MissingPadding)? + 1;
    let end = start + ext.len();
    match program.get(start..end) {
        Some(existing) if existing == ext => Ok(()),
        Some(existing) if existing == pads.concat() => {
            program.replace_range(start..end, ext);
            Ok(())
        }
        _ => Err(PatchError::MissingPadding),
    }
}

/// Byte offset of the blank prefix in front of the declaration of `name`.
fn placeholder_offset(program: &str, name: &str) -> Option<usize> {
    let decl = format!("out vec4 {name};");
    let mut line_start = 0;
    for line in program.split_inclusive('\n') {
        let text = line.trim_end_matches('\n');
        if let Some(head) = text.strip_suffix(decl.as_str()) {
            let head = head.strip_suffix("in").unwrap_or(head);
            let head = head.strip_suffix("invariant ").unwrap_or(head);
            let head = head.strip_suffix("precise ").unwrap_or(head);
            if head.len() >= INTERP_PREFIX.len() {
                return Some(line_start + head.len() - INTERP_PREFIX.len());
            }
        }
        line_start += line.len();
    }
    None
}

fn replace_interp(program: &mut String, name: &str, qualifier: &str, aux: &str) {
    let Some(offset) = placeholder_offset(program, name) else {
        trace!(name, "no interpolation placeholder");
        return;
    };
    let mut text = format!("{qualifier}{aux}");
    text.truncate(INTERP_PREFIX.len());
    let replacement = format!("{text:<width$}", width = INTERP_PREFIX.len());
    let range = offset..offset + INTERP_PREFIX.len();
    if program.is_char_boundary(range.start) && program.is_char_boundary(range.end) {
        program.replace_range(range, &replacement);
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;
    use vrend_tgsi::{InterpLocation, Interpolate};

    use super::*;
    use crate::info::InterpInfo;

    fn fs_with(interpinfo: Vec<InterpInfo>) -> ShaderInfo {
        ShaderInfo {
            glsl_ver: 140,
            interpinfo,
            ..ShaderInfo::default()
        }
    }

    fn generic(index: u32, interpolate: Interpolate, location: InterpLocation) -> InterpInfo {
        InterpInfo {
            semantic: Semantic::Generic,
            index,
            interpolate,
            location,
        }
    }

    #[test]
    fn generic_placeholder_is_overwritten() -> anyhow::Result<()> {
        let mut program = format!(
            "#version 130\n{INTERP_PREFIX}out vec4 vso_g1;\n{INTERP_PREFIX}out vec4 vso_g10;\nvoid main(void)\n{{\nvso_g1 = vec4(0.0);\n}}\n"
        );
        let original_len = program.len();
        let fs = fs_with(vec![generic(1, Interpolate::Constant, InterpLocation::Centroid)]);
        patch_vertex_shader_interpolants(
            &ShaderConfig::default(),
            &mut program,
            &ShaderInfo::default(),
            &fs,
            "vso",
            false,
        )?;
        assert_eq!(program.len(), original_len);
        assert_eq!(
            program,
            format!(
                "#version 130\nflat centroid              out vec4 vso_g1;\n{INTERP_PREFIX}out vec4 vso_g10;\nvoid main(void)\n{{\nvso_g1 = vec4(0.0);\n}}\n"
            )
        );
        Ok(())
    }

    #[test]
    fn qualifiers_are_skipped_over() {
        let program = format!("{INTERP_PREFIX}precise invariant out vec4 teo_g0;\n");
        assert_eq!(placeholder_offset(&program, "teo_g0"), Some(0));
        let program = format!("layout (stream = 1) {INTERP_PREFIX}out vec4 gso_g0;\n");
        assert_eq!(placeholder_offset(&program, "gso_g0"), Some(20));
        assert_eq!(placeholder_offset("out vec4 vso_g0;\n", "vso_g0"), None);
    }

    #[test]
    fn default_color_interpolation_is_left_alone() -> anyhow::Result<()> {
        let original = format!("#version 140\n{INTERP_PREFIX}out vec4 ex_c0;\n");
        let mut program = original.clone();
        let fs = fs_with(vec![InterpInfo {
            semantic: Semantic::Color,
            index: 0,
            interpolate: Interpolate::Color,
            location: InterpLocation::Center,
        }]);
        patch_vertex_shader_interpolants(
            &ShaderConfig::default(),
            &mut program,
            &ShaderInfo::default(),
            &fs,
            "vso",
            false,
        )?;
        assert_eq!(program, original);

        patch_vertex_shader_interpolants(
            &ShaderConfig::default(),
            &mut program,
            &ShaderInfo::default(),
            &fs,
            "vso",
            true,
        )?;
        assert!(program.starts_with("#version 140\nflat "));
        Ok(())
    }

    #[test]
    fn legacy_colors_use_builtin_names() -> anyhow::Result<()> {
        let mut program = format!(
            "#version 130\n{INTERP_PREFIX}out vec4 gl_FrontSecondaryColor;\n{INTERP_PREFIX}out vec4 gl_BackSecondaryColor;\n"
        );
        let mut fs = fs_with(vec![InterpInfo {
            semantic: Semantic::Color,
            index: 1,
            interpolate: Interpolate::Perspective,
            location: InterpLocation::Sample,
        }]);
        fs.glsl_ver = 130;
        patch_vertex_shader_interpolants(
            &ShaderConfig::default(),
            &mut program,
            &ShaderInfo::default(),
            &fs,
            "vso",
            false,
        )?;
        assert_eq!(program.matches("smooth sample ").count(), 2);
        Ok(())
    }

    #[test]
    fn unknown_semantic_fails() {
        let mut program = String::from("#version 130\n");
        let fs = fs_with(vec![InterpInfo {
            semantic: Semantic::Fog,
            index: 0,
            interpolate: Interpolate::Perspective,
            location: InterpLocation::Center,
        }]);
        let err = patch_vertex_shader_interpolants(
            &ShaderConfig::default(),
            &mut program,
            &ShaderInfo::default(),
            &fs,
            "vso",
            false,
        )
        .unwrap_err();
        assert_eq!(
            err,
            PatchError::UnknownInterpSemantic {
                semantic: Semantic::Fog
            }
        );
    }

    #[test]
    fn sample_interpolation_injects_extensions() -> anyhow::Result<()> {
        let cfg = ShaderConfig {
            glsl_version: 310,
            use_gles: true,
            ..ShaderConfig::default()
        };
        let mut program = format!(
            "#version 310 es\n{PAD_GPU_SHADER5}{PAD_GPU_MSINTERPOL}{INTERP_PREFIX}out vec4 vso_g0;\n"
        );
        let mut fs = fs_with(vec![generic(0, Interpolate::Perspective, InterpLocation::Sample)]);
        fs.has_sample_input = true;
        patch_vertex_shader_interpolants(&cfg, &mut program, &ShaderInfo::default(), &fs, "vso", false)?;
        assert_eq!(
            program,
            "#version 310 es\n\
             #extension GL_OES_gpu_shader5 : require\n\
             #extension GL_OES_shader_multisample_interpolation : require\n\
             smooth sample              out vec4 vso_g0;\n"
        );

        // Linking the same producer again leaves the pragmas in place.
        patch_vertex_shader_interpolants(&cfg, &mut program, &ShaderInfo::default(), &fs, "vso", false)?;
        assert!(program.contains("GL_OES_gpu_shader5"));
        Ok(())
    }

    #[test]
    fn missing_padding_is_reported() {
        let cfg = ShaderConfig {
            glsl_version: 330,
            ..ShaderConfig::default()
        };
        let mut program = String::from("#version 150\nout vec4 vso_g0;\n");
        let mut fs = fs_with(vec![generic(0, Interpolate::Perspective, InterpLocation::Sample)]);
        fs.has_sample_input = true;
        assert_eq!(
            patch_vertex_shader_interpolants(&cfg, &mut program, &ShaderInfo::default(), &fs, "vso", false),
            Err(PatchError::MissingPadding)
        );
    }
}

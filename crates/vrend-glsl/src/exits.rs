//! Stage epilogues run at `END`, `RET` and per emitted vertex.

use vrend_tgsi::{CompareFunc, Processor, Semantic};

use crate::context::Context;
use crate::error::TranslateError;
use crate::require::ShaderReq;
use crate::strbuf::emit;
use crate::tables::alpha_test_op;
use crate::types::float6;

/// `.yzw`-style selection of a partial capture; the fourth lane is always `w`.
fn so_writemask(start: u32, count: u32) -> String {
    if start == 0 {
        return String::new();
    }
    let mut wm = String::from(".");
    for idx in (start..start + count).take_while(|&idx| idx < 4) {
        wm.push(match idx {
            0 => 'x',
            1 => 'y',
            2 => 'z',
            _ => 'w',
        });
    }
    wm
}

impl Context<'_> {
    /// Decides which captured outputs can be read straight from their own variable.
    pub(crate) fn prepare_so_movs(&mut self) {
        let Some(so) = self.so else { return };
        for (i, out) in so.outputs.iter().enumerate() {
            self.write_so_outputs[i] = true;
            if out.start_component != 0 || out.num_components != 4 {
                continue;
            }
            let Some(var) = self.outputs.get_mut(out.register_index as usize) else {
                continue;
            };
            if matches!(var.name, Semantic::ClipDist | Semantic::Position) {
                continue;
            }
            var.stream = out.stream;
            if self.processor == Processor::Geometry && out.stream != 0 {
                self.reqs.require(ShaderReq::GPU_SHADER5);
            }
            self.write_so_outputs[i] = false;
        }
    }

    pub(crate) fn emit_so_movs(&mut self) {
        let Some(so) = self.so else { return };
        for (i, out) in so.outputs.iter().enumerate() {
            let writemask = so_writemask(out.start_component, out.num_components);
            let var = self.outputs.get(out.register_index as usize);

            self.so_names[i] = if self.write_so_outputs[i] {
                Some(format!("tfout{i}"))
            } else {
                var.map(|var| {
                    if var.name == Semantic::ClipVertex && self.has_clipvertex {
                        self.has_clipvertex_so = true;
                        "clipv_tmp".to_owned()
                    } else {
                        var.glsl_name.clone()
                    }
                })
            };

            let Some(var) = var else { continue };
            let outtype = match out.num_components {
                1 if var.is_int => "intBitsToFloat".to_owned(),
                1 => "float".to_owned(),
                n => format!("vec{n}"),
            };
            if var.name == Semantic::ClipDist {
                emit!(
                    self.body,
                    "tfout{i} = {outtype}(clip_dist_temp[{}]{writemask});\n",
                    var.sid
                );
            } else if self.write_so_outputs[i] {
                emit!(
                    self.body,
                    "tfout{i} = {outtype}({}{writemask});\n",
                    var.glsl_name
                );
            }
        }
    }

    /// Splits `clip_dist_temp[2]` into the scalar clip and cull builtins.
    pub(crate) fn emit_clip_dist_movs(&mut self) {
        let prefix = if self.processor == Processor::TessCtrl {
            "gl_out[gl_InvocationID]."
        } else {
            ""
        };

        if self.num_clip_dist == 0 && self.key.clip_plane_enable {
            let source = if self.has_clipvertex {
                "clipv_tmp"
            } else {
                "gl_Position"
            };
            for i in 0..8 {
                emit!(
                    self.body,
                    "{prefix}gl_ClipDistance[{i}] = dot({source}, clipp[{i}]);\n"
                );
            }
            return;
        }

        let has_prop = self.has_clip_cull_props();
        let ndists = if has_prop {
            self.num_clip_dist_prop + self.num_cull_dist_prop
        } else {
            self.num_clip_dist
        };
        for i in 0..ndists {
            let clipidx = if i < 4 { 0 } else { 1 };
            let wm = ['x', 'y', 'z', 'w'][(i & 3) as usize];
            let is_cull = has_prop && i >= self.num_clip_dist_prop;
            let (kind, idx) = if is_cull {
                ("Cull", i - self.num_clip_dist_prop)
            } else {
                ("Clip", i)
            };
            emit!(
                self.body,
                "{prefix}gl_{kind}Distance[{idx}] = clip_dist_temp[{clipidx}].{wm};\n"
            );
        }
    }

    fn emit_prescale(&mut self) {
        self.body
            .append("gl_Position.y = gl_Position.y * winsys_adjust_y;\n");
    }

    /// Two-sided lighting: picks the front or back color once at entry.
    pub(crate) fn emit_color_select(&mut self) {
        if !self.key.color_two_side || self.color_in_mask & 0x3 == 0 {
            return;
        }
        if self.color_in_mask & 1 != 0 {
            self.body
                .append("realcolor0 = gl_FrontFacing ? ex_c0 : ex_bc0;\n");
        }
        if self.color_in_mask & 2 != 0 {
            self.body
                .append("realcolor1 = gl_FrontFacing ? ex_c1 : ex_bc1;\n");
        }
    }

    fn emit_alpha_test(&mut self) -> Result<(), TranslateError> {
        let Some(first) = self.outputs.first() else {
            return Ok(());
        };
        if !self.write_all_cbufs && first.sid != 0 {
            return Ok(());
        }

        let func = CompareFunc::from_raw(self.key.alpha_test)
            .ok_or(TranslateError::InvalidAlphaFunc(self.key.alpha_test))?;
        let op = alpha_test_op(func);
        let condition = match func {
            CompareFunc::Never | CompareFunc::Always => op.to_owned(),
            _ => format!("fsout_c0.w {op} {}", float6(self.key.alpha_ref_val)),
        };
        emit!(self.body, "if (!({condition})) {{\n\tdiscard;\n}}\n");
        Ok(())
    }

    pub(crate) fn vertex_exit(&mut self) {
        let downstream = self.key.gs_present || self.key.tes_present;
        if self.so.is_some() && !downstream {
            self.emit_so_movs();
        }
        self.emit_clip_dist_movs();
        if !downstream {
            self.emit_prescale();
        }
    }

    pub(crate) fn tess_eval_exit(&mut self) {
        if self.so.is_some() && !self.key.gs_present {
            self.emit_so_movs();
        }
        self.emit_clip_dist_movs();
        if !self.key.gs_present {
            self.emit_prescale();
        }
    }

    pub(crate) fn fragment_exit(&mut self) -> Result<(), TranslateError> {
        if self.key.pstipple_tex {
            self.body.append(
                "stip_temp = texture(pstipple_sampler, vec2(gl_FragCoord.x / 32, gl_FragCoord.y / 32)).x;\n",
            );
            self.body.append("if (stip_temp > 0) {\n\tdiscard;\n}\n");
        }
        if self.key.cbufs_are_a8_bitmask {
            self.body.append("fsout_c0.x = fsout_c0.w;\n");
        }
        if self.key.add_alpha_test {
            self.emit_alpha_test()?;
        }
        if self.write_all_cbufs {
            let first = self.outputs.len() as u32;
            for i in first..self.cfg.max_draw_buffers {
                emit!(self.body, "fsout_c{i} = fsout_c0;\n");
            }
        }
        Ok(())
    }

    /// Per-vertex epilogue of `EMIT` in a geometry shader.
    pub(crate) fn geometry_vertex_exit(&mut self) {
        if self.so.is_some() && self.key.gs_present {
            self.emit_so_movs();
        }
        self.emit_clip_dist_movs();
        self.emit_prescale();
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;
    use vrend_tgsi::ScanInfo;

    use super::*;
    use crate::config::{ShaderConfig, ShaderKey, StreamOutput, StreamOutputInfo};
    use crate::context::IoVar;

    fn output(name: Semantic, sid: u32, first: u32, glsl_name: &str) -> IoVar {
        let mut var = IoVar::new(name, sid, first);
        var.glsl_name = glsl_name.to_owned();
        var
    }

    #[test]
    fn partial_capture_writemask() {
        assert_eq!(so_writemask(0, 4), "");
        assert_eq!(so_writemask(1, 2), ".yz");
        assert_eq!(so_writemask(2, 4), ".zw");
    }

    #[test]
    fn alpha_test_table() {
        let cfg = ShaderConfig::default();
        let expected = [
            "if (!(false)) {\n\tdiscard;\n}\n",
            "if (!(fsout_c0.w < 0.500000)) {\n\tdiscard;\n}\n",
            "if (!(fsout_c0.w == 0.500000)) {\n\tdiscard;\n}\n",
            "if (!(fsout_c0.w <= 0.500000)) {\n\tdiscard;\n}\n",
            "if (!(fsout_c0.w > 0.500000)) {\n\tdiscard;\n}\n",
            "if (!(fsout_c0.w != 0.500000)) {\n\tdiscard;\n}\n",
            "if (!(fsout_c0.w >= 0.500000)) {\n\tdiscard;\n}\n",
            "if (!(true)) {\n\tdiscard;\n}\n",
        ];
        for (func, want) in expected.iter().enumerate() {
            let key = ShaderKey {
                add_alpha_test: true,
                alpha_test: func as u32,
                alpha_ref_val: 0.5,
                ..ShaderKey::default()
            };
            let mut ctx =
                Context::new(&cfg, &key, None, Processor::Fragment, ScanInfo::default(), 0);
            ctx.outputs
                .push(output(Semantic::Color, 0, 0, "fsout_c0"));
            ctx.fragment_exit().unwrap();
            assert_eq!(ctx.body.as_str(), *want);
        }
    }

    #[test]
    fn invalid_alpha_func_fails() {
        let cfg = ShaderConfig::default();
        let key = ShaderKey {
            add_alpha_test: true,
            alpha_test: 9,
            ..ShaderKey::default()
        };
        let mut ctx = Context::new(&cfg, &key, None, Processor::Fragment, ScanInfo::default(), 0);
        ctx.outputs.push(output(Semantic::Color, 0, 0, "fsout_c0"));
        assert!(matches!(
            ctx.fragment_exit(),
            Err(TranslateError::InvalidAlphaFunc(9))
        ));
    }

    #[test]
    fn alpha_test_skipped_without_color0() {
        let cfg = ShaderConfig::default();
        let key = ShaderKey {
            add_alpha_test: true,
            alpha_test: 1,
            ..ShaderKey::default()
        };
        let mut ctx = Context::new(&cfg, &key, None, Processor::Fragment, ScanInfo::default(), 0);
        ctx.outputs.push(output(Semantic::Color, 1, 0, "fsout_c1"));
        ctx.fragment_exit().unwrap();
        assert_eq!(ctx.body.as_str(), "");
    }

    #[test]
    fn broadcast_color_writes() {
        let cfg = ShaderConfig {
            max_draw_buffers: 3,
            ..ShaderConfig::default()
        };
        let key = ShaderKey::default();
        let mut ctx = Context::new(&cfg, &key, None, Processor::Fragment, ScanInfo::default(), 0);
        ctx.write_all_cbufs = true;
        ctx.outputs.push(output(Semantic::Color, 0, 0, "fsout_c0"));
        ctx.fragment_exit().unwrap();
        assert_eq!(
            ctx.body.as_str(),
            "fsout_c1 = fsout_c0;\nfsout_c2 = fsout_c0;\n"
        );
    }

    #[test]
    fn vertex_exit_flips_y_only_without_downstream_stage() {
        let cfg = ShaderConfig::default();
        let key = ShaderKey::default();
        let mut ctx = Context::new(&cfg, &key, None, Processor::Vertex, ScanInfo::default(), 0);
        ctx.vertex_exit();
        assert_eq!(
            ctx.body.as_str(),
            "gl_Position.y = gl_Position.y * winsys_adjust_y;\n"
        );

        let key = ShaderKey {
            gs_present: true,
            ..ShaderKey::default()
        };
        let mut ctx = Context::new(&cfg, &key, None, Processor::Vertex, ScanInfo::default(), 0);
        ctx.vertex_exit();
        assert_eq!(ctx.body.as_str(), "");
    }

    #[test]
    fn user_clip_planes() {
        let cfg = ShaderConfig::default();
        let key = ShaderKey {
            clip_plane_enable: true,
            gs_present: true,
            ..ShaderKey::default()
        };
        let mut ctx = Context::new(&cfg, &key, None, Processor::Vertex, ScanInfo::default(), 0);
        ctx.vertex_exit();
        let lines: Vec<_> = ctx.body.as_str().lines().collect();
        assert_eq!(lines.len(), 8);
        assert_eq!(lines[7], "gl_ClipDistance[7] = dot(gl_Position, clipp[7]);");
    }

    #[test]
    fn clip_and_cull_split_by_properties() {
        let cfg = ShaderConfig::default();
        let key = ShaderKey::default();
        let mut ctx = Context::new(&cfg, &key, None, Processor::TessCtrl, ScanInfo::default(), 0);
        ctx.num_clip_dist = 8;
        ctx.num_clip_dist_prop = 3;
        ctx.num_cull_dist_prop = 2;
        ctx.emit_clip_dist_movs();
        assert_eq!(
            ctx.body.as_str(),
            "gl_out[gl_InvocationID].gl_ClipDistance[0] = clip_dist_temp[0].x;\n\
             gl_out[gl_InvocationID].gl_ClipDistance[1] = clip_dist_temp[0].y;\n\
             gl_out[gl_InvocationID].gl_ClipDistance[2] = clip_dist_temp[0].z;\n\
             gl_out[gl_InvocationID].gl_CullDistance[0] = clip_dist_temp[0].w;\n\
             gl_out[gl_InvocationID].gl_CullDistance[1] = clip_dist_temp[1].x;\n"
        );
    }

    #[test]
    fn stream_output_capture() {
        let cfg = ShaderConfig::default();
        let key = ShaderKey::default();
        let so = StreamOutputInfo {
            outputs: vec![
                StreamOutput {
                    register_index: 0,
                    start_component: 0,
                    num_components: 4,
                    output_buffer: 0,
                    stream: 0,
                },
                StreamOutput {
                    register_index: 1,
                    start_component: 1,
                    num_components: 2,
                    output_buffer: 0,
                    stream: 0,
                },
            ],
        };
        let mut ctx = Context::new(&cfg, &key, Some(&so), Processor::Vertex, ScanInfo::default(), 0);
        ctx.outputs.push(output(Semantic::Generic, 0, 0, "vso_g0"));
        ctx.outputs.push(output(Semantic::Generic, 1, 1, "vso_g1"));
        ctx.prepare_so_movs();
        ctx.emit_so_movs();
        assert_eq!(ctx.write_so_outputs, vec![false, true]);
        assert_eq!(
            ctx.so_names,
            vec![Some("vso_g0".to_owned()), Some("tfout1".to_owned())]
        );
        assert_eq!(ctx.body.as_str(), "tfout1 = vec2(vso_g1.yz);\n");
    }

    #[test]
    fn two_sided_color_select() {
        let cfg = ShaderConfig::default();
        let key = ShaderKey {
            color_two_side: true,
            ..ShaderKey::default()
        };
        let mut ctx = Context::new(&cfg, &key, None, Processor::Fragment, ScanInfo::default(), 0);
        ctx.color_in_mask = 0b10;
        ctx.emit_color_select();
        assert_eq!(
            ctx.body.as_str(),
            "realcolor1 = gl_FrontFacing ? ex_c1 : ex_bc1;\n"
        );
    }
}

//! Caller-supplied translation inputs.

/// Capabilities of the host GL driver the output is compiled by.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ShaderConfig {
    /// Highest GLSL version the host accepts (e.g. `130`, `150`, `310`).
    pub glsl_version: u32,
    /// Emit GLSL ES instead of desktop GLSL.
    pub use_gles: bool,
    pub use_core_profile: bool,
    /// Vertex inputs get `layout(location = N)` qualifiers.
    pub use_explicit_locations: bool,
    pub max_draw_buffers: u32,
}

impl Default for ShaderConfig {
    fn default() -> Self {
        Self {
            glsl_version: 130,
            use_gles: false,
            use_core_profile: false,
            use_explicit_locations: false,
            max_draw_buffers: 8,
        }
    }
}

/// Per-pipeline state that changes the generated program.
///
/// Read-only for the translator.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct ShaderKey {
    /// Bitmask of generic inputs replaced by the point sprite coordinate.
    pub coord_replace: u32,
    pub color_two_side: bool,
    pub flatshade: bool,
    pub invert_fs_origin: bool,
    /// A polygon stipple texture is bound for the fragment stage.
    pub pstipple_tex: bool,
    pub add_alpha_test: bool,
    /// Raw `PIPE_FUNC_*` compare function of the alpha test.
    pub alpha_test: u32,
    pub alpha_ref_val: f32,
    /// Emulate the eight legacy user clip planes.
    pub clip_plane_enable: bool,
    pub cbufs_are_a8_bitmask: bool,
    pub gs_present: bool,
    pub tcs_present: bool,
    pub tes_present: bool,
    pub num_indirect_generic_inputs: u32,
    pub num_indirect_generic_outputs: u32,
    pub num_indirect_patch_inputs: u32,
    pub num_indirect_patch_outputs: u32,
    /// The previous stage redeclared `gl_PerVertex` with clip distances.
    pub prev_stage_pervertex_out: bool,
    pub prev_stage_num_clip_out: u32,
    pub prev_stage_num_cull_out: u32,
}

/// Largest number of transform feedback captures.
pub const MAX_SO_OUTPUTS: usize = 64;

/// One transform feedback capture.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct StreamOutput {
    /// Index into the declared outputs.
    pub register_index: u32,
    pub start_component: u32,
    pub num_components: u32,
    pub output_buffer: u32,
    pub stream: u32,
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct StreamOutputInfo {
    pub outputs: Vec<StreamOutput>,
}

impl StreamOutputInfo {
    pub fn is_empty(&self) -> bool {
        self.outputs.is_empty()
    }
}

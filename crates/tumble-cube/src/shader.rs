//! Shader pipeline: compile, link, and resolve binding locations.

use thiserror::Error;
use tumble_engine::gfx::{RasterContext, StageKind};

/// Vertex stage of the cube program.
pub const CUBE_VERTEX_SOURCE: &str = include_str!("shaders/cube.vert.wgsl");

/// Fragment stage of the cube program.
pub const CUBE_FRAGMENT_SOURCE: &str = include_str!("shaders/cube.frag.wgsl");

pub const ATTR_POSITION: &str = "position";
pub const ATTR_COLOR: &str = "color";
pub const UNIFORM_MODEL: &str = "model_matrix";
pub const UNIFORM_VIEW: &str = "view_matrix";
pub const UNIFORM_PROJECTION: &str = "projection_matrix";

/// Pipeline construction failures. Neither is retried.
#[derive(Debug, Error)]
pub enum PipelineError {
    #[error("{stage} shader failed to compile:\n{log}")]
    Compile { stage: StageKind, log: String },

    #[error("shader program failed to link:\n{log}")]
    Link { log: String },
}

/// Compiles one stage. On failure the stage is released and its log returned.
pub fn compile_stage<C: RasterContext>(
    ctx: &mut C,
    kind: StageKind,
    source: &str,
) -> Result<C::Stage, PipelineError> {
    let stage = ctx.create_stage(kind, source);
    if ctx.stage_compiled(&stage) {
        return Ok(stage);
    }

    let log = ctx.stage_info_log(&stage);
    drop(stage);

    log::error!("{kind} shader compile failed:\n{log}");
    Err(PipelineError::Compile { stage: kind, log })
}

/// Links two compiled stages. On failure the program is released and its log returned.
pub fn link_program<C: RasterContext>(
    ctx: &mut C,
    vertex: &C::Stage,
    fragment: &C::Stage,
) -> Result<C::Program, PipelineError> {
    let program = ctx.link_program(vertex, fragment);
    if ctx.program_linked(&program) {
        return Ok(program);
    }

    let log = ctx.program_info_log(&program);
    drop(program);

    log::error!("shader program link failed:\n{log}");
    Err(PipelineError::Link { log })
}

/// Locations the frame loop binds against. `None` turns the binding into a no-op.
#[derive(Debug, Copy, Clone, Default, Eq, PartialEq)]
pub struct BindingLocations {
    pub position: Option<u32>,
    pub color: Option<u32>,
    pub model_matrix: Option<u32>,
    pub view_matrix: Option<u32>,
    pub projection_matrix: Option<u32>,
}

impl BindingLocations {
    /// Resolves every cube binding on a linked program, warning about missing names.
    pub fn resolve<C: RasterContext>(ctx: &C, program: &C::Program) -> Self {
        let attr = |name: &str| {
            let loc = ctx.attribute_location(program, name);
            if loc.is_none() {
                log::warn!("program has no attribute `{name}`; its binding is ignored");
            }
            loc
        };
        let uniform = |name: &str| {
            let loc = ctx.uniform_location(program, name);
            if loc.is_none() {
                log::warn!("program has no uniform `{name}`; its upload is ignored");
            }
            loc
        };

        Self {
            position: attr(ATTR_POSITION),
            color: attr(ATTR_COLOR),
            model_matrix: uniform(UNIFORM_MODEL),
            view_matrix: uniform(UNIFORM_VIEW),
            projection_matrix: uniform(UNIFORM_PROJECTION),
        }
    }
}

/// A linked program that owns the stages it was built from.
///
/// Field order matters: the program is released before its stages.
pub struct ShaderProgram<C: RasterContext> {
    program: C::Program,
    _vertex: C::Stage,
    _fragment: C::Stage,
    locations: BindingLocations,
}

impl<C: RasterContext> ShaderProgram<C> {
    /// Compiles and links a program, then resolves the cube bindings once.
    pub fn build(
        ctx: &mut C,
        vertex_source: &str,
        fragment_source: &str,
    ) -> Result<Self, PipelineError> {
        let vertex = compile_stage(ctx, StageKind::Vertex, vertex_source)?;
        let fragment = compile_stage(ctx, StageKind::Fragment, fragment_source)?;
        let program = link_program(ctx, &vertex, &fragment)?;
        let locations = BindingLocations::resolve(ctx, &program);

        log::debug!("shader program linked: {locations:?}");

        Ok(Self {
            program,
            _vertex: vertex,
            _fragment: fragment,
            locations,
        })
    }

    /// The cube's own shaders.
    pub fn cube(ctx: &mut C) -> Result<Self, PipelineError> {
        Self::build(ctx, CUBE_VERTEX_SOURCE, CUBE_FRAGMENT_SOURCE)
    }

    pub fn program(&self) -> &C::Program {
        &self.program
    }

    pub fn locations(&self) -> &BindingLocations {
        &self.locations
    }

    pub fn resolve_attribute(&self, ctx: &C, name: &str) -> Option<u32> {
        ctx.attribute_location(&self.program, name)
    }

    pub fn resolve_uniform(&self, ctx: &C, name: &str) -> Option<u32> {
        ctx.uniform_location(&self.program, name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::RecordingRaster;

    const BROKEN: &str = "@vertex fn vs_main( -> @builtin(position) vec4<f32> {";

    // Reads a vec3 at location 0 that the cube vertex stage never writes.
    const MISMATCHED_FRAGMENT: &str = r#"
        @fragment
        fn fs_main(@location(0) color: vec3<f32>) -> @location(0) vec4<f32> {
            return vec4<f32>(color, 1.0);
        }
    "#;

    #[test]
    fn cube_program_resolves_all_bindings() {
        let mut ctx = RecordingRaster::new();
        let program = ShaderProgram::cube(&mut ctx).expect("cube shaders build");

        let loc = program.locations();
        assert_eq!(loc.position, Some(0));
        assert_eq!(loc.color, Some(1));
        assert_eq!(loc.model_matrix, Some(0));
        assert_eq!(loc.view_matrix, Some(1));
        assert_eq!(loc.projection_matrix, Some(2));
    }

    #[test]
    fn stages_live_as_long_as_the_program() {
        let mut ctx = RecordingRaster::new();
        let program = ShaderProgram::cube(&mut ctx).expect("cube shaders build");
        assert_eq!(ctx.live_stages(), 2);
        assert_eq!(ctx.live_programs(), 1);

        drop(program);
        assert_eq!(ctx.live_stages(), 0);
        assert_eq!(ctx.live_programs(), 0);
    }

    #[test]
    fn compile_failure_releases_the_stage() {
        let mut ctx = RecordingRaster::new();
        let err = compile_stage(&mut ctx, StageKind::Vertex, BROKEN).unwrap_err();

        match err {
            PipelineError::Compile { stage, log } => {
                assert_eq!(stage, StageKind::Vertex);
                assert!(!log.is_empty());
            }
            other => panic!("unexpected error: {other}"),
        }
        assert_eq!(ctx.live_stages(), 0);
    }

    #[test]
    fn stage_kind_must_have_an_entry_point() {
        let mut ctx = RecordingRaster::new();
        let err = compile_stage(&mut ctx, StageKind::Fragment, CUBE_VERTEX_SOURCE).unwrap_err();
        assert!(matches!(err, PipelineError::Compile { stage: StageKind::Fragment, .. }));
        assert_eq!(ctx.live_stages(), 0);
    }

    #[test]
    fn build_aborts_on_compile_failure_without_leaks() {
        let mut ctx = RecordingRaster::new();
        let result = ShaderProgram::build(&mut ctx, CUBE_VERTEX_SOURCE, "not wgsl at all");

        assert!(matches!(
            result,
            Err(PipelineError::Compile { stage: StageKind::Fragment, .. })
        ));
        assert_eq!(ctx.live_stages(), 0);
        assert_eq!(ctx.live_programs(), 0);
    }

    #[test]
    fn link_failure_reports_the_interface_mismatch() {
        let mut ctx = RecordingRaster::new();
        let result = ShaderProgram::build(&mut ctx, CUBE_VERTEX_SOURCE, MISMATCHED_FRAGMENT);

        let Err(PipelineError::Link { log }) = result else {
            panic!("expected a link failure");
        };
        assert!(log.contains("@location(0)"), "log was: {log}");
        assert_eq!(ctx.live_programs(), 0);
        assert_eq!(ctx.live_stages(), 0);
    }

    #[test]
    fn missing_names_resolve_to_none() {
        let mut ctx = RecordingRaster::new();
        let program = ShaderProgram::cube(&mut ctx).expect("cube shaders build");

        assert_eq!(program.resolve_attribute(&ctx, "normal"), None);
        assert_eq!(program.resolve_uniform(&ctx, "light_dir"), None);
        assert_eq!(program.resolve_uniform(&ctx, UNIFORM_VIEW), Some(1));
    }

    #[test]
    fn program_without_cube_names_still_builds() {
        const BARE_VS: &str = r#"
            @vertex
            fn vs_main(@location(3) p: vec4<f32>) -> @builtin(position) vec4<f32> {
                return p;
            }
        "#;
        const BARE_FS: &str = r#"
            @fragment
            fn fs_main() -> @location(0) vec4<f32> {
                return vec4<f32>(1.0);
            }
        "#;

        let mut ctx = RecordingRaster::new();
        let program = ShaderProgram::build(&mut ctx, BARE_VS, BARE_FS).expect("bare program builds");
        assert_eq!(*program.locations(), BindingLocations::default());
    }
}

use tumble_engine::gfx::{AttributeLayout, DepthFunc, PrimitiveMode, RasterContext};

use crate::config::CubeConfig;
use crate::geometry::{COLOR_COMPONENTS, POSITION_COMPONENTS};
use crate::math;
use crate::resources::GpuResourceSet;
use crate::schedule::{CancelFlag, Schedule};
use crate::shader::{PipelineError, ShaderProgram};
use crate::transform::TransformState;

/// Per-frame driver: owns the program, the uploaded geometry, and all timing state.
///
/// Instances are independent; nothing is shared between loops.
pub struct FrameLoop<C: RasterContext> {
    shader: ShaderProgram<C>,
    resources: GpuResourceSet<C>,
    transform: TransformState,

    clear_color: [f32; 4],
    clear_depth: f32,
    depth_func: DepthFunc,

    previous_ms: Option<f64>,
    frames_rendered: u64,
}

impl<C: RasterContext> FrameLoop<C> {
    /// Compiles the cube program and uploads the geometry.
    ///
    /// `aspect` is width / height of the drawable area, read once.
    pub fn new(ctx: &mut C, aspect: f32, config: &CubeConfig) -> Result<Self, PipelineError> {
        let shader = ShaderProgram::cube(ctx)?;
        let resources = GpuResourceSet::upload(ctx);

        Ok(Self {
            shader,
            resources,
            transform: TransformState::from_config(aspect, config),
            clear_color: config.clear_color,
            clear_depth: config.clear_depth,
            depth_func: config.depth_func,
            previous_ms: None,
            frames_rendered: 0,
        })
    }

    /// Renders one frame at `timestamp_ms` (host clock, milliseconds).
    pub fn render_frame(&mut self, ctx: &mut C, timestamp_ms: f64) {
        let delta_seconds = match self.previous_ms {
            Some(prev) => ((timestamp_ms - prev) / 1000.0).max(0.0),
            None => 0.0,
        };
        self.previous_ms = Some(timestamp_ms);

        ctx.clear(self.clear_color, self.clear_depth);
        ctx.enable_depth_test(self.depth_func);

        self.transform.update(delta_seconds);

        let loc = *self.shader.locations();
        ctx.use_program(self.shader.program());

        ctx.bind_vertex_attribute(
            loc.position,
            self.resources.positions(),
            AttributeLayout::packed_f32(POSITION_COMPONENTS),
        );
        ctx.bind_vertex_attribute(
            loc.color,
            self.resources.colors(),
            AttributeLayout::packed_f32(COLOR_COMPONENTS),
        );
        ctx.bind_index_buffer(self.resources.indices());

        ctx.set_uniform_mat4(loc.projection_matrix, &math::to_cols(self.transform.projection()));
        ctx.set_uniform_mat4(loc.view_matrix, &math::to_cols(self.transform.view()));
        ctx.set_uniform_mat4(loc.model_matrix, &math::to_cols(self.transform.model()));

        ctx.draw_elements(
            PrimitiveMode::Triangles,
            GpuResourceSet::<C>::INDEX_COUNT,
            GpuResourceSet::<C>::INDEX_TYPE,
            0,
        );

        self.frames_rendered += 1;
        log::trace!(
            "frame {} dt={delta_seconds:.4}s angle={:.3}",
            self.frames_rendered,
            self.transform.rotation_angle()
        );
    }

    /// Scheduler callback: renders unless cancelled and reports whether to go on.
    pub fn tick(&mut self, ctx: &mut C, timestamp_ms: f64, cancel: &CancelFlag) -> Schedule {
        if cancel.is_cancelled() {
            return Schedule::Stop;
        }

        self.render_frame(ctx, timestamp_ms);

        if cancel.is_cancelled() {
            Schedule::Stop
        } else {
            Schedule::Continue
        }
    }

    /// Forgets the previous timestamp and rewinds the rotation.
    pub fn reset(&mut self) {
        self.previous_ms = None;
        self.transform.reset();
    }

    pub fn transform(&self) -> &TransformState {
        &self.transform
    }

    pub fn frames_rendered(&self) -> u64 {
        self.frames_rendered
    }
}

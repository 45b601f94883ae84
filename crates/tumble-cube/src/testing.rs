//! Recording `RasterContext` for GPU-free tests.
//!
//! Stages are validated with the same naga reflection the wgpu backend uses, so
//! compile and link outcomes match what a real device would report.

use std::cell::Cell;
use std::rc::Rc;

use tumble_engine::gfx::reflect::{self, ProgramReflection, StageReflection};
use tumble_engine::gfx::{
    AttributeLayout, BufferTarget, DepthFunc, IndexType, PrimitiveMode, RasterContext, StageKind,
};

/// Decrements its counter when dropped.
#[derive(Debug)]
struct LiveGuard(Rc<Cell<usize>>);

impl LiveGuard {
    fn new(counter: &Rc<Cell<usize>>) -> Self {
        counter.set(counter.get() + 1);
        Self(Rc::clone(counter))
    }
}

impl Drop for LiveGuard {
    fn drop(&mut self) {
        self.0.set(self.0.get() - 1);
    }
}

#[derive(Debug)]
pub struct StageHandle {
    reflection: Result<StageReflection, String>,
    _live: LiveGuard,
}

#[derive(Debug)]
pub struct ProgramHandle {
    pub id: u32,
    reflection: Result<ProgramReflection, String>,
    _live: LiveGuard,
}

#[derive(Debug)]
pub struct BufferHandle {
    pub id: u32,
    pub target: BufferTarget,
    pub bytes: Vec<u8>,
    _live: LiveGuard,
}

/// One recorded state or draw call.
#[derive(Debug, Clone, PartialEq)]
pub enum Command {
    Clear {
        color: [f32; 4],
        depth: f32,
    },
    EnableDepthTest(DepthFunc),
    UseProgram(u32),
    BindVertexAttribute {
        location: Option<u32>,
        buffer: u32,
        layout: AttributeLayout,
    },
    BindIndexBuffer(u32),
    SetUniformMat4 {
        location: Option<u32>,
        value: [f32; 16],
    },
    DrawElements {
        mode: PrimitiveMode,
        count: u32,
        index_type: IndexType,
        offset: u64,
    },
}

impl Command {
    pub fn name(&self) -> &'static str {
        match self {
            Command::Clear { .. } => "clear",
            Command::EnableDepthTest(_) => "enable_depth_test",
            Command::UseProgram(_) => "use_program",
            Command::BindVertexAttribute { .. } => "bind_vertex_attribute",
            Command::BindIndexBuffer(_) => "bind_index_buffer",
            Command::SetUniformMat4 { .. } => "set_uniform_mat4",
            Command::DrawElements { .. } => "draw_elements",
        }
    }
}

#[derive(Debug, Default)]
pub struct RecordingRaster {
    commands: Vec<Command>,
    next_id: u32,
    buffers_created: usize,

    live_stages: Rc<Cell<usize>>,
    live_programs: Rc<Cell<usize>>,
    live_buffers: Rc<Cell<usize>>,
}

impl RecordingRaster {
    pub fn new() -> Self {
        Self::default()
    }

    fn next_id(&mut self) -> u32 {
        self.next_id += 1;
        self.next_id
    }

    pub fn take_commands(&mut self) -> Vec<Command> {
        std::mem::take(&mut self.commands)
    }

    pub fn draw_count(&self) -> usize {
        self.commands
            .iter()
            .filter(|c| matches!(c, Command::DrawElements { .. }))
            .count()
    }

    pub fn live_stages(&self) -> usize {
        self.live_stages.get()
    }

    pub fn live_programs(&self) -> usize {
        self.live_programs.get()
    }

    pub fn live_buffers(&self) -> usize {
        self.live_buffers.get()
    }

    pub fn buffers_created(&self) -> usize {
        self.buffers_created
    }
}

impl RasterContext for RecordingRaster {
    type Stage = StageHandle;
    type Program = ProgramHandle;
    type Buffer = BufferHandle;

    fn create_stage(&mut self, kind: StageKind, source: &str) -> StageHandle {
        StageHandle {
            reflection: reflect::compile_stage(kind, source),
            _live: LiveGuard::new(&self.live_stages),
        }
    }

    fn stage_compiled(&self, stage: &StageHandle) -> bool {
        stage.reflection.is_ok()
    }

    fn stage_info_log(&self, stage: &StageHandle) -> String {
        stage.reflection.as_ref().err().cloned().unwrap_or_default()
    }

    fn link_program(&mut self, vertex: &StageHandle, fragment: &StageHandle) -> ProgramHandle {
        let reflection = match (&vertex.reflection, &fragment.reflection) {
            (Ok(vs), Ok(fs)) => reflect::link(vs, fs),
            _ => Err("error: cannot link a stage that failed to compile".to_string()),
        };

        ProgramHandle {
            id: self.next_id(),
            reflection,
            _live: LiveGuard::new(&self.live_programs),
        }
    }

    fn program_linked(&self, program: &ProgramHandle) -> bool {
        program.reflection.is_ok()
    }

    fn program_info_log(&self, program: &ProgramHandle) -> String {
        program.reflection.as_ref().err().cloned().unwrap_or_default()
    }

    fn attribute_location(&self, program: &ProgramHandle, name: &str) -> Option<u32> {
        program.reflection.as_ref().ok()?.attribute_location(name)
    }

    fn uniform_location(&self, program: &ProgramHandle, name: &str) -> Option<u32> {
        program.reflection.as_ref().ok()?.uniform_location(name)
    }

    fn create_buffer(&mut self, target: BufferTarget, contents: &[u8]) -> BufferHandle {
        self.buffers_created += 1;
        BufferHandle {
            id: self.next_id(),
            target,
            bytes: contents.to_vec(),
            _live: LiveGuard::new(&self.live_buffers),
        }
    }

    fn clear(&mut self, color: [f32; 4], depth: f32) {
        self.commands.push(Command::Clear { color, depth });
    }

    fn enable_depth_test(&mut self, func: DepthFunc) {
        self.commands.push(Command::EnableDepthTest(func));
    }

    fn use_program(&mut self, program: &ProgramHandle) {
        self.commands.push(Command::UseProgram(program.id));
    }

    fn bind_vertex_attribute(
        &mut self,
        location: Option<u32>,
        buffer: &BufferHandle,
        layout: AttributeLayout,
    ) {
        self.commands.push(Command::BindVertexAttribute {
            location,
            buffer: buffer.id,
            layout,
        });
    }

    fn bind_index_buffer(&mut self, buffer: &BufferHandle) {
        self.commands.push(Command::BindIndexBuffer(buffer.id));
    }

    fn set_uniform_mat4(&mut self, location: Option<u32>, value: &[f32; 16]) {
        self.commands.push(Command::SetUniformMat4 {
            location,
            value: *value,
        });
    }

    fn draw_elements(&mut self, mode: PrimitiveMode, count: u32, index_type: IndexType, offset: u64) {
        self.commands.push(Command::DrawElements {
            mode,
            count,
            index_type,
            offset,
        });
    }
}

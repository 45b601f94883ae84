use std::fmt;

/// Shader stage a source string is compiled for.
#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash)]
pub enum StageKind {
    Vertex,
    Fragment,
}

impl fmt::Display for StageKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StageKind::Vertex => f.write_str("vertex"),
            StageKind::Fragment => f.write_str("fragment"),
        }
    }
}

/// Binding target of a buffer, fixed at creation.
#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash)]
pub enum BufferTarget {
    /// Per-vertex attribute data.
    VertexArray,
    /// Element indices.
    IndexArray,
}

/// Depth comparison used when depth testing is enabled.
#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash)]
pub enum DepthFunc {
    Never,
    Less,
    Equal,
    LessEqual,
    Greater,
    NotEqual,
    GreaterEqual,
    Always,
}

#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash)]
pub enum PrimitiveMode {
    Triangles,
}

#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash)]
pub enum IndexType {
    U16,
    U32,
}

impl IndexType {
    pub const fn size_bytes(self) -> u64 {
        match self {
            IndexType::U16 => 2,
            IndexType::U32 => 4,
        }
    }
}

/// How a vertex attribute reads `f32` components out of its buffer.
#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash)]
pub struct AttributeLayout {
    /// Components per vertex (1..=4).
    pub components: u8,
    /// Bytes between consecutive vertices; `0` means tightly packed.
    pub stride: u32,
    /// Byte offset of the first component.
    pub offset: u64,
}

impl AttributeLayout {
    /// Tightly packed `f32` components starting at offset 0.
    pub const fn packed_f32(components: u8) -> Self {
        Self {
            components,
            stride: 0,
            offset: 0,
        }
    }

    /// Effective stride in bytes, resolving `0` to the packed size.
    pub fn effective_stride(&self) -> u64 {
        if self.stride == 0 {
            u64::from(self.components) * std::mem::size_of::<f32>() as u64
        } else {
            u64::from(self.stride)
        }
    }
}

/// Immediate-mode rasterizer contract.
///
/// Handles are scoped owners: dropping a `Stage`, `Program` or `Buffer` releases the
/// underlying GPU object. Creation never fails outright; compile and link outcomes are
/// queried afterwards together with their info logs, mirroring the classic
/// create/compile/query/delete sequence.
///
/// Locations are `Option<u32>`; `None` is the "not found" sentinel and binding calls
/// given `None` are silently ignored.
pub trait RasterContext {
    type Stage;
    type Program;
    type Buffer;

    /// Creates a shader stage from source and compiles it.
    fn create_stage(&mut self, kind: StageKind, source: &str) -> Self::Stage;

    fn stage_compiled(&self, stage: &Self::Stage) -> bool;

    /// Compiler diagnostics; empty when there is nothing to report.
    fn stage_info_log(&self, stage: &Self::Stage) -> String;

    /// Links two stages into a program. The program does not borrow the stages.
    fn link_program(&mut self, vertex: &Self::Stage, fragment: &Self::Stage) -> Self::Program;

    fn program_linked(&self, program: &Self::Program) -> bool;

    fn program_info_log(&self, program: &Self::Program) -> String;

    fn attribute_location(&self, program: &Self::Program, name: &str) -> Option<u32>;

    fn uniform_location(&self, program: &Self::Program, name: &str) -> Option<u32>;

    /// Uploads `contents` once into an immutable GPU buffer.
    fn create_buffer(&mut self, target: BufferTarget, contents: &[u8]) -> Self::Buffer;

    /// Clears the color and depth attachments of the current frame.
    fn clear(&mut self, color: [f32; 4], depth: f32);

    fn enable_depth_test(&mut self, func: DepthFunc);

    fn use_program(&mut self, program: &Self::Program);

    fn bind_vertex_attribute(
        &mut self,
        location: Option<u32>,
        buffer: &Self::Buffer,
        layout: AttributeLayout,
    );

    fn bind_index_buffer(&mut self, buffer: &Self::Buffer);

    /// Uploads a column-major 4x4 matrix; no transpose is applied.
    fn set_uniform_mat4(&mut self, location: Option<u32>, value: &[f32; 16]);

    /// Draws `count` indices from the bound index buffer, starting `offset` bytes in.
    fn draw_elements(&mut self, mode: PrimitiveMode, count: u32, index_type: IndexType, offset: u64);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn packed_stride_resolves_to_component_bytes() {
        assert_eq!(AttributeLayout::packed_f32(3).effective_stride(), 12);
        assert_eq!(AttributeLayout::packed_f32(4).effective_stride(), 16);
    }

    #[test]
    fn explicit_stride_is_kept() {
        let layout = AttributeLayout {
            components: 3,
            stride: 28,
            offset: 0,
        };
        assert_eq!(layout.effective_stride(), 28);
    }

    #[test]
    fn index_sizes() {
        assert_eq!(IndexType::U16.size_bytes(), 2);
        assert_eq!(IndexType::U32.size_bytes(), 4);
    }
}

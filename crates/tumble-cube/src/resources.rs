//! One-time upload of the cube geometry into GPU buffers.

use tumble_engine::gfx::{BufferTarget, IndexType, RasterContext};

use crate::geometry::{self, INDEX_COUNT, POSITIONS};

/// Uploads `data` once into a static buffer bound to `target`.
pub fn upload_array<C, T>(ctx: &mut C, target: BufferTarget, data: &[T]) -> C::Buffer
where
    C: RasterContext,
    T: bytemuck::Pod,
{
    let bytes: &[u8] = bytemuck::cast_slice(data);
    log::trace!("uploading {} bytes as {target:?}", bytes.len());
    ctx.create_buffer(target, bytes)
}

/// Position, color and index buffers for the cube. Written once, read every frame.
pub struct GpuResourceSet<C: RasterContext> {
    positions: C::Buffer,
    colors: C::Buffer,
    indices: C::Buffer,
}

impl<C: RasterContext> GpuResourceSet<C> {
    pub const INDEX_TYPE: IndexType = IndexType::U16;
    pub const INDEX_COUNT: u32 = INDEX_COUNT as u32;

    pub fn upload(ctx: &mut C) -> Self {
        let colors = geometry::vertex_colors();

        let set = Self {
            positions: upload_array(ctx, BufferTarget::VertexArray, &POSITIONS),
            colors: upload_array(ctx, BufferTarget::VertexArray, &colors),
            indices: upload_array(ctx, BufferTarget::IndexArray, &geometry::INDICES),
        };

        log::debug!(
            "cube geometry uploaded: {} vertices, {} indices",
            POSITIONS.len(),
            INDEX_COUNT
        );
        set
    }

    pub fn positions(&self) -> &C::Buffer {
        &self.positions
    }

    pub fn colors(&self) -> &C::Buffer {
        &self.colors
    }

    pub fn indices(&self) -> &C::Buffer {
        &self.indices
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::RecordingRaster;

    #[test]
    fn uploads_three_buffers_of_expected_size() {
        let mut ctx = RecordingRaster::new();
        let set = GpuResourceSet::upload(&mut ctx);

        assert_eq!(ctx.live_buffers(), 3);

        let positions = set.positions();
        assert_eq!(positions.target, BufferTarget::VertexArray);
        assert_eq!(positions.bytes.len(), 72 * 4);

        let colors = set.colors();
        assert_eq!(colors.target, BufferTarget::VertexArray);
        assert_eq!(colors.bytes.len(), 96 * 4);

        let indices = set.indices();
        assert_eq!(indices.target, BufferTarget::IndexArray);
        assert_eq!(indices.bytes.len(), 36 * 2);
    }

    #[test]
    fn index_bytes_round_back_to_the_table() {
        let mut ctx = RecordingRaster::new();
        let set = GpuResourceSet::upload(&mut ctx);

        let stored = set.indices();
        let indices: Vec<u16> = stored
            .bytes
            .chunks_exact(2)
            .map(|b| u16::from_ne_bytes([b[0], b[1]]))
            .collect();
        assert_eq!(indices, geometry::INDICES);
    }

    #[test]
    fn dropping_the_set_releases_buffers() {
        let mut ctx = RecordingRaster::new();
        let set = GpuResourceSet::upload(&mut ctx);
        drop(set);
        assert_eq!(ctx.live_buffers(), 0);
    }
}

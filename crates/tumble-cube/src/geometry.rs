//! Static cube geometry.
//!
//! Side-2 cube centered at the origin. Faces do not share vertices so every face
//! carries a flat color: 6 faces × 4 corners = 24 vertices, 2 triangles per face.

pub const FACE_COUNT: usize = 6;
pub const VERTEX_COUNT: usize = FACE_COUNT * 4;
pub const INDEX_COUNT: usize = FACE_COUNT * 6;

/// Components per position (x, y, z).
pub const POSITION_COMPONENTS: u8 = 3;
/// Components per color (r, g, b, a).
pub const COLOR_COMPONENTS: u8 = 4;

pub type Rgba = [f32; 4];

/// Corner positions, four per face in the order front, back, top, bottom, right, left.
#[rustfmt::skip]
pub const POSITIONS: [[f32; 3]; VERTEX_COUNT] = [
    // front (+z)
    [-1.0, -1.0,  1.0], [ 1.0, -1.0,  1.0], [ 1.0,  1.0,  1.0], [-1.0,  1.0,  1.0],
    // back (-z)
    [-1.0, -1.0, -1.0], [-1.0,  1.0, -1.0], [ 1.0,  1.0, -1.0], [ 1.0, -1.0, -1.0],
    // top (+y)
    [-1.0,  1.0, -1.0], [-1.0,  1.0,  1.0], [ 1.0,  1.0,  1.0], [ 1.0,  1.0, -1.0],
    // bottom (-y)
    [-1.0, -1.0, -1.0], [ 1.0, -1.0, -1.0], [ 1.0, -1.0,  1.0], [-1.0, -1.0,  1.0],
    // right (+x)
    [ 1.0, -1.0, -1.0], [ 1.0,  1.0, -1.0], [ 1.0,  1.0,  1.0], [ 1.0, -1.0,  1.0],
    // left (-x)
    [-1.0, -1.0, -1.0], [-1.0, -1.0,  1.0], [-1.0,  1.0,  1.0], [-1.0,  1.0, -1.0],
];

/// One color per face, same face order as [`POSITIONS`].
pub const FACE_COLORS: [Rgba; FACE_COUNT] = [
    [1.0, 0.0, 0.0, 1.0], // red
    [0.0, 1.0, 0.0, 1.0], // green
    [0.0, 0.0, 1.0, 1.0], // blue
    [1.0, 1.0, 0.0, 1.0], // yellow
    [1.0, 0.0, 1.0, 1.0], // magenta
    [0.0, 1.0, 1.0, 1.0], // cyan
];

/// Two counter-clockwise triangles per face (viewed from outside).
#[rustfmt::skip]
pub const INDICES: [u16; INDEX_COUNT] = [
     0,  1,  2,   0,  2,  3,
     4,  5,  6,   4,  6,  7,
     8,  9, 10,   8, 10, 11,
    12, 13, 14,  12, 14, 15,
    16, 17, 18,  16, 18, 19,
    20, 21, 22,  20, 22, 23,
];

/// Broadcasts each face color to its four vertices.
pub const fn vertex_colors() -> [Rgba; VERTEX_COUNT] {
    let mut out = [[0.0; 4]; VERTEX_COUNT];
    let mut v = 0;
    while v < VERTEX_COUNT {
        out[v] = FACE_COLORS[v / 4];
        v += 1;
    }
    out
}

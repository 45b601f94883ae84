//! Column-major 4×4 matrix helpers over `glam`.
//!
//! Conventions follow the classic GL matrix toolkit: right-handed view space,
//! OpenGL clip depth in `[-w, w]`, and `rotate(m, a, axis) == m * R(axis, a)` so
//! successive rotations apply in the object's local frame.

pub use glam::{Mat4, Vec3};

pub const X_AXIS: Vec3 = Vec3::X;
pub const Y_AXIS: Vec3 = Vec3::Y;

/// A fresh identity matrix.
#[inline]
pub fn create() -> Mat4 {
    Mat4::IDENTITY
}

/// Resets `m` to identity.
#[inline]
pub fn identity(m: &mut Mat4) {
    *m = Mat4::IDENTITY;
}

/// Perspective projection with a vertical field of view in radians.
#[inline]
pub fn perspective(fov_y: f32, aspect: f32, near: f32, far: f32) -> Mat4 {
    Mat4::perspective_rh_gl(fov_y, aspect, near, far)
}

#[inline]
pub fn look_at(eye: Vec3, target: Vec3, up: Vec3) -> Mat4 {
    Mat4::look_at_rh(eye, target, up)
}

/// Post-multiplies `m` by a rotation of `angle` radians about `axis`.
///
/// A zero-length axis leaves `m` unchanged.
pub fn rotate(m: &Mat4, angle: f32, axis: Vec3) -> Mat4 {
    match axis.try_normalize() {
        Some(axis) => *m * Mat4::from_axis_angle(axis, angle),
        None => *m,
    }
}

/// Flattens to the column-major layout uniform uploads expect.
#[inline]
pub fn to_cols(m: &Mat4) -> [f32; 16] {
    m.to_cols_array()
}

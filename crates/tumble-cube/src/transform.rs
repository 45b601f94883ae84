use glam::{Mat4, Vec3};

use crate::config::CubeConfig;
use crate::math;

/// Model/view/projection state for the cube.
///
/// `projection` and `view` are fixed at construction. `model` is recomputed from
/// the accumulated rotation angle on every `update`.
#[derive(Debug, Clone, PartialEq)]
pub struct TransformState {
    projection: Mat4,
    view: Mat4,
    model: Mat4,
    /// Seconds of rotation accumulated so far; never wrapped.
    rotation_angle: f64,
    pitch_ratio: f64,
}

impl TransformState {
    /// Default camera and pitch ratio for the given aspect ratio.
    pub fn new(aspect: f32) -> Self {
        Self::from_config(aspect, &CubeConfig::default())
    }

    pub fn from_config(aspect: f32, config: &CubeConfig) -> Self {
        let aspect = if aspect.is_finite() && aspect > 0.0 {
            aspect
        } else {
            log::warn!("invalid aspect ratio {aspect}; using 1.0");
            1.0
        };

        let cam = &config.camera;
        Self {
            projection: math::perspective(cam.fov_y_degrees.to_radians(), aspect, cam.near, cam.far),
            view: math::look_at(cam.eye, cam.target, cam.up),
            model: math::create(),
            rotation_angle: 0.0,
            pitch_ratio: f64::from(config.pitch_ratio),
        }
    }

    /// Advances the rotation by `delta_seconds`, then rebuilds `model` as
    /// `identity * R_y(angle) * R_x(angle * pitch_ratio)`.
    ///
    /// Negative or non-finite deltas count as zero.
    pub fn update(&mut self, delta_seconds: f64) {
        let delta = if delta_seconds.is_finite() {
            delta_seconds.max(0.0)
        } else {
            0.0
        };
        self.rotation_angle += delta;

        let yaw = self.rotation_angle as f32;
        let pitch = (self.rotation_angle * self.pitch_ratio) as f32;

        math::identity(&mut self.model);
        self.model = math::rotate(&self.model, yaw, Vec3::Y);
        self.model = math::rotate(&self.model, pitch, Vec3::X);
    }

    /// Back to the initial pose; the camera is untouched.
    pub fn reset(&mut self) {
        self.rotation_angle = 0.0;
        math::identity(&mut self.model);
    }

    pub fn projection(&self) -> &Mat4 {
        &self.projection
    }

    pub fn view(&self) -> &Mat4 {
        &self.view
    }

    pub fn model(&self) -> &Mat4 {
        &self.model
    }

    pub fn rotation_angle(&self) -> f64 {
        self.rotation_angle
    }
}

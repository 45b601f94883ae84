use anyhow::{Context, Result};
use glam::Vec3;
use tumble_engine::gfx::DepthFunc;

/// Fixed camera used for the projection and view matrices.
#[derive(Debug, Clone, PartialEq)]
pub struct CameraConfig {
    /// Vertical field of view in degrees.
    pub fov_y_degrees: f32,
    pub near: f32,
    pub far: f32,
    pub eye: Vec3,
    pub target: Vec3,
    pub up: Vec3,
}

impl Default for CameraConfig {
    fn default() -> Self {
        Self {
            fov_y_degrees: 45.0,
            near: 0.1,
            far: 100.0,
            eye: Vec3::new(0.0, 0.0, 6.0),
            target: Vec3::ZERO,
            up: Vec3::Y,
        }
    }
}

/// Cube demo configuration.
#[derive(Debug, Clone, PartialEq)]
pub struct CubeConfig {
    pub camera: CameraConfig,

    pub clear_color: [f32; 4],
    pub clear_depth: f32,
    pub depth_func: DepthFunc,

    /// Pitch angle as a fraction of the yaw angle.
    pub pitch_ratio: f32,

    /// Cancel the loop after this many rendered frames. `None` runs until closed.
    pub max_frames: Option<u64>,
}

impl Default for CubeConfig {
    fn default() -> Self {
        Self {
            camera: CameraConfig::default(),
            clear_color: [0.1, 0.1, 0.1, 1.0],
            clear_depth: 1.0,
            depth_func: DepthFunc::LessEqual,
            pitch_ratio: 0.7,
            max_frames: None,
        }
    }
}

impl CubeConfig {
    /// True once `rendered` frames use up the `max_frames` bound.
    pub fn frame_limit_reached(&self, rendered: u64) -> bool {
        self.max_frames.is_some_and(|limit| rendered >= limit)
    }
}

/// Parses the optional frame-count argument of the binary. Zero is rejected.
pub fn parse_frame_limit(arg: Option<&str>) -> Result<Option<u64>> {
    let Some(s) = arg else { return Ok(None) };

    let count = s
        .parse::<u64>()
        .with_context(|| format!("frame count must be a positive integer, got `{s}`"))?;
    anyhow::ensure!(count > 0, "frame count must be at least 1");

    Ok(Some(count))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_the_demo_scene() {
        let cfg = CubeConfig::default();
        assert_eq!(cfg.clear_color, [0.1, 0.1, 0.1, 1.0]);
        assert_eq!(cfg.clear_depth, 1.0);
        assert_eq!(cfg.depth_func, DepthFunc::LessEqual);
        assert_eq!(cfg.camera.eye, Vec3::new(0.0, 0.0, 6.0));
        assert_eq!(cfg.max_frames, None);
    }

    #[test]
    fn frame_limit_argument() {
        assert_eq!(parse_frame_limit(None).unwrap(), None);
        assert_eq!(parse_frame_limit(Some("120")).unwrap(), Some(120));
        assert!(parse_frame_limit(Some("-3")).is_err());
        assert!(parse_frame_limit(Some("lots")).is_err());
    }

    #[test]
    fn zero_frame_limit_is_rejected() {
        assert!(parse_frame_limit(Some("0")).is_err());
    }

    #[test]
    fn limit_is_reached_before_the_next_frame() {
        let cfg = CubeConfig {
            max_frames: Some(2),
            ..CubeConfig::default()
        };
        assert!(!cfg.frame_limit_reached(0));
        assert!(!cfg.frame_limit_reached(1));
        assert!(cfg.frame_limit_reached(2));
        assert!(!CubeConfig::default().frame_limit_reached(u64::MAX));
    }
}

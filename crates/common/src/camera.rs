use glam::Vec3;
use serde::{Deserialize, Serialize};

/// Perspective camera description.
///
/// Plain data: backends turn it into matrices. Camera placement is not part
/// of the simulation and never changes between frames.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Camera {
    /// Camera position in world space.
    pub position: Vec3,
    /// Point the camera is looking at.
    pub target: Vec3,
    pub up: Vec3,
    /// Vertical field of view in degrees.
    pub fovy: f32,
}

impl Default for Camera {
    fn default() -> Self {
        Self {
            position: Vec3::new(0.0, 10.0, 10.0),
            target: Vec3::ZERO,
            up: Vec3::Y,
            fovy: 45.0,
        }
    }
}

impl Camera {
    /// Unit vector from the camera toward its target.
    pub fn forward(&self) -> Vec3 {
        (self.target - self.position).normalize_or_zero()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_looks_down_at_origin() {
        let cam = Camera::default();
        assert_eq!(cam.target, Vec3::ZERO);
        assert_eq!(cam.fovy, 45.0);
        let fwd = cam.forward();
        assert!(fwd.y < 0.0 && fwd.z < 0.0);
        assert!((fwd.length() - 1.0).abs() < 1e-6);
    }
}

use actorloop_common::Camera;
use glam::Mat4;

/// Projection parameters for turning a scene [`Camera`] into matrices.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Projection {
    pub aspect: f32,
    pub near: f32,
    pub far: f32,
}

impl Default for Projection {
    fn default() -> Self {
        Self {
            aspect: 16.0 / 9.0,
            near: 0.01,
            far: 1000.0,
        }
    }
}

impl Projection {
    pub fn with_viewport(width: u32, height: u32) -> Self {
        Self {
            aspect: width.max(1) as f32 / height.max(1) as f32,
            ..Self::default()
        }
    }

    pub fn view_matrix(&self, camera: &Camera) -> Mat4 {
        Mat4::look_at_rh(camera.position, camera.target, camera.up)
    }

    pub fn projection_matrix(&self, camera: &Camera) -> Mat4 {
        Mat4::perspective_rh(camera.fovy.to_radians(), self.aspect, self.near, self.far)
    }

    pub fn view_projection(&self, camera: &Camera) -> Mat4 {
        self.projection_matrix(camera) * self.view_matrix(camera)
    }
}

use glam::{Mat4, Vec2, Vec3};
use lightfield_kernel::CameraConfig;

/// Orthographic camera looking at `target`.
///
/// The visible half-height is `1 / zoom`, the half-width `aspect / zoom`.
pub struct OrthoCamera {
    pub eye: Vec3,
    pub target: Vec3,
    pub zoom: f32,
    pub aspect: f32,
    pub near: f32,
    pub far: f32,
}

impl Default for OrthoCamera {
    fn default() -> Self {
        Self::from_config(&CameraConfig::default(), 16.0 / 9.0)
    }
}

impl OrthoCamera {
    pub fn from_config(config: &CameraConfig, aspect: f32) -> Self {
        Self {
            eye: config.eye,
            target: Vec3::ZERO,
            zoom: config.zoom,
            aspect,
            near: config.near,
            far: config.far,
        }
    }

    pub fn apply_config(&mut self, config: &CameraConfig) {
        self.eye = config.eye;
        self.zoom = config.zoom;
        self.near = config.near;
        self.far = config.far;
    }

    pub fn set_viewport(&mut self, width: u32, height: u32) {
        self.aspect = width.max(1) as f32 / height.max(1) as f32;
    }

    pub fn half_extents(&self) -> Vec2 {
        let half_height = 1.0 / self.zoom;
        Vec2::new(half_height * self.aspect, half_height)
    }

    pub fn view_matrix(&self) -> Mat4 {
        Mat4::look_at_rh(self.eye, self.target, Vec3::Y)
    }

    pub fn projection_matrix(&self) -> Mat4 {
        let half = self.half_extents();
        Mat4::orthographic_rh(-half.x, half.x, -half.y, half.y, self.near, self.far)
    }

    pub fn view_projection(&self) -> Mat4 {
        self.projection_matrix() * self.view_matrix()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_camera_is_finite() {
        let cam = OrthoCamera::default();
        let vp = cam.view_projection();
        assert!(vp.is_finite());
    }

    #[test]
    fn target_projects_to_centre() {
        let cam = OrthoCamera::default();
        let clip = cam.view_projection().project_point3(Vec3::ZERO);
        assert!(clip.x.abs() < 1e-5);
        assert!(clip.y.abs() < 1e-5);
        assert!((0.0..=1.0).contains(&clip.z));
    }

    #[test]
    fn zoom_widens_the_view() {
        let mut cam = OrthoCamera::default();
        cam.set_viewport(800, 400);
        assert_eq!(cam.aspect, 2.0);
        assert_eq!(cam.half_extents(), Vec2::new(10.0, 5.0));
        cam.zoom = 1.0;
        assert_eq!(cam.half_extents(), Vec2::new(2.0, 1.0));
    }

    #[test]
    fn accepted_eyes_give_finite_views() {
        for eye in [Vec3::ONE, Vec3::new(0.0, 2.0, 0.01), Vec3::new(0.0, 0.0, -3.0)] {
            let config = CameraConfig {
                eye,
                ..CameraConfig::default()
            };
            assert!(config.validate().is_ok());
            assert!(OrthoCamera::from_config(&config, 1.5).view_projection().is_finite());
        }
        let vertical = CameraConfig {
            eye: Vec3::new(0.0, 2.0, 0.0),
            ..CameraConfig::default()
        };
        assert!(vertical.validate().is_err());
    }

    #[test]
    fn config_changes_apply() {
        let mut cam = OrthoCamera::default();
        let config = CameraConfig {
            zoom: 0.5,
            eye: Vec3::new(0.0, 2.0, 2.0),
            ..CameraConfig::default()
        };
        cam.apply_config(&config);
        assert_eq!(cam.zoom, 0.5);
        assert_eq!(cam.eye, Vec3::new(0.0, 2.0, 2.0));
    }
}

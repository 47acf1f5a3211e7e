use glam::Vec3;
use lightfield_common::{Rgb, Transform};
use lightfield_kernel::LightConfig;

/// Errors a render surface can report.
#[derive(Debug, thiserror::Error)]
pub enum RenderError {
    #[error("surface lost or outdated")]
    SurfaceLost,
    #[error("out of GPU memory")]
    OutOfMemory,
    #[error("instance {index} out of bounds for batch of {count}")]
    IndexOutOfBounds { index: usize, count: usize },
    #[error("surface already disposed")]
    Disposed,
    #[error("backend error: {0}")]
    Backend(String),
}

/// Light parameters handed to a surface each frame.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LightState {
    pub position: Vec3,
    pub marker_color: Rgb,
    pub point_color: Rgb,
    pub intensity: f32,
    pub ambient_intensity: f32,
}

impl LightState {
    pub fn new(config: &LightConfig, position: Vec3) -> Self {
        Self {
            position,
            marker_color: config.marker_color.to_rgb(),
            point_color: config.point_color,
            intensity: config.intensity,
            ambient_intensity: config.ambient_intensity,
        }
    }
}

/// What the driver needs from a graphics backend.
///
/// `create_instanced_batch` discards any previous batch. Transforms are then
/// written by index; `draw` presents whatever has been written.
pub trait RenderSurface {
    fn create_instanced_batch(&mut self, count: usize) -> Result<(), RenderError>;

    fn set_transform_at(&mut self, index: usize, transform: &Transform)
    -> Result<(), RenderError>;

    fn set_light(&mut self, light: &LightState) -> Result<(), RenderError>;

    fn draw(&mut self) -> Result<(), RenderError>;

    fn resize(&mut self, width: u32, height: u32);

    /// Release backend resources. Further calls fail with [`RenderError::Disposed`].
    fn dispose(&mut self);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn light_state_converts_marker_colour() {
        let config = LightConfig::default();
        let state = LightState::new(&config, Vec3::new(0.0, 1.0, 0.0));
        assert_eq!(state.position, Vec3::Y);
        assert_eq!(state.marker_color, config.marker_color.to_rgb());
        assert_eq!(state.point_color, Rgb::from_hex(0xf9d586));
        assert_eq!(state.intensity, 5.1);
    }

    #[test]
    fn errors_render_readably() {
        let e = RenderError::IndexOutOfBounds { index: 9, count: 3 };
        assert_eq!(e.to_string(), "instance 9 out of bounds for batch of 3");
    }
}

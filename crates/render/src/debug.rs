use lightfield_common::Transform;

use crate::surface::{LightState, RenderError, RenderSurface};

/// Text surface for headless runs and tests.
///
/// Keeps the written transforms in memory and turns each `draw` into a
/// human-readable frame listing.
#[derive(Debug, Default)]
pub struct DebugTextSurface {
    transforms: Vec<Transform>,
    light: Option<LightState>,
    size: (u32, u32),
    max_listed: usize,
    batches_created: usize,
    draws: u64,
    last_frame: String,
    disposed: bool,
}

impl DebugTextSurface {
    /// Surface that lists at most `max_listed` instances per frame.
    pub fn new(max_listed: usize) -> Self {
        Self {
            max_listed,
            size: (1, 1),
            ..Self::default()
        }
    }

    pub fn transforms(&self) -> &[Transform] {
        &self.transforms
    }

    pub fn light(&self) -> Option<&LightState> {
        self.light.as_ref()
    }

    pub fn size(&self) -> (u32, u32) {
        self.size
    }

    pub fn batches_created(&self) -> usize {
        self.batches_created
    }

    pub fn draws(&self) -> u64 {
        self.draws
    }

    pub fn last_frame(&self) -> &str {
        &self.last_frame
    }

    pub fn is_disposed(&self) -> bool {
        self.disposed
    }

    fn ensure_live(&self) -> Result<(), RenderError> {
        if self.disposed {
            Err(RenderError::Disposed)
        } else {
            Ok(())
        }
    }
}

impl RenderSurface for DebugTextSurface {
    fn create_instanced_batch(&mut self, count: usize) -> Result<(), RenderError> {
        self.ensure_live()?;
        self.transforms = vec![Transform::default(); count];
        self.batches_created += 1;
        Ok(())
    }

    fn set_transform_at(&mut self, index: usize, transform: &Transform) -> Result<(), RenderError> {
        self.ensure_live()?;
        let count = self.transforms.len();
        let slot = self
            .transforms
            .get_mut(index)
            .ok_or(RenderError::IndexOutOfBounds { index, count })?;
        *slot = *transform;
        Ok(())
    }

    fn set_light(&mut self, light: &LightState) -> Result<(), RenderError> {
        self.ensure_live()?;
        self.light = Some(*light);
        Ok(())
    }

    fn draw(&mut self) -> Result<(), RenderError> {
        self.ensure_live()?;
        self.draws += 1;

        let mut out = String::new();
        out.push_str(&format!(
            "=== Frame {} ({}x{}) ===\n",
            self.draws, self.size.0, self.size.1
        ));
        out.push_str(&format!("Boxes: {}\n", self.transforms.len()));
        if let Some(light) = &self.light {
            out.push_str(&format!(
                "Light: pos=({:.2}, {:.2}, {:.2}) intensity={:.1}\n",
                light.position.x, light.position.y, light.position.z, light.intensity
            ));
        }
        for (i, t) in self.transforms.iter().take(self.max_listed).enumerate() {
            out.push_str(&format!(
                "  [{i:>5}] pos=({:.3}, {:.3}, {:.3}) scale=({:.3}, {:.3}, {:.3})\n",
                t.position.x, t.position.y, t.position.z, t.scale.x, t.scale.y, t.scale.z
            ));
        }
        if self.transforms.len() > self.max_listed {
            out.push_str(&format!(
                "  ... {} more\n",
                self.transforms.len() - self.max_listed
            ));
        }

        self.last_frame = out;
        Ok(())
    }

    fn resize(&mut self, width: u32, height: u32) {
        self.size = (width.max(1), height.max(1));
    }

    fn dispose(&mut self) {
        self.transforms.clear();
        self.light = None;
        self.disposed = true;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use glam::Vec3;
    use lightfield_kernel::LightConfig;

    #[test]
    fn empty_surface_draws_header() {
        let mut surface = DebugTextSurface::new(4);
        surface.draw().unwrap();
        assert!(surface.last_frame().contains("Frame 1"));
        assert!(surface.last_frame().contains("Boxes: 0"));
    }

    #[test]
    fn written_transforms_show_up() {
        let mut surface = DebugTextSurface::new(1);
        surface.create_instanced_batch(3).unwrap();
        surface
            .set_transform_at(
                0,
                &Transform {
                    position: Vec3::new(1.0, 2.0, 3.0),
                    ..Transform::default()
                },
            )
            .unwrap();
        surface
            .set_light(&LightState::new(&LightConfig::default(), Vec3::ZERO))
            .unwrap();
        surface.draw().unwrap();

        let frame = surface.last_frame();
        assert!(frame.contains("Boxes: 3"));
        assert!(frame.contains("pos=(1.000, 2.000, 3.000)"));
        assert!(frame.contains("... 2 more"));
        assert!(frame.contains("Light:"));
    }

    #[test]
    fn out_of_range_index_is_an_error() {
        let mut surface = DebugTextSurface::new(0);
        surface.create_instanced_batch(2).unwrap();
        let err = surface.set_transform_at(2, &Transform::default()).unwrap_err();
        assert!(matches!(err, RenderError::IndexOutOfBounds { index: 2, count: 2 }));
    }

    #[test]
    fn disposed_surface_refuses_work() {
        let mut surface = DebugTextSurface::new(0);
        surface.create_instanced_batch(1).unwrap();
        surface.dispose();
        assert!(surface.is_disposed());
        assert!(surface.transforms().is_empty());
        assert!(matches!(surface.draw(), Err(RenderError::Disposed)));
    }

    #[test]
    fn resize_clamps_to_one() {
        let mut surface = DebugTextSurface::new(0);
        surface.resize(0, 480);
        assert_eq!(surface.size(), (1, 480));
    }
}

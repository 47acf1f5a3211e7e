use glam::{Mat4, Quat, Vec3};
use serde::{Deserialize, Serialize};

/// Spatial transform: position, rotation, scale.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Transform {
    pub position: Vec3,
    pub rotation: Quat,
    pub scale: Vec3,
}

impl Default for Transform {
    fn default() -> Self {
        Self {
            position: Vec3::ZERO,
            rotation: Quat::IDENTITY,
            scale: Vec3::ONE,
        }
    }
}

impl Transform {
    pub fn new(position: Vec3, rotation: Quat, scale: Vec3) -> Self {
        Self {
            position,
            rotation,
            scale,
        }
    }

    /// Compose into a single affine matrix (scale, then rotate, then translate).
    pub fn to_matrix(&self) -> Mat4 {
        Mat4::from_scale_rotation_translation(self.scale, self.rotation, self.position)
    }

    /// Same rotation and scale, new position.
    pub fn with_position(self, position: Vec3) -> Self {
        Self { position, ..self }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn transform_default_is_identity() {
        let t = Transform::default();
        assert_eq!(t.position, Vec3::ZERO);
        assert_eq!(t.rotation, Quat::IDENTITY);
        assert_eq!(t.scale, Vec3::ONE);
        assert_eq!(t.to_matrix(), Mat4::IDENTITY);
    }

    #[test]
    fn matrix_scales_then_translates() {
        let t = Transform::new(
            Vec3::new(1.5, -2.0, 0.25),
            Quat::IDENTITY,
            Vec3::new(0.1, 0.12, 0.09),
        );
        let corner = t.to_matrix().transform_point3(Vec3::ONE);
        assert!(corner.abs_diff_eq(Vec3::new(1.6, -1.88, 0.34), 1e-6));
    }

    #[test]
    fn with_position_keeps_scale() {
        let t = Transform {
            scale: Vec3::splat(0.1),
            ..Transform::default()
        };
        let moved = t.with_position(Vec3::X);
        assert_eq!(moved.position, Vec3::X);
        assert_eq!(moved.scale, Vec3::splat(0.1));
    }
}

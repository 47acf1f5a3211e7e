use glam::{Quat, Vec3};
use lightfield_common::Transform;

use crate::config::InteractiveConfig;
use crate::motion::{self, RegimeCounts};

/// One box of the field.
///
/// `velocity` doubles as the current position: every step overwrites it with
/// the rendered translation before the accumulated acceleration is added.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BoxInstance {
    pub origin: Vec3,
    pub base_scale: Vec3,
    pub base_rotation: Quat,
    pub mass: f32,
    pub velocity: Vec3,
    pub acceleration: Vec3,
}

impl BoxInstance {
    /// A box at rest at `origin`. Mass is the mean of the scale components.
    pub fn new(origin: Vec3, base_scale: Vec3) -> Self {
        Self {
            origin,
            base_scale,
            base_rotation: Quat::IDENTITY,
            mass: (base_scale.x + base_scale.y + base_scale.z) / 3.0,
            velocity: origin,
            acceleration: Vec3::ZERO,
        }
    }

    pub fn rest_transform(&self) -> Transform {
        Transform::new(self.origin, self.base_rotation, self.base_scale)
    }
}

/// The renderable batch: instances plus their current transforms, index-aligned.
///
/// `generation` identifies the batch; consumers compare it to know when the
/// whole batch was replaced. `dirty` is set whenever a transform changes.
#[derive(Debug, Clone, Default)]
pub struct InstanceBatch {
    instances: Vec<BoxInstance>,
    transforms: Vec<Transform>,
    generation: u64,
    dirty: bool,
}

impl InstanceBatch {
    pub fn with_capacity(generation: u64, capacity: usize) -> Self {
        Self {
            instances: Vec::with_capacity(capacity),
            transforms: Vec::with_capacity(capacity),
            generation,
            dirty: false,
        }
    }

    /// Append an instance at its rest transform.
    pub fn push(&mut self, instance: BoxInstance) {
        self.transforms.push(instance.rest_transform());
        self.instances.push(instance);
        self.dirty = true;
    }

    pub fn len(&self) -> usize {
        self.instances.len()
    }

    pub fn is_empty(&self) -> bool {
        self.instances.is_empty()
    }

    pub fn generation(&self) -> u64 {
        self.generation
    }

    pub fn instances(&self) -> &[BoxInstance] {
        &self.instances
    }

    pub fn instance(&self, index: usize) -> Option<&BoxInstance> {
        self.instances.get(index)
    }

    pub fn transforms(&self) -> &[Transform] {
        &self.transforms
    }

    pub fn transform(&self, index: usize) -> Option<&Transform> {
        self.transforms.get(index)
    }

    pub fn is_dirty(&self) -> bool {
        self.dirty
    }

    pub fn mark_clean(&mut self) {
        self.dirty = false;
    }

    /// Apply the motion rule to every instance, in index order.
    pub fn step(&mut self, target: Vec3, dt: f32, config: &InteractiveConfig) -> RegimeCounts {
        let mut counts = RegimeCounts::default();
        for (instance, transform) in self.instances.iter_mut().zip(self.transforms.iter_mut()) {
            counts.record(motion::update_instance(
                instance, transform, target, dt, config,
            ));
        }
        if !self.instances.is_empty() {
            self.dirty = true;
        }
        counts
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn mass_is_mean_of_scale() {
        let b = BoxInstance::new(Vec3::ZERO, Vec3::new(0.09, 0.12, 0.12));
        assert!((b.mass - 0.11).abs() < 1e-6);
        assert_eq!(b.velocity, b.origin);
        assert_eq!(b.acceleration, Vec3::ZERO);
    }

    #[test]
    fn push_keeps_transforms_aligned() {
        let mut batch = InstanceBatch::with_capacity(3, 2);
        batch.push(BoxInstance::new(Vec3::X, Vec3::splat(0.1)));
        batch.push(BoxInstance::new(Vec3::Y, Vec3::splat(0.2)));
        assert_eq!(batch.len(), 2);
        assert_eq!(batch.generation(), 3);
        assert_eq!(batch.transform(1).unwrap().position, Vec3::Y);
        assert_eq!(batch.transform(1).unwrap().scale, Vec3::splat(0.2));
        assert!(batch.is_dirty());
        batch.mark_clean();
        assert!(!batch.is_dirty());
    }

    #[test]
    fn step_on_empty_batch_stays_clean() {
        let mut batch = InstanceBatch::default();
        let counts = batch.step(Vec3::ZERO, 0.016, &InteractiveConfig::default());
        assert_eq!(counts.total(), 0);
        assert!(!batch.is_dirty());
    }
}

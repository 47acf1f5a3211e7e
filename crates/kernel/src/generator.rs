use glam::Vec3;
use rand::Rng;

use crate::config::{CountRange, GenerativeConfig};
use crate::instance::{BoxInstance, InstanceBatch};

/// Source of uniform random numbers. Both bounds are inclusive.
pub trait RandomSource {
    fn uniform(&mut self, min: f32, max: f32) -> f32;
    fn uniform_int(&mut self, min: usize, max: usize) -> usize;
}

impl<R: Rng + ?Sized> RandomSource for R {
    fn uniform(&mut self, min: f32, max: f32) -> f32 {
        self.gen_range(min..=max)
    }

    fn uniform_int(&mut self, min: usize, max: usize) -> usize {
        self.gen_range(min..=max)
    }
}

/// Draw an instance count from the configured range, both ends inclusive.
pub fn pick_box_count(range: &CountRange, rng: &mut impl RandomSource) -> usize {
    rng.uniform_int(range.min, range.max)
}

/// Build a fresh batch of `count` boxes with random origin and scale.
///
/// Expects a validated `config`; bounds must be ordered.
pub fn generate(
    count: usize,
    config: &GenerativeConfig,
    generation: u64,
    rng: &mut impl RandomSource,
) -> InstanceBatch {
    let mut batch = InstanceBatch::with_capacity(generation, count);
    for _ in 0..count {
        let origin = random_vec3(rng, config.min_pos, config.max_pos);
        let scale = random_vec3(rng, config.min_size, config.max_size);
        batch.push(BoxInstance::new(origin, scale));
    }
    tracing::debug!(count, generation, "generated box batch");
    batch
}

fn random_vec3(rng: &mut impl RandomSource, min: f32, max: f32) -> Vec3 {
    let x = rng.uniform(min, max);
    let y = rng.uniform(min, max);
    let z = rng.uniform(min, max);
    Vec3::new(x, y, z)
}

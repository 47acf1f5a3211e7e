use glam::{Vec2, Vec3};
use rand::SeedableRng;
use rand::rngs::SmallRng;

use crate::config::{LightConfig, SceneConfig};
use crate::generator;
use crate::instance::InstanceBatch;
use crate::motion::RegimeCounts;

/// The single attractor point the boxes react to.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct LightTracker {
    position: Vec3,
}

impl LightTracker {
    pub fn new(position: Vec3) -> Self {
        Self { position }
    }

    pub fn position(&self) -> Vec3 {
        self.position
    }

    /// Pull the position from configuration.
    pub fn sync(&mut self, light: &LightConfig) {
        self.position = light.position;
    }

    /// Light position for a cursor at `ndc` (both axes in `[-1, 1]`).
    ///
    /// x and y span `amplitude` across the viewport; z is kept.
    pub fn cursor_position(&self, ndc: Vec2, amplitude: f32) -> Vec3 {
        let xy = ndc.clamp(Vec2::NEG_ONE, Vec2::ONE) * 0.5 * amplitude;
        Vec3::new(xy.x, xy.y, self.position.z)
    }
}

/// The authoritative box field.
///
/// Owns the current batch, the light tracker and the random source used for
/// (re)generation. Regeneration builds the replacement batch completely
/// before swapping it in, so a reader never observes a half-built batch.
#[derive(Debug, Clone)]
pub struct BoxField {
    batch: InstanceBatch,
    light: LightTracker,
    rng: SmallRng,
    frames: u64,
    regenerate_requested: bool,
    last_regimes: RegimeCounts,
}

impl BoxField {
    /// Create a field with an instance count drawn from configuration.
    pub fn new(config: &SceneConfig, seed: Option<u64>) -> Self {
        let rng = match seed {
            Some(seed) => SmallRng::seed_from_u64(seed),
            None => SmallRng::from_entropy(),
        };
        let mut field = Self {
            batch: InstanceBatch::default(),
            light: LightTracker::new(config.light().position),
            rng,
            frames: 0,
            regenerate_requested: false,
            last_regimes: RegimeCounts::default(),
        };
        field.regenerate(config);
        field
    }

    /// Create a field with an exact instance count.
    pub fn with_count(config: &SceneConfig, count: usize, seed: u64) -> Self {
        let mut field = Self {
            batch: InstanceBatch::default(),
            light: LightTracker::new(config.light().position),
            rng: SmallRng::seed_from_u64(seed),
            frames: 0,
            regenerate_requested: false,
            last_regimes: RegimeCounts::default(),
        };
        field.regenerate_with_count(config, count);
        field
    }

    /// Replace the batch with a freshly generated one. Returns the new count.
    pub fn regenerate(&mut self, config: &SceneConfig) -> usize {
        let count = generator::pick_box_count(&config.generative().box_count, &mut self.rng);
        self.regenerate_with_count(config, count);
        count
    }

    pub fn regenerate_with_count(&mut self, config: &SceneConfig, count: usize) {
        let generation = self.batch.generation() + 1;
        let batch = generator::generate(count, config.generative(), generation, &mut self.rng);
        self.install(batch);
    }

    fn install(&mut self, batch: InstanceBatch) {
        let previous = std::mem::replace(&mut self.batch, batch);
        self.last_regimes = RegimeCounts::default();
        tracing::info!(
            count = self.batch.len(),
            generation = self.batch.generation(),
            replaced = previous.len(),
            "box field regenerated"
        );
    }

    /// Ask for a regeneration at the start of the next frame.
    pub fn request_regenerate(&mut self) {
        self.regenerate_requested = true;
    }

    /// Consume a pending regeneration request.
    pub fn take_regenerate_request(&mut self) -> bool {
        std::mem::take(&mut self.regenerate_requested)
    }

    pub fn regenerate_pending(&self) -> bool {
        self.regenerate_requested
    }

    /// Advance every instance by one frame against the tracked light.
    pub fn step(&mut self, dt: f32, config: &SceneConfig) -> RegimeCounts {
        let _span = tracing::debug_span!("field_step", frame = self.frames).entered();
        let counts = self
            .batch
            .step(self.light.position(), dt, config.interactive());
        self.frames += 1;
        self.last_regimes = counts;
        tracing::trace!(
            attraction = counts.attraction,
            hysteresis = counts.hysteresis,
            returning = counts.return_to_origin,
            "field step complete"
        );
        counts
    }

    /// Move the tracked light to the configured position.
    pub fn sync_light(&mut self, config: &SceneConfig) {
        self.light.sync(config.light());
    }

    pub fn batch(&self) -> &InstanceBatch {
        &self.batch
    }

    pub fn batch_mut(&mut self) -> &mut InstanceBatch {
        &mut self.batch
    }

    pub fn light(&self) -> &LightTracker {
        &self.light
    }

    pub fn instance_count(&self) -> usize {
        self.batch.len()
    }

    /// Number of steps taken since the field was created.
    pub fn frames(&self) -> u64 {
        self.frames
    }

    pub fn last_regimes(&self) -> RegimeCounts {
        self.last_regimes
    }

    /// Deterministic hash of the observable state, for comparing runs.
    pub fn state_hash(&self) -> u64 {
        let mut h: u64 = 0xcbf2_9ce4_8422_2325; // FNV offset basis
        let mix = |h: &mut u64, bytes: &[u8]| {
            for &b in bytes {
                *h ^= b as u64;
                *h = h.wrapping_mul(0x0100_0000_01b3);
            }
        };
        let mix_vec = |h: &mut u64, v: Vec3| {
            for c in v.to_array() {
                mix(h, &c.to_le_bytes());
            }
        };
        mix(&mut h, &self.batch.generation().to_le_bytes());
        mix(&mut h, &self.frames.to_le_bytes());
        mix_vec(&mut h, self.light.position());
        for (instance, transform) in self.batch.instances().iter().zip(self.batch.transforms()) {
            mix_vec(&mut h, instance.origin);
            mix_vec(&mut h, instance.velocity);
            mix_vec(&mut h, transform.position);
            mix_vec(&mut h, transform.scale);
        }
        h
    }
}

//! The per-frame motion rule.
//!
//! Inside `distance_threshold` of the light a box is pushed away from it with a
//! strength that falls with mass and distance. Outside, it is pulled back
//! toward its origin, except inside a thin band just past the threshold where
//! the pull is suppressed so boxes do not flap between regimes.
//!
//! The recurrence is deliberately not textbook Euler: `velocity` is reset to
//! the current translation, the accumulated acceleration is added once, and
//! the result becomes the new translation.

use glam::Vec3;
use lightfield_common::Transform;

use crate::config::InteractiveConfig;
use crate::instance::BoxInstance;

/// Width of the band past the threshold where the return pull is zeroed.
pub const HYSTERESIS_BAND: f32 = 0.1;

/// Floor for the distance used as a divisor.
pub const MIN_DISTANCE: f32 = 1e-4;

/// Which branch of the rule applied to an instance.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Regime {
    Attraction,
    Hysteresis,
    ReturnToOrigin,
}

/// Per-step tally of regimes.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RegimeCounts {
    pub attraction: usize,
    pub hysteresis: usize,
    pub return_to_origin: usize,
}

impl RegimeCounts {
    pub fn record(&mut self, regime: Regime) {
        match regime {
            Regime::Attraction => self.attraction += 1,
            Regime::Hysteresis => self.hysteresis += 1,
            Regime::ReturnToOrigin => self.return_to_origin += 1,
        }
    }

    pub fn total(&self) -> usize {
        self.attraction + self.hysteresis + self.return_to_origin
    }
}

/// Inverse-distance factor of the attraction regime, with the divisor clamped.
pub fn distance_multiplier(distance: f32, config: &InteractiveConfig) -> f32 {
    config.distance_factor / distance.max(MIN_DISTANCE)
}

/// Impulse contributed this frame for an instance at `translation`.
pub fn impulse(
    instance: &BoxInstance,
    translation: Vec3,
    target: Vec3,
    dt: f32,
    config: &InteractiveConfig,
) -> (Vec3, Regime) {
    let distance = translation.distance(target);

    if distance <= config.distance_threshold {
        let direction = translation - target;
        let mass_multiplier = 1.0 / (instance.mass * config.box_mass_factor);
        let scale = mass_multiplier
            * distance_multiplier(distance, config)
            * config.box_speed
            * dt.max(0.0);
        return (direction * scale, Regime::Attraction);
    }

    if distance <= config.distance_threshold + HYSTERESIS_BAND {
        return (Vec3::ZERO, Regime::Hysteresis);
    }

    let direction = instance.origin - translation;
    (direction * config.origin_factor, Regime::ReturnToOrigin)
}

/// Advance one instance by one frame and write its new transform back.
pub fn update_instance(
    instance: &mut BoxInstance,
    transform: &mut Transform,
    target: Vec3,
    dt: f32,
    config: &InteractiveConfig,
) -> Regime {
    let translation = transform.position;
    instance.velocity = translation;

    let (delta, regime) = impulse(instance, translation, target, dt, config);
    instance.acceleration += delta;
    instance.velocity += instance.acceleration;

    *transform = transform.with_position(instance.velocity);
    instance.acceleration = Vec3::ZERO;
    regime
}

//! Field Kernel: authoritative box-field state and the per-frame motion rule.
//!
//! # Invariants
//! - Every instance has `mass > 0`.
//! - A batch is replaced wholesale on regeneration, never patched.
//! - The motion step is deterministic given instance state, target and `dt`.
//! - Configuration changes only through validated setters.

pub mod config;
pub mod field;
pub mod generator;
pub mod instance;
pub mod motion;

pub use config::{
    CameraConfig, ConfigError, CountRange, DevConfig, FloorConfig, GenerativeConfig,
    InteractiveConfig, LightConfig, LoopingConfig, MAX_BOX_COUNT, PerformanceConfig, SceneConfig,
};
pub use field::{BoxField, LightTracker};
pub use generator::{RandomSource, generate, pick_box_count};
pub use instance::{BoxInstance, InstanceBatch};
pub use motion::{Regime, RegimeCounts};

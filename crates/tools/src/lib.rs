//! Developer Tooling: field inspector and frame-time measurement.
//!
//! # Invariants
//! - Tools only read field state; they never step or regenerate it.

pub mod inspector;
pub mod timing;

pub use inspector::{FieldInspector, FieldSummary, InstanceInfo};
pub use timing::{FrameTimer, PerformanceMeter};

pub fn crate_info() -> &'static str {
    "lightfield-tools v0.1.0"
}

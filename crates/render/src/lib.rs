//! Rendering Adapter: renderer-agnostic surface interface and the frame driver.
//!
//! # Invariants
//! - Surfaces never mutate field state; they only receive transforms.
//! - A surface never sees a mix of two batch generations.
//! - The driver's clock and frame source are injectable, so a run can be
//!   stepped deterministically without a display.

mod clock;
mod debug;
mod driver;
mod surface;

pub use clock::{FixedFrames, FrameClock, FrameSource, MAX_FRAME_DELTA, ManualClock, SystemClock};
pub use debug::DebugTextSurface;
pub use driver::{FrameDriver, FrameReport};
pub use surface::{LightState, RenderError, RenderSurface};

pub fn crate_info() -> &'static str {
    "lightfield-render v0.1.0"
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn crate_loads() {
        assert!(crate_info().contains("render"));
    }
}

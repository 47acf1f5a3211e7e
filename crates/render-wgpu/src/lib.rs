//! wgpu render backend for the box field.
//!
//! Draws the instanced boxes lit by a point light, an unlit sphere marking the
//! light, and an optional floor grid, all through an orthographic camera.
//!
//! # Invariants
//! - The backend never touches field state; it only receives transforms.
//! - The instance buffer always holds at least as many slots as the batch.

mod camera;
mod gpu;
mod mesh;
mod shaders;

pub use camera::OrthoCamera;
pub use gpu::{WgpuFrame, WgpuRenderer};

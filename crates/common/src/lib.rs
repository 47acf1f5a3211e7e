//! Shared value types used by every lightfield crate.

mod color;
mod types;

pub use color::{Hsl, Rgb};
pub use types::Transform;

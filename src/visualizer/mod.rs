// Ultralytics 🚀 AGPL-3.0 License - https://ultralytics.com/license

//! Visualization tools for posture verdicts.

/// Color definitions.
pub mod color;
/// Pose skeleton topology.
pub mod skeleton;

pub use color::Color;
pub use skeleton::{BodyRegion, SKELETON};

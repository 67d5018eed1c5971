//! Core types and utilities

pub mod ids;
pub mod point;

pub use ids::{AtomId, FrontId, MarkerId};
pub use point::{lerp, planar_distance, Point};

/// Spatial tolerance (m) for boundary and intersection tests.
pub const EPSILON_X: f64 = 1e-3;
/// Velocity tolerance (m/s).
pub const EPSILON_V: f64 = 1e-3;
/// Time tolerance (s) used when draining the schedule up to a target time.
pub const EPSILON_T: f64 = 1e-3;
/// Upper bound on any walk along a marker cycle or frontier.
pub const LOOP_LIMIT: usize = 1_000_000;

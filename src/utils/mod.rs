//! # Utilities Module
//!
//! Pathfinding, flood-fill connectivity and small random/geometry helpers.

pub mod connectivity;
pub mod math;
pub mod pathfinding;

pub use connectivity::*;
pub use math::*;
pub use pathfinding::*;

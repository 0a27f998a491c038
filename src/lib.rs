//! # Hard Division
//!
//! Level construction core for a grid roguelike: procedural map generation,
//! A* pathfinding, flood-fill connectivity checks and entity placement.
//!
//! ## Architecture Overview
//!
//! The crate is organised around a handful of small, pure building blocks:
//!
//! - **Grid Model**: a rectangular buffer of wall/floor/stairs cells
//! - **Pathfinding**: A* shortest paths and flood-fill reachability counts
//! - **Generation System**: swappable carving strategies that turn an all-wall grid into a level
//! - **Placement**: stairs, key, enemy and pickup placement that keeps the level playable
//! - **Autopilot**: a path-following step queue driven by the pathfinder
//!
//! A whole level is assembled through [`LevelContext::generate`], which owns the
//! grid and every placed position for the duration of setup.

pub mod game;
pub mod generation;
pub mod utils;

// Core module re-exports
pub use game::*;
pub use generation::*;
pub use utils::*;

/// Core error type for the level construction pipeline.
#[derive(thiserror::Error, Debug)]
pub enum DivisionError {
    /// I/O operation failed
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Serialization/deserialization error
    #[error("Serialization error: {0}")]
    Serde(#[from] serde_json::Error),

    /// Direct grid access outside the grid
    #[error("Position ({x}, {y}) is out of bounds")]
    OutOfBounds { x: i32, y: i32 },

    /// A bounded placement search failed even after its fallbacks
    #[error("Placement exhausted: {0}")]
    PlacementExhausted(String),

    /// Generation produced an unusable grid
    #[error("Generation failed: {0}")]
    GenerationFailed(String),

    /// Level state is invalid
    #[error("Invalid state: {0}")]
    InvalidState(String),
}

/// Result type used throughout the crate.
pub type DivisionResult<T> = Result<T, DivisionError>;

/// Version information for the crate.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Level construction constants.
pub mod config {
    /// Default map width in tiles
    pub const DEFAULT_MAP_WIDTH: u32 = 30;

    /// Default map height in tiles
    pub const DEFAULT_MAP_HEIGHT: u32 = 20;

    /// Grids with fewer walkable tiles than this are rejected
    pub const MIN_WALKABLE_TILES: usize = 2;

    /// Fresh grids tried before a level is declared impossible
    pub const DEFAULT_LEVEL_ATTEMPTS: u32 = 5;

    /// Hard cap on enemies per level
    pub const MAX_ENEMIES_PER_LEVEL: u32 = 7;
}

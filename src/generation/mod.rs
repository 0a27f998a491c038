//! # Generation Module
//!
//! Procedural map generation and entity placement.
//!
//! This module turns an all-wall [`Grid`] into a playable level. Generators carve
//! floor with one of several strategies; placement then puts stairs, the key,
//! enemies and pickups on the map while keeping every walkable tile reachable
//! from the player as far as the layout allows.

pub mod carve;
pub mod dungeon;
pub mod encounters;
pub mod items;
pub mod placement;

pub use carve::*;
pub use dungeon::*;
pub use encounters::*;
pub use items::*;
pub use placement::*;

use crate::{config, DivisionResult, Grid, Position};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Configuration for level generation and placement.
///
/// Controls the map size, the carving strategy and every tuning constant the
/// placement policies use. Missing fields in a config file fall back to
/// [`GenerationConfig::default`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GenerationConfig {
    /// Random seed for reproducible generation
    pub seed: u64,
    /// Map width in tiles
    pub map_width: u32,
    /// Map height in tiles
    pub map_height: u32,
    /// Carving strategy for new grids
    pub strategy: MapStrategy,
    /// Random-walk length as a fraction of the map area
    pub random_walk_ratio: f64,
    /// Probability that a winding tunnel step heads toward its target
    pub tunnel_bias: f64,
    /// Walkable tiles allowed to become unreachable from the player
    pub unreachable_slack: usize,
    /// Fraction of width/height where the preferred stairs quadrant starts
    pub stairs_quadrant: f64,
    /// Minimum open cardinal neighbours for a preferred stairs tile
    pub stairs_min_open_neighbors: usize,
    /// Best stairs candidates tried before the fallback scan
    pub stairs_best_candidates: usize,
    /// Most-open floor tiles tested for reachability when looking for an empty tile
    pub reachability_candidates: usize,
    /// Random samples tried when no player position exists yet
    pub bootstrap_attempts: u32,
    /// Random samples tried when placing the key
    pub key_attempts: u32,
    /// Upper bound on enemies per level
    pub max_enemies: u32,
    /// Maps no larger than this on both axes skip the enemy chokepoint check
    pub small_map_size: u32,
    /// Fresh grids tried before level setup gives up
    pub level_attempts: u32,
}

impl GenerationConfig {
    /// Creates the standard configuration.
    ///
    /// # Examples
    ///
    /// ```
    /// use hard_division::GenerationConfig;
    ///
    /// let config = GenerationConfig::new(12345);
    /// assert_eq!(config.seed, 12345);
    /// assert_eq!(config.unreachable_slack, 1);
    /// ```
    pub fn new(seed: u64) -> Self {
        Self {
            seed,
            map_width: config::DEFAULT_MAP_WIDTH,
            map_height: config::DEFAULT_MAP_HEIGHT,
            strategy: MapStrategy::RandomWalk,
            random_walk_ratio: 0.25,
            tunnel_bias: 0.7,
            unreachable_slack: 1,
            stairs_quadrant: 0.75,
            stairs_min_open_neighbors: 2,
            stairs_best_candidates: 5,
            reachability_candidates: 20,
            bootstrap_attempts: 100,
            key_attempts: 1000,
            max_enemies: config::MAX_ENEMIES_PER_LEVEL,
            small_map_size: 4,
            level_attempts: config::DEFAULT_LEVEL_ATTEMPTS,
        }
    }

    /// Creates a configuration for testing with small maps.
    pub fn for_testing(seed: u64) -> Self {
        Self {
            map_width: 16,
            map_height: 12,
            ..Self::new(seed)
        }
    }

    /// Returns a copy using a different strategy.
    pub fn with_strategy(mut self, strategy: MapStrategy) -> Self {
        self.strategy = strategy;
        self
    }

    /// Returns a copy using a different map size.
    pub fn with_size(mut self, width: u32, height: u32) -> Self {
        self.map_width = width;
        self.map_height = height;
        self
    }

    /// Loads a configuration from a JSON file.
    pub fn from_json_file(path: impl AsRef<Path>) -> DivisionResult<Self> {
        let text = std::fs::read_to_string(path)?;
        Ok(serde_json::from_str(&text)?)
    }

    /// Creates a seeded random number generator from the config.
    pub fn create_rng(&self) -> StdRng {
        StdRng::seed_from_u64(self.seed)
    }
}

impl Default for GenerationConfig {
    fn default() -> Self {
        Self::new(42)
    }
}

/// Outline used when a chamber is carved.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ChamberShape {
    /// Filled rectangle anchored at the top-left corner
    Rectangle,
    /// Ellipse with slightly ragged edges
    Oval,
    /// Circle whose radius wobbles per cell
    Round,
    /// Manhattan-distance diamond
    Diamond,
}

/// Transient chamber descriptor used while a generator lays out a map.
///
/// Chambers only exist during generation; the finished grid keeps no record of them.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Chamber {
    /// Anchor point tunnels and traces connect to
    pub center: Position,
    /// Width in tiles (diameter for round shapes)
    pub width: u32,
    /// Height in tiles (diameter for round shapes)
    pub height: u32,
    pub shape: ChamberShape,
}

impl Chamber {
    /// Creates a chamber centered on `center`.
    pub fn new(center: Position, width: u32, height: u32, shape: ChamberShape) -> Self {
        Self {
            center,
            width,
            height,
            shape,
        }
    }

    /// Creates a rectangular chamber from its top-left corner.
    ///
    /// # Examples
    ///
    /// ```
    /// use hard_division::{Chamber, Position};
    ///
    /// let chamber = Chamber::from_corner(Position::new(2, 2), 4, 3);
    /// assert_eq!(chamber.top_left(), Position::new(2, 2));
    /// assert_eq!(chamber.center, Position::new(4, 3));
    /// ```
    pub fn from_corner(top_left: Position, width: u32, height: u32) -> Self {
        let center = Position::new(
            top_left.x + width as i32 / 2,
            top_left.y + height as i32 / 2,
        );
        Self::new(center, width, height, ChamberShape::Rectangle)
    }

    /// Gets the top-left corner of the chamber's bounding box.
    pub fn top_left(&self) -> Position {
        Position::new(
            self.center.x - self.width as i32 / 2,
            self.center.y - self.height as i32 / 2,
        )
    }

    /// Checks if a position is inside the chamber's bounding box.
    pub fn contains(&self, pos: Position) -> bool {
        let tl = self.top_left();
        pos.x >= tl.x
            && pos.y >= tl.y
            && pos.x < tl.x + self.width as i32
            && pos.y < tl.y + self.height as i32
    }

    /// Checks whether the bounding boxes come within `margin` tiles of each other.
    pub fn near(&self, other: &Chamber, margin: i32) -> bool {
        let a = self.top_left();
        let b = other.top_left();
        !(a.x + self.width as i32 + margin < b.x
            || b.x + other.width as i32 + margin < a.x
            || a.y + self.height as i32 + margin < b.y
            || b.y + other.height as i32 + margin < a.y)
    }

    /// Carves the chamber's floor into the grid.
    pub fn carve<R: Rng + ?Sized>(&self, grid: &mut Grid, rng: &mut R) {
        match self.shape {
            ChamberShape::Rectangle => {
                let tl = self.top_left();
                for dy in 0..self.height as i32 {
                    for dx in 0..self.width as i32 {
                        grid.carve(Position::new(tl.x + dx, tl.y + dy));
                    }
                }
            }
            ChamberShape::Oval => {
                let half_w = (self.width as i32 / 2).max(1);
                let half_h = (self.height as i32 / 2).max(1);
                for dy in -half_h..=half_h {
                    for dx in -half_w..=half_w {
                        let nx = dx as f64 / (self.width as f64 / 2.0);
                        let ny = dy as f64 / (self.height as f64 / 2.0);
                        if nx * nx + ny * ny <= 1.0 + rng.gen::<f64>() * 0.2 {
                            grid.carve(Position::new(self.center.x + dx, self.center.y + dy));
                        }
                    }
                }
            }
            ChamberShape::Round => {
                let radius = (self.width / 2).max(1) as i32;
                for dy in -radius..=radius {
                    for dx in -radius..=radius {
                        let distance = ((dx * dx + dy * dy) as f64).sqrt();
                        if distance <= radius as f64 * (0.8 + rng.gen::<f64>() * 0.4) {
                            grid.carve(Position::new(self.center.x + dx, self.center.y + dy));
                        }
                    }
                }
            }
            ChamberShape::Diamond => {
                let radius = (self.width / 2) as i32;
                for dy in -radius..=radius {
                    for dx in -radius..=radius {
                        if dx.abs() + dy.abs() <= radius {
                            grid.carve(Position::new(self.center.x + dx, self.center.y + dy));
                        }
                    }
                }
            }
        }
        // Anchor is always open so tunnels meet the chamber
        grid.carve(self.center);
    }
}

/// Trait for procedural generators.
///
/// Allows callers to swap generation strategies behind one interface.
pub trait Generator<T> {
    /// Generates content using the provided configuration and random number generator.
    fn generate(&self, config: &GenerationConfig, rng: &mut StdRng) -> DivisionResult<T>;

    /// Validates that the generated content meets requirements.
    fn validate(&self, content: &T, config: &GenerationConfig) -> DivisionResult<()>;

    /// Gets the generator type name for logging and debugging.
    fn generator_type(&self) -> &'static str;
}

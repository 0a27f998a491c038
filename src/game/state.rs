//! # Level State Module
//!
//! The [`LevelContext`] owns one level from carving to hand-off.
//!
//! Generation and placement never touch shared state: the context is built by
//! [`LevelContext::generate`], which carves a grid and runs the placement
//! pipeline against it, retrying with fresh grids when a stage gives up.

use crate::{
    count_reachable_tiles, count_total_walkable, is_reachable, place_key, place_stairs,
    spawn_enemies, spawn_pickups, spawn_player, DivisionError, DivisionResult, DungeonGenerator,
    EnemyPlacement, GenerationConfig, Generator, Grid, MapStrategy, PickupPlacement, Position,
};
use log::{debug, error, info, warn};
use rand::rngs::StdRng;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::fmt;

/// Everything placed on one level.
///
/// The grid holds the terrain (including the stairs cell); the player, key,
/// enemies and pickups are positions on top of it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LevelContext {
    /// Level number, starting at 1
    pub level: u32,
    /// Strategy the grid was carved with
    pub strategy: MapStrategy,
    pub grid: Grid,
    pub player: Position,
    pub stairs: Position,
    pub key: Position,
    /// Whether the player has picked the key up
    pub key_collected: bool,
    pub enemies: Vec<EnemyPlacement>,
    pub pickups: Vec<PickupPlacement>,
}

impl LevelContext {
    /// Builds a complete level.
    ///
    /// Each attempt carves a new grid with `config.strategy` and runs the
    /// placement pipeline on it. Attempts that fail with
    /// [`DivisionError::GenerationFailed`] or [`DivisionError::PlacementExhausted`]
    /// are retried up to `config.level_attempts` times; the final attempt always
    /// uses [`MapStrategy::RandomWalk`].
    ///
    /// # Examples
    ///
    /// ```
    /// use hard_division::{GenerationConfig, LevelContext};
    ///
    /// let config = GenerationConfig::for_testing(7);
    /// let mut rng = config.create_rng();
    /// let level = LevelContext::generate(&config, 1, 4, &mut rng).unwrap();
    ///
    /// assert_eq!(level.enemies.len(), 1);
    /// assert_eq!(level.enemies[0].health, 5);
    /// assert_ne!(level.player, level.stairs);
    /// ```
    pub fn generate(
        config: &GenerationConfig,
        level: u32,
        health_bonus: u32,
        rng: &mut StdRng,
    ) -> DivisionResult<Self> {
        let attempts = config.level_attempts.max(1);
        let mut last_error = None;

        for attempt in 1..=attempts {
            let strategy = if attempt == attempts && attempts > 1 {
                MapStrategy::RandomWalk
            } else {
                config.strategy
            };

            let generator = DungeonGenerator::new(strategy);
            let built = generator.generate(config, rng).and_then(|grid| {
                Self::from_grid(grid, strategy, level, health_bonus, config, rng)
            });

            match built {
                Ok(context) => {
                    info!(
                        "Level {} ready after {} attempt(s): {} on a {}x{} grid",
                        level,
                        attempt,
                        strategy.name(),
                        context.grid.width(),
                        context.grid.height()
                    );
                    return Ok(context);
                }
                Err(
                    err @ (DivisionError::GenerationFailed(_)
                    | DivisionError::PlacementExhausted(_)),
                ) => {
                    warn!("Level attempt {}/{} failed: {}", attempt, attempts, err);
                    last_error = Some(err);
                }
                Err(err) => return Err(err),
            }
        }

        error!("Could not generate level {} in {} attempts", level, attempts);
        Err(last_error.unwrap_or_else(|| {
            DivisionError::GenerationFailed(format!("level {} could not be generated", level))
        }))
    }

    /// Runs the placement pipeline on an already carved grid.
    ///
    /// Order: player spawn, stairs, key, enemies, pickups. Fails with
    /// [`DivisionError::PlacementExhausted`] when the stairs or the key end up
    /// out of the player's reach, so [`LevelContext::generate`] tries a fresh grid.
    pub fn from_grid(
        mut grid: Grid,
        strategy: MapStrategy,
        level: u32,
        health_bonus: u32,
        config: &GenerationConfig,
        rng: &mut StdRng,
    ) -> DivisionResult<Self> {
        let player = spawn_player(&grid, config, rng)?;
        let stairs = place_stairs(&mut grid, player, config)?;
        let key = place_key(&grid, player, stairs, &mut [], config, rng)?;

        let open = HashSet::new();
        for (name, target) in [("stairs", stairs), ("key", key)] {
            if !is_reachable(&grid, player, target, &open) {
                warn!("The {} at {} cannot be reached from {}", name, target, player);
                return Err(DivisionError::PlacementExhausted(format!(
                    "{} unreachable from the player",
                    name
                )));
            }
        }

        let enemies = spawn_enemies(&grid, player, stairs, Some(key), level, health_bonus, config, rng);
        let pickups = spawn_pickups(&grid, player, stairs, Some(key), &enemies, level, config, rng);

        debug!(
            "Placed player {} stairs {} key {} with {} enemies and {} pickups",
            player,
            stairs,
            key,
            enemies.len(),
            pickups.len()
        );

        Ok(Self {
            level,
            strategy,
            grid,
            player,
            stairs,
            key,
            key_collected: false,
            enemies,
            pickups,
        })
    }

    /// Marks the key collected if the player stands on it.
    pub fn collect_key(&mut self) -> bool {
        if !self.key_collected && self.player == self.key {
            self.key_collected = true;
            debug!("Key collected at {}", self.key);
        }
        self.key_collected
    }

    /// Key position while it is still on the map.
    pub fn active_key(&self) -> Option<Position> {
        (!self.key_collected).then_some(self.key)
    }

    /// Positions of the player, stairs, key (if still on the map) and enemies.
    pub fn occupied_positions(&self) -> Vec<Position> {
        let mut occupied = vec![self.player, self.stairs];
        occupied.extend(self.active_key());
        occupied.extend(self.enemies.iter().map(|e| e.position));
        occupied
    }

    /// Checks that the stairs can be reached with enemies standing in the way.
    pub fn stairs_reachable(&self) -> bool {
        let blocked: HashSet<Position> = self.enemies.iter().map(|e| e.position).collect();
        is_reachable(&self.grid, self.player, self.stairs, &blocked)
    }

    /// Walkable tiles the player cannot reach with no obstacles in the way.
    pub fn unreachable_tiles(&self) -> usize {
        let no_obstacles: &[Position] = &[];
        count_total_walkable(&self.grid) - count_reachable_tiles(&self.grid, self.player, no_obstacles)
    }

    pub fn total_enemy_health(&self) -> u32 {
        self.enemies.iter().map(|e| e.health).sum()
    }

    pub fn total_pickup_value(&self) -> u32 {
        self.pickups.iter().map(|p| p.value).sum()
    }

    pub fn to_json(&self) -> DivisionResult<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    pub fn from_json(json: &str) -> DivisionResult<Self> {
        Ok(serde_json::from_str(json)?)
    }

    /// Character drawn for a cell, entities over terrain.
    pub fn glyph_at(&self, pos: Position) -> char {
        if pos == self.player {
            '@'
        } else if self.enemies.iter().any(|e| e.position == pos) {
            'e'
        } else if self.active_key() == Some(pos) {
            'k'
        } else if self.pickups.iter().any(|p| p.position == pos) {
            '*'
        } else {
            self.grid.cell(pos).map_or(' ', |cell| cell.glyph())
        }
    }
}

impl fmt::Display for LevelContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for y in 0..self.grid.height() as i32 {
            let row: String = (0..self.grid.width() as i32)
                .map(|x| self.glyph_at(Position::new(x, y)))
                .collect();
            writeln!(f, "{}", row)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::CellType;
    use rand::SeedableRng;

    #[test]
    fn test_generate_places_everything_apart() {
        for seed in 0..10 {
            let config = GenerationConfig::for_testing(seed);
            let mut rng = config.create_rng();
            let level = LevelContext::generate(&config, 3, 2, &mut rng).unwrap();

            let mut occupied = HashSet::new();
            for pos in level.occupied_positions() {
                assert!(occupied.insert(pos), "{} doubly occupied", pos);
            }
            assert_eq!(level.grid.get(level.stairs).unwrap(), CellType::Stairs);
            assert!(level.grid.is_floor(level.player));
            assert!(level.grid.is_floor(level.key));
            assert_eq!(level.total_enemy_health(), 5);
            assert_eq!(level.total_pickup_value(), 3);
        }
    }

    #[test]
    fn test_generate_is_deterministic_per_seed() {
        let config = GenerationConfig::for_testing(99).with_strategy(MapStrategy::Spiral);
        let a = LevelContext::generate(&config, 2, 1, &mut config.create_rng()).unwrap();
        let b = LevelContext::generate(&config, 2, 1, &mut config.create_rng()).unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn test_random_walk_level_is_fully_reachable() {
        let config = GenerationConfig::new(5);
        let level = LevelContext::generate(&config, 1, 0, &mut config.create_rng()).unwrap();
        assert_eq!(level.unreachable_tiles(), 0);

        let mut cleared = level.clone();
        cleared.enemies.clear();
        assert!(cleared.stairs_reachable());
    }

    #[test]
    fn test_enemy_in_corridor_blocks_stairs() {
        let grid = Grid::from_rows(&["#######", "#....>#", "#######"]);
        let mut level = LevelContext {
            level: 1,
            strategy: MapStrategy::RandomWalk,
            grid,
            player: Position::new(1, 1),
            stairs: Position::new(5, 1),
            key: Position::new(2, 1),
            key_collected: false,
            enemies: Vec::new(),
            pickups: Vec::new(),
        };
        assert!(level.stairs_reachable());

        level.enemies.push(EnemyPlacement::new(Position::new(3, 1), 1, crate::EnemyRole::Guard));
        assert!(!level.stairs_reachable());
        assert_eq!(level.unreachable_tiles(), 0);
    }

    #[test]
    fn test_impossible_grid_exhausts_attempts() {
        let config = GenerationConfig::new(1).with_size(1, 1);
        let result = LevelContext::generate(&config, 1, 0, &mut config.create_rng());
        assert!(matches!(result, Err(DivisionError::GenerationFailed(_))));
    }

    #[test]
    fn test_from_grid_rejects_single_tile_map() {
        let grid = Grid::from_rows(&["###", "#.#", "###"]);
        let config = GenerationConfig::default();
        let mut rng = StdRng::seed_from_u64(0);
        let result = LevelContext::from_grid(grid, MapStrategy::RandomWalk, 1, 0, &config, &mut rng);
        assert!(matches!(result, Err(DivisionError::PlacementExhausted(_))));
    }

    #[test]
    fn test_from_grid_rejects_sealed_stairs_and_key() {
        let config = GenerationConfig::default();
        let mut rng = StdRng::seed_from_u64(0);

        let pockets = Grid::from_rows(&["#######", "#.#.#.#", "#######"]);
        let result = LevelContext::from_grid(pockets, MapStrategy::Spiral, 1, 0, &config, &mut rng);
        assert!(matches!(result, Err(DivisionError::PlacementExhausted(msg)) if msg.contains("stairs")));

        // The only free tile outside the player's pair is sealed off
        let split = Grid::from_rows(&["######", "#..#.#", "######"]);
        let result = LevelContext::from_grid(split, MapStrategy::Spiral, 1, 0, &config, &mut rng);
        assert!(matches!(result, Err(DivisionError::PlacementExhausted(msg)) if msg.contains("key")));
    }

    #[test]
    fn test_every_strategy_keeps_stairs_and_key_reachable() {
        let open = HashSet::new();
        for strategy in MapStrategy::ALL {
            for seed in 0..25 {
                let config = GenerationConfig::new(seed).with_strategy(strategy);
                let level = LevelContext::generate(&config, 3, 0, &mut config.create_rng()).unwrap();
                assert!(
                    is_reachable(&level.grid, level.player, level.stairs, &open),
                    "{} seed {}: stairs sealed off",
                    strategy.name(),
                    seed
                );
                assert!(is_reachable(&level.grid, level.player, level.key, &open));
            }
        }
    }

    #[test]
    fn test_collect_key_only_on_key_tile() {
        let config = GenerationConfig::for_testing(4);
        let mut level = LevelContext::generate(&config, 1, 0, &mut config.create_rng()).unwrap();
        assert!(!level.collect_key());

        level.player = level.key;
        assert!(level.collect_key());
        assert_eq!(level.active_key(), None);
        assert_eq!(level.occupied_positions().len(), 2 + level.enemies.len());
    }

    #[test]
    fn test_display_draws_entities() {
        let config = GenerationConfig::for_testing(12);
        let level = LevelContext::generate(&config, 2, 0, &mut config.create_rng()).unwrap();
        let text = level.to_string();

        assert_eq!(text.lines().count(), level.grid.height() as usize);
        assert_eq!(text.matches('@').count(), 1);
        assert_eq!(text.matches('>').count(), 1);
        assert_eq!(text.matches('k').count(), 1);
        assert_eq!(text.matches('e').count(), level.enemies.len());
    }

    #[test]
    fn test_json_round_trip() {
        let config = GenerationConfig::for_testing(21);
        let level = LevelContext::generate(&config, 2, 3, &mut config.create_rng()).unwrap();
        let json = level.to_json().unwrap();
        assert_eq!(LevelContext::from_json(&json).unwrap(), level);
    }
}

//! # Encounters
//!
//! Enemy placement and health budget distribution.

use crate::{
    find_empty_floor_tile, is_connectivity_safe, random_u32, GenerationConfig, Grid, HasPosition,
    Position,
};
use log::{debug, warn};
use rand::Rng;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;

/// Behaviour an enemy is spawned with.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum EnemyRole {
    /// Chases the player directly
    Hunter,
    /// Holds its ground near the key or stairs
    Guard,
    /// Follows the player's trail
    Tracker,
}

impl EnemyRole {
    /// Rolls a role: hunter 40%, guard 30%, tracker 30%.
    pub fn roll<R: Rng + ?Sized>(rng: &mut R) -> Self {
        let roll: f64 = rng.gen();
        if roll < 0.4 {
            EnemyRole::Hunter
        } else if roll < 0.7 {
            EnemyRole::Guard
        } else {
            EnemyRole::Tracker
        }
    }

    pub fn glyph(self) -> char {
        match self {
            EnemyRole::Hunter => 'h',
            EnemyRole::Guard => 'g',
            EnemyRole::Tracker => 't',
        }
    }
}

/// Where an enemy starts and how much health it was given.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EnemyPlacement {
    pub position: Position,
    pub health: u32,
    pub role: EnemyRole,
}

impl EnemyPlacement {
    pub fn new(position: Position, health: u32, role: EnemyRole) -> Self {
        Self {
            position,
            health,
            role,
        }
    }
}

impl HasPosition for EnemyPlacement {
    fn position(&self) -> Position {
        self.position
    }
}

/// Number of enemies for a level.
///
/// Exactly one on level 1; otherwise a random count in
/// `1..=min(health_budget, max_enemies)`.
pub fn enemy_count<R: Rng + ?Sized>(
    level: u32,
    health_budget: u32,
    config: &GenerationConfig,
    rng: &mut R,
) -> u32 {
    if level <= 1 {
        return 1;
    }
    let most = health_budget.min(config.max_enemies).max(1);
    random_u32(rng, 1, most)
}

/// Splits `total` across `count` shares so the shares sum to `total` exactly.
///
/// Every share but the last is a random value in `1..=max(1, remaining / shares_left)`;
/// the last share takes whatever remains.
///
/// # Examples
///
/// ```
/// use hard_division::distribute_budget;
/// use rand::{rngs::StdRng, SeedableRng};
///
/// let mut rng = StdRng::seed_from_u64(3);
/// let shares = distribute_budget(17, 4, &mut rng);
/// assert_eq!(shares.len(), 4);
/// assert_eq!(shares.iter().sum::<u32>(), 17);
/// ```
pub fn distribute_budget<R: Rng + ?Sized>(total: u32, count: usize, rng: &mut R) -> Vec<u32> {
    let mut remaining = total;
    let mut shares = Vec::with_capacity(count);

    for i in 0..count {
        let share = if i + 1 == count {
            remaining
        } else {
            let cap = (remaining / (count - i) as u32).max(1);
            random_u32(rng, 1, cap).min(remaining)
        };
        shares.push(share);
        remaining -= share;
    }

    shares
}

/// Spawns the level's enemies and hands out `level + health_bonus` health between them.
///
/// Each enemy goes on a cell from [`find_empty_floor_tile`] that avoids the
/// player, the stairs, the key and earlier enemies. Outside of tiny maps a
/// position that cuts walkable tiles off from the player is swapped for one
/// alternative if that alternative is safe; otherwise it is kept, since a level
/// with a chokepoint beats a level without its enemy.
///
/// Placement stops early, with a warning, when no free cell is left. The health
/// budget is conserved across whichever enemies were placed.
#[allow(clippy::too_many_arguments)]
pub fn spawn_enemies<R: Rng + ?Sized>(
    grid: &Grid,
    player: Position,
    stairs: Position,
    key: Option<Position>,
    level: u32,
    health_bonus: u32,
    config: &GenerationConfig,
    rng: &mut R,
) -> Vec<EnemyPlacement> {
    let health_budget = level + health_bonus;
    let count = enemy_count(level, health_budget, config, rng);
    let small_map = grid.width() <= config.small_map_size && grid.height() <= config.small_map_size;

    let mut positions: Vec<Position> = Vec::new();
    let mut roles: Vec<EnemyRole> = Vec::new();

    for i in 0..count {
        let mut exclude = vec![player, stairs];
        exclude.extend(key);
        exclude.extend(positions.iter().copied());

        let Some(mut pos) = find_empty_floor_tile(grid, Some(player), &exclude, config, rng) else {
            warn!("No empty tile for enemy {} of {}", i + 1, count);
            break;
        };

        if !small_map && !keeps_player_connected(grid, player, &positions, pos, config) {
            exclude.push(pos);
            let alternative = find_empty_floor_tile(grid, Some(player), &exclude, config, rng)
                .filter(|&alt| keeps_player_connected(grid, player, &positions, alt, config));
            match alternative {
                Some(alt) => {
                    debug!("Enemy at {} would form a chokepoint, moved to {}", pos, alt);
                    pos = alt;
                }
                None => warn!("Enemy at {} forms a chokepoint, placing it anyway", pos),
            }
        }

        positions.push(pos);
        roles.push(EnemyRole::roll(rng));
    }

    let shares = distribute_budget(health_budget, positions.len(), rng);
    let enemies: Vec<EnemyPlacement> = positions
        .into_iter()
        .zip(roles)
        .zip(shares)
        .map(|((position, role), health)| EnemyPlacement::new(position, health, role))
        .collect();

    debug!(
        "Spawned {} enemies with health {:?}",
        enemies.len(),
        enemies.iter().map(|e| e.health).collect::<Vec<_>>()
    );
    enemies
}

/// Checks that an enemy at `candidate` leaves the player within `unreachable_slack`
/// of every walkable tile, not counting cells of enemies already placed.
fn keeps_player_connected(
    grid: &Grid,
    player: Position,
    placed: &[Position],
    candidate: Position,
    config: &GenerationConfig,
) -> bool {
    let blocked: HashSet<Position> = placed
        .iter()
        .copied()
        .chain(std::iter::once(candidate))
        .collect();
    is_connectivity_safe(grid, player, &blocked, config.unreachable_slack + placed.len())
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::{rngs::StdRng, SeedableRng};

    fn open_room(width: u32, height: u32) -> Grid {
        let mut grid = Grid::new(width, height);
        for y in 1..height as i32 - 1 {
            for x in 1..width as i32 - 1 {
                grid.carve(Position::new(x, y));
            }
        }
        grid
    }

    #[test]
    fn test_level_one_spawns_single_enemy_with_whole_budget() {
        let grid = open_room(12, 10);
        let config = GenerationConfig::default();
        for seed in 0..25 {
            let mut rng = StdRng::seed_from_u64(seed);
            let enemies = spawn_enemies(
                &grid,
                Position::new(1, 1),
                Position::new(10, 8),
                Some(Position::new(5, 5)),
                1,
                9,
                &config,
                &mut rng,
            );
            assert_eq!(enemies.len(), 1);
            assert_eq!(enemies[0].health, 10);
        }
    }

    #[test]
    fn test_enemy_health_sums_to_budget() {
        let grid = open_room(20, 15);
        let config = GenerationConfig::default();
        for seed in 0..25 {
            let mut rng = StdRng::seed_from_u64(seed);
            let enemies = spawn_enemies(
                &grid,
                Position::new(1, 1),
                Position::new(18, 13),
                None,
                6,
                4,
                &config,
                &mut rng,
            );
            assert!(!enemies.is_empty() && enemies.len() <= 7);
            assert_eq!(enemies.iter().map(|e| e.health).sum::<u32>(), 10);
            assert!(enemies.iter().all(|e| e.health >= 1));
        }
    }

    #[test]
    fn test_enemies_avoid_occupied_cells() {
        let grid = open_room(10, 10);
        let config = GenerationConfig::default();
        let player = Position::new(1, 1);
        let stairs = Position::new(8, 8);
        let key = Position::new(4, 4);
        let mut rng = StdRng::seed_from_u64(5);

        let enemies = spawn_enemies(&grid, player, stairs, Some(key), 9, 0, &config, &mut rng);
        let mut seen = HashSet::from([player, stairs, key]);
        for enemy in &enemies {
            assert!(seen.insert(enemy.position), "{} doubly occupied", enemy.position);
            assert!(grid.is_floor(enemy.position));
        }
    }

    #[test]
    fn test_enemies_stop_when_map_is_full() {
        let grid = Grid::from_rows(&["#####", "#...#", "#####"]);
        let config = GenerationConfig::default();
        let mut rng = StdRng::seed_from_u64(1);
        // Only (2, 1) is free once player and stairs are excluded
        let enemies = spawn_enemies(
            &grid,
            Position::new(1, 1),
            Position::new(3, 1),
            None,
            7,
            0,
            &config,
            &mut rng,
        );
        assert!(enemies.len() <= 1);
        if let Some(enemy) = enemies.first() {
            assert_eq!(enemy.position, Position::new(2, 1));
            assert_eq!(enemy.health, 7);
        }
    }

    #[test]
    fn test_enemy_avoids_chokepoint_when_alternative_exists() {
        // (3, 3) is the most open tile but it is the only way into the spur below
        let grid = Grid::from_rows(&[
            "########",
            "#......#",
            "#.####.#",
            "#......#",
            "###.####",
            "###.####",
            "########",
        ]);
        let config = GenerationConfig::default();
        let player = Position::new(1, 1);
        let stairs = Position::new(6, 3);

        let first_choice =
            find_empty_floor_tile(&grid, Some(player), &[player, stairs], &config, &mut StdRng::seed_from_u64(0));
        assert_eq!(first_choice, Some(Position::new(3, 3)));

        let mut rng = StdRng::seed_from_u64(0);
        let enemies = spawn_enemies(&grid, player, stairs, None, 1, 0, &config, &mut rng);
        assert_eq!(enemies[0].position, Position::new(2, 1));
    }

    #[test]
    fn test_first_enemy_may_not_seal_a_single_tile() {
        // (2, 2) is the first fully open tile but it walls off (1, 2)
        let grid = Grid::from_rows(&["######", "##...#", "#....#", "##...#", "######"]);
        let config = GenerationConfig::default();
        let player = Position::new(4, 1);
        let stairs = Position::new(4, 3);

        assert!(!keeps_player_connected(&grid, player, &[], Position::new(2, 2), &config));
        assert!(keeps_player_connected(&grid, player, &[], Position::new(3, 2), &config));

        let mut rng = StdRng::seed_from_u64(0);
        let enemies = spawn_enemies(&grid, player, stairs, None, 1, 0, &config, &mut rng);
        assert_eq!(enemies.len(), 1);
        assert_eq!(enemies[0].position, Position::new(3, 2));
    }

    #[test]
    fn test_distribute_budget_edges() {
        let mut rng = StdRng::seed_from_u64(8);
        assert!(distribute_budget(5, 0, &mut rng).is_empty());
        assert_eq!(distribute_budget(5, 1, &mut rng), vec![5]);
        assert_eq!(distribute_budget(3, 3, &mut rng), vec![1, 1, 1]);
        for count in 1..=7 {
            let shares = distribute_budget(20, count, &mut rng);
            assert_eq!(shares.iter().sum::<u32>(), 20);
        }
    }

    #[test]
    fn test_enemy_count_bounds() {
        let config = GenerationConfig::default();
        let mut rng = StdRng::seed_from_u64(2);
        assert_eq!(enemy_count(1, 50, &config, &mut rng), 1);
        for _ in 0..50 {
            let count = enemy_count(5, 30, &config, &mut rng);
            assert!((1..=7).contains(&count));
            assert_eq!(enemy_count(3, 1, &config, &mut rng), 1);
        }
    }

    #[test]
    fn test_role_roll_covers_all_roles() {
        let mut rng = StdRng::seed_from_u64(4);
        let roles: HashSet<EnemyRole> = (0..200).map(|_| EnemyRole::roll(&mut rng)).collect();
        assert_eq!(roles.len(), 3);
    }
}

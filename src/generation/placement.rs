//! # Entity Placement
//!
//! Finds cells for the player, the stairs and the key.
//!
//! Every search here is bounded and ends in an unconditional fallback, so a
//! playable level comes out of almost any carved grid. Only when even the
//! fallback has nothing to offer does a function report
//! [`DivisionError::PlacementExhausted`], and by then every tentative write has
//! been rolled back.

use crate::{
    find_path_avoiding, flood_fill, is_connectivity_safe, largest_region, positions_of,
    random_int, CellType, DivisionError, DivisionResult, EnemyPlacement, GenerationConfig, Grid,
    HasPosition, Position,
};
use log::{debug, error, warn};
use rand::Rng;
use std::collections::HashSet;

/// Stages of a placement search, tried in order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PlacementStage {
    /// Best-ranked candidates that pass every check
    Preferred,
    /// Unconditional scan for any usable cell
    Fallback,
    /// Nothing left to try
    Exhausted,
}

impl PlacementStage {
    pub fn next(self) -> PlacementStage {
        match self {
            PlacementStage::Preferred => PlacementStage::Fallback,
            PlacementStage::Fallback | PlacementStage::Exhausted => PlacementStage::Exhausted,
        }
    }
}

/// Finds a floor cell that is free of every excluded entity.
///
/// With a player, free floor cells are ranked by ascending wall-neighbour count
/// (open areas before nooks) and the best `reachability_candidates` of them are
/// tested with A* from the player, routing around the excluded cells. The first
/// reachable one wins. If none is reachable, the most open candidate is returned
/// anyway and a warning is logged.
///
/// Without a player (bootstrap) the search is plain random sampling bounded by
/// `bootstrap_attempts`.
///
/// The player cell is never returned. Returns None when no candidate exists.
///
/// # Examples
///
/// ```
/// use hard_division::{find_empty_floor_tile, GenerationConfig, Grid, Position};
///
/// let grid = Grid::from_rows(&["#####", "#...#", "#...#", "#...#", "#####"]);
/// let config = GenerationConfig::default();
/// let mut rng = config.create_rng();
/// let player = Position::new(1, 1);
///
/// let tile = find_empty_floor_tile(&grid, Some(player), &[] as &[Position], &config, &mut rng);
/// // The room's center is the only cell without wall neighbours
/// assert_eq!(tile, Some(Position::new(2, 2)));
/// ```
pub fn find_empty_floor_tile<P, R>(
    grid: &Grid,
    player: Option<Position>,
    exclude: &[P],
    config: &GenerationConfig,
    rng: &mut R,
) -> Option<Position>
where
    P: HasPosition,
    R: Rng + ?Sized,
{
    let mut blocked: HashSet<Position> = positions_of(exclude).into_iter().collect();

    let Some(player) = player else {
        return sample_free_floor(grid, config.bootstrap_attempts, rng, |pos| {
            !blocked.contains(&pos)
        });
    };
    blocked.remove(&player);

    let mut candidates: Vec<Position> = grid
        .floor_positions()
        .filter(|pos| *pos != player && !blocked.contains(pos))
        .collect();
    candidates.sort_by_key(|&pos| grid.wall_neighbor_count(pos));

    let reachable = candidates
        .iter()
        .take(config.reachability_candidates)
        .find(|&&pos| find_path_avoiding(player, pos, grid, &blocked).is_some());

    match (reachable, candidates.first()) {
        (Some(&pos), _) => Some(pos),
        (None, Some(&pos)) => {
            warn!(
                "No reachable empty tile among {} candidates, using {} anyway",
                candidates.len().min(config.reachability_candidates),
                pos
            );
            Some(pos)
        }
        (None, None) => None,
    }
}

fn sample_free_floor<R, F>(grid: &Grid, attempts: u32, rng: &mut R, accept: F) -> Option<Position>
where
    R: Rng + ?Sized,
    F: Fn(Position) -> bool,
{
    for _ in 0..attempts {
        let pos = Position::new(
            random_int(rng, 0, grid.width() as i32 - 1),
            random_int(rng, 0, grid.height() as i32 - 1),
        );
        if grid.is_floor(pos) && accept(pos) {
            return Some(pos);
        }
    }
    None
}

fn mask_contains(grid: &Grid, mask: &[bool], pos: Position) -> bool {
    grid.in_bounds(pos) && mask[pos.y as usize * grid.width() as usize + pos.x as usize]
}

/// Picks the player's spawn cell on a freshly carved grid.
///
/// Only cells of the largest walkable region qualify, so a sealed pocket never
/// becomes the spawn. Random sampling first, then the first such floor cell in
/// row-major order.
pub fn spawn_player<R: Rng + ?Sized>(
    grid: &Grid,
    config: &GenerationConfig,
    rng: &mut R,
) -> DivisionResult<Position> {
    let region = largest_region(grid);
    let in_region = |pos: Position| mask_contains(grid, &region, pos);

    if let Some(pos) = sample_free_floor(grid, config.bootstrap_attempts, rng, in_region) {
        return Ok(pos);
    }

    match grid.floor_positions().find(|&pos| in_region(pos)) {
        Some(pos) => {
            warn!("Random spawn sampling failed, using first floor tile {}", pos);
            Ok(pos)
        }
        None => {
            error!("Grid has no floor tile for the player");
            Err(DivisionError::PlacementExhausted(
                "no floor tile for the player".to_string(),
            ))
        }
    }
}

/// Places the stairs and writes them into the grid.
///
/// Preferred cells lie in the bottom-right quadrant, have at least
/// `stairs_min_open_neighbors` open neighbours and keep the map
/// connectivity-safe from the player. The most open of them are retried before
/// an unconditional bottom-right to top-left scan for any floor cell that is
/// not the player.
///
/// On failure the grid is left exactly as it was.
pub fn place_stairs(
    grid: &mut Grid,
    player: Position,
    config: &GenerationConfig,
) -> DivisionResult<Position> {
    let mut stage = PlacementStage::Preferred;

    loop {
        let placed = match stage {
            PlacementStage::Preferred => try_best_stairs(grid, player, config)?,
            PlacementStage::Fallback => {
                let fallback = stairs_fallback_scan(grid, player);
                if let Some(pos) = fallback {
                    warn!("No connectivity-safe stairs candidate, fallback scan chose {}", pos);
                    grid.set(pos, CellType::Stairs)?;
                }
                fallback
            }
            PlacementStage::Exhausted => {
                error!("No floor tile left for the stairs");
                return Err(DivisionError::PlacementExhausted(
                    "no viable stairs position".to_string(),
                ));
            }
        };

        if let Some(pos) = placed {
            debug!("Stairs placed at {} ({:?})", pos, stage);
            return Ok(pos);
        }
        stage = stage.next();
    }
}

/// Lists connectivity-safe stairs candidates in the preferred quadrant, most open first.
///
/// Every candidate is tentatively written as stairs and checked; the grid is
/// restored before this returns.
pub fn stairs_best_candidates(
    grid: &mut Grid,
    player: Position,
    config: &GenerationConfig,
) -> DivisionResult<Vec<Position>> {
    let min_x = (grid.width() as f64 * config.stairs_quadrant).floor() as i32;
    let min_y = (grid.height() as f64 * config.stairs_quadrant).floor() as i32;
    let no_obstacles = HashSet::new();

    let quadrant: Vec<(Position, usize)> = grid
        .floor_positions()
        .filter(|pos| pos.x >= min_x && pos.y >= min_y && *pos != player)
        .map(|pos| (pos, grid.floor_neighbor_count(pos)))
        .filter(|&(_, open)| open >= config.stairs_min_open_neighbors)
        .collect();

    let mut valid = Vec::new();
    for (pos, open) in quadrant {
        grid.set(pos, CellType::Stairs)?;
        let safe = is_connectivity_safe(grid, player, &no_obstacles, config.unreachable_slack);
        grid.set(pos, CellType::Floor)?;
        if safe {
            valid.push((pos, open));
        }
    }

    valid.sort_by(|a, b| b.1.cmp(&a.1));
    Ok(valid.into_iter().map(|(pos, _)| pos).collect())
}

fn try_best_stairs(
    grid: &mut Grid,
    player: Position,
    config: &GenerationConfig,
) -> DivisionResult<Option<Position>> {
    let no_obstacles = HashSet::new();
    let candidates = stairs_best_candidates(grid, player, config)?;

    for pos in candidates.into_iter().take(config.stairs_best_candidates) {
        grid.set(pos, CellType::Stairs)?;
        if is_connectivity_safe(grid, player, &no_obstacles, config.unreachable_slack) {
            return Ok(Some(pos));
        }
        grid.set(pos, CellType::Floor)?;
    }
    Ok(None)
}

/// Scans from the bottom-right corner for a floor cell that is not the player.
///
/// Cells the player can walk to win over sealed ones.
pub fn stairs_fallback_scan(grid: &Grid, player: Position) -> Option<Position> {
    let reach = flood_fill(grid, player, &HashSet::new());
    let scan = || {
        (0..grid.height() as i32)
            .rev()
            .flat_map(|y| (0..grid.width() as i32).rev().map(move |x| Position::new(x, y)))
            .filter(|&pos| pos != player && grid.is_floor(pos))
    };

    scan()
        .find(|&pos| mask_contains(grid, &reach, pos))
        .or_else(|| scan().next())
}

/// Places the key on a floor cell away from the player, the stairs and the enemies.
///
/// Uniform rejection sampling over cells the player can walk to, up to
/// `key_attempts` times, then a forced placement on the first floor cell that is
/// not the player (reachable cells first). Any enemy standing on the chosen cell
/// is moved elsewhere with [`find_empty_floor_tile`].
pub fn place_key<R: Rng + ?Sized>(
    grid: &Grid,
    player: Position,
    stairs: Position,
    enemies: &mut [EnemyPlacement],
    config: &GenerationConfig,
    rng: &mut R,
) -> DivisionResult<Position> {
    let mut blocked: HashSet<Position> = positions_of(enemies.iter()).into_iter().collect();
    blocked.insert(player);
    blocked.insert(stairs);

    let reach = flood_fill(grid, player, &HashSet::new());
    let reachable = |pos: Position| mask_contains(grid, &reach, pos);

    let sampled = sample_free_floor(grid, config.key_attempts, rng, |pos| {
        !blocked.contains(&pos) && reachable(pos)
    });
    let forced = || {
        grid.floor_positions()
            .find(|&pos| pos != player && reachable(pos))
            .or_else(|| grid.floor_positions().find(|&pos| pos != player))
    };

    let key = match sampled {
        Some(pos) => pos,
        None => match forced() {
            Some(pos) => {
                warn!("Key sampling failed after {} attempts, forcing {}", config.key_attempts, pos);
                pos
            }
            None => {
                error!("No floor tile left for the key");
                return Err(DivisionError::PlacementExhausted(
                    "no viable key position".to_string(),
                ));
            }
        },
    };

    relocate_enemies_off(grid, player, stairs, key, enemies, config, rng);
    debug!("Key placed at {}", key);
    Ok(key)
}

fn relocate_enemies_off<R: Rng + ?Sized>(
    grid: &Grid,
    player: Position,
    stairs: Position,
    key: Position,
    enemies: &mut [EnemyPlacement],
    config: &GenerationConfig,
    rng: &mut R,
) {
    for i in 0..enemies.len() {
        if enemies[i].position != key {
            continue;
        }

        let mut exclude = vec![player, stairs, key];
        exclude.extend(
            enemies
                .iter()
                .enumerate()
                .filter(|&(j, _)| j != i)
                .map(|(_, enemy)| enemy.position),
        );

        match find_empty_floor_tile(grid, Some(player), &exclude, config, rng) {
            Some(pos) => {
                debug!("Enemy moved off the key from {} to {}", key, pos);
                enemies[i].position = pos;
            }
            None => warn!("Enemy at {} shares the key tile, nowhere to move it", key),
        }
    }
}

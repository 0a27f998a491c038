//! # Connectivity
//!
//! Flood-fill reachability counts used to prove that a placement leaves the
//! level walkable from the player.

use crate::{positions_of, Grid, HasPosition, Position};
use std::collections::HashSet;

/// Marks every walkable cell 4-connected to `start`, skipping blocked cells.
///
/// Iterative (explicit stack) so large grids cannot overflow the call stack.
/// The returned buffer is row-major and sized `width * height`.
pub fn flood_fill(grid: &Grid, start: Position, blocked: &HashSet<Position>) -> Vec<bool> {
    let width = grid.width() as usize;
    let mut visited = vec![false; width * grid.height() as usize];
    let mut stack = vec![start];

    while let Some(pos) = stack.pop() {
        if !grid.is_walkable(pos) || blocked.contains(&pos) {
            continue;
        }
        let index = pos.y as usize * width + pos.x as usize;
        if visited[index] {
            continue;
        }
        visited[index] = true;
        stack.extend(pos.cardinal_adjacent_positions());
    }

    visited
}

/// Counts floor and stairs cells reachable from `start`, treating obstacles as walls.
///
/// A start cell that is a wall, outside the grid or itself an obstacle reaches nothing.
pub fn count_reachable_tiles<P: HasPosition>(grid: &Grid, start: Position, obstacles: &[P]) -> usize {
    let blocked: HashSet<Position> = positions_of(obstacles).into_iter().collect();
    count_reachable_avoiding(grid, start, &blocked)
}

/// Same as [`count_reachable_tiles`] with a prebuilt obstacle set.
pub fn count_reachable_avoiding(grid: &Grid, start: Position, blocked: &HashSet<Position>) -> usize {
    flood_fill(grid, start, blocked).iter().filter(|&&v| v).count()
}

/// Counts every floor and stairs cell regardless of reachability.
pub fn count_total_walkable(grid: &Grid) -> usize {
    grid.rows().flatten().filter(|c| c.is_walkable()).count()
}

/// Checks that at most `slack` walkable cells are cut off from `start`.
///
/// This is the acceptance test for tentative grid mutations and enemy placements.
pub fn is_connectivity_safe(
    grid: &Grid,
    start: Position,
    blocked: &HashSet<Position>,
    slack: usize,
) -> bool {
    count_reachable_avoiding(grid, start, blocked) + slack >= count_total_walkable(grid)
}

/// Marks the largest 4-connected walkable region.
///
/// Ties go to the region found first in row-major order. An all-wall grid
/// yields an all-false mask.
pub fn largest_region(grid: &Grid) -> Vec<bool> {
    let no_obstacles = HashSet::new();
    let mut seen = vec![false; grid.width() as usize * grid.height() as usize];
    let mut best: Option<(usize, Vec<bool>)> = None;

    for (index, pos) in grid.positions().enumerate() {
        if seen[index] || !grid.is_walkable(pos) {
            continue;
        }
        let region = flood_fill(grid, pos, &no_obstacles);
        let size = region.iter().filter(|&&v| v).count();
        for (mark, &inside) in seen.iter_mut().zip(&region) {
            *mark |= inside;
        }
        if best.as_ref().map_or(true, |(best_size, _)| size > *best_size) {
            best = Some((size, region));
        }
    }

    best.map(|(_, region)| region).unwrap_or(seen)
}

/// Checks whether `target` can be reached from `start` around the blocked cells.
pub fn is_reachable(
    grid: &Grid,
    start: Position,
    target: Position,
    blocked: &HashSet<Position>,
) -> bool {
    if !grid.in_bounds(target) {
        return false;
    }
    let index = target.y as usize * grid.width() as usize + target.x as usize;
    flood_fill(grid, start, blocked)[index]
}

//! # Pathfinding
//!
//! A* shortest paths over the 4-connected grid with an avoid-set.

use crate::{positions_of, Grid, HasPosition, Position};
use pathfinding::prelude::astar;
use std::collections::HashSet;

/// Ordered positions from start to goal, both inclusive.
pub type Path = Vec<Position>;

/// Finds a shortest cardinal path from `start` to `goal`.
///
/// Every step costs 1 and the heuristic is Manhattan distance, so returned paths
/// are optimal. Obstacle positions are impassable except the goal itself, which is
/// always enterable. Returns None when the goal cannot be reached.
///
/// # Examples
///
/// ```
/// use hard_division::{find_path, Grid, Position};
///
/// let grid = Grid::from_rows(&["#####", "#...#", "#####"]);
/// let path = find_path(Position::new(1, 1), Position::new(3, 1), &grid, &[] as &[Position]);
/// assert_eq!(path.unwrap().len(), 3);
/// ```
pub fn find_path<P: HasPosition>(
    start: Position,
    goal: Position,
    grid: &Grid,
    obstacles: &[P],
) -> Option<Path> {
    let blocked: HashSet<Position> = positions_of(obstacles).into_iter().collect();
    find_path_avoiding(start, goal, grid, &blocked)
}

/// Same as [`find_path`] with a prebuilt obstacle set.
pub fn find_path_avoiding(
    start: Position,
    goal: Position,
    grid: &Grid,
    blocked: &HashSet<Position>,
) -> Option<Path> {
    if !grid.in_bounds(start) || !grid.is_walkable(goal) {
        return None;
    }

    let successors = |&pos: &Position| {
        pos.cardinal_adjacent_positions()
            .into_iter()
            .filter(|&next| grid.is_walkable(next) && (next == goal || !blocked.contains(&next)))
            .map(|next| (next, 1u32))
            .collect::<Vec<_>>()
    };

    astar(
        &start,
        successors,
        |&pos| pos.manhattan_distance(goal),
        |&pos| pos == goal,
    )
    .map(|(path, _cost)| path)
}

//! Property tests for A* paths and flood-fill counts on random grids.

use hard_division::{
    count_reachable_tiles, count_total_walkable, find_path, CellType, Grid, Position,
};
use proptest::prelude::*;
use std::collections::{HashSet, VecDeque};

const NO_OBSTACLES: &[Position] = &[];

/// Builds a grid from a row-major open/closed mask.
fn grid_from_mask(width: u32, height: u32, open: &[bool]) -> Grid {
    let mut grid = Grid::new(width, height);
    for y in 0..height as i32 {
        for x in 0..width as i32 {
            if open[(y as u32 * width + x as u32) as usize] {
                grid.set(Position::new(x, y), CellType::Floor).unwrap();
            }
        }
    }
    grid
}

fn bfs_distance(grid: &Grid, start: Position, goal: Position) -> Option<usize> {
    if !grid.is_walkable(start) {
        return None;
    }
    let mut seen = HashSet::from([start]);
    let mut queue = VecDeque::from([(start, 0usize)]);
    while let Some((pos, dist)) = queue.pop_front() {
        if pos == goal {
            return Some(dist);
        }
        for next in pos.cardinal_adjacent_positions() {
            if grid.is_walkable(next) && seen.insert(next) {
                queue.push_back((next, dist + 1));
            }
        }
    }
    None
}

fn small_grid() -> impl Strategy<Value = (u32, u32, Vec<bool>)> {
    (2u32..10, 2u32..10).prop_flat_map(|(w, h)| {
        (
            Just(w),
            Just(h),
            prop::collection::vec(prop::bool::weighted(0.65), (w * h) as usize),
        )
    })
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(256))]

    #[test]
    fn paths_match_bfs_distance(
        (width, height, open) in small_grid(),
        sx in 0i32..10, sy in 0i32..10, gx in 0i32..10, gy in 0i32..10,
    ) {
        let grid = grid_from_mask(width, height, &open);
        let start = Position::new(sx % width as i32, sy % height as i32);
        let goal = Position::new(gx % width as i32, gy % height as i32);
        prop_assume!(grid.is_walkable(start));

        let path = find_path(start, goal, &grid, NO_OBSTACLES);
        match bfs_distance(&grid, start, goal) {
            Some(distance) => {
                let path = path.expect("BFS found a route A* missed");
                prop_assert_eq!(path.len() - 1, distance);
                prop_assert_eq!(path.first(), Some(&start));
                prop_assert_eq!(path.last(), Some(&goal));
                for pair in path.windows(2) {
                    prop_assert_eq!(pair[0].manhattan_distance(pair[1]), 1);
                    prop_assert!(grid.is_walkable(pair[1]));
                }
            }
            None => prop_assert!(path.is_none()),
        }
    }

    #[test]
    fn flood_fill_never_exceeds_total(
        (width, height, open) in small_grid(),
        sx in 0i32..10, sy in 0i32..10,
    ) {
        let grid = grid_from_mask(width, height, &open);
        let start = Position::new(sx % width as i32, sy % height as i32);
        let reachable = count_reachable_tiles(&grid, start, NO_OBSTACLES);
        let total = count_total_walkable(&grid);
        prop_assert!(reachable <= total);

        // Equality holds exactly when every walkable tile has a path from start
        let all_connected = grid
            .positions()
            .filter(|&p| grid.is_walkable(p))
            .all(|p| bfs_distance(&grid, start, p).is_some());
        prop_assert_eq!(
            reachable == total,
            total == 0 || (all_connected && grid.is_walkable(start))
        );
    }

    #[test]
    fn goal_stays_enterable_when_listed_as_obstacle(
        (width, height, open) in small_grid(),
        gx in 0i32..10, gy in 0i32..10,
    ) {
        let grid = grid_from_mask(width, height, &open);
        let goal = Position::new(gx % width as i32, gy % height as i32);
        let Some(start) = grid.floor_positions().next() else {
            return Ok(());
        };

        let free = find_path(start, goal, &grid, NO_OBSTACLES);
        let blocked = find_path(start, goal, &grid, &[goal]);
        prop_assert_eq!(free.map(|p| p.len()), blocked.map(|p| p.len()));
    }

    #[test]
    fn grid_reads_are_stable(
        (width, height, open) in small_grid(),
        x in -2i32..12, y in -2i32..12,
    ) {
        let grid = grid_from_mask(width, height, &open);
        let pos = Position::new(x, y);
        prop_assert_eq!(grid.in_bounds(pos), grid.get(pos).is_ok());
        if let (Ok(a), Ok(b)) = (grid.get(pos), grid.get(pos)) {
            prop_assert_eq!(a, b);
        }
    }
}

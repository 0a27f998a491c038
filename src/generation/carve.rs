//! # Carving Primitives
//!
//! The reusable floor-carving moves every map strategy is built from:
//! random walks, goal-directed winding tunnels and straight traces.

use crate::{Direction, Grid, Position};
use rand::seq::SliceRandom;
use rand::Rng;

/// Carves a random walk of `steps` moves starting at `start`.
///
/// Each move goes to a random cardinal neighbour clamped to the grid interior,
/// so the border ring is never opened. Returns where the walk ended.
pub fn random_walk<R: Rng + ?Sized>(
    grid: &mut Grid,
    start: Position,
    steps: usize,
    rng: &mut R,
) -> Position {
    let mut current = grid.clamp_interior(start);
    grid.carve(current);

    for _ in 0..steps {
        let direction = Direction::all()[rng.gen_range(0..4)];
        current = grid.clamp_interior(current.step(direction));
        grid.carve(current);
    }

    current
}

/// Carves an axis-aligned trace from `from` to `to`, horizontal leg first.
///
/// Both endpoints are carved.
pub fn straight_trace(grid: &mut Grid, from: Position, to: Position) {
    let mut current = from;
    grid.carve(current);
    while current != to {
        current = current.step_toward_x_first(to);
        grid.carve(current);
    }
}

/// Options for [`winding_tunnel`].
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TunnelStyle {
    /// Probability of stepping toward the target along the longer axis
    pub bias: f64,
    /// Half-width of the carved brush; 0 carves a 1-wide tunnel, 1 a 3-wide tube
    pub radius: i32,
}

impl TunnelStyle {
    /// A 1-wide tunnel with the given bias.
    pub fn narrow(bias: f64) -> Self {
        Self { bias, radius: 0 }
    }

    /// A 3-wide tube with the given bias.
    pub fn wide(bias: f64) -> Self {
        Self { bias, radius: 1 }
    }
}

fn carve_brush(grid: &mut Grid, center: Position, radius: i32) {
    for dy in -radius..=radius {
        for dx in -radius..=radius {
            grid.carve(Position::new(center.x + dx, center.y + dy));
        }
    }
}

/// Carves a goal-directed but wandering tunnel from `from` to `to`.
///
/// With probability `style.bias` a step closes the longer axis gap; otherwise it
/// takes a random direction that stays inside the interior. The walk is capped;
/// if the cap is hit the rest is finished with a [`straight_trace`].
pub fn winding_tunnel<R: Rng + ?Sized>(
    grid: &mut Grid,
    from: Position,
    to: Position,
    style: TunnelStyle,
    rng: &mut R,
) {
    let max_steps = 4 * (from.manhattan_distance(to) as usize + grid.width() as usize + grid.height() as usize);
    let mut current = from;

    for _ in 0..max_steps {
        if current == to {
            break;
        }
        carve_brush(grid, current, style.radius);

        if rng.gen_bool(style.bias.clamp(0.0, 1.0)) {
            current = current.step_toward_longer_axis(to);
        } else {
            let legal: Vec<Position> = Direction::all()
                .iter()
                .map(|&d| current.step(d))
                .filter(|&p| grid.is_interior(p))
                .collect();
            if let Some(&next) = legal.choose(rng) {
                current = next;
            }
        }
    }

    if current != to {
        straight_trace(grid, current, to);
    }
    carve_brush(grid, to, style.radius);
}

/// Carves a straight run of `length` tiles from `start` in `direction`.
///
/// Returns the last position stepped onto.
pub fn carve_run(grid: &mut Grid, start: Position, direction: Direction, length: usize) -> Position {
    let mut current = start;
    for _ in 0..length {
        current = current.step(direction);
        grid.carve(current);
    }
    current
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{count_reachable_tiles, count_total_walkable, CellType};
    use rand::{rngs::StdRng, SeedableRng};

    const NO_OBSTACLES: &[Position] = &[];

    #[test]
    fn test_random_walk_stays_inside_border() {
        let mut rng = StdRng::seed_from_u64(11);
        let mut grid = Grid::new(12, 9);
        random_walk(&mut grid, Position::new(6, 4), 200, &mut rng);

        for pos in grid.floor_positions() {
            assert!(grid.is_interior(pos), "{} carved on the border", pos);
        }
        let start = Position::new(6, 4);
        assert_eq!(
            count_reachable_tiles(&grid, start, NO_OBSTACLES),
            count_total_walkable(&grid)
        );
    }

    #[test]
    fn test_straight_trace_is_l_shaped() {
        let mut grid = Grid::new(10, 10);
        straight_trace(&mut grid, Position::new(1, 1), Position::new(5, 4));
        assert_eq!(grid.count(CellType::Floor), 5 + 3);
        assert!(grid.is_floor(Position::new(5, 1)));
        assert!(grid.is_floor(Position::new(5, 4)));
        assert!(!grid.is_floor(Position::new(1, 4)));
    }

    #[test]
    fn test_winding_tunnel_connects_endpoints() {
        for seed in 0..20 {
            let mut rng = StdRng::seed_from_u64(seed);
            let mut grid = Grid::new(30, 20);
            let from = Position::new(2, 2);
            let to = Position::new(26, 16);
            winding_tunnel(&mut grid, from, to, TunnelStyle::narrow(0.7), &mut rng);

            assert!(grid.is_floor(from));
            assert!(grid.is_floor(to));
            assert_eq!(
                count_reachable_tiles(&grid, from, NO_OBSTACLES),
                count_total_walkable(&grid)
            );
        }
    }

    #[test]
    fn test_zero_bias_tunnel_still_terminates() {
        let mut rng = StdRng::seed_from_u64(5);
        let mut grid = Grid::new(15, 15);
        let from = Position::new(1, 1);
        let to = Position::new(13, 13);
        winding_tunnel(&mut grid, from, to, TunnelStyle::narrow(0.0), &mut rng);
        assert!(grid.is_floor(to));
    }

    #[test]
    fn test_wide_tunnel_carves_three_wide() {
        let mut rng = StdRng::seed_from_u64(5);
        let mut grid = Grid::new(20, 9);
        winding_tunnel(
            &mut grid,
            Position::new(3, 4),
            Position::new(15, 4),
            TunnelStyle::wide(1.0),
            &mut rng,
        );
        for x in 2..=16 {
            for y in 3..=5 {
                assert!(grid.is_floor(Position::new(x, y)));
            }
        }
    }

    #[test]
    fn test_carve_run() {
        let mut grid = Grid::new(8, 8);
        let end = carve_run(&mut grid, Position::new(2, 2), Direction::East, 3);
        assert_eq!(end, Position::new(5, 2));
        assert_eq!(grid.count(CellType::Floor), 3);
    }
}

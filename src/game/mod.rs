//! # Game Module
//!
//! Level data model and the runtime consumers of the pathfinder.
//!
//! This module contains the fundamental building blocks shared by generation and play:
//! - Positions, cardinal directions and the [`HasPosition`] capability
//! - The tile [`Grid`]
//! - The [`LevelContext`] that owns a level during setup
//! - The autopilot step queue

pub mod autopilot;
pub mod grid;
pub mod state;

pub use autopilot::*;
pub use grid::*;
pub use state::*;

use serde::{Deserialize, Serialize};

/// Represents a 2D coordinate on the level grid.
///
/// # Examples
///
/// ```
/// use hard_division::Position;
///
/// let pos = Position::new(10, 5);
/// assert_eq!(pos.x, 10);
/// assert_eq!(pos.y, 5);
///
/// let adjacent = pos.cardinal_adjacent_positions();
/// assert_eq!(adjacent.len(), 4);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Position {
    pub x: i32,
    pub y: i32,
}

impl Position {
    /// Creates a new position with the given coordinates.
    pub fn new(x: i32, y: i32) -> Self {
        Self { x, y }
    }

    /// Calculates the Manhattan distance to another position.
    ///
    /// # Examples
    ///
    /// ```
    /// use hard_division::Position;
    ///
    /// let pos1 = Position::new(0, 0);
    /// let pos2 = Position::new(3, 4);
    /// assert_eq!(pos1.manhattan_distance(pos2), 7);
    /// ```
    pub fn manhattan_distance(self, other: Position) -> u32 {
        self.x.abs_diff(other.x) + self.y.abs_diff(other.y)
    }

    /// Calculates the Euclidean distance to another position.
    pub fn euclidean_distance(self, other: Position) -> f64 {
        let dx = (self.x - other.x) as f64;
        let dy = (self.y - other.y) as f64;
        (dx * dx + dy * dy).sqrt()
    }

    /// Returns the 4 cardinal adjacent positions in N, E, S, W order.
    pub fn cardinal_adjacent_positions(self) -> [Position; 4] {
        [
            Position::new(self.x, self.y - 1), // N
            Position::new(self.x + 1, self.y), // E
            Position::new(self.x, self.y + 1), // S
            Position::new(self.x - 1, self.y), // W
        ]
    }

    /// Returns the position one step away in `direction`.
    pub fn step(self, direction: Direction) -> Position {
        self + direction.to_delta()
    }

    /// Moves one step toward `target` along one axis, x first.
    pub fn step_toward_x_first(self, target: Position) -> Position {
        if self.x != target.x {
            Position::new(self.x + (target.x - self.x).signum(), self.y)
        } else {
            Position::new(self.x, self.y + (target.y - self.y).signum())
        }
    }

    /// Moves one step toward `target` along whichever axis has the longer gap.
    ///
    /// Ties go to the vertical axis.
    pub fn step_toward_longer_axis(self, target: Position) -> Position {
        if self.x.abs_diff(target.x) > self.y.abs_diff(target.y) {
            Position::new(self.x + (target.x - self.x).signum(), self.y)
        } else {
            Position::new(self.x, self.y + (target.y - self.y).signum())
        }
    }
}

impl std::ops::Add for Position {
    type Output = Self;

    fn add(self, other: Self) -> Self {
        Self::new(self.x + other.x, self.y + other.y)
    }
}

impl std::ops::Sub for Position {
    type Output = Self;

    fn sub(self, other: Self) -> Self {
        Self::new(self.x - other.x, self.y - other.y)
    }
}

impl std::fmt::Display for Position {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "({}, {})", self.x, self.y)
    }
}

/// Anything that occupies a cell.
///
/// Placement code only ever needs an entity's coordinates, so exclusion and
/// obstacle sets are built from this capability alone.
pub trait HasPosition {
    fn position(&self) -> Position;
}

impl HasPosition for Position {
    fn position(&self) -> Position {
        *self
    }
}

impl<T: HasPosition + ?Sized> HasPosition for &T {
    fn position(&self) -> Position {
        (**self).position()
    }
}

/// Collects the positions of a mixed set of entities.
pub fn positions_of<I>(entities: I) -> Vec<Position>
where
    I: IntoIterator,
    I::Item: HasPosition,
{
    entities.into_iter().map(|e| e.position()).collect()
}

/// Cardinal movement directions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Direction {
    North,
    East,
    South,
    West,
}

impl Direction {
    /// Converts a direction to a position delta.
    ///
    /// # Examples
    ///
    /// ```
    /// use hard_division::{Direction, Position};
    ///
    /// let delta = Direction::North.to_delta();
    /// assert_eq!(delta, Position::new(0, -1));
    /// ```
    pub fn to_delta(self) -> Position {
        match self {
            Direction::North => Position::new(0, -1),
            Direction::East => Position::new(1, 0),
            Direction::South => Position::new(0, 1),
            Direction::West => Position::new(-1, 0),
        }
    }

    /// Converts a position delta to a direction.
    ///
    /// Returns None if the delta isn't a single cardinal step.
    pub fn from_delta(delta: Position) -> Option<Direction> {
        match (delta.x, delta.y) {
            (0, -1) => Some(Direction::North),
            (1, 0) => Some(Direction::East),
            (0, 1) => Some(Direction::South),
            (-1, 0) => Some(Direction::West),
            _ => None,
        }
    }

    /// Returns all 4 directions in clockwise order starting north.
    pub fn all() -> [Direction; 4] {
        [
            Direction::North,
            Direction::East,
            Direction::South,
            Direction::West,
        ]
    }

    /// Returns the direction rotated clockwise by `quarter_turns`.
    pub fn rotate(self, quarter_turns: usize) -> Direction {
        let index = Direction::all()
            .iter()
            .position(|&d| d == self)
            .unwrap_or(0);
        Direction::all()[(index + quarter_turns) % 4]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_position_manhattan_distance() {
        let pos1 = Position::new(0, 0);
        let pos2 = Position::new(3, 4);
        assert_eq!(pos1.manhattan_distance(pos2), 7);
        assert_eq!(pos2.manhattan_distance(pos1), 7);
    }

    #[test]
    fn test_position_euclidean_distance() {
        let pos1 = Position::new(0, 0);
        let pos2 = Position::new(3, 4);
        assert_eq!(pos1.euclidean_distance(pos2), 5.0);
    }

    #[test]
    fn test_position_cardinal_adjacent() {
        let pos = Position::new(5, 5);
        let adjacent = pos.cardinal_adjacent_positions();
        assert!(adjacent.contains(&Position::new(5, 4))); // North
        assert!(adjacent.contains(&Position::new(4, 5))); // West
        assert!(!adjacent.contains(&Position::new(4, 4))); // No diagonal
    }

    #[test]
    fn test_position_arithmetic() {
        let pos1 = Position::new(5, 10);
        let pos2 = Position::new(3, 2);
        assert_eq!(pos1 + pos2, Position::new(8, 12));
        assert_eq!(pos1 - pos2, Position::new(2, 8));
    }

    #[test]
    fn test_step_toward() {
        let from = Position::new(0, 0);
        assert_eq!(from.step_toward_x_first(Position::new(3, 3)), Position::new(1, 0));
        assert_eq!(from.step_toward_x_first(Position::new(0, -3)), Position::new(0, -1));
        assert_eq!(from.step_toward_longer_axis(Position::new(1, 4)), Position::new(0, 1));
        assert_eq!(from.step_toward_longer_axis(Position::new(-4, 1)), Position::new(-1, 0));
    }

    #[test]
    fn test_direction_round_trip_and_rotation() {
        for direction in Direction::all() {
            assert_eq!(Direction::from_delta(direction.to_delta()), Some(direction));
        }
        assert_eq!(Direction::from_delta(Position::new(1, 1)), None);
        assert_eq!(Direction::North.rotate(1), Direction::East);
        assert_eq!(Direction::West.rotate(2), Direction::East);
    }

    #[test]
    fn test_positions_of_mixed_entities() {
        let a = Position::new(1, 2);
        let b = Position::new(3, 4);
        assert_eq!(positions_of([&a, &b]), vec![a, b]);
    }
}

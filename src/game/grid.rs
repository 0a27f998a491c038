//! # Grid Model
//!
//! The rectangular tile buffer every generator carves into and every
//! placement routine reads from.

use crate::{DivisionError, DivisionResult, Position};
use serde::{Deserialize, Serialize};
use std::fmt;

/// The three kinds of cell a level is made of.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum CellType {
    Wall,
    Floor,
    Stairs,
}

impl CellType {
    /// Floor and stairs can be walked on; walls cannot.
    pub fn is_walkable(self) -> bool {
        matches!(self, CellType::Floor | CellType::Stairs)
    }

    /// Gets the ASCII glyph used for this cell.
    pub fn glyph(self) -> char {
        match self {
            CellType::Wall => '#',
            CellType::Floor => '.',
            CellType::Stairs => '>',
        }
    }
}

/// Row-major `width x height` buffer of cells.
///
/// Created all-wall, carved in place by a generator, then frozen in shape.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Grid {
    width: u32,
    height: u32,
    cells: Vec<CellType>,
}

impl Grid {
    /// Creates a grid with every cell set to [`CellType::Wall`].
    ///
    /// # Examples
    ///
    /// ```
    /// use hard_division::{CellType, Grid, Position};
    ///
    /// let grid = Grid::new(10, 8);
    /// assert_eq!(grid.width(), 10);
    /// assert_eq!(grid.get(Position::new(3, 3)).unwrap(), CellType::Wall);
    /// ```
    pub fn new(width: u32, height: u32) -> Self {
        Self {
            width,
            height,
            cells: vec![CellType::Wall; width as usize * height as usize],
        }
    }

    /// Builds a grid from text rows using `#`, `.` and `>`.
    ///
    /// Any other character becomes a wall. Rows shorter than the first are padded with walls.
    pub fn from_rows(rows: &[&str]) -> Self {
        let height = rows.len() as u32;
        let width = rows.first().map(|r| r.chars().count()).unwrap_or(0) as u32;
        let mut grid = Self::new(width, height);

        for (y, row) in rows.iter().enumerate() {
            for (x, ch) in row.chars().enumerate().take(width as usize) {
                let cell = match ch {
                    '.' => CellType::Floor,
                    '>' => CellType::Stairs,
                    _ => CellType::Wall,
                };
                grid.cells[y * width as usize + x] = cell;
            }
        }

        grid
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    /// Checks whether a position lies inside the grid.
    pub fn in_bounds(&self, pos: Position) -> bool {
        pos.x >= 0 && pos.y >= 0 && (pos.x as u32) < self.width && (pos.y as u32) < self.height
    }

    fn index(&self, pos: Position) -> Option<usize> {
        if self.in_bounds(pos) {
            Some(pos.y as usize * self.width as usize + pos.x as usize)
        } else {
            None
        }
    }

    /// Reads a cell, failing with [`DivisionError::OutOfBounds`] outside the grid.
    pub fn get(&self, pos: Position) -> DivisionResult<CellType> {
        self.cell(pos)
            .ok_or(DivisionError::OutOfBounds { x: pos.x, y: pos.y })
    }

    /// Reads a cell, returning None outside the grid.
    pub fn cell(&self, pos: Position) -> Option<CellType> {
        self.index(pos).map(|i| self.cells[i])
    }

    /// Writes a cell, failing with [`DivisionError::OutOfBounds`] outside the grid.
    pub fn set(&mut self, pos: Position, cell: CellType) -> DivisionResult<()> {
        let index = self
            .index(pos)
            .ok_or(DivisionError::OutOfBounds { x: pos.x, y: pos.y })?;
        self.cells[index] = cell;
        Ok(())
    }

    /// Marks a cell as floor if it is inside the grid.
    ///
    /// Generators carve freely near the edges; anything outside is dropped.
    pub fn carve(&mut self, pos: Position) -> bool {
        match self.index(pos) {
            Some(index) => {
                self.cells[index] = CellType::Floor;
                true
            }
            None => false,
        }
    }

    /// Marks a cell as wall if it is inside the grid.
    pub fn fill(&mut self, pos: Position) {
        if let Some(index) = self.index(pos) {
            self.cells[index] = CellType::Wall;
        }
    }

    pub fn is_walkable(&self, pos: Position) -> bool {
        self.cell(pos).map(CellType::is_walkable).unwrap_or(false)
    }

    pub fn is_floor(&self, pos: Position) -> bool {
        self.cell(pos) == Some(CellType::Floor)
    }

    /// Checks whether a position is inside the one-tile border ring.
    pub fn is_interior(&self, pos: Position) -> bool {
        pos.x >= 1
            && pos.y >= 1
            && (pos.x as i64) < self.width as i64 - 1
            && (pos.y as i64) < self.height as i64 - 1
    }

    /// Clamps a position into the interior, or onto the grid if it has no interior.
    pub fn clamp_interior(&self, pos: Position) -> Position {
        let max_x = (self.width as i32 - 2).max(1);
        let max_y = (self.height as i32 - 2).max(1);
        let clamped = Position::new(pos.x.clamp(1, max_x), pos.y.clamp(1, max_y));
        Position::new(
            clamped.x.min(self.width as i32 - 1).max(0),
            clamped.y.min(self.height as i32 - 1).max(0),
        )
    }

    /// Iterates every position in row-major order.
    pub fn positions(&self) -> impl Iterator<Item = Position> + '_ {
        let width = self.width as i32;
        (0..self.height as i32).flat_map(move |y| (0..width).map(move |x| Position::new(x, y)))
    }

    /// Iterates every floor position in row-major order.
    pub fn floor_positions(&self) -> impl Iterator<Item = Position> + '_ {
        self.positions().filter(move |&p| self.is_floor(p))
    }

    /// Counts cardinal neighbours that are walls; outside the grid counts as wall.
    pub fn wall_neighbor_count(&self, pos: Position) -> usize {
        pos.cardinal_adjacent_positions()
            .iter()
            .filter(|&&n| self.cell(n).map_or(true, |c| c == CellType::Wall))
            .count()
    }

    /// Counts cardinal neighbours that are plain floor.
    pub fn floor_neighbor_count(&self, pos: Position) -> usize {
        pos.cardinal_adjacent_positions()
            .iter()
            .filter(|&&n| self.is_floor(n))
            .count()
    }

    /// Counts cells of the given type.
    pub fn count(&self, cell: CellType) -> usize {
        self.cells.iter().filter(|&&c| c == cell).count()
    }

    /// Iterates rows as slices, top to bottom.
    pub fn rows(&self) -> impl Iterator<Item = &[CellType]> {
        self.cells.chunks(self.width.max(1) as usize)
    }
}

impl fmt::Display for Grid {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for row in self.rows() {
            let line: String = row.iter().map(|c| c.glyph()).collect();
            writeln!(f, "{}", line)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_grid_is_all_wall() {
        let grid = Grid::new(6, 4);
        assert_eq!(grid.count(CellType::Wall), 24);
        assert_eq!(grid.count(CellType::Floor), 0);
    }

    #[test]
    fn test_bounds() {
        let grid = Grid::new(6, 4);
        assert!(grid.in_bounds(Position::new(0, 0)));
        assert!(grid.in_bounds(Position::new(5, 3)));
        assert!(!grid.in_bounds(Position::new(6, 3)));
        assert!(!grid.in_bounds(Position::new(-1, 0)));

        assert!(matches!(
            grid.get(Position::new(6, 0)),
            Err(DivisionError::OutOfBounds { x: 6, y: 0 })
        ));
    }

    #[test]
    fn test_set_and_repeated_get() {
        let mut grid = Grid::new(5, 5);
        let pos = Position::new(2, 3);
        grid.set(pos, CellType::Stairs).unwrap();

        assert_eq!(grid.get(pos).unwrap(), CellType::Stairs);
        assert_eq!(grid.get(pos).unwrap(), grid.get(pos).unwrap());
        assert!(grid.set(Position::new(5, 5), CellType::Floor).is_err());
    }

    #[test]
    fn test_carve_ignores_out_of_bounds() {
        let mut grid = Grid::new(3, 3);
        assert!(grid.carve(Position::new(1, 1)));
        assert!(!grid.carve(Position::new(3, 1)));
        assert_eq!(grid.count(CellType::Floor), 1);
    }

    #[test]
    fn test_from_rows_and_display() {
        let rows = ["#####", "#..>#", "#####"];
        let grid = Grid::from_rows(&rows);
        assert_eq!(grid.width(), 5);
        assert_eq!(grid.height(), 3);
        assert_eq!(grid.get(Position::new(3, 1)).unwrap(), CellType::Stairs);
        assert_eq!(grid.to_string(), "#####\n#..>#\n#####\n");
    }

    #[test]
    fn test_neighbor_counts() {
        let grid = Grid::from_rows(&["#.#", "...", "#>#"]);
        let center = Position::new(1, 1);
        assert_eq!(grid.floor_neighbor_count(center), 3);
        assert_eq!(grid.wall_neighbor_count(center), 0);
        // Corner: two out-of-bounds sides, two floor neighbours
        assert_eq!(grid.wall_neighbor_count(Position::new(0, 0)), 2);
    }

    #[test]
    fn test_clamp_interior() {
        let grid = Grid::new(10, 8);
        assert_eq!(grid.clamp_interior(Position::new(-3, 20)), Position::new(1, 6));
        assert_eq!(grid.clamp_interior(Position::new(4, 4)), Position::new(4, 4));

        let tiny = Grid::new(1, 1);
        assert_eq!(tiny.clamp_interior(Position::new(5, 5)), Position::new(0, 0));
    }
}

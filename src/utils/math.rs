//! # Generation Mathematics
//!
//! Random integer and geometry helpers shared by the generators and placement.

use crate::Position;
use rand::Rng;

/// Random integer in `min..=max`.
///
/// Collapses to `min` when the range is empty, so callers working with tiny
/// grids never hit an empty-range panic.
///
/// # Examples
///
/// ```
/// use hard_division::random_int;
/// use rand::{rngs::StdRng, SeedableRng};
///
/// let mut rng = StdRng::seed_from_u64(7);
/// let value = random_int(&mut rng, 2, 5);
/// assert!((2..=5).contains(&value));
/// assert_eq!(random_int(&mut rng, 4, 1), 4);
/// ```
pub fn random_int<R: Rng + ?Sized>(rng: &mut R, min: i32, max: i32) -> i32 {
    if max <= min {
        min
    } else {
        rng.gen_range(min..=max)
    }
}

/// Unsigned counterpart of [`random_int`].
pub fn random_u32<R: Rng + ?Sized>(rng: &mut R, min: u32, max: u32) -> u32 {
    if max <= min {
        min
    } else {
        rng.gen_range(min..=max)
    }
}

/// Converts polar coordinates around `center` to the containing grid cell.
pub fn polar_to_grid(center: Position, angle: f64, radius: f64) -> Position {
    Position::new(
        (center.x as f64 + angle.cos() * radius).floor() as i32,
        (center.y as f64 + angle.sin() * radius).floor() as i32,
    )
}

/// Indices of `points` other than `from`, nearest first by Manhattan distance.
///
/// The sort is stable, so equally distant points keep their original order.
pub fn nearest_by_manhattan(points: &[Position], from: usize) -> Vec<usize> {
    let origin = points[from];
    let mut others: Vec<usize> = (0..points.len()).filter(|&i| i != from).collect();
    others.sort_by_key(|&i| points[i].manhattan_distance(origin));
    others
}

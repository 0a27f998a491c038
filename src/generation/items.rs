//! # Items
//!
//! Point pickups scattered over a level.

use crate::{
    find_empty_floor_tile, random_u32, EnemyPlacement, GenerationConfig, Grid, HasPosition,
    Position,
};
use log::{debug, warn};
use rand::Rng;
use serde::{Deserialize, Serialize};

/// A pickup worth `value` points.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PickupPlacement {
    pub position: Position,
    pub value: u32,
}

impl HasPosition for PickupPlacement {
    fn position(&self) -> Position {
        self.position
    }
}

/// Spreads `level` points over up to `level` pickups.
///
/// Level 1 gets one pickup holding every point. Deeper levels draw each value
/// from `1..=remaining` until the points run out; the last allowed pickup takes
/// the remainder. If the map runs out of free cells midway the leftover points
/// are folded into the last pickup placed, so the total always equals `level`
/// unless not a single pickup fits.
#[allow(clippy::too_many_arguments)]
pub fn spawn_pickups<R: Rng + ?Sized>(
    grid: &Grid,
    player: Position,
    stairs: Position,
    key: Option<Position>,
    enemies: &[EnemyPlacement],
    level: u32,
    config: &GenerationConfig,
    rng: &mut R,
) -> Vec<PickupPlacement> {
    let count = if level <= 1 { 1 } else { level };
    let mut remaining = level;
    let mut pickups: Vec<PickupPlacement> = Vec::new();

    for i in 0..count {
        if remaining == 0 {
            break;
        }

        let mut exclude = vec![player, stairs];
        exclude.extend(key);
        exclude.extend(enemies.iter().map(|e| e.position));
        exclude.extend(pickups.iter().map(|p| p.position));

        let Some(position) = find_empty_floor_tile(grid, Some(player), &exclude, config, rng) else {
            match pickups.last_mut() {
                Some(last) => {
                    warn!(
                        "No room for more pickups, folding {} points into {}",
                        remaining, last.position
                    );
                    last.value += remaining;
                }
                None => warn!("No room for any pickup, {} points dropped", remaining),
            }
            break;
        };

        let value = if level <= 1 || i + 1 == count {
            remaining
        } else {
            random_u32(rng, 1, remaining)
        };
        pickups.push(PickupPlacement { position, value });
        remaining -= value;
    }

    debug!(
        "Spawned {} pickups worth {:?}",
        pickups.len(),
        pickups.iter().map(|p| p.value).collect::<Vec<_>>()
    );
    pickups
}

//! # Autopilot Module
//!
//! Automated movement that follows pathfinder output one step at a time.
//!
//! The autopilot never moves anything itself. It hands out the next cell to
//! step onto, and the caller reports back where the actor really ended up and
//! whether combat happened. Any surprise throws the queued path away so the
//! next step replans from the actual position.

use crate::{find_path, Direction, Grid, HasPosition, LevelContext, Position};
use log::{debug, info};
use serde::{Deserialize, Serialize};
use std::collections::VecDeque;

/// What the autopilot is walking toward.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum AutopilotTarget {
    Key(Position),
    Stairs(Position),
    Enemy(Position),
}

impl HasPosition for AutopilotTarget {
    fn position(&self) -> Position {
        match *self {
            AutopilotTarget::Key(pos) | AutopilotTarget::Stairs(pos) | AutopilotTarget::Enemy(pos) => {
                pos
            }
        }
    }
}

/// Picks the next target: the key while it is on the map, then the stairs,
/// then the closest enemy.
pub fn choose_target<P: HasPosition>(
    current: Position,
    key: Option<Position>,
    stairs: Option<Position>,
    enemies: &[P],
) -> Option<AutopilotTarget> {
    if let Some(key) = key {
        return Some(AutopilotTarget::Key(key));
    }
    if let Some(stairs) = stairs {
        return Some(AutopilotTarget::Stairs(stairs));
    }
    enemies
        .iter()
        .map(|e| e.position())
        .min_by(|a, b| {
            current
                .euclidean_distance(*a)
                .total_cmp(&current.euclidean_distance(*b))
        })
        .map(AutopilotTarget::Enemy)
}

/// Result of reporting a step back to the autopilot.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StepOutcome {
    /// The step went as planned and path remains
    Moved,
    /// The path was dropped; plan again before the next step
    Replan,
    /// The target cell has been reached
    Arrived,
}

/// Step queue fed by the pathfinder.
#[derive(Debug, Clone, Default)]
pub struct Autopilot {
    path: VecDeque<Position>,
    target: Option<Position>,
    expected: Option<Position>,
}

impl Autopilot {
    pub fn new() -> Self {
        Self::default()
    }

    /// Plans a path from `current` to `target` around the obstacles.
    ///
    /// A leading node equal to `current` is dropped, so the queue holds only
    /// cells still to be stepped onto. Returns false when no path exists, in
    /// which case the queue is left empty.
    ///
    /// # Examples
    ///
    /// ```
    /// use hard_division::{Autopilot, Grid, Position};
    ///
    /// let grid = Grid::from_rows(&["######", "#....#", "######"]);
    /// let mut autopilot = Autopilot::new();
    ///
    /// assert!(autopilot.plan(Position::new(1, 1), Position::new(4, 1), &grid, &[] as &[Position]));
    /// assert_eq!(autopilot.remaining(), 3);
    /// assert_eq!(autopilot.next_step(), Some(Position::new(2, 1)));
    /// ```
    pub fn plan<P: HasPosition>(
        &mut self,
        current: Position,
        target: Position,
        grid: &Grid,
        obstacles: &[P],
    ) -> bool {
        self.clear();
        self.target = Some(target);

        let Some(path) = find_path(current, target, grid, obstacles) else {
            debug!("Autopilot found no path from {} to {}", current, target);
            return false;
        };

        self.path = path.into_iter().collect();
        if self.path.front() == Some(&current) {
            self.path.pop_front();
        }
        true
    }

    /// Takes the next cell to step onto and remembers it as the expected position.
    pub fn next_step(&mut self) -> Option<Position> {
        let next = self.path.pop_front();
        self.expected = next;
        next
    }

    /// Direction of the next queued step from `current`, without consuming it.
    pub fn next_direction(&self, current: Position) -> Option<Direction> {
        self.path
            .front()
            .and_then(|&next| Direction::from_delta(next - current))
    }

    /// Reports where the actor really is after the last step.
    ///
    /// A position other than the expected one, or any combat, drops the path.
    pub fn observe(&mut self, actual: Position, combat: bool) -> StepOutcome {
        let diverged = self.expected.map_or(false, |expected| expected != actual);
        self.expected = None;

        if Some(actual) == self.target {
            self.path.clear();
            return StepOutcome::Arrived;
        }
        if diverged || combat {
            debug!("Autopilot replanning at {} (combat: {})", actual, combat);
            self.path.clear();
            return StepOutcome::Replan;
        }
        if self.path.is_empty() {
            return StepOutcome::Replan;
        }
        StepOutcome::Moved
    }

    /// True when the queue is empty and a new plan is needed.
    pub fn needs_replan(&self) -> bool {
        self.path.is_empty()
    }

    pub fn clear(&mut self) {
        self.path.clear();
        self.target = None;
        self.expected = None;
    }

    pub fn remaining(&self) -> usize {
        self.path.len()
    }

    pub fn target(&self) -> Option<Position> {
        self.target
    }

    /// Default move cap for [`Autopilot::drive`]: four moves per grid cell.
    pub fn step_budget(width: u32, height: u32) -> usize {
        (width as usize)
            .saturating_mul(height as usize)
            .saturating_mul(4)
    }

    /// Walks the player through a level: key first, then the stairs.
    ///
    /// Enemies are obstacles the whole way. Stepping onto an enemy counts as
    /// combat and leaves the player where it was. Stops after `max_steps` moves
    /// or as soon as no path exists.
    pub fn drive(&mut self, level: &mut LevelContext, max_steps: usize) -> AutopilotReport {
        let mut report = AutopilotReport::default();

        while report.steps < max_steps {
            let Some(target) = choose_target(
                level.player,
                level.active_key(),
                Some(level.stairs),
                &level.enemies,
            ) else {
                break;
            };

            if level.player == target.position() {
                match target {
                    AutopilotTarget::Key(_) => {
                        level.collect_key();
                        report.key_collected = true;
                        continue;
                    }
                    AutopilotTarget::Stairs(_) => {
                        report.reached_stairs = true;
                        break;
                    }
                    AutopilotTarget::Enemy(_) => break,
                }
            }

            if self.needs_replan() || self.target != Some(target.position()) {
                report.plans += 1;
                if !self.plan(level.player, target.position(), &level.grid, &level.enemies) {
                    break;
                }
            }

            let Some(next) = self.next_step() else {
                break;
            };
            let combat = level.enemies.iter().any(|e| e.position == next);
            if !combat {
                level.player = next;
            }
            report.steps += 1;
            if self.observe(level.player, combat) == StepOutcome::Replan {
                report.replans += 1;
            }
        }

        info!(
            "Autopilot finished after {} steps ({} plans, {} replans), stairs reached: {}",
            report.steps, report.plans, report.replans, report.reached_stairs
        );
        report
    }
}

/// Summary of an autopilot walkthrough.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AutopilotReport {
    /// Steps taken
    pub steps: usize,
    /// Times the pathfinder was queried
    pub plans: usize,
    /// Times a step outcome forced a replan
    pub replans: usize,
    pub key_collected: bool,
    pub reached_stairs: bool,
}

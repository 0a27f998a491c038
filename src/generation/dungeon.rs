//! # Dungeon Generation
//!
//! Map carving strategies and the generator that runs them.
//!
//! Every strategy starts from an all-wall grid and carves floor with the
//! primitives in [`crate::generation::carve`]. Layouts only need to be roughly
//! connected: placement runs the authoritative connectivity checks afterwards.

use crate::{
    config, count_total_walkable, nearest_by_manhattan, polar_to_grid, random_int, random_walk,
    straight_trace, winding_tunnel, Chamber, ChamberShape, DivisionError, DivisionResult,
    Direction, GenerationConfig, Generator, Grid, Position, TunnelStyle,
};
use log::debug;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use serde::{Deserialize, Serialize};
use std::f64::consts::PI;

/// Carving strategies, resolved once per level.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, clap::ValueEnum,
)]
pub enum MapStrategy {
    /// A single random walk from the center
    RandomWalk,
    /// A wide central hallway with side chambers on short corridors
    Hallway,
    /// Oval chambers joined to their nearest neighbours by winding tunnels
    ChamberTunnel,
    /// Long 1-wide passages wandering in from the edges
    NarrowCaves,
    /// Many tiny clearings joined by a spanning tree of trails
    Clearings,
    /// Houses along a grid of streets
    Village,
    /// Chambers with spiral arms growing outward
    Spiral,
    /// Grid-of-components joined by straight traces
    Circuit,
}

impl MapStrategy {
    /// All strategies in declaration order.
    pub const ALL: [MapStrategy; 8] = [
        MapStrategy::RandomWalk,
        MapStrategy::Hallway,
        MapStrategy::ChamberTunnel,
        MapStrategy::NarrowCaves,
        MapStrategy::Clearings,
        MapStrategy::Village,
        MapStrategy::Spiral,
        MapStrategy::Circuit,
    ];

    /// Carves a fresh `width x height` grid with this strategy.
    pub fn carve(
        self,
        width: u32,
        height: u32,
        config: &GenerationConfig,
        rng: &mut StdRng,
    ) -> Grid {
        let mut grid = Grid::new(width, height);
        match self {
            MapStrategy::RandomWalk => carve_random_walk(&mut grid, config, rng),
            MapStrategy::Hallway => carve_hallway(&mut grid, rng),
            MapStrategy::ChamberTunnel => carve_chamber_tunnel(&mut grid, config, rng),
            MapStrategy::NarrowCaves => carve_narrow_caves(&mut grid, rng),
            MapStrategy::Clearings => carve_clearings(&mut grid, rng),
            MapStrategy::Village => carve_village(&mut grid, rng),
            MapStrategy::Spiral => carve_spiral(&mut grid, rng),
            MapStrategy::Circuit => carve_circuit(&mut grid, rng),
        }
        grid
    }

    pub fn name(self) -> &'static str {
        match self {
            MapStrategy::RandomWalk => "random-walk",
            MapStrategy::Hallway => "hallway",
            MapStrategy::ChamberTunnel => "chamber-tunnel",
            MapStrategy::NarrowCaves => "narrow-caves",
            MapStrategy::Clearings => "clearings",
            MapStrategy::Village => "village",
            MapStrategy::Spiral => "spiral",
            MapStrategy::Circuit => "circuit",
        }
    }
}

impl Default for MapStrategy {
    fn default() -> Self {
        MapStrategy::RandomWalk
    }
}

/// Generates a map with default tuning, seeded from `seed` or from entropy.
///
/// # Examples
///
/// ```
/// use hard_division::{generate_map, CellType, MapStrategy};
///
/// let grid = generate_map(MapStrategy::RandomWalk, 20, 15, Some(7));
/// assert_eq!(grid.width(), 20);
/// assert!(grid.count(CellType::Floor) > 0);
/// ```
pub fn generate_map(strategy: MapStrategy, width: u32, height: u32, seed: Option<u64>) -> Grid {
    let mut rng = match seed {
        Some(seed) => StdRng::seed_from_u64(seed),
        None => StdRng::from_entropy(),
    };
    let config = GenerationConfig::default();
    strategy.carve(width, height, &config, &mut rng)
}

/// Runs one [`MapStrategy`] and rejects grids too sparse to hold a level.
#[derive(Debug, Clone)]
pub struct DungeonGenerator {
    pub strategy: MapStrategy,
}

impl DungeonGenerator {
    pub fn new(strategy: MapStrategy) -> Self {
        Self { strategy }
    }
}

impl Default for DungeonGenerator {
    fn default() -> Self {
        Self::new(MapStrategy::default())
    }
}

impl Generator<Grid> for DungeonGenerator {
    fn generate(&self, config: &GenerationConfig, rng: &mut StdRng) -> DivisionResult<Grid> {
        let grid = self
            .strategy
            .carve(config.map_width, config.map_height, config, rng);
        debug!(
            "{} carved {} walkable tiles on a {}x{} grid",
            self.strategy.name(),
            count_total_walkable(&grid),
            grid.width(),
            grid.height()
        );
        self.validate(&grid, config)?;
        Ok(grid)
    }

    fn validate(&self, grid: &Grid, _config: &GenerationConfig) -> DivisionResult<()> {
        let walkable = count_total_walkable(grid);
        if walkable < config::MIN_WALKABLE_TILES {
            return Err(DivisionError::GenerationFailed(format!(
                "{} produced only {} walkable tiles",
                self.strategy.name(),
                walkable
            )));
        }
        Ok(())
    }

    fn generator_type(&self) -> &'static str {
        "DungeonGenerator"
    }
}

fn center_of(grid: &Grid) -> Position {
    Position::new(grid.width() as i32 / 2, grid.height() as i32 / 2)
}

fn carve_random_walk(grid: &mut Grid, config: &GenerationConfig, rng: &mut StdRng) {
    let steps = (grid.width() as f64 * grid.height() as f64 * config.random_walk_ratio) as usize;
    let start = center_of(grid);
    random_walk(grid, start, steps, rng);
}

fn carve_hallway(grid: &mut Grid, rng: &mut StdRng) {
    let width = grid.width() as i32;
    let hallway_y = grid.height() as i32 / 2;

    for y in (hallway_y - 1)..=(hallway_y + 1) {
        for x in 2..(width - 2) {
            grid.carve(Position::new(x, y));
        }
    }

    // One chamber every 8 tiles, alternating above and below
    let chamber_count = width / 8;
    for i in 0..chamber_count {
        let center_x = 8 + i * (width - 16).div_euclid(chamber_count);
        let side = if i % 2 == 0 { -1 } else { 1 };
        let chamber_width = random_int(rng, 4, 6);
        let chamber_height = random_int(rng, 3, 5);
        let corridor_length = random_int(rng, 2, 4);

        for c in 1..=corridor_length {
            grid.carve(Position::new(center_x, hallway_y + side * c));
        }

        let chamber_y = hallway_y + side * (corridor_length + chamber_height / 2);
        let half_w = chamber_width / 2;
        let half_h = chamber_height / 2;
        for dy in -half_h..=half_h {
            for dx in -half_w..=half_w {
                grid.carve(Position::new(center_x + dx, chamber_y + dy));
            }
        }
    }
}

fn carve_chamber_tunnel(grid: &mut Grid, config: &GenerationConfig, rng: &mut StdRng) {
    let width = grid.width() as i32;
    let height = grid.height() as i32;
    let chamber_count = ((width * height) / 30).max(6);
    let mut chambers: Vec<Chamber> = Vec::new();

    for _ in 0..chamber_count {
        let mut center = Position::new(0, 0);
        for _ in 0..50 {
            center = grid.clamp_interior(Position::new(
                random_int(rng, 4, width - 5),
                random_int(rng, 4, height - 5),
            ));
            let crowded = chambers.iter().any(|c| {
                (c.center.x - center.x).abs() < 8 && (c.center.y - center.y).abs() < 8
            });
            if !crowded {
                break;
            }
        }

        let roll = rng.gen::<f64>();
        let (w, h) = if roll < 0.3 {
            (random_int(rng, 6, 8), random_int(rng, 6, 8))
        } else if roll < 0.6 {
            (random_int(rng, 4, 5), random_int(rng, 4, 5))
        } else {
            (random_int(rng, 3, 4), random_int(rng, 3, 4))
        };

        let chamber = Chamber::new(center, w as u32, h as u32, ChamberShape::Oval);
        chamber.carve(grid, rng);
        chambers.push(chamber);
    }

    let centers: Vec<Position> = chambers.iter().map(|c| c.center).collect();
    for i in 0..centers.len() {
        let links = random_int(rng, 2, 3) as usize;
        for j in nearest_by_manhattan(&centers, i).into_iter().take(links) {
            winding_tunnel(
                grid,
                centers[i],
                centers[j],
                TunnelStyle::narrow(config.tunnel_bias),
                rng,
            );
        }
    }

    // Dead-end stubs
    for _ in 0..(centers.len() / 2) {
        let start = centers[rng.gen_range(0..centers.len())];
        let direction = Direction::all()[rng.gen_range(0..4)];
        let length = random_int(rng, 2, 5);
        let mut current = start;
        for _ in 0..length {
            current = current.step(direction);
            if grid.is_interior(current) {
                grid.carve(current);
            }
        }
    }
}

fn carve_narrow_caves(grid: &mut Grid, rng: &mut StdRng) {
    let width = grid.width() as i32;
    let height = grid.height() as i32;
    let path_count = ((width * height) / 100).max(3);
    let path_length = (width * height) / 8;

    for _ in 0..path_count {
        let edge = match rng.gen_range(0..4) {
            0 => Position::new(random_int(rng, 0, width - 1), 1),
            1 => Position::new(width - 2, random_int(rng, 0, height - 1)),
            2 => Position::new(random_int(rng, 0, width - 1), height - 2),
            _ => Position::new(1, random_int(rng, 0, height - 1)),
        };
        let mut current = grid.clamp_interior(edge);
        let mut direction = Direction::all()[rng.gen_range(0..4)];

        for _ in 0..path_length {
            grid.carve(current);

            if rng.gen_bool(0.15) {
                direction = Direction::all()[rng.gen_range(0..4)];
            }

            let next = current.step(direction);
            if !grid.is_interior(next) {
                direction = direction.rotate(if rng.gen_bool(0.5) { 1 } else { 3 });
                continue;
            }
            current = next;

            // Small alcoves off to the side
            if rng.gen_bool(0.08) {
                let side = direction.rotate(if rng.gen_bool(0.5) { 1 } else { 3 });
                let alcove = current.step(side);
                if grid.is_interior(alcove) {
                    grid.carve(alcove);
                    let deeper = alcove.step(side);
                    if rng.gen_bool(0.3) && grid.is_interior(deeper) {
                        grid.carve(deeper);
                    }
                }
            }
        }
    }

    // Short connectors between passages that come within 3 tiles
    let search_radius: i32 = 3;
    let floors: Vec<Position> = grid.floor_positions().filter(|&p| grid.is_interior(p)).collect();
    for pos in floors {
        for dy in -search_radius..=search_radius {
            for dx in -search_radius..=search_radius {
                if dx.abs() + dy.abs() != search_radius || !rng.gen_bool(0.1) {
                    continue;
                }
                let other = Position::new(pos.x + dx, pos.y + dy);
                if grid.is_interior(other) && grid.is_floor(other) {
                    straight_trace(grid, pos, other);
                }
            }
        }
    }
}

fn carve_clearings(grid: &mut Grid, rng: &mut StdRng) {
    let width = grid.width() as i32;
    let height = grid.height() as i32;
    let clearing_count = (width * height) / 15;
    let mut centers: Vec<Position> = Vec::new();

    for _ in 0..clearing_count {
        let mut placed = None;
        for _ in 0..30 {
            let candidate = Position::new(
                random_int(rng, 2, width - 3),
                random_int(rng, 2, height - 3),
            );
            let crowded = centers.iter().any(|c| {
                (c.x - candidate.x).abs() < 4 && (c.y - candidate.y).abs() < 4
            });
            if !crowded {
                placed = Some(candidate);
                break;
            }
        }

        if let Some(center) = placed {
            let size = random_int(rng, 1, 2) as u32;
            Chamber::new(center, size * 2, size * 2, ChamberShape::Diamond).carve(grid, rng);
            centers.push(center);
        }
    }

    if centers.is_empty() {
        return;
    }

    // Prim spanning tree over Manhattan distance
    let mut in_tree = vec![false; centers.len()];
    let mut closest: Vec<(u32, usize)> = centers
        .iter()
        .map(|c| (c.manhattan_distance(centers[0]), 0))
        .collect();
    in_tree[0] = true;
    let mut links: Vec<(usize, usize)> = Vec::new();
    for _ in 1..centers.len() {
        let next = (0..centers.len())
            .filter(|&i| !in_tree[i])
            .min_by_key(|&i| closest[i].0);
        let Some(next) = next else { break };
        in_tree[next] = true;
        links.push((closest[next].1, next));
        for i in 0..centers.len() {
            let distance = centers[i].manhattan_distance(centers[next]);
            if !in_tree[i] && distance < closest[i].0 {
                closest[i] = (distance, next);
            }
        }
    }

    for (from, to) in links {
        winding_tunnel(grid, centers[from], centers[to], TunnelStyle::narrow(0.8), rng);
    }

    // A few extra trails between clearings that are already close
    let max_trail = width.min(height) as u32 / 2;
    for _ in 0..(centers.len() / 4) {
        let a = centers[rng.gen_range(0..centers.len())];
        let b = centers[rng.gen_range(0..centers.len())];
        if a != b && a.manhattan_distance(b) < max_trail {
            winding_tunnel(grid, a, b, TunnelStyle::narrow(1.0), rng);
        }
    }
}

fn carve_village(grid: &mut Grid, rng: &mut StdRng) {
    let width = grid.width() as i32;
    let height = grid.height() as i32;
    let house_count = ((width * height) / 25).max(8);
    let mut houses: Vec<Chamber> = Vec::new();

    for _ in 0..house_count {
        let mut placed = None;
        for _ in 0..50 {
            let top_left = Position::new(
                random_int(rng, 2, width - 7),
                random_int(rng, 2, height - 7),
            );
            let house = Chamber::from_corner(
                top_left,
                random_int(rng, 3, 6) as u32,
                random_int(rng, 3, 6) as u32,
            );
            if !houses.iter().any(|h| house.near(h, 2)) {
                placed = Some(house);
                break;
            }
        }

        let Some(house) = placed else { continue };
        let tl = house.top_left();
        if tl.x + house.width as i32 >= width - 1 || tl.y + house.height as i32 >= height - 1 {
            continue;
        }
        house.carve(grid, rng);

        // Partition bigger houses with gapped internal walls
        if house.width >= 5 && house.height >= 5 {
            for _ in 0..random_int(rng, 1, 2) {
                if rng.gen_bool(0.5) {
                    let wall_x = tl.x + random_int(rng, 2, house.width as i32 - 3);
                    for dy in 1..(house.height as i32 - 1) {
                        if rng.gen_bool(0.7) {
                            grid.fill(Position::new(wall_x, tl.y + dy));
                        }
                    }
                }
                if rng.gen_bool(0.5) {
                    let wall_y = tl.y + random_int(rng, 2, house.height as i32 - 3);
                    for dx in 1..(house.width as i32 - 1) {
                        if rng.gen_bool(0.7) {
                            grid.fill(Position::new(tl.x + dx, wall_y));
                        }
                    }
                }
            }
        }
        houses.push(house);
    }

    let inside_house = |pos: Position, houses: &[Chamber]| houses.iter().any(|h| h.contains(pos));

    let street_count = (width.max(height) / 15).max(2);
    let vertical = street_count / 2;
    for i in 0..vertical {
        let street_x = (i + 1) * width / (vertical + 1);
        for y in 0..height {
            let pos = Position::new(street_x, y);
            if !inside_house(pos, &houses) {
                grid.carve(pos);
            }
        }
    }
    let horizontal = (street_count + 1) / 2;
    for i in 0..horizontal {
        let street_y = (i + 1) * height / (horizontal + 1);
        for x in 0..width {
            let pos = Position::new(x, street_y);
            if !inside_house(pos, &houses) {
                grid.carve(pos);
            }
        }
    }

    // Footpath from each house to the nearest street tile
    for house in &houses {
        let door = house.center;
        let nearest = grid
            .floor_positions()
            .filter(|&p| !inside_house(p, &houses))
            .min_by_key(|&p| p.manhattan_distance(door));
        if let Some(street) = nearest {
            winding_tunnel(grid, door, street, TunnelStyle::narrow(1.0), rng);
        }
    }
}

fn carve_spiral(grid: &mut Grid, rng: &mut StdRng) {
    let width = grid.width() as i32;
    let height = grid.height() as i32;
    let min_side = width.min(height) as f64;
    let center_count = (width.min(height) / 20).max(2);
    let mut centers: Vec<Position> = Vec::new();

    for _ in 0..center_count {
        let center = Position::new(
            (width as f64 * (0.2 + rng.gen::<f64>() * 0.6)) as i32,
            (height as f64 * (0.2 + rng.gen::<f64>() * 0.6)) as i32,
        );
        centers.push(center);

        let chamber_size = random_int(rng, 3, 5) as u32;
        Chamber::new(center, chamber_size * 2, chamber_size * 2, ChamberShape::Round)
            .carve(grid, rng);

        let arm_count = random_int(rng, 2, 4);
        for arm in 0..arm_count {
            let mut angle = (arm as f64 / arm_count as f64) * 2.0 * PI + rng.gen::<f64>() * 0.5;
            let turn = if rng.gen_bool(0.5) { 1.0 } else { -1.0 };
            let tightness = 0.05 + rng.gen::<f64>() * 0.05;
            let max_radius = min_side / 3.0;
            let mut radius = 2.0;

            while radius < max_radius {
                let pos = polar_to_grid(center, angle, radius);
                if grid.carve(pos) {
                    if rng.gen_bool(0.3) {
                        for neighbor in pos.cardinal_adjacent_positions() {
                            if rng.gen_bool(0.5) {
                                grid.carve(neighbor);
                            }
                        }
                    }

                    if radius > 5.0 && rng.gen_bool(0.08) {
                        carve_side_branch(grid, pos, angle, rng);
                    }
                }

                angle += turn * tightness;
                radius += 0.3;
            }
        }
    }

    for pair in centers.windows(2) {
        if pair[0].euclidean_distance(pair[1]) < min_side * 0.6 {
            winding_tunnel(grid, pair[0], pair[1], TunnelStyle::wide(0.8), rng);
        }
    }
}

/// Perpendicular offshoot from a spiral arm ending in a small chamber.
fn carve_side_branch(grid: &mut Grid, from: Position, arm_angle: f64, rng: &mut StdRng) {
    let side = if rng.gen_bool(0.5) { 1.0 } else { -1.0 };
    let angle = arm_angle + side * PI / 2.0;
    let length = random_int(rng, 2, 4);

    for d in 1..=length {
        let pos = polar_to_grid(from, angle, d as f64);
        if grid.carve(pos) && d == length {
            let size = random_int(rng, 1, 2) as u32;
            Chamber::new(pos, size * 2, size * 2, ChamberShape::Diamond).carve(grid, rng);
        }
    }
}

fn carve_circuit(grid: &mut Grid, rng: &mut StdRng) {
    let width = grid.width() as i32;
    let height = grid.height() as i32;
    let spacing = 8;
    let mut anchors: Vec<Position> = Vec::new();

    let mut y = spacing / 2;
    while y < height - spacing / 2 {
        let mut x = spacing / 2;
        while x < width - spacing / 2 {
            if rng.gen_bool(0.7) {
                let roll = rng.gen::<f64>();
                let (w, h) = if roll < 0.3 {
                    (random_int(rng, 4, 5), random_int(rng, 4, 5))
                } else if roll < 0.6 {
                    (random_int(rng, 2, 3), random_int(rng, 3, 5))
                } else {
                    (random_int(rng, 2, 3), random_int(rng, 2, 3))
                };
                let top_left = Position::new(x - w / 2, y - h / 2);
                if top_left.x >= 0
                    && top_left.y >= 0
                    && top_left.x + w < width
                    && top_left.y + h < height
                {
                    Chamber::from_corner(top_left, w as u32, h as u32).carve(grid, rng);
                    anchors.push(Position::new(x, y));
                }
            }
            x += spacing;
        }
        y += spacing;
    }

    if anchors.is_empty() {
        let center = center_of(grid);
        Chamber::new(center, 3, 3, ChamberShape::Rectangle).carve(grid, rng);
        anchors.push(center);
    }

    for i in 0..anchors.len() {
        let links = random_int(rng, 1, 3) as usize;
        for j in nearest_by_manhattan(&anchors, i).into_iter().take(links) {
            straight_trace(grid, anchors[i], anchors[j]);
        }
    }
}

//! Obstacle-aware navigation
//!
//! Obstacles are rasterized into a coarse occupancy grid, inflated by the
//! walker's clearance, and searched with A* (8-connected, no corner cutting).
//! Raw cell paths are then string-pulled into a short list of waypoints.

use std::cmp::Reverse;
use std::collections::BinaryHeap;

use glam::Vec2;
use serde::{Deserialize, Serialize};

use super::collision::{Rect, line_of_sight};
use super::map::{MapBounds, Obstacle};
use crate::consts::{NAV_CELL_SIZE, NAV_MAX_EXPANSIONS};

const STRAIGHT_COST: u32 = 10;
const DIAGONAL_COST: u32 = 14;

/// Grid cell coordinate
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Cell {
    pub column: u32,
    pub row: u32,
}

impl Cell {
    pub const fn new(column: u32, row: u32) -> Self {
        Self { column, row }
    }
}

/// Occupancy grid used for waypoint search
#[derive(Debug, Clone, Default)]
pub struct NavGrid {
    columns: u32,
    rows: u32,
    cell_size: f32,
    clearance: f32,
    blocked: Vec<bool>,
    obstacles: Vec<Obstacle>,
}

impl NavGrid {
    /// Rasterize `obstacles`, treating every cell within `clearance` of an
    /// obstacle as blocked.
    pub fn build(bounds: MapBounds, obstacles: &[Obstacle], clearance: f32) -> Self {
        let cell_size = NAV_CELL_SIZE;
        let columns = (bounds.width / cell_size).ceil().max(1.0) as u32;
        let rows = (bounds.height / cell_size).ceil().max(1.0) as u32;
        let inflated: Vec<Rect> = obstacles.iter().map(|o| o.rect().inflate(clearance)).collect();

        let mut blocked = vec![false; (columns * rows) as usize];
        for row in 0..rows {
            for column in 0..columns {
                let min = Vec2::new(column as f32, row as f32) * cell_size;
                let cell_rect = Rect::new(min, min + Vec2::splat(cell_size));
                let center = cell_rect.center();
                // Block cells whose center sits inside an inflated obstacle, plus
                // cells that truly overlap the raw obstacle footprint.
                blocked[(row * columns + column) as usize] = inflated
                    .iter()
                    .any(|r| r.contains(center))
                    || obstacles.iter().any(|o| o.rect().overlaps(&cell_rect));
            }
        }

        Self {
            columns,
            rows,
            cell_size,
            clearance,
            blocked,
            obstacles: obstacles.to_vec(),
        }
    }

    /// Cell containing a world point (clamped into the grid)
    pub fn cell_at(&self, point: Vec2) -> Option<Cell> {
        if self.columns == 0 || self.rows == 0 {
            return None;
        }
        let column = (point.x / self.cell_size).floor().clamp(0.0, (self.columns - 1) as f32) as u32;
        let row = (point.y / self.cell_size).floor().clamp(0.0, (self.rows - 1) as f32) as u32;
        Some(Cell::new(column, row))
    }

    pub fn cell_center(&self, cell: Cell) -> Vec2 {
        (Vec2::new(cell.column as f32, cell.row as f32) + Vec2::splat(0.5)) * self.cell_size
    }

    pub fn is_blocked(&self, cell: Cell) -> bool {
        self.index(cell).map(|i| self.blocked[i]).unwrap_or(true)
    }

    /// Waypoints from `start` to `goal`, excluding `start` and ending at `goal`.
    ///
    /// Returns `None` when no route exists or the search budget runs out;
    /// callers fall back to direct seeking.
    pub fn find_path(&self, start: Vec2, goal: Vec2) -> Option<Vec<Vec2>> {
        let start_cell = self.nearest_open(self.cell_at(start)?)?;
        let goal_cell = self.nearest_open(self.cell_at(goal)?)?;

        if start_cell == goal_cell {
            return Some(vec![goal]);
        }

        let cells = self.search(start_cell, goal_cell)?;
        let mut points: Vec<Vec2> = cells.iter().map(|&c| self.cell_center(c)).collect();
        // The final cell center is replaced by the exact goal
        points.pop();
        points.push(goal);

        Some(self.smooth(start, points))
    }

    fn search(&self, start: Cell, goal: Cell) -> Option<Vec<Cell>> {
        let len = self.blocked.len();
        let mut g_cost = vec![u32::MAX; len];
        let mut came_from: Vec<Option<usize>> = vec![None; len];
        let mut closed = vec![false; len];
        let mut open = BinaryHeap::new();

        let start_index = self.index(start)?;
        let goal_index = self.index(goal)?;
        g_cost[start_index] = 0;
        open.push(Reverse((heuristic(start, goal), start_index)));

        let mut expansions = 0;
        while let Some(Reverse((_, current_index))) = open.pop() {
            if current_index == goal_index {
                return Some(self.reconstruct(&came_from, goal_index));
            }
            if closed[current_index] {
                continue;
            }
            closed[current_index] = true;

            expansions += 1;
            if expansions > NAV_MAX_EXPANSIONS {
                log::debug!("A* budget exhausted between {:?} and {:?}", start, goal);
                return None;
            }

            let current = self.cell_of(current_index);
            for (neighbor, step) in self.neighbors(current) {
                let Some(neighbor_index) = self.index(neighbor) else {
                    continue;
                };
                if closed[neighbor_index] {
                    continue;
                }
                let tentative = g_cost[current_index].saturating_add(step);
                if tentative < g_cost[neighbor_index] {
                    g_cost[neighbor_index] = tentative;
                    came_from[neighbor_index] = Some(current_index);
                    open.push(Reverse((tentative + heuristic(neighbor, goal), neighbor_index)));
                }
            }
        }

        None
    }

    fn reconstruct(&self, came_from: &[Option<usize>], goal_index: usize) -> Vec<Cell> {
        let mut cells = vec![self.cell_of(goal_index)];
        let mut current = goal_index;
        while let Some(previous) = came_from[current] {
            cells.push(self.cell_of(previous));
            current = previous;
        }
        cells.reverse();
        // Drop the start cell; the walker is already there
        cells.remove(0);
        cells
    }

    /// Drop waypoints that can be skipped with a clear straight line
    fn smooth(&self, start: Vec2, points: Vec<Vec2>) -> Vec<Vec2> {
        let mut smoothed = Vec::with_capacity(points.len());
        let mut anchor = start;
        let mut i = 0;
        while i < points.len() {
            // Furthest point visible from the anchor
            let mut furthest = i;
            for j in (i + 1..points.len()).rev() {
                if line_of_sight(anchor, points[j], &self.obstacles, self.clearance) {
                    furthest = j;
                    break;
                }
            }
            smoothed.push(points[furthest]);
            anchor = points[furthest];
            i = furthest + 1;
        }
        smoothed
    }

    /// Closest unblocked cell within a small ring around `cell`
    fn nearest_open(&self, cell: Cell) -> Option<Cell> {
        if !self.is_blocked(cell) {
            return Some(cell);
        }
        for radius in 1..=3_i64 {
            for dy in -radius..=radius {
                for dx in -radius..=radius {
                    if dx.abs() != radius && dy.abs() != radius {
                        continue;
                    }
                    let column = i64::from(cell.column) + dx;
                    let row = i64::from(cell.row) + dy;
                    if column < 0 || row < 0 {
                        continue;
                    }
                    let candidate = Cell::new(column as u32, row as u32);
                    if self.index(candidate).is_some() && !self.is_blocked(candidate) {
                        return Some(candidate);
                    }
                }
            }
        }
        None
    }

    fn neighbors(&self, cell: Cell) -> impl Iterator<Item = (Cell, u32)> + '_ {
        const OFFSETS: [(i64, i64); 8] = [
            (0, -1),
            (1, 0),
            (0, 1),
            (-1, 0),
            (1, -1),
            (1, 1),
            (-1, 1),
            (-1, -1),
        ];
        OFFSETS.iter().filter_map(move |&(dx, dy)| {
            let column = i64::from(cell.column) + dx;
            let row = i64::from(cell.row) + dy;
            if column < 0 || row < 0 || column >= i64::from(self.columns) || row >= i64::from(self.rows) {
                return None;
            }
            let next = Cell::new(column as u32, row as u32);
            if self.is_blocked(next) {
                return None;
            }
            if dx != 0 && dy != 0 {
                // No squeezing diagonally between two blocked orthogonals
                let side_a = Cell::new(column as u32, cell.row);
                let side_b = Cell::new(cell.column, row as u32);
                if self.is_blocked(side_a) || self.is_blocked(side_b) {
                    return None;
                }
                return Some((next, DIAGONAL_COST));
            }
            Some((next, STRAIGHT_COST))
        })
    }

    fn index(&self, cell: Cell) -> Option<usize> {
        if cell.column >= self.columns || cell.row >= self.rows {
            return None;
        }
        Some((cell.row * self.columns + cell.column) as usize)
    }

    fn cell_of(&self, index: usize) -> Cell {
        let index = index as u32;
        Cell::new(index % self.columns, index / self.columns)
    }
}

/// Octile distance in integer cost units
fn heuristic(a: Cell, b: Cell) -> u32 {
    let dx = a.column.abs_diff(b.column);
    let dy = a.row.abs_diff(b.row);
    STRAIGHT_COST * dx.max(dy) + (DIAGONAL_COST - STRAIGHT_COST) * dx.min(dy)
}

/// Waypoint cache owned by a creature
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PathCache {
    pub waypoints: Vec<Vec2>,
    pub index: usize,
    /// Simulation time of the last recompute (seconds)
    pub computed_at: Option<f64>,
    /// Target position the path was computed for
    pub target: Option<Vec2>,
}

impl PathCache {
    /// Force a recompute on next use
    pub fn invalidate(&mut self) {
        self.waypoints.clear();
        self.index = 0;
        self.computed_at = None;
        self.target = None;
    }

    pub fn is_active(&self) -> bool {
        self.index < self.waypoints.len()
    }

    /// Whether the cache must be rebuilt for `target` at time `now`
    pub fn needs_recompute(&self, now: f64, target: Vec2, stale_secs: f32, retarget_distance: f32) -> bool {
        let Some(computed_at) = self.computed_at else {
            return true;
        };
        if now - computed_at > f64::from(stale_secs) {
            return true;
        }
        match self.target {
            Some(cached) => cached.distance(target) > retarget_distance,
            None => true,
        }
    }

    /// Store a fresh path (an empty path records a failed search)
    pub fn store(&mut self, waypoints: Vec<Vec2>, now: f64, target: Vec2) {
        self.waypoints = waypoints;
        self.index = 0;
        self.computed_at = Some(now);
        self.target = Some(target);
    }

    /// Current waypoint, advancing past any already within `reach` of `pos`
    pub fn next_waypoint(&mut self, pos: Vec2, reach: f32) -> Option<Vec2> {
        while let Some(&waypoint) = self.waypoints.get(self.index) {
            if pos.distance(waypoint) > reach {
                return Some(waypoint);
            }
            self.index += 1;
        }
        None
    }
}

//! Axis-aligned collision geometry
//!
//! Everything in the arena collides as an AABB: obstacles are rectangles,
//! creatures are sprite-sized boxes, and circular bodies (player, bolts) are
//! approximated by the square that bounds them.

use glam::Vec2;
use serde::{Deserialize, Serialize};

use super::map::Obstacle;

/// Axis-aligned bounding box
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Rect {
    pub min: Vec2,
    pub max: Vec2,
}

impl Rect {
    pub fn new(min: Vec2, max: Vec2) -> Self {
        Self { min, max }
    }

    /// Box centered on `center` extending `half` on each axis
    pub fn from_center(center: Vec2, half: Vec2) -> Self {
        Self {
            min: center - half,
            max: center + half,
        }
    }

    pub fn center(&self) -> Vec2 {
        (self.min + self.max) * 0.5
    }

    /// Grow the box by `amount` on every side
    pub fn inflate(&self, amount: f32) -> Self {
        Self {
            min: self.min - Vec2::splat(amount),
            max: self.max + Vec2::splat(amount),
        }
    }

    /// Strict overlap; touching edges do not count
    #[inline]
    pub fn overlaps(&self, other: &Rect) -> bool {
        self.min.x < other.max.x
            && self.max.x > other.min.x
            && self.min.y < other.max.y
            && self.max.y > other.min.y
    }

    pub fn contains(&self, point: Vec2) -> bool {
        point.x >= self.min.x && point.x <= self.max.x && point.y >= self.min.y && point.y <= self.max.y
    }

    /// Whether the segment `a → b` passes through the box (slab test)
    pub fn intersects_segment(&self, a: Vec2, b: Vec2) -> bool {
        let d = b - a;
        let mut t_min = 0.0_f32;
        let mut t_max = 1.0_f32;

        for axis in 0..2 {
            let (origin, delta, lo, hi) = if axis == 0 {
                (a.x, d.x, self.min.x, self.max.x)
            } else {
                (a.y, d.y, self.min.y, self.max.y)
            };

            if delta.abs() < f32::EPSILON {
                // Parallel: must already be inside the slab
                if origin <= lo || origin >= hi {
                    return false;
                }
                continue;
            }

            let inv = 1.0 / delta;
            let mut t0 = (lo - origin) * inv;
            let mut t1 = (hi - origin) * inv;
            if t0 > t1 {
                std::mem::swap(&mut t0, &mut t1);
            }
            t_min = t_min.max(t0);
            t_max = t_max.min(t1);
            if t_min >= t_max {
                return false;
            }
        }

        true
    }
}

/// Whether `rect` overlaps any obstacle
pub fn overlaps_any(rect: &Rect, obstacles: &[Obstacle]) -> bool {
    obstacles.iter().any(|o| o.rect().overlaps(rect))
}

/// Unobstructed straight line between two points.
///
/// `clearance` inflates every obstacle so a body of that half-size can
/// travel the segment without clipping a corner.
pub fn line_of_sight(from: Vec2, to: Vec2, obstacles: &[Obstacle], clearance: f32) -> bool {
    obstacles
        .iter()
        .all(|o| !o.rect().inflate(clearance).intersects_segment(from, to))
}

/// Result of moving a box one axis at a time
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AxisMove {
    pub pos: Vec2,
    pub blocked_x: bool,
    pub blocked_y: bool,
}

impl AxisMove {
    pub fn blocked_both(&self) -> bool {
        self.blocked_x && self.blocked_y
    }
}

/// Apply `delta` to a box one axis at a time, reverting any axis whose move
/// lands inside an obstacle.
///
/// The Y step is tested from the already-resolved X position, so a blocked X
/// never leaks into the Y test and diagonal motion cannot clip wall corners.
pub fn move_with_collisions(pos: Vec2, half: Vec2, delta: Vec2, obstacles: &[Obstacle]) -> AxisMove {
    let mut next = pos;

    next.x += delta.x;
    let blocked_x = overlaps_any(&Rect::from_center(next, half), obstacles);
    if blocked_x {
        next.x = pos.x;
    }

    next.y += delta.y;
    let blocked_y = overlaps_any(&Rect::from_center(next, half), obstacles);
    if blocked_y {
        next.y = pos.y;
    }

    AxisMove {
        pos: next,
        blocked_x,
        blocked_y,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn wall() -> Vec<Obstacle> {
        vec![Obstacle::new(100.0, 0.0, 20.0, 200.0)]
    }

    #[test]
    fn test_rect_overlap_excludes_touching() {
        let a = Rect::new(Vec2::ZERO, Vec2::splat(10.0));
        let b = Rect::new(Vec2::new(10.0, 0.0), Vec2::new(20.0, 10.0));
        let c = Rect::new(Vec2::new(9.0, 9.0), Vec2::splat(20.0));
        assert!(!a.overlaps(&b));
        assert!(a.overlaps(&c));
    }

    #[test]
    fn test_segment_through_box() {
        let r = Rect::new(Vec2::new(10.0, 10.0), Vec2::new(20.0, 20.0));
        assert!(r.intersects_segment(Vec2::new(0.0, 15.0), Vec2::new(30.0, 15.0)));
        assert!(r.intersects_segment(Vec2::ZERO, Vec2::splat(30.0)));
        assert!(!r.intersects_segment(Vec2::ZERO, Vec2::new(30.0, 5.0)));
        // Stops short of the box
        assert!(!r.intersects_segment(Vec2::new(0.0, 15.0), Vec2::new(9.0, 15.0)));
    }

    #[test]
    fn test_vertical_segment_parallel_to_slab() {
        let r = Rect::new(Vec2::new(10.0, 10.0), Vec2::new(20.0, 20.0));
        assert!(r.intersects_segment(Vec2::new(15.0, 0.0), Vec2::new(15.0, 30.0)));
        assert!(!r.intersects_segment(Vec2::new(25.0, 0.0), Vec2::new(25.0, 30.0)));
    }

    #[test]
    fn test_line_of_sight_blocked_by_wall() {
        let obstacles = wall();
        assert!(!line_of_sight(Vec2::new(50.0, 100.0), Vec2::new(200.0, 100.0), &obstacles, 0.0));
        assert!(line_of_sight(Vec2::new(50.0, 100.0), Vec2::new(50.0, 190.0), &obstacles, 0.0));
        // Grazing past the end of the wall is blocked once clearance is applied
        assert!(line_of_sight(Vec2::new(50.0, 205.0), Vec2::new(200.0, 205.0), &obstacles, 0.0));
        assert!(!line_of_sight(Vec2::new(50.0, 205.0), Vec2::new(200.0, 205.0), &obstacles, 10.0));
    }

    #[test]
    fn test_move_reverts_blocked_axis_only() {
        let obstacles = wall();
        let result = move_with_collisions(
            Vec2::new(85.0, 100.0),
            Vec2::splat(10.0),
            Vec2::new(10.0, 5.0),
            &obstacles,
        );
        assert!(result.blocked_x);
        assert!(!result.blocked_y);
        assert_eq!(result.pos, Vec2::new(85.0, 105.0));
    }

    #[test]
    fn test_move_blocked_both_axes_in_corner() {
        let obstacles = vec![
            Obstacle::new(100.0, 0.0, 20.0, 200.0),
            Obstacle::new(0.0, 100.0, 100.0, 20.0),
        ];
        let start = Vec2::new(85.0, 85.0);
        let result = move_with_collisions(start, Vec2::splat(10.0), Vec2::splat(10.0), &obstacles);
        assert!(result.blocked_both());
        assert_eq!(result.pos, start);
    }
}

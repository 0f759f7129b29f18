//! Steering behaviors
//!
//! Each behavior returns a desired-velocity contribution; a creature sums its
//! contributions and rescales the result to its own speed.

use glam::Vec2;

/// Full-speed velocity toward `target`
#[inline]
pub fn seek(pos: Vec2, target: Vec2, speed: f32) -> Vec2 {
    (target - pos).normalize_or_zero() * speed
}

/// Full-speed velocity away from `threat`
#[inline]
pub fn flee(pos: Vec2, threat: Vec2, speed: f32) -> Vec2 {
    -seek(pos, threat, speed)
}

/// Push away from neighbors closer than `radius`, weighted by inverse distance.
///
/// Each neighbor contributes `radius / dist` along the away direction, so a
/// neighbor at the edge of the radius weighs about as much as a unit seek.
/// Neighbors sitting exactly on `pos` are skipped; the pairwise separation
/// pass resolves those.
pub fn separation(pos: Vec2, neighbors: impl IntoIterator<Item = Vec2>, radius: f32) -> Vec2 {
    let mut force = Vec2::ZERO;
    for other in neighbors {
        let away = pos - other;
        let dist = away.length();
        if dist > 0.0 && dist < radius {
            force += away / dist * (radius / dist);
        }
    }
    force
}

/// Sum of weighted contributions, rescaled to `speed` (or zero)
pub fn combine(contributions: &[(Vec2, f32)], speed: f32) -> Vec2 {
    let sum: Vec2 = contributions.iter().map(|&(v, w)| v * w).sum();
    sum.normalize_or_zero() * speed
}

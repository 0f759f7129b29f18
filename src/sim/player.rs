//! Player controller
//!
//! Fixed-speed movement from a 4-direction intent, per-axis obstacle
//! collision, facing/animation, and volley firing.

use glam::Vec2;
use serde::{Deserialize, Serialize};

use super::collision::move_with_collisions;
use super::map::{MapBounds, Obstacle};
use super::state::{Facing, Player, Projectile};
use crate::tuning::Tuning;
use crate::{direction_or, rotate};

/// Currently pressed movement directions
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct MoveIntent {
    pub up: bool,
    pub down: bool,
    pub left: bool,
    pub right: bool,
}

impl MoveIntent {
    /// Raw direction in screen coordinates (y grows downward)
    pub fn raw(&self) -> Vec2 {
        let axis = |neg: bool, pos: bool| f32::from(u8::from(pos)) - f32::from(u8::from(neg));
        Vec2::new(axis(self.left, self.right), axis(self.up, self.down))
    }
}

/// Advance the player one tick
pub fn update(player: &mut Player, intent: &MoveIntent, obstacles: &[Obstacle], bounds: MapBounds, tuning: &Tuning) {
    // Normalizing keeps diagonal speed equal to axis speed
    let dir = intent.raw().normalize_or_zero();
    let moving = dir != Vec2::ZERO;

    if moving {
        player.last_move_dir = dir;
        if let Some(facing) = Facing::from_motion(dir) {
            player.facing = facing;
        }
    }
    player.walk.step(moving, tuning.player.walk_frame_ticks);

    let moved = move_with_collisions(player.pos, player.half_extent(), dir * player.speed, obstacles);
    player.pos = bounds.clamp(moved.pos, player.half_extent());
}

/// Fire a volley if the fire interval has elapsed.
///
/// Aims along `aim` when given, otherwise along the last movement direction.
pub fn fire(player: &mut Player, aim: Option<Vec2>, now: f64, tuning: &Tuning) -> Vec<Projectile> {
    let upgrades = &player.upgrades;
    let interval = upgrades.fire_interval(&tuning.player, &tuning.upgrades);
    if player
        .last_shot_at
        .is_some_and(|at| now - at < f64::from(interval))
    {
        return Vec::new();
    }

    let dir = direction_or(aim.unwrap_or(player.last_move_dir), player.last_move_dir);
    let count = upgrades.projectile_count();
    let spread = upgrades.volley_spread(&tuning.player, &tuning.upgrades);
    let radius = upgrades.bolt_radius(&tuning.player, &tuning.upgrades);
    let center = (count as f32 - 1.0) * 0.5;

    let volley = (0..count)
        .map(|i| {
            let angle = (i as f32 - center) * spread;
            Projectile::player_bolt(
                player.pos,
                rotate(dir, angle),
                tuning.player.bolt_speed,
                radius,
                tuning.player.bolt_range,
            )
        })
        .collect();

    player.last_shot_at = Some(now);
    volley
}

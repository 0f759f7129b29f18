//! Creature AI
//!
//! Chasers seek the player; casters hold a distance band and shoot when they
//! have a clear line. Both blend in separation from nearby creatures and fall
//! back to cached A* waypoints whenever the straight line to the player is
//! blocked. After steering, a pairwise pass pushes overlapping sprites apart.

use glam::Vec2;
use rand::Rng;

use super::collision::{Rect, line_of_sight, move_with_collisions, overlaps_any};
use super::map::{MapBounds, Obstacle};
use super::pathfinding::NavGrid;
use super::state::{Behavior, CasterState, Creature, Facing, Projectile};
use super::steering;
use crate::tuning::CreatureTuning;

/// Read-only world view for one AI pass
pub struct AiContext<'a> {
    pub player_pos: Vec2,
    pub obstacles: &'a [Obstacle],
    pub nav: &'a NavGrid,
    pub bounds: MapBounds,
    /// Simulation clock (seconds)
    pub now: f64,
    pub tuning: &'a CreatureTuning,
}

/// Steer, move and (for casters) attack with every creature, then run the
/// separation pass. Hostile bolts are appended to `projectiles`.
pub fn update_all<R: Rng>(
    creatures: &mut [Creature],
    ctx: &AiContext<'_>,
    projectiles: &mut Vec<Projectile>,
    rng: &mut R,
) {
    // Neighbor positions as of the start of the tick
    let positions: Vec<Vec2> = creatures.iter().map(|c| c.pos).collect();

    for (i, creature) in creatures.iter_mut().enumerate() {
        let neighbors = positions
            .iter()
            .enumerate()
            .filter(|&(j, _)| j != i)
            .map(|(_, &p)| p);
        let separation = steering::separation(creature.pos, neighbors, ctx.tuning.separation_radius);

        let behavior = creature.behavior;
        let desired = match behavior {
            Behavior::Chaser => {
                let approach = approach_dir(creature, ctx);
                steering::combine(
                    &[(approach, 1.0), (separation, ctx.tuning.separation_weight)],
                    creature.speed,
                )
            }
            Behavior::Caster(mut caster) => {
                let desired = caster_steering(creature, ctx, separation);
                if let Some(bolt) = try_cast(creature.pos, &mut caster, ctx) {
                    projectiles.push(bolt);
                }
                creature.behavior = Behavior::Caster(caster);
                desired
            }
        };

        integrate(creature, desired, ctx);
    }

    separate_overlaps(creatures, ctx.obstacles, ctx.bounds, rng);
}

/// Unit direction toward the player, via cached waypoints when the straight
/// line is blocked. Degrades to direct seeking if no route exists.
fn approach_dir(creature: &mut Creature, ctx: &AiContext<'_>) -> Vec2 {
    let target = ctx.player_pos;
    let clearance = creature.half_extent().max_element();

    if line_of_sight(creature.pos, target, ctx.obstacles, clearance) {
        if creature.path.computed_at.is_some() {
            creature.path.invalidate();
        }
        return steering::seek(creature.pos, target, 1.0);
    }

    let tuning = ctx.tuning;
    if creature
        .path
        .needs_recompute(ctx.now, target, tuning.path_stale_secs, tuning.path_retarget_distance)
    {
        let waypoints = ctx.nav.find_path(creature.pos, target).unwrap_or_else(|| {
            log::debug!("creature {} has no route to the player; seeking directly", creature.id);
            Vec::new()
        });
        creature.path.store(waypoints, ctx.now, target);
    }

    match creature.path.next_waypoint(creature.pos, tuning.waypoint_reach) {
        Some(waypoint) => steering::seek(creature.pos, waypoint, 1.0),
        None => steering::seek(creature.pos, target, 1.0),
    }
}

/// Flee inside the band, approach outside it, hold within it
fn caster_steering(creature: &mut Creature, ctx: &AiContext<'_>, separation: Vec2) -> Vec2 {
    let dist = creature.pos.distance(ctx.player_pos);
    let tuning = ctx.tuning;

    let intent = if dist < tuning.caster_min_distance {
        steering::flee(creature.pos, ctx.player_pos, 1.0)
    } else if dist > tuning.caster_max_distance {
        approach_dir(creature, ctx)
    } else {
        Vec2::ZERO
    };

    steering::combine(
        &[(intent, 1.0), (separation, tuning.separation_weight)],
        creature.speed,
    )
}

/// Bolt aimed at the player when in range, in sight, and off cooldown
fn try_cast(pos: Vec2, caster: &mut CasterState, ctx: &AiContext<'_>) -> Option<Projectile> {
    let tuning = ctx.tuning;
    if pos.distance(ctx.player_pos) > tuning.caster_attack_range
        || !caster.ready(ctx.now)
        || !line_of_sight(pos, ctx.player_pos, ctx.obstacles, 0.0)
    {
        return None;
    }

    caster.last_cast_at = Some(ctx.now);
    Some(Projectile::hostile_bolt(
        pos,
        ctx.player_pos,
        caster.bolt_speed,
        tuning.bolt_radius,
        caster.piercing,
    ))
}

/// Move by `velocity` with per-axis obstacle reverts; facing and animation
/// follow the displacement actually achieved.
fn integrate(creature: &mut Creature, velocity: Vec2, ctx: &AiContext<'_>) {
    let half = creature.half_extent();
    let moved = move_with_collisions(creature.pos, half, velocity, ctx.obstacles);
    if moved.blocked_both() {
        creature.path.invalidate();
    }

    let next = ctx.bounds.clamp(moved.pos, half);
    let displacement = next - creature.pos;
    if let Some(facing) = Facing::from_motion(displacement) {
        creature.facing = facing;
    }
    creature
        .walk
        .step(displacement != Vec2::ZERO, ctx.tuning.walk_frame_ticks);
    creature.pos = next;
}

/// Push every overlapping pair apart along the center-to-center axis.
///
/// A push that would land a creature inside an obstacle is dropped for that
/// creature. Pushed creatures are re-clamped and lose their cached path.
pub fn separate_overlaps<R: Rng>(creatures: &mut [Creature], obstacles: &[Obstacle], bounds: MapBounds, rng: &mut R) {
    let count = creatures.len();
    let mut pushed = vec![false; count];

    for i in 0..count {
        for j in (i + 1)..count {
            let (head, tail) = creatures.split_at_mut(j);
            let a = &mut head[i];
            let b = &mut tail[0];

            let Some(depth) = overlap_depth(&a.rect(), &b.rect()) else {
                continue;
            };

            let mut axis = (b.pos - a.pos).normalize_or_zero();
            if axis == Vec2::ZERO {
                let angle = rng.random_range(0.0..std::f32::consts::TAU);
                axis = Vec2::from_angle(angle);
            }
            let nudge = axis * (depth * 0.5);

            pushed[i] |= nudge_clear(a, -nudge, obstacles, bounds);
            pushed[j] |= nudge_clear(b, nudge, obstacles, bounds);
        }
    }

    for (creature, _) in creatures.iter_mut().zip(&pushed).filter(|(_, p)| **p) {
        creature.path.invalidate();
    }
}

/// Shallowest axis penetration of two overlapping boxes
fn overlap_depth(a: &Rect, b: &Rect) -> Option<f32> {
    if !a.overlaps(b) {
        return None;
    }
    let x = (a.max.x.min(b.max.x) - a.min.x.max(b.min.x)).max(0.0);
    let y = (a.max.y.min(b.max.y) - a.min.y.max(b.min.y)).max(0.0);
    Some(x.min(y))
}

fn nudge_clear(creature: &mut Creature, delta: Vec2, obstacles: &[Obstacle], bounds: MapBounds) -> bool {
    let half = creature.half_extent();
    let target = bounds.clamp(creature.pos + delta, half);
    if target == creature.pos || overlaps_any(&Rect::from_center(target, half), obstacles) {
        return false;
    }
    creature.pos = target;
    true
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sim::pathfinding::PathCache;
    use crate::sim::state::{CreatureKind, ProjectileKind, WalkCycle};
    use crate::tuning::Tuning;
    use rand::SeedableRng;
    use rand_pcg::Pcg32;

    fn creature(id: u32, pos: Vec2, behavior: Behavior) -> Creature {
        Creature {
            id,
            pos,
            size: Vec2::splat(40.0),
            speed: 2.0,
            health: 30.0,
            max_health: 30.0,
            behavior,
            facing: Facing::Down,
            walk: WalkCycle::default(),
            path: PathCache::default(),
        }
    }

    fn caster() -> Behavior {
        Behavior::Caster(CasterState {
            cooldown_secs: 1.0,
            bolt_speed: 5.0,
            piercing: false,
            last_cast_at: None,
        })
    }

    fn run(creatures: &mut [Creature], player: Vec2, obstacles: &[Obstacle], now: f64) -> Vec<Projectile> {
        let tuning = Tuning::default();
        let bounds = MapBounds::default();
        let nav = NavGrid::build(bounds, obstacles, 22.0);
        let ctx = AiContext {
            player_pos: player,
            obstacles,
            nav: &nav,
            bounds,
            now,
            tuning: &tuning.creature,
        };
        let mut projectiles = Vec::new();
        let mut rng = Pcg32::seed_from_u64(1);
        update_all(creatures, &ctx, &mut projectiles, &mut rng);
        projectiles
    }

    #[test]
    fn test_chaser_closes_distance() {
        let player = Vec2::new(800.0, 500.0);
        let mut creatures = vec![creature(1, Vec2::new(400.0, 500.0), Behavior::Chaser)];
        run(&mut creatures, player, &[], 0.0);
        assert!((creatures[0].pos.x - 402.0).abs() < 1e-4);
        assert_eq!(creatures[0].facing, Facing::Right);
        assert_eq!(creatures[0].kind(), CreatureKind::Normal);
    }

    #[test]
    fn test_chaser_paths_around_wall() {
        let wall = [Obstacle::new(580.0, 200.0, 40.0, 600.0)];
        let player = Vec2::new(800.0, 500.0);
        let mut creatures = vec![creature(1, Vec2::new(400.0, 500.0), Behavior::Chaser)];
        run(&mut creatures, player, &wall, 0.0);

        let path = &creatures[0].path;
        assert!(path.computed_at.is_some());
        assert!(path.is_active());
        // Heading for a detour, not straight into the wall
        assert!((creatures[0].pos.y - 500.0).abs() > 0.5);
    }

    #[test]
    fn test_no_route_falls_back_to_direct_seek() {
        // Full-height wall: the player is unreachable
        let wall = [Obstacle::new(580.0, 0.0, 40.0, 1500.0)];
        let player = Vec2::new(800.0, 500.0);
        let mut creatures = vec![creature(1, Vec2::new(400.0, 500.0), Behavior::Chaser)];
        run(&mut creatures, player, &wall, 0.0);

        let c = &creatures[0];
        assert!(c.path.computed_at.is_some());
        assert!(!c.path.is_active());
        assert!((c.pos.x - 402.0).abs() < 1e-4);
        assert_eq!(c.pos.y, 500.0);
    }

    #[test]
    fn test_blocked_on_both_axes_invalidates_path() {
        let walls = [
            Obstacle::new(421.0, 300.0, 40.0, 400.0),
            Obstacle::new(200.0, 521.0, 260.0, 40.0),
        ];
        let mut c = creature(1, Vec2::new(400.0, 500.0), Behavior::Chaser);
        c.path.store(vec![Vec2::new(900.0, 900.0)], 0.0, Vec2::new(900.0, 900.0));
        let tuning = Tuning::default();
        let nav = NavGrid::default();
        let ctx = AiContext {
            player_pos: Vec2::new(900.0, 900.0),
            obstacles: &walls,
            nav: &nav,
            bounds: MapBounds::default(),
            now: 0.1,
            tuning: &tuning.creature,
        };
        integrate(&mut c, Vec2::new(2.0, 2.0), &ctx);
        assert_eq!(c.pos, Vec2::new(400.0, 500.0));
        assert!(c.path.computed_at.is_none());
        assert_eq!(c.walk.frame, 0);
    }

    #[test]
    fn test_caster_flees_when_too_close() {
        let player = Vec2::new(500.0, 500.0);
        let mut creatures = vec![creature(1, Vec2::new(400.0, 500.0), caster())];
        run(&mut creatures, player, &[], 0.0);
        assert!(creatures[0].pos.x < 400.0);
    }

    #[test]
    fn test_caster_holds_inside_band_and_fires() {
        let player = Vec2::new(650.0, 500.0);
        let mut creatures = vec![creature(1, Vec2::new(400.0, 500.0), caster())];
        let bolts = run(&mut creatures, player, &[], 0.0);
        assert_eq!(creatures[0].pos, Vec2::new(400.0, 500.0));
        assert_eq!(bolts.len(), 1);
        assert_eq!(bolts[0].kind, ProjectileKind::HostileBolt);
        assert!(bolts[0].vel.x > 0.0);

        // Still cooling down on the next tick
        let bolts = run(&mut creatures, player, &[], 0.5);
        assert!(bolts.is_empty());
        let bolts = run(&mut creatures, player, &[], 1.0);
        assert_eq!(bolts.len(), 1);
    }

    #[test]
    fn test_caster_needs_line_of_sight() {
        let wall = [Obstacle::new(500.0, 300.0, 40.0, 400.0)];
        let player = Vec2::new(650.0, 500.0);
        let mut creatures = vec![creature(1, Vec2::new(400.0, 500.0), caster())];
        let bolts = run(&mut creatures, player, &wall, 0.0);
        assert!(bolts.is_empty());
    }

    #[test]
    fn test_separation_pass_splits_overlap() {
        let mut creatures = vec![
            creature(1, Vec2::new(500.0, 500.0), Behavior::Chaser),
            creature(2, Vec2::new(520.0, 500.0), Behavior::Chaser),
        ];
        creatures[0].path.store(vec![Vec2::ZERO], 0.0, Vec2::ZERO);
        let mut rng = Pcg32::seed_from_u64(3);
        separate_overlaps(&mut creatures, &[], MapBounds::default(), &mut rng);
        assert_eq!(creatures[0].pos, Vec2::new(490.0, 500.0));
        assert_eq!(creatures[1].pos, Vec2::new(530.0, 500.0));
        assert!(creatures[0].path.computed_at.is_none());
    }

    #[test]
    fn test_separation_pass_coincident_centers() {
        let mut creatures = vec![
            creature(1, Vec2::new(500.0, 500.0), Behavior::Chaser),
            creature(2, Vec2::new(500.0, 500.0), Behavior::Chaser),
        ];
        let mut rng = Pcg32::seed_from_u64(9);
        separate_overlaps(&mut creatures, &[], MapBounds::default(), &mut rng);
        assert_ne!(creatures[0].pos, creatures[1].pos);
    }

    #[test]
    fn test_separation_never_pushes_into_obstacle() {
        let wall = [Obstacle::new(460.0, 400.0, 20.0, 200.0)];
        let mut creatures = vec![
            creature(1, Vec2::new(500.0, 500.0), Behavior::Chaser),
            creature(2, Vec2::new(520.0, 500.0), Behavior::Chaser),
        ];
        let mut rng = Pcg32::seed_from_u64(3);
        separate_overlaps(&mut creatures, &wall, MapBounds::default(), &mut rng);
        assert_eq!(creatures[0].pos, Vec2::new(500.0, 500.0));
        assert_eq!(creatures[1].pos, Vec2::new(530.0, 500.0));
    }
}

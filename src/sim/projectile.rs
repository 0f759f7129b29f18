//! Projectile integration and pruning

use super::collision::overlaps_any;
use super::map::{MapBounds, Obstacle};
use super::state::{Projectile, ProjectileKind};

/// Why a projectile left play during integration
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Expiry {
    OutOfRange,
    OutOfBounds,
    HitObstacle,
}

/// Move every projectile one tick and drop expired ones
pub fn advance(projectiles: &mut Vec<Projectile>, obstacles: &[Obstacle], bounds: MapBounds) {
    projectiles.retain_mut(|projectile| {
        projectile.pos += projectile.vel;
        expiry(projectile, obstacles, bounds).is_none()
    });
}

/// Removal checks, in order: travel range, map bounds, obstacles
pub fn expiry(projectile: &Projectile, obstacles: &[Obstacle], bounds: MapBounds) -> Option<Expiry> {
    if let ProjectileKind::PlayerBolt { limit: Some(limit) } = projectile.kind {
        if projectile.pos.distance(limit.origin) > limit.max_distance {
            return Some(Expiry::OutOfRange);
        }
    }
    if !bounds.contains(projectile.pos) {
        return Some(Expiry::OutOfBounds);
    }
    if !projectile.pierces_obstacles() && overlaps_any(&projectile.rect(), obstacles) {
        return Some(Expiry::HitObstacle);
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;
    use glam::Vec2;

    #[test]
    fn test_linear_integration() {
        let mut projectiles = vec![Projectile::hostile_bolt(Vec2::splat(100.0), Vec2::new(200.0, 100.0), 5.0, 4.0, false)];
        advance(&mut projectiles, &[], MapBounds::default());
        assert_eq!(projectiles[0].pos, Vec2::new(105.0, 100.0));
    }

    #[test]
    fn test_player_bolt_expires_after_range() {
        let mut projectiles = vec![Projectile::player_bolt(Vec2::splat(100.0), Vec2::X, 10.0, 4.0, 25.0)];
        advance(&mut projectiles, &[], MapBounds::default());
        advance(&mut projectiles, &[], MapBounds::default());
        assert_eq!(projectiles.len(), 1);
        advance(&mut projectiles, &[], MapBounds::default());
        assert!(projectiles.is_empty());
    }

    #[test]
    fn test_unlimited_player_bolt_ignores_range() {
        let mut bolt = Projectile::player_bolt(Vec2::splat(100.0), Vec2::X, 10.0, 4.0, 5.0);
        bolt.kind = ProjectileKind::PlayerBolt { limit: None };
        let mut projectiles = vec![bolt];
        for _ in 0..10 {
            advance(&mut projectiles, &[], MapBounds::default());
        }
        assert_eq!(projectiles.len(), 1);
    }

    #[test]
    fn test_leaving_map_removes() {
        let mut projectiles = vec![Projectile::hostile_bolt(Vec2::new(3.0, 100.0), Vec2::new(0.0, 100.0), 5.0, 4.0, true)];
        advance(&mut projectiles, &[], MapBounds::default());
        assert!(projectiles.is_empty());
    }

    #[test]
    fn test_obstacles_stop_only_non_piercing() {
        let wall = [Obstacle::new(110.0, 0.0, 20.0, 300.0)];
        let mut projectiles = vec![
            Projectile::hostile_bolt(Vec2::splat(100.0), Vec2::new(200.0, 100.0), 8.0, 4.0, false),
            Projectile::hostile_bolt(Vec2::splat(100.0), Vec2::new(200.0, 100.0), 8.0, 4.0, true),
        ];
        advance(&mut projectiles, &wall, MapBounds::default());
        assert_eq!(projectiles.len(), 1);
        assert!(projectiles[0].pierces_obstacles());
    }

    #[test]
    fn test_range_checked_before_bounds() {
        let bolt = Projectile::player_bolt(Vec2::new(5.0, 100.0), Vec2::NEG_X, 10.0, 4.0, 1.0);
        let mut moved = bolt.clone();
        moved.pos += moved.vel;
        assert_eq!(expiry(&moved, &[], MapBounds::default()), Some(Expiry::OutOfRange));
    }
}

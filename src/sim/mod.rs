//! Deterministic simulation module
//!
//! All gameplay logic lives here. This module must be pure and deterministic:
//! - Fixed timestep only
//! - Seeded RNG only
//! - Stable iteration order (spawn order)
//! - No rendering or platform dependencies

pub mod collision;
pub mod combat;
pub mod creature;
pub mod events;
pub mod map;
pub mod pathfinding;
pub mod player;
pub mod projectile;
pub mod state;
pub mod steering;
pub mod tick;
pub mod upgrades;
pub mod wave;

pub use collision::{AxisMove, Rect, line_of_sight, move_with_collisions};
pub use events::GameEvent;
pub use map::{MapBounds, MapLayout, Obstacle, layout_for_wave, tier_for_wave};
pub use pathfinding::{NavGrid, PathCache};
pub use player::MoveIntent;
pub use state::{
    Behavior, CasterState, Creature, CreatureKind, Facing, GameState, Player, Projectile, ProjectileKind,
    WavePhase, WaveState,
};
pub use tick::{TickInput, purchase_upgrade, tick};
pub use upgrades::{UpgradeError, UpgradeKind, Upgrades};

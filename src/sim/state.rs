//! Game state and core simulation types
//!
//! `GameState` is the single aggregate root; one tick call owns it exclusively.

use glam::Vec2;
use rand::SeedableRng;
use rand_pcg::Pcg32;
use serde::{Deserialize, Serialize};

use super::collision::Rect;
use super::map::{MapBounds, Obstacle, layout_for_tier};
use super::pathfinding::{NavGrid, PathCache};
use super::upgrades::Upgrades;
use crate::consts::SIM_DT;
use crate::tuning::Tuning;

/// Sprite-agnostic facing, picked from the dominant movement axis
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum Facing {
    Up,
    #[default]
    Down,
    Left,
    Right,
}

impl Facing {
    /// Facing for a displacement; `None` when not moving
    pub fn from_motion(delta: Vec2) -> Option<Self> {
        if delta == Vec2::ZERO {
            return None;
        }
        Some(if delta.x.abs() > delta.y.abs() {
            if delta.x > 0.0 { Facing::Right } else { Facing::Left }
        } else if delta.y > 0.0 {
            Facing::Down
        } else {
            Facing::Up
        })
    }
}

/// Two-frame walk cycle shared by the player and creatures
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct WalkCycle {
    pub frame: u8,
    ticks: u32,
}

impl WalkCycle {
    /// Advance while moving, reset to the idle frame otherwise
    pub fn step(&mut self, moving: bool, frame_ticks: u32) {
        if !moving {
            self.frame = 0;
            self.ticks = 0;
            return;
        }
        self.ticks += 1;
        if self.ticks >= frame_ticks.max(1) {
            self.ticks = 0;
            self.frame ^= 1;
        }
    }
}

/// The player avatar
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Player {
    pub pos: Vec2,
    pub radius: f32,
    pub facing: Facing,
    pub walk: WalkCycle,
    /// Movement per tick
    pub speed: f32,
    pub health: f32,
    pub max_health: f32,
    /// Simulation time of the last damage taken (seconds)
    pub last_damage_at: Option<f64>,
    /// Unit direction of the last movement; default aim
    pub last_move_dir: Vec2,
    pub last_shot_at: Option<f64>,
    pub currency: u32,
    pub upgrades: Upgrades,
}

impl Player {
    pub fn new(pos: Vec2, tuning: &Tuning) -> Self {
        Self {
            pos,
            radius: tuning.player.radius,
            facing: Facing::Down,
            walk: WalkCycle::default(),
            speed: tuning.player.speed,
            health: tuning.player.max_health,
            max_health: tuning.player.max_health,
            last_damage_at: None,
            last_move_dir: Vec2::X,
            last_shot_at: None,
            currency: 0,
            upgrades: Upgrades::default(),
        }
    }

    pub fn half_extent(&self) -> Vec2 {
        Vec2::splat(self.radius)
    }

    /// Collision square approximating the player circle
    pub fn rect(&self) -> Rect {
        Rect::from_center(self.pos, self.half_extent())
    }

    /// Inside the melee invulnerability window at `now`
    pub fn is_invulnerable(&self, now: f64, window_secs: f32) -> bool {
        self.last_damage_at
            .is_some_and(|at| now - at < f64::from(window_secs))
    }

    /// Subtract health (clamped at zero) and restart the invulnerability
    /// window. Returns true when this hit left the player dead.
    pub fn take_damage(&mut self, amount: f32, now: f64) -> bool {
        self.health = (self.health - amount).max(0.0);
        self.last_damage_at = Some(now);
        self.health <= 0.0
    }
}

/// Caster-only state
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CasterState {
    /// Seconds between casts
    pub cooldown_secs: f32,
    /// Bolt speed (pixels/tick)
    pub bolt_speed: f32,
    /// Casts obstacle-piercing bolts
    pub piercing: bool,
    pub last_cast_at: Option<f64>,
}

impl CasterState {
    pub fn ready(&self, now: f64) -> bool {
        self.last_cast_at
            .is_none_or(|at| now - at >= f64::from(self.cooldown_secs))
    }
}

/// Behavior variant, fixed at spawn time
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum Behavior {
    /// Melee chaser
    Chaser,
    /// Ranged kiter
    Caster(CasterState),
}

/// Payload-free creature tag
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum CreatureKind {
    Normal,
    Caster,
}

/// A hostile creature
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Creature {
    pub id: u32,
    pub pos: Vec2,
    /// Width and height
    pub size: Vec2,
    /// Movement per tick
    pub speed: f32,
    pub health: f32,
    pub max_health: f32,
    pub behavior: Behavior,
    pub facing: Facing,
    pub walk: WalkCycle,
    pub path: PathCache,
}

impl Creature {
    pub fn kind(&self) -> CreatureKind {
        match self.behavior {
            Behavior::Chaser => CreatureKind::Normal,
            Behavior::Caster(_) => CreatureKind::Caster,
        }
    }

    pub fn half_extent(&self) -> Vec2 {
        self.size * 0.5
    }

    pub fn rect(&self) -> Rect {
        Rect::from_center(self.pos, self.half_extent())
    }
}

/// Distance budget for a bolt that expires after traveling
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TravelLimit {
    pub origin: Vec2,
    pub max_distance: f32,
}

/// Provenance of a projectile; decides who it can hurt
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum ProjectileKind {
    /// Fired by the player; damages creatures
    PlayerBolt { limit: Option<TravelLimit> },
    /// Fired by a caster; damages the player, stopped by obstacles
    HostileBolt,
    /// High-tier caster bolt that passes through obstacles
    PiercingBolt,
}

/// A projectile in flight
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Projectile {
    pub pos: Vec2,
    /// Displacement per tick
    pub vel: Vec2,
    pub radius: f32,
    pub speed: f32,
    pub kind: ProjectileKind,
}

impl Projectile {
    /// Player bolt heading along `dir`
    pub fn player_bolt(pos: Vec2, dir: Vec2, speed: f32, radius: f32, max_distance: f32) -> Self {
        Self {
            pos,
            vel: dir.normalize_or_zero() * speed,
            radius,
            speed,
            kind: ProjectileKind::PlayerBolt {
                limit: Some(TravelLimit {
                    origin: pos,
                    max_distance,
                }),
            },
        }
    }

    /// Hostile bolt aimed from `pos` at `target`
    pub fn hostile_bolt(pos: Vec2, target: Vec2, speed: f32, radius: f32, piercing: bool) -> Self {
        Self {
            pos,
            vel: (target - pos).normalize_or_zero() * speed,
            radius,
            speed,
            kind: if piercing {
                ProjectileKind::PiercingBolt
            } else {
                ProjectileKind::HostileBolt
            },
        }
    }

    pub fn is_hostile(&self) -> bool {
        matches!(self.kind, ProjectileKind::HostileBolt | ProjectileKind::PiercingBolt)
    }

    pub fn pierces_obstacles(&self) -> bool {
        matches!(self.kind, ProjectileKind::PiercingBolt)
    }

    pub fn rect(&self) -> Rect {
        Rect::from_center(self.pos, Vec2::splat(self.radius))
    }
}

/// Wave director phase
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum WavePhase {
    /// Before the first wave
    Idle,
    /// Wave entered; banner showing, spawns and creature updates blocked
    Announcing { ticks_left: u32 },
    Spawning,
    /// Quota emitted, waiting for the last creature to die
    Clearing,
    /// Wave cleared; marketplace open until the host closes it
    Intermission,
    /// Configured final wave cleared
    Won,
}

/// Wave progress counters
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WaveState {
    pub current_wave: u32,
    pub to_spawn: u32,
    pub spawned: u32,
    /// Creatures of this wave not yet killed (spawned or pending)
    pub remaining: u32,
    pub phase: WavePhase,
}

impl Default for WaveState {
    fn default() -> Self {
        Self {
            current_wave: 0,
            to_spawn: 0,
            spawned: 0,
            remaining: 0,
            phase: WavePhase::Idle,
        }
    }
}

impl WaveState {
    /// Announcement delay running; creature updates and spawns are blocked
    pub fn transitioning(&self) -> bool {
        matches!(self.phase, WavePhase::Announcing { .. })
    }

    /// Upgrade intermission gate is open
    pub fn show_marketplace(&self) -> bool {
        self.phase == WavePhase::Intermission
    }

    pub fn quota_exhausted(&self) -> bool {
        self.spawned >= self.to_spawn
    }
}

/// Complete game state
#[derive(Debug, Clone, Serialize)]
pub struct GameState {
    /// Run seed for reproducibility
    pub seed: u64,
    #[serde(skip)]
    pub rng: Pcg32,
    /// Simulation tick counter
    pub time_ticks: u64,
    /// `None` while the host is still loading
    pub player: Option<Player>,
    /// Live creatures (spawn order)
    pub creatures: Vec<Creature>,
    pub projectiles: Vec<Projectile>,
    pub obstacles: Vec<Obstacle>,
    pub map_tier: u32,
    pub bounds: MapBounds,
    #[serde(skip)]
    pub nav: NavGrid,
    pub wave: WaveState,
    pub score: u64,
    pub game_over: bool,
    pub game_won: bool,
    pub tuning: Tuning,
    next_id: u32,
}

impl GameState {
    /// New match with default tuning
    pub fn new(seed: u64) -> Self {
        Self::with_tuning(seed, Tuning::default())
    }

    /// New match with the player placed at the first tier's spawn point
    pub fn with_tuning(seed: u64, tuning: Tuning) -> Self {
        let mut state = Self::loading(seed, tuning);
        let spawn = layout_for_tier(state.map_tier).spawn;
        state.player = Some(Player::new(spawn, &state.tuning));
        state
    }

    /// State with no player yet; ticks are no-ops until one is attached
    pub fn loading(seed: u64, tuning: Tuning) -> Self {
        let layout = layout_for_tier(0);
        let bounds = MapBounds::default();
        let mut state = Self {
            seed,
            rng: Pcg32::seed_from_u64(seed),
            time_ticks: 0,
            player: None,
            creatures: Vec::new(),
            projectiles: Vec::new(),
            obstacles: Vec::new(),
            map_tier: layout.tier,
            bounds,
            nav: NavGrid::default(),
            wave: WaveState::default(),
            score: 0,
            game_over: false,
            game_won: false,
            tuning,
            next_id: 1,
        };
        state.set_obstacles(layout.obstacles);
        state
    }

    /// Simulation clock (seconds)
    pub fn now(&self) -> f64 {
        self.time_ticks as f64 * f64::from(SIM_DT)
    }

    /// Allocate a new entity ID
    pub fn next_entity_id(&mut self) -> u32 {
        let id = self.next_id;
        self.next_id += 1;
        id
    }

    /// Replace the obstacle set and rebuild navigation
    pub fn set_obstacles(&mut self, obstacles: Vec<Obstacle>) {
        self.obstacles = obstacles;
        self.rebuild_nav();
    }

    pub fn rebuild_nav(&mut self) {
        self.nav = NavGrid::build(self.bounds, &self.obstacles, self.nav_clearance());
    }

    /// Half-size of the largest creature plus a small margin
    pub fn nav_clearance(&self) -> f32 {
        let creature = &self.tuning.creature;
        creature.normal_size.max(creature.caster_size) * 0.5 + 2.0
    }

    /// Append a projectile from outside the tick (e.g. a fire-button handler)
    pub fn push_projectile(&mut self, projectile: Projectile) {
        self.projectiles.push(projectile);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_facing_from_dominant_axis() {
        assert_eq!(Facing::from_motion(Vec2::new(3.0, 1.0)), Some(Facing::Right));
        assert_eq!(Facing::from_motion(Vec2::new(-3.0, 1.0)), Some(Facing::Left));
        assert_eq!(Facing::from_motion(Vec2::new(1.0, -3.0)), Some(Facing::Up));
        assert_eq!(Facing::from_motion(Vec2::new(1.0, 3.0)), Some(Facing::Down));
        assert_eq!(Facing::from_motion(Vec2::ZERO), None);
    }

    #[test]
    fn test_walk_cycle_toggles_and_resets() {
        let mut walk = WalkCycle::default();
        for _ in 0..3 {
            walk.step(true, 3);
        }
        assert_eq!(walk.frame, 1);
        for _ in 0..3 {
            walk.step(true, 3);
        }
        assert_eq!(walk.frame, 0);
        walk.step(true, 3);
        walk.step(false, 3);
        assert_eq!(walk.frame, 0);
    }

    #[test]
    fn test_take_damage_clamps_at_zero() {
        let tuning = Tuning::default();
        let mut player = Player::new(Vec2::ZERO, &tuning);
        player.health = 5.0;
        assert!(player.take_damage(10.0, 1.0));
        assert_eq!(player.health, 0.0);
        assert!(player.is_invulnerable(1.5, 1.0));
        assert!(!player.is_invulnerable(2.0, 1.0));
    }

    #[test]
    fn test_caster_cooldown() {
        let mut caster = CasterState {
            cooldown_secs: 2.0,
            bolt_speed: 5.0,
            piercing: false,
            last_cast_at: None,
        };
        assert!(caster.ready(0.0));
        caster.last_cast_at = Some(1.0);
        assert!(!caster.ready(2.5));
        assert!(caster.ready(3.0));
    }

    #[test]
    fn test_projectile_provenance() {
        let player = Projectile::player_bolt(Vec2::ZERO, Vec2::X, 10.0, 5.0, 700.0);
        let hostile = Projectile::hostile_bolt(Vec2::ZERO, Vec2::X, 5.0, 6.0, false);
        let piercing = Projectile::hostile_bolt(Vec2::ZERO, Vec2::X, 5.0, 6.0, true);
        assert!(!player.is_hostile());
        assert!(hostile.is_hostile() && !hostile.pierces_obstacles());
        assert!(piercing.is_hostile() && piercing.pierces_obstacles());
        assert_eq!(hostile.vel, Vec2::new(5.0, 0.0));
    }

    #[test]
    fn test_new_state_has_player_and_nav() {
        let state = GameState::new(7);
        assert!(state.player.is_some());
        assert!(state.nav.cell_at(state.bounds.center()).is_some());
        assert_eq!(state.wave.phase, WavePhase::Idle);
        assert!(GameState::loading(7, Tuning::default()).player.is_none());
    }
}

//! Data-driven game balance
//!
//! Every balance knob the simulation reads lives here. Sections deserialize
//! with per-field defaults so a tuning file only needs the values it changes.

use std::path::Path;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Errors raised while loading or validating a tuning file
#[derive(Debug, Error)]
pub enum TuningError {
    #[error("failed to read tuning file: {0}")]
    Io(#[from] std::io::Error),
    #[error("failed to parse tuning: {0}")]
    Parse(#[from] serde_json::Error),
    #[error("invalid tuning: {0}")]
    Invalid(String),
}

/// Player movement, health and weapon baseline
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PlayerTuning {
    /// Collision radius (pixels)
    pub radius: f32,
    /// Movement per tick (pixels)
    pub speed: f32,
    pub max_health: f32,
    /// Melee invulnerability window after taking damage (seconds)
    pub invulnerability_secs: f32,
    /// Ticks between walk animation frame toggles
    pub walk_frame_ticks: u32,
    /// Player bolt speed (pixels/tick)
    pub bolt_speed: f32,
    pub bolt_radius: f32,
    /// Max travel distance of a player bolt (pixels)
    pub bolt_range: f32,
    pub base_damage: f32,
    /// Seconds between volleys at fire-rate level 0
    pub fire_interval_secs: f32,
    /// Fan angle between adjacent bolts in a volley (radians)
    pub volley_spread: f32,
}

impl Default for PlayerTuning {
    fn default() -> Self {
        Self {
            radius: 20.0,
            speed: 4.0,
            max_health: 100.0,
            invulnerability_secs: 1.0,
            walk_frame_ticks: 10,
            bolt_speed: 10.0,
            bolt_radius: 5.0,
            bolt_range: 700.0,
            base_damage: 10.0,
            fire_interval_secs: 0.4,
            volley_spread: 0.12,
        }
    }
}

/// Linear per-wave growth for one creature subtype
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct LinearStat {
    pub base: f32,
    pub per_wave: f32,
}

impl LinearStat {
    pub const fn new(base: f32, per_wave: f32) -> Self {
        Self { base, per_wave }
    }

    /// `base + wave × per_wave`
    pub fn at(&self, wave: u32) -> f32 {
        self.base + wave as f32 * self.per_wave
    }
}

/// Creature sizes, stats and AI distances
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct CreatureTuning {
    pub normal_size: f32,
    pub caster_size: f32,
    pub normal_health: LinearStat,
    pub normal_speed: LinearStat,
    pub caster_health: LinearStat,
    pub caster_speed: LinearStat,
    /// Hard cap on creature speed (pixels/tick)
    pub max_speed: f32,
    /// Casters flee when the player is closer than this
    pub caster_min_distance: f32,
    /// Casters approach when the player is farther than this
    pub caster_max_distance: f32,
    /// Casters may attack within this distance
    pub caster_attack_range: f32,
    /// Seconds between casts at wave 0
    pub caster_cooldown_secs: f32,
    /// Cooldown reduction per wave (seconds)
    pub caster_cooldown_per_wave: f32,
    /// Hard minimum cooldown (seconds)
    pub caster_min_cooldown_secs: f32,
    /// Hostile bolt speed (pixels/tick)
    pub bolt_speed: LinearStat,
    /// Hard cap on hostile bolt speed
    pub max_bolt_speed: f32,
    pub bolt_radius: f32,
    /// Casters from this wave onward fire obstacle-piercing bolts
    pub piercing_bolt_wave: u32,
    /// Neighbors closer than this contribute separation
    pub separation_radius: f32,
    pub separation_weight: f32,
    /// Cached paths older than this are recomputed (seconds)
    pub path_stale_secs: f32,
    /// Recompute when the player drifts this far from the cached target
    pub path_retarget_distance: f32,
    /// Distance at which a waypoint counts as reached
    pub waypoint_reach: f32,
    /// Ticks between walk animation frame toggles
    pub walk_frame_ticks: u32,
}

impl Default for CreatureTuning {
    fn default() -> Self {
        Self {
            normal_size: 40.0,
            caster_size: 36.0,
            normal_health: LinearStat::new(30.0, 6.0),
            normal_speed: LinearStat::new(1.2, 0.06),
            caster_health: LinearStat::new(20.0, 4.0),
            caster_speed: LinearStat::new(1.0, 0.05),
            max_speed: 3.4,
            caster_min_distance: 180.0,
            caster_max_distance: 320.0,
            caster_attack_range: 420.0,
            caster_cooldown_secs: 2.4,
            caster_cooldown_per_wave: 0.08,
            caster_min_cooldown_secs: 0.8,
            bolt_speed: LinearStat::new(4.5, 0.15),
            max_bolt_speed: 8.0,
            bolt_radius: 6.0,
            piercing_bolt_wave: 15,
            separation_radius: 56.0,
            separation_weight: 0.8,
            path_stale_secs: 1.0,
            path_retarget_distance: 80.0,
            waypoint_reach: 12.0,
            walk_frame_ticks: 12,
        }
    }
}

/// Damage, knockback and rewards
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct CombatTuning {
    pub bolt_damage: f32,
    pub melee_damage: f32,
    /// Knockback impulse applied to a creature hit by a player bolt (pixels)
    pub knockback: f32,
    pub normal_reward: u32,
    pub caster_reward: u32,
    /// Score added per kill
    pub kill_score: u64,
}

impl Default for CombatTuning {
    fn default() -> Self {
        Self {
            bolt_damage: 10.0,
            melee_damage: 10.0,
            knockback: 18.0,
            normal_reward: 10,
            caster_reward: 25,
            kill_score: 1,
        }
    }
}

/// Spawn quotas, probabilities and difficulty tiers
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct WaveTuning {
    /// Quota at wave 0
    pub base_quota: u32,
    /// Quota growth per wave
    pub quota_per_wave: u32,
    /// Per-tick spawn attempt probability
    pub spawn_chance: LinearStat,
    pub max_spawn_chance: f32,
    /// Live creature cap; spawning pauses while reached
    pub max_live: usize,
    /// Probability a spawn is a caster
    pub caster_chance_per_wave: f32,
    pub max_caster_chance: f32,
    /// Waves per exponential difficulty tier
    pub tier_interval: u32,
    /// Multiplier base applied once per tier crossed
    pub tier_base: f32,
    /// Announcement delay before spawning begins (seconds)
    pub announce_secs: f32,
    /// Open the marketplace between waves
    pub marketplace: bool,
    /// Clearing this wave wins the game; `None` means endless
    pub max_waves: Option<u32>,
}

impl Default for WaveTuning {
    fn default() -> Self {
        Self {
            base_quota: 5,
            quota_per_wave: 3,
            spawn_chance: LinearStat::new(0.02, 0.004),
            max_spawn_chance: 0.12,
            max_live: 40,
            caster_chance_per_wave: 0.04,
            max_caster_chance: 0.35,
            tier_interval: 10,
            tier_base: 1.5,
            announce_secs: 2.0,
            marketplace: true,
            max_waves: None,
        }
    }
}

/// Marketplace prices and per-level effects
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct UpgradeTuning {
    /// Cost of the first level; level `n` costs `base_cost × (n + 1)`
    pub base_cost: u32,
    pub damage_per_level: f32,
    pub bolt_radius_per_level: f32,
    /// Fire interval reduction per level (seconds)
    pub fire_interval_per_level: f32,
    pub min_fire_interval_secs: f32,
    /// Extra fan angle per spread level (radians)
    pub spread_per_level: f32,
    pub max_health_per_level: f32,
}

impl Default for UpgradeTuning {
    fn default() -> Self {
        Self {
            base_cost: 50,
            damage_per_level: 5.0,
            bolt_radius_per_level: 1.5,
            fire_interval_per_level: 0.05,
            min_fire_interval_secs: 0.12,
            spread_per_level: 0.04,
            max_health_per_level: 20.0,
        }
    }
}

/// Complete balance table
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Tuning {
    pub player: PlayerTuning,
    pub creature: CreatureTuning,
    pub combat: CombatTuning,
    pub wave: WaveTuning,
    pub upgrades: UpgradeTuning,
}

impl Tuning {
    /// Parse and validate a JSON tuning document
    pub fn from_json(json: &str) -> Result<Self, TuningError> {
        let tuning: Tuning = serde_json::from_str(json)?;
        tuning.validate()?;
        Ok(tuning)
    }

    /// Load and validate a JSON tuning file
    pub fn load(path: impl AsRef<Path>) -> Result<Self, TuningError> {
        let json = std::fs::read_to_string(path)?;
        let tuning = Self::from_json(&json)?;
        log::info!("Loaded tuning overrides");
        Ok(tuning)
    }

    /// Reject tables that would break the simulation or make it unwinnable
    pub fn validate(&self) -> Result<(), TuningError> {
        let invalid = |msg: &str| Err(TuningError::Invalid(msg.to_string()));

        if self.player.speed <= 0.0 || self.player.radius <= 0.0 {
            return invalid("player speed and radius must be positive");
        }
        if self.player.max_health <= 0.0 {
            return invalid("player max_health must be positive");
        }
        if self.creature.max_speed <= 0.0 || self.creature.max_bolt_speed <= 0.0 {
            return invalid("creature speed caps must be positive");
        }
        if self.creature.max_speed >= self.player.speed {
            return invalid("creature max_speed must stay below player speed");
        }
        if self.creature.caster_min_distance >= self.creature.caster_max_distance {
            return invalid("caster_min_distance must be below caster_max_distance");
        }
        if self.creature.caster_min_cooldown_secs <= 0.0 {
            return invalid("caster_min_cooldown_secs must be positive");
        }
        if self.wave.tier_interval == 0 {
            return invalid("tier_interval must be at least 1");
        }
        if self.wave.tier_base < 1.0 {
            return invalid("tier_base must be at least 1.0");
        }
        if !(0.0..=1.0).contains(&self.wave.max_spawn_chance)
            || !(0.0..=1.0).contains(&self.wave.max_caster_chance)
        {
            return invalid("spawn and caster chance caps must lie in [0, 1]");
        }
        if self.wave.max_live == 0 {
            return invalid("max_live must be at least 1");
        }
        if self.wave.max_waves == Some(0) {
            return invalid("max_waves must be at least 1 when set");
        }
        Ok(())
    }
}

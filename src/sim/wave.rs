//! Wave director
//!
//! Owns spawn quotas, difficulty scaling, and the wave state machine:
//!
//! ```text
//! Idle -> Announcing -> Spawning -> Clearing -> Intermission -> Announcing ...
//!                                           \-> Won (when max_waves is set)
//! ```
//!
//! Announcing plus Intermission form the transition between waves: the
//! announcement blocks spawns and creature updates, the intermission holds
//! the marketplace open until the host closes it.

use glam::Vec2;
use rand::Rng;

use super::collision::{Rect, overlaps_any};
use super::events::GameEvent;
use super::map::{layout_for_wave, tier_for_wave};
use super::pathfinding::PathCache;
use super::state::{Behavior, CasterState, Creature, CreatureKind, Facing, GameState, WalkCycle, WavePhase};
use crate::consts::SIM_DT;
use crate::tuning::{CreatureTuning, Tuning, WaveTuning};

/// Spawn attempts per tick before giving up on a blocked perimeter point
const SPAWN_PLACEMENT_TRIES: u32 = 4;

/// `base + wave × perWave`
pub fn spawn_quota(wave: u32, tuning: &WaveTuning) -> u32 {
    tuning.base_quota + wave * tuning.quota_per_wave
}

/// `tierBase ^ floor(wave / tierInterval)`
pub fn tier_multiplier(wave: u32, tuning: &WaveTuning) -> f32 {
    let tiers = wave / tuning.tier_interval.max(1);
    tuning.tier_base.powi(tiers as i32)
}

/// Per-tick spawn attempt probability
pub fn spawn_chance(wave: u32, tuning: &WaveTuning) -> f32 {
    tuning.spawn_chance.at(wave).clamp(0.0, tuning.max_spawn_chance)
}

/// Probability that a spawn is a caster
pub fn caster_chance(wave: u32, tuning: &WaveTuning) -> f32 {
    (wave as f32 * tuning.caster_chance_per_wave).clamp(0.0, tuning.max_caster_chance)
}

/// Seconds between caster attacks, floored at the hard minimum
pub fn caster_cooldown(wave: u32, tuning: &CreatureTuning) -> f32 {
    (tuning.caster_cooldown_secs - wave as f32 * tuning.caster_cooldown_per_wave)
        .max(tuning.caster_min_cooldown_secs)
}

/// Hostile bolt speed, capped at the hard maximum
pub fn hostile_bolt_speed(wave: u32, tuning: &CreatureTuning) -> f32 {
    tuning.bolt_speed.at(wave).min(tuning.max_bolt_speed)
}

/// Scaled health and speed for a new creature
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CreatureStats {
    pub health: f32,
    pub speed: f32,
    /// Speed before the hard cap was applied
    pub unclamped_speed: f32,
}

/// Linear per-wave growth, then the exponential tier multiplier, then caps
pub fn creature_stats(kind: CreatureKind, wave: u32, tuning: &Tuning) -> CreatureStats {
    let creature = &tuning.creature;
    let (health, speed) = match kind {
        CreatureKind::Normal => (creature.normal_health, creature.normal_speed),
        CreatureKind::Caster => (creature.caster_health, creature.caster_speed),
    };
    let multiplier = tier_multiplier(wave, &tuning.wave);
    let unclamped_speed = speed.at(wave) * multiplier;
    CreatureStats {
        health: health.at(wave) * multiplier,
        speed: unclamped_speed.min(creature.max_speed),
        unclamped_speed,
    }
}

/// Per-tick director work: leave Idle, count down the announcement, spawn
pub fn update(state: &mut GameState, events: &mut Vec<GameEvent>) {
    match state.wave.phase {
        WavePhase::Idle => start_wave(state, events),
        WavePhase::Announcing { ticks_left } => {
            state.wave.phase = if ticks_left <= 1 {
                WavePhase::Spawning
            } else {
                WavePhase::Announcing {
                    ticks_left: ticks_left - 1,
                }
            };
        }
        WavePhase::Spawning => {
            try_spawn(state);
            if state.wave.quota_exhausted() {
                state.wave.phase = WavePhase::Clearing;
            }
        }
        WavePhase::Clearing | WavePhase::Intermission | WavePhase::Won => {}
    }
}

/// Enter the next wave: new quota, empty arena, announcement running
pub fn start_wave(state: &mut GameState, events: &mut Vec<GameEvent>) {
    let wave = state.wave.current_wave + 1;
    let tuning = &state.tuning;
    let to_spawn = spawn_quota(wave, &tuning.wave);
    let announce_ticks = (tuning.wave.announce_secs / SIM_DT).round().max(1.0) as u32;

    let normal = creature_stats(CreatureKind::Normal, wave, tuning);
    if normal.unclamped_speed > normal.speed {
        log::warn!(
            "Wave {}: creature speed {:.2} exceeds cap, clamped to {:.2}",
            wave,
            normal.unclamped_speed,
            normal.speed
        );
    }

    state.wave.current_wave = wave;
    state.wave.to_spawn = to_spawn;
    state.wave.spawned = 0;
    state.wave.remaining = to_spawn;
    state.wave.phase = WavePhase::Announcing {
        ticks_left: announce_ticks,
    };
    state.creatures.clear();
    state.projectiles.retain(|p| !p.is_hostile());

    let tier = tier_for_wave(wave);
    if tier != state.map_tier {
        let layout = layout_for_wave(wave);
        log::info!("Wave {}: switching to map tier {}", wave, tier);
        state.map_tier = tier;
        state.set_obstacles(layout.obstacles);
        state.projectiles.clear();
        if let Some(player) = state.player.as_mut() {
            player.pos = state.bounds.clamp(layout.spawn, player.half_extent());
        }
        events.push(GameEvent::MapChanged { tier });
    }

    log::info!("Wave {} started: {} creatures", wave, to_spawn);
    events.push(GameEvent::WaveStarted(wave));
    events.push(GameEvent::WaveMessage(format!("Wave {wave}")));
}

/// Fire the wave-advance transition if the wave is complete.
///
/// Complete means the quota is fully spawned and no creature is alive. Safe to
/// call any number of times per tick; only the first call on a complete wave
/// transitions. Returns whether a transition happened.
pub fn check_clear(state: &mut GameState, events: &mut Vec<GameEvent>) -> bool {
    let in_combat = matches!(state.wave.phase, WavePhase::Spawning | WavePhase::Clearing);
    if state.game_over || !in_combat || !state.wave.quota_exhausted() || !state.creatures.is_empty() {
        return false;
    }

    let wave = state.wave.current_wave;
    log::info!("Wave {} cleared", wave);
    events.push(GameEvent::WaveCleared(wave));

    if state.tuning.wave.max_waves.is_some_and(|max| wave >= max) {
        state.wave.phase = WavePhase::Won;
        state.game_won = true;
        log::info!("Final wave {} cleared, game won", wave);
        events.push(GameEvent::GameWon {
            score: state.score,
            wave,
        });
    } else if state.tuning.wave.marketplace {
        state.wave.phase = WavePhase::Intermission;
        log::info!("Marketplace open after wave {}", wave);
        events.push(GameEvent::MarketplaceOpened { wave });
    } else {
        start_wave(state, events);
    }
    true
}

/// Close the intermission gate and start the next wave.
/// Returns false when no intermission was open.
pub fn close_marketplace(state: &mut GameState, events: &mut Vec<GameEvent>) -> bool {
    if !state.wave.show_marketplace() {
        return false;
    }
    log::info!("Marketplace closed");
    events.push(GameEvent::MarketplaceClosed);
    start_wave(state, events);
    true
}

/// Record a kill against the wave's remaining count
pub fn record_kill(state: &mut GameState) {
    state.wave.remaining = state.wave.remaining.saturating_sub(1);
}

/// Maybe spawn one creature at a random perimeter point
fn try_spawn(state: &mut GameState) {
    let wave = state.wave.current_wave;
    let tuning = &state.tuning;
    if state.wave.quota_exhausted() || state.creatures.len() >= tuning.wave.max_live {
        return;
    }
    if !state.rng.random_bool(f64::from(spawn_chance(wave, &tuning.wave))) {
        return;
    }

    let kind = if state.rng.random_bool(f64::from(caster_chance(wave, &tuning.wave))) {
        CreatureKind::Caster
    } else {
        CreatureKind::Normal
    };
    let size = Vec2::splat(match kind {
        CreatureKind::Normal => tuning.creature.normal_size,
        CreatureKind::Caster => tuning.creature.caster_size,
    });

    let mut placed = None;
    for _ in 0..SPAWN_PLACEMENT_TRIES {
        let pos = perimeter_point(state, size * 0.5);
        if !overlaps_any(&Rect::from_center(pos, size * 0.5), &state.obstacles) {
            placed = Some(pos);
            break;
        }
    }
    let Some(pos) = placed else {
        log::debug!("Wave {}: no clear perimeter spawn point this tick", wave);
        return;
    };

    let stats = creature_stats(kind, wave, &state.tuning);
    let behavior = match kind {
        CreatureKind::Normal => Behavior::Chaser,
        CreatureKind::Caster => {
            let creature = &state.tuning.creature;
            Behavior::Caster(CasterState {
                cooldown_secs: caster_cooldown(wave, creature),
                bolt_speed: hostile_bolt_speed(wave, creature),
                piercing: wave >= creature.piercing_bolt_wave,
                last_cast_at: None,
            })
        }
    };

    let id = state.next_entity_id();
    state.creatures.push(Creature {
        id,
        pos,
        size,
        speed: stats.speed,
        health: stats.health,
        max_health: stats.health,
        behavior,
        facing: Facing::Down,
        walk: WalkCycle::default(),
        path: PathCache::default(),
    });
    state.wave.spawned += 1;
}

/// Uniform point on one of the four map edges, inset so the body fits
fn perimeter_point(state: &mut GameState, half: Vec2) -> Vec2 {
    let bounds = state.bounds;
    let rng = &mut state.rng;
    let pos = match rng.random_range(0..4) {
        0 => Vec2::new(rng.random_range(0.0..bounds.width), 0.0),
        1 => Vec2::new(rng.random_range(0.0..bounds.width), bounds.height),
        2 => Vec2::new(0.0, rng.random_range(0.0..bounds.height)),
        _ => Vec2::new(bounds.width, rng.random_range(0.0..bounds.height)),
    };
    bounds.clamp(pos, half)
}

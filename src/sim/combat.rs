//! Collision resolver
//!
//! Runs after all movement each tick, in a fixed order:
//! 1. hostile bolts against the player
//! 2. player bolts against creatures (knockback, damage, rewards)
//! 3. creature bodies against the player (melee)

use glam::Vec2;

use super::collision::{Rect, overlaps_any};
use super::events::GameEvent;
use super::map::{MapBounds, Obstacle};
use super::state::{Creature, CreatureKind, GameState, ProjectileKind};
use super::wave;

/// Resolve every contact for this tick
pub fn resolve(state: &mut GameState, events: &mut Vec<GameEvent>) {
    hostile_bolts(state, events);
    player_bolts(state, events);
    melee(state, events);
}

/// Hostile bolts hit the player square regardless of invulnerability
fn hostile_bolts(state: &mut GameState, events: &mut Vec<GameEvent>) {
    let now = state.now();
    let damage = state.tuning.combat.bolt_damage;
    let Some(player) = state.player.as_mut() else {
        return;
    };

    let player_rect = player.rect();
    let before = state.projectiles.len();
    state
        .projectiles
        .retain(|p| !(p.is_hostile() && p.rect().overlaps(&player_rect)));
    let hits = before - state.projectiles.len();

    let mut died = false;
    for _ in 0..hits {
        died |= player.take_damage(damage, now);
        events.push(GameEvent::HealthChanged {
            health: player.health,
            max_health: player.max_health,
        });
    }
    if died {
        game_over(state, events);
    }
}

/// Each player bolt damages at most one creature, the first it overlaps
fn player_bolts(state: &mut GameState, events: &mut Vec<GameEvent>) {
    if state.game_over {
        return;
    }
    let Some(player) = state.player.as_ref() else {
        return;
    };
    let damage = player.upgrades.weapon_damage(&state.tuning.player, &state.tuning.upgrades);
    let knockback = state.tuning.combat.knockback;

    let mut i = 0;
    while i < state.projectiles.len() {
        let bolt = &state.projectiles[i];
        if !matches!(bolt.kind, ProjectileKind::PlayerBolt { .. }) {
            i += 1;
            continue;
        }
        let bolt_rect = bolt.rect();
        let Some(hit) = state.creatures.iter().position(|c| c.rect().overlaps(&bolt_rect)) else {
            i += 1;
            continue;
        };

        let bolt = state.projectiles.remove(i);
        let creature = &mut state.creatures[hit];
        apply_knockback(creature, bolt.vel, knockback, &state.obstacles, state.bounds);
        creature.health -= damage;
        if creature.health <= 0.0 {
            let dead = state.creatures.remove(hit);
            on_kill(state, &dead, events);
        }
    }
}

/// Push `creature` along `direction`; rolled back entirely if the pushed
/// body would overlap an obstacle, then clamped to the map.
pub fn apply_knockback(creature: &mut Creature, direction: Vec2, force: f32, obstacles: &[Obstacle], bounds: MapBounds) {
    let half = creature.half_extent();
    let before = creature.pos;
    let pushed = before + direction.normalize_or_zero() * force;

    let next = if overlaps_any(&Rect::from_center(pushed, half), obstacles) {
        before
    } else {
        pushed
    };
    creature.pos = bounds.clamp(next, half);
    if creature.pos != before {
        creature.path.invalidate();
    }
}

fn on_kill(state: &mut GameState, dead: &Creature, events: &mut Vec<GameEvent>) {
    let kind = dead.kind();
    let combat = &state.tuning.combat;
    let reward = match kind {
        CreatureKind::Normal => combat.normal_reward,
        CreatureKind::Caster => combat.caster_reward,
    };
    state.score += combat.kill_score;

    if let Some(player) = state.player.as_mut() {
        player.currency += reward;
        events.push(GameEvent::CurrencyChanged(player.currency));
    }
    events.push(GameEvent::CurrencyDropped {
        pos: dead.pos,
        amount: reward,
    });
    events.push(GameEvent::ScoreChanged(state.score));
    events.push(GameEvent::CreatureKilled { id: dead.id, kind });
    log::debug!("creature {} ({:?}) killed, score {}", dead.id, kind, state.score);

    wave::record_kill(state);
    wave::check_clear(state, events);
}

/// At most one melee hit per tick, and none inside the invulnerability window
fn melee(state: &mut GameState, events: &mut Vec<GameEvent>) {
    if state.game_over {
        return;
    }
    let now = state.now();
    let window = state.tuning.player.invulnerability_secs;
    let damage = state.tuning.combat.melee_damage;
    let Some(player) = state.player.as_mut() else {
        return;
    };
    if player.is_invulnerable(now, window) {
        return;
    }

    let player_rect = player.rect();
    if !state.creatures.iter().any(|c| c.rect().overlaps(&player_rect)) {
        return;
    }

    let died = player.take_damage(damage, now);
    events.push(GameEvent::HealthChanged {
        health: player.health,
        max_health: player.max_health,
    });
    if died {
        game_over(state, events);
    }
}

/// Latch the game-over flag; the event fires once per match
pub fn game_over(state: &mut GameState, events: &mut Vec<GameEvent>) {
    if state.game_over {
        return;
    }
    state.game_over = true;
    log::info!("Game over at wave {} with score {}", state.wave.current_wave, state.score);
    events.push(GameEvent::GameOver {
        score: state.score,
        wave: state.wave.current_wave,
    });
}

//! Fixed timestep simulation tick
//!
//! One call advances the match by exactly one step. Events produced along
//! the way are returned to the host in the order they happened.

use glam::Vec2;

use super::combat;
use super::creature::{self, AiContext};
use super::events::GameEvent;
use super::player::{self, MoveIntent};
use super::projectile;
use super::state::GameState;
use super::upgrades::{UpgradeError, UpgradeKind};
use super::wave;

/// Input commands for a single tick (deterministic)
#[derive(Debug, Clone, Default)]
pub struct TickInput {
    /// Pressed movement directions
    pub movement: MoveIntent,
    /// Fire button held
    pub fire: bool,
    /// Aim direction; falls back to the last movement direction
    pub aim: Option<Vec2>,
    /// Upgrades to buy, applied in order while the marketplace is open
    pub purchases: Vec<UpgradeKind>,
    /// Leave the marketplace and start the next wave
    pub close_marketplace: bool,
}

/// Advance the game state by one fixed timestep
pub fn tick(state: &mut GameState, input: &TickInput) -> Vec<GameEvent> {
    let mut events = Vec::new();

    // Nothing to simulate while loading or after the match ended
    if state.player.is_none() || state.game_over || state.game_won {
        return events;
    }

    // Intermission: the world is frozen until the host closes the marketplace
    if state.wave.show_marketplace() {
        for &kind in &input.purchases {
            if let Err(err) = purchase_upgrade(state, kind, &mut events) {
                log::debug!("Purchase of {} refused: {}", kind.as_str(), err);
            }
        }
        if !input.close_marketplace {
            return events;
        }
        wave::close_marketplace(state, &mut events);
    }

    state.time_ticks += 1;
    let now = state.now();

    wave::update(state, &mut events);

    if let Some(player) = state.player.as_mut() {
        player::update(player, &input.movement, &state.obstacles, state.bounds, &state.tuning);
        if input.fire {
            let volley = player::fire(player, input.aim, now, &state.tuning);
            state.projectiles.extend(volley);
        }
    }

    if !state.wave.transitioning() {
        if let Some(player_pos) = state.player.as_ref().map(|p| p.pos) {
            let ctx = AiContext {
                player_pos,
                obstacles: &state.obstacles,
                nav: &state.nav,
                bounds: state.bounds,
                now,
                tuning: &state.tuning.creature,
            };
            creature::update_all(&mut state.creatures, &ctx, &mut state.projectiles, &mut state.rng);
        }
    }

    projectile::advance(&mut state.projectiles, &state.obstacles, state.bounds);
    combat::resolve(state, &mut events);
    wave::check_clear(state, &mut events);
    clamp_to_bounds(state);

    events
}

/// Buy one level of `kind` for the player.
///
/// Only allowed while the marketplace is open. Max-health purchases also heal
/// by the amount the cap grew.
pub fn purchase_upgrade(
    state: &mut GameState,
    kind: UpgradeKind,
    events: &mut Vec<GameEvent>,
) -> Result<u8, UpgradeError> {
    if state.player.is_none() {
        return Err(UpgradeError::NoPlayer);
    }
    if !state.wave.show_marketplace() {
        return Err(UpgradeError::MarketplaceClosed);
    }
    let tuning = &state.tuning;
    let Some(player) = state.player.as_mut() else {
        return Err(UpgradeError::NoPlayer);
    };

    let level = player.upgrades.purchase(kind, &mut player.currency, &tuning.upgrades)?;
    log::info!("Bought {} level {}", kind.as_str(), level);
    events.push(GameEvent::CurrencyChanged(player.currency));

    if kind == UpgradeKind::MaxHealth {
        let max_health = player.upgrades.max_health(&tuning.player, &tuning.upgrades);
        let gained = max_health - player.max_health;
        player.max_health = max_health;
        player.health = (player.health + gained).min(max_health);
        events.push(GameEvent::HealthChanged {
            health: player.health,
            max_health,
        });
    }
    Ok(level)
}

/// Last line of defense against anything that escaped the map this tick
fn clamp_to_bounds(state: &mut GameState) {
    let bounds = state.bounds;
    if let Some(player) = state.player.as_mut() {
        player.pos = bounds.clamp(player.pos, player.half_extent());
    }
    for creature in &mut state.creatures {
        creature.pos = bounds.clamp(creature.pos, creature.half_extent());
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sim::pathfinding::PathCache;
    use crate::sim::state::{Behavior, Creature, Facing, Projectile, WalkCycle, WavePhase};
    use crate::tuning::{LinearStat, Tuning};
    use proptest::prelude::*;

    fn push_creature(state: &mut GameState, pos: Vec2, health: f32) {
        let id = state.next_entity_id();
        state.creatures.push(Creature {
            id,
            pos,
            size: Vec2::splat(40.0),
            speed: 2.0,
            health,
            max_health: health,
            behavior: Behavior::Chaser,
            facing: Facing::Down,
            walk: WalkCycle::default(),
            path: PathCache::default(),
        });
    }

    fn skip_announcement(state: &mut GameState) {
        let input = TickInput::default();
        tick(state, &input);
        while state.wave.transitioning() {
            tick(state, &input);
        }
    }

    #[test]
    fn test_first_tick_starts_wave_one() {
        let mut state = GameState::new(12345);
        let events = tick(&mut state, &TickInput::default());
        assert_eq!(state.time_ticks, 1);
        assert_eq!(state.wave.current_wave, 1);
        assert!(state.wave.transitioning());
        assert!(events.contains(&GameEvent::WaveStarted(1)));
    }

    #[test]
    fn test_loading_state_is_noop() {
        let mut state = GameState::loading(1, Tuning::default());
        let events = tick(&mut state, &TickInput::default());
        assert!(events.is_empty());
        assert_eq!(state.time_ticks, 0);
        assert_eq!(state.wave.phase, WavePhase::Idle);
    }

    #[test]
    fn test_game_over_stops_ticking() {
        let mut state = GameState::new(1);
        state.game_over = true;
        tick(&mut state, &TickInput::default());
        assert_eq!(state.time_ticks, 0);
    }

    #[test]
    fn test_movement_and_fire() {
        let mut state = GameState::new(3);
        let start = state.player.as_ref().unwrap().pos;
        let input = TickInput {
            movement: MoveIntent {
                left: true,
                ..Default::default()
            },
            fire: true,
            ..Default::default()
        };
        tick(&mut state, &input);
        let player = state.player.as_ref().unwrap();
        assert_eq!(player.pos, start - Vec2::new(4.0, 0.0));
        assert_eq!(state.projectiles.len(), 1);
        assert!(state.projectiles[0].vel.x < 0.0);
    }

    #[test]
    fn test_creatures_frozen_during_announcement() {
        let mut state = GameState::new(3);
        tick(&mut state, &TickInput::default());
        assert!(state.wave.transitioning());

        // A creature placed during the announcement does not move
        push_creature(&mut state, Vec2::new(100.0, 100.0), 30.0);
        tick(&mut state, &TickInput::default());
        assert_eq!(state.creatures[0].pos, Vec2::new(100.0, 100.0));
    }

    #[test]
    fn test_out_of_bounds_hostile_bolt_never_damages() {
        let mut state = GameState::new(3);
        state.tuning.wave.spawn_chance = LinearStat::new(0.0, 0.0);
        skip_announcement(&mut state);
        let player = state.player.as_mut().unwrap();
        player.pos = Vec2::new(20.0, 400.0);
        let health = player.health;
        state
            .projectiles
            .push(Projectile::hostile_bolt(Vec2::new(2.0, 400.0), Vec2::new(0.0, 400.0), 5.0, 6.0, true));
        tick(&mut state, &TickInput::default());
        assert!(state.projectiles.iter().all(|p| !p.is_hostile()));
        assert_eq!(state.player.as_ref().unwrap().health, health);
    }

    #[test]
    fn test_marketplace_freezes_and_sells() {
        let mut state = GameState::new(3);
        state.wave.current_wave = 1;
        state.wave.phase = WavePhase::Intermission;
        state.player.as_mut().unwrap().currency = 60;
        state.player.as_mut().unwrap().health = 50.0;

        let input = TickInput {
            purchases: vec![UpgradeKind::MaxHealth, UpgradeKind::MaxHealth],
            ..Default::default()
        };
        let events = tick(&mut state, &input);
        assert_eq!(state.time_ticks, 0);
        let player = state.player.as_ref().unwrap();
        assert_eq!(player.upgrades.max_health, 1);
        assert_eq!(player.currency, 10);
        assert_eq!(player.max_health, 120.0);
        assert_eq!(player.health, 70.0);
        assert!(events.contains(&GameEvent::CurrencyChanged(10)));

        let input = TickInput {
            close_marketplace: true,
            ..Default::default()
        };
        let events = tick(&mut state, &input);
        assert_eq!(state.time_ticks, 1);
        assert_eq!(state.wave.current_wave, 2);
        assert!(events.contains(&GameEvent::MarketplaceClosed));
    }

    #[test]
    fn test_purchase_outside_intermission_refused() {
        let mut state = GameState::new(3);
        state.player.as_mut().unwrap().currency = 500;
        let mut events = Vec::new();
        assert_eq!(
            purchase_upgrade(&mut state, UpgradeKind::FireRate, &mut events),
            Err(UpgradeError::MarketplaceClosed)
        );
        assert!(events.is_empty());
    }

    #[test]
    fn test_purchase_without_player_refused() {
        let mut state = GameState::loading(3, Tuning::default());
        state.wave.phase = WavePhase::Intermission;
        let mut events = Vec::new();
        assert_eq!(
            purchase_upgrade(&mut state, UpgradeKind::Spread, &mut events),
            Err(UpgradeError::NoPlayer)
        );
        assert!(events.is_empty());
    }

    #[test]
    fn test_determinism() {
        let mut state1 = GameState::new(99999);
        let mut state2 = GameState::new(99999);
        let inputs = [
            TickInput {
                movement: MoveIntent {
                    up: true,
                    ..Default::default()
                },
                fire: true,
                ..Default::default()
            },
            TickInput {
                fire: true,
                aim: Some(Vec2::new(1.0, 1.0)),
                ..Default::default()
            },
            TickInput::default(),
        ];

        for i in 0..600 {
            let input = &inputs[i % inputs.len()];
            let e1 = tick(&mut state1, input);
            let e2 = tick(&mut state2, input);
            assert_eq!(e1, e2);
        }

        assert_eq!(state1.time_ticks, state2.time_ticks);
        assert_eq!(state1.creatures.len(), state2.creatures.len());
        for (a, b) in state1.creatures.iter().zip(&state2.creatures) {
            assert_eq!(a.pos, b.pos);
        }
    }

    #[test]
    fn test_wave_clears_into_marketplace() {
        let mut state = GameState::new(8);
        state.tuning.wave.base_quota = 1;
        state.tuning.wave.quota_per_wave = 0;
        skip_announcement(&mut state);

        // Stand in for the single spawn, then kill it with a bolt
        state.wave.spawned = 1;
        state.wave.phase = WavePhase::Clearing;
        state.set_obstacles(Vec::new());
        state.creatures.clear();
        let target = Vec2::new(300.0, 300.0);
        push_creature(&mut state, target, 1.0);
        state.creatures[0].speed = 0.0;
        state
            .projectiles
            .push(Projectile::player_bolt(target - Vec2::new(10.0, 0.0), Vec2::X, 10.0, 5.0, 700.0));

        let events = tick(&mut state, &TickInput::default());
        assert!(state.wave.show_marketplace());
        assert!(events.contains(&GameEvent::WaveCleared(1)));
        assert!(events.contains(&GameEvent::MarketplaceOpened { wave: 1 }));
    }

    proptest! {
        #![proptest_config(ProptestConfig::with_cases(16))]

        #[test]
        fn prop_entities_stay_in_bounds_and_health_nonnegative(
            seed in any::<u64>(),
            moves in prop::collection::vec(0u8..16, 1..200),
        ) {
            let mut state = GameState::new(seed);
            state.tuning.wave.spawn_chance = LinearStat::new(0.5, 0.0);
            state.tuning.wave.max_spawn_chance = 0.5;
            let bounds = state.bounds;
            let mut game_overs = 0;

            for bits in moves {
                let input = TickInput {
                    movement: MoveIntent {
                        up: bits & 1 != 0,
                        down: bits & 2 != 0,
                        left: bits & 4 != 0,
                        right: bits & 8 != 0,
                    },
                    fire: bits % 3 == 0,
                    close_marketplace: true,
                    ..Default::default()
                };
                let events = tick(&mut state, &input);
                game_overs += events.iter().filter(|e| matches!(e, GameEvent::GameOver { .. })).count();

                let player = state.player.as_ref().unwrap();
                prop_assert!(player.health >= 0.0);
                prop_assert_eq!(bounds.clamp(player.pos, player.half_extent()), player.pos);
                for c in &state.creatures {
                    prop_assert_eq!(bounds.clamp(c.pos, c.half_extent()), c.pos);
                    prop_assert!(c.speed <= state.tuning.creature.max_speed);
                }
                for p in &state.projectiles {
                    prop_assert!(bounds.contains(p.pos));
                }
            }
            prop_assert!(game_overs <= 1);
        }
    }
}

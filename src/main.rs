//! Horde Arena headless runner
//!
//! Plays a match with a simple autopilot and prints a JSON summary. Useful for
//! balance passes over tuning files and for reproducing a seed.

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Parser;
use glam::Vec2;
use serde::Serialize;

use horde_arena::sim::{GameEvent, GameState, MoveIntent, TickInput, UpgradeKind};
use horde_arena::{HostSignal, Tuning, run_frame};

#[derive(Debug, Parser)]
#[command(name = "horde-arena", about = "Run a headless Horde Arena match")]
struct Args {
    /// RNG seed for the match
    #[arg(long, default_value_t = 1)]
    seed: u64,
    /// Stop after this many ticks (60 per simulated second)
    #[arg(long, default_value_t = 36_000)]
    ticks: u64,
    /// JSON tuning file; defaults are used when omitted
    #[arg(long)]
    tuning: Option<PathBuf>,
    /// End the match with a win after this wave
    #[arg(long)]
    max_waves: Option<u32>,
}

#[derive(Debug, Default, Serialize)]
struct Summary {
    seed: u64,
    ticks: u64,
    wave: u32,
    score: u64,
    kills: u32,
    upgrades_bought: u32,
    game_over: bool,
    game_won: bool,
}

fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();
    let args = Args::parse();

    let mut tuning = match &args.tuning {
        Some(path) => Tuning::load(path).with_context(|| format!("loading tuning from {}", path.display()))?,
        None => Tuning::default(),
    };
    if args.max_waves.is_some() {
        tuning.wave.max_waves = args.max_waves;
    }
    tuning.validate().context("invalid tuning")?;

    log::info!("Horde Arena starting (seed {}, {} ticks)", args.seed, args.ticks);
    let mut state = GameState::with_tuning(args.seed, tuning);
    let mut scheduler = HostSignal::new();
    let mut summary = Summary {
        seed: args.seed,
        ..Default::default()
    };

    while state.time_ticks < args.ticks && !state.game_over && !state.game_won {
        let input = autopilot(&state);
        scheduler.signal();
        let events = run_frame(&mut state, &input, &mut scheduler, 0.0);
        for event in &events {
            match event {
                GameEvent::CreatureKilled { .. } => summary.kills += 1,
                GameEvent::MarketplaceOpened { wave } => log::info!("Intermission after wave {}", wave),
                GameEvent::MapChanged { tier } => log::info!("Map tier {}", tier),
                _ => {}
            }
        }
        summary.upgrades_bought += input.purchases.len() as u32;
    }

    summary.ticks = state.time_ticks;
    summary.wave = state.wave.current_wave;
    summary.score = state.score;
    summary.game_over = state.game_over;
    summary.game_won = state.game_won;
    log::info!(
        "Match ended at wave {} with score {} after {} ticks",
        summary.wave,
        summary.score,
        summary.ticks
    );
    println!("{}", serde_json::to_string_pretty(&summary)?);
    Ok(())
}

/// Kite away from the nearest creature while shooting at it; spend
/// everything affordable during intermissions.
fn autopilot(state: &GameState) -> TickInput {
    let Some(player) = state.player.as_ref() else {
        return TickInput::default();
    };

    if state.wave.show_marketplace() {
        let mut currency = player.currency;
        let mut upgrades = player.upgrades.clone();
        let mut purchases = Vec::new();
        for kind in UpgradeKind::ALL {
            if upgrades.purchase(kind, &mut currency, &state.tuning.upgrades).is_ok() {
                purchases.push(kind);
            }
        }
        return TickInput {
            purchases,
            close_marketplace: true,
            ..Default::default()
        };
    }

    let nearest = state
        .creatures
        .iter()
        .map(|c| c.pos)
        .min_by(|a, b| a.distance_squared(player.pos).total_cmp(&b.distance_squared(player.pos)));
    let Some(target) = nearest else {
        return TickInput::default();
    };

    let to_target = target - player.pos;
    let mut movement = MoveIntent::default();
    if to_target.length() < 250.0 {
        let away = -to_target;
        movement.left = away.x < -1.0;
        movement.right = away.x > 1.0;
        movement.up = away.y < -1.0;
        movement.down = away.y > 1.0;
    }

    TickInput {
        movement,
        fire: true,
        aim: Some(to_target).filter(|v| *v != Vec2::ZERO),
        ..Default::default()
    }
}

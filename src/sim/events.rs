//! Notifications emitted by a tick
//!
//! The host drains these after every tick and applies them to its own UI
//! state; the simulation never calls back into the host.

use glam::Vec2;
use serde::{Deserialize, Serialize};

use super::state::CreatureKind;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum GameEvent {
    ScoreChanged(u64),
    HealthChanged { health: f32, max_health: f32 },
    CurrencyChanged(u32),
    /// Visual pickup burst where a creature died
    CurrencyDropped { pos: Vec2, amount: u32 },
    CreatureKilled { id: u32, kind: CreatureKind },
    WaveStarted(u32),
    /// Banner text for the wave announcement
    WaveMessage(String),
    WaveCleared(u32),
    MarketplaceOpened { wave: u32 },
    MarketplaceClosed,
    MapChanged { tier: u32 },
    GameOver { score: u64, wave: u32 },
    GameWon { score: u64, wave: u32 },
}

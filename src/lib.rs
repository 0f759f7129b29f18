//! Horde Arena - a wave-survival arena simulation core
//!
//! Core modules:
//! - `sim`: Deterministic simulation (movement, AI, projectiles, collisions, waves)
//! - `tuning`: Data-driven game balance
//! - `scheduler`: Pluggable timing policy that drives `sim::tick`

pub mod scheduler;
pub mod sim;
pub mod tuning;

pub use scheduler::{FixedTimestep, HostSignal, Scheduler, run_frame};
pub use tuning::{Tuning, TuningError};

use glam::Vec2;

/// Game configuration constants
pub mod consts {
    /// Fixed simulation timestep (60 Hz, one tick per display frame)
    pub const SIM_DT: f32 = 1.0 / 60.0;
    /// Maximum substeps per frame to prevent spiral of death
    pub const MAX_SUBSTEPS: u32 = 8;
    /// Largest frame delta fed into the accumulator (seconds)
    pub const MAX_FRAME_DT: f32 = 0.1;

    /// Arena dimensions
    pub const MAP_WIDTH: f32 = 2000.0;
    pub const MAP_HEIGHT: f32 = 1500.0;

    /// Navigation grid cell edge (pixels)
    pub const NAV_CELL_SIZE: f32 = 40.0;
    /// Upper bound on A* node expansions per query
    pub const NAV_MAX_EXPANSIONS: usize = 4096;

    /// Highest level any single upgrade can reach
    pub const MAX_UPGRADE_LEVEL: u8 = 5;

    /// Waves per map tier
    pub const WAVES_PER_MAP_TIER: u32 = 5;
}

/// Rotate a vector by `angle` radians
#[inline]
pub fn rotate(v: Vec2, angle: f32) -> Vec2 {
    Vec2::from_angle(angle).rotate(v)
}

/// Unit vector for a direction, falling back to `fallback` when `v` is degenerate
#[inline]
pub fn direction_or(v: Vec2, fallback: Vec2) -> Vec2 {
    let n = v.normalize_or_zero();
    if n == Vec2::ZERO { fallback } else { n }
}

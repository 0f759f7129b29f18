//! Static arena layouts
//!
//! Each map tier is a fixed list of axis-aligned obstacles plus a player
//! spawn point. The tier is chosen from the wave number.

use glam::Vec2;
use serde::{Deserialize, Serialize};

use super::collision::Rect;
use crate::consts::{MAP_HEIGHT, MAP_WIDTH, WAVES_PER_MAP_TIER};

/// A static axis-aligned rectangle (top-left corner + extent)
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Obstacle {
    pub x: f32,
    pub y: f32,
    pub width: f32,
    pub height: f32,
}

impl Obstacle {
    pub const fn new(x: f32, y: f32, width: f32, height: f32) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }

    pub fn rect(&self) -> Rect {
        Rect::new(
            Vec2::new(self.x, self.y),
            Vec2::new(self.x + self.width, self.y + self.height),
        )
    }
}

/// The playable rectangle `[0, width] × [0, height]`
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct MapBounds {
    pub width: f32,
    pub height: f32,
}

impl Default for MapBounds {
    fn default() -> Self {
        Self {
            width: MAP_WIDTH,
            height: MAP_HEIGHT,
        }
    }
}

impl MapBounds {
    /// Clamp an entity center so its extent stays inside the map
    pub fn clamp(&self, center: Vec2, half_extent: Vec2) -> Vec2 {
        Vec2::new(
            center.x.clamp(half_extent.x, (self.width - half_extent.x).max(half_extent.x)),
            center.y.clamp(half_extent.y, (self.height - half_extent.y).max(half_extent.y)),
        )
    }

    /// Whether a point lies inside the map rectangle
    pub fn contains(&self, point: Vec2) -> bool {
        point.x >= 0.0 && point.x <= self.width && point.y >= 0.0 && point.y <= self.height
    }

    pub fn center(&self) -> Vec2 {
        Vec2::new(self.width * 0.5, self.height * 0.5)
    }
}

/// Obstacles and spawn point for one tier
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MapLayout {
    pub tier: u32,
    pub obstacles: Vec<Obstacle>,
    pub spawn: Vec2,
}

/// Number of distinct layouts
pub const MAP_TIER_COUNT: u32 = 3;

/// Tier used for a wave (waves are 1-based; wave 0 maps to tier 0)
pub fn tier_for_wave(wave: u32) -> u32 {
    (wave / WAVES_PER_MAP_TIER).min(MAP_TIER_COUNT - 1)
}

/// Layout used for a wave
pub fn layout_for_wave(wave: u32) -> MapLayout {
    layout_for_tier(tier_for_wave(wave))
}

/// Static layout for a tier (tiers past the last reuse the last)
pub fn layout_for_tier(tier: u32) -> MapLayout {
    let tier = tier.min(MAP_TIER_COUNT - 1);
    let spawn = MapBounds::default().center();
    let obstacles = match tier {
        // Open field with four pillars
        0 => vec![
            Obstacle::new(400.0, 300.0, 120.0, 120.0),
            Obstacle::new(1480.0, 300.0, 120.0, 120.0),
            Obstacle::new(400.0, 1080.0, 120.0, 120.0),
            Obstacle::new(1480.0, 1080.0, 120.0, 120.0),
        ],
        // Walls that force detours around the center
        1 => vec![
            Obstacle::new(300.0, 250.0, 40.0, 400.0),
            Obstacle::new(1660.0, 850.0, 40.0, 400.0),
            Obstacle::new(700.0, 450.0, 600.0, 40.0),
            Obstacle::new(700.0, 1010.0, 600.0, 40.0),
            Obstacle::new(150.0, 1150.0, 300.0, 40.0),
            Obstacle::new(1550.0, 300.0, 300.0, 40.0),
        ],
        // Broken ring around the spawn with corridor walls
        _ => vec![
            Obstacle::new(650.0, 400.0, 300.0, 40.0),
            Obstacle::new(1050.0, 400.0, 300.0, 40.0),
            Obstacle::new(650.0, 1060.0, 300.0, 40.0),
            Obstacle::new(1050.0, 1060.0, 300.0, 40.0),
            Obstacle::new(600.0, 400.0, 40.0, 260.0),
            Obstacle::new(600.0, 840.0, 40.0, 260.0),
            Obstacle::new(1360.0, 400.0, 40.0, 260.0),
            Obstacle::new(1360.0, 840.0, 40.0, 260.0),
            Obstacle::new(200.0, 150.0, 40.0, 500.0),
            Obstacle::new(1760.0, 850.0, 40.0, 500.0),
        ],
    };
    MapLayout {
        tier,
        obstacles,
        spawn,
    }
}

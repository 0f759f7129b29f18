//! Marketplace upgrades
//!
//! Six independently leveled upgrades bought with currency between waves.

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::consts::MAX_UPGRADE_LEVEL;
use crate::tuning::{PlayerTuning, UpgradeTuning};

/// Upgradeable player stat
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum UpgradeKind {
    WeaponDamage,
    ProjectileCount,
    ProjectileSize,
    FireRate,
    Spread,
    MaxHealth,
}

impl UpgradeKind {
    pub const ALL: [UpgradeKind; 6] = [
        UpgradeKind::WeaponDamage,
        UpgradeKind::ProjectileCount,
        UpgradeKind::ProjectileSize,
        UpgradeKind::FireRate,
        UpgradeKind::Spread,
        UpgradeKind::MaxHealth,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            UpgradeKind::WeaponDamage => "Weapon Damage",
            UpgradeKind::ProjectileCount => "Projectile Count",
            UpgradeKind::ProjectileSize => "Projectile Size",
            UpgradeKind::FireRate => "Fire Rate",
            UpgradeKind::Spread => "Spread",
            UpgradeKind::MaxHealth => "Max Health",
        }
    }
}

/// Why a purchase was refused
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum UpgradeError {
    #[error("the marketplace is closed")]
    MarketplaceClosed,
    #[error("no player to upgrade")]
    NoPlayer,
    #[error("{} is already at max level", .0.as_str())]
    MaxLevel(UpgradeKind),
    #[error("not enough currency: need {needed}, have {available}")]
    InsufficientFunds { needed: u32, available: u32 },
}

/// Per-upgrade levels, each in `0..=MAX_UPGRADE_LEVEL`
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Upgrades {
    pub weapon_damage: u8,
    pub projectile_count: u8,
    pub projectile_size: u8,
    pub fire_rate: u8,
    pub spread: u8,
    pub max_health: u8,
}

impl Upgrades {
    pub fn level(&self, kind: UpgradeKind) -> u8 {
        match kind {
            UpgradeKind::WeaponDamage => self.weapon_damage,
            UpgradeKind::ProjectileCount => self.projectile_count,
            UpgradeKind::ProjectileSize => self.projectile_size,
            UpgradeKind::FireRate => self.fire_rate,
            UpgradeKind::Spread => self.spread,
            UpgradeKind::MaxHealth => self.max_health,
        }
    }

    fn level_mut(&mut self, kind: UpgradeKind) -> &mut u8 {
        match kind {
            UpgradeKind::WeaponDamage => &mut self.weapon_damage,
            UpgradeKind::ProjectileCount => &mut self.projectile_count,
            UpgradeKind::ProjectileSize => &mut self.projectile_size,
            UpgradeKind::FireRate => &mut self.fire_rate,
            UpgradeKind::Spread => &mut self.spread,
            UpgradeKind::MaxHealth => &mut self.max_health,
        }
    }

    /// Price of the next level, `None` when maxed
    pub fn cost(&self, kind: UpgradeKind, tuning: &UpgradeTuning) -> Option<u32> {
        let level = self.level(kind);
        (level < MAX_UPGRADE_LEVEL).then(|| tuning.base_cost * (u32::from(level) + 1))
    }

    /// Spend currency on the next level of `kind`
    pub fn purchase(
        &mut self,
        kind: UpgradeKind,
        currency: &mut u32,
        tuning: &UpgradeTuning,
    ) -> Result<u8, UpgradeError> {
        let cost = self.cost(kind, tuning).ok_or(UpgradeError::MaxLevel(kind))?;
        if *currency < cost {
            return Err(UpgradeError::InsufficientFunds {
                needed: cost,
                available: *currency,
            });
        }
        *currency -= cost;
        let level = self.level_mut(kind);
        *level += 1;
        Ok(*level)
    }

    pub fn weapon_damage(&self, player: &PlayerTuning, tuning: &UpgradeTuning) -> f32 {
        player.base_damage + f32::from(self.weapon_damage) * tuning.damage_per_level
    }

    /// Bolts per volley
    pub fn projectile_count(&self) -> u32 {
        1 + u32::from(self.projectile_count)
    }

    pub fn bolt_radius(&self, player: &PlayerTuning, tuning: &UpgradeTuning) -> f32 {
        player.bolt_radius + f32::from(self.projectile_size) * tuning.bolt_radius_per_level
    }

    /// Seconds between volleys
    pub fn fire_interval(&self, player: &PlayerTuning, tuning: &UpgradeTuning) -> f32 {
        (player.fire_interval_secs - f32::from(self.fire_rate) * tuning.fire_interval_per_level)
            .max(tuning.min_fire_interval_secs)
    }

    /// Angle between adjacent bolts in a volley
    pub fn volley_spread(&self, player: &PlayerTuning, tuning: &UpgradeTuning) -> f32 {
        player.volley_spread + f32::from(self.spread) * tuning.spread_per_level
    }

    pub fn max_health(&self, player: &PlayerTuning, tuning: &UpgradeTuning) -> f32 {
        player.max_health + f32::from(self.max_health) * tuning.max_health_per_level
    }
}

//! Health/shield bookkeeping shared by the player and bosses
//!
//! Absorption order is fixed: shield first, then health. Neither value ever
//! leaves `[0, max]`.

use serde::{Deserialize, Serialize};

use crate::error::{AmountKind, SimError, check_amount};

/// Where a hit came from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SourceKind {
    EnemyProjectile,
    Contact,
    /// Boss-owned area effects: toxic pools, mines, shockwaves, lasers
    Hazard,
    Explosion,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DamageSource {
    pub kind: SourceKind,
}

impl DamageSource {
    pub const fn new(kind: SourceKind) -> Self {
        Self { kind }
    }

    /// Hits that re-arm the brief post-hit invulnerability window
    pub fn arms_hit_invulnerability(&self) -> bool {
        self.kind == SourceKind::EnemyProjectile
    }
}

/// How an absorbed hit was split
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct Absorption {
    pub shield_damage: f32,
    pub health_damage: f32,
    /// Shield went from positive to zero during this hit
    pub shield_broke: bool,
}

impl Absorption {
    pub fn total(&self) -> f32 {
        self.shield_damage + self.health_damage
    }
}

/// Health and shield pools
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Vitals {
    pub hp: f32,
    pub max_hp: f32,
    pub shield: f32,
    pub max_shield: f32,
}

impl Vitals {
    pub fn new(max_hp: f32, max_shield: f32) -> Self {
        Self {
            hp: max_hp,
            max_hp,
            shield: max_shield,
            max_shield,
        }
    }

    /// Apply already-modified damage: shield first, remainder to health
    pub fn absorb(&mut self, amount: f32) -> Result<Absorption, SimError> {
        let amount = check_amount(AmountKind::Damage, amount)?;
        let had_shield = self.shield > 0.0;

        let shield_damage = amount.min(self.shield);
        self.shield = (self.shield - shield_damage).max(0.0);

        let remainder = amount - shield_damage;
        let health_damage = remainder.min(self.hp);
        self.hp = (self.hp - remainder).max(0.0);

        Ok(Absorption {
            shield_damage,
            health_damage,
            shield_broke: had_shield && self.shield <= 0.0,
        })
    }

    /// Restore health, capped at max. Returns the amount actually healed.
    pub fn heal(&mut self, amount: f32) -> Result<f32, SimError> {
        let amount = check_amount(AmountKind::Heal, amount)?;
        let before = self.hp;
        self.hp = (self.hp + amount).min(self.max_hp);
        Ok(self.hp - before)
    }

    /// Restore shield, capped at max
    pub fn restore_shield(&mut self, amount: f32) -> Result<f32, SimError> {
        let amount = check_amount(AmountKind::Heal, amount)?;
        let before = self.shield;
        self.shield = (self.shield + amount).min(self.max_shield);
        Ok(self.shield - before)
    }

    /// Change maxima, keeping current values in range
    pub fn set_max(&mut self, max_hp: f32, max_shield: f32) {
        self.max_hp = max_hp.max(1.0);
        self.max_shield = max_shield.max(0.0);
        self.hp = self.hp.clamp(0.0, self.max_hp);
        self.shield = self.shield.clamp(0.0, self.max_shield);
    }

    pub fn health_ratio(&self) -> f32 {
        if self.max_hp <= 0.0 {
            0.0
        } else {
            self.hp / self.max_hp
        }
    }

    pub fn shield_ratio(&self) -> f32 {
        if self.max_shield <= 0.0 {
            0.0
        } else {
            self.shield / self.max_shield
        }
    }

    pub fn is_dead(&self) -> bool {
        self.hp <= 0.0
    }
}

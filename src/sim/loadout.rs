//! Player capabilities handed in by the progression layer
//!
//! The progression/skill screens resolve everything into a [`ProgressionBundle`]
//! between waves. The core only reads it.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ExplosiveConfig {
    pub radius: f32,
    /// Blast damage as a fraction of the projectile's damage
    pub damage_fraction: f32,
}

impl Default for ExplosiveConfig {
    fn default() -> Self {
        Self {
            radius: 70.0,
            damage_fraction: 0.6,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ChainHitConfig {
    /// Chance for each bounce to happen
    pub chance: f64,
    pub range: f32,
    /// Each bounce multiplies the previous bounce's damage by this
    pub damage_factor: f32,
    pub max_bounces: u32,
}

impl Default for ChainHitConfig {
    fn default() -> Self {
        Self {
            chance: 0.35,
            range: 160.0,
            damage_factor: 1.15,
            max_bounces: 3,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct HomingConfig {
    /// Velocity blend rate per second
    pub strength: f32,
    /// Search for the nearest target only every Nth tick
    pub retarget_every: u32,
}

impl Default for HomingConfig {
    fn default() -> Self {
        Self {
            strength: 5.0,
            retarget_every: 6,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SlowFieldConfig {
    pub radius: f32,
    /// Enemy speed multiplier inside the field
    pub factor: f32,
}

impl Default for SlowFieldConfig {
    fn default() -> Self {
        Self {
            radius: 200.0,
            factor: 0.6,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BarrierConfig {
    /// Triggers when health ratio drops to this or below
    pub health_threshold: f32,
    pub duration_ms: f32,
    pub cooldown_ms: f32,
}

impl Default for BarrierConfig {
    fn default() -> Self {
        Self {
            health_threshold: 0.3,
            duration_ms: 3000.0,
            cooldown_ms: 30_000.0,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct EmergencyHealConfig {
    pub health_threshold: f32,
    /// Heal this fraction of max health
    pub heal_fraction: f32,
    pub cooldown_ms: f32,
}

impl Default for EmergencyHealConfig {
    fn default() -> Self {
        Self {
            health_threshold: 0.25,
            heal_fraction: 0.35,
            cooldown_ms: 45_000.0,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct OverchargeConfig {
    pub every_nth_shot: u32,
    pub damage_multiplier: f32,
}

impl Default for OverchargeConfig {
    fn default() -> Self {
        Self {
            every_nth_shot: 5,
            damage_multiplier: 2.5,
        }
    }
}

/// Ability flags. `None`/zero means the ability is not owned.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Loadout {
    /// Each level lets a shot pass through one more enemy
    pub piercing_level: u32,
    pub triple_shot: bool,
    pub explosive: Option<ExplosiveConfig>,
    pub chain_hit: Option<ChainHitConfig>,
    /// Heal this fraction of direct-hit damage dealt
    pub life_steal: Option<f32>,
    pub slow_field: Option<SlowFieldConfig>,
    pub homing: Option<HomingConfig>,
    pub barrier_phase: Option<BarrierConfig>,
    pub emergency_heal: Option<EmergencyHealConfig>,
    pub ricochet_bounces: u32,
    /// Double damage against boss shields
    pub shield_breaker: bool,
    pub overcharge_burst: Option<OverchargeConfig>,
}

impl Loadout {
    /// How many enemies a shot may hit before it is spent
    pub fn piercing_count(&self) -> Option<u32> {
        (self.piercing_level > 0).then_some(self.piercing_level + 1)
    }
}

/// Resolved stat multipliers
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct StatBundle {
    pub damage_multiplier: f32,
    pub fire_rate_multiplier: f32,
    pub rotation_speed_multiplier: f32,
    /// Added to the base crit chance
    pub crit_bonus: f32,
    pub damage_taken_multiplier: f32,
    /// Subtracted from every hit after the multiplier
    pub flat_damage_reduction: f32,
    pub move_speed_multiplier: f32,
    pub bonus_max_hp: f32,
    pub bonus_max_shield: f32,
}

impl Default for StatBundle {
    fn default() -> Self {
        Self {
            damage_multiplier: 1.0,
            fire_rate_multiplier: 1.0,
            rotation_speed_multiplier: 1.0,
            crit_bonus: 0.0,
            damage_taken_multiplier: 1.0,
            flat_damage_reduction: 0.0,
            move_speed_multiplier: 1.0,
            bonus_max_hp: 0.0,
            bonus_max_shield: 0.0,
        }
    }
}

/// Everything the progression layer hands the core between waves
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ProgressionBundle {
    pub stats: StatBundle,
    pub loadout: Loadout,
}

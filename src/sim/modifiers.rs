//! Ascension modifiers and environmental wave modifiers
//!
//! An ascension modifier is a plain record: stat deltas folded into the
//! player's stats, plus at most one typed hook the core calls at a fixed
//! extension point (enemy killed, wave started).

use rand::Rng;
use rand_pcg::Pcg32;
use serde::{Deserialize, Serialize};

use super::loadout::StatBundle;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Stat {
    Damage,
    FireRate,
    RotationSpeed,
    CritChance,
    DamageTaken,
    FlatReduction,
    MoveSpeed,
    MaxHp,
    MaxShield,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum DeltaOp {
    Multiply,
    Add,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct StatDelta {
    pub stat: Stat,
    pub op: DeltaOp,
    pub value: f32,
}

impl StatDelta {
    pub const fn mul(stat: Stat, value: f32) -> Self {
        Self {
            stat,
            op: DeltaOp::Multiply,
            value,
        }
    }

    pub const fn add(stat: Stat, value: f32) -> Self {
        Self {
            stat,
            op: DeltaOp::Add,
            value,
        }
    }

    fn apply(&self, stats: &mut StatBundle) {
        let field = match self.stat {
            Stat::Damage => &mut stats.damage_multiplier,
            Stat::FireRate => &mut stats.fire_rate_multiplier,
            Stat::RotationSpeed => &mut stats.rotation_speed_multiplier,
            Stat::CritChance => &mut stats.crit_bonus,
            Stat::DamageTaken => &mut stats.damage_taken_multiplier,
            Stat::FlatReduction => &mut stats.flat_damage_reduction,
            Stat::MoveSpeed => &mut stats.move_speed_multiplier,
            Stat::MaxHp => &mut stats.bonus_max_hp,
            Stat::MaxShield => &mut stats.bonus_max_shield,
        };
        match self.op {
            DeltaOp::Multiply => *field *= self.value,
            DeltaOp::Add => *field += self.value,
        }
    }
}

/// Event-driven behavior attached to a modifier
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum ModifierHook {
    /// Killed enemies burst, hurting their neighbours
    ExplodeOnKill {
        radius: f32,
        /// Fraction of the victim's max health dealt at the centre
        damage_fraction: f32,
    },
    HealOnKill { amount: f32 },
    ShieldOnWaveStart { amount: f32 },
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AscensionModifier {
    pub name: String,
    #[serde(default)]
    pub deltas: Vec<StatDelta>,
    #[serde(default)]
    pub hook: Option<ModifierHook>,
}

impl AscensionModifier {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            deltas: Vec::new(),
            hook: None,
        }
    }

    pub fn with_delta(mut self, delta: StatDelta) -> Self {
        self.deltas.push(delta);
        self
    }

    pub fn with_hook(mut self, hook: ModifierHook) -> Self {
        self.hook = Some(hook);
        self
    }
}

/// Fold every modifier's deltas over the progression stats, in list order
pub fn resolve_stats(base: &StatBundle, modifiers: &[AscensionModifier]) -> StatBundle {
    let mut stats = *base;
    for delta in modifiers.iter().flat_map(|m| m.deltas.iter()) {
        delta.apply(&mut stats);
    }
    stats
}

/// Environmental effect bundle for a single regular wave
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum WaveModifier {
    /// More, weaker enemies
    Swarm,
    /// Tougher enemies
    Armored,
    /// Faster enemies
    Haste,
    /// Reduced visibility: enemies must come further in to be targeted
    Fog,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct WaveModifierEffects {
    pub count_multiplier: f32,
    pub health_multiplier: f32,
    pub speed_multiplier: f32,
    pub damage_multiplier: f32,
    pub visibility_margin_bonus: f32,
}

impl Default for WaveModifierEffects {
    fn default() -> Self {
        Self {
            count_multiplier: 1.0,
            health_multiplier: 1.0,
            speed_multiplier: 1.0,
            damage_multiplier: 1.0,
            visibility_margin_bonus: 0.0,
        }
    }
}

impl WaveModifier {
    pub const ALL: [WaveModifier; 4] = [
        WaveModifier::Swarm,
        WaveModifier::Armored,
        WaveModifier::Haste,
        WaveModifier::Fog,
    ];

    pub fn effects(&self) -> WaveModifierEffects {
        let base = WaveModifierEffects::default();
        match self {
            WaveModifier::Swarm => WaveModifierEffects {
                count_multiplier: 1.5,
                health_multiplier: 0.7,
                ..base
            },
            WaveModifier::Armored => WaveModifierEffects {
                health_multiplier: 1.5,
                speed_multiplier: 0.9,
                ..base
            },
            WaveModifier::Haste => WaveModifierEffects {
                speed_multiplier: 1.3,
                ..base
            },
            WaveModifier::Fog => WaveModifierEffects {
                visibility_margin_bonus: 120.0,
                damage_multiplier: 1.1,
                ..base
            },
        }
    }

    /// Roll for an optional modifier. Boss waves never get one.
    pub fn roll(rng: &mut Pcg32, chance: f64, boss_wave: bool) -> Option<Self> {
        if boss_wave || !rng.random_bool(chance.clamp(0.0, 1.0)) {
            return None;
        }
        let index = rng.random_range(0..Self::ALL.len());
        Some(Self::ALL[index])
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;

    #[test]
    fn test_resolve_stats_in_order() {
        let base = StatBundle::default();
        let mods = vec![
            AscensionModifier::new("glass cannon")
                .with_delta(StatDelta::mul(Stat::Damage, 1.5))
                .with_delta(StatDelta::mul(Stat::DamageTaken, 1.25)),
            AscensionModifier::new("sharpshooter").with_delta(StatDelta::add(Stat::CritChance, 0.1)),
            AscensionModifier::new("more")
                .with_delta(StatDelta::add(Stat::Damage, 0.5))
                .with_hook(ModifierHook::HealOnKill { amount: 2.0 }),
        ];
        let stats = resolve_stats(&base, &mods);
        assert!((stats.damage_multiplier - 2.0).abs() < 1e-6);
        assert!((stats.damage_taken_multiplier - 1.25).abs() < 1e-6);
        assert!((stats.crit_bonus - 0.1).abs() < 1e-6);
        assert_eq!(stats.fire_rate_multiplier, 1.0);
    }

    #[test]
    fn test_boss_waves_never_roll_modifier() {
        let mut rng = Pcg32::seed_from_u64(7);
        for _ in 0..100 {
            assert_eq!(WaveModifier::roll(&mut rng, 1.0, true), None);
        }
        assert!(WaveModifier::roll(&mut rng, 1.0, false).is_some());
        assert!(WaveModifier::roll(&mut rng, 0.0, false).is_none());
    }

    #[test]
    fn test_modifier_effects() {
        assert_eq!(WaveModifier::Swarm.effects().count_multiplier, 1.5);
        assert_eq!(WaveModifier::Fog.effects().visibility_margin_bonus, 120.0);
        assert_eq!(WaveModifier::Haste.effects().health_multiplier, 1.0);
    }
}

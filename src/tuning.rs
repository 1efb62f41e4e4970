//! Data-driven game balance
//!
//! Every number the simulation scales by lives here so a balance pass is a
//! JSON edit. Missing fields fall back to the defaults below.

use serde::{Deserialize, Serialize};

use crate::error::SimError;

/// Logical arena bounds (origin at top-left, y down)
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ArenaTuning {
    pub width: f32,
    pub height: f32,
    /// Enemies closer than this to an edge (or beyond it) are not targetable
    pub visibility_margin: f32,
}

impl Default for ArenaTuning {
    fn default() -> Self {
        Self {
            width: 1600.0,
            height: 900.0,
            visibility_margin: 20.0,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PlayerTuning {
    pub max_hp: f32,
    pub max_shield: f32,
    pub radius: f32,
    /// Movement speed (px/s)
    pub move_speed: f32,
    pub base_damage: f32,
    /// Cooldown between shots before fire-rate modifiers
    pub base_fire_interval_ms: f32,
    /// Floor on the modified cooldown
    pub min_fire_interval_ms: f32,
    /// Turret turn rate (rad/s)
    pub rotation_speed: f32,
    /// Give up on a target we have been turning toward for this long
    pub max_rotation_time_ms: f32,
    /// `k` in the target score `d² - (deficit * k)²`
    pub target_health_weight: f32,
    pub base_crit_chance: f32,
    /// Brief invulnerability after an enemy projectile lands
    pub hit_invulnerability_ms: f32,
    pub shield_regen_delay_ms: f32,
    pub shield_regen_per_sec: f32,
    /// Angle between the centre and side shots of a triple shot (rad)
    pub triple_shot_spread: f32,
}

impl Default for PlayerTuning {
    fn default() -> Self {
        Self {
            max_hp: 100.0,
            max_shield: 25.0,
            radius: 18.0,
            move_speed: 220.0,
            base_damage: 10.0,
            base_fire_interval_ms: 400.0,
            min_fire_interval_ms: 60.0,
            rotation_speed: 6.0,
            max_rotation_time_ms: 1500.0,
            target_health_weight: 2.0,
            base_crit_chance: 0.05,
            hit_invulnerability_ms: 250.0,
            shield_regen_delay_ms: 3000.0,
            shield_regen_per_sec: 5.0,
            triple_shot_spread: 0.26,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ProjectileTuning {
    /// Player projectile speed (px/s)
    pub speed: f32,
    pub radius: f32,
    pub lifetime_ms: f32,
    pub enemy_speed: f32,
    pub enemy_radius: f32,
    pub enemy_lifetime_ms: f32,
    /// Homing projectiles ignore enemies further than this
    pub homing_range: f32,
}

impl Default for ProjectileTuning {
    fn default() -> Self {
        Self {
            speed: 700.0,
            radius: 5.0,
            lifetime_ms: 2500.0,
            enemy_speed: 320.0,
            enemy_radius: 6.0,
            enemy_lifetime_ms: 4000.0,
            homing_range: 450.0,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct WaveTuning {
    pub base_enemy_count: u32,
    pub enemies_per_wave: u32,
    pub base_spawn_interval_ms: f32,
    pub spawn_interval_reduction_ms: f32,
    pub min_spawn_interval_ms: f32,
    pub health_factor: f32,
    pub speed_factor: f32,
    pub damage_factor: f32,
    pub max_health_multiplier: f32,
    pub max_speed_multiplier: f32,
    pub max_damage_multiplier: f32,
    /// Every Nth wave is a boss wave
    pub boss_every: u32,
    pub completion_debounce_ms: f32,
    /// Chance of an environmental modifier on a regular wave
    pub modifier_chance: f64,
    /// Spawn this far outside the visible edge
    pub spawn_edge_offset: f32,
}

impl Default for WaveTuning {
    fn default() -> Self {
        Self {
            base_enemy_count: 6,
            enemies_per_wave: 2,
            base_spawn_interval_ms: 1800.0,
            spawn_interval_reduction_ms: 60.0,
            min_spawn_interval_ms: 350.0,
            health_factor: 1.12,
            speed_factor: 1.03,
            damage_factor: 1.07,
            max_health_multiplier: 40.0,
            max_speed_multiplier: 2.0,
            max_damage_multiplier: 8.0,
            boss_every: 5,
            completion_debounce_ms: crate::consts::WAVE_CLEAR_DEBOUNCE_MS,
            modifier_chance: 0.25,
            spawn_edge_offset: 30.0,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct EnemyTuning {
    /// Minimum time between two contact hits from the same enemy
    pub contact_cooldown_ms: f32,
    pub gunner_fire_interval_ms: f32,
    /// Gunners hold position at this distance and shoot
    pub gunner_range: f32,
    pub bomber_blast_radius: f32,
}

impl Default for EnemyTuning {
    fn default() -> Self {
        Self {
            contact_cooldown_ms: 800.0,
            gunner_fire_interval_ms: 2200.0,
            gunner_range: 380.0,
            bomber_blast_radius: 90.0,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct BossTuning {
    pub base_health: f32,
    pub radius: f32,
    pub speed: f32,
    pub contact_damage: f32,
    pub projectile_damage: f32,
    /// Distance the shared approach behavior holds from the player
    pub standoff_distance: f32,
    pub attack_interval_ms: f32,
    pub minion_interval_ms: f32,
    pub minions_per_spawn: u32,
}

impl Default for BossTuning {
    fn default() -> Self {
        Self {
            base_health: 900.0,
            radius: 48.0,
            speed: 90.0,
            contact_damage: 25.0,
            projectile_damage: 12.0,
            standoff_distance: 260.0,
            attack_interval_ms: 2800.0,
            minion_interval_ms: 9000.0,
            minions_per_spawn: 2,
        }
    }
}

/// All balance knobs
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Tuning {
    pub arena: ArenaTuning,
    pub player: PlayerTuning,
    pub projectile: ProjectileTuning,
    pub waves: WaveTuning,
    pub enemies: EnemyTuning,
    pub bosses: BossTuning,
}

impl Tuning {
    /// Parse and validate a JSON balance file
    pub fn from_json(json: &str) -> Result<Self, SimError> {
        let tuning: Tuning = serde_json::from_str(json)?;
        tuning.validate()?;
        Ok(tuning)
    }

    /// Reject configurations that cannot produce a playable arena
    pub fn validate(&self) -> Result<(), SimError> {
        let positive = [
            ("arena.width", self.arena.width),
            ("arena.height", self.arena.height),
            ("player.max_hp", self.player.max_hp),
            ("player.radius", self.player.radius),
            ("player.base_fire_interval_ms", self.player.base_fire_interval_ms),
            ("player.min_fire_interval_ms", self.player.min_fire_interval_ms),
            ("player.rotation_speed", self.player.rotation_speed),
            ("projectile.speed", self.projectile.speed),
            ("projectile.enemy_speed", self.projectile.enemy_speed),
            ("projectile.lifetime_ms", self.projectile.lifetime_ms),
            ("waves.min_spawn_interval_ms", self.waves.min_spawn_interval_ms),
            ("waves.health_factor", self.waves.health_factor),
            ("waves.speed_factor", self.waves.speed_factor),
            ("waves.damage_factor", self.waves.damage_factor),
            ("waves.max_health_multiplier", self.waves.max_health_multiplier),
            ("waves.max_speed_multiplier", self.waves.max_speed_multiplier),
            ("waves.max_damage_multiplier", self.waves.max_damage_multiplier),
            ("bosses.base_health", self.bosses.base_health),
        ];
        for (name, value) in positive {
            if !(value.is_finite() && value > 0.0) {
                return Err(SimError::InvalidTuning(format!(
                    "{name} must be positive, got {value}"
                )));
            }
        }
        if self.player.max_shield < 0.0 {
            return Err(SimError::InvalidTuning(
                "player.max_shield must not be negative".to_string(),
            ));
        }
        if self.waves.boss_every == 0 {
            return Err(SimError::InvalidTuning(
                "waves.boss_every must be at least 1".to_string(),
            ));
        }
        if self.waves.completion_debounce_ms < 0.0 {
            return Err(SimError::InvalidTuning(
                "waves.completion_debounce_ms must not be negative".to_string(),
            ));
        }
        if !(0.0..=1.0).contains(&self.waves.modifier_chance) {
            return Err(SimError::InvalidTuning(
                "waves.modifier_chance must be within [0, 1]".to_string(),
            ));
        }
        let margin = self.arena.visibility_margin * 2.0;
        if margin >= self.arena.width || margin >= self.arena.height {
            return Err(SimError::InvalidTuning(
                "arena.visibility_margin leaves no visible area".to_string(),
            ));
        }
        Ok(())
    }
}

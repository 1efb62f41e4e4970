//! Wave pacing: how many enemies, how fast, how strong, and when a wave is
//! really over

use rand_pcg::Pcg32;
use serde::{Deserialize, Serialize};

use super::boss::BossKind;
use super::enemy::{EnemyKind, StatScaling, roll_enemy_kind};
use super::modifiers::WaveModifier;
use crate::tuning::WaveTuning;

/// Enemies scheduled for `wave`: `base + wave * per_wave`
pub fn enemy_count(wave: u32, tuning: &WaveTuning) -> u32 {
    tuning
        .base_enemy_count
        .saturating_add(wave.saturating_mul(tuning.enemies_per_wave))
}

/// Gap between spawns on `wave`, floored at the minimum
pub fn spawn_interval_ms(wave: u32, tuning: &WaveTuning) -> f32 {
    (tuning.base_spawn_interval_ms - wave as f32 * tuning.spawn_interval_reduction_ms)
        .max(tuning.min_spawn_interval_ms)
}

/// `factor^(wave - 1)` per stat, each capped
pub fn stat_scaling(wave: u32, tuning: &WaveTuning) -> StatScaling {
    let exponent = wave.saturating_sub(1).min(i32::MAX as u32) as i32;
    let scale = |factor: f32, cap: f32| {
        let value = factor.powi(exponent);
        if value.is_finite() { value.min(cap) } else { cap }
    };
    StatScaling {
        health: scale(tuning.health_factor, tuning.max_health_multiplier),
        speed: scale(tuning.speed_factor, tuning.max_speed_multiplier),
        damage: scale(tuning.damage_factor, tuning.max_damage_multiplier),
    }
}

pub fn is_boss_wave(wave: u32, tuning: &WaveTuning) -> bool {
    wave > 0 && wave % tuning.boss_every.max(1) == 0
}

/// Boss for a boss wave, following the fixed rotation
pub fn boss_kind_for_wave(wave: u32, tuning: &WaveTuning) -> BossKind {
    let index = (wave / tuning.boss_every.max(1)).saturating_sub(1);
    BossKind::from_rotation(index)
}

/// Something the scheduler wants spawned this tick
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SpawnRequest {
    Enemy(EnemyKind),
    Boss(BossKind),
}

/// Fired once per wave, after the debounce
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct WaveCompleted {
    pub wave: u32,
    pub enemies_killed: u32,
    pub duration_ms: f32,
}

/// What a freshly started wave looks like
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct WaveStart {
    pub wave: u32,
    pub enemy_count: u32,
    pub boss: Option<BossKind>,
    pub modifier: Option<WaveModifier>,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct WaveTick {
    pub spawns: Vec<SpawnRequest>,
    pub completed: Option<WaveCompleted>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct WaveManager {
    /// Current wave, 1-based; 0 before the first wave
    pub wave: u32,
    pub active: bool,
    pub enemies_to_spawn: u32,
    pub enemies_spawned: u32,
    pub enemies_killed: u32,
    pub spawn_timer_ms: f32,
    pub spawn_interval_ms: f32,
    pub scaling: StatScaling,
    pub boss_wave: bool,
    /// Boss not yet handed to the spawner
    pub boss_pending: Option<BossKind>,
    pub modifier: Option<WaveModifier>,
    /// How long the clear condition has held without a break
    pub clear_ms: f32,
    pub completed: bool,
    pub elapsed_ms: f32,
}

impl WaveManager {
    pub fn start_wave(&mut self, wave: u32, tuning: &WaveTuning, rng: &mut Pcg32) -> WaveStart {
        let boss_wave = is_boss_wave(wave, tuning);
        let modifier = WaveModifier::roll(rng, tuning.modifier_chance, boss_wave);
        let effects = modifier.map(|m| m.effects()).unwrap_or_default();

        let base_count = enemy_count(wave, tuning);
        let count = if boss_wave {
            // Boss plus a light escort
            base_count / 2
        } else {
            ((base_count as f32 * effects.count_multiplier).round() as u32).max(1)
        };

        let mut scaling = stat_scaling(wave, tuning);
        scaling.health *= effects.health_multiplier;
        scaling.speed *= effects.speed_multiplier;
        scaling.damage *= effects.damage_multiplier;

        let interval = spawn_interval_ms(wave, tuning);
        let boss = boss_wave.then(|| boss_kind_for_wave(wave, tuning));

        *self = WaveManager {
            wave,
            active: true,
            enemies_to_spawn: count,
            enemies_spawned: 0,
            enemies_killed: 0,
            spawn_timer_ms: interval * 0.5,
            spawn_interval_ms: interval,
            scaling,
            boss_wave,
            boss_pending: boss,
            modifier,
            clear_ms: 0.0,
            completed: false,
            elapsed_ms: 0.0,
        };

        WaveStart {
            wave,
            enemy_count: count,
            boss,
            modifier,
        }
    }

    pub fn record_kill(&mut self) {
        if self.active {
            self.enemies_killed += 1;
        }
    }

    /// Extra targeting margin from the active modifier
    pub fn visibility_margin_bonus(&self) -> f32 {
        self.modifier
            .map(|m| m.effects().visibility_margin_bonus)
            .unwrap_or(0.0)
    }

    /// Nothing left to spawn
    pub fn spawns_exhausted(&self) -> bool {
        self.enemies_to_spawn == 0 && self.boss_pending.is_none()
    }

    /// Advance pacing and check for completion.
    ///
    /// Completion needs every spawn issued and zero live enemies, held for
    /// the debounce window. Any break in the condition restarts the window.
    /// Once fired it does not fire again for this wave.
    pub fn update(&mut self, dt_ms: f32, live_enemies: usize, tuning: &WaveTuning, rng: &mut Pcg32) -> WaveTick {
        let mut out = WaveTick::default();
        if !self.active || self.completed {
            return out;
        }
        self.elapsed_ms += dt_ms;

        if let Some(kind) = self.boss_pending.take() {
            out.spawns.push(SpawnRequest::Boss(kind));
        }

        if self.enemies_to_spawn > 0 {
            self.spawn_timer_ms -= dt_ms;
            if self.spawn_timer_ms <= 0.0 {
                self.spawn_timer_ms += self.spawn_interval_ms;
                self.enemies_to_spawn -= 1;
                self.enemies_spawned += 1;
                out.spawns.push(SpawnRequest::Enemy(roll_enemy_kind(self.wave, rng)));
            }
        }

        let clear = self.spawns_exhausted() && out.spawns.is_empty() && live_enemies == 0;
        if !clear {
            self.clear_ms = 0.0;
            return out;
        }
        self.clear_ms += dt_ms;
        if self.clear_ms >= tuning.completion_debounce_ms {
            self.completed = true;
            self.active = false;
            out.completed = Some(WaveCompleted {
                wave: self.wave,
                enemies_killed: self.enemies_killed,
                duration_ms: self.elapsed_ms,
            });
        }
        out
    }
}

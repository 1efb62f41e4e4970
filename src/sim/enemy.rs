//! Regular enemies and the shared enemy record bosses are built on

use glam::Vec2;
use rand::Rng;
use rand::distr::Distribution;
use rand::distr::weighted::WeightedIndex;
use serde::{Deserialize, Serialize};

use super::boss::Boss;
use crate::consts::EPSILON;
use crate::error::{AmountKind, SimError, check_amount};
use crate::tuning::{ArenaTuning, EnemyTuning};

/// Enemy archetypes
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum EnemyKind {
    /// Basic chaser
    Grunt,
    /// Fast and fragile
    Runner,
    /// Slow, tanky, hits hard
    Brute,
    /// Holds range and shoots
    Gunner,
    /// Detonates on contact
    Bomber,
    Boss,
}

/// Unscaled stats for a kind
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct EnemyStats {
    pub health: f32,
    /// px/s
    pub speed: f32,
    pub damage: f32,
    pub radius: f32,
    pub score: u32,
}

impl EnemyKind {
    /// Kinds that waves roll from, in unlock order
    pub const ROSTER: [EnemyKind; 5] = [
        EnemyKind::Grunt,
        EnemyKind::Runner,
        EnemyKind::Gunner,
        EnemyKind::Brute,
        EnemyKind::Bomber,
    ];

    pub fn base_stats(&self) -> EnemyStats {
        match self {
            EnemyKind::Grunt => EnemyStats { health: 30.0, speed: 70.0, damage: 10.0, radius: 14.0, score: 10 },
            EnemyKind::Runner => EnemyStats { health: 18.0, speed: 140.0, damage: 7.0, radius: 10.0, score: 12 },
            EnemyKind::Brute => EnemyStats { health: 120.0, speed: 45.0, damage: 22.0, radius: 24.0, score: 30 },
            EnemyKind::Gunner => EnemyStats { health: 40.0, speed: 60.0, damage: 8.0, radius: 15.0, score: 20 },
            EnemyKind::Bomber => EnemyStats { health: 25.0, speed: 100.0, damage: 30.0, radius: 13.0, score: 15 },
            EnemyKind::Boss => EnemyStats { health: 900.0, speed: 90.0, damage: 25.0, radius: 48.0, score: 500 },
        }
    }

    /// First wave this kind can appear on
    pub fn unlock_wave(&self) -> u32 {
        match self {
            EnemyKind::Grunt => 1,
            EnemyKind::Runner => 3,
            EnemyKind::Gunner => 5,
            EnemyKind::Brute => 7,
            EnemyKind::Bomber => 10,
            EnemyKind::Boss => u32::MAX,
        }
    }

    /// Roll weight on `wave`; zero while locked. Grunts fade out as the
    /// heavier kinds ramp up.
    pub fn spawn_weight(&self, wave: u32) -> u32 {
        if wave < self.unlock_wave() {
            return 0;
        }
        match self {
            EnemyKind::Grunt => 60u32.saturating_sub(wave * 2).max(10),
            EnemyKind::Runner => 20 + wave,
            EnemyKind::Gunner => 15 + wave / 2,
            EnemyKind::Brute => 10 + wave,
            EnemyKind::Bomber => 10 + wave / 2,
            EnemyKind::Boss => 0,
        }
    }
}

/// Weighted pick among the kinds unlocked on `wave`
pub fn roll_enemy_kind(wave: u32, rng: &mut impl Rng) -> EnemyKind {
    let weights: Vec<u32> = EnemyKind::ROSTER
        .iter()
        .map(|k| k.spawn_weight(wave))
        .collect();
    match WeightedIndex::new(&weights) {
        Ok(dist) => EnemyKind::ROSTER[dist.sample(rng)],
        Err(_) => EnemyKind::Grunt,
    }
}

/// Per-wave stat multipliers
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct StatScaling {
    pub health: f32,
    pub speed: f32,
    pub damage: f32,
}

impl Default for StatScaling {
    fn default() -> Self {
        Self {
            health: 1.0,
            speed: 1.0,
            damage: 1.0,
        }
    }
}

/// Outcome of damaging an enemy
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct EnemyHit {
    /// Damage that reached health or a boss shield
    pub applied: f32,
    /// The part of `applied` that came off health
    pub health_damage: f32,
    /// This hit took it from alive to dying
    pub killed: bool,
}

/// Something a regular enemy wants done this tick
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum EnemyAction {
    Fire { origin: Vec2, angle: f32, damage: f32 },
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Enemy {
    pub id: u32,
    pub kind: EnemyKind,
    pub pos: Vec2,
    pub vel: Vec2,
    pub health: f32,
    pub max_health: f32,
    pub damage: f32,
    /// Base move speed after wave scaling (px/s)
    pub speed: f32,
    pub radius: f32,
    /// Set once health reaches zero; never cleared
    pub dying: bool,
    /// Ticks spent dying; removed after one full tick
    pub death_frames: u8,
    /// Kill bookkeeping (score, wave count, hooks) already done
    pub kill_reported: bool,
    pub contact_cooldown_ms: f32,
    pub fire_cooldown_ms: f32,
    /// Speed multiplier from slow fields, recomputed every tick
    pub slow_factor: f32,
    pub boss: Option<Box<Boss>>,
}

impl Enemy {
    pub fn new(id: u32, kind: EnemyKind, pos: Vec2, scaling: &StatScaling) -> Self {
        let stats = kind.base_stats();
        let health = stats.health * scaling.health;
        Self {
            id,
            kind,
            pos,
            vel: Vec2::ZERO,
            health,
            max_health: health,
            damage: stats.damage * scaling.damage,
            speed: stats.speed * scaling.speed,
            radius: stats.radius,
            dying: false,
            death_frames: 0,
            kill_reported: false,
            contact_cooldown_ms: 0.0,
            fire_cooldown_ms: 0.0,
            slow_factor: 1.0,
            boss: None,
        }
    }

    pub fn is_boss(&self) -> bool {
        self.boss.is_some()
    }

    pub fn health_ratio(&self) -> f32 {
        if self.max_health <= 0.0 {
            0.0
        } else {
            self.health / self.max_health
        }
    }

    /// Apply damage. Bosses get first claim on it (shield meters); whatever
    /// is left comes off health, clamped at zero.
    pub fn take_damage(&mut self, amount: f32, shield_breaker: bool) -> Result<EnemyHit, SimError> {
        let amount = check_amount(AmountKind::Damage, amount)?;
        if self.dying {
            return Ok(EnemyHit::default());
        }

        let (to_health, absorbed) = match self.boss.as_mut() {
            Some(boss) => boss.absorb(amount, shield_breaker),
            None => (amount, 0.0),
        };
        let before = self.health;
        self.health = (self.health - to_health).max(0.0);
        let health_damage = before - self.health;

        let killed = self.health <= 0.0;
        if killed {
            self.mark_dying();
        }
        Ok(EnemyHit {
            applied: absorbed + health_damage,
            health_damage,
            killed,
        })
    }

    /// Enter the dying state. Cancels anything a boss still has queued.
    pub fn mark_dying(&mut self) {
        if self.dying {
            return;
        }
        self.health = 0.0;
        self.dying = true;
        if let Some(boss) = self.boss.as_mut() {
            boss.on_death();
        }
    }

    /// Chase or kite the player. Returns a shot for gunners that are ready.
    pub fn update_regular(
        &mut self,
        player_pos: Vec2,
        dt_ms: f32,
        tuning: &EnemyTuning,
    ) -> Option<EnemyAction> {
        let dt = dt_ms / 1000.0;
        self.contact_cooldown_ms = (self.contact_cooldown_ms - dt_ms).max(0.0);

        let to_player = player_pos - self.pos;
        let dist = to_player.length();
        let dir = if dist > EPSILON { to_player / dist } else { Vec2::ZERO };
        let speed = self.speed * self.slow_factor;

        let mut action = None;
        match self.kind {
            EnemyKind::Gunner => {
                // Hold at range, back off if crowded
                let band = tuning.gunner_range * 0.15;
                self.vel = if dist > tuning.gunner_range + band {
                    dir * speed
                } else if dist < tuning.gunner_range - band {
                    -dir * speed
                } else {
                    Vec2::new(-dir.y, dir.x) * speed * 0.4
                };
                self.fire_cooldown_ms -= dt_ms;
                if self.fire_cooldown_ms <= 0.0 && dist <= tuning.gunner_range * 1.5 {
                    self.fire_cooldown_ms = tuning.gunner_fire_interval_ms;
                    action = Some(EnemyAction::Fire {
                        origin: self.pos,
                        angle: crate::angle_between(self.pos, player_pos),
                        damage: self.damage,
                    });
                }
            }
            _ => self.vel = dir * speed,
        }
        self.pos += self.vel * dt;
        action
    }

    /// Keep the centre within `margin` of the arena once it has entered
    pub fn clamp_to_arena(&mut self, arena: &ArenaTuning) {
        let inside = self.pos.x >= 0.0
            && self.pos.x <= arena.width
            && self.pos.y >= 0.0
            && self.pos.y <= arena.height;
        if inside {
            self.pos = self.pos.clamp(
                Vec2::splat(self.radius.min(arena.width / 2.0)),
                Vec2::new(
                    (arena.width - self.radius).max(arena.width / 2.0),
                    (arena.height - self.radius).max(arena.height / 2.0),
                ),
            );
        }
    }
}

//! Projectiles and their per-tick effect pipeline
//!
//! A projectile is configured once from the firer's abilities and then
//! evolves on its own: motion, lifetime, homing steer, ricochet and the
//! piercing hit ledger. Explosions and chains need the enemy list and live in
//! `combat`.

use glam::Vec2;
use rand::Rng;
use serde::{Deserialize, Serialize};

use super::loadout::{ChainHitConfig, ExplosiveConfig, HomingConfig};
use super::pool::Recycle;
use crate::consts::{EPSILON, MAX_CRIT_CHANCE, PIERCE_FALLOFF};
use crate::tuning::ArenaTuning;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum Owner {
    #[default]
    Player,
    Enemy,
}

/// Capabilities fixed at creation
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct ProjectileFlags {
    /// Number of enemies the shot may hit
    pub piercing: Option<u32>,
    pub explosive: Option<ExplosiveConfig>,
    pub chain_hit: Option<ChainHitConfig>,
    pub homing: Option<HomingConfig>,
    pub shield_breaker: bool,
    pub ricochet_bounces: u32,
    pub is_critical: bool,
    pub life_steal: Option<f32>,
}

/// Launch parameters for a pooled projectile
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Shot {
    pub owner: Owner,
    pub origin: Vec2,
    pub angle: f32,
    pub speed: f32,
    pub damage: f32,
    pub radius: f32,
    pub lifetime_ms: f32,
    pub flags: ProjectileFlags,
}

/// Result of advancing a projectile one tick
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Motion {
    Flying,
    /// Reflected off an arena edge, consuming one ricochet charge
    Bounced,
    /// Lifetime ran out
    Expired,
    /// Left the arena with no ricochet charges left
    Exited,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Projectile {
    pub id: u32,
    pub owner: Owner,
    pub pos: Vec2,
    pub vel: Vec2,
    pub speed: f32,
    pub damage: f32,
    pub radius: f32,
    pub flags: ProjectileFlags,
    pub lifetime_ms: f32,
    pub max_lifetime_ms: f32,
    pub enemies_hit: u32,
    /// Enemy ids already hit (piercing dedup)
    pub hit_ids: Vec<u32>,
    pub exploded: bool,
    /// Cached homing target between retarget ticks
    pub homing_target: Option<u32>,
    pub homing_counter: u32,
    /// Tick the shot was fired on; it does not move on that tick
    pub born_tick: u64,
    pub dead: bool,
}

impl Recycle for Projectile {
    fn reset(&mut self) {
        let mut hit_ids = std::mem::take(&mut self.hit_ids);
        hit_ids.clear();
        *self = Projectile {
            hit_ids,
            ..Projectile::default()
        };
    }
}

/// Damage multiplier after `enemies_hit` previous hits
#[inline]
pub fn piercing_multiplier(enemies_hit: u32) -> f32 {
    (1.0 - enemies_hit as f32 * PIERCE_FALLOFF).max(0.0)
}

/// Roll a critical hit against `min(0.75, base + bonus)`
pub fn roll_critical(rng: &mut impl Rng, base_chance: f32, bonus: f32) -> bool {
    let chance = (base_chance + bonus).clamp(0.0, MAX_CRIT_CHANCE);
    chance > 0.0 && rng.random::<f32>() < chance
}

impl Projectile {
    /// Fill a freshly reset slot
    pub fn launch(&mut self, id: u32, shot: &Shot, tick: u64) {
        self.id = id;
        self.owner = shot.owner;
        self.pos = shot.origin;
        self.speed = shot.speed;
        self.vel = crate::direction(shot.angle) * shot.speed;
        self.damage = shot.damage;
        self.radius = shot.radius;
        self.flags = shot.flags;
        self.lifetime_ms = 0.0;
        self.max_lifetime_ms = shot.lifetime_ms;
        self.born_tick = tick;
    }

    pub fn angle(&self) -> f32 {
        self.vel.y.atan2(self.vel.x)
    }

    pub fn has_hit(&self, enemy_id: u32) -> bool {
        self.hit_ids.contains(&enemy_id)
    }

    /// Record a hit on `enemy_id` and return the damage it deals.
    ///
    /// `None` when the shot is spent or already hit this enemy. The shot is
    /// marked dead as the hit that exhausts its piercing count lands.
    pub fn register_hit(&mut self, enemy_id: u32) -> Option<f32> {
        if self.dead || self.has_hit(enemy_id) {
            return None;
        }
        let damage = self.damage * piercing_multiplier(self.enemies_hit);
        self.hit_ids.push(enemy_id);
        self.enemies_hit += 1;
        let limit = self.flags.piercing.unwrap_or(1);
        if self.enemies_hit >= limit {
            self.dead = true;
        }
        Some(damage)
    }

    /// Move, age and bounce. Dead shots stay where they are.
    pub fn advance(&mut self, dt_ms: f32, arena: &ArenaTuning) -> Motion {
        if self.dead {
            return Motion::Exited;
        }
        self.pos += self.vel * (dt_ms / 1000.0);
        self.lifetime_ms += dt_ms;
        if self.lifetime_ms >= self.max_lifetime_ms {
            self.dead = true;
            return Motion::Expired;
        }

        let out_x = self.pos.x < 0.0 || self.pos.x > arena.width;
        let out_y = self.pos.y < 0.0 || self.pos.y > arena.height;
        if !out_x && !out_y {
            return Motion::Flying;
        }
        if self.flags.ricochet_bounces == 0 {
            self.dead = true;
            return Motion::Exited;
        }

        self.flags.ricochet_bounces -= 1;
        if out_x {
            self.vel.x = if self.pos.x < 0.0 {
                self.vel.x.abs()
            } else {
                -self.vel.x.abs()
            };
            self.pos.x = self.pos.x.clamp(0.0, arena.width);
        }
        if out_y {
            self.vel.y = if self.pos.y < 0.0 {
                self.vel.y.abs()
            } else {
                -self.vel.y.abs()
            };
            self.pos.y = self.pos.y.clamp(0.0, arena.height);
        }
        // Piercing dedup restarts after a bounce so the shot can come back
        self.hit_ids.clear();
        Motion::Bounced
    }

    /// Bend the velocity toward a target.
    ///
    /// The nearest target is only searched for every `retarget_every` ticks;
    /// in between the cached id is looked up in `candidates`. A cached target
    /// that vanished means no steering until the next search.
    pub fn steer_homing(&mut self, dt_ms: f32, candidates: &[(u32, Vec2)], range: f32) {
        let Some(homing) = self.flags.homing else {
            return;
        };
        let every = homing.retarget_every.max(1);
        if self.homing_counter % every == 0 {
            let range_sq = range * range;
            self.homing_target = candidates
                .iter()
                .filter(|(id, pos)| !self.has_hit(*id) && pos.distance_squared(self.pos) <= range_sq)
                .min_by(|a, b| {
                    a.1.distance_squared(self.pos)
                        .total_cmp(&b.1.distance_squared(self.pos))
                })
                .map(|(id, _)| *id);
        }
        self.homing_counter = self.homing_counter.wrapping_add(1);

        let Some(target) = self.homing_target else {
            return;
        };
        let Some(&(_, target_pos)) = candidates.iter().find(|(id, _)| *id == target) else {
            self.homing_target = None;
            return;
        };

        let to_target = target_pos - self.pos;
        let dist = to_target.length();
        if dist < EPSILON || self.speed < EPSILON {
            return;
        }
        let desired = to_target / dist * self.speed;
        let blend = (homing.strength * dt_ms / 1000.0).clamp(0.0, 1.0);
        let steered = self.vel + (desired - self.vel) * blend;
        let len = steered.length();
        if len < EPSILON {
            return;
        }
        self.vel = steered / len * self.speed;
    }
}

//! Shield boss: orbiting tank with a regenerating shield meter and a
//! telegraphed laser

use glam::Vec2;
use serde::{Deserialize, Serialize};

use super::{Arsenal, BossBehavior, BossCommand, BossContext};
use crate::consts::EPSILON;
use crate::sim::damage::{DamageSource, SourceKind};
use crate::sim::enemy::Enemy;

const ORBIT_RADIUS: f32 = 300.0;
/// rad/s
const ORBIT_SPEED: f32 = 0.4;
/// Meter size as a fraction of max health
const SHIELD_FRACTION: f32 = 0.35;
const REGEN_DELAY_MS: f32 = 2000.0;
/// Fraction of the meter restored per second
const REGEN_RATE: f32 = 0.08;
const VULNERABLE_MS: f32 = 5000.0;
const MAX_REACTIVATIONS: u32 = 2;
const BREAKER_MULTIPLIER: f32 = 2.0;

const LASER_IDLE_MS: f32 = 6000.0;
const LASER_CHARGE_MS: f32 = 1500.0;
const LASER_HALF_WIDTH: f32 = 14.0;
/// Laser hit as a multiple of contact damage
const LASER_DAMAGE_FACTOR: f32 = 1.6;

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum ShieldMode {
    Shielded,
    Vulnerable { remaining_ms: f32 },
    /// Out of reactivations; stays open for the rest of the fight
    Exposed,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum LaserState {
    Idle { remaining_ms: f32 },
    /// Aim is locked when charging starts
    Charging { remaining_ms: f32, angle: f32 },
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ShieldState {
    pub mode: ShieldMode,
    pub meter: f32,
    pub max_meter: f32,
    /// Regeneration waits until this reaches zero
    pub regen_delay_ms: f32,
    pub reactivations: u32,
    pub laser: LaserState,
    pub orbit_angle: f32,
}

impl ShieldState {
    pub fn new(max_health: f32) -> Self {
        let max_meter = max_health * SHIELD_FRACTION;
        Self {
            mode: ShieldMode::Shielded,
            meter: max_meter,
            max_meter,
            regen_delay_ms: 0.0,
            reactivations: 0,
            laser: LaserState::Idle {
                remaining_ms: LASER_IDLE_MS,
            },
            orbit_angle: 0.0,
        }
    }

    fn update_mode(&mut self, dt_ms: f32) {
        self.regen_delay_ms = (self.regen_delay_ms - dt_ms).max(0.0);
        match &mut self.mode {
            ShieldMode::Shielded => {
                if self.regen_delay_ms <= 0.0 && self.meter < self.max_meter {
                    self.meter =
                        (self.meter + self.max_meter * REGEN_RATE * dt_ms / 1000.0).min(self.max_meter);
                }
            }
            ShieldMode::Vulnerable { remaining_ms } => {
                *remaining_ms -= dt_ms;
                if *remaining_ms <= 0.0 {
                    if self.reactivations < MAX_REACTIVATIONS {
                        self.reactivations += 1;
                        self.meter = self.max_meter;
                        self.mode = ShieldMode::Shielded;
                    } else {
                        self.mode = ShieldMode::Exposed;
                    }
                }
            }
            ShieldMode::Exposed => {}
        }
    }

    fn update_laser(&mut self, body: &Enemy, ctx: &mut BossContext<'_>) {
        match &mut self.laser {
            LaserState::Idle { remaining_ms } => {
                *remaining_ms -= ctx.dt_ms;
                if *remaining_ms <= 0.0 {
                    self.laser = LaserState::Charging {
                        remaining_ms: LASER_CHARGE_MS,
                        angle: crate::angle_between(body.pos, ctx.player_pos),
                    };
                }
            }
            LaserState::Charging { remaining_ms, angle } => {
                *remaining_ms -= ctx.dt_ms;
                if *remaining_ms <= 0.0 {
                    if beam_hits(body.pos, *angle, ctx.player_pos, ctx.player_radius) {
                        ctx.commands.push(BossCommand::DamagePlayer {
                            amount: body.damage * LASER_DAMAGE_FACTOR,
                            source: DamageSource::new(SourceKind::Hazard),
                        });
                    }
                    self.laser = LaserState::Idle {
                        remaining_ms: LASER_IDLE_MS,
                    };
                }
            }
        }
    }
}

/// Infinite ray from `origin` along `angle` against a circle
fn beam_hits(origin: Vec2, angle: f32, center: Vec2, radius: f32) -> bool {
    let dir = crate::direction(angle);
    let rel = center - origin;
    let along = rel.dot(dir);
    if along < 0.0 {
        return false;
    }
    let perp = (rel - dir * along).length();
    perp <= LASER_HALF_WIDTH + radius
}

impl BossBehavior for ShieldState {
    fn phase_tag(&self) -> &'static str {
        match self.mode {
            ShieldMode::Shielded => "shielded",
            ShieldMode::Vulnerable { .. } => "vulnerable",
            ShieldMode::Exposed => "exposed",
        }
    }

    /// Circle the arena centre instead of closing on the player
    fn steer(&mut self, body: &mut Enemy, ctx: &mut BossContext<'_>) {
        let dt = ctx.dt_ms / 1000.0;
        self.orbit_angle = crate::normalize_angle(self.orbit_angle + ORBIT_SPEED * dt);
        let center = Vec2::new(ctx.arena.width / 2.0, ctx.arena.height / 2.0);
        let radius = ORBIT_RADIUS.min(ctx.arena.height / 2.0 - body.radius).max(0.0);
        let slot = center + crate::polar_to_cartesian(radius, self.orbit_angle);

        let to_slot = slot - body.pos;
        let dist = to_slot.length();
        if dist < EPSILON {
            body.vel = Vec2::ZERO;
            return;
        }
        let step = (body.speed * body.slow_factor * dt).min(dist);
        body.vel = to_slot / dist * body.speed * body.slow_factor;
        body.pos += to_slot / dist * step;
    }

    fn update_phase(&mut self, body: &mut Enemy, _arsenal: &mut Arsenal, ctx: &mut BossContext<'_>) {
        self.update_mode(ctx.dt_ms);
        self.update_laser(body, ctx);
    }

    fn attack_interval_ms(&self, base: f32) -> f32 {
        match self.mode {
            ShieldMode::Exposed => base * 0.7,
            _ => base,
        }
    }

    fn absorb(&mut self, amount: f32, shield_breaker: bool) -> (f32, f32) {
        if self.mode != ShieldMode::Shielded || self.meter <= 0.0 {
            return (amount, 0.0);
        }
        self.regen_delay_ms = REGEN_DELAY_MS;
        let multiplier = if shield_breaker { BREAKER_MULTIPLIER } else { 1.0 };
        let absorbed = (amount * multiplier).min(self.meter);
        self.meter -= absorbed;
        let spill = (amount - absorbed / multiplier).max(0.0);
        if self.meter <= 0.0 {
            self.meter = 0.0;
            self.mode = ShieldMode::Vulnerable {
                remaining_ms: VULNERABLE_MS,
            };
        }
        (spill, absorbed)
    }

    fn shield_ratio(&self) -> Option<f32> {
        if self.max_meter <= 0.0 {
            return None;
        }
        Some(self.meter / self.max_meter)
    }
}

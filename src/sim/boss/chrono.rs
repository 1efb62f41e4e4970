//! Chrono, the final boss: alternating time phases and a fixed attack rota

use std::f32::consts::{PI, TAU};

use rand::Rng;
use serde::{Deserialize, Serialize};

use super::{Arsenal, BossAction, BossBehavior, BossCommand, BossContext, approach};
use crate::sim::enemy::Enemy;

const PHASE_DURATION_MS: f32 = 5000.0;
const SPEED_PHASE_MULTIPLIER: f32 = 1.6;
const SLOW_PHASE_MULTIPLIER: f32 = 0.6;
/// Player inside this range is slowed during the slow phase
const SLOW_RANGE: f32 = 500.0;
const PLAYER_SLOW_FACTOR: f32 = 0.5;

const RING_SIZE: u32 = 16;
const SPIRAL_SHOTS: u32 = 12;
const SPIRAL_GAP_MS: f32 = 70.0;
const FAN_SHOTS: u32 = 5;
const FAN_SPREAD: f32 = 0.15;
const DOUBLE_RING_DELAY_MS: f32 = 400.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum TimePhase {
    Speed,
    Slow,
}

/// Attack patterns, used strictly in rotation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ChronoPattern {
    Ring,
    Spiral,
    AimedFan,
    DoubleRing,
}

impl ChronoPattern {
    pub fn next(self) -> Self {
        match self {
            ChronoPattern::Ring => ChronoPattern::Spiral,
            ChronoPattern::Spiral => ChronoPattern::AimedFan,
            ChronoPattern::AimedFan => ChronoPattern::DoubleRing,
            ChronoPattern::DoubleRing => ChronoPattern::Ring,
        }
    }

    fn queue(self, arsenal: &mut Arsenal, offset: f32) {
        match self {
            ChronoPattern::Ring => arsenal.after(0.0, BossAction::Ring { count: RING_SIZE, offset }),
            ChronoPattern::Spiral => {
                for i in 0..SPIRAL_SHOTS {
                    let angle = offset + TAU * i as f32 / SPIRAL_SHOTS as f32;
                    arsenal.after(i as f32 * SPIRAL_GAP_MS, BossAction::Shot { angle });
                }
            }
            ChronoPattern::AimedFan => {
                let mid = (FAN_SHOTS - 1) as f32 / 2.0;
                for i in 0..FAN_SHOTS {
                    let spread = (i as f32 - mid) * FAN_SPREAD;
                    arsenal.after(0.0, BossAction::Aimed { spread });
                }
            }
            ChronoPattern::DoubleRing => {
                arsenal.after(0.0, BossAction::Ring { count: RING_SIZE, offset });
                arsenal.after(
                    DOUBLE_RING_DELAY_MS,
                    BossAction::Ring {
                        count: RING_SIZE,
                        offset: offset + PI / RING_SIZE as f32,
                    },
                );
            }
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ChronoState {
    pub time_phase: TimePhase,
    pub phase_timer_ms: f32,
    pub next_pattern: ChronoPattern,
}

impl Default for ChronoState {
    fn default() -> Self {
        Self {
            time_phase: TimePhase::Speed,
            phase_timer_ms: PHASE_DURATION_MS,
            next_pattern: ChronoPattern::Ring,
        }
    }
}

impl ChronoState {
    fn speed_multiplier(&self) -> f32 {
        match self.time_phase {
            TimePhase::Speed => SPEED_PHASE_MULTIPLIER,
            TimePhase::Slow => SLOW_PHASE_MULTIPLIER,
        }
    }
}

impl BossBehavior for ChronoState {
    fn phase_tag(&self) -> &'static str {
        match self.time_phase {
            TimePhase::Speed => "speed",
            TimePhase::Slow => "slow",
        }
    }

    fn steer(&mut self, body: &mut Enemy, ctx: &mut BossContext<'_>) {
        approach(
            body,
            ctx.player_pos,
            ctx.tuning.standoff_distance,
            self.speed_multiplier(),
            ctx.dt_ms,
        );
    }

    fn update_phase(&mut self, body: &mut Enemy, _arsenal: &mut Arsenal, ctx: &mut BossContext<'_>) {
        self.phase_timer_ms -= ctx.dt_ms;
        if self.phase_timer_ms <= 0.0 {
            self.phase_timer_ms = PHASE_DURATION_MS;
            self.time_phase = match self.time_phase {
                TimePhase::Speed => TimePhase::Slow,
                TimePhase::Slow => TimePhase::Speed,
            };
        }
        // The debuff lasts one tick; leaving range or the phase lifts it
        if self.time_phase == TimePhase::Slow && body.pos.distance(ctx.player_pos) <= SLOW_RANGE {
            ctx.commands.push(BossCommand::SlowPlayer {
                factor: PLAYER_SLOW_FACTOR,
            });
        }
    }

    fn attack(&mut self, _body: &mut Enemy, arsenal: &mut Arsenal, ctx: &mut BossContext<'_>) {
        let pattern = self.next_pattern;
        self.next_pattern = pattern.next();
        let offset = ctx.rng.random_range(0.0..TAU);
        pattern.queue(arsenal, offset);
    }

    fn attack_interval_ms(&self, base: f32) -> f32 {
        base * 0.8
    }
}

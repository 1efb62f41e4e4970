use std::f32::consts::TAU;

use glam::Vec2;
use rand::Rng;
use serde::{Deserialize, Serialize};

use super::{Arsenal, BossAction, BossBehavior, BossContext, Hazard};
use crate::sim::enemy::Enemy;

const TELEPORT_INTERVAL_MS: f32 = 4000.0;
const MIN_JUMP_DISTANCE: f32 = 160.0;
const MAX_JUMP_DISTANCE: f32 = 300.0;
const POOL_RADIUS: f32 = 60.0;
const POOL_DURATION_MS: f32 = 5000.0;
const POOL_TICK_MS: f32 = 500.0;
/// Pool tick as a fraction of contact damage
const POOL_DAMAGE_FACTOR: f32 = 0.25;
const SALVO_SHOTS: u32 = 3;
const SALVO_GAP_MS: f32 = 120.0;
const SALVO_SPREAD: f32 = 0.12;

/// Blinks around the player, leaving toxic pools behind
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TeleporterState {
    pub teleport_timer_ms: f32,
    pub teleports: u32,
}

impl Default for TeleporterState {
    fn default() -> Self {
        Self {
            teleport_timer_ms: TELEPORT_INTERVAL_MS,
            teleports: 0,
        }
    }
}

impl TeleporterState {
    fn teleport(&mut self, body: &mut Enemy, arsenal: &mut Arsenal, ctx: &mut BossContext<'_>) {
        arsenal.hazards.push(Hazard::toxic_pool(
            body.pos,
            POOL_RADIUS,
            body.damage * POOL_DAMAGE_FACTOR,
            POOL_TICK_MS,
            POOL_DURATION_MS,
        ));

        let angle = ctx.rng.random_range(0.0..TAU);
        let dist = ctx.rng.random_range(MIN_JUMP_DISTANCE..MAX_JUMP_DISTANCE);
        let lo = Vec2::splat(body.radius);
        let hi = Vec2::new(ctx.arena.width, ctx.arena.height) - lo;
        body.pos = (ctx.player_pos + crate::polar_to_cartesian(dist, angle)).clamp(lo, hi.max(lo));
        body.vel = Vec2::ZERO;
        self.teleports += 1;

        let mid = (SALVO_SHOTS - 1) as f32 / 2.0;
        for i in 0..SALVO_SHOTS {
            arsenal.after(
                i as f32 * SALVO_GAP_MS,
                BossAction::Aimed {
                    spread: (i as f32 - mid) * SALVO_SPREAD,
                },
            );
        }
    }
}

impl BossBehavior for TeleporterState {
    fn phase_tag(&self) -> &'static str {
        if self.teleport_timer_ms <= SALVO_GAP_MS * SALVO_SHOTS as f32 {
            "winding_up"
        } else {
            "stalking"
        }
    }

    fn update_phase(&mut self, body: &mut Enemy, arsenal: &mut Arsenal, ctx: &mut BossContext<'_>) {
        self.teleport_timer_ms -= ctx.dt_ms;
        if self.teleport_timer_ms <= 0.0 {
            self.teleport_timer_ms = TELEPORT_INTERVAL_MS;
            self.teleport(body, arsenal, ctx);
        }
    }
}

use std::f32::consts::{PI, TAU};

use glam::Vec2;
use rand::Rng;
use serde::{Deserialize, Serialize};

use super::{Arsenal, BossAction, BossBehavior, BossContext, approach};
use crate::sim::enemy::Enemy;

const CHARGE_DURATION_MS: f32 = 900.0;
const CHARGE_SPEED_MULTIPLIER: f32 = 3.5;
const BURST_RINGS: u32 = 3;
const BURST_STAGGER_MS: f32 = 150.0;
const RING_SIZE: u32 = 14;

/// Burst or charge, picked by coin flip each attack
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub enum ClassicState {
    #[default]
    Approach,
    /// Locked-heading dash
    Charging { remaining_ms: f32, heading: Vec2 },
}

impl ClassicState {
    fn start_charge(&mut self, body: &Enemy, target: Vec2) {
        let heading = crate::direction(crate::angle_between(body.pos, target));
        *self = ClassicState::Charging {
            remaining_ms: CHARGE_DURATION_MS,
            heading,
        };
    }
}

/// Three staggered rings, each rotated half a gap from the last
fn radial_burst(arsenal: &mut Arsenal, offset: f32) {
    let half_gap = PI / RING_SIZE as f32;
    for i in 0..BURST_RINGS {
        arsenal.after(
            i as f32 * BURST_STAGGER_MS,
            BossAction::Ring {
                count: RING_SIZE,
                offset: offset + i as f32 * half_gap,
            },
        );
    }
}

impl BossBehavior for ClassicState {
    fn phase_tag(&self) -> &'static str {
        match self {
            ClassicState::Approach => "approach",
            ClassicState::Charging { .. } => "charging",
        }
    }

    fn steer(&mut self, body: &mut Enemy, ctx: &mut BossContext<'_>) {
        match *self {
            ClassicState::Approach => {
                approach(body, ctx.player_pos, ctx.tuning.standoff_distance, 1.0, ctx.dt_ms)
            }
            ClassicState::Charging { heading, .. } => {
                body.vel = heading * body.speed * CHARGE_SPEED_MULTIPLIER * body.slow_factor;
                body.pos += body.vel * (ctx.dt_ms / 1000.0);
            }
        }
    }

    fn update_phase(&mut self, _body: &mut Enemy, _arsenal: &mut Arsenal, ctx: &mut BossContext<'_>) {
        if let ClassicState::Charging { remaining_ms, .. } = self {
            *remaining_ms -= ctx.dt_ms;
            if *remaining_ms <= 0.0 {
                *self = ClassicState::Approach;
            }
        }
    }

    fn attack(&mut self, body: &mut Enemy, arsenal: &mut Arsenal, ctx: &mut BossContext<'_>) {
        if matches!(self, ClassicState::Charging { .. }) {
            return;
        }
        if ctx.rng.random_bool(0.5) {
            let offset = ctx.rng.random_range(0.0..TAU);
            radial_burst(arsenal, offset);
        } else {
            self.start_charge(body, ctx.player_pos);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::super::testing::*;
    use super::super::{BossKind, BossPhase};
    use super::*;

    #[test]
    fn test_burst_queues_staggered_rings() {
        let mut arsenal = Arsenal::default();
        radial_burst(&mut arsenal, 0.0);
        assert_eq!(arsenal.schedule.len(), 3);
        assert_eq!(arsenal.schedule.drain_due(0.0).len(), 1);
        assert_eq!(arsenal.schedule.drain_due(150.0).len(), 1);
        assert_eq!(arsenal.schedule.drain_due(300.0).len(), 1);
    }

    #[test]
    fn test_charge_runs_fixed_duration() {
        let mut h = Harness::new(5);
        let mut body = spawn(BossKind::Classic, Vec2::new(100.0, 400.0));
        let mut state = ClassicState::default();
        state.start_charge(&body, Vec2::new(900.0, 400.0));
        let mut arsenal = Arsenal::default();

        let start = body.pos;
        let mut ticks = 0;
        while matches!(state, ClassicState::Charging { .. }) {
            let mut ctx = h.ctx(100.0, Vec2::new(900.0, 400.0));
            state.steer(&mut body, &mut ctx);
            state.update_phase(&mut body, &mut arsenal, &mut ctx);
            ticks += 1;
        }
        assert_eq!(ticks, 9);
        // 3.5x speed for 0.9 s
        let expected = body.speed * CHARGE_SPEED_MULTIPLIER * 0.9;
        assert!((body.pos.distance(start) - expected).abs() < 1.0);
    }

    #[test]
    fn test_attack_choice_covers_both_moves() {
        let mut saw_burst = false;
        let mut saw_charge = false;
        for seed in 0..32 {
            let mut h = Harness::new(seed);
            let mut body = spawn(BossKind::Classic, Vec2::new(400.0, 400.0));
            let mut state = ClassicState::default();
            let mut arsenal = Arsenal::default();
            state.attack(&mut body, &mut arsenal, &mut h.ctx(16.0, Vec2::new(800.0, 400.0)));
            saw_burst |= !arsenal.schedule.is_empty();
            saw_charge |= matches!(state, ClassicState::Charging { .. });
        }
        assert!(saw_burst && saw_charge);
    }

    #[test]
    fn test_initial_phase_is_approach() {
        let phase = BossPhase::initial(BossKind::Classic, 100.0, 0);
        assert_eq!(phase.behavior().phase_tag(), "approach");
    }
}

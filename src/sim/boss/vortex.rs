use std::f32::consts::TAU;

use rand::Rng;
use serde::{Deserialize, Serialize};

use super::{Arsenal, BossBehavior, BossCommand, BossContext, Hazard};
use crate::consts::EPSILON;
use crate::sim::enemy::Enemy;

const PULL_RANGE: f32 = 420.0;
/// Pull speed (px/s) at point blank; falls to zero at the edge of range
const PULL_FORCE: f32 = 140.0;

const MINE_INTERVAL_MS: f32 = 5000.0;
const MINES_PER_SPAWN: usize = 3;
const MAX_MINES: usize = 6;
const MINE_ORBIT_RADIUS: f32 = 130.0;
/// rad/s
const MINE_ORBIT_SPEED: f32 = 1.6;
const MINE_RADIUS: f32 = 12.0;
const MINE_DAMAGE_FACTOR: f32 = 0.55;

const SHOCKWAVE_INTERVAL_MS: f32 = 7000.0;
const SHOCKWAVE_SPEED: f32 = 260.0;
const SHOCKWAVE_MAX_RADIUS: f32 = 520.0;
const SHOCKWAVE_DAMAGE_FACTOR: f32 = 0.65;

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct VortexState {
    pub mine_timer_ms: f32,
    pub shockwave_timer_ms: f32,
    /// Player was inside pull range on the last update
    pub pulling: bool,
}

impl Default for VortexState {
    fn default() -> Self {
        Self {
            mine_timer_ms: MINE_INTERVAL_MS * 0.5,
            shockwave_timer_ms: SHOCKWAVE_INTERVAL_MS,
            pulling: false,
        }
    }
}

/// Per-tick displacement of the player toward `center`
pub fn pull_offset(center: glam::Vec2, player: glam::Vec2, dt_ms: f32) -> Option<glam::Vec2> {
    let to_center = center - player;
    let dist = to_center.length();
    if dist >= PULL_RANGE || dist < EPSILON {
        return None;
    }
    let strength = PULL_FORCE * (1.0 - dist / PULL_RANGE);
    Some(to_center / dist * strength * dt_ms / 1000.0)
}

impl VortexState {
    fn spawn_mines(&self, body: &Enemy, arsenal: &mut Arsenal, ctx: &mut BossContext<'_>) {
        let live = arsenal.hazards.iter().filter(|h| h.is_mine()).count();
        let count = MINES_PER_SPAWN.min(MAX_MINES.saturating_sub(live));
        if count == 0 {
            return;
        }
        let base = ctx.rng.random_range(0.0..TAU);
        for i in 0..count {
            arsenal.hazards.push(Hazard::mine(
                body.pos,
                base + TAU * i as f32 / count as f32,
                MINE_ORBIT_RADIUS,
                MINE_ORBIT_SPEED,
                MINE_RADIUS,
                body.damage * MINE_DAMAGE_FACTOR,
            ));
        }
    }
}

impl BossBehavior for VortexState {
    fn phase_tag(&self) -> &'static str {
        if self.pulling { "pulling" } else { "drifting" }
    }

    fn update_phase(&mut self, body: &mut Enemy, arsenal: &mut Arsenal, ctx: &mut BossContext<'_>) {
        let pull = pull_offset(body.pos, ctx.player_pos, ctx.dt_ms);
        self.pulling = pull.is_some();
        if let Some(offset) = pull {
            ctx.commands.push(BossCommand::PullPlayer { offset });
        }

        self.mine_timer_ms -= ctx.dt_ms;
        if self.mine_timer_ms <= 0.0 {
            self.mine_timer_ms = MINE_INTERVAL_MS;
            self.spawn_mines(body, arsenal, ctx);
        }

        self.shockwave_timer_ms -= ctx.dt_ms;
        if self.shockwave_timer_ms <= 0.0 {
            self.shockwave_timer_ms = SHOCKWAVE_INTERVAL_MS;
            arsenal.hazards.push(Hazard::shockwave(
                body.pos,
                SHOCKWAVE_MAX_RADIUS,
                SHOCKWAVE_SPEED,
                body.damage * SHOCKWAVE_DAMAGE_FACTOR,
            ));
        }
    }
}

#[cfg(test)]
mod tests {
    use super::super::testing::*;
    use super::super::BossKind;
    use super::*;
    use glam::Vec2;

    #[test]
    fn test_pull_scales_with_proximity() {
        let center = Vec2::new(500.0, 500.0);
        let near = pull_offset(center, Vec2::new(400.0, 500.0), 1000.0).unwrap();
        let far = pull_offset(center, Vec2::new(150.0, 500.0), 1000.0).unwrap();
        assert!(near.x > far.x && far.x > 0.0);
        assert!((near.x - PULL_FORCE * (1.0 - 100.0 / PULL_RANGE)).abs() < 1e-3);
        assert!(pull_offset(center, Vec2::new(0.0, 500.0), 1000.0).is_none());
        assert!(pull_offset(center, center, 1000.0).is_none());
    }

    #[test]
    fn test_mines_are_capped() {
        let mut h = Harness::new(6);
        let body = spawn(BossKind::Vortex, Vec2::new(800.0, 450.0));
        let state = VortexState::default();
        let mut arsenal = Arsenal::default();
        for _ in 0..4 {
            state.spawn_mines(&body, &mut arsenal, &mut h.ctx(16.0, Vec2::ZERO));
        }
        assert_eq!(arsenal.hazards.iter().filter(|m| m.is_mine()).count(), MAX_MINES);
    }

    #[test]
    fn test_shockwave_on_cadence() {
        let mut h = Harness::new(7);
        let mut body = spawn(BossKind::Vortex, Vec2::new(800.0, 450.0));
        let mut state = VortexState {
            mine_timer_ms: f32::MAX,
            ..VortexState::default()
        };
        let mut arsenal = Arsenal::default();
        let far = Vec2::new(100.0, 100.0);
        state.update_phase(&mut body, &mut arsenal, &mut h.ctx(SHOCKWAVE_INTERVAL_MS - 1.0, far));
        assert!(arsenal.hazards.is_empty());
        state.update_phase(&mut body, &mut arsenal, &mut h.ctx(1.0, far));
        assert_eq!(arsenal.hazards.len(), 1);
        assert!(!arsenal.hazards[0].is_mine());
        assert_eq!(state.phase_tag(), "drifting");
    }

    #[test]
    fn test_pull_command_when_in_range() {
        let mut h = Harness::new(8);
        let mut body = spawn(BossKind::Vortex, Vec2::new(800.0, 450.0));
        let mut state = VortexState::default();
        let mut arsenal = Arsenal::default();
        state.update_phase(&mut body, &mut arsenal, &mut h.ctx(16.0, Vec2::new(700.0, 450.0)));
        assert!(
            h.commands
                .iter()
                .any(|c| matches!(c, BossCommand::PullPlayer { offset } if offset.x > 0.0))
        );
        assert_eq!(state.phase_tag(), "pulling");
    }
}

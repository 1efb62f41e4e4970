//! Target selection and predictive aim for the player turret

use glam::Vec2;
use serde::{Deserialize, Serialize};

use super::enemy::Enemy;
use crate::consts::{AIM_TOLERANCE, EPSILON, STATIONARY_SPEED};
use crate::tuning::ArenaTuning;

/// Turret lock state carried between ticks
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct TargetingState {
    /// Id of the enemy currently tracked
    pub target: Option<u32>,
    /// Time spent turning toward the current target without getting aimed
    pub rotating_ms: f32,
    /// Facing is within tolerance of the lead angle
    pub aimed: bool,
}

/// Live and inside the arena by at least `margin`
pub fn is_targetable(enemy: &Enemy, arena: &ArenaTuning, margin: f32) -> bool {
    !enemy.dying
        && enemy.pos.x >= margin
        && enemy.pos.x <= arena.width - margin
        && enemy.pos.y >= margin
        && enemy.pos.y <= arena.height - margin
}

/// Lower is better: near and already hurt wins
pub fn target_score(shooter: Vec2, enemy: &Enemy, health_weight: f32) -> f32 {
    let deficit = (enemy.max_health - enemy.health).max(0.0);
    let bonus = deficit * health_weight;
    shooter.distance_squared(enemy.pos) - bonus * bonus
}

/// Best-scoring targetable enemy other than `exclude`. Ties keep list order.
pub fn select_target(
    shooter: Vec2,
    enemies: &[Enemy],
    arena: &ArenaTuning,
    margin: f32,
    health_weight: f32,
    exclude: Option<u32>,
) -> Option<u32> {
    enemies
        .iter()
        .filter(|e| Some(e.id) != exclude && is_targetable(e, arena, margin))
        .map(|e| (e.id, target_score(shooter, e, health_weight)))
        .fold(None, |best: Option<(u32, f32)>, (id, score)| match best {
            Some((_, s)) if s <= score => best,
            _ => Some((id, score)),
        })
        .map(|(id, _)| id)
}

/// Angle to lead a moving target by one linear step.
///
/// Uses `distance / projectile_speed` as the flight time and aims where the
/// target will be after it. This is not an exact intercept; fast targets can
/// be over or under led.
pub fn predictive_angle(shooter: Vec2, target_pos: Vec2, target_vel: Vec2, projectile_speed: f32) -> f32 {
    if target_vel.length() < STATIONARY_SPEED || projectile_speed < EPSILON {
        return crate::angle_between(shooter, target_pos);
    }
    let time_to_impact = shooter.distance(target_pos) / projectile_speed;
    crate::angle_between(shooter, target_pos + target_vel * time_to_impact)
}

pub fn within_tolerance(facing: f32, angle: f32) -> bool {
    crate::angle_diff(facing, angle).abs() <= AIM_TOLERANCE
}

impl TargetingState {
    /// Keep or re-pick the target. Returns the tracked enemy's index.
    ///
    /// The current target is dropped when it died, left the visible area or
    /// the turret has chased it longer than `max_rotation_ms`. A timed-out
    /// target is excluded from the immediate re-pick.
    pub fn acquire(
        &mut self,
        shooter: Vec2,
        enemies: &[Enemy],
        arena: &ArenaTuning,
        margin: f32,
        health_weight: f32,
        max_rotation_ms: f32,
    ) -> Option<usize> {
        let current = self
            .target
            .and_then(|id| enemies.iter().position(|e| e.id == id))
            .filter(|&i| is_targetable(&enemies[i], arena, margin));

        let timed_out = current.is_some() && self.rotating_ms > max_rotation_ms;
        if !timed_out && current.is_some() {
            return current;
        }

        let exclude = if timed_out { self.target } else { None };
        let picked = select_target(shooter, enemies, arena, margin, health_weight, exclude)
            .or_else(|| if timed_out { self.target } else { None });
        if picked != self.target {
            self.rotating_ms = 0.0;
            self.aimed = false;
        } else if timed_out {
            // Nothing else to shoot at; start the guard over
            self.rotating_ms = 0.0;
        }
        self.target = picked;
        picked.and_then(|id| enemies.iter().position(|e| e.id == id))
    }

    pub fn clear(&mut self) {
        *self = TargetingState::default();
    }
}

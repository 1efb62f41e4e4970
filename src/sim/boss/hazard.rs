//! Boss-owned area effects: toxic pools, orbiting mines, shockwave rings

use glam::Vec2;
use serde::{Deserialize, Serialize};

use super::BossCommand;
use crate::polar_to_cartesian;
use crate::sim::damage::{DamageSource, SourceKind};

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum HazardKind {
    /// Lingering damage area left where a teleporter vanished
    ToxicPool {
        radius: f32,
        damage: f32,
        tick_ms: f32,
        tick_timer_ms: f32,
        remaining_ms: f32,
    },
    /// Orbits its boss; destroyed on contact with the player
    Mine {
        orbit_angle: f32,
        orbit_radius: f32,
        /// rad/s
        angular_speed: f32,
        radius: f32,
        damage: f32,
    },
    /// Expanding ring; hits the player at most once
    Shockwave {
        radius: f32,
        max_radius: f32,
        /// px/s
        speed: f32,
        damage: f32,
        hit_player: bool,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Hazard {
    pub pos: Vec2,
    pub kind: HazardKind,
    pub expired: bool,
}

impl Hazard {
    pub fn toxic_pool(pos: Vec2, radius: f32, damage: f32, tick_ms: f32, duration_ms: f32) -> Self {
        Self {
            pos,
            kind: HazardKind::ToxicPool {
                radius,
                damage,
                tick_ms,
                tick_timer_ms: 0.0,
                remaining_ms: duration_ms,
            },
            expired: false,
        }
    }

    pub fn mine(anchor: Vec2, orbit_angle: f32, orbit_radius: f32, angular_speed: f32, radius: f32, damage: f32) -> Self {
        Self {
            pos: anchor + polar_to_cartesian(orbit_radius, orbit_angle),
            kind: HazardKind::Mine {
                orbit_angle,
                orbit_radius,
                angular_speed,
                radius,
                damage,
            },
            expired: false,
        }
    }

    pub fn shockwave(origin: Vec2, max_radius: f32, speed: f32, damage: f32) -> Self {
        Self {
            pos: origin,
            kind: HazardKind::Shockwave {
                radius: 0.0,
                max_radius,
                speed,
                damage,
                hit_player: false,
            },
            expired: false,
        }
    }

    pub fn is_mine(&self) -> bool {
        matches!(self.kind, HazardKind::Mine { .. })
    }

    pub fn name(&self) -> &'static str {
        match self.kind {
            HazardKind::ToxicPool { .. } => "toxic_pool",
            HazardKind::Mine { .. } => "mine",
            HazardKind::Shockwave { .. } => "shockwave",
        }
    }

    /// Current extent; for a shockwave, the ring's radius
    pub fn radius(&self) -> f32 {
        match self.kind {
            HazardKind::ToxicPool { radius, .. }
            | HazardKind::Mine { radius, .. }
            | HazardKind::Shockwave { radius, .. } => radius,
        }
    }

    /// Advance one tick. `anchor` is the owning boss's position.
    pub fn update(
        &mut self,
        dt_ms: f32,
        anchor: Vec2,
        player_pos: Vec2,
        player_radius: f32,
        commands: &mut Vec<BossCommand>,
    ) {
        if self.expired {
            return;
        }
        let source = DamageSource::new(SourceKind::Hazard);
        match &mut self.kind {
            HazardKind::ToxicPool {
                radius,
                damage,
                tick_ms,
                tick_timer_ms,
                remaining_ms,
            } => {
                *remaining_ms -= dt_ms;
                *tick_timer_ms = (*tick_timer_ms - dt_ms).max(0.0);
                let inside = self.pos.distance(player_pos) <= *radius + player_radius;
                if inside && *tick_timer_ms <= 0.0 {
                    *tick_timer_ms = *tick_ms;
                    commands.push(BossCommand::DamagePlayer {
                        amount: *damage,
                        source,
                    });
                }
                if *remaining_ms <= 0.0 {
                    self.expired = true;
                }
            }
            HazardKind::Mine {
                orbit_angle,
                orbit_radius,
                angular_speed,
                radius,
                damage,
            } => {
                *orbit_angle = crate::normalize_angle(*orbit_angle + *angular_speed * dt_ms / 1000.0);
                self.pos = anchor + polar_to_cartesian(*orbit_radius, *orbit_angle);
                if self.pos.distance(player_pos) <= *radius + player_radius {
                    commands.push(BossCommand::DamagePlayer {
                        amount: *damage,
                        source,
                    });
                    self.expired = true;
                }
            }
            HazardKind::Shockwave {
                radius,
                max_radius,
                speed,
                damage,
                hit_player,
            } => {
                let previous = *radius;
                *radius = (*radius + *speed * dt_ms / 1000.0).min(*max_radius);
                let d = self.pos.distance(player_pos);
                let crossed = d + player_radius >= previous && d - player_radius <= *radius;
                if !*hit_player && crossed {
                    *hit_player = true;
                    commands.push(BossCommand::DamagePlayer {
                        amount: *damage,
                        source,
                    });
                }
                if *radius >= *max_radius {
                    self.expired = true;
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn damage_count(commands: &[BossCommand]) -> usize {
        commands
            .iter()
            .filter(|c| matches!(c, BossCommand::DamagePlayer { .. }))
            .count()
    }

    #[test]
    fn test_pool_ticks_while_inside_and_expires() {
        let mut pool = Hazard::toxic_pool(Vec2::ZERO, 50.0, 5.0, 500.0, 1200.0);
        let mut commands = Vec::new();
        for _ in 0..12 {
            pool.update(100.0, Vec2::ZERO, Vec2::new(10.0, 0.0), 10.0, &mut commands);
        }
        // First tick immediately, then every 500 ms until it dries up at 1200 ms
        assert_eq!(damage_count(&commands), 3);
        assert!(pool.expired);
    }

    #[test]
    fn test_pool_ignores_player_outside() {
        let mut pool = Hazard::toxic_pool(Vec2::ZERO, 50.0, 5.0, 500.0, 5000.0);
        let mut commands = Vec::new();
        pool.update(100.0, Vec2::ZERO, Vec2::new(300.0, 0.0), 10.0, &mut commands);
        assert!(commands.is_empty());
    }

    #[test]
    fn test_mine_destroyed_on_contact() {
        let anchor = Vec2::new(100.0, 100.0);
        let mut mine = Hazard::mine(anchor, 0.0, 50.0, 0.0, 10.0, 12.0);
        let mut commands = Vec::new();
        mine.update(16.0, anchor, Vec2::new(155.0, 100.0), 10.0, &mut commands);
        assert_eq!(damage_count(&commands), 1);
        assert!(mine.expired);
        mine.update(16.0, anchor, Vec2::new(155.0, 100.0), 10.0, &mut commands);
        assert_eq!(damage_count(&commands), 1);
    }

    #[test]
    fn test_shockwave_hits_once_when_crossing() {
        let mut wave = Hazard::shockwave(Vec2::ZERO, 400.0, 200.0, 16.0);
        let player = Vec2::new(150.0, 0.0);
        let mut commands = Vec::new();
        for _ in 0..30 {
            wave.update(100.0, Vec2::ZERO, player, 10.0, &mut commands);
        }
        assert_eq!(damage_count(&commands), 1);
        assert!(wave.expired);
    }

    #[test]
    fn test_shockwave_misses_player_beyond_reach() {
        let mut wave = Hazard::shockwave(Vec2::ZERO, 100.0, 500.0, 16.0);
        let mut commands = Vec::new();
        for _ in 0..5 {
            wave.update(100.0, Vec2::ZERO, Vec2::new(300.0, 0.0), 10.0, &mut commands);
        }
        assert!(commands.is_empty());
    }
}

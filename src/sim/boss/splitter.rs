use serde::{Deserialize, Serialize};

use super::{Arsenal, BossBehavior, BossCommand, BossContext, SplitCopy};
use crate::consts::SPLIT_MAX_GENERATION;
use crate::sim::enemy::Enemy;

const SPLIT_HEALTH_RATIO: f32 = 0.5;
const COPIES: u32 = 2;
const COPY_HEALTH: f32 = 0.5;
const COPY_RADIUS: f32 = 0.7;
const COPY_SPEED: f32 = 0.85;

/// Splits into smaller copies at half health, once per generation
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SplitterState {
    pub generation: u8,
    /// One-shot guard on the split
    pub split_done: bool,
}

impl SplitterState {
    pub fn new(generation: u8) -> Self {
        Self {
            generation,
            split_done: false,
        }
    }

    pub fn can_split(&self) -> bool {
        !self.split_done && self.generation < SPLIT_MAX_GENERATION
    }

    fn split(&mut self, body: &Enemy, arsenal: &Arsenal) -> BossCommand {
        self.split_done = true;
        BossCommand::Split(SplitCopy {
            origin: body.pos,
            count: COPIES,
            generation: self.generation + 1,
            max_health: body.max_health * COPY_HEALTH,
            radius: body.radius * COPY_RADIUS,
            speed: body.speed * COPY_SPEED,
            damage: body.damage,
            projectile_damage: arsenal.projectile_damage,
        })
    }
}

impl BossBehavior for SplitterState {
    fn phase_tag(&self) -> &'static str {
        match (self.generation, self.split_done) {
            (_, true) => "split",
            (0, false) => "whole",
            _ => "fragment",
        }
    }

    fn update_phase(&mut self, body: &mut Enemy, arsenal: &mut Arsenal, ctx: &mut BossContext<'_>) {
        if !self.can_split() || body.health_ratio() > SPLIT_HEALTH_RATIO {
            return;
        }
        ctx.commands.push(self.split(body, arsenal));
        log::debug!(
            "splitter gen {} split into {COPIES} at {:.0}% health",
            self.generation,
            body.health_ratio() * 100.0
        );
        body.mark_dying();
    }

    /// Killed from above half health in one blow: the split still happens
    fn on_killed(&mut self, body: &Enemy, arsenal: &Arsenal, commands: &mut Vec<BossCommand>) {
        if !self.can_split() {
            return;
        }
        log::debug!("splitter gen {} killed outright, splitting anyway", self.generation);
        commands.push(self.split(body, arsenal));
    }

    fn spawns_minions(&self) -> bool {
        false
    }
}

#[cfg(test)]
mod tests {
    use super::super::testing::*;
    use super::super::{Boss, BossKind, boss_killed, update_boss};
    use super::*;
    use crate::tuning::BossTuning;
    use glam::Vec2;

    fn splits(commands: &[BossCommand]) -> Vec<SplitCopy> {
        commands
            .iter()
            .filter_map(|c| match c {
                BossCommand::Split(copy) => Some(*copy),
                _ => None,
            })
            .collect()
    }

    #[test]
    fn test_splits_once_at_half_health() {
        let mut h = Harness::new(1);
        let player = Vec2::new(900.0, 450.0);
        let mut body = spawn(BossKind::Splitter, Vec2::new(400.0, 450.0));

        body.take_damage(body.max_health * 0.4, false).unwrap();
        update_boss(&mut body, &mut h.ctx(16.0, player));
        assert!(splits(&h.commands).is_empty());
        assert!(!body.dying);

        body.take_damage(body.max_health * 0.15, false).unwrap();
        update_boss(&mut body, &mut h.ctx(16.0, player));
        let copies = splits(&h.commands);
        assert_eq!(copies.len(), 1);
        assert_eq!(copies[0].count, COPIES);
        assert_eq!(copies[0].generation, 1);
        assert_eq!(copies[0].max_health, body.max_health * COPY_HEALTH);
        assert!(body.dying);

        update_boss(&mut body, &mut h.ctx(16.0, player));
        assert_eq!(splits(&h.commands).len(), 1);
    }

    #[test]
    fn test_overkill_from_full_health_still_splits() {
        let mut body = spawn(BossKind::Splitter, Vec2::new(400.0, 450.0));
        let hit = body.take_damage(body.max_health * 3.0, false).unwrap();
        assert!(hit.killed);

        let copies = splits(&boss_killed(&mut body));
        assert_eq!(copies.len(), 1);
        assert_eq!(copies[0].generation, 1);
        assert_eq!(copies[0].origin, body.pos);
        assert!(body.boss.as_ref().unwrap().split_away());

        // A second report must not split again
        assert!(boss_killed(&mut body).is_empty());
    }

    #[test]
    fn test_killed_copy_does_not_split() {
        let tuning = BossTuning::default();
        let copy = SplitCopy {
            origin: Vec2::new(400.0, 450.0),
            count: 2,
            generation: SPLIT_MAX_GENERATION,
            max_health: 400.0,
            radius: 30.0,
            speed: 70.0,
            damage: 20.0,
            projectile_damage: 12.0,
        };
        let mut body = Boss::spawn_copy(9, copy.origin, &copy, &tuning);
        body.take_damage(1000.0, false).unwrap();
        assert!(boss_killed(&mut body).is_empty());
    }

    #[test]
    fn test_copies_never_split() {
        let mut h = Harness::new(2);
        let player = Vec2::new(900.0, 450.0);
        let tuning = BossTuning::default();
        let copy = SplitCopy {
            origin: Vec2::new(400.0, 450.0),
            count: 2,
            generation: SPLIT_MAX_GENERATION,
            max_health: 400.0,
            radius: 30.0,
            speed: 70.0,
            damage: 20.0,
            projectile_damage: 12.0,
        };
        let mut body = Boss::spawn_copy(9, copy.origin, &copy, &tuning);
        for _ in 0..10 {
            body.take_damage(35.0, false).unwrap();
            update_boss(&mut body, &mut h.ctx(16.0, player));
        }
        assert!(splits(&h.commands).is_empty());
        assert!(!body.dying);
        assert_eq!(body.boss.as_ref().unwrap().phase_tag(), "fragment");
    }

    #[test]
    fn test_split_depth_is_bounded() {
        // Follow every copy down; the tree stops after one extra generation
        let tuning = BossTuning::default();
        let mut h = Harness::new(3);
        let player = Vec2::new(900.0, 450.0);
        let mut frontier = vec![spawn(BossKind::Splitter, Vec2::new(400.0, 450.0))];
        let mut max_generation = 0;
        let mut next_id = 100;

        for _ in 0..4 {
            let mut next = Vec::new();
            for mut body in frontier.drain(..) {
                h.commands.clear();
                body.take_damage(body.max_health * 0.6, false).unwrap();
                update_boss(&mut body, &mut h.ctx(16.0, player));
                for copy in splits(&h.commands) {
                    max_generation = max_generation.max(copy.generation);
                    for _ in 0..copy.count {
                        next_id += 1;
                        next.push(Boss::spawn_copy(next_id, copy.origin, &copy, &tuning));
                    }
                }
            }
            frontier = next;
        }
        assert_eq!(max_generation, SPLIT_MAX_GENERATION);
        assert!(frontier.is_empty());
    }

    #[test]
    fn test_no_minions() {
        assert!(!SplitterState::new(0).spawns_minions());
    }
}

//! The player turret: vitals, defensive triggers, movement, aim and fire

use glam::Vec2;
use rand_pcg::Pcg32;
use serde::{Deserialize, Serialize};

use super::damage::{Absorption, DamageSource, Vitals};
use super::enemy::Enemy;
use super::loadout::{Loadout, ProgressionBundle, StatBundle};
use super::modifiers::{AscensionModifier, resolve_stats};
use super::projectile::{Owner, ProjectileFlags, Shot, roll_critical};
use super::targeting::{TargetingState, predictive_angle, within_tolerance};
use crate::error::{AmountKind, SimError, check_amount};
use crate::tuning::{ArenaTuning, PlayerTuning, ProjectileTuning};

/// Movement key state for one tick
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct MoveInput {
    pub up: bool,
    pub down: bool,
    pub left: bool,
    pub right: bool,
}

impl MoveInput {
    /// Unit direction, or zero when idle or opposing keys cancel
    pub fn direction(&self) -> Vec2 {
        let x = self.right as i8 - self.left as i8;
        let y = self.down as i8 - self.up as i8;
        Vec2::new(x as f32, y as f32).normalize_or_zero()
    }
}

/// Why a hit did nothing
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Blocked {
    /// Inside the short window after an enemy projectile hit
    HitInvulnerable,
    /// Barrier phase active
    Barrier,
    GodMode,
}

#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct DamageOutcome {
    pub blocked: Option<Blocked>,
    pub absorption: Absorption,
    pub barrier_triggered: bool,
    /// Health restored by an emergency heal this call
    pub emergency_heal: Option<f32>,
    pub died: bool,
}

/// Bonuses that last until the current wave ends
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TransientBonus {
    pub damage_multiplier: f32,
    pub fire_rate_multiplier: f32,
}

impl Default for TransientBonus {
    fn default() -> Self {
        Self {
            damage_multiplier: 1.0,
            fire_rate_multiplier: 1.0,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Player {
    pub pos: Vec2,
    pub vel: Vec2,
    pub facing: f32,
    pub radius: f32,
    pub vitals: Vitals,
    /// Stats as handed in by progression
    pub base_stats: StatBundle,
    /// `base_stats` with ascension deltas folded in
    pub stats: StatBundle,
    pub transient: TransientBonus,
    pub loadout: Loadout,
    pub ascensions: Vec<AscensionModifier>,
    pub targeting: TargetingState,
    pub fire_cooldown_ms: f32,
    pub shots_fired: u32,
    pub hit_invulnerable_ms: f32,
    pub barrier_active_ms: f32,
    pub barrier_cooldown_ms: f32,
    pub emergency_heal_cooldown_ms: f32,
    /// Time since the last hit that got through; gates shield regen
    pub since_damage_ms: f32,
    pub god_mode: bool,
    /// Move and turn speed multiplier imposed by bosses, reset every tick
    pub external_slow: f32,
}

impl Player {
    pub fn new(tuning: &PlayerTuning, arena: &ArenaTuning) -> Self {
        Self {
            pos: Vec2::new(arena.width / 2.0, arena.height / 2.0),
            vel: Vec2::ZERO,
            facing: -std::f32::consts::FRAC_PI_2,
            radius: tuning.radius,
            vitals: Vitals::new(tuning.max_hp, tuning.max_shield),
            base_stats: StatBundle::default(),
            stats: StatBundle::default(),
            transient: TransientBonus::default(),
            loadout: Loadout::default(),
            ascensions: Vec::new(),
            targeting: TargetingState::default(),
            fire_cooldown_ms: 0.0,
            shots_fired: 0,
            hit_invulnerable_ms: 0.0,
            barrier_active_ms: 0.0,
            barrier_cooldown_ms: 0.0,
            emergency_heal_cooldown_ms: 0.0,
            since_damage_ms: 0.0,
            god_mode: false,
            external_slow: 1.0,
        }
    }

    /// Back to a fresh run, keeping nothing
    pub fn reset(&mut self, tuning: &PlayerTuning, arena: &ArenaTuning) {
        *self = Player::new(tuning, arena);
    }

    /// Take a resolved progression snapshot. Written between waves.
    pub fn apply_progression(&mut self, bundle: &ProgressionBundle, tuning: &PlayerTuning) {
        self.base_stats = bundle.stats;
        self.loadout = bundle.loadout.clone();
        self.recompute_stats(tuning);
    }

    pub fn add_ascension(&mut self, modifier: AscensionModifier, tuning: &PlayerTuning) {
        self.ascensions.push(modifier);
        self.recompute_stats(tuning);
    }

    pub fn grant_transient(&mut self, bonus: TransientBonus) {
        self.transient = bonus;
    }

    pub fn clear_transient(&mut self) {
        self.transient = TransientBonus::default();
    }

    fn recompute_stats(&mut self, tuning: &PlayerTuning) {
        self.stats = resolve_stats(&self.base_stats, &self.ascensions);
        self.vitals.set_max(
            tuning.max_hp + self.stats.bonus_max_hp,
            tuning.max_shield + self.stats.bonus_max_shield,
        );
    }

    pub fn damage_multiplier(&self) -> f32 {
        self.stats.damage_multiplier * self.transient.damage_multiplier
    }

    pub fn fire_rate_multiplier(&self) -> f32 {
        self.stats.fire_rate_multiplier * self.transient.fire_rate_multiplier
    }

    /// Cooldown after a shot: base interval over the fire-rate multiplier,
    /// never below the floor
    pub fn fire_interval_ms(&self, tuning: &PlayerTuning) -> f32 {
        let rate = self.fire_rate_multiplier().max(f32::EPSILON);
        (tuning.base_fire_interval_ms / rate).max(tuning.min_fire_interval_ms)
    }

    pub fn is_dead(&self) -> bool {
        self.vitals.is_dead()
    }

    /// Resolve an incoming hit.
    ///
    /// Order: invulnerability window, barrier, god mode, then
    /// damage-taken multiplier and flat reduction, then shield before
    /// health. Barrier and emergency heal are checked afterwards, barrier
    /// first.
    pub fn take_damage(
        &mut self,
        amount: f32,
        source: DamageSource,
        tuning: &PlayerTuning,
    ) -> Result<DamageOutcome, SimError> {
        let amount = check_amount(AmountKind::Damage, amount)?;
        let mut outcome = DamageOutcome::default();
        if self.vitals.is_dead() {
            return Ok(outcome);
        }

        let blocked = if self.hit_invulnerable_ms > 0.0 {
            Some(Blocked::HitInvulnerable)
        } else if self.barrier_active_ms > 0.0 {
            Some(Blocked::Barrier)
        } else if self.god_mode {
            Some(Blocked::GodMode)
        } else {
            None
        };
        if blocked.is_some() {
            outcome.blocked = blocked;
            return Ok(outcome);
        }

        let scaled = (amount * self.stats.damage_taken_multiplier - self.stats.flat_damage_reduction).max(0.0);
        outcome.absorption = self.vitals.absorb(scaled)?;
        if outcome.absorption.total() > 0.0 {
            self.since_damage_ms = 0.0;
        }
        if source.arms_hit_invulnerability() {
            self.hit_invulnerable_ms = tuning.hit_invulnerability_ms;
        }

        if !self.vitals.is_dead() {
            let ratio = self.vitals.health_ratio();
            let barrier = self
                .loadout
                .barrier_phase
                .filter(|b| self.barrier_cooldown_ms <= 0.0 && ratio <= b.health_threshold);
            if let Some(barrier) = barrier {
                self.barrier_active_ms = barrier.duration_ms;
                self.barrier_cooldown_ms = barrier.cooldown_ms;
                outcome.barrier_triggered = true;
            }
            let heal = self
                .loadout
                .emergency_heal
                .filter(|h| self.emergency_heal_cooldown_ms <= 0.0 && ratio <= h.health_threshold);
            if let Some(heal) = heal {
                let healed = self.vitals.heal(self.vitals.max_hp * heal.heal_fraction)?;
                self.emergency_heal_cooldown_ms = heal.cooldown_ms;
                outcome.emergency_heal = Some(healed);
            }
        }

        outcome.died = self.vitals.is_dead();
        Ok(outcome)
    }

    pub fn heal(&mut self, amount: f32) -> Result<f32, SimError> {
        self.vitals.heal(amount)
    }

    /// Count down every timer and regenerate shield after a quiet spell
    pub fn update_timers(&mut self, dt_ms: f32, tuning: &PlayerTuning) -> Result<(), SimError> {
        let tick = |t: &mut f32| *t = (*t - dt_ms).max(0.0);
        tick(&mut self.fire_cooldown_ms);
        tick(&mut self.hit_invulnerable_ms);
        tick(&mut self.barrier_active_ms);
        tick(&mut self.barrier_cooldown_ms);
        tick(&mut self.emergency_heal_cooldown_ms);
        self.since_damage_ms += dt_ms;

        if !self.is_dead() && self.since_damage_ms >= tuning.shield_regen_delay_ms {
            self.vitals
                .restore_shield(tuning.shield_regen_per_sec * dt_ms / 1000.0)?;
        }
        Ok(())
    }

    /// Walk from key state, kept inside the arena
    pub fn apply_movement(&mut self, input: MoveInput, dt_ms: f32, tuning: &PlayerTuning, arena: &ArenaTuning) {
        let speed = tuning.move_speed * self.stats.move_speed_multiplier * self.external_slow;
        self.vel = input.direction() * speed;
        self.displace(self.vel * (dt_ms / 1000.0), arena);
    }

    /// Shift position (movement, boss pull) and clamp to the arena
    pub fn displace(&mut self, offset: Vec2, arena: &ArenaTuning) {
        let lo = Vec2::splat(self.radius);
        let hi = (Vec2::new(arena.width, arena.height) - lo).max(lo);
        self.pos = (self.pos + offset).clamp(lo, hi);
    }

    /// Pick a target, turn toward its lead angle and fire if the gate
    /// allows. Returns the shots to launch this tick.
    #[allow(clippy::too_many_arguments)]
    pub fn update_turret(
        &mut self,
        enemies: &[Enemy],
        dt_ms: f32,
        tuning: &PlayerTuning,
        projectiles: &ProjectileTuning,
        arena: &ArenaTuning,
        margin: f32,
        rng: &mut Pcg32,
    ) -> Vec<Shot> {
        let picked = self.targeting.acquire(
            self.pos,
            enemies,
            arena,
            margin,
            tuning.target_health_weight,
            tuning.max_rotation_time_ms,
        );
        let Some(index) = picked else {
            self.targeting.aimed = false;
            return Vec::new();
        };
        let target = &enemies[index];

        let lead = predictive_angle(self.pos, target.pos, target.vel, projectiles.speed);
        let turn_rate = tuning.rotation_speed * self.stats.rotation_speed_multiplier * self.external_slow;
        self.facing = crate::rotate_toward(self.facing, lead, turn_rate * dt_ms / 1000.0);
        self.targeting.aimed = within_tolerance(self.facing, lead);
        if self.targeting.aimed {
            self.targeting.rotating_ms = 0.0;
        } else {
            self.targeting.rotating_ms += dt_ms;
        }

        if self.fire_cooldown_ms > 0.0 || !self.targeting.aimed {
            return Vec::new();
        }
        self.fire_cooldown_ms = self.fire_interval_ms(tuning);
        self.shots_fired = self.shots_fired.wrapping_add(1);
        self.build_volley(tuning, projectiles, rng)
    }

    fn build_volley(&self, tuning: &PlayerTuning, projectiles: &ProjectileTuning, rng: &mut Pcg32) -> Vec<Shot> {
        let mut damage = tuning.base_damage * self.damage_multiplier();
        let mut flags = ProjectileFlags {
            piercing: self.loadout.piercing_count(),
            explosive: self.loadout.explosive,
            chain_hit: self.loadout.chain_hit,
            homing: self.loadout.homing,
            shield_breaker: self.loadout.shield_breaker,
            ricochet_bounces: self.loadout.ricochet_bounces,
            is_critical: false,
            life_steal: self.loadout.life_steal,
        };
        let overcharge = self
            .loadout
            .overcharge_burst
            .filter(|o| o.every_nth_shot > 0 && self.shots_fired % o.every_nth_shot == 0);
        if let Some(overcharge) = overcharge {
            damage *= overcharge.damage_multiplier;
            flags.explosive = Some(flags.explosive.unwrap_or_default());
        }

        let angles: Vec<f32> = if self.loadout.triple_shot {
            let spread = tuning.triple_shot_spread;
            vec![self.facing - spread, self.facing, self.facing + spread]
        } else {
            vec![self.facing]
        };

        angles
            .into_iter()
            .map(|angle| {
                let is_critical = roll_critical(rng, tuning.base_crit_chance, self.stats.crit_bonus);
                Shot {
                    owner: Owner::Player,
                    origin: self.pos + crate::direction(angle) * self.radius,
                    angle,
                    speed: projectiles.speed,
                    damage: if is_critical { damage * 2.0 } else { damage },
                    radius: projectiles.radius,
                    lifetime_ms: projectiles.lifetime_ms,
                    flags: ProjectileFlags { is_critical, ..flags },
                }
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sim::damage::SourceKind;
    use crate::sim::enemy::{EnemyKind, StatScaling};
    use crate::sim::loadout::{BarrierConfig, EmergencyHealConfig, OverchargeConfig};
    use crate::sim::modifiers::{Stat, StatDelta};
    use rand::SeedableRng;

    fn player() -> (Player, PlayerTuning) {
        let tuning = PlayerTuning::default();
        (Player::new(&tuning, &ArenaTuning::default()), tuning)
    }

    fn hazard() -> DamageSource {
        DamageSource::new(SourceKind::Hazard)
    }

    #[test]
    fn test_shield_break_scenario() {
        let (mut p, t) = player();
        p.vitals = Vitals {
            hp: 100.0,
            max_hp: 100.0,
            shield: 10.0,
            max_shield: 50.0,
        };
        let out = p.take_damage(15.0, hazard(), &t).unwrap();
        assert_eq!(p.vitals.shield, 0.0);
        assert_eq!(p.vitals.hp, 95.0);
        assert!(out.absorption.shield_broke);

        let out = p.take_damage(5.0, hazard(), &t).unwrap();
        assert!(!out.absorption.shield_broke);
    }

    #[test]
    fn test_every_source_hits_shield_first() {
        let (mut p, t) = player();
        let hp = p.vitals.hp;
        let shield = p.vitals.shield;
        for kind in [
            SourceKind::EnemyProjectile,
            SourceKind::Contact,
            SourceKind::Hazard,
            SourceKind::Explosion,
        ] {
            p.hit_invulnerable_ms = 0.0;
            let out = p.take_damage(2.0, DamageSource::new(kind), &t).unwrap();
            assert_eq!(out.absorption.shield_damage, 2.0, "{kind:?}");
            assert_eq!(out.absorption.health_damage, 0.0, "{kind:?}");
        }
        assert_eq!(p.vitals.hp, hp);
        assert_eq!(p.vitals.shield, shield - 8.0);
    }

    #[test]
    fn test_negative_rejected_without_side_effects() {
        let (mut p, t) = player();
        let before = p.vitals;
        assert!(p.take_damage(-1.0, hazard(), &t).is_err());
        assert!(p.heal(-3.0).is_err());
        assert_eq!(p.vitals, before);
    }

    #[test]
    fn test_projectile_hit_arms_invulnerability() {
        let (mut p, t) = player();
        let projectile = DamageSource::new(SourceKind::EnemyProjectile);
        p.take_damage(10.0, projectile, &t).unwrap();
        let shield = p.vitals.shield;
        let out = p.take_damage(10.0, hazard(), &t).unwrap();
        assert_eq!(out.blocked, Some(Blocked::HitInvulnerable));
        assert_eq!(p.vitals.shield, shield);

        p.update_timers(t.hit_invulnerability_ms, &t).unwrap();
        let out = p.take_damage(10.0, hazard(), &t).unwrap();
        assert_eq!(out.blocked, None);
    }

    #[test]
    fn test_god_mode_blocks() {
        let (mut p, t) = player();
        p.god_mode = true;
        let out = p.take_damage(1000.0, hazard(), &t).unwrap();
        assert_eq!(out.blocked, Some(Blocked::GodMode));
        assert!(!p.is_dead());
    }

    #[test]
    fn test_damage_taken_modifiers_apply_before_absorb() {
        let (mut p, t) = player();
        p.add_ascension(
            AscensionModifier::new("fragile")
                .with_delta(StatDelta::mul(Stat::DamageTaken, 2.0))
                .with_delta(StatDelta::add(Stat::FlatReduction, 5.0)),
            &t,
        );
        let out = p.take_damage(10.0, hazard(), &t).unwrap();
        assert_eq!(out.absorption.total(), 15.0);

        let out = p.take_damage(2.0, hazard(), &t).unwrap();
        assert_eq!(out.absorption.total(), 0.0);
    }

    #[test]
    fn test_barrier_then_emergency_heal() {
        let (mut p, mut t) = player();
        t.shield_regen_delay_ms = 1e9;
        p.loadout.barrier_phase = Some(BarrierConfig::default());
        p.loadout.emergency_heal = Some(EmergencyHealConfig::default());
        p.vitals.shield = 0.0;

        let out = p.take_damage(80.0, hazard(), &t).unwrap();
        assert!(out.barrier_triggered);
        assert!(out.emergency_heal.is_some());
        assert!((p.vitals.hp - 55.0).abs() < 1e-4);

        let out = p.take_damage(50.0, hazard(), &t).unwrap();
        assert_eq!(out.blocked, Some(Blocked::Barrier));

        // Barrier runs out but both stay on cooldown
        p.update_timers(3000.0, &t).unwrap();
        let out = p.take_damage(40.0, hazard(), &t).unwrap();
        assert!(!out.barrier_triggered);
        assert!(out.emergency_heal.is_none());
        assert!((p.vitals.hp - 15.0).abs() < 1e-4);
    }

    #[test]
    fn test_triggers_do_not_fire_on_death() {
        let (mut p, t) = player();
        p.loadout.emergency_heal = Some(EmergencyHealConfig::default());
        p.vitals.shield = 0.0;
        let out = p.take_damage(500.0, hazard(), &t).unwrap();
        assert!(out.died);
        assert!(out.emergency_heal.is_none());
        assert_eq!(p.vitals.hp, 0.0);
    }

    #[test]
    fn test_shield_regen_after_delay() {
        let (mut p, t) = player();
        p.take_damage(10.0, hazard(), &t).unwrap();
        let after_hit = p.vitals.shield;
        p.update_timers(t.shield_regen_delay_ms - 100.0, &t).unwrap();
        assert_eq!(p.vitals.shield, after_hit);
        p.update_timers(1000.0, &t).unwrap();
        assert!(p.vitals.shield > after_hit);
    }

    #[test]
    fn test_fire_interval_floor() {
        let (mut p, t) = player();
        assert_eq!(p.fire_interval_ms(&t), t.base_fire_interval_ms);
        p.stats.fire_rate_multiplier = 1000.0;
        assert_eq!(p.fire_interval_ms(&t), t.min_fire_interval_ms);
    }

    #[test]
    fn test_movement_clamped() {
        let (mut p, t) = player();
        let arena = ArenaTuning::default();
        p.pos = Vec2::new(20.0, 20.0);
        let input = MoveInput {
            up: true,
            left: true,
            ..MoveInput::default()
        };
        p.apply_movement(input, 1000.0, &t, &arena);
        assert_eq!(p.pos, Vec2::splat(p.radius));

        p.external_slow = 0.5;
        p.pos = Vec2::new(400.0, 400.0);
        p.apply_movement(MoveInput { right: true, ..MoveInput::default() }, 1000.0, &t, &arena);
        assert!((p.pos.x - (400.0 + t.move_speed * 0.5)).abs() < 1e-3);
    }

    #[test]
    fn test_turret_turns_then_fires() {
        let (mut p, t) = player();
        let proj = ProjectileTuning::default();
        let arena = ArenaTuning::default();
        let mut rng = Pcg32::seed_from_u64(1);
        let enemies = vec![Enemy::new(
            4,
            EnemyKind::Grunt,
            p.pos + Vec2::new(300.0, 0.0),
            &StatScaling::default(),
        )];
        p.facing = std::f32::consts::PI;

        // Facing the wrong way: no shot until turned
        let shots = p.update_turret(&enemies, 16.0, &t, &proj, &arena, 20.0, &mut rng);
        assert!(shots.is_empty());
        assert!(!p.targeting.aimed);
        assert!(p.targeting.rotating_ms > 0.0);

        let mut fired = Vec::new();
        for _ in 0..200 {
            p.update_timers(16.0, &t).unwrap();
            fired.extend(p.update_turret(&enemies, 16.0, &t, &proj, &arena, 20.0, &mut rng));
            if !fired.is_empty() {
                break;
            }
        }
        assert_eq!(fired.len(), 1);
        assert!(fired[0].angle.abs() <= crate::consts::AIM_TOLERANCE);
        assert_eq!(p.fire_cooldown_ms, t.base_fire_interval_ms);
        assert_eq!(p.targeting.target, Some(4));
    }

    #[test]
    fn test_triple_shot_and_overcharge() {
        let (mut p, t) = player();
        let proj = ProjectileTuning::default();
        let mut rng = Pcg32::seed_from_u64(2);
        p.loadout.triple_shot = true;
        p.loadout.piercing_level = 2;
        p.loadout.overcharge_burst = Some(OverchargeConfig {
            every_nth_shot: 2,
            damage_multiplier: 3.0,
        });

        p.shots_fired = 1;
        let volley = p.build_volley(&t, &proj, &mut rng);
        assert_eq!(volley.len(), 3);
        assert!(volley.iter().all(|s| s.flags.piercing == Some(3)));
        assert!(volley.iter().all(|s| s.flags.explosive.is_none()));

        p.shots_fired = 2;
        let volley = p.build_volley(&t, &proj, &mut rng);
        for shot in &volley {
            assert!(shot.flags.explosive.is_some());
            let base = t.base_damage * 3.0;
            let expected = if shot.flags.is_critical { base * 2.0 } else { base };
            assert_eq!(shot.damage, expected);
        }
    }

    #[test]
    fn test_progression_resizes_vitals() {
        let (mut p, t) = player();
        let mut bundle = ProgressionBundle::default();
        bundle.stats.bonus_max_hp = 50.0;
        bundle.loadout.homing = Some(Default::default());
        p.apply_progression(&bundle, &t);
        assert_eq!(p.vitals.max_hp, t.max_hp + 50.0);
        assert!(p.loadout.homing.is_some());
    }
}

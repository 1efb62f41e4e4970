//! Collision resolution and the effects that need the whole field:
//! explosions, chain hits, contact damage and kill bookkeeping
//!
//! Enemies are walked by index over the list as it stands; an enemy killed
//! mid-pass stays in place (flagged `dying`) until compaction on a later
//! tick, so nothing is skipped or visited twice.

use glam::Vec2;
use rand::Rng;
use rand_pcg::Pcg32;

use super::boss::boss_killed;
use super::damage::{DamageSource, SourceKind};
use super::enemy::{Enemy, EnemyHit, EnemyKind};
use super::loadout::ChainHitConfig;
use super::modifiers::ModifierHook;
use super::player::{DamageOutcome, Player};
use super::projectile::{Owner, Projectile, ProjectileFlags};
use super::state::{GameState, SimEvent};
use super::tick::apply_boss_command;
use crate::consts::EPSILON;
use crate::error::SimError;
use crate::tuning::{PlayerTuning, Tuning};

/// A radial blast with linear falloff
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Blast {
    pub center: Vec2,
    pub radius: f32,
    /// Damage at the centre
    pub damage: f32,
    /// Enemy already hit directly; the blast spares it
    pub exclude: Option<u32>,
    pub shield_breaker: bool,
}

impl Blast {
    /// Damage at `dist` from the centre; zero at and beyond the edge
    pub fn damage_at(&self, dist: f32) -> f32 {
        if self.radius <= EPSILON || dist >= self.radius {
            return 0.0;
        }
        self.damage * (1.0 - dist / self.radius)
    }
}

/// Resolve a hit on the player and report what it did
pub fn hurt_player(
    player: &mut Player,
    tuning: &PlayerTuning,
    events: &mut Vec<SimEvent>,
    amount: f32,
    source: DamageSource,
) -> Result<DamageOutcome, SimError> {
    let outcome = player.take_damage(amount, source, tuning)?;
    let dealt = outcome.absorption.total();
    if dealt > 0.0 {
        events.push(SimEvent::PlayerHit {
            damage: dealt,
            source: source.kind,
        });
    }
    if outcome.absorption.shield_broke {
        events.push(SimEvent::ShieldBroken);
    }
    if outcome.barrier_triggered {
        events.push(SimEvent::BarrierActivated);
    }
    if let Some(amount) = outcome.emergency_heal {
        events.push(SimEvent::EmergencyHeal { amount });
    }
    Ok(outcome)
}

/// Mutable view of everything combat touches besides the projectile pool
pub struct Field<'a> {
    pub enemies: &'a mut [Enemy],
    pub player: &'a mut Player,
    pub rng: &'a mut Pcg32,
    pub events: &'a mut Vec<SimEvent>,
    pub tuning: &'a Tuning,
}

impl Field<'_> {
    /// Damage one enemy and report the hit
    pub fn strike(&mut self, index: usize, amount: f32, shield_breaker: bool, critical: bool) -> Result<EnemyHit, SimError> {
        let enemy = &mut self.enemies[index];
        let hit = enemy.take_damage(amount, shield_breaker)?;
        if hit.applied > 0.0 {
            self.events.push(SimEvent::EnemyHit {
                id: enemy.id,
                damage: hit.applied,
                critical,
            });
        }
        Ok(hit)
    }

    /// Apply a blast to every live enemy in range. Returns the ids it hurt.
    pub fn detonate(&mut self, blast: &Blast) -> Result<Vec<u32>, SimError> {
        self.events.push(SimEvent::Explosion {
            pos: blast.center,
            radius: blast.radius,
        });
        let mut struck = Vec::new();
        for index in 0..self.enemies.len() {
            let enemy = &self.enemies[index];
            if enemy.dying || Some(enemy.id) == blast.exclude {
                continue;
            }
            let id = enemy.id;
            let amount = blast.damage_at(enemy.pos.distance(blast.center));
            if amount <= 0.0 {
                continue;
            }
            self.strike(index, amount, blast.shield_breaker, false)?;
            struck.push(id);
        }
        Ok(struck)
    }

    /// Hop from `from` to the nearest live enemy not yet in `visited`.
    ///
    /// Each hop needs its own roll and multiplies the previous hop's damage
    /// by the configured factor. Hops land as plain hits and never explode.
    /// Returns the number of hops.
    pub fn chain(
        &mut self,
        from: Vec2,
        damage: f32,
        config: &ChainHitConfig,
        visited: &mut Vec<u32>,
        shield_breaker: bool,
    ) -> Result<u32, SimError> {
        let range_sq = config.range * config.range;
        let chance = config.chance.clamp(0.0, 1.0);
        let mut origin = from;
        let mut damage = damage;
        let mut hops = 0;

        while hops < config.max_bounces {
            if !self.rng.random_bool(chance) {
                break;
            }
            let next = self
                .enemies
                .iter()
                .enumerate()
                .filter(|(_, e)| !e.dying && !visited.contains(&e.id))
                .map(|(i, e)| (i, e.pos.distance_squared(origin)))
                .filter(|&(_, d)| d <= range_sq)
                .min_by(|a, b| a.1.total_cmp(&b.1))
                .map(|(i, _)| i);
            let Some(index) = next else {
                break;
            };

            damage *= config.damage_factor;
            let to = self.enemies[index].pos;
            visited.push(self.enemies[index].id);
            self.strike(index, damage, shield_breaker, false)?;
            self.events.push(SimEvent::ChainHit { from: origin, to, damage });
            origin = to;
            hops += 1;
        }
        Ok(hops)
    }

    /// Everything a player shot does when it connects with `index`.
    ///
    /// `explode` is true only for the shot's first qualifying impact. Chains
    /// start from that explosion, or from any hit of a non-explosive shot.
    pub fn impact(
        &mut self,
        index: usize,
        damage: f32,
        flags: &ProjectileFlags,
        already_hit: &[u32],
        explode: bool,
    ) -> Result<(), SimError> {
        let id = self.enemies[index].id;
        let pos = self.enemies[index].pos;
        let hit = self.strike(index, damage, flags.shield_breaker, flags.is_critical)?;

        // Damage soaked by a boss shield heals nothing
        if let Some(fraction) = flags.life_steal {
            if hit.health_damage > 0.0 {
                self.player.heal(hit.health_damage * fraction)?;
            }
        }

        let blast = flags.explosive.filter(|_| explode).map(|config| Blast {
            center: pos,
            radius: config.radius,
            damage: damage * config.damage_fraction,
            exclude: Some(id),
            shield_breaker: flags.shield_breaker,
        });
        if let Some(blast) = &blast {
            self.detonate(blast)?;
        }

        let chains_here = flags.explosive.is_none() || blast.is_some();
        if let Some(config) = flags.chain_hit.filter(|_| chains_here) {
            let mut visited = already_hit.to_vec();
            if !visited.contains(&id) {
                visited.push(id);
            }
            let seed = blast.map_or(damage, |b| b.damage);
            self.chain(pos, seed, &config, &mut visited, flags.shield_breaker)?;
        }
        Ok(())
    }
}

/// Blast for an explosive player shot that died without exploding
pub fn spent_blast(shot: &mut Projectile) -> Option<Blast> {
    if shot.owner != Owner::Player || shot.exploded {
        return None;
    }
    let config = shot.flags.explosive?;
    shot.exploded = true;
    Some(Blast {
        center: shot.pos,
        radius: config.radius,
        damage: shot.damage * config.damage_fraction,
        exclude: None,
        shield_breaker: shot.flags.shield_breaker,
    })
}

/// Slow-field ability: enemies near the player move at the field's factor
pub fn apply_slow_field(enemies: &mut [Enemy], player: &Player) {
    let field = player.loadout.slow_field;
    for enemy in enemies {
        enemy.slow_factor = match field {
            Some(f) if enemy.pos.distance(player.pos) <= f.radius => f.factor,
            _ => 1.0,
        };
    }
}

/// Player shots against enemies
pub fn resolve_player_shots(state: &mut GameState) -> Result<(), SimError> {
    let GameState {
        projectiles,
        enemies,
        player,
        rng,
        events,
        tuning,
        ..
    } = state;
    let mut field = Field {
        enemies,
        player,
        rng,
        events,
        tuning,
    };

    for handle in projectiles.handles() {
        let Some(shot) = projectiles.get_mut(handle) else {
            continue;
        };
        if shot.dead || shot.owner != Owner::Player {
            continue;
        }
        for index in 0..field.enemies.len() {
            let enemy = &field.enemies[index];
            if enemy.dying || shot.has_hit(enemy.id) {
                continue;
            }
            let reach = shot.radius + enemy.radius;
            if shot.pos.distance_squared(enemy.pos) > reach * reach {
                continue;
            }
            let Some(damage) = shot.register_hit(enemy.id) else {
                break;
            };
            let explode = shot.flags.explosive.is_some() && !shot.exploded;
            if explode {
                shot.exploded = true;
            }
            let flags = shot.flags;
            field.impact(index, damage, &flags, &shot.hit_ids, explode)?;
            if shot.dead {
                break;
            }
        }
    }
    Ok(())
}

/// Enemy shots against the player
pub fn resolve_enemy_shots(state: &mut GameState) -> Result<(), SimError> {
    let GameState {
        projectiles,
        player,
        events,
        tuning,
        ..
    } = state;
    for shot in projectiles.iter_mut() {
        if shot.dead || shot.owner != Owner::Enemy {
            continue;
        }
        let reach = shot.radius + player.radius;
        if shot.pos.distance_squared(player.pos) > reach * reach {
            continue;
        }
        shot.dead = true;
        hurt_player(
            player,
            &tuning.player,
            events,
            shot.damage,
            DamageSource::new(SourceKind::EnemyProjectile),
        )?;
    }
    Ok(())
}

/// Bodies touching the player. Bombers go off; everyone else hits on a
/// per-enemy cooldown.
pub fn resolve_contacts(state: &mut GameState) -> Result<(), SimError> {
    let GameState {
        enemies,
        player,
        events,
        tuning,
        ..
    } = state;
    for enemy in enemies.iter_mut() {
        if enemy.dying || enemy.contact_cooldown_ms > 0.0 {
            continue;
        }
        let reach = enemy.radius + player.radius;
        if enemy.pos.distance_squared(player.pos) > reach * reach {
            continue;
        }
        if enemy.kind == EnemyKind::Bomber {
            // Hostile blast: only the player is in it. The radius sizes the
            // explosion the host draws.
            enemy.mark_dying();
            events.push(SimEvent::Explosion {
                pos: enemy.pos,
                radius: tuning.enemies.bomber_blast_radius,
            });
            hurt_player(
                player,
                &tuning.player,
                events,
                enemy.damage,
                DamageSource::new(SourceKind::Explosion),
            )?;
        } else {
            enemy.contact_cooldown_ms = tuning.enemies.contact_cooldown_ms;
            hurt_player(
                player,
                &tuning.player,
                events,
                enemy.damage,
                DamageSource::new(SourceKind::Contact),
            )?;
        }
    }
    Ok(())
}

/// All collision passes for one tick, then release spent projectiles
pub fn resolve_collisions(state: &mut GameState) -> Result<(), SimError> {
    resolve_player_shots(state)?;
    resolve_enemy_shots(state)?;
    resolve_contacts(state)?;
    state.projectiles.retain(|p| !p.dead);
    Ok(())
}

/// Score newly dead enemies and run kill hooks.
///
/// Explode-on-kill blasts can kill more enemies; those are handled in the
/// next round. Every enemy is reported once, so this terminates.
pub fn process_kills(state: &mut GameState) -> Result<(), SimError> {
    let hooks: Vec<ModifierHook> = state
        .player
        .ascensions
        .iter()
        .filter_map(|m| m.hook)
        .collect();

    loop {
        let mut blasts = Vec::new();
        let mut last_words = Vec::new();
        let mut any = false;
        for enemy in state.enemies.iter_mut() {
            if !enemy.dying || enemy.kill_reported {
                continue;
            }
            any = true;
            enemy.kill_reported = true;
            if let Some(boss) = enemy.boss.as_ref() {
                // Split into copies on its own: not a kill
                if boss.split_away() {
                    continue;
                }
                let (id, kind) = (enemy.id, boss.kind);
                last_words.extend(boss_killed(enemy).into_iter().map(|c| (id, kind, c)));
            }
            let score = enemy.kind.base_stats().score;
            state.score += u64::from(score);
            state.kills += 1;
            state.waves.record_kill();
            state.events.push(SimEvent::EnemyKilled {
                id: enemy.id,
                kind: enemy.kind,
                boss: enemy.boss.as_ref().map(|b| b.kind),
                pos: enemy.pos,
                score,
            });

            for hook in &hooks {
                match *hook {
                    ModifierHook::HealOnKill { amount } => {
                        state.player.heal(amount)?;
                    }
                    ModifierHook::ExplodeOnKill { radius, damage_fraction } => blasts.push(Blast {
                        center: enemy.pos,
                        radius,
                        damage: enemy.max_health * damage_fraction,
                        exclude: Some(enemy.id),
                        shield_breaker: false,
                    }),
                    ModifierHook::ShieldOnWaveStart { .. } => {}
                }
            }
        }
        if !any {
            return Ok(());
        }
        for (id, kind, command) in last_words {
            apply_boss_command(state, id, kind, command)?;
        }
        let mut field = state.field();
        for blast in &blasts {
            field.detonate(blast)?;
        }
    }
}

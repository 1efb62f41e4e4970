//! Boss encounters
//!
//! A boss is an ordinary `Enemy` body carrying a `Boss` record: the kind tag,
//! the variant's phase state, and an arsenal it alone owns (queued
//! sub-attacks and hazards). Variant logic is reached through
//! `BossBehavior`; its default methods are the shared base every variant
//! starts from: close to a stand-off distance, attack on a cadence, call in
//! minions.
//!
//! Bosses never touch the rest of the world directly. They push
//! `BossCommand`s which the tick applies afterwards.

mod chrono;
mod classic;
mod hazard;
mod schedule;
mod shield;
mod splitter;
mod teleporter;
mod vortex;

pub use chrono::{ChronoPattern, ChronoState, TimePhase};
pub use classic::ClassicState;
pub use hazard::{Hazard, HazardKind};
pub use schedule::{BossAction, ScheduledTask, TaskSchedule};
pub use shield::{LaserState, ShieldMode, ShieldState};
pub use splitter::SplitterState;
pub use teleporter::TeleporterState;
pub use vortex::VortexState;

use std::f32::consts::TAU;

use glam::Vec2;
use rand::Rng;
use rand_pcg::Pcg32;
use serde::{Deserialize, Serialize};

use super::damage::DamageSource;
use super::enemy::{Enemy, EnemyKind, StatScaling};
use crate::consts::EPSILON;
use crate::tuning::{ArenaTuning, BossTuning};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum BossKind {
    Classic,
    Shield,
    Teleporter,
    Splitter,
    Vortex,
    /// Final boss of each rotation
    Chrono,
}

impl BossKind {
    /// Order bosses appear in on successive boss waves
    pub const ROTATION: [BossKind; 6] = [
        BossKind::Classic,
        BossKind::Shield,
        BossKind::Teleporter,
        BossKind::Splitter,
        BossKind::Vortex,
        BossKind::Chrono,
    ];

    /// Kind for the `index`-th boss wave of a run (0-based)
    pub fn from_rotation(index: u32) -> Self {
        Self::ROTATION[index as usize % Self::ROTATION.len()]
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            BossKind::Classic => "classic",
            BossKind::Shield => "shield",
            BossKind::Teleporter => "teleporter",
            BossKind::Splitter => "splitter",
            BossKind::Vortex => "vortex",
            BossKind::Chrono => "chrono",
        }
    }

    /// Audio callout key played when the boss arrives
    pub fn voice_cue(&self) -> &'static str {
        match self {
            BossKind::Classic => "boss_classic",
            BossKind::Shield => "boss_shield",
            BossKind::Teleporter => "boss_teleporter",
            BossKind::Splitter => "boss_splitter",
            BossKind::Vortex => "boss_vortex",
            BossKind::Chrono => "boss_chrono_final",
        }
    }

    pub fn health_multiplier(&self) -> f32 {
        match self {
            BossKind::Classic => 1.0,
            BossKind::Shield => 1.1,
            BossKind::Teleporter => 0.9,
            BossKind::Splitter => 1.2,
            BossKind::Vortex => 1.3,
            BossKind::Chrono => 2.0,
        }
    }
}

/// A scaled-down splitter copy to be spawned
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SplitCopy {
    pub origin: Vec2,
    pub count: u32,
    pub generation: u8,
    pub max_health: f32,
    pub radius: f32,
    pub speed: f32,
    pub damage: f32,
    pub projectile_damage: f32,
}

/// World effects requested by a boss during its update
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum BossCommand {
    Fire { origin: Vec2, angle: f32, damage: f32 },
    SpawnMinions { around: Vec2, count: u32 },
    Split(SplitCopy),
    DamagePlayer { amount: f32, source: DamageSource },
    /// Displace the player by this much this tick
    PullPlayer { offset: Vec2 },
    /// Player move speed multiplier for this tick
    SlowPlayer { factor: f32 },
    PhaseChanged { phase: &'static str },
}

/// What a boss sees of the world during its update
pub struct BossContext<'a> {
    pub dt_ms: f32,
    pub player_pos: Vec2,
    pub player_radius: f32,
    pub arena: &'a ArenaTuning,
    pub tuning: &'a BossTuning,
    pub rng: &'a mut Pcg32,
    pub commands: &'a mut Vec<BossCommand>,
}

/// Everything a boss owns besides its phase
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Arsenal {
    /// Boss-local clock the schedule runs against
    pub clock_ms: f64,
    /// Damage carried by every shot the boss fires
    pub projectile_damage: f32,
    pub schedule: TaskSchedule,
    pub hazards: Vec<Hazard>,
}

impl Arsenal {
    /// Queue `action` to run `delay_ms` from now
    pub fn after(&mut self, delay_ms: f32, action: BossAction) {
        self.schedule.schedule(self.clock_ms, delay_ms, action);
    }
}

/// Variant behaviour. The default methods are the shared base.
pub trait BossBehavior {
    /// Identifier of the current phase, for the render view and events
    fn phase_tag(&self) -> &'static str;

    fn steer(&mut self, body: &mut Enemy, ctx: &mut BossContext<'_>) {
        approach(body, ctx.player_pos, ctx.tuning.standoff_distance, 1.0, ctx.dt_ms);
    }

    /// Advance phase timers. Runs every tick after steering.
    fn update_phase(&mut self, _body: &mut Enemy, _arsenal: &mut Arsenal, _ctx: &mut BossContext<'_>) {}

    /// Called when the attack cadence comes round
    fn attack(&mut self, _body: &mut Enemy, arsenal: &mut Arsenal, ctx: &mut BossContext<'_>) {
        let offset = ctx.rng.random_range(0.0..TAU);
        arsenal.after(0.0, BossAction::Ring { count: 12, offset });
    }

    fn attack_interval_ms(&self, base: f32) -> f32 {
        base
    }

    /// Last word once the body has been killed, before it is removed.
    /// Runs on the tick of the killing blow.
    fn on_killed(&mut self, _body: &Enemy, _arsenal: &Arsenal, _commands: &mut Vec<BossCommand>) {}

    fn spawns_minions(&self) -> bool {
        true
    }

    /// Take first claim on incoming damage. Returns `(to_health, absorbed)`.
    fn absorb(&mut self, amount: f32, _shield_breaker: bool) -> (f32, f32) {
        (amount, 0.0)
    }

    fn shield_ratio(&self) -> Option<f32> {
        None
    }
}

/// Variant phase state; one arm per kind
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum BossPhase {
    Classic(ClassicState),
    Shield(ShieldState),
    Teleporter(TeleporterState),
    Splitter(SplitterState),
    Vortex(VortexState),
    Chrono(ChronoState),
}

impl BossPhase {
    pub fn initial(kind: BossKind, max_health: f32, generation: u8) -> Self {
        match kind {
            BossKind::Classic => BossPhase::Classic(ClassicState::default()),
            BossKind::Shield => BossPhase::Shield(ShieldState::new(max_health)),
            BossKind::Teleporter => BossPhase::Teleporter(TeleporterState::default()),
            BossKind::Splitter => BossPhase::Splitter(SplitterState::new(generation)),
            BossKind::Vortex => BossPhase::Vortex(VortexState::default()),
            BossKind::Chrono => BossPhase::Chrono(ChronoState::default()),
        }
    }

    pub fn behavior(&self) -> &dyn BossBehavior {
        match self {
            BossPhase::Classic(s) => s,
            BossPhase::Shield(s) => s,
            BossPhase::Teleporter(s) => s,
            BossPhase::Splitter(s) => s,
            BossPhase::Vortex(s) => s,
            BossPhase::Chrono(s) => s,
        }
    }

    pub fn behavior_mut(&mut self) -> &mut dyn BossBehavior {
        match self {
            BossPhase::Classic(s) => s,
            BossPhase::Shield(s) => s,
            BossPhase::Teleporter(s) => s,
            BossPhase::Splitter(s) => s,
            BossPhase::Vortex(s) => s,
            BossPhase::Chrono(s) => s,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Boss {
    pub kind: BossKind,
    pub phase: BossPhase,
    pub arsenal: Arsenal,
    pub attack_timer_ms: f32,
    pub minion_timer_ms: f32,
    pub generation: u8,
    /// Last phase tag announced through `PhaseChanged`
    reported_phase: String,
}

impl Boss {
    fn new(kind: BossKind, max_health: f32, projectile_damage: f32, generation: u8, tuning: &BossTuning) -> Self {
        let phase = BossPhase::initial(kind, max_health, generation);
        let reported_phase = phase.behavior().phase_tag().to_string();
        Self {
            kind,
            phase,
            arsenal: Arsenal {
                projectile_damage,
                ..Arsenal::default()
            },
            // First attack comes a little sooner than the cadence
            attack_timer_ms: tuning.attack_interval_ms * 0.5,
            minion_timer_ms: tuning.minion_interval_ms,
            generation,
            reported_phase,
        }
    }

    /// Build a boss body for `kind` with wave scaling applied
    pub fn spawn(kind: BossKind, id: u32, pos: Vec2, scaling: &StatScaling, tuning: &BossTuning) -> Enemy {
        let mut body = Enemy::new(id, EnemyKind::Boss, pos, scaling);
        body.max_health = tuning.base_health * kind.health_multiplier() * scaling.health;
        body.health = body.max_health;
        body.speed = tuning.speed * scaling.speed;
        body.damage = tuning.contact_damage * scaling.damage;
        body.radius = tuning.radius;
        let projectile_damage = tuning.projectile_damage * scaling.damage;
        body.boss = Some(Box::new(Boss::new(kind, body.max_health, projectile_damage, 0, tuning)));
        body
    }

    /// Build one splitter copy at `pos`
    pub fn spawn_copy(id: u32, pos: Vec2, copy: &SplitCopy, tuning: &BossTuning) -> Enemy {
        let mut body = Enemy::new(id, EnemyKind::Boss, pos, &StatScaling::default());
        body.max_health = copy.max_health;
        body.health = copy.max_health;
        body.speed = copy.speed;
        body.damage = copy.damage;
        body.radius = copy.radius;
        body.boss = Some(Box::new(Boss::new(
            BossKind::Splitter,
            copy.max_health,
            copy.projectile_damage,
            copy.generation,
            tuning,
        )));
        body
    }

    pub fn phase_tag(&self) -> &'static str {
        self.phase.behavior().phase_tag()
    }

    pub fn shield_ratio(&self) -> Option<f32> {
        self.phase.behavior().shield_ratio()
    }

    pub fn absorb(&mut self, amount: f32, shield_breaker: bool) -> (f32, f32) {
        self.phase.behavior_mut().absorb(amount, shield_breaker)
    }

    /// The body left play by splitting rather than being killed
    pub fn split_away(&self) -> bool {
        matches!(&self.phase, BossPhase::Splitter(s) if s.split_done)
    }

    /// Drop every queued sub-attack and owned hazard
    pub fn on_death(&mut self) {
        let cancelled = self.arsenal.schedule.cancel_all();
        self.arsenal.hazards.clear();
        if cancelled > 0 {
            log::debug!("{} boss down, cancelled {cancelled} queued attacks", self.kind.as_str());
        }
    }

    /// One tick of boss logic. A dying body does nothing.
    pub fn update(&mut self, body: &mut Enemy, ctx: &mut BossContext<'_>) {
        if body.dying {
            return;
        }
        let dt_ms = ctx.dt_ms;
        self.arsenal.clock_ms += dt_ms as f64;
        body.contact_cooldown_ms = (body.contact_cooldown_ms - dt_ms).max(0.0);

        let behavior = self.phase.behavior_mut();
        behavior.steer(body, ctx);
        behavior.update_phase(body, &mut self.arsenal, ctx);

        if !body.dying {
            self.attack_timer_ms -= dt_ms;
            if self.attack_timer_ms <= 0.0 {
                self.attack_timer_ms = behavior.attack_interval_ms(ctx.tuning.attack_interval_ms);
                behavior.attack(body, &mut self.arsenal, ctx);
            }
            if behavior.spawns_minions() {
                self.minion_timer_ms -= dt_ms;
                if self.minion_timer_ms <= 0.0 {
                    self.minion_timer_ms = ctx.tuning.minion_interval_ms;
                    ctx.commands.push(BossCommand::SpawnMinions {
                        around: body.pos,
                        count: ctx.tuning.minions_per_spawn,
                    });
                }
            }
        }

        let due = self.arsenal.schedule.drain_due(self.arsenal.clock_ms);
        if body.dying {
            if !due.is_empty() {
                log::debug!("dropping {} stale tasks from a dead boss", due.len());
            }
        } else {
            for action in due {
                self.execute(action, body, ctx);
            }
        }

        for hazard in &mut self.arsenal.hazards {
            hazard.update(dt_ms, body.pos, ctx.player_pos, ctx.player_radius, ctx.commands);
        }
        self.arsenal.hazards.retain(|h| !h.expired);

        let tag = self.phase_tag();
        if tag != self.reported_phase {
            log::debug!("{} boss phase {} -> {tag}", self.kind.as_str(), self.reported_phase);
            self.reported_phase = tag.to_string();
            ctx.commands.push(BossCommand::PhaseChanged { phase: tag });
        }

        // The behavior may have ended its own life (splitter)
        if body.dying {
            self.on_death();
        }
    }

    fn execute(&self, action: BossAction, body: &Enemy, ctx: &mut BossContext<'_>) {
        let mut fire = |angle: f32| {
            ctx.commands.push(BossCommand::Fire {
                origin: body.pos,
                angle: crate::normalize_angle(angle),
                damage: self.arsenal.projectile_damage,
            });
        };
        match action {
            BossAction::Ring { count, offset } => {
                let count = count.max(1);
                for i in 0..count {
                    fire(offset + TAU * i as f32 / count as f32);
                }
            }
            BossAction::Aimed { spread } => {
                fire(crate::angle_between(body.pos, ctx.player_pos) + spread);
            }
            BossAction::Shot { angle } => fire(angle),
        }
    }
}

/// Run the boss record of `enemy`, if it has one
pub fn update_boss(enemy: &mut Enemy, ctx: &mut BossContext<'_>) {
    if let Some(mut boss) = enemy.boss.take() {
        boss.update(enemy, ctx);
        enemy.boss = Some(boss);
    }
}

/// Let a freshly killed boss react; returns what it asks for
pub fn boss_killed(enemy: &mut Enemy) -> Vec<BossCommand> {
    let mut commands = Vec::new();
    if let Some(mut boss) = enemy.boss.take() {
        boss.phase.behavior_mut().on_killed(enemy, &boss.arsenal, &mut commands);
        enemy.boss = Some(boss);
    }
    commands
}

/// Shared base movement: close in until `standoff` from `target`, back off
/// if nearer, hold inside a small band.
pub fn approach(body: &mut Enemy, target: Vec2, standoff: f32, speed_multiplier: f32, dt_ms: f32) {
    let to_target = target - body.pos;
    let dist = to_target.length();
    if dist < EPSILON {
        body.vel = Vec2::ZERO;
        return;
    }
    let dir = to_target / dist;
    let band = standoff * 0.1;
    let heading = if dist > standoff + band {
        dir
    } else if dist < standoff - band {
        -dir
    } else {
        Vec2::ZERO
    };
    body.vel = heading * body.speed * speed_multiplier * body.slow_factor;
    body.pos += body.vel * (dt_ms / 1000.0);
}

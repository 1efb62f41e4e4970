//! Game state and core simulation types
//!
//! All state that must be persisted for Continue/determinism lives here.

use std::f32::consts::TAU;

use glam::Vec2;
use rand::{Rng, SeedableRng};
use rand_pcg::Pcg32;
use serde::{Deserialize, Serialize};

use super::boss::{Boss, BossKind, SplitCopy};
use super::combat::Field;
use super::damage::SourceKind;
use super::enemy::{Enemy, EnemyKind};
use super::loadout::ProgressionBundle;
use super::modifiers::{AscensionModifier, ModifierHook, WaveModifier};
use super::player::{Player, TransientBonus};
use super::pool::{Pool, Recycle};
use super::projectile::{Owner, Projectile, ProjectileFlags, Shot};
use super::wave::{WaveCompleted, WaveManager};
use crate::error::SimError;
use crate::settings::Settings;
use crate::tuning::Tuning;

/// Pre-allocated projectile slots; the pool grows past this if it must
pub const PROJECTILE_POOL_CAPACITY: usize = 256;

/// Minions appear on a ring this far from the boss centre
const MINION_SPAWN_RADIUS: f32 = 70.0;

/// Current phase of a run
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum RunPhase {
    /// A wave is in progress
    Playing,
    /// Between waves; the host may hand in progression here
    Intermission,
    /// Game is paused
    Paused,
    /// Run ended
    GameOver,
}

/// Notifications for the host: audio, VFX, HUD, plugins
#[derive(Debug, Clone, PartialEq, Serialize)]
pub enum SimEvent {
    Fired {
        projectile_id: u32,
        angle: f32,
        critical: bool,
    },
    EnemySpawned {
        id: u32,
        kind: EnemyKind,
    },
    BossSpawned {
        id: u32,
        kind: BossKind,
        voice_cue: &'static str,
    },
    EnemyHit {
        id: u32,
        damage: f32,
        critical: bool,
    },
    EnemyKilled {
        id: u32,
        kind: EnemyKind,
        boss: Option<BossKind>,
        pos: Vec2,
        score: u32,
    },
    Explosion {
        pos: Vec2,
        radius: f32,
    },
    ChainHit {
        from: Vec2,
        to: Vec2,
        damage: f32,
    },
    PlayerHit {
        damage: f32,
        source: SourceKind,
    },
    ShieldBroken,
    BarrierActivated,
    EmergencyHeal {
        amount: f32,
    },
    BossPhaseChanged {
        id: u32,
        kind: BossKind,
        phase: &'static str,
    },
    BossSplit {
        id: u32,
        copies: u32,
    },
    WaveStarted {
        wave: u32,
        enemy_count: u32,
        boss: Option<BossKind>,
        modifier: Option<WaveModifier>,
    },
    WaveCompleted(WaveCompleted),
    PlayerDied {
        wave: u32,
        score: u64,
    },
}

/// A particle for visual effects
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct Particle {
    pub pos: Vec2,
    pub vel: Vec2,
    /// Palette index for the renderer
    pub color: u32,
    /// 1 at birth, 0 at death
    pub life: f32,
    pub ttl_ms: f32,
    pub size: f32,
}

impl Recycle for Particle {
    fn reset(&mut self) {
        *self = Particle::default();
    }
}

impl Particle {
    pub fn advance(&mut self, dt_ms: f32) {
        self.pos += self.vel * (dt_ms / 1000.0);
        self.vel *= 0.96;
        self.life = if self.ttl_ms > 0.0 {
            (self.life - dt_ms / self.ttl_ms).max(0.0)
        } else {
            0.0
        };
    }
}

/// Particle palette
pub mod palette {
    pub const SPARK: u32 = 0;
    pub const DEBRIS: u32 = 1;
    pub const BLAST: u32 = 2;
    pub const BOSS: u32 = 3;
}

/// Complete game state (deterministic, serializable)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GameState {
    /// Run seed for reproducibility
    pub seed: u64,
    /// Gameplay RNG; cosmetics never draw from it
    pub rng: Pcg32,
    pub tuning: Tuning,
    pub settings: Settings,
    /// Simulation tick counter
    pub tick: u64,
    pub time_ms: f64,
    pub phase: RunPhase,
    /// Phase to return to when unpausing
    pub resume_phase: RunPhase,
    /// Time spent in the current intermission
    pub intermission_ms: f32,
    pub player: Player,
    /// Active enemies and bosses (sorted by id for determinism)
    pub enemies: Vec<Enemy>,
    pub projectiles: Pool<Projectile>,
    /// Visual particles (not gameplay-affecting)
    #[serde(skip)]
    pub particles: Pool<Particle>,
    pub waves: WaveManager,
    pub score: u64,
    pub kills: u32,
    /// Undrained notifications
    #[serde(skip)]
    pub events: Vec<SimEvent>,
    /// Next entity ID
    next_id: u32,
}

impl GameState {
    /// Create a new run with default balance and settings
    pub fn new(seed: u64) -> Self {
        Self::build(seed, Tuning::default(), Settings::default())
    }

    /// Create a new run, rejecting balance that cannot produce a playable
    /// arena
    pub fn with_config(seed: u64, tuning: Tuning, settings: Settings) -> Result<Self, SimError> {
        tuning.validate()?;
        Ok(Self::build(seed, tuning, settings))
    }

    fn build(seed: u64, tuning: Tuning, settings: Settings) -> Self {
        let mut player = Player::new(&tuning.player, &tuning.arena);
        player.god_mode = settings.god_mode;
        let particles = Pool::with_capacity(settings.max_particles());
        Self {
            seed,
            rng: Pcg32::seed_from_u64(seed),
            tuning,
            settings,
            tick: 0,
            time_ms: 0.0,
            // The first wave starts on the first tick
            phase: RunPhase::Intermission,
            resume_phase: RunPhase::Intermission,
            intermission_ms: 0.0,
            player,
            enemies: Vec::new(),
            projectiles: Pool::with_capacity(PROJECTILE_POOL_CAPACITY),
            particles,
            waves: WaveManager::default(),
            score: 0,
            kills: 0,
            events: Vec::new(),
            next_id: 1,
        }
    }

    /// Throw the run away and begin again on `seed`. Balance and settings
    /// carry over; progression and ascensions do not.
    pub fn restart(&mut self, seed: u64) {
        log::info!("restarting run (seed {} -> {seed}) at wave {}", self.seed, self.waves.wave);
        self.player.reset(&self.tuning.player, &self.tuning.arena);
        self.player.god_mode = self.settings.god_mode;
        self.seed = seed;
        self.rng = Pcg32::seed_from_u64(seed);
        self.tick = 0;
        self.time_ms = 0.0;
        self.phase = RunPhase::Intermission;
        self.resume_phase = RunPhase::Intermission;
        self.intermission_ms = 0.0;
        self.enemies.clear();
        self.projectiles.clear();
        self.particles.clear();
        self.waves = WaveManager::default();
        self.score = 0;
        self.kills = 0;
        self.events.clear();
        self.next_id = 1;
    }

    /// Allocate a new entity ID
    pub fn next_entity_id(&mut self) -> u32 {
        let id = self.next_id;
        self.next_id += 1;
        id
    }

    /// Combat view over the enemy list, player and RNG
    pub fn field(&mut self) -> Field<'_> {
        Field {
            enemies: &mut self.enemies,
            player: &mut self.player,
            rng: &mut self.rng,
            events: &mut self.events,
            tuning: &self.tuning,
        }
    }

    /// Take every notification raised since the last drain
    pub fn drain_events(&mut self) -> Vec<SimEvent> {
        std::mem::take(&mut self.events)
    }

    pub fn live_enemy_count(&self) -> usize {
        self.enemies.iter().filter(|e| !e.dying).count()
    }

    /// Hand in the resolved progression for the coming wave
    pub fn apply_progression(&mut self, bundle: &ProgressionBundle) {
        self.player.apply_progression(bundle, &self.tuning.player);
    }

    pub fn add_ascension(&mut self, modifier: AscensionModifier) {
        log::debug!("ascension added: {}", modifier.name);
        self.player.add_ascension(modifier, &self.tuning.player);
    }

    /// Bonus that lasts until the current wave ends
    pub fn grant_transient(&mut self, bonus: TransientBonus) {
        self.player.grant_transient(bonus);
    }

    /// Begin the next wave: roll its shape, fire wave-start hooks
    pub fn start_next_wave(&mut self) -> Result<(), SimError> {
        let wave = self.waves.wave + 1;
        let start = self.waves.start_wave(wave, &self.tuning.waves, &mut self.rng);

        let shield: f32 = self
            .player
            .ascensions
            .iter()
            .filter_map(|m| match m.hook {
                Some(ModifierHook::ShieldOnWaveStart { amount }) => Some(amount),
                _ => None,
            })
            .sum();
        if shield != 0.0 {
            self.player.vitals.restore_shield(shield)?;
        }

        self.phase = RunPhase::Playing;
        self.intermission_ms = 0.0;
        log::info!(
            "wave {wave} started: {} enemies{}{}",
            start.enemy_count,
            start
                .boss
                .map(|b| format!(", {} boss", b.as_str()))
                .unwrap_or_default(),
            start
                .modifier
                .map(|m| format!(", {m:?}"))
                .unwrap_or_default(),
        );
        self.events.push(SimEvent::WaveStarted {
            wave,
            enemy_count: start.enemy_count,
            boss: start.boss,
            modifier: start.modifier,
        });
        Ok(())
    }

    /// Wave is done: clear wave-scoped bonuses and rest
    pub fn finish_wave(&mut self, done: WaveCompleted) {
        self.phase = RunPhase::Intermission;
        self.intermission_ms = 0.0;
        self.player.clear_transient();
        log::info!(
            "wave {} complete: {} kills in {:.1}s",
            done.wave,
            done.enemies_killed,
            done.duration_ms / 1000.0
        );
        self.events.push(SimEvent::WaveCompleted(done));
    }

    /// Random point just outside one of the four arena edges
    fn edge_spawn_point(&mut self) -> Vec2 {
        let (w, h) = (self.tuning.arena.width, self.tuning.arena.height);
        let offset = self.tuning.waves.spawn_edge_offset;
        match self.rng.random_range(0..4u32) {
            0 => Vec2::new(self.rng.random_range(0.0..w), -offset),
            1 => Vec2::new(w + offset, self.rng.random_range(0.0..h)),
            2 => Vec2::new(self.rng.random_range(0.0..w), h + offset),
            _ => Vec2::new(-offset, self.rng.random_range(0.0..h)),
        }
    }

    /// Spawn a wave-scaled regular enemy at an arena edge
    pub fn spawn_enemy(&mut self, kind: EnemyKind) -> u32 {
        let pos = self.edge_spawn_point();
        self.spawn_enemy_at(kind, pos)
    }

    pub fn spawn_enemy_at(&mut self, kind: EnemyKind, pos: Vec2) -> u32 {
        let id = self.next_entity_id();
        self.enemies.push(Enemy::new(id, kind, pos, &self.waves.scaling));
        self.events.push(SimEvent::EnemySpawned { id, kind });
        id
    }

    pub fn spawn_boss(&mut self, kind: BossKind) -> u32 {
        let pos = self.edge_spawn_point();
        let id = self.next_entity_id();
        let body = Boss::spawn(kind, id, pos, &self.waves.scaling, &self.tuning.bosses);
        log::info!(
            "wave {}: {} boss arrives ({:.0} hp)",
            self.waves.wave,
            kind.as_str(),
            body.max_health
        );
        self.enemies.push(body);
        self.events.push(SimEvent::BossSpawned {
            id,
            kind,
            voice_cue: kind.voice_cue(),
        });
        id
    }

    /// Grunts on a ring around a boss
    pub fn spawn_minions(&mut self, around: Vec2, count: u32) {
        let count = count.max(1);
        for i in 0..count {
            let angle = TAU * i as f32 / count as f32;
            let id = self.spawn_enemy_at(EnemyKind::Grunt, around + crate::polar_to_cartesian(MINION_SPAWN_RADIUS, angle));
            if let Some(minion) = self.enemies.iter_mut().find(|e| e.id == id) {
                minion.clamp_to_arena(&self.tuning.arena);
            }
        }
    }

    /// Splitter copies fanned out around the parent's position
    pub fn spawn_split(&mut self, parent: u32, copy: &SplitCopy) {
        let count = copy.count.max(1);
        for i in 0..count {
            let angle = TAU * i as f32 / count as f32;
            let pos = copy.origin + crate::polar_to_cartesian(copy.radius * 1.5, angle);
            let id = self.next_entity_id();
            let mut body = Boss::spawn_copy(id, pos, copy, &self.tuning.bosses);
            body.clamp_to_arena(&self.tuning.arena);
            self.enemies.push(body);
            self.events.push(SimEvent::EnemySpawned {
                id,
                kind: EnemyKind::Boss,
            });
        }
        self.events.push(SimEvent::BossSplit { id: parent, copies: count });
    }

    /// Launch a hostile projectile from the shared pool
    pub fn fire_enemy_shot(&mut self, origin: Vec2, angle: f32, damage: f32) {
        let id = self.next_entity_id();
        let shot = Shot {
            owner: Owner::Enemy,
            origin,
            angle,
            speed: self.tuning.projectile.enemy_speed,
            damage,
            radius: self.tuning.projectile.enemy_radius,
            lifetime_ms: self.tuning.projectile.enemy_lifetime_ms,
            flags: ProjectileFlags::default(),
        };
        let tick = self.tick;
        self.projectiles.acquire(|p| p.launch(id, &shot, tick));
    }

    /// Launch a player shot and announce it
    pub fn fire_player_shot(&mut self, shot: &Shot) {
        let id = self.next_entity_id();
        let tick = self.tick;
        self.projectiles.acquire(|p| p.launch(id, shot, tick));
        self.events.push(SimEvent::Fired {
            projectile_id: id,
            angle: shot.angle,
            critical: shot.flags.is_critical,
        });
    }

    /// Cosmetic burst. Angles are fixed so the gameplay RNG is untouched;
    /// skipped once the quality preset's particle budget is used up.
    pub fn emit_particles(&mut self, pos: Vec2, count: u32, speed: f32, color: u32) {
        let budget = self.settings.max_particles().saturating_sub(self.particles.len());
        let count = (count as usize).min(budget);
        let phase = (self.tick % 16) as f32 * TAU / 16.0;
        for i in 0..count {
            let angle = phase + TAU * i as f32 / count as f32;
            let vel = crate::direction(angle) * speed;
            self.particles.acquire(|p| {
                p.pos = pos;
                p.vel = vel;
                p.color = color;
                p.life = 1.0;
                p.ttl_ms = 600.0;
                p.size = 3.0;
            });
        }
    }

    /// Ensure entities are sorted by ID for deterministic iteration
    pub fn normalize_order(&mut self) {
        self.enemies.sort_by_key(|e| e.id);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_state_waits_for_first_tick() {
        let state = GameState::new(42);
        assert_eq!(state.phase, RunPhase::Intermission);
        assert_eq!(state.waves.wave, 0);
        assert!(state.enemies.is_empty());
        assert_eq!(state.player.vitals.hp, state.tuning.player.max_hp);
    }

    #[test]
    fn test_restart_matches_a_fresh_run() {
        let settings = Settings {
            god_mode: true,
            ..Settings::default()
        };
        let mut state = GameState::with_config(11, Tuning::default(), settings.clone()).unwrap();
        for _ in 0..900 {
            crate::sim::tick(&mut state, &crate::sim::TickInput::default(), crate::consts::SIM_DT_MS).unwrap();
        }
        state.player.vitals.hp = 1.0;
        state.player.pos = Vec2::new(10.0, 10.0);
        state.player.loadout.piercing_level = 3;
        state.add_ascension(AscensionModifier::new("glass").with_hook(ModifierHook::HealOnKill { amount: 1.0 }));
        assert!(state.tick > 0);

        state.restart(12);
        let fresh = GameState::with_config(12, Tuning::default(), settings).unwrap();
        assert_eq!(state.seed, 12);
        assert_eq!(state.rng, fresh.rng);
        assert_eq!(state.tick, 0);
        assert_eq!(state.phase, RunPhase::Intermission);
        assert_eq!(state.waves.wave, 0);
        assert_eq!((state.score, state.kills), (0, 0));
        assert!(state.enemies.is_empty() && state.projectiles.is_empty() && state.events.is_empty());
        assert_eq!(state.player.vitals, fresh.player.vitals);
        assert_eq!(state.player.pos, fresh.player.pos);
        assert_eq!(state.player.loadout, fresh.player.loadout);
        assert!(state.player.ascensions.is_empty());
        assert!(state.player.god_mode);
        assert_eq!(state.next_entity_id(), 1);
    }

    #[test]
    fn test_with_config_validates() {
        let mut tuning = Tuning::default();
        tuning.projectile.speed = 0.0;
        assert!(matches!(
            GameState::with_config(1, tuning, Settings::default()),
            Err(SimError::InvalidTuning(_))
        ));
    }

    #[test]
    fn test_ids_are_unique_and_increasing() {
        let mut state = GameState::new(1);
        let a = state.next_entity_id();
        let b = state.next_entity_id();
        assert!(b > a);
    }

    #[test]
    fn test_edge_spawns_start_outside() {
        let mut state = GameState::new(3);
        for _ in 0..50 {
            state.spawn_enemy(EnemyKind::Grunt);
        }
        let (w, h) = (state.tuning.arena.width, state.tuning.arena.height);
        assert!(state.enemies.iter().all(|e| e.pos.x < 0.0 || e.pos.x > w || e.pos.y < 0.0 || e.pos.y > h));
        assert_eq!(state.drain_events().len(), 50);
        assert!(state.events.is_empty());
    }

    #[test]
    fn test_wave_start_shield_hook() {
        let mut state = GameState::new(4);
        state.player.vitals.shield = 0.0;
        state.add_ascension(
            AscensionModifier::new("bulwark").with_hook(ModifierHook::ShieldOnWaveStart { amount: 10.0 }),
        );
        state.start_next_wave().unwrap();
        assert_eq!(state.player.vitals.shield, 10.0);
        assert_eq!(state.phase, RunPhase::Playing);
        assert!(matches!(state.events.last(), Some(SimEvent::WaveStarted { wave: 1, .. })));
    }

    #[test]
    fn test_particles_respect_budget_and_rng() {
        let mut state = GameState::new(5);
        let before = state.rng.clone();
        state.emit_particles(Vec2::ZERO, 10_000, 100.0, palette::SPARK);
        assert_eq!(state.particles.len(), state.settings.max_particles());
        assert_eq!(state.rng, before);

        state.settings.particles = false;
        state.particles.clear();
        state.emit_particles(Vec2::ZERO, 10, 100.0, palette::SPARK);
        assert!(state.particles.is_empty());
    }

    #[test]
    fn test_finish_wave_clears_transient() {
        let mut state = GameState::new(6);
        state.grant_transient(TransientBonus {
            damage_multiplier: 2.0,
            fire_rate_multiplier: 1.5,
        });
        state.finish_wave(WaveCompleted {
            wave: 1,
            enemies_killed: 3,
            duration_ms: 1000.0,
        });
        assert_eq!(state.player.transient, TransientBonus::default());
        assert_eq!(state.phase, RunPhase::Intermission);
    }
}

//! Fixed timestep simulation tick
//!
//! Core game loop that advances simulation deterministically. Component
//! order within a tick is fixed: effects, wave scheduler, entities,
//! collisions, kill bookkeeping, end-of-run checks.

use glam::Vec2;
use serde::{Deserialize, Serialize};

use super::boss::{BossCommand, BossContext, BossKind, update_boss};
use super::combat;
use super::enemy::EnemyAction;
use super::player::MoveInput;
use super::projectile::{Motion, Owner};
use super::state::{GameState, RunPhase, SimEvent, palette};
use super::wave::SpawnRequest;
use crate::error::SimError;

/// Input commands for a single tick (deterministic)
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TickInput {
    /// Movement key state
    pub movement: MoveInput,
    /// Pause toggle
    pub pause: bool,
    /// Leave the intermission now instead of waiting for auto-advance
    pub start_next_wave: bool,
}

impl TickInput {
    /// The same input with one-shot commands cleared
    pub fn held(&self) -> Self {
        Self {
            movement: self.movement,
            ..Self::default()
        }
    }
}

/// Advance the game state by one fixed timestep
pub fn tick(state: &mut GameState, input: &TickInput, dt_ms: f32) -> Result<(), SimError> {
    // Handle pause toggle
    if input.pause {
        match state.phase {
            RunPhase::Playing | RunPhase::Intermission => {
                state.resume_phase = state.phase;
                state.phase = RunPhase::Paused;
                return Ok(());
            }
            RunPhase::Paused => state.phase = state.resume_phase,
            RunPhase::GameOver => {}
        }
    }

    // Don't tick if paused or game over
    if matches!(state.phase, RunPhase::Paused | RunPhase::GameOver) {
        return Ok(());
    }
    if !(dt_ms.is_finite() && dt_ms > 0.0) {
        return Ok(());
    }

    state.tick += 1;
    state.time_ms += f64::from(dt_ms);
    let first_event = state.events.len();

    update_effects(state, dt_ms);
    update_waves(state, input, dt_ms)?;
    update_entities(state, input, dt_ms)?;
    combat::resolve_collisions(state)?;
    combat::process_kills(state)?;
    check_game_over(state);
    spawn_event_particles(state, first_event);

    state.normalize_order();
    Ok(())
}

/// Cosmetic particles age and fade
fn update_effects(state: &mut GameState, dt_ms: f32) {
    state.particles.retain(|p| {
        p.advance(dt_ms);
        p.life > 0.0
    });
}

fn update_waves(state: &mut GameState, input: &TickInput, dt_ms: f32) -> Result<(), SimError> {
    match state.phase {
        RunPhase::Playing => {
            let live = state.live_enemy_count();
            let out = state
                .waves
                .update(dt_ms, live, &state.tuning.waves, &mut state.rng);
            for request in out.spawns {
                match request {
                    SpawnRequest::Enemy(kind) => {
                        state.spawn_enemy(kind);
                    }
                    SpawnRequest::Boss(kind) => {
                        state.spawn_boss(kind);
                    }
                }
            }
            if let Some(done) = out.completed {
                state.finish_wave(done);
            }
        }
        RunPhase::Intermission => {
            state.intermission_ms += dt_ms;
            let auto = state
                .settings
                .auto_advance_ms
                .is_some_and(|ms| state.intermission_ms >= ms);
            let requested = state.waves.wave == 0 || auto || input.start_next_wave;
            // Completion is re-checked rather than trusted: a straggler
            // keeps the next wave from starting
            if requested && state.live_enemy_count() == 0 {
                state.start_next_wave()?;
            }
        }
        RunPhase::Paused | RunPhase::GameOver => {}
    }
    Ok(())
}

fn update_entities(state: &mut GameState, input: &TickInput, dt_ms: f32) -> Result<(), SimError> {
    // Dying enemies stay for exactly one full tick, then go
    state.enemies.retain(|e| !e.dying || e.death_frames == 0);
    for enemy in state.enemies.iter_mut().filter(|e| e.dying) {
        enemy.death_frames = enemy.death_frames.saturating_add(1);
    }

    state.player.external_slow = 1.0;
    combat::apply_slow_field(&mut state.enemies, &state.player);

    update_bosses(state, dt_ms)?;
    update_regular_enemies(state, dt_ms);

    let tuning = &state.tuning;
    state
        .player
        .apply_movement(input.movement, dt_ms, &tuning.player, &tuning.arena);
    state.player.update_timers(dt_ms, &tuning.player)?;

    // Fire before anything moves: new shots sit out this tick's motion
    let margin = tuning.arena.visibility_margin + state.waves.visibility_margin_bonus();
    let shots = state.player.update_turret(
        &state.enemies,
        dt_ms,
        &tuning.player,
        &tuning.projectile,
        &tuning.arena,
        margin,
        &mut state.rng,
    );
    for shot in &shots {
        state.fire_player_shot(shot);
    }

    advance_projectiles(state, dt_ms)
}

fn update_bosses(state: &mut GameState, dt_ms: f32) -> Result<(), SimError> {
    let mut commands = Vec::new();
    // Bodies spawned by a boss this tick wait for the next one
    let count = state.enemies.len();
    for index in 0..count {
        let Some(kind) = state.enemies[index].boss.as_ref().map(|b| b.kind) else {
            continue;
        };
        if state.enemies[index].dying {
            continue;
        }
        commands.clear();
        {
            let mut ctx = BossContext {
                dt_ms,
                player_pos: state.player.pos,
                player_radius: state.player.radius,
                arena: &state.tuning.arena,
                tuning: &state.tuning.bosses,
                rng: &mut state.rng,
                commands: &mut commands,
            };
            update_boss(&mut state.enemies[index], &mut ctx);
        }
        state.enemies[index].clamp_to_arena(&state.tuning.arena);

        let id = state.enemies[index].id;
        for command in commands.drain(..) {
            apply_boss_command(state, id, kind, command)?;
        }
    }
    Ok(())
}

pub(super) fn apply_boss_command(
    state: &mut GameState,
    id: u32,
    kind: BossKind,
    command: BossCommand,
) -> Result<(), SimError> {
    match command {
        BossCommand::Fire { origin, angle, damage } => state.fire_enemy_shot(origin, angle, damage),
        BossCommand::SpawnMinions { around, count } => state.spawn_minions(around, count),
        BossCommand::Split(copy) => {
            log::debug!("splitter {id} breaks into {} generation {} copies", copy.count, copy.generation);
            state.spawn_split(id, &copy);
        }
        BossCommand::DamagePlayer { amount, source } => {
            combat::hurt_player(
                &mut state.player,
                &state.tuning.player,
                &mut state.events,
                amount,
                source,
            )?;
        }
        BossCommand::PullPlayer { offset } => state.player.displace(offset, &state.tuning.arena),
        BossCommand::SlowPlayer { factor } => {
            state.player.external_slow = state.player.external_slow.min(factor);
        }
        BossCommand::PhaseChanged { phase } => {
            state.events.push(SimEvent::BossPhaseChanged { id, kind, phase });
        }
    }
    Ok(())
}

fn update_regular_enemies(state: &mut GameState, dt_ms: f32) {
    let player_pos = state.player.pos;
    let mut volleys = Vec::new();
    for enemy in state.enemies.iter_mut() {
        if enemy.dying || enemy.is_boss() {
            continue;
        }
        let action = enemy.update_regular(player_pos, dt_ms, &state.tuning.enemies);
        enemy.clamp_to_arena(&state.tuning.arena);
        if let Some(EnemyAction::Fire { origin, angle, damage }) = action {
            volleys.push((origin, angle, damage));
        }
    }
    for (origin, angle, damage) in volleys {
        state.fire_enemy_shot(origin, angle, damage);
    }
}

/// Move, age, steer and bounce every projectile not fired this tick
fn advance_projectiles(state: &mut GameState, dt_ms: f32) -> Result<(), SimError> {
    let targets: Vec<(u32, Vec2)> = state
        .enemies
        .iter()
        .filter(|e| !e.dying)
        .map(|e| (e.id, e.pos))
        .collect();
    let homing_range = state.tuning.projectile.homing_range;

    let mut blasts = Vec::new();
    for handle in state.projectiles.handles() {
        let Some(shot) = state.projectiles.get_mut(handle) else {
            continue;
        };
        if shot.born_tick == state.tick {
            continue;
        }
        if shot.owner == Owner::Player {
            shot.steer_homing(dt_ms, &targets, homing_range);
        }
        let motion = shot.advance(dt_ms, &state.tuning.arena);
        if matches!(motion, Motion::Expired | Motion::Exited) {
            blasts.extend(combat::spent_blast(shot));
        }
    }

    let mut field = state.field();
    for blast in &blasts {
        field.detonate(blast)?;
    }
    Ok(())
}

fn check_game_over(state: &mut GameState) {
    if !state.player.is_dead() || state.phase == RunPhase::GameOver {
        return;
    }
    state.phase = RunPhase::GameOver;
    // Nothing a boss queued may land after the run ends
    for boss in state.enemies.iter_mut().filter_map(|e| e.boss.as_mut()) {
        boss.on_death();
    }
    log::info!(
        "game over on wave {} with score {} ({} kills)",
        state.waves.wave,
        state.score,
        state.kills
    );
    state.events.push(SimEvent::PlayerDied {
        wave: state.waves.wave,
        score: state.score,
    });
}

/// Cosmetic bursts for this tick's kills and blasts
fn spawn_event_particles(state: &mut GameState, first_event: usize) {
    if state.settings.max_particles() == 0 {
        return;
    }
    let bursts: Vec<(Vec2, u32, f32, u32)> = state.events[first_event..]
        .iter()
        .filter_map(|event| match event {
            SimEvent::EnemyKilled { pos, boss: Some(_), .. } => Some((*pos, 48, 260.0, palette::BOSS)),
            SimEvent::EnemyKilled { pos, .. } => Some((*pos, 12, 160.0, palette::DEBRIS)),
            SimEvent::Explosion { pos, radius } => Some((*pos, 16, radius * 2.0, palette::BLAST)),
            SimEvent::ChainHit { to, .. } => Some((*to, 4, 120.0, palette::SPARK)),
            _ => None,
        })
        .collect();
    for (pos, count, speed, color) in bursts {
        state.emit_particles(pos, count, speed, color);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::consts::SIM_DT_MS;
    use crate::sim::boss::BossKind;
    use crate::sim::enemy::{Enemy, EnemyKind, StatScaling};

    fn run(state: &mut GameState, ticks: u32) {
        for _ in 0..ticks {
            tick(state, &TickInput::default(), SIM_DT_MS).unwrap();
        }
    }

    #[test]
    fn test_first_tick_starts_wave_one() {
        let mut state = GameState::new(1);
        run(&mut state, 1);
        assert_eq!(state.phase, RunPhase::Playing);
        assert_eq!(state.waves.wave, 1);
    }

    #[test]
    fn test_pause_toggle() {
        let mut state = GameState::new(2);
        run(&mut state, 1);
        let pause = TickInput {
            pause: true,
            ..TickInput::default()
        };
        tick(&mut state, &pause, SIM_DT_MS).unwrap();
        assert_eq!(state.phase, RunPhase::Paused);
        let frozen = state.tick;
        run(&mut state, 10);
        assert_eq!(state.tick, frozen);
        tick(&mut state, &pause, SIM_DT_MS).unwrap();
        assert_eq!(state.phase, RunPhase::Playing);
        assert_eq!(state.tick, frozen + 1);
    }

    #[test]
    fn test_degenerate_dt_is_ignored() {
        let mut state = GameState::new(3);
        tick(&mut state, &TickInput::default(), -5.0).unwrap();
        tick(&mut state, &TickInput::default(), f32::NAN).unwrap();
        assert_eq!(state.tick, 0);
    }

    #[test]
    fn test_dead_enemy_lingers_one_tick() {
        let mut state = GameState::new(4);
        run(&mut state, 1);
        state.enemies.push(Enemy::new(500, EnemyKind::Grunt, Vec2::new(100.0, 100.0), &StatScaling::default()));
        state.enemies.last_mut().unwrap().mark_dying();
        run(&mut state, 1);
        assert!(state.enemies.iter().any(|e| e.id == 500));
        run(&mut state, 1);
        assert!(state.enemies.iter().all(|e| e.id != 500));
    }

    #[test]
    fn test_new_shot_does_not_move_on_its_first_tick() {
        let mut state = GameState::new(5);
        run(&mut state, 1);
        let target = Vec2::new(state.player.pos.x + 300.0, state.player.pos.y);
        state.enemies.push(Enemy::new(900, EnemyKind::Brute, target, &StatScaling::default()));
        state.player.facing = 0.0;
        run(&mut state, 1);
        let muzzle = state.player.pos + crate::direction(state.player.facing) * state.player.radius;
        let fresh: Vec<_> = state.projectiles.iter().filter(|p| p.owner == Owner::Player).collect();
        assert_eq!(fresh.len(), 1);
        assert!(fresh[0].pos.distance(muzzle) < 1e-3);
        assert_eq!(fresh[0].born_tick, state.tick);
    }

    #[test]
    fn test_wave_completes_and_auto_advances() {
        let mut state = GameState::new(6);
        state.settings.auto_advance_ms = Some(100.0);
        run(&mut state, 1);
        // Skip the spawns; nothing is alive
        state.waves.enemies_to_spawn = 0;
        state.waves.boss_pending = None;
        let debounce_ticks = (state.tuning.waves.completion_debounce_ms / SIM_DT_MS).ceil() as u32;
        run(&mut state, debounce_ticks + 1);
        assert_eq!(state.phase, RunPhase::Intermission);
        let completions = state
            .events
            .iter()
            .filter(|e| matches!(e, SimEvent::WaveCompleted(_)))
            .count();
        assert_eq!(completions, 1);

        run(&mut state, 13);
        assert_eq!(state.phase, RunPhase::Playing);
        assert_eq!(state.waves.wave, 2);
    }

    #[test]
    fn test_manual_advance_waits_for_input() {
        let mut state = GameState::new(7);
        state.settings.auto_advance_ms = None;
        run(&mut state, 1);
        state.finish_wave(crate::sim::wave::WaveCompleted {
            wave: 1,
            enemies_killed: 0,
            duration_ms: 0.0,
        });
        run(&mut state, 1000);
        assert_eq!(state.waves.wave, 1);
        let go = TickInput {
            start_next_wave: true,
            ..TickInput::default()
        };
        tick(&mut state, &go, SIM_DT_MS).unwrap();
        assert_eq!(state.waves.wave, 2);
    }

    #[test]
    fn test_boss_commands_reach_the_world() {
        let mut state = GameState::new(8);
        run(&mut state, 1);
        state.waves.enemies_to_spawn = 0;
        let id = state.spawn_boss(BossKind::Classic);
        if let Some(boss) = state.enemies.iter_mut().find(|e| e.id == id).and_then(|e| e.boss.as_mut()) {
            boss.attack_timer_ms = 0.0;
            boss.phase = crate::sim::boss::BossPhase::Vortex(Default::default());
        }
        state.drain_events();
        run(&mut state, 1);
        // The vortex default attack is a ring of enemy shots
        assert!(state.projectiles.iter().filter(|p| p.owner == Owner::Enemy).count() >= 12);
    }

    #[test]
    fn test_game_over_cancels_boss_tasks() {
        let mut state = GameState::new(9);
        run(&mut state, 1);
        let id = state.spawn_boss(BossKind::Classic);
        if let Some(boss) = state.enemies.iter_mut().find(|e| e.id == id).and_then(|e| e.boss.as_mut()) {
            boss.arsenal.after(500.0, crate::sim::boss::BossAction::Ring { count: 8, offset: 0.0 });
        }
        state.player.vitals.hp = 0.0;
        run(&mut state, 1);
        assert_eq!(state.phase, RunPhase::GameOver);
        let boss = state.enemies.iter().find(|e| e.id == id).and_then(|e| e.boss.as_ref()).unwrap();
        assert!(boss.arsenal.schedule.is_empty());
        assert!(state.events.iter().any(|e| matches!(e, SimEvent::PlayerDied { .. })));
    }
}

//! End-to-end runs through the public API

use glam::Vec2;

use arena_siege::consts::SIM_DT_MS;
use arena_siege::persistence::{load_snapshot, save_snapshot};
use arena_siege::sim::combat::hurt_player;
use arena_siege::sim::damage::{DamageSource, SourceKind};
use arena_siege::sim::loadout::{BarrierConfig, HomingConfig};
use arena_siege::sim::wave::stat_scaling;
use arena_siege::sim::{
    BossKind, Enemy, EnemyKind, FrameClock, GameState, Owner, ProjectileFlags, RenderView, RunPhase, Shot, SimEvent,
    StatScaling, TickInput, tick,
};
use arena_siege::{AmountKind, Settings, SimError, Tuning};

fn run(state: &mut GameState, ticks: u32) {
    for _ in 0..ticks {
        tick(state, &TickInput::default(), SIM_DT_MS).unwrap();
    }
}

fn god_state(seed: u64) -> GameState {
    let settings = Settings {
        god_mode: true,
        ..Settings::default()
    };
    GameState::with_config(seed, Tuning::default(), settings).unwrap()
}

/// Mid-wave with no spawner and a turret that never fires
fn quiet_arena(seed: u64) -> GameState {
    let mut state = GameState::new(seed);
    state.phase = RunPhase::Playing;
    state.player.fire_cooldown_ms = 1.0e9;
    state
}

fn player_shot(origin: Vec2, speed: f32, flags: ProjectileFlags) -> Shot {
    Shot {
        owner: Owner::Player,
        origin,
        angle: 0.0,
        speed,
        damage: 1.0,
        radius: 5.0,
        lifetime_ms: 60_000.0,
        flags,
    }
}

#[test]
fn same_seed_replays_identically() {
    let mut a = god_state(1234);
    let mut b = god_state(1234);
    run(&mut a, 3000);
    run(&mut b, 3000);
    assert_eq!(a.drain_events(), b.drain_events());
    assert_eq!(save_snapshot(&a).unwrap(), save_snapshot(&b).unwrap());
}

#[test]
fn snapshot_resumes_mid_run() {
    let mut original = god_state(77);
    run(&mut original, 1500);
    let mut resumed = load_snapshot(&save_snapshot(&original).unwrap()).unwrap();
    assert_eq!(resumed.tick, original.tick);

    run(&mut original, 1500);
    run(&mut resumed, 1500);
    assert_eq!(original.score, resumed.score);
    assert_eq!(original.kills, resumed.kills);
    assert_eq!(save_snapshot(&original).unwrap(), save_snapshot(&resumed).unwrap());
}

#[test]
fn frame_rate_does_not_change_outcome() {
    let mut fast = god_state(5);
    let mut slow = god_state(5);
    let mut fast_clock = FrameClock::new();
    let mut slow_clock = FrameClock::new();
    let input = TickInput::default();
    // 144 Hz against 30 Hz over the same ten seconds; compare on whole steps
    let mut fast_steps = 0;
    while fast_steps < 1200 {
        fast_steps += fast_clock.run(&mut fast, &input, 1000.0 / 144.0).unwrap();
    }
    let mut slow_steps = 0;
    while slow_steps < fast_steps {
        slow_steps += slow_clock.run(&mut slow, &input, 1000.0 / 30.0).unwrap();
    }
    run(&mut fast, slow_steps - fast_steps);
    assert_eq!(fast.tick, slow.tick);
    assert_eq!(save_snapshot(&fast).unwrap(), save_snapshot(&slow).unwrap());
}

#[test]
fn scaling_is_capped_at_wave_100() {
    let tuning = Tuning::default();
    let scaling = stat_scaling(100, &tuning.waves);
    assert_eq!(scaling.health, tuning.waves.max_health_multiplier);
    assert!(scaling.speed <= tuning.waves.max_speed_multiplier);
    assert!(scaling.damage <= tuning.waves.max_damage_multiplier);
}

#[test]
fn splitter_splits_one_generation_deep() {
    let mut state = god_state(31);
    run(&mut state, 1);
    state.waves.enemies_to_spawn = 0;
    let id = state.spawn_boss(BossKind::Splitter);
    if let Some(body) = state.enemies.iter_mut().find(|e| e.id == id) {
        body.health = body.max_health * 0.4;
    }
    run(&mut state, 1);

    let copies: Vec<_> = state
        .enemies
        .iter()
        .filter(|e| e.id != id && e.boss.as_ref().is_some_and(|b| b.kind == BossKind::Splitter))
        .map(|e| e.id)
        .collect();
    assert_eq!(copies.len(), 2);

    for body in state.enemies.iter_mut().filter(|e| copies.contains(&e.id)) {
        body.health = body.max_health * 0.1;
    }
    run(&mut state, 10);

    let splits = state
        .drain_events()
        .into_iter()
        .filter(|e| matches!(e, SimEvent::BossSplit { .. }))
        .count();
    assert_eq!(splits, 1);
    assert!(state
        .enemies
        .iter()
        .filter_map(|e| e.boss.as_ref())
        .all(|b| b.generation <= 1));
}

#[test]
fn shield_absorbs_before_health_and_barrier_saves() {
    let mut state = GameState::new(8);
    state.player.loadout.barrier_phase = Some(BarrierConfig::default());
    let tuning = state.tuning.player.clone();
    let max_hp = state.player.vitals.max_hp;
    let mut events = Vec::new();

    let hit = hurt_player(
        &mut state.player,
        &tuning,
        &mut events,
        30.0,
        DamageSource::new(SourceKind::Contact),
    )
    .unwrap();
    assert_eq!(hit.absorption.shield_damage, 25.0);
    assert_eq!(hit.absorption.health_damage, 5.0);
    assert!(events.contains(&SimEvent::ShieldBroken));

    // Drop under the barrier threshold; the next hit is ignored
    hurt_player(
        &mut state.player,
        &tuning,
        &mut events,
        max_hp * 0.8,
        DamageSource::new(SourceKind::Contact),
    )
    .unwrap();
    assert!(events.contains(&SimEvent::BarrierActivated));
    let hp = state.player.vitals.hp;
    hurt_player(
        &mut state.player,
        &tuning,
        &mut events,
        50.0,
        DamageSource::new(SourceKind::Contact),
    )
    .unwrap();
    assert_eq!(state.player.vitals.hp, hp);
}

#[test]
fn negative_amounts_are_rejected() {
    let mut state = GameState::new(9);
    assert!(matches!(
        state.player.heal(-1.0),
        Err(SimError::NegativeAmount { kind: AmountKind::Heal, .. })
    ));
    let tuning = state.tuning.player.clone();
    let mut events = Vec::new();
    assert!(hurt_player(
        &mut state.player,
        &tuning,
        &mut events,
        f32::NAN,
        DamageSource::new(SourceKind::EnemyProjectile),
    )
    .is_err());
}

#[test]
fn unprotected_player_eventually_dies() {
    let mut state = GameState::new(10);
    state.player.vitals.hp = 1.0;
    state.player.vitals.shield = 0.0;
    // Harmless turret: the first wave is bound to reach the player
    state.player.stats.damage_multiplier = 0.0;
    let mut ticks = 0;
    while state.phase != RunPhase::GameOver && ticks < 120 * 600 {
        run(&mut state, 1);
        ticks += 1;
    }
    assert_eq!(state.phase, RunPhase::GameOver);
    let view = RenderView::capture(&state);
    assert_eq!(view.phase, RunPhase::GameOver);
    assert_eq!(view.player.health_ratio, 0.0);
    let frozen = state.tick;
    run(&mut state, 10);
    assert_eq!(state.tick, frozen);
}

#[test]
fn ricochet_shot_bounces_off_walls_until_charges_run_out() {
    let mut state = quiet_arena(40);
    let centre = state.player.pos;
    let flags = ProjectileFlags {
        ricochet_bounces: 2,
        ..ProjectileFlags::default()
    };
    state.fire_player_shot(&player_shot(centre, 700.0, flags));

    let mut heading = 1.0f32;
    let mut bounces = 0;
    let mut ticks = 0;
    while !state.projectiles.is_empty() && ticks < 120 * 60 {
        run(&mut state, 1);
        ticks += 1;
        if let Some(shot) = state.projectiles.iter().next() {
            assert_eq!(shot.pos.y, centre.y);
            if shot.vel.x.signum() != heading {
                heading = shot.vel.x.signum();
                bounces += 1;
            }
        }
    }
    assert!(state.projectiles.is_empty());
    assert_eq!(bounces, 2);
    // Right wall, left wall, then out on the right: 800 + 1600 + 1600
    let travelled = 700.0 * ticks as f32 * SIM_DT_MS / 1000.0;
    let arena = state.tuning.arena.width;
    assert!(travelled >= arena * 2.5 && travelled < arena * 2.5 + 20.0);
}

#[test]
fn homing_shot_retargets_when_its_target_dies() {
    let mut state = quiet_arena(41);
    let place = |state: &mut GameState, pos: Vec2| {
        let id = state.next_entity_id();
        let mut enemy = Enemy::new(id, EnemyKind::Grunt, pos, &StatScaling::default());
        enemy.speed = 0.0;
        state.enemies.push(enemy);
        id
    };
    let near = place(&mut state, Vec2::new(400.0, 250.0));
    let far = place(&mut state, Vec2::new(400.0, 700.0));
    let flags = ProjectileFlags {
        homing: Some(HomingConfig {
            strength: 2.0,
            retarget_every: 1,
        }),
        ..ProjectileFlags::default()
    };
    state.fire_player_shot(&player_shot(Vec2::new(400.0, 450.0), 60.0, flags));

    run(&mut state, 2);
    let target = |state: &GameState| state.projectiles.iter().next().and_then(|p| p.homing_target);
    assert_eq!(target(&state), Some(near));

    let index = state.enemies.iter().position(|e| e.id == near).unwrap();
    state.field().strike(index, 10_000.0, false, false).unwrap();
    run(&mut state, 1);
    assert_eq!(target(&state), Some(far));
    run(&mut state, 60);
    assert!(state.projectiles.iter().all(|p| p.vel.y > 0.0));
}

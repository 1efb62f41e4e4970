//! Read-only per-entity snapshot for the renderer and HUD
//!
//! Built fresh from a [`GameState`] whenever the host wants to draw. Nothing
//! here points back into the simulation, so a renderer cannot mutate it.

use glam::Vec2;
use serde::Serialize;

use super::boss::{Boss, BossKind};
use super::enemy::{Enemy, EnemyKind};
use super::player::Player;
use super::projectile::{Owner, Projectile};
use super::state::{GameState, Particle, RunPhase};

/// Which loadout abilities are live, for HUD icons and player effects
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct AbilityFlags {
    pub piercing_level: u32,
    pub triple_shot: bool,
    pub explosive: bool,
    pub chain_hit: bool,
    pub life_steal: bool,
    pub slow_field: bool,
    pub homing: bool,
    pub barrier_phase: bool,
    pub emergency_heal: bool,
    pub ricochet: bool,
    pub shield_breaker: bool,
    pub overcharge: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PlayerView {
    pub pos: Vec2,
    pub facing: f32,
    pub radius: f32,
    pub health_ratio: f32,
    pub shield_ratio: f32,
    pub target: Option<u32>,
    pub aimed: bool,
    pub barrier_active: bool,
    pub invulnerable: bool,
    /// Radius of the slow field aura, if any
    pub slow_field_radius: Option<f32>,
    pub abilities: AbilityFlags,
}

impl PlayerView {
    fn capture(player: &Player) -> Self {
        let loadout = &player.loadout;
        Self {
            pos: player.pos,
            facing: player.facing,
            radius: player.radius,
            health_ratio: player.vitals.health_ratio(),
            shield_ratio: player.vitals.shield_ratio(),
            target: player.targeting.target,
            aimed: player.targeting.aimed,
            barrier_active: player.barrier_active_ms > 0.0,
            invulnerable: player.hit_invulnerable_ms > 0.0 || player.god_mode,
            slow_field_radius: loadout.slow_field.map(|f| f.radius),
            abilities: AbilityFlags {
                piercing_level: loadout.piercing_level,
                triple_shot: loadout.triple_shot,
                explosive: loadout.explosive.is_some(),
                chain_hit: loadout.chain_hit.is_some(),
                life_steal: loadout.life_steal.is_some(),
                slow_field: loadout.slow_field.is_some(),
                homing: loadout.homing.is_some(),
                barrier_phase: loadout.barrier_phase.is_some(),
                emergency_heal: loadout.emergency_heal.is_some(),
                ricochet: loadout.ricochet_bounces > 0,
                shield_breaker: loadout.shield_breaker,
                overcharge: loadout.overcharge_burst.is_some(),
            },
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct HazardView {
    pub kind: &'static str,
    pub pos: Vec2,
    pub radius: f32,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BossView {
    pub kind: BossKind,
    /// Phase identifier, e.g. `"charging"` or `"enraged"`
    pub phase: &'static str,
    pub shield_ratio: Option<f32>,
    pub generation: u8,
    pub hazards: Vec<HazardView>,
}

impl BossView {
    fn capture(boss: &Boss) -> Self {
        Self {
            kind: boss.kind,
            phase: boss.phase_tag(),
            shield_ratio: boss.shield_ratio(),
            generation: boss.generation,
            hazards: boss
                .arsenal
                .hazards
                .iter()
                .filter(|h| !h.expired)
                .map(|h| HazardView {
                    kind: h.name(),
                    pos: h.pos,
                    radius: h.radius(),
                })
                .collect(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct EnemyView {
    pub id: u32,
    pub kind: EnemyKind,
    pub pos: Vec2,
    /// Heading for sprites; zero when standing still
    pub angle: f32,
    pub radius: f32,
    pub health_ratio: f32,
    pub dying: bool,
    pub slowed: bool,
    pub boss: Option<BossView>,
}

impl EnemyView {
    fn capture(enemy: &Enemy) -> Self {
        Self {
            id: enemy.id,
            kind: enemy.kind,
            pos: enemy.pos,
            angle: crate::angle_between(Vec2::ZERO, enemy.vel),
            radius: enemy.radius,
            health_ratio: enemy.health_ratio(),
            dying: enemy.dying,
            slowed: enemy.slow_factor < 1.0,
            boss: enemy.boss.as_deref().map(BossView::capture),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct ProjectileView {
    pub id: u32,
    pub owner: Owner,
    pub pos: Vec2,
    pub angle: f32,
    pub radius: f32,
    pub critical: bool,
}

impl From<&Projectile> for ProjectileView {
    fn from(p: &Projectile) -> Self {
        Self {
            id: p.id,
            owner: p.owner,
            pos: p.pos,
            angle: p.angle(),
            radius: p.radius,
            critical: p.flags.is_critical,
        }
    }
}

/// Everything needed to draw one frame
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RenderView {
    pub tick: u64,
    pub phase: RunPhase,
    pub wave: u32,
    pub score: u64,
    pub kills: u32,
    pub player: PlayerView,
    pub enemies: Vec<EnemyView>,
    pub projectiles: Vec<ProjectileView>,
    pub particles: Vec<Particle>,
}

impl RenderView {
    pub fn capture(state: &GameState) -> Self {
        let mut projectiles: Vec<ProjectileView> = state.projectiles.iter().map(ProjectileView::from).collect();
        projectiles.sort_by_key(|p| p.id);

        Self {
            tick: state.tick,
            phase: state.phase,
            wave: state.waves.wave,
            score: state.score,
            kills: state.kills,
            player: PlayerView::capture(&state.player),
            enemies: state.enemies.iter().map(EnemyView::capture).collect(),
            projectiles,
            particles: state.particles.iter().copied().collect(),
        }
    }

    /// JSON for hosts that draw outside Rust
    pub fn to_json(&self) -> Result<String, crate::SimError> {
        Ok(serde_json::to_string(self)?)
    }
}

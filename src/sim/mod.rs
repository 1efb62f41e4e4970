//! Deterministic simulation module
//!
//! All gameplay logic lives here. This module must be pure and deterministic:
//! - Fixed timestep only
//! - Seeded RNG only
//! - Stable iteration order (by entity ID)
//! - No rendering or platform dependencies

pub mod boss;
pub mod clock;
pub mod combat;
pub mod damage;
pub mod enemy;
pub mod loadout;
pub mod modifiers;
pub mod player;
pub mod pool;
pub mod projectile;
pub mod state;
pub mod targeting;
pub mod tick;
pub mod view;
pub mod wave;

pub use boss::{Boss, BossCommand, BossKind, BossPhase};
pub use clock::FrameClock;
pub use combat::Blast;
pub use damage::{Absorption, DamageSource, SourceKind, Vitals};
pub use enemy::{Enemy, EnemyKind, StatScaling};
pub use loadout::{Loadout, ProgressionBundle, StatBundle};
pub use modifiers::{AscensionModifier, ModifierHook, StatDelta, WaveModifier};
pub use player::{MoveInput, Player, TransientBonus};
pub use pool::{Handle, Pool, Recycle};
pub use projectile::{Owner, Projectile, ProjectileFlags, Shot};
pub use state::{GameState, Particle, RunPhase, SimEvent};
pub use tick::{TickInput, tick};
pub use view::RenderView;
pub use wave::{WaveCompleted, WaveManager};

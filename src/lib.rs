//! Arena Siege - an auto-battling arena combat simulation
//!
//! Core modules:
//! - `sim`: Deterministic simulation (targeting, projectiles, bosses, waves)
//! - `tuning`: Data-driven game balance
//! - `settings`: Run preferences
//! - `persistence`: Versioned snapshots for Continue
//! - `platform`: Browser/native platform abstraction

pub mod error;
pub mod persistence;
pub mod platform;
pub mod settings;
pub mod sim;
pub mod tuning;

pub use error::{AmountKind, SimError};
pub use settings::{QualityPreset, Settings};
pub use tuning::Tuning;

use glam::Vec2;

/// Game configuration constants
pub mod consts {
    /// Fixed simulation timestep in milliseconds (120 Hz)
    pub const SIM_DT_MS: f32 = 1000.0 / 120.0;
    /// Maximum substeps per frame to prevent spiral of death
    pub const MAX_SUBSTEPS: u32 = 8;

    /// Below this length a direction vector is treated as zero
    pub const EPSILON: f32 = 1e-4;

    /// Velocity magnitude (px/s) under which a target counts as stationary
    pub const STATIONARY_SPEED: f32 = 0.5;

    /// Aim tolerance for "aimed" / firing gate (~5 degrees)
    pub const AIM_TOLERANCE: f32 = 5.0 * std::f32::consts::PI / 180.0;

    /// Hard cap on critical chance after bonuses
    pub const MAX_CRIT_CHANCE: f32 = 0.75;

    /// Damage falloff per enemy already pierced
    pub const PIERCE_FALLOFF: f32 = 0.25;

    /// Splitter copies at or beyond this generation never split again
    pub const SPLIT_MAX_GENERATION: u8 = 1;

    /// Wave completion must hold this long before it is accepted
    pub const WAVE_CLEAR_DEBOUNCE_MS: f32 = 1000.0;
}

/// Normalized angle to [-π, π)
#[inline]
pub fn normalize_angle(mut angle: f32) -> f32 {
    use std::f32::consts::PI;
    if !angle.is_finite() {
        return 0.0;
    }
    while angle >= PI {
        angle -= 2.0 * PI;
    }
    while angle < -PI {
        angle += 2.0 * PI;
    }
    angle
}

/// Shortest signed rotation that takes `from` onto `to`
#[inline]
pub fn angle_diff(from: f32, to: f32) -> f32 {
    normalize_angle(to - from)
}

/// Angle of the vector pointing from `from` to `to`
///
/// Coincident points have no direction; they yield 0.0 rather than NaN.
#[inline]
pub fn angle_between(from: Vec2, to: Vec2) -> f32 {
    let d = to - from;
    if d.length_squared() < consts::EPSILON * consts::EPSILON {
        return 0.0;
    }
    d.y.atan2(d.x)
}

#[inline]
pub fn distance(a: Vec2, b: Vec2) -> f32 {
    a.distance(b)
}

#[inline]
pub fn distance_squared(a: Vec2, b: Vec2) -> f32 {
    a.distance_squared(b)
}

/// Step `current` toward `target` by at most `max_step` radians
pub fn rotate_toward(current: f32, target: f32, max_step: f32) -> f32 {
    let delta = angle_diff(current, target);
    let step = delta.clamp(-max_step.abs(), max_step.abs());
    normalize_angle(current + step)
}

/// Convert polar (r, theta) to cartesian (x, y)
#[inline]
pub fn polar_to_cartesian(r: f32, theta: f32) -> Vec2 {
    Vec2::new(r * theta.cos(), r * theta.sin())
}

/// Unit direction for an angle
#[inline]
pub fn direction(theta: f32) -> Vec2 {
    polar_to_cartesian(1.0, theta)
}

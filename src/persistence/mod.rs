//! Run snapshots for resume/continue
//!
//! A snapshot is the whole [`GameState`] wrapped in a versioned JSON
//! envelope. Cosmetic particles and undrained events are not saved. Where
//! the JSON ends up (file, LocalStorage) is the host's business.

use serde::{Deserialize, Serialize};

use crate::error::SimError;
use crate::sim::GameState;

/// Bumped whenever the serialized layout of `GameState` changes
pub const SNAPSHOT_VERSION: u32 = 1;

#[derive(Serialize)]
struct EnvelopeRef<'a> {
    version: u32,
    state: &'a GameState,
}

#[derive(Deserialize)]
struct Envelope {
    version: u32,
    state: serde_json::Value,
}

/// Serialize a running game
pub fn save_snapshot(state: &GameState) -> Result<String, SimError> {
    let json = serde_json::to_string(&EnvelopeRef {
        version: SNAPSHOT_VERSION,
        state,
    })?;
    log::info!("snapshot saved at tick {} (wave {})", state.tick, state.waves.wave);
    Ok(json)
}

/// Restore a game saved by [`save_snapshot`].
///
/// The version is checked before the state is decoded, so an old layout
/// reports `UnsupportedSnapshot` rather than a field error.
pub fn load_snapshot(json: &str) -> Result<GameState, SimError> {
    let envelope: Envelope = serde_json::from_str(json)?;
    if envelope.version != SNAPSHOT_VERSION {
        log::warn!("rejecting snapshot version {}", envelope.version);
        return Err(SimError::UnsupportedSnapshot {
            found: envelope.version,
            expected: SNAPSHOT_VERSION,
        });
    }
    let state: GameState = serde_json::from_value(envelope.state)?;
    state.tuning.validate()?;
    log::info!("snapshot loaded at tick {} (wave {})", state.tick, state.waves.wave);
    Ok(state)
}

//! Host frame deltas to fixed simulation steps
//!
//! Render frame rate must not change outcomes: the host feeds whatever
//! elapsed time it measured and the clock turns it into whole `SIM_DT_MS`
//! steps, carrying the remainder to the next frame.

use serde::{Deserialize, Serialize};

use super::state::GameState;
use super::tick::{TickInput, tick};
use crate::consts::{MAX_SUBSTEPS, SIM_DT_MS};
use crate::error::SimError;

/// Longest frame accepted; anything longer (tab switch, debugger) is clipped
pub const MAX_FRAME_MS: f32 = 100.0;

#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct FrameClock {
    accumulator_ms: f32,
}

impl FrameClock {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a frame's elapsed time and return how many fixed steps to run.
    ///
    /// At most `MAX_SUBSTEPS` per call; the backlog beyond that is dropped
    /// so a slow host cannot spiral.
    pub fn advance(&mut self, frame_ms: f32) -> u32 {
        if !(frame_ms.is_finite() && frame_ms > 0.0) {
            return 0;
        }
        self.accumulator_ms += frame_ms.min(MAX_FRAME_MS);

        let mut steps = 0;
        while self.accumulator_ms >= SIM_DT_MS && steps < MAX_SUBSTEPS {
            self.accumulator_ms -= SIM_DT_MS;
            steps += 1;
        }
        if steps == MAX_SUBSTEPS && self.accumulator_ms >= SIM_DT_MS {
            log::debug!("frame clock dropping {:.1} ms of backlog", self.accumulator_ms);
            self.accumulator_ms %= SIM_DT_MS;
        }
        steps
    }

    /// Fraction of a step left over, for render interpolation
    pub fn alpha(&self) -> f32 {
        (self.accumulator_ms / SIM_DT_MS).clamp(0.0, 1.0)
    }

    /// Advance the clock and run the resulting steps.
    ///
    /// One-shot commands in `input` apply to the first step only.
    pub fn run(&mut self, state: &mut GameState, input: &TickInput, frame_ms: f32) -> Result<u32, SimError> {
        let steps = self.advance(frame_ms);
        let held = input.held();
        for step in 0..steps {
            let current = if step == 0 { input } else { &held };
            tick(state, current, SIM_DT_MS)?;
        }
        Ok(steps)
    }
}

//! Arena Siege - headless runner
//!
//! Plays a seeded auto-battle with no renderer and logs each wave. Useful
//! for balance passes and for checking that a seed replays identically.
//!
//! ```text
//! arena-siege [--seed N] [--waves N] [--tuning FILE] [--bundle FILE] [--god]
//! ```

#[cfg(not(target_arch = "wasm32"))]
mod headless {
    use std::error::Error;
    use std::fs;
    use std::path::PathBuf;

    use clap::Parser;

    use arena_siege::consts::SIM_DT_MS;
    use arena_siege::platform::init_logging;
    use arena_siege::sim::{FrameClock, GameState, ProgressionBundle, RunPhase, SimEvent, TickInput};
    use arena_siege::{Settings, Tuning};

    /// Host frame length the runner pretends to render at
    const FRAME_MS: f32 = 1000.0 / 60.0;
    /// Give up on a run that stalls this long in simulated time
    const MAX_RUN_MS: f64 = 60.0 * 60.0 * 1000.0;

    #[derive(Parser, Debug)]
    #[command(name = "arena-siege", about = "Play a seeded Arena Siege run headless and log each wave")]
    struct Cli {
        /// Run seed
        #[arg(long, default_value_t = 42)]
        seed: u64,

        /// Stop after this many cleared waves
        #[arg(long, default_value_t = 10)]
        waves: u32,

        /// Tuning JSON replacing the built-in defaults
        #[arg(long)]
        tuning: Option<PathBuf>,

        /// Progression bundle JSON applied before the first wave
        #[arg(long)]
        bundle: Option<PathBuf>,

        /// Player cannot take damage
        #[arg(long)]
        god: bool,
    }

    pub fn run() -> Result<(), Box<dyn Error>> {
        let options = Cli::parse();
        init_logging();

        let tuning = match &options.tuning {
            Some(path) => Tuning::from_json(&fs::read_to_string(path)?)?,
            None => Tuning::default(),
        };
        let settings = Settings {
            god_mode: options.god,
            particles: false,
            auto_advance_ms: Some(500.0),
            ..Settings::default()
        };
        let mut state = GameState::with_config(options.seed, tuning, settings)?;
        if let Some(path) = &options.bundle {
            let bundle: ProgressionBundle = serde_json::from_str(&fs::read_to_string(path)?)?;
            state.apply_progression(&bundle);
        }
        log::info!("Arena Siege (headless) starting with seed {}", options.seed);

        let mut clock = FrameClock::new();
        let input = TickInput::default();
        let mut cleared = 0;
        while cleared < options.waves && state.phase != RunPhase::GameOver {
            clock.run(&mut state, &input, FRAME_MS)?;
            for event in state.drain_events() {
                match event {
                    SimEvent::WaveStarted { wave, enemy_count, boss, modifier } => {
                        log::info!("wave {wave}: {enemy_count} enemies, boss {boss:?}, modifier {modifier:?}");
                    }
                    SimEvent::BossSpawned { kind, voice_cue, .. } => {
                        log::info!("boss {} arrives ({voice_cue})", kind.as_str());
                    }
                    SimEvent::WaveCompleted(done) => {
                        cleared += 1;
                        log::info!(
                            "wave {} cleared: {} kills in {:.1}s, hp {:.0}/{:.0}",
                            done.wave,
                            done.enemies_killed,
                            done.duration_ms / 1000.0,
                            state.player.vitals.hp,
                            state.player.vitals.max_hp
                        );
                    }
                    _ => {}
                }
            }
            if state.time_ms > MAX_RUN_MS {
                log::warn!("run stalled on wave {}; stopping", state.waves.wave);
                break;
            }
        }

        log::info!(
            "finished after {} ticks ({:.1}s simulated): wave {}, score {}, kills {}{}",
            state.tick,
            state.tick as f32 * SIM_DT_MS / 1000.0,
            state.waves.wave,
            state.score,
            state.kills,
            if state.phase == RunPhase::GameOver { ", player died" } else { "" }
        );
        Ok(())
    }

    #[cfg(test)]
    mod tests {
        use super::*;

        #[test]
        fn test_defaults() {
            let cli = Cli::try_parse_from(["arena-siege"]).unwrap();
            assert_eq!(cli.seed, 42);
            assert_eq!(cli.waves, 10);
            assert!(cli.tuning.is_none());
            assert!(cli.bundle.is_none());
            assert!(!cli.god);
        }

        #[test]
        fn test_flags_and_equals_form() {
            let cli = Cli::try_parse_from([
                "arena-siege",
                "--seed=5",
                "--waves",
                "3",
                "--bundle",
                "run.json",
                "--god",
            ])
            .unwrap();
            assert_eq!(cli.seed, 5);
            assert_eq!(cli.waves, 3);
            assert_eq!(cli.bundle, Some(PathBuf::from("run.json")));
            assert!(cli.god);
        }

        #[test]
        fn test_bad_arguments_rejected() {
            assert!(Cli::try_parse_from(["arena-siege", "--seed"]).is_err());
            assert!(Cli::try_parse_from(["arena-siege", "--seed", "many"]).is_err());
            assert!(Cli::try_parse_from(["arena-siege", "--speed", "2"]).is_err());
        }
    }
}

#[cfg(not(target_arch = "wasm32"))]
fn main() -> Result<(), Box<dyn std::error::Error>> {
    headless::run()
}

#[cfg(target_arch = "wasm32")]
fn main() {
    // The browser host links the library directly
}

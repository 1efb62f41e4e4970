//! Platform abstraction layer
//!
//! The simulation itself is platform-free; only logger setup differs
//! between the browser and native hosts.

/// Install the logger for the current target. Safe to call more than once.
#[cfg(target_arch = "wasm32")]
pub fn init_logging() {
    console_error_panic_hook::set_once();
    if console_log::init_with_level(log::Level::Info).is_err() {
        log::debug!("logger already installed");
    }
}

/// Install the logger for the current target. Safe to call more than once.
///
/// Honours `RUST_LOG`; defaults to `info`.
#[cfg(not(target_arch = "wasm32"))]
pub fn init_logging() {
    let env = env_logger::Env::default().default_filter_or("info");
    if env_logger::Builder::from_env(env).try_init().is_err() {
        log::debug!("logger already installed");
    }
}

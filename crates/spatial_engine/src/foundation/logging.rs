//! Logging utilities and structured logging support

pub use log::{debug, info, warn, error, trace};

/// Default filter used when neither `RUST_LOG` nor the configuration sets one
pub const DEFAULT_FILTER: &str = "info";

/// Initialize the logging system
///
/// `RUST_LOG` takes precedence over `filter` so a single run can be made
/// more verbose without touching the configuration file. Calling this more
/// than once is harmless; later calls are ignored.
pub fn init_with_filter(filter: &str) {
    let env = env_logger::Env::default().default_filter_or(filter);
    if env_logger::Builder::from_env(env).try_init().is_err() {
        log::debug!("Logger already initialized, keeping existing configuration");
    }
}

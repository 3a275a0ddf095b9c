//! Logging utilities and structured logging support

pub use log::{debug, error, info, trace, warn};

/// Initialize the logging system
pub fn init() {
    env_logger::init();
}

/// Initialize the logging system, tolerating repeated calls
///
/// Useful for embedding hosts that cannot guarantee a single init site.
pub fn try_init() -> Result<(), log::SetLoggerError> {
    env_logger::try_init()
}

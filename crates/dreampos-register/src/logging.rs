//! # Logging
//!
//! Installs the global `tracing` subscriber for a register process.
//!
//! ## Log Levels
//! - `RUST_LOG=debug` - every cart and split mutation
//! - `RUST_LOG=dreampos_core=trace` - engine only
//! - Unset: `[logging] level` from the register config

use tracing_subscriber::EnvFilter;

use crate::config::LoggingConfig;

/// Filter from `RUST_LOG`, falling back to the configured level.
pub fn env_filter(config: &LoggingConfig) -> EnvFilter {
    EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&config.level))
}

/// Initializes the tracing subscriber.
///
/// Returns false when a global subscriber was already installed (tests, or an
/// embedding application that set up its own).
pub fn init(config: &LoggingConfig) -> bool {
    tracing_subscriber::fmt()
        .with_env_filter(env_filter(config))
        .with_target(true)
        .try_init()
        .is_ok()
}

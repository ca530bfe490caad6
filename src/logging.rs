//! Structured diagnostics for front-ends embedding the reducer.
//!
//! Logs go to stderr so a terminal front-end can keep stdout for itself.

use tracing_subscriber::EnvFilter;

use crate::config::{EnvConfig, DEFAULT_LOG_FILTER};

/// Installs the global subscriber from `BUDDY_LOG` / `BUDDY_LOG_ANSI`.
///
/// Returns false when a subscriber was already installed.
pub fn init_logging() -> bool {
    init_logging_with(&EnvConfig::from_env())
}

pub fn init_logging_with(config: &EnvConfig) -> bool {
    tracing_subscriber::fmt()
        .with_env_filter(log_filter(&config.log_filter))
        .with_ansi(config.log_ansi)
        .with_writer(std::io::stderr)
        .try_init()
        .is_ok()
}

/// Parses filter directives, falling back to the default on invalid input.
fn log_filter(directives: &str) -> EnvFilter {
    EnvFilter::try_new(directives).unwrap_or_else(|_| EnvFilter::new(DEFAULT_LOG_FILTER))
}

//! Environment configuration.

use std::env;

/// Filter applied when `BUDDY_LOG` is unset or blank.
pub const DEFAULT_LOG_FILTER: &str = "warn";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EnvConfig {
    /// `tracing` filter directives, from `BUDDY_LOG`.
    pub log_filter: String,
    /// Colored log output, enabled by `BUDDY_LOG_ANSI=1`.
    pub log_ansi: bool,
}

impl Default for EnvConfig {
    fn default() -> Self {
        Self {
            log_filter: DEFAULT_LOG_FILTER.to_string(),
            log_ansi: false,
        }
    }
}

impl EnvConfig {
    pub fn from_env() -> Self {
        Self {
            log_filter: env_string_opt("BUDDY_LOG").unwrap_or_else(|| DEFAULT_LOG_FILTER.to_string()),
            log_ansi: env_flag("BUDDY_LOG_ANSI"),
        }
    }
}

fn env_flag(key: &str) -> bool {
    env::var(key).map(|value| value == "1").unwrap_or(false)
}

fn env_string_opt(key: &str) -> Option<String> {
    env::var(key).ok().and_then(|value| {
        if value.trim().is_empty() {
            None
        } else {
            Some(value)
        }
    })
}

use std::env;
use std::time::Duration;

use crate::error::A2aClientError;
use crate::retry::RetryPolicy;
use crate::url::{rest_base_url, DEFAULT_SERVER_URL};

/// Number of sessions listed when nothing else is configured.
pub const DEFAULT_SESSION_LIMIT: usize = 20;

/// Configuration for session-history requests.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct A2aClientConfig {
    /// Agent endpoint URL; the REST base is derived from it.
    pub server_url: String,
    /// Number of sessions requested by listing calls.
    pub session_limit: usize,
    /// Optional per-request timeout.
    pub timeout: Option<Duration>,
    /// Optional `User-Agent` override.
    pub user_agent: Option<String>,
    pub retry: RetryPolicy,
}

impl Default for A2aClientConfig {
    fn default() -> Self {
        Self {
            server_url: DEFAULT_SERVER_URL.to_string(),
            session_limit: DEFAULT_SESSION_LIMIT,
            timeout: None,
            user_agent: None,
            retry: RetryPolicy::default(),
        }
    }
}

impl A2aClientConfig {
    pub fn new(server_url: impl Into<String>) -> Self {
        Self {
            server_url: server_url.into(),
            ..Self::default()
        }
    }

    /// Reads `BUDDY_SERVER_URL`, `BUDDY_SESSION_LIMIT` and `BUDDY_TIMEOUT_SEC`.
    pub fn from_env() -> Result<Self, A2aClientError> {
        let mut config = Self::default();
        if let Some(server_url) = env_string_opt("BUDDY_SERVER_URL") {
            config.server_url = server_url;
        }
        if let Some(limit) = env_positive("BUDDY_SESSION_LIMIT")? {
            config.session_limit = usize::try_from(limit).map_err(|_| {
                A2aClientError::InvalidConfig(format!("BUDDY_SESSION_LIMIT out of range: {limit}"))
            })?;
        }
        if let Some(seconds) = env_positive("BUDDY_TIMEOUT_SEC")? {
            config.timeout = Some(Duration::from_secs(seconds));
        }
        Ok(config)
    }

    pub fn with_server_url(mut self, server_url: impl Into<String>) -> Self {
        self.server_url = server_url.into();
        self
    }

    pub fn with_session_limit(mut self, session_limit: usize) -> Self {
        self.session_limit = session_limit;
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    pub fn with_user_agent(mut self, user_agent: impl Into<String>) -> Self {
        self.user_agent = Some(user_agent.into());
        self
    }

    pub fn with_retry(mut self, retry: RetryPolicy) -> Self {
        self.retry = retry;
        self
    }

    pub fn rest_base_url(&self) -> String {
        rest_base_url(&self.server_url)
    }
}

fn env_string_opt(key: &str) -> Option<String> {
    env::var(key).ok().and_then(|value| {
        let trimmed = value.trim();
        if trimmed.is_empty() {
            None
        } else {
            Some(trimmed.to_string())
        }
    })
}

fn env_positive(key: &str) -> Result<Option<u64>, A2aClientError> {
    let Some(raw) = env_string_opt(key) else {
        return Ok(None);
    };
    match raw.parse::<u64>() {
        Ok(value) if value > 0 => Ok(Some(value)),
        _ => Err(A2aClientError::InvalidConfig(format!(
            "{key} must be a positive integer, got '{raw}'"
        ))),
    }
}

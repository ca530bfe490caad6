use std::fmt;

use chat_protocol::SessionSourceError;
use reqwest::StatusCode;
use serde::Deserialize;
use serde_json::{Error as JsonError, Value};

#[derive(Debug)]
pub enum A2aClientError {
    InvalidConfig(String),
    InvalidBaseUrl(String),
    Request(reqwest::Error),
    Status(StatusCode, String),
    SessionNotFound(String),
    Serde(JsonError),
    RetryExhausted {
        status: Option<StatusCode>,
        last_error: Option<String>,
    },
}

/// Error bodies seen from agent servers: `{"error": "..."}`,
/// `{"error": {"message": "..."}}` or `{"detail": "..."}`.
#[derive(Debug, Deserialize)]
pub(crate) struct ErrorPayload {
    error: Option<Value>,
    detail: Option<Value>,
}

impl ErrorPayload {
    fn message(&self) -> Option<&str> {
        let from_error = match &self.error {
            Some(Value::String(message)) => Some(message.as_str()),
            Some(Value::Object(fields)) => fields.get("message").and_then(Value::as_str),
            _ => None,
        };
        from_error
            .or_else(|| self.detail.as_ref().and_then(Value::as_str))
            .and_then(non_empty_string)
    }
}

impl fmt::Display for A2aClientError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::InvalidConfig(message) => write!(f, "invalid configuration: {message}"),
            Self::InvalidBaseUrl(value) => write!(f, "invalid base URL: {value}"),
            Self::Request(error) => write!(f, "request error: {error}"),
            Self::Status(status, message) => write!(f, "HTTP {status} {message}"),
            Self::SessionNotFound(session_id) => write!(f, "session '{session_id}' not found"),
            Self::Serde(error) => write!(f, "serialization error: {error}"),
            Self::RetryExhausted { status, last_error } => {
                let status = status
                    .map(|status| status.as_u16().to_string())
                    .unwrap_or_else(|| "n/a".to_owned());
                write!(f, "retry exhausted after max attempts (status: {status}, last_error: {last_error:?})")
            }
        }
    }
}

impl std::error::Error for A2aClientError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Request(error) => Some(error),
            Self::Serde(error) => Some(error),
            _ => None,
        }
    }
}

impl From<reqwest::Error> for A2aClientError {
    fn from(error: reqwest::Error) -> Self {
        Self::Request(error)
    }
}

impl From<JsonError> for A2aClientError {
    fn from(error: JsonError) -> Self {
        Self::Serde(error)
    }
}

impl From<A2aClientError> for SessionSourceError {
    fn from(error: A2aClientError) -> Self {
        match error {
            A2aClientError::SessionNotFound(session_id) => Self::NotFound { session_id },
            other => Self::unavailable(other.to_string()),
        }
    }
}

/// Best human-readable message for a failed response.
pub fn parse_error_message(status: StatusCode, body: &str) -> String {
    if let Ok(payload) = serde_json::from_str::<ErrorPayload>(body) {
        if let Some(message) = payload.message() {
            return message.to_string();
        }
    }

    if body.trim().is_empty() {
        status
            .canonical_reason()
            .unwrap_or("request failed")
            .to_string()
    } else {
        body.to_string()
    }
}

fn non_empty_string(value: &str) -> Option<&str> {
    if value.is_empty() {
        None
    } else {
        Some(value)
    }
}

//! HTTP client for an A2A agent server's session-history REST API.
//!
//! This crate owns request building, retry and response decoding for the
//! `sessions` endpoints only. It contains no streaming transport and no
//! reducer state; it plugs into the reducer as a
//! [`chat_protocol::SessionSource`].

pub mod client;
pub mod config;
pub mod error;
pub mod payload;
pub mod retry;
pub mod url;

pub use client::A2aClient;
pub use config::A2aClientConfig;
pub use error::A2aClientError;
pub use url::{rest_base_url, DEFAULT_SERVER_URL};

use reqwest::Url;

use crate::error::A2aClientError;

/// Default agent endpoint.
pub const DEFAULT_SERVER_URL: &str = "http://localhost:10001/a2a";

/// Derive the REST base URL from the agent endpoint URL.
///
/// Normalization rules:
/// 1) blank input falls back to [`DEFAULT_SERVER_URL`]
/// 2) trailing slashes are dropped
/// 3) one trailing `/a2a` path segment is dropped
pub fn rest_base_url(server_url: &str) -> String {
    let base = if server_url.trim().is_empty() {
        DEFAULT_SERVER_URL
    } else {
        server_url.trim()
    };

    let trimmed = base.trim_end_matches('/');
    trimmed
        .strip_suffix("/a2a")
        .unwrap_or(trimmed)
        .trim_end_matches('/')
        .to_string()
}

/// `GET {rest}/sessions?limit={limit}`
pub fn sessions_url(rest_base: &str, limit: usize) -> Result<Url, A2aClientError> {
    let mut url = endpoint(rest_base, &["sessions"])?;
    url.query_pairs_mut()
        .append_pair("limit", &limit.to_string());
    Ok(url)
}

/// `GET {rest}/sessions/{id}` with the id percent-encoded as one path segment.
pub fn session_url(rest_base: &str, session_id: &str) -> Result<Url, A2aClientError> {
    endpoint(rest_base, &["sessions", session_id])
}

fn endpoint(rest_base: &str, segments: &[&str]) -> Result<Url, A2aClientError> {
    let mut url = Url::parse(rest_base)
        .map_err(|error| A2aClientError::InvalidBaseUrl(format!("{rest_base}: {error}")))?;
    url.path_segments_mut()
        .map_err(|_| A2aClientError::InvalidBaseUrl(format!("{rest_base}: cannot be a base")))?
        .pop_if_empty()
        .extend(segments);
    Ok(url)
}

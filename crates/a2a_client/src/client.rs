use chat_protocol::{SessionRecord, SessionSource, SessionSourceError, SessionSummary};
use reqwest::{Client, Response, StatusCode, Url};
use serde::de::DeserializeOwned;

use crate::config::A2aClientConfig;
use crate::error::{parse_error_message, A2aClientError};
use crate::payload::{SessionListResponse, SessionResponse};
use crate::retry::is_retryable_http_error;
use crate::url::{session_url, sessions_url};

#[derive(Debug)]
pub struct A2aClient {
    http: Client,
    config: A2aClientConfig,
    rest_base: String,
}

impl A2aClient {
    pub fn new(config: A2aClientConfig) -> Result<Self, A2aClientError> {
        let rest_base = config.rest_base_url();
        Url::parse(&rest_base)
            .map_err(|error| A2aClientError::InvalidBaseUrl(format!("{rest_base}: {error}")))?;

        let mut builder = Client::builder();
        if let Some(timeout) = config.timeout {
            builder = builder.timeout(timeout);
        }
        if let Some(user_agent) = &config.user_agent {
            builder = builder.user_agent(user_agent.clone());
        }
        let http = builder.build().map_err(A2aClientError::from)?;
        Ok(Self {
            http,
            config,
            rest_base,
        })
    }

    pub fn from_env() -> Result<Self, A2aClientError> {
        Self::new(A2aClientConfig::from_env()?)
    }

    pub fn config(&self) -> &A2aClientConfig {
        &self.config
    }

    pub fn rest_base_url(&self) -> &str {
        &self.rest_base
    }

    /// Lists the configured number of most recent sessions.
    pub async fn recent_sessions(&self) -> Result<Vec<SessionSummary>, A2aClientError> {
        self.fetch_sessions(self.config.session_limit).await
    }

    pub async fn fetch_sessions(&self, limit: usize) -> Result<Vec<SessionSummary>, A2aClientError> {
        let url = sessions_url(&self.rest_base, limit)?;
        let response: SessionListResponse = self.get_json(url).await?;
        Ok(response.sessions)
    }

    pub async fn fetch_session_record(&self, session_id: &str) -> Result<SessionRecord, A2aClientError> {
        let url = session_url(&self.rest_base, session_id)?;
        match self.get_json::<SessionResponse>(url).await {
            Ok(response) => Ok(response.into_record()),
            Err(A2aClientError::Status(StatusCode::NOT_FOUND, _)) => {
                Err(A2aClientError::SessionNotFound(session_id.to_string()))
            }
            Err(error) => Err(error),
        }
    }

    async fn get_json<T: DeserializeOwned>(&self, url: Url) -> Result<T, A2aClientError> {
        let response = self.send_with_retry(url).await?;
        let body = response.bytes().await?;
        Ok(serde_json::from_slice(&body)?)
    }

    /// Sends a GET, retrying transient failures with exponential backoff.
    pub async fn send_with_retry(&self, url: Url) -> Result<Response, A2aClientError> {
        let policy = self.config.retry;
        let mut last_status: Option<StatusCode> = None;
        let mut last_error = None;

        for attempt in 0..=policy.max_retries {
            tracing::debug!(%url, attempt, "sending request");

            match self.http.get(url.clone()).send().await {
                Ok(response) => {
                    let status = response.status();
                    if status.is_success() {
                        return Ok(response);
                    }

                    last_status = Some(status);
                    let body = response.text().await.unwrap_or_else(|_| {
                        status
                            .canonical_reason()
                            .unwrap_or("request failed")
                            .to_string()
                    });
                    let message = parse_error_message(status, &body);
                    last_error = Some(message.clone());

                    if attempt < policy.max_retries && is_retryable_http_error(status.as_u16(), &body) {
                        tracing::warn!(%url, %status, attempt, "retrying failed request");
                        tokio::time::sleep(policy.delay_for(attempt)).await;
                        continue;
                    }

                    return Err(A2aClientError::Status(status, message));
                }
                Err(error) => {
                    let message = error.to_string();
                    last_error = Some(message);
                    if attempt < policy.max_retries {
                        tracing::warn!(%url, error = %error, attempt, "retrying request after transport error");
                        tokio::time::sleep(policy.delay_for(attempt)).await;
                        continue;
                    }
                    return Err(A2aClientError::RetryExhausted {
                        status: last_status,
                        last_error,
                    });
                }
            }
        }

        Err(A2aClientError::RetryExhausted {
            status: last_status,
            last_error,
        })
    }
}

impl SessionSource for A2aClient {
    async fn list_sessions(&self, limit: usize) -> Result<Vec<SessionSummary>, SessionSourceError> {
        Ok(self.fetch_sessions(limit).await?)
    }

    async fn fetch_session(&self, session_id: &str) -> Result<SessionRecord, SessionSourceError> {
        Ok(self.fetch_session_record(session_id).await?)
    }
}

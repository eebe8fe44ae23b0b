//! Remote fallback endpoint client.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use thiserror::Error;

/// Default fallback endpoint.
pub const DEFAULT_FALLBACK_URL: &str = "http://127.0.0.1:8000/api/ai/fallback";

/// Errors from the fallback endpoint. These are never recovered from.
#[derive(Debug, Error)]
pub enum FallbackError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),
    #[error("fallback endpoint returned {status}: {body}")]
    Status { status: u16, body: String },
    #[error("invalid fallback response: {0}")]
    Json(#[from] serde_json::Error),
}

/// Request body sent to the fallback endpoint.
#[derive(Debug, Serialize)]
pub struct FallbackPayload<'a> {
    pub prompt: &'a str,
}

/// Response body. Some deployments answer with `text` instead of `response`;
/// when both are present `response` wins.
#[derive(Debug, Deserialize)]
struct FallbackResponse {
    response: Option<String>,
    text: Option<String>,
}

impl FallbackResponse {
    fn into_text(self) -> Result<String, FallbackError> {
        self.response
            .or(self.text)
            .ok_or_else(|| FallbackError::Json(serde::de::Error::missing_field("response")))
    }
}

/// Something that can answer a prompt remotely.
#[async_trait]
pub trait FallbackTransport: Send + Sync {
    async fn complete(&self, prompt: &str) -> Result<String, FallbackError>;
}

/// JSON-over-HTTP fallback client. One attempt per prompt, no retries.
#[derive(Debug, Clone)]
pub struct HttpFallback {
    client: reqwest::Client,
    url: String,
}

impl HttpFallback {
    /// Create a client for `url` with no request timeout.
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            client: reqwest::Client::new(),
            url: url.into(),
        }
    }

    /// Create a client for `url`, optionally bounding each request.
    pub fn with_timeout(
        url: impl Into<String>,
        timeout: Option<Duration>,
    ) -> Result<Self, FallbackError> {
        let mut builder = reqwest::Client::builder();
        if let Some(timeout) = timeout {
            builder = builder.timeout(timeout);
        }

        Ok(Self {
            client: builder.build()?,
            url: url.into(),
        })
    }

    pub fn url(&self) -> &str {
        &self.url
    }
}

#[async_trait]
impl FallbackTransport for HttpFallback {
    async fn complete(&self, prompt: &str) -> Result<String, FallbackError> {
        let response = self
            .client
            .post(&self.url)
            .json(&FallbackPayload { prompt })
            .send()
            .await?;

        let status = response.status();
        let body = response.text().await?;

        if !status.is_success() {
            return Err(FallbackError::Status {
                status: status.as_u16(),
                body,
            });
        }

        let parsed: FallbackResponse = serde_json::from_str(&body)?;
        parsed.into_text()
    }
}

//! Chat requests against a running llama-server.

use serde::{Deserialize, Serialize};
use std::time::Duration;

use crate::error::LocalAIError;

const HEALTH_TIMEOUT: Duration = Duration::from_secs(5);

#[derive(Serialize)]
struct ChatRequest<'a> {
    messages: Vec<Message<'a>>,
    temperature: f32,
    max_tokens: u32,
    stream: bool,
}

#[derive(Serialize)]
struct Message<'a> {
    role: &'static str,
    content: &'a str,
}

#[derive(Deserialize)]
struct ChatResponse {
    choices: Vec<ChatChoice>,
}

#[derive(Deserialize)]
struct ChatChoice {
    message: ChatReply,
}

#[derive(Deserialize)]
struct ChatReply {
    content: String,
}

/// Talks to llama-server's `/health` and OpenAI-style `/v1/chat/completions`.
#[derive(Debug, Clone)]
pub struct LlamaCppClient {
    http: reqwest::Client,
    base_url: String,
}

impl LlamaCppClient {
    pub fn with_url(base_url: impl Into<String>) -> Self {
        Self {
            http: reqwest::Client::new(),
            base_url: base_url.into(),
        }
    }

    /// Client for a server listening on `127.0.0.1:port`.
    pub fn with_port(port: u16) -> Self {
        Self::with_url(format!("http://127.0.0.1:{}", port))
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn unreachable(&self) -> LocalAIError {
        LocalAIError::Unreachable(self.base_url.clone())
    }

    /// `Ok` once the server has loaded its model and accepts requests.
    pub async fn check_health(&self) -> Result<(), LocalAIError> {
        let response = self
            .http
            .get(format!("{}/health", self.base_url))
            .timeout(HEALTH_TIMEOUT)
            .send()
            .await
            .map_err(|e| {
                if e.is_connect() || e.is_timeout() {
                    self.unreachable()
                } else {
                    LocalAIError::Http(e)
                }
            })?;

        // llama-server answers 503 while the model is still loading.
        if response.status().is_success() {
            Ok(())
        } else {
            Err(self.unreachable())
        }
    }

    /// Run one non-streaming chat turn and return the assistant's reply.
    pub async fn complete(&self, system: Option<&str>, user: &str) -> Result<String, LocalAIError> {
        let messages = system
            .map(|content| Message {
                role: "system",
                content,
            })
            .into_iter()
            .chain(std::iter::once(Message {
                role: "user",
                content: user,
            }))
            .collect();

        let request = ChatRequest {
            messages,
            temperature: 0.7,
            max_tokens: 1024,
            stream: false,
        };

        let response = self
            .http
            .post(format!("{}/v1/chat/completions", self.base_url))
            .json(&request)
            .send()
            .await
            .map_err(|e| {
                if e.is_connect() {
                    self.unreachable()
                } else {
                    LocalAIError::Http(e)
                }
            })?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(LocalAIError::Completion(format!("{}: {}", status, body)));
        }

        let reply: ChatResponse = response.json().await?;
        reply
            .choices
            .into_iter()
            .next()
            .map(|choice| choice.message.content)
            .ok_or_else(|| LocalAIError::Completion("response had no choices".to_string()))
    }
}

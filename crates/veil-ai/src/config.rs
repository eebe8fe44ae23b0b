//! AI service configuration.

use std::fmt;
use std::str::FromStr;
use std::time::Duration;

use crate::fallback::DEFAULT_FALLBACK_URL;

/// How local sessions are managed across prompts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SessionStrategy {
    /// One session, created by `initialize` and reused for every prompt.
    #[default]
    Persistent,
    /// Check availability, then create, prompt and destroy a fresh session on every prompt.
    PerCall,
}

impl FromStr for SessionStrategy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "persistent" => Ok(SessionStrategy::Persistent),
            "per-call" | "per_call" | "percall" => Ok(SessionStrategy::PerCall),
            other => Err(format!("unknown session strategy: {}", other)),
        }
    }
}

impl fmt::Display for SessionStrategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SessionStrategy::Persistent => write!(f, "persistent"),
            SessionStrategy::PerCall => write!(f, "per-call"),
        }
    }
}

/// Configuration for the AI service.
#[derive(Debug, Clone)]
pub struct AIConfig {
    /// Remote endpoint used when local inference is unavailable or fails
    pub fallback_url: String,
    /// Session management strategy
    pub strategy: SessionStrategy,
    /// Timeout for the fallback request (none by default)
    pub fallback_timeout: Option<Duration>,
    /// Port for the local llama-server
    pub local_port: u16,
    /// Whether the local model may be downloaded on first use
    pub allow_download: bool,
}

impl Default for AIConfig {
    fn default() -> Self {
        Self {
            fallback_url: DEFAULT_FALLBACK_URL.to_string(),
            strategy: SessionStrategy::Persistent,
            fallback_timeout: None,
            local_port: veil_local::DEFAULT_PORT,
            allow_download: true,
        }
    }
}

impl AIConfig {
    /// Create config from environment variables.
    pub fn from_env() -> Self {
        Self::from_vars(|key| std::env::var(key).ok())
    }

    /// Create config from any key lookup. Unparseable values keep defaults.
    pub fn from_vars(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let defaults = Self::default();

        let fallback_url = lookup("VEIL_FALLBACK_URL").unwrap_or(defaults.fallback_url);

        let strategy = lookup("VEIL_SESSION_STRATEGY")
            .and_then(|v| v.parse().ok())
            .unwrap_or(defaults.strategy);

        let fallback_timeout = lookup("VEIL_FALLBACK_TIMEOUT_SECS")
            .and_then(|v| v.parse().ok())
            .map(Duration::from_secs);

        let local_port = lookup("VEIL_LOCAL_PORT")
            .and_then(|v| v.parse().ok())
            .unwrap_or(defaults.local_port);

        let allow_download = lookup("VEIL_ALLOW_DOWNLOAD")
            .map(|v| v == "1" || v.to_lowercase() == "true")
            .unwrap_or(defaults.allow_download);

        Self {
            fallback_url,
            strategy,
            fallback_timeout,
            local_port,
            allow_download,
        }
    }

    /// Create a builder for configuration.
    pub fn builder() -> AIConfigBuilder {
        AIConfigBuilder::default()
    }
}

/// Builder for AI configuration.
#[derive(Debug, Default)]
pub struct AIConfigBuilder {
    config: AIConfig,
}

impl AIConfigBuilder {
    pub fn fallback_url(mut self, url: impl Into<String>) -> Self {
        self.config.fallback_url = url.into();
        self
    }

    pub fn strategy(mut self, strategy: SessionStrategy) -> Self {
        self.config.strategy = strategy;
        self
    }

    pub fn fallback_timeout(mut self, timeout: Duration) -> Self {
        self.config.fallback_timeout = Some(timeout);
        self
    }

    pub fn local_port(mut self, port: u16) -> Self {
        self.config.local_port = port;
        self
    }

    pub fn allow_download(mut self, allow: bool) -> Self {
        self.config.allow_download = allow;
        self
    }

    pub fn build(self) -> AIConfig {
        self.config
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    #[test]
    fn test_defaults() {
        let config = AIConfig::default();
        assert_eq!(config.fallback_url, DEFAULT_FALLBACK_URL);
        assert_eq!(config.strategy, SessionStrategy::Persistent);
        assert!(config.fallback_timeout.is_none());
        assert!(config.allow_download);
    }

    #[test]
    fn test_from_vars() {
        let vars: HashMap<&str, &str> = [
            ("VEIL_FALLBACK_URL", "https://example.com/api/ai/fallback"),
            ("VEIL_SESSION_STRATEGY", "per-call"),
            ("VEIL_FALLBACK_TIMEOUT_SECS", "30"),
            ("VEIL_LOCAL_PORT", "not-a-port"),
            ("VEIL_ALLOW_DOWNLOAD", "false"),
        ]
        .into_iter()
        .collect();

        let config = AIConfig::from_vars(|key| vars.get(key).map(|v| v.to_string()));
        assert_eq!(config.fallback_url, "https://example.com/api/ai/fallback");
        assert_eq!(config.strategy, SessionStrategy::PerCall);
        assert_eq!(config.fallback_timeout, Some(Duration::from_secs(30)));
        assert_eq!(config.local_port, veil_local::DEFAULT_PORT);
        assert!(!config.allow_download);
    }

    #[test]
    fn test_builder_pattern() {
        let config = AIConfig::builder()
            .fallback_url("http://localhost:3000/api/ai/fallback")
            .strategy(SessionStrategy::PerCall)
            .local_port(12000)
            .build();
        assert_eq!(config.fallback_url, "http://localhost:3000/api/ai/fallback");
        assert_eq!(config.strategy, SessionStrategy::PerCall);
        assert_eq!(config.local_port, 12000);
    }

    #[test]
    fn test_strategy_parse() {
        assert_eq!(
            "Persistent".parse::<SessionStrategy>(),
            Ok(SessionStrategy::Persistent)
        );
        assert_eq!(
            "per_call".parse::<SessionStrategy>(),
            Ok(SessionStrategy::PerCall)
        );
        assert!("sometimes".parse::<SessionStrategy>().is_err());
        assert_eq!(SessionStrategy::PerCall.to_string(), "per-call");
    }
}

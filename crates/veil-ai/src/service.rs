//! AI Service - lifecycle of the local model and prompt dispatch.

use std::sync::Arc;
use thiserror::Error;
use tracing::{debug, info, warn};

use crate::config::{AIConfig, SessionStrategy};
use crate::fallback::{FallbackError, FallbackTransport, HttpFallback};
use crate::status::Status;
use veil_local::{
    Availability, DownloadProgress, LocalAIError, ModelService, ProgressMonitor, Session,
};
use veil_redact::Redactor;

/// Receives download progress as a rounded percentage.
pub type ProgressCallback<'a> = dyn Fn(u8) + Send + Sync + 'a;

/// Errors surfaced to callers of [`AIService`].
#[derive(Debug, Error)]
pub enum AIError {
    #[error("on-device AI is not supported on this host")]
    Capability,
    #[error("failed to query local model availability: {0}")]
    Availability(#[source] LocalAIError),
    #[error("failed to create local session: {0}")]
    SessionCreation(#[source] LocalAIError),
    #[error("fallback failed: {0}")]
    Fallback(#[from] FallbackError),
}

/// Why the local path was skipped. Always recovered by falling back.
#[derive(Debug, Error)]
enum LocalFailure {
    #[error("local model not ready (status: {0})")]
    NotReady(Status),
    #[error("no on-device model service")]
    NoCapability,
    #[error("local model unavailable")]
    Unavailable,
    #[error("local inference failed: {0}")]
    Inference(#[from] LocalAIError),
}

/// Local-first inference with PII redaction and remote fallback.
///
/// ```text
/// prompt(text) -> redact -> local session ──ok──> result
///                               │
///                             error
///                               └──> fallback endpoint ──> result | AIError
/// ```
pub struct AIService {
    config: AIConfig,
    host: Option<Arc<dyn ModelService>>,
    fallback: Box<dyn FallbackTransport>,
    redactor: Redactor,
    status: Status,
    session: Option<Box<dyn Session>>,
}

impl AIService {
    /// Create a service that falls back over HTTP to `config.fallback_url`.
    ///
    /// `host` is the on-device model service, or `None` when the host has
    /// no local inference capability.
    pub fn new(config: AIConfig, host: Option<Arc<dyn ModelService>>) -> Result<Self, AIError> {
        let fallback = HttpFallback::with_timeout(&config.fallback_url, config.fallback_timeout)?;
        Ok(Self::with_transport(config, host, Box::new(fallback)))
    }

    /// Create a service with a custom fallback transport.
    pub fn with_transport(
        config: AIConfig,
        host: Option<Arc<dyn ModelService>>,
        fallback: Box<dyn FallbackTransport>,
    ) -> Self {
        Self {
            config,
            host,
            fallback,
            redactor: Redactor::new(),
            status: Status::Idle,
            session: None,
        }
    }

    /// Current lifecycle status.
    pub fn status(&self) -> Status {
        self.status
    }

    pub fn config(&self) -> &AIConfig {
        &self.config
    }

    /// Whether a persistent local session is held.
    pub fn has_session(&self) -> bool {
        self.session.is_some()
    }

    /// Check the host and prepare a persistent local session.
    ///
    /// Only a missing on-device service is a hard failure. An unavailable
    /// model leaves the status `Unsupported` and returns `Ok`. Calling this
    /// again once `Ready` does nothing.
    pub async fn initialize(
        &mut self,
        on_progress: Option<&ProgressCallback<'_>>,
    ) -> Result<(), AIError> {
        if self.status.is_ready() && self.session.is_some() {
            debug!("Local model already initialized");
            return Ok(());
        }

        if self.status == Status::Downloading {
            warn!("Previous initialization was abandoned mid-download, probing again");
            self.set_status(Status::Idle);
        }

        let Some(host) = self.host.clone() else {
            self.set_status(Status::Unsupported);
            return Err(AIError::Capability);
        };

        let availability = match host.availability().await {
            Ok(availability) => availability,
            Err(e) => {
                self.set_status(Status::Unsupported);
                return Err(AIError::Availability(e));
            }
        };

        info!("{} reports availability: {:?}", host.name(), availability);

        let created = match availability {
            Availability::No => {
                self.set_status(Status::Unsupported);
                return Ok(());
            }
            Availability::AfterDownload => {
                self.set_status(Status::Downloading);
                let monitor: &ProgressMonitor<'_> = &|progress: DownloadProgress| {
                    let percent = progress.percent();
                    debug!(
                        "Download progress: {}% ({}/{} bytes)",
                        percent, progress.loaded, progress.total
                    );
                    if let Some(on_progress) = on_progress {
                        on_progress(percent);
                    }
                };
                host.create(Some(monitor)).await
            }
            Availability::Readily => host.create(None).await,
        };

        match created {
            Ok(session) => {
                if let Some(mut old) = self.session.replace(session) {
                    old.destroy();
                }
                self.set_status(Status::Ready);
                info!("Local model ready");
                Ok(())
            }
            Err(e) => {
                self.set_status(Status::Unsupported);
                Err(AIError::SessionCreation(e))
            }
        }
    }

    /// Answer `user_input`, locally if possible and remotely otherwise.
    ///
    /// The input is redacted before it reaches either path. Local failures
    /// are logged and swallowed; only a failed fallback is returned as an
    /// error.
    pub async fn prompt(&self, user_input: &str) -> Result<String, AIError> {
        let (safe_input, report) = self.redactor.redact_with_report(user_input);
        if !report.is_clean() {
            debug!(
                emails = report.emails,
                phones = report.phones,
                ssns = report.ssns,
                "Redacted PII from prompt"
            );
        }

        let local = match self.config.strategy {
            SessionStrategy::Persistent => self.prompt_session(&safe_input).await,
            SessionStrategy::PerCall => self.prompt_per_call(&safe_input).await,
        };

        match local {
            Ok(text) => return Ok(text),
            Err(e) => warn!("Local AI failed or unavailable, falling back to server: {}", e),
        }

        Ok(self.fallback.complete(&safe_input).await?)
    }

    /// Release the persistent session, if any.
    pub fn shutdown(&mut self) {
        if let Some(mut session) = self.session.take() {
            session.destroy();
            info!("Local session released");
        }
        if self.status.is_ready() {
            self.set_status(Status::Idle);
        }
    }

    async fn prompt_session(&self, safe_input: &str) -> Result<String, LocalFailure> {
        if !self.status.is_ready() {
            return Err(LocalFailure::NotReady(self.status));
        }
        let session = self
            .session
            .as_ref()
            .ok_or(LocalFailure::NotReady(self.status))?;

        Ok(session.prompt(safe_input).await?)
    }

    async fn prompt_per_call(&self, safe_input: &str) -> Result<String, LocalFailure> {
        let host = self.host.as_ref().ok_or(LocalFailure::NoCapability)?;

        if host.availability().await? == Availability::No {
            return Err(LocalFailure::Unavailable);
        }

        let mut session = host.create(None).await?;
        let result = session.prompt(safe_input).await;
        session.destroy();

        Ok(result?)
    }

    fn set_status(&mut self, next: Status) {
        debug_assert!(
            self.status.can_transition_to(next),
            "illegal status transition {} -> {}",
            self.status,
            next
        );
        debug!("Status {} -> {}", self.status, next);
        self.status = next;
    }
}

impl Drop for AIService {
    fn drop(&mut self) {
        if let Some(mut session) = self.session.take() {
            session.destroy();
        }
    }
}

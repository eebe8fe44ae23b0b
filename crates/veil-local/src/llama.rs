//! [`ModelService`] backed by a managed llama-server process.

use async_trait::async_trait;
use std::path::PathBuf;
use std::time::Duration;
use tracing::{debug, info, warn};

use crate::client::LlamaCppClient;
use crate::error::LocalAIError;
use crate::model::{ModelInfo, ModelManager};
use crate::paths::llama_server_path;
use crate::server::LlamaCppServer;
use crate::service::{Availability, ModelService, ProgressMonitor, Session};
use crate::DEFAULT_PORT;

/// On-device model service that runs GGUF models through llama-server.
#[derive(Debug, Clone)]
pub struct LlamaCppService {
    models: ModelManager,
    model: ModelInfo,
    server_binary: PathBuf,
    port: u16,
    startup_timeout: Duration,
    allow_download: bool,
    system_prompt: Option<String>,
}

impl LlamaCppService {
    /// Create a service for `model` using the default paths.
    pub fn new(model: ModelInfo) -> Self {
        Self {
            models: ModelManager::new(),
            model,
            server_binary: llama_server_path(),
            port: DEFAULT_PORT,
            startup_timeout: Duration::from_secs(60),
            allow_download: true,
            system_prompt: None,
        }
    }

    /// Look for a llama-server binary on this host.
    ///
    /// Returns `None` when the binary is missing, meaning this machine has no
    /// on-device inference capability at all.
    pub fn detect() -> Option<Self> {
        let service = Self::new(ModelManager::default_model());
        if service.server_binary.exists() {
            Some(service)
        } else {
            debug!(
                "No llama-server binary at {}",
                service.server_binary.display()
            );
            None
        }
    }

    pub fn with_models(mut self, models: ModelManager) -> Self {
        self.models = models;
        self
    }

    pub fn with_server_binary(mut self, binary: impl Into<PathBuf>) -> Self {
        self.server_binary = binary.into();
        self
    }

    pub fn with_port(mut self, port: u16) -> Self {
        self.port = port;
        self
    }

    pub fn with_startup_timeout(mut self, timeout: Duration) -> Self {
        self.startup_timeout = timeout;
        self
    }

    /// Allow or forbid fetching the model when it is not installed.
    pub fn allow_download(mut self, allow: bool) -> Self {
        self.allow_download = allow;
        self
    }

    pub fn with_system_prompt(mut self, prompt: impl Into<String>) -> Self {
        self.system_prompt = Some(prompt.into());
        self
    }

    /// The model this service loads.
    pub fn model(&self) -> &ModelInfo {
        &self.model
    }

    pub fn port(&self) -> u16 {
        self.port
    }

    fn installed(&self) -> bool {
        self.models.is_installed(&self.model.filename)
    }

    fn can_download(&self) -> bool {
        self.allow_download && self.model.is_downloadable()
    }
}

#[async_trait]
impl ModelService for LlamaCppService {
    fn name(&self) -> &str {
        "llama.cpp"
    }

    async fn availability(&self) -> Result<Availability, LocalAIError> {
        let availability = if self.installed() {
            Availability::Readily
        } else if self.can_download() {
            Availability::AfterDownload
        } else {
            Availability::No
        };
        debug!("Model '{}' availability: {:?}", self.model.name, availability);
        Ok(availability)
    }

    async fn create(
        &self,
        monitor: Option<&ProgressMonitor<'_>>,
    ) -> Result<Box<dyn Session>, LocalAIError> {
        if !self.installed() {
            if !self.can_download() {
                return Err(LocalAIError::ModelNotFound(self.model.name.clone()));
            }
            self.models.download(&self.model, monitor).await?;
        }

        let client = LlamaCppClient::with_port(self.port);
        if client.check_health().await.is_ok() {
            info!("Attaching to llama-server already running on port {}", self.port);
            return Ok(Box::new(LlamaSession::new(
                client,
                None,
                self.system_prompt.clone(),
            )));
        }

        let model_path = self.models.model_path(&self.model.filename);
        let mut server = LlamaCppServer::spawn(&self.server_binary, &model_path, self.port)?;
        if let Err(e) = server.wait_ready(self.startup_timeout).await {
            warn!("llama-server failed to start: {}", e);
            server.stop();
            return Err(e);
        }

        Ok(Box::new(LlamaSession::new(
            server.client(),
            Some(server),
            self.system_prompt.clone(),
        )))
    }
}

/// A chat session against llama-server.
///
/// Owns the server process when it started one; destroying the session stops
/// that process.
#[derive(Debug)]
pub struct LlamaSession {
    client: LlamaCppClient,
    server: Option<LlamaCppServer>,
    system_prompt: Option<String>,
    destroyed: bool,
}

impl LlamaSession {
    fn new(
        client: LlamaCppClient,
        server: Option<LlamaCppServer>,
        system_prompt: Option<String>,
    ) -> Self {
        Self {
            client,
            server,
            system_prompt,
            destroyed: false,
        }
    }

    /// Whether this session started (and owns) its server process.
    pub fn owns_server(&self) -> bool {
        self.server.is_some()
    }
}

#[async_trait]
impl Session for LlamaSession {
    async fn prompt(&self, text: &str) -> Result<String, LocalAIError> {
        if self.destroyed {
            return Err(LocalAIError::SessionDestroyed);
        }
        self.client
            .complete(self.system_prompt.as_deref(), text)
            .await
    }

    fn destroy(&mut self) {
        if let Some(mut server) = self.server.take() {
            server.stop();
        }
        self.destroyed = true;
    }
}

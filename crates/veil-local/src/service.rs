//! Host-side contract for on-device inference.

use async_trait::async_trait;

use crate::error::LocalAIError;

/// Host-reported readiness of the on-device model.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Availability {
    /// No local model can be used.
    No,
    /// A model can be used once it has been downloaded.
    AfterDownload,
    /// A model is ready to load.
    Readily,
}

/// A single download progress event, in bytes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DownloadProgress {
    pub loaded: u64,
    pub total: u64,
}

impl DownloadProgress {
    pub fn new(loaded: u64, total: u64) -> Self {
        Self { loaded, total }
    }

    /// Rounded percentage in `0..=100`. An unknown (zero) total reports 0.
    pub fn percent(&self) -> u8 {
        if self.total == 0 {
            return 0;
        }
        let ratio = self.loaded as f64 / self.total as f64;
        (ratio * 100.0).round().clamp(0.0, 100.0) as u8
    }
}

/// Receives download progress while a session is being created.
///
/// The lifetime lets callers pass closures that borrow local state.
pub type ProgressMonitor<'a> = dyn Fn(DownloadProgress) + Send + Sync + 'a;

/// An initialized on-device inference context.
///
/// Owned by whoever created it. Call [`Session::destroy`] to release the
/// underlying resources; a destroyed session rejects further prompts.
#[async_trait]
pub trait Session: Send + Sync {
    /// Run a single prompt to completion.
    async fn prompt(&self, text: &str) -> Result<String, LocalAIError>;

    /// Release the resources held by this session.
    fn destroy(&mut self);
}

/// The host's on-device model service.
#[async_trait]
pub trait ModelService: Send + Sync {
    /// Name for logging/display.
    fn name(&self) -> &str;

    /// Query whether a local model can be used.
    async fn availability(&self) -> Result<Availability, LocalAIError>;

    /// Create a session, downloading the model first if needed.
    ///
    /// When a download happens, `monitor` receives every progress event in
    /// the order the host produces them.
    async fn create(
        &self,
        monitor: Option<&ProgressMonitor<'_>>,
    ) -> Result<Box<dyn Session>, LocalAIError>;
}

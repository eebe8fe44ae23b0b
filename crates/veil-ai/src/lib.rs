//! # Veil AI
//!
//! Local-first inference that never sends raw PII anywhere.
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────────┐     ┌─────────────────┐     ┌─────────────────┐
//! │   User Input    │ --> │    Redactor     │ --> │  Local Session  │
//! └─────────────────┘     └─────────────────┘     └─────────────────┘
//!                                                          │ error / not ready
//!                                                  ┌───────┴────────┐
//!                                                  │ Remote Fallback │
//!                                                  └────────────────┘
//! ```
//!
//! ## Backends
//!
//! - **Local** (primary) - any [`ModelService`]; [`LlamaCppService`] ships
//!   with Veil
//! - **Remote** (fallback) - `POST {"prompt": ...}` to a JSON endpoint
//!
//! ## Usage
//!
//! ```ignore
//! use std::sync::Arc;
//! use veil_ai::{AIConfig, AIService, LlamaCppService};
//!
//! let host = LlamaCppService::detect().map(|s| Arc::new(s) as _);
//! let mut ai = AIService::new(AIConfig::from_env(), host)?;
//!
//! ai.initialize(Some(&|percent| eprintln!("{percent}%"))).await.ok();
//! let answer = ai.prompt("Summarize my inbox, I'm at a@b.com").await?;
//! ```

mod config;
mod fallback;
mod service;
mod status;

pub use config::{AIConfig, AIConfigBuilder, SessionStrategy};
pub use fallback::{
    FallbackError, FallbackPayload, FallbackTransport, HttpFallback, DEFAULT_FALLBACK_URL,
};
pub use service::{AIError, AIService, ProgressCallback};
pub use status::Status;

// Re-export local AI types
pub use veil_local::{
    paths as local_ai_paths, Availability, DownloadProgress, LlamaCppService, LocalAIError,
    ModelInfo, ModelManager, ModelService, ProgressMonitor, Session,
    DEFAULT_PORT as DEFAULT_LOCAL_AI_PORT,
};

// Re-export redaction for convenience
pub use veil_redact::{redact, PiiKind, RedactionReport, Redactor};

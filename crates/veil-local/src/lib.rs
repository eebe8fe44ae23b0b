//! On-device model service for Veil.
//!
//! [`ModelService`] and [`Session`] describe what the host offers for local
//! inference: an availability check, session creation with optional download
//! progress, prompting, and explicit release. [`LlamaCppService`] is the
//! bundled host, managing its own llama-server process and model downloads.

mod client;
mod error;
mod llama;
mod model;
pub mod paths;
mod server;
mod service;

pub use client::LlamaCppClient;
pub use error::LocalAIError;
pub use llama::{LlamaCppService, LlamaSession};
pub use model::{ModelInfo, ModelManager};
pub use server::LlamaCppServer;
pub use service::{Availability, DownloadProgress, ModelService, ProgressMonitor, Session};

/// Default port for the local llama-server instance.
pub const DEFAULT_PORT: u16 = 11435;

/// Default model name.
pub const DEFAULT_MODEL_NAME: &str = "qwen2.5-0.5b-instruct";

/// Default model filename.
pub const DEFAULT_MODEL_FILENAME: &str = "qwen2.5-0.5b-instruct-q4_k_m.gguf";

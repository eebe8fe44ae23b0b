//! Failures of the on-device path.
//!
//! None of these reach the caller of a prompt: the dispatcher logs them and
//! answers through the fallback endpoint instead.

use std::path::PathBuf;
use std::time::Duration;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum LocalAIError {
    // llama-server HTTP API
    #[error("request to llama-server failed: {0}")]
    Http(#[from] reqwest::Error),
    #[error("llama-server is not reachable at {0}")]
    Unreachable(String),
    #[error("llama-server rejected the completion: {0}")]
    Completion(String),

    // llama-server process
    #[error("no llama-server binary at {}", .0.display())]
    MissingBinary(PathBuf),
    #[error("could not launch llama-server: {0}")]
    Spawn(#[source] std::io::Error),
    #[error("llama-server exited while loading the model")]
    Exited,
    #[error("llama-server was not ready after {0:?}")]
    StartupTimeout(Duration),

    // Model files
    #[error("model '{0}' is not installed and cannot be downloaded (try `veil model pull`)")]
    ModelNotFound(String),
    #[error("model download failed: {0}")]
    DownloadFailed(String),
    #[error("downloaded model checksum is {actual}, expected {expected}")]
    ChecksumMismatch { expected: String, actual: String },
    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error("session has been destroyed")]
    SessionDestroyed,
}

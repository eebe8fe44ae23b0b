//! Installed GGUF models and fetching new ones.

use futures_util::StreamExt;
use sha2::{Digest, Sha256};
use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

use crate::error::LocalAIError;
use crate::paths;
use crate::service::{DownloadProgress, ProgressMonitor};
use crate::{DEFAULT_MODEL_FILENAME, DEFAULT_MODEL_NAME};

const MODEL_EXTENSION: &str = "gguf";

/// A model the local service can load.
#[derive(Debug, Clone)]
pub struct ModelInfo {
    pub name: String,
    /// File name under the models directory.
    pub filename: String,
    /// Where to fetch the file from. `None` means install-from-file only.
    pub url: Option<String>,
    /// Hex SHA-256 the downloaded file must match, if known.
    pub sha256: Option<String>,
    /// Expected size, used for progress when the server sends no length.
    pub size_bytes: Option<u64>,
}

impl ModelInfo {
    pub fn is_downloadable(&self) -> bool {
        self.url.is_some()
    }
}

/// The models directory: what is installed, and how to get more.
#[derive(Debug, Clone)]
pub struct ModelManager {
    http: reqwest::Client,
    models_dir: PathBuf,
}

impl ModelManager {
    pub fn new() -> Self {
        Self::with_dir(paths::models_dir())
    }

    pub fn with_dir(models_dir: impl Into<PathBuf>) -> Self {
        Self {
            http: reqwest::Client::new(),
            models_dir: models_dir.into(),
        }
    }

    pub fn models_dir(&self) -> &Path {
        &self.models_dir
    }

    /// Qwen2.5 0.5B Instruct, 4-bit. Small enough to fetch on first use.
    pub fn default_model() -> ModelInfo {
        ModelInfo {
            name: DEFAULT_MODEL_NAME.to_string(),
            filename: DEFAULT_MODEL_FILENAME.to_string(),
            url: Some(format!(
                "https://huggingface.co/Qwen/Qwen2.5-0.5B-Instruct-GGUF/resolve/main/{}",
                DEFAULT_MODEL_FILENAME
            )),
            sha256: None,
            size_bytes: None,
        }
    }

    pub fn model_path(&self, filename: &str) -> PathBuf {
        self.models_dir.join(filename)
    }

    pub fn is_installed(&self, filename: &str) -> bool {
        self.model_path(filename).is_file()
    }

    /// Names (without extension) of the installed models, sorted.
    pub fn list_installed(&self) -> Result<Vec<String>, LocalAIError> {
        let entries = match fs::read_dir(&self.models_dir) {
            Ok(entries) => entries,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => return Err(e.into()),
        };

        let mut names = Vec::new();
        for entry in entries {
            let path = entry?.path();
            if path.extension().map_or(true, |ext| ext != MODEL_EXTENSION) {
                continue;
            }
            if let Some(stem) = path.file_stem().and_then(|s| s.to_str()) {
                names.push(stem.to_string());
            }
        }
        names.sort();
        Ok(names)
    }

    /// Copy a model file the user already has into the models directory.
    pub fn install_from_path(&self, source: &Path) -> Result<PathBuf, LocalAIError> {
        let filename = source
            .file_name()
            .and_then(|name| name.to_str())
            .ok_or_else(|| LocalAIError::ModelNotFound(source.display().to_string()))?;

        fs::create_dir_all(&self.models_dir)?;
        let dest = self.model_path(filename);
        if dest.as_path() != source {
            info!("Installing {} as {}", source.display(), dest.display());
            fs::copy(source, &dest)?;
        }
        Ok(dest)
    }

    pub fn remove(&self, filename: &str) -> Result<(), LocalAIError> {
        match fs::remove_file(self.model_path(filename)) {
            Ok(()) => {
                info!("Removed model {}", filename);
                Ok(())
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e.into()),
        }
    }

    /// Fetch `model` into the models directory.
    ///
    /// `monitor` sees one event per received chunk and a final event with
    /// `loaded == total`. Bytes land in `<file>.part`, which is renamed only
    /// after the checksum passes and removed on any failure, so a model is
    /// never half-installed.
    pub async fn download(
        &self,
        model: &ModelInfo,
        monitor: Option<&ProgressMonitor<'_>>,
    ) -> Result<PathBuf, LocalAIError> {
        let url = model
            .url
            .as_deref()
            .ok_or_else(|| LocalAIError::ModelNotFound(model.name.clone()))?;

        fs::create_dir_all(&self.models_dir)?;
        let dest = self.model_path(&model.filename);
        let part = self.model_path(&format!("{}.part", model.filename));

        info!("Downloading '{}' from {}", model.name, url);
        if let Err(e) = self.fetch_into(url, model, &part, monitor).await {
            if let Err(cleanup) = fs::remove_file(&part) {
                if cleanup.kind() != std::io::ErrorKind::NotFound {
                    warn!("Could not remove {}: {}", part.display(), cleanup);
                }
            }
            return Err(e);
        }

        fs::rename(&part, &dest)?;
        info!("Model '{}' installed at {}", model.name, dest.display());
        Ok(dest)
    }

    async fn fetch_into(
        &self,
        url: &str,
        model: &ModelInfo,
        part: &Path,
        monitor: Option<&ProgressMonitor<'_>>,
    ) -> Result<(), LocalAIError> {
        let response = self
            .http
            .get(url)
            .send()
            .await
            .and_then(|response| response.error_for_status())
            .map_err(|e| LocalAIError::DownloadFailed(e.to_string()))?;

        let total = response.content_length().or(model.size_bytes).unwrap_or(0);
        let report = |loaded: u64, total: u64| {
            if let Some(monitor) = monitor {
                monitor(DownloadProgress::new(loaded, total));
            }
        };

        let mut file = fs::File::create(part)?;
        let mut hasher = Sha256::new();
        let mut loaded = 0u64;
        let mut chunks = response.bytes_stream();

        while let Some(chunk) = chunks.next().await {
            let chunk = chunk.map_err(|e| LocalAIError::DownloadFailed(e.to_string()))?;
            file.write_all(&chunk)?;
            hasher.update(&chunk);
            loaded += chunk.len() as u64;
            if loaded < total {
                report(loaded, total);
            }
        }
        file.sync_all()?;
        report(loaded, loaded);

        if let Some(expected) = &model.sha256 {
            let actual = hex::encode(hasher.finalize());
            if !actual.eq_ignore_ascii_case(expected) {
                return Err(LocalAIError::ChecksumMismatch {
                    expected: expected.clone(),
                    actual,
                });
            }
            debug!("Checksum verified for '{}'", model.name);
        }
        Ok(())
    }
}

impl Default for ModelManager {
    fn default() -> Self {
        Self::new()
    }
}

//! A llama-server child process owned by a local session.

use std::path::Path;
use std::process::{Child, Command, Stdio};
use std::time::{Duration, Instant};
use tracing::{debug, info, warn};

use crate::client::LlamaCppClient;
use crate::error::LocalAIError;

const CONTEXT_SIZE: u32 = 4096;
const READY_POLL: Duration = Duration::from_millis(500);
/// How long a stopped server gets to exit on SIGTERM before it is killed.
const SHUTDOWN_GRACE: Duration = Duration::from_secs(2);

/// A running llama-server. Stopped on [`LlamaCppServer::stop`] or drop.
#[derive(Debug)]
pub struct LlamaCppServer {
    child: Option<Child>,
    port: u16,
}

impl LlamaCppServer {
    /// Launch `binary` serving `model` on `127.0.0.1:port`.
    ///
    /// The server is not usable until [`wait_ready`](Self::wait_ready)
    /// returns `Ok`.
    pub fn spawn(binary: &Path, model: &Path, port: u16) -> Result<Self, LocalAIError> {
        if !binary.exists() {
            return Err(LocalAIError::MissingBinary(binary.to_path_buf()));
        }
        if !model.exists() {
            return Err(LocalAIError::ModelNotFound(model.display().to_string()));
        }

        info!("Starting llama-server on port {} with {}", port, model.display());

        let child = Command::new(binary)
            .arg("--model")
            .arg(model)
            .args(["--host", "127.0.0.1"])
            .arg("--port")
            .arg(port.to_string())
            .arg("--ctx-size")
            .arg(CONTEXT_SIZE.to_string())
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .spawn()
            .map_err(LocalAIError::Spawn)?;

        debug!("llama-server pid {}", child.id());
        Ok(Self {
            child: Some(child),
            port,
        })
    }

    pub fn port(&self) -> u16 {
        self.port
    }

    pub fn client(&self) -> LlamaCppClient {
        LlamaCppClient::with_port(self.port)
    }

    /// Poll `/health` until the model is loaded.
    ///
    /// Fails with [`LocalAIError::Exited`] as soon as the process dies, and
    /// with [`LocalAIError::StartupTimeout`] once `timeout` has passed.
    pub async fn wait_ready(&mut self, timeout: Duration) -> Result<(), LocalAIError> {
        let client = self.client();
        let deadline = Instant::now() + timeout;

        loop {
            if client.check_health().await.is_ok() {
                info!("llama-server ready on port {}", self.port);
                return Ok(());
            }
            if !self.is_running() {
                return Err(LocalAIError::Exited);
            }
            if Instant::now() >= deadline {
                return Err(LocalAIError::StartupTimeout(timeout));
            }
            tokio::time::sleep(READY_POLL).await;
        }
    }

    /// Whether the child process is still alive.
    pub fn is_running(&mut self) -> bool {
        match self.child.as_mut().map(Child::try_wait) {
            Some(Ok(None)) => true,
            Some(Ok(Some(status))) => {
                debug!("llama-server exited with {}", status);
                self.child = None;
                false
            }
            Some(Err(e)) => {
                warn!("Could not query llama-server: {}", e);
                false
            }
            None => false,
        }
    }

    /// Ask the server to exit without waiting for it.
    ///
    /// The process is reaped on a background thread, which kills it if it
    /// outlives [`SHUTDOWN_GRACE`]. Safe to call more than once.
    pub fn stop(&mut self) {
        if let Some(child) = self.child.take() {
            info!("Stopping llama-server (pid {})", child.id());
            terminate(child);
        }
    }
}

impl Drop for LlamaCppServer {
    fn drop(&mut self) {
        self.stop();
    }
}

fn terminate(child: Child) {
    // The pid belongs to a child we have not reaped yet.
    #[cfg(unix)]
    unsafe {
        libc::kill(child.id() as libc::pid_t, libc::SIGTERM);
    }
    #[cfg(not(unix))]
    let child = {
        let mut child = child;
        let _ = child.kill();
        child
    };

    let spawned = std::thread::Builder::new()
        .name("llama-server-reaper".to_string())
        .spawn(move || reap(child));
    if let Err(e) = spawned {
        warn!("Could not start reaper thread: {}", e);
    }
}

fn reap(mut child: Child) {
    let deadline = Instant::now() + SHUTDOWN_GRACE;
    loop {
        match child.try_wait() {
            Ok(Some(status)) => {
                debug!("llama-server exited with {}", status);
                return;
            }
            Ok(None) if Instant::now() < deadline => {
                std::thread::sleep(Duration::from_millis(50));
            }
            Ok(None) => {
                warn!("llama-server ignored SIGTERM, killing it");
                let _ = child.kill();
                let _ = child.wait();
                return;
            }
            Err(e) => {
                warn!("Could not wait for llama-server: {}", e);
                let _ = child.kill();
                return;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::tempdir;

    #[test]
    fn test_spawn_without_binary() {
        let dir = tempdir().unwrap();
        let model = dir.path().join("tiny.gguf");
        fs::write(&model, b"weights").unwrap();

        let result = LlamaCppServer::spawn(&dir.path().join("llama-server"), &model, 9);
        assert!(matches!(result, Err(LocalAIError::MissingBinary(_))));
    }

    #[test]
    fn test_spawn_without_model() {
        let dir = tempdir().unwrap();
        let binary = dir.path().join("llama-server");
        fs::write(&binary, b"").unwrap();

        let result = LlamaCppServer::spawn(&binary, &dir.path().join("tiny.gguf"), 9);
        assert!(matches!(result, Err(LocalAIError::ModelNotFound(_))));
    }

    #[cfg(unix)]
    fn fake_server(dir: &Path, script: &str) -> std::path::PathBuf {
        use std::os::unix::fs::PermissionsExt;

        let path = dir.join("llama-server");
        fs::write(&path, format!("#!/bin/sh\n{}\n", script)).unwrap();
        fs::set_permissions(&path, fs::Permissions::from_mode(0o755)).unwrap();
        path
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_wait_ready_reports_exit() {
        let dir = tempdir().unwrap();
        let model = dir.path().join("tiny.gguf");
        fs::write(&model, b"weights").unwrap();
        let binary = fake_server(dir.path(), "exit 1");

        // Nothing serves /health on the discard port.
        let mut server = LlamaCppServer::spawn(&binary, &model, 9).unwrap();
        let result = server.wait_ready(Duration::from_secs(30)).await;
        assert!(matches!(result, Err(LocalAIError::Exited)));
    }

    #[cfg(unix)]
    #[test]
    fn test_stop_does_not_block() {
        let dir = tempdir().unwrap();
        let model = dir.path().join("tiny.gguf");
        fs::write(&model, b"weights").unwrap();
        let binary = fake_server(dir.path(), "exec sleep 30");

        let mut server = LlamaCppServer::spawn(&binary, &model, 9).unwrap();
        assert!(server.is_running());

        let started = Instant::now();
        server.stop();
        assert!(started.elapsed() < Duration::from_millis(250));
        assert!(!server.is_running());

        // Stopping twice is a no-op.
        server.stop();
    }
}

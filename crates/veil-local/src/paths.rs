//! On-disk layout: `$VEIL_HOME` (default `~/.veil`) holding `models/` and
//! `bin/llama-server`.

use std::ffi::OsString;
use std::path::{Path, PathBuf};

const HOME_ENV: &str = "VEIL_HOME";

#[cfg(windows)]
const SERVER_BINARY: &str = "llama-server.exe";
#[cfg(not(windows))]
const SERVER_BINARY: &str = "llama-server";

fn resolve_data_dir(override_dir: Option<OsString>, home: Option<PathBuf>) -> PathBuf {
    match override_dir {
        Some(dir) if !dir.is_empty() => PathBuf::from(dir),
        _ => home.unwrap_or_else(|| PathBuf::from(".")).join(".veil"),
    }
}

/// Root of everything Veil keeps on disk.
pub fn veil_data_dir() -> PathBuf {
    resolve_data_dir(std::env::var_os(HOME_ENV), dirs::home_dir())
}

/// Where GGUF models are installed.
pub fn models_dir() -> PathBuf {
    veil_data_dir().join("models")
}

/// Where the managed llama-server binary is expected. Its presence is what
/// makes on-device inference available on this host.
pub fn llama_server_path() -> PathBuf {
    veil_data_dir().join("bin").join(SERVER_BINARY)
}

/// Create the models and bin directories.
pub fn ensure_dirs() -> std::io::Result<()> {
    std::fs::create_dir_all(models_dir())?;
    if let Some(bin) = llama_server_path().parent().map(Path::to_path_buf) {
        std::fs::create_dir_all(bin)?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_override_wins() {
        let dir = resolve_data_dir(Some("/srv/veil".into()), Some("/home/me".into()));
        assert_eq!(dir, PathBuf::from("/srv/veil"));
    }

    #[test]
    fn test_defaults_under_home() {
        let dir = resolve_data_dir(None, Some("/home/me".into()));
        assert_eq!(dir, PathBuf::from("/home/me/.veil"));

        // An empty override is treated as unset.
        let dir = resolve_data_dir(Some(OsString::new()), Some("/home/me".into()));
        assert_eq!(dir, PathBuf::from("/home/me/.veil"));
    }
}

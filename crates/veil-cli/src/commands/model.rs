//! `veil model` - manage the GGUF files the local service loads.

use std::path::Path;
use veil_ai::{local_ai_paths, DownloadProgress, ModelManager, ProgressMonitor};

use super::ProgressPrinter;

pub(crate) fn list() -> miette::Result<()> {
    let manager = ModelManager::new();
    let installed = manager.list_installed().map_err(|e| {
        miette::miette!("Could not read {}: {}", manager.models_dir().display(), e)
    })?;

    if installed.is_empty() {
        println!("No models in {}.", manager.models_dir().display());
        println!("Run `veil model pull` to fetch the default model.");
        return Ok(());
    }

    let default_stem = ModelManager::default_model()
        .filename
        .trim_end_matches(".gguf")
        .to_string();
    for name in installed {
        let tag = if name == default_stem { " (default)" } else { "" };
        println!("{}{}", name, tag);
    }
    Ok(())
}

/// Install `path`, or download the default model when no path is given.
pub(crate) async fn pull(path: Option<&Path>) -> miette::Result<()> {
    local_ai_paths::ensure_dirs()
        .map_err(|e| miette::miette!("Could not create the Veil data directory: {}", e))?;
    let manager = ModelManager::new();

    match path {
        Some(source) => install(&manager, source),
        None => download_default(&manager).await,
    }
}

fn install(manager: &ModelManager, source: &Path) -> miette::Result<()> {
    if !source.is_file() {
        return Err(miette::miette!("No such file: {}", source.display()));
    }
    if source.extension().and_then(|e| e.to_str()) != Some("gguf") {
        return Err(miette::miette!(
            "{} is not a .gguf model file",
            source.display()
        ));
    }

    let dest = manager
        .install_from_path(source)
        .map_err(|e| miette::miette!("Install failed: {}", e))?;
    println!("Installed {}", dest.display());
    Ok(())
}

async fn download_default(manager: &ModelManager) -> miette::Result<()> {
    let model = ModelManager::default_model();
    if manager.is_installed(&model.filename) {
        println!("{} is already installed.", model.name);
        return Ok(());
    }

    eprintln!("Fetching {}...", model.name);
    let printer = ProgressPrinter::new();
    let monitor: &ProgressMonitor<'_> =
        &|progress: DownloadProgress| printer.report(progress.percent());

    let dest = manager
        .download(&model, Some(monitor))
        .await
        .map_err(|e| miette::miette!("Download failed: {}", e))?;
    println!("Installed {}", dest.display());
    Ok(())
}

/// Where the local service looks for its binary and models.
pub(crate) fn info() -> miette::Result<()> {
    let manager = ModelManager::new();
    let model = ModelManager::default_model();
    let server = local_ai_paths::llama_server_path();

    println!("Data directory: {}", local_ai_paths::veil_data_dir().display());
    println!(
        "llama-server:   {} ({})",
        server.display(),
        if server.exists() { "found" } else { "missing" }
    );
    println!("Models:         {}", manager.models_dir().display());
    println!(
        "Default model:  {} ({})",
        model.filename,
        if manager.is_installed(&model.filename) {
            "installed"
        } else {
            "not installed"
        }
    );
    println!("Local port:     {}", veil_ai::DEFAULT_LOCAL_AI_PORT);
    Ok(())
}

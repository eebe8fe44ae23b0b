//! Status command - report what `prompt` would do.

use veil_ai::{AIConfig, LlamaCppService, ModelService};

pub(crate) async fn run() -> miette::Result<()> {
    let config = AIConfig::from_env();

    println!("Veil Status");
    println!("===========");
    println!();

    match LlamaCppService::detect() {
        Some(service) => {
            let service = service
                .with_port(config.local_port)
                .allow_download(config.allow_download);
            let availability = service
                .availability()
                .await
                .map_err(|e| miette::miette!("Failed to query availability: {}", e))?;

            println!("On-device AI:   {}", service.name());
            println!(
                "Model:          {} ({})",
                service.model().name,
                service.model().filename
            );
            println!("Availability:   {:?}", availability);
            println!("Local port:     {}", service.port());
        }
        None => {
            println!("On-device AI:   not supported (no llama-server binary)");
            println!(
                "  Expected at:  {}",
                veil_ai::local_ai_paths::llama_server_path().display()
            );
        }
    }

    println!();
    println!("Fallback URL:   {}", config.fallback_url);
    println!("Strategy:       {}", config.strategy);
    match config.fallback_timeout {
        Some(timeout) => println!("Timeout:        {}s", timeout.as_secs()),
        None => println!("Timeout:        none"),
    }

    Ok(())
}

//! Prompt command - answer locally when possible, remotely otherwise.

use std::sync::Arc;
use tracing::warn;
use veil_ai::{
    AIConfig, AIService, LlamaCppService, ModelService, ProgressCallback, SessionStrategy,
};

use super::{read_input, ProgressPrinter};

pub(crate) async fn run(
    text: Option<&str>,
    per_call: bool,
    remote_only: bool,
) -> miette::Result<()> {
    let input = read_input(text)?;

    let mut config = AIConfig::from_env();
    if per_call {
        config.strategy = SessionStrategy::PerCall;
    }

    let host: Option<Arc<dyn ModelService>> = if remote_only {
        None
    } else {
        LlamaCppService::detect().map(|service| {
            Arc::new(
                service
                    .with_port(config.local_port)
                    .allow_download(config.allow_download),
            ) as Arc<dyn ModelService>
        })
    };
    let has_host = host.is_some();
    let strategy = config.strategy;

    let mut ai = AIService::new(config, host)
        .map_err(|e| miette::miette!("Failed to set up AI service: {}", e))?;

    if has_host && strategy == SessionStrategy::Persistent {
        let printer = ProgressPrinter::new();
        let on_progress: &ProgressCallback<'_> = &|percent: u8| printer.report(percent);
        if let Err(e) = ai.initialize(Some(on_progress)).await {
            warn!("Local AI unavailable: {}", e);
        }
    }

    let result = ai.prompt(&input).await;
    ai.shutdown();

    let answer = result.map_err(|e| miette::miette!("Prompt failed: {}", e))?;
    println!("{}", answer);

    Ok(())
}

//! Veil CLI - local-first prompting with PII redaction and remote fallback.

use clap::{Parser, Subcommand};
use std::path::PathBuf;

mod commands;

/// Veil - prompt a local model, fall back to a server, never leak PII
#[derive(Parser)]
#[command(name = "veil")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Enable verbose output
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Send a prompt (reads stdin when TEXT is omitted)
    Prompt {
        /// Prompt text
        text: Option<String>,
        /// Create and release a local session for this prompt only
        #[arg(long)]
        per_call: bool,
        /// Skip the local model and use the fallback endpoint
        #[arg(long)]
        remote_only: bool,
    },

    /// Redact PII from text (reads stdin when TEXT is omitted)
    Redact {
        /// Text to redact
        text: Option<String>,
        /// Print per-kind counts as JSON to stderr
        #[arg(long)]
        report: bool,
    },

    /// Show local model capability and fallback configuration
    Status,

    /// Manage local models
    Model {
        #[command(subcommand)]
        command: ModelCommands,
    },
}

#[derive(Subcommand)]
enum ModelCommands {
    /// List installed models
    List,
    /// Download the default model, or install one from a local .gguf file
    Pull {
        /// Local model file to install
        path: Option<PathBuf>,
    },
    /// Show model paths and defaults
    Info,
}

fn main() -> miette::Result<()> {
    let cli = Cli::parse();

    // Set up logging
    let filter = if cli.verbose { "debug" } else { "warn" };
    let subscriber = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::new(filter))
        .with_writer(std::io::stderr)
        .without_time()
        .finish();
    tracing::subscriber::set_global_default(subscriber).ok();

    let runtime = tokio::runtime::Runtime::new()
        .map_err(|e| miette::miette!("Failed to start async runtime: {}", e))?;

    match cli.command {
        Commands::Prompt {
            text,
            per_call,
            remote_only,
        } => runtime.block_on(commands::prompt::run(text.as_deref(), per_call, remote_only)),
        Commands::Redact { text, report } => commands::redact::run(text.as_deref(), report),
        Commands::Status => runtime.block_on(commands::status::run()),
        Commands::Model { command } => match command {
            ModelCommands::List => commands::model::list(),
            ModelCommands::Pull { path } => {
                runtime.block_on(commands::model::pull(path.as_deref()))
            }
            ModelCommands::Info => commands::model::info(),
        },
    }
}

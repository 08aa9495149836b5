//! Error webhook service binary.
//!
//! Receives GlitchTip and Better Stack webhooks and triggers the GitHub
//! error investigation workflow.

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use std::net::SocketAddr;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::info;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use error_webhook::{
    config::Config, server, GitHubDispatcher, Provider, ProviderPayload, WebhookHandler,
};

#[derive(Parser)]
#[command(name = "error-webhook")]
#[command(about = "Relay error-monitoring webhooks to GitHub repository_dispatch")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Log format (text or json)
    #[arg(long, env = "LOG_FORMAT", default_value = "text", global = true)]
    log_format: LogFormat,
}

#[derive(Clone, Copy, Default, clap::ValueEnum)]
enum LogFormat {
    #[default]
    Text,
    Json,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the webhook HTTP server
    Serve {
        /// Port to listen on (overrides PORT)
        #[arg(long)]
        port: Option<u16>,
    },
    /// Print the normalized record for a saved webhook body
    Normalize {
        /// Provider that produced the payload (glitchtip or betterstack)
        #[arg(long)]
        provider: Provider,

        /// Path to the JSON payload
        file: PathBuf,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    init_tracing(cli.log_format)?;

    match cli.command {
        Commands::Serve { port } => serve(port).await,
        Commands::Normalize { provider, file } => normalize(provider, &file),
    }
}

fn init_tracing(format: LogFormat) -> Result<()> {
    let filter = EnvFilter::from_default_env().add_directive("error_webhook=info".parse()?);

    match format {
        LogFormat::Text => tracing_subscriber::registry()
            .with(fmt::layer())
            .with(filter)
            .init(),
        LogFormat::Json => tracing_subscriber::registry()
            .with(fmt::layer().json())
            .with(filter)
            .init(),
    }

    Ok(())
}

async fn serve(port: Option<u16>) -> Result<()> {
    info!("Starting error webhook service...");

    let mut config = Config::from_env();
    if let Some(port) = port {
        config.port = port;
    }

    let dispatcher = GitHubDispatcher::new(&config.github)
        .context("Failed to configure GitHub dispatcher")?;

    info!(repo = %dispatcher.repo(), "GitHub dispatch target configured");
    if config.webhook_secret.is_none() {
        info!("No WEBHOOK_SECRET configured - signature checks are skipped");
    }

    let state = server::AppState::new(WebhookHandler::new(
        Arc::new(dispatcher),
        config.webhook_secret.clone(),
    ));

    let addr = SocketAddr::from(([0, 0, 0, 0], config.port));
    server::run_server(state, &addr.to_string())
        .await
        .context("Server error")
}

fn normalize(provider: Provider, file: &Path) -> Result<()> {
    let body = std::fs::read(file)
        .with_context(|| format!("Failed to read {}", file.display()))?;

    let record = ProviderPayload::parse(provider, &body)
        .with_context(|| format!("Invalid {provider} payload"))?
        .normalize();

    println!("{}", serde_json::to_string_pretty(&record)?);
    Ok(())
}

use anyhow::{Context, Result};
use clap::Parser;
use jobwatch::cli::{handle_command, Cli, Command};
use jobwatch::AppConfig;
use std::fs::OpenOptions;
use std::sync::Mutex;
use tracing::info;

use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{fmt, EnvFilter};

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    let config = AppConfig::load(&cli.config)?;

    if let Some(parent) = config.paths.log_file.parent() {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("Failed to create log directory {}", parent.display()))?;
    }
    let file = OpenOptions::new()
        .create(true)
        .append(true)
        .open(&config.paths.log_file)
        .with_context(|| format!("Failed to open log file {}", config.paths.log_file.display()))?;

    tracing_subscriber::registry()
        .with(fmt::layer().with_target(false))
        .with(
            fmt::layer()
                .json()
                .with_writer(Mutex::new(file))
                .with_current_span(true)
                .with_span_list(false),
        )
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    match &config.source {
        Some(path) => info!("Loaded configuration from {}", path.display()),
        None => info!("No {} found, using default configuration", cli.config.display()),
    }
    info!("Database: {}", config.paths.database.display());

    handle_command(cli.command.unwrap_or(Command::Run), &config).await
}

// src/cli.rs
use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use tracing::{info, warn};

use crate::analysis::{read_latest_cv, CoverLetterWriter, LlmClient, OpenAiClient};
use crate::config::AppConfig;
use crate::pipeline::{prepare_directories, Pipeline};
use crate::positions::update_positions;
use crate::session::ChromeLauncher;
use crate::store::Store;

#[derive(Parser)]
#[command(name = "jobwatch")]
#[command(about = "Track LinkedIn job postings and score them against your CV")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Option<Command>,

    #[arg(long, global = true, default_value = "config.yaml")]
    pub config: PathBuf,
}

#[derive(Subcommand, Debug, Clone, PartialEq, Eq)]
pub enum Command {
    /// Reconcile stored jobs, collect new ones and analyze them (default)
    Run,
    /// Draft a cover letter for a stored job
    CoverLetter { job_id: String },
    /// Merge the newest exported positions CSV into the tracked list
    Positions,
}

pub async fn handle_command(command: Command, config: &AppConfig) -> Result<()> {
    prepare_directories(config).await?;

    match command {
        Command::Run => {
            let store = Store::open(&config.paths.database).await?;
            let launcher = ChromeLauncher::new(config.browser.clone());
            let llm = match config.openai_api_key.as_deref() {
                Some(key) => Some(OpenAiClient::new(&config.llm, Some(key))?),
                None => {
                    warn!("OPENAI_API_KEY is not set, the analysis stage will fail");
                    None
                }
            };

            let summary = Pipeline::new(
                config,
                &store,
                &launcher,
                llm.as_ref().map(|client| client as &dyn LlmClient),
            )
            .run()
            .await?;

            info!(
                "Done: {} ongoing jobs checked, {} new jobs stored, {} analyzed",
                summary.reconciled, summary.new_jobs, summary.analysis.analyzed
            );
        }
        Command::CoverLetter { job_id } => {
            let store = Store::open(&config.paths.database).await?;
            let llm = OpenAiClient::new(&config.llm, config.openai_api_key.as_deref())?;
            let cv_text = read_latest_cv(&config.paths.cv_folder)?;

            let path = CoverLetterWriter::new(&store, &llm, &config.paths.cover_letters)
                .write(&job_id, &cv_text)
                .await?;
            info!("Cover letter for job {} written to {}", job_id, path.display());
        }
        Command::Positions => {
            let written = update_positions(&config.paths.positions_input, &config.paths.positions_output)
                .context("Failed to update the positions list")?;
            if written.is_none() {
                info!("Nothing to update");
            }
        }
    }
    Ok(())
}

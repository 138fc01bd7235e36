// src/pipeline.rs
use anyhow::{Context, Result};
use std::collections::BTreeSet;
use tracing::{info, info_span, warn, Instrument};
use uuid::Uuid;

use crate::analysis::{read_latest_cv, AnalysisSummary, FitAnalyzer, LlmClient};
use crate::config::AppConfig;
use crate::error::{is_driver_failure, ScrapeError};
use crate::scraper::{format_job_search_url, reconcile, DetailExtractor, ListingCollector};
use crate::session::{authenticate, Session, SessionFactory};
use crate::store::Store;
use crate::utils::ensure_dir_exists;

/// Browser-driven parts of a run. Each gets its own session.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Stage {
    Reconcile,
    Discover,
}

impl Stage {
    fn name(&self) -> &'static str {
        match self {
            Self::Reconcile => "reconcile",
            Self::Discover => "discover",
        }
    }
}

#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct RunSummary {
    pub reconciled: usize,
    pub new_jobs: usize,
    pub analysis: AnalysisSummary,
}

/// Create every directory the configuration points at.
pub async fn prepare_directories(config: &AppConfig) -> Result<()> {
    for dir in config.directories() {
        ensure_dir_exists(&dir).await?;
    }
    Ok(())
}

pub struct Pipeline<'a> {
    config: &'a AppConfig,
    store: &'a Store,
    sessions: &'a dyn SessionFactory,
    llm: Option<&'a dyn LlmClient>,
}

impl<'a> Pipeline<'a> {
    pub fn new(
        config: &'a AppConfig,
        store: &'a Store,
        sessions: &'a dyn SessionFactory,
        llm: Option<&'a dyn LlmClient>,
    ) -> Self {
        Self {
            config,
            store,
            sessions,
            llm,
        }
    }

    /// Reconcile ongoing jobs, discover new ones, then analyze what has
    /// not been scored yet.
    pub async fn run(&self) -> Result<RunSummary> {
        let run_id = Uuid::new_v4();
        self.run_stages().instrument(info_span!("run", %run_id)).await
    }

    async fn run_stages(&self) -> Result<RunSummary> {
        info!("Starting run");

        let reconciled = self.run_stage(Stage::Reconcile).await?;
        let new_jobs = self.run_stage(Stage::Discover).await?;
        let analysis = self.analyze().await?;

        let counts = self.store.status_counts().await?;
        info!("Run finished. Jobs by status: {:?}", counts);

        Ok(RunSummary {
            reconciled,
            new_jobs,
            analysis,
        })
    }

    pub async fn analyze(&self) -> Result<AnalysisSummary> {
        let llm = self
            .llm
            .context("OPENAI_API_KEY environment variable not set, cannot analyze jobs")?;
        let cv_text = read_latest_cv(&self.config.paths.cv_folder)?;
        FitAnalyzer::new(self.store, llm)
            .analyze_pending(&cv_text, &self.config.prompt_suffix)
            .await
    }

    /// Run `stage`, starting over with a fresh session after a browser
    /// failure until the configured attempts are used up.
    async fn run_stage(&self, stage: Stage) -> Result<usize> {
        let attempts = self.config.retry.session_attempts.max(1);
        let mut attempt = 1;
        loop {
            let outcome = self.attempt_stage(stage).await;
            match outcome {
                Ok(processed) => return Ok(processed),
                Err(e) if attempt < attempts && is_driver_failure(&e) => {
                    warn!(
                        "Stage {} failed on attempt {}/{}: {:#}. Retrying with a fresh session",
                        stage.name(),
                        attempt,
                        attempts,
                        e
                    );
                    attempt += 1;
                }
                Err(e) => return Err(e.context(format!("Stage {} failed", stage.name()))),
            }
        }
    }

    async fn attempt_stage(&self, stage: Stage) -> Result<usize> {
        // No browser is opened when there is nothing to re-check.
        let ongoing = match stage {
            Stage::Reconcile => {
                let ids = self.store.known_ongoing_ids().await?;
                if ids.is_empty() {
                    info!("No ongoing jobs found.");
                    return Ok(0);
                }
                ids
            }
            Stage::Discover => BTreeSet::new(),
        };

        let session = self.sessions.open().map_err(ScrapeError::Driver)?;
        authenticate(session.as_ref(), self.config.credentials.as_ref(), &self.config.timing).await?;

        match stage {
            Stage::Reconcile => self.reconcile_ongoing(session.as_ref(), &ongoing).await,
            Stage::Discover => self.discover(session.as_ref()).await,
        }
    }

    async fn reconcile_ongoing(&self, session: &dyn Session, ongoing: &BTreeSet<String>) -> Result<usize> {
        let extractor = DetailExtractor::new(self.store, &self.config.timing);
        let results = reconcile(session, &extractor, ongoing).await?;
        Ok(results.len())
    }

    /// Collect listing ids and extract every id the store has not seen.
    async fn discover(&self, session: &dyn Session) -> Result<usize> {
        let search_url = format_job_search_url(&self.config.search_url)
            .with_context(|| format!("Invalid search URL {}", self.config.search_url))?;
        info!("Searching {}", search_url);

        let collected = ListingCollector::new(&self.config.collector, &self.config.timing)
            .collect(session, &search_url)
            .await?;

        let known = self.store.known_ids().await?;
        let new_ids: Vec<&String> = collected.iter().filter(|id| !known.contains(*id)).collect();
        info!("{} collected, {} not seen before", collected.len(), new_ids.len());

        let extractor = DetailExtractor::new(self.store, &self.config.timing);
        let mut stored = BTreeSet::new();
        for job_id in new_ids {
            match extractor.classify_and_extract(session, job_id).await {
                Ok(result) => {
                    stored.insert(result.job_id);
                }
                Err(e) if e.is_job_local() => warn!("Skipping job {}: {}", job_id, e),
                Err(e) => return Err(e.into()),
            }
        }

        info!("Stored {} new jobs", stored.len());
        Ok(stored.len())
    }
}

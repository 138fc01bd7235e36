// src/analysis/fit_analyzer.rs
use anyhow::Result;
use tracing::{error, info, warn};

use super::llm_client::LlmClient;
use crate::store::Store;

pub const FIT_SYSTEM_PROMPT: &str =
    "You are a career coach helping a user evaluate job positions based on their CV.";

pub fn fit_prompt(cv_text: &str, description: &str, suffix: &str) -> String {
    format!(
        "Here is the user's CV:\n{}\n\nHere is the job description:\n{}\n\n{}",
        cv_text, description, suffix
    )
}

/// Leading 1-10 score of a reply such as `"7\nGood match..."` or
/// `"**8** - strong"`.
pub fn fit_score(text: &str) -> Option<u8> {
    let digits: String = text
        .trim_start_matches(|c: char| !c.is_alphanumeric())
        .chars()
        .take_while(char::is_ascii_digit)
        .collect();
    digits.parse().ok().filter(|score| (1..=10).contains(score))
}

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct AnalysisSummary {
    pub analyzed: usize,
    pub skipped: usize,
    pub failed: usize,
}

pub struct FitAnalyzer<'a> {
    store: &'a Store,
    llm: &'a dyn LlmClient,
}

impl<'a> FitAnalyzer<'a> {
    pub fn new(store: &'a Store, llm: &'a dyn LlmClient) -> Self {
        Self { store, llm }
    }

    /// Ask the model about every stored description that has no analysis
    /// yet. A failed request is logged and the job is retried next run.
    pub async fn analyze_pending(&self, cv_text: &str, prompt_suffix: &str) -> Result<AnalysisSummary> {
        let pending = self.store.unanalyzed_descriptions().await?;
        info!("{} job descriptions awaiting analysis", pending.len());

        let mut summary = AnalysisSummary::default();
        for (job_id, description) in pending {
            let description = match description.as_deref().map(str::trim) {
                Some(text) if !text.is_empty() => text.to_string(),
                _ => {
                    warn!("Skipping job {}: empty description", job_id);
                    summary.skipped += 1;
                    continue;
                }
            };

            let prompt = fit_prompt(cv_text, &description, prompt_suffix);
            match self.llm.complete(FIT_SYSTEM_PROMPT, &prompt).await {
                Ok(reply) => {
                    self.store.insert_analysis(&job_id, &reply).await?;
                    match fit_score(&reply) {
                        Some(score) => info!("Analyzed job {} (fit {}/10)", job_id, score),
                        None => info!("Analyzed job {}", job_id),
                    }
                    summary.analyzed += 1;
                }
                Err(e) => {
                    error!("Analysis failed for job {}: {:#}", job_id, e);
                    summary.failed += 1;
                }
            }
        }

        info!(
            "Analysis finished: {} analyzed, {} skipped, {} failed",
            summary.analyzed, summary.skipped, summary.failed
        );
        Ok(summary)
    }
}

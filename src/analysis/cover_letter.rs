// src/analysis/cover_letter.rs
use anyhow::{Context, Result};
use docx_rs::{Docx, Paragraph, Run};
use std::fs::File;
use std::path::{Path, PathBuf};
use tracing::info;

use super::llm_client::LlmClient;
use crate::store::Store;

pub const COVER_LETTER_SYSTEM_PROMPT: &str = "You are an expert cover letter writer.";

pub fn cover_letter_prompt(cv_text: &str, description: &str) -> String {
    format!(
        "Using the following CV:\n{}\n\nCreate a personalized cover letter for this job description:\n{}",
        cv_text, description
    )
}

pub struct CoverLetterWriter<'a> {
    store: &'a Store,
    llm: &'a dyn LlmClient,
    output_dir: &'a Path,
}

impl<'a> CoverLetterWriter<'a> {
    pub fn new(store: &'a Store, llm: &'a dyn LlmClient, output_dir: &'a Path) -> Self {
        Self {
            store,
            llm,
            output_dir,
        }
    }

    /// Generate a letter for a stored job and save it as
    /// `{job_id}_cl.docx` in the output directory.
    pub async fn write(&self, job_id: &str, cv_text: &str) -> Result<PathBuf> {
        let description = self
            .store
            .description(job_id)
            .await?
            .and_then(|d| d.description_text)
            .filter(|text| !text.trim().is_empty())
            .with_context(|| format!("No job description stored for job {}", job_id))?;

        let letter = self
            .llm
            .complete(COVER_LETTER_SYSTEM_PROMPT, &cover_letter_prompt(cv_text, &description))
            .await
            .with_context(|| format!("Failed to generate cover letter for job {}", job_id))?;

        let path = self.output_dir.join(format!("{}_cl.docx", job_id));
        save_docx(&path, &letter)?;

        info!("Cover letter saved to {}", path.display());
        Ok(path)
    }
}

fn save_docx(path: &Path, letter: &str) -> Result<()> {
    let heading = Paragraph::new().add_run(Run::new().add_text("Cover Letter").bold().size(32));
    let docx = letter
        .lines()
        .fold(Docx::new().add_paragraph(heading), |docx, line| {
            docx.add_paragraph(Paragraph::new().add_run(Run::new().add_text(line)))
        });

    let file = File::create(path).with_context(|| format!("Failed to create {}", path.display()))?;
    docx.build()
        .pack(file)
        .with_context(|| format!("Failed to write {}", path.display()))?;
    Ok(())
}

// src/scraper/reconciler.rs
use std::collections::BTreeSet;
use tracing::{info, warn};

use super::extractor::{ClassificationResult, DetailExtractor};
use crate::error::ScrapeError;
use crate::session::Session;

/// Re-visit ongoing jobs so closed or removed postings change status.
/// Per-job extraction problems are logged and skipped.
pub async fn reconcile(
    session: &dyn Session,
    extractor: &DetailExtractor<'_>,
    ongoing_ids: &BTreeSet<String>,
) -> Result<Vec<ClassificationResult>, ScrapeError> {
    info!("Checking {} ongoing jobs", ongoing_ids.len());

    let mut results = Vec::with_capacity(ongoing_ids.len());
    for job_id in ongoing_ids {
        match extractor.classify_and_extract(session, job_id).await {
            Ok(result) => results.push(result),
            Err(e) if e.is_job_local() => {
                warn!("Skipping job {}: {}", job_id, e);
            }
            Err(e) => return Err(e),
        }
    }

    let changed = results.iter().filter(|r| r.status.is_terminal()).count();
    info!("{} of {} ongoing jobs are no longer open", changed, ongoing_ids.len());
    Ok(results)
}

// src/scraper/collector.rs
use std::collections::HashSet;
use tracing::{debug, info, warn};

use super::job_id::{job_id_from_href, search_page_url, JOB_LINK_SELECTOR};
use crate::config::{CollectorConfig, TimingConfig};
use crate::error::ScrapeError;
use crate::session::snapshot::find_within;
use crate::session::Session;
use crate::wait::until_stable;

/// Walks search result pages and gathers job ids.
pub struct ListingCollector<'a> {
    settings: &'a CollectorConfig,
    timing: &'a TimingConfig,
}

impl<'a> ListingCollector<'a> {
    pub fn new(settings: &'a CollectorConfig, timing: &'a TimingConfig) -> Self {
        Self { settings, timing }
    }

    /// Job ids from every results page of `search_url`, in first-seen
    /// order without duplicates. Pagination stops at the first page with
    /// fewer than a full page of ids, at a full page with nothing new, or
    /// when the results container is missing.
    pub async fn collect(&self, session: &dyn Session, search_url: &str) -> Result<Vec<String>, ScrapeError> {
        let page_size = self.settings.page_size.max(1);
        let mut job_ids = Vec::new();
        let mut seen = HashSet::new();

        for page in 0.. {
            let url = search_page_url(search_url, page * page_size).map_err(|e| ScrapeError::InvalidUrl {
                url: search_url.to_string(),
                reason: e.to_string(),
            })?;

            session.navigate(&url).map_err(ScrapeError::Driver)?;
            self.timing.listing_page.wait().await;

            let page_ids = match self.read_results_page(session).await {
                Ok(ids) => ids,
                Err(ScrapeError::ElementNotFound { selector }) => {
                    warn!(
                        "Results container {} missing on page {}, stopping pagination",
                        selector,
                        page + 1
                    );
                    break;
                }
                Err(e) => return Err(e),
            };

            let found = page_ids.len();
            let before = job_ids.len();
            for id in page_ids {
                if seen.insert(id.clone()) {
                    job_ids.push(id);
                }
            }
            let added = job_ids.len() - before;
            info!(
                "Page {}: {} job ids, {} new ({} collected)",
                page + 1,
                found,
                added,
                job_ids.len()
            );

            if found < page_size {
                break;
            }
            if added == 0 {
                warn!("Page {} repeated earlier results, stopping pagination", page + 1);
                break;
            }
        }

        info!("Collected {} job IDs.", job_ids.len());
        Ok(job_ids)
    }

    async fn read_results_page(&self, session: &dyn Session) -> Result<Vec<String>, ScrapeError> {
        self.scroll_results(session).await?;

        let snapshot = session.snapshot().map_err(ScrapeError::Driver)?;
        let container = snapshot.find(&self.settings.results_container)?;

        let mut page_seen = HashSet::new();
        let ids = find_within(container, JOB_LINK_SELECTOR)?
            .into_iter()
            .filter_map(|anchor| anchor.value().attr("href"))
            .filter_map(job_id_from_href)
            .filter(|id| page_seen.insert(id.clone()))
            .collect();
        Ok(ids)
    }

    /// Scroll the results container until its position stops changing so
    /// lazily loaded cards are rendered.
    async fn scroll_results(&self, session: &dyn Session) -> Result<(), ScrapeError> {
        let container = self.settings.results_container.as_str();
        let step = self.settings.scroll_step_px;

        let outcome = until_stable(self.settings.max_scroll_steps, &self.timing.scroll_step, || {
            match session.scroll_by(container, step) {
                Ok(Some(top)) => Ok(top),
                Ok(None) => Err(ScrapeError::element_not_found(container).into()),
                Err(e) => Err(ScrapeError::Driver(e).into()),
            }
        })
        .await
        .map_err(|e| e.downcast::<ScrapeError>().unwrap_or_else(ScrapeError::Driver))?;

        if outcome.is_settled() {
            debug!("Results list settled at scrollTop {}", outcome.value());
        } else {
            warn!(
                "Results list still moving after {} scroll steps (scrollTop {}), reading what loaded",
                self.settings.max_scroll_steps,
                outcome.value()
            );
        }
        Ok(())
    }
}

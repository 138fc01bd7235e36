// src/scraper/extractor.rs
use tracing::debug;

use super::job_id::canonical_job_url;
use crate::config::TimingConfig;
use crate::error::ScrapeError;
use crate::session::snapshot::{element_lines, element_text};
use crate::session::{PageSnapshot, Session};
use crate::store::models::{JobDescription, JobStatus};
use crate::store::Store;

const CLOSED_BANNER: &str = "span.artdeco-inline-feedback__message";
const CLOSED_TEXT: &str = "No longer accepting applications";
const MISSING_BANNER: &str = "p.jobs-box__body.jobs-no-job__error-msg";
const MISSING_TEXT: &str = "The job you were looking for was not found.";

const COMPANY: &str = ".job-details-jobs-unified-top-card__company-name";
const TITLE: &str = "h1.t-24.t-bold.inline";
const DESCRIPTION: &str = "p[dir='ltr']";
const TOP_INFO: &str = "div.t-black--light.mt2[dir='ltr']";
const WORK_MODEL: &str = "span.ui-label.ui-label--accent-3.text-body-small";

pub const NOT_FOUND: &str = "Not Found";

/// What a visit to a job page found.
#[derive(Debug, Clone, PartialEq)]
pub struct ClassificationResult {
    pub job_id: String,
    pub status: JobStatus,
    /// Present only for ongoing jobs.
    pub description: Option<JobDescription>,
}

pub struct DetailExtractor<'a> {
    store: &'a Store,
    timing: &'a TimingConfig,
}

impl<'a> DetailExtractor<'a> {
    pub fn new(store: &'a Store, timing: &'a TimingConfig) -> Self {
        Self { store, timing }
    }

    /// Visit the job page, record its status and, for an ongoing job, its
    /// description. The status is stored before an extraction failure is
    /// reported.
    pub async fn classify_and_extract(
        &self,
        session: &dyn Session,
        job_id: &str,
    ) -> Result<ClassificationResult, ScrapeError> {
        let url = canonical_job_url(job_id);
        session.navigate(&url).map_err(ScrapeError::Driver)?;
        self.timing.detail_page.wait().await;

        let (status, extracted) = {
            let snapshot = session.snapshot().map_err(ScrapeError::Driver)?;
            let status = classify(&snapshot)?;
            debug!("Job {} classified as {}", job_id, status);
            let extracted = (status == JobStatus::Ongoing).then(|| extract_description(&snapshot, job_id));
            (status, extracted)
        };

        self.store
            .upsert_status(job_id, status, &url)
            .await
            .map_err(ScrapeError::Store)?;

        let description = match extracted {
            Some(result) => {
                let description = result?;
                self.store
                    .upsert_description(&description)
                    .await
                    .map_err(ScrapeError::Store)?;
                Some(description)
            }
            None => None,
        };

        Ok(ClassificationResult {
            job_id: job_id.to_string(),
            status,
            description,
        })
    }
}

/// Closed postings win over removed ones; anything else is ongoing.
pub fn classify(snapshot: &PageSnapshot) -> Result<JobStatus, ScrapeError> {
    if snapshot.text_containing(CLOSED_BANNER, CLOSED_TEXT)?.is_some() {
        return Ok(JobStatus::Cancelled);
    }
    if snapshot.text_containing(MISSING_BANNER, MISSING_TEXT)?.is_some() {
        return Ok(JobStatus::Deleted);
    }
    Ok(JobStatus::Ongoing)
}

pub fn extract_description(snapshot: &PageSnapshot, job_id: &str) -> Result<JobDescription, ScrapeError> {
    let essential = |selector: &str| -> Result<_, ScrapeError> {
        snapshot.try_find(selector)?.ok_or_else(|| ScrapeError::Extraction {
            job_id: job_id.to_string(),
            reason: format!("{} not found", selector),
        })
    };

    // Only a missing element is fatal; blank text is stored as is.
    let company_name = element_lines(essential(COMPANY)?)
        .into_iter()
        .next()
        .unwrap_or_default();
    let title = element_text(essential(TITLE)?);

    let description_text = snapshot
        .find_all(DESCRIPTION)?
        .into_iter()
        .map(element_text)
        .filter(|text| !text.is_empty())
        .collect::<Vec<_>>()
        .join(" ");

    let (location, posted_date, applicant_count) = top_card_info(snapshot)?;

    let work_model = snapshot
        .find_all(WORK_MODEL)?
        .into_iter()
        .map(element_text)
        .filter(|text| !text.is_empty())
        .collect::<Vec<_>>()
        .join(" · ");

    Ok(JobDescription {
        job_id: job_id.to_string(),
        company_name: Some(company_name),
        title: Some(title),
        description_text: Some(description_text),
        location: Some(location),
        posted_date: Some(posted_date),
        applicant_count: Some(applicant_count),
        work_model: Some(work_model),
    })
}

/// `location · posted · applicants` by position, with [`NOT_FOUND`] for
/// blank or absent segments.
fn top_card_info(snapshot: &PageSnapshot) -> Result<(String, String, String), ScrapeError> {
    let text = snapshot.try_find(TOP_INFO)?.map(element_text).unwrap_or_default();
    let mut parts = text.split('·').map(str::trim);
    let mut next = || match parts.next() {
        Some(part) if !part.is_empty() => part.to_string(),
        _ => NOT_FOUND.to_string(),
    };
    Ok((next(), next(), next()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::session::testing::FakeSession;

    const ONGOING: &str = r#"
        <html><body>
          <div class="job-details-jobs-unified-top-card__company-name">
            <a href="/company/acme">Acme Corp</a>
          </div>
          <h1 class="t-24 t-bold inline"> Data Analyst </h1>
          <div class="t-black--light mt2" dir="ltr">
            <span>Zurich, Switzerland</span> · <span>2 weeks ago</span> · <span>Over 100 applicants</span>
          </div>
          <span class="ui-label ui-label--accent-3 text-body-small">Hybrid</span>
          <span class="ui-label ui-label--accent-3 text-body-small"> </span>
          <span class="ui-label ui-label--accent-3 text-body-small">Full-time</span>
          <article>
            <p dir="ltr">Work with data.</p>
            <p dir="ltr">  </p>
            <p dir="ltr">Python and SQL.</p>
          </article>
        </body></html>
    "#;

    const BOTH_BANNERS: &str = r#"
        <span class="artdeco-inline-feedback__message">No longer accepting applications</span>
        <p class="jobs-box__body jobs-no-job__error-msg">The job you were looking for was not found.</p>
    "#;

    const DELETED: &str = r#"
        <p class="jobs-box__body jobs-no-job__error-msg">The job you were looking for was not found.</p>
    "#;

    #[test]
    fn test_cancelled_wins_over_deleted() {
        assert_eq!(classify(&PageSnapshot::parse(BOTH_BANNERS)).unwrap(), JobStatus::Cancelled);
        assert_eq!(classify(&PageSnapshot::parse(DELETED)).unwrap(), JobStatus::Deleted);
        assert_eq!(classify(&PageSnapshot::parse(ONGOING)).unwrap(), JobStatus::Ongoing);
    }

    #[test]
    fn test_banner_text_must_match() {
        let page = r#"<span class="artdeco-inline-feedback__message">Application submitted</span>"#;
        assert_eq!(classify(&PageSnapshot::parse(page)).unwrap(), JobStatus::Ongoing);
    }

    #[test]
    fn test_extract_description_fields() {
        let description = extract_description(&PageSnapshot::parse(ONGOING), "42").unwrap();
        assert_eq!(description.company_name.as_deref(), Some("Acme Corp"));
        assert_eq!(description.title.as_deref(), Some("Data Analyst"));
        assert_eq!(description.description_text.as_deref(), Some("Work with data. Python and SQL."));
        assert_eq!(description.location.as_deref(), Some("Zurich, Switzerland"));
        assert_eq!(description.posted_date.as_deref(), Some("2 weeks ago"));
        assert_eq!(description.applicant_count.as_deref(), Some("Over 100 applicants"));
        assert_eq!(description.work_model.as_deref(), Some("Hybrid · Full-time"));
    }

    #[test]
    fn test_top_card_fallbacks() {
        let no_info = ONGOING.replace("t-black--light mt2", "other");
        let description = extract_description(&PageSnapshot::parse(&no_info), "42").unwrap();
        assert_eq!(description.location.as_deref(), Some(NOT_FOUND));
        assert_eq!(description.posted_date.as_deref(), Some(NOT_FOUND));
        assert_eq!(description.applicant_count.as_deref(), Some(NOT_FOUND));

        let partial = ONGOING.replace(" · <span>2 weeks ago</span> · <span>Over 100 applicants</span>", "");
        let description = extract_description(&PageSnapshot::parse(&partial), "42").unwrap();
        assert_eq!(description.location.as_deref(), Some("Zurich, Switzerland"));
        assert_eq!(description.posted_date.as_deref(), Some(NOT_FOUND));
    }

    #[test]
    fn test_blank_top_card_segment_keeps_positions() {
        let gap = ONGOING.replace(
            "<span>Zurich, Switzerland</span> · <span>2 weeks ago</span> · <span>Over 100 applicants</span>",
            "<span>Zurich</span> ·  · <span>40 applicants</span>",
        );
        let description = extract_description(&PageSnapshot::parse(&gap), "42").unwrap();
        assert_eq!(description.location.as_deref(), Some("Zurich"));
        assert_eq!(description.posted_date.as_deref(), Some(NOT_FOUND));
        assert_eq!(description.applicant_count.as_deref(), Some("40 applicants"));
    }

    #[test]
    fn test_blank_title_and_company_are_kept() {
        let blank = ONGOING
            .replace("<h1 class=\"t-24 t-bold inline\"> Data Analyst </h1>", "<h1 class=\"t-24 t-bold inline\"></h1>")
            .replace("<a href=\"/company/acme\">Acme Corp</a>", "");
        let description = extract_description(&PageSnapshot::parse(&blank), "42").unwrap();
        assert_eq!(description.title.as_deref(), Some(""));
        assert_eq!(description.company_name.as_deref(), Some(""));
        assert_eq!(description.location.as_deref(), Some("Zurich, Switzerland"));
    }

    #[tokio::test]
    async fn test_ongoing_job_stores_status_and_description() {
        let store = Store::in_memory().await.unwrap();
        let timing = TimingConfig::immediate();
        let session = FakeSession::new().with_page(&canonical_job_url("42"), ONGOING);

        let result = DetailExtractor::new(&store, &timing)
            .classify_and_extract(&session, "42")
            .await
            .unwrap();

        assert_eq!(result.status, JobStatus::Ongoing);
        assert_eq!(store.job("42").await.unwrap().unwrap().status, JobStatus::Ongoing);
        assert_eq!(store.description("42").await.unwrap(), result.description);
    }

    #[tokio::test]
    async fn test_deleted_job_has_no_description() {
        let store = Store::in_memory().await.unwrap();
        let timing = TimingConfig::immediate();
        let session = FakeSession::new().with_page(&canonical_job_url("7"), DELETED);

        let result = DetailExtractor::new(&store, &timing)
            .classify_and_extract(&session, "7")
            .await
            .unwrap();

        assert_eq!(result.status, JobStatus::Deleted);
        assert!(result.description.is_none());
        assert!(store.description("7").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_missing_title_fails_after_status_write() {
        let store = Store::in_memory().await.unwrap();
        let timing = TimingConfig::immediate();
        let page = ONGOING.replace("t-24 t-bold inline", "headline");
        let session = FakeSession::new().with_page(&canonical_job_url("9"), &page);

        let err = DetailExtractor::new(&store, &timing)
            .classify_and_extract(&session, "9")
            .await
            .unwrap_err();

        assert!(matches!(err, ScrapeError::Extraction { ref job_id, .. } if job_id == "9"));
        assert!(err.is_job_local());
        assert_eq!(store.job("9").await.unwrap().unwrap().status, JobStatus::Ongoing);
        assert!(store.description("9").await.unwrap().is_none());
    }
}

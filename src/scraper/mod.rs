// src/scraper/mod.rs
//! LinkedIn job pages: search listings, job details and status checks.

pub mod collector;
pub mod extractor;
pub mod job_id;
pub mod reconciler;

pub use collector::ListingCollector;
pub use extractor::{ClassificationResult, DetailExtractor};
pub use job_id::{canonical_job_url, format_job_search_url, job_id_from_href};
pub use reconciler::reconcile;

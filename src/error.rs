// src/error.rs
use std::path::PathBuf;
use thiserror::Error;

/// Failures raised while driving the browser and reading job pages.
#[derive(Debug, Error)]
pub enum ScrapeError {
    /// Credentials are missing or the login form could not be used.
    #[error("authentication failed: {0}")]
    Authentication(String),

    #[error("element not found: {selector}")]
    ElementNotFound { selector: String },

    /// An essential field of an ongoing job could not be read.
    #[error("failed to extract job {job_id}: {reason}")]
    Extraction { job_id: String, reason: String },

    #[error("invalid selector `{0}`")]
    InvalidSelector(String),

    #[error("invalid search URL {url}: {reason}")]
    InvalidUrl { url: String, reason: String },

    /// The browser session crashed or a navigation failed.
    #[error("browser session failed: {0:#}")]
    Driver(anyhow::Error),

    #[error("no .{extension} file found in {}", folder.display())]
    NotFound { folder: PathBuf, extension: String },

    #[error(transparent)]
    Store(anyhow::Error),
}

impl ScrapeError {
    pub fn element_not_found(selector: &str) -> Self {
        Self::ElementNotFound {
            selector: selector.to_string(),
        }
    }

    /// Errors that only affect the job being processed. The caller logs
    /// them and moves on to the next job.
    pub fn is_job_local(&self) -> bool {
        matches!(self, Self::Extraction { .. } | Self::ElementNotFound { .. })
    }

    /// Errors worth retrying with a fresh browser session.
    pub fn is_driver(&self) -> bool {
        matches!(self, Self::Driver(_))
    }
}

/// True when `err` carries a [`ScrapeError::Driver`] anywhere in its chain.
pub fn is_driver_failure(err: &anyhow::Error) -> bool {
    err.chain()
        .filter_map(|cause| cause.downcast_ref::<ScrapeError>())
        .any(ScrapeError::is_driver)
}

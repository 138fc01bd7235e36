// src/store/models.rs
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Lifecycle of a tracked listing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum JobStatus {
    New,
    Ongoing,
    Cancelled,
    Deleted,
    Missing,
}

impl JobStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::New => "new",
            Self::Ongoing => "ongoing",
            Self::Cancelled => "cancelled",
            Self::Deleted => "deleted",
            Self::Missing => "missing",
        }
    }

    /// Cancelled and deleted listings are never re-visited.
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Cancelled | Self::Deleted)
    }
}

impl fmt::Display for JobStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for JobStatus {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "new" => Ok(Self::New),
            "ongoing" => Ok(Self::Ongoing),
            "cancelled" => Ok(Self::Cancelled),
            "deleted" => Ok(Self::Deleted),
            "missing" => Ok(Self::Missing),
            other => anyhow::bail!("Unknown job status: {}", other),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JobRecord {
    pub job_id: String,
    pub status: JobStatus,
    pub first_seen_at: DateTime<Utc>,
    pub last_updated_at: DateTime<Utc>,
    pub source_url: String,
}

#[derive(Debug, sqlx::FromRow)]
pub(crate) struct JobRecordRow {
    pub job_id: String,
    pub status: String,
    pub timestamp_added: DateTime<Utc>,
    pub timestamp_updated: DateTime<Utc>,
    pub job_url: String,
}

impl TryFrom<JobRecordRow> for JobRecord {
    type Error = anyhow::Error;

    fn try_from(row: JobRecordRow) -> Result<Self, Self::Error> {
        Ok(Self {
            status: row.status.parse()?,
            job_id: row.job_id,
            first_seen_at: row.timestamp_added,
            last_updated_at: row.timestamp_updated,
            source_url: row.job_url,
        })
    }
}

/// Structured fields of an ongoing posting. Column names follow the
/// `job_description` table.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize, sqlx::FromRow)]
pub struct JobDescription {
    pub job_id: String,
    pub company_name: Option<String>,
    #[sqlx(rename = "title_name")]
    pub title: Option<String>,
    #[sqlx(rename = "job_description")]
    pub description_text: Option<String>,
    pub location: Option<String>,
    pub posted_date: Option<String>,
    #[sqlx(rename = "number_applicants")]
    pub applicant_count: Option<String>,
    pub work_model: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, sqlx::FromRow)]
pub struct FitAnalysis {
    pub job_id: String,
    #[sqlx(rename = "chatgpt_message")]
    pub analysis_text: String,
}

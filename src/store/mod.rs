// src/store/mod.rs
//! SQLite persistence for job ids, descriptions and fit analyses.
//!
//! Every operation is a single auto-committed statement. A crash between
//! a status write and a description write leaves an ongoing job without a
//! description; the next reconciliation pass fills it in.

pub mod models;

pub use models::{FitAnalysis, JobDescription, JobRecord, JobStatus};

use anyhow::{Context, Result};
use chrono::Utc;
use sqlx::sqlite::{SqliteConnectOptions, SqlitePoolOptions};
use sqlx::SqlitePool;
use std::collections::{BTreeMap, BTreeSet};
use std::path::Path;
use std::str::FromStr;
use tracing::{debug, info};

use models::JobRecordRow;

pub struct Store {
    pool: SqlitePool,
}

impl Store {
    /// Open (creating if needed) the database file and its tables.
    pub async fn open(database_path: &Path) -> Result<Self> {
        if let Some(parent) = database_path.parent() {
            if !parent.as_os_str().is_empty() {
                crate::utils::ensure_dir_exists(parent).await?;
            }
        }

        let options = SqliteConnectOptions::new()
            .filename(database_path)
            .create_if_missing(true);
        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .connect_with(options)
            .await
            .with_context(|| format!("Failed to connect to database: {}", database_path.display()))?;

        info!("Database connection established: {}", database_path.display());

        let store = Self { pool };
        store.migrate().await?;
        Ok(store)
    }

    /// Private in-memory database, used by tests and dry runs.
    pub async fn in_memory() -> Result<Self> {
        let options = SqliteConnectOptions::from_str("sqlite::memory:")?;
        // One connection: every new in-memory connection is a fresh database.
        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .connect_with(options)
            .await
            .context("Failed to open in-memory database")?;

        let store = Self { pool };
        store.migrate().await?;
        Ok(store)
    }

    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }

    async fn migrate(&self) -> Result<()> {
        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS job_ids (
                job_id TEXT PRIMARY KEY,
                status TEXT NOT NULL,
                timestamp_added TEXT NOT NULL,
                timestamp_updated TEXT NOT NULL,
                job_url TEXT NOT NULL
            );
            "#,
        )
        .execute(&self.pool)
        .await?;

        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS job_description (
                job_id TEXT PRIMARY KEY,
                company_name TEXT,
                title_name TEXT,
                job_description TEXT,
                location TEXT,
                posted_date TEXT,
                number_applicants TEXT,
                work_model TEXT,
                FOREIGN KEY (job_id) REFERENCES job_ids (job_id)
            );
            "#,
        )
        .execute(&self.pool)
        .await?;

        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS chatgpt_analysis (
                job_id TEXT PRIMARY KEY,
                chatgpt_message TEXT NOT NULL,
                FOREIGN KEY (job_id) REFERENCES job_ids (job_id)
            );
            "#,
        )
        .execute(&self.pool)
        .await?;

        sqlx::query("CREATE INDEX IF NOT EXISTS idx_job_ids_status ON job_ids(status);")
            .execute(&self.pool)
            .await?;

        debug!("Database migrations completed");
        Ok(())
    }

    /// Insert a new job id, or refresh status, url and update time of an
    /// existing one. `timestamp_added` is only written on insert.
    pub async fn upsert_status(&self, job_id: &str, status: JobStatus, job_url: &str) -> Result<()> {
        let now = Utc::now();

        sqlx::query(
            r#"
            INSERT INTO job_ids (job_id, status, timestamp_added, timestamp_updated, job_url)
            VALUES (?, ?, ?, ?, ?)
            ON CONFLICT(job_id) DO UPDATE SET
                status = excluded.status,
                timestamp_updated = excluded.timestamp_updated,
                job_url = excluded.job_url
            "#,
        )
        .bind(job_id)
        .bind(status.as_str())
        .bind(now)
        .bind(now)
        .bind(job_url)
        .execute(&self.pool)
        .await
        .with_context(|| format!("Failed to record status for job {}", job_id))?;

        info!("Job ID {} recorded with status: {}", job_id, status);
        Ok(())
    }

    /// Full overwrite of the description row.
    pub async fn upsert_description(&self, description: &JobDescription) -> Result<()> {
        sqlx::query(
            r#"
            INSERT OR REPLACE INTO job_description (
                job_id, company_name, title_name, job_description,
                location, posted_date, number_applicants, work_model
            ) VALUES (?, ?, ?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(&description.job_id)
        .bind(&description.company_name)
        .bind(&description.title)
        .bind(&description.description_text)
        .bind(&description.location)
        .bind(&description.posted_date)
        .bind(&description.applicant_count)
        .bind(&description.work_model)
        .execute(&self.pool)
        .await
        .with_context(|| format!("Failed to store description for job {}", description.job_id))?;

        debug!("Stored description for job {}", description.job_id);
        Ok(())
    }

    pub async fn job(&self, job_id: &str) -> Result<Option<JobRecord>> {
        let row = sqlx::query_as::<_, JobRecordRow>(
            r#"
            SELECT job_id, status, timestamp_added, timestamp_updated, job_url
            FROM job_ids
            WHERE job_id = ?
            "#,
        )
        .bind(job_id)
        .fetch_optional(&self.pool)
        .await?;

        row.map(JobRecord::try_from).transpose()
    }

    pub async fn description(&self, job_id: &str) -> Result<Option<JobDescription>> {
        let description = sqlx::query_as::<_, JobDescription>(
            r#"
            SELECT job_id, company_name, title_name, job_description,
                   location, posted_date, number_applicants, work_model
            FROM job_description
            WHERE job_id = ?
            "#,
        )
        .bind(job_id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(description)
    }

    /// Every job id ever recorded, whatever its status.
    pub async fn known_ids(&self) -> Result<BTreeSet<String>> {
        let ids = sqlx::query_scalar::<_, String>("SELECT job_id FROM job_ids")
            .fetch_all(&self.pool)
            .await?;
        Ok(ids.into_iter().collect())
    }

    pub async fn known_ongoing_ids(&self) -> Result<BTreeSet<String>> {
        let ids = sqlx::query_scalar::<_, String>("SELECT job_id FROM job_ids WHERE status = ?")
            .bind(JobStatus::Ongoing.as_str())
            .fetch_all(&self.pool)
            .await?;
        Ok(ids.into_iter().collect())
    }

    /// Descriptions with no analysis row yet, oldest job id first.
    pub async fn unanalyzed_descriptions(&self) -> Result<Vec<(String, Option<String>)>> {
        let rows = sqlx::query_as::<_, (String, Option<String>)>(
            r#"
            SELECT job_id, job_description
            FROM job_description
            WHERE job_id NOT IN (SELECT job_id FROM chatgpt_analysis)
            ORDER BY job_id
            "#,
        )
        .fetch_all(&self.pool)
        .await?;

        Ok(rows)
    }

    /// Write-once: a second analysis for the same job violates the key.
    pub async fn insert_analysis(&self, job_id: &str, analysis_text: &str) -> Result<()> {
        sqlx::query("INSERT INTO chatgpt_analysis (job_id, chatgpt_message) VALUES (?, ?)")
            .bind(job_id)
            .bind(analysis_text)
            .execute(&self.pool)
            .await
            .with_context(|| format!("Failed to store analysis for job {}", job_id))?;
        Ok(())
    }

    pub async fn analysis(&self, job_id: &str) -> Result<Option<FitAnalysis>> {
        let analysis = sqlx::query_as::<_, FitAnalysis>(
            "SELECT job_id, chatgpt_message FROM chatgpt_analysis WHERE job_id = ?",
        )
        .bind(job_id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(analysis)
    }

    pub async fn status_counts(&self) -> Result<BTreeMap<String, i64>> {
        let rows = sqlx::query_as::<_, (String, i64)>(
            "SELECT status, COUNT(*) FROM job_ids GROUP BY status",
        )
        .fetch_all(&self.pool)
        .await?;
        Ok(rows.into_iter().collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn description(job_id: &str, text: Option<&str>) -> JobDescription {
        JobDescription {
            job_id: job_id.to_string(),
            company_name: Some("Acme".into()),
            title: Some("Senior Analyst".into()),
            description_text: text.map(str::to_string),
            location: Some("Berlin".into()),
            posted_date: Some("2 days ago".into()),
            applicant_count: Some("40 applicants".into()),
            work_model: Some("Hybrid".into()),
        }
    }

    #[tokio::test]
    async fn test_upsert_status_is_idempotent() {
        let store = Store::in_memory().await.unwrap();
        let url = "https://www.linkedin.com/jobs/view/101/";

        store.upsert_status("101", JobStatus::Ongoing, url).await.unwrap();
        store.upsert_status("101", JobStatus::Ongoing, url).await.unwrap();

        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM job_ids WHERE job_id = '101'")
            .fetch_one(store.pool())
            .await
            .unwrap();
        assert_eq!(count, 1);

        let record = store.job("101").await.unwrap().unwrap();
        assert_eq!(record.status, JobStatus::Ongoing);
        assert_eq!(record.source_url, url);
    }

    #[tokio::test]
    async fn test_upsert_status_keeps_first_seen() {
        let store = Store::in_memory().await.unwrap();
        store
            .upsert_status("7", JobStatus::Ongoing, "https://www.linkedin.com/jobs/view/7/")
            .await
            .unwrap();
        let first = store.job("7").await.unwrap().unwrap();

        store
            .upsert_status("7", JobStatus::Cancelled, "https://www.linkedin.com/jobs/view/7/")
            .await
            .unwrap();
        let second = store.job("7").await.unwrap().unwrap();

        assert_eq!(second.status, JobStatus::Cancelled);
        assert_eq!(second.first_seen_at, first.first_seen_at);
        assert!(second.last_updated_at >= first.last_updated_at);
    }

    #[tokio::test]
    async fn test_upsert_description_replaces() {
        let store = Store::in_memory().await.unwrap();
        store.upsert_status("5", JobStatus::Ongoing, "u").await.unwrap();

        store.upsert_description(&description("5", Some("first"))).await.unwrap();
        store.upsert_description(&description("5", Some("second"))).await.unwrap();

        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM job_description")
            .fetch_one(store.pool())
            .await
            .unwrap();
        assert_eq!(count, 1);
        let stored = store.description("5").await.unwrap().unwrap();
        assert_eq!(stored.description_text.as_deref(), Some("second"));
        assert_eq!(stored.title.as_deref(), Some("Senior Analyst"));
    }

    #[tokio::test]
    async fn test_known_ongoing_ids_filters_status() {
        let store = Store::in_memory().await.unwrap();
        store.upsert_status("1", JobStatus::Ongoing, "u1").await.unwrap();
        store.upsert_status("2", JobStatus::Cancelled, "u2").await.unwrap();
        store.upsert_status("3", JobStatus::Deleted, "u3").await.unwrap();
        store.upsert_status("4", JobStatus::Ongoing, "u4").await.unwrap();

        let ongoing: Vec<_> = store.known_ongoing_ids().await.unwrap().into_iter().collect();
        assert_eq!(ongoing, vec!["1", "4"]);
        assert_eq!(store.known_ids().await.unwrap().len(), 4);

        let counts = store.status_counts().await.unwrap();
        assert_eq!(counts.get("ongoing"), Some(&2));
        assert_eq!(counts.get("cancelled"), Some(&1));
    }

    #[tokio::test]
    async fn test_unanalyzed_descriptions_excludes_analyzed() {
        let store = Store::in_memory().await.unwrap();
        for id in ["a", "b", "c"] {
            store.upsert_status(id, JobStatus::Ongoing, id).await.unwrap();
            store.upsert_description(&description(id, Some("text"))).await.unwrap();
        }
        store.insert_analysis("b", "7").await.unwrap();

        let pending: Vec<_> = store
            .unanalyzed_descriptions()
            .await
            .unwrap()
            .into_iter()
            .map(|(id, _)| id)
            .collect();
        assert_eq!(pending, vec!["a", "c"]);
        assert_eq!(store.analysis("b").await.unwrap().unwrap().analysis_text, "7");
    }

    #[tokio::test]
    async fn test_insert_analysis_is_write_once() {
        let store = Store::in_memory().await.unwrap();
        store.upsert_status("9", JobStatus::Ongoing, "u").await.unwrap();
        store.insert_analysis("9", "8").await.unwrap();
        assert!(store.insert_analysis("9", "3").await.is_err());
    }

    #[tokio::test]
    async fn test_open_creates_file_and_tables() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("jobs.db");

        let store = Store::open(&path).await.unwrap();
        store.upsert_status("42", JobStatus::New, "u").await.unwrap();
        drop(store);

        let reopened = Store::open(&path).await.unwrap();
        assert_eq!(reopened.job("42").await.unwrap().unwrap().status, JobStatus::New);
    }

    #[tokio::test]
    async fn test_open_path_with_url_characters() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("odd?dir#1").join("jobs?v=2#x.db");

        let store = Store::open(&path).await.unwrap();
        store.upsert_status("7", JobStatus::Ongoing, "u").await.unwrap();
        drop(store);

        assert!(path.exists());
        let reopened = Store::open(&path).await.unwrap();
        assert_eq!(reopened.job("7").await.unwrap().unwrap().status, JobStatus::Ongoing);
    }
}

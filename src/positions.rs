// src/positions.rs
//! Tracks an exported positions list across runs.
//!
//! Each run compares the newest export in the input folder with the last
//! list written to the output folder and writes a new timestamped list.

use anyhow::{Context, Result};
use chrono::{Local, NaiveDateTime};
use std::collections::{HashMap, HashSet};
use std::path::{Path, PathBuf};
use tracing::{info, warn};

use crate::error::ScrapeError;
use crate::store::models::JobStatus;
use crate::utils::latest_file_with_extension;

pub const URL_COLUMN: &str = "Job URL";
pub const STATUS_COLUMN: &str = "Status";
pub const CHANGED_COLUMN: &str = "Last Change Timestamp";

const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S";
const FILE_STAMP_FORMAT: &str = "%Y%m%d%H%M";

type Row = HashMap<String, String>;

struct Table {
    headers: Vec<String>,
    rows: Vec<Row>,
}

impl Table {
    fn read(path: &Path) -> Result<Self> {
        let mut reader =
            csv::Reader::from_path(path).with_context(|| format!("Failed to open {}", path.display()))?;
        let headers: Vec<String> = reader.headers()?.iter().map(str::to_string).collect();
        if !headers.iter().any(|h| h == URL_COLUMN) {
            anyhow::bail!("{} has no '{}' column", path.display(), URL_COLUMN);
        }

        let mut rows: Vec<Row> = Vec::new();
        for record in reader.records() {
            let record = record.with_context(|| format!("Failed to read a row of {}", path.display()))?;
            rows.push(headers.iter().cloned().zip(record.iter().map(str::to_string)).collect());
        }
        Ok(Self { headers, rows })
    }

    fn urls(&self) -> HashSet<&str> {
        self.rows.iter().map(|row| url_of(row)).collect()
    }
}

fn url_of(row: &Row) -> &str {
    row.get(URL_COLUMN).map(String::as_str).unwrap_or_default()
}

fn status_label(status: JobStatus) -> &'static str {
    match status {
        JobStatus::New => "New",
        JobStatus::Ongoing => "Ongoing",
        JobStatus::Cancelled => "Cancelled",
        JobStatus::Deleted => "Deleted",
        JobStatus::Missing => "Missing",
    }
}

/// Merge the newest export into the newest tracked list. Returns the
/// written file, or `None` when there is no export to process.
pub fn update_positions(input_dir: &Path, output_dir: &Path) -> Result<Option<PathBuf>> {
    update_positions_at(input_dir, output_dir, Local::now().naive_local())
}

pub fn update_positions_at(input_dir: &Path, output_dir: &Path, now: NaiveDateTime) -> Result<Option<PathBuf>> {
    let input_file = match latest_file_with_extension(input_dir, "csv") {
        Ok(path) => path,
        Err(ScrapeError::NotFound { .. }) => {
            warn!("No CSV files found in {}", input_dir.display());
            return Ok(None);
        }
        Err(e) => return Err(e.into()),
    };
    info!("Using the most recent file as input: {}", input_file.display());
    let current = Table::read(&input_file)?;

    let previous = match latest_file_with_extension(output_dir, "csv") {
        Ok(path) => Some(Table::read(&path)?),
        Err(ScrapeError::NotFound { .. }) => None,
        Err(e) => return Err(e.into()),
    };

    let merged = merge(previous, current, &now.format(TIMESTAMP_FORMAT).to_string());

    let output_file = output_dir.join(format!("{}_positions_list.csv", now.format(FILE_STAMP_FORMAT)));
    write_table(&output_file, &merged)?;

    info!(
        "Updated positions list with {} rows saved to {}",
        merged.rows.len(),
        output_file.display()
    );
    Ok(Some(output_file))
}

fn merge(previous: Option<Table>, current: Table, timestamp: &str) -> Table {
    let previous = previous.unwrap_or_else(|| Table {
        headers: current.headers.clone(),
        rows: Vec::new(),
    });

    let mut headers = previous.headers.clone();
    for header in current.headers.iter().map(String::as_str).chain([STATUS_COLUMN, CHANGED_COLUMN]) {
        if !headers.iter().any(|h| h == header) {
            headers.push(header.to_string());
        }
    }

    let current_urls = current.urls();
    let previous_urls: HashSet<String> = previous.urls().into_iter().map(str::to_string).collect();

    let mut rows: Vec<Row> = previous
        .rows
        .into_iter()
        .map(|mut row| {
            let status = if current_urls.contains(url_of(&row)) {
                JobStatus::Ongoing
            } else {
                JobStatus::Missing
            };
            row.insert(STATUS_COLUMN.to_string(), status_label(status).to_string());
            row
        })
        .collect();

    rows.extend(
        current
            .rows
            .into_iter()
            .filter(|row| !previous_urls.contains(url_of(row)))
            .map(|mut row| {
                row.insert(STATUS_COLUMN.to_string(), status_label(JobStatus::New).to_string());
                row.insert(CHANGED_COLUMN.to_string(), timestamp.to_string());
                row
            }),
    );

    Table {
        headers,
        rows: keep_last_per_url(rows),
    }
}

/// Drop earlier rows that share a URL with a later one.
fn keep_last_per_url(rows: Vec<Row>) -> Vec<Row> {
    let last_index: HashMap<String, usize> = rows
        .iter()
        .enumerate()
        .map(|(i, row)| (url_of(row).to_string(), i))
        .collect();

    rows.into_iter()
        .enumerate()
        .filter(|(i, row)| last_index.get(url_of(row)) == Some(i))
        .map(|(_, row)| row)
        .collect()
}

fn write_table(path: &Path, table: &Table) -> Result<()> {
    let mut writer =
        csv::Writer::from_path(path).with_context(|| format!("Failed to create {}", path.display()))?;
    writer.write_record(&table.headers)?;
    for row in &table.rows {
        writer.write_record(
            table
                .headers
                .iter()
                .map(|h| row.get(h).map(String::as_str).unwrap_or_default()),
        )?;
    }
    writer.flush()?;
    Ok(())
}

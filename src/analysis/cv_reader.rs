// src/analysis/cv_reader.rs
use anyhow::{Context, Result};
use lopdf::Document;
use std::path::{Path, PathBuf};
use tracing::{info, warn};

use crate::utils::latest_file_with_extension;

/// The most recently modified PDF in `folder`.
pub fn latest_cv(folder: &Path) -> Result<PathBuf> {
    let path = latest_file_with_extension(folder, "pdf")?;
    info!("Using CV {}", path.display());
    Ok(path)
}

/// Text of every page, pages separated by newlines.
pub fn extract_pdf_text(path: &Path) -> Result<String> {
    let doc = Document::load(path).with_context(|| format!("Failed to open PDF {}", path.display()))?;

    let mut pages = Vec::new();
    for page_num in doc.get_pages().keys() {
        match doc.extract_text(&[*page_num]) {
            Ok(text) => pages.push(text),
            Err(e) => warn!("Failed to extract text from page {} of {}: {}", page_num, path.display(), e),
        }
    }

    let text = pages.join("\n").trim().to_string();
    if text.is_empty() {
        anyhow::bail!("No text extracted from PDF {}", path.display());
    }
    Ok(text)
}

/// Text of the newest CV in `folder`.
pub fn read_latest_cv(folder: &Path) -> Result<String> {
    let path = latest_cv(folder)?;
    extract_pdf_text(&path)
}

// src/utils.rs
use anyhow::{Context, Result};
use std::path::{Path, PathBuf};
use std::time::SystemTime;

use crate::error::ScrapeError;

/// Ensure directory exists
pub async fn ensure_dir_exists(path: &Path) -> Result<()> {
    if !path.exists() {
        tokio::fs::create_dir_all(path)
            .await
            .with_context(|| format!("Failed to create directory: {}", path.display()))?;
        tracing::info!("Created directory: {}", path.display());
    }
    Ok(())
}

/// Get file extension in lowercase
pub fn get_file_extension(path: &Path) -> Option<String> {
    path.extension()
        .and_then(|ext| ext.to_str())
        .map(|ext| ext.to_lowercase())
}

/// Most recently modified file in `folder` with the given extension.
pub fn latest_file_with_extension(folder: &Path, extension: &str) -> Result<PathBuf, ScrapeError> {
    let not_found = || ScrapeError::NotFound {
        folder: folder.to_path_buf(),
        extension: extension.to_string(),
    };

    let entries = std::fs::read_dir(folder).map_err(|_| not_found())?;
    let wanted = extension.to_lowercase();

    let mut newest: Option<(SystemTime, PathBuf)> = None;
    for entry in entries.flatten() {
        let path = entry.path();
        if !path.is_file() || get_file_extension(&path).as_deref() != Some(wanted.as_str()) {
            continue;
        }
        let modified = entry
            .metadata()
            .and_then(|m| m.modified())
            .unwrap_or(SystemTime::UNIX_EPOCH);
        match &newest {
            Some((best, _)) if *best >= modified => {}
            _ => newest = Some((modified, path)),
        }
    }

    newest.map(|(_, path)| path).ok_or_else(not_found)
}

/// Collapse runs of whitespace into single spaces and trim the ends.
pub fn clean_text(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs::File;
    use std::time::Duration;

    #[test]
    fn test_get_file_extension() {
        assert_eq!(get_file_extension(Path::new("cv.PDF")), Some("pdf".to_string()));
        assert_eq!(get_file_extension(Path::new("noext")), None);
    }

    #[test]
    fn test_clean_text() {
        assert_eq!(clean_text("  Senior \n\t Analyst  "), "Senior Analyst");
        assert_eq!(clean_text(""), "");
    }

    #[test]
    fn test_latest_file_with_extension_picks_newest() {
        let dir = tempfile::tempdir().unwrap();
        let old = dir.path().join("old.pdf");
        let new = dir.path().join("new.pdf");
        File::create(dir.path().join("notes.txt")).unwrap();

        let old_file = File::create(&old).unwrap();
        old_file
            .set_modified(SystemTime::now() - Duration::from_secs(3600))
            .unwrap();
        File::create(&new).unwrap();

        assert_eq!(latest_file_with_extension(dir.path(), "pdf").unwrap(), new);
    }

    #[test]
    fn test_latest_file_with_extension_missing() {
        let dir = tempfile::tempdir().unwrap();
        File::create(dir.path().join("notes.txt")).unwrap();

        let err = latest_file_with_extension(dir.path(), "pdf").unwrap_err();
        assert!(matches!(err, ScrapeError::NotFound { .. }));

        let missing = dir.path().join("does-not-exist");
        assert!(latest_file_with_extension(&missing, "pdf").is_err());
    }
}

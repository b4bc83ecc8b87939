//! JSON export of stored articles.
//!
//! The `list` subcommand and `scrape --dry-run` print records as a pretty
//! JSON array, newest first. With `--output` the array is written to a file
//! instead; missing parent directories are created.

use crate::models::ArticleRecord;
use std::error::Error;
use std::path::Path;
use tokio::fs;
use tracing::{error, info, instrument};

/// Serialize records as a pretty-printed JSON array.
pub fn articles_to_json(records: &[ArticleRecord]) -> Result<String, serde_json::Error> {
    serde_json::to_string_pretty(records)
}

/// Write records to `path` as JSON.
///
/// # Returns
///
/// `Ok(())` on success, or an error if directory creation, serialization or
/// the file write fails.
#[instrument(level = "info", skip_all, fields(path = %path.display()))]
pub async fn write_articles(records: &[ArticleRecord], path: &Path) -> Result<(), Box<dyn Error>> {
    let json = articles_to_json(records)?;

    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        if let Err(e) = fs::create_dir_all(parent).await {
            error!(dir = %parent.display(), error = %e, "Failed to create output dir");
            return Err(e.into());
        }
    }

    fs::write(path, json).await?;
    info!(count = records.len(), "Wrote articles JSON");

    Ok(())
}

//! Article persistence.
//!
//! Records are kept in a document store keyed by `url`. Writing a record is
//! an upsert: the stored document for that URL has every field replaced, or
//! a new document is inserted when none exists.
//!
//! # Backends
//!
//! | Backend | Module | Used for |
//! |---------|--------|----------|
//! | MongoDB | [`mongo`] | Normal runs and `list` |
//! | In-memory | [`memory`] | `--dry-run` and tests |

pub mod memory;
pub mod mongo;

use crate::models::ArticleRecord;
use crate::utils::truncate_for_log;
use thiserror::Error;
use tracing::{error, info, instrument};

pub use memory::MemoryStore;
pub use mongo::MongoStore;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("MongoDB error: {0}")]
    Mongo(#[from] mongodb::error::Error),

    #[error("malformed stored document: {0}")]
    Document(String),
}

/// What an upsert did.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UpsertOutcome {
    Inserted,
    Updated,
}

/// A document store holding one record per article URL.
pub trait ArticleStore {
    /// Replace the record stored under `record.url`, or insert it.
    async fn upsert(&self, record: &ArticleRecord) -> Result<UpsertOutcome, StoreError>;

    async fn find_by_url(&self, url: &str) -> Result<Option<ArticleRecord>, StoreError>;

    /// Stored records, newest `publication_date` first. `limit == 0` means
    /// no limit.
    async fn list_recent(&self, limit: usize) -> Result<Vec<ArticleRecord>, StoreError>;
}

/// Upsert one record and report the result.
///
/// Failures are logged and swallowed; one bad write never ends a run.
#[instrument(level = "info", skip_all, fields(url = %record.url))]
pub async fn save_article<S: ArticleStore>(store: &S, record: &ArticleRecord) -> Option<UpsertOutcome> {
    match store.upsert(record).await {
        Ok(outcome) => {
            info!(title = %truncate_for_log(&record.title, 80), ?outcome, "Article saved");
            Some(outcome)
        }
        Err(e) => {
            error!(error = %e, "Failed to save article");
            None
        }
    }
}


#[cfg(test)]
mod tests {
    use super::testing::BrokenStore;
    use super::*;
    use crate::models::sample_record;

    #[tokio::test]
    async fn test_save_article_reports_outcome() {
        let store = MemoryStore::new();
        let record = sample_record("https://site/a");

        assert_eq!(save_article(&store, &record).await, Some(UpsertOutcome::Inserted));
        assert_eq!(save_article(&store, &record).await, Some(UpsertOutcome::Updated));
    }

    #[tokio::test]
    async fn test_save_article_swallows_write_errors() {
        let record = sample_record("https://site/a");
        assert_eq!(save_article(&BrokenStore, &record).await, None);
    }
}

//! In-memory article store.
//!
//! Mirrors the MongoDB backend's upsert semantics, including a surrogate id
//! that is assigned on insert and kept across later replacements.

use super::{ArticleStore, StoreError, UpsertOutcome};
use crate::models::ArticleRecord;
use std::sync::atomic::{AtomicU64, Ordering};
use tokio::sync::RwLock;

#[derive(Debug)]
struct StoredArticle {
    id: u64,
    record: ArticleRecord,
}

#[derive(Debug, Default)]
pub struct MemoryStore {
    documents: RwLock<Vec<StoredArticle>>,
    next_id: AtomicU64,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of stored documents.
    pub async fn len(&self) -> usize {
        self.documents.read().await.len()
    }

    #[cfg(test)]
    pub(crate) async fn id_of(&self, url: &str) -> Option<u64> {
        self.documents
            .read()
            .await
            .iter()
            .find(|doc| doc.record.url == url)
            .map(|doc| doc.id)
    }
}

impl ArticleStore for MemoryStore {
    async fn upsert(&self, record: &ArticleRecord) -> Result<UpsertOutcome, StoreError> {
        let mut documents = self.documents.write().await;
        if let Some(existing) = documents.iter_mut().find(|doc| doc.record.url == record.url) {
            existing.record = record.clone();
            return Ok(UpsertOutcome::Updated);
        }

        let id = self.next_id.fetch_add(1, Ordering::Relaxed);
        documents.push(StoredArticle {
            id,
            record: record.clone(),
        });
        Ok(UpsertOutcome::Inserted)
    }

    async fn find_by_url(&self, url: &str) -> Result<Option<ArticleRecord>, StoreError> {
        Ok(self
            .documents
            .read()
            .await
            .iter()
            .find(|doc| doc.record.url == url)
            .map(|doc| doc.record.clone()))
    }

    async fn list_recent(&self, limit: usize) -> Result<Vec<ArticleRecord>, StoreError> {
        let mut records: Vec<ArticleRecord> = self
            .documents
            .read()
            .await
            .iter()
            .map(|doc| doc.record.clone())
            .collect();
        records.sort_by(|a, b| b.publication_date.cmp(&a.publication_date));
        if limit > 0 {
            records.truncate(limit);
        }
        Ok(records)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::sample_record;

    #[tokio::test]
    async fn test_upsert_twice_keeps_one_document_with_latest_fields() {
        let store = MemoryStore::new();
        let first = sample_record("https://site/a");
        let mut second = sample_record("https://site/a");
        second.title = "Updated title".to_string();
        second.subcategory = vec![];
        second.images.clear();

        assert_eq!(store.upsert(&first).await.unwrap(), UpsertOutcome::Inserted);
        let id = store.id_of("https://site/a").await;
        assert_eq!(store.upsert(&second).await.unwrap(), UpsertOutcome::Updated);

        assert_eq!(store.len().await, 1);
        assert_eq!(store.id_of("https://site/a").await, id);
        let stored = store.find_by_url("https://site/a").await.unwrap().unwrap();
        assert_eq!(stored, second);
    }

    #[tokio::test]
    async fn test_distinct_urls_get_distinct_documents() {
        let store = MemoryStore::new();
        store.upsert(&sample_record("https://site/a")).await.unwrap();
        store.upsert(&sample_record("https://site/b")).await.unwrap();

        assert_eq!(store.len().await, 2);
        assert_ne!(store.id_of("https://site/a").await, store.id_of("https://site/b").await);
    }

    #[tokio::test]
    async fn test_find_by_url_missing() {
        let store = MemoryStore::new();
        assert!(store.find_by_url("https://site/none").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_list_recent_orders_by_publication_date() {
        let store = MemoryStore::new();
        for (url, date) in [
            ("https://site/old", "2023-12-31"),
            ("https://site/new", "2024-03-05"),
            ("https://site/mid", "2024-01-15"),
        ] {
            let mut record = sample_record(url);
            record.publication_date = date.to_string();
            store.upsert(&record).await.unwrap();
        }

        let urls: Vec<String> = store
            .list_recent(0)
            .await
            .unwrap()
            .into_iter()
            .map(|r| r.url)
            .collect();
        assert_eq!(urls, vec!["https://site/new", "https://site/mid", "https://site/old"]);

        assert_eq!(store.list_recent(2).await.unwrap().len(), 2);
    }
}

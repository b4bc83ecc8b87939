//! MongoDB article store.
//!
//! One collection, [`COLLECTION_NAME`], with one document per article URL.
//! Upserts use `$set` with every record field so a re-scrape fully replaces
//! the previous values while MongoDB keeps the document's `_id`.
//!
//! # Document shape
//!
//! ```text
//! {
//!   _id: ObjectId,
//!   url, title, thumbnail_url, summary, publication_date, author, content: string,
//!   subcategory: [string],
//!   images: { <image url>: <alt text> },
//!   scraped_at: Date
//! }
//! ```

use super::{ArticleStore, StoreError, UpsertOutcome};
use crate::models::ArticleRecord;
use chrono::{DateTime, Utc};
use futures::TryStreamExt;
use mongodb::bson::{Bson, DateTime as BsonDateTime, Document, doc};
use mongodb::{Client, Collection};
use std::collections::BTreeMap;
use tracing::{debug, info, instrument, warn};

pub const COLLECTION_NAME: &str = "articles";
/// Database used when neither the CLI nor the connection string names one.
pub const DEFAULT_DATABASE: &str = "blog_moderateur";

#[derive(Debug, Clone)]
pub struct MongoStore {
    collection: Collection<Document>,
}

impl MongoStore {
    /// Connect and ping the server.
    ///
    /// The database is `database` if given, else the connection string's
    /// default database, else [`DEFAULT_DATABASE`].
    #[instrument(level = "info", skip(uri))]
    pub async fn connect(uri: &str, database: Option<&str>) -> Result<Self, StoreError> {
        let client = Client::with_uri_str(uri).await?;
        client.database("admin").run_command(doc! { "ping": 1 }).await?;

        let db = match database {
            Some(name) => client.database(name),
            None => client
                .default_database()
                .unwrap_or_else(|| client.database(DEFAULT_DATABASE)),
        };
        info!(database = %db.name(), collection = COLLECTION_NAME, "Connected to MongoDB");

        Ok(Self {
            collection: db.collection(COLLECTION_NAME),
        })
    }
}

impl ArticleStore for MongoStore {
    #[instrument(level = "debug", skip_all, fields(url = %record.url))]
    async fn upsert(&self, record: &ArticleRecord) -> Result<UpsertOutcome, StoreError> {
        let result = self
            .collection
            .update_one(
                doc! { "url": record.url.as_str() },
                doc! { "$set": record_to_document(record) },
            )
            .upsert(true)
            .await?;
        debug!(
            matched = result.matched_count,
            modified = result.modified_count,
            upserted = result.upserted_id.is_some(),
            "Upsert acknowledged"
        );

        Ok(if result.upserted_id.is_some() {
            UpsertOutcome::Inserted
        } else {
            UpsertOutcome::Updated
        })
    }

    async fn find_by_url(&self, url: &str) -> Result<Option<ArticleRecord>, StoreError> {
        self.collection
            .find_one(doc! { "url": url })
            .await?
            .map(|doc| record_from_document(&doc))
            .transpose()
    }

    #[instrument(level = "info", skip(self))]
    async fn list_recent(&self, limit: usize) -> Result<Vec<ArticleRecord>, StoreError> {
        let mut cursor = self
            .collection
            .find(doc! {})
            .sort(doc! { "publication_date": -1 })
            .limit(i64::try_from(limit).unwrap_or(i64::MAX))
            .await?;

        let mut records = Vec::new();
        while let Some(doc) = cursor.try_next().await? {
            match record_from_document(&doc) {
                Ok(record) => records.push(record),
                Err(e) => warn!(error = %e, id = ?doc.get("_id"), "Skipping malformed document"),
            }
        }
        info!(count = records.len(), "Listed stored articles");
        Ok(records)
    }
}

/// The `$set` body for a record: every field except the store's `_id`.
pub fn record_to_document(record: &ArticleRecord) -> Document {
    let images: Document = record
        .images
        .iter()
        .map(|(src, alt)| (src.clone(), Bson::String(alt.clone())))
        .collect();

    doc! {
        "url": record.url.as_str(),
        "title": record.title.as_str(),
        "thumbnail_url": record.thumbnail_url.as_str(),
        "subcategory": record.subcategory.clone(),
        "summary": record.summary.as_str(),
        "publication_date": record.publication_date.as_str(),
        "author": record.author.as_str(),
        "content": record.content.as_str(),
        "images": images,
        "scraped_at": BsonDateTime::from_millis(record.scraped_at.timestamp_millis()),
    }
}

pub fn record_from_document(doc: &Document) -> Result<ArticleRecord, StoreError> {
    let malformed = |key: &str, reason: String| StoreError::Document(format!("`{key}`: {reason}"));
    let text = |key: &str| {
        doc.get_str(key)
            .map(str::to_string)
            .map_err(|e| malformed(key, e.to_string()))
    };

    let subcategory = doc
        .get_array("subcategory")
        .map_err(|e| malformed("subcategory", e.to_string()))?
        .iter()
        .map(|tag| {
            tag.as_str()
                .map(str::to_string)
                .ok_or_else(|| malformed("subcategory", format!("non-string tag {tag}")))
        })
        .collect::<Result<Vec<_>, _>>()?;

    let images = doc
        .get_document("images")
        .map_err(|e| malformed("images", e.to_string()))?
        .iter()
        .map(|(src, alt)| {
            alt.as_str()
                .map(|alt| (src.clone(), alt.to_string()))
                .ok_or_else(|| malformed("images", format!("non-string alt for {src}")))
        })
        .collect::<Result<BTreeMap<_, _>, _>>()?;

    let millis = doc
        .get_datetime("scraped_at")
        .map_err(|e| malformed("scraped_at", e.to_string()))?
        .timestamp_millis();
    let scraped_at = DateTime::<Utc>::from_timestamp_millis(millis)
        .ok_or_else(|| malformed("scraped_at", format!("out of range: {millis}")))?;

    Ok(ArticleRecord {
        url: text("url")?,
        title: text("title")?,
        thumbnail_url: text("thumbnail_url")?,
        subcategory,
        summary: text("summary")?,
        publication_date: text("publication_date")?,
        author: text("author")?,
        content: text("content")?,
        images,
        scraped_at,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::sample_record;
    use chrono::TimeZone;

    #[test]
    fn test_record_to_document_shape() {
        let record = sample_record("https://site/a");
        let doc = record_to_document(&record);

        assert!(doc.get("_id").is_none());
        assert_eq!(doc.get_str("url").unwrap(), "https://site/a");
        assert_eq!(doc.get_array("subcategory").unwrap().len(), 2);
        assert_eq!(
            doc.get_document("images")
                .unwrap()
                .get_str("https://example.com/a.png")
                .unwrap(),
            "Schéma"
        );
        assert!(doc.get_datetime("scraped_at").is_ok());
    }

    #[test]
    fn test_document_round_trip_keeps_fields() {
        let mut record = sample_record("https://site/a");
        record.scraped_at = Utc.with_ymd_and_hms(2024, 3, 5, 10, 0, 0).unwrap();

        let mut doc = record_to_document(&record);
        doc.insert("_id", "surrogate");
        assert_eq!(record_from_document(&doc).unwrap(), record);
    }

    #[test]
    fn test_record_from_document_missing_field() {
        let mut doc = record_to_document(&sample_record("https://site/a"));
        doc.remove("author");

        let err = record_from_document(&doc).unwrap_err();
        assert!(err.to_string().contains("author"));
    }

    #[test]
    fn test_record_from_document_non_string_tag() {
        let mut doc = record_to_document(&sample_record("https://site/a"));
        doc.insert("subcategory", vec![Bson::Int32(3)]);

        assert!(matches!(record_from_document(&doc), Err(StoreError::Document(_))));
    }
}

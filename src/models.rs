//! Data models for scraped articles.
//!
//! - [`ArticleRecord`]: the normalized, persisted representation of one article
//!
//! Every field of a record is always populated. When a field cannot be found
//! in the page markup it carries a fixed placeholder string instead (see
//! [`crate::scrapers::article`] for the list).

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// One article as extracted from its page.
///
/// `url` is the natural key. Upserting a record with an existing `url`
/// replaces every other field of the stored document.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct ArticleRecord {
    /// The article page URL.
    pub url: String,
    /// The article headline.
    pub title: String,
    /// Source of the header image.
    pub thumbnail_url: String,
    /// Tag labels, in page order.
    pub subcategory: Vec<String>,
    /// First paragraph of the lead block.
    pub summary: String,
    /// Publication day as `YYYY-MM-DD`.
    pub publication_date: String,
    /// Byline text.
    pub author: String,
    /// Body text with runs of whitespace collapsed to single spaces.
    pub content: String,
    /// Inline images, keyed by source URL, valued by alt text.
    pub images: BTreeMap<String, String>,
    /// Wall-clock time of the scrape that produced this record.
    pub scraped_at: DateTime<Utc>,
}

#[cfg(test)]
pub(crate) fn sample_record(url: &str) -> ArticleRecord {
    ArticleRecord {
        url: url.to_string(),
        title: "Test Article".to_string(),
        thumbnail_url: "https://example.com/thumb.jpg".to_string(),
        subcategory: vec!["IA".to_string(), "Réseaux sociaux".to_string()],
        summary: "Summary here".to_string(),
        publication_date: "2024-03-05".to_string(),
        author: "Jane Doe".to_string(),
        content: "Full content".to_string(),
        images: BTreeMap::from([(
            "https://example.com/a.png".to_string(),
            "Schéma".to_string(),
        )]),
        scraped_at: Utc::now(),
    }
}

//! Article page field extraction.
//!
//! A page is fetched once; that fetch is the only step whose failure drops
//! the article. Every field after it is extracted on its own, and a field
//! whose markup cannot be found falls back to a fixed placeholder so that a
//! template change on one part of the page never costs the whole record.
//!
//! | Field | Placeholder |
//! |-------|-------------|
//! | `title` | [`TITLE_NOT_FOUND`] |
//! | `thumbnail_url` | [`THUMBNAIL_NOT_FOUND`] |
//! | `subcategory` | `[`[`SUBCATEGORY_NOT_FOUND`]`]` (invalid selector only) |
//! | `summary` | [`SUMMARY_NOT_FOUND`] |
//! | `publication_date` | [`DATE_NOT_FOUND`] |
//! | `author` | [`AUTHOR_NOT_FOUND`] |
//! | `content` | [`CONTENT_NOT_FOUND`] |
//!
//! The body step is the exception: a missing container gives the placeholder,
//! but any other failure there (an unusable container or strip selector)
//! fails the article.

use super::selectors::SelectorRules;
use super::{Fetch, FetchError};
use crate::models::ArticleRecord;
use crate::utils::collapse_whitespace;
use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};
use itertools::Itertools;
use once_cell::sync::Lazy;
use scraper::{ElementRef, Html, Selector};
use std::collections::BTreeMap;
use std::fmt;
use thiserror::Error;
use tracing::{debug, info, instrument};

pub const TITLE_NOT_FOUND: &str = "Titre non trouvé";
pub const THUMBNAIL_NOT_FOUND: &str = "URL de miniature non trouvée";
pub const SUBCATEGORY_NOT_FOUND: &str = "Sous-catégorie non trouvée";
pub const SUMMARY_NOT_FOUND: &str = "Résumé non trouvé";
pub const DATE_NOT_FOUND: &str = "Date non trouvée";
pub const AUTHOR_NOT_FOUND: &str = "Auteur non trouvé";
pub const CONTENT_NOT_FOUND: &str = "Contenu non trouvé";
/// Alt text for inline images that have none.
pub const NO_CAPTION: &str = "Image sans légende";

static IMG: Lazy<Selector> = Lazy::new(|| Selector::parse("img").expect("static selector"));
static PARAGRAPH: Lazy<Selector> = Lazy::new(|| Selector::parse("p").expect("static selector"));

/// Naive timestamp layouts accepted after RFC 3339 fails.
const NAIVE_DATETIME_FORMATS: [&str; 4] = [
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y-%m-%d %H:%M:%S%.f",
    "%Y-%m-%dT%H:%M",
    "%Y-%m-%d %H:%M",
];

#[derive(Debug, Error)]
pub enum ScrapeError {
    #[error("article fetch failed: {0}")]
    Fetch(#[from] FetchError),

    #[error("article extraction failed: {0}")]
    Extract(#[from] ExtractError),
}

/// A failure in the body step that is not simply a missing container.
#[derive(Debug, Error)]
pub enum ExtractError {
    #[error("invalid `{field}` selector `{css}`: {reason}")]
    Selector {
        field: &'static str,
        css: String,
        reason: String,
    },
}

/// Why one field fell back to its placeholder.
#[derive(Debug, Clone, PartialEq, Eq)]
enum FieldMiss {
    InvalidSelector(String),
    NoMatch(&'static str),
    MissingAttribute(&'static str),
    Unparseable(String),
}

impl fmt::Display for FieldMiss {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FieldMiss::InvalidSelector(reason) => write!(f, "invalid selector: {reason}"),
            FieldMiss::NoMatch(what) => write!(f, "no {what} element"),
            FieldMiss::MissingAttribute(attr) => write!(f, "missing `{attr}` attribute"),
            FieldMiss::Unparseable(raw) => write!(f, "unparseable value `{raw}`"),
        }
    }
}

type Field<T> = Result<T, FieldMiss>;

/// Body text and inline images of the content container.
#[derive(Debug)]
struct ContentBody {
    text: String,
    images: BTreeMap<String, String>,
}

/// Fetch one article page and extract its record.
///
/// # Errors
///
/// [`ScrapeError::Fetch`] when the page cannot be retrieved, and
/// [`ScrapeError::Extract`] when the body step fails outright. Missing markup
/// for any single field is not an error.
#[instrument(level = "info", skip(fetcher, rules))]
pub async fn scrape_article<F: Fetch>(
    fetcher: &F,
    rules: &SelectorRules,
    url: &str,
) -> Result<ArticleRecord, ScrapeError> {
    let body = fetcher.fetch(url).await?;
    let record = extract_article(url, &body, rules)?;
    info!(
        title = %record.title,
        bytes = record.content.len(),
        tags = record.subcategory.len(),
        images = record.images.len(),
        "Parsed article"
    );
    Ok(record)
}

/// Build a record from an already-fetched page.
pub fn extract_article(
    url: &str,
    html: &str,
    rules: &SelectorRules,
) -> Result<ArticleRecord, ExtractError> {
    let mut document = Html::parse_document(html);

    let title = or_placeholder("title", extract_title(&document, rules), TITLE_NOT_FOUND);
    let thumbnail_url = or_placeholder(
        "thumbnail_url",
        extract_thumbnail(&document, rules),
        THUMBNAIL_NOT_FOUND,
    );
    // A valid selector with no matches is an empty tag list, not a miss.
    let subcategory = match extract_subcategories(&document, rules) {
        Ok(tags) => tags,
        Err(miss) => {
            debug!(field = "subcategory", reason = %miss, "Using placeholder");
            vec![SUBCATEGORY_NOT_FOUND.to_string()]
        }
    };
    let summary = or_placeholder("summary", extract_summary(&document, rules), SUMMARY_NOT_FOUND);
    let publication_date = or_placeholder(
        "publication_date",
        extract_publication_date(&document, rules),
        DATE_NOT_FOUND,
    );
    let author = or_placeholder("author", extract_author(&document, rules), AUTHOR_NOT_FOUND);

    let (content, images) = match extract_content(&mut document, rules)? {
        Some(body) => (body.text, body.images),
        None => {
            debug!(field = "content", "No content container; using placeholder");
            (CONTENT_NOT_FOUND.to_string(), BTreeMap::new())
        }
    };

    Ok(ArticleRecord {
        url: url.to_string(),
        title,
        thumbnail_url,
        subcategory,
        summary,
        publication_date,
        author,
        content,
        images,
        scraped_at: Utc::now(),
    })
}

fn or_placeholder(field: &'static str, value: Field<String>, placeholder: &str) -> String {
    value.unwrap_or_else(|miss| {
        debug!(field, reason = %miss, "Using placeholder");
        placeholder.to_string()
    })
}

fn selector(css: &str) -> Field<Selector> {
    Selector::parse(css).map_err(|e| FieldMiss::InvalidSelector(e.to_string()))
}

fn compile(field: &'static str, css: &str) -> Result<Selector, ExtractError> {
    Selector::parse(css).map_err(|e| ExtractError::Selector {
        field,
        css: css.to_string(),
        reason: e.to_string(),
    })
}

fn element_text(element: ElementRef<'_>) -> String {
    element.text().collect::<String>().trim().to_string()
}

fn first_text(document: &Html, css: &str, what: &'static str) -> Field<String> {
    let sel = selector(css)?;
    document
        .select(&sel)
        .next()
        .map(element_text)
        .ok_or(FieldMiss::NoMatch(what))
}

fn extract_title(document: &Html, rules: &SelectorRules) -> Field<String> {
    first_text(document, &rules.title, "title")
}

fn extract_author(document: &Html, rules: &SelectorRules) -> Field<String> {
    first_text(document, &rules.author, "byline")
}

fn extract_thumbnail(document: &Html, rules: &SelectorRules) -> Field<String> {
    let sel = selector(&rules.thumbnail)?;
    let figure = document
        .select(&sel)
        .next()
        .ok_or(FieldMiss::NoMatch("header image container"))?;
    let img = figure
        .select(&IMG)
        .next()
        .ok_or(FieldMiss::NoMatch("header img"))?;
    img.value()
        .attr("src")
        .map(str::to_string)
        .ok_or(FieldMiss::MissingAttribute("src"))
}

fn extract_subcategories(document: &Html, rules: &SelectorRules) -> Field<Vec<String>> {
    let sel = selector(&rules.subcategories)?;
    Ok(document.select(&sel).map(element_text).collect())
}

fn extract_summary(document: &Html, rules: &SelectorRules) -> Field<String> {
    let sel = selector(&rules.summary)?;
    let block = document
        .select(&sel)
        .next()
        .ok_or(FieldMiss::NoMatch("summary block"))?;
    block
        .select(&PARAGRAPH)
        .next()
        .map(element_text)
        .ok_or(FieldMiss::NoMatch("summary paragraph"))
}

fn extract_publication_date(document: &Html, rules: &SelectorRules) -> Field<String> {
    let sel = selector(&rules.publication_date)?;
    let time = document
        .select(&sel)
        .next()
        .ok_or(FieldMiss::NoMatch("date"))?;
    let raw = time
        .value()
        .attr("datetime")
        .ok_or(FieldMiss::MissingAttribute("datetime"))?;
    normalize_date(raw).ok_or_else(|| FieldMiss::Unparseable(raw.to_string()))
}

/// Reduce an ISO-8601 timestamp or date to `YYYY-MM-DD`.
///
/// Timestamps with an offset keep the calendar day of that offset; they are
/// not converted to UTC first.
pub fn normalize_date(raw: &str) -> Option<String> {
    let raw = raw.trim();
    let date = DateTime::parse_from_rfc3339(raw)
        .map(|dt| dt.date_naive())
        .or_else(|_| DateTime::parse_from_str(raw, "%Y-%m-%dT%H:%M:%S%.f%z").map(|dt| dt.date_naive()))
        .ok()
        .or_else(|| {
            NAIVE_DATETIME_FORMATS
                .iter()
                .find_map(|fmt| NaiveDateTime::parse_from_str(raw, fmt).ok())
                .map(|dt| dt.date())
        })
        .or_else(|| NaiveDate::parse_from_str(raw, "%Y-%m-%d").ok())?;
    Some(date.format("%Y-%m-%d").to_string())
}

/// Strip unwanted subtrees from the content container, then read its text
/// and inline images. `Ok(None)` when the page has no container.
fn extract_content(
    document: &mut Html,
    rules: &SelectorRules,
) -> Result<Option<ContentBody>, ExtractError> {
    let content_sel = compile("content", &rules.content)?;
    let strip_sel = compile("strip", &rules.strip)?;

    let (container_id, stripped) = match document.select(&content_sel).next() {
        Some(container) => (
            container.id(),
            container.select(&strip_sel).map(|el| el.id()).collect::<Vec<_>>(),
        ),
        None => return Ok(None),
    };

    for id in stripped {
        if let Some(mut node) = document.tree.get_mut(id) {
            node.detach();
        }
    }

    // Detached nodes stay in the arena, so the container id is still valid.
    let Some(container) = document.tree.get(container_id).and_then(ElementRef::wrap) else {
        return Ok(None);
    };

    let joined = container
        .text()
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .join(" ");
    let text = collapse_whitespace(&joined);

    let mut images = BTreeMap::new();
    for img in container.select(&IMG) {
        let attrs = img.value();
        let src = attrs
            .attr("src")
            .filter(|s| !s.is_empty())
            .or_else(|| attrs.attr("data-src").filter(|s| !s.is_empty()));
        let Some(src) = src else {
            continue;
        };
        let alt = attrs.attr("alt").unwrap_or(NO_CAPTION);
        images.insert(src.to_string(), alt.to_string());
    }

    Ok(Some(ContentBody { text, images }))
}

//! RSS feed indexing.
//!
//! The feed is the only source of article URLs. Each `<item>` contributes the
//! text of its first non-empty `<link>` element; `atom:link` self-references
//! and empty links are ignored. Feed order is preserved and nothing is
//! deduplicated here.

use super::{Fetch, FetchError};
use quick_xml::Reader;
use quick_xml::escape::resolve_predefined_entity;
use quick_xml::events::Event;
use thiserror::Error;
use tracing::{debug, info, instrument};
use url::{ParseError, Url};

/// Default feed endpoint.
pub const FEED_URL: &str = "https://www.blogdumoderateur.com/feed/";

#[derive(Debug, Error)]
pub enum FeedError {
    #[error("could not load feed: {0}")]
    Fetch(#[from] FetchError),

    #[error("malformed feed XML: {0}")]
    Xml(String),
}

/// Fetch the feed and return the article links it lists.
///
/// Relative links are resolved against the root of `feed_url`. An empty result is not an
/// error; the caller decides what an empty feed means.
#[instrument(level = "info", skip(fetcher))]
pub async fn index_articles<F: Fetch>(fetcher: &F, feed_url: &str) -> Result<Vec<String>, FeedError> {
    let body = fetcher.fetch(feed_url).await?;
    let links = parse_feed_links(&body)?;

    // Relative links hang off the site root, not the feed's own path.
    let origin = Url::parse(feed_url).and_then(|u| u.join("/")).ok();
    let article_urls: Vec<String> = links
        .into_iter()
        .map(|link| resolve_link(origin.as_ref(), link))
        .collect();

    info!(count = article_urls.len(), source = feed_url, "Indexed feed article URLs");
    debug!(urls = ?article_urls, "Feed URLs");

    Ok(article_urls)
}

/// Absolute links are returned exactly as the feed wrote them; they are the
/// store key. Only relative links are joined onto `origin`.
fn resolve_link(origin: Option<&Url>, link: String) -> String {
    match (Url::parse(&link), origin) {
        (Err(ParseError::RelativeUrlWithoutBase), Some(origin)) => {
            origin.join(&link).map(String::from).unwrap_or(link)
        }
        _ => link,
    }
}

/// Collect the link of every `<item>` in an RSS document.
pub fn parse_feed_links(xml: &str) -> Result<Vec<String>, FeedError> {
    let mut reader = Reader::from_str(xml);

    let mut links = Vec::new();
    let mut depth = 0usize;
    // Depth of the open <item>, if any.
    let mut item_depth: Option<usize> = None;
    let mut item_has_link = false;
    // Text of the <link> currently being read.
    let mut link_buf: Option<String> = None;

    loop {
        let event = reader
            .read_event()
            .map_err(|e| FeedError::Xml(format!("at byte {}: {e}", reader.error_position())))?;

        match event {
            Event::Start(e) => {
                depth += 1;
                let name = e.name();
                if item_depth.is_none() && name.as_ref() == b"item" {
                    item_depth = Some(depth);
                    item_has_link = false;
                } else if item_depth.is_some() && !item_has_link && name.as_ref() == b"link" {
                    link_buf = Some(String::new());
                }
            }
            Event::Text(t) => {
                if let Some(buf) = link_buf.as_mut() {
                    buf.push_str(&String::from_utf8_lossy(&t));
                }
            }
            Event::CData(c) => {
                if let Some(buf) = link_buf.as_mut() {
                    buf.push_str(&String::from_utf8_lossy(&c));
                }
            }
            Event::GeneralRef(r) => {
                if let Some(buf) = link_buf.as_mut() {
                    match r.resolve_char_ref().map_err(|e| FeedError::Xml(e.to_string()))? {
                        Some(ch) => buf.push(ch),
                        None => {
                            let name = String::from_utf8_lossy(&r);
                            match resolve_predefined_entity(&name) {
                                Some(resolved) => buf.push_str(resolved),
                                None => {
                                    buf.push('&');
                                    buf.push_str(&name);
                                    buf.push(';');
                                }
                            }
                        }
                    }
                }
            }
            Event::End(e) => {
                let name = e.name();
                if name.as_ref() == b"link" {
                    if let Some(buf) = link_buf.take() {
                        let link = buf.trim();
                        if !link.is_empty() {
                            links.push(link.to_string());
                            item_has_link = true;
                        }
                    }
                } else if name.as_ref() == b"item" && item_depth == Some(depth) {
                    item_depth = None;
                }
                depth = depth.saturating_sub(1);
            }
            Event::Eof => break,
            _ => {}
        }
    }

    Ok(links)
}

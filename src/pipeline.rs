//! The scrape run: feed → articles → store.
//!
//! Everything is sequential. One article is fetched, extracted and written
//! before the next one is requested.

use crate::scrapers::article::scrape_article;
use crate::scrapers::feed::{FeedError, index_articles};
use crate::scrapers::selectors::SelectorRules;
use crate::scrapers::Fetch;
use crate::store::{ArticleStore, UpsertOutcome, save_article};
use crate::utils::is_feed_link;
use thiserror::Error;
use tracing::{error, info, instrument, warn};

/// Conditions that end a run before any article is processed.
#[derive(Debug, Error)]
pub enum RunError {
    #[error(transparent)]
    Feed(#[from] FeedError),

    #[error("no articles found in feed {feed_url}; the feed format may have changed")]
    EmptyFeed { feed_url: String },
}

/// Per-run counters.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct RunSummary {
    /// URLs listed by the feed.
    pub discovered: usize,
    /// Feed entries skipped as comment-feed links.
    pub skipped_feed_links: usize,
    /// Articles fetched and extracted.
    pub scraped: usize,
    /// Articles dropped because their page could not be fetched or processed.
    pub failed: usize,
    pub inserted: usize,
    pub updated: usize,
    pub write_failed: usize,
}

/// Scrape every article listed in `feed_url` into `store`.
///
/// # Errors
///
/// [`RunError::Feed`] when the feed cannot be loaded or parsed and
/// [`RunError::EmptyFeed`] when it lists nothing. Per-article failures are
/// logged, counted in the summary, and never end the run.
#[instrument(level = "info", skip(fetcher, store, rules))]
pub async fn run<F, S>(
    fetcher: &F,
    store: &S,
    rules: &SelectorRules,
    feed_url: &str,
) -> Result<RunSummary, RunError>
where
    F: Fetch,
    S: ArticleStore,
{
    let urls = match index_articles(fetcher, feed_url).await {
        Ok(urls) => urls,
        Err(e) => {
            error!(error = %e, "Could not load the RSS feed");
            return Err(e.into());
        }
    };

    if urls.is_empty() {
        let err = RunError::EmptyFeed {
            feed_url: feed_url.to_string(),
        };
        warn!("{err}");
        return Err(err);
    }

    let mut summary = RunSummary {
        discovered: urls.len(),
        ..RunSummary::default()
    };
    info!(count = summary.discovered, "Articles found in the RSS feed");

    for (index, url) in urls.iter().enumerate() {
        if is_feed_link(url) {
            info!(index, %url, "Skipping feed link");
            summary.skipped_feed_links += 1;
            continue;
        }

        info!(index, total = summary.discovered, %url, "Scraping article");
        let record = match scrape_article(fetcher, rules, url).await {
            Ok(record) => record,
            Err(e) => {
                error!(index, %url, error = %e, "Skipping article");
                summary.failed += 1;
                continue;
            }
        };
        summary.scraped += 1;

        match save_article(store, &record).await {
            Some(UpsertOutcome::Inserted) => summary.inserted += 1,
            Some(UpsertOutcome::Updated) => summary.updated += 1,
            None => summary.write_failed += 1,
        }
    }

    info!(
        discovered = summary.discovered,
        skipped = summary.skipped_feed_links,
        scraped = summary.scraped,
        failed = summary.failed,
        inserted = summary.inserted,
        updated = summary.updated,
        write_failed = summary.write_failed,
        "Scraping finished"
    );
    Ok(summary)
}

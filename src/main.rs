//! # blogmd_scraper
//!
//! Reads a blog's RSS feed, scrapes every linked article page into a
//! structured record, and upserts the records into MongoDB keyed by URL.
//!
//! ## Usage
//!
//! ```sh
//! MONGO_URI=mongodb://localhost:27017/blog_moderateur blogmd_scraper
//! blogmd_scraper list --limit 20
//! ```
//!
//! ## Architecture
//!
//! 1. **Indexing**: collect article URLs from the RSS feed
//! 2. **Extraction**: fetch each page and extract its fields, falling back to
//!    placeholders for anything the markup no longer provides
//! 3. **Storage**: upsert each record into the `articles` collection
//!
//! Articles are processed one at a time, in feed order.

use clap::Parser;
use std::error::Error;
use std::time::{Duration, Instant};
use tracing::{debug, error, info, instrument};
use tracing_subscriber::{EnvFilter, fmt as tfmt};

mod cli;
mod models;
mod outputs;
mod pipeline;
mod scrapers;
mod store;
mod utils;

use cli::{Cli, Command, ListArgs, ScrapeArgs};
use outputs::json;
use scrapers::HttpFetcher;
use scrapers::selectors::SelectorRules;
use store::{ArticleStore, MemoryStore, MongoStore};

#[tokio::main]
async fn main() -> Result<(), Box<dyn Error>> {
    // --- Tracing init ---
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tfmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_file(false)
        .with_line_number(false)
        .with_timer(tracing_subscriber::fmt::time::UtcTime::rfc_3339())
        .init();

    let start_time = Instant::now();
    info!("blogmd_scraper starting up");

    let mut args = Cli::parse();
    let command = args.command.take().unwrap_or_default();
    debug!(?command, database = ?args.database, "Parsed CLI arguments");

    match command {
        Command::Scrape(scrape) => scrape_feed(&args, scrape).await?,
        Command::List(list) => list_articles(&args, list).await?,
    }

    let elapsed = start_time.elapsed();
    info!(
        ?elapsed,
        secs = elapsed.as_secs(),
        millis = elapsed.subsec_millis(),
        "Execution complete"
    );

    Ok(())
}

/// Connect to MongoDB or fail the process before any work starts.
async fn connect_store(args: &Cli) -> Result<MongoStore, Box<dyn Error>> {
    let Some(uri) = args.mongo_uri.as_deref() else {
        error!("No MongoDB connection string; export MONGO_URI (.env files are not read) or pass --mongo-uri");
        return Err("missing MongoDB connection string".into());
    };

    match MongoStore::connect(uri, args.database.as_deref()).await {
        Ok(store) => Ok(store),
        Err(e) => {
            error!(error = %e, "MongoDB connection failed");
            Err(e.into())
        }
    }
}

#[instrument(level = "info", skip_all, fields(feed_url = %scrape.feed_url, dry_run = scrape.dry_run))]
async fn scrape_feed(args: &Cli, scrape: ScrapeArgs) -> Result<(), Box<dyn Error>> {
    let rules = match &scrape.selectors {
        Some(path) => SelectorRules::from_yaml_file(path).await?,
        None => SelectorRules::default(),
    };
    let fetcher = HttpFetcher::new(scrape.timeout_secs.map(Duration::from_secs))?;

    if scrape.dry_run {
        let store = MemoryStore::new();
        pipeline::run(&fetcher, &store, &rules, &scrape.feed_url).await?;
        info!(records = store.len().await, "Dry run complete; nothing persisted");
        println!("{}", json::articles_to_json(&store.list_recent(0).await?)?);
        return Ok(());
    }

    let store = connect_store(args).await?;
    pipeline::run(&fetcher, &store, &rules, &scrape.feed_url).await?;
    Ok(())
}

#[instrument(level = "info", skip_all, fields(limit = list.limit))]
async fn list_articles(args: &Cli, list: ListArgs) -> Result<(), Box<dyn Error>> {
    let store = connect_store(args).await?;
    let records = match &list.url {
        Some(url) => store.find_by_url(url).await?.into_iter().collect::<Vec<_>>(),
        None => store.list_recent(list.limit).await?,
    };

    match &list.output {
        Some(path) => json::write_articles(&records, path).await?,
        None => println!("{}", json::articles_to_json(&records)?),
    }
    Ok(())
}

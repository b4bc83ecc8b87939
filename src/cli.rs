//! Command-line interface definitions.
//!
//! This module defines the CLI arguments and options using the `clap` crate.
//! Connection settings can also come from environment variables.

use crate::scrapers::feed::FEED_URL;
use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;

/// Command-line arguments.
///
/// # Examples
///
/// ```sh
/// # Scrape the feed into MongoDB (scrape is the default command)
/// MONGO_URI=mongodb://localhost:27017 blogmd_scraper
///
/// # Try new selectors without touching the database
/// blogmd_scraper scrape --dry-run --selectors ./selectors.yaml
///
/// # Export the 20 most recent articles
/// blogmd_scraper list --limit 20 --output ./articles.json
///
/// # Show one stored article
/// blogmd_scraper list --url https://www.blogdumoderateur.com/some-post/
/// ```
#[derive(Parser, Debug)]
#[command(author, version, about)]
pub struct Cli {
    /// MongoDB connection string. Only the process environment is read;
    /// `.env` files are not loaded, so export MONGO_URI or pass it here.
    #[arg(long, env = "MONGO_URI", global = true, hide_env_values = true)]
    pub mongo_uri: Option<String>,

    /// Database name (defaults to the one in the connection string, then blog_moderateur)
    #[arg(long, env = "MONGO_DB", global = true)]
    pub database: Option<String>,

    #[command(subcommand)]
    pub command: Option<Command>,
}

#[derive(Subcommand, Debug, Clone, PartialEq)]
pub enum Command {
    /// Scrape every article listed in the RSS feed into the store
    Scrape(ScrapeArgs),
    /// Print stored articles as JSON, newest first
    List(ListArgs),
}

impl Default for Command {
    fn default() -> Self {
        Command::Scrape(ScrapeArgs::default())
    }
}

#[derive(Args, Debug, Clone, PartialEq)]
pub struct ScrapeArgs {
    /// RSS feed listing the articles
    #[arg(long, default_value = FEED_URL)]
    pub feed_url: String,

    /// YAML file overriding the CSS selectors
    #[arg(short, long)]
    pub selectors: Option<PathBuf>,

    /// Per-request timeout in seconds (none by default)
    #[arg(long)]
    pub timeout_secs: Option<u64>,

    /// Print records as JSON instead of writing them to MongoDB
    #[arg(long)]
    pub dry_run: bool,
}

impl Default for ScrapeArgs {
    fn default() -> Self {
        Self {
            feed_url: FEED_URL.to_string(),
            selectors: None,
            timeout_secs: None,
            dry_run: false,
        }
    }
}

#[derive(Args, Debug, Clone, PartialEq)]
pub struct ListArgs {
    /// Maximum number of articles (0 for all)
    #[arg(short, long, default_value_t = 50)]
    pub limit: usize,

    /// Only the article stored under this URL
    #[arg(long)]
    pub url: Option<String>,

    /// Write the JSON to this file instead of stdout
    #[arg(short, long)]
    pub output: Option<PathBuf>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_defaults_to_scrape() {
        let cli = Cli::parse_from(["blogmd_scraper", "--mongo-uri", "mongodb://localhost"]);

        assert_eq!(cli.mongo_uri.as_deref(), Some("mongodb://localhost"));
        assert!(cli.command.is_none());
        assert_eq!(cli.command.unwrap_or_default(), Command::Scrape(ScrapeArgs::default()));
    }

    #[test]
    fn test_cli_scrape_flags() {
        let cli = Cli::parse_from([
            "blogmd_scraper",
            "scrape",
            "--feed-url",
            "https://other.example/feed/",
            "-s",
            "/tmp/selectors.yaml",
            "--timeout-secs",
            "30",
            "--dry-run",
        ]);

        let Some(Command::Scrape(args)) = cli.command else {
            panic!("expected scrape command");
        };
        assert_eq!(args.feed_url, "https://other.example/feed/");
        assert_eq!(args.selectors, Some(PathBuf::from("/tmp/selectors.yaml")));
        assert_eq!(args.timeout_secs, Some(30));
        assert!(args.dry_run);
    }

    #[test]
    fn test_cli_scrape_uses_default_feed() {
        let cli = Cli::parse_from(["blogmd_scraper", "scrape"]);
        let Some(Command::Scrape(args)) = cli.command else {
            panic!("expected scrape command");
        };
        assert_eq!(args.feed_url, FEED_URL);
    }

    #[test]
    fn test_cli_mongo_uri_help_mentions_env_file() {
        let command = Cli::command();
        let help = command
            .get_arguments()
            .find(|arg| arg.get_id() == "mongo_uri")
            .and_then(|arg| arg.get_long_help().or(arg.get_help()))
            .map(|help| help.to_string())
            .unwrap_or_default();

        assert!(help.contains(".env"), "help was: {help}");
        assert!(help.contains("MONGO_URI"));
    }

    #[test]
    fn test_cli_list_with_global_database() {
        let cli = Cli::parse_from([
            "blogmd_scraper",
            "list",
            "-l",
            "5",
            "-o",
            "./out.json",
            "--database",
            "archive",
        ]);

        assert_eq!(cli.database.as_deref(), Some("archive"));
        assert_eq!(
            cli.command,
            Some(Command::List(ListArgs {
                limit: 5,
                url: None,
                output: Some(PathBuf::from("./out.json")),
            }))
        );
    }
}

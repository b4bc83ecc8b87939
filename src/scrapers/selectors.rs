//! CSS selector table for article pages.
//!
//! Every selector the extractor uses is listed here, one per field, so a
//! template change on the site only touches this table (or a YAML override
//! passed with `--selectors`).
//!
//! ```yaml
//! # selectors.yaml: keys left out keep their default
//! title: "h1.entry-title"
//! author: "span.author-name"
//! ```

use serde::{Deserialize, Serialize};
use std::path::Path;
use thiserror::Error;
use tracing::{info, instrument};

#[derive(Debug, Error)]
pub enum RulesError {
    #[error("could not read selector file: {0}")]
    Io(#[from] std::io::Error),

    #[error("invalid selector file: {0}")]
    Yaml(#[from] serde_yaml::Error),
}

/// Field name → CSS selector.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
#[serde(default, deny_unknown_fields)]
pub struct SelectorRules {
    /// Primary heading.
    pub title: String,
    /// Header image container; the first `img` inside it is used.
    pub thumbnail: String,
    /// Tag links.
    pub subcategories: String,
    /// Lead block; its first `p` is the summary.
    pub summary: String,
    /// Time element carrying a `datetime` attribute.
    pub publication_date: String,
    /// Byline.
    pub author: String,
    /// Main body container.
    pub content: String,
    /// Subtrees removed from the body before reading its text. `noscript`
    /// is listed because the HTML parser keeps its contents as raw markup text.
    pub strip: String,
}

impl Default for SelectorRules {
    fn default() -> Self {
        Self {
            title: "h1.entry-title".to_string(),
            thumbnail: "figure.article-hat-img".to_string(),
            subcategories: "ul.tags-list li a.post-tags".to_string(),
            summary: r#"div[class*="col-12"]"#.to_string(),
            publication_date: "time.entry-date".to_string(),
            author: "span.byline".to_string(),
            content: "div.entry-content".to_string(),
            strip: "script, style, noscript".to_string(),
        }
    }
}

impl SelectorRules {
    /// Load a YAML override table. Missing keys fall back to the defaults.
    #[instrument(level = "info")]
    pub async fn from_yaml_file(path: &Path) -> Result<Self, RulesError> {
        let raw = tokio::fs::read_to_string(path).await?;
        let rules = Self::from_yaml_str(&raw)?;
        info!(path = %path.display(), "Loaded selector overrides");
        Ok(rules)
    }

    pub fn from_yaml_str(raw: &str) -> Result<Self, RulesError> {
        Ok(serde_yaml::from_str(raw)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_default_rules_parse_as_css() {
        let rules = SelectorRules::default();
        for css in [
            &rules.title,
            &rules.thumbnail,
            &rules.subcategories,
            &rules.summary,
            &rules.publication_date,
            &rules.author,
            &rules.content,
            &rules.strip,
        ] {
            assert!(scraper::Selector::parse(css).is_ok(), "{css} should parse");
        }
    }

    #[test]
    fn test_yaml_override_keeps_defaults_for_missing_keys() {
        let rules = SelectorRules::from_yaml_str("author: \"span.author-name\"\n").unwrap();
        assert_eq!(rules.author, "span.author-name");
        assert_eq!(rules.title, SelectorRules::default().title);
    }

    #[test]
    fn test_yaml_unknown_key_rejected() {
        let err = SelectorRules::from_yaml_str("headline: \"h1\"\n").unwrap_err();
        assert!(matches!(err, RulesError::Yaml(_)));
    }

    #[tokio::test]
    async fn test_from_yaml_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "content: \"article .body\"").unwrap();

        let rules = SelectorRules::from_yaml_file(file.path()).await.unwrap();
        assert_eq!(rules.content, "article .body");
    }

    #[tokio::test]
    async fn test_from_yaml_file_missing() {
        let err = SelectorRules::from_yaml_file(Path::new("/nonexistent/selectors.yaml"))
            .await
            .unwrap_err();
        assert!(matches!(err, RulesError::Io(_)));
    }
}

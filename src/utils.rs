//! Small string helpers shared by the scrapers and the pipeline.

use itertools::Itertools;

/// Marker of comment-feed links that some feeds list as items.
const FEED_PATH_MARKER: &str = "/feed";

/// Collapse every run of whitespace into a single space and trim the ends.
///
/// # Examples
///
/// ```ignore
/// assert_eq!(collapse_whitespace("  a \n\t b  "), "a b");
/// ```
pub fn collapse_whitespace(s: &str) -> String {
    s.split_whitespace().join(" ")
}

/// Whether a feed entry points at a feed rather than an article.
pub fn is_feed_link(url: &str) -> bool {
    url.contains(FEED_PATH_MARKER)
}

/// Truncate a string for logging purposes.
///
/// Long strings are cut after `max` characters with an ellipsis and the
/// number of dropped bytes appended. The cut always lands on a character
/// boundary.
///
/// # Examples
///
/// ```ignore
/// assert_eq!(truncate_for_log("short", 100), "short");
/// assert_eq!(truncate_for_log(&"a".repeat(500), 10), "aaaaaaaaaa…(+490 bytes)");
/// ```
pub fn truncate_for_log(s: &str, max: usize) -> String {
    match s.char_indices().nth(max) {
        None => s.to_string(),
        Some((cut, _)) => format!("{}…(+{} bytes)", &s[..cut], s.len() - cut),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_collapse_whitespace() {
        assert_eq!(collapse_whitespace("  Hello \n\n  world\t!  "), "Hello world !");
        assert_eq!(collapse_whitespace("a\u{a0}b"), "a b");
        assert_eq!(collapse_whitespace("   "), "");
    }

    #[test]
    fn test_is_feed_link() {
        assert!(is_feed_link("https://site/feed/comments"));
        assert!(is_feed_link("https://site/post/feed"));
        // Plain substring match: slugs starting with "feed" are caught too.
        assert!(is_feed_link("https://site/feedback-loop/"));
        assert!(!is_feed_link("https://site/post/"));
    }

    #[test]
    fn test_truncate_for_log_short_string() {
        let s = "Hello, world!";
        assert_eq!(truncate_for_log(s, 100), "Hello, world!");
    }

    #[test]
    fn test_truncate_for_log_long_string() {
        let s = "a".repeat(500);
        let result = truncate_for_log(&s, 100);
        assert!(result.starts_with(&"a".repeat(100)));
        assert!(result.contains("…(+400 bytes)"));
    }

    #[test]
    fn test_truncate_for_log_multibyte() {
        assert_eq!(truncate_for_log("éééé", 2), "éé…(+4 bytes)");
    }
}

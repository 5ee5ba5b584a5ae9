//! Utility functions for URL normalization, text shaping and file system checks.
//!
//! This module provides helper functions used throughout the crate:
//! - Request URL normalization (scheme defaulting and validation)
//! - Character-safe truncation and whitespace collapsing
//! - Slug and timestamp helpers for export directory names
//! - File system validation for output directories

use crate::error::ExtractError;
use chrono::Utc;
use once_cell::sync::Lazy;
use regex::Regex;
use std::error::Error;
use std::fs as stdfs;
use tokio::fs;
use tracing::{info, instrument};
use url::Url;

static WHITESPACE_RUN: Lazy<Regex> = Lazy::new(|| Regex::new(r"\s+").unwrap());

/// Normalize a user-supplied URL into the request URL.
///
/// Surrounding whitespace is trimmed and `https://` is prepended when the
/// input carries no scheme. Only `http` and `https` URLs with a host are
/// accepted.
///
/// # Returns
///
/// The normalized string (echoed back in the record) and its parsed form.
///
/// # Errors
///
/// [`ExtractError::InvalidInput`] for empty, unparseable or non-HTTP input.
pub fn normalize_url(input: &str) -> Result<(String, Url), ExtractError> {
    let invalid = |reason: &str| ExtractError::InvalidInput {
        input: input.to_string(),
        reason: reason.to_string(),
    };

    let trimmed = input.trim();
    if trimmed.is_empty() {
        return Err(invalid("URL is empty"));
    }

    let normalized = if has_explicit_scheme(trimmed) {
        trimmed.to_string()
    } else if let Some(rest) = trimmed.strip_prefix("//") {
        format!("https://{rest}")
    } else {
        format!("https://{trimmed}")
    };

    let parsed = Url::parse(&normalized).map_err(|e| invalid(&e.to_string()))?;
    if !matches!(parsed.scheme(), "http" | "https") {
        return Err(invalid("only http and https URLs are supported"));
    }
    if parsed.host_str().is_none_or(str::is_empty) {
        return Err(invalid("URL has no host"));
    }

    Ok((normalized, parsed))
}

/// Whether `s` starts with `scheme://`, ignoring any `://` that only
/// appears inside the path, query or fragment.
fn has_explicit_scheme(s: &str) -> bool {
    let Some(sep) = s.find("://") else {
        return false;
    };
    let boundary = s.find(['/', '?', '#']).unwrap_or(s.len());
    sep < boundary
}

/// Keep at most `max` characters (not bytes) of `s`.
pub fn truncate_chars(s: &str, max: usize) -> String {
    match s.char_indices().nth(max) {
        Some((idx, _)) => s[..idx].to_string(),
        None => s.to_string(),
    }
}

/// Replace every run of whitespace with a single space.
pub fn collapse_whitespace(s: &str) -> String {
    WHITESPACE_RUN.replace_all(s, " ").into_owned()
}

/// Truncate a string for logging purposes.
///
/// Long strings are cut to `max` characters with an ellipsis and the count
/// of dropped bytes appended.
///
/// # Examples
///
/// ```ignore
/// assert_eq!(truncate_for_log("short", 100), "short");
/// ```
pub fn truncate_for_log(s: &str, max: usize) -> String {
    let head = truncate_chars(s, max);
    if head.len() == s.len() {
        head
    } else {
        format!("{}…(+{} bytes)", head, s.len() - head.len())
    }
}

/// Turn a URL into a file-system friendly name.
///
/// Keeps host and path, lowercases, and maps everything that is not
/// alphanumeric to `-`, collapsing repeats.
///
/// ```ignore
/// assert_eq!(slugify_url("https://Example.com/a/b?c=1"), "example-com-a-b");
/// ```
pub fn slugify_url(url: &str) -> String {
    let base = match Url::parse(url) {
        Ok(parsed) => format!("{}{}", parsed.host_str().unwrap_or(""), parsed.path()),
        Err(_) => url.to_string(),
    };

    let mut slug = String::with_capacity(base.len());
    for c in base.to_lowercase().chars() {
        if c.is_alphanumeric() {
            slug.push(c);
        } else if !slug.ends_with('-') {
            slug.push('-');
        }
    }
    let slug = slug.trim_matches('-');
    if slug.is_empty() {
        "page".to_string()
    } else {
        slug.to_string()
    }
}

/// UTC timestamp suitable for directory names, e.g. `20261017T093000Z`.
pub fn timestamp_tag() -> String {
    Utc::now().format("%Y%m%dT%H%M%SZ").to_string()
}

/// Ensure a directory exists and is writable.
///
/// Creates the directory if it doesn't exist, then creates and deletes a
/// probe file.
///
/// # Errors
///
/// Returns an error if the directory cannot be created or written to.
#[instrument(level = "info", skip_all, fields(path = %path))]
pub async fn ensure_writable_dir(path: &str) -> Result<(), Box<dyn Error>> {
    fs::create_dir_all(path).await?;
    let probe_path = format!("{}/..__probe_write__", path.trim_end_matches('/'));
    match stdfs::File::create(&probe_path) {
        Ok(_) => {
            let _ = stdfs::remove_file(&probe_path);
            info!("Output directory is writable");
            Ok(())
        }
        Err(e) => Err(Box::new(e)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalize_url_prepends_https() {
        let (normalized, parsed) = normalize_url("example.com/about").unwrap();
        assert_eq!(normalized, "https://example.com/about");
        assert_eq!(parsed.host_str(), Some("example.com"));
    }

    #[test]
    fn test_normalize_url_keeps_existing_scheme() {
        let (normalized, parsed) = normalize_url("  http://ex.com/p ").unwrap();
        assert_eq!(normalized, "http://ex.com/p");
        assert_eq!(parsed.scheme(), "http");
    }

    #[test]
    fn test_normalize_url_ignores_scheme_inside_query() {
        let (normalized, parsed) = normalize_url("example.com/go?next=https://other.org/").unwrap();
        assert_eq!(normalized, "https://example.com/go?next=https://other.org/");
        assert_eq!(parsed.host_str(), Some("example.com"));

        let (normalized, _) = normalize_url("ex.com#https://x").unwrap();
        assert_eq!(normalized, "https://ex.com#https://x");
    }

    #[test]
    fn test_normalize_url_scheme_relative() {
        let (normalized, _) = normalize_url("//ex.com/p").unwrap();
        assert_eq!(normalized, "https://ex.com/p");
    }

    #[test]
    fn test_normalize_url_rejects_empty_and_garbage() {
        assert!(matches!(
            normalize_url("   "),
            Err(ExtractError::InvalidInput { .. })
        ));
        assert!(matches!(
            normalize_url("http://"),
            Err(ExtractError::InvalidInput { .. })
        ));
        assert!(matches!(
            normalize_url("ftp://files.example.com/x"),
            Err(ExtractError::InvalidInput { .. })
        ));
    }

    #[test]
    fn test_truncate_chars_counts_characters() {
        assert_eq!(truncate_chars("héllo", 2), "hé");
        assert_eq!(truncate_chars("abc", 10), "abc");
        assert_eq!(truncate_chars("abc", 0), "");
    }

    #[test]
    fn test_collapse_whitespace() {
        assert_eq!(collapse_whitespace("a \n\t b  c"), "a b c");
        assert_eq!(collapse_whitespace("a\u{a0}\u{a0}b"), "a b");
    }

    #[test]
    fn test_truncate_for_log_short_string() {
        assert_eq!(truncate_for_log("Hello, world!", 100), "Hello, world!");
    }

    #[test]
    fn test_truncate_for_log_long_string() {
        let s = "a".repeat(500);
        let result = truncate_for_log(&s, 100);
        assert!(result.starts_with(&"a".repeat(100)));
        assert!(result.contains("…(+400 bytes)"));
    }

    #[test]
    fn test_slugify_url() {
        assert_eq!(slugify_url("https://Example.com/a/b?c=1"), "example-com-a-b");
        assert_eq!(slugify_url("https://ex.com/"), "ex-com");
        assert_eq!(slugify_url("///"), "page");
    }

    #[test]
    fn test_timestamp_tag_shape() {
        let tag = timestamp_tag();
        assert_eq!(tag.len(), 16);
        assert!(tag.ends_with('Z'));
        assert_eq!(&tag[8..9], "T");
    }

    #[tokio::test]
    async fn test_ensure_writable_dir_creates_missing_dir() {
        let tmp = tempfile::tempdir().unwrap();
        let nested = tmp.path().join("a/b");
        let path = nested.to_str().unwrap();
        ensure_writable_dir(path).await.unwrap();
        assert!(nested.is_dir());
    }
}

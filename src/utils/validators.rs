//! Input validation and sanitization helpers used at the API boundary and
//! inside the tools.

use crate::types::{AppError, Result};
use url::Url;

/// Longest query accepted before truncation.
const MAX_QUERY_CHARS: usize = 500;

/// Sanitize a user research query: collapse whitespace, cap the length,
/// reject empty input.
pub fn sanitize_query(query: &str) -> Result<String> {
    let collapsed = query.split_whitespace().collect::<Vec<_>>().join(" ");
    if collapsed.is_empty() {
        return Err(AppError::InvalidInput(
            "Query must be a non-empty string".to_string(),
        ));
    }
    Ok(truncate_chars(&collapsed, MAX_QUERY_CHARS).to_string())
}

/// Whether a URL is fetchable: parses, uses http(s), and has a host.
pub fn validate_url(url: &str) -> bool {
    match Url::parse(url) {
        Ok(parsed) => {
            matches!(parsed.scheme(), "http" | "https") && parsed.host_str().is_some()
        }
        Err(_) => false,
    }
}

/// Sanitize a URL, prepending `https://` when the scheme is missing.
/// Returns `None` when the result is still not a valid http(s) URL.
pub fn sanitize_url(url: &str) -> Option<String> {
    let trimmed = url.trim();
    if trimmed.is_empty() {
        return None;
    }

    let candidate = if trimmed.starts_with("http://") || trimmed.starts_with("https://") {
        trimmed.to_string()
    } else {
        format!("https://{trimmed}")
    };

    validate_url(&candidate).then_some(candidate)
}

/// Extract numeric values (integers and decimals, including negatives) from
/// free text, in order of appearance.
pub fn extract_numbers(text: &str) -> Vec<f64> {
    let pattern = regex::Regex::new(r"-?\d+\.?\d*").expect("static regex");
    pattern
        .find_iter(text)
        .filter_map(|m| m.as_str().parse::<f64>().ok())
        .collect()
}

/// Truncate a string to at most `max` characters without splitting a char.
pub fn truncate_chars(text: &str, max: usize) -> &str {
    match text.char_indices().nth(max) {
        Some((idx, _)) => &text[..idx],
        None => text,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sanitize_query_collapses_whitespace() {
        let query = sanitize_query("  impact\tof   AI \n on jobs ").unwrap();
        assert_eq!(query, "impact of AI on jobs");
    }

    #[test]
    fn sanitize_query_rejects_empty() {
        assert!(sanitize_query("").is_err());
        assert!(sanitize_query("   \n\t ").is_err());
    }

    #[test]
    fn sanitize_query_caps_length() {
        let long = "a".repeat(1200);
        assert_eq!(sanitize_query(&long).unwrap().chars().count(), 500);
    }

    #[test]
    fn validate_url_requires_http_scheme_and_host() {
        assert!(validate_url("https://example.com/page"));
        assert!(validate_url("http://example.com"));
        assert!(!validate_url("ftp://example.com"));
        assert!(!validate_url("file:///etc/passwd"));
        assert!(!validate_url("not a url"));
    }

    #[test]
    fn sanitize_url_adds_scheme() {
        assert_eq!(
            sanitize_url("example.com/a").as_deref(),
            Some("https://example.com/a")
        );
        assert_eq!(
            sanitize_url("https://example.com").as_deref(),
            Some("https://example.com")
        );
        assert!(sanitize_url("").is_none());
    }

    #[test]
    fn extract_numbers_finds_ints_and_decimals() {
        let numbers = extract_numbers("GDP grew 3.5% in 2023, down from 4");
        assert_eq!(numbers, vec![3.5, 2023.0, 4.0]);
    }

    #[test]
    fn truncate_chars_respects_boundaries() {
        assert_eq!(truncate_chars("héllo", 2), "hé");
        assert_eq!(truncate_chars("hi", 10), "hi");
    }
}
